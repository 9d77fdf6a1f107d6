pub mod print;
pub mod memory;

pub use memory::MemorySink;
pub use print::PrintSink;
