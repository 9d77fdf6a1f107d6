pub mod file;
pub mod memory;
pub mod bucket;

pub use bucket::BucketStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
