pub mod raw_source;
pub mod price_resolver;
pub mod checkpoint_store;
pub mod sink;

pub use checkpoint_store::CheckpointStore;
pub use price_resolver::PriceResolver;
pub use raw_source::RawSource;
pub use sink::Sink;
