pub mod error;
pub mod types;
pub mod interfaces;
pub mod config;
pub mod backend;
pub mod pipeline;
pub mod price_infra;
pub mod storage;
pub mod warehouse;
pub mod observability;
pub mod utils;

pub use backend::Backend;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, Stage};
