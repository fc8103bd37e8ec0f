pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::{ComputationError, Error, FetchError, Result};
pub use sink::{ConsoleSink, StatusSink};
pub use source::QuantitySource;
pub use types::*;
