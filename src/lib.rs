pub mod chain;
pub mod error;
pub mod logging;
pub mod swap;

pub use error::{Error, RecordKind, Result};
