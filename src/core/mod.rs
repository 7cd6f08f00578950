//! Shared error and progress types.

mod error;
pub mod progress;

pub use error::{Error, Result};
pub use progress::{ProgressCallback, ProgressEvent, ProgressStage};
