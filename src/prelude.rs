//! Minimal prelude for application code.

pub use crate::batcher::{Batch, BatchAdder, Batcher, BatcherSnapshot, BatcherState};
pub use crate::config::BatcherSettings;
pub use crate::validation::{validate, ValidationContext, Validator};
pub use crate::{Error, Result};
