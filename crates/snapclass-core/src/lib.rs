//! snapclass Core
//!
//! Types shared across snapclass components.
//!
//! This crate provides:
//! - The error type and result alias used by every crate
//! - Input/output tensor value types exchanged with inference engines
//! - The `Prediction` returned by a classification

pub mod error;
pub mod tensor;

pub use error::{BoxError, Error, Result};
pub use tensor::{InputTensor, OutputTensor, Prediction, BATCH_SIZE, CHANNELS};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::tensor::{InputTensor, OutputTensor, Prediction};
}
