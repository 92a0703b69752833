//! Utility modules
//!
//! - Error types and result types
//! - Loss reporting for lossy chart parsing
//! - Name lookups for tags and styles

pub mod error;
pub mod loss;
pub mod names;

// Re-export commonly used items
pub use error::{TranscodeError, TranscodeResult};
pub use loss::{LossKind, LossRecord, LossReport};
