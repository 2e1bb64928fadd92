pub mod analysis;
pub mod coverage;
pub mod error;
pub mod input;
pub mod loans;
pub mod projection;
pub mod returns;
pub mod scenarios;
pub mod time_value;
pub mod types;

#[cfg(feature = "grading")]
pub mod grading;

pub use error::PolicyInvestError;
pub use types::*;

/// Convenience result type
pub type PolicyInvestResult<T> = Result<T, PolicyInvestError>;
