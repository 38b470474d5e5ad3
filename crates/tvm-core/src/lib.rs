pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "annuity")]
pub mod annuity;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

pub use error::{TvmError, ValidationErrors};
pub use types::*;

/// Standard result type for all tvm operations
pub type TvmResult<T> = Result<T, TvmError>;
