//! Convenience result type alias for FieldAuth.

use crate::error::AppError;

/// A specialized `Result` type for FieldAuth operations.
pub type AppResult<T> = Result<T, AppError>;
