//! Error types for the sheet's public API.

use sheet_formula::{ParseError, Position};
use thiserror::Error;

/// Errors raised by `Sheet`'s mutating and querying operations (§7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("invalid position: {0:?}")]
    InvalidPosition(Position),

    #[error("formula parse error: {0}")]
    FormulaParse(#[from] ParseError),

    #[error("circular dependency detected at {0:?}")]
    CircularDependency(Position),
}

pub type Result<T> = std::result::Result<T, SheetError>;
