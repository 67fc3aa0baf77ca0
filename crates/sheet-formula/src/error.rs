//! Error kinds surfaced by formula parsing and evaluation.

use thiserror::Error;

/// A data-dependent error produced while evaluating a formula.
///
/// Unlike [`ParseError`], these never escape [`crate::cell::Cell::value`] —
/// they are captured and returned as a value variant, per the spreadsheet
/// convention of carrying errors inline (`#DIV/0!`, `#VALUE!`, `#REF!`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FormulaErrorKind {
    /// A reference was out of range, or pointed at a cell holding one.
    #[error("#REF!")]
    Ref,
    /// A string operand could not be parsed as a number.
    #[error("#VALUE!")]
    Value,
    /// Division by zero, or any other non-finite arithmetic result.
    #[error("#DIV/0!")]
    Div0,
}

/// Malformed formula syntax, raised at `set_cell` time and never cached.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("formula parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
        }
    }
}
