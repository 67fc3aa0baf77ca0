//! Cell content and the variant dispatch (Empty / Text / Formula) at its core.

use crate::error::FormulaErrorKind;
use crate::formula::{Formula, FormulaExpr};
use crate::position::Position;
use std::cell::RefCell;
use std::collections::HashMap;

/// The escape character that marks a `Text` cell's leading `=` as literal
/// rather than the start of a formula.
const ESCAPE: char = '\'';

/// The result of evaluating a cell: a number, a string, or an error kind
/// carried as a value rather than raised as an exception.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaErrorKind),
}

/// A single cell's content.
///
/// The variant is fixed at construction; `Sheet::set_cell` replaces the
/// whole `Cell` rather than mutating one in place. The `Formula` variant's
/// cache lives behind a `RefCell` so that `value()` can populate it while
/// only borrowing `&self` — matching the read-only shape of `Sheet::get_cell`.
#[derive(Debug)]
pub enum Cell {
    Empty,
    Text(String),
    Formula {
        expr: Box<dyn FormulaExpr>,
        cache: RefCell<Option<Result<f64, FormulaErrorKind>>>,
    },
}

/// Sparse cell storage, keyed by position. Absent entries are semantically
/// `Empty`.
pub type Table = HashMap<Position, Cell>;

impl Cell {
    pub fn empty() -> Cell {
        Cell::Empty
    }

    pub fn text(raw: impl Into<String>) -> Cell {
        Cell::Text(raw.into())
    }

    pub fn formula(expr: Box<dyn FormulaExpr>) -> Cell {
        Cell::Formula {
            expr,
            cache: RefCell::new(None),
        }
    }

    /// Classify `input` into the right variant (§4.1):
    /// - empty -> Empty
    /// - starts with `=` and longer than one character -> Formula
    /// - otherwise -> Text
    ///
    /// A malformed formula is reported rather than silently falling back to
    /// Text; the caller (`Sheet::set_cell`) is responsible for leaving prior
    /// state untouched on error.
    pub fn from_input(input: &str) -> Result<Cell, crate::error::ParseError> {
        if input.is_empty() {
            return Ok(Cell::Empty);
        }
        if input.starts_with('=') && input.len() > 1 {
            let formula = Formula::parse(&input[1..])?;
            return Ok(Cell::formula(Box::new(formula)));
        }
        Ok(Cell::Text(input.to_string()))
    }

    /// Evaluate (or return the cached result of) this cell's value.
    ///
    /// `lookup` resolves a referenced position to a number, per the
    /// contract in §4.1: absent/Empty -> 0, Number -> itself, Text -> parsed
    /// as a float or `#VALUE!`, Error -> propagated.
    pub fn value(&self, lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaErrorKind>) -> CellValue {
        match self {
            Cell::Empty => CellValue::Number(0.0),
            Cell::Text(raw) => {
                if let Some(escaped) = raw.strip_prefix(ESCAPE) {
                    CellValue::Text(escaped.to_string())
                } else {
                    CellValue::Text(raw.clone())
                }
            }
            Cell::Formula { expr, cache } => {
                if let Some(cached) = cache.borrow().as_ref() {
                    return result_to_value(cached.clone());
                }
                let result = match expr.evaluate(lookup) {
                    Ok(n) if n.is_finite() => Ok(n),
                    Ok(_) => Err(FormulaErrorKind::Div0),
                    Err(e) => Err(e),
                };
                *cache.borrow_mut() = Some(result.clone());
                result_to_value(result)
            }
        }
    }

    /// Canonical serialization (§4.1): `Text`'s raw string, `=` + the
    /// formula's canonical expression, or empty for `Empty`.
    pub fn text_repr(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(raw) => raw.clone(),
            Cell::Formula { expr, .. } => format!("={}", expr.expression()),
        }
    }

    /// This cell's outgoing references; empty for Empty/Text.
    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            Cell::Empty | Cell::Text(_) => &[],
            Cell::Formula { expr, .. } => expr.referenced_cells(),
        }
    }

    /// Drop the cached value, if any. No-op for Empty/Text.
    pub fn invalidate_cache(&self) {
        if let Cell::Formula { cache, .. } = self {
            *cache.borrow_mut() = None;
        }
    }
}

fn result_to_value(result: Result<f64, FormulaErrorKind>) -> CellValue {
    match result {
        Ok(n) => CellValue::Number(n),
        Err(e) => CellValue::Error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero(_: Position) -> Result<f64, FormulaErrorKind> {
        Ok(0.0)
    }

    #[test]
    fn empty_input_makes_an_empty_cell() {
        let cell = Cell::from_input("").unwrap();
        assert!(matches!(cell, Cell::Empty));
        assert_eq!(cell.value(&mut zero), CellValue::Number(0.0));
        assert_eq!(cell.text_repr(), "");
        assert!(cell.referenced_cells().is_empty());
    }

    #[test]
    fn plain_text_is_stored_and_returned_verbatim() {
        let cell = Cell::from_input("hello").unwrap();
        assert_eq!(cell.value(&mut zero), CellValue::Text("hello".into()));
        assert_eq!(cell.text_repr(), "hello");
    }

    #[test]
    fn leading_quote_escapes_a_formula_looking_text() {
        let cell = Cell::from_input("'=text").unwrap();
        assert_eq!(cell.text_repr(), "'=text");
        assert_eq!(cell.value(&mut zero), CellValue::Text("=text".into()));
    }

    #[test]
    fn lone_equals_sign_is_text_not_formula() {
        // "=" has length 1, so the formula branch's length guard excludes it.
        let cell = Cell::from_input("=").unwrap();
        assert!(matches!(cell, Cell::Text(_)));
        assert_eq!(cell.value(&mut zero), CellValue::Text("=".into()));
    }

    #[test]
    fn formula_caches_its_evaluated_value() {
        let cell = Cell::from_input("=1+2").unwrap();
        let mut calls = 0;
        let mut lookup = |_: Position| {
            calls += 1;
            Ok(0.0)
        };
        assert_eq!(cell.value(&mut lookup), CellValue::Number(3.0));
        assert_eq!(cell.value(&mut lookup), CellValue::Number(3.0));
        assert_eq!(calls, 0, "no references, lookup should never run");
        cell.invalidate_cache();
        assert_eq!(cell.value(&mut lookup), CellValue::Number(3.0));
    }

    #[test]
    fn non_finite_result_becomes_div0() {
        let cell = Cell::from_input("=1/0").unwrap();
        assert_eq!(cell.value(&mut zero), CellValue::Error(FormulaErrorKind::Div0));
    }

    #[test]
    fn malformed_formula_is_rejected_at_construction() {
        assert!(Cell::from_input("=1+").is_err());
    }

    #[test]
    fn formula_text_repr_is_canonical() {
        let cell = Cell::from_input("=  A1 + 1 ").unwrap();
        assert_eq!(cell.text_repr(), "=A1+1");
    }
}
