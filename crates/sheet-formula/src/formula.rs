//! The `Formula` abstraction: a parsed, evaluable expression.
//!
//! [`Cell`](crate::cell::Cell) never inspects an expression's grammar
//! directly — it only calls through the [`FormulaExpr`] trait. This keeps
//! the cell/sheet machinery decoupled from the concrete grammar in
//! [`crate::parser`], matching the "opaque expression object" contract the
//! engine is built around.

use crate::ast::Expr;
use crate::error::{FormulaErrorKind, ParseError};
use crate::parser;
use crate::position::Position;
use std::fmt;
use std::fmt::Debug;

/// A parsed, evaluable expression, as consumed by a Formula cell.
pub trait FormulaExpr: Debug {
    /// Evaluate the expression, resolving cell references through `lookup`.
    fn evaluate(
        &self,
        lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaErrorKind>,
    ) -> Result<f64, FormulaErrorKind>;

    /// Canonical pretty-printed form of the expression (re-parseable to an
    /// equivalent AST; not necessarily identical to the original input text).
    fn expression(&self) -> String;

    /// The positions this expression references, deduplicated and in
    /// first-seen order.
    fn referenced_cells(&self) -> &[Position];
}

// `FormulaExpr: Debug` only guarantees concrete implementors are `Debug`; a
// trait object needs its own impl to forward into the vtable, so `Cell`
// (which stores `Box<dyn FormulaExpr>`) can keep deriving `Debug`.
impl fmt::Debug for dyn FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Formula({})", self.expression())
    }
}

/// The concrete implementation of [`FormulaExpr`] for the arithmetic
/// grammar in `parser`/`ast`.
#[derive(Clone, Debug)]
pub struct Formula {
    expr: Expr,
    refs: Vec<Position>,
}

impl Formula {
    /// Parse `text` (the substring after the leading `=`) into a `Formula`.
    pub fn parse(text: &str) -> Result<Formula, ParseError> {
        let expr = parser::parse(text)?;
        let mut refs = Vec::new();
        expr.collect_refs(&mut refs);
        Ok(Formula { expr, refs })
    }
}

impl FormulaExpr for Formula {
    fn evaluate(
        &self,
        lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaErrorKind>,
    ) -> Result<f64, FormulaErrorKind> {
        eval(&self.expr, lookup)
    }

    fn expression(&self) -> String {
        self.expr.to_string()
    }

    fn referenced_cells(&self) -> &[Position] {
        &self.refs
    }
}

fn eval(
    expr: &Expr,
    lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaErrorKind>,
) -> Result<f64, FormulaErrorKind> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(pos) => lookup(*pos),
        Expr::Neg(inner) => eval(inner, lookup).map(|v| -v),
        Expr::Bin(op, lhs, rhs) => {
            let lhs = eval(lhs, lookup)?;
            let rhs = eval(rhs, lookup)?;
            Ok(match op {
                crate::ast::Op::Add => lhs + rhs,
                crate::ast::Op::Sub => lhs - rhs,
                crate::ast::Op::Mul => lhs * rhs,
                crate::ast::Op::Div => lhs / rhs,
            })
        }
    }
}
