//! Printing adapters: render the sheet's bounding box as tab-separated rows
//! (§4.2, "PrintableSize" and the print operations).

use crate::error::Result;
use crate::state::Sheet;
use sheet_formula::{CellValue, Position};
use std::fmt::Write as _;

impl Sheet {
    /// Render every cell's value within the printable bounding box, rows
    /// and columns tab-separated, numbers without trailing `.0`, errors as
    /// their `#NAME!`-style text.
    pub fn print_values(&self) -> Result<String> {
        self.render(|value| match value {
            CellValue::Number(n) => format_number(n),
            CellValue::Text(s) => s,
            CellValue::Error(e) => e.to_string(),
        })
    }

    /// Render every cell's canonical text (the same form `set_cell` would
    /// accept back) within the printable bounding box.
    pub fn print_texts(&self) -> Result<String> {
        let (rows, cols) = self.size;
        let mut out = String::new();
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    out.push('\t');
                }
                out.push_str(&self.text_at(Position::new(row, col))?);
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn render(&self, cell_to_string: impl Fn(CellValue) -> String) -> Result<String> {
        let (rows, cols) = self.size;
        let mut out = String::new();
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    out.push('\t');
                }
                let value = self.value_at(Position::new(row, col))?;
                write!(out, "{}", cell_to_string(value)).expect("writing to a String never fails");
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// `42` rather than `42.0`; otherwise the shortest round-trippable form.
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
