//! Sheet mutation and query operations: `set_cell`, `get_cell`,
//! `clear_cell`, cycle detection wiring, and cache invalidation.

use crate::error::{Result, SheetError};
use crate::state::Sheet;
use sheet_formula::{Cell, CellValue, FormulaErrorKind, Position};
use std::collections::{HashSet, VecDeque};

impl Sheet {
    /// Set the cell at `pos` from raw input text (§4.2).
    ///
    /// Validation, parsing, and cycle detection all happen before any
    /// state is touched: a rejected call leaves the sheet exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let cell = Cell::from_input(text)?;
        let new_refs = cell.referenced_cells().to_vec();

        if sheet_formula::creates_cycle(pos, &new_refs, &self.table) {
            return Err(SheetError::CircularDependency(pos));
        }

        let old_refs = self
            .table
            .get(&pos)
            .map(|old| old.referenced_cells().to_vec());

        if old_refs.is_some() {
            self.invalidate_dependents(pos);
        }
        if let Some(old_refs) = &old_refs {
            self.unlink(pos, old_refs);
        }

        self.table.insert(pos, cell);

        for &q in &new_refs {
            if !self.occupied.contains(&q) {
                // Recursion is bounded: each implicit creation is itself Empty
                // (no references), so it cannot trigger a further insert.
                self.set_cell(q, "")?;
            }
            self.dependents.entry(q).or_default().insert(pos);
        }

        self.occupied.insert(pos);
        self.size.0 = self.size.0.max(pos.row + 1);
        self.size.1 = self.size.1.max(pos.col + 1);

        Ok(())
    }

    /// A non-owning handle to the cell at `pos`, or `None` if the position
    /// is outside the bounding box or absent from the table.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if pos.row >= self.size.0 || pos.col >= self.size.1 {
            return Ok(None);
        }
        Ok(self.cell_ref(pos))
    }

    /// A mutable handle to the cell at `pos`, or `None` if the position is
    /// outside the bounding box or absent from the table. Does not itself
    /// invalidate any cache; callers that mutate the returned cell's content
    /// directly are responsible for consistency, which is why `set_cell` is
    /// the normal way to change a cell's content instead.
    pub fn get_cell_mut(&mut self, pos: Position) -> Result<Option<&mut Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if pos.row >= self.size.0 || pos.col >= self.size.1 {
            return Ok(None);
        }
        Ok(self.table.get_mut(&pos))
    }

    /// Clear the cell at `pos`. A no-op if `pos` is outside the bounding
    /// box or already empty.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if !self.occupied.contains(&pos) {
            return Ok(());
        }

        self.invalidate_dependents(pos);
        self.table.remove(&pos);
        self.occupied.remove(&pos);

        let on_frontier = pos.row + 1 == self.size.0 || pos.col + 1 == self.size.1;
        if on_frontier {
            self.recompute_size();
        }

        Ok(())
    }

    /// Evaluate the cell at `pos`, returning its value (§4.1's
    /// `value()`/`GetValue` contract). Absent cells evaluate as `Empty`
    /// (numeric zero), matching `Sheet::set_cell`'s implicit-creation rule.
    pub fn value_at(&self, pos: Position) -> Result<CellValue> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(match self.table.get(&pos) {
            None => CellValue::Number(0.0),
            Some(cell) => cell.value(&mut |p| self.resolve(p)),
        })
    }

    /// The canonical text serialization of the cell at `pos` (§4.1's
    /// `text()`/`GetText`). Absent cells serialize as the empty string.
    pub fn text_at(&self, pos: Position) -> Result<String> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self
            .table
            .get(&pos)
            .map(Cell::text_repr)
            .unwrap_or_default())
    }

    /// Resolve a referenced position to a number for formula evaluation
    /// (§4.1): absent/Empty -> 0, Number -> itself, Text -> parsed as a
    /// float or `#VALUE!`, Error -> propagated.
    fn resolve(&self, pos: Position) -> Result<f64, FormulaErrorKind> {
        match self.table.get(&pos) {
            None => Ok(0.0),
            Some(cell) => match cell.value(&mut |p| self.resolve(p)) {
                CellValue::Number(n) => Ok(n),
                CellValue::Text(s) => s.trim().parse::<f64>().map_err(|_| FormulaErrorKind::Value),
                CellValue::Error(e) => Err(e),
            },
        }
    }

    /// Remove `pos` from `dependents[q]` for each `q` it used to reference.
    fn unlink(&mut self, pos: Position, old_refs: &[Position]) {
        for q in old_refs {
            if let Some(set) = self.dependents.get_mut(q) {
                set.remove(&pos);
            }
        }
    }

    /// Breadth-first invalidation of every cell transitively reachable from
    /// `pos` through `dependents`. A visited set keeps this linear even in
    /// the presence of diamond-shaped dependency graphs or stale reverse
    /// edges left behind by `clear_cell`.
    fn invalidate_dependents(&mut self, pos: Position) {
        let mut queue: VecDeque<Position> = VecDeque::new();
        queue.push_back(pos);
        let mut visited: HashSet<Position> = HashSet::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(deps) = self.dependents.get(&current) else {
                continue;
            };
            for &dep in deps {
                if let Some(cell) = self.table.get(&dep) {
                    cell.invalidate_cache();
                }
                if !visited.contains(&dep) {
                    queue.push_back(dep);
                }
            }
        }
    }

    fn recompute_size(&mut self) {
        self.size = self.occupied.iter().fold((0, 0), |(rows, cols), p| {
            (rows.max(p.row + 1), cols.max(p.col + 1))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn sets_and_reads_a_formula() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=1+2").unwrap();
        assert_eq!(sheet.value_at(pos(0, 0)).unwrap(), CellValue::Number(3.0));
        assert_eq!(sheet.text_at(pos(0, 0)).unwrap(), "=1+2");
        assert_eq!(sheet.printable_size(), (1, 1));
    }

    #[test]
    fn invalidates_a_dependent_when_its_input_changes() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "3").unwrap();
        sheet.set_cell(pos(1, 0), "=A1+1").unwrap();
        assert_eq!(sheet.value_at(pos(1, 0)).unwrap(), CellValue::Number(4.0));

        sheet.set_cell(pos(0, 0), "7").unwrap();
        assert_eq!(sheet.value_at(pos(1, 0)).unwrap(), CellValue::Number(8.0));
    }

    #[test]
    fn rejects_a_cycle_and_preserves_prior_state() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=B1").unwrap();
        // A1="=B1" implicitly materializes B1 as Empty, so the box is
        // already (1,2) before the second call.
        assert_eq!(sheet.printable_size(), (1, 2));

        let err = sheet.set_cell(pos(0, 1), "=A1").unwrap_err();
        assert_eq!(err, SheetError::CircularDependency(pos(0, 1)));
        // B1 must not have been installed as a formula by the failed attempt.
        assert_eq!(sheet.value_at(pos(0, 1)).unwrap(), CellValue::Number(0.0));
        assert_eq!(sheet.printable_size(), (1, 2));
    }

    #[test]
    fn div_by_zero_is_an_error_value() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=1/0").unwrap();
        assert_eq!(
            sheet.value_at(pos(0, 0)).unwrap(),
            CellValue::Error(FormulaErrorKind::Div0)
        );
    }

    #[test]
    fn unparseable_text_operand_is_value_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "hello").unwrap();
        sheet.set_cell(pos(1, 0), "=A1+1").unwrap();
        assert_eq!(
            sheet.value_at(pos(1, 0)).unwrap(),
            CellValue::Error(FormulaErrorKind::Value)
        );
    }

    #[test]
    fn escaped_leading_equals_is_text_not_formula() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "'=text").unwrap();
        assert_eq!(sheet.text_at(pos(0, 0)).unwrap(), "'=text");
        assert_eq!(
            sheet.value_at(pos(0, 0)).unwrap(),
            CellValue::Text("=text".into())
        );
    }

    #[test]
    fn referencing_an_unassigned_cell_creates_it_as_empty() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=B1").unwrap();
        assert_eq!(sheet.value_at(pos(0, 1)).unwrap(), CellValue::Number(0.0));
        assert_eq!(sheet.get_cell(pos(0, 1)).unwrap().is_some(), true);
    }

    #[test]
    fn get_cell_on_unassigned_position_is_none() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "1").unwrap();
        assert!(sheet.get_cell(pos(5, 5)).unwrap().is_none());
    }

    #[test]
    fn invalid_position_is_rejected() {
        let mut sheet = Sheet::new();
        let bad = Position::new(sheet_formula::position::MAX, 0);
        assert_eq!(
            sheet.set_cell(bad, "1").unwrap_err(),
            SheetError::InvalidPosition(bad)
        );
        assert_eq!(sheet.get_cell(bad).unwrap_err(), SheetError::InvalidPosition(bad));
        assert_eq!(sheet.clear_cell(bad).unwrap_err(), SheetError::InvalidPosition(bad));
    }

    #[test]
    fn clearing_the_sole_cell_resets_the_bounding_box() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(2, 3), "1").unwrap();
        sheet.clear_cell(pos(2, 3)).unwrap();
        assert_eq!(sheet.printable_size(), (0, 0));
        assert!(sheet.get_cell(pos(2, 3)).unwrap().is_none());
    }

    #[test]
    fn clear_cell_is_idempotent() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "1").unwrap();
        sheet.clear_cell(pos(0, 0)).unwrap();
        sheet.clear_cell(pos(0, 0)).unwrap();
        assert_eq!(sheet.printable_size(), (0, 0));
    }

    #[test]
    fn set_cell_is_idempotent() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=1+2").unwrap();
        sheet.set_cell(pos(0, 0), "=1+2").unwrap();
        assert_eq!(sheet.value_at(pos(0, 0)).unwrap(), CellValue::Number(3.0));
        assert_eq!(sheet.printable_size(), (1, 1));
    }

    #[test]
    fn clearing_a_referenced_cell_invalidates_its_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "5").unwrap();
        sheet.set_cell(pos(1, 0), "=A1+1").unwrap();
        assert_eq!(sheet.value_at(pos(1, 0)).unwrap(), CellValue::Number(6.0));

        sheet.clear_cell(pos(0, 0)).unwrap();
        assert_eq!(sheet.value_at(pos(1, 0)).unwrap(), CellValue::Number(1.0));
    }

    #[test]
    fn malformed_formula_does_not_change_sheet_state() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=1+2").unwrap();
        let err = sheet.set_cell(pos(0, 0), "=1+").unwrap_err();
        assert!(matches!(err, SheetError::FormulaParse(_)));
        assert_eq!(sheet.value_at(pos(0, 0)).unwrap(), CellValue::Number(3.0));
    }
}
