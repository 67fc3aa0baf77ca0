//! Sheet state: the sparse cell table, the reverse-dependency graph, and
//! the printable bounding box.

use sheet_formula::{Cell, Position, Table};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The spreadsheet: a sparse table of cells plus the bookkeeping needed to
/// evaluate formulas lazily and keep their caches coherent.
pub struct Sheet {
    /// Sparse storage; absent entries are semantically `Empty`.
    pub(crate) table: Table,
    /// Positions currently holding a cell, kept sorted so the bounding box
    /// can be recomputed in a single pass after a boundary cell is cleared.
    pub(crate) occupied: BTreeSet<Position>,
    /// Reverse of the forward "references" relation: `dependents[p]` is the
    /// set of positions whose formula references `p`. May have entries for
    /// positions that were only ever implicitly referenced.
    pub(crate) dependents: HashMap<Position, HashSet<Position>>,
    /// One past the largest occupied row and column; (0, 0) when empty.
    pub(crate) size: (usize, usize),
}

impl Sheet {
    pub fn new() -> Sheet {
        Sheet {
            table: Table::new(),
            occupied: BTreeSet::new(),
            dependents: HashMap::new(),
            size: (0, 0),
        }
    }

    /// The smallest rectangle rooted at (0,0) containing all occupied cells.
    pub fn printable_size(&self) -> (usize, usize) {
        self.size
    }

    pub(crate) fn cell_ref(&self, pos: Position) -> Option<&Cell> {
        self.table.get(&pos)
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}
