//! Identifier-addressed table representation.
//!
//! Rows and columns are replicated-set members: identity comes from a stable
//! uuid, position from an ordering key. Cells reference both by id.

use serde::Serialize;
use uuid::Uuid;

/// One row or column member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisEntry {
    pub id: Uuid,
    /// Monotonic position marker; gaps are allowed.
    pub ordering_key: i64,
}

impl AxisEntry {
    pub fn new(id: Uuid, ordering_key: i64) -> Self {
        Self { id, ordering_key }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell<C> {
    pub row: Uuid,
    pub column: Uuid,
    pub content: C,
}

/// Table before reconstruction, generic over the cell payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableModel<C> {
    /// Members in source order; display order comes from `ordering_key`.
    pub rows: Vec<AxisEntry>,
    pub columns: Vec<AxisEntry>,
    /// Cells in processing order (later cells win coordinate conflicts).
    pub cells: Vec<TableCell<C>>,
}

impl<C> Default for TableModel<C> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
            cells: Vec::new(),
        }
    }
}

impl<C> TableModel<C> {
    /// Replaces every cell payload, keeping ids and order.
    pub fn map_cells<D>(self, mut f: impl FnMut(C) -> D) -> TableModel<D> {
        TableModel {
            rows: self.rows,
            columns: self.columns,
            cells: self
                .cells
                .into_iter()
                .map(|cell| TableCell {
                    row: cell.row,
                    column: cell.column,
                    content: f(cell.content),
                })
                .collect(),
        }
    }
}
