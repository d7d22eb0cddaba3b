//! CRDT table reconstruction into a dense grid.
//!
//! # Invariants
//! - Grid position comes from the ordering key (stable sort), never from
//!   storage order.
//! - Every row has exactly `column_count` cells; unfilled cells are empty.
//! - Conflicting cells resolve last-write-wins; dangling cells are dropped.
//!   Both are recorded as anomalies.

use super::model::{AxisEntry, TableModel};
use crate::anomaly::{AnomalyKind, AnomalyLog};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Position-addressed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
    column_count: usize,
}

impl TableGrid {
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.column_count == 0
    }
}

/// Resolves ids to coordinates and places every cell.
pub fn reconstruct(model: TableModel<String>, anomalies: &mut AnomalyLog) -> TableGrid {
    let row_index = axis_positions(&model.rows, "row", anomalies);
    let column_index = axis_positions(&model.columns, "column", anomalies);
    let column_count = column_index.len();

    let mut rows = vec![vec![String::new(); column_count]; row_index.len()];
    let mut filled: HashSet<(usize, usize)> = HashSet::new();

    for cell in model.cells {
        let Some(&row) = row_index.get(&cell.row) else {
            anomalies.record(
                AnomalyKind::DanglingRowReference,
                format!("cell references unknown row {}", cell.row),
            );
            continue;
        };
        let Some(&column) = column_index.get(&cell.column) else {
            anomalies.record(
                AnomalyKind::DanglingColumnReference,
                format!("cell references unknown column {}", cell.column),
            );
            continue;
        };
        if !filled.insert((row, column)) {
            anomalies.record(
                AnomalyKind::CellConflict,
                format!("row {row} column {column} written twice; keeping the later cell"),
            );
        }
        rows[row][column] = cell.content;
    }

    TableGrid { rows, column_count }
}

fn axis_positions(
    entries: &[AxisEntry],
    axis: &str,
    anomalies: &mut AnomalyLog,
) -> HashMap<Uuid, usize> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&AxisEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.id) {
            unique.push(entry);
        } else {
            anomalies.record(
                AnomalyKind::DuplicateAxisId,
                format!("{axis} {} listed more than once", entry.id),
            );
        }
    }
    unique.sort_by_key(|entry| entry.ordering_key);
    unique
        .into_iter()
        .enumerate()
        .map(|(position, entry)| (entry.id, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::reconstruct;
    use crate::anomaly::{AnomalyKind, AnomalyLog};
    use crate::table::model::{AxisEntry, TableCell, TableModel};
    use uuid::Uuid;

    fn id(value: u128) -> Uuid {
        Uuid::from_u128(value)
    }

    fn cell(row: u128, column: u128, text: &str) -> TableCell<String> {
        TableCell {
            row: id(row),
            column: id(column),
            content: text.to_string(),
        }
    }

    #[test]
    fn orders_axes_by_ordering_key() {
        let model = TableModel {
            rows: vec![AxisEntry::new(id(10), 10), AxisEntry::new(id(2), 2)],
            columns: vec![
                AxisEntry::new(id(105), 5),
                AxisEntry::new(id(101), 1),
                AxisEntry::new(id(103), 3),
            ],
            cells: vec![
                cell(10, 105, "r10c5"),
                cell(2, 101, "r2c1"),
                cell(2, 103, "r2c3"),
                cell(10, 101, "r10c1"),
            ],
        };
        let mut log = AnomalyLog::new();
        let grid = reconstruct(model, &mut log);

        assert!(log.is_empty());
        assert_eq!(
            grid.rows(),
            &[
                vec!["r2c1".to_string(), "r2c3".to_string(), String::new()],
                vec!["r10c1".to_string(), String::new(), "r10c5".to_string()],
            ]
        );
    }

    #[test]
    fn pads_sparse_rows_to_column_count() {
        let model = TableModel {
            rows: vec![AxisEntry::new(id(1), 0), AxisEntry::new(id(2), 1)],
            columns: vec![AxisEntry::new(id(11), 0), AxisEntry::new(id(12), 1)],
            cells: vec![cell(1, 11, "only")],
        };
        let grid = reconstruct(model, &mut AnomalyLog::new());
        assert_eq!(grid.column_count(), 2);
        assert!(grid.rows().iter().all(|row| row.len() == 2));
        assert_eq!(grid.cell(1, 1), Some(""));
    }

    #[test]
    fn later_cell_wins_conflict() {
        let model = TableModel {
            rows: vec![AxisEntry::new(id(1), 0)],
            columns: vec![AxisEntry::new(id(11), 0)],
            cells: vec![cell(1, 11, "first"), cell(1, 11, "second")],
        };
        let mut log = AnomalyLog::new();
        let grid = reconstruct(model, &mut log);
        assert_eq!(grid.cell(0, 0), Some("second"));
        assert_eq!(log.count(AnomalyKind::CellConflict), 1);
    }

    #[test]
    fn dangling_cells_are_dropped_and_recorded() {
        let model = TableModel {
            rows: vec![AxisEntry::new(id(1), 0)],
            columns: vec![AxisEntry::new(id(11), 0)],
            cells: vec![cell(1, 11, "kept"), cell(1, 99, "lost"), cell(7, 11, "lost")],
        };
        let mut log = AnomalyLog::new();
        let grid = reconstruct(model, &mut log);
        assert_eq!(grid.cell(0, 0), Some("kept"));
        assert_eq!(log.count(AnomalyKind::DanglingColumnReference), 1);
        assert_eq!(log.count(AnomalyKind::DanglingRowReference), 1);
    }

    #[test]
    fn equal_keys_keep_source_order_and_duplicates_are_ignored() {
        let model = TableModel {
            rows: vec![AxisEntry::new(id(1), 0)],
            columns: vec![
                AxisEntry::new(id(12), 4),
                AxisEntry::new(id(11), 4),
                AxisEntry::new(id(12), 0),
            ],
            cells: vec![cell(1, 11, "b"), cell(1, 12, "a")],
        };
        let mut log = AnomalyLog::new();
        let grid = reconstruct(model, &mut log);
        assert_eq!(grid.rows()[0], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(log.count(AnomalyKind::DuplicateAxisId), 1);
    }
}
