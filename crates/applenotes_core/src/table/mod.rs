//! Replicated-table support: extraction, reconstruction, rendering.
//!
//! # Responsibility
//! - Turn the identifier-addressed row/column/cell object graph into an
//!   ordered grid and render it as a Markdown table.
//!
//! # Invariants
//! - Reconstruction is a pure function over rows, columns and cells.
//! - Data problems degrade the table (dropped cell, last-write-wins) and are
//!   reported as anomalies; they never fail the note.

pub mod extract;
pub mod grid;
pub mod model;
pub mod render;

pub use grid::{reconstruct, TableGrid};
pub use model::{AxisEntry, TableCell, TableModel};
pub use render::render_markdown;
