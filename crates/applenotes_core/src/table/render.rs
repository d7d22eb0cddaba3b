//! Markdown rendering for reconstructed grids.

use super::grid::TableGrid;

/// Renders a pipe table; the first grid row is the header.
///
/// Returns an empty string for a grid without rows or columns.
pub fn render_markdown(grid: &TableGrid) -> String {
    if grid.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (index, row) in grid.rows().iter().enumerate() {
        out.push('|');
        for cell in row {
            out.push(' ');
            out.push_str(&escape_cell(cell));
            out.push_str(" |");
        }
        out.push('\n');

        if index == 0 {
            out.push('|');
            out.push_str(&" -- |".repeat(grid.column_count()));
            out.push('\n');
        }
    }
    out
}

/// Keeps cell text on one line and away from column separators.
///
/// Backslashes are doubled before pipes are escaped so a literal `\|` in the
/// text cannot cancel the pipe escape.
pub fn escape_cell(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\n', "<br>")
        .replace('\\', "\\\\")
        .replace('|', "\\|")
}
