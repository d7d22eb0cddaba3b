//! Runtime configuration for conversion and logging.
//!
//! All fields have defaults so partial config files are accepted.

use serde::{Deserialize, Serialize};

/// Default replacement for line breaks inside table cells.
pub const DEFAULT_CELL_LINE_BREAK: &str = "<br>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Drop the first line (the title, already used as the file name).
    pub omit_first_line: bool,
    /// Prefix drawings/scans with a callout quoting the handwriting summary.
    pub include_handwriting: bool,
    pub table_cell_line_break: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            omit_first_line: false,
            include_handwriting: false,
            table_cell_line_break: DEFAULT_CELL_LINE_BREAK.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub convert: ConvertOptions,
}
