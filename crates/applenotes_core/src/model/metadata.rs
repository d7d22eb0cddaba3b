//! Per-note metadata supplied by the row-fetch collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier (`ZIDENTIFIER`).
pub type NoteId = Uuid;

/// Seconds between the Unix epoch and the Core Data reference date
/// (2001-01-01T00:00:00Z).
const CORE_DATA_EPOCH_OFFSET_SECS: f64 = 978_307_200.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub id: NoteId,
    pub title: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds.
    pub modified_at: Option<i64>,
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub password_protected: bool,
    pub handwriting_summary: Option<String>,
}

impl NoteMetadata {
    pub fn new(id: NoteId) -> Self {
        Self {
            id,
            title: None,
            created_at: None,
            modified_at: None,
            folder_id: None,
            password_protected: false,
            handwriting_summary: None,
        }
    }

    /// Fills creation and modification times from raw `ZCREATIONDATE` /
    /// `ZMODIFICATIONDATE` column values.
    pub fn with_core_data_times(mut self, created: Option<f64>, modified: Option<f64>) -> Self {
        self.created_at = created.map(apple_timestamp_to_unix_ms);
        self.modified_at = modified.map(apple_timestamp_to_unix_ms);
        self
    }
}

/// Converts a Core Data timestamp (seconds since 2001) to Unix epoch ms.
///
/// Callers reading note rows use this to fill `NoteMetadata`; see
/// [`NoteMetadata::with_core_data_times`].
pub fn apple_timestamp_to_unix_ms(timestamp: f64) -> i64 {
    ((timestamp + CORE_DATA_EPOCH_OFFSET_SECS) * 1000.0).floor() as i64
}
