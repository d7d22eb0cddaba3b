//! Non-fatal data inconsistencies surfaced alongside converted output.
//!
//! # Invariants
//! - Recording an anomaly never aborts conversion.
//! - Every recorded anomaly is logged once at `warn` and returned to the
//!   caller; none are dropped.

use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Cell points at a row id that is not in the table's row set.
    DanglingRowReference,
    /// Cell points at a column id that is not in the table's column set.
    DanglingColumnReference,
    /// Two cells resolved to the same grid coordinate; the later one won.
    CellConflict,
    /// Row or column id listed twice; the first occurrence was kept.
    DuplicateAxisId,
    /// Ordering entry without a matching identity (or the reverse).
    DanglingOrderingReference,
    /// Object index or uuid index outside the mergeable-data tables.
    UnresolvedObjectReference,
    /// Resolver reported `NotFound` for an attachment.
    MissingAttachment,
    /// Embedded table/gallery blob could not be decoded or was nested too deep.
    UnreadableEmbeddedData,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DanglingRowReference => "dangling_row_reference",
            Self::DanglingColumnReference => "dangling_column_reference",
            Self::CellConflict => "cell_conflict",
            Self::DuplicateAxisId => "duplicate_axis_id",
            Self::DanglingOrderingReference => "dangling_ordering_reference",
            Self::UnresolvedObjectReference => "unresolved_object_reference",
            Self::MissingAttachment => "missing_attachment",
            Self::UnreadableEmbeddedData => "unreadable_embedded_data",
        }
    }

    fn module(self) -> &'static str {
        match self {
            Self::MissingAttachment | Self::UnreadableEmbeddedData => "convert",
            _ => "table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub detail: String,
}

/// Ordered collector for anomalies raised during one note's conversion.
#[derive(Debug, Default)]
pub struct AnomalyLog {
    entries: Vec<Anomaly>,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: AnomalyKind, detail: impl Into<String>) {
        let detail = detail.into();
        warn!(
            "event=anomaly module={} status=warn kind={} detail={}",
            kind.module(),
            kind.as_str(),
            detail
        );
        self.entries.push(Anomaly { kind, detail });
    }

    pub fn extend(&mut self, anomalies: impl IntoIterator<Item = Anomaly>) {
        self.entries.extend(anomalies);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn as_slice(&self) -> &[Anomaly] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Anomaly> {
        self.entries
    }
}
