//! Batch conversion with per-note isolation.
//!
//! # Invariants
//! - Every input yields exactly one entry in `converted` or `failures`.
//! - Output order follows input order.

use super::note_converter::{convert_note, ConvertErrorKind, ConvertedNote, NoteConvertError, NoteInput};
use crate::convert::ConvertContext;
use log::info;
use serde::Serialize;
use std::time::Instant;

/// Per-outcome tallies for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub converted: usize,
    pub skipped_password_protected: usize,
    pub decompression_failures: usize,
    pub schema_mismatches: usize,
    pub malformed: usize,
    /// Anomalies summed over converted notes.
    pub anomalies: usize,
}

impl BatchCounts {
    pub fn failed(&self) -> usize {
        self.decompression_failures + self.schema_mismatches + self.malformed
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConvertedNote>,
    pub failures: Vec<NoteConvertError>,
    pub counts: BatchCounts,
}

impl BatchReport {
    fn push(&mut self, outcome: Result<ConvertedNote, NoteConvertError>) {
        match outcome {
            Ok(note) => {
                self.counts.converted += 1;
                self.counts.anomalies += note.anomalies.len();
                self.converted.push(note);
            }
            Err(err) => {
                match err.kind {
                    ConvertErrorKind::PasswordProtected => {
                        self.counts.skipped_password_protected += 1
                    }
                    ConvertErrorKind::Decompression(_) => self.counts.decompression_failures += 1,
                    ConvertErrorKind::SchemaMismatch(_) => self.counts.schema_mismatches += 1,
                    ConvertErrorKind::Malformed(_) => self.counts.malformed += 1,
                }
                self.failures.push(err);
            }
        }
    }
}

/// Converts `inputs` one after another; a failing note is recorded and the
/// batch continues.
pub fn convert_batch(inputs: &[NoteInput], context: ConvertContext<'_>) -> BatchReport {
    let started_at = Instant::now();
    let mut report = BatchReport::default();
    for input in inputs {
        report.push(convert_note(input, context));
    }

    info!(
        "event=batch_convert module=service status=ok total={} converted={} skipped={} failed={} anomalies={} duration_ms={}",
        inputs.len(),
        report.counts.converted,
        report.counts.skipped_password_protected,
        report.counts.failed(),
        report.counts.anomalies,
        started_at.elapsed().as_millis()
    );
    report
}
