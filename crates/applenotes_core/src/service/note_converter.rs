//! Single-note conversion pipeline.
//!
//! # Responsibility
//! - Run precheck, decode, build and render for one note blob.
//! - Attach note identity and failing stage to every error.
//!
//! # Invariants
//! - Password-protected notes are rejected before any decoding.
//! - A failing note never affects any other note.
//! - The blob and intermediate trees are dropped when this call returns.

use crate::anomaly::Anomaly;
use crate::config::ConvertOptions;
use crate::convert::{ConvertContext, ConvertSession};
use crate::decode::{apple_notes_schema, decode, DecodeError, MERGEABLE_DATA_ROOT, NOTE_STORE_ROOT};
use crate::model::build::build;
use crate::model::metadata::{NoteId, NoteMetadata};
use crate::model::note::ContentKind;
use crate::model::MalformedNote;
use crate::resolve::ExtractedFile;
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Which root message a blob is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    /// Note body (`ZICNOTEDATA.ZDATA`).
    NoteStore,
    /// Table or scan gallery (`ZICCLOUDSYNCINGOBJECT.ZMERGEABLEDATA1`).
    MergeableData,
}

impl BlobKind {
    pub fn root_message(self) -> &'static str {
        match self {
            Self::NoteStore => NOTE_STORE_ROOT,
            Self::MergeableData => MERGEABLE_DATA_ROOT,
        }
    }
}

/// One note handed over by the external reader.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInput {
    pub metadata: NoteMetadata,
    pub blob: Vec<u8>,
    pub blob_kind: BlobKind,
}

impl NoteInput {
    pub fn note_store(metadata: NoteMetadata, blob: Vec<u8>) -> Self {
        Self {
            metadata,
            blob,
            blob_kind: BlobKind::NoteStore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedNote {
    pub note_id: NoteId,
    pub kind: ContentKind,
    pub markdown: String,
    pub files: Vec<ExtractedFile>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertStage {
    Precheck,
    Decode,
    Build,
}

impl ConvertStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precheck => "precheck",
            Self::Decode => "decode",
            Self::Build => "build",
        }
    }
}

/// Why a note could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertErrorKind {
    Decompression(DecodeError),
    /// Blob bytes disagree with the schema (wire type, truncation, UTF-8).
    SchemaMismatch(DecodeError),
    Malformed(MalformedNote),
    PasswordProtected,
}

impl ConvertErrorKind {
    /// Stable machine-readable code for logs and batch reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decompression(_) => "decompression",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::Malformed(_) => "malformed",
            Self::PasswordProtected => "password_protected",
        }
    }
}

impl From<DecodeError> for ConvertErrorKind {
    fn from(value: DecodeError) -> Self {
        match value {
            DecodeError::Decompression(_) => Self::Decompression(value),
            other => Self::SchemaMismatch(other),
        }
    }
}

impl From<MalformedNote> for ConvertErrorKind {
    fn from(value: MalformedNote) -> Self {
        Self::Malformed(value)
    }
}

impl Display for ConvertErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decompression(err) | Self::SchemaMismatch(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "{err}"),
            Self::PasswordProtected => write!(f, "note is password protected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteConvertError {
    pub note_id: NoteId,
    pub stage: ConvertStage,
    pub kind: ConvertErrorKind,
}

impl Display for NoteConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "note {} failed at {}: {}",
            self.note_id,
            self.stage.as_str(),
            self.kind
        )
    }
}

impl Error for NoteConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ConvertErrorKind::Decompression(err) | ConvertErrorKind::SchemaMismatch(err) => {
                Some(err)
            }
            ConvertErrorKind::Malformed(err) => Some(err),
            ConvertErrorKind::PasswordProtected => None,
        }
    }
}

/// Converts one note blob to Markdown.
///
/// # Errors
/// - `PasswordProtected` when the metadata flags the note as locked.
/// - `Decompression` / `SchemaMismatch` when the blob cannot be decoded.
/// - `Malformed` when the decoded tree violates note structure rules.
pub fn convert_note(
    input: &NoteInput,
    context: ConvertContext<'_>,
) -> Result<ConvertedNote, NoteConvertError> {
    let started_at = Instant::now();
    let note_id = input.metadata.id;

    if input.metadata.password_protected {
        info!(
            "event=note_convert module=service status=skip note_id={} reason=password_protected",
            note_id
        );
        return Err(NoteConvertError {
            note_id,
            stage: ConvertStage::Precheck,
            kind: ConvertErrorKind::PasswordProtected,
        });
    }

    let fail = |stage: ConvertStage, kind: ConvertErrorKind| {
        error!(
            "event=note_convert module=service status=error note_id={} stage={} error_code={} error={}",
            note_id,
            stage.as_str(),
            kind.code(),
            kind
        );
        NoteConvertError {
            note_id,
            stage,
            kind,
        }
    };

    let tree = decode(&input.blob, apple_notes_schema(), input.blob_kind.root_message())
        .map_err(|err| fail(ConvertStage::Decode, err.into()))?;
    let document = build(&tree).map_err(|err| fail(ConvertStage::Build, err.into()))?;
    drop(tree);

    let kind = document.kind();
    let mut session = ConvertSession::new(context);
    session.absorb(document.anomalies);
    let body = session.render_content(document.content);
    let markdown = with_handwriting(body, &input.metadata, context.options);
    let (files, anomalies) = session.finish();

    info!(
        "event=note_convert module=service status=ok note_id={} kind={} anomalies={} files={} duration_ms={}",
        note_id,
        kind.as_str(),
        anomalies.len(),
        files.len(),
        started_at.elapsed().as_millis()
    );

    Ok(ConvertedNote {
        note_id,
        kind,
        markdown,
        files,
        anomalies,
    })
}

/// Prefixes `body` with a collapsed callout quoting the handwriting summary.
fn with_handwriting(body: String, metadata: &NoteMetadata, options: &ConvertOptions) -> String {
    let summary = match metadata.handwriting_summary.as_deref() {
        Some(summary) if options.include_handwriting && !summary.trim().is_empty() => summary,
        _ => return body,
    };

    let quoted = summary
        .trim_end()
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("> [!Handwriting]-\n{quoted}\n\n{body}")
}
