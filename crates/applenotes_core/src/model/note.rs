//! Typed note document.
//!
//! # Responsibility
//! - Represent one decoded note as exactly one content variant.
//! - Keep attribute runs in source order over a shared text buffer.
//!
//! # Invariants
//! - Concatenating every run's `text` reproduces `TextContent::text`.
//! - A document is immutable once built.

use super::attachment::AttachmentRef;
use super::style::{ParagraphStyle, StyleSet};
use crate::anomaly::Anomaly;
use crate::table::TableModel;
use serde::Serialize;

/// Object replacement character marking an inline attachment.
pub const ATTACHMENT_PLACEHOLDER: char = '\u{fffc}';

/// One contiguous span of note text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRun {
    pub text: String,
    pub style: StyleSet,
    pub paragraph: ParagraphStyle,
    pub attachment: Option<AttachmentRef>,
}

impl AttributeRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, StyleSet::default())
    }

    pub fn styled(text: impl Into<String>, style: StyleSet) -> Self {
        Self {
            text: text.into(),
            style,
            paragraph: ParagraphStyle::default(),
            attachment: None,
        }
    }

    pub fn with_paragraph(mut self, paragraph: ParagraphStyle) -> Self {
        self.paragraph = paragraph;
        self
    }

    pub fn attachment(reference: AttachmentRef) -> Self {
        Self {
            text: ATTACHMENT_PLACEHOLDER.to_string(),
            style: StyleSet::default(),
            paragraph: ParagraphStyle::default(),
            attachment: Some(reference),
        }
    }
}

/// Rich text body: the full text plus the runs that partition it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextContent {
    pub text: String,
    pub runs: Vec<AttributeRun>,
}

impl TextContent {
    /// Builds content whose text is the concatenation of `runs`.
    pub fn from_runs(runs: Vec<AttributeRun>) -> Self {
        let text = runs.iter().map(|run| run.text.as_str()).collect();
        Self { text, runs }
    }
}

/// Attachment pages of a scan gallery in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanContent {
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Table,
    Scan,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Scan => "scan",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteContent {
    Text(TextContent),
    Table(TableModel<TextContent>),
    Scan(ScanContent),
}

impl NoteContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Table(_) => ContentKind::Table,
            Self::Scan(_) => ContentKind::Scan,
        }
    }
}

/// Typed result of building one decoded blob.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDocument {
    pub content: NoteContent,
    /// Non-fatal issues found while resolving the object graph.
    pub anomalies: Vec<Anomaly>,
}

impl NoteDocument {
    pub fn new(content: NoteContent) -> Self {
        Self {
            content,
            anomalies: Vec::new(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}
