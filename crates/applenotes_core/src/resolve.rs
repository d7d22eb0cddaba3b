//! Collaborator seams for data the core does not own.
//!
//! # Responsibility
//! - Define how the converter asks for attachment bytes and for internal
//!   note-link targets.
//!
//! # Invariants
//! - Resolvers are called synchronously, at most once per reference.
//! - A missing target is a normal answer (`NotFound` / `None`), not an error.

use crate::model::attachment::AttachmentRef;
use serde::Serialize;

/// One attachment file extracted for the vault writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFile {
    /// Vault-relative file name used in the embed link.
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExtractedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Answer for one attachment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentResolution {
    /// File bytes to embed.
    File(ExtractedFile),
    /// Compressed mergeable data (embedded table or scan gallery).
    MergeableData(Vec<u8>),
    /// Display text for inline attachments (hashtags, mentions).
    Text(String),
    /// Rich link card.
    Link { title: Option<String>, url: String },
    NotFound,
}

pub trait AttachmentResolver {
    fn resolve_attachment(&self, reference: &AttachmentRef) -> AttachmentResolution;
}

pub trait NoteLinkResolver {
    /// Maps an `applenotes:note/<id>` URI to a vault path (without
    /// extension); `None` leaves the URI as a plain hyperlink.
    fn resolve_note_link(&self, uri: &str) -> Option<String>;
}

/// Resolver that finds nothing; useful for the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl AttachmentResolver for NullResolver {
    fn resolve_attachment(&self, _reference: &AttachmentRef) -> AttachmentResolution {
        AttachmentResolution::NotFound
    }
}

impl NoteLinkResolver for NullResolver {
    fn resolve_note_link(&self, _uri: &str) -> Option<String> {
        None
    }
}
