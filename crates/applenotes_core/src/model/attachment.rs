//! Attachment references emitted for the external resolver.

use serde::Serialize;

/// Content family of an embedded object, derived from its type UTI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Document-scan gallery; its pages live in mergeable data.
    Scan,
    /// One scanned page after cropping/filters.
    ModifiedScan,
    Drawing,
    Table,
    UrlCard,
    Hashtag,
    Mention,
    InternalLink,
    /// Any other file (image, audio, PDF, ...).
    Media,
}

impl AttachmentKind {
    pub fn from_uti(uti: &str) -> Self {
        match uti {
            "com.apple.notes.gallery" => Self::Scan,
            "com.apple.paper.doc.scan" => Self::ModifiedScan,
            "com.apple.drawing" | "com.apple.drawing.2" | "com.apple.paper" => Self::Drawing,
            "com.apple.notes.table" => Self::Table,
            "public.url" => Self::UrlCard,
            "com.apple.notes.inlinetextattachment.hashtag" => Self::Hashtag,
            "com.apple.notes.inlinetextattachment.mention" => Self::Mention,
            "com.apple.notes.inlinetextattachment.link" => Self::InternalLink,
            _ => Self::Media,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::ModifiedScan => "modified_scan",
            Self::Drawing => "drawing",
            Self::Table => "table",
            Self::UrlCard => "url_card",
            Self::Hashtag => "hashtag",
            Self::Mention => "mention",
            Self::InternalLink => "internal_link",
            Self::Media => "media",
        }
    }

    /// Account-relative directory holding the exported bytes, if any.
    fn source_dir(self) -> Option<&'static str> {
        match self {
            Self::ModifiedScan => Some("Previews"),
            Self::Drawing => Some("FallbackImages"),
            Self::Media => Some("Media"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub identifier: String,
    pub kind: AttachmentKind,
    pub type_uti: Option<String>,
    /// Where the resolver should look for the bytes.
    pub source_hint: Option<String>,
}

impl AttachmentRef {
    pub fn new(identifier: impl Into<String>, kind: AttachmentKind) -> Self {
        let identifier = identifier.into();
        let source_hint = kind
            .source_dir()
            .map(|dir| format!("{dir}/{identifier}"));
        Self {
            identifier,
            kind,
            type_uti: None,
            source_hint,
        }
    }

    pub fn from_uti(identifier: impl Into<String>, uti: &str) -> Self {
        let mut reference = Self::new(identifier, AttachmentKind::from_uti(uti));
        reference.type_uti = Some(uti.to_string());
        reference
    }
}
