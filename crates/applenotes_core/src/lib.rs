//! Core conversion logic for Apple Notes imports.
//! Decodes compressed note blobs and renders them as Markdown.

pub mod anomaly;
pub mod config;
pub mod convert;
pub mod decode;
pub mod logging;
pub mod model;
pub mod resolve;
pub mod service;
pub mod table;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyLog};
pub use config::{ConvertOptions, CoreConfig, LoggingConfig};
pub use convert::ConvertContext;
pub use decode::{decode, DecodeError, DecodedMessage, DecodedValue};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attachment::{AttachmentKind, AttachmentRef};
pub use model::metadata::{apple_timestamp_to_unix_ms, NoteId, NoteMetadata};
pub use model::note::{ContentKind, NoteContent, NoteDocument};
pub use model::MalformedNote;
pub use resolve::{
    AttachmentResolution, AttachmentResolver, ExtractedFile, NoteLinkResolver, NullResolver,
};
pub use service::{
    convert_batch, convert_note, BatchCounts, BatchReport, BlobKind, ConvertErrorKind,
    ConvertStage, ConvertedNote, NoteConvertError, NoteInput,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
