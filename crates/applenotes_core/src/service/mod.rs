//! Conversion use-case services.
//!
//! # Responsibility
//! - Orchestrate decode, build and render into per-note and batch APIs.
//! - Keep callers decoupled from the decoder and model internals.

pub mod batch;
pub mod note_converter;

pub use batch::{convert_batch, BatchCounts, BatchReport};
pub use note_converter::{
    convert_note, BlobKind, ConvertErrorKind, ConvertStage, ConvertedNote, NoteConvertError,
    NoteInput,
};
