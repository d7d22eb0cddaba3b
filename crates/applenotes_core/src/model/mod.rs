//! Typed note model built from decoded value trees.
//!
//! # Responsibility
//! - Define the domain structures the converters consume: attribute runs,
//!   style sets, attachment references, table and scan payloads.
//! - Map a generic decoded tree into exactly one content variant.
//!
//! # Invariants
//! - Attribute run lengths (UTF-16 units) sum to the note text length.
//! - Object-graph references are resolved through an index arena, never by
//!   holding cross-object links.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attachment;
pub mod build;
pub mod metadata;
pub mod note;
pub mod object_graph;
pub mod style;

pub type ModelResult<T> = Result<T, MalformedNote>;

/// Internal consistency failure in a decoded tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedNote {
    /// Cumulative run lengths disagree with the text length (UTF-16 units).
    RunLengthMismatch { covered: usize, text_len: usize },
    NegativeRunLength { run_index: usize, length: i64 },
    /// A run boundary falls inside a surrogate pair.
    SplitSurrogate { offset: usize },
    /// Required sub-message is absent, e.g. `Document.note`.
    MissingMessage(&'static str),
    /// Tree root is neither a note store nor mergeable data.
    UnsupportedRoot(String),
    /// Mergeable data holds neither a table nor a gallery.
    UnrecognizedMergeableData,
}

impl Display for MalformedNote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunLengthMismatch { covered, text_len } => write!(
                f,
                "attribute runs cover {covered} code units but text has {text_len}"
            ),
            Self::NegativeRunLength { run_index, length } => {
                write!(f, "attribute run {run_index} has negative length {length}")
            }
            Self::SplitSurrogate { offset } => {
                write!(f, "attribute run boundary at {offset} splits a surrogate pair")
            }
            Self::MissingMessage(path) => write!(f, "required message `{path}` is missing"),
            Self::UnsupportedRoot(name) => write!(f, "unsupported root message `{name}`"),
            Self::UnrecognizedMergeableData => {
                write!(f, "mergeable data contains neither a table nor a gallery")
            }
        }
    }
}

impl Error for MalformedNote {}
