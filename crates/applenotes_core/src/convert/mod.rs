//! Markdown conversion of typed note documents.
//!
//! # Responsibility
//! - Merge attribute runs into fragments, translate inline styles, apply
//!   block formatting and resolve attachments.
//!
//! # Invariants
//! - Conversion never fails: unresolved data becomes a placeholder plus an
//!   anomaly.
//! - Output depends only on the document, the options and the resolvers.

pub mod block;
pub mod markup;
pub mod merge;
pub mod session;

pub use merge::{merge, Fragment};
pub use session::{ConvertSession, RenderMode};

use crate::config::ConvertOptions;
use crate::resolve::{AttachmentResolver, NoteLinkResolver};

/// Borrowed inputs shared by every note in one conversion run.
#[derive(Clone, Copy)]
pub struct ConvertContext<'a> {
    pub options: &'a ConvertOptions,
    pub attachments: &'a dyn AttachmentResolver,
    pub links: &'a dyn NoteLinkResolver,
}

impl<'a> ConvertContext<'a> {
    pub fn new(
        options: &'a ConvertOptions,
        attachments: &'a dyn AttachmentResolver,
        links: &'a dyn NoteLinkResolver,
    ) -> Self {
        Self {
            options,
            attachments,
            links,
        }
    }
}
