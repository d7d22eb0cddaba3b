//! Attribute run merger.
//!
//! # Invariants
//! - Adjacent runs with equal style and paragraph style are coalesced.
//! - Every line break becomes its own fragment, whatever the style.
//! - Attachment runs are never coalesced.
//! - No fragment is empty; output order follows input order.

use crate::model::attachment::AttachmentRef;
use crate::model::note::AttributeRun;
use crate::model::style::{ParagraphStyle, StyleSet};
use serde::Serialize;

/// Merged, boundary-adjusted unit ready for markup translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub text: String,
    pub style: StyleSet,
    pub paragraph: ParagraphStyle,
    pub attachment: Option<AttachmentRef>,
}

impl Fragment {
    pub fn is_line_break(&self) -> bool {
        self.attachment.is_none() && self.text == "\n"
    }
}

pub fn merge(runs: &[AttributeRun]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut index = 0;
    while index < runs.len() {
        let head = &runs[index];
        let mut text = head.text.clone();
        let mut next = index + 1;
        while next < runs.len() && same_format(head, &runs[next]) {
            text.push_str(&runs[next].text);
            next += 1;
        }
        push_split(&mut fragments, text, head);
        index = next;
    }
    fragments
}

fn same_format(left: &AttributeRun, right: &AttributeRun) -> bool {
    left.attachment.is_none()
        && right.attachment.is_none()
        && left.style == right.style
        && left.paragraph == right.paragraph
}

fn push_split(fragments: &mut Vec<Fragment>, text: String, run: &AttributeRun) {
    let make = |piece: &str| Fragment {
        text: piece.to_string(),
        style: run.style.clone(),
        paragraph: run.paragraph.clone(),
        attachment: run.attachment.clone(),
    };

    if run.attachment.is_some() {
        fragments.push(make(&text));
        return;
    }

    for piece in text.split_inclusive('\n') {
        match piece.strip_suffix('\n') {
            Some(line) => {
                if !line.is_empty() {
                    fragments.push(make(line));
                }
                fragments.push(make("\n"));
            }
            None => fragments.push(make(piece)),
        }
    }
}
