//! Typed note model builder.
//!
//! # Responsibility
//! - Slice the shared note text by cumulative run lengths.
//! - Translate run sub-messages into `StyleSet`, `ParagraphStyle` and
//!   `AttachmentRef`.
//! - Detect the content kind of a decoded tree.
//!
//! # Invariants
//! - Offsets are UTF-16 code units; a mismatch between the run sum and the
//!   text length is a `MalformedNote`, never silently clamped.

use super::attachment::{AttachmentKind, AttachmentRef};
use super::note::{AttributeRun, NoteContent, NoteDocument, ScanContent, TextContent};
use super::object_graph::{
    ObjectGraph, ENTRY_CUSTOM_MAP, MAP_ENTRY, MAP_ENTRY_VALUE, OBJECT_ID_STRING,
};
use super::style::{Color, FontSpec, ParagraphStyle, Script, StyleSet, StyleType, MAX_INDENT};
use super::{MalformedNote, ModelResult};
use crate::anomaly::AnomalyLog;
use crate::decode::{DecodedMessage, MERGEABLE_DATA_ROOT, NOTE_STORE_ROOT};
use crate::table;
use log::debug;

/// Root map type of a table object graph.
pub const TABLE_ROOT_TYPE: &str = "com.apple.notes.ICTable";

// Note / AttributeRun fields.
const NOTE_TEXT: u32 = 2;
const NOTE_ATTRIBUTE_RUN: u32 = 5;
const RUN_LENGTH: u32 = 1;
const RUN_PARAGRAPH_STYLE: u32 = 2;
const RUN_FONT: u32 = 3;
const RUN_FONT_WEIGHT: u32 = 5;
const RUN_UNDERLINED: u32 = 6;
const RUN_STRIKETHROUGH: u32 = 7;
const RUN_SUPERSCRIPT: u32 = 8;
const RUN_LINK: u32 = 9;
const RUN_COLOR: u32 = 10;
const RUN_ATTACHMENT_INFO: u32 = 12;

/// Builds the typed document for a decoded note-store or mergeable tree.
pub fn build(tree: &DecodedMessage) -> ModelResult<NoteDocument> {
    let document = match tree.type_name {
        NOTE_STORE_ROOT => {
            let note = tree
                .message(2)
                .ok_or(MalformedNote::MissingMessage("NoteStoreProto.document"))?
                .message(3)
                .ok_or(MalformedNote::MissingMessage("Document.note"))?;
            NoteDocument::new(NoteContent::Text(build_text_content(note)?))
        }
        MERGEABLE_DATA_ROOT => build_mergeable(tree)?,
        other => return Err(MalformedNote::UnsupportedRoot(other.to_string())),
    };

    debug!(
        "event=note_build module=model status=ok kind={} anomalies={}",
        document.kind().as_str(),
        document.anomalies.len()
    );
    Ok(document)
}

/// Builds rich text from one `Note` message.
pub fn build_text_content(note: &DecodedMessage) -> ModelResult<TextContent> {
    let text = note.str(NOTE_TEXT).unwrap_or_default();
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut runs = Vec::new();
    let mut offset = 0usize;
    for (run_index, run) in note.messages(NOTE_ATTRIBUTE_RUN).enumerate() {
        let length = run.int(RUN_LENGTH).unwrap_or(0);
        let length = usize::try_from(length)
            .map_err(|_| MalformedNote::NegativeRunLength { run_index, length })?;
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= units.len())
            .ok_or(MalformedNote::RunLengthMismatch {
                covered: offset.saturating_add(length),
                text_len: units.len(),
            })?;
        let slice = String::from_utf16(&units[offset..end])
            .map_err(|_| MalformedNote::SplitSurrogate { offset })?;

        runs.push(AttributeRun {
            text: slice,
            style: style_from_run(run),
            paragraph: paragraph_from_run(run),
            attachment: attachment_from_run(run),
        });
        offset = end;
    }

    if offset != units.len() {
        return Err(MalformedNote::RunLengthMismatch {
            covered: offset,
            text_len: units.len(),
        });
    }

    Ok(TextContent {
        text: text.to_string(),
        runs,
    })
}

fn style_from_run(run: &DecodedMessage) -> StyleSet {
    let mut style = StyleSet::default().with_font_weight(run.int(RUN_FONT_WEIGHT).unwrap_or(0));
    style.underline = run.int(RUN_UNDERLINED).unwrap_or(0) != 0;
    style.strikethrough = run.int(RUN_STRIKETHROUGH).unwrap_or(0) != 0;
    style.script = Script::from_raw(run.int(RUN_SUPERSCRIPT).unwrap_or(0));
    style.link = run
        .str(RUN_LINK)
        .filter(|link| !link.is_empty())
        .map(str::to_string);
    style.color = run.message(RUN_COLOR).map(|color| Color {
        red: color.float(1).unwrap_or(0.0),
        green: color.float(2).unwrap_or(0.0),
        blue: color.float(3).unwrap_or(0.0),
        alpha: color.float(4).unwrap_or(1.0),
    });
    style.font = run
        .message(RUN_FONT)
        .and_then(|font| FontSpec::new(font.str(1), font.float(2)));
    style
}

fn paragraph_from_run(run: &DecodedMessage) -> ParagraphStyle {
    let Some(paragraph) = run.message(RUN_PARAGRAPH_STYLE) else {
        return ParagraphStyle::default();
    };
    let style_type = StyleType::from_raw(paragraph.int(1).unwrap_or(-1));
    let checked = match style_type {
        StyleType::Checkbox => Some(
            paragraph
                .message(5)
                .and_then(|checklist| checklist.int(2))
                .unwrap_or(0)
                != 0,
        ),
        _ => None,
    };
    ParagraphStyle {
        style_type,
        indent: u32::try_from(paragraph.int(4).unwrap_or(0))
            .unwrap_or(0)
            .min(MAX_INDENT),
        checked,
        blockquote: paragraph.int(8).unwrap_or(0) != 0,
    }
}

fn attachment_from_run(run: &DecodedMessage) -> Option<AttachmentRef> {
    let info = run.message(RUN_ATTACHMENT_INFO)?;
    let identifier = info.str(1)?;
    Some(match info.str(2) {
        Some(uti) => AttachmentRef::from_uti(identifier, uti),
        None => AttachmentRef::new(identifier, AttachmentKind::Media),
    })
}

fn build_mergeable(tree: &DecodedMessage) -> ModelResult<NoteDocument> {
    let data = tree
        .message(2)
        .ok_or(MalformedNote::MissingMessage(
            "MergableDataProto.mergable_data_object",
        ))?
        .message(3)
        .ok_or(MalformedNote::MissingMessage(
            "MergableDataObject.mergeable_data_object_data",
        ))?;
    let graph = ObjectGraph::new(data);

    if let Some(root) = graph.find_map_of_type(TABLE_ROOT_TYPE) {
        let mut anomalies = AnomalyLog::new();
        let model = table::extract::extract_table(&graph, root, &mut anomalies)?;
        return Ok(NoteDocument {
            content: NoteContent::Table(model),
            anomalies: anomalies.into_vec(),
        });
    }

    let scan = scan_pages(&graph);
    if scan.attachments.is_empty() {
        return Err(MalformedNote::UnrecognizedMergeableData);
    }
    Ok(NoteDocument::new(NoteContent::Scan(scan)))
}

/// Gallery entries are maps whose first value names a page attachment.
fn scan_pages(graph: &ObjectGraph<'_>) -> ScanContent {
    let attachments = graph
        .entries()
        .iter()
        .filter_map(|entry| entry.message(ENTRY_CUSTOM_MAP))
        .filter_map(|map| map.messages(MAP_ENTRY).next())
        .filter_map(|first| first.message(MAP_ENTRY_VALUE))
        .filter_map(|value| value.str(OBJECT_ID_STRING))
        .filter(|identifier| !identifier.is_empty())
        .map(|identifier| AttachmentRef::new(identifier, AttachmentKind::ModifiedScan))
        .collect();
    ScanContent { attachments }
}

#[cfg(test)]
mod tests {
    use super::build_text_content;
    use crate::decode::{DecodedMessage, DecodedValue};
    use crate::model::style::{StyleType, MAX_INDENT};
    use crate::model::MalformedNote;

    fn run(length: i64) -> DecodedMessage {
        let mut run = DecodedMessage::new("AttributeRun");
        run.push(1, DecodedValue::Int(length));
        run
    }

    fn note(text: &str, runs: Vec<DecodedMessage>) -> DecodedMessage {
        let mut note = DecodedMessage::new("Note");
        note.push(2, DecodedValue::String(text.to_string()));
        for run in runs {
            note.push(5, DecodedValue::Message(run));
        }
        note
    }

    #[test]
    fn slices_text_by_cumulative_lengths() {
        let mut bold = run(5);
        bold.push(5, DecodedValue::Int(1));
        let content = build_text_content(&note("Hello world", vec![run(6), bold])).expect("build");

        assert_eq!(content.runs.len(), 2);
        assert_eq!(content.runs[0].text, "Hello ");
        assert!(content.runs[0].style.is_plain());
        assert_eq!(content.runs[1].text, "world");
        assert!(content.runs[1].style.bold);
    }

    #[test]
    fn lengths_count_utf16_units() {
        // The emoji is two UTF-16 units.
        let content =
            build_text_content(&note("a\u{1F600}b", vec![run(1), run(2), run(1)])).expect("build");
        let texts: Vec<_> = content.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "\u{1F600}", "b"]);
    }

    #[test]
    fn short_run_sum_is_malformed() {
        let err = build_text_content(&note("abcdef", vec![run(2), run(3)])).expect_err("short");
        assert_eq!(
            err,
            MalformedNote::RunLengthMismatch {
                covered: 5,
                text_len: 6
            }
        );
    }

    #[test]
    fn overlong_run_is_malformed() {
        let err = build_text_content(&note("abc", vec![run(2), run(4)])).expect_err("long");
        assert_eq!(
            err,
            MalformedNote::RunLengthMismatch {
                covered: 6,
                text_len: 3
            }
        );
    }

    #[test]
    fn split_surrogate_is_malformed() {
        let err =
            build_text_content(&note("\u{1F600}", vec![run(1), run(1)])).expect_err("split");
        assert_eq!(err, MalformedNote::SplitSurrogate { offset: 0 });
    }

    #[test]
    fn reads_checkbox_paragraph_style() {
        let mut checklist = DecodedMessage::new("Checklist");
        checklist.push(2, DecodedValue::Int(1));
        let mut paragraph = DecodedMessage::new("ParagraphStyle");
        paragraph.push(1, DecodedValue::Int(103));
        paragraph.push(4, DecodedValue::Int(2));
        paragraph.push(5, DecodedValue::Message(checklist));
        let mut styled = run(4);
        styled.push(2, DecodedValue::Message(paragraph));

        let content = build_text_content(&note("done", vec![styled])).expect("build");
        let paragraph = &content.runs[0].paragraph;
        assert_eq!(paragraph.style_type, StyleType::Checkbox);
        assert_eq!(paragraph.indent, 2);
        assert_eq!(paragraph.checked, Some(true));
    }

    #[test]
    fn corrupt_indent_is_clamped() {
        let mut paragraph = DecodedMessage::new("ParagraphStyle");
        paragraph.push(1, DecodedValue::Int(102));
        paragraph.push(4, DecodedValue::Int(i64::from(i32::MAX)));
        let mut styled = run(4);
        styled.push(2, DecodedValue::Message(paragraph));

        let content = build_text_content(&note("item", vec![styled])).expect("build");
        assert_eq!(content.runs[0].paragraph.indent, MAX_INDENT);
    }

    #[test]
    fn empty_note_has_no_runs() {
        let content = build_text_content(&note("", vec![])).expect("build");
        assert!(content.runs.is_empty());
        assert!(content.text.is_empty());
    }
}
