//! Per-note rendering state.
//!
//! # Responsibility
//! - Render text, table and scan content to Markdown.
//! - Resolve inline attachments through the caller's resolver and collect
//!   extracted files and anomalies for the note.
//!
//! # Invariants
//! - One session renders one note; nothing is shared between notes.
//! - Embedded mergeable data is expanded only at the top level; deeper
//!   references degrade to a placeholder plus an anomaly.

use super::block::BlockFormatter;
use super::markup::{self, is_note_uri, link_destination, wiki_link};
use super::merge::{merge, Fragment};
use super::ConvertContext;
use crate::anomaly::{Anomaly, AnomalyKind, AnomalyLog};
use crate::decode::{apple_notes_schema, decode, MERGEABLE_DATA_ROOT};
use crate::model::attachment::{AttachmentKind, AttachmentRef};
use crate::model::build::build;
use crate::model::note::{NoteContent, ScanContent, TextContent};
use crate::resolve::{AttachmentResolution, ExtractedFile};
use crate::table::{reconstruct, render_markdown, TableModel};

/// Embedded mergeable data is expanded at depths below this.
const MAX_EMBED_DEPTH: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Full note body with block prefixes.
    Document,
    /// Single table cell: no block prefixes, line breaks replaced.
    TableCell,
}

pub struct ConvertSession<'a> {
    context: ConvertContext<'a>,
    anomalies: AnomalyLog,
    files: Vec<ExtractedFile>,
    depth: usize,
}

impl<'a> ConvertSession<'a> {
    pub fn new(context: ConvertContext<'a>) -> Self {
        Self {
            context,
            anomalies: AnomalyLog::new(),
            files: Vec::new(),
            depth: 0,
        }
    }

    /// Adds anomalies raised before rendering (already logged).
    pub fn absorb(&mut self, anomalies: Vec<Anomaly>) {
        self.anomalies.extend(anomalies);
    }

    pub fn render_content(&mut self, content: NoteContent) -> String {
        match content {
            NoteContent::Text(text) => self.render_text(&text, RenderMode::Document),
            NoteContent::Table(table) => self.render_table(table),
            NoteContent::Scan(scan) => self.render_scan(&scan),
        }
    }

    pub fn render_text(&mut self, content: &TextContent, mode: RenderMode) -> String {
        let fragments = merge(&content.runs);
        let options = self.context.options;
        let mut skipping_first_line = mode == RenderMode::Document
            && self.depth == 0
            && options.omit_first_line
            && content.text.trim_end().contains('\n');

        let mut blocks = BlockFormatter::new();
        let mut out = String::new();
        let mut at_line_start = true;

        for fragment in &fragments {
            if skipping_first_line {
                if fragment.is_line_break() {
                    skipping_first_line = false;
                }
                continue;
            }

            if mode == RenderMode::TableCell {
                if fragment.is_line_break() {
                    out.push_str(&options.table_cell_line_break);
                } else {
                    out.push_str(&self.render_inline(fragment));
                }
                continue;
            }

            if at_line_start {
                out.push_str(&blocks.line_prefix(&fragment.paragraph, fragment.is_line_break()));
            }
            at_line_start = fragment.is_line_break();

            if fragment.is_line_break() {
                out.push('\n');
            } else if blocks.in_code_block() && fragment.attachment.is_none() {
                out.push_str(&fragment.text);
            } else {
                out.push_str(&self.render_inline(fragment));
            }
        }

        match mode {
            RenderMode::TableCell => out.trim().to_string(),
            RenderMode::Document => {
                let closing = blocks.finish(out.is_empty() || out.ends_with('\n'));
                out.push_str(&closing);
                out.trim_start_matches(['\n', '\r']).trim_end().to_string()
            }
        }
    }

    /// Renders cell content, reconstructs the grid and emits a pipe table.
    pub fn render_table(&mut self, table: TableModel<TextContent>) -> String {
        let rendered = table.map_cells(|content| self.render_text(&content, RenderMode::TableCell));
        let grid = reconstruct(rendered, &mut self.anomalies);
        render_markdown(&grid)
    }

    pub fn render_scan(&mut self, scan: &ScanContent) -> String {
        let pages: Vec<String> = scan
            .attachments
            .iter()
            .map(|page| self.render_attachment(page))
            .collect();
        pages.join("\n")
    }

    pub fn finish(self) -> (Vec<ExtractedFile>, Vec<Anomaly>) {
        (self.files, self.anomalies.into_vec())
    }

    fn render_inline(&mut self, fragment: &Fragment) -> String {
        match &fragment.attachment {
            Some(reference) => self.render_attachment(reference),
            None => markup::translate(fragment, self.context.links),
        }
    }

    fn render_attachment(&mut self, reference: &AttachmentRef) -> String {
        match self.context.attachments.resolve_attachment(reference) {
            AttachmentResolution::File(file) => {
                let embed = format!("![[{}]]", file.file_name);
                self.files.push(file);
                embed
            }
            AttachmentResolution::MergeableData(bytes) => self.render_embedded(reference, &bytes),
            AttachmentResolution::Text(text) => text,
            AttachmentResolution::Link { title, url } => self.render_card(title, url),
            AttachmentResolution::NotFound => {
                self.anomalies.record(
                    AnomalyKind::MissingAttachment,
                    format!("{} {}", reference.kind.as_str(), reference.identifier),
                );
                placeholder("missing", reference)
            }
        }
    }

    fn render_card(&self, title: Option<String>, url: String) -> String {
        if is_note_uri(&url) {
            if let Some(path) = self.context.links.resolve_note_link(&url) {
                return wiki_link(&path, title.as_deref().unwrap_or_default());
            }
        }
        let label = title.filter(|title| !title.trim().is_empty()).unwrap_or_else(|| url.clone());
        format!("[{label}]({})", link_destination(&url))
    }

    fn render_embedded(&mut self, reference: &AttachmentRef, bytes: &[u8]) -> String {
        if self.depth >= MAX_EMBED_DEPTH {
            self.anomalies.record(
                AnomalyKind::UnreadableEmbeddedData,
                format!(
                    "{} {} nested deeper than {MAX_EMBED_DEPTH}",
                    reference.kind.as_str(),
                    reference.identifier
                ),
            );
            return placeholder("unreadable", reference);
        }

        let document = decode(bytes, apple_notes_schema(), MERGEABLE_DATA_ROOT)
            .map_err(|err| err.to_string())
            .and_then(|tree| build(&tree).map_err(|err| err.to_string()));
        let document = match document {
            Ok(document) => document,
            Err(err) => {
                self.anomalies.record(
                    AnomalyKind::UnreadableEmbeddedData,
                    format!("{} {}: {err}", reference.kind.as_str(), reference.identifier),
                );
                return placeholder("unreadable", reference);
            }
        };

        self.anomalies.extend(document.anomalies);
        self.depth += 1;
        let rendered = self.render_content(document.content);
        self.depth -= 1;

        if reference.kind == AttachmentKind::Table {
            format!("\n{rendered}")
        } else {
            rendered
        }
    }
}

fn placeholder(state: &str, reference: &AttachmentRef) -> String {
    format!(
        "<!-- {state} attachment: {} {} -->",
        reference.kind.as_str(),
        reference.identifier
    )
}

#[cfg(test)]
mod tests {
    use super::{ConvertSession, RenderMode};
    use crate::anomaly::AnomalyKind;
    use crate::config::ConvertOptions;
    use crate::convert::ConvertContext;
    use crate::model::attachment::{AttachmentKind, AttachmentRef};
    use crate::model::note::{AttributeRun, ScanContent, TextContent};
    use crate::model::style::{ParagraphStyle, StyleSet, StyleType};
    use crate::resolve::{
        AttachmentResolution, AttachmentResolver, ExtractedFile, NoteLinkResolver, NullResolver,
    };

    struct FixtureResolver;

    impl AttachmentResolver for FixtureResolver {
        fn resolve_attachment(&self, reference: &AttachmentRef) -> AttachmentResolution {
            match reference.kind {
                AttachmentKind::Media => AttachmentResolution::File(ExtractedFile::new(
                    format!("{}.png", reference.identifier),
                    vec![1, 2, 3],
                )),
                AttachmentKind::Hashtag => AttachmentResolution::Text("#todo".to_string()),
                AttachmentKind::UrlCard => AttachmentResolution::Link {
                    title: Some("Example".to_string()),
                    url: "https://example.com".to_string(),
                },
                AttachmentKind::Table => AttachmentResolution::MergeableData(vec![0x00, 0x01]),
                _ => AttachmentResolution::NotFound,
            }
        }
    }

    impl NoteLinkResolver for FixtureResolver {
        fn resolve_note_link(&self, _uri: &str) -> Option<String> {
            None
        }
    }

    fn render(runs: Vec<AttributeRun>, options: &ConvertOptions) -> String {
        let context = ConvertContext::new(options, &NullResolver, &NullResolver);
        let mut session = ConvertSession::new(context);
        session.render_text(&TextContent::from_runs(runs), RenderMode::Document)
    }

    #[test]
    fn renders_mixed_bold_text() {
        let runs = vec![
            AttributeRun::plain("Hello "),
            AttributeRun::styled("world", StyleSet::bold()),
        ];
        assert_eq!(render(runs, &ConvertOptions::default()), "Hello **world**");
    }

    #[test]
    fn bold_span_over_line_break_closes_per_line() {
        let runs = vec![AttributeRun::styled("A\nB", StyleSet::bold())];
        assert_eq!(render(runs, &ConvertOptions::default()), "**A**\n**B**");
    }

    #[test]
    fn omit_first_line_drops_title() {
        let options = ConvertOptions {
            omit_first_line: true,
            ..ConvertOptions::default()
        };
        let runs = vec![
            AttributeRun::plain("Title\n")
                .with_paragraph(ParagraphStyle::of_type(StyleType::Title)),
            AttributeRun::plain("Body"),
        ];
        assert_eq!(render(runs, &options), "Body");

        let single = vec![AttributeRun::plain("Only line")];
        assert_eq!(render(single, &options), "Only line");
    }

    #[test]
    fn paragraphs_get_block_prefixes() {
        let runs = vec![
            AttributeRun::plain("Plan\n")
                .with_paragraph(ParagraphStyle::of_type(StyleType::Heading)),
            AttributeRun::plain("milk\n").with_paragraph(ParagraphStyle {
                checked: Some(true),
                ..ParagraphStyle::of_type(StyleType::Checkbox)
            }),
            AttributeRun::plain("eggs").with_paragraph(ParagraphStyle {
                checked: Some(false),
                ..ParagraphStyle::of_type(StyleType::Checkbox)
            }),
        ];
        assert_eq!(
            render(runs, &ConvertOptions::default()),
            "## Plan\n- [x] milk\n- [ ] eggs"
        );
    }

    #[test]
    fn monospaced_lines_are_fenced_raw() {
        let code = ParagraphStyle::of_type(StyleType::Monospaced);
        let runs = vec![
            AttributeRun::plain("Intro\n"),
            AttributeRun::styled("let x = 1;\n", StyleSet::bold()).with_paragraph(code.clone()),
            AttributeRun::plain("x *= 2;").with_paragraph(code),
        ];
        assert_eq!(
            render(runs, &ConvertOptions::default()),
            "Intro\n```\nlet x = 1;\nx *= 2;\n```"
        );
    }

    #[test]
    fn table_cell_mode_replaces_breaks_and_trims() {
        let options = ConvertOptions::default();
        let context = ConvertContext::new(&options, &NullResolver, &NullResolver);
        let mut session = ConvertSession::new(context);
        let content = TextContent::from_runs(vec![
            AttributeRun::plain(" one\n").with_paragraph(ParagraphStyle::of_type(StyleType::Title)),
            AttributeRun::styled("two", StyleSet::italic()),
        ]);
        assert_eq!(
            session.render_text(&content, RenderMode::TableCell),
            "one<br>*two*"
        );
    }

    #[test]
    fn attachments_resolve_through_resolver() {
        let options = ConvertOptions::default();
        let context = ConvertContext::new(&options, &FixtureResolver, &FixtureResolver);
        let mut session = ConvertSession::new(context);
        let content = TextContent::from_runs(vec![
            AttributeRun::attachment(AttachmentRef::new("IMG", AttachmentKind::Media)),
            AttributeRun::plain(" "),
            AttributeRun::attachment(AttachmentRef::new("H1", AttachmentKind::Hashtag)),
            AttributeRun::plain(" "),
            AttributeRun::attachment(AttachmentRef::new("U1", AttachmentKind::UrlCard)),
            AttributeRun::plain(" "),
            AttributeRun::attachment(AttachmentRef::new("D1", AttachmentKind::Drawing)),
        ]);
        let markdown = session.render_text(&content, RenderMode::Document);
        assert_eq!(
            markdown,
            "![[IMG.png]] #todo [Example](https://example.com) <!-- missing attachment: drawing D1 -->"
        );

        let (files, anomalies) = session.finish();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "IMG.png");
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::MissingAttachment);
    }

    struct AwkwardCard;

    impl AttachmentResolver for AwkwardCard {
        fn resolve_attachment(&self, _reference: &AttachmentRef) -> AttachmentResolution {
            AttachmentResolution::Link {
                title: None,
                url: "https://example.com/a (b)".to_string(),
            }
        }
    }

    #[test]
    fn url_card_with_spaces_keeps_link_intact() {
        let options = ConvertOptions::default();
        let context = ConvertContext::new(&options, &AwkwardCard, &NullResolver);
        let mut session = ConvertSession::new(context);
        let content = TextContent::from_runs(vec![AttributeRun::attachment(AttachmentRef::new(
            "U2",
            AttachmentKind::UrlCard,
        ))]);
        assert_eq!(
            session.render_text(&content, RenderMode::Document),
            "[https://example.com/a (b)](<https://example.com/a (b)>)"
        );
    }

    #[test]
    fn unreadable_embedded_table_degrades_to_placeholder() {
        let options = ConvertOptions::default();
        let context = ConvertContext::new(&options, &FixtureResolver, &FixtureResolver);
        let mut session = ConvertSession::new(context);
        let content = TextContent::from_runs(vec![AttributeRun::attachment(AttachmentRef::new(
            "T1",
            AttachmentKind::Table,
        ))]);
        let markdown = session.render_text(&content, RenderMode::Document);
        assert_eq!(markdown, "<!-- unreadable attachment: table T1 -->");

        let (_, anomalies) = session.finish();
        assert_eq!(anomalies[0].kind, AnomalyKind::UnreadableEmbeddedData);
    }

    #[test]
    fn scan_pages_render_one_per_line() {
        let options = ConvertOptions::default();
        let context = ConvertContext::new(&options, &FixtureResolver, &FixtureResolver);
        let mut session = ConvertSession::new(context);
        let scan = ScanContent {
            attachments: vec![
                AttachmentRef::new("P1", AttachmentKind::Media),
                AttachmentRef::new("P2", AttachmentKind::Media),
            ],
        };
        assert_eq!(session.render_scan(&scan), "![[P1.png]]\n![[P2.png]]");
    }
}
