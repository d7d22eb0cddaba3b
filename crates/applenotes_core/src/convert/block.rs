//! Line-start block formatting.
//!
//! # Responsibility
//! - Emit heading, list, checkbox and quote prefixes at the start of each
//!   line, and fence consecutive monospaced lines into one code block.
//!
//! # Invariants
//! - Prefixes are only produced at line starts.
//! - Numbered lists count per indent level; a non-numbered line at the same
//!   or shallower level restarts the count.
//! - A code fence opened by this formatter is always closed by `finish`.
//! - List indentation never exceeds `MAX_INDENT` tabs.

use crate::model::style::{ParagraphStyle, StyleType, MAX_INDENT};

const CODE_FENCE: &str = "```";

#[derive(Debug, Default)]
pub struct BlockFormatter {
    in_code_block: bool,
    /// Numbered-list counters indexed by indent level.
    counters: Vec<u32>,
}

impl BlockFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_code_block(&self) -> bool {
        self.in_code_block
    }

    /// Returns the text to emit before the first fragment of a line.
    ///
    /// `empty_line` suppresses heading and list markers for blank lines while
    /// still tracking code block transitions.
    pub fn line_prefix(&mut self, paragraph: &ParagraphStyle, empty_line: bool) -> String {
        let mut prefix = String::new();

        if paragraph.style_type == StyleType::Monospaced {
            if !self.in_code_block {
                self.in_code_block = true;
                self.counters.clear();
                prefix.push_str(CODE_FENCE);
                prefix.push('\n');
            }
            return prefix;
        }
        if self.in_code_block {
            self.in_code_block = false;
            prefix.push_str(CODE_FENCE);
            prefix.push('\n');
        }

        if empty_line {
            self.counters.clear();
            return prefix;
        }

        if paragraph.blockquote {
            prefix.push_str("> ");
        }

        let indent = paragraph.indent.min(MAX_INDENT) as usize;
        if paragraph.style_type.is_list() {
            prefix.push_str(&"\t".repeat(indent));
        }

        match paragraph.style_type {
            StyleType::Title => prefix.push_str("# "),
            StyleType::Heading => prefix.push_str("## "),
            StyleType::Subheading => prefix.push_str("### "),
            StyleType::DottedList | StyleType::DashedList => {
                self.restart_at(indent);
                prefix.push_str("- ");
            }
            StyleType::NumberedList => {
                let number = self.next_number(indent);
                prefix.push_str(&format!("{number}. "));
            }
            StyleType::Checkbox => {
                self.restart_at(indent);
                if paragraph.checked == Some(true) {
                    prefix.push_str("- [x] ");
                } else {
                    prefix.push_str("- [ ] ");
                }
            }
            StyleType::Body | StyleType::Monospaced => self.counters.clear(),
        }
        prefix
    }

    /// Closes an open code fence; `at_line_start` tells whether the output
    /// so far ends with a line break.
    pub fn finish(&mut self, at_line_start: bool) -> String {
        if !self.in_code_block {
            return String::new();
        }
        self.in_code_block = false;
        if at_line_start {
            CODE_FENCE.to_string()
        } else {
            format!("\n{CODE_FENCE}")
        }
    }

    fn next_number(&mut self, indent: usize) -> u32 {
        self.counters.truncate(indent + 1);
        if self.counters.len() <= indent {
            self.counters.resize(indent + 1, 0);
        }
        self.counters[indent] += 1;
        self.counters[indent]
    }

    fn restart_at(&mut self, indent: usize) {
        self.counters.truncate(indent);
    }
}

#[cfg(test)]
mod tests {
    use super::BlockFormatter;
    use crate::model::style::{ParagraphStyle, StyleType, MAX_INDENT};

    fn numbered(indent: u32) -> ParagraphStyle {
        ParagraphStyle {
            indent,
            ..ParagraphStyle::of_type(StyleType::NumberedList)
        }
    }

    #[test]
    fn headings_map_to_levels() {
        let mut blocks = BlockFormatter::new();
        assert_eq!(
            blocks.line_prefix(&ParagraphStyle::of_type(StyleType::Title), false),
            "# "
        );
        assert_eq!(
            blocks.line_prefix(&ParagraphStyle::of_type(StyleType::Subheading), false),
            "### "
        );
        assert_eq!(blocks.line_prefix(&ParagraphStyle::default(), false), "");
    }

    #[test]
    fn numbered_lists_count_per_level() {
        let mut blocks = BlockFormatter::new();
        assert_eq!(blocks.line_prefix(&numbered(0), false), "1. ");
        assert_eq!(blocks.line_prefix(&numbered(1), false), "\t1. ");
        assert_eq!(blocks.line_prefix(&numbered(1), false), "\t2. ");
        assert_eq!(blocks.line_prefix(&numbered(0), false), "2. ");
        blocks.line_prefix(&ParagraphStyle::default(), false);
        assert_eq!(blocks.line_prefix(&numbered(0), false), "1. ");
    }

    #[test]
    fn checkboxes_reflect_state() {
        let mut blocks = BlockFormatter::new();
        let done = ParagraphStyle {
            checked: Some(true),
            ..ParagraphStyle::of_type(StyleType::Checkbox)
        };
        assert_eq!(blocks.line_prefix(&done, false), "- [x] ");
        let open = ParagraphStyle {
            checked: Some(false),
            indent: 2,
            ..ParagraphStyle::of_type(StyleType::Checkbox)
        };
        assert_eq!(blocks.line_prefix(&open, false), "\t\t- [ ] ");
    }

    #[test]
    fn blockquote_precedes_list_marker() {
        let mut blocks = BlockFormatter::new();
        let quoted = ParagraphStyle {
            blockquote: true,
            ..ParagraphStyle::of_type(StyleType::DashedList)
        };
        assert_eq!(blocks.line_prefix(&quoted, false), "> - ");
    }

    #[test]
    fn consecutive_monospaced_lines_share_one_fence() {
        let mut blocks = BlockFormatter::new();
        let code = ParagraphStyle::of_type(StyleType::Monospaced);
        assert_eq!(blocks.line_prefix(&code, false), "```\n");
        assert!(blocks.in_code_block());
        assert_eq!(blocks.line_prefix(&code, false), "");
        assert_eq!(blocks.line_prefix(&ParagraphStyle::default(), false), "```\n");
        assert_eq!(blocks.finish(true), "");
    }

    #[test]
    fn finish_closes_open_fence() {
        let mut blocks = BlockFormatter::new();
        blocks.line_prefix(&ParagraphStyle::of_type(StyleType::Monospaced), false);
        assert_eq!(blocks.finish(false), "\n```");
        assert!(!blocks.in_code_block());
    }

    #[test]
    fn empty_lines_get_no_markers() {
        let mut blocks = BlockFormatter::new();
        assert_eq!(
            blocks.line_prefix(&ParagraphStyle::of_type(StyleType::Heading), true),
            ""
        );
    }

    #[test]
    fn huge_indent_is_capped() {
        let mut blocks = BlockFormatter::new();
        let prefix = blocks.line_prefix(&numbered(i32::MAX as u32), false);
        assert_eq!(prefix, format!("{}1. ", "\t".repeat(MAX_INDENT as usize)));
        assert_eq!(blocks.line_prefix(&numbered(u32::MAX), false), prefix.replace("1.", "2."));
    }
}
