//! Inline style translation.
//!
//! # Responsibility
//! - Wrap one fragment's text in Markdown delimiters for what Markdown can
//!   express and in inline HTML for what it cannot.
//!
//! # Invariants
//! - Nesting order, inner to outer: italic, bold, strikethrough, link,
//!   script, underline, font/color span.
//! - Leading/trailing whitespace stays outside every delimiter.
//! - Whitespace-only and plain fragments are emitted unchanged.
//! - Link destinations and span attributes cannot be closed early by the
//!   text they carry.

use super::merge::Fragment;
use crate::model::style::{Script, StyleSet};
use crate::resolve::NoteLinkResolver;
use once_cell::sync::Lazy;
use regex::Regex;

static EDGE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\s*)(.*?)(\s*)$").expect("edge whitespace regex"));

static NOTE_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^applenotes:note/([-0-9a-fA-F]+)(?:\?ownerIdentifier=.*)?$")
        .expect("note uri regex")
});

/// Whether `uri` points at another note rather than the web.
pub fn is_note_uri(uri: &str) -> bool {
    NOTE_URI.is_match(uri)
}

pub fn translate(fragment: &Fragment, links: &dyn NoteLinkResolver) -> String {
    translate_text(&fragment.text, &fragment.style, links)
}

pub fn translate_text(text: &str, style: &StyleSet, links: &dyn NoteLinkResolver) -> String {
    if style.is_plain() || text.trim().is_empty() {
        return text.to_string();
    }

    let (leading, body, trailing) = split_edges(text);
    let mut out = body.to_string();

    if style.italic {
        out = format!("*{out}*");
    }
    if style.bold {
        out = format!("**{out}**");
    }
    if style.strikethrough {
        out = format!("~~{out}~~");
    }
    if let Some(target) = style.link.as_deref() {
        out = render_link(&out, body, target, links);
    }

    match style.script {
        Script::Superscript => out = format!("<sup>{out}</sup>"),
        Script::Subscript => out = format!("<sub>{out}</sub>"),
        Script::Baseline => {}
    }
    if style.underline {
        out = format!("<u>{out}</u>");
    }
    let css = span_style(style);
    if !css.is_empty() {
        out = format!("<span style=\"{css}\">{out}</span>");
    }

    format!("{leading}{out}{trailing}")
}

/// Renders a hyperlink around already formatted `label`.
///
/// `body` is the raw text; a link whose target equals it stays bare text so
/// viewers can auto-link it.
pub fn render_link(label: &str, body: &str, target: &str, links: &dyn NoteLinkResolver) -> String {
    if target == body {
        return label.to_string();
    }
    if is_note_uri(target) {
        if let Some(path) = links.resolve_note_link(target) {
            return wiki_link(&path, label);
        }
    }
    format!("[{label}]({})", link_destination(target))
}

/// Formats a Markdown link destination.
///
/// Targets containing whitespace or brackets are wrapped in `<...>`; angle
/// brackets and line breaks inside are percent-encoded.
pub fn link_destination(target: &str) -> String {
    let needs_brackets = target
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>'));
    if !needs_brackets {
        return target.to_string();
    }
    let mut out = String::with_capacity(target.len() + 2);
    out.push('<');
    for c in target.chars() {
        match c {
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            other => out.push(other),
        }
    }
    out.push('>');
    out
}

pub fn wiki_link(path: &str, label: &str) -> String {
    if label.is_empty() || label == path {
        format!("[[{path}]]")
    } else {
        format!("[[{path}|{label}]]")
    }
}

fn split_edges(text: &str) -> (&str, &str, &str) {
    match EDGE_WHITESPACE.captures(text) {
        Some(caps) => {
            let part = |index: usize| caps.get(index).map_or("", |m| m.as_str());
            (part(1), part(2), part(3))
        }
        None => ("", text, ""),
    }
}

fn span_style(style: &StyleSet) -> String {
    let mut css = String::new();
    if let Some(font) = &style.font {
        if let Some(name) = &font.name {
            let name = css_font_name(name);
            if !name.is_empty() {
                css.push_str(&format!("font-family:{name};"));
            }
        }
        if let Some(size) = font.point_size {
            css.push_str(&format!("font-size:{size}pt;"));
        }
    }
    if let Some(color) = &style.color {
        css.push_str(&format!("color:{};", color.to_hex()));
    }
    css
}

/// Drops characters that could end the declaration or the attribute.
fn css_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\'' | ';' | '<' | '>' | '&' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}
