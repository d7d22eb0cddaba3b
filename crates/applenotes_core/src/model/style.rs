//! Inline and paragraph style sets.
//!
//! # Invariants
//! - Two runs share a fragment only when their `StyleSet` and
//!   `ParagraphStyle` compare equal.
//! - Default system font values are normalized to `None` so they never
//!   produce markup.

use serde::Serialize;

/// Font the source uses when no explicit font was chosen.
pub const DEFAULT_FONT_NAME: &str = ".AppleSystemUIFont";

/// Vertical text offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

impl Script {
    pub fn from_raw(value: i64) -> Self {
        match value.signum() {
            1 => Self::Superscript,
            -1 => Self::Subscript,
            _ => Self::Baseline,
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    pub fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// Renders `#rrggbb`; alpha is dropped.
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            channel_to_byte(self.red),
            channel_to_byte(self.green),
            channel_to_byte(self.blue)
        )
    }
}

fn channel_to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).floor() as u8
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontSpec {
    /// `None` when the run uses the default system font.
    pub name: Option<String>,
    pub point_size: Option<f32>,
}

impl FontSpec {
    pub fn new(name: Option<&str>, point_size: Option<f32>) -> Option<Self> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != DEFAULT_FONT_NAME)
            .map(str::to_string);
        let point_size = point_size.filter(|size| size.is_finite() && *size > 0.0);
        if name.is_none() && point_size.is_none() {
            return None;
        }
        Some(Self { name, point_size })
    }
}

/// Character-level style attributes of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub script: Script,
    pub color: Option<Color>,
    pub font: Option<FontSpec>,
    pub link: Option<String>,
}

impl StyleSet {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    /// Applies the source `font_weight` code (1 bold, 2 italic, 3 both).
    pub fn with_font_weight(mut self, weight: i64) -> Self {
        self.bold = matches!(weight, 1 | 3);
        self.italic = matches!(weight, 2 | 3);
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Whether any attribute needs HTML because Markdown cannot express it.
    pub fn needs_html(&self) -> bool {
        self.underline
            || self.script != Script::Baseline
            || self.color.is_some()
            || self.font.is_some()
    }
}

/// Block-level role of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    #[default]
    Body,
    Title,
    Heading,
    Subheading,
    Monospaced,
    DottedList,
    DashedList,
    NumberedList,
    Checkbox,
}

impl StyleType {
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => Self::Title,
            1 => Self::Heading,
            2 => Self::Subheading,
            4 => Self::Monospaced,
            100 => Self::DottedList,
            101 => Self::DashedList,
            102 => Self::NumberedList,
            103 => Self::Checkbox,
            _ => Self::Body,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::DottedList | Self::DashedList | Self::NumberedList | Self::Checkbox
        )
    }
}

/// Deepest list nesting rendered; stored indents above it are clamped.
pub const MAX_INDENT: u32 = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParagraphStyle {
    pub style_type: StyleType,
    /// At most `MAX_INDENT` when built from a blob.
    pub indent: u32,
    /// `Some` only for checkbox lines.
    pub checked: Option<bool>,
    pub blockquote: bool,
}

impl ParagraphStyle {
    pub fn of_type(style_type: StyleType) -> Self {
        Self {
            style_type,
            ..Self::default()
        }
    }
}
