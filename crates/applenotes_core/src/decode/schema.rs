//! Declarative message schema.
//!
//! # Responsibility
//! - Describe message types as ordered field lists (number, kind, label).
//! - Provide the built-in Apple Notes schema as process-wide static config.
//!
//! # Invariants
//! - A schema is immutable once built and is shared read-only.
//! - Field numbers are unique within one message.

use super::wire::WireType;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Root of a `ZICNOTEDATA.ZDATA` note body blob.
pub const NOTE_STORE_ROOT: &str = "NoteStoreProto";
/// Root of a `ZMERGEABLEDATA` blob (tables, galleries).
pub const MERGEABLE_DATA_ROOT: &str = "MergableDataProto";

/// Scalar/message kind of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt64,
    Bool,
    Float,
    Double,
    String,
    Bytes,
    Message(&'static str),
}

impl FieldKind {
    /// Wire type this kind is encoded with when not packed.
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Int32 | Self::Int64 | Self::UInt64 | Self::Bool => WireType::Varint,
            Self::Float => WireType::Fixed32,
            Self::Double => WireType::Fixed64,
            Self::String | Self::Bytes | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    /// Whether a repeated field of this kind may use the packed encoding.
    pub fn is_packable(self) -> bool {
        matches!(
            self.wire_type(),
            WireType::Varint | WireType::Fixed32 | WireType::Fixed64
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message(_) => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub name: &'static str,
    fields: BTreeMap<u32, FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.get(&number)
    }

    /// Fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }
}

/// Set of message descriptors addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    messages: BTreeMap<&'static str, MessageDescriptor>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(name)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Incremental schema construction; later declarations of the same field
/// number replace earlier ones.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    messages: BTreeMap<&'static str, MessageDescriptor>,
}

impl SchemaBuilder {
    pub fn message(mut self, name: &'static str, fields: &[(u32, &'static str, FieldKind, Label)]) -> Self {
        let fields = fields
            .iter()
            .map(|&(number, field_name, kind, label)| {
                (
                    number,
                    FieldDescriptor {
                        number,
                        name: field_name,
                        kind,
                        label,
                    },
                )
            })
            .collect();
        self.messages.insert(name, MessageDescriptor { name, fields });
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            messages: self.messages,
        }
    }
}

static APPLE_NOTES_SCHEMA: Lazy<Schema> = Lazy::new(build_apple_notes_schema);

/// Returns the process-wide Apple Notes schema.
pub fn apple_notes_schema() -> &'static Schema {
    &APPLE_NOTES_SCHEMA
}

fn build_apple_notes_schema() -> Schema {
    use FieldKind::{Bytes, Float, Int32, Int64, Message, String, UInt64};
    use Label::{Optional, Repeated};

    Schema::builder()
        // Note store.
        .message(
            NOTE_STORE_ROOT,
            &[(2, "document", Message("Document"), Optional)],
        )
        .message(
            "Document",
            &[
                (2, "version", Int32, Optional),
                (3, "note", Message("Note"), Optional),
            ],
        )
        .message(
            "Note",
            &[
                (2, "note_text", String, Optional),
                (5, "attribute_run", Message("AttributeRun"), Repeated),
            ],
        )
        .message(
            "AttributeRun",
            &[
                (1, "length", Int32, Optional),
                (2, "paragraph_style", Message("ParagraphStyle"), Optional),
                (3, "font", Message("Font"), Optional),
                (5, "font_weight", Int32, Optional),
                (6, "underlined", Int32, Optional),
                (7, "strikethrough", Int32, Optional),
                (8, "superscript", Int32, Optional),
                (9, "link", String, Optional),
                (10, "color", Message("Color"), Optional),
                (12, "attachment_info", Message("AttachmentInfo"), Optional),
            ],
        )
        .message(
            "ParagraphStyle",
            &[
                (1, "style_type", Int32, Optional),
                (2, "alignment", Int32, Optional),
                (4, "indent_amount", Int32, Optional),
                (5, "checklist", Message("Checklist"), Optional),
                (8, "blockquote", Int32, Optional),
            ],
        )
        .message(
            "Checklist",
            &[(1, "uuid", Bytes, Optional), (2, "done", Int32, Optional)],
        )
        .message(
            "Font",
            &[
                (1, "font_name", String, Optional),
                (2, "point_size", Float, Optional),
                (3, "font_hints", Int32, Optional),
            ],
        )
        .message(
            "Color",
            &[
                (1, "red", Float, Optional),
                (2, "green", Float, Optional),
                (3, "blue", Float, Optional),
                (4, "alpha", Float, Optional),
            ],
        )
        .message(
            "AttachmentInfo",
            &[
                (1, "attachment_identifier", String, Optional),
                (2, "type_uti", String, Optional),
            ],
        )
        // Mergeable data object graph.
        .message(
            MERGEABLE_DATA_ROOT,
            &[(
                2,
                "mergable_data_object",
                Message("MergableDataObject"),
                Optional,
            )],
        )
        .message(
            "MergableDataObject",
            &[
                (2, "version", Int32, Optional),
                (
                    3,
                    "mergeable_data_object_data",
                    Message("MergeableDataObjectData"),
                    Optional,
                ),
            ],
        )
        .message(
            "MergeableDataObjectData",
            &[
                (
                    3,
                    "mergeable_data_object_entry",
                    Message("MergeableDataObjectEntry"),
                    Repeated,
                ),
                (4, "mergeable_data_object_key_item", String, Repeated),
                (5, "mergeable_data_object_type_item", String, Repeated),
                (6, "mergeable_data_object_uuid_item", Bytes, Repeated),
            ],
        )
        .message(
            "MergeableDataObjectEntry",
            &[
                (1, "register_latest", Message("RegisterLatest"), Optional),
                (5, "list", Message("List"), Optional),
                (6, "dictionary", Message("Dictionary"), Optional),
                (10, "note", Message("Note"), Optional),
                (13, "custom_map", Message("MergeableDataObjectMap"), Optional),
                (16, "ordered_set", Message("OrderedSet"), Optional),
            ],
        )
        .message(
            "RegisterLatest",
            &[(2, "contents", Message("ObjectID"), Optional)],
        )
        .message(
            "List",
            &[(1, "list_entry", Message("ListEntry"), Repeated)],
        )
        .message(
            "ListEntry",
            &[
                (2, "id", Message("ObjectID"), Optional),
                (3, "details", Message("ObjectID"), Optional),
                (4, "additional_details", Message("ObjectID"), Optional),
            ],
        )
        .message(
            "Dictionary",
            &[(1, "element", Message("DictionaryElement"), Repeated)],
        )
        .message(
            "DictionaryElement",
            &[
                (1, "key", Message("ObjectID"), Optional),
                (2, "value", Message("ObjectID"), Optional),
            ],
        )
        .message(
            "ObjectID",
            &[
                (2, "unsigned_integer_value", UInt64, Optional),
                (4, "string_value", String, Optional),
                (6, "object_index", Int32, Optional),
            ],
        )
        .message(
            "MergeableDataObjectMap",
            &[
                (1, "type", Int32, Optional),
                (3, "map_entry", Message("MapEntry"), Repeated),
            ],
        )
        .message(
            "MapEntry",
            &[
                (1, "key", Int32, Optional),
                (2, "value", Message("ObjectID"), Optional),
            ],
        )
        .message(
            "OrderedSet",
            &[
                (1, "ordering", Message("OrderedSetOrdering"), Optional),
                (2, "elements", Message("Dictionary"), Optional),
            ],
        )
        .message(
            "OrderedSetOrdering",
            &[
                (1, "array", Message("OrderedSetOrderingArray"), Optional),
                (2, "contents", Message("Dictionary"), Optional),
            ],
        )
        .message(
            "OrderedSetOrderingArray",
            &[
                (1, "contents", Message("Note"), Optional),
                (
                    2,
                    "attachment",
                    Message("OrderedSetOrderingArrayAttachment"),
                    Repeated,
                ),
            ],
        )
        .message(
            "OrderedSetOrderingArrayAttachment",
            &[(1, "index", Int64, Optional), (2, "uuid", Bytes, Optional)],
        )
        .build()
}
