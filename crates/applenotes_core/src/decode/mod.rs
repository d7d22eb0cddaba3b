//! Schema-driven binary decoder.
//!
//! # Responsibility
//! - Inflate a compressed note blob.
//! - Walk tagged, length-prefixed fields against a declarative [`Schema`]
//!   and produce a generic [`DecodedMessage`] tree.
//!
//! # Invariants
//! - Unknown field numbers are skipped by wire type, never fatal.
//! - A wire type that disagrees with the declared kind of a known field is
//!   a `SchemaMismatch`.
//! - Decoding is pure: no shared buffers, no I/O, no global mutation.

pub mod inflate;
pub mod schema;
pub mod value;
pub mod wire;

pub use schema::{
    apple_notes_schema, FieldDescriptor, FieldKind, Label, MessageDescriptor, Schema,
    MERGEABLE_DATA_ROOT, NOTE_STORE_ROOT,
};
pub use value::{DecodedMessage, DecodedValue};

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use wire::{varint_as_i64, Tag, WireReader, WireType};

/// Nested messages deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 64;

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Failure while inflating or walking one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Blob is not a valid gzip/zlib stream.
    Decompression(String),
    /// Known field arrived with a wire type its declared kind cannot use.
    SchemaMismatch {
        message: &'static str,
        field_number: u32,
        expected: &'static str,
        actual: &'static str,
        offset: usize,
    },
    /// Input ended inside a field.
    Truncated { offset: usize },
    /// Reserved wire type (6 or 7).
    InvalidWireType { wire_type: u8, offset: usize },
    /// String field is not valid UTF-8.
    InvalidUtf8 {
        message: &'static str,
        field_number: u32,
        offset: usize,
    },
    /// Root or nested message name is not declared in the schema.
    UnknownMessage(String),
    NestingTooDeep { depth: usize },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decompression(message) => write!(f, "blob decompression failed: {message}"),
            Self::SchemaMismatch {
                message,
                field_number,
                expected,
                actual,
                offset,
            } => write!(
                f,
                "schema mismatch in {message}.{field_number} at byte {offset}: expected {expected}, got {actual}"
            ),
            Self::Truncated { offset } => write!(f, "blob truncated at byte {offset}"),
            Self::InvalidWireType { wire_type, offset } => {
                write!(f, "invalid wire type {wire_type} at byte {offset}")
            }
            Self::InvalidUtf8 {
                message,
                field_number,
                offset,
            } => write!(
                f,
                "invalid UTF-8 in {message}.{field_number} at byte {offset}"
            ),
            Self::UnknownMessage(name) => write!(f, "message `{name}` is not in the schema"),
            Self::NestingTooDeep { depth } => {
                write!(f, "message nesting exceeds {depth} levels")
            }
        }
    }
}

impl Error for DecodeError {}

/// Inflates `bytes` and decodes them as `root_message`.
pub fn decode(bytes: &[u8], schema: &Schema, root_message: &str) -> DecodeResult<DecodedMessage> {
    let raw = inflate::inflate(bytes)?;
    let tree = decode_uncompressed(&raw, schema, root_message)?;
    debug!(
        "event=blob_decode module=decode status=ok root={} compressed_bytes={} inflated_bytes={}",
        root_message,
        bytes.len(),
        raw.len()
    );
    Ok(tree)
}

/// Decodes an already-inflated buffer as `root_message`.
pub fn decode_uncompressed(
    raw: &[u8],
    schema: &Schema,
    root_message: &str,
) -> DecodeResult<DecodedMessage> {
    let descriptor = schema
        .message(root_message)
        .ok_or_else(|| DecodeError::UnknownMessage(root_message.to_string()))?;
    decode_message(raw, 0, schema, descriptor, 0)
}

fn decode_message(
    data: &[u8],
    base: usize,
    schema: &Schema,
    descriptor: &MessageDescriptor,
    depth: usize,
) -> DecodeResult<DecodedMessage> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DecodeError::NestingTooDeep {
            depth: MAX_NESTING_DEPTH,
        });
    }

    let mut reader = WireReader::with_base(data, base);
    let mut message = DecodedMessage::new(descriptor.name);
    while !reader.is_at_end() {
        let tag = reader.read_tag()?;
        match descriptor.field(tag.field_number) {
            Some(field) => {
                decode_field(&mut reader, tag, field, descriptor, schema, &mut message, depth)?
            }
            None => reader.skip_field(tag)?,
        }
    }
    Ok(message)
}

fn decode_field(
    reader: &mut WireReader<'_>,
    tag: Tag,
    field: &FieldDescriptor,
    owner: &MessageDescriptor,
    schema: &Schema,
    message: &mut DecodedMessage,
    depth: usize,
) -> DecodeResult<()> {
    let expected = field.kind.wire_type();
    if tag.wire_type == expected {
        let value = read_value(reader, field, owner, schema, depth)?;
        message.push(field.number, value);
        return Ok(());
    }

    let packed = field.label == Label::Repeated
        && field.kind.is_packable()
        && tag.wire_type == WireType::LengthDelimited;
    if !packed {
        return Err(DecodeError::SchemaMismatch {
            message: owner.name,
            field_number: field.number,
            expected: expected.as_str(),
            actual: tag.wire_type.as_str(),
            offset: reader.offset(),
        });
    }

    let (bytes, start) = reader.read_length_delimited()?;
    let mut packed_reader = WireReader::with_base(bytes, start);
    while !packed_reader.is_at_end() {
        let value = read_value(&mut packed_reader, field, owner, schema, depth)?;
        message.push(field.number, value);
    }
    Ok(())
}

fn read_value(
    reader: &mut WireReader<'_>,
    field: &FieldDescriptor,
    owner: &MessageDescriptor,
    schema: &Schema,
    depth: usize,
) -> DecodeResult<DecodedValue> {
    let value = match field.kind {
        // int32 values are sign-extended to ten bytes on the wire.
        FieldKind::Int32 => DecodedValue::Int(i64::from(varint_as_i64(reader.read_varint()?) as i32)),
        FieldKind::Int64 => DecodedValue::Int(varint_as_i64(reader.read_varint()?)),
        FieldKind::UInt64 => DecodedValue::UInt(reader.read_varint()?),
        FieldKind::Bool => DecodedValue::Bool(reader.read_varint()? != 0),
        FieldKind::Float => DecodedValue::Float(f32::from_bits(reader.read_fixed32()?)),
        FieldKind::Double => DecodedValue::Double(f64::from_bits(reader.read_fixed64()?)),
        FieldKind::String => {
            let (bytes, start) = reader.read_length_delimited()?;
            let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                message: owner.name,
                field_number: field.number,
                offset: start,
            })?;
            DecodedValue::String(text.to_string())
        }
        FieldKind::Bytes => {
            let (bytes, _) = reader.read_length_delimited()?;
            DecodedValue::Bytes(bytes.to_vec())
        }
        FieldKind::Message(name) => {
            let nested = schema
                .message(name)
                .ok_or_else(|| DecodeError::UnknownMessage(name.to_string()))?;
            let (bytes, start) = reader.read_length_delimited()?;
            DecodedValue::Message(decode_message(bytes, start, schema, nested, depth + 1)?)
        }
    };
    Ok(value)
}
