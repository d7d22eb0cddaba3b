//! Low-level wire-format reader.
//!
//! # Responsibility
//! - Read tags, varints, fixed-width scalars and length-delimited slices.
//! - Skip unknown fields by their wire type's length rule.
//! - Skip groups without recursion, bounded by `MAX_NESTING_DEPTH`.
//!
//! # Invariants
//! - The reader never reads past the end of its slice; short input is a
//!   `Truncated` error carrying the offset where data ran out.

use super::{DecodeError, DecodeResult, MAX_NESTING_DEPTH};

/// Encoding discriminator carried in the low three bits of every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    pub fn from_tag_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(DecodeError::InvalidWireType {
                wire_type: other,
                offset,
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length_delimited",
            Self::StartGroup => "start_group",
            Self::EndGroup => "end_group",
            Self::Fixed32 => "fixed32",
        }
    }
}

/// One decoded field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field_number: u32,
    pub wire_type: WireType,
}

/// Cursor over one message's bytes.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` in the whole decompressed buffer.
    base: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Absolute offset of the cursor, used for error context.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn read_tag(&mut self) -> DecodeResult<Tag> {
        let start = self.offset();
        let key = self.read_varint()?;
        let field_number = u32::try_from(key >> 3).map_err(|_| DecodeError::SchemaMismatch {
            message: "<tag>",
            field_number: 0,
            expected: "field number <= u32::MAX",
            actual: "oversized field number",
            offset: start,
        })?;
        let wire_type = WireType::from_tag_bits((key & 0x07) as u8, start)?;
        Ok(Tag {
            field_number,
            wire_type,
        })
    }

    pub fn read_varint(&mut self) -> DecodeResult<u64> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.next_byte()?;
            if shift < 64 {
                result |= u64::from(byte & 0x7f) << shift;
            }
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 70 {
                // Ten bytes is the longest legal varint.
                return Err(DecodeError::Truncated {
                    offset: self.offset(),
                });
            }
        }
    }

    pub fn read_fixed32(&mut self) -> DecodeResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_fixed64(&mut self) -> DecodeResult<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a length prefix and returns the slice plus its absolute offset.
    pub fn read_length_delimited(&mut self) -> DecodeResult<(&'a [u8], usize)> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated {
            offset: self.offset(),
        })?;
        let start = self.offset();
        let bytes = self.take(len)?;
        Ok((bytes, start))
    }

    /// Skips one field body whose tag has already been read.
    pub fn skip_field(&mut self, tag: Tag) -> DecodeResult<()> {
        match tag.wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::StartGroup => self.skip_group(tag.field_number)?,
            WireType::EndGroup => {
                return Err(DecodeError::SchemaMismatch {
                    message: "<group>",
                    field_number: tag.field_number,
                    expected: "matching start_group",
                    actual: "end_group",
                    offset: self.offset(),
                });
            }
        }
        Ok(())
    }

    /// Skips a group body iteratively; open groups are tracked on an explicit
    /// stack capped at `MAX_NESTING_DEPTH`.
    fn skip_group(&mut self, field_number: u32) -> DecodeResult<()> {
        let mut open = vec![field_number];
        while let Some(&current) = open.last() {
            if self.is_at_end() {
                return Err(DecodeError::Truncated {
                    offset: self.offset(),
                });
            }
            let inner = self.read_tag()?;
            match inner.wire_type {
                WireType::EndGroup => {
                    if inner.field_number != current {
                        return Err(DecodeError::SchemaMismatch {
                            message: "<group>",
                            field_number: inner.field_number,
                            expected: "end_group for the open group",
                            actual: "end_group for another field",
                            offset: self.offset(),
                        });
                    }
                    open.pop();
                }
                WireType::StartGroup => {
                    if open.len() >= MAX_NESTING_DEPTH {
                        return Err(DecodeError::NestingTooDeep {
                            depth: MAX_NESTING_DEPTH,
                        });
                    }
                    open.push(inner.field_number);
                }
                _ => self.skip_field(inner)?,
            }
        }
        Ok(())
    }

    fn next_byte(&mut self) -> DecodeResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::Truncated {
            offset: self.offset(),
        })?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::Truncated {
                offset: self.offset(),
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// Zig-zag decoding is not used by the note schema; plain two's complement
/// varints are reinterpreted as signed.
pub fn varint_as_i64(value: u64) -> i64 {
    value as i64
}
