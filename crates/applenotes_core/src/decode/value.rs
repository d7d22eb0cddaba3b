//! Generic decoded value tree.
//!
//! # Responsibility
//! - Hold field values keyed by field number, typed by the schema kind.
//! - Offer lenient accessors for the typed model builder.
//!
//! # Invariants
//! - Values of one field keep stream order.
//! - Singular accessors return the last occurrence (protobuf merge rule).

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Message(DecodedMessage),
}

/// One decoded message instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedMessage {
    /// Schema name of this message.
    pub type_name: &'static str,
    fields: BTreeMap<u32, Vec<DecodedValue>>,
}

impl DecodedMessage {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, field_number: u32, value: DecodedValue) {
        self.fields.entry(field_number).or_default().push(value);
    }

    pub fn has(&self, field_number: u32) -> bool {
        self.fields
            .get(&field_number)
            .is_some_and(|values| !values.is_empty())
    }

    pub fn values(&self, field_number: u32) -> &[DecodedValue] {
        self.fields
            .get(&field_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn last(&self, field_number: u32) -> Option<&DecodedValue> {
        self.values(field_number).last()
    }

    pub fn field_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    pub fn int(&self, field_number: u32) -> Option<i64> {
        match self.last(field_number)? {
            DecodedValue::Int(value) => Some(*value),
            DecodedValue::UInt(value) => i64::try_from(*value).ok(),
            DecodedValue::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn uint(&self, field_number: u32) -> Option<u64> {
        match self.last(field_number)? {
            DecodedValue::UInt(value) => Some(*value),
            DecodedValue::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn float(&self, field_number: u32) -> Option<f32> {
        match self.last(field_number)? {
            DecodedValue::Float(value) => Some(*value),
            DecodedValue::Double(value) => Some(*value as f32),
            _ => None,
        }
    }

    pub fn str(&self, field_number: u32) -> Option<&str> {
        match self.last(field_number)? {
            DecodedValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn bytes(&self, field_number: u32) -> Option<&[u8]> {
        match self.last(field_number)? {
            DecodedValue::Bytes(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn message(&self, field_number: u32) -> Option<&DecodedMessage> {
        match self.last(field_number)? {
            DecodedValue::Message(value) => Some(value),
            _ => None,
        }
    }

    pub fn messages(&self, field_number: u32) -> impl Iterator<Item = &DecodedMessage> {
        self.values(field_number).iter().filter_map(|value| match value {
            DecodedValue::Message(message) => Some(message),
            _ => None,
        })
    }

    pub fn strings(&self, field_number: u32) -> impl Iterator<Item = &str> {
        self.values(field_number).iter().filter_map(|value| match value {
            DecodedValue::String(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn bytes_list(&self, field_number: u32) -> impl Iterator<Item = &[u8]> {
        self.values(field_number).iter().filter_map(|value| match value {
            DecodedValue::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }
}
