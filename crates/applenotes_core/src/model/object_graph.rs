//! Index arena over a mergeable-data object list.
//!
//! # Responsibility
//! - Resolve `ObjectID.object_index` references into entries.
//! - Resolve uuid references (an entry whose first map value indexes the
//!   uuid item table) into [`Uuid`] values.
//!
//! # Invariants
//! - Lookups are bounds-checked; a bad index is an `Err` with context, never
//!   a panic.

use crate::decode::DecodedMessage;
use uuid::Uuid;

// MergeableDataObjectData fields.
const DATA_ENTRY: u32 = 3;
const DATA_KEY_ITEM: u32 = 4;
const DATA_TYPE_ITEM: u32 = 5;
const DATA_UUID_ITEM: u32 = 6;
// MergeableDataObjectEntry fields.
pub(crate) const ENTRY_DICTIONARY: u32 = 6;
pub(crate) const ENTRY_NOTE: u32 = 10;
pub(crate) const ENTRY_CUSTOM_MAP: u32 = 13;
pub(crate) const ENTRY_ORDERED_SET: u32 = 16;
// MergeableDataObjectMap / MapEntry / ObjectID fields.
pub(crate) const MAP_TYPE: u32 = 1;
pub(crate) const MAP_ENTRY: u32 = 3;
pub(crate) const MAP_ENTRY_KEY: u32 = 1;
pub(crate) const MAP_ENTRY_VALUE: u32 = 2;
const OBJECT_ID_UNSIGNED: u32 = 2;
pub(crate) const OBJECT_ID_STRING: u32 = 4;
const OBJECT_ID_INDEX: u32 = 6;

pub struct ObjectGraph<'a> {
    entries: Vec<&'a DecodedMessage>,
    keys: Vec<&'a str>,
    types: Vec<&'a str>,
    uuids: Vec<&'a [u8]>,
}

impl<'a> ObjectGraph<'a> {
    /// Indexes one `MergeableDataObjectData` message.
    pub fn new(data: &'a DecodedMessage) -> Self {
        Self {
            entries: data.messages(DATA_ENTRY).collect(),
            keys: data.strings(DATA_KEY_ITEM).collect(),
            types: data.strings(DATA_TYPE_ITEM).collect(),
            uuids: data.bytes_list(DATA_UUID_ITEM).collect(),
        }
    }

    pub fn entries(&self) -> &[&'a DecodedMessage] {
        &self.entries
    }

    pub fn key_name(&self, index: i64) -> Option<&'a str> {
        lookup(&self.keys, index).copied()
    }

    pub fn type_name(&self, index: i64) -> Option<&'a str> {
        lookup(&self.types, index).copied()
    }

    /// Returns the first custom map whose declared type is `type_name`.
    pub fn find_map_of_type(&self, type_name: &str) -> Option<&'a DecodedMessage> {
        self.entries
            .iter()
            .copied()
            .filter_map(|entry| entry.message(ENTRY_CUSTOM_MAP))
            .find(|map| {
                map.int(MAP_TYPE)
                    .and_then(|index| self.type_name(index))
                    .is_some_and(|name| name == type_name)
            })
    }

    /// Follows an `ObjectID` to the entry it indexes.
    pub fn object(&self, object_id: &DecodedMessage) -> Result<&'a DecodedMessage, String> {
        let index = object_id
            .int(OBJECT_ID_INDEX)
            .ok_or_else(|| "object id carries no object index".to_string())?;
        lookup(&self.entries, index)
            .copied()
            .ok_or_else(|| format!("object index {index} out of range ({})", self.entries.len()))
    }

    /// Follows an `ObjectID` to a uuid-reference entry and returns its uuid.
    pub fn resolve_uuid(&self, object_id: &DecodedMessage) -> Result<Uuid, String> {
        let entry = self.object(object_id)?;
        let uuid_index = entry
            .message(ENTRY_CUSTOM_MAP)
            .and_then(|map| map.messages(MAP_ENTRY).next())
            .and_then(|first| first.message(MAP_ENTRY_VALUE))
            .and_then(|value| value.uint(OBJECT_ID_UNSIGNED))
            .ok_or_else(|| "entry is not a uuid reference".to_string())?;
        let bytes = usize::try_from(uuid_index)
            .ok()
            .and_then(|index| self.uuids.get(index))
            .ok_or_else(|| {
                format!(
                    "uuid index {uuid_index} out of range ({})",
                    self.uuids.len()
                )
            })?;
        Uuid::from_slice(bytes).map_err(|_| format!("uuid item {uuid_index} is not 16 bytes"))
    }
}

fn lookup<T>(items: &[T], index: i64) -> Option<&T> {
    usize::try_from(index).ok().and_then(|index| items.get(index))
}
