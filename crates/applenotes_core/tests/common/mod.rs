//! Fixture encoders for note-store and mergeable-data blobs.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use uuid::Uuid;

/// Minimal protobuf writer; fields are emitted in call order.
#[derive(Debug, Clone, Default)]
pub struct Proto {
    buf: Vec<u8>,
}

impl Proto {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint(mut self, field: u32, value: u64) -> Self {
        self.key(field, 0);
        push_varint(&mut self.buf, value);
        self
    }

    pub fn int(self, field: u32, value: i64) -> Self {
        self.uint(field, value as u64)
    }

    pub fn float(mut self, field: u32, value: f32) -> Self {
        self.key(field, 5);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(mut self, field: u32, value: &[u8]) -> Self {
        self.key(field, 2);
        push_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    pub fn message(self, field: u32, value: Proto) -> Self {
        self.bytes(field, &value.buf)
    }

    pub fn encode(self) -> Vec<u8> {
        self.buf
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        push_varint(&mut self.buf, (u64::from(field) << 3) | u64::from(wire_type));
    }
}

fn push_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

pub fn gzip(raw: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Attribute run covering `text` (length counted in UTF-16 units).
pub fn run(text: &str) -> Proto {
    Proto::new().int(1, text.encode_utf16().count() as i64)
}

pub fn paragraph(style_type: i64) -> Proto {
    Proto::new().int(1, style_type)
}

/// `Note` message with `text` partitioned by `runs`.
pub fn note(text: &str, runs: Vec<Proto>) -> Proto {
    runs.into_iter()
        .fold(Proto::new().string(2, text), |note, run| note.message(5, run))
}

/// Compressed `NoteStoreProto` around one note.
pub fn note_store_blob(note: Proto) -> Vec<u8> {
    let document = Proto::new().int(2, 0).message(3, note);
    gzip(&Proto::new().message(2, document).encode())
}

pub fn object_id(index: i64) -> Proto {
    Proto::new().int(6, index)
}

/// Builds a replicated-table object graph.
#[derive(Debug, Default)]
pub struct TableFixture {
    entries: Vec<Proto>,
    uuids: Vec<Uuid>,
}

impl TableFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_entry(&mut self, entry: Proto) -> i64 {
        self.entries.push(entry);
        (self.entries.len() - 1) as i64
    }

    /// Entry whose first map value indexes the uuid table.
    pub fn uuid_ref(&mut self, uuid: Uuid) -> i64 {
        let index = match self.uuids.iter().position(|known| *known == uuid) {
            Some(index) => index,
            None => {
                self.uuids.push(uuid);
                self.uuids.len() - 1
            }
        };
        let map = Proto::new().message(
            3,
            Proto::new()
                .int(1, 0)
                .message(2, Proto::new().uint(2, index as u64)),
        );
        self.push_entry(Proto::new().message(13, map))
    }

    /// Ordered set from `(ordering_key, ordering_uuid)` array slots and
    /// `(ordering_uuid, identity)` contents.
    pub fn ordered_set(&mut self, array: &[(i64, Uuid)], contents: &[(Uuid, Uuid)]) -> i64 {
        let array = array.iter().fold(Proto::new(), |array, (key, ordering)| {
            array.message(2, Proto::new().int(1, *key).bytes(2, ordering.as_bytes()))
        });
        let mut dictionary = Proto::new();
        for (ordering, identity) in contents {
            let key = self.uuid_ref(*ordering);
            let value = self.uuid_ref(*identity);
            dictionary = dictionary.message(
                1,
                Proto::new()
                    .message(1, object_id(key))
                    .message(2, object_id(value)),
            );
        }
        let ordering = Proto::new().message(1, array).message(2, dictionary);
        self.push_entry(Proto::new().message(16, Proto::new().message(1, ordering)))
    }

    /// Axis whose ordering uuid equals its identity.
    pub fn axis(&mut self, items: &[(i64, Uuid)]) -> i64 {
        let contents: Vec<(Uuid, Uuid)> = items.iter().map(|(_, id)| (*id, *id)).collect();
        self.ordered_set(items, &contents)
    }

    pub fn cell_note(&mut self, text: &str) -> i64 {
        self.push_entry(Proto::new().message(10, note(text, vec![run(text)])))
    }

    /// `cellColumns`: column id -> row id -> cell text.
    pub fn cell_columns(&mut self, columns: &[(Uuid, Vec<(Uuid, &str)>)]) -> i64 {
        let mut outer = Proto::new();
        for (column, rows) in columns {
            let mut inner = Proto::new();
            for (row, text) in rows {
                let key = self.uuid_ref(*row);
                let value = self.cell_note(text);
                inner = inner.message(
                    1,
                    Proto::new()
                        .message(1, object_id(key))
                        .message(2, object_id(value)),
                );
            }
            let rows_entry = self.push_entry(Proto::new().message(6, inner));
            let column_key = self.uuid_ref(*column);
            outer = outer.message(
                1,
                Proto::new()
                    .message(1, object_id(column_key))
                    .message(2, object_id(rows_entry)),
            );
        }
        self.push_entry(Proto::new().message(6, outer))
    }

    /// Adds the ICTable root map and returns the compressed blob.
    pub fn finish(mut self, rows: i64, columns: i64, cell_columns: i64) -> Vec<u8> {
        let root = [(0, rows), (1, columns), (2, cell_columns)].into_iter().fold(
            Proto::new().int(1, 0),
            |map, (key, target)| {
                map.message(3, Proto::new().int(1, key).message(2, object_id(target)))
            },
        );
        self.push_entry(Proto::new().message(13, root));

        let mut data = Proto::new();
        for entry in self.entries {
            data = data.message(3, entry);
        }
        for key in ["crRows", "crColumns", "cellColumns"] {
            data = data.string(4, key);
        }
        data = data.string(5, "com.apple.notes.ICTable");
        for uuid in &self.uuids {
            data = data.bytes(6, uuid.as_bytes());
        }

        let object = Proto::new().int(2, 1).message(3, data);
        gzip(&Proto::new().message(2, object).encode())
    }
}

/// Compressed gallery whose maps name each page attachment.
pub fn scan_blob(pages: &[&str]) -> Vec<u8> {
    let mut data = Proto::new();
    for page in pages {
        let map = Proto::new().message(
            3,
            Proto::new().int(1, 0).message(2, Proto::new().string(4, page)),
        );
        data = data.message(3, Proto::new().message(13, map));
    }
    data = data.string(4, "self");
    let object = Proto::new().int(2, 1).message(3, data);
    gzip(&Proto::new().message(2, object).encode())
}
