//! Table extraction from a mergeable-data object graph.
//!
//! # Responsibility
//! - Read `crRows` / `crColumns` ordered sets into axis entries with their
//!   ordering keys.
//! - Read `cellColumns` (column id -> row id -> cell note) into cells.
//!
//! # Invariants
//! - Every unresolvable reference is recorded as an anomaly and skipped.
//! - Axis entries are emitted in ordering-array order so equal keys keep
//!   source order after the stable sort.

use super::model::{AxisEntry, TableCell, TableModel};
use crate::anomaly::{AnomalyKind, AnomalyLog};
use crate::decode::DecodedMessage;
use crate::model::build::build_text_content;
use crate::model::note::TextContent;
use crate::model::object_graph::{
    ObjectGraph, ENTRY_DICTIONARY, ENTRY_NOTE, ENTRY_ORDERED_SET, MAP_ENTRY, MAP_ENTRY_KEY,
    MAP_ENTRY_VALUE,
};
use crate::model::ModelResult;
use std::collections::HashMap;
use uuid::Uuid;

const KEY_ROWS: &str = "crRows";
const KEY_COLUMNS: &str = "crColumns";
const KEY_CELL_COLUMNS: &str = "cellColumns";

// OrderedSet / OrderedSetOrdering / array attachment / dictionary fields.
const ORDERED_SET_ORDERING: u32 = 1;
const ORDERING_ARRAY: u32 = 1;
const ORDERING_CONTENTS: u32 = 2;
const ARRAY_ATTACHMENT: u32 = 2;
const ATTACHMENT_INDEX: u32 = 1;
const ATTACHMENT_UUID: u32 = 2;
const DICTIONARY_ELEMENT: u32 = 1;
const ELEMENT_KEY: u32 = 1;
const ELEMENT_VALUE: u32 = 2;

#[derive(Debug, Clone, Copy)]
enum Axis {
    Row,
    Column,
}

impl Axis {
    fn as_str(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

/// Extracts the identifier-addressed table rooted at an ICTable map.
pub fn extract_table(
    graph: &ObjectGraph<'_>,
    root: &DecodedMessage,
    anomalies: &mut AnomalyLog,
) -> ModelResult<TableModel<TextContent>> {
    let mut model = TableModel::default();
    let mut cell_columns = None;

    for entry in root.messages(MAP_ENTRY) {
        let Some(value) = entry.message(MAP_ENTRY_VALUE) else {
            continue;
        };
        match entry.int(MAP_ENTRY_KEY).and_then(|key| graph.key_name(key)) {
            Some(KEY_ROWS) => model.rows = axis_entries(graph, value, Axis::Row, anomalies),
            Some(KEY_COLUMNS) => {
                model.columns = axis_entries(graph, value, Axis::Column, anomalies)
            }
            Some(KEY_CELL_COLUMNS) => cell_columns = Some(value),
            _ => {}
        }
    }

    if let Some(cell_columns) = cell_columns {
        model.cells = cells(graph, cell_columns, anomalies)?;
    }
    Ok(model)
}

fn axis_entries(
    graph: &ObjectGraph<'_>,
    object_id: &DecodedMessage,
    axis: Axis,
    anomalies: &mut AnomalyLog,
) -> Vec<AxisEntry> {
    let ordering = match graph.object(object_id) {
        Ok(entry) => entry
            .message(ENTRY_ORDERED_SET)
            .and_then(|set| set.message(ORDERED_SET_ORDERING)),
        Err(err) => {
            anomalies.record(
                AnomalyKind::UnresolvedObjectReference,
                format!("{} set: {err}", axis.as_str()),
            );
            return Vec::new();
        }
    };
    let Some(ordering) = ordering else {
        anomalies.record(
            AnomalyKind::UnresolvedObjectReference,
            format!("{} set has no ordering", axis.as_str()),
        );
        return Vec::new();
    };

    // ordering uuid -> identity uuid
    let mut identities: HashMap<Uuid, Uuid> = HashMap::new();
    let elements = ordering
        .message(ORDERING_CONTENTS)
        .into_iter()
        .flat_map(|contents| contents.messages(DICTIONARY_ELEMENT));
    for element in elements {
        match resolve_pair(graph, element) {
            Ok((ordering_id, identity)) => {
                identities.insert(ordering_id, identity);
            }
            Err(err) => anomalies.record(
                AnomalyKind::UnresolvedObjectReference,
                format!("{} ordering contents: {err}", axis.as_str()),
            ),
        }
    }

    let mut entries = Vec::new();
    let attachments = ordering
        .message(ORDERING_ARRAY)
        .into_iter()
        .flat_map(|array| array.messages(ARRAY_ATTACHMENT));
    for attachment in attachments {
        let Some(ordering_id) = attachment
            .bytes(ATTACHMENT_UUID)
            .and_then(|bytes| Uuid::from_slice(bytes).ok())
        else {
            anomalies.record(
                AnomalyKind::UnresolvedObjectReference,
                format!("{} ordering entry has no valid uuid", axis.as_str()),
            );
            continue;
        };
        match identities.remove(&ordering_id) {
            Some(identity) => entries.push(AxisEntry::new(
                identity,
                attachment.int(ATTACHMENT_INDEX).unwrap_or(0),
            )),
            None => anomalies.record(
                AnomalyKind::DanglingOrderingReference,
                format!("{} ordering {ordering_id} has no identity", axis.as_str()),
            ),
        }
    }

    let mut orphans: Vec<_> = identities.into_iter().collect();
    orphans.sort();
    for (ordering_id, identity) in orphans {
        anomalies.record(
            AnomalyKind::DanglingOrderingReference,
            format!(
                "{} {identity} references missing ordering {ordering_id}",
                axis.as_str()
            ),
        );
    }
    entries
}

fn cells(
    graph: &ObjectGraph<'_>,
    object_id: &DecodedMessage,
    anomalies: &mut AnomalyLog,
) -> ModelResult<Vec<TableCell<TextContent>>> {
    let columns = match dictionary(graph, object_id) {
        Ok(columns) => columns,
        Err(err) => {
            anomalies.record(
                AnomalyKind::UnresolvedObjectReference,
                format!("cell columns: {err}"),
            );
            return Ok(Vec::new());
        }
    };

    let mut cells = Vec::new();
    for column_element in columns.messages(DICTIONARY_ELEMENT) {
        let column = match element_key(graph, column_element) {
            Ok(column) => column,
            Err(err) => {
                anomalies.record(
                    AnomalyKind::UnresolvedObjectReference,
                    format!("cell column key: {err}"),
                );
                continue;
            }
        };
        let rows = match element_value(column_element).and_then(|value| dictionary(graph, value)) {
            Ok(rows) => rows,
            Err(err) => {
                anomalies.record(
                    AnomalyKind::UnresolvedObjectReference,
                    format!("cell rows of column {column}: {err}"),
                );
                continue;
            }
        };

        for row_element in rows.messages(DICTIONARY_ELEMENT) {
            let resolved = element_key(graph, row_element).and_then(|row| {
                let note = element_value(row_element)
                    .and_then(|value| graph.object(value))?
                    .message(ENTRY_NOTE)
                    .ok_or_else(|| format!("cell at row {row} is not a note"))?;
                Ok((row, note))
            });
            match resolved {
                Ok((row, note)) => cells.push(TableCell {
                    row,
                    column,
                    content: build_text_content(note)?,
                }),
                Err(err) => anomalies.record(
                    AnomalyKind::UnresolvedObjectReference,
                    format!("cell in column {column}: {err}"),
                ),
            }
        }
    }
    Ok(cells)
}

fn dictionary<'a>(
    graph: &ObjectGraph<'a>,
    object_id: &DecodedMessage,
) -> Result<&'a DecodedMessage, String> {
    graph
        .object(object_id)?
        .message(ENTRY_DICTIONARY)
        .ok_or_else(|| "entry is not a dictionary".to_string())
}

fn resolve_pair(graph: &ObjectGraph<'_>, element: &DecodedMessage) -> Result<(Uuid, Uuid), String> {
    let key = element_key(graph, element)?;
    let value = graph.resolve_uuid(element_value(element)?)?;
    Ok((key, value))
}

fn element_key(graph: &ObjectGraph<'_>, element: &DecodedMessage) -> Result<Uuid, String> {
    let key = element
        .message(ELEMENT_KEY)
        .ok_or_else(|| "dictionary element has no key".to_string())?;
    graph.resolve_uuid(key)
}

fn element_value(element: &DecodedMessage) -> Result<&DecodedMessage, String> {
    element
        .message(ELEMENT_VALUE)
        .ok_or_else(|| "dictionary element has no value".to_string())
}
