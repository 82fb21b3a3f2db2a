//! Snapshot encoding with a serializability guard, and lenient decoding.

use crate::canvas::{CanvasDocument, SNAPSHOT_VERSION};
use crate::config::CanvasConfig;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Reasons a snapshot is not written.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Snapshot does not survive a JSON round-trip: {0}")]
    RoundTrip(#[source] serde_json::Error),
    #[error("Snapshot is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// Serialize a document and prove it is plain data.
///
/// The text must parse back into a document (non-finite numbers, for
/// instance, do not) and must fit within `max_bytes`.
pub fn encode_snapshot(document: &CanvasDocument, max_bytes: usize) -> Result<String, SnapshotError> {
    let json = serde_json::to_string(document).map_err(SnapshotError::Serialize)?;
    serde_json::from_str::<CanvasDocument>(&json).map_err(SnapshotError::RoundTrip)?;
    if json.len() > max_bytes {
        return Err(SnapshotError::TooLarge {
            size: json.len(),
            limit: max_bytes,
        });
    }
    Ok(json)
}

/// What a lenient decode had to fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// The text was not a JSON object; everything fell back to defaults.
    pub malformed: bool,
    /// Fields that were missing or unreadable and took their default.
    pub defaulted_fields: Vec<&'static str>,
    /// Map entries that could not be read.
    pub skipped_entries: usize,
    pub dropped_nodes: usize,
    pub dropped_edges: usize,
    pub dropped_strokes: usize,
    /// Whether `board_order` or `current_board_id` had to be reconciled.
    pub reordered: bool,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Decode a snapshot, recovering field by field.
///
/// Missing or unreadable fields take their defaults independently, unreadable
/// map entries are skipped, and the result is repaired so every structural
/// invariant holds.
pub fn decode_snapshot(json: &str, config: &CanvasConfig) -> (CanvasDocument, RepairReport) {
    let mut report = RepairReport::default();
    let mut document = CanvasDocument::with_pen(config.default_pen_color, config.default_pen_size);

    let root = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(root)) => root,
        Ok(_) | Err(_) => {
            report.malformed = true;
            return (document, report);
        }
    };

    let version = field(&root, "version", &mut report).and_then(|v| v.as_u64());
    let boards = field(&root, "boards", &mut report);
    let board_order = field(&root, "boardOrder", &mut report);
    let nodes = field(&root, "nodes", &mut report);
    let edges = field(&root, "edges", &mut report);
    let strokes = field(&root, "strokes", &mut report);
    let pen_color = field(&root, "penColor", &mut report);
    let pen_size = field(&root, "penSize", &mut report);

    if let Some(version) = version {
        if version > u64::from(SNAPSHOT_VERSION) {
            log::warn!("Snapshot version {version} is newer than {SNAPSHOT_VERSION}; reading what we can");
        }
    }

    document.boards = entries(boards, |b: &crate::entities::Board| b.id, &mut report);
    document.nodes = entries(nodes, |n: &crate::entities::Node| n.id, &mut report);
    document.edges = entries(edges, |e: &crate::entities::Edge| e.id, &mut report);
    document.strokes = entries(strokes, |s: &crate::entities::Stroke| s.id, &mut report);
    if let Some(order) = read::<Vec<Uuid>>(board_order, "boardOrder", &mut report) {
        document.board_order = order;
    }
    // `null` is a valid current board.
    document.current_board_id = root
        .get("currentBoardId")
        .cloned()
        .and_then(|v| read::<Option<Uuid>>(Some(v), "currentBoardId", &mut report))
        .flatten();
    if let Some(color) = read(pen_color, "penColor", &mut report) {
        document.pen_color = color;
    }
    if let Some(size) = read::<f64>(pen_size, "penSize", &mut report) {
        if size.is_finite() && size > 0.0 {
            document.pen_size = size;
        } else {
            report.defaulted_fields.push("penSize");
        }
    }

    document.repair_into(&mut report);
    (document, report)
}

fn field(root: &Map<String, Value>, name: &'static str, report: &mut RepairReport) -> Option<Value> {
    let value = root.get(name).filter(|v| !v.is_null()).cloned();
    if value.is_none() {
        report.defaulted_fields.push(name);
    }
    value
}

fn read<T: DeserializeOwned>(value: Option<Value>, name: &'static str, report: &mut RepairReport) -> Option<T> {
    match serde_json::from_value(value?) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("Snapshot field {name} unreadable: {e}");
            report.defaulted_fields.push(name);
            None
        }
    }
}

fn entries<T: DeserializeOwned>(
    value: Option<Value>,
    id_of: fn(&T) -> Uuid,
    report: &mut RepairReport,
) -> HashMap<Uuid, T> {
    let Some(Value::Object(map)) = value else {
        return HashMap::new();
    };
    let mut out = HashMap::with_capacity(map.len());
    for (key, entry) in map {
        match serde_json::from_value::<T>(entry) {
            Ok(item) => {
                out.insert(id_of(&item), item);
            }
            Err(e) => {
                log::debug!("Skipping unreadable entry {key}: {e}");
                report.skipped_entries += 1;
            }
        }
    }
    out
}

impl CanvasDocument {
    /// Restore structural invariants after loading.
    pub fn repair(&mut self) -> RepairReport {
        let mut report = RepairReport::default();
        self.repair_into(&mut report);
        report
    }

    fn repair_into(&mut self, report: &mut RepairReport) {
        for board in self.boards.values_mut() {
            board.camera.normalize();
        }

        let before = self.nodes.len();
        self.nodes.retain(|_, n| self.boards.contains_key(&n.board_id));
        report.dropped_nodes += before - self.nodes.len();

        let before = self.edges.len();
        self.edges.retain(|_, e| {
            self.boards.contains_key(&e.board_id)
                && self.nodes.contains_key(&e.parent_node_id)
                && self.nodes.contains_key(&e.child_node_id)
        });
        report.dropped_edges += before - self.edges.len();

        let before = self.strokes.len();
        self.strokes
            .retain(|_, s| self.boards.contains_key(&s.board_id) && s.is_renderable());
        report.dropped_strokes += before - self.strokes.len();

        let mut seen = HashSet::new();
        let original_order = self.board_order.clone();
        self.board_order
            .retain(|id| self.boards.contains_key(id) && seen.insert(*id));
        let mut missing: Vec<_> = self
            .boards
            .values()
            .filter(|b| !seen.contains(&b.id))
            .collect();
        missing.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        self.board_order.extend(missing.into_iter().map(|b| b.id));
        if self.board_order != original_order {
            report.reordered = true;
        }

        let current_valid = self
            .current_board_id
            .is_some_and(|id| self.boards.contains_key(&id));
        if !current_valid {
            let fallback = self.board_order.first().copied();
            if self.current_board_id != fallback {
                report.reordered = true;
            }
            self.current_board_id = fallback;
        }

        self.version = SNAPSHOT_VERSION;
        if !report.is_clean() {
            log::info!("Snapshot repaired: {report:?}");
        }
    }
}
