//! Canvas document and state management.
//!
//! [`CanvasDocument`] is the persisted slice of state. [`Canvas`] wraps it
//! together with transient interaction state and is the only legal way to
//! mutate the entity graph. Every mutation records a save request that the
//! autosave layer picks up with [`Canvas::take_save_request`].

use crate::camera::Camera;
use crate::config::CanvasConfig;
use crate::entities::{
    Board, BoardId, Edge, EdgeId, NewNode, Node, NodeId, SerializableColor, Side, Stroke,
    StrokeId,
};
use crate::tools::{InteractionState, ToolKind};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted entity graph.
///
/// Serialized as `{version, boards, boardOrder, currentBoardId, nodes, edges,
/// strokes, penColor, penSize}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDocument {
    pub version: u32,
    pub boards: HashMap<BoardId, Board>,
    /// Display order of boards, front first.
    pub board_order: Vec<BoardId>,
    pub current_board_id: Option<BoardId>,
    pub nodes: HashMap<NodeId, Node>,
    pub edges: HashMap<EdgeId, Edge>,
    pub strokes: HashMap<StrokeId, Stroke>,
    pub pen_color: SerializableColor,
    pub pen_size: f64,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        let config = CanvasConfig::default();
        Self::with_pen(config.default_pen_color, config.default_pen_size)
    }
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with the given pen settings.
    pub fn with_pen(pen_color: SerializableColor, pen_size: f64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            boards: HashMap::new(),
            board_order: Vec::new(),
            current_board_id: None,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            strokes: HashMap::new(),
            pen_color,
            pen_size,
        }
    }

    /// Check if the document has no boards.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a document from JSON, all or nothing.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Read-only view of one board, as consumed by exporters.
#[derive(Debug, Clone)]
pub struct BoardView<'a> {
    pub board: &'a Board,
    pub camera: Camera,
    pub nodes: Vec<&'a Node>,
    pub edges: Vec<&'a Edge>,
    /// Strokes in capture order.
    pub strokes: Vec<&'a Stroke>,
}

/// The entity store: persisted document plus transient interaction state.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) document: CanvasDocument,
    pub(crate) interaction: InteractionState,
    pub(crate) config: CanvasConfig,
    save_requested: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    /// Create a canvas with an empty document.
    pub fn new(config: CanvasConfig) -> Self {
        let document = CanvasDocument::with_pen(config.default_pen_color, config.default_pen_size);
        Self::with_document(document, config)
    }

    /// Create a canvas over an existing document.
    pub fn with_document(document: CanvasDocument, config: CanvasConfig) -> Self {
        Self {
            document,
            interaction: InteractionState::default(),
            config,
            save_requested: false,
        }
    }

    /// The persisted slice of state.
    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Replace the document wholesale (e.g. after a load). Transient state is reset.
    pub fn replace_document(&mut self, document: CanvasDocument) {
        self.document = document;
        self.interaction = InteractionState::default();
        self.save_requested = false;
    }

    pub(crate) fn request_save(&mut self) {
        self.save_requested = true;
    }

    /// Whether a mutation happened since the last call. Clears the flag.
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    pub(crate) fn touch_board(&mut self, board_id: BoardId) {
        if let Some(board) = self.document.boards.get_mut(&board_id) {
            board.touch();
        }
    }

    // --- Boards ---

    /// Create a board seeded with a central node and four cardinal children.
    ///
    /// The central node is labeled with `seed_text`, or the title when no seed
    /// is given. The new board goes to the front of the order and becomes current.
    pub fn create_board(&mut self, title: &str, seed_text: Option<&str>) -> BoardId {
        let center = match seed_text {
            Some(seed) if !seed.trim().is_empty() => seed,
            _ => title,
        };
        self.create_board_with_children(title, center, ["", "", "", ""])
    }

    /// Create a board whose four starter children (top, right, bottom, left)
    /// carry the given labels.
    pub fn create_board_with_children(
        &mut self,
        title: &str,
        center_text: &str,
        child_texts: [&str; 4],
    ) -> BoardId {
        let board = Board::new(title);
        let board_id = board.id;
        self.document.boards.insert(board_id, board);
        self.document.board_order.insert(0, board_id);
        self.document.current_board_id = Some(board_id);

        let center = Node::new(board_id, center_text, Point::ZERO);
        let center_id = center.id;
        self.document.nodes.insert(center_id, center);

        let radius = self.config.starter_radius;
        for (side, text) in Side::ALL.into_iter().zip(child_texts) {
            let position = Point::ZERO + side.direction() * radius;
            let child = Node::new(board_id, text, position);
            let edge = Edge::new(board_id, center_id, child.id);
            self.document.nodes.insert(child.id, child);
            self.document.edges.insert(edge.id, edge);
        }

        log::info!("Created board {board_id} ({title:?})");
        self.request_save();
        board_id
    }

    /// Delete a board and everything on it.
    pub fn delete_board(&mut self, id: BoardId) -> bool {
        if self.document.boards.remove(&id).is_none() {
            return false;
        }
        self.document.board_order.retain(|&b| b != id);
        self.document.nodes.retain(|_, n| n.board_id != id);
        self.document.edges.retain(|_, e| e.board_id != id);
        self.document.strokes.retain(|_, s| s.board_id != id);

        if let Some(drawing) = self.interaction.drawing {
            if !self.document.strokes.contains_key(&drawing) {
                self.interaction.drawing = None;
            }
        }
        if self.document.current_board_id == Some(id) {
            self.document.current_board_id = self.document.board_order.first().copied();
        }

        log::info!("Deleted board {id}");
        self.request_save();
        true
    }

    /// Make a board current.
    pub fn set_current_board(&mut self, id: BoardId) -> bool {
        if !self.document.boards.contains_key(&id) {
            log::warn!("Cannot select unknown board {id}");
            return false;
        }
        if self.document.current_board_id != Some(id) {
            self.end_stroke();
            self.document.current_board_id = Some(id);
            self.request_save();
        }
        true
    }

    pub fn rename_board(&mut self, id: BoardId, title: &str) -> bool {
        let Some(board) = self.document.boards.get_mut(&id) else {
            return false;
        };
        board.title = title.to_string();
        board.touch();
        self.request_save();
        true
    }

    pub fn current_board_id(&self) -> Option<BoardId> {
        self.document.current_board_id
    }

    pub fn current_board(&self) -> Option<&Board> {
        self.document
            .current_board_id
            .and_then(|id| self.document.boards.get(&id))
    }

    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.document.boards.get(&id)
    }

    /// Boards in display order.
    pub fn boards_ordered(&self) -> impl Iterator<Item = &Board> {
        self.document
            .board_order
            .iter()
            .filter_map(|id| self.document.boards.get(id))
    }

    // --- Camera ---

    /// The current board's camera, or the default when there is no board.
    pub fn camera(&self) -> Camera {
        self.current_board().map(|b| b.camera).unwrap_or_default()
    }

    /// The viewport update operation: the only way a camera changes.
    ///
    /// Zoom is clamped after `update` runs. Returns false when there is no
    /// current board.
    pub fn update_camera(&mut self, update: impl FnOnce(&mut Camera)) -> bool {
        let Some(board) = self
            .document
            .current_board_id
            .and_then(|id| self.document.boards.get_mut(&id))
        else {
            return false;
        };
        let before = board.camera;
        update(&mut board.camera);
        board.camera.normalize();
        if board.camera != before {
            board.touch();
            self.request_save();
        }
        true
    }

    // --- Nodes and edges ---

    /// Add a node to the current board.
    pub fn add_node(&mut self, new: NewNode) -> Option<NodeId> {
        let Some(board_id) = self.document.current_board_id else {
            log::warn!("add_node ignored: no current board");
            return None;
        };
        let position = Point::new(new.x.unwrap_or(0.0), new.y.unwrap_or(0.0));
        let node = Node::new(board_id, new.text.unwrap_or_default(), position);
        let id = node.id;
        self.document.nodes.insert(id, node);
        self.touch_board(board_id);
        self.request_save();
        Some(id)
    }

    /// Delete a node and every edge that references it.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.document.nodes.remove(&id) else {
            return false;
        };
        let before = self.document.edges.len();
        self.document.edges.retain(|_, e| !e.touches(id));
        log::debug!(
            "Deleted node {id}, pruned {} edge(s)",
            before - self.document.edges.len()
        );
        self.touch_board(node.board_id);
        self.request_save();
        true
    }

    /// Translate a node by a world-space delta.
    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        let Some(node) = self.document.nodes.get_mut(&id) else {
            return false;
        };
        node.translate(delta);
        let board_id = node.board_id;
        self.touch_board(board_id);
        self.request_save();
        true
    }

    pub fn update_node_text(&mut self, id: NodeId, text: &str) -> bool {
        let Some(node) = self.document.nodes.get_mut(&id) else {
            return false;
        };
        node.text = text.to_string();
        let board_id = node.board_id;
        self.touch_board(board_id);
        self.request_save();
        true
    }

    /// Connect two existing nodes on the current board.
    ///
    /// Board membership of the endpoints and cycles are not checked.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Option<EdgeId> {
        let Some(board_id) = self.document.current_board_id else {
            log::warn!("add_edge ignored: no current board");
            return None;
        };
        if !self.document.nodes.contains_key(&parent) || !self.document.nodes.contains_key(&child) {
            log::warn!("add_edge ignored: endpoint {parent} or {child} does not exist");
            return None;
        }
        let edge = Edge::new(board_id, parent, child);
        let id = edge.id;
        self.document.edges.insert(id, edge);
        self.touch_board(board_id);
        self.request_save();
        Some(id)
    }

    /// Grow the tree: place two children beyond `side` of a node.
    ///
    /// Children sit `branch_forward` units out along the side's axis and are
    /// fanned `branch_spread` units either way along the perpendicular axis.
    pub fn add_children_from_side(&mut self, id: NodeId, side: Side) -> Option<[NodeId; 2]> {
        let Some(source) = self.document.nodes.get(&id) else {
            log::warn!("add_children_from_side ignored: unknown node {id}");
            return None;
        };
        let board_id = source.board_id;
        let origin = source.position();
        let dir = side.direction();
        let anchor = origin + dir * self.config.branch_forward;
        let spread = Vec2::new(dir.y.abs(), dir.x.abs()) * self.config.branch_spread;

        let mut ids = [NodeId::nil(); 2];
        for (slot, position) in ids.iter_mut().zip([anchor - spread, anchor + spread]) {
            let child = Node::new(board_id, "", position);
            let edge = Edge::new(board_id, id, child.id);
            *slot = child.id;
            self.document.nodes.insert(child.id, child);
            self.document.edges.insert(edge.id, edge);
        }

        self.touch_board(board_id);
        self.request_save();
        Some(ids)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.document.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.document.edges.get(&id)
    }

    pub fn nodes_on_board(&self, board_id: BoardId) -> impl Iterator<Item = &Node> {
        self.document
            .nodes
            .values()
            .filter(move |n| n.board_id == board_id)
    }

    pub fn edges_on_board(&self, board_id: BoardId) -> impl Iterator<Item = &Edge> {
        self.document
            .edges
            .values()
            .filter(move |e| e.board_id == board_id)
    }

    pub fn strokes_on_board(&self, board_id: BoardId) -> impl Iterator<Item = &Stroke> {
        self.document
            .strokes
            .values()
            .filter(move |s| s.board_id == board_id)
    }

    // --- Derived topology queries (recomputed from positions every call) ---

    /// Children of a node, via its outgoing edges.
    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.document
            .edges
            .values()
            .filter(move |e| e.parent_node_id == id)
            .filter_map(move |e| self.document.nodes.get(&e.child_node_id))
    }

    /// The parent of a node, if an incoming edge exists.
    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        self.document
            .edges
            .values()
            .find(|e| e.child_node_id == id)
            .and_then(|e| self.document.nodes.get(&e.parent_node_id))
    }

    /// A leaf has no outgoing parent to child edges.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        !self.document.edges.values().any(|e| e.parent_node_id == id)
    }

    /// The side of `id` that faces its parent, by the dominant axis of the
    /// offset between them.
    pub fn parent_side(&self, id: NodeId) -> Option<Side> {
        let node = self.node(id)?;
        let parent = self.parent_of(id)?;
        Some(Side::classify(parent.position() - node.position()))
    }

    /// Whether any child of `id` lies beyond `side`.
    pub fn has_child_on_side(&self, id: NodeId, side: Side) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let origin = node.position();
        self.children_of(id)
            .any(|child| Side::classify(child.position() - origin) == side)
    }

    /// Sides where an "add children" affordance should be offered: neither
    /// facing the parent nor already holding a child.
    pub fn available_sides(&self, id: NodeId) -> Vec<Side> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        let parent_side = self.parent_side(id);
        Side::ALL
            .into_iter()
            .filter(|&side| Some(side) != parent_side && !self.has_child_on_side(id, side))
            .collect()
    }

    /// The node on the current board nearest to `world_point` within the hit radius.
    pub fn node_at(&self, world_point: Point) -> Option<NodeId> {
        let board_id = self.document.current_board_id?;
        let radius = self.config.node_hit_radius;
        self.nodes_on_board(board_id)
            .map(|n| (n.id, n.position().distance(world_point)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Bounding box of all nodes and strokes on a board.
    pub fn content_bounds(&self, board_id: BoardId) -> Option<Rect> {
        let nodes = self
            .nodes_on_board(board_id)
            .map(|n| Rect::from_points(n.position(), n.position()));
        let strokes = self
            .strokes_on_board(board_id)
            .filter(|s| !s.is_empty())
            .map(Stroke::bounds);
        nodes.chain(strokes).reduce(|a, b| a.union(b))
    }

    /// Read-only view of a board for exporters.
    pub fn board_view(&self, board_id: BoardId) -> Option<BoardView<'_>> {
        let board = self.document.boards.get(&board_id)?;
        let mut strokes: Vec<&Stroke> = self.strokes_on_board(board_id).collect();
        strokes.sort_by(|a, b| {
            let ta = a.points.first().map_or(0.0, |p| p.t);
            let tb = b.points.first().map_or(0.0, |p| p.t);
            ta.total_cmp(&tb).then(a.id.cmp(&b.id))
        });
        Some(BoardView {
            board,
            camera: board.camera,
            nodes: self.nodes_on_board(board_id).collect(),
            edges: self.edges_on_board(board_id).collect(),
            strokes,
        })
    }

    // --- Mode and pen ---

    pub fn mode(&self) -> ToolKind {
        self.interaction.mode
    }

    /// Switch editing mode. Any gesture in progress is abandoned.
    pub fn set_mode(&mut self, mode: ToolKind) {
        if self.interaction.mode != mode {
            self.end_stroke();
            self.interaction.is_panning = false;
            self.interaction.mode = mode;
        }
    }

    pub fn is_panning(&self) -> bool {
        self.interaction.is_panning
    }

    pub fn set_panning(&mut self, panning: bool) {
        self.interaction.is_panning = panning;
    }

    pub fn pen_color(&self) -> SerializableColor {
        self.document.pen_color
    }

    pub fn pen_size(&self) -> f64 {
        self.document.pen_size
    }

    pub fn set_pen_color(&mut self, color: SerializableColor) {
        self.document.pen_color = color;
        self.request_save();
    }

    /// Set the pen width. Non-positive or non-finite sizes are ignored.
    pub fn set_pen_size(&mut self, size: f64) -> bool {
        if !size.is_finite() || size <= 0.0 {
            log::warn!("Ignoring invalid pen size {size}");
            return false;
        }
        self.document.pen_size = size;
        self.request_save();
        true
    }
}
