//! Nodes and the parent/child edges between them.

use super::{BoardId, EdgeId, NodeId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A labeled point in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub board_id: BoardId,
    #[serde(default)]
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl Node {
    pub fn new(board_id: BoardId, text: impl Into<String>, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            text: text.into(),
            x: position.x,
            y: position.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Fields for [`crate::Canvas::add_node`]. Omitted fields default to an empty
/// label at the world origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNode {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl NewNode {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            text: None,
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A directed parent to child relation between two nodes of one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub board_id: BoardId,
    pub parent_node_id: NodeId,
    pub child_node_id: NodeId,
}

impl Edge {
    pub fn new(board_id: BoardId, parent: NodeId, child: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            parent_node_id: parent,
            child_node_id: child,
        }
    }

    /// Whether either endpoint is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.parent_node_id == node || self.child_node_id == node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        let mut node = Node::new(Uuid::new_v4(), "a", Point::new(1.0, 2.0));
        node.translate(Vec2::new(-3.0, 4.5));
        assert_eq!(node.position(), Point::new(-2.0, 6.5));
    }

    #[test]
    fn test_edge_touches() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edge = Edge::new(Uuid::new_v4(), a, b);
        assert!(edge.touches(a));
        assert!(edge.touches(b));
        assert!(!edge.touches(c));
    }

    #[test]
    fn test_edge_serializes_camel_case() {
        let edge = Edge::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("parentNodeId").is_some());
        assert!(json.get("childNodeId").is_some());
        assert!(json.get("boardId").is_some());
    }
}
