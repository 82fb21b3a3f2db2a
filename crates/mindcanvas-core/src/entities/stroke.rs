//! Freehand ink strokes.

use super::{BoardId, SerializableColor, StrokeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured pen sample in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Capture time in milliseconds.
    #[serde(default)]
    pub t: f64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One continuous pen gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    pub board_id: BoardId,
    pub points: Vec<StrokePoint>,
    pub color: SerializableColor,
    pub size: f64,
}

impl Stroke {
    /// Start a stroke from its first sample.
    pub fn new(board_id: BoardId, first: StrokePoint, color: SerializableColor, size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            points: vec![first],
            color,
            size,
        }
    }

    /// Append a sample. Samples captured before the last one are ignored.
    /// Returns whether the sample was kept.
    pub fn add_point(&mut self, point: StrokePoint) -> bool {
        if let Some(last) = self.points.last() {
            if point.t < last.t {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A stroke needs at least two points to be drawn as a line.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Bounding box of the sample positions.
    pub fn bounds(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(first.position(), first.position()), |r, p| {
            r.union_pt(p.position())
        })
    }

    /// Split the points into maximal runs lying outside `radius` of `center`.
    ///
    /// Points strictly closer than `radius` are erased. Runs shorter than two
    /// points are discarded. Returns `None` when no point is erased.
    pub fn segments_outside(&self, center: Point, radius: f64) -> Option<Vec<Vec<StrokePoint>>> {
        let mut segments = Vec::new();
        let mut current: Vec<StrokePoint> = Vec::new();
        let mut erased_any = false;

        for point in &self.points {
            if point.position().distance(center) < radius {
                erased_any = true;
                if current.len() >= 2 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            } else {
                current.push(*point);
            }
        }
        if current.len() >= 2 {
            segments.push(current);
        }

        erased_any.then_some(segments)
    }
}
