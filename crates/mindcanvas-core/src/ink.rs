//! Ink capture and geometric erasure.
//!
//! A stroke moves through three phases: building (referenced by the
//! transient `drawing` slot), complete (a plain member of the stroke
//! collection), and erased or split into successor strokes.

use crate::canvas::Canvas;
use crate::entities::{Stroke, StrokeId, StrokePoint};
use kurbo::Point;
use uuid::Uuid;

/// Result of an erase pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseOutcome {
    /// Strokes that disappeared entirely.
    pub removed: Vec<StrokeId>,
    /// Strokes that were cut and kept their id for the first surviving segment.
    pub trimmed: Vec<StrokeId>,
    /// New strokes created from later surviving segments.
    pub created: Vec<StrokeId>,
}

impl EraseOutcome {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.trimmed.is_empty() && self.created.is_empty()
    }
}

impl Canvas {
    /// Begin a stroke on the current board with the current pen settings.
    ///
    /// Any stroke still in progress is finished first.
    pub fn start_stroke(&mut self, point: StrokePoint) -> Option<StrokeId> {
        let Some(board_id) = self.document.current_board_id else {
            log::warn!("start_stroke ignored: no current board");
            return None;
        };
        if self.interaction.drawing.is_some() {
            self.end_stroke();
        }
        let stroke = Stroke::new(board_id, point, self.document.pen_color, self.document.pen_size);
        let id = stroke.id;
        self.document.strokes.insert(id, stroke);
        self.interaction.drawing = Some(id);
        Some(id)
    }

    /// Append a sample to the stroke in progress. No-op when none is.
    pub fn add_point_to_stroke(&mut self, point: StrokePoint) -> bool {
        let Some(id) = self.interaction.drawing else {
            return false;
        };
        match self.document.strokes.get_mut(&id) {
            Some(stroke) => stroke.add_point(point),
            None => {
                self.interaction.drawing = None;
                false
            }
        }
    }

    /// Finish the stroke in progress and request a save.
    ///
    /// A stroke that ended with fewer than two points cannot be drawn and is
    /// dropped. Returns the id of the kept stroke.
    pub fn end_stroke(&mut self) -> Option<StrokeId> {
        let id = self.interaction.drawing.take()?;
        let stroke = self.document.strokes.get(&id)?;
        let board_id = stroke.board_id;
        let kept = if stroke.is_renderable() {
            Some(id)
        } else {
            log::debug!("Dropping stroke {id} with {} point(s)", stroke.len());
            self.document.strokes.remove(&id);
            None
        };
        self.touch_board(board_id);
        self.request_save();
        kept
    }

    /// The stroke currently being captured.
    pub fn stroke_in_progress(&self) -> Option<&Stroke> {
        self.interaction
            .drawing
            .and_then(|id| self.document.strokes.get(&id))
    }

    /// Erase around a world point using the configured radius.
    pub fn erase_stroke_at(&mut self, point: Point) -> EraseOutcome {
        let radius = self.config.erase_radius;
        self.erase_strokes_within(point, radius)
    }

    /// Erase every sample on the current board closer than `radius` to `point`.
    ///
    /// Each stroke is cut into maximal runs of surviving samples. Runs of two
    /// or more points survive: the first keeps the original id and later
    /// runs become new strokes with the same colour and size. Shorter runs
    /// are discarded.
    pub fn erase_strokes_within(&mut self, point: Point, radius: f64) -> EraseOutcome {
        let mut outcome = EraseOutcome::default();
        let Some(board_id) = self.document.current_board_id else {
            return outcome;
        };

        let hits: Vec<(StrokeId, Vec<Vec<StrokePoint>>)> = self
            .strokes_on_board(board_id)
            .filter(|s| Some(s.id) != self.interaction.drawing)
            .filter_map(|s| s.segments_outside(point, radius).map(|segs| (s.id, segs)))
            .collect();

        for (id, segments) in hits {
            let Some(mut original) = self.document.strokes.remove(&id) else {
                continue;
            };
            let mut segments = segments.into_iter();
            let Some(first) = segments.next() else {
                outcome.removed.push(id);
                continue;
            };
            for rest in segments {
                let successor = Stroke {
                    id: Uuid::new_v4(),
                    points: rest,
                    ..original.clone()
                };
                outcome.created.push(successor.id);
                self.document.strokes.insert(successor.id, successor);
            }
            original.points = first;
            self.document.strokes.insert(id, original);
            outcome.trimmed.push(id);
        }

        if !outcome.is_empty() {
            log::debug!(
                "Erase at ({:.1}, {:.1}): {} removed, {} trimmed, {} created",
                point.x,
                point.y,
                outcome.removed.len(),
                outcome.trimmed.len(),
                outcome.created.len()
            );
            self.touch_board(board_id);
            self.request_save();
        }
        outcome
    }
}
