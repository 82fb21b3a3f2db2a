//! Viewport controller: turns raw input into camera updates and entity edits.

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::entities::{NodeId, StrokePoint};
use crate::input::{InputEvent, KeyEvent, MouseButton, PointerEvent, Touch, TouchEvent, WheelEvent};
use crate::tools::ToolKind;
use kurbo::{Point, Size, Vec2};

/// Padding around content when fitting the camera to it.
const FIT_PADDING: f64 = 48.0;

/// The gesture currently driven by pointer or touch input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Dragging the background. `last` is in screen space.
    Panning { last: Point },
    /// Dragging a node. `last` is in screen space.
    DraggingNode { node: NodeId, last: Point },
    Drawing,
    Erasing,
    /// Two-finger pinch; distance and midpoint are in screen space.
    Pinching { distance: f64, midpoint: Point },
}

/// Stateful translator from input events to canvas operations.
#[derive(Debug, Clone)]
pub struct ViewportController {
    gesture: Gesture,
    viewport_size: Size,
}

impl ViewportController {
    pub fn new(viewport_size: Size) -> Self {
        Self {
            gesture: Gesture::Idle,
            viewport_size,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0)
    }

    /// Dispatch one input event. `t_ms` is the capture time recorded on ink samples.
    pub fn handle_event(&mut self, canvas: &mut Canvas, event: &InputEvent, t_ms: f64) {
        match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(canvas, pointer, t_ms),
            InputEvent::Touch(touch) => self.handle_touch(canvas, touch, t_ms),
            InputEvent::Wheel(wheel) => self.handle_wheel(canvas, wheel),
            InputEvent::Key(key) => self.handle_key(canvas, key),
        }
    }

    pub fn handle_pointer(&mut self, canvas: &mut Canvas, event: &PointerEvent, t_ms: f64) {
        match *event {
            PointerEvent::Down { position, button } => self.press(canvas, position, button, t_ms),
            PointerEvent::Move { position } => self.drag(canvas, position, t_ms),
            PointerEvent::Up { .. } | PointerEvent::Leave => self.release(canvas),
        }
    }

    pub fn handle_touch(&mut self, canvas: &mut Canvas, event: &TouchEvent, t_ms: f64) {
        match event {
            TouchEvent::Start { touches } => match touches.as_slice() {
                [a, b, ..] => {
                    self.release(canvas);
                    self.gesture = Gesture::Pinching {
                        distance: a.position.distance(b.position),
                        midpoint: a.position.midpoint(b.position),
                    };
                }
                [only] => self.press(canvas, only.position, MouseButton::Left, t_ms),
                [] => {}
            },
            TouchEvent::Move { touches } => match (self.gesture, touches.as_slice()) {
                (Gesture::Pinching { distance, midpoint }, [a, b, ..]) => {
                    self.pinch(canvas, distance, midpoint, a, b);
                }
                (Gesture::Pinching { .. }, _) => {}
                (_, [only, ..]) => self.drag(canvas, only.position, t_ms),
                (_, []) => {}
            },
            TouchEvent::End { .. } => self.release(canvas),
        }
    }

    /// Zoom around the cursor: scrolling up zooms in.
    pub fn handle_wheel(&mut self, canvas: &mut Canvas, event: &WheelEvent) {
        let step = canvas.config().wheel_zoom_step;
        let factor = if event.delta.y < 0.0 {
            step
        } else if event.delta.y > 0.0 {
            1.0 / step
        } else {
            return;
        };
        canvas.update_camera(|camera| camera.zoom_by(event.position, factor));
    }

    pub fn handle_key(&mut self, canvas: &mut Canvas, event: &KeyEvent) {
        let KeyEvent::Pressed(key) = event;
        let center = self.viewport_center();
        let step = canvas.config().wheel_zoom_step;
        match key.as_str() {
            "+" | "=" => {
                canvas.update_camera(|camera| camera.zoom_by(center, step));
            }
            "-" => {
                canvas.update_camera(|camera| camera.zoom_by(center, 1.0 / step));
            }
            "0" => {
                canvas.update_camera(|camera| camera.zoom_to(center, 1.0));
            }
            other => {
                if let Some(mode) = ToolKind::from_shortcut(other) {
                    self.release(canvas);
                    canvas.set_mode(mode);
                }
            }
        }
    }

    /// Fit the current board's content into the viewport.
    ///
    /// A board with nothing on it gets the default camera back.
    pub fn fit_to_content(&self, canvas: &mut Canvas) -> bool {
        let Some(board_id) = canvas.current_board_id() else {
            return false;
        };
        match canvas.content_bounds(board_id) {
            Some(bounds) => {
                let viewport = self.viewport_size;
                canvas.update_camera(|camera| camera.fit_to_bounds(bounds, viewport, FIT_PADDING))
            }
            None => canvas.update_camera(Camera::reset),
        }
    }

    /// Terminate whatever gesture is in progress.
    pub fn release(&mut self, canvas: &mut Canvas) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Drawing => {
                canvas.end_stroke();
            }
            Gesture::Panning { .. } => canvas.set_panning(false),
            Gesture::DraggingNode { node, .. } => {
                log::debug!("Finished dragging node {node}");
            }
            Gesture::Idle | Gesture::Erasing | Gesture::Pinching { .. } => {}
        }
    }

    fn press(&mut self, canvas: &mut Canvas, position: Point, button: MouseButton, t_ms: f64) {
        self.release(canvas);
        if canvas.current_board_id().is_none() {
            return;
        }
        if button.always_pans() {
            self.begin_pan(canvas, position);
            return;
        }
        let world = canvas.camera().screen_to_world(position);
        match canvas.mode() {
            ToolKind::Select => match canvas.node_at(world) {
                Some(node) => {
                    self.gesture = Gesture::DraggingNode {
                        node,
                        last: position,
                    }
                }
                None => self.begin_pan(canvas, position),
            },
            ToolKind::Pen => {
                if canvas
                    .start_stroke(StrokePoint::new(world.x, world.y, t_ms))
                    .is_some()
                {
                    self.gesture = Gesture::Drawing;
                }
            }
            ToolKind::Eraser => {
                canvas.erase_stroke_at(world);
                self.gesture = Gesture::Erasing;
            }
        }
    }

    fn begin_pan(&mut self, canvas: &mut Canvas, position: Point) {
        canvas.set_panning(true);
        self.gesture = Gesture::Panning { last: position };
    }

    fn drag(&mut self, canvas: &mut Canvas, position: Point, t_ms: f64) {
        match &mut self.gesture {
            Gesture::Panning { last } => {
                let delta = position - *last;
                *last = position;
                canvas.update_camera(|camera| camera.pan(delta));
            }
            Gesture::DraggingNode { node, last } => {
                let delta = (position - *last) / canvas.camera().zoom;
                *last = position;
                canvas.move_node(*node, delta);
            }
            Gesture::Drawing => {
                let world = canvas.camera().screen_to_world(position);
                canvas.add_point_to_stroke(StrokePoint::new(world.x, world.y, t_ms));
            }
            Gesture::Erasing => {
                let world = canvas.camera().screen_to_world(position);
                canvas.erase_stroke_at(world);
            }
            Gesture::Idle | Gesture::Pinching { .. } => {}
        }
    }

    /// Scale by the change in finger spread around the new midpoint, and pan
    /// by the midpoint's travel.
    fn pinch(&mut self, canvas: &mut Canvas, distance: f64, midpoint: Point, a: &Touch, b: &Touch) {
        let new_distance = a.position.distance(b.position);
        let new_midpoint = a.position.midpoint(b.position);
        let pan: Vec2 = new_midpoint - midpoint;
        let factor = if distance > f64::EPSILON {
            new_distance / distance
        } else {
            1.0
        };
        canvas.update_camera(|camera| {
            camera.pan(pan);
            camera.zoom_by(new_midpoint, factor);
        });
        self.gesture = Gesture::Pinching {
            distance: new_distance,
            midpoint: new_midpoint,
        };
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(Size::new(1280.0, 800.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;

    fn setup() -> (Canvas, ViewportController) {
        let mut canvas = Canvas::new(CanvasConfig::default());
        canvas.create_board("Viewport", None);
        canvas.take_save_request();
        (canvas, ViewportController::new(Size::new(800.0, 600.0)))
    }

    fn down(x: f64, y: f64) -> InputEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
        .into()
    }

    fn moved(x: f64, y: f64) -> InputEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
        .into()
    }

    fn up(x: f64, y: f64) -> InputEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
        .into()
    }

    fn key(k: &str) -> InputEvent {
        KeyEvent::Pressed(k.to_string()).into()
    }

    fn center_node(canvas: &Canvas) -> NodeId {
        canvas.node_at(Point::ZERO).unwrap()
    }

    #[test]
    fn test_select_drags_hit_node() {
        let (mut canvas, mut vp) = setup();
        let node = center_node(&canvas);
        vp.handle_event(&mut canvas, &down(0.0, 0.0), 0.0);
        assert!(matches!(vp.gesture(), Gesture::DraggingNode { .. }));
        vp.handle_event(&mut canvas, &moved(10.0, 5.0), 1.0);
        vp.handle_event(&mut canvas, &up(10.0, 5.0), 2.0);

        assert_eq!(canvas.node(node).unwrap().position(), Point::new(10.0, 5.0));
        assert!(vp.is_idle());
        assert!(canvas.take_save_request());
    }

    #[test]
    fn test_drag_delta_is_divided_by_zoom() {
        let (mut canvas, mut vp) = setup();
        canvas.update_camera(|c| c.zoom = 2.0);
        let node = center_node(&canvas);
        vp.handle_event(&mut canvas, &down(0.0, 0.0), 0.0);
        vp.handle_event(&mut canvas, &moved(20.0, 10.0), 1.0);
        assert_eq!(canvas.node(node).unwrap().position(), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_select_on_background_pans() {
        let (mut canvas, mut vp) = setup();
        vp.handle_event(&mut canvas, &down(500.0, 500.0), 0.0);
        assert!(canvas.is_panning());
        vp.handle_event(&mut canvas, &moved(520.0, 510.0), 1.0);
        vp.handle_event(&mut canvas, &moved(530.0, 530.0), 2.0);
        let camera = canvas.camera();
        assert_eq!((camera.x, camera.y), (30.0, 30.0));

        vp.handle_event(&mut canvas, &PointerEvent::Leave.into(), 3.0);
        assert!(!canvas.is_panning());
        assert!(vp.is_idle());
    }

    #[test]
    fn test_pen_captures_stroke() {
        let (mut canvas, mut vp) = setup();
        vp.handle_event(&mut canvas, &key("p"), 0.0);
        assert_eq!(canvas.mode(), ToolKind::Pen);

        vp.handle_event(&mut canvas, &down(100.0, 100.0), 0.0);
        vp.handle_event(&mut canvas, &moved(110.0, 100.0), 16.0);
        vp.handle_event(&mut canvas, &moved(120.0, 105.0), 32.0);
        vp.handle_event(&mut canvas, &up(120.0, 105.0), 40.0);

        assert!(canvas.interaction().drawing.is_none());
        let strokes: Vec<_> = canvas.document().strokes.values().collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].len(), 3);
        assert_eq!(strokes[0].points[1].t, 16.0);
    }

    #[test]
    fn test_pen_samples_are_in_world_space() {
        let (mut canvas, mut vp) = setup();
        canvas.update_camera(|c| {
            c.x = 100.0;
            c.zoom = 2.0;
        });
        canvas.set_mode(ToolKind::Pen);
        vp.handle_event(&mut canvas, &down(100.0, 0.0), 0.0);
        vp.handle_event(&mut canvas, &moved(120.0, 40.0), 1.0);
        let stroke = canvas.stroke_in_progress().unwrap();
        assert_eq!(stroke.points[1].position(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_pen_click_leaves_no_stroke() {
        let (mut canvas, mut vp) = setup();
        canvas.set_mode(ToolKind::Pen);
        vp.handle_event(&mut canvas, &down(5.0, 5.0), 0.0);
        vp.handle_event(&mut canvas, &up(5.0, 5.0), 1.0);
        assert!(canvas.document().strokes.is_empty());
    }

    #[test]
    fn test_eraser_erases_while_pressed() {
        let (mut canvas, mut vp) = setup();
        canvas.set_mode(ToolKind::Pen);
        vp.handle_event(&mut canvas, &down(0.0, 200.0), 0.0);
        for (i, x) in [100.0, 200.0, 300.0, 400.0].into_iter().enumerate() {
            vp.handle_event(&mut canvas, &moved(x, 200.0), i as f64 + 1.0);
        }
        vp.handle_event(&mut canvas, &up(400.0, 200.0), 10.0);

        vp.handle_event(&mut canvas, &key("e"), 11.0);
        vp.handle_event(&mut canvas, &down(200.0, 200.0), 12.0);
        assert_eq!(vp.gesture(), Gesture::Erasing);
        assert_eq!(canvas.document().strokes.len(), 2);
        vp.handle_event(&mut canvas, &moved(400.0, 200.0), 13.0);
        vp.handle_event(&mut canvas, &up(400.0, 200.0), 14.0);

        // Erasing 400 leaves the right half a single sample, which is dropped.
        assert_eq!(canvas.document().strokes.len(), 1);
    }

    #[test]
    fn test_middle_button_pans_in_pen_mode() {
        let (mut canvas, mut vp) = setup();
        canvas.set_mode(ToolKind::Pen);
        let press = PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Middle,
        };
        vp.handle_event(&mut canvas, &press.into(), 0.0);
        vp.handle_event(&mut canvas, &moved(30.0, 10.0), 1.0);
        assert!(canvas.document().strokes.is_empty());
        assert_eq!(canvas.camera().x, 20.0);
    }

    #[test]
    fn test_wheel_zooms_around_cursor() {
        let (mut canvas, mut vp) = setup();
        let cursor = Point::new(300.0, 200.0);
        let before = canvas.camera().screen_to_world(cursor);
        let wheel = WheelEvent {
            position: cursor,
            delta: Vec2::new(0.0, -1.0),
        };
        vp.handle_event(&mut canvas, &wheel.into(), 0.0);

        let camera = canvas.camera();
        assert!((camera.zoom - 1.1).abs() < 1e-9);
        let after = camera.screen_to_world(cursor);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let (mut canvas, mut vp) = setup();
        let wheel = WheelEvent {
            position: Point::ZERO,
            delta: Vec2::new(0.0, 1.0),
        };
        for _ in 0..100 {
            vp.handle_event(&mut canvas, &wheel.into(), 0.0);
        }
        assert!((canvas.camera().zoom - crate::camera::MIN_ZOOM).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_zooms_around_midpoint() {
        let (mut canvas, mut vp) = setup();
        let start = TouchEvent::Start {
            touches: vec![Touch::new(1, 0.0, 0.0), Touch::new(2, 100.0, 0.0)],
        };
        vp.handle_event(&mut canvas, &start.into(), 0.0);
        let spread = TouchEvent::Move {
            touches: vec![Touch::new(1, -50.0, 0.0), Touch::new(2, 150.0, 0.0)],
        };
        vp.handle_event(&mut canvas, &spread.into(), 1.0);

        let camera = canvas.camera();
        assert!((camera.zoom - 2.0).abs() < 1e-9);
        let under_mid = camera.screen_to_world(Point::new(50.0, 0.0));
        assert!((under_mid - Point::new(50.0, 0.0)).hypot() < 1e-9);

        vp.handle_event(&mut canvas, &TouchEvent::End { touches: vec![] }.into(), 2.0);
        assert!(vp.is_idle());
    }

    #[test]
    fn test_pinch_pans_with_midpoint() {
        let (mut canvas, mut vp) = setup();
        let start = TouchEvent::Start {
            touches: vec![Touch::new(1, 0.0, 0.0), Touch::new(2, 100.0, 0.0)],
        };
        vp.handle_event(&mut canvas, &start.into(), 0.0);
        let slide = TouchEvent::Move {
            touches: vec![Touch::new(1, 30.0, 40.0), Touch::new(2, 130.0, 40.0)],
        };
        vp.handle_event(&mut canvas, &slide.into(), 1.0);
        let camera = canvas.camera();
        assert_eq!((camera.x, camera.y, camera.zoom), (30.0, 40.0, 1.0));
    }

    #[test]
    fn test_single_touch_draws_in_pen_mode() {
        let (mut canvas, mut vp) = setup();
        canvas.set_mode(ToolKind::Pen);
        let events: [InputEvent; 3] = [
            TouchEvent::Start { touches: vec![Touch::new(7, 0.0, 0.0)] }.into(),
            TouchEvent::Move { touches: vec![Touch::new(7, 8.0, 8.0)] }.into(),
            TouchEvent::End { touches: vec![] }.into(),
        ];
        for (i, event) in events.iter().enumerate() {
            vp.handle_event(&mut canvas, event, i as f64);
        }
        assert_eq!(canvas.document().strokes.len(), 1);
    }

    #[test]
    fn test_keyboard_zoom_at_center() {
        let (mut canvas, mut vp) = setup();
        let center = Point::new(400.0, 300.0);
        let before = canvas.camera().screen_to_world(center);

        vp.handle_event(&mut canvas, &key("+"), 0.0);
        vp.handle_event(&mut canvas, &key("="), 0.0);
        let zoomed = canvas.camera();
        assert!((zoomed.zoom - 1.21).abs() < 1e-9);
        assert!((zoomed.screen_to_world(center) - before).hypot() < 1e-9);

        vp.handle_event(&mut canvas, &key("-"), 0.0);
        assert!((canvas.camera().zoom - 1.1).abs() < 1e-9);

        vp.handle_event(&mut canvas, &key("0"), 0.0);
        let reset = canvas.camera();
        assert!((reset.zoom - 1.0).abs() < 1e-9);
        assert!((reset.screen_to_world(center) - before).hypot() < 1e-9);
    }

    #[test]
    fn test_mode_switch_ends_stroke() {
        let (mut canvas, mut vp) = setup();
        canvas.set_mode(ToolKind::Pen);
        vp.handle_event(&mut canvas, &down(0.0, 0.0), 0.0);
        vp.handle_event(&mut canvas, &moved(5.0, 0.0), 1.0);
        vp.handle_event(&mut canvas, &key("v"), 2.0);
        assert!(vp.is_idle());
        assert!(canvas.interaction().drawing.is_none());
        assert_eq!(canvas.document().strokes.len(), 1);
    }

    #[test]
    fn test_events_without_board_are_ignored() {
        let mut canvas = Canvas::default();
        let mut vp = ViewportController::default();
        vp.handle_event(&mut canvas, &down(0.0, 0.0), 0.0);
        vp.handle_event(&mut canvas, &moved(10.0, 0.0), 1.0);
        vp.handle_event(&mut canvas, &key("+"), 2.0);
        assert!(vp.is_idle());
        assert!(!canvas.take_save_request());
    }

    #[test]
    fn test_fit_to_content() {
        let (mut canvas, vp) = setup();
        assert!(vp.fit_to_content(&mut canvas));
        let camera = canvas.camera();
        let center = camera.world_to_screen(Point::ZERO);
        assert!((center - Point::new(400.0, 300.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_fit_to_empty_board_resets_camera() {
        let (mut canvas, vp) = setup();
        let board = canvas.current_board_id().unwrap();
        let nodes: Vec<_> = canvas.nodes_on_board(board).map(|n| n.id).collect();
        for id in nodes {
            canvas.delete_node(id);
        }
        canvas.update_camera(|c| {
            c.x = 90.0;
            c.zoom = 2.0;
        });
        assert!(vp.fit_to_content(&mut canvas));
        assert_eq!(canvas.camera(), Camera::default());
    }
}
