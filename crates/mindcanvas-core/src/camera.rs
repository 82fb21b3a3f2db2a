//! Camera module for pan/zoom transforms.
//!
//! The camera is an affine map from world space to screen space:
//! `screen = world * zoom + (x, y)`. All pointer interaction goes through
//! [`world_to_screen`] and [`screen_to_world`], which are exact inverses.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.2;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 2.5;

/// Camera manages the view transform for a board.
///
/// Serialized as `{x, y, zoom}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Horizontal screen offset of the world origin.
    pub x: f64,
    /// Vertical screen offset of the world origin.
    pub y: f64,
    /// Current zoom level, always within `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Convert a world point to screen coordinates.
pub fn world_to_screen(world: Point, camera: &Camera) -> Point {
    Point::new(world.x * camera.zoom + camera.x, world.y * camera.zoom + camera.y)
}

/// Convert a screen point to world coordinates.
pub fn screen_to_world(screen: Point, camera: &Camera) -> Point {
    Point::new((screen.x - camera.x) / camera.zoom, (screen.y - camera.y) / camera.zoom)
}

/// Clamp a requested zoom level into the allowed range.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset as a vector.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.zoom)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        screen_to_world(screen_point, self)
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        world_to_screen(world_point, self)
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Set the zoom level, keeping the world point under `anchor` fixed on screen.
    ///
    /// The requested zoom is clamped, never rejected.
    pub fn zoom_to(&mut self, anchor: Point, zoom: f64) {
        let new_zoom = clamp_zoom(zoom);
        // Resolve the anchor at the old zoom.
        let world = self.screen_to_world(anchor);
        self.x = anchor.x - world.x * new_zoom;
        self.y = anchor.y - world.y * new_zoom;
        self.zoom = new_zoom;
    }

    /// Multiply the zoom level by `factor` around `anchor`.
    pub fn zoom_by(&mut self, anchor: Point, factor: f64) {
        self.zoom_to(anchor, self.zoom * factor);
    }

    /// Re-clamp the zoom after external edits (e.g. a loaded snapshot).
    pub fn normalize(&mut self) {
        self.zoom = clamp_zoom(self.zoom);
        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        self.zoom = if bounds.width() <= f64::EPSILON || bounds.height() <= f64::EPSILON {
            1.0
        } else {
            let scale_x = padded_viewport.width / bounds.width();
            let scale_y = padded_viewport.height / bounds.height();
            clamp_zoom(scale_x.min(scale_y))
        };

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        self.x = viewport.width / 2.0 - bounds_center.x * self.zoom;
        self.y = viewport.height / 2.0 - bounds_center.y * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cameras() -> Vec<Camera> {
        vec![
            Camera::default(),
            Camera { x: 30.0, y: -20.0, zoom: 1.5 },
            Camera { x: -1234.5, y: 987.25, zoom: MIN_ZOOM },
            Camera { x: 0.125, y: 4096.0, zoom: MAX_ZOOM },
        ]
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_world_to_screen_formula() {
        let camera = Camera { x: 50.0, y: 100.0, zoom: 2.0 };
        let screen = world_to_screen(Point::new(10.0, 20.0), &camera);
        assert!((screen.x - 70.0).abs() < f64::EPSILON);
        assert!((screen.y - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_zoom() {
        let camera = Camera { x: 0.0, y: 0.0, zoom: 2.0 };
        let world = screen_to_world(Point::new(100.0, 200.0), &camera);
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.0, 456.0),
            Point::new(-987.654, 0.001),
            Point::new(1e5, -1e5),
        ];
        for camera in sample_cameras() {
            for p in points {
                let back = screen_to_world(world_to_screen(p, &camera), &camera);
                assert!((back.x - p.x).abs() < 1e-6, "x drifted for {camera:?}");
                assert!((back.y - p.y).abs() < 1e-6, "y drifted for {camera:?}");
            }
        }
    }

    #[test]
    fn test_transform_matches_world_to_screen() {
        let camera = Camera { x: 12.0, y: -7.0, zoom: 0.75 };
        let p = Point::new(40.0, 80.0);
        let a = camera.transform() * p;
        let b = camera.world_to_screen(p);
        assert!((a.x - b.x).abs() < 1e-9);
        assert!((a.y - b.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let anchor = Point::new(320.0, 240.0);
        for mut camera in sample_cameras() {
            let before = camera.screen_to_world(anchor);
            camera.zoom_by(anchor, 1.1);
            let after = camera.screen_to_world(anchor);
            assert!((before.x - after.x).abs() < 1e-6);
            assert!((before.y - after.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zoom_to_sets_offset_from_old_world_point() {
        let mut camera = Camera { x: 10.0, y: 20.0, zoom: 1.0 };
        camera.zoom_to(Point::new(110.0, 220.0), 2.0);
        // World point under the anchor was (100, 200).
        assert!((camera.x - (110.0 - 200.0)).abs() < f64::EPSILON);
        assert!((camera.y - (220.0 - 400.0)).abs() < f64::EPSILON);
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_by(Point::ZERO, 0.001);
        assert!((camera.zoom - MIN_ZOOM).abs() < f64::EPSILON);

        camera.zoom_by(Point::ZERO, 1000.0);
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamped_zoom_still_keeps_anchor_fixed() {
        let mut camera = Camera { x: 5.0, y: 5.0, zoom: 2.4 };
        let anchor = Point::new(200.0, 100.0);
        let before = camera.screen_to_world(anchor);
        camera.zoom_to(anchor, 9.0);
        let after = camera.screen_to_world(anchor);
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.x - 10.0).abs() < f64::EPSILON);
        assert!((camera.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_clamps_loaded_zoom() {
        let mut camera = Camera { x: f64::NAN, y: 3.0, zoom: 40.0 };
        camera.normalize();
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert!(camera.x.abs() < f64::EPSILON);
        assert!((camera.y - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut camera = Camera::new();
        let bounds = Rect::new(-100.0, -50.0, 100.0, 50.0);
        camera.fit_to_bounds(bounds, Size::new(800.0, 600.0), 0.0);
        let center = camera.world_to_screen(bounds.center());
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }
}
