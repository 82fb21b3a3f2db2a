//! A running canvas: entity store, viewport controller, and persistence wired together.

use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::identity::{DeviceSignals, resolve_device_id, snapshot_key};
use crate::input::InputEvent;
use crate::storage::{AutoSaveManager, SaveOutcome, Storage};
use crate::viewport::ViewportController;
use kurbo::Size;
use std::sync::Arc;
use std::time::Instant;

/// Owns one device's canvas and keeps it durable.
///
/// All changes go through [`Session::handle_event`] or [`Session::mutate`],
/// which forward the canvas's save requests to the debounced writer. The host
/// loop calls [`Session::tick`] regularly and [`Session::flush`] on shutdown.
pub struct Session<S: Storage> {
    canvas: Canvas,
    viewport: ViewportController,
    autosave: AutoSaveManager<S>,
    device_id: String,
    started: Instant,
}

impl<S: Storage> Session<S> {
    /// Resolve this device's identity and load its snapshot.
    pub async fn open(
        storage: Arc<S>,
        signals: &DeviceSignals,
        config: CanvasConfig,
        viewport_size: Size,
    ) -> Self {
        let device_id = resolve_device_id(storage.as_ref(), signals).await;
        let autosave = AutoSaveManager::new(storage, snapshot_key(&device_id), &config);
        let document = autosave.load(&config).await;
        log::info!(
            "Opened session for device {device_id}: {} board(s)",
            document.boards.len()
        );
        Self {
            canvas: Canvas::with_document(document, config),
            viewport: ViewportController::new(viewport_size),
            autosave,
            device_id,
            started: Instant::now(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport.set_viewport_size(size);
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.has_pending()
    }

    /// Feed one input event through the viewport controller.
    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) {
        let t_ms = now.saturating_duration_since(self.started).as_secs_f64() * 1000.0;
        self.viewport.handle_event(&mut self.canvas, event, t_ms);
        self.forward_save_request(now);
    }

    /// Run a direct store operation.
    pub fn mutate<R>(&mut self, now: Instant, op: impl FnOnce(&mut Canvas) -> R) -> R {
        let result = op(&mut self.canvas);
        self.forward_save_request(now);
        result
    }

    /// Write the snapshot if the debounce window has elapsed.
    pub async fn tick(&mut self, now: Instant) -> SaveOutcome {
        self.autosave.flush_if_due(now, self.canvas.document()).await
    }

    /// Write the snapshot now, whether or not a save is pending.
    pub async fn flush(&mut self) -> SaveOutcome {
        self.canvas.take_save_request();
        self.autosave.save_now(self.canvas.document()).await
    }

    fn forward_save_request(&mut self, now: Instant) {
        if self.canvas.take_save_request() {
            self.autosave.request_save(now);
        }
    }
}
