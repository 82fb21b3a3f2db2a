//! Debounced persistence of the canvas document.
//!
//! Mutations call [`AutoSaveManager::request_save`]; the host loop calls
//! [`AutoSaveManager::flush_if_due`] on every tick. A burst of requests
//! collapses into a single write carrying the latest state.

use super::snapshot::{decode_snapshot, encode_snapshot};
use super::Storage;
use crate::canvas::CanvasDocument;
use crate::config::CanvasConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a save attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written.
    Written,
    /// Nothing was pending, or the deadline has not passed.
    Idle,
    /// The snapshot failed the serializability guard and was not written.
    Skipped,
    /// The backend refused the write.
    Failed,
}

/// Manages debounced persistence of one document under one key.
pub struct AutoSaveManager<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    key: String,
    debounce: Duration,
    max_bytes: usize,
    /// When the pending save becomes due.
    deadline: Option<Instant>,
    last_save: Option<Instant>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>, key: impl Into<String>, config: &CanvasConfig) -> Self {
        Self {
            storage,
            key: key.into(),
            debounce: config.save_debounce(),
            max_bytes: config.max_snapshot_bytes,
            deadline: None,
            last_save: None,
        }
    }

    /// Schedule a save one debounce interval from `now`, replacing any
    /// pending one.
    pub fn request_save(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn has_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the pending save's deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn last_save(&self) -> Option<Instant> {
        self.last_save
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Write the document if a pending save is due.
    pub async fn flush_if_due(&mut self, now: Instant, document: &CanvasDocument) -> SaveOutcome {
        if !self.is_due(now) {
            return SaveOutcome::Idle;
        }
        self.save_now(document).await
    }

    /// Write the document immediately, cancelling any pending save.
    ///
    /// Failures are logged and reported in the outcome; they never propagate.
    /// A backend failure leaves a save pending so the next flush retries.
    pub async fn save_now(&mut self, document: &CanvasDocument) -> SaveOutcome {
        self.deadline = None;
        let json = match encode_snapshot(document, self.max_bytes) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Not saving {}: {e}", self.key);
                return SaveOutcome::Skipped;
            }
        };
        match self.storage.set(&self.key, json).await {
            Ok(()) => {
                log::debug!("Saved {}", self.key);
                self.last_save = Some(Instant::now());
                SaveOutcome::Written
            }
            Err(e) => {
                log::error!("Failed to save {}: {e}", self.key);
                self.deadline = Some(Instant::now() + self.debounce);
                SaveOutcome::Failed
            }
        }
    }

    /// Load the stored document, repairing what can be repaired.
    ///
    /// An absent, unreadable, or malformed snapshot yields the default state.
    pub async fn load(&self, config: &CanvasConfig) -> CanvasDocument {
        let fallback = || CanvasDocument::with_pen(config.default_pen_color, config.default_pen_size);
        match self.storage.get(&self.key).await {
            Ok(Some(json)) => {
                let (document, report) = decode_snapshot(&json, config);
                if report.malformed {
                    log::warn!("Snapshot under {} is malformed; starting fresh", self.key);
                }
                document
            }
            Ok(None) => {
                log::info!("No snapshot under {}; starting fresh", self.key);
                fallback()
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}; starting fresh", self.key);
                fallback()
            }
        }
    }

    /// Remove the stored snapshot and cancel any pending save.
    pub async fn clear(&mut self) {
        self.deadline = None;
        if let Err(e) = self.storage.delete(&self.key).await {
            log::warn!("Failed to clear {}: {e}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::storage::{BoxFuture, MemoryStorage, StorageError, StorageResult};
    use kurbo::Vec2;
    use pollster::block_on;

    const KEY: &str = "mindcanvas:state:test";

    fn manager() -> AutoSaveManager<MemoryStorage> {
        AutoSaveManager::new(Arc::new(MemoryStorage::new()), KEY, &CanvasConfig::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_nothing_pending_is_idle() {
        let mut manager = manager();
        let doc = CanvasDocument::new();
        assert!(!manager.has_pending());
        assert_eq!(block_on(manager.flush_if_due(Instant::now(), &doc)), SaveOutcome::Idle);
        assert_eq!(manager.storage().write_count(), 0);
    }

    #[test]
    fn test_burst_collapses_into_one_write_with_latest_state() {
        let mut manager = manager();
        let mut canvas = Canvas::default();
        canvas.create_board("Burst", None);
        let node = canvas.document().nodes.keys().next().copied().unwrap();
        let start = Instant::now();

        for i in 0..10u64 {
            canvas.move_node(node, Vec2::new(1.0, 0.0));
            assert!(canvas.take_save_request());
            manager.request_save(start + ms(i * 10));
            let outcome = block_on(manager.flush_if_due(start + ms(i * 10 + 5), canvas.document()));
            assert_eq!(outcome, SaveOutcome::Idle);
        }

        // 300ms after the last request.
        let due = start + ms(90 + 300);
        assert!(manager.is_due(due));
        assert_eq!(block_on(manager.flush_if_due(due, canvas.document())), SaveOutcome::Written);
        assert_eq!(manager.storage().write_count(), 1);
        assert!(!manager.has_pending());

        let stored = manager.storage().peek(KEY).unwrap();
        let stored = CanvasDocument::from_json(&stored).unwrap();
        assert_eq!(&stored, canvas.document());
    }

    #[test]
    fn test_request_reschedules_deadline() {
        let mut manager = manager();
        let start = Instant::now();
        manager.request_save(start);
        manager.request_save(start + ms(200));
        assert!(!manager.is_due(start + ms(300)));
        assert!(manager.is_due(start + ms(500)));
    }

    #[test]
    fn test_guard_skips_non_finite_state() {
        let mut manager = manager();
        let mut canvas = Canvas::default();
        canvas.create_board("Bad", None);
        let node = canvas.document().nodes.keys().next().copied().unwrap();
        canvas.move_node(node, Vec2::new(f64::INFINITY, 0.0));

        assert_eq!(block_on(manager.save_now(canvas.document())), SaveOutcome::Skipped);
        assert_eq!(manager.storage().write_count(), 0);
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_save_then_load_is_idempotent() {
        let mut manager = manager();
        let config = CanvasConfig::default();
        let mut canvas = Canvas::default();
        canvas.create_board("Keep", Some("Centre"));
        canvas.create_board("Also", None);

        assert_eq!(block_on(manager.save_now(canvas.document())), SaveOutcome::Written);
        let loaded = block_on(manager.load(&config));
        assert_eq!(&loaded, canvas.document());

        // A second cycle changes nothing.
        block_on(manager.save_now(&loaded));
        assert_eq!(block_on(manager.load(&config)), loaded);
    }

    #[test]
    fn test_load_missing_or_malformed_gives_defaults() {
        let manager = manager();
        let config = CanvasConfig::default();
        assert!(block_on(manager.load(&config)).is_empty());

        block_on(manager.storage().set(KEY, "{{{".to_string())).unwrap();
        let loaded = block_on(manager.load(&config));
        assert!(loaded.is_empty());
        assert_eq!(loaded.pen_color, config.default_pen_color);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let mut manager = manager();
        block_on(manager.save_now(&CanvasDocument::new()));
        manager.request_save(Instant::now());
        block_on(manager.clear());
        assert!(manager.storage().peek(KEY).is_none());
        assert!(!manager.has_pending());
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }

        fn set(&self, _key: &str, _value: String) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }

        fn delete(&self, _key: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }
    }

    #[test]
    fn test_backend_failures_are_absorbed() {
        let config = CanvasConfig::default();
        let mut manager = AutoSaveManager::new(Arc::new(BrokenStorage), KEY, &config);
        assert_eq!(block_on(manager.save_now(&CanvasDocument::new())), SaveOutcome::Failed);
        assert!(block_on(manager.load(&config)).is_empty());
        block_on(manager.clear());
    }

    #[test]
    fn test_failed_write_stays_pending() {
        let config = CanvasConfig::default();
        let mut manager = AutoSaveManager::new(Arc::new(BrokenStorage), KEY, &config);
        let t0 = Instant::now();
        manager.request_save(t0);
        let outcome = block_on(manager.flush_if_due(t0 + manager.debounce(), &CanvasDocument::new()));
        assert_eq!(outcome, SaveOutcome::Failed);
        assert!(manager.has_pending());
        assert!(manager.last_save().is_none());
        block_on(manager.clear());
    }
}
