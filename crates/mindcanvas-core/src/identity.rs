//! Per-device identity used to namespace persisted snapshots.

use crate::storage::Storage;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Storage key under which the resolved device id is cached.
pub const DEVICE_ID_KEY: &str = "mindcanvas:device-id";

const SNAPSHOT_KEY_PREFIX: &str = "mindcanvas:state:";

/// Length of the fingerprint token in characters.
const TOKEN_LEN: usize = 16;

/// Environment signals that tend to differ between devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSignals {
    /// Display surface description, e.g. `"1920x1080@2"`.
    pub surface: String,
    pub locale: String,
    pub timezone: String,
    pub concurrency: usize,
    pub platform: String,
}

impl DeviceSignals {
    /// Gather what the host process can see about itself.
    pub fn collect_native(surface: impl Into<String>) -> Self {
        let env = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
                .unwrap_or_default()
        };
        Self {
            surface: surface.into(),
            locale: env(&["LC_ALL", "LANG"]),
            timezone: env(&["TZ"]),
            concurrency: std::thread::available_parallelism().map_or(1, |n| n.get()),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    /// Derive a short, URL-safe token from the signals.
    ///
    /// Equal signals always produce the same token.
    pub fn fingerprint(&self) -> String {
        let joined = format!(
            "{}|{}|{}|{}|{}",
            self.surface, self.locale, self.timezone, self.concurrency, self.platform
        );
        let digest = Sha256::digest(joined.as_bytes());
        let mut token = URL_SAFE_NO_PAD.encode(digest);
        token.truncate(TOKEN_LEN);
        token
    }
}

/// Snapshot key for a device id.
pub fn snapshot_key(device_id: &str) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{device_id}")
}

/// Return the cached device id, computing and caching it on first use.
///
/// A storage failure falls back to the freshly computed fingerprint.
pub async fn resolve_device_id<S: Storage>(storage: &S, signals: &DeviceSignals) -> String {
    match storage.get(DEVICE_ID_KEY).await {
        Ok(Some(id)) if !id.trim().is_empty() => return id.trim().to_string(),
        Ok(_) => {}
        Err(e) => log::warn!("Failed to read device id: {e}"),
    }
    let id = signals.fingerprint();
    match storage.set(DEVICE_ID_KEY, id.clone()).await {
        Ok(()) => log::info!("Resolved new device id {id}"),
        Err(e) => log::warn!("Failed to cache device id: {e}"),
    }
    id
}
