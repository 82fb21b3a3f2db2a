//! Board entity.

use super::{BoardId, now_millis};
use crate::camera::Camera;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An independent mind-map canvas with its own camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Last mutation time, milliseconds since the Unix epoch.
    pub updated_at: u64,
    #[serde(default)]
    pub camera: Camera,
}

impl Board {
    /// Create a new board with a fresh id and default camera.
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            camera: Camera::default(),
        }
    }

    /// Refresh `updated_at`. Never moves backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(now_millis());
    }
}
