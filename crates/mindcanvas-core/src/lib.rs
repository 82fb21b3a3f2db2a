//! MindCanvas Core Library
//!
//! Platform-agnostic canvas state and viewport engine for the MindCanvas
//! mind-mapping board: coordinate transforms, the board/node/edge/stroke
//! graph, ink capture and erasure, and debounced device-scoped persistence.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod entities;
pub mod identity;
pub mod ink;
pub mod input;
pub mod research;
pub mod session;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM, screen_to_world, world_to_screen};
pub use canvas::{BoardView, Canvas, CanvasDocument, SNAPSHOT_VERSION};
pub use config::{CanvasConfig, ConfigError};
pub use entities::{
    Board, BoardId, Edge, EdgeId, NewNode, Node, NodeId, SerializableColor, Side, Stroke,
    StrokeId, StrokePoint,
};
pub use identity::{DEVICE_ID_KEY, DeviceSignals, resolve_device_id, snapshot_key};
pub use ink::EraseOutcome;
pub use input::{InputEvent, KeyEvent, MouseButton, PointerEvent, Touch, TouchEvent, WheelEvent};
pub use research::{Paper, ResearchError, ResearchReply, ResearchRequest};
pub use session::Session;
pub use storage::{
    AutoSaveManager, FileStorage, MemoryStorage, SaveOutcome, Storage, StorageError,
    StorageResult,
};
pub use tools::{InteractionState, ToolKind};
pub use viewport::{Gesture, ViewportController};
