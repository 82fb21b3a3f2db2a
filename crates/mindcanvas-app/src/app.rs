//! Application shell: configuration, storage wiring, and command execution.

use crate::cli::Command;
use kurbo::Size;
use mindcanvas_core::research::ResearchError;
use mindcanvas_core::{
    BoardId, CanvasConfig, ConfigError, DeviceSignals, FileStorage, NodeId, ResearchReply,
    SaveOutcome, SerializableColor, Session, Side, StorageError,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MINDCANVAS_CONFIG";
/// Config file picked up from the working directory.
pub const CONFIG_FILE: &str = "mindcanvas.json";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Research(#[from] ResearchError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No board {0}")]
    UnknownBoard(BoardId),
    #[error("No node {0}")]
    UnknownNode(NodeId),
    #[error("No current board")]
    NoBoard,
    #[error("Unknown side {0:?}; expected top, right, bottom or left")]
    UnknownSide(String),
    #[error("Node {node} cannot grow from the {side:?} side")]
    SideUnavailable { node: NodeId, side: Side },
    #[error("Invalid pen setting: {0}")]
    InvalidPen(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas: CanvasConfig,
    /// Storage directory; the platform data directory when unset.
    pub data_dir: Option<PathBuf>,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            data_dir: None,
            viewport_width: 1280.0,
            viewport_height: 800.0,
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, else `$MINDCANVAS_CONFIG`, else `./mindcanvas.json`
    /// when present. A missing or broken file means defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let local = PathBuf::from(CONFIG_FILE);
                local.exists().then_some(local)
            });
        let Some(path) = path else {
            return Self::default();
        };
        Self::from_file(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default config");
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(ConfigError::Parse)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    pub fn storage(&self) -> Result<FileStorage, StorageError> {
        match &self.data_dir {
            Some(dir) => FileStorage::new(dir.clone()),
            None => FileStorage::default_location(),
        }
    }
}

/// Main application struct.
pub struct App {
    session: Session<FileStorage>,
}

impl App {
    /// Open this device's session against the configured storage.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        let storage = Arc::new(config.storage()?);
        log::info!("Using storage at {}", storage.base_path().display());
        let surface = format!("cli:{}x{}", config.viewport_width, config.viewport_height);
        let signals = DeviceSignals::collect_native(surface);
        let session = Session::open(
            storage,
            &signals,
            config.canvas.clone(),
            config.viewport_size(),
        )
        .await;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Session<FileStorage> {
        &self.session
    }

    /// Run one command and persist any change before returning its output.
    pub async fn execute(&mut self, command: &Command) -> Result<String, AppError> {
        let output = self.apply(command, Instant::now())?;
        if self.session.has_pending_save() {
            match self.session.flush().await {
                SaveOutcome::Written => {}
                outcome => log::warn!("Changes not persisted: {outcome:?}"),
            }
        }
        Ok(output)
    }

    fn apply(&mut self, command: &Command, now: Instant) -> Result<String, AppError> {
        match command {
            Command::List => Ok(self.list()),
            Command::New { title, seed } => {
                let id = self
                    .session
                    .mutate(now, |c| c.create_board(title, seed.as_deref()));
                Ok(format!("Created board {id}"))
            }
            Command::Open { board } => {
                if !self.session.mutate(now, |c| c.set_current_board(*board)) {
                    return Err(AppError::UnknownBoard(*board));
                }
                Ok(format!("Opened board {board}"))
            }
            Command::Rename { board, title } => {
                if !self.session.mutate(now, |c| c.rename_board(*board, title)) {
                    return Err(AppError::UnknownBoard(*board));
                }
                Ok(format!("Renamed board {board}"))
            }
            Command::Delete { board } => {
                if !self.session.mutate(now, |c| c.delete_board(*board)) {
                    return Err(AppError::UnknownBoard(*board));
                }
                Ok(format!("Deleted board {board}"))
            }
            Command::Show { board, json } => {
                let id = board
                    .or_else(|| self.session.canvas().current_board_id())
                    .ok_or(AppError::NoBoard)?;
                if *json {
                    self.show_json(id)
                } else {
                    self.show(id)
                }
            }
            Command::Branch { node, side } => {
                let side = Side::parse(side).ok_or_else(|| AppError::UnknownSide(side.clone()))?;
                let canvas = self.session.canvas();
                if canvas.node(*node).is_none() {
                    return Err(AppError::UnknownNode(*node));
                }
                if !canvas.available_sides(*node).contains(&side) {
                    return Err(AppError::SideUnavailable { node: *node, side });
                }
                let children = self
                    .session
                    .mutate(now, |c| c.add_children_from_side(*node, side))
                    .ok_or(AppError::UnknownNode(*node))?;
                Ok(format!("Added {} and {}", children[0], children[1]))
            }
            Command::Text { node, text } => {
                if !self.session.mutate(now, |c| c.update_node_text(*node, text)) {
                    return Err(AppError::UnknownNode(*node));
                }
                Ok(format!("Updated node {node}"))
            }
            Command::Pen { color, size } => {
                if let Some(hex) = color {
                    let color = SerializableColor::from_hex(hex)
                        .ok_or_else(|| AppError::InvalidPen(hex.clone()))?;
                    self.session.mutate(now, |c| c.set_pen_color(color));
                }
                if let Some(size) = *size {
                    if !self.session.mutate(now, |c| c.set_pen_size(size)) {
                        return Err(AppError::InvalidPen(size.to_string()));
                    }
                }
                let canvas = self.session.canvas();
                Ok(format!(
                    "Pen {} at {}",
                    canvas.pen_color().to_hex(),
                    canvas.pen_size()
                ))
            }
            Command::Seed { topic, reply } => {
                let json = std::fs::read_to_string(reply).map_err(|source| AppError::Io {
                    path: reply.clone(),
                    source,
                })?;
                let papers = ResearchReply::from_json(&json)?.into_result()?;
                let id = self
                    .session
                    .mutate(now, |c| c.create_board_from_papers(topic, &papers));
                Ok(format!("Created board {id} from {} paper(s)", papers.len()))
            }
        }
    }

    fn list(&self) -> String {
        let canvas = self.session.canvas();
        let current = canvas.current_board_id();
        let mut out = String::new();
        for board in canvas.boards_ordered() {
            let marker = if Some(board.id) == current { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker} {}  {}  ({} nodes, {} strokes)",
                board.id,
                board.title,
                canvas.nodes_on_board(board.id).count(),
                canvas.strokes_on_board(board.id).count()
            );
        }
        if out.is_empty() {
            out.push_str("No boards\n");
        }
        out
    }

    fn show(&self, id: BoardId) -> Result<String, AppError> {
        let canvas = self.session.canvas();
        let view = canvas.board_view(id).ok_or(AppError::UnknownBoard(id))?;
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", view.board.title, view.board.id);
        let _ = writeln!(
            out,
            "camera x={:.1} y={:.1} zoom={:.2}",
            view.camera.x, view.camera.y, view.camera.zoom
        );
        let mut nodes = view.nodes.clone();
        nodes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        for node in nodes {
            let leaf = if canvas.is_leaf(node.id) { " leaf" } else { "" };
            let _ = writeln!(
                out,
                "  {} ({:.0}, {:.0}) {:?}{leaf}",
                node.id, node.x, node.y, node.text
            );
        }
        let _ = writeln!(out, "{} edge(s), {} stroke(s)", view.edges.len(), view.strokes.len());
        Ok(out)
    }

    fn show_json(&self, id: BoardId) -> Result<String, AppError> {
        let view = self
            .session
            .canvas()
            .board_view(id)
            .ok_or(AppError::UnknownBoard(id))?;
        let value = serde_json::json!({
            "board": view.board,
            "nodes": view.nodes,
            "edges": view.edges,
            "strokes": view.strokes,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
