//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "mindcanvas", about = "Mind-map boards with durable local storage")]
pub struct Cli {
    /// Config file; falls back to MINDCANVAS_CONFIG, then ./mindcanvas.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the storage directory.
    #[arg(long, global = true, env = "MINDCANVAS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List boards, front first. The current board is starred.
    List,
    /// Create a board and make it current.
    New {
        title: String,
        /// Label for the central node; defaults to the title.
        #[arg(long)]
        seed: Option<String>,
    },
    /// Make a board current.
    Open { board: Uuid },
    Rename { board: Uuid, title: String },
    /// Delete a board with everything on it.
    Delete { board: Uuid },
    /// Print a board; the current one by default.
    Show {
        board: Option<Uuid>,
        #[arg(long)]
        json: bool,
    },
    /// Add two children beyond one side of a node.
    Branch {
        node: Uuid,
        /// top, right, bottom or left.
        side: String,
    },
    /// Set a node's label.
    Text { node: Uuid, text: String },
    /// Change the pen.
    Pen {
        /// Hex colour such as #1f2937.
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<f64>,
    },
    /// Create a board from a saved research service reply.
    Seed { topic: String, reply: PathBuf },
}
