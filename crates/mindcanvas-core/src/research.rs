//! Message types for the paper lookup service, and seeding boards from results.
//!
//! The HTTP transport lives with the caller; this module only fixes the shape
//! of the request and reply.

use crate::canvas::Canvas;
use crate::entities::BoardId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of papers that fit on a fresh board, one per cardinal child.
pub const MAX_SEEDED_PAPERS: usize = 4;

/// A lookup request: either a free-text topic or papers related to a known one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResearchRequest {
    #[serde(rename_all = "camelCase")]
    Related {
        paper_id: String,
        title: String,
        #[serde(rename = "abstract", default)]
        abstract_text: String,
        #[serde(default)]
        exclude_paper_ids: Vec<String>,
    },
    Topic {
        topic: String,
    },
}

impl ResearchRequest {
    pub fn topic(topic: impl Into<String>) -> Self {
        ResearchRequest::Topic {
            topic: topic.into(),
        }
    }
}

/// One paper as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub citations: u64,
    #[serde(default)]
    pub influential_citations: u64,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub paper_id: String,
}

fn untitled() -> String {
    "Untitled".to_string()
}

/// The service's reply, which may be an error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResearchReply {
    Failure {
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    Papers {
        #[serde(default)]
        topic: Option<String>,
        papers: Vec<Paper>,
        #[serde(default)]
        execution_time: Option<f64>,
    },
    List(Vec<Paper>),
}

#[derive(Debug, Error, PartialEq)]
pub enum ResearchError {
    #[error("Research service error: {0}")]
    Service(String),
    #[error("Malformed research reply: {0}")]
    Malformed(String),
}

impl ResearchReply {
    pub fn from_json(json: &str) -> Result<Self, ResearchError> {
        serde_json::from_str(json).map_err(|e| ResearchError::Malformed(e.to_string()))
    }

    /// The papers, or the service's error message.
    pub fn into_result(self) -> Result<Vec<Paper>, ResearchError> {
        match self {
            ResearchReply::Failure { error } => Err(ResearchError::Service(error)),
            ResearchReply::Papers { papers, .. } | ResearchReply::List(papers) => Ok(papers),
        }
    }
}

impl Canvas {
    /// Create a board for `topic` whose starter children carry the titles of
    /// the first four papers. Unused children stay blank.
    pub fn create_board_from_papers(&mut self, topic: &str, papers: &[Paper]) -> BoardId {
        let mut titles = [""; MAX_SEEDED_PAPERS];
        for (slot, paper) in titles.iter_mut().zip(papers) {
            *slot = paper.title.as_str();
        }
        if papers.len() > MAX_SEEDED_PAPERS {
            log::debug!(
                "Seeding board with {MAX_SEEDED_PAPERS} of {} papers",
                papers.len()
            );
        }
        self.create_board_with_children(topic, topic, titles)
    }
}
