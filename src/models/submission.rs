//! Submission payload model

use serde::{Deserialize, Serialize};

use super::task::SubmissionMode;

/// What the student handed in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SubmissionPayload {
    /// Uploaded file: raw bytes plus the filename the client claimed
    File { filename: String, content: Vec<u8> },
    /// Literal source text from the editor
    Editor { text: String },
}

impl SubmissionPayload {
    /// Submission mode this payload corresponds to
    pub fn mode(&self) -> SubmissionMode {
        match self {
            Self::File { .. } => SubmissionMode::File,
            Self::Editor { .. } => SubmissionMode::Editor,
        }
    }

    /// Size of the submitted source in bytes
    pub fn len(&self) -> usize {
        match self {
            Self::File { content, .. } => content.len(),
            Self::Editor { text } => text.len(),
        }
    }

    /// Nothing usable was submitted
    pub fn is_empty(&self) -> bool {
        match self {
            Self::File { filename, content } => filename.trim().is_empty() || content.is_empty(),
            Self::Editor { text } => text.trim().is_empty(),
        }
    }

    /// Bytes that end up in the canonical artifact
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::File { content, .. } => content,
            Self::Editor { text } => text.as_bytes(),
        }
    }
}
