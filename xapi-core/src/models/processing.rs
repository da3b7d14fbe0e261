//! Server-side media processing status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Processing state reported after finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Queued, not started.
    Pending,
    /// Being transcoded.
    InProgress,
    /// Ready to attach.
    Succeeded,
    /// Rejected by the server.
    Failed,
    /// A state this client does not know yet. Not terminal, so polling continues.
    #[serde(other)]
    Unknown,
}

impl ProcessingState {
    /// Returns true for `succeeded` and `failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// The `processing_info` member of a media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    /// Current state.
    pub state: ProcessingState,
    /// Seconds the server asks the client to wait before polling again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_after_secs: Option<u64>,
    /// Progress estimate, 0 to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
    /// Failure details when `state` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ProcessingStatus {
    /// Extracts the status from a media object.
    ///
    /// Returns `None` when the object has no `processing_info` member or it
    /// cannot be decoded; such media needs no further polling. A state string
    /// outside the known set decodes as [`ProcessingState::Unknown`].
    pub fn from_media(media: &Value) -> Option<Self> {
        let info = media.get("processing_info")?;
        serde_json::from_value(info.clone()).ok()
    }

    /// Returns true when polling should stop.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
