//! Queue and history entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::{EpisodeDetails, MediaKind};

/// Lifecycle status of a queued download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Downloading,
    Complete,
    Failed,
    Cancelled,
}

impl QueueStatus {
    /// Terminal statuses leave the queue (Failed stays visible for the
    /// operator).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueueStatus::Complete | QueueStatus::Failed | QueueStatus::Cancelled
        )
    }
}

/// One orchestrated download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// External catalog identifier; unique per title-version.
    pub pid: String,
    pub status: QueueStatus,
    /// Derived display/release name.
    pub nzb_name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Metadata snapshot taken when the download was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EpisodeDetails>,
    /// Identifier of the requesting integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_left_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    pub started_at: DateTime<Utc>,
}

impl QueueEntry {
    /// A freshly accepted entry.
    pub fn new(pid: impl Into<String>, nzb_name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            pid: pid.into(),
            status: QueueStatus::Queued,
            nzb_name: nzb_name.into(),
            kind,
            details: None,
            app_id: None,
            size_bytes: None,
            size_left_bytes: None,
            eta_secs: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: EpisodeDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }
}

/// A queue entry frozen at a terminal status and persisted, keyed by pid.
pub type HistoryEntry = QueueEntry;
