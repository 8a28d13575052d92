use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// The three task flavors the platform forwards to the agent side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Chat,
    ExamGeneration,
    Grading,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Chat => "chat",
            TaskKind::ExamGeneration => "exam-generation",
            TaskKind::Grading => "grading",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(TaskKind::Chat),
            "exam-generation" => Ok(TaskKind::ExamGeneration),
            "grading" => Ok(TaskKind::Grading),
            other => Err(ApiError::InvalidTaskKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
    Failed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Completed => "completed",
            RequestStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub(crate) fn from_db(s: &str) -> rusqlite::Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "completed" => Ok(RequestStatus::Completed),
            "failed" => Ok(RequestStatus::Failed),
            other => Err(rusqlite::Error::InvalidColumnType(
                0,
                format!("unexpected status value: {other}"),
                rusqlite::types::Type::Text,
            )),
        }
    }
}

/// What a completion callback reports for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackOutcome {
    Completed,
    Failed,
}

/// One in-flight asynchronous task, persisted from submission until the
/// matching webhook callback lands. Never deleted by core logic.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    pub request_id: String,
    pub kind: TaskKind,
    pub requester: String,
    pub payload: String,
    pub status: RequestStatus,
    /// Set iff status = completed.
    pub result: Option<String>,
    /// Set iff status = failed.
    pub error: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}
