use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Stopped,
    Errored,
}

impl SessionStatus {
    /// Label shown next to the status badge.
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Idle => "대기 중",
            SessionStatus::Running => "동기화 중",
            SessionStatus::Stopped | SessionStatus::Errored => "중지됨",
        }
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(self, SessionStatus::Stopped | SessionStatus::Errored)
    }
}

/// Display category of a log line. Also used as the source tag of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Normal,
    System,
    Error,
    Highlight,
    Success,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Normal => "normal",
            LogKind::System => "system",
            LogKind::Error => "error",
            LogKind::Highlight => "highlight",
            LogKind::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActionControl {
    Run { enabled: bool },
    Stop,
}

impl Default for ActionControl {
    fn default() -> Self {
        ActionControl::Run { enabled: true }
    }
}
