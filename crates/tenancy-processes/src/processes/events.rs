use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ProcessId, ProcessName, ProcessState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessEventType {
    ProcessStarted,
    ProcessUpdated,
    ProcessClosed,
}

impl ProcessEventType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProcessStarted => "ProcessStartedEvent",
            Self::ProcessUpdated => "ProcessUpdatedEvent",
            Self::ProcessClosed => "ProcessClosedEvent",
        }
    }
}

/// Authenticated user on whose behalf a trigger was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub email: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn system() -> Self {
        Self::new("system", "")
    }
}

/// Before and after snapshots of one committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEvent {
    pub event_type: ProcessEventType,
    pub process_id: ProcessId,
    pub process_name: ProcessName,
    pub version_number: Option<u32>,
    pub old_state: Option<ProcessState>,
    pub new_state: ProcessState,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Outbound boundary for domain events, invoked after a successful save.
pub trait ProcessEventPublisher: Send + Sync {
    fn publish(&self, event: ProcessEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
