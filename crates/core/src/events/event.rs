use tokio::time::Instant;
use uuid::Uuid;

use crate::{player::PlayerEvent, session::ReportOutcome};

/// Actions taken by the user in the confirmation dialogs.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SubmitKeyword(String),
    AnswerUnderstanding(bool),
    WatchAgain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Player(PlayerEvent),
    User(UserAction),
    /// Continuation of a completion report issued at `version`.
    ReportSettled { version: u64, outcome: ReportOutcome },
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Player(_) => "player",
            SessionEvent::User(_) => "user",
            SessionEvent::ReportSettled { .. } => "report.settled",
        }
    }
}

pub struct EnrichedEvent {
    pub event: SessionEvent,
    pub ingest_seq: u64,
    pub session_id: Uuid,
    pub ingested_at: Instant,
}

impl std::fmt::Debug for EnrichedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichedEvent")
            .field("event_type", &self.event.event_type())
            .field("ingest_seq", &self.ingest_seq)
            .field("session_id", &self.session_id)
            .finish()
    }
}
