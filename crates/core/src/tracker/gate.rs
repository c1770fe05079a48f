use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::GateConfig;

/// Inline message shown when the confirmation keyword does not match.
pub const KEYWORD_HINT: &str = "Please either type complete and submit to confirm your understanding. Or watch the video again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    NotStarted,
    InProgress,
    PendingConfirmation,
    AwaitingUnderstandingAck,
    Completed,
}

impl CompletionState {
    fn rank(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::InProgress => 1,
            Self::PendingConfirmation => 2,
            Self::AwaitingUnderstandingAck => 3,
            Self::Completed => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        state: CompletionState,
        action: &'static str,
    },

    #[error("{}", KEYWORD_HINT)]
    KeywordMismatch,

    #[error("watched {watched:.0}% is below the {threshold:.0}% needed to complete")]
    BelowThreshold { watched: f64, threshold: f64 },

    #[error("a completion report is already in progress")]
    ReportInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CompletionState,
    pub to: CompletionState,
}

/// Confirmation state machine guarding the "understood" mark.
#[derive(Debug, Clone)]
pub struct CompletionGate {
    state: CompletionState,
    keyword: String,
    threshold: f64,
}

impl CompletionGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            state: CompletionState::NotStarted,
            keyword: config.confirmation_keyword.trim().to_lowercase(),
            threshold: config.completion_threshold,
        }
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == CompletionState::Completed
    }

    fn advance(&mut self, to: CompletionState) -> Option<Transition> {
        if to.rank() <= self.state.rank() {
            return None;
        }
        let from = std::mem::replace(&mut self.state, to);
        info!(?from, ?to, "completion gate transition");
        Some(Transition { from, to })
    }

    /// Fold the tracker's view of the session into the gate.
    pub fn on_progress(&mut self, started: bool, may_offer: bool) -> Option<Transition> {
        match self.state {
            CompletionState::NotStarted if started && may_offer => {
                self.advance(CompletionState::PendingConfirmation)
            }
            CompletionState::NotStarted if started => self.advance(CompletionState::InProgress),
            CompletionState::InProgress if may_offer => {
                self.advance(CompletionState::PendingConfirmation)
            }
            _ => None,
        }
    }

    /// End of media is a qualifying condition from any pre-confirmation state.
    pub fn on_playback_ended(&mut self) -> Option<Transition> {
        self.advance(CompletionState::PendingConfirmation)
    }

    pub fn submit_keyword(&mut self, input: &str) -> Result<Transition, GateError> {
        if self.state != CompletionState::PendingConfirmation {
            return Err(GateError::InvalidTransition {
                state: self.state,
                action: "submit the confirmation keyword",
            });
        }
        if input.trim().to_lowercase() != self.keyword {
            return Err(GateError::KeywordMismatch);
        }
        self.advance(CompletionState::AwaitingUnderstandingAck)
            .ok_or(GateError::InvalidTransition {
                state: self.state,
                action: "submit the confirmation keyword",
            })
    }

    /// Re-check before reporting a "yes". Does not change state.
    pub fn check_affirmation(&self, watched_percent: f64) -> Result<(), GateError> {
        if self.state != CompletionState::AwaitingUnderstandingAck {
            return Err(GateError::InvalidTransition {
                state: self.state,
                action: "confirm understanding",
            });
        }
        if watched_percent < self.threshold {
            return Err(GateError::BelowThreshold {
                watched: watched_percent,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    /// Completion confirmed by the backend.
    pub fn complete(&mut self) -> Result<Transition, GateError> {
        if self.state != CompletionState::AwaitingUnderstandingAck {
            return Err(GateError::InvalidTransition {
                state: self.state,
                action: "complete",
            });
        }
        self.advance(CompletionState::Completed)
            .ok_or(GateError::InvalidTransition {
                state: self.state,
                action: "complete",
            })
    }

    /// Already completed according to persisted state; no dialogs needed.
    pub fn restore_completed(&mut self) {
        self.state = CompletionState::Completed;
    }

    pub fn restart(&mut self) -> Transition {
        let from = std::mem::replace(&mut self.state, CompletionState::NotStarted);
        info!(?from, "completion gate restarted");
        Transition {
            from,
            to: CompletionState::NotStarted,
        }
    }
}
