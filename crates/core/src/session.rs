//! One viewing session of one video: position tracking plus the completion gate.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::GateConfig,
    player::{PlayerCommand, PlayerEvent, PlayerSource},
    tracker::{CompletionGate, CompletionState, GateError, PositionTracker, SampleOutcome},
    types::VideoId,
};

/// User-visible notifications produced by the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Transient "forward blocked" overlay.
    ForwardBlocked,
    /// Playback qualifies; ask for the confirmation keyword.
    ConfirmationRequired,
    /// Keyword accepted; ask "Do you understand the video?".
    UnderstandingPrompt,
    KeywordRejected { message: String },
    NotEnoughWatched { watched: f64, threshold: f64 },
    ReportFailed { message: String, retryable: bool },
    MustReauthenticate { message: String },
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Player(PlayerCommand),
    Notice(Notice),
    /// Report the completion to the backend; the result comes back through
    /// [`WatchSession::settle_report`] tagged with `version`.
    ReportCompletion { video: VideoId, version: u64 },
}

/// Result of a completion report, as fed back into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Confirmed,
    Failed { message: String, retryable: bool },
    Unauthenticated { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub video: VideoId,
    pub state: CompletionState,
    pub watched_percent: f64,
    pub max_reached_position: f64,
    pub last_observed_position: f64,
    pub total_duration: f64,
    pub playback_ended: bool,
    pub may_offer_completion: bool,
    pub reporting: bool,
    pub version: u64,
}

#[derive(Debug, Clone)]
pub struct WatchSession {
    video: VideoId,
    source: PlayerSource,
    tracker: PositionTracker,
    gate: CompletionGate,
    version: u64,
    playing: bool,
    report_in_flight: bool,
}

impl WatchSession {
    pub fn new(video: VideoId, source: PlayerSource, config: &GateConfig) -> Self {
        Self {
            video,
            source,
            tracker: PositionTracker::new(config),
            gate: CompletionGate::new(config),
            version: 0,
            playing: false,
            report_in_flight: false,
        }
    }

    /// Start a session for a video the backend already lists as completed.
    pub fn completed(video: VideoId, source: PlayerSource, config: &GateConfig) -> Self {
        let mut session = Self::new(video, source, config);
        session.gate.restore_completed();
        session
    }

    pub fn video(&self) -> VideoId {
        self.video
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> CompletionState {
        self.gate.state()
    }

    pub fn source(&self) -> &PlayerSource {
        &self.source
    }

    pub fn watched_percent(&self) -> f64 {
        if self.gate.is_completed() {
            100.0
        } else {
            self.tracker.watched_percent()
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            video: self.video,
            state: self.gate.state(),
            watched_percent: self.watched_percent(),
            max_reached_position: self.tracker.max_reached(),
            last_observed_position: self.tracker.last_observed(),
            total_duration: self.tracker.duration(),
            playback_ended: self.tracker.playback_ended(),
            may_offer_completion: self.tracker.may_offer_completion(),
            reporting: self.report_in_flight,
            version: self.version,
        }
    }

    /// Commands to put the player into its initial state.
    pub fn start(&self) -> Vec<Effect> {
        vec![Effect::Player(PlayerCommand::Load {
            source: self.source.clone(),
        })]
    }

    pub fn handle_player(&mut self, event: PlayerEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            PlayerEvent::Loaded { duration } => {
                self.tracker.set_duration(duration);
                debug!(video = %self.video, duration, "player loaded");
            }
            PlayerEvent::Play => self.playing = true,
            PlayerEvent::Pause => self.playing = false,
            PlayerEvent::TimeUpdate { seconds } => match self.tracker.observe(seconds) {
                SampleOutcome::SkipBlocked { snap_to } => {
                    effects.push(Effect::Player(PlayerCommand::SeekTo { seconds: snap_to }));
                    if self.playing {
                        effects.push(Effect::Player(PlayerCommand::Play));
                    }
                    effects.push(Effect::Notice(Notice::ForwardBlocked));
                }
                SampleOutcome::Ignored => {}
                SampleOutcome::Advanced | SampleOutcome::Within => {
                    let started = self.tracker.max_reached() > 0.0;
                    self.fold_progress(started, &mut effects);
                }
            },
            PlayerEvent::Progress { percent } => {
                self.tracker.observe_reported_percent(percent);
                let started = self.tracker.watched_percent() > 0.0;
                self.fold_progress(started, &mut effects);
            }
            PlayerEvent::VideoEnded => {
                self.playing = false;
                self.tracker.mark_ended();
                if self.gate.on_playback_ended().is_some() {
                    effects.push(Effect::Notice(Notice::ConfirmationRequired));
                }
            }
        }
        effects
    }

    fn fold_progress(&mut self, started: bool, effects: &mut Vec<Effect>) {
        let may_offer = self.tracker.may_offer_completion();
        if let Some(t) = self.gate.on_progress(started, may_offer)
            && t.to == CompletionState::PendingConfirmation
        {
            effects.push(Effect::Notice(Notice::ConfirmationRequired));
        }
    }

    pub fn submit_keyword(&mut self, input: &str) -> Result<Vec<Effect>, GateError> {
        self.gate.submit_keyword(input)?;
        Ok(vec![Effect::Notice(Notice::UnderstandingPrompt)])
    }

    /// Answer to "Do you understand the video?".
    pub fn answer_understanding(&mut self, understood: bool) -> Result<Vec<Effect>, GateError> {
        if !understood {
            if self.gate.state() != CompletionState::AwaitingUnderstandingAck {
                return Err(GateError::InvalidTransition {
                    state: self.gate.state(),
                    action: "decline understanding",
                });
            }
            info!(video = %self.video, "understanding declined, replaying");
            return Ok(self.restart());
        }

        self.gate.check_affirmation(self.tracker.watched_percent())?;
        if self.report_in_flight {
            return Err(GateError::ReportInFlight);
        }
        self.report_in_flight = true;
        Ok(vec![Effect::ReportCompletion {
            video: self.video,
            version: self.version,
        }])
    }

    /// Apply the result of a completion report issued at `version`.
    pub fn settle_report(&mut self, version: u64, outcome: ReportOutcome) -> Vec<Effect> {
        if version != self.version {
            debug!(
                video = %self.video,
                version,
                current = self.version,
                "discarding stale completion report"
            );
            return Vec::new();
        }
        self.report_in_flight = false;

        match outcome {
            ReportOutcome::Confirmed => match self.gate.complete() {
                Ok(_) => {
                    info!(video = %self.video, "video marked as understood");
                    vec![Effect::Notice(Notice::Completed)]
                }
                Err(e) => {
                    warn!(video = %self.video, error = %e, "completion report arrived out of order");
                    Vec::new()
                }
            },
            ReportOutcome::Failed { message, retryable } => {
                warn!(video = %self.video, %message, "completion report failed");
                vec![Effect::Notice(Notice::ReportFailed { message, retryable })]
            }
            ReportOutcome::Unauthenticated { message } => {
                vec![Effect::Notice(Notice::MustReauthenticate { message })]
            }
        }
    }

    /// "Watch again": back to the start with a fresh version.
    pub fn restart(&mut self) -> Vec<Effect> {
        self.gate.restart();
        self.tracker.reset();
        self.version += 1;
        self.playing = false;
        self.report_in_flight = false;
        info!(video = %self.video, version = self.version, "session restarted");
        vec![Effect::Player(PlayerCommand::Load {
            source: self.source.clone(),
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WatchSession {
        WatchSession::new(
            VideoId(9),
            PlayerSource::from_url("https://vimeo.com/1"),
            &GateConfig::default(),
        )
    }

    fn play_to_end(s: &mut WatchSession) {
        s.handle_player(PlayerEvent::Loaded { duration: 2.0 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 0.5 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 1.0 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 1.5 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 2.0 });
    }

    #[test]
    fn skip_while_playing_snaps_back_and_resumes() {
        let mut s = session();
        s.handle_player(PlayerEvent::Loaded { duration: 100.0 });
        s.handle_player(PlayerEvent::Play);
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 0.5 });

        let effects = s.handle_player(PlayerEvent::TimeUpdate { seconds: 50.0 });

        assert_eq!(
            effects,
            vec![
                Effect::Player(PlayerCommand::SeekTo { seconds: 0.5 }),
                Effect::Player(PlayerCommand::Play),
                Effect::Notice(Notice::ForwardBlocked),
            ]
        );
    }

    #[test]
    fn skip_while_paused_does_not_resume() {
        let mut s = session();
        s.handle_player(PlayerEvent::Loaded { duration: 100.0 });
        let effects = s.handle_player(PlayerEvent::TimeUpdate { seconds: 10.0 });
        assert!(!effects.contains(&Effect::Player(PlayerCommand::Play)));
        assert!(effects.contains(&Effect::Player(PlayerCommand::SeekTo { seconds: 0.0 })));
    }

    #[test]
    fn reaching_threshold_asks_for_confirmation_once() {
        let mut s = session();
        s.handle_player(PlayerEvent::Loaded { duration: 2.0 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 0.5 });
        assert_eq!(s.state(), CompletionState::InProgress);
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 1.0 });
        s.handle_player(PlayerEvent::TimeUpdate { seconds: 1.5 });
        let effects = s.handle_player(PlayerEvent::TimeUpdate { seconds: 1.95 });
        assert_eq!(effects, vec![Effect::Notice(Notice::ConfirmationRequired)]);
        assert_eq!(s.state(), CompletionState::PendingConfirmation);
        assert!(s.handle_player(PlayerEvent::VideoEnded).is_empty());
    }

    #[test]
    fn percent_capped_until_completed() {
        let mut s = session();
        play_to_end(&mut s);
        s.handle_player(PlayerEvent::VideoEnded);
        assert_eq!(s.watched_percent(), 99.0);

        s.submit_keyword("complete").unwrap();
        let effects = s.answer_understanding(true).unwrap();
        assert_eq!(
            effects,
            vec![Effect::ReportCompletion {
                video: VideoId(9),
                version: 0
            }]
        );
        assert_eq!(s.watched_percent(), 99.0);

        s.settle_report(0, ReportOutcome::Confirmed);
        assert_eq!(s.state(), CompletionState::Completed);
        assert_eq!(s.watched_percent(), 100.0);
    }

    #[test]
    fn second_yes_while_reporting_is_refused() {
        let mut s = session();
        play_to_end(&mut s);
        s.submit_keyword("complete").unwrap();
        s.answer_understanding(true).unwrap();
        assert_eq!(s.answer_understanding(true), Err(GateError::ReportInFlight));
    }

    #[test]
    fn failed_report_allows_retry() {
        let mut s = session();
        play_to_end(&mut s);
        s.submit_keyword("complete").unwrap();
        s.answer_understanding(true).unwrap();

        let effects = s.settle_report(
            0,
            ReportOutcome::Failed {
                message: "timeout".into(),
                retryable: true,
            },
        );
        assert_eq!(
            effects,
            vec![Effect::Notice(Notice::ReportFailed {
                message: "timeout".into(),
                retryable: true
            })]
        );
        assert_eq!(s.state(), CompletionState::AwaitingUnderstandingAck);
        assert!(s.answer_understanding(true).is_ok());
    }

    #[test]
    fn stale_report_after_restart_is_ignored() {
        let mut s = session();
        play_to_end(&mut s);
        s.submit_keyword("complete").unwrap();
        s.answer_understanding(true).unwrap();
        s.restart();

        assert!(s.settle_report(0, ReportOutcome::Confirmed).is_empty());
        assert_eq!(s.state(), CompletionState::NotStarted);
        assert_eq!(s.version(), 1);
    }

    #[test]
    fn auth_failure_surfaces_reauthentication() {
        let mut s = session();
        play_to_end(&mut s);
        s.submit_keyword("complete").unwrap();
        s.answer_understanding(true).unwrap();
        let effects = s.settle_report(
            0,
            ReportOutcome::Unauthenticated {
                message: "expired".into(),
            },
        );
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notice(Notice::MustReauthenticate { .. })]
        ));
        assert_eq!(s.state(), CompletionState::AwaitingUnderstandingAck);
    }

    #[test]
    fn restored_completion_shows_full_progress() {
        let s = WatchSession::completed(
            VideoId(1),
            PlayerSource::from_url("https://vimeo.com/1"),
            &GateConfig::default(),
        );
        assert_eq!(s.state(), CompletionState::Completed);
        assert_eq!(s.snapshot().watched_percent, 100.0);
    }
}
