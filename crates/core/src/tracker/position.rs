use tracing::debug;

use crate::config::GateConfig;

/// What a single position sample did to the watched frontier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Frontier moved forward to the sample.
    Advanced,
    /// At or behind the frontier (normal replay or rewind).
    Within,
    /// Too far past the frontier; the player must return to `snap_to`.
    SkipBlocked { snap_to: f64 },
    /// Not a usable position (negative, NaN, infinite).
    Ignored,
}

/// Monotonic watched frontier over an untrusted stream of player positions.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    tolerance: f64,
    ceiling: f64,
    threshold: f64,

    duration: f64,
    max_reached: f64,
    last_observed: f64,
    reported_percent: f64,
    ended: bool,
}

impl PositionTracker {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            tolerance: config.seek_tolerance_secs,
            ceiling: config.progress_ceiling,
            threshold: config.completion_threshold,
            duration: 0.0,
            max_reached: 0.0,
            last_observed: 0.0,
            reported_percent: 0.0,
            ended: false,
        }
    }

    pub fn set_duration(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            debug!(seconds, "ignoring unusable duration");
            return;
        }
        self.duration = seconds;
    }

    pub fn observe(&mut self, t: f64) -> SampleOutcome {
        if !t.is_finite() || t < 0.0 {
            return SampleOutcome::Ignored;
        }
        self.last_observed = t;

        if t > self.max_reached + self.tolerance {
            debug!(
                position = t,
                frontier = self.max_reached,
                "forward seek past frontier blocked"
            );
            return SampleOutcome::SkipBlocked {
                snap_to: self.max_reached,
            };
        }

        if t > self.max_reached {
            self.max_reached = t;
            SampleOutcome::Advanced
        } else {
            SampleOutcome::Within
        }
    }

    /// Accept a percentage the player derived itself. Only used until a duration is known.
    pub fn observe_reported_percent(&mut self, percent: f64) {
        if self.duration > 0.0 || !percent.is_finite() {
            return;
        }
        self.reported_percent = self.reported_percent.max(percent.clamp(0.0, self.ceiling));
    }

    pub fn mark_ended(&mut self) {
        self.ended = true;
    }

    pub fn watched_percent(&self) -> f64 {
        if self.ended {
            return self.ceiling;
        }
        if self.duration > 0.0 {
            (self.max_reached / self.duration * 100.0).min(self.ceiling)
        } else {
            self.reported_percent
        }
    }

    pub fn may_offer_completion(&self) -> bool {
        self.ended || (self.has_progress_basis() && self.watched_percent() >= self.threshold)
    }

    fn has_progress_basis(&self) -> bool {
        self.duration > 0.0 || self.reported_percent > 0.0
    }

    pub fn reset(&mut self) {
        self.max_reached = 0.0;
        self.last_observed = 0.0;
        self.reported_percent = 0.0;
        self.ended = false;
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn max_reached(&self) -> f64 {
        self.max_reached
    }

    pub fn last_observed(&self) -> f64 {
        self.last_observed
    }

    pub fn playback_ended(&self) -> bool {
        self.ended
    }
}
