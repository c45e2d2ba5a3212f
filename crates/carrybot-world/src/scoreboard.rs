//! Round scoring: running score, best score, and the round timer.
//!
//! The [`Scoreboard`] is the default [`Scorekeeper`]. Deliveries add one
//! point while the round is active; once the timer runs out further
//! deliveries are ignored until [`Scoreboard::start_round`] is called.

use carrybot_types::AgentId;
use carrybot_types::geometry::EPSILON;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::contract::Scorekeeper;

/// Default round length in seconds.
pub const DEFAULT_ROUND_SECS: f64 = 60.0;

/// Score and round state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u32,
    high_score: u32,
    round_secs: f64,
    remaining_secs: f64,
    active: bool,
    ready_notifications: u32,
    last_ready: Option<AgentId>,
}

impl Scoreboard {
    /// Create a scoreboard with an active round of `round_secs`.
    pub const fn new(round_secs: f64) -> Self {
        Self {
            score: 0,
            high_score: 0,
            round_secs,
            remaining_secs: round_secs,
            active: true,
            ready_notifications: 0,
            last_ready: None,
        }
    }

    /// Reset the score and timer and start a new round.
    ///
    /// The high score is kept.
    pub fn start_round(&mut self) {
        self.score = 0;
        self.remaining_secs = self.round_secs;
        self.active = true;
        info!(round_secs = self.round_secs, "round started");
    }

    /// Count down the round timer.
    ///
    /// Returns `true` on the tick the round ends.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_secs = (self.remaining_secs - dt).max(0.0);
        if self.remaining_secs > EPSILON {
            return false;
        }
        self.remaining_secs = 0.0;
        self.active = false;
        if self.score > self.high_score {
            self.high_score = self.score;
        }
        info!(
            score = self.score,
            high_score = self.high_score,
            "round over"
        );
        true
    }

    /// Add one point. Ignored once the round is over.
    pub fn add_score(&mut self) {
        if !self.active {
            warn!("delivery after round end ignored");
            return;
        }
        self.score = self.score.saturating_add(1);
        if self.score > self.high_score {
            self.high_score = self.score;
        }
        info!(score = self.score, "delivery scored");
    }

    /// Forget the best score.
    pub fn reset_high_score(&mut self) {
        self.high_score = 0;
        info!("high score reset");
    }

    /// Points this round.
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Best score seen since start-up.
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Seconds left in the round.
    pub const fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    /// Whether the round is still running.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// How many times an agent reported ready after charging.
    pub const fn ready_notifications(&self) -> u32 {
        self.ready_notifications
    }

    /// The agent that most recently reported ready.
    pub const fn last_ready(&self) -> Option<AgentId> {
        self.last_ready
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_SECS)
    }
}

impl Scorekeeper for Scoreboard {
    fn notify_delivered(&mut self) {
        self.add_score();
    }

    fn notify_agent_ready(&mut self, agent: AgentId) {
        self.ready_notifications = self.ready_notifications.saturating_add(1);
        self.last_ready = Some(agent);
        info!(agent_id = %agent, "agent ready after charging");
    }
}
