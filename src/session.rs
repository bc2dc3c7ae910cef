//! Round lifecycle of a drill.
//!
//! A round goes `Idle -> AwaitingGuess -> Scored`. Every new round advances a generation counter;
//! a sampling result that arrives with the ticket of an older round is discarded.

use serde::{Deserialize, Serialize};

use crate::geo::{Coord, meters_to_feet};
use crate::sampler::{DrillTarget, SampleError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoundError {
    #[error("round {ticket} was superseded by round {current}")]
    Stale { ticket: u64, current: u64 },

    #[error(transparent)]
    Sampling(#[from] SampleError),

    #[error("unknown station '{0}'")]
    UnknownStation(String),
}

/// Distance thresholds of the feedback tiers, in feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub close_ft: f64,
    pub medium_ft: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            close_ft: 300.0,
            medium_ft: 1000.0,
        }
    }
}

impl ScoringConfig {
    pub fn tier(&self, distance_ft: f64) -> FeedbackTier {
        if distance_ft < self.close_ft {
            FeedbackTier::Close
        } else if distance_ft < self.medium_ft {
            FeedbackTier::Medium
        } else {
            FeedbackTier::Far
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackTier {
    Close,
    Medium,
    Far,
}

/// Outcome of the one guess allowed per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub guess: Coord,
    pub target: Coord,
    pub distance_m: f64,
    pub distance_ft: f64,
    pub tier: FeedbackTier,
}

impl GuessResult {
    pub fn new(guess: Coord, target: Coord, scoring: &ScoringConfig) -> Self {
        let distance_m = guess.distance_to(&target);
        let distance_ft = meters_to_feet(distance_m);

        Self {
            guess,
            target,
            distance_m,
            distance_ft,
            tier: scoring.tier(distance_ft),
        }
    }

    /// Status line shown to the player.
    pub fn message(&self) -> String {
        match self.tier {
            FeedbackTier::Close => format!("Awesome! Only {:.0} ft away.", self.distance_ft),
            FeedbackTier::Medium => format!("Not bad, {:.0} ft away.", self.distance_ft),
            FeedbackTier::Far => format!("{:.0} ft away. Keep practicing.", self.distance_ft),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    AwaitingGuess,
    Scored,
}

/// Proof that a round was started. Consumed by [DrillSession::complete_round].
#[derive(Debug, PartialEq, Eq)]
pub struct RoundTicket {
    generation: u64,
}

impl RoundTicket {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct DrillSession {
    generation: u64,
    target: Option<DrillTarget>,
    result: Option<GuessResult>,
    accepting: bool,
    scoring: ScoringConfig,
}

impl DrillSession {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self {
            scoring,
            ..Default::default()
        }
    }

    pub fn state(&self) -> RoundState {
        match (&self.target, &self.result) {
            (Some(_), Some(_)) => RoundState::Scored,
            (Some(_), None) if self.accepting => RoundState::AwaitingGuess,
            _ => RoundState::Idle,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn target(&self) -> Option<&DrillTarget> {
        self.target.as_ref()
    }

    #[inline]
    pub fn result(&self) -> Option<&GuessResult> {
        self.result.as_ref()
    }

    #[inline]
    pub fn is_accepting_guesses(&self) -> bool {
        self.accepting
    }

    #[inline]
    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Clears the current round and hands out a ticket for the next one.
    pub fn begin_round(&mut self) -> RoundTicket {
        self.reset();
        log::info!("Starting round {}", self.generation);

        RoundTicket {
            generation: self.generation,
        }
    }

    /// Installs the sampled target of the round `ticket` was issued for.
    ///
    /// Results for a superseded round are dropped without touching the session. A sampling failure
    /// leaves the session idle and is handed back to the caller.
    pub fn complete_round(
        &mut self,
        ticket: RoundTicket,
        sample: Result<DrillTarget, SampleError>,
    ) -> Result<&DrillTarget, RoundError> {
        if ticket.generation != self.generation {
            log::debug!("Ignoring result of round {}, current round is {}", ticket.generation, self.generation);
            return Err(RoundError::Stale {
                ticket: ticket.generation,
                current: self.generation,
            });
        }

        let target = sample?;
        log::info!("Round {} target: {}", self.generation, target.label);
        self.result = None;
        self.accepting = true;

        Ok(&*self.target.insert(target))
    }

    /// Scores `coord` against the target. Returns `None` unless a guess is being awaited.
    pub fn guess(&mut self, coord: Coord) -> Option<&GuessResult> {
        if !self.accepting {
            return None;
        }

        let target = self.target.as_ref()?;
        let result = GuessResult::new(coord, target.coord, &self.scoring);
        log::info!("Round {} guess at {} scored {:?}", self.generation, coord, result.tier);
        self.accepting = false;

        Some(&*self.result.insert(result))
    }

    /// Drops the current round. Any result still on its way for it becomes stale.
    pub fn abandon(&mut self) {
        self.reset();
        log::debug!("Abandoned round, now at generation {}", self.generation);
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.target = None;
        self.result = None;
        self.accepting = false;
    }
}
