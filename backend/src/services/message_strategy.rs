//! Message-bot selection policies.
//!
//! A policy picks one sender out of the eligible candidates for a group. The
//! candidate list is always ordered by session id, so round-robin walks the
//! same order on every call.

use std::fmt;
use std::str::FromStr;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::session::BotCandidate;

pub trait BotSelector: Send {
    /// Returns `None` only when `candidates` is empty.
    fn select<'a>(&mut self, candidates: &'a [BotCandidate]) -> Option<&'a BotCandidate>;
}

/// Cycles through candidates with a monotonically increasing cursor.
///
/// The cursor is taken modulo the current list length, so a list that grows or
/// shrinks between calls simply re-wraps.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: u64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BotSelector for RoundRobin {
    fn select<'a>(&mut self, candidates: &'a [BotCandidate]) -> Option<&'a BotCandidate> {
        if candidates.is_empty() {
            return None;
        }
        let index = (self.cursor % candidates.len() as u64) as usize;
        self.cursor = self.cursor.wrapping_add(1);
        candidates.get(index)
    }
}

/// Picks a uniformly random candidate.
#[derive(Debug)]
pub struct RandomPick {
    rng: StdRng,
}

impl RandomPick {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPick {
    fn default() -> Self {
        Self::new()
    }
}

impl BotSelector for RandomPick {
    fn select<'a>(&mut self, candidates: &'a [BotCandidate]) -> Option<&'a BotCandidate> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        candidates.get(index)
    }
}

/// Name of a selection policy as accepted by the API and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoundRobin,
    #[default]
    Random,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::Random => "random",
        }
    }

    /// Builds a fresh policy; a new round-robin starts at cursor 0.
    pub fn build(self) -> SelectionPolicy {
        match self {
            StrategyKind::RoundRobin => SelectionPolicy::RoundRobin(RoundRobin::new()),
            StrategyKind::Random => SelectionPolicy::Random(RandomPick::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message strategy `{0}`, expected round_robin or random")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "round_robin" => Ok(StrategyKind::RoundRobin),
            "random" => Ok(StrategyKind::Random),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// The active policy.
#[derive(Debug)]
pub enum SelectionPolicy {
    RoundRobin(RoundRobin),
    Random(RandomPick),
}

impl SelectionPolicy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            SelectionPolicy::RoundRobin(_) => StrategyKind::RoundRobin,
            SelectionPolicy::Random(_) => StrategyKind::Random,
        }
    }
}

impl BotSelector for SelectionPolicy {
    fn select<'a>(&mut self, candidates: &'a [BotCandidate]) -> Option<&'a BotCandidate> {
        match self {
            SelectionPolicy::RoundRobin(inner) => inner.select(candidates),
            SelectionPolicy::Random(inner) => inner.select(candidates),
        }
    }
}
