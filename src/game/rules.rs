//! Rules Configuration
//!
//! Probabilities and budgets the engine reads instead of hard-coding.

use serde::{Serialize, Deserialize};

use crate::ACTIONS_PER_TURN;
use crate::core::rng::Chance;

/// When a discover attempt costs an action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverCost {
    /// Only a successful cure spends the action; a failed roll is free.
    #[default]
    OnSuccess,
    /// Every attempt spends the action.
    PerAttempt,
}

impl DiscoverCost {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on_success" | "success" => Some(DiscoverCost::OnSuccess),
            "per_attempt" | "attempt" | "always" => Some(DiscoverCost::PerAttempt),
            _ => None,
        }
    }
}

/// Tunable game rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Chance a non-outbreak city gains a cube each turn
    pub spread_chance: Chance,
    /// Chance a discover action finds a cure
    pub discover_chance: Chance,
    /// Budget every player gets back at the start of a turn
    pub actions_per_turn: u32,
    /// Budget policy for discover
    pub discover_cost: DiscoverCost,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            spread_chance: Chance::percent(30),
            discover_chance: Chance::percent(30),
            actions_per_turn: ACTIONS_PER_TURN,
            discover_cost: DiscoverCost::OnSuccess,
        }
    }
}

impl RulesConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            spread_chance: env_percent("PANDEMIC_SPREAD_PERCENT").unwrap_or(defaults.spread_chance),
            discover_chance: env_percent("PANDEMIC_DISCOVER_PERCENT")
                .unwrap_or(defaults.discover_chance),
            actions_per_turn: std::env::var("PANDEMIC_ACTIONS_PER_TURN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.actions_per_turn),
            discover_cost: std::env::var("PANDEMIC_DISCOVER_COST")
                .ok()
                .and_then(|v| DiscoverCost::parse(&v))
                .unwrap_or(defaults.discover_cost),
        }
    }
}

fn env_percent(key: &str) -> Option<Chance> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .map(Chance::percent)
}
