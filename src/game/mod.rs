//! Game Logic Module
//!
//! All rules code. Deterministic given a seeded random source.
//!
//! ## Module Structure
//!
//! - `state`: Cities, players, diseases, snapshot
//! - `map`: The fixed board and starting setup
//! - `events`: Outbreak history and event log entries
//! - `rules`: Tunable probabilities and budgets
//! - `spread`: Per-turn spread and outbreak resolution
//! - `action`: Player action state machine
//! - `turn`: End-of-turn controller

pub mod state;
pub mod map;
pub mod events;
pub mod rules;
pub mod spread;
pub mod action;
pub mod turn;

// Re-export key types
pub use state::{City, Disease, DiseaseColor, GameState, Intensities, Player, Role};
pub use events::{GameEvent, GameEventData, OutbreakEvent};
pub use rules::{DiscoverCost, RulesConfig};
pub use action::{ActionEffect, ActionError, ActionMode, ActionOutcome, ActionRequest, perform_action};
pub use turn::{TurnOutcome, end_turn, run_turns};
