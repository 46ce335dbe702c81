//! Turn Controller
//!
//! End-of-turn transition: spread, eradication check, budget reset, turn
//! advance. One call is one transition; calling it again advances again.

use tracing::info;

use crate::core::rng::RandomSource;
use crate::game::events::{GameEvent, OutbreakEvent};
use crate::game::rules::RulesConfig;
use crate::game::spread::spread;
use crate::game::state::{DiseaseColor, GameState};

/// Result of ending a turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Replacement snapshot
    pub state: GameState,
    /// Outbreaks triggered by this turn's spread
    pub outbreaks: Vec<OutbreakEvent>,
    /// Colors eradicated this turn
    pub eradicated: Vec<DiseaseColor>,
    /// Everything above plus the turn advance, in order
    pub events: Vec<GameEvent>,
}

/// End the current turn.
///
/// Takes the snapshot by value: the previous snapshot is consumed and the
/// returned one replaces it.
pub fn end_turn<R: RandomSource>(
    mut state: GameState,
    rules: &RulesConfig,
    rng: &mut R,
) -> TurnOutcome {
    let mut events = Vec::new();

    // 1. Spread and resolve outbreaks
    let outbreaks = spread(&mut state, rules, rng);
    events.extend(outbreaks.iter().cloned().map(GameEvent::outbreak));

    // 2. Cured colors with nothing left on the board are eradicated
    let eradicated = check_eradication(&mut state);
    events.extend(eradicated.iter().map(|c| GameEvent::disease_eradicated(state.turn, *c)));

    // 3. Refill every player's budget
    for player in &mut state.players {
        player.actions = rules.actions_per_turn;
    }

    // 4. Advance the turn counter
    let from = state.turn;
    state.turn = state.turn.saturating_add(1);
    events.push(GameEvent::turn_advanced(from, state.turn));

    info!(
        turn = state.turn,
        outbreaks = outbreaks.len(),
        outbreak_count = state.outbreak_count,
        "turn ended"
    );

    TurnOutcome { state, outbreaks, eradicated, events }
}

fn check_eradication(state: &mut GameState) -> Vec<DiseaseColor> {
    let mut eradicated = Vec::new();
    for color in DiseaseColor::ALL {
        let disease = state.disease(color);
        if !disease.is_cured() || disease.is_eradicated() {
            continue;
        }
        if state.total_level(color) == 0 && state.disease_mut(color).eradicate() {
            eradicated.push(color);
        }
    }
    eradicated
}

/// Run `turns` consecutive end-of-turn transitions.
///
/// Returns the final snapshot and every event in order.
pub fn run_turns<R: RandomSource>(
    initial_state: GameState,
    turns: u32,
    rules: &RulesConfig,
    rng: &mut R,
) -> (GameState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for _ in 0..turns {
        let outcome = end_turn(state, rules, rng);
        all_events.extend(outcome.events);
        state = outcome.state;
    }

    (state, all_events)
}
