//! Player Actions
//!
//! The active player picks one of five modes and performs it against the
//! selected city. Each call attempts exactly one action and either returns
//! a replacement snapshot or rejects the request without touching state.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::RandomSource;
use crate::game::events::GameEvent;
use crate::game::rules::{DiscoverCost, RulesConfig};
use crate::game::state::{DiseaseColor, GameState};

/// Action mode selected by the active player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    /// Walk to the selected city
    #[default]
    Move,
    /// Remove one cube from the selected city
    Treat,
    /// Reserved: research station
    Build,
    /// Reserved: share knowledge
    Share,
    /// Try to find a cure
    Discover,
}

impl ActionMode {
    /// All modes, in menu order.
    pub const ALL: [ActionMode; 5] = [
        ActionMode::Move,
        ActionMode::Treat,
        ActionMode::Build,
        ActionMode::Share,
        ActionMode::Discover,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ActionMode::Move => "move",
            ActionMode::Treat => "treat",
            ActionMode::Build => "build",
            ActionMode::Share => "share",
            ActionMode::Discover => "discover",
        }
    }
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One "perform action" request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionRequest<'a> {
    /// Turn-order index of the acting player
    pub player_index: usize,
    /// Selected city, if any
    pub city: Option<&'a str>,
    /// Selected mode
    pub mode: ActionMode,
}

/// Why an action was refused. State is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// No city is selected.
    #[error("select a city first")]
    NoCitySelected,
    /// Selected city is not on the board.
    #[error("unknown city: {0}")]
    UnknownCity(String),
    /// Active player index is out of range.
    #[error("no player at index {0}")]
    UnknownPlayer(usize),
    /// Active player has spent every action this turn.
    #[error("player {0} has no actions left")]
    NoActionsLeft(u32),
}

/// What an accepted request did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionEffect {
    /// One cube of `color` removed; `remaining` left in the city.
    Treated {
        /// Color treated
        color: DiseaseColor,
        /// Cubes left of that color
        remaining: u8,
    },
    /// Treat on a clean city. No-op.
    NoDisease,
    /// Cure found for `color`.
    Cured {
        /// Color cured
        color: DiseaseColor,
    },
    /// Cure roll failed.
    CureFailed,
    /// Every disease is already cured. No-op.
    AllCured,
    /// Player walked from one city to another.
    Moved {
        /// City left
        from: String,
        /// City entered
        to: String,
    },
    /// Player already stands in the selected city. No-op.
    AlreadyThere,
    /// Build and share do nothing yet. No-op.
    Reserved(ActionMode),
}

/// Result of an accepted request.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// Replacement snapshot (equal to the input for no-ops)
    pub state: GameState,
    /// What happened
    pub effect: ActionEffect,
    /// Did the action spend a budget point?
    pub spent: bool,
    /// Event for the log, if the action changed the board
    pub event: Option<GameEvent>,
}

impl ActionOutcome {
    fn no_op(state: GameState, effect: ActionEffect) -> Self {
        Self { state, effect, spent: false, event: None }
    }

    /// True when the snapshot differs from the one passed in.
    pub fn mutated(&self) -> bool {
        self.spent
    }
}

/// Attempt one action.
///
/// Preconditions are checked in order: city selected, city on the board,
/// player exists, player has budget.
pub fn perform_action<R: RandomSource>(
    state: &GameState,
    request: &ActionRequest<'_>,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<ActionOutcome, ActionError> {
    let city_name = request.city.ok_or(ActionError::NoCitySelected)?;
    if state.city(city_name).is_none() {
        return Err(ActionError::UnknownCity(city_name.to_string()));
    }
    let player = state
        .player(request.player_index)
        .ok_or(ActionError::UnknownPlayer(request.player_index))?;
    if !player.has_actions() {
        return Err(ActionError::NoActionsLeft(player.id));
    }

    let next = state.clone();
    let outcome = match request.mode {
        ActionMode::Treat => treat(next, request.player_index, city_name),
        ActionMode::Discover => discover(next, request.player_index, rules, rng),
        ActionMode::Move => move_to(next, request.player_index, city_name),
        mode @ (ActionMode::Build | ActionMode::Share) => {
            ActionOutcome::no_op(next, ActionEffect::Reserved(mode))
        }
    };

    Ok(outcome)
}

fn treat(mut state: GameState, player_index: usize, city_name: &str) -> ActionOutcome {
    let turn = state.turn;
    let target = state
        .city(city_name)
        .and_then(|city| DiseaseColor::ALL.into_iter().find(|c| city.level(*c) > 0));
    let Some(color) = target else {
        return ActionOutcome::no_op(state, ActionEffect::NoDisease);
    };

    let mut remaining = 0;
    if let Some(city) = state.city_mut(city_name) {
        remaining = city.level(color).saturating_sub(1);
        city.set_level(color, remaining);
    }

    let player_id = spend(&mut state, player_index);
    ActionOutcome {
        state,
        effect: ActionEffect::Treated { color, remaining },
        spent: true,
        event: Some(GameEvent::treated(turn, player_id, city_name, color)),
    }
}

fn discover<R: RandomSource>(
    mut state: GameState,
    player_index: usize,
    rules: &RulesConfig,
    rng: &mut R,
) -> ActionOutcome {
    let uncured = DiseaseColor::ALL
        .into_iter()
        .find(|c| !state.disease(*c).is_cured());
    let Some(color) = uncured else {
        return ActionOutcome::no_op(state, ActionEffect::AllCured);
    };

    if rng.roll(rules.discover_chance) {
        state.disease_mut(color).cure();
        let player_id = spend(&mut state, player_index);
        let turn = state.turn;
        return ActionOutcome {
            state,
            effect: ActionEffect::Cured { color },
            spent: true,
            event: Some(GameEvent::disease_cured(turn, player_id, color)),
        };
    }

    match rules.discover_cost {
        DiscoverCost::OnSuccess => ActionOutcome::no_op(state, ActionEffect::CureFailed),
        DiscoverCost::PerAttempt => {
            spend(&mut state, player_index);
            ActionOutcome {
                state,
                effect: ActionEffect::CureFailed,
                spent: true,
                event: None,
            }
        }
    }
}

fn move_to(mut state: GameState, player_index: usize, city_name: &str) -> ActionOutcome {
    let turn = state.turn;
    let already_there = state
        .player(player_index)
        .map_or(true, |p| p.position == city_name);
    if already_there {
        return ActionOutcome::no_op(state, ActionEffect::AlreadyThere);
    }

    let mut from = String::new();
    let mut player_id = 0;
    if let Some(player) = state.player_mut(player_index) {
        from = std::mem::replace(&mut player.position, city_name.to_string());
        player.spend_action();
        player_id = player.id;
    }

    ActionOutcome {
        state,
        effect: ActionEffect::Moved { from: from.clone(), to: city_name.to_string() },
        spent: true,
        event: Some(GameEvent::player_moved(turn, player_id, from, city_name)),
    }
}

/// Spend one action of the player at `player_index`; returns their id.
fn spend(state: &mut GameState, player_index: usize) -> u32 {
    match state.player_mut(player_index) {
        Some(player) => {
            player.spend_action();
            player.id
        }
        None => 0,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::ScriptedRng;
    use crate::game::state::{City, Player, Role};

    fn board(levels: [u8; 4]) -> GameState {
        GameState::new(
            vec![City::with_levels("Atlanta", levels), City::new("London")],
            vec![
                Player::new(1, "Atlanta", Role::Scientist),
                Player::new(2, "London", Role::Medic),
            ],
        )
    }

    fn request(mode: ActionMode, city: &str) -> ActionRequest<'_> {
        ActionRequest { player_index: 0, city: Some(city), mode }
    }

    fn run(state: &GameState, mode: ActionMode, city: &str, rng: &mut ScriptedRng) -> Result<ActionOutcome, ActionError> {
        perform_action(state, &request(mode, city), &RulesConfig::default(), rng)
    }

    #[test]
    fn test_treat_scenario() {
        let state = board([2, 0, 0, 0]);
        let outcome = run(&state, ActionMode::Treat, "Atlanta", &mut ScriptedRng::never()).unwrap();

        assert_eq!(outcome.effect, ActionEffect::Treated { color: DiseaseColor::Red, remaining: 1 });
        assert_eq!(outcome.state.city("Atlanta").unwrap().levels(), [1, 0, 0, 0]);
        assert_eq!(outcome.state.player(0).unwrap().actions, 3);
        assert!(outcome.mutated());

        // Input snapshot untouched
        assert_eq!(state.city("Atlanta").unwrap().levels(), [2, 0, 0, 0]);
    }

    #[test]
    fn test_treat_uses_color_priority() {
        let state = board([0, 0, 2, 1]);
        let outcome = run(&state, ActionMode::Treat, "Atlanta", &mut ScriptedRng::never()).unwrap();
        assert_eq!(outcome.effect, ActionEffect::Treated { color: DiseaseColor::Yellow, remaining: 1 });
        assert_eq!(outcome.state.city("Atlanta").unwrap().levels(), [0, 0, 1, 1]);
    }

    #[test]
    fn test_treat_clean_city_is_no_op() {
        let state = board([0, 0, 0, 0]);
        let outcome = run(&state, ActionMode::Treat, "Atlanta", &mut ScriptedRng::never()).unwrap();
        assert_eq!(outcome.effect, ActionEffect::NoDisease);
        assert!(!outcome.mutated());
        assert_eq!(outcome.state, state);
    }

    #[test]
    fn test_discover_success_cures_first_active_color() {
        let state = board([0; 4]);
        let outcome = run(&state, ActionMode::Discover, "Atlanta", &mut ScriptedRng::always(0)).unwrap();
        assert_eq!(outcome.effect, ActionEffect::Cured { color: DiseaseColor::Red });
        assert!(outcome.state.disease(DiseaseColor::Red).is_cured());
        assert_eq!(outcome.state.player(0).unwrap().actions, 3);

        let again = run(&outcome.state, ActionMode::Discover, "Atlanta", &mut ScriptedRng::always(0)).unwrap();
        assert_eq!(again.effect, ActionEffect::Cured { color: DiseaseColor::Blue });
    }

    #[test]
    fn test_discover_failure_is_free_by_default() {
        let state = board([0; 4]);
        let outcome = run(&state, ActionMode::Discover, "Atlanta", &mut ScriptedRng::never()).unwrap();
        assert_eq!(outcome.effect, ActionEffect::CureFailed);
        assert_eq!(outcome.state.player(0).unwrap().actions, 4);
        assert!(!outcome.mutated());
    }

    #[test]
    fn test_discover_failure_costs_under_per_attempt() {
        let state = board([0; 4]);
        let rules = RulesConfig { discover_cost: DiscoverCost::PerAttempt, ..RulesConfig::default() };
        let outcome = perform_action(
            &state,
            &request(ActionMode::Discover, "Atlanta"),
            &rules,
            &mut ScriptedRng::never(),
        )
        .unwrap();
        assert_eq!(outcome.effect, ActionEffect::CureFailed);
        assert_eq!(outcome.state.player(0).unwrap().actions, 3);
        assert!(outcome.mutated());
    }

    #[test]
    fn test_discover_when_all_cured() {
        let mut state = board([0; 4]);
        for color in DiseaseColor::ALL {
            state.disease_mut(color).cure();
        }
        let outcome = run(&state, ActionMode::Discover, "Atlanta", &mut ScriptedRng::always(0)).unwrap();
        assert_eq!(outcome.effect, ActionEffect::AllCured);
        assert!(!outcome.mutated());
    }

    #[test]
    fn test_move_relocates_player() {
        let state = board([0; 4]);
        let outcome = run(&state, ActionMode::Move, "London", &mut ScriptedRng::never()).unwrap();
        assert_eq!(
            outcome.effect,
            ActionEffect::Moved { from: "Atlanta".into(), to: "London".into() }
        );
        assert_eq!(outcome.state.player(0).unwrap().position, "London");
        assert_eq!(outcome.state.player(0).unwrap().actions, 3);

        let stay = run(&state, ActionMode::Move, "Atlanta", &mut ScriptedRng::never()).unwrap();
        assert_eq!(stay.effect, ActionEffect::AlreadyThere);
        assert!(!stay.mutated());
    }

    #[test]
    fn test_reserved_modes_are_no_ops() {
        let state = board([1, 0, 0, 0]);
        for mode in [ActionMode::Build, ActionMode::Share] {
            let outcome = run(&state, mode, "Atlanta", &mut ScriptedRng::always(0)).unwrap();
            assert_eq!(outcome.effect, ActionEffect::Reserved(mode));
            assert_eq!(outcome.state, state);
        }
    }

    #[test]
    fn test_preconditions() {
        let state = board([1, 0, 0, 0]);
        let rules = RulesConfig::default();
        let mut rng = ScriptedRng::always(0);

        let no_city = ActionRequest { player_index: 0, city: None, mode: ActionMode::Treat };
        assert_eq!(perform_action(&state, &no_city, &rules, &mut rng).unwrap_err(), ActionError::NoCitySelected);

        let err = run(&state, ActionMode::Treat, "Atlantis", &mut rng).unwrap_err();
        assert_eq!(err, ActionError::UnknownCity("Atlantis".into()));

        let ghost = ActionRequest { player_index: 9, city: Some("Atlanta"), mode: ActionMode::Treat };
        assert_eq!(perform_action(&state, &ghost, &rules, &mut rng).unwrap_err(), ActionError::UnknownPlayer(9));

        let mut tired = state.clone();
        tired.player_mut(0).unwrap().actions = 0;
        let err = run(&tired, ActionMode::Treat, "Atlanta", &mut rng).unwrap_err();
        assert_eq!(err, ActionError::NoActionsLeft(1));
    }
}
