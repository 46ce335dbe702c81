//! Disease Spread and Outbreaks
//!
//! One pass over the board per turn cycle. A city that reaches the
//! intensity cap breaks out; from then on it is left alone. Outbreaks do
//! not chain into connected cities.

use tracing::debug;

use crate::MAX_INTENSITY;
use crate::core::rng::RandomSource;
use crate::game::events::OutbreakEvent;
use crate::game::rules::RulesConfig;
use crate::game::state::{DiseaseColor, GameState};

/// Run one spread pass over every city, in board order.
///
/// Returns the outbreaks triggered by this pass, already appended to the
/// state's history and counted.
pub fn spread<R: RandomSource>(
    state: &mut GameState,
    rules: &RulesConfig,
    rng: &mut R,
) -> Vec<OutbreakEvent> {
    let mut outbreaks = Vec::new();

    for index in 0..state.cities.len() {
        if state.cities[index].is_outbreak() {
            continue;
        }

        if !rng.roll(rules.spread_chance) {
            continue;
        }

        let Some(color) = DiseaseColor::from_index(rng.pick(DiseaseColor::ALL.len())) else {
            continue;
        };

        if state.disease(color).is_eradicated() {
            continue;
        }

        let city = &mut state.cities[index];
        let level = city.level(color).saturating_add(1).min(MAX_INTENSITY);
        city.set_level(color, level);

        if level >= MAX_INTENSITY {
            if let Some(event) = state.record_outbreak(index) {
                debug!(city = %event.city, turn = event.turn, %color, "outbreak");
                outbreaks.push(event);
            }
        }
    }

    outbreaks
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{Chance, DeterministicRng, ScriptedRng};
    use crate::game::state::City;

    fn tokyo_atlanta() -> GameState {
        GameState::new(
            vec![
                City::with_levels("Tokyo", [2, 1, 0, 0]).in_outbreak(),
                City::with_levels("Atlanta", [0, 0, 0, 0]),
            ],
            vec![],
        )
    }

    #[test]
    fn test_single_pass_increments_first_color() {
        let mut state = tokyo_atlanta();
        let mut rng = ScriptedRng::always(0);

        let outbreaks = spread(&mut state, &RulesConfig::default(), &mut rng);

        assert!(outbreaks.is_empty());
        let atlanta = state.city("Atlanta").unwrap();
        assert_eq!(atlanta.levels(), [1, 0, 0, 0]);
        assert!(!atlanta.is_outbreak());
        assert_eq!(state.outbreak_count(), 0);
    }

    #[test]
    fn test_outbreak_city_is_skipped() {
        let mut state = tokyo_atlanta();
        spread(&mut state, &RulesConfig::default(), &mut ScriptedRng::always(0));
        assert_eq!(state.city("Tokyo").unwrap().levels(), [2, 1, 0, 0]);
    }

    #[test]
    fn test_three_passes_trigger_outbreak() {
        let mut state = tokyo_atlanta();
        state.turn = 6;
        let mut rng = ScriptedRng::always(0);
        let rules = RulesConfig::default();

        spread(&mut state, &rules, &mut rng);
        spread(&mut state, &rules, &mut rng);
        let outbreaks = spread(&mut state, &rules, &mut rng);

        let atlanta = state.city("Atlanta").unwrap();
        assert_eq!(atlanta.levels(), [3, 0, 0, 0]);
        assert!(atlanta.is_outbreak());
        assert_eq!(state.outbreak_count(), 1);
        assert_eq!(outbreaks, vec![OutbreakEvent::new("Atlanta", 6)]);
        assert_eq!(state.outbreak_history(), &[OutbreakEvent::new("Atlanta", 6)]);

        // Terminal: a fourth pass changes nothing
        spread(&mut state, &rules, &mut rng);
        assert_eq!(state.outbreak_count(), 1);
        assert_eq!(state.outbreak_history().len(), 1);
    }

    #[test]
    fn test_failed_gate_changes_nothing() {
        let mut state = tokyo_atlanta();
        let before = state.clone();
        spread(&mut state, &RulesConfig::default(), &mut ScriptedRng::never());
        assert_eq!(state, before);
    }

    #[test]
    fn test_level_already_at_cap_breaks_out() {
        let mut state = GameState::new(vec![City::with_levels("Cairo", [0, 0, 3, 0])], vec![]);
        let outbreaks = spread(&mut state, &RulesConfig::default(), &mut ScriptedRng::always(2));
        assert_eq!(outbreaks.len(), 1);
        assert_eq!(state.city("Cairo").unwrap().levels(), [0, 0, 3, 0]);
    }

    #[test]
    fn test_eradicated_color_does_not_spread() {
        let mut state = tokyo_atlanta();
        state.disease_mut(DiseaseColor::Red).cure();
        state.disease_mut(DiseaseColor::Red).eradicate();

        spread(&mut state, &RulesConfig::default(), &mut ScriptedRng::always(0));
        assert_eq!(state.city("Atlanta").unwrap().levels(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_chance_never_spreads() {
        let mut rng = DeterministicRng::new(42);
        let mut state = GameState::new_game(&mut rng);
        let before = state.clone();
        let rules = RulesConfig {
            spread_chance: Chance::NEVER,
            ..RulesConfig::default()
        };

        for _ in 0..20 {
            spread(&mut state, &rules, &mut rng);
        }
        assert_eq!(state, before);
    }

    #[test]
    fn test_seeded_spread_is_deterministic() {
        let run = || {
            let mut rng = DeterministicRng::new(777);
            let mut state = GameState::new_game(&mut rng);
            for _ in 0..10 {
                spread(&mut state, &RulesConfig::default(), &mut rng);
            }
            state.compute_hash()
        };
        assert_eq!(run(), run());
    }
}
