//! Game Events
//!
//! Events produced by actions and turn cycles. Outbreak events are also
//! kept in the snapshot's append-only history.

use serde::{Serialize, Deserialize};
use crate::game::state::DiseaseColor;

/// A city entered outbreak on a given turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutbreakEvent {
    /// City that broke out
    pub city: String,
    /// Turn counter at the moment of the transition
    pub turn: u32,
}

impl OutbreakEvent {
    /// Create a new outbreak event.
    pub fn new(city: impl Into<String>, turn: u32) -> Self {
        Self { city: city.into(), turn }
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// City entered outbreak
    Outbreak(OutbreakEvent),

    /// Player removed one cube
    Treated {
        /// Acting player
        player_id: u32,
        /// City treated
        city: String,
        /// Color removed
        color: DiseaseColor,
    },

    /// Player moved between cities
    PlayerMoved {
        /// Moving player
        player_id: u32,
        /// City left
        from: String,
        /// City entered
        to: String,
    },

    /// A cure was found
    DiseaseCured {
        /// Researching player
        player_id: u32,
        /// Color cured
        color: DiseaseColor,
    },

    /// A cured disease has no cubes left on the board
    DiseaseEradicated {
        /// Color eradicated
        color: DiseaseColor,
    },

    /// Turn counter advanced
    TurnAdvanced {
        /// Previous turn
        from: u32,
        /// New turn
        to: u32,
    },
}

/// A game event stamped with the turn it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Turn when event occurred
    pub turn: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(turn: u32, data: GameEventData) -> Self {
        Self { turn, data }
    }

    /// Create outbreak event.
    pub fn outbreak(outbreak: OutbreakEvent) -> Self {
        Self::new(outbreak.turn, GameEventData::Outbreak(outbreak))
    }

    /// Create treated event.
    pub fn treated(turn: u32, player_id: u32, city: impl Into<String>, color: DiseaseColor) -> Self {
        Self::new(turn, GameEventData::Treated { player_id, city: city.into(), color })
    }

    /// Create player moved event.
    pub fn player_moved(turn: u32, player_id: u32, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(turn, GameEventData::PlayerMoved { player_id, from: from.into(), to: to.into() })
    }

    /// Create disease cured event.
    pub fn disease_cured(turn: u32, player_id: u32, color: DiseaseColor) -> Self {
        Self::new(turn, GameEventData::DiseaseCured { player_id, color })
    }

    /// Create disease eradicated event.
    pub fn disease_eradicated(turn: u32, color: DiseaseColor) -> Self {
        Self::new(turn, GameEventData::DiseaseEradicated { color })
    }

    /// Create turn advanced event.
    pub fn turn_advanced(from: u32, to: u32) -> Self {
        Self::new(from, GameEventData::TurnAdvanced { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbreak_event_keeps_turn() {
        let event = GameEvent::outbreak(OutbreakEvent::new("Atlanta", 7));
        assert_eq!(event.turn, 7);
        assert!(matches!(event.data, GameEventData::Outbreak(ref o) if o.city == "Atlanta"));
    }

    #[test]
    fn test_turn_advanced_stamped_with_old_turn() {
        let event = GameEvent::turn_advanced(3, 4);
        assert_eq!(event.turn, 3);
        assert_eq!(event.data, GameEventData::TurnAdvanced { from: 3, to: 4 });
    }

    #[test]
    fn test_outbreak_event_wire_shape() {
        let json = serde_json::to_string(&OutbreakEvent::new("Lagos", 2)).unwrap();
        assert_eq!(json, r#"{"city":"Lagos","turn":2}"#);
    }
}
