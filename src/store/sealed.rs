//! Sealed Wire Form
//!
//! What the persistence gateway stores: the game state with every city's
//! intensities replaced by sealed values. Everything else is plain JSON.
//! Loading keeps the values sealed; only an authorized unseal turns a
//! [`SealedGameState`] back into a [`GameState`].

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::DISEASE_COUNT;
use crate::game::events::OutbreakEvent;
use crate::game::state::{City, Disease, GameState, Player, all_active};
use crate::privacy::codec::{ConfidentialCodec, DecodeError, SealedValue, unseal_intensity};
use crate::privacy::reveal::AuthorizationToken;

/// A city as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedCity {
    /// City name
    pub name: String,
    /// Sealed intensities in color order
    pub disease_levels: [SealedValue; DISEASE_COUNT],
    /// Outbreak flag (plain)
    pub outbreak: bool,
    /// Connected city names
    #[serde(default)]
    pub connections: BTreeSet<String>,
}

/// A full game state as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedGameState {
    /// Cities in display order
    pub cities: Vec<SealedCity>,
    /// Players in turn order
    pub players: Vec<Player>,
    /// Outbreak counter
    pub outbreak_count: u32,
    /// Infection rate
    pub infection_rate: u32,
    /// Turn counter
    pub turn: u32,
    /// Cure progress
    #[serde(default = "all_active")]
    pub diseases: [Disease; DISEASE_COUNT],
    /// Outbreak history
    #[serde(default)]
    pub outbreak_history: Vec<OutbreakEvent>,
}

impl SealedGameState {
    /// Seal a live state for storage.
    pub fn seal<C: ConfidentialCodec + ?Sized>(state: &GameState, codec: &C) -> Self {
        let cities = state
            .cities()
            .iter()
            .map(|city| SealedCity {
                name: city.name().to_string(),
                disease_levels: city.levels().map(|level| codec.seal(i64::from(level))),
                outbreak: city.is_outbreak(),
                connections: city.connections().clone(),
            })
            .collect();

        Self {
            cities,
            players: state.players().to_vec(),
            outbreak_count: state.outbreak_count(),
            infection_rate: state.infection_rate(),
            turn: state.turn(),
            diseases: *state.diseases(),
            outbreak_history: state.outbreak_history().to_vec(),
        }
    }

    /// Unseal every intensity. Fails on the first malformed value.
    pub fn unseal<C: ConfidentialCodec + ?Sized>(
        &self,
        codec: &C,
        token: &AuthorizationToken,
    ) -> Result<GameState, DecodeError> {
        let cities = self
            .cities
            .iter()
            .map(|city| {
                let mut levels = [0u8; DISEASE_COUNT];
                for (level, sealed) in levels.iter_mut().zip(&city.disease_levels) {
                    *level = unseal_intensity(codec, sealed, token)?;
                }
                Ok(City::from_parts(
                    city.name.clone(),
                    levels,
                    city.outbreak,
                    city.connections.clone(),
                ))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(GameState::from_parts(
            cities,
            self.players.clone(),
            self.outbreak_count,
            self.infection_rate,
            self.turn,
            self.diseases,
            self.outbreak_history.clone(),
        ))
    }

    /// Find a city by name.
    pub fn city(&self, name: &str) -> Option<&SealedCity> {
        self.cities.iter().find(|c| c.name == name)
    }

    /// Encode as UTF-8 JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from UTF-8 JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::privacy::codec::TextSealCodec;

    #[test]
    fn test_seal_unseal_state() {
        let state = GameState::new_game(&mut DeterministicRng::new(11));
        let sealed = SealedGameState::seal(&state, &TextSealCodec);

        assert_eq!(sealed.cities.len(), state.cities().len());
        assert!(sealed.cities[0].disease_levels.iter().all(|v| v.as_str().starts_with("FHE-")));

        let token = AuthorizationToken::for_tests();
        let restored = sealed.unseal(&TextSealCodec, &token).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_wire_shape() {
        let state = GameState::new(
            vec![City::with_levels("Atlanta", [1, 0, 2, 0])],
            vec![Player::new(1, "Atlanta", crate::game::state::Role::Scientist)],
        );
        let sealed = SealedGameState::seal(&state, &TextSealCodec);
        let json: serde_json::Value = serde_json::from_slice(&sealed.to_bytes().unwrap()).unwrap();

        assert_eq!(json["outbreakCount"], 0);
        assert_eq!(json["infectionRate"], 2);
        assert_eq!(json["turn"], 1);
        assert_eq!(json["cities"][0]["name"], "Atlanta");
        assert_eq!(json["cities"][0]["diseaseLevels"][2], "FHE-32");
        assert_eq!(json["players"][0]["role"], "Scientist");
        assert_eq!(json["players"][0]["actions"], 4);
    }

    #[test]
    fn test_legacy_payload_defaults() {
        let raw = r#"{
            "cities": [{"name": "Lima", "diseaseLevels": ["FHE-30","FHE-31","FHE-30","FHE-30"], "outbreak": false}],
            "players": [{"id": 2, "position": "London", "role": "Medic", "actions": 4}],
            "outbreakCount": 4,
            "infectionRate": 2,
            "turn": 3
        }"#;
        let sealed = SealedGameState::from_bytes(raw.as_bytes()).unwrap();
        assert!(sealed.outbreak_history.is_empty());
        assert!(sealed.diseases.iter().all(|d| !d.is_cured()));
        assert!(sealed.city("Lima").is_some());

        let state = sealed.unseal(&TextSealCodec, &AuthorizationToken::for_tests()).unwrap();
        assert_eq!(state.turn(), 3);
        assert_eq!(state.city("Lima").unwrap().levels(), [0, 1, 0, 0]);
    }

    #[test]
    fn test_unseal_rejects_bad_value() {
        let state = GameState::new(vec![City::new("Cairo")], vec![]);
        let mut sealed = SealedGameState::seal(&state, &TextSealCodec);
        sealed.cities[0].disease_levels[1] = SealedValue::from_raw("garbage");

        let err = sealed.unseal(&TextSealCodec, &AuthorizationToken::for_tests()).unwrap_err();
        assert_eq!(err, DecodeError::MissingPrefix);
    }
}
