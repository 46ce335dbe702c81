//! Game State Definitions
//!
//! Cities, players, diseases and the snapshot that ties them together.
//! Cities and players are kept in `Vec`s: city order is display order and
//! player order is turn order, and both must survive a save/load unchanged.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::{ACTIONS_PER_TURN, DISEASE_COUNT, MAX_INTENSITY};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::RandomSource;
use crate::game::events::OutbreakEvent;
use crate::game::map::{CITY_NAMES, INITIAL_OUTBREAKS, STARTING_OUTBREAK_COUNT, STARTING_INFECTION_RATE, starting_players};

/// Per-color intensities of a city, indexed by [`DiseaseColor::index`].
pub type Intensities = [u8; DISEASE_COUNT];

// =============================================================================
// DISEASE COLOR
// =============================================================================

/// The four disease colors, in treatment priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DiseaseColor {
    /// Slot 0, treated first.
    Red = 0,
    /// Slot 1
    Blue = 1,
    /// Slot 2
    Yellow = 2,
    /// Slot 3, treated last.
    Black = 3,
}

impl DiseaseColor {
    /// All colors in priority order.
    pub const ALL: [DiseaseColor; DISEASE_COUNT] = [
        DiseaseColor::Red,
        DiseaseColor::Blue,
        DiseaseColor::Yellow,
        DiseaseColor::Black,
    ];

    /// Intensity slot for this color.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get color from slot index (0-3).
    pub fn from_index(index: usize) -> Option<DiseaseColor> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            DiseaseColor::Red => "red",
            DiseaseColor::Blue => "blue",
            DiseaseColor::Yellow => "yellow",
            DiseaseColor::Black => "black",
        }
    }
}

impl fmt::Display for DiseaseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// DISEASE
// =============================================================================

/// Cure progress for one color.
///
/// Eradication implies a cure; the fields are private so that invariant
/// cannot be broken from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DiseaseRecord")]
pub struct Disease {
    color: DiseaseColor,
    cured: bool,
    eradicated: bool,
}

/// Wire shape of [`Disease`]; normalized on the way in.
#[derive(Deserialize)]
struct DiseaseRecord {
    color: DiseaseColor,
    #[serde(default)]
    cured: bool,
    #[serde(default)]
    eradicated: bool,
}

impl From<DiseaseRecord> for Disease {
    fn from(record: DiseaseRecord) -> Self {
        Self {
            color: record.color,
            cured: record.cured || record.eradicated,
            eradicated: record.eradicated,
        }
    }
}

impl Disease {
    /// An active (uncured) disease.
    pub const fn active(color: DiseaseColor) -> Self {
        Self { color, cured: false, eradicated: false }
    }

    /// Color of this disease.
    pub fn color(&self) -> DiseaseColor {
        self.color
    }

    /// Has a cure been discovered?
    pub fn is_cured(&self) -> bool {
        self.cured
    }

    /// Has the disease been eradicated?
    pub fn is_eradicated(&self) -> bool {
        self.eradicated
    }

    /// Mark cured. Returns false if it already was.
    pub fn cure(&mut self) -> bool {
        let changed = !self.cured;
        self.cured = true;
        changed
    }

    /// Mark eradicated. Only a cured disease can be eradicated.
    pub fn eradicate(&mut self) -> bool {
        if !self.cured || self.eradicated {
            return false;
        }
        self.eradicated = true;
        true
    }
}

pub(crate) fn all_active() -> [Disease; DISEASE_COUNT] {
    DiseaseColor::ALL.map(Disease::active)
}

// =============================================================================
// CITY
// =============================================================================

/// A city on the board.
///
/// Intensities are not readable through the public API unless the city is
/// in outbreak; everything else goes through the reveal protocol.
#[derive(Clone, PartialEq, Eq)]
pub struct City {
    name: String,
    disease_levels: Intensities,
    outbreak: bool,
    connections: BTreeSet<String>,
}

impl City {
    /// A clean city with no disease.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_levels(name, [0; DISEASE_COUNT])
    }

    /// A city with the given intensities (clamped to the cap).
    pub fn with_levels(name: impl Into<String>, levels: Intensities) -> Self {
        Self {
            name: name.into(),
            disease_levels: levels.map(|l| l.min(MAX_INTENSITY)),
            outbreak: false,
            connections: BTreeSet::new(),
        }
    }

    /// Builder: start in outbreak state.
    pub fn in_outbreak(mut self) -> Self {
        self.outbreak = true;
        self
    }

    /// Builder: add a connection.
    pub fn connected_to(mut self, other: impl Into<String>) -> Self {
        self.connections.insert(other.into());
        self
    }

    /// City name (unique key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is the city in outbreak?
    pub fn is_outbreak(&self) -> bool {
        self.outbreak
    }

    /// Connected city names.
    pub fn connections(&self) -> &BTreeSet<String> {
        &self.connections
    }

    /// Intensities, only once the city is in outbreak.
    pub fn public_levels(&self) -> Option<Intensities> {
        self.outbreak.then_some(self.disease_levels)
    }

    /// Raw intensities for the engine, the sealer and the reveal path.
    pub(crate) fn levels(&self) -> Intensities {
        self.disease_levels
    }

    pub(crate) fn level(&self, color: DiseaseColor) -> u8 {
        self.disease_levels[color.index()]
    }

    pub(crate) fn set_level(&mut self, color: DiseaseColor, level: u8) {
        self.disease_levels[color.index()] = level.min(MAX_INTENSITY);
    }

    /// Flip the outbreak flag on. Never flips it back.
    pub(crate) fn mark_outbreak(&mut self) -> bool {
        let changed = !self.outbreak;
        self.outbreak = true;
        changed
    }

    pub(crate) fn from_parts(
        name: String,
        disease_levels: Intensities,
        outbreak: bool,
        connections: BTreeSet<String>,
    ) -> Self {
        Self { name, disease_levels, outbreak, connections }
    }
}

impl fmt::Debug for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("City");
        s.field("name", &self.name);
        match self.public_levels() {
            Some(levels) => s.field("disease_levels", &levels),
            None => s.field("disease_levels", &"<sealed>"),
        };
        s.field("outbreak", &self.outbreak)
            .field("connections", &self.connections)
            .finish()
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Player role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Cure specialist
    Scientist = 0,
    /// Treatment specialist
    Medic = 1,
    /// Knowledge sharer
    Researcher = 2,
    /// Station builder
    OperationsExpert = 3,
    /// Blocks spread nearby
    QuarantineSpecialist = 4,
    /// Moves other pawns
    Dispatcher = 5,
    /// Reuses event cards
    ContingencyPlanner = 6,
}

/// A player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id
    pub id: u32,
    /// Name of the city the player stands in
    pub position: String,
    /// Role card
    pub role: Role,
    /// Actions left this turn
    pub actions: u32,
}

impl Player {
    /// Create a player with a full action budget.
    pub fn new(id: u32, position: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            position: position.into(),
            role,
            actions: ACTIONS_PER_TURN,
        }
    }

    /// Any actions left?
    #[inline]
    pub fn has_actions(&self) -> bool {
        self.actions > 0
    }

    /// Spend one action. Returns false if the budget was empty.
    pub fn spend_action(&mut self) -> bool {
        if self.actions == 0 {
            return false;
        }
        self.actions -= 1;
        true
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete snapshot of a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub(crate) cities: Vec<City>,
    pub(crate) players: Vec<Player>,
    pub(crate) outbreak_count: u32,
    pub(crate) infection_rate: u32,
    pub(crate) turn: u32,
    pub(crate) diseases: [Disease; DISEASE_COUNT],
    pub(crate) outbreak_history: Vec<OutbreakEvent>,
}

impl GameState {
    /// A state on turn 1 with no outbreaks counted yet.
    pub fn new(cities: Vec<City>, players: Vec<Player>) -> Self {
        Self {
            cities,
            players,
            outbreak_count: 0,
            infection_rate: STARTING_INFECTION_RATE,
            turn: 1,
            diseases: all_active(),
            outbreak_history: Vec::new(),
        }
    }

    /// Set up the standard board.
    ///
    /// Every intensity starts at 0 or 1, drawn from `rng`.
    pub fn new_game<R: RandomSource>(rng: &mut R) -> Self {
        let cities = CITY_NAMES
            .iter()
            .map(|name| {
                let mut levels = [0u8; DISEASE_COUNT];
                for level in &mut levels {
                    *level = rng.pick(2) as u8;
                }
                let city = City::with_levels(*name, levels);
                if INITIAL_OUTBREAKS.contains(name) {
                    city.in_outbreak()
                } else {
                    city
                }
            })
            .collect();

        Self {
            outbreak_count: STARTING_OUTBREAK_COUNT,
            ..Self::new(cities, starting_players())
        }
    }

    pub(crate) fn from_parts(
        cities: Vec<City>,
        players: Vec<Player>,
        outbreak_count: u32,
        infection_rate: u32,
        turn: u32,
        diseases: [Disease; DISEASE_COUNT],
        outbreak_history: Vec<OutbreakEvent>,
    ) -> Self {
        Self {
            cities,
            players,
            outbreak_count,
            infection_rate,
            turn,
            diseases,
            outbreak_history,
        }
    }

    /// Cities in display order.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Find a city by name.
    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }

    pub(crate) fn city_mut(&mut self, name: &str) -> Option<&mut City> {
        self.cities.iter_mut().find(|c| c.name == name)
    }

    /// Player at a turn-order index.
    pub fn player(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub(crate) fn player_mut(&mut self, index: usize) -> Option<&mut Player> {
        self.players.get_mut(index)
    }

    /// Total outbreaks so far. Never decreases.
    pub fn outbreak_count(&self) -> u32 {
        self.outbreak_count
    }

    /// Current infection rate.
    pub fn infection_rate(&self) -> u32 {
        self.infection_rate
    }

    /// Current turn, starting at 1. Never decreases.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Cure progress for every color, in priority order.
    pub fn diseases(&self) -> &[Disease; DISEASE_COUNT] {
        &self.diseases
    }

    /// Cure progress for one color.
    pub fn disease(&self, color: DiseaseColor) -> &Disease {
        &self.diseases[color.index()]
    }

    pub(crate) fn disease_mut(&mut self, color: DiseaseColor) -> &mut Disease {
        &mut self.diseases[color.index()]
    }

    /// Outbreaks in the order they happened.
    pub fn outbreak_history(&self) -> &[OutbreakEvent] {
        &self.outbreak_history
    }

    /// Sum of one color's intensity across the board.
    pub(crate) fn total_level(&self, color: DiseaseColor) -> u32 {
        self.cities.iter().map(|c| c.level(color) as u32).sum()
    }

    /// Put a city into outbreak and record it. No-op if it already was.
    pub(crate) fn record_outbreak(&mut self, city_index: usize) -> Option<OutbreakEvent> {
        let turn = self.turn;
        let city = self.cities.get_mut(city_index)?;
        if !city.mark_outbreak() {
            return None;
        }
        let event = OutbreakEvent::new(city.name.clone(), turn);
        self.outbreak_count = self.outbreak_count.saturating_add(1);
        self.outbreak_history.push(event.clone());
        Some(event)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.turn, |hasher| {
            hasher.update_u32(self.outbreak_count);
            hasher.update_u32(self.infection_rate);

            for city in &self.cities {
                hasher.update_str(&city.name);
                hasher.update_bytes(&city.disease_levels);
                hasher.update_bool(city.outbreak);
                hasher.update_u32(city.connections.len() as u32);
                for connection in &city.connections {
                    hasher.update_str(connection);
                }
            }

            for player in &self.players {
                hasher.update_u32(player.id);
                hasher.update_str(&player.position);
                hasher.update_u8(player.role as u8);
                hasher.update_u32(player.actions);
            }

            for disease in &self.diseases {
                hasher.update_u8(disease.color as u8);
                hasher.update_bool(disease.cured);
                hasher.update_bool(disease.eradicated);
            }

            for event in &self.outbreak_history {
                hasher.update_str(&event.city);
                hasher.update_u32(event.turn);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{DeterministicRng, ScriptedRng};

    #[test]
    fn test_new_game_layout() {
        let mut rng = DeterministicRng::new(12345);
        let state = GameState::new_game(&mut rng);

        assert_eq!(state.cities().len(), CITY_NAMES.len());
        assert_eq!(state.turn(), 1);
        assert_eq!(state.outbreak_count(), 4);
        assert_eq!(state.infection_rate(), 2);
        assert_eq!(state.players().len(), 2);
        assert!(state.players().iter().all(|p| p.actions == ACTIONS_PER_TURN));

        for name in INITIAL_OUTBREAKS {
            assert!(state.city(name).unwrap().is_outbreak(), "{name} should start in outbreak");
        }
        assert!(!state.city("Atlanta").unwrap().is_outbreak());

        for city in state.cities() {
            assert!(city.levels().iter().all(|l| *l <= 1));
        }
    }

    #[test]
    fn test_new_game_determinism() {
        let a = GameState::new_game(&mut DeterministicRng::new(7));
        let b = GameState::new_game(&mut DeterministicRng::new(7));
        assert_eq!(a, b);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_city_order_is_stable() {
        let state = GameState::new_game(&mut ScriptedRng::never());
        let names: Vec<_> = state.cities().iter().map(|c| c.name()).collect();
        assert_eq!(names, CITY_NAMES.to_vec());
    }

    #[test]
    fn test_levels_hidden_until_outbreak() {
        let city = City::with_levels("Atlanta", [2, 0, 0, 0]);
        assert_eq!(city.public_levels(), None);
        assert!(format!("{city:?}").contains("<sealed>"));

        let city = city.in_outbreak();
        assert_eq!(city.public_levels(), Some([2, 0, 0, 0]));
    }

    #[test]
    fn test_levels_are_capped() {
        let mut city = City::with_levels("Lima", [9, 0, 4, 1]);
        assert_eq!(city.levels(), [3, 0, 3, 1]);
        city.set_level(DiseaseColor::Blue, 200);
        assert_eq!(city.level(DiseaseColor::Blue), 3);
    }

    #[test]
    fn test_eradication_requires_cure() {
        let mut disease = Disease::active(DiseaseColor::Yellow);
        assert!(!disease.eradicate());
        assert!(!disease.is_eradicated());

        assert!(disease.cure());
        assert!(!disease.cure());
        assert!(disease.eradicate());
        assert!(disease.is_cured() && disease.is_eradicated());
    }

    #[test]
    fn test_disease_wire_normalizes_invariant() {
        let disease: Disease =
            serde_json::from_str(r#"{"color":"black","cured":false,"eradicated":true}"#).unwrap();
        assert!(disease.is_cured());
        assert!(disease.is_eradicated());
    }

    #[test]
    fn test_record_outbreak_once() {
        let mut state = GameState::new(vec![City::new("Atlanta")], vec![]);
        state.turn = 5;

        let event = state.record_outbreak(0).unwrap();
        assert_eq!(event, OutbreakEvent::new("Atlanta", 5));
        assert_eq!(state.outbreak_count(), 1);

        assert!(state.record_outbreak(0).is_none());
        assert_eq!(state.outbreak_count(), 1);
        assert_eq!(state.outbreak_history().len(), 1);
    }

    #[test]
    fn test_spend_action() {
        let mut player = Player::new(1, "Atlanta", Role::Scientist);
        for _ in 0..ACTIONS_PER_TURN {
            assert!(player.spend_action());
        }
        assert!(!player.has_actions());
        assert!(!player.spend_action());
        assert_eq!(player.actions, 0);
    }

    #[test]
    fn test_hash_changes_with_levels() {
        let a = GameState::new(vec![City::with_levels("Atlanta", [0, 0, 0, 0])], vec![]);
        let b = GameState::new(vec![City::with_levels("Atlanta", [1, 0, 0, 0])], vec![]);
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
