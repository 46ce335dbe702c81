//! World Map
//!
//! The fixed board: city list, starting outbreaks and starting players.

use crate::game::state::{Player, Role};

/// All cities on the board, in display order.
pub const CITY_NAMES: [&str; 47] = [
    "San Francisco", "Chicago", "Atlanta", "Montreal", "New York",
    "London", "Madrid", "Paris", "Essen", "Milan", "St. Petersburg",
    "Los Angeles", "Mexico City", "Miami", "Bogota", "Lima", "Santiago",
    "Sao Paulo", "Buenos Aires", "Lagos", "Kinshasa", "Johannesburg",
    "Khartoum", "Algiers", "Cairo", "Istanbul", "Moscow", "Tehran",
    "Baghdad", "Riyadh", "Karachi", "Delhi", "Mumbai", "Chennai",
    "Kolkata", "Bangkok", "Jakarta", "Ho Chi Minh City", "Hong Kong",
    "Shanghai", "Beijing", "Seoul", "Tokyo", "Osaka", "Taipei", "Manila",
    "Sydney",
];

/// Cities already in outbreak when a game starts.
pub const INITIAL_OUTBREAKS: [&str; 4] = ["Tokyo", "New York", "Paris", "Sao Paulo"];

/// Outbreak counter at game start (one per initial outbreak).
pub const STARTING_OUTBREAK_COUNT: u32 = INITIAL_OUTBREAKS.len() as u32;

/// Infection rate at game start.
pub const STARTING_INFECTION_RATE: u32 = 2;

/// The two starting players, in turn order.
pub fn starting_players() -> Vec<Player> {
    vec![
        Player::new(1, "Atlanta", Role::Scientist),
        Player::new(2, "London", Role::Medic),
    ]
}
