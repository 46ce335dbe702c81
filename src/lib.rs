//! # Pandemic Seal
//!
//! Turn engine and sealed-reveal protocol for a cooperative epidemic
//! board game whose disease levels stay hidden until a player signs for
//! them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PANDEMIC SEAL                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG, injectable source      │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game rules (deterministic)                │
//! │  ├── state.rs    - Cities, players, diseases                 │
//! │  ├── map.rs      - Board layout and starting setup           │
//! │  ├── events.rs   - Outbreak history, event log               │
//! │  ├── rules.rs    - Probabilities and budgets                 │
//! │  ├── spread.rs   - Disease spread and outbreaks              │
//! │  ├── action.rs   - Player action state machine               │
//! │  └── turn.rs     - End-of-turn controller                    │
//! │                                                              │
//! │  privacy/        - Confidentiality boundary                  │
//! │  ├── codec.rs    - Seal/unseal of intensities                │
//! │  ├── reveal.rs   - Signed-challenge authorization            │
//! │  └── wallet.rs   - Identity provider                         │
//! │                                                              │
//! │  store/          - Persistence gateway                       │
//! │  session/        - Interaction boundary (non-deterministic)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (BTreeMap/BTreeSet for sorted iteration)
//! - No system time dependencies
//! - All randomness through an injected [`RandomSource`](core::rng::RandomSource)
//!
//! Given the same seed and the same sequence of actions, a game replays
//! to the same state hash.
//!
//! ## Confidentiality
//!
//! The default codec is a reversible encoding that marks the boundary
//! between hidden and revealed values. It is not encryption.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod privacy;
pub mod store;
pub mod session;

// Re-export commonly used types
pub use crate::core::rng::{Chance, DeterministicRng, RandomSource, ScriptedRng};
pub use game::state::{City, Disease, DiseaseColor, GameState, Player, Role};
pub use game::action::ActionMode;
pub use game::rules::RulesConfig;
pub use privacy::codec::{ConfidentialCodec, TextSealCodec};
pub use privacy::wallet::{IdentityProvider, LocalWallet};
pub use store::gateway::PersistenceGateway;
pub use session::{GameSession, SessionConfig, SessionError, ViewState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of disease colors
pub const DISEASE_COUNT: usize = 4;

/// Highest intensity a color can reach in a city
pub const MAX_INTENSITY: u8 = 3;

/// Actions each player gets per turn
pub const ACTIONS_PER_TURN: u32 = 4;
