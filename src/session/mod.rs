//! Session Boundary (non-deterministic)
//!
//! Wires the rules engine to the gateway, the codec and the identity
//! provider, and turns every outcome into a status the display can show.
//!
//! ## Module Structure
//!
//! - `controller`: `GameSession`, the only place mutations are persisted
//! - `view`: Caller-owned view state
//! - `status`: Status reports, error kinds, `SessionError`

pub mod controller;
pub mod view;
pub mod status;

pub use controller::{ActionReport, GameSession, PersistOutcome, SessionConfig, Snapshot, TurnReport};
pub use view::{CityVisibility, RevealedLevels, ViewState};
pub use status::{ErrorKind, SessionError, StatusLevel, StatusReport};
