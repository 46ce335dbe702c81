//! Persistence
//!
//! ## Module Structure
//!
//! - `sealed`: Wire form of a snapshot (intensities sealed)
//! - `gateway`: Gateway trait, errors, receipts, config
//! - `memory`: In-process backend
//! - `file`: JSON file backend

pub mod sealed;
pub mod gateway;
pub mod memory;
pub mod file;

pub use sealed::{SealedCity, SealedGameState};
pub use gateway::{ConfiguredGateway, PersistError, PersistenceGateway, SaveReceipt, StoreConfig, STATE_KEY};
pub use memory::MemoryGateway;
pub use file::FileGateway;
