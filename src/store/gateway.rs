//! Persistence Gateway
//!
//! The backing store the engine persists sealed snapshots to. The engine
//! only needs `load` and `save`; availability is checked before a load.

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{StateHash, hash_with_domain};
use crate::store::file::FileGateway;
use crate::store::memory::MemoryGateway;
use crate::store::sealed::SealedGameState;

/// Key the game state is stored under.
pub const STATE_KEY: &str = "game_state";

/// Persistence errors. None of them are fatal.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Backing store is not reachable.
    #[error("persistence backend unavailable")]
    Unavailable,
    /// Backing store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
    /// Stored bytes could not be encoded or decoded.
    #[error("state encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Key written
    pub key: String,
    /// Number of bytes written
    pub bytes: usize,
    /// SHA-256 of the bytes written
    #[serde(with = "hex_hash")]
    pub state_hash: StateHash,
    /// When the write completed
    pub saved_at: DateTime<Utc>,
}

impl SaveReceipt {
    /// Receipt for `bytes` written under `key`.
    pub fn for_bytes(key: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            key: key.into(),
            bytes: bytes.len(),
            state_hash: hash_with_domain(b"PANDEMIC_SEAL_SAVE_V1", bytes),
            saved_at: Utc::now(),
        }
    }

    /// Hex of the state hash, for logging.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.state_hash)
    }
}

mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};
    use crate::core::hash::StateHash;

    pub fn serialize<S: Serializer>(hash: &StateHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StateHash, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("state hash must be 32 bytes"))
    }
}

/// Backing store for sealed snapshots.
pub trait PersistenceGateway {
    /// Is the backing store reachable?
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Load the stored snapshot, still sealed. `Ok(None)` when nothing is stored.
    fn load(&self) -> impl Future<Output = Result<Option<SealedGameState>, PersistError>> + Send;

    /// Store a sealed snapshot, replacing any previous one.
    fn save(
        &self,
        state: &SealedGameState,
    ) -> impl Future<Output = Result<SaveReceipt, PersistError>> + Send;
}

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory for the file backend. In-memory when unset.
    pub state_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            state_dir: std::env::var("PANDEMIC_STATE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Open the backend this config selects.
    pub fn open(&self) -> ConfiguredGateway {
        match &self.state_dir {
            Some(dir) => ConfiguredGateway::File(FileGateway::new(dir.clone())),
            None => ConfiguredGateway::Memory(MemoryGateway::new()),
        }
    }
}

/// Backend chosen at runtime from [`StoreConfig`].
#[derive(Clone, Debug)]
pub enum ConfiguredGateway {
    /// In-process store
    Memory(MemoryGateway),
    /// JSON file on disk
    File(FileGateway),
}

impl PersistenceGateway for ConfiguredGateway {
    async fn is_available(&self) -> bool {
        match self {
            ConfiguredGateway::Memory(g) => g.is_available().await,
            ConfiguredGateway::File(g) => g.is_available().await,
        }
    }

    async fn load(&self) -> Result<Option<SealedGameState>, PersistError> {
        match self {
            ConfiguredGateway::Memory(g) => g.load().await,
            ConfiguredGateway::File(g) => g.load().await,
        }
    }

    async fn save(&self, state: &SealedGameState) -> Result<SaveReceipt, PersistError> {
        match self {
            ConfiguredGateway::Memory(g) => g.save(state).await,
            ConfiguredGateway::File(g) => g.save(state).await,
        }
    }
}
