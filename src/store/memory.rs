//! In-Memory Gateway
//!
//! Key/value store shared between clones. Availability and write rejection
//! can be toggled to exercise the failure paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::gateway::{PersistError, PersistenceGateway, SaveReceipt, STATE_KEY};
use crate::store::sealed::SealedGameState;

/// In-process persistence backend.
#[derive(Clone, Debug)]
pub struct MemoryGateway {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    available: Arc<AtomicBool>,
    reject_writes: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Empty, available store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            reject_writes: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Make the store reachable or not.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Refuse (or accept again) every write.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw bytes stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().await.get(key).cloned()
    }

    /// Overwrite the raw bytes under `key`.
    pub async fn put_raw(&self, key: &str, bytes: Vec<u8>) {
        self.data.write().await.insert(key.to_string(), bytes);
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<Option<SealedGameState>, PersistError> {
        if !self.is_available().await {
            return Err(PersistError::Unavailable);
        }

        let data = self.data.read().await;
        match data.get(STATE_KEY) {
            Some(bytes) if !bytes.is_empty() => Ok(Some(SealedGameState::from_bytes(bytes)?)),
            _ => Ok(None),
        }
    }

    async fn save(&self, state: &SealedGameState) -> Result<SaveReceipt, PersistError> {
        if !self.is_available().await {
            return Err(PersistError::Unavailable);
        }
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Rejected("store is read-only".to_string()));
        }

        let bytes = state.to_bytes()?;
        let receipt = SaveReceipt::for_bytes(STATE_KEY, &bytes);
        self.data.write().await.insert(STATE_KEY.to_string(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);

        debug!("Saved {} bytes to memory store", receipt.bytes);
        Ok(receipt)
    }
}
