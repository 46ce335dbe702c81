//! File Gateway
//!
//! Stores the sealed snapshot as `game_state.json` inside a directory.
//! Writes go to a temporary file first and are renamed into place.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::store::gateway::{PersistError, PersistenceGateway, SaveReceipt, STATE_KEY};
use crate::store::sealed::SealedGameState;

/// File-backed persistence backend.
#[derive(Clone, Debug)]
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    /// Backend rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the state file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("{STATE_KEY}.json"))
    }
}

impl PersistenceGateway for FileGateway {
    async fn is_available(&self) -> bool {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) => meta.is_dir(),
            // Not created yet; the first save creates it
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(_) => false,
        }
    }

    async fn load(&self) -> Result<Option<SealedGameState>, PersistError> {
        if !self.is_available().await {
            return Err(PersistError::Unavailable);
        }

        match tokio::fs::read(self.state_path()).await {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(SealedGameState::from_bytes(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &SealedGameState) -> Result<SaveReceipt, PersistError> {
        if !self.is_available().await {
            return Err(PersistError::Unavailable);
        }

        let bytes = state.to_bytes()?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.state_path();
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(SaveReceipt::for_bytes(STATE_KEY, &bytes))
    }
}
