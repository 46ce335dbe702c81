//! Reveal Authorization
//!
//! Before a hidden intensity is shown, the connected identity signs a
//! canonical challenge. A verified signature mints an [`AuthorizationToken`],
//! the only key that opens [`ConfidentialCodec::unseal`](super::codec::ConfidentialCodec::unseal).
//!
//! The duration embedded in the challenge is advisory: nothing here checks
//! it against the clock.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::privacy::wallet::{Identity, IdentityProvider, SignError, WalletSignature, address_from_public_key};

/// Reveal configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealConfig {
    /// Address of the persistence backend, embedded in the challenge
    pub contract_address: String,
    /// Chain/network id, embedded in the challenge
    pub chain_id: u64,
    /// Validity window in days (advisory)
    pub duration_days: u32,
    /// Simulated decrypt latency applied after each authorization
    pub decrypt_latency: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            chain_id: 11_155_111,
            duration_days: 30,
            decrypt_latency: Duration::ZERO,
        }
    }
}

impl RevealConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            contract_address: std::env::var("PANDEMIC_CONTRACT_ADDRESS")
                .unwrap_or(defaults.contract_address),
            chain_id: std::env::var("PANDEMIC_CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chain_id),
            duration_days: std::env::var("PANDEMIC_REVEAL_DURATION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.duration_days),
            decrypt_latency: std::env::var("PANDEMIC_REVEAL_LATENCY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.decrypt_latency),
        }
    }
}

/// Parameters of the signed challenge for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealContext {
    /// Per-session public key (64 hex chars)
    pub public_key: String,
    /// Persistence backend address
    pub contract_address: String,
    /// Chain/network id
    pub chain_id: u64,
    /// Session start, UTC seconds
    pub start_timestamp: i64,
    /// Validity window in days (advisory)
    pub duration_days: u32,
}

impl RevealContext {
    /// Build the context for a session started at `started_at`.
    pub fn new(session_id: Uuid, config: &RevealConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            public_key: session_public_key(session_id),
            contract_address: config.contract_address.clone(),
            chain_id: config.chain_id,
            start_timestamp: started_at.timestamp(),
            duration_days: config.duration_days,
        }
    }

    /// The exact text the identity signs.
    pub fn challenge_message(&self) -> String {
        format!(
            "publickey:{}\ncontractAddresses:{}\ncontractsChainId:{}\nstartTimestamp:{}\ndurationDays:{}",
            self.public_key,
            self.contract_address,
            self.chain_id,
            self.start_timestamp,
            self.duration_days,
        )
    }

    /// End of the advisory validity window.
    pub fn advisory_expiry(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::from(self.duration_days).checked_mul(86_400)?;
        let end = self.start_timestamp.checked_add(seconds)?;
        Utc.timestamp_opt(end, 0).single()
    }
}

/// Derive the per-session public key from the session id.
///
/// The key is 64 hex characters (a SHA-256 digest), without a `0x` prefix.
pub fn session_public_key(session_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"PANDEMIC_SEAL_SESSION_KEY_V1");
    hasher.update(session_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Proof that one reveal interaction was authorized.
///
/// Not `Clone`: the session mints one per interaction and drops it when the
/// interaction is over.
#[derive(Debug)]
pub struct AuthorizationToken {
    address: String,
    challenge_digest: [u8; 32],
    issued_at: DateTime<Utc>,
}

impl AuthorizationToken {
    /// Address of the identity that signed.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// SHA-256 of the signed challenge.
    pub fn challenge_digest(&self) -> &[u8; 32] {
        &self.challenge_digest
    }

    /// When the signature was verified.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Token for values that an outbreak has already made public.
    ///
    /// Carries no signer and an all-zero digest.
    pub(crate) fn public_outbreak() -> Self {
        Self {
            address: String::new(),
            challenge_digest: [0u8; 32],
            issued_at: Utc::now(),
        }
    }

    /// Was this token minted for public outbreak values?
    pub fn is_public(&self) -> bool {
        self.address.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            address: "0xtest".to_string(),
            challenge_digest: [0u8; 32],
            issued_at: Utc::now(),
        }
    }
}

/// Authorization errors. All surface as `AuthFailed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No identity is connected.
    #[error("no identity connected")]
    NoIdentity,
    /// The identity declined to sign.
    #[error("signature request declined")]
    Declined,
    /// Signing key does not belong to the claimed address.
    #[error("signer does not match address {0}")]
    AddressMismatch(String),
    /// Signature does not verify over the challenge.
    #[error("invalid signature")]
    InvalidSignature,
    /// Public key is not a valid Ed25519 key.
    #[error("malformed public key")]
    MalformedKey,
}

impl From<SignError> for AuthError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::Declined => AuthError::Declined,
            SignError::Disconnected => AuthError::NoIdentity,
        }
    }
}

/// Run the challenge exchange with the connected identity.
pub async fn authorize<P: IdentityProvider>(
    provider: &P,
    context: &RevealContext,
) -> Result<AuthorizationToken, AuthError> {
    let identity = provider.current_identity().ok_or(AuthError::NoIdentity)?;
    let message = context.challenge_message();

    let signature = provider.sign(&message).await?;
    verify_signature(&identity, &message, &signature)?;

    debug!("Reveal authorized for {}", identity.address);

    Ok(AuthorizationToken {
        address: identity.address,
        challenge_digest: digest_challenge(&message),
        issued_at: Utc::now(),
    })
}

fn digest_challenge(message: &str) -> [u8; 32] {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(message.as_bytes()));
    digest
}

/// Check a signature against the identity's claimed address.
pub fn verify_signature(
    identity: &Identity,
    message: &str,
    signature: &WalletSignature,
) -> Result<(), AuthError> {
    let key_bytes: [u8; 32] = hex::decode(&signature.public_key)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(AuthError::MalformedKey)?;

    if address_from_public_key(&key_bytes) != identity.address {
        return Err(AuthError::AddressMismatch(identity.address.clone()));
    }

    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| AuthError::MalformedKey)?;
    let sig_bytes = hex::decode(&signature.signature).map_err(|_| AuthError::InvalidSignature)?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| AuthError::InvalidSignature)?;

    key.verify(message.as_bytes(), &sig)
        .map_err(|_| AuthError::InvalidSignature)
}

// =============================================================================
// TESTS
// =============================================================================
