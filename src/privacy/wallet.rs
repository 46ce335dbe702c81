//! Identity Provider
//!
//! The wallet-equivalent the reveal protocol talks to: who is connected, and
//! a way to ask them to sign a message. [`LocalWallet`] is an in-process
//! Ed25519 implementation used by the demo binary and the tests.

use std::future::Future;

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// A connected identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `0x`-prefixed address derived from the public key
    pub address: String,
    /// Hex-encoded Ed25519 public key
    pub public_key: String,
}

/// A signature returned by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSignature {
    /// Hex-encoded public key that produced the signature
    pub public_key: String,
    /// Hex-encoded 64-byte signature
    pub signature: String,
}

/// Why a provider did not sign.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// User declined the signature request.
    #[error("signature request declined")]
    Declined,
    /// No identity is connected.
    #[error("no identity connected")]
    Disconnected,
}

/// Wallet-equivalent used by the reveal protocol.
pub trait IdentityProvider {
    /// Identity currently connected, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Ask the connected identity to sign `message`.
    fn sign(&self, message: &str) -> impl Future<Output = Result<WalletSignature, SignError>> + Send;
}

/// Derive the address for a raw Ed25519 public key.
///
/// `0x` followed by the hex of the last 20 bytes of SHA-256(public key).
pub fn address_from_public_key(public_key: &[u8; 32]) -> String {
    let digest = Sha256::digest(public_key);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// What a [`LocalWallet`] does when asked to sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SigningPolicy {
    /// Sign every request.
    #[default]
    Approve,
    /// Refuse every request.
    Decline,
}

/// In-process Ed25519 wallet.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    signing_key: SigningKey,
    policy: SigningPolicy,
    connected: bool,
}

impl LocalWallet {
    /// Connected wallet over an existing key.
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            policy: SigningPolicy::Approve,
            connected: true,
        }
    }

    /// Wallet whose key is derived from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(&seed))
    }

    /// Wallet with a fresh key.
    pub fn generate() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(Uuid::new_v4().as_bytes());
        hasher.update(Uuid::new_v4().as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&hasher.finalize());
        Self::from_seed(seed)
    }

    /// Builder: set the signing policy.
    pub fn with_policy(mut self, policy: SigningPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Change the signing policy.
    pub fn set_policy(&mut self, policy: SigningPolicy) {
        self.policy = policy;
    }

    /// Connect the wallet.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Disconnect the wallet. No identity is exposed while disconnected.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Is the wallet connected?
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Identity of this wallet, regardless of connection state.
    pub fn identity(&self) -> Identity {
        let public_key = self.signing_key.verifying_key().to_bytes();
        Identity {
            address: address_from_public_key(&public_key),
            public_key: hex::encode(public_key),
        }
    }
}

impl IdentityProvider for LocalWallet {
    fn current_identity(&self) -> Option<Identity> {
        self.connected.then(|| self.identity())
    }

    async fn sign(&self, message: &str) -> Result<WalletSignature, SignError> {
        if !self.connected {
            return Err(SignError::Disconnected);
        }
        if self.policy == SigningPolicy::Decline {
            return Err(SignError::Declined);
        }

        let signature = self.signing_key.sign(message.as_bytes());
        Ok(WalletSignature {
            public_key: hex::encode(self.signing_key.verifying_key().to_bytes()),
            signature: hex::encode(signature.to_bytes()),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
