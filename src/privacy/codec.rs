//! Confidentiality Codec
//!
//! Turns disease intensities into opaque sealed values and back.
//!
//! **This is a boundary marker, not encryption.** [`TextSealCodec`] is a
//! reversible text encoding: anyone who can run code against a sealed value
//! can read it. What it does provide is a hard line in the data flow between
//! "needs a reveal authorization to view" and "does not". Unsealing requires
//! an [`AuthorizationToken`], which only [`authorize`](super::reveal::authorize)
//! can mint, so code that never went through the reveal protocol cannot call
//! it. A real homomorphic or threshold scheme can replace the codec by
//! implementing [`ConfidentialCodec`].

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::MAX_INTENSITY;
use crate::privacy::reveal::AuthorizationToken;

/// Prefix carried by every value sealed with [`TextSealCodec`].
pub const SEAL_PREFIX: &str = "FHE-";

/// An opaque sealed value as written to the persistence gateway.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedValue(String);

impl SealedValue {
    /// Wrap raw sealed text (e.g. read back from storage).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw sealed text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SealedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedValue({})", self.0)
    }
}

/// Why a sealed value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Sealed text does not start with the codec prefix.
    #[error("sealed value is missing the FHE- prefix")]
    MissingPrefix,
    /// Payload is not valid hex.
    #[error("sealed payload is not valid hex")]
    InvalidHex,
    /// Payload bytes are not UTF-8.
    #[error("sealed payload is not utf-8")]
    NotUtf8,
    /// Payload text is not an integer.
    #[error("sealed payload is not an integer: {0:?}")]
    NotInteger(String),
    /// Decoded integer is outside the range allowed for an intensity.
    #[error("decoded value {0} is not a valid intensity")]
    OutOfRange(i64),
}

/// Seal/unseal contract.
///
/// Implementations must satisfy `unseal(seal(v)) == Ok(v)` for every `i64`.
pub trait ConfidentialCodec {
    /// Seal a value for storage.
    fn seal(&self, value: i64) -> SealedValue;

    /// Recover a sealed value. Only callable with a reveal authorization.
    fn unseal(&self, sealed: &SealedValue, token: &AuthorizationToken) -> Result<i64, DecodeError>;
}

/// Reversible text encoding: `FHE-` followed by the hex of the decimal text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextSealCodec;

impl ConfidentialCodec for TextSealCodec {
    fn seal(&self, value: i64) -> SealedValue {
        SealedValue(format!("{SEAL_PREFIX}{}", hex::encode(value.to_string())))
    }

    fn unseal(&self, sealed: &SealedValue, _token: &AuthorizationToken) -> Result<i64, DecodeError> {
        let payload = sealed
            .as_str()
            .strip_prefix(SEAL_PREFIX)
            .ok_or(DecodeError::MissingPrefix)?;
        let bytes = hex::decode(payload).map_err(|_| DecodeError::InvalidHex)?;
        let text = String::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
        text.parse::<i64>().map_err(|_| DecodeError::NotInteger(text))
    }
}

/// Unseal a value that must be a disease intensity.
pub fn unseal_intensity<C: ConfidentialCodec + ?Sized>(
    codec: &C,
    sealed: &SealedValue,
    token: &AuthorizationToken,
) -> Result<u8, DecodeError> {
    let value = codec.unseal(sealed, token)?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_INTENSITY)
        .ok_or(DecodeError::OutOfRange(value))
}

// =============================================================================
// TESTS
// =============================================================================
