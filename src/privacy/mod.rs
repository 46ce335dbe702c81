//! Confidentiality Boundary
//!
//! Everything between a sealed intensity and a value on screen.
//!
//! ## Module Structure
//!
//! - `codec`: Seal/unseal of intensities (boundary marker, not encryption)
//! - `reveal`: Signed-challenge authorization that gates unsealing
//! - `wallet`: Identity provider trait and a local Ed25519 wallet

pub mod codec;
pub mod reveal;
pub mod wallet;

pub use codec::{ConfidentialCodec, DecodeError, SealedValue, TextSealCodec, unseal_intensity};
pub use reveal::{AuthError, AuthorizationToken, RevealConfig, RevealContext, authorize};
pub use wallet::{Identity, IdentityProvider, LocalWallet, SignError, SigningPolicy, WalletSignature};
