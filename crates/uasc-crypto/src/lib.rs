//! uasc-crypto: symmetric crypto for secure-channel message chunks
//!
//! Pipeline (send): chunk → padding footer → HMAC signature → AES-CBC after header → wire
//!
//! Pipeline (receive): wire → AES-CBC decrypt → verify HMAC → strip padding → body
//!
//! Key derivation per renewal epoch:
//! ```text
//! shared secret + nonces
//!   └── P_hash (HMAC-SHA1 / HMAC-SHA256, per policy)
//!       ├── sending:   [signing key][encryption key][IV]   (seed = remote nonce)
//!       └── receiving: [signing key][encryption key][IV]   (seed = local nonce)
//! ```
//!
//! Everything here is a pure function of its inputs. Callers pass an explicit
//! [`DerivedKeySet`] per call, which is what lets a channel keep the previous
//! epoch alive while renewing (see [`KeyRing`]).

pub mod chunk;
pub mod cipher;
pub mod derive;
pub mod epoch;
pub mod padding;
pub mod policy;
pub mod prf;
pub mod signature;

pub use chunk::ChunkProtection;
pub use cipher::{decrypt, encrypt};
pub use derive::{derive_keys, ChannelKeys, DerivedKeySet};
pub use epoch::KeyRing;
pub use padding::{compute_padding_footer, pad, remove_padding, PaddingFooter, PaddingScheme};
pub use policy::{EncryptionAlgorithm, SecurityPolicy, SignatureAlgorithm};
pub use prf::derive_bytes;
pub use signature::{sign, verify, verify_chunk};
