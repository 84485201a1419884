//! Chunk seal/open pipeline
//!
//! Sealed chunk layout for `SignAndEncrypt`:
//! ```text
//! [header (clear)][ENC( body || padding footer || signature )]
//!                  signature = HMAC( header || body || padding footer )
//! ```
//! `Sign` drops the padding and the encryption; `None` leaves the chunk alone.
//!
//! Send is sign-then-encrypt. Receive is decrypt, verify, and only then strip
//! the padding, so nothing is parsed out of unauthenticated plaintext.

use uasc_core::config::ChannelConfig;
use uasc_core::{MessageSecurityMode, UascError, UascResult};

use crate::cipher;
use crate::derive::DerivedKeySet;
use crate::padding::{compute_padding_footer, padding_size, remove_padding, PaddingScheme};
use crate::policy::SecurityPolicy;
use crate::signature;

/// Symmetric chunks always carry a single-byte padding length
const CHUNK_PADDING: PaddingScheme = PaddingScheme::Single;

/// The protection applied to every chunk of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProtection {
    policy: SecurityPolicy,
    mode: MessageSecurityMode,
}

impl ChunkProtection {
    /// `None` policy goes with `None` mode and nothing else.
    pub fn new(policy: SecurityPolicy, mode: MessageSecurityMode) -> UascResult<Self> {
        if policy.is_none() != (mode == MessageSecurityMode::None) {
            return Err(UascError::Config(format!(
                "security mode {mode:?} cannot be used with policy {}",
                policy.name()
            )));
        }
        Ok(Self { policy, mode })
    }

    pub fn from_config(config: &ChannelConfig) -> UascResult<Self> {
        let policy = SecurityPolicy::resolve(&config.security_policy)?;
        Self::new(policy, config.security_mode)
    }

    /// No protection at all
    pub fn none() -> Self {
        Self {
            policy: SecurityPolicy::None,
            mode: MessageSecurityMode::None,
        }
    }

    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    pub fn mode(&self) -> MessageSecurityMode {
        self.mode
    }

    /// Wire length of a chunk with `body_len` body bytes after sealing.
    pub fn sealed_len(&self, header_len: usize, body_len: usize) -> usize {
        if !self.mode.signs() {
            return header_len + body_len;
        }
        let signature_len = self.policy.signature_len();
        let footer_len = if self.mode.encrypts() {
            padding_size(body_len, self.policy.block_size(), signature_len, CHUNK_PADDING)
                + CHUNK_PADDING.length_field_size()
        } else {
            0
        };
        header_len + body_len + footer_len + signature_len
    }

    /// Largest body that still fits a sealed chunk of at most `chunk_size` bytes.
    pub fn max_body_len(&self, header_len: usize, chunk_size: usize) -> usize {
        let available = chunk_size.saturating_sub(header_len);
        if !self.mode.signs() {
            return available;
        }
        let signature_len = self.policy.signature_len();
        if !self.mode.encrypts() {
            return available.saturating_sub(signature_len);
        }
        let block_size = self.policy.block_size();
        let aligned = available - available % block_size;
        aligned
            .saturating_sub(signature_len)
            .saturating_sub(CHUNK_PADDING.length_field_size())
    }

    /// Protect an outgoing chunk. The first `header_len` bytes stay in the clear.
    pub fn seal(&self, chunk: &[u8], header_len: usize, keys: &DerivedKeySet) -> UascResult<Vec<u8>> {
        check_header(chunk, header_len)?;
        if !self.mode.signs() {
            return Ok(chunk.to_vec());
        }

        let signature_len = self.policy.signature_len();
        let mut signed = Vec::with_capacity(chunk.len() + self.policy.block_size() + signature_len);
        signed.extend_from_slice(chunk);
        if self.mode.encrypts() {
            let footer = compute_padding_footer(
                chunk.len() - header_len,
                self.policy.block_size(),
                signature_len,
                CHUNK_PADDING,
            )?;
            signed.extend_from_slice(footer.as_bytes());
        }
        let sig = signature::sign(&signed, keys.signing_key(), self.policy)?;
        signed.extend_from_slice(&sig);

        if !self.mode.encrypts() {
            return Ok(signed);
        }

        let ciphertext = cipher::encrypt(
            &signed[header_len..],
            keys.encryption_key(),
            keys.initialization_vector(),
            self.policy,
        )?;

        let mut sealed = Vec::with_capacity(header_len + ciphertext.len());
        sealed.extend_from_slice(&chunk[..header_len]);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Authenticate (and decrypt) an incoming chunk and return its body.
    ///
    /// The header is not part of the result. On any failure nothing of the
    /// plaintext is returned.
    pub fn open(&self, chunk: &[u8], header_len: usize, keys: &DerivedKeySet) -> UascResult<Vec<u8>> {
        check_header(chunk, header_len)?;
        if !self.mode.signs() {
            return Ok(chunk[header_len..].to_vec());
        }

        let signature_len = self.policy.signature_len();
        if !self.mode.encrypts() {
            if chunk.len() < header_len + signature_len
                || !signature::verify_chunk(chunk, keys.signing_key(), self.policy)
            {
                return Err(self.rejected(chunk.len()));
            }
            return Ok(chunk[header_len..chunk.len() - signature_len].to_vec());
        }

        let (header, ciphertext) = chunk.split_at(header_len);
        let plaintext = cipher::decrypt(
            ciphertext,
            keys.encryption_key(),
            keys.initialization_vector(),
            self.policy,
        )?;
        if plaintext.len() < signature_len {
            return Err(self.rejected(chunk.len()));
        }

        let (padded, sig) = plaintext.split_at(plaintext.len() - signature_len);
        let mut signed = Vec::with_capacity(header_len + padded.len());
        signed.extend_from_slice(header);
        signed.extend_from_slice(padded);
        if !signature::verify(&signed, sig, keys.signing_key(), self.policy) {
            return Err(self.rejected(chunk.len()));
        }

        let body = remove_padding(padded, self.policy.block_size(), CHUNK_PADDING)?;
        Ok(body.to_vec())
    }

    fn rejected(&self, chunk_len: usize) -> UascError {
        tracing::warn!(
            policy = self.policy.name(),
            chunk_len,
            "chunk signature verification failed"
        );
        UascError::VerificationFailed
    }
}

fn check_header(chunk: &[u8], header_len: usize) -> UascResult<()> {
    if header_len > chunk.len() {
        return Err(UascError::MalformedChunk(format!(
            "header of {header_len} bytes exceeds chunk of {} bytes",
            chunk.len()
        )));
    }
    Ok(())
}
