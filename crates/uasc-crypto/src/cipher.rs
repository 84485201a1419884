//! AES-CBC chunk body encryption
//!
//! One IV per key-renewal epoch, no per-chunk IV and no implicit padding:
//! the caller hands in a body already aligned by [`crate::padding`]. The
//! unencrypted header never passes through here.

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use uasc_core::{UascError, UascResult};

use crate::policy::{EncryptionAlgorithm, SecurityPolicy};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt a block-aligned body. Identity for the `None` policy.
pub fn encrypt(
    padded_body: &[u8],
    encryption_key: &[u8],
    iv: &[u8],
    policy: SecurityPolicy,
) -> UascResult<Vec<u8>> {
    let Some(algorithm) = policy.encryption_algorithm() else {
        return Ok(padded_body.to_vec());
    };
    if !padded_body.len().is_multiple_of(algorithm.block_size()) {
        return Err(UascError::EncryptionFailed(format!(
            "body of {} bytes is not a multiple of the {}-byte block",
            padded_body.len(),
            algorithm.block_size()
        )));
    }

    let ciphertext = match algorithm {
        EncryptionAlgorithm::Aes128Cbc => Aes128CbcEnc::new_from_slices(encryption_key, iv)
            .map_err(key_error)?
            .encrypt_padded_vec_mut::<NoPadding>(padded_body),
        EncryptionAlgorithm::Aes256Cbc => Aes256CbcEnc::new_from_slices(encryption_key, iv)
            .map_err(key_error)?
            .encrypt_padded_vec_mut::<NoPadding>(padded_body),
    };
    Ok(ciphertext)
}

/// Decrypt a ciphertext back to the padded body. Identity for the `None` policy.
pub fn decrypt(
    ciphertext: &[u8],
    encryption_key: &[u8],
    iv: &[u8],
    policy: SecurityPolicy,
) -> UascResult<Vec<u8>> {
    let Some(algorithm) = policy.encryption_algorithm() else {
        return Ok(ciphertext.to_vec());
    };
    if !ciphertext.len().is_multiple_of(algorithm.block_size()) {
        return Err(UascError::DecryptionFailed(format!(
            "ciphertext of {} bytes is not a multiple of the {}-byte block",
            ciphertext.len(),
            algorithm.block_size()
        )));
    }

    let plaintext = match algorithm {
        EncryptionAlgorithm::Aes128Cbc => Aes128CbcDec::new_from_slices(encryption_key, iv)
            .map_err(key_error)?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        EncryptionAlgorithm::Aes256Cbc => Aes256CbcDec::new_from_slices(encryption_key, iv)
            .map_err(key_error)?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
    };
    plaintext.map_err(|e| UascError::DecryptionFailed(format!("{e}")))
}

fn key_error(_: InvalidLength) -> UascError {
    UascError::InvalidKeyMaterial("encryption key or IV has the wrong length".into())
}
