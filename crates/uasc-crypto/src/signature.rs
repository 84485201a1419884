//! HMAC chunk signatures
//!
//! The signature covers the whole chunk as it stands before encryption
//! (header, body, padding) and is appended to its tail.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use uasc_core::{UascError, UascResult};

use crate::policy::{SecurityPolicy, SignatureAlgorithm};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Sign `chunk` with the derived signing key.
///
/// Returns `policy.signature_len()` bytes; empty for the `None` policy.
pub fn sign(chunk: &[u8], signing_key: &[u8], policy: SecurityPolicy) -> UascResult<Vec<u8>> {
    let Some(algorithm) = policy.signature_algorithm() else {
        return Ok(Vec::new());
    };
    if signing_key.len() != policy.signing_key_len() {
        return Err(UascError::InvalidKeyMaterial(format!(
            "signing key is {} bytes, {} requires {}",
            signing_key.len(),
            policy.name(),
            policy.signing_key_len()
        )));
    }

    match algorithm {
        SignatureAlgorithm::HmacSha1 => compute::<HmacSha1>(signing_key, chunk),
        SignatureAlgorithm::HmacSha256 => compute::<HmacSha256>(signing_key, chunk),
    }
}

/// Check `signature` over `chunk` in constant time.
///
/// Every failure, including a malformed key or signature, is `false`.
pub fn verify(chunk: &[u8], signature: &[u8], signing_key: &[u8], policy: SecurityPolicy) -> bool {
    let Some(algorithm) = policy.signature_algorithm() else {
        return true;
    };
    if signing_key.len() != policy.signing_key_len() {
        return false;
    }

    match algorithm {
        SignatureAlgorithm::HmacSha1 => check::<HmacSha1>(signing_key, chunk, signature),
        SignatureAlgorithm::HmacSha256 => check::<HmacSha256>(signing_key, chunk, signature),
    }
}

/// Verify a chunk whose last `policy.signature_len()` bytes are its signature.
pub fn verify_chunk(chunk_with_signature: &[u8], signing_key: &[u8], policy: SecurityPolicy) -> bool {
    let signature_len = policy.signature_len();
    if chunk_with_signature.len() < signature_len {
        return false;
    }
    let (chunk, signature) = chunk_with_signature.split_at(chunk_with_signature.len() - signature_len);
    verify(chunk, signature, signing_key, policy)
}

fn compute<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> UascResult<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|e| UascError::InvalidKeyMaterial(format!("signing key rejected: {e}")))?;
    Mac::update(&mut mac, data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check<M: Mac + KeyInit>(key: &[u8], data: &[u8], signature: &[u8]) -> bool {
    match <M as KeyInit>::new_from_slice(key) {
        Ok(mut mac) => {
            Mac::update(&mut mac, data);
            mac.verify_slice(signature).is_ok()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key_for(policy: SecurityPolicy) -> Vec<u8> {
        (0..policy.signing_key_len() as u8).collect()
    }

    #[test]
    fn test_hmac_sha256_vector() {
        // RFC 4231 test case 2
        let tag = compute::<HmacSha256>(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha1_vector() {
        // RFC 2202 test case 2
        let tag = compute::<HmacSha1>(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(hex::encode(tag), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn test_sign_verify_all_policies() {
        let chunk = b"MSGF\x20\x00\x00\x00header and body";
        for policy in SecurityPolicy::ALL {
            let key = key_for(policy);
            let signature = sign(chunk, &key, policy).unwrap();
            assert_eq!(signature.len(), policy.signature_len());
            assert!(verify(chunk, &signature, &key, policy));

            let mut signed = chunk.to_vec();
            signed.extend_from_slice(&signature);
            assert!(verify_chunk(&signed, &key, policy));
        }
    }

    #[test]
    fn test_none_policy() {
        assert!(sign(b"anything", b"", SecurityPolicy::None).unwrap().is_empty());
        assert!(verify(b"anything", b"garbage", b"", SecurityPolicy::None));
        assert!(verify_chunk(b"", b"", SecurityPolicy::None));
    }

    #[test]
    fn test_wrong_key_fails() {
        let policy = SecurityPolicy::Basic256Sha256;
        let key = key_for(policy);
        let signature = sign(b"chunk", &key, policy).unwrap();

        let mut other = key.clone();
        other[0] ^= 1;
        assert!(!verify(b"chunk", &signature, &other, policy));
        assert!(!verify(b"chunk", &signature, &key[..16], policy));
    }

    #[test]
    fn test_truncated_signature_fails() {
        let policy = SecurityPolicy::Basic128Rsa15;
        let key = key_for(policy);
        let signature = sign(b"chunk", &key, policy).unwrap();
        assert!(!verify(b"chunk", &signature[..19], &key, policy));
        assert!(!verify(b"chunk", &[], &key, policy));
        assert!(!verify_chunk(&signature[..10], &key, policy));
    }

    #[test]
    fn test_sign_rejects_wrong_key_length() {
        let result = sign(b"chunk", &[0u8; 5], SecurityPolicy::Basic256);
        assert!(matches!(result, Err(UascError::InvalidKeyMaterial(_))));
    }

    proptest! {
        #[test]
        fn any_bit_flip_fails(
            chunk in proptest::collection::vec(any::<u8>(), 1..256),
            flip_in_signature in any::<bool>(),
            index in any::<usize>(),
            bit in 0u8..8,
        ) {
            let policy = SecurityPolicy::Aes128Sha256RsaOaep;
            let key = key_for(policy);
            let mut signature = sign(&chunk, &key, policy).unwrap();
            let mut chunk = chunk;
            prop_assert!(verify(&chunk, &signature, &key, policy));

            if flip_in_signature {
                let i = index % signature.len();
                signature[i] ^= 1 << bit;
            } else {
                let i = index % chunk.len();
                chunk[i] ^= 1 << bit;
            }
            prop_assert!(!verify(&chunk, &signature, &key, policy));
        }
    }
}
