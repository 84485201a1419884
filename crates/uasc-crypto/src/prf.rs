//! P_hash pseudo-random function
//!
//! ```text
//! A(0) = seed
//! A(i) = HMAC(secret, A(i-1))
//! P_hash(secret, seed) = HMAC(secret, A(1) || seed) || HMAC(secret, A(2) || seed) || ...
//! ```
//!
//! The output is truncated to the requested length.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use uasc_core::{UascError, UascResult};
use zeroize::Zeroize;

use crate::policy::SignatureAlgorithm;

/// Produce exactly `length` pseudo-random bytes from `secret` and `seed`.
///
/// Deterministic in all four inputs. Fails with `InvalidKeyMaterial` if the
/// secret or the seed is empty.
pub fn derive_bytes(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    seed: &[u8],
    length: usize,
) -> UascResult<Vec<u8>> {
    if secret.is_empty() {
        return Err(UascError::InvalidKeyMaterial("PRF secret is empty".into()));
    }
    if seed.is_empty() {
        return Err(UascError::InvalidKeyMaterial("PRF seed is empty".into()));
    }

    match algorithm {
        SignatureAlgorithm::HmacSha1 => p_hash::<Hmac<Sha1>>(secret, seed, length),
        SignatureAlgorithm::HmacSha256 => p_hash::<Hmac<Sha256>>(secret, seed, length),
    }
}

fn p_hash<M>(secret: &[u8], seed: &[u8], length: usize) -> UascResult<Vec<u8>>
where
    M: Mac + KeyInit + Clone,
{
    let keyed = <M as KeyInit>::new_from_slice(secret)
        .map_err(|e| UascError::InvalidKeyMaterial(format!("PRF secret rejected: {e}")))?;

    let mut a = keyed.clone();
    Mac::update(&mut a, seed);
    let mut chain = a.finalize().into_bytes();

    // Whole blocks, so the buffer never reallocates and leaves key bytes behind.
    let mut out = Vec::with_capacity(length.div_ceil(chain.len()) * chain.len());
    while out.len() < length {
        let mut block = keyed.clone();
        Mac::update(&mut block, &chain);
        Mac::update(&mut block, seed);
        let mut bytes = block.finalize().into_bytes();
        out.extend_from_slice(&bytes);
        bytes.as_mut_slice().zeroize();

        let mut next = keyed.clone();
        Mac::update(&mut next, &chain);
        chain.as_mut_slice().zeroize();
        chain = next.finalize().into_bytes();
    }
    chain.as_mut_slice().zeroize();

    out[length..].zeroize();
    out.truncate(length);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_p_sha256_vector() {
        // Widely published P_SHA256 vector: seed is label || seed.
        let secret = hex::decode("9bbe436ba940f017b17652849a71db35").unwrap();
        let mut seed = b"test label".to_vec();
        seed.extend_from_slice(&hex::decode("a0ba9f936cda311827a6f796ffd5198c").unwrap());

        let out = derive_bytes(SignatureAlgorithm::HmacSha256, &secret, &seed, 100).unwrap();

        assert_eq!(
            hex::encode(out),
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a\
             6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab\
             4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701\
             87347b66"
        );
    }

    #[test]
    fn test_prefix_stable_across_lengths() {
        let long = derive_bytes(SignatureAlgorithm::HmacSha1, b"secret", b"seed", 97).unwrap();
        let short = derive_bytes(SignatureAlgorithm::HmacSha1, b"secret", b"seed", 7).unwrap();
        assert_eq!(&long[..7], &short[..]);
    }

    #[test]
    fn test_algorithms_differ() {
        let a = derive_bytes(SignatureAlgorithm::HmacSha1, b"secret", b"seed", 32).unwrap();
        let b = derive_bytes(SignatureAlgorithm::HmacSha256, b"secret", b"seed", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_buffer_sized_to_whole_blocks() {
        // 100 bytes of HMAC-SHA256 is four 32-byte blocks, 20 bytes of HMAC-SHA1 is one.
        let out = derive_bytes(SignatureAlgorithm::HmacSha256, b"secret", b"seed", 100).unwrap();
        assert_eq!(out.len(), 100);
        assert_eq!(out.capacity(), 128);

        let out = derive_bytes(SignatureAlgorithm::HmacSha1, b"secret", b"seed", 20).unwrap();
        assert_eq!(out.capacity(), 20);
    }

    #[test]
    fn test_zero_length() {
        let out = derive_bytes(SignatureAlgorithm::HmacSha256, b"secret", b"seed", 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(matches!(
            derive_bytes(SignatureAlgorithm::HmacSha256, b"", b"seed", 16),
            Err(UascError::InvalidKeyMaterial(_))
        ));
        assert!(matches!(
            derive_bytes(SignatureAlgorithm::HmacSha256, b"secret", b"", 16),
            Err(UascError::InvalidKeyMaterial(_))
        ));
    }

    fn arb_algorithm() -> impl Strategy<Value = SignatureAlgorithm> {
        prop_oneof![
            Just(SignatureAlgorithm::HmacSha1),
            Just(SignatureAlgorithm::HmacSha256),
        ]
    }

    proptest! {
        #[test]
        fn output_has_requested_length_and_is_deterministic(
            algorithm in arb_algorithm(),
            secret in proptest::collection::vec(any::<u8>(), 1..64),
            seed in proptest::collection::vec(any::<u8>(), 1..64),
            length in 0usize..300,
        ) {
            let a = derive_bytes(algorithm, &secret, &seed, length).unwrap();
            let b = derive_bytes(algorithm, &secret, &seed, length).unwrap();
            prop_assert_eq!(a.len(), length);
            prop_assert_eq!(a, b, "PRF must be deterministic");
        }
    }
}
