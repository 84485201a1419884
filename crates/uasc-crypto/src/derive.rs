//! Per-direction key derivation: shared secret + nonces → signing key, encryption key, IV

use uasc_core::{ChannelRole, UascError, UascResult};
use zeroize::Zeroize;

use crate::policy::SecurityPolicy;
use crate::prf;

/// Keying material for one direction of one key-renewal epoch.
///
/// Immutable once derived and zeroized on drop. A renewal produces a new set;
/// nothing ever rewrites one in place.
#[derive(Clone)]
pub struct DerivedKeySet {
    signing_key: Vec<u8>,
    encryption_key: Vec<u8>,
    initialization_vector: Vec<u8>,
}

impl DerivedKeySet {
    /// Key set of the `None` policy
    pub fn empty() -> Self {
        Self {
            signing_key: Vec::new(),
            encryption_key: Vec::new(),
            initialization_vector: Vec::new(),
        }
    }

    /// Split PRF output as `[signing key][encryption key][IV]`.
    fn from_prf_output(mut material: Vec<u8>, policy: SecurityPolicy) -> Self {
        let sign_end = policy.signing_key_len();
        let enc_end = sign_end + policy.encryption_key_len();

        let keys = Self {
            signing_key: material[..sign_end].to_vec(),
            encryption_key: material[sign_end..enc_end].to_vec(),
            initialization_vector: material[enc_end..].to_vec(),
        };
        material.zeroize();
        keys
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    pub fn encryption_key(&self) -> &[u8] {
        &self.encryption_key
    }

    pub fn initialization_vector(&self) -> &[u8] {
        &self.initialization_vector
    }
}

impl Drop for DerivedKeySet {
    fn drop(&mut self) {
        self.signing_key.zeroize();
        self.encryption_key.zeroize();
        self.initialization_vector.zeroize();
    }
}

impl std::fmt::Debug for DerivedKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeySet")
            .field("signing_key", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .field("initialization_vector", &"[REDACTED]")
            .finish()
    }
}

/// Derive the key set for one channel direction.
///
/// The remote nonce seeds the PRF and the shared secret keys it. Call again
/// with the nonces swapped for the opposite direction (or use
/// [`ChannelKeys::derive`]).
pub fn derive_keys(
    secret: &[u8],
    local_nonce: &[u8],
    remote_nonce: &[u8],
    policy: SecurityPolicy,
) -> UascResult<DerivedKeySet> {
    if policy.is_none() {
        return Ok(DerivedKeySet::empty());
    }
    if secret.is_empty() {
        return Err(UascError::InvalidKeyMaterial("shared secret is empty".into()));
    }
    check_nonce("local", local_nonce, policy)?;
    check_nonce("remote", remote_nonce, policy)?;

    derive_key_set(policy, secret, remote_nonce)
}

fn check_nonce(which: &str, nonce: &[u8], policy: SecurityPolicy) -> UascResult<()> {
    let min = policy.nonce_len().max(1);
    if nonce.len() < min {
        return Err(UascError::InvalidKeyMaterial(format!(
            "{which} nonce is {} bytes, {} requires at least {min}",
            nonce.len(),
            policy.name()
        )));
    }
    Ok(())
}

fn derive_key_set(policy: SecurityPolicy, secret: &[u8], seed: &[u8]) -> UascResult<DerivedKeySet> {
    let Some(algorithm) = policy.signature_algorithm() else {
        return Ok(DerivedKeySet::empty());
    };

    let material = prf::derive_bytes(algorithm, secret, seed, policy.derived_key_len())?;

    tracing::debug!(
        policy = policy.name(),
        signing_key_len = policy.signing_key_len(),
        encryption_key_len = policy.encryption_key_len(),
        iv_len = policy.iv_len(),
        "derived channel key set"
    );

    Ok(DerivedKeySet::from_prf_output(material, policy))
}

/// Both directions of a channel as seen from one endpoint.
#[derive(Clone, Debug)]
pub struct ChannelKeys {
    policy: SecurityPolicy,
    /// Keys this endpoint signs and encrypts with
    sending: DerivedKeySet,
    /// Keys the peer signs and encrypts with
    receiving: DerivedKeySet,
}

impl ChannelKeys {
    /// Derive both directions from a shared secret.
    ///
    /// The peer calling this with the nonces mirrored ends up with this
    /// endpoint's `sending` as its `receiving` and vice versa.
    pub fn derive(
        policy: SecurityPolicy,
        secret: &[u8],
        local_nonce: &[u8],
        remote_nonce: &[u8],
    ) -> UascResult<Self> {
        let sending = derive_keys(secret, local_nonce, remote_nonce, policy)?;
        let receiving = derive_keys(secret, remote_nonce, local_nonce, policy)?;
        Ok(Self {
            policy,
            sending,
            receiving,
        })
    }

    /// Derive both directions from the nonces alone.
    ///
    /// Keys for chunks sent by the client use the server nonce as PRF secret
    /// and the client nonce as seed; keys for server-sent chunks the reverse.
    pub fn derive_from_nonces(
        policy: SecurityPolicy,
        role: ChannelRole,
        client_nonce: &[u8],
        server_nonce: &[u8],
    ) -> UascResult<Self> {
        if policy.is_none() {
            return Ok(Self::none());
        }
        check_nonce("client", client_nonce, policy)?;
        check_nonce("server", server_nonce, policy)?;

        let client_keys = derive_key_set(policy, server_nonce, client_nonce)?;
        let server_keys = derive_key_set(policy, client_nonce, server_nonce)?;

        let (sending, receiving) = match role {
            ChannelRole::Client => (client_keys, server_keys),
            ChannelRole::Server => (server_keys, client_keys),
        };
        Ok(Self {
            policy,
            sending,
            receiving,
        })
    }

    /// Keys for an unsecured channel
    pub fn none() -> Self {
        Self {
            policy: SecurityPolicy::None,
            sending: DerivedKeySet::empty(),
            receiving: DerivedKeySet::empty(),
        }
    }

    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    pub fn sending(&self) -> &DerivedKeySet {
        &self.sending
    }

    pub fn receiving(&self) -> &DerivedKeySet {
        &self.receiving
    }
}
