//! Security policy registry
//!
//! Every policy the channel can negotiate is a variant of [`SecurityPolicy`].
//! The URI is resolved once at channel setup; after that the enum value is
//! passed into every call, so the hot path never touches strings.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use uasc_core::{UascError, UascResult};

/// Common prefix of every registered policy URI
pub const POLICY_URI_PREFIX: &str = "http://opcfoundation.org/UA/SecurityPolicy#";

/// Keyed hash used for chunk signatures and the P_hash PRF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    HmacSha1,
    HmacSha256,
}

impl SignatureAlgorithm {
    /// MAC output length in bytes
    pub fn output_len(self) -> usize {
        match self {
            SignatureAlgorithm::HmacSha1 => 20,
            SignatureAlgorithm::HmacSha256 => 32,
        }
    }
}

/// Block cipher and chaining mode for chunk bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    Aes128Cbc,
    Aes256Cbc,
}

impl EncryptionAlgorithm {
    pub fn key_len(self) -> usize {
        match self {
            EncryptionAlgorithm::Aes128Cbc => 16,
            EncryptionAlgorithm::Aes256Cbc => 32,
        }
    }

    pub fn block_size(self) -> usize {
        16
    }
}

/// Symmetric parameters of one policy
#[derive(Debug)]
struct PolicyParams {
    name: &'static str,
    uri: &'static str,
    signature: Option<SignatureAlgorithm>,
    encryption: Option<EncryptionAlgorithm>,
    signing_key_len: usize,
    nonce_len: usize,
    /// Min/max asymmetric key size in bits
    asymmetric_key_bits: (usize, usize),
    deprecated: bool,
}

const NONE: PolicyParams = PolicyParams {
    name: "None",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#None",
    signature: None,
    encryption: None,
    signing_key_len: 0,
    nonce_len: 0,
    asymmetric_key_bits: (0, 0),
    deprecated: false,
};

const BASIC128_RSA15: PolicyParams = PolicyParams {
    name: "Basic128Rsa15",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
    signature: Some(SignatureAlgorithm::HmacSha1),
    encryption: Some(EncryptionAlgorithm::Aes128Cbc),
    signing_key_len: 16,
    nonce_len: 16,
    asymmetric_key_bits: (1024, 2048),
    deprecated: true,
};

const BASIC256: PolicyParams = PolicyParams {
    name: "Basic256",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
    signature: Some(SignatureAlgorithm::HmacSha1),
    encryption: Some(EncryptionAlgorithm::Aes256Cbc),
    signing_key_len: 24,
    nonce_len: 32,
    asymmetric_key_bits: (1024, 2048),
    deprecated: true,
};

const BASIC256_SHA256: PolicyParams = PolicyParams {
    name: "Basic256Sha256",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
    signature: Some(SignatureAlgorithm::HmacSha256),
    encryption: Some(EncryptionAlgorithm::Aes256Cbc),
    signing_key_len: 32,
    nonce_len: 32,
    asymmetric_key_bits: (2048, 4096),
    deprecated: false,
};

const AES128_SHA256_RSA_OAEP: PolicyParams = PolicyParams {
    name: "Aes128_Sha256_RsaOaep",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep",
    signature: Some(SignatureAlgorithm::HmacSha256),
    encryption: Some(EncryptionAlgorithm::Aes128Cbc),
    signing_key_len: 32,
    nonce_len: 32,
    asymmetric_key_bits: (2048, 4096),
    deprecated: false,
};

const AES256_SHA256_RSA_PSS: PolicyParams = PolicyParams {
    name: "Aes256_Sha256_RsaPss",
    uri: "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss",
    signature: Some(SignatureAlgorithm::HmacSha256),
    encryption: Some(EncryptionAlgorithm::Aes256Cbc),
    signing_key_len: 32,
    nonce_len: 32,
    asymmetric_key_bits: (2048, 4096),
    deprecated: false,
};

/// A registered security policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    /// No signing, no encryption: every chunk operation is the identity
    None,
    Basic128Rsa15,
    Basic256,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    pub const ALL: [SecurityPolicy; 6] = [
        SecurityPolicy::None,
        SecurityPolicy::Basic128Rsa15,
        SecurityPolicy::Basic256,
        SecurityPolicy::Basic256Sha256,
        SecurityPolicy::Aes128Sha256RsaOaep,
        SecurityPolicy::Aes256Sha256RsaPss,
    ];

    /// Look a policy up by full URI or short name.
    pub fn resolve(identifier: &str) -> UascResult<Self> {
        let name = identifier
            .strip_prefix(POLICY_URI_PREFIX)
            .unwrap_or(identifier);

        let policy = Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| UascError::UnsupportedPolicy(identifier.to_string()))?;

        if policy.is_deprecated() {
            tracing::warn!(policy = policy.name(), "resolved deprecated security policy");
        }
        Ok(policy)
    }

    fn params(self) -> &'static PolicyParams {
        match self {
            SecurityPolicy::None => &NONE,
            SecurityPolicy::Basic128Rsa15 => &BASIC128_RSA15,
            SecurityPolicy::Basic256 => &BASIC256,
            SecurityPolicy::Basic256Sha256 => &BASIC256_SHA256,
            SecurityPolicy::Aes128Sha256RsaOaep => &AES128_SHA256_RSA_OAEP,
            SecurityPolicy::Aes256Sha256RsaPss => &AES256_SHA256_RSA_PSS,
        }
    }

    pub fn uri(self) -> &'static str {
        self.params().uri
    }

    pub fn name(self) -> &'static str {
        self.params().name
    }

    pub fn is_none(self) -> bool {
        self == SecurityPolicy::None
    }

    pub fn is_deprecated(self) -> bool {
        self.params().deprecated
    }

    /// `None` only for [`SecurityPolicy::None`]
    pub fn signature_algorithm(self) -> Option<SignatureAlgorithm> {
        self.params().signature
    }

    /// `None` only for [`SecurityPolicy::None`]
    pub fn encryption_algorithm(self) -> Option<EncryptionAlgorithm> {
        self.params().encryption
    }

    /// Length of the signature appended to each chunk
    pub fn signature_len(self) -> usize {
        self.signature_algorithm().map_or(0, SignatureAlgorithm::output_len)
    }

    pub fn signing_key_len(self) -> usize {
        self.params().signing_key_len
    }

    pub fn encryption_key_len(self) -> usize {
        self.encryption_algorithm().map_or(0, EncryptionAlgorithm::key_len)
    }

    pub fn block_size(self) -> usize {
        self.encryption_algorithm().map_or(0, EncryptionAlgorithm::block_size)
    }

    /// The IV is one cipher block
    pub fn iv_len(self) -> usize {
        self.block_size()
    }

    /// Minimum secure-channel nonce length
    pub fn nonce_len(self) -> usize {
        self.params().nonce_len
    }

    /// Accepted asymmetric key size range in bits, `(min, max)`
    pub fn asymmetric_key_bits(self) -> (usize, usize) {
        self.params().asymmetric_key_bits
    }

    /// Total PRF output consumed by one [`DerivedKeySet`](crate::DerivedKeySet)
    pub fn derived_key_len(self) -> usize {
        self.signing_key_len() + self.encryption_key_len() + self.iv_len()
    }

    /// Fresh random nonce of [`nonce_len`](Self::nonce_len) bytes.
    pub fn generate_nonce(self) -> Vec<u8> {
        let mut nonce = vec![0u8; self.nonce_len()];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

impl FromStr for SecurityPolicy {
    type Err = UascError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}
