use thiserror::Error;

pub type UascResult<T> = Result<T, UascError>;

/// Errors raised by the secure-channel crypto layer.
///
/// Messages never contain key, nonce or plaintext bytes.
#[derive(Debug, Error)]
pub enum UascError {
    #[error("unsupported security policy: {0}")]
    UnsupportedPolicy(String),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("corrupt padding: {0}")]
    CorruptPadding(String),

    #[error("chunk signature verification failed")]
    VerificationFailed,

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    #[error("unknown security token: {0}")]
    UnknownToken(u32),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UascError {
    /// True for failures that indicate tampering on the wire.
    ///
    /// The channel must be closed; retrying is meaningless.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            UascError::CorruptPadding(_)
                | UascError::VerificationFailed
                | UascError::DecryptionFailed(_)
        )
    }
}
