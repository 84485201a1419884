use serde::{Deserialize, Serialize};

/// Protection applied to every chunk on a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    /// Chunks travel in the clear
    #[default]
    None,
    /// Chunks carry a trailing signature
    Sign,
    /// Chunks are padded, signed, then encrypted after the header
    SignAndEncrypt,
}

impl MessageSecurityMode {
    pub fn signs(self) -> bool {
        !matches!(self, MessageSecurityMode::None)
    }

    pub fn encrypts(self) -> bool {
        matches!(self, MessageSecurityMode::SignAndEncrypt)
    }
}

/// Which end of the channel this endpoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    Client,
    Server,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_protection_levels() {
        assert!(!MessageSecurityMode::None.signs());
        assert!(!MessageSecurityMode::None.encrypts());
        assert!(MessageSecurityMode::Sign.signs());
        assert!(!MessageSecurityMode::Sign.encrypts());
        assert!(MessageSecurityMode::SignAndEncrypt.signs());
        assert!(MessageSecurityMode::SignAndEncrypt.encrypts());
    }
}
