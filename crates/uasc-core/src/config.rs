use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{UascError, UascResult};
use crate::types::MessageSecurityMode;

/// URI of the policy that applies no protection at all
pub const SECURITY_POLICY_NONE_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

/// Top-level configuration (loaded from uasc.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UascConfig {
    pub channel: ChannelConfig,
}

impl UascConfig {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> UascResult<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config: UascConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        config.channel.validate()?;
        Ok(config)
    }
}

/// Secure channel parameters agreed with the peer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Security policy URI or short name (default: None)
    pub security_policy: String,
    /// Chunk protection mode (default: None)
    pub security_mode: MessageSecurityMode,
    /// Requested security token lifetime in milliseconds (default: 1 hour)
    pub token_lifetime_ms: u64,
    /// Fraction of the lifetime after which keys are renewed (default: 0.75)
    pub renew_after_fraction: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            security_policy: SECURITY_POLICY_NONE_URI.into(),
            security_mode: MessageSecurityMode::None,
            token_lifetime_ms: 3_600_000,
            renew_after_fraction: 0.75,
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> UascResult<()> {
        if self.token_lifetime_ms == 0 {
            return Err(UascError::Config("token_lifetime_ms must be positive".into()));
        }
        if !(self.renew_after_fraction > 0.0 && self.renew_after_fraction <= 1.0) {
            return Err(UascError::Config(format!(
                "renew_after_fraction must be in (0, 1], got {}",
                self.renew_after_fraction
            )));
        }
        Ok(())
    }

    /// Milliseconds after token issue at which a new key set should be derived
    pub fn renewal_due_ms(&self) -> u64 {
        (self.token_lifetime_ms as f64 * self.renew_after_fraction) as u64
    }
}
