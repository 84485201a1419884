//! Current/previous key epochs for renewal rollover
//!
//! After a renewal the peer may still have chunks in flight that were sealed
//! under the old token. The ring keeps exactly one previous epoch around until
//! the caller retires it.

use uasc_core::{UascError, UascResult};

use crate::derive::ChannelKeys;

#[derive(Debug)]
struct Epoch {
    token_id: u32,
    keys: ChannelKeys,
}

/// Key sets of the current and (briefly) the previous security token.
#[derive(Debug)]
pub struct KeyRing {
    current: Epoch,
    previous: Option<Epoch>,
}

impl KeyRing {
    pub fn new(token_id: u32, keys: ChannelKeys) -> Self {
        Self {
            current: Epoch { token_id, keys },
            previous: None,
        }
    }

    /// Install the keys of a renewed token; the current epoch becomes the previous one.
    pub fn renew(&mut self, token_id: u32, keys: ChannelKeys) -> UascResult<()> {
        if token_id == self.current.token_id
            || self.previous.as_ref().is_some_and(|p| p.token_id == token_id)
        {
            return Err(UascError::InvalidKeyMaterial(format!(
                "security token {token_id} is already in use"
            )));
        }

        let demoted = std::mem::replace(&mut self.current, Epoch { token_id, keys });
        tracing::debug!(
            old_token = demoted.token_id,
            new_token = token_id,
            "renewed channel keys"
        );
        self.previous = Some(demoted);
        Ok(())
    }

    pub fn current_token_id(&self) -> u32 {
        self.current.token_id
    }

    /// Keys for sealing outgoing chunks: always the newest epoch
    pub fn current(&self) -> &ChannelKeys {
        &self.current.keys
    }

    pub fn previous_token_id(&self) -> Option<u32> {
        self.previous.as_ref().map(|p| p.token_id)
    }

    /// Keys for opening an incoming chunk stamped with `token_id`.
    pub fn keys_for(&self, token_id: u32) -> UascResult<&ChannelKeys> {
        if self.current.token_id == token_id {
            return Ok(&self.current.keys);
        }
        match &self.previous {
            Some(previous) if previous.token_id == token_id => Ok(&previous.keys),
            _ => Err(UascError::UnknownToken(token_id)),
        }
    }

    /// End the grace period; the previous key sets are dropped and zeroized.
    pub fn retire_previous(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::debug!(token = previous.token_id, "retired previous channel keys");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SecurityPolicy;

    fn keys(secret: u8) -> ChannelKeys {
        ChannelKeys::derive(SecurityPolicy::Basic256Sha256, &[secret; 32], &[1; 32], &[2; 32])
            .unwrap()
    }

    #[test]
    fn test_rollover() {
        let mut ring = KeyRing::new(1, keys(10));
        assert_eq!(ring.current_token_id(), 1);
        assert!(ring.previous_token_id().is_none());

        ring.renew(2, keys(20)).unwrap();
        assert_eq!(ring.current_token_id(), 2);
        assert_eq!(ring.previous_token_id(), Some(1));

        let old = ring.keys_for(1).unwrap();
        let new = ring.keys_for(2).unwrap();
        assert_ne!(old.sending().signing_key(), new.sending().signing_key());
        assert_eq!(
            ring.current().sending().signing_key(),
            keys(20).sending().signing_key()
        );
    }

    #[test]
    fn test_only_one_previous_kept() {
        let mut ring = KeyRing::new(1, keys(10));
        ring.renew(2, keys(20)).unwrap();
        ring.renew(3, keys(30)).unwrap();

        assert!(matches!(ring.keys_for(1), Err(UascError::UnknownToken(1))));
        assert!(ring.keys_for(2).is_ok());
        assert!(ring.keys_for(3).is_ok());
    }

    #[test]
    fn test_retire_previous() {
        let mut ring = KeyRing::new(7, keys(10));
        ring.renew(8, keys(20)).unwrap();
        ring.retire_previous();

        assert!(matches!(ring.keys_for(7), Err(UascError::UnknownToken(7))));
        assert!(ring.keys_for(8).is_ok());
        ring.retire_previous();
    }

    #[test]
    fn test_reused_token_rejected() {
        let mut ring = KeyRing::new(1, keys(10));
        assert!(matches!(ring.renew(1, keys(20)), Err(UascError::InvalidKeyMaterial(_))));

        ring.renew(2, keys(20)).unwrap();
        assert!(matches!(ring.renew(1, keys(30)), Err(UascError::InvalidKeyMaterial(_))));
        assert_eq!(ring.current_token_id(), 2);
    }
}
