use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown key id: {0}")]
    UnknownKeyId(String),

    #[error("invalid key material for '{key_id}': {source}")]
    InvalidKey {
        key_id: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Maps a key identifier (`kid`) to a verification key.
///
/// Implementations may hit the network; the call runs inside the request
/// future, so a timeout or client disconnect drops it.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, key_id: &str) -> Result<DecodingKey, ResolveError>;
}

/// In-memory resolver built once at startup.
#[derive(Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<String, DecodingKey>,
}

impl fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_struct("StaticKeyResolver")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key_id: impl Into<String>, key: DecodingKey) -> Self {
        self.keys.insert(key_id.into(), key);
        self
    }

    pub fn with_hmac_secret(self, key_id: impl Into<String>, secret: &[u8]) -> Self {
        self.with_key(key_id, DecodingKey::from_secret(secret))
    }

    /// `pem` must be an Ed25519 public key (SPKI PEM).
    pub fn with_ed_pem(self, key_id: impl Into<String>, pem: &str) -> Result<Self, ResolveError> {
        let key_id = key_id.into();
        let key = DecodingKey::from_ed_pem(pem.as_bytes()).map_err(|source| {
            ResolveError::InvalidKey {
                key_id: key_id.clone(),
                source,
            }
        })?;
        Ok(self.with_key(key_id, key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, key_id: &str) -> Result<DecodingKey, ResolveError> {
        self.keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownKeyId(key_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_registered_ids_only() {
        let resolver = StaticKeyResolver::new().with_hmac_secret("k1", b"secret");

        assert!(resolver.resolve("k1").await.is_ok());
        match resolver.resolve("k2").await {
            Err(ResolveError::UnknownKeyId(id)) => assert_eq!(id, "k2"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_bad_pem() {
        let err = StaticKeyResolver::new()
            .with_ed_pem("ed", "not a pem")
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidKey { ref key_id, .. } if key_id == "ed"));
    }

    #[test]
    fn debug_does_not_print_keys() {
        let resolver = StaticKeyResolver::new().with_hmac_secret("k1", b"super-secret");
        let out = format!("{resolver:?}");
        assert!(out.contains("k1"));
        assert!(!out.contains("super-secret"));
    }
}
