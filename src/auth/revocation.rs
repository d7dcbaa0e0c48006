// Token revocation (logout blacklist)
//
// Revoked tokens are tracked by SHA-256 digest until their natural expiry. The
// in-memory store is process-local: it is not durable and not shared between
// instances. A clustered deployment needs a shared implementation of
// `TokenRevocationStore` instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::error::AuthError;

/// A token marked invalid before its natural expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Storage for revoked tokens
#[async_trait]
pub trait TokenRevocationStore: Send + Sync {
    /// Revoke a token. Re-adding the same token overwrites the entry.
    async fn add(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RevocationEntry, AuthError>;

    /// Whether the token has been revoked
    async fn is_revoked(&self, token: &str) -> Result<bool, AuthError>;

    /// Remove entries whose token has already expired
    async fn prune_expired(&self) -> Result<(), AuthError>;
}

/// Hash a token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Process-local revocation store backed by a lock-guarded map
#[derive(Debug, Default, Clone)]
pub struct InMemoryRevocationStore {
    entries: Arc<RwLock<HashMap<String, RevocationEntry>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired ones not yet pruned
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove entries expired as of `now`, returning how many were dropped
    pub async fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl TokenRevocationStore for InMemoryRevocationStore {
    async fn add(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RevocationEntry, AuthError> {
        let entry = RevocationEntry {
            token_hash: hash_token(token),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };

        self.entries
            .write()
            .await
            .insert(entry.token_hash.clone(), entry.clone());

        debug!("Token revoked for user_id={} until {}", user_id, expires_at);
        Ok(entry)
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        let token_hash = hash_token(token);
        Ok(self.entries.read().await.contains_key(&token_hash))
    }

    async fn prune_expired(&self) -> Result<(), AuthError> {
        let removed = self.prune_expired_at(Utc::now()).await;
        if removed > 0 {
            info!("Pruned {} expired revocation entries", removed);
        }
        Ok(())
    }
}

/// Spawn a background task that prunes the store on a fixed interval
pub fn spawn_pruning_task(
    store: Arc<dyn TokenRevocationStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = store.prune_expired().await {
                error!("Failed to prune revocation store: {}", e);
            }
        }
    })
}
