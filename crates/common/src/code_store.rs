//! Short-lived verification-code store backed by Redis.
//!
//! Email and phone verification codes must survive process restarts and be
//! visible to every instance behind a load balancer, so they live in a shared
//! expiring key-value store rather than a process-local map. A code is
//! created on send, consumed exactly once, and expires within a bounded TTL.

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Default code TTL: 10 minutes.
const DEFAULT_CODE_TTL_SECS: i64 = 10 * 60;

/// What a verification code attests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// Email ownership.
    Email,
    /// Phone ownership.
    Phone,
}

impl CodeKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

/// Redis-backed one-time verification codes.
#[derive(Clone)]
pub struct CodeStore {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl_secs: i64,
}

impl CodeStore {
    /// Create a new code store with the default TTL.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: &str) -> Self {
        Self {
            redis,
            prefix: prefix.to_string(),
            ttl_secs: DEFAULT_CODE_TTL_SECS,
        }
    }

    /// Create a new code store with a custom TTL.
    #[must_use]
    pub fn with_ttl(redis: Arc<RedisClient>, prefix: &str, ttl: Duration) -> Self {
        Self {
            redis,
            prefix: prefix.to_string(),
            ttl_secs: ttl.as_secs() as i64,
        }
    }

    fn key(&self, kind: CodeKind, user_id: &str) -> String {
        format!("{}:code:{}:{}", self.prefix, kind.as_str(), user_id)
    }

    /// Generate, store, and return a fresh 6-digit code for the user.
    ///
    /// Any previous unconsumed code of the same kind is replaced.
    pub async fn issue(&self, kind: CodeKind, user_id: &str) -> AppResult<String> {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));

        self.redis
            .set::<(), _, _>(
                self.key(kind, user_id),
                code.clone(),
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        debug!(user_id = %user_id, kind = kind.as_str(), "Issued verification code");
        Ok(code)
    }

    /// Consume the stored code if it matches.
    ///
    /// Returns `true` on a match. The code is deleted on the successful
    /// attempt, so it cannot be replayed; failed attempts leave it in place
    /// until the TTL lapses.
    pub async fn consume(&self, kind: CodeKind, user_id: &str, code: &str) -> AppResult<bool> {
        let key = self.key(kind, user_id);

        let stored: Option<String> = self
            .redis
            .get(&key)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        match stored {
            Some(stored) if stored == code => {
                let _: Option<String> = self
                    .redis
                    .getdel(&key)
                    .await
                    .map_err(|e| AppError::Redis(e.to_string()))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
