//! Signed-token issuer
//!
//! Mints ES256 JWTs for the App Store Connect API and caches them until
//! they come within 60 seconds of expiry. Signing is CPU-bound and cheap to
//! skip: a burst of tool calls reuses one token instead of re-signing per
//! request.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::debug;

use crate::config::ConnectConfig;
use crate::error::{ConnectError, Result};

const TOKEN_AUDIENCE: &str = "appstoreconnect-v1";
/// Maximum lifetime Apple accepts for a connect token
const TOKEN_LIFETIME_SECS: i64 = 1200;
/// A token expiring within this margin is treated as already stale, so a
/// slow request never carries a token that dies mid-flight
const RENEWAL_MARGIN_SECS: i64 = 60;

/// Source of the current time, injectable for deterministic tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// JWT claims for App Store Connect API
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    iat: i64,
    exp: i64,
    aud: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches signed App Store Connect tokens
pub struct TokenIssuer {
    config: ConnectConfig,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenIssuer {
    /// Create an issuer using the system clock
    pub fn new(config: ConnectConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an issuer with an injected clock
    pub fn with_clock(config: ConnectConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// The credentials this issuer signs with
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    /// Return a token valid for at least the renewal margin, minting a
    /// fresh one when the cached token is absent or about to expire
    ///
    /// Two concurrent callers observing a stale cache may both sign; the
    /// last writer wins and both tokens are valid, so no lock is held
    /// across the signing itself.
    pub fn issue_token(&self) -> Result<String> {
        let now = self.clock.now();

        if let Some(token) = self.cached_token(now) {
            return Ok(token);
        }

        let expires_at = now + Duration::seconds(TOKEN_LIFETIME_SECS);
        let claims = Claims {
            iss: self.config.issuer_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        let encoding_key =
            EncodingKey::from_ec_pem(self.config.private_key.as_bytes()).map_err(|e| {
                ConnectError::InvalidCredentials(format!("Invalid API key: {}", e))
            })?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());

        let token = encode(&header, &claims, &encoding_key)?;
        debug!(expires_at = %expires_at, "Minted new connect token");

        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        Ok(token)
    }

    /// Standard headers for an authenticated API request
    pub fn auth_headers(&self) -> Result<Vec<(String, String)>> {
        let token = self.issue_token()?;
        Ok(vec![
            ("Authorization".to_string(), format!("Bearer {}", token)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }

    fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.cache.lock().ok()?;
        let cached = guard.as_ref()?;
        if cached.expires_at > now + Duration::seconds(RENEWAL_MARGIN_SECS) {
            Some(cached.token.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TEST_KEY;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FixedClock {
        offset_secs: AtomicI64,
        base: DateTime<Utc>,
    }

    impl FixedClock {
        fn new() -> Self {
            Self {
                offset_secs: AtomicI64::new(0),
                base: Utc::now(),
            }
        }

        fn advance(&self, secs: i64) {
            self.offset_secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + Duration::seconds(self.offset_secs.load(Ordering::SeqCst))
        }
    }

    fn issuer_with_clock() -> (TokenIssuer, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new());
        let config = ConnectConfig::new("issuer-1234", "KEY123", TEST_KEY);
        (TokenIssuer::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_token_is_cached_within_same_second() {
        let (issuer, _clock) = issuer_with_clock();
        let first = issuer.issue_token().unwrap();
        let second = issuer.issue_token().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_reused_until_renewal_margin() {
        let (issuer, clock) = issuer_with_clock();
        let first = issuer.issue_token().unwrap();

        // expiry is now+1200s; at now+1139s the remaining 61s still clears
        // the 60s margin
        clock.advance(TOKEN_LIFETIME_SECS - 61);
        let reused = issuer.issue_token().unwrap();
        assert_eq!(first, reused);
    }

    #[test]
    fn test_token_renewed_inside_margin() {
        let (issuer, clock) = issuer_with_clock();
        let first = issuer.issue_token().unwrap();

        // remaining lifetime drops to 59s, inside the margin
        clock.advance(TOKEN_LIFETIME_SECS - 59);
        let renewed = issuer.issue_token().unwrap();
        assert_ne!(first, renewed);
    }

    #[test]
    fn test_token_renewed_after_expiry() {
        let (issuer, clock) = issuer_with_clock();
        let first = issuer.issue_token().unwrap();
        clock.advance(TOKEN_LIFETIME_SECS + 1);
        let renewed = issuer.issue_token().unwrap();
        assert_ne!(first, renewed);
    }

    #[test]
    fn test_auth_headers_carry_bearer_token() {
        let (issuer, _clock) = issuer_with_clock();
        let headers = issuer.auth_headers().unwrap();
        let auth = headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.clone())
            .unwrap();
        assert!(auth.starts_with("Bearer "));
        assert!(headers
            .iter()
            .any(|(name, value)| name == "Content-Type" && value == "application/json"));
    }

    #[test]
    fn test_malformed_key_is_a_credential_error() {
        let config = ConnectConfig::new("issuer-1234", "KEY123", "not a pem key");
        let issuer = TokenIssuer::new(config);
        assert!(matches!(
            issuer.issue_token(),
            Err(ConnectError::InvalidCredentials(_))
        ));
    }
}
