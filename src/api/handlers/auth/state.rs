//! Auth state, configuration, and the one-time verification code store.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_VERIFY_CODE_TTL_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_url: String,
    session_ttl_seconds: i64,
    verify_code_ttl_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_url: String) -> Self {
        Self {
            frontend_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            verify_code_ttl_seconds: DEFAULT_VERIFY_CODE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verify_code_ttl_seconds(mut self, seconds: u64) -> Self {
        self.verify_code_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    fn verify_code_ttl(&self) -> Duration {
        Duration::from_secs(self.verify_code_ttl_seconds)
    }

    /// Cookies are only marked `Secure` when the frontend is served over
    /// HTTPS.
    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

struct CodeEntry {
    code: String,
    created_at: Instant,
}

/// One-time verification codes, keyed by the challenge cookie id.
pub struct VerifyCodeStore {
    ttl: Duration,
    codes: Mutex<HashMap<Uuid, CodeEntry>>,
}

impl VerifyCodeStore {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            codes: Mutex::new(HashMap::new()),
        }
    }

    /// Store a fresh code and return the challenge id for the cookie.
    pub(super) async fn store_code(&self, code: String) -> Uuid {
        let challenge_id = Uuid::new_v4();
        let mut codes = self.codes.lock().await;
        codes.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        codes.insert(
            challenge_id,
            CodeEntry {
                code,
                created_at: Instant::now(),
            },
        );
        challenge_id
    }

    /// Remove and return the code for a challenge id.
    ///
    /// The entry is gone after the first take: the remove happens under the
    /// store lock, so two concurrent logins cannot both pass with one code.
    pub(super) async fn take_code(&self, challenge_id: Uuid) -> Option<String> {
        let mut codes = self.codes.lock().await;
        match codes.remove(&challenge_id) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.code),
            _ => None,
        }
    }
}

pub struct AuthState {
    config: AuthConfig,
    verify_codes: VerifyCodeStore,
    fallback_hash: String,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, fallback_hash: String) -> Self {
        let verify_codes = VerifyCodeStore::new(config.verify_code_ttl());
        Self {
            config,
            verify_codes,
            fallback_hash,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn verify_codes(&self) -> &VerifyCodeStore {
        &self.verify_codes
    }

    /// Hash verified against when the username is unknown, keeping the work
    /// factor uniform with a wrong password.
    pub(super) fn fallback_hash(&self) -> &str {
        &self.fallback_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://vhr.dev".to_string());

        assert_eq!(config.frontend_url(), "https://vhr.dev");
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );
        assert_eq!(
            config.verify_code_ttl_seconds,
            super::DEFAULT_VERIFY_CODE_TTL_SECONDS
        );
        assert!(config.session_cookie_secure());

        let config = config
            .with_session_ttl_seconds(60)
            .with_verify_code_ttl_seconds(10);

        assert_eq!(config.session_ttl_seconds(), 60);
        assert_eq!(config.verify_code_ttl_seconds, 10);
    }

    #[test]
    fn plain_http_frontend_is_not_secure() {
        let config = AuthConfig::new("http://localhost:8080".to_string());
        assert!(!config.session_cookie_secure());
    }

    #[tokio::test]
    async fn take_code_is_single_use() {
        let store = VerifyCodeStore::new(Duration::from_secs(60));
        let challenge_id = store.store_code("aB3x".to_string()).await;

        assert_eq!(store.take_code(challenge_id).await.as_deref(), Some("aB3x"));
        assert_eq!(store.take_code(challenge_id).await, None);
    }

    #[tokio::test]
    async fn take_code_rejects_unknown_challenge() {
        let store = VerifyCodeStore::new(Duration::from_secs(60));
        assert_eq!(store.take_code(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn take_code_rejects_expired_entries() {
        let store = VerifyCodeStore::new(Duration::ZERO);
        let challenge_id = store.store_code("aB3x".to_string()).await;
        assert_eq!(store.take_code(challenge_id).await, None);
    }

    #[test]
    fn auth_state_exposes_fallback_hash() {
        let config = AuthConfig::new("http://localhost:8080".to_string());
        let state = AuthState::new(config, "$2b$04$fallback".to_string());
        assert_eq!(state.fallback_hash(), "$2b$04$fallback");
    }
}
