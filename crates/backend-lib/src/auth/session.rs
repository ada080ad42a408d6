// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Opaque session tokens: issuance, validation, refresh rotation.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use eventhub_common::TokenPair;
use metrics::{counter, gauge};
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Token size in bytes (32 bytes = 256 bits of entropy)
const TOKEN_BYTES: usize = 32;

/// Interval between cleanup sweeps of expired sessions
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Which half of a token pair a session entry backs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Session information
#[derive(Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl Session {
    fn is_live(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }
}

/// Session manager for handling authentication tokens
#[derive(Clone)]
pub struct SessionManager {
    access_ttl: Duration,
    refresh_ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        SessionManager {
            access_ttl,
            refresh_ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue a fresh access/refresh pair for a user
    pub async fn issue_pair(&self, user_id: Uuid) -> TokenPair {
        let now = SystemTime::now();
        let access = generate_secure_token();
        let refresh = generate_secure_token();

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            access.clone(),
            Session {
                user_id,
                kind: TokenKind::Access,
                created_at: now,
                expires_at: now + self.access_ttl,
            },
        );
        sessions.insert(
            refresh.clone(),
            Session {
                user_id,
                kind: TokenKind::Refresh,
                created_at: now,
                expires_at: now + self.refresh_ttl,
            },
        );

        counter!("session.issued").increment(1);
        gauge!("session.active").set(sessions.len() as f64);

        TokenPair { access, refresh }
    }

    /// Resolve a live access token to its session
    pub async fn authenticate(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| s.kind == TokenKind::Access && s.is_live(SystemTime::now()))
            .cloned()
    }

    /// Exchange a live refresh token for a new pair, revoking the old
    /// refresh token (rotation)
    pub async fn refresh(&self, refresh_token: &str) -> Option<TokenPair> {
        let user_id = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get(refresh_token)
                .filter(|s| s.kind == TokenKind::Refresh && s.is_live(SystemTime::now()))
                .cloned()?;
            sessions.remove(refresh_token);
            session.user_id
        };
        Some(self.issue_pair(user_id).await)
    }

    /// Remove expired sessions
    pub async fn purge_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let now = SystemTime::now();
        let before_count = sessions.len();

        sessions.retain(|_, session| session.is_live(now));

        let removed = before_count - sessions.len();
        if removed > 0 {
            counter!("session.expired").increment(removed as u64);
            gauge!("session.active").set(sessions.len() as f64);
        }
    }

    /// Spawn the periodic cleanup task. Expired entries are also
    /// filtered lazily on lookup, so this only bounds memory.
    pub fn spawn_cleanup(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                manager.purge_expired().await;
            }
        });
    }
}

/// Generate a cryptographically secure random token using OS entropy,
/// encoded base64 URL-safe without padding
fn generate_secure_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
