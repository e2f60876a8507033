//! Authentication session seam.
//!
//! Tool handlers never own authentication state. They reach it through a
//! [`SessionStore`], which stands for the external session/cookie subsystem:
//! "is there a session?", "sign in with these credentials", "sign out".
//! [`InMemorySessionStore`] is the demo backend used by the CLI and the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Authenticated user as exposed by the session subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("CredentialsSignin")]
    CredentialsRejected,

    #[error("Authentication backend error: {0}")]
    Backend(String),
}

/// Capability exposed by the session subsystem.
///
/// Implementations serialize their own mutations; callers assume at most one
/// sign-in or sign-out in flight per end-user session.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    async fn current_session(&self) -> Option<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Optional hint shown to the user after rejected credentials.
    fn credential_hint(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

/// Single-session, process-local store backed by a fixed user list.
#[derive(Debug)]
pub struct InMemorySessionStore {
    users: Vec<StoredUser>,
    session: RwLock<Option<Session>>,
    hint: Option<String>,
}

pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_PASSWORD: &str = "password123";
const MIN_PASSWORD_LEN: usize = 8;

/// Whole-string address: one `@`, dot-separated non-empty domain labels.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

impl InMemorySessionStore {
    pub fn empty() -> Self {
        Self {
            users: Vec::new(),
            session: RwLock::new(None),
            hint: None,
        }
    }

    /// Store with the one mock account used by the demo.
    pub fn demo() -> Self {
        Self::empty()
            .with_user("1", "Demo User", DEMO_EMAIL, DEMO_PASSWORD)
            .with_hint(format!(
                "For this demo, use: {} / {}",
                DEMO_EMAIL, DEMO_PASSWORD
            ))
    }

    pub fn with_user(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.users.push(StoredUser {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Start with an existing session, e.g. restored from a cookie.
    pub fn with_session(self, session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
            ..self
        }
    }

    fn authorize(&self, email: &str, password: &str) -> Option<SessionUser> {
        if !looks_like_email(email) || password.chars().count() < MIN_PASSWORD_LEN {
            return None;
        }
        self.users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(|u| SessionUser {
                id: u.id.clone(),
                name: Some(u.name.clone()),
                email: Some(u.email.clone()),
            })
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self.authorize(email, password).ok_or_else(|| {
            debug!(email = %email, "credentials rejected");
            AuthError::CredentialsRejected
        })?;
        let session = Session {
            user,
            signed_in_at: Utc::now(),
        };
        *self.session.write().await = Some(session.clone());
        info!(email = %email, "session created");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.session.write().await.take().is_some() {
            info!("session cleared");
        }
        Ok(())
    }

    fn credential_hint(&self) -> Option<String> {
        self.hint.clone()
    }
}

fn looks_like_email(s: &str) -> bool {
    EMAIL_PATTERN.is_match(s)
}
