//! Admin session: login, logout and the gate in front of the admin workflow.

pub mod store;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result, LOGIN_UNREACHABLE};
use crate::modules::books::BookService;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionToken};

/// Login form contents.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Proof that an admin token was present when the admin workflow was
/// entered. Threaded explicitly through every authenticated call.
#[derive(Debug, Clone)]
pub struct SessionContext {
    token: SessionToken,
}

impl SessionContext {
    pub fn new(token: SessionToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}

/// Authenticates against the book service and owns the token lifecycle.
///
/// Presence of a stored token is the only authorization signal: nothing is
/// checked against the server until a protected call is rejected.
pub struct AdminSession {
    service: Arc<dyn BookService>,
    store: Arc<dyn SessionStore>,
}

impl AdminSession {
    pub fn new(service: Arc<dyn BookService>, store: Arc<dyn SessionStore>) -> Self {
        Self { service, store }
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// A transport failure is reported as an auth error with a generic
    /// retry message so the login form always has something to show.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        let credentials = Credentials::new(username, password);

        let token = match self.service.login(&credentials).await {
            Ok(token) => token,
            Err(Error::Network { message }) => {
                tracing::warn!(username, error = %message, "login request failed");
                return Err(Error::auth(LOGIN_UNREACHABLE));
            }
            Err(e) => {
                tracing::warn!(username, error = %e, "login rejected");
                return Err(e);
            }
        };

        self.store.save(&token)?;
        tracing::info!(username, "admin login succeeded");
        Ok(token)
    }

    pub fn is_authenticated(&self) -> bool {
        match self.store.load() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read session token");
                false
            }
        }
    }

    /// Forget the token locally. The service is not told.
    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("admin logged out");
        Ok(())
    }

    /// Gate for the admin workflow. Fails with an auth error asking the
    /// caller to log in when no token is stored.
    pub fn require_admin(&self) -> Result<SessionContext> {
        match self.store.load()? {
            Some(token) => Ok(SessionContext::new(token)),
            None => {
                tracing::debug!("admin workflow requested without a session");
                Err(Error::auth("login required"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::{Book, BookDraft, BookId};
    use async_trait::async_trait;

    /// Login-only service double; catalog calls are never made here.
    struct LoginOnly {
        outcome: fn() -> Result<SessionToken>,
    }

    #[async_trait]
    impl BookService for LoginOnly {
        async fn login(&self, _credentials: &Credentials) -> Result<SessionToken> {
            (self.outcome)()
        }

        async fn list_books(&self, _token: Option<&SessionToken>) -> Result<Vec<Book>> {
            unreachable!("not used by session tests")
        }

        async fn create_book(&self, _token: &SessionToken, _draft: &BookDraft) -> Result<Book> {
            unreachable!("not used by session tests")
        }

        async fn update_book(
            &self,
            _token: &SessionToken,
            _id: &BookId,
            _draft: &BookDraft,
        ) -> Result<Book> {
            unreachable!("not used by session tests")
        }

        async fn delete_book(&self, _token: &SessionToken, _id: &BookId) -> Result<()> {
            unreachable!("not used by session tests")
        }
    }

    fn session(outcome: fn() -> Result<SessionToken>) -> AdminSession {
        AdminSession::new(
            Arc::new(LoginOnly { outcome }),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn login_then_logout() {
        let session = session(|| Ok(SessionToken::new("t-1")));
        assert!(!session.is_authenticated());

        let token = session.login("admin", "secret").await.unwrap();
        assert_eq!(token.as_str(), "t-1");
        assert!(session.is_authenticated());
        assert_eq!(session.require_admin().unwrap().token().as_str(), "t-1");

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        session.logout().unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn rejected_login_keeps_server_message() {
        let session = session(|| Err(Error::auth("Invalid credentials")));

        let err = session.login("admin", "wrong").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_service_yields_generic_auth_error() {
        let session = session(|| Err(Error::network("connection refused")));

        let err = session.login("admin", "secret").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.user_message(), LOGIN_UNREACHABLE);
    }

    #[test]
    fn gate_refuses_without_token() {
        let session = session(|| Ok(SessionToken::new("unused")));
        let err = session.require_admin().unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.user_message(), "login required");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
