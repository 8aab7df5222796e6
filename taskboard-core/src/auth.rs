//! Who is calling. Services only ever see an owner id; how it was established
//! is behind [`Authenticator`].

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::db::Db;
use crate::error::Result;
use crate::models::{Session, User, new_id, random_token};
use crate::validation::ValidationErrors;

/// Raw credentials lifted off a request, before any lookup.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub bearer_token: Option<String>,
    pub session_cookie: Option<String>,
}

impl RequestCredentials {
    /// Bearer header wins over the cookie when both are present.
    pub fn token(&self) -> Option<&str> {
        self.bearer_token
            .as_deref()
            .or(self.session_cookie.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` means unauthenticated; `Err` is reserved for lookup failures.
    async fn authenticate(&self, credentials: &RequestCredentials) -> Result<Option<User>>;
}

/// Resolves session tokens against the `session` table.
#[derive(Clone)]
pub struct SessionAuthenticator {
    db: Db,
}

impl SessionAuthenticator {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Registers a user and opens a session valid for `ttl`. Stands in for the
    /// provider's sign-up flow in development and tests.
    pub async fn create_user_session(
        &self,
        name: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<(User, Session)> {
        let mut errors = ValidationErrors::new();
        if name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if !email.contains('@') {
            errors.push("email", "Invalid email address");
        }
        errors.finish(())?;

        if self.db.find_user_by_email(email).await?.is_some() {
            return Err(ValidationErrors::single("email", "Email already registered").into());
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| ValidationErrors::single("ttl", "Session lifetime is out of range"))?;
        let user = User {
            id: new_id(),
            name: name.to_owned(),
            email: email.to_owned(),
            email_verified: false,
            image: None,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_user(&user).await?;

        let session = Session {
            id: new_id(),
            user_id: user.id.clone(),
            token: random_token(),
            expires_at,
            ip_address: None,
            user_agent: None,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_session(&session).await?;

        info!(user_id = %user.id, "user registered");
        Ok((user, session))
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    async fn authenticate(&self, credentials: &RequestCredentials) -> Result<Option<User>> {
        let Some(token) = credentials.token() else {
            return Ok(None);
        };
        let user = self.db.find_session_user(token, Utc::now()).await?;
        if user.is_none() {
            debug!("session token rejected");
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> RequestCredentials {
        RequestCredentials {
            bearer_token: Some(token.to_owned()),
            session_cookie: None,
        }
    }

    #[test]
    fn bearer_takes_precedence_over_cookie() {
        let creds = RequestCredentials {
            bearer_token: Some("header".into()),
            session_cookie: Some("cookie".into()),
        };
        assert_eq!(creds.token(), Some("header"));

        let cookie_only = RequestCredentials {
            bearer_token: None,
            session_cookie: Some("cookie".into()),
        };
        assert_eq!(cookie_only.token(), Some("cookie"));
        assert_eq!(RequestCredentials::default().token(), None);
        assert_eq!(bearer("").token(), None);
    }

    #[tokio::test]
    async fn live_session_resolves_to_its_user() {
        let db = Db::open_in_memory().await.unwrap();
        let auth = SessionAuthenticator::new(db);
        let (user, session) = auth
            .create_user_session("Alex Johnson", "alex@example.com", Duration::days(7))
            .await
            .unwrap();

        let found = auth.authenticate(&bearer(&session.token)).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "alex@example.com");

        assert!(auth.authenticate(&bearer("not-a-token")).await.unwrap().is_none());
        assert!(auth.authenticate(&RequestCredentials::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let db = Db::open_in_memory().await.unwrap();
        let auth = SessionAuthenticator::new(db);
        let (_, session) = auth
            .create_user_session("Sam", "sam@example.com", Duration::seconds(-1))
            .await
            .unwrap();

        assert!(auth.authenticate(&bearer(&session.token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let db = Db::open_in_memory().await.unwrap();
        let auth = SessionAuthenticator::new(db);
        auth.create_user_session("A", "dup@example.com", Duration::days(1))
            .await
            .unwrap();

        let err = auth
            .create_user_session("B", "dup@example.com", Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
    }

    #[tokio::test]
    async fn out_of_range_lifetime_is_rejected_without_creating_the_user() {
        let db = Db::open_in_memory().await.unwrap();
        let auth = SessionAuthenticator::new(db.clone());

        let err = auth
            .create_user_session("Max", "max@example.com", Duration::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
        assert!(db.find_user_by_email("max@example.com").await.unwrap().is_none());
    }
}
