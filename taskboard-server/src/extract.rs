//! Extractors that turn framework rejections into the API's error shape.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use taskboard_core::{Error, RequestCredentials, User};

use crate::AppState;
use crate::error::ApiError;

/// The authenticated caller. Rejects with 401 when no live session is found.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials_from_headers(&parts.headers, &state.session_cookie);
        match state.authenticator.authenticate(&credentials).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Error::Unauthorized.into()),
        }
    }
}

pub fn credentials_from_headers(headers: &HeaderMap, cookie_name: &str) -> RequestCredentials {
    let bearer_token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_owned())
        });

    let session_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_owned());

    RequestCredentials {
        bearer_token,
        session_cookie,
    }
}

/// JSON request body; malformed input is a 400 on path `body`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// Query string; undecodable input is a 400 on path `query`.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const COOKIE_NAME: &str = "better-auth.session_token";

    #[test]
    fn reads_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        let creds = credentials_from_headers(&headers, COOKIE_NAME);
        assert_eq!(creds.bearer_token.as_deref(), Some("abc123"));
        assert_eq!(creds.session_cookie, None);
    }

    #[test]
    fn ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(credentials_from_headers(&headers, COOKIE_NAME).token(), None);
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("lang=en; better-auth.session_token=tok42; other=1"),
        );
        let creds = credentials_from_headers(&headers, COOKIE_NAME);
        assert_eq!(creds.session_cookie.as_deref(), Some("tok42"));
        assert_eq!(creds.token(), Some("tok42"));
    }
}
