//! Session authentication extractors.
//!
//! The session token is read from `Authorization`, either as `Bearer <token>`
//! or bare, and resolved to a user id by the auth service.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAuth {
    pub user_id: i64,
}

/// Session token from the `Authorization` header, if any.
pub fn session_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())?
        .trim();

    let token = match header.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => header,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(*auth);
        }

        let token = session_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let user_id = state
            .auth
            .user_id_for_token(token)
            .await
            .map_err(|e| ApiError::BadGateway(e.to_string()))?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

        let auth = UserAuth { user_id };
        parts.extensions.insert(auth);
        Ok(auth)
    }
}

/// Caller who may or may not be signed in.
///
/// A missing or rejected token yields `None` rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if session_token(parts).is_none() {
            return Ok(OptionalUserAuth(None));
        }

        match UserAuth::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalUserAuth(Some(auth))),
            Err(ApiError::Unauthorized(_)) => Ok(OptionalUserAuth(None)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/group/list");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_session_token_bearer() {
        assert_eq!(session_token(&parts(Some("Bearer abc"))), Some("abc"));
    }

    #[test]
    fn test_session_token_raw() {
        assert_eq!(session_token(&parts(Some("abc"))), Some("abc"));
    }

    #[test]
    fn test_session_token_missing_or_blank() {
        assert_eq!(session_token(&parts(None)), None);
        assert_eq!(session_token(&parts(Some("Bearer "))), None);
        assert_eq!(session_token(&parts(Some("   "))), None);
    }

    #[test]
    fn test_session_token_bearer_without_value() {
        assert_eq!(session_token(&parts(Some("Bearer"))), None);
        assert_eq!(session_token(&parts(Some("Bearer   "))), None);
        assert_eq!(session_token(&parts(Some("Bearer  abc "))), Some("abc"));
        // A raw token that merely starts with the word is kept whole.
        assert_eq!(session_token(&parts(Some("Bearerless"))), Some("Bearerless"));
    }
}
