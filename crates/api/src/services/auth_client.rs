//! Session validation against the auth service.

use std::time::Duration;

use domain::error::AccountError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::warn;

use crate::config::ServicesConfig;

/// Maps a session token to the user it belongs to.
#[async_trait::async_trait]
pub trait SessionValidator: Send + Sync {
    /// `Ok(None)` when the token is unknown or expired.
    async fn user_id_for_token(&self, token: &str) -> Result<Option<i64>, AccountError>;
}

#[derive(Debug, Deserialize)]
struct TokenOwner {
    uid: i64,
}

/// [`SessionValidator`] backed by `GET /api/internal/auth/by-token/{token}`.
#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpAuthClient {
    pub fn new(config: &ServicesConfig, secret: impl Into<String>) -> Result<Self, AccountError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AccountError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.auth_address.trim_end_matches('/').to_string(),
            secret: secret.into(),
        })
    }

    fn url(&self, token: &str) -> String {
        format!("{}/api/internal/auth/by-token/{}", self.base_url, token)
    }
}

#[async_trait::async_trait]
impl SessionValidator for HttpAuthClient {
    async fn user_id_for_token(&self, token: &str) -> Result<Option<i64>, AccountError> {
        let response = self
            .client
            .get(self.url(token))
            .header("Authorization", &self.secret)
            .send()
            .await
            .map_err(|e| AccountError::Upstream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let owner = response
                    .json::<TokenOwner>()
                    .await
                    .map_err(|e| AccountError::Upstream(format!("invalid auth payload: {}", e)))?;
                Ok(Some(owner.uid))
            }
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Ok(None),
            status => {
                warn!(status = %status, "Session validation failed");
                Err(AccountError::Upstream(format!(
                    "auth service returned {}",
                    status
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let config = ServicesConfig {
            account_address: "http://account".to_string(),
            auth_address: "http://auth:8080/".to_string(),
            timeout_secs: 1,
        };
        let client = HttpAuthClient::new(&config, "secret").unwrap();
        assert_eq!(
            client.url("abc"),
            "http://auth:8080/api/internal/auth/by-token/abc"
        );
    }

    #[test]
    fn test_token_owner_payload() {
        let owner: TokenOwner = serde_json::from_str(r#"{"uid": 42}"#).unwrap();
        assert_eq!(owner.uid, 42);
    }
}
