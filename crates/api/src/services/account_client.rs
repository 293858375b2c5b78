//! HTTP client for the account service.

use std::time::Duration;

use domain::error::AccountError;
use domain::models::Account;
use domain::services::AccountClient;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use tracing::warn;

use crate::config::ServicesConfig;

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
}

/// [`AccountClient`] over the account service's internal API.
///
/// Every request carries the shared secret in `Authorization`.
#[derive(Clone)]
pub struct HttpAccountClient {
    client: Client,
    base_url: Url,
    secret: String,
}

impl HttpAccountClient {
    pub fn new(config: &ServicesConfig, secret: impl Into<String>) -> Result<Self, AccountError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AccountError::Upstream(e.to_string()))?;

        let base_url = Url::parse(&config.account_address).map_err(|e| {
            AccountError::Upstream(format!(
                "invalid account address {}: {}",
                config.account_address, e
            ))
        })?;

        Ok(Self {
            client,
            base_url,
            secret: secret.into(),
        })
    }

    /// Endpoint under `/api/internal/account/`. Each segment is
    /// percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url, AccountError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AccountError::Upstream(format!(
                    "account address cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "internal", "account"])
            .extend(segments);
        Ok(url)
    }

    async fn decode(response: Response) -> Result<Account, AccountError> {
        response
            .json::<Account>()
            .await
            .map_err(|e| AccountError::Upstream(format!("invalid account payload: {}", e)))
    }
}

fn upstream(err: reqwest::Error) -> AccountError {
    AccountError::Upstream(err.to_string())
}

#[async_trait::async_trait]
impl AccountClient for HttpAccountClient {
    async fn user_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let response = self
            .client
            .get(self.url(&["by-email", email])?)
            .header("Authorization", &self.secret)
            .send()
            .await
            .map_err(upstream)?;

        match response.status() {
            status if status.is_success() => Self::decode(response).await.map(Some),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            status => {
                warn!(status = %status, "Account lookup by email failed");
                Err(AccountError::Upstream(format!(
                    "account service returned {}",
                    status
                )))
            }
        }
    }

    async fn user_by_id(&self, user_id: i64) -> Result<Account, AccountError> {
        let id = user_id.to_string();
        let response = self
            .client
            .get(self.url(&["by-user", id.as_str()])?)
            .header("Authorization", &self.secret)
            .send()
            .await
            .map_err(upstream)?;

        match response.status() {
            status if status.is_success() => Self::decode(response).await,
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                Err(AccountError::NotFound(user_id.to_string()))
            }
            status => Err(AccountError::Upstream(format!(
                "account service returned {}",
                status
            ))),
        }
    }

    async fn create_user(&self, email: &str) -> Result<Account, AccountError> {
        let response = self
            .client
            .post(self.url(&["advance"])?)
            .header("Authorization", &self.secret)
            .json(&CreateAccountRequest { email })
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Placeholder account creation failed");
            return Err(AccountError::Upstream(format!(
                "account service returned {}",
                status
            )));
        }
        Self::decode(response).await
    }
}
