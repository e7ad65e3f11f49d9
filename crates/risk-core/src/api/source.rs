use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{trace, warn};

use crate::errors::RiskDataError;

/// Anything that can answer a GET with a JSON document.
///
/// The data service only ever talks to this trait, so tests can script
/// responses without a server.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &Url) -> Result<Value, RiskDataError>;
}

/// [`JsonSource`] over HTTP.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, RiskDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RiskDataError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl JsonSource for HttpSource {
    async fn get_json(&self, url: &Url) -> Result<Value, RiskDataError> {
        trace!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RiskDataError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "upstream returned error status");
            return Err(RiskDataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| RiskDataError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}
