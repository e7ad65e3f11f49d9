//! Password-gated admin endpoints. Never cached.
//!
//! On failure the server puts an operator-facing message in `detail`; it is
//! surfaced unchanged through [`RiskDataError::Admin`].

use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::{info, warn};

use super::endpoint::join_path;
use crate::errors::RiskDataError;

/// Which data domains `/data/refresh` should reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshRequest {
    pub refresh_reserves: Option<bool>,
    pub refresh_positions: Option<bool>,
    pub refresh_liquidations: Option<bool>,
    pub prices_only: Option<bool>,
    pub chains: Vec<String>,
}

impl RefreshRequest {
    pub fn everything() -> Self {
        Self {
            refresh_reserves: Some(true),
            refresh_positions: Some(true),
            refresh_liquidations: Some(true),
            ..Self::default()
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let flags = [
            ("refresh_reserves", self.refresh_reserves),
            ("refresh_positions", self.refresh_positions),
            ("refresh_liquidations", self.refresh_liquidations),
            ("prices_only", self.prices_only),
        ];
        let mut q: Vec<_> = flags
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v.to_string())))
            .collect();
        if !self.chains.is_empty() {
            q.push(("chains", self.chains.join(",")));
        }
        q
    }
}

pub struct AdminClient {
    client: Client,
    base: Url,
    password: String,
}

impl AdminClient {
    pub fn new(client: Client, base: Url, password: Option<String>) -> Result<Self, RiskDataError> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(RiskDataError::AdminPasswordMissing)?;
        Ok(Self {
            client,
            base,
            password,
        })
    }

    pub async fn clear_cache(&self) -> Result<Value, RiskDataError> {
        self.call(Method::POST, "/admin/cache/clear", &[]).await
    }

    pub async fn settings(&self) -> Result<Value, RiskDataError> {
        self.call(Method::GET, "/admin/settings", &[]).await
    }

    pub async fn refresh_data(&self, request: &RefreshRequest) -> Result<Value, RiskDataError> {
        let result = self.call(Method::POST, "/data/refresh", &request.query()).await?;
        info!(?request, "upstream data refresh requested");
        Ok(result)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        extra: &[(&'static str, String)],
    ) -> Result<Value, RiskDataError> {
        let mut url = join_path(&self.base, path)?;
        // Error messages and logs carry the URL without the password.
        let shown = url.to_string();
        url.query_pairs_mut()
            .append_pair("password", &self.password)
            .extend_pairs(extra.iter().map(|(k, v)| (*k, v.as_str())));

        let resp = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| RiskDataError::Transport {
                url: shown.clone(),
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail = error_detail(&body, status.canonical_reason().unwrap_or("request failed"));
            warn!(url = %shown, status = status.as_u16(), %detail, "admin request failed");
            return Err(RiskDataError::Admin {
                status: status.as_u16(),
                detail,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RiskDataError::Decode {
            url: shown,
            reason: e.to_string(),
        })
    }
}

/// Operator-facing message of a failed admin call: `detail` when present,
/// else the raw body, else `fallback`.
fn error_detail(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ if !body.trim().is_empty() => body.trim().to_string(),
            _ => fallback.to_string(),
        },
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string_is_verbatim() {
        assert_eq!(
            error_detail(r#"{"detail":"Invalid admin password"}"#, "Unauthorized"),
            "Invalid admin password"
        );
    }

    #[test]
    fn test_structured_detail_is_serialized() {
        let detail = error_detail(r#"{"detail":[{"loc":["query","password"],"msg":"field required"}]}"#, "Unprocessable Entity");
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_detail_fallbacks() {
        assert_eq!(error_detail("Bad Gateway from proxy", "Bad Gateway"), "Bad Gateway from proxy");
        assert_eq!(error_detail(r#"{"error":"x"}"#, "Forbidden"), r#"{"error":"x"}"#);
        assert_eq!(error_detail("", "Forbidden"), "Forbidden");
    }

    #[test]
    fn test_refresh_query_only_sends_set_flags() {
        let request = RefreshRequest {
            refresh_positions: Some(true),
            prices_only: Some(false),
            chains: vec!["ethereum".into(), "arbitrum".into()],
            ..RefreshRequest::default()
        };
        assert_eq!(
            request.query(),
            vec![
                ("refresh_positions", "true".to_string()),
                ("prices_only", "false".to_string()),
                ("chains", "ethereum,arbitrum".to_string()),
            ]
        );
        assert_eq!(RefreshRequest::everything().query().len(), 3);
    }

    #[test]
    fn test_missing_password_is_local_error() {
        let base = Url::parse("http://localhost:8080/api").unwrap();
        for password in [None, Some(String::new())] {
            let err = AdminClient::new(Client::new(), base.clone(), password).err();
            assert_eq!(err, Some(RiskDataError::AdminPasswordMissing));
        }
    }
}
