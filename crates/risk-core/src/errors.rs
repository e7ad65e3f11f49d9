use thiserror::Error;

/// Typed error hierarchy for the risk data layer.
///
/// Library-internal errors use specific variants; application code wraps with
/// `anyhow::Context` for propagation. The type is `Clone` so one failed fetch
/// can be handed to every caller that was coalesced onto it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskDataError {
    // -- Transport ----------------------------------------------------------
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("invalid endpoint URL: {reason}")]
    InvalidUrl { reason: String },

    // -- Admin --------------------------------------------------------------
    /// `detail` is the server's message, meant to be shown to the operator as-is.
    #[error("{detail}")]
    Admin { status: u16, detail: String },

    #[error("admin password is not configured")]
    AdminPasswordMissing,

    // -- Input validation ---------------------------------------------------
    #[error("invalid borrower address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl RiskDataError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } | Self::Admin { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. }
                | Self::InvalidUrl { .. }
                | Self::AdminPasswordMissing
                | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_displays_detail_verbatim() {
        let err = RiskDataError::Admin {
            status: 401,
            detail: "Invalid admin password".into(),
        };
        assert_eq!(err.to_string(), "Invalid admin password");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_local_errors() {
        let err = RiskDataError::InvalidAddress {
            input: "0x12".into(),
            reason: "too short".into(),
        };
        assert!(err.is_local());
        assert_eq!(err.status(), None);

        let err = RiskDataError::Transport {
            url: "http://localhost/api".into(),
            reason: "connection refused".into(),
        };
        assert!(!err.is_local());
    }
}
