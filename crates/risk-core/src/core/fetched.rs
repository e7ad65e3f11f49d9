use crate::errors::RiskDataError;
use crate::types::FetchState;

/// Outcome of a read that never fails outright.
///
/// Views render `into_data()` in every case; callers that care can tell a
/// genuinely empty resource from one that only looks empty because the
/// fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// From the network, or from a cache entry still within its TTL.
    Fresh(T),
    /// The fetch failed; `data` is the last successful value for the key.
    Stale { data: T, error: RiskDataError },
    /// The fetch failed and nothing was cached.
    Unavailable { error: RiskDataError },
}

impl<T> Fetched<T> {
    pub fn state(&self) -> FetchState {
        match self {
            Self::Fresh(_) => FetchState::Fresh,
            Self::Stale { .. } => FetchState::Stale,
            Self::Unavailable { .. } => FetchState::Unavailable,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Fresh(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Fresh(data) | Self::Stale { data, .. } => Some(data),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RiskDataError> {
        match self {
            Self::Fresh(_) => None,
            Self::Stale { error, .. } | Self::Unavailable { error } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Fresh(data) => Fetched::Fresh(f(data)),
            Self::Stale { data, error } => Fetched::Stale {
                data: f(data),
                error,
            },
            Self::Unavailable { error } => Fetched::Unavailable { error },
        }
    }

    /// Stale data counts as success.
    pub fn into_result(self) -> Result<T, RiskDataError> {
        match self {
            Self::Fresh(data) | Self::Stale { data, .. } => Ok(data),
            Self::Unavailable { error } => Err(error),
        }
    }
}

impl<T: Default> Fetched<T> {
    /// The value to render: empty when the resource is unavailable.
    pub fn into_data(self) -> T {
        match self {
            Self::Fresh(data) | Self::Stale { data, .. } => data,
            Self::Unavailable { .. } => T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> RiskDataError {
        RiskDataError::Transport {
            url: "http://localhost:8080/api/reserves/rpc".into(),
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn test_unavailable_degrades_to_default() {
        let fetched: Fetched<Vec<u32>> = Fetched::Unavailable { error: transport() };
        assert_eq!(fetched.state(), FetchState::Unavailable);
        assert!(fetched.is_degraded());
        assert_eq!(fetched.data(), None);
        assert!(fetched.into_data().is_empty());
    }

    #[test]
    fn test_stale_keeps_data_and_error() {
        let fetched = Fetched::Stale {
            data: vec![1, 2],
            error: transport(),
        };
        assert_eq!(fetched.state(), FetchState::Stale);
        assert!(fetched.error().is_some());

        let mapped = fetched.map(|v| v.len());
        assert_eq!(mapped.data(), Some(&2));
        assert_eq!(mapped.into_result(), Ok(2));
    }

    #[test]
    fn test_fresh() {
        let fetched = Fetched::Fresh("ok");
        assert!(!fetched.is_degraded());
        assert_eq!(fetched.error(), None);
        assert_eq!(fetched.into_data(), "ok");
    }
}
