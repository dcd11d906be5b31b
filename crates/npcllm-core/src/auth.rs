//! Shared-secret authentication.
//!
//! The gate is constructed once at startup with the configured secret and is
//! immutable afterwards. Transport adapters extract the caller's credential
//! and ask the gate for a decision.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying the caller's API key.
pub const API_KEY_QUERY: &str = "api_key";

/// Authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing API key")]
    Missing,
    #[error("Invalid API key")]
    Mismatch,
}

/// Compares caller credentials against an optional configured secret.
#[derive(Clone, Default)]
pub struct ApiKeyGate {
    secret: Option<Arc<str>>,
}

impl ApiKeyGate {
    /// Create a gate. `None` or an empty secret disables authentication.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    /// A gate that allows every request.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Decide whether a credential is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when a secret is configured and the credential is
    /// absent or does not match exactly.
    pub fn check(&self, credential: Option<&str>) -> Result<(), AuthError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        match credential {
            None => Err(AuthError::Missing),
            Some(given) if given == secret => Ok(()),
            Some(_) => Err(AuthError::Mismatch),
        }
    }

    /// Pick the credential to check: a non-empty header wins over the query
    /// parameter.
    #[must_use]
    pub fn select_credential<'a>(header: Option<&'a str>, query: Option<&'a str>) -> Option<&'a str> {
        header
            .filter(|h| !h.is_empty())
            .or_else(|| query.filter(|q| !q.is_empty()))
    }
}

impl fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_gate_allows_everything() {
        let gate = ApiKeyGate::disabled();
        assert!(gate.check(None).is_ok());
        assert!(gate.check(Some("anything")).is_ok());
    }

    #[test]
    fn empty_secret_disables_auth() {
        let gate = ApiKeyGate::new(Some(String::new()));
        assert!(!gate.is_enabled());
        assert!(gate.check(None).is_ok());
    }

    #[test]
    fn enabled_gate_requires_exact_match() {
        let gate = ApiKeyGate::new(Some("s3cret".into()));
        assert_eq!(gate.check(None), Err(AuthError::Missing));
        assert_eq!(gate.check(Some("S3CRET")), Err(AuthError::Mismatch));
        assert_eq!(gate.check(Some("s3cret ")), Err(AuthError::Mismatch));
        assert!(gate.check(Some("s3cret")).is_ok());
    }

    #[test]
    fn header_takes_precedence() {
        assert_eq!(ApiKeyGate::select_credential(Some("h"), Some("q")), Some("h"));
        assert_eq!(ApiKeyGate::select_credential(None, Some("q")), Some("q"));
        assert_eq!(ApiKeyGate::select_credential(Some(""), Some("q")), Some("q"));
        assert_eq!(ApiKeyGate::select_credential(None, None), None);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let gate = ApiKeyGate::new(Some("s3cret".into()));
        let rendered = format!("{gate:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("enabled: true"));
    }
}
