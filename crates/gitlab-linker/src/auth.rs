//! Shared-secret authorization for GitLab webhook deliveries.

use std::collections::HashSet;

use axum::http::HeaderMap;

use crate::error::LinkerError;

/// Header GitLab uses to send the secret token configured on the webhook.
pub const GITLAB_TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Accepted `X-Gitlab-Token` values.
///
/// An empty set leaves the endpoint open to any caller.
#[derive(Debug, Clone, Default)]
pub struct GitlabTokens(HashSet<String>);

impl GitlabTokens {
    /// Build the allow-set, dropping empty values.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            tokens
                .into_iter()
                .map(Into::into)
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Whether any token is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    /// Number of configured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no token is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decide access for a presented token (exact, case-sensitive match).
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), LinkerError> {
        if !self.is_enabled() {
            return Ok(());
        }
        match presented {
            Some(token) if self.0.contains(token) => Ok(()),
            _ => Err(LinkerError::Unauthorized),
        }
    }

    /// Decide access for a request from its headers.
    pub fn authorize_headers(&self, headers: &HeaderMap) -> Result<(), LinkerError> {
        let presented = headers
            .get(GITLAB_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        self.authorize(presented)
    }
}
