//! Per-invocation session context.

use crate::app_config::AppConfig;
use crate::CoreError;

/// Credentials and account selection for one CLI invocation.
///
/// Built once from configuration plus command-line overrides and passed by
/// reference to every operation that talks to the social-graph API.
#[derive(Clone)]
pub struct Session {
    access_token: String,
    account_id: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(access_token: impl Into<String>, account_id: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: account_id.filter(|id| !id.trim().is_empty()),
        }
    }

    /// Builds a session from config, letting `account_override` (from
    /// `--account`) win over `IG_ACCOUNT_ID`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingToken`] when no access token is configured.
    pub fn from_config(
        config: &AppConfig,
        account_override: Option<&str>,
    ) -> Result<Self, CoreError> {
        let token = config
            .access_token
            .as_deref()
            .ok_or(CoreError::MissingToken)?;
        let account = account_override
            .map(str::to_owned)
            .or_else(|| config.account_id.clone());
        Ok(Self::new(token, account))
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// The selected account id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingAccount`] when no account has been selected.
    pub fn require_account(&self) -> Result<&str, CoreError> {
        self.account_id().ok_or(CoreError::MissingAccount)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("account_id", &self.account_id)
            .finish()
    }
}
