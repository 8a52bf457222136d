//! Business-account discovery for the current token.

use postlens_core::Account;

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::types::{DebugTokenResponse, UsernameNode};

const INSIGHTS_SCOPE: &str = "instagram_manage_insights";
const UNKNOWN_USERNAME: &str = "Unknown";

impl GraphClient {
    /// Username of the account `ig_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on HTTP failure or an API error envelope.
    pub async fn fetch_username(&self, ig_id: &str) -> Result<Option<String>, GraphError> {
        let url = self.build_url(&self.version, ig_id, &[("fields", "id,username")])?;
        let node: UsernameNode = self.get_json(&url, "username lookup").await?;
        Ok(node.username.filter(|u| !u.is_empty()))
    }

    /// Business accounts this token holds insights permission for.
    ///
    /// Inspects the token with `debug_token` (authenticated with the app
    /// token `APP_ID|APP_SECRET`) and resolves each target id's username.
    /// A failed username lookup yields `"Unknown"` rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoAccounts`] when the token grants no insights
    /// scope targets, or any error from the `debug_token` call.
    pub async fn list_accounts(
        &self,
        user_token: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Result<Vec<Account>, GraphError> {
        let app_token = format!("{app_id}|{app_secret}");
        let url = self.build_url_with_token(
            &self.version,
            "debug_token",
            &app_token,
            &[("input_token", user_token)],
        )?;
        let debug: DebugTokenResponse = self.get_json(&url, "debug_token").await?;

        let mut ids: Vec<String> = Vec::new();
        for scope in debug
            .data
            .granular_scopes
            .into_iter()
            .filter(|s| s.scope == INSIGHTS_SCOPE)
        {
            for id in scope.target_ids {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        if ids.is_empty() {
            return Err(GraphError::NoAccounts);
        }

        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            let username = match self.fetch_username(&id).await {
                Ok(Some(name)) => name,
                Ok(None) => UNKNOWN_USERNAME.to_owned(),
                Err(e) => {
                    tracing::warn!(account_id = %id, error = %e, "username lookup failed");
                    UNKNOWN_USERNAME.to_owned()
                }
            };
            accounts.push(Account { id, username });
        }
        tracing::info!(count = accounts.len(), "business accounts found");
        Ok(accounts)
    }
}
