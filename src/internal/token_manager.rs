use std::sync::Arc;

use time::OffsetDateTime;

use crate::AccessToken;
use crate::config::AuthOptions;
use crate::error::{AuthError, NoRefreshTokenSnafu};
use crate::event::{AuthEvent, EventBus};
use crate::internal::credential_store::CredentialStore;
use crate::request;
use crate::response::TokenPayload;
use crate::time_ext::StdDurationExt;
use crate::token::{self, Credential};

/// Hands out access tokens, refreshing them shortly before they expire.
///
/// Concurrent callers hitting the refresh window each issue their own refresh request.
/// The last response to arrive wins in storage.
#[derive(Debug, Clone)]
pub struct TokenManager {
    options: Arc<AuthOptions>,
    credentials: CredentialStore,
    http: reqwest::Client,
    events: EventBus,
}

impl TokenManager {
    pub(crate) fn new(
        options: Arc<AuthOptions>,
        credentials: CredentialStore,
        http: reqwest::Client,
        events: EventBus,
    ) -> Self {
        Self {
            options,
            credentials,
            http,
            events,
        }
    }

    /// A usable access token, or `None` if the user has to log in (again).
    ///
    /// Tokens within `refresh_skew` of their expiry are refreshed first. A failed refresh is
    /// reported as `Ok(None)`. Only failures to read the stored credential are returned as errors.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        let Some(credential) = self.credentials.load_credential()? else {
            tracing::trace!("No access token stored");
            return Ok(None);
        };

        let skew = self.options.advanced.refresh_skew.to_time_duration();
        if !credential.nearly_expired(OffsetDateTime::now_utc(), skew) {
            return Ok(Some(credential.access_token));
        }

        tracing::debug!(
            expires_at = %credential.expires_at,
            "Access token expires soon. Refreshing."
        );
        match self.refresh_token().await {
            Ok(payload) => Ok(Some(payload.access_token)),
            Err(err) => {
                tracing::info!(?err, "Token refresh failed. Re-authentication required.");
                Ok(None)
            }
        }
    }

    /// Trade the stored refresh token for a new access token and persist the result.
    pub async fn refresh_token(&self) -> Result<TokenPayload, AuthError> {
        let result = self.try_refresh_token().await;
        match &result {
            Ok(payload) => self.events.emit(AuthEvent::TokenRefreshed {
                expires_in: payload.expires_in,
            }),
            Err(err) => self.events.emit(AuthEvent::RefreshFailed {
                message: err.to_string(),
            }),
        }
        result
    }

    async fn try_refresh_token(&self) -> Result<TokenPayload, AuthError> {
        let refresh_token = self
            .credentials
            .refresh_token()?
            .ok_or_else(|| NoRefreshTokenSnafu.build())?;

        let payload = request::refresh_token(
            &self.http,
            &self.options.token_endpoint,
            self.options.client_id.trim(),
            &refresh_token,
        )
        .await
        .map_err(|err| AuthError::from_token_request(err, "Failed to refresh token"))?;

        self.store_payload(&payload)?;
        tracing::info!(expires_in = payload.expires_in, "Refreshed access token");
        Ok(payload)
    }

    /// Whether a stored access token has not yet expired. No skew, no network.
    pub fn is_authenticated(&self) -> bool {
        match self.credentials.load_credential() {
            Ok(Some(credential)) => credential.is_valid_at(OffsetDateTime::now_utc()),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(?err, "Could not read stored credential");
                false
            }
        }
    }

    /// Forget all tokens. Idempotent.
    pub fn logout(&self) {
        self.credentials.clear_tokens();
        tracing::info!("Logged out");
        self.events.emit(AuthEvent::LoggedOut);
    }

    /// Remaining lifetime of the stored access token as `MM:SS`, `00:00` without one.
    pub fn token_time_remaining(&self) -> String {
        let remaining = match self.credentials.load_credential() {
            Ok(Some(credential)) => credential.time_left(OffsetDateTime::now_utc()),
            Ok(None) => time::Duration::ZERO,
            Err(err) => {
                tracing::warn!(?err, "Could not read stored credential");
                time::Duration::ZERO
            }
        };
        token::format_time_remaining(remaining)
    }

    pub(crate) fn store_payload(&self, payload: &TokenPayload) -> Result<Credential, AuthError> {
        self.credentials
            .save_tokens(payload, OffsetDateTime::now_utc())
    }
}
