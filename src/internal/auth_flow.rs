use std::sync::Arc;

use url::Url;

use crate::AuthorizationCode;
use crate::config::AuthOptions;
use crate::error::{AuthError, CsrfMismatchSnafu, MissingVerifierSnafu};
use crate::event::{AuthEvent, EventBus};
use crate::internal::credential_store::CredentialStore;
use crate::internal::token_manager::TokenManager;
use crate::login::{AuthorizationRequest, PkceSession};
use crate::navigation::Navigator;
use crate::request;
use crate::response::TokenPayload;

/// Drives the two halves of the authorization code flow: the redirect to the authorization
/// server and the handling of its redirect back to us.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    options: Arc<AuthOptions>,
    credentials: CredentialStore,
    tokens: TokenManager,
    navigator: Arc<dyn Navigator>,
    http: reqwest::Client,
    events: EventBus,
}

impl AuthFlow {
    pub(crate) fn new(
        options: Arc<AuthOptions>,
        credentials: CredentialStore,
        tokens: TokenManager,
        navigator: Arc<dyn Navigator>,
        http: reqwest::Client,
        events: EventBus,
    ) -> Self {
        Self {
            options,
            credentials,
            tokens,
            navigator,
            http,
            events,
        }
    }

    /// Generate and persist a fresh PKCE session, returning the authorization url to visit.
    ///
    /// Any previously stored verifier and state are overwritten. Nothing is persisted when the
    /// client id is not configured.
    pub fn prepare_login(&self) -> Result<Url, AuthError> {
        self.options.validate_client_id()?;

        let session = PkceSession::generate(&self.options)?;
        self.credentials.save_pkce_session(&session)?;

        let url = AuthorizationRequest::new(&self.options, &session)
            .to_url(&self.options.authorization_endpoint);

        tracing::debug!(
            verifier_prefix = prefix(session.code_verifier.code_verifier(), 20),
            state_prefix = prefix(session.state.as_str(), 20),
            "Prepared PKCE session"
        );
        Ok(url)
    }

    /// Start the login by redirecting to the authorization server.
    pub fn login(&self) -> Result<(), AuthError> {
        let url = self.prepare_login()?;
        tracing::info!("Redirecting to the authorization endpoint");
        self.events.emit(AuthEvent::LoginStarted);
        self.navigator.navigate(&url);
        Ok(())
    }

    /// Complete the login with the `code` and `state` the authorization server redirected
    /// back with.
    ///
    /// Verifier and state are consumed once both checks passed, regardless of whether the code
    /// exchange succeeds. A repeated call therefore fails with `MissingVerifier`.
    pub async fn handle_callback(
        &self,
        code: &AuthorizationCode,
        state: &str,
    ) -> Result<TokenPayload, AuthError> {
        let result = self.try_handle_callback(code, state).await;
        match &result {
            Ok(payload) => self.events.emit(AuthEvent::LoggedIn {
                expires_in: payload.expires_in,
            }),
            Err(err) => self.events.emit(AuthEvent::CallbackFailed {
                message: err.to_string(),
            }),
        }
        result
    }

    async fn try_handle_callback(
        &self,
        code: &AuthorizationCode,
        state: &str,
    ) -> Result<TokenPayload, AuthError> {
        let stored = self.credentials.load_pkce_session()?;

        if let Some(stored_state) = &stored.state {
            if !stored_state.matches(state) {
                tracing::warn!("Received state does not match the stored one");
                return CsrfMismatchSnafu.fail();
            }
        }
        let Some(code_verifier) = stored.code_verifier else {
            tracing::warn!("No code verifier stored for this callback");
            return MissingVerifierSnafu.fail();
        };
        if stored.state.is_none() {
            tracing::warn!("Code verifier stored without a state");
            return CsrfMismatchSnafu.fail();
        }

        self.credentials.clear_pkce_session()?;

        let payload = request::exchange_code_for_token(
            &self.http,
            &self.options.token_endpoint,
            self.options.client_id.trim(),
            self.options.redirect_uri.as_str(),
            code,
            code_verifier.code_verifier(),
        )
        .await
        .map_err(|err| {
            AuthError::from_token_request(err, "Failed to exchange authorization code for token")
        })?;

        self.tokens.store_payload(&payload)?;
        tracing::info!(expires_in = payload.expires_in, "Exchanged authorization code for tokens");
        Ok(payload)
    }
}

/// Secrets are only ever logged by their first few characters.
fn prefix(secret: &str, len: usize) -> &str {
    secret.get(..len).unwrap_or(secret)
}
