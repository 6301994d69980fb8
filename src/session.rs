use std::sync::Arc;

use url::Url;

use crate::authenticated_client::AuthenticatedClient;
use crate::config::AuthOptions;
use crate::error::AuthError;
use crate::event::{AuthEvent, EventBus};
use crate::internal::auth_flow::AuthFlow;
use crate::internal::credential_store::CredentialStore;
use crate::internal::token_manager::TokenManager;
use crate::navigation::{BrowserNavigator, Navigator};
use crate::response::{self, CallbackResponse, TokenPayload};
use crate::storage::{BrowserStorage, KeyValueStore};
use crate::token::Credential;
use crate::{AccessToken, AuthorizationCode};

/// Result of inspecting the current location for an authorization callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The query string is not an authorization callback.
    NoCallback,

    /// The callback was handled and tokens are now stored.
    LoggedIn(TokenPayload),
}

/// Authentication state of one page lifetime.
///
/// Create one per application and share it by cloning. All clones operate on the same storage,
/// the same HTTP client and the same set of event subscribers.
#[derive(Debug, Clone)]
pub struct AuthSession {
    options: Arc<AuthOptions>,
    credentials: CredentialStore,
    flow: AuthFlow,
    tokens: TokenManager,
    http: reqwest::Client,
    events: EventBus,
}

impl AuthSession {
    pub fn new(
        options: AuthOptions,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_http_client(options, store, navigator, reqwest::Client::new())
    }

    /// Like `new`, sending all token and API requests through `http`.
    pub fn with_http_client(
        options: AuthOptions,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        http: reqwest::Client,
    ) -> Self {
        let options = Arc::new(options);
        let events = EventBus::default();
        let credentials = CredentialStore::new(store, options.storage_keys.clone());
        let tokens = TokenManager::new(
            options.clone(),
            credentials.clone(),
            http.clone(),
            events.clone(),
        );
        let flow = AuthFlow::new(
            options.clone(),
            credentials.clone(),
            tokens.clone(),
            navigator,
            http.clone(),
            events.clone(),
        );
        Self {
            options,
            credentials,
            flow,
            tokens,
            http,
            events,
        }
    }

    /// A session persisting to `window.localStorage` and navigating the current tab.
    pub fn browser(options: AuthOptions) -> Self {
        Self::new(options, Arc::new(BrowserStorage), Arc::new(BrowserNavigator))
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Register an observer for `AuthEvent`s. Observers are called synchronously, in
    /// subscription order, and are never removed.
    pub fn subscribe(&self, listener: impl Fn(&AuthEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    pub fn prepare_login(&self) -> Result<Url, AuthError> {
        self.flow.prepare_login()
    }

    pub fn login(&self) -> Result<(), AuthError> {
        self.flow.login()
    }

    pub async fn handle_callback(
        &self,
        code: &AuthorizationCode,
        state: &str,
    ) -> Result<TokenPayload, AuthError> {
        self.flow.handle_callback(code, state).await
    }

    /// Handle the authorization callback encoded in `query`, if it is one.
    ///
    /// Callers should strip the query from the visible location afterwards, whatever the
    /// outcome, so that a reload does not replay it.
    pub async fn check_callback(&self, query: &str) -> Result<CallbackOutcome, AuthError> {
        match response::parse_callback(query) {
            None => Ok(CallbackOutcome::NoCallback),
            Some(CallbackResponse::Denied(error_response)) => {
                let error = error_response.error.as_str().to_owned();
                tracing::warn!(
                    %error,
                    description = ?error_response.error_description,
                    error_uri = ?error_response.error_uri,
                    "Authorization denied"
                );
                self.events
                    .emit(AuthEvent::AuthorizationDenied { error: error.clone() });
                Err(AuthError::AuthorizationDenied {
                    error,
                    description: error_response.error_description,
                    error_uri: error_response.error_uri,
                })
            }
            Some(CallbackResponse::Authorized(authorization)) => {
                let payload = self
                    .flow
                    .handle_callback(&authorization.code, &authorization.state)
                    .await?;
                Ok(CallbackOutcome::LoggedIn(payload))
            }
        }
    }

    pub async fn access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        self.tokens.access_token().await
    }

    pub async fn refresh_token(&self) -> Result<TokenPayload, AuthError> {
        self.tokens.refresh_token().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    pub fn logout(&self) {
        self.tokens.logout();
    }

    pub fn token_time_remaining(&self) -> String {
        self.tokens.token_time_remaining()
    }

    /// The stored credential, without refreshing it.
    pub fn credential(&self) -> Result<Option<Credential>, AuthError> {
        self.credentials.load_credential()
    }

    /// A client for the resource API at `api_base_url`, authorizing every request.
    pub fn client(&self) -> AuthenticatedClient {
        AuthenticatedClient::new(
            self.http.clone(),
            self.tokens.clone(),
            self.options.api_base_url.clone(),
        )
    }
}
