use crate::error::{AuthError, ConfigurationSnafu};
use crate::{AuthorizationEndpoint, TokenEndpoint};
use std::time::Duration;
use url::Url;

pub const SPOTIFY_AUTHORIZATION_ENDPOINT: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Client id value shipped in configuration templates. Treated as "not configured".
pub const CLIENT_ID_PLACEHOLDER: &str = "YOUR_CLIENT_ID";

/// Scopes needed to read the users profile and library and to control playback.
pub const DEFAULT_SCOPES: [&str; 12] = [
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-recently-played",
    "user-top-read",
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
    "playlist-read-collaborative",
    "streaming",
];

/// Represents authentication parameters required for initializing an `AuthSession`.
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// The client id of your app, as shown in the Spotify developer dashboard.
    pub client_id: String,

    /// Url the authorization server redirects back to after the user granted (or denied) access.
    /// Must exactly match one of the redirect URIs registered for your app.
    pub redirect_uri: Url,

    pub authorization_endpoint: AuthorizationEndpoint,

    pub token_endpoint: TokenEndpoint,

    /// Base url prefixed to every endpoint requested through an `AuthenticatedClient`.
    pub api_base_url: Url,

    /// Requested scopes. Joined with spaces in the authorization request.
    pub scope: Vec<String>,

    pub storage_keys: StorageKeys,

    pub advanced: AdvancedOptions,
}

impl AuthOptions {
    /// Options targeting the public Spotify accounts service and Web API, requesting
    /// `DEFAULT_SCOPES`.
    pub fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            authorization_endpoint: Url::parse(SPOTIFY_AUTHORIZATION_ENDPOINT)
                .expect("valid authorization endpoint constant"),
            token_endpoint: Url::parse(SPOTIFY_TOKEN_ENDPOINT)
                .expect("valid token endpoint constant"),
            api_base_url: Url::parse(SPOTIFY_API_BASE_URL).expect("valid api base url constant"),
            scope: DEFAULT_SCOPES.iter().map(|it| (*it).to_owned()).collect(),
            storage_keys: StorageKeys::default(),
            advanced: AdvancedOptions::default(),
        }
    }

    pub(crate) fn validate_client_id(&self) -> Result<(), AuthError> {
        let client_id = self.client_id.trim();
        if client_id.is_empty() || client_id == CLIENT_ID_PLACEHOLDER {
            return ConfigurationSnafu {
                reason: "no client id configured",
            }
            .fail();
        }
        Ok(())
    }
}

/// Names of the entries this library keeps in the durable key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry of the access token, in unix milliseconds.
    pub expires_at: String,
    pub code_verifier: String,
    pub state: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: "spotify_access_token".to_owned(),
            refresh_token: "spotify_refresh_token".to_owned(),
            expires_at: "spotify_expires_at".to_owned(),
            code_verifier: "spotify_code_verifier".to_owned(),
            state: "spotify_auth_state".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdvancedOptions {
    /// How long before its expiry an access token is refreshed when requested.
    /// Defaults to `Duration::from_secs(5 * 60)`.
    pub refresh_skew: Duration,

    /// Length of the generated PKCE code verifier. Must be in `43..=128`.
    /// Defaults to `64`.
    pub code_verifier_length: usize,

    /// Length of the generated `state` nonce.
    /// Defaults to `16`.
    pub state_length: usize,

    /// Interval in which the reactive token countdown is recomputed.
    /// Defaults to `Duration::from_secs(1)`.
    pub token_timer_interval: Duration,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            refresh_skew: Duration::from_secs(5 * 60),
            code_verifier_length: 64,
            state_length: 16,
            token_timer_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    fn options(client_id: &str) -> AuthOptions {
        AuthOptions::new(
            client_id,
            Url::parse("http://127.0.0.1:3000/callback.html").unwrap(),
        )
    }

    #[test]
    fn defaults_target_spotify() {
        let options = options("abc");
        assert_that(options.authorization_endpoint.as_str())
            .is_equal_to(SPOTIFY_AUTHORIZATION_ENDPOINT);
        assert_that(options.token_endpoint.as_str()).is_equal_to(SPOTIFY_TOKEN_ENDPOINT);
        assert_that(options.scope.len()).is_equal_to(12);
        assert_that(options.advanced.refresh_skew).is_equal_to(Duration::from_secs(300));
    }

    #[test]
    fn configured_client_id_is_accepted() {
        let result = options("8ea31b7b395747969ec5b9c9e5af6d0b").validate_client_id();
        assert_that(result.is_ok()).is_true();
    }

    #[test]
    fn missing_client_id_is_rejected() {
        for client_id in ["", "   ", CLIENT_ID_PLACEHOLDER] {
            let result = options(client_id).validate_client_id();
            assert!(
                matches!(result, Err(AuthError::Configuration { .. })),
                "expected a configuration error for {client_id:?}"
            );
        }
    }
}
