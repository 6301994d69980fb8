use crate::request::RequestError;
use crate::storage::StorageError;
use snafu::Snafu;

/// An enumeration representing various authentication-related errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuthError {
    /// The client is not configured well enough to start a login.
    #[snafu(display("AuthError: Invalid configuration: {reason}"))]
    Configuration { reason: String },

    /// The platform's secure random source could not be used.
    #[snafu(display("AuthError: Secure random source unavailable: {message}"))]
    EntropyUnavailable { message: String },

    /// The `state` received in the callback does not match the one we stored before redirecting.
    #[snafu(display("AuthError: State mismatch in authorization callback. Possible CSRF attack."))]
    CsrfMismatch,

    /// No code verifier is stored. The session was restarted, already consumed or tampered with.
    #[snafu(display("AuthError: No code verifier found for the authorization callback"))]
    MissingVerifier,

    /// The authorization server redirected back with an `error` instead of a code.
    #[snafu(display("AuthError: Authorization denied: {error}"))]
    AuthorizationDenied {
        error: String,
        description: Option<String>,
        error_uri: Option<String>,
    },

    /// The token endpoint rejected an exchange or refresh request.
    #[snafu(display("AuthError: Token request failed: {description}"))]
    TokenExchangeFailed { description: String },

    #[snafu(display("AuthError: No refresh token stored"))]
    NoRefreshToken,

    /// No valid access token is available for an API call.
    #[snafu(display("AuthError: Not authenticated"))]
    Unauthenticated,

    /// The resource API rejected a call.
    #[snafu(display("AuthError: API error {status}: {message}"))]
    ApiError {
        status: http::StatusCode,
        message: String,
    },

    #[snafu(display("AuthError: Access token cannot be used as a header value"))]
    InvalidAccessToken {
        source: http::header::InvalidHeaderValue,
    },

    #[snafu(display("AuthError: Request error"))]
    Request { source: RequestError },

    #[snafu(display("AuthError: Storage error"))]
    Storage { source: StorageError },
}

impl From<StorageError> for AuthError {
    fn from(source: StorageError) -> Self {
        AuthError::Storage { source }
    }
}

impl AuthError {
    /// Maps a failed token endpoint call. Provider rejections become `TokenExchangeFailed`,
    /// preferring the provider's `error_description`, then its `error` code, then `fallback`.
    pub(crate) fn from_token_request(err: RequestError, fallback: &str) -> Self {
        match err {
            RequestError::ErrResponse { error_response, .. } => AuthError::TokenExchangeFailed {
                description: error_response
                    .description()
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| fallback.to_owned()),
            },
            other => AuthError::Request { source: other },
        }
    }
}
