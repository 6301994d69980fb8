use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Query parameters the authorization server appends to the redirect uri.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResponse {
    Authorized(AuthorizationResponse),
    Denied(ErrorResponse),
}

/// A successful authorization callback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// Parse the query string of the current location into a callback response.
///
/// Accepts the query with or without its leading `?`. Returns `None` when the query carries
/// neither an `error` nor both of `code` and `state`, which is the normal case for any page
/// load not caused by an authorization redirect.
pub fn parse_callback(query: &str) -> Option<CallbackResponse> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    let mut error_uri = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            "error_uri" => error_uri = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(CallbackResponse::Denied(ErrorResponse {
            error: OAuthErrorCode::from(error),
            error_description,
            error_uri,
        }));
    }

    match (code, state) {
        (Some(code), Some(state)) => Some(CallbackResponse::Authorized(AuthorizationResponse {
            code,
            state,
        })),
        _ => None,
    }
}

/// Successful response of the token endpoint, for both the code exchange and a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenPayload {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,

    /// Lifetime of `access_token` in seconds, counted from the moment the response was received.
    pub expires_in: i64,

    /// May be omitted on refresh. The previously issued refresh token stays valid in that case.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// See [RFC 6749 Section 4.1.2.1](https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1)
/// and [Section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum KnownOAuthErrorCode {
    /// The request is missing a required parameter, includes an unsupported parameter value
    /// (other than grant type), repeats a parameter, includes multiple credentials,
    /// utilizes more than one mechanism for authenticating the client, or is otherwise malformed.
    #[serde(rename = "invalid_request")]
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client authentication included,
    /// or unsupported authentication method).
    #[serde(rename = "invalid_client")]
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    #[serde(rename = "invalid_grant")]
    InvalidGrant,

    /// The authenticated client is not authorized to use this authorization grant type.
    #[serde(rename = "unauthorized_client")]
    UnauthorizedClient,

    /// The authorization grant type is not supported by the authorization server.
    #[serde(rename = "unsupported_grant_type")]
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope granted by the
    /// resource owner.
    #[serde(rename = "invalid_scope")]
    InvalidScope,

    /// The resource owner or authorization server denied the request.
    #[serde(rename = "access_denied")]
    AccessDenied,
}

impl KnownOAuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownOAuthErrorCode::InvalidRequest => "invalid_request",
            KnownOAuthErrorCode::InvalidClient => "invalid_client",
            KnownOAuthErrorCode::InvalidGrant => "invalid_grant",
            KnownOAuthErrorCode::UnauthorizedClient => "unauthorized_client",
            KnownOAuthErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            KnownOAuthErrorCode::InvalidScope => "invalid_scope",
            KnownOAuthErrorCode::AccessDenied => "access_denied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OAuthErrorCode {
    Known(KnownOAuthErrorCode),
    Unknown(String),
}

impl OAuthErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            OAuthErrorCode::Known(known) => known.as_str(),
            OAuthErrorCode::Unknown(other) => other.as_str(),
        }
    }
}

impl From<String> for OAuthErrorCode {
    fn from(value: String) -> Self {
        serde_json::from_value::<KnownOAuthErrorCode>(serde_json::Value::String(value.clone()))
            .map(OAuthErrorCode::Known)
            .unwrap_or(OAuthErrorCode::Unknown(value))
    }
}

impl Display for OAuthErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth error response, received either as callback query parameters or as the JSON body of
/// a failed token request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// The error code (e.g., `invalid_client` or `invalid_grant`).
    pub error: OAuthErrorCode,

    /// OPTIONAL. Human-readable ASCII text providing additional information.
    #[serde(default)]
    pub error_description: Option<String>,

    /// OPTIONAL. A URI identifying a human-readable web page with information about the error.
    #[serde(default)]
    pub error_uri: Option<String>,
}

impl ErrorResponse {
    /// Stand-in for an error response whose body could not be decoded.
    pub(crate) fn undecodable() -> Self {
        Self {
            error: OAuthErrorCode::Unknown(String::new()),
            error_description: None,
            error_uri: None,
        }
    }

    /// Most descriptive text available: `error_description`, falling back to the `error` code.
    pub fn description(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .filter(|it| !it.trim().is_empty())
            .or_else(|| Some(self.error.as_str()).filter(|it| !it.is_empty()))
    }
}

/// Body of a failed Web API call: `{ "error": { "status": 401, "message": "..." } }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub status: Option<u16>,

    #[serde(default)]
    pub message: Option<String>,
}
