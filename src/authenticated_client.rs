use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use url::Url;

use crate::error::{AuthError, InvalidAccessTokenSnafu, RequestSnafu, UnauthenticatedSnafu};
use crate::internal::token_manager::TokenManager;
use crate::request::{DecodeSnafu, JsonSnafu, SendSnafu};
use crate::response::ApiErrorBody;

/// HTTP client for the resource API with automatic access token injection.
///
/// Every request is sent to `api_base_url` joined with the given endpoint and carries the current
/// access token in an `Authorization: Bearer` header. Tokens close to their expiry are refreshed
/// before the request is sent.
///
/// Requests are never retried. A rejected request surfaces as [`AuthError::ApiError`] and leaves
/// the stored tokens untouched.
///
/// Create an instance using [`crate::AuthSession::client()`].
///
/// # Example
/// ```no_run
/// # use leptos_spotify_auth::{AuthError, AuthenticatedClient};
/// # async fn example(client: AuthenticatedClient) -> Result<(), AuthError> {
/// let devices = client.get("/me/player/devices").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: reqwest::Client,
    tokens: TokenManager,
    base_url: Url,
}

/// The subset of the `/me` profile the library exposes typed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Subscription level, e.g. `premium` or `free`.
    #[serde(default)]
    pub product: Option<String>,
}

impl AuthenticatedClient {
    pub(crate) fn new(client: reqwest::Client, tokens: TokenManager, base_url: Url) -> Self {
        Self {
            client,
            tokens,
            base_url,
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{endpoint}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn create_request(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
        access_token: &str,
    ) -> Result<reqwest::Request, AuthError> {
        // Let the user build the request.
        let mut request = with(self.client.request(method, self.endpoint_url(endpoint)))
            .build()
            .context(SendSnafu)
            .context(RequestSnafu)?;

        let headers = request.headers_mut();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        // The access token always wins over a user supplied `AUTHORIZATION` header.
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .context(InvalidAccessTokenSnafu)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(request)
    }

    /// Perform a request against `endpoint`, relative to the configured api base url.
    ///
    /// Returns `None` for `204 No Content` and for successful responses without a body.
    ///
    /// # Errors
    /// - [`AuthError::Unauthenticated`] if no valid access token is available.
    /// - [`AuthError::ApiError`] for any non-success status, carrying the API's error message.
    /// - [`AuthError::Request`] if the request could not be sent or its body not be decoded.
    pub async fn request(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<serde_json::Value>, AuthError> {
        let access_token = self
            .tokens
            .access_token()
            .await?
            .ok_or_else(|| UnauthenticatedSnafu.build())?;

        let request = self.create_request(method, endpoint, with, &access_token)?;
        tracing::trace!(method = %request.method(), url = %request.url(), "Sending API request");

        let response = self
            .client
            .execute(request)
            .await
            .context(SendSnafu)
            .context(RequestSnafu)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .context(DecodeSnafu)
            .context(RequestSnafu)?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&body)
            .map(Some)
            .context(JsonSnafu)
            .context(RequestSnafu)
    }

    /// Like [`request`](Self::request), deserializing the response into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<T>, AuthError> {
        self.request(method, endpoint, with)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .context(JsonSnafu)
            .context(RequestSnafu)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Option<serde_json::Value>, AuthError> {
        self.get_with(endpoint, |builder| builder).await
    }

    /// # Example
    /// ```no_run
    /// # use leptos_spotify_auth::{AuthError, AuthenticatedClient};
    /// # async fn example(client: AuthenticatedClient) -> Result<(), AuthError> {
    /// let top = client
    ///     .get_with("/me/top/tracks", |builder| builder.query(&[("limit", "10")]))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_with(
        &self,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<serde_json::Value>, AuthError> {
        self.request(reqwest::Method::GET, endpoint, with).await
    }

    pub async fn post(&self, endpoint: &str) -> Result<Option<serde_json::Value>, AuthError> {
        self.post_with(endpoint, |builder| builder).await
    }

    pub async fn post_with(
        &self,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<serde_json::Value>, AuthError> {
        self.request(reqwest::Method::POST, endpoint, with).await
    }

    pub async fn put(&self, endpoint: &str) -> Result<Option<serde_json::Value>, AuthError> {
        self.put_with(endpoint, |builder| builder).await
    }

    /// # Example
    /// ```no_run
    /// # use leptos_spotify_auth::{AuthError, AuthenticatedClient};
    /// # async fn example(client: AuthenticatedClient) -> Result<(), AuthError> {
    /// client
    ///     .put_with("/me/player/volume", |builder| {
    ///         builder.query(&[("volume_percent", "50")])
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn put_with(
        &self,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<serde_json::Value>, AuthError> {
        self.request(reqwest::Method::PUT, endpoint, with).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Option<serde_json::Value>, AuthError> {
        self.delete_with(endpoint, |builder| builder).await
    }

    pub async fn delete_with(
        &self,
        endpoint: &str,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<Option<serde_json::Value>, AuthError> {
        self.request(reqwest::Method::DELETE, endpoint, with).await
    }

    /// Profile of the logged-in user.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, AuthError> {
        self.request_json(reqwest::Method::GET, "/me", |builder| builder)
            .await
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> AuthError {
    let detail = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .map(|body| body.error);
    tracing::debug!(
        %status,
        reported_status = ?detail.as_ref().and_then(|it| it.status),
        "API request failed"
    );
    let message = detail
        .and_then(|it| it.message)
        .filter(|it| !it.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    AuthError::ApiError { status, message }
}
