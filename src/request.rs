use crate::{
    AuthorizationCode, RefreshToken, TokenEndpoint,
    response::{ErrorResponse, TokenPayload},
};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RequestError {
    #[snafu(display("RequestError: Could not send request"))]
    Send { source: reqwest::Error },

    #[snafu(display("RequestError: Could not decode payload"))]
    Decode { source: reqwest::Error },

    #[snafu(display("RequestError: Could not parse JSON payload"))]
    Json { source: serde_json::Error },

    #[snafu(display("RequestError: Received an error response ({status})"))]
    ErrResponse {
        status: http::StatusCode,
        error_response: ErrorResponse,
    },
}

/// Exchange an authorization code for tokens. No client secret is sent, the `code_verifier`
/// proves that we started the authorization.
pub(crate) async fn exchange_code_for_token(
    client: &reqwest::Client,
    token_endpoint: &TokenEndpoint,
    client_id: &str,
    redirect_uri: &str,
    code: &AuthorizationCode,
    code_verifier: &str,
) -> Result<TokenPayload, RequestError> {
    let params = [
        ("client_id", client_id),
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", redirect_uri),
        ("code_verifier", code_verifier),
    ];
    post_token_request(client, token_endpoint, &params).await
}

pub(crate) async fn refresh_token(
    client: &reqwest::Client,
    token_endpoint: &TokenEndpoint,
    client_id: &str,
    refresh_token: &RefreshToken,
) -> Result<TokenPayload, RequestError> {
    let params = [
        ("client_id", client_id),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
    ];
    post_token_request(client, token_endpoint, &params).await
}

/// POST an `application/x-www-form-urlencoded` body to the token endpoint.
async fn post_token_request(
    client: &reqwest::Client,
    token_endpoint: &TokenEndpoint,
    params: &[(&str, &str)],
) -> Result<TokenPayload, RequestError> {
    let response = client
        .post(token_endpoint.clone())
        .form(params)
        .send()
        .await
        .context(SendSnafu {})?;

    let status = response.status();
    if !status.is_success() {
        let error_response = match response.json::<ErrorResponse>().await {
            Ok(error_response) => error_response,
            Err(err) => {
                tracing::debug!(
                    ?err,
                    %status,
                    "Token endpoint returned a non-decodable error body"
                );
                ErrorResponse::undecodable()
            }
        };
        return ErrResponseSnafu {
            status,
            error_response,
        }
        .fail();
    }

    response
        .json::<TokenPayload>()
        .await
        .context(DecodeSnafu {})
}
