use crate::AuthorizationEndpoint;
use crate::code_verifier::{CodeChallenge, CodeVerifier};
use crate::config::AuthOptions;
use crate::csrf_token::CsrfToken;
use crate::error::AuthError;
use itertools::Itertools;
use url::Url;

/// Single-use artifacts spanning the authorization redirect round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceSession {
    pub code_verifier: CodeVerifier,
    pub state: CsrfToken,
}

impl PkceSession {
    pub(crate) fn generate(options: &AuthOptions) -> Result<Self, AuthError> {
        Ok(Self {
            code_verifier: CodeVerifier::generate(options.advanced.code_verifier_length)?,
            state: CsrfToken::generate(options.advanced.state_length)?,
        })
    }
}

/// Parameters of one authorization request. Never persisted.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a Url,
    pub scope: String,
    pub state: &'a CsrfToken,
    pub code_challenge: CodeChallenge,
}

impl<'a> AuthorizationRequest<'a> {
    pub(crate) fn new(options: &'a AuthOptions, session: &'a PkceSession) -> Self {
        Self {
            client_id: options.client_id.trim(),
            redirect_uri: &options.redirect_uri,
            scope: join_scope(&options.scope),
            state: &session.state,
            code_challenge: session.code_verifier.to_code_challenge(),
        }
    }

    pub fn to_url(&self, authorization_endpoint: &AuthorizationEndpoint) -> Url {
        let mut login_url: Url = authorization_endpoint.clone();
        login_url
            .query_pairs_mut()
            .append_pair("client_id", self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("scope", &self.scope)
            .append_pair("state", self.state.as_str())
            .append_pair(
                "code_challenge_method",
                self.code_challenge.code_challenge_method().as_str(),
            )
            .append_pair("code_challenge", self.code_challenge.code_challenge());
        login_url
    }
}

fn join_scope(scope: &[String]) -> String {
    scope
        .iter()
        .map(|it| it.trim())
        .filter(|it| !it.is_empty())
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_verifier;
    use assertr::prelude::*;
    use std::collections::HashMap;

    fn options() -> AuthOptions {
        let mut options = AuthOptions::new(
            "client-123",
            Url::parse("http://127.0.0.1:3000/callback.html").unwrap(),
        );
        options.scope = vec![
            " user-read-email".to_owned(),
            String::new(),
            "streaming ".to_owned(),
        ];
        options
    }

    #[test]
    fn authorization_url_contains_all_parameters() {
        let options = options();
        let session = PkceSession::generate(&options).unwrap();
        let url = AuthorizationRequest::new(&options, &session)
            .to_url(&options.authorization_endpoint);

        assert_that(url.as_str()).starts_with("https://accounts.spotify.com/authorize?");

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_that(params.get("client_id").map(String::as_str)).is_equal_to(Some("client-123"));
        assert_that(params.get("response_type").map(String::as_str)).is_equal_to(Some("code"));
        assert_that(params.get("redirect_uri").map(String::as_str))
            .is_equal_to(Some("http://127.0.0.1:3000/callback.html"));
        assert_that(params.get("scope").map(String::as_str))
            .is_equal_to(Some("user-read-email streaming"));
        assert_that(params.get("state").map(String::as_str))
            .is_equal_to(Some(session.state.as_str()));
        assert_that(params.get("code_challenge_method").map(String::as_str))
            .is_equal_to(Some("S256"));
        let expected_challenge = code_verifier::derive(session.code_verifier.code_verifier());
        assert_that(params.get("code_challenge")).is_equal_to(Some(&expected_challenge));
    }

    #[test]
    fn session_uses_configured_lengths() {
        let options = options();
        let session = PkceSession::generate(&options).unwrap();
        assert_that(session.code_verifier.code_verifier()).has_length(64);
        assert_that(session.state.as_str()).has_length(16);
    }
}
