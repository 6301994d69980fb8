use crate::error::AuthError;
use crate::random_token;

/// Cryptographically secure `state` nonce, round-tripped through the authorization redirect
/// to detect CSRF attacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CsrfToken {
    csrf_token: String,
}

impl CsrfToken {
    /// Generate a new token of `length` characters from the unreserved character set.
    pub fn generate(length: usize) -> Result<Self, AuthError> {
        Ok(Self {
            csrf_token: random_token::generate(length)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.csrf_token
    }

    /// Whether `received` is the token we handed out.
    ///
    /// Although we compare secret tokens, this does not need to be time-attack safe.
    /// The stored token is single-use and removed once a callback got past validation.
    pub fn matches(&self, received: &str) -> bool {
        self.csrf_token == received
    }
}

impl From<String> for CsrfToken {
    fn from(csrf_token: String) -> Self {
        Self { csrf_token }
    }
}
