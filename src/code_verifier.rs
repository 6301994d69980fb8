//! PKCE code verifier and `S256` code challenge.
//!
//! see: https://datatracker.ietf.org/doc/html/rfc7636

use crate::error::{AuthError, ConfigurationSnafu};
use crate::random_token;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeVerifier {
    code_verifier: String,
}

impl CodeVerifier {
    pub const MIN_LENGTH: usize = 43;
    pub const MAX_LENGTH: usize = 128;

    pub(crate) fn generate(length: usize) -> Result<Self, AuthError> {
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return ConfigurationSnafu {
                reason: format!(
                    "code verifier length must be in {}..={}, got {length}",
                    Self::MIN_LENGTH,
                    Self::MAX_LENGTH
                ),
            }
            .fail();
        }

        Ok(Self {
            code_verifier: random_token::generate(length)?,
        })
    }

    /// Wrap a verifier previously read back from storage.
    pub(crate) fn from_stored(code_verifier: String) -> Self {
        Self { code_verifier }
    }

    pub fn to_code_challenge(&self) -> CodeChallenge {
        CodeChallenge {
            code_challenge: derive(&self.code_verifier),
            code_challenge_method: CodeChallengeMethod::S256,
        }
    }

    pub fn code_verifier(&self) -> &str {
        self.code_verifier.as_str()
    }
}

/// `BASE64URL-ENCODE(SHA256(ASCII(code_verifier)))`, without padding.
pub fn derive(code_verifier: &str) -> String {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use sha2::Digest;

    let digest = sha2::Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Only `S256` is supported. The `plain` transform is deliberately not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    S256,
}

impl CodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge {
    code_challenge: String,
    code_challenge_method: CodeChallengeMethod,
}

impl CodeChallenge {
    pub fn code_challenge(&self) -> &str {
        self.code_challenge.as_str()
    }

    pub fn code_challenge_method(&self) -> CodeChallengeMethod {
        self.code_challenge_method
    }
}
