//! Cryptographically secure random strings over the RFC 3986 unreserved characters.

use crate::error::{AuthError, ConfigurationSnafu, EntropyUnavailableSnafu};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// The 66 unreserved characters `A-Z a-z 0-9 - . _ ~`.
pub const UNRESERVED_CHARSET: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Random bytes at or above this value are discarded. `198 = 3 * 66`, so every character
/// of `UNRESERVED_CHARSET` is reachable from exactly three byte values.
const ACCEPT_BELOW: u8 = 198;

/// Generate `length` characters drawn uniformly from [`UNRESERVED_CHARSET`], using the
/// operating system's secure random source.
///
/// # Errors
/// - `AuthError::Configuration` if `length` is zero.
/// - `AuthError::EntropyUnavailable` if the secure random source cannot be read.
pub fn generate(length: usize) -> Result<String, AuthError> {
    if length == 0 {
        return ConfigurationSnafu {
            reason: "random token length must be positive",
        }
        .fail();
    }

    let mut rng = OsRng;
    let mut token = String::with_capacity(length);
    let mut buf = [0u8; 64];

    while token.len() < length {
        rng.try_fill_bytes(&mut buf).map_err(|err| {
            EntropyUnavailableSnafu {
                message: err.to_string(),
            }
            .build()
        })?;

        for byte in buf.iter().copied().filter(|it| *it < ACCEPT_BELOW) {
            if token.len() == length {
                break;
            }
            let idx = usize::from(byte) % UNRESERVED_CHARSET.len();
            token.push(char::from(UNRESERVED_CHARSET[idx]));
        }
    }

    Ok(token)
}
