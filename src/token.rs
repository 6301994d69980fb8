use time::{Duration, OffsetDateTime};

use crate::AccessToken;
use crate::error::{AuthError, TokenExchangeFailedSnafu};
use crate::response::TokenPayload;

/// The persisted authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access token. Allows access to resources requiring authentication unless expired.
    pub access_token: AccessToken,

    /// Refresh token. May be used to obtain a new access token without user intervention.
    pub refresh_token: Option<String>,

    /// Point in time when the `access_token` expires.
    /// Derived once from `expires_in` when the token response was received. Never recomputed.
    pub expires_at: OffsetDateTime,
}

impl Credential {
    /// Fails with `TokenExchangeFailed` if `expires_in` points outside the representable
    /// date range.
    pub(crate) fn from_payload(
        payload: &TokenPayload,
        received_at: OffsetDateTime,
    ) -> Result<Self, AuthError> {
        let Some(expires_at) = received_at.checked_add(Duration::seconds(payload.expires_in))
        else {
            return TokenExchangeFailedSnafu {
                description: format!("Token lifetime out of range: {}s", payload.expires_in),
            }
            .fail();
        };
        Ok(Self {
            access_token: payload.access_token.clone(),
            refresh_token: payload.refresh_token.clone(),
            expires_at,
        })
    }

    /// Negative once expired.
    pub fn time_left(&self, now: OffsetDateTime) -> Duration {
        self.expires_at - now
    }

    /// Strict: a token is valid up to, but excluding, `expires_at`.
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    /// Whether the token expires within `skew` of `now` (or already did).
    pub fn nearly_expired(&self, now: OffsetDateTime, skew: Duration) -> bool {
        // An expiry too close to the minimum date to subtract `skew` from is long gone.
        self.expires_at
            .checked_sub(skew)
            .is_none_or(|refresh_at| now > refresh_at)
    }
}

/// Render a remaining lifetime as `MM:SS`. Negative durations render as `00:00`.
pub(crate) fn format_time_remaining(remaining: Duration) -> String {
    let remaining = remaining.max(Duration::ZERO);
    let minutes = remaining.whole_minutes();
    let seconds = remaining.whole_seconds() % 60;
    format!("{minutes:02}:{seconds:02}")
}

pub(crate) fn to_unix_millis(instant: OffsetDateTime) -> i128 {
    instant.unix_timestamp_nanos() / 1_000_000
}

/// Unparseable or out of range values yield the unix epoch, reading as long expired.
pub(crate) fn from_unix_millis(millis: &str) -> OffsetDateTime {
    millis
        .trim()
        .parse::<i128>()
        .ok()
        .and_then(|millis| millis.checked_mul(1_000_000))
        .and_then(|nanos| OffsetDateTime::from_unix_timestamp_nanos(nanos).ok())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
