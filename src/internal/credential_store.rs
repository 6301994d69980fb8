use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use time::OffsetDateTime;

use crate::code_verifier::CodeVerifier;
use crate::config::StorageKeys;
use crate::csrf_token::CsrfToken;
use crate::error::AuthError;
use crate::login::PkceSession;
use crate::response::TokenPayload;
use crate::storage::KeyValueStore;
use crate::token::{self, Credential};

/// Whatever part of a PKCE session is currently persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct StoredPkceSession {
    pub code_verifier: Option<CodeVerifier>,
    pub state: Option<CsrfToken>,
}

/// Sole owner of the durable authentication state: the `Credential` and the transient
/// `PkceSession`. Every other component reads and writes through this type.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl Debug for CredentialStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Stored values are secrets. Only show where they live.
        f.debug_struct("CredentialStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    /// Persist a token response received at `received_at`.
    ///
    /// Access token and expiry are both written before returning. The refresh token is only
    /// overwritten if the response contains one, keeping the previous one otherwise.
    pub fn save_tokens(
        &self,
        payload: &TokenPayload,
        received_at: OffsetDateTime,
    ) -> Result<Credential, AuthError> {
        let mut credential = Credential::from_payload(payload, received_at)?;

        self.store
            .put(&self.keys.access_token, &credential.access_token)?;
        self.store.put(
            &self.keys.expires_at,
            &token::to_unix_millis(credential.expires_at).to_string(),
        )?;

        match &payload.refresh_token {
            Some(refresh_token) => self.store.put(&self.keys.refresh_token, refresh_token)?,
            None => credential.refresh_token = self.store.get(&self.keys.refresh_token)?,
        }

        tracing::debug!(expires_at = %credential.expires_at, "Stored tokens");
        Ok(credential)
    }

    /// The stored credential, or `None` if no access token is stored.
    pub fn load_credential(&self) -> Result<Option<Credential>, AuthError> {
        let Some(access_token) = self.store.get(&self.keys.access_token)? else {
            return Ok(None);
        };
        let expires_at = self
            .store
            .get(&self.keys.expires_at)?
            .map(|it| token::from_unix_millis(&it))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let refresh_token = self.store.get(&self.keys.refresh_token)?;

        Ok(Some(Credential {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    pub fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store.get(&self.keys.refresh_token)?)
    }

    /// Remove access token, refresh token and expiry. Never fails: removal errors are logged
    /// and the remaining keys are still attempted.
    pub fn clear_tokens(&self) {
        for key in [
            &self.keys.access_token,
            &self.keys.refresh_token,
            &self.keys.expires_at,
        ] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(?err, key, "Could not remove token data from storage");
            }
        }
    }

    /// Persist verifier and state. Both are written before this returns.
    pub(crate) fn save_pkce_session(&self, session: &PkceSession) -> Result<(), AuthError> {
        self.store.put(
            &self.keys.code_verifier,
            session.code_verifier.code_verifier(),
        )?;
        self.store.put(&self.keys.state, session.state.as_str())?;
        Ok(())
    }

    pub(crate) fn load_pkce_session(&self) -> Result<StoredPkceSession, AuthError> {
        Ok(StoredPkceSession {
            code_verifier: self
                .store
                .get(&self.keys.code_verifier)?
                .map(CodeVerifier::from_stored),
            state: self.store.get(&self.keys.state)?.map(CsrfToken::from),
        })
    }

    pub(crate) fn clear_pkce_session(&self) -> Result<(), AuthError> {
        self.store.remove(&self.keys.code_verifier)?;
        self.store.remove(&self.keys.state)?;
        Ok(())
    }
}
