//!
//! Spotify OAuth 2.0 + PKCE authentication for Leptos applications.
//!
//! ```no_run
//! use leptos::prelude::*;
//! use leptos_spotify_auth::{use_spotify_auth, url::Url, AuthOptions};
//!
//! #[component]
//! pub fn Player() -> impl IntoView {
//!     // Must be rendered under a `<Router>`, as the callback query string is removed
//!     // through a router navigation.
//!     let options = AuthOptions::new(
//!         "my-client-id",
//!         Url::parse("http://127.0.0.1:3000/callback.html").unwrap(),
//!     );
//!     let auth = use_spotify_auth(options);
//!     let is_authenticated = auth.is_authenticated;
//!     let time_remaining = auth.time_remaining;
//!
//!     view! {
//!         <Show
//!             when=move || is_authenticated.get()
//!             fallback=move || {
//!                 let auth = auth.clone();
//!                 view! {
//!                     <button on:click=move |_| {
//!                         if let Err(err) = auth.login() {
//!                             tracing::error!(?err, "Login failed");
//!                         }
//!                     }>"Log in"</button>
//!                 }
//!             }
//!         >
//!             <span>"Token expires in " {move || time_remaining.get()}</span>
//!         </Show>
//!     }
//! }
//! ```
//!
//! Outside of Leptos, build an [`AuthSession`] directly and hand it a [`KeyValueStore`] and a
//! [`Navigator`] of your choice.
//!

mod authenticated_client;
pub mod code_verifier;
mod config;
mod csrf_token;
mod error;
mod event;
mod hooks;
mod internal;
mod login;
mod navigation;
pub mod random_token;
mod request;
mod response;
mod session;
mod storage;
mod time_ext;
mod token;

// Library exports (additional to pub modules).
pub use authenticated_client::*;
pub use config::*;
pub use csrf_token::CsrfToken;
pub use error::AuthError;
pub use event::AuthEvent;
pub use hooks::*;
pub use login::{AuthorizationRequest, PkceSession};
pub use navigation::{BrowserNavigator, Navigator};
pub use request::RequestError;
pub use response::{
    AuthorizationResponse, CallbackResponse, ErrorResponse, KnownOAuthErrorCode, OAuthErrorCode,
    TokenPayload, parse_callback,
};
pub use session::{AuthSession, CallbackOutcome};
pub use storage::{BrowserStorage, KeyValueStore, MemoryStore, StorageError};
pub use token::Credential;

pub mod url {
    pub use url::Url;
}
pub mod reqwest {
    pub use reqwest::*;
}

#[cfg(feature = "internals")]
pub mod internals {
    pub use crate::internal::auth_flow::AuthFlow;
    pub use crate::internal::credential_store::CredentialStore;
    pub use crate::internal::token_manager::TokenManager;
}

type AuthorizationEndpoint = url::Url;
type TokenEndpoint = url::Url;

type AuthorizationCode = String;
type AccessToken = String;
type RefreshToken = String;
