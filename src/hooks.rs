use std::fmt::{Debug, Formatter};

use leptos::callback::Callback;
use leptos::context::provide_context;
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use leptos_use::{UseIntervalReturn, use_interval};

use crate::authenticated_client::AuthenticatedClient;
use crate::config::AuthOptions;
use crate::error::AuthError;
use crate::event::AuthEvent;
use crate::session::{AuthSession, CallbackOutcome};

/// Reactive handle on the authentication state, provided as context by [`use_spotify_auth`].
#[derive(Clone)]
pub struct SpotifyAuth {
    session: AuthSession,

    /// Whether an unexpired access token is stored. Re-evaluated on every timer tick and
    /// every auth event.
    pub is_authenticated: Signal<bool>,

    /// Remaining lifetime of the access token as `MM:SS`.
    pub time_remaining: Signal<String>,

    /// The most recent `AuthEvent`, if any occurred during this page lifetime.
    pub last_event: Signal<Option<AuthEvent>>,

    pause_timer: Callback<()>,
}

impl Debug for SpotifyAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyAuth")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SpotifyAuth {
    /// Redirect to the Spotify authorization page.
    pub fn login(&self) -> Result<(), AuthError> {
        self.session.login()
    }

    /// Forget all tokens and stop the token timer until the next login.
    pub fn logout(&self) {
        self.session.logout();
        self.pause_timer.run(());
    }

    pub fn client(&self) -> AuthenticatedClient {
        self.session.client()
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }
}

/// Initializes Spotify authentication for this page. Call once, near the root of your app and
/// below a `<Router>`.
///
/// Persists to `window.localStorage`. If the current location is an authorization callback, it
/// is handled and its query string removed from the location afterwards.
pub fn use_spotify_auth(options: AuthOptions) -> SpotifyAuth {
    tracing::trace!("Initializing Spotify auth...");

    let interval_millis: u64 = options
        .advanced
        .token_timer_interval
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX);

    let session = AuthSession::browser(options);

    let UseIntervalReturn {
        counter,
        pause,
        resume,
        ..
    } = use_interval::<u64>(interval_millis);

    let (last_event, set_last_event) = signal::<Option<AuthEvent>>(None);
    session.subscribe(move |event| {
        if matches!(
            event,
            AuthEvent::LoggedIn { .. } | AuthEvent::TokenRefreshed { .. }
        ) {
            resume();
        }
        // The owner may already be gone when a pending request completes.
        let _ = set_last_event.try_set(Some(event.clone()));
    });

    handle_current_location(session.clone());

    let is_authenticated = {
        let session = session.clone();
        Memo::new(move |_| {
            let _count = counter.get();
            let _event = last_event.get();
            session.is_authenticated()
        })
    };

    let time_remaining = {
        let session = session.clone();
        Memo::new(move |_| {
            let _count = counter.get();
            let _event = last_event.get();
            session.token_time_remaining()
        })
    };

    let auth = SpotifyAuth {
        session,
        is_authenticated: is_authenticated.into(),
        time_remaining: time_remaining.into(),
        last_event: last_event.into(),
        pause_timer: Callback::new(move |()| pause()),
    };

    provide_context(auth.clone());

    auth
}

/// The `SpotifyAuth` provided by a previous call to [`use_spotify_auth`].
///
/// # Panics
/// If `use_spotify_auth` was not called in a parent component.
pub fn expect_spotify_auth() -> SpotifyAuth {
    expect_context::<SpotifyAuth>()
}

fn handle_current_location(session: AuthSession) {
    let Some(location) = web_sys::window().map(|it| it.location()) else {
        tracing::debug!("No window. Skipping callback handling.");
        return;
    };
    let query = location.search().unwrap_or_default();
    if query.is_empty() {
        return;
    }
    let pathname = location.pathname().unwrap_or_else(|_| "/".to_owned());

    let navigate = use_navigate();
    leptos::task::spawn_local(async move {
        match session.check_callback(&query).await {
            Ok(CallbackOutcome::NoCallback) => return,
            Ok(CallbackOutcome::LoggedIn(_)) => {
                tracing::info!("Login successful");
            }
            Err(err) => {
                tracing::error!(?err, "Could not complete the authorization callback");
            }
        }

        // Whatever the outcome, the code and state are used up. Leaving them in the location
        // would replay them on reload.
        navigate(
            &pathname,
            NavigateOptions {
                replace: true,
                ..Default::default()
            },
        );
    });
}
