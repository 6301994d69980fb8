#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use leptos_spotify_auth::url::Url;
use leptos_spotify_auth::{
    AuthEvent, AuthOptions, AuthSession, KeyValueStore, MemoryStore, Navigator,
};
use tracing_subscriber::{
    Layer, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

pub const REDIRECT_URI: &str = "http://127.0.0.1:3000/callback.html";

pub fn init_tracing() {
    let log_filter = tracing_subscriber::filter::Targets::new()
        .with_default(tracing::Level::INFO)
        .with_target("leptos_spotify_auth", tracing::Level::TRACE)
        .with_target("hyper", tracing::Level::WARN)
        .with_target("wiremock", tracing::Level::WARN);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    // Every test calls this. Only the first one wins.
    let _ = tracing_subscriber::Registry::default()
        .with(fmt_layer.with_filter(log_filter))
        .try_init();
}

/// Records the urls the session wanted to navigate to instead of leaving the page.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    urls: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn urls(&self) -> Vec<Url> {
        self.urls.lock().expect("navigator lock poisoned").clone()
    }

    pub fn last(&self) -> Option<Url> {
        self.urls().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) {
        self.urls
            .lock()
            .expect("navigator lock poisoned")
            .push(url.clone());
    }
}

pub struct Fixture {
    pub session: AuthSession,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub events: Arc<Mutex<Vec<AuthEvent>>>,
}

impl Fixture {
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().expect("events lock poisoned").clone()
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).expect("memory store never fails")
    }

    pub fn put(&self, key: &str, value: &str) {
        self.store
            .put(key, value)
            .expect("memory store never fails");
    }
}

/// Options pointing all Spotify endpoints at `server_uri`, typically a wiremock server.
pub fn options(server_uri: &str) -> AuthOptions {
    let mut options = AuthOptions::new("test-client", Url::parse(REDIRECT_URI).unwrap());
    options.authorization_endpoint = Url::parse(&format!("{server_uri}/authorize")).unwrap();
    options.token_endpoint = Url::parse(&format!("{server_uri}/api/token")).unwrap();
    options.api_base_url = Url::parse(&format!("{server_uri}/v1")).unwrap();
    options
}

pub fn fixture(options: AuthOptions) -> Fixture {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let session = AuthSession::new(options, store.clone(), navigator.clone());

    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = events.clone();
        session.subscribe(move |event| {
            events
                .lock()
                .expect("events lock poisoned")
                .push(event.clone());
        });
    }

    Fixture {
        session,
        store,
        navigator,
        events,
    }
}

/// Millis since the unix epoch, `offset_secs` from now.
pub fn unix_millis_from_now(offset_secs: i64) -> String {
    let at = time::OffsetDateTime::now_utc() + time::Duration::seconds(offset_secs);
    (at.unix_timestamp_nanos() / 1_000_000).to_string()
}

/// Store an access token expiring `expires_in_secs` from now, without going through a login.
pub fn seed_tokens(
    fixture: &Fixture,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_in_secs: i64,
) {
    fixture.put("spotify_access_token", access_token);
    fixture.put("spotify_expires_at", &unix_millis_from_now(expires_in_secs));
    if let Some(refresh_token) = refresh_token {
        fixture.put("spotify_refresh_token", refresh_token);
    }
}
