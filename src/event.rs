use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcomes of authentication operations, published to subscribers of an `AuthSession`.
///
/// Presentation concerns (toasts, activity logs, screen switches) subscribe to these instead of
/// being called from within the authentication logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The authorization redirect is about to happen.
    LoginStarted,

    /// The authorization code was exchanged for tokens.
    LoggedIn { expires_in: i64 },

    /// The authorization server redirected back with an error.
    AuthorizationDenied { error: String },

    /// The callback could not be completed (state mismatch, missing verifier, exchange failure).
    CallbackFailed { message: String },

    TokenRefreshed { expires_in: i64 },

    RefreshFailed { message: String },

    LoggedOut,
}

type Listener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct EventBus {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let count = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventBus")
            .field("listeners", &count)
            .finish()
    }
}

impl EventBus {
    pub(crate) fn subscribe(&self, listener: impl Fn(&AuthEvent) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        tracing::trace!(?event, "Publishing auth event");
        // Listeners run outside the lock, so they may subscribe further listeners.
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn every_subscriber_receives_events_in_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            bus.subscribe(move |event| seen.lock().unwrap().push(event.clone()));
        }

        bus.emit(AuthEvent::LoginStarted);
        bus.emit(AuthEvent::LoggedOut);

        assert_that(seen.lock().unwrap().clone()).is_equal_to(vec![
            AuthEvent::LoginStarted,
            AuthEvent::LoginStarted,
            AuthEvent::LoggedOut,
            AuthEvent::LoggedOut,
        ]);
    }
}
