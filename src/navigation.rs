use std::fmt::Debug;
use url::Url;

/// Performs the terminal navigation to the authorization server.
pub trait Navigator: Debug + Send + Sync {
    fn navigate(&self, url: &Url);
}

/// Navigates the current browser tab by assigning `window.location.href`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &Url) {
        let Some(window) = web_sys::window() else {
            tracing::error!("Cannot navigate to the authorization endpoint without a window.");
            return;
        };
        if let Err(err) = window.location().set_href(url.as_str()) {
            tracing::error!(?err, "Could not navigate to the authorization endpoint.");
        }
    }
}
