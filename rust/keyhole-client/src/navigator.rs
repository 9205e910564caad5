use keyhole_common::{ConditionalSync, SharedCell};

/// Moves the user to another page. In the browser this replaces the current
/// history entry; elsewhere it is whatever the host decides a "page" is.
pub trait Navigator: ConditionalSync {
    /// Navigate to `location`
    fn redirect(&self, location: &str);
}

/// A [Navigator] that records where it was asked to go. Hosts without pages
/// (the CLI, tests) inspect the record instead.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: SharedCell<Vec<String>>,
}

impl RecordingNavigator {
    /// Every location redirected to, oldest first
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().clone()
    }

    /// The most recent redirect, if any
    pub fn last(&self) -> Option<String> {
        self.redirects.read().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        tracing::info!(location, "Redirect requested");
        self.redirects.write().push(location.to_string());
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use window::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod window {
    use super::Navigator;

    /// `window.location.replace`
    #[derive(Clone, Copy, Debug, Default)]
    pub struct WindowNavigator;

    impl Navigator for WindowNavigator {
        fn redirect(&self, location: &str) {
            let Some(window) = web_sys::window() else {
                tracing::warn!(location, "No window to redirect");
                return;
            };
            if let Err(error) = window.location().replace(location) {
                tracing::warn!(location, ?error, "Redirect failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_records_redirects_in_order() {
        let navigator = RecordingNavigator::default();
        navigator.redirect("/login.html");
        navigator.redirect("/natter.html");

        assert_eq!(navigator.redirects(), vec!["/login.html", "/natter.html"]);
        assert_eq!(navigator.last().as_deref(), Some("/natter.html"));
    }
}
