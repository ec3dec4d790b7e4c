//! Browsing session abstraction
//!
//! A session is the single automated browser (or browser-like client) owned
//! by the running job. Sessions are created by a [`SessionLauncher`] bound to
//! an [`IdentityProfile`], and are replaced wholesale on proxy rotation.

use crate::identity::IdentityProfile;
use crate::SessionResult;
use async_trait::async_trait;
use std::time::Duration;

/// Operations the harvesting pipeline needs from a browsing session
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads the URL into the session
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Waits until an element matching `selector` is present
    ///
    /// Fails with [`SessionError::Timeout`](crate::SessionError::Timeout)
    /// when the element does not appear within `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<()>;

    /// Returns the markup of the currently loaded document
    async fn page_source(&mut self) -> SessionResult<String>;

    /// Replaces the user agent sent by this session without a restart
    async fn override_user_agent(&mut self, user_agent: &str) -> SessionResult<()>;

    /// Moves the synthetic pointer by the given offset
    async fn move_pointer(&mut self, dx: i32, dy: i32) -> SessionResult<()>;

    /// Scrolls the document to the bottom
    async fn scroll_to_bottom(&mut self) -> SessionResult<()>;

    /// Releases every resource held by the session
    async fn close(self: Box<Self>) -> SessionResult<()>;
}

/// Factory for sessions bound to an identity profile
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Starts a new session using the profile's user agent and proxy
    async fn launch(&self, profile: &IdentityProfile) -> SessionResult<Box<dyn BrowserSession>>;
}
