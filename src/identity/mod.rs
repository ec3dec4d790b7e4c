//! Identity management for the browsing session
//!
//! The [`IdentityManager`] owns the job's single browsing session and the
//! user-agent/proxy pair it is bound to. It can swap the user agent in place
//! or tear the session down and relaunch it behind a different proxy.
//!
//! Two engines implement [`BrowserSession`]:
//! - [`HttpSession`]: reqwest with browser-like headers (default)
//! - `ChromiumSession`: headless Chromium (feature `headless`)

#[cfg(feature = "headless")]
mod chromium;
mod http;
mod session;

#[cfg(feature = "headless")]
pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use http::{HttpLauncher, HttpSession, DEFAULT_USER_AGENT};
pub use session::{BrowserSession, SessionLauncher};

use crate::config::{IdentityConfig, PacingConfig, SessionEngine};
use crate::{ConfigError, SessionError, SessionResult};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// The user agent and proxy a session is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityProfile {
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

/// Picks a random entry from a pool, `None` if the pool is empty
pub fn pick_random(pool: &[String]) -> Option<String> {
    pool.choose(&mut rand::thread_rng()).cloned()
}

/// Builds the launcher for the configured session engine
pub fn launcher_for(
    identity: &IdentityConfig,
    pacing: &PacingConfig,
) -> Result<Arc<dyn SessionLauncher>, ConfigError> {
    match identity.engine {
        SessionEngine::Http => Ok(Arc::new(HttpLauncher::new(pacing.page_timeout()))),
        #[cfg(feature = "headless")]
        SessionEngine::Chromium => Ok(Arc::new(ChromiumLauncher::new(pacing.page_timeout()))),
        #[cfg(not(feature = "headless"))]
        SessionEngine::Chromium => Err(ConfigError::Validation(
            "engine \"chromium\" requires building with the `headless` feature".to_string(),
        )),
    }
}

/// Owns the browsing session and rotates its identity
pub struct IdentityManager {
    launcher: Arc<dyn SessionLauncher>,
    user_agents: Vec<String>,
    proxies: Vec<String>,
    profile: IdentityProfile,
    session: Option<Box<dyn BrowserSession>>,
}

impl IdentityManager {
    /// Launches the initial session
    ///
    /// A random user agent and proxy are drawn from the configured pools;
    /// with empty pools the session keeps the engine's fixed identity.
    ///
    /// # Returns
    ///
    /// * `Ok(IdentityManager)` - Session is live
    /// * `Err(SessionError::Launch)` - The session could not be started
    pub async fn init(
        config: &IdentityConfig,
        launcher: Arc<dyn SessionLauncher>,
    ) -> SessionResult<Self> {
        let profile = IdentityProfile {
            user_agent: pick_random(&config.user_agents),
            proxy: pick_random(&config.proxies),
        };

        if let Some(ua) = &profile.user_agent {
            tracing::info!("Using user agent: {}...", truncate(ua, 50));
        }
        if let Some(proxy) = &profile.proxy {
            tracing::info!("Using proxy: {}", proxy);
        }

        let session = launcher.launch(&profile).await?;
        tracing::info!("Browsing session initialized");

        Ok(Self {
            launcher,
            user_agents: config.user_agents.clone(),
            proxies: config.proxies.clone(),
            profile,
            session: Some(session),
        })
    }

    /// The identity the live session is bound to
    pub fn profile(&self) -> &IdentityProfile {
        &self.profile
    }

    /// Returns true while a session is live
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Mutable access to the live session
    pub fn session(&mut self) -> SessionResult<&mut Box<dyn BrowserSession>> {
        self.session.as_mut().ok_or(SessionError::Closed)
    }

    /// Relaunches the session behind a newly chosen proxy
    ///
    /// The old session is closed before the new one starts. Failures are
    /// logged; on a failed relaunch the manager holds no session and the next
    /// use reports [`SessionError::Closed`].
    pub async fn rotate_proxy(&mut self) {
        if self.proxies.is_empty() {
            return;
        }

        self.release_session().await;

        let profile = IdentityProfile {
            user_agent: pick_random(&self.user_agents).or_else(|| self.profile.user_agent.clone()),
            proxy: pick_random(&self.proxies),
        };

        match self.launcher.launch(&profile).await {
            Ok(session) => {
                tracing::info!(
                    "Rotated to proxy: {}",
                    profile.proxy.as_deref().unwrap_or("none")
                );
                self.session = Some(session);
                self.profile = profile;
            }
            Err(e) => {
                tracing::error!("Proxy rotation failed: {}", e);
            }
        }
    }

    /// Overrides the live session's user agent without a restart
    pub async fn rotate_user_agent(&mut self) {
        let Some(new_agent) = pick_random(&self.user_agents) else {
            return;
        };

        let Some(session) = self.session.as_mut() else {
            tracing::error!("User agent rotation failed: {}", SessionError::Closed);
            return;
        };

        match session.override_user_agent(&new_agent).await {
            Ok(()) => {
                tracing::info!("Rotated user agent to: {}...", truncate(&new_agent, 50));
                self.profile.user_agent = Some(new_agent);
            }
            Err(e) => tracing::error!("User agent rotation failed: {}", e),
        }
    }

    /// Releases the session; safe to call more than once
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            self.release_session().await;
            tracing::info!("Browsing session closed");
        }
    }

    async fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::error!("Error closing session: {}", e);
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
