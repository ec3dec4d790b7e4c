//! HTTP-backed browsing session
//!
//! The default engine: a reqwest client that presents browser-like headers,
//! keeps the last fetched document in memory and answers selector waits by
//! inspecting that document. Pointer and scroll gestures have nothing to act
//! on and are accepted silently.

use crate::identity::session::{BrowserSession, SessionLauncher};
use crate::identity::IdentityProfile;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;

/// User agent used when the configuration provides no pool
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launches [`HttpSession`]s
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    request_timeout: Duration,
}

impl HttpLauncher {
    /// Creates a launcher whose sessions time out page loads after `request_timeout`
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self, profile: &IdentityProfile) -> SessionResult<Box<dyn BrowserSession>> {
        let client = build_session_client(profile, self.request_timeout)?;
        tracing::debug!(
            user_agent = profile.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
            proxy = profile.proxy.as_deref().unwrap_or("none"),
            "HTTP session launched"
        );
        Ok(Box::new(HttpSession {
            client,
            user_agent_override: None,
            current_url: None,
            document: None,
        }))
    }
}

/// Builds a client that looks like an ordinary desktop browser
fn build_session_client(profile: &IdentityProfile, timeout: Duration) -> SessionResult<Client> {
    let user_agent = profile.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &profile.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| SessionError::Launch(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SessionError::Launch(e.to_string()))
}

/// Session state for the HTTP engine
pub struct HttpSession {
    client: Client,
    user_agent_override: Option<String>,
    current_url: Option<String>,
    document: Option<String>,
}

impl HttpSession {
    fn loaded_document(&self) -> SessionResult<&str> {
        self.document.as_deref().ok_or_else(|| SessionError::Navigation {
            url: self.current_url.clone().unwrap_or_default(),
            message: "no document loaded".to_string(),
        })
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.document = None;
        self.current_url = Some(url.to_string());

        let mut request = self.client.get(url);
        if let Some(ua) = &self.user_agent_override {
            request = request.header(USER_AGENT, ua.as_str());
        }

        let response = request.send().await.map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            message: if e.is_timeout() {
                "page load timed out".to_string()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            // A browser would still render the error page
            tracing::warn!(url, status = status.as_u16(), "Page answered with non-success status");
        }

        let body = response.text().await.map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        self.document = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<()> {
        let document = self.loaded_document()?;
        if document_contains(document, selector)? {
            Ok(())
        } else {
            // Static markup cannot change while waiting
            Err(SessionError::Timeout {
                selector: selector.to_string(),
                seconds: timeout.as_secs_f64(),
            })
        }
    }

    async fn page_source(&mut self) -> SessionResult<String> {
        self.loaded_document().map(str::to_string)
    }

    async fn override_user_agent(&mut self, user_agent: &str) -> SessionResult<()> {
        HeaderValue::from_str(user_agent)
            .map_err(|e| SessionError::Script(format!("invalid user agent: {}", e)))?;
        self.user_agent_override = Some(user_agent.to_string());
        Ok(())
    }

    async fn move_pointer(&mut self, dx: i32, dy: i32) -> SessionResult<()> {
        tracing::trace!(dx, dy, "Pointer movement ignored by HTTP session");
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> SessionResult<()> {
        tracing::debug!("HTTP session closed");
        Ok(())
    }
}

/// Returns true if the markup contains an element matching `selector`
fn document_contains(markup: &str, selector: &str) -> SessionResult<bool> {
    let selector = Selector::parse(selector)
        .map_err(|e| SessionError::Script(format!("invalid selector '{}': {:?}", selector, e)))?;
    let document = Html::parse_document(markup);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}
