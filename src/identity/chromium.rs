//! Headless Chromium session using chromiumoxide
//!
//! Launch flags and an init script hide the usual automation markers
//! (`AutomationControlled` blink feature, `navigator.webdriver`).

use crate::identity::session::{BrowserSession, SessionLauncher};
use crate::identity::IdentityProfile;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Hides `navigator.webdriver` on every new document
const WEBDRIVER_MASK: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Interval between element polls while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches [`ChromiumSession`]s
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    navigation_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self { navigation_timeout }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, profile: &IdentityProfile) -> SessionResult<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage");

        if let Some(ua) = &profile.user_agent {
            builder = builder.arg(format!("--user-agent={}", ua));
        }
        if let Some(proxy) = &profile.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(WEBDRIVER_MASK))
            .await
            .map_err(|e| SessionError::Launch(format!("failed to install webdriver mask: {}", e)))?;

        tracing::info!(
            proxy = profile.proxy.as_deref().unwrap_or("none"),
            "Chromium session launched"
        );

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            navigation_timeout: self.navigation_timeout,
            pointer: (0, 0),
        }))
    }
}

/// A live headless browser with a single page
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    pointer: (i32, i32),
}

impl ChromiumSession {
    async fn run_script(&self, script: String) -> SessionResult<()> {
        self.page
            .evaluate(script)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: "page load timed out".to_string(),
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<()> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    seconds: timeout.as_secs_f64(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn page_source(&mut self) -> SessionResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    async fn override_user_agent(&mut self, user_agent: &str) -> SessionResult<()> {
        self.page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    async fn move_pointer(&mut self, dx: i32, dy: i32) -> SessionResult<()> {
        self.pointer = ((self.pointer.0 + dx).max(0), (self.pointer.1 + dy).max(0));
        let (x, y) = self.pointer;
        self.run_script(format!(
            "document.dispatchEvent(new MouseEvent('mousemove', {{clientX: {}, clientY: {}, bubbles: true}}))",
            x, y
        ))
        .await
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        let jitter = rand::thread_rng().gen_range(0..120);
        self.run_script(format!(
            "window.scrollTo(0, document.body.scrollHeight - {})",
            jitter
        ))
        .await
    }

    async fn close(self: Box<Self>) -> SessionResult<()> {
        let mut this = *self;
        let result = this
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Script(e.to_string()));
        let _ = this.browser.wait().await;
        this.handler_task.abort();
        tracing::debug!("Chromium session closed");
        result
    }
}
