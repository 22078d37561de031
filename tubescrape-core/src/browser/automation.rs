use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;

use super::error::{BrowserError, BrowserResult};
use super::page::BrowserChannelPage;

const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Switches chromiumoxide passes by default, minus `--enable-automation`.
const BASE_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

#[derive(Debug, Clone, Default)]
pub struct LaunchOverrides {
    pub headless: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    config: Arc<ScraperConfig>,
}

impl BrowserLauncher {
    pub fn new(config: Arc<ScraperConfig>) -> Self {
        Self { config }
    }

    pub async fn launch_with_overrides(
        &self,
        overrides: LaunchOverrides,
    ) -> BrowserResult<BrowserSession> {
        let headless = overrides.headless.unwrap_or(self.config.chromium.headless);
        let chromium_config = self.build_chromium_config(headless)?;
        let [width, height] = self.config.chromium.window_size;
        info!(headless, width, height, "Launching Chromium instance");

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "Chromium handler reported error");
                }
            }
        });

        Ok(BrowserSession {
            browser,
            handler_task: Some(handler_task),
            config: Arc::clone(&self.config),
        })
    }

    pub(crate) fn chromium_args(&self) -> Vec<String> {
        let flags = &self.config.flags;
        let [width, height] = self.config.chromium.window_size;
        let mut args = Vec::new();
        if flags.exclude_automation_switch {
            args.extend(BASE_ARGS.iter().map(|arg| arg.to_string()));
        }
        args.push(format!("--window-size={width},{height}"));
        if flags.start_maximized {
            args.push("--start-maximized".into());
        }
        if self.config.chromium.disable_gpu {
            args.push("--disable-gpu".into());
        }
        if !flags.disable_blink_features.is_empty() {
            args.push(format!(
                "--disable-blink-features={}",
                flags.disable_blink_features.join(",")
            ));
        }
        if let Some(lang) = &flags.lang {
            args.push(format!("--lang={lang}"));
        }
        if let Some(agent) = &flags.user_agent {
            args.push(format!("--user-agent={agent}"));
        }
        args
    }

    fn build_chromium_config(&self, headless: bool) -> BrowserResult<ChromiumConfig> {
        let chromium = &self.config.chromium;
        let [width, height] = chromium.window_size;
        let mut builder = ChromiumConfig::builder().window_size(width, height);

        if let Some(path) = &chromium.executable_path {
            builder = builder.chrome_executable(path);
        }
        if !headless {
            builder = builder.with_head();
        }
        if !chromium.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(timeout) = chromium.request_timeout_seconds {
            builder = builder.request_timeout(Duration::from_secs(timeout));
        }
        if self.config.flags.exclude_automation_switch {
            builder = builder.disable_default_args();
        }

        builder = builder.args(self.chromium_args());
        builder.build().map_err(BrowserError::Configuration)
    }
}

/// One running browser. Call [`BrowserSession::shutdown`] when done; a
/// session dropped while its handler still runs leaks the chromium process.
#[derive(Debug)]
pub struct BrowserSession {
    browser: Browser,
    handler_task: Option<JoinHandle<()>>,
    config: Arc<ScraperConfig>,
}

impl BrowserSession {
    pub async fn open_page(&self) -> BrowserResult<BrowserChannelPage> {
        let page = self.browser.new_page("about:blank").await?;
        self.configure_page(&page).await?;
        let waits = &self.config.waits;
        Ok(BrowserChannelPage::new(
            page,
            waits.poll_interval(),
            waits.implicit_wait(),
        ))
    }

    pub async fn shutdown(mut self) -> BrowserResult<()> {
        info!("Shutting down Chromium instance");
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "Failed to close browser gracefully");
        }
        if let Some(handle) = self.handler_task.take() {
            handle.await?;
        }
        Ok(())
    }

    async fn configure_page(&self, page: &Page) -> BrowserResult<()> {
        let flags = &self.config.flags;
        if flags.hide_webdriver {
            page.evaluate_on_new_document(
                AddScriptToEvaluateOnNewDocumentParams::builder()
                    .source(HIDE_WEBDRIVER_SCRIPT)
                    .build()
                    .map_err(BrowserError::Configuration)?,
            )
            .await?;
        }

        if let Some(agent) = &flags.user_agent {
            let mut params_builder = SetUserAgentOverrideParams::builder().user_agent(agent.clone());
            if let Some(lang) = &flags.lang {
                params_builder = params_builder.accept_language(lang.clone());
            }
            let params = params_builder
                .build()
                .map_err(BrowserError::Configuration)?;
            page.set_user_agent(params).await?;
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handle) = &self.handler_task {
            if !handle.is_finished() {
                warn!("BrowserSession dropped without explicit shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(config: ScraperConfig) -> BrowserLauncher {
        BrowserLauncher::new(Arc::new(config))
    }

    #[test]
    fn default_args_hide_automation() {
        let args = launcher(ScraperConfig::default()).chromium_args();
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--start-maximized".to_string()));
        assert!(!args.iter().any(|arg| arg == "--enable-automation"));
    }

    #[test]
    fn base_args_only_replace_defaults_when_excluding_switch() {
        let mut config = ScraperConfig::default();
        config.flags.exclude_automation_switch = false;
        config.flags.start_maximized = false;
        let args = launcher(config).chromium_args();
        assert!(!args.contains(&"--no-first-run".to_string()));
        assert!(!args.contains(&"--start-maximized".to_string()));
        assert_eq!(args[0], "--window-size=1920,1080");
    }
}
