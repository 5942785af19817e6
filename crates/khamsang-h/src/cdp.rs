//! Chromium session: one browser, one page, pinned viewport.

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use khamsang_engine::config::ViewportConfig;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reused profile directory; left in place on close.
pub const USER_DATA_DIR_ENV: &str = "KHAMSANG_USER_DATA_DIR";

#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    pub visible: bool,
    pub viewport: ViewportConfig,
}

enum Profile {
    Shared(PathBuf),
    Scratch(PathBuf),
}

impl Profile {
    fn resolve() -> Result<Self, BoxError> {
        if let Ok(dir) = std::env::var(USER_DATA_DIR_ENV) {
            let path = PathBuf::from(dir);
            std::fs::create_dir_all(&path)?;
            tracing::info!("Using shared profile: {}", path.display());
            return Ok(Profile::Shared(path));
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("System clock error: {}", e))?
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "khamsang-profile-{}-{}",
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&path)?;
        tracing::debug!("Using scratch profile: {}", path.display());
        Ok(Profile::Scratch(path))
    }

    fn path(&self) -> &Path {
        match self {
            Profile::Shared(path) | Profile::Scratch(path) => path,
        }
    }

    fn discard(self) {
        if let Profile::Scratch(path) = self {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                tracing::debug!("Failed to remove scratch profile {}: {}", path.display(), e);
            }
        }
    }
}

pub struct CdpClient {
    browser: Browser,
    handler_task: JoinHandle<()>,
    pub page: Page,
    viewport: ViewportConfig,
    profile: Profile,
}

impl CdpClient {
    pub async fn launch(options: LaunchOptions) -> Result<Self, BoxError> {
        let profile = Profile::resolve()?;
        let ViewportConfig { width, height } = options.viewport;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path())
            .window_size(width, height);
        if options.visible {
            builder = builder.with_head();
        }
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            builder = builder.chrome_executable(chrome_bin);
        }
        tracing::info!(visible = options.visible, width, height, "Launching Chromium");

        let (browser, mut handler) = Browser::launch(
            builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        // Scale factor 1: a screenshot pixel is one CSS pixel, so resolved
        // coordinates can be sent to Input.dispatchMouseEvent unchanged.
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(width),
            i64::from(height),
            1.0,
            false,
        ))
        .await
        .map_err(|e| format!("Failed to pin viewport: {}", e))?;

        // Dialogs block input events; accept them.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;
        let dialog_page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!("Accepting JavaScript dialog: {}", event.message);
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::error!("Failed to accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            viewport: options.viewport,
            profile,
        })
    }

    pub fn viewport(&self) -> ViewportConfig {
        self.viewport
    }

    pub async fn close(mut self) -> Result<(), BoxError> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;
        self.profile.discard();
        Ok(())
    }
}
