use crate::cdp::{CdpClient, LaunchOptions};
use crate::page_script::{PROBE_JS, SCROLL_JS, run_at};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::page::ScreenshotParams;
use khamsang_engine::backend::{Backend, CapabilityError, NavigationResult};
use khamsang_engine::error_mapping::classify_message;
use khamsang_engine::protocol::Point;
use tracing::{debug, info};

pub struct HeadlessBackend {
    client: Option<CdpClient>,
    options: LaunchOptions,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_options(LaunchOptions::default())
    }

    pub fn with_options(options: LaunchOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    fn page(&self) -> Result<&Page, CapabilityError> {
        self.client
            .as_ref()
            .map(|client| &client.page)
            .ok_or(CapabilityError::NotReady)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

async fn navigation_result(page: &Page) -> Result<NavigationResult, CapabilityError> {
    let title = page
        .get_title()
        .await
        .unwrap_or_default()
        .unwrap_or_default();
    let url = page
        .url()
        .await
        .map_err(|e| CapabilityError::Navigation(e.to_string()))?
        .unwrap_or_default();
    Ok(NavigationResult { url, title })
}

async fn mouse_event(
    page: &Page,
    kind: DispatchMouseEventType,
    point: Point,
) -> Result<(), CapabilityError> {
    let mut builder = DispatchMouseEventParams::builder()
        .r#type(kind.clone())
        .x(point.x as f64)
        .y(point.y as f64);
    if kind != DispatchMouseEventType::MouseMoved {
        builder = builder.button(MouseButton::Left).click_count(1);
    }
    let params = builder
        .build()
        .map_err(|e| CapabilityError::InvalidArgument(format!("mouse event: {}", e)))?;
    page.execute(params)
        .await
        .map_err(|e| classify_message(&e.to_string()))?;
    Ok(())
}

async fn click(page: &Page, point: Point) -> Result<(), CapabilityError> {
    let probe = run_at(page, PROBE_JS, point).await?;
    debug!(x = point.x, y = point.y, tag = ?probe.get("tag"), "clicking");

    mouse_event(page, DispatchMouseEventType::MouseMoved, point).await?;
    mouse_event(page, DispatchMouseEventType::MousePressed, point).await?;
    mouse_event(page, DispatchMouseEventType::MouseReleased, point).await
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), CapabilityError> {
        info!("Launching headless backend (Chromium)...");
        let client = CdpClient::launch(self.options)
            .await
            .map_err(|e| CapabilityError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), CapabilityError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| CapabilityError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, CapabilityError> {
        let page = self.page()?;

        info!("Navigating to: {}", url);
        page.goto(url).await.map_err(|e| {
            match classify_message(&e.to_string()) {
                CapabilityError::Other(message) => CapabilityError::Navigation(message),
                transient => transient,
            }
        })?;

        navigation_result(page).await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, CapabilityError> {
        let page = self.page()?;
        page.screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| classify_message(&format!("Screenshot failed: {}", e)))
    }

    async fn click_at(&mut self, point: Point) -> Result<(), CapabilityError> {
        click(self.page()?, point).await
    }

    async fn type_at(&mut self, point: Point, text: &str) -> Result<(), CapabilityError> {
        let page = self.page()?;
        click(page, point).await?;

        page.execute(InsertTextParams::new(text))
            .await
            .map_err(|e| classify_message(&e.to_string()))?;
        Ok(())
    }

    async fn scroll_to(&mut self, point: Point) -> Result<(), CapabilityError> {
        run_at(self.page()?, SCROLL_JS, point).await.map(|_| ())
    }
}
