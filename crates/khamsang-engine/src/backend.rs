use async_trait::async_trait;
pub use khamsang_common::CapabilityError;
use khamsang_common::protocol::Point;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Browser capabilities driven by dispatched intents.
///
/// Coordinates are screenshot pixels, the same space evidence boxes are
/// reported in. One session handle serves one instruction at a time, which the
/// `&mut self` receivers enforce.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), CapabilityError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), CapabilityError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, CapabilityError>;

    /// Capture the current viewport as PNG bytes.
    async fn screenshot(&mut self) -> Result<Vec<u8>, CapabilityError>;

    async fn click_at(&mut self, point: Point) -> Result<(), CapabilityError>;

    /// Focus the element under `point` and enter `text`.
    async fn type_at(&mut self, point: Point, text: &str) -> Result<(), CapabilityError>;

    /// Bring the element under `point` into view.
    async fn scroll_to(&mut self, _point: Point) -> Result<(), CapabilityError> {
        Err(CapabilityError::NotSupported("scroll_to".into()))
    }
}
