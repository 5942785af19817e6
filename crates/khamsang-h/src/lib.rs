//! Headless Chromium capability for the khamsang pipeline.

pub mod backend;
pub mod cdp;
mod page_script;

pub use backend::HeadlessBackend;
pub use cdp::LaunchOptions;
