pub mod loader;
pub mod schema;

pub use loader::{CONFIG_ENV, ConfigError, ConfigLoader};
pub use schema::{
    DispatchConfig, EvidenceConfig, KhamsangConfig, LexiconConfig, TemplateConfig, ViewportConfig,
};
