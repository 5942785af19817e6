use super::loader::ConfigError;
use khamsang_common::protocol::{ActionId, ElementCategoryId};
use khamsang_parser::{Dictionary, Lexicon, LexiconError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KhamsangConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Site aliases expanded by `open`/`navigate`.
    #[serde(default = "default_sites")]
    pub sites: BTreeMap<String, String>,
}

impl Default for KhamsangConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            lexicon: LexiconConfig::default(),
            evidence: EvidenceConfig::default(),
            viewport: ViewportConfig::default(),
            sites: default_sites(),
        }
    }
}

impl KhamsangConfig {
    /// Default phrases plus the configured ones.
    pub fn build_lexicon(&self) -> Result<Lexicon, LexiconError> {
        let mut builder = Lexicon::builder();
        for (phrase, id) in &self.lexicon.actions {
            builder = builder.action(phrase.as_str(), *id);
        }
        for (phrase, id) in &self.lexicon.categories {
            builder = builder.category(phrase.as_str(), *id);
        }
        builder.build()
    }

    /// Embedded word list plus configured words and every configured phrase,
    /// so Thai phrases segment as whole words.
    pub fn build_dictionary(&self) -> Dictionary {
        let phrases = self
            .lexicon
            .actions
            .keys()
            .chain(self.lexicon.categories.keys());
        Dictionary::with_extra_words(self.lexicon.words.iter().chain(phrases))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.timeout_ms == 0 {
            return Err(invalid("dispatch.timeout_ms", "must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.evidence.min_confidence) {
            return Err(invalid("evidence.min_confidence", "must be within 0..=1"));
        }
        for (field, endpoint) in [
            ("evidence.endpoint", &self.evidence.endpoint),
            ("evidence.template_endpoint", &self.evidence.template_endpoint),
        ] {
            if let Some(endpoint) = endpoint {
                if !is_http_url(endpoint) {
                    return Err(invalid(field, &format!("'{}' is not an http(s) URL", endpoint)));
                }
            }
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(invalid("viewport", "width and height must be greater than zero"));
        }
        for (alias, url) in &self.sites {
            if !is_http_url(url) {
                return Err(invalid(
                    &format!("sites.{}", alias),
                    &format!("'{}' is not an http(s) URL", url),
                ));
            }
        }
        self.build_lexicon()?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DispatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_timeout_ms() -> u64 {
    30000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub actions: BTreeMap<String, ActionId>,
    #[serde(default)]
    pub categories: BTreeMap<String, ElementCategoryId>,
    /// Extra dictionary words for Thai segmentation.
    #[serde(default)]
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// OCR service receiving base64 screenshots.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Template matching service; templates are skipped without it.
    #[serde(default)]
    pub template_endpoint: Option<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Recognitions below this confidence are dropped by the collector.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            template_endpoint: None,
            languages: default_languages(),
            min_confidence: default_min_confidence(),
            templates: Vec::new(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["th".to_string(), "en".to_string()]
}

fn default_min_confidence() -> f32 {
    0.5
}

/// Browser viewport in CSS pixels. Screenshots are taken at a device scale
/// factor of 1, so screenshot pixels and click coordinates coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: u32,
    #[serde(default = "default_viewport_height")]
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub label: String,
    pub path: PathBuf,
}

fn default_sites() -> BTreeMap<String, String> {
    [
        ("google", "https://www.google.com"),
        ("กูเกิล", "https://www.google.com"),
        ("youtube", "https://www.youtube.com"),
        ("ยูทูบ", "https://www.youtube.com"),
        ("facebook", "https://www.facebook.com"),
        ("เฟซบุ๊ก", "https://www.facebook.com"),
    ]
    .into_iter()
    .map(|(alias, url)| (alias.to_string(), url.to_string()))
    .collect()
}
