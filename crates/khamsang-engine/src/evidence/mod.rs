//! Evidence collection: recognized text and template hits for one screenshot.
//!
//! Every `EvidenceSet` is stamped with the id of the `Frame` it came from and
//! is never reused for another frame.

pub mod fixed;
pub mod http;

pub use fixed::StaticEvidence;
pub use http::HttpEvidenceCollector;

use crate::config::TemplateConfig;
use async_trait::async_trait;
use khamsang_common::protocol::EvidenceHit;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("Evidence service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Evidence service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid evidence endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Failed to read evidence file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed evidence: {0}")]
    Json(#[from] serde_json::Error),
}

/// A reference image whose matches are reported under `label`.
#[derive(Debug, Clone)]
pub struct Template {
    pub label: String,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Read every configured template image.
    pub async fn load(configs: &[TemplateConfig]) -> Result<Self, EvidenceError> {
        let mut templates = Vec::with_capacity(configs.len());
        for config in configs {
            let image = tokio::fs::read(&config.path).await?;
            templates.push(Template {
                label: config.label.clone(),
                image,
            });
        }
        Ok(Self { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Source of evidence for a screenshot (OCR engine, template matcher, ...).
#[async_trait]
pub trait EvidenceCollector: Send + Sync {
    async fn recognize_text(&self, image: &[u8]) -> Result<Vec<EvidenceHit>, EvidenceError>;

    async fn match_template(
        &self,
        _image: &[u8],
        _template: &Template,
    ) -> Result<Vec<EvidenceHit>, EvidenceError> {
        Ok(Vec::new())
    }
}

/// All hits recognized on one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    pub frame_id: u64,
    pub hits: Vec<EvidenceHit>,
}

impl EvidenceSet {
    pub fn new(frame_id: u64, hits: Vec<EvidenceHit>) -> Self {
        Self { frame_id, hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A captured screenshot with a process-unique id.
#[derive(Debug, Clone)]
pub struct Frame {
    id: u64,
    bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            bytes,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Run text recognition and every template against this frame.
    pub async fn collect(
        &self,
        collector: &dyn EvidenceCollector,
        templates: &TemplateLibrary,
    ) -> Result<EvidenceSet, EvidenceError> {
        let mut hits = collector.recognize_text(&self.bytes).await?;
        for template in templates.iter() {
            let matches = collector.match_template(&self.bytes, template).await?;
            hits.extend(matches);
        }
        debug!(frame = self.id, hits = hits.len(), "collected evidence");
        Ok(EvidenceSet::new(self.id, hits))
    }
}
