use super::{EvidenceCollector, EvidenceError, Template};
use async_trait::async_trait;
use khamsang_common::protocol::{EvidenceHit, EvidenceKind};
use std::path::Path;

/// Serves the same hits for every frame.
///
/// Text hits answer `recognize_text`; template hits answer `match_template`
/// for the template with the same label. Used offline by `khamsang resolve`
/// and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEvidence {
    hits: Vec<EvidenceHit>,
}

impl StaticEvidence {
    pub fn new(hits: Vec<EvidenceHit>) -> Self {
        Self { hits }
    }

    /// Load hits from a JSON array of `EvidenceHit`.
    pub async fn load(path: &Path) -> Result<Self, EvidenceError> {
        let content = tokio::fs::read_to_string(path).await?;
        let hits: Vec<EvidenceHit> = serde_json::from_str(&content)?;
        Ok(Self::new(hits))
    }

    pub fn hits(&self) -> &[EvidenceHit] {
        &self.hits
    }
}

#[async_trait]
impl EvidenceCollector for StaticEvidence {
    async fn recognize_text(&self, _image: &[u8]) -> Result<Vec<EvidenceHit>, EvidenceError> {
        Ok(self
            .hits
            .iter()
            .filter(|hit| hit.kind == EvidenceKind::Text)
            .cloned()
            .collect())
    }

    async fn match_template(
        &self,
        _image: &[u8],
        template: &Template,
    ) -> Result<Vec<EvidenceHit>, EvidenceError> {
        Ok(self
            .hits
            .iter()
            .filter(|hit| hit.kind == EvidenceKind::Template && hit.recognized_text == template.label)
            .cloned()
            .collect())
    }
}
