//! OCR service client.
//!
//! Request: `{"image": <base64 png>, "languages": ["th", "en"]}`.
//! Response: `{"results": [{"box": [[x, y]; 4], "text": "...", "confidence": 0.93}]}`.
//! Template requests add `"template"` and `"label"` and answer with
//! `{"matches": [{"box": ..., "confidence": ...}]}`.

use super::{EvidenceCollector, EvidenceError, Template};
use crate::config::EvidenceConfig;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use khamsang_common::protocol::{BoundingBox, EvidenceHit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    image: String,
    languages: &'a [String],
}

#[derive(Serialize)]
struct TemplateRequest<'a> {
    image: String,
    template: String,
    label: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<Recognition>,
}

#[derive(Debug, Deserialize)]
struct Recognition {
    #[serde(rename = "box")]
    quad: [[f32; 2]; 4],
    text: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct TemplateResponse {
    #[serde(default)]
    matches: Vec<TemplateMatch>,
}

#[derive(Debug, Deserialize)]
struct TemplateMatch {
    #[serde(rename = "box")]
    quad: [[f32; 2]; 4],
    confidence: f32,
}

pub struct HttpEvidenceCollector {
    client: reqwest::Client,
    endpoint: Url,
    template_endpoint: Option<Url>,
    languages: Vec<String>,
    min_confidence: f32,
}

impl HttpEvidenceCollector {
    pub fn new(endpoint: &str) -> Result<Self, EvidenceError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: parse_endpoint(endpoint)?,
            template_endpoint: None,
            languages: vec!["th".into(), "en".into()],
            min_confidence: 0.5,
        })
    }

    /// `None` when no OCR endpoint is configured.
    pub fn from_config(config: &EvidenceConfig) -> Result<Option<Self>, EvidenceError> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };
        let template_endpoint = config
            .template_endpoint
            .as_deref()
            .map(parse_endpoint)
            .transpose()?;
        Ok(Some(Self {
            client: reqwest::Client::new(),
            endpoint: parse_endpoint(endpoint)?,
            template_endpoint,
            languages: config.languages.clone(),
            min_confidence: config.min_confidence,
        }))
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: &Url,
        body: &Req,
    ) -> Result<Resp, EvidenceError> {
        let response = self.client.post(url.clone()).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvidenceError::Service {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Resp>().await?)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, EvidenceError> {
    Url::parse(endpoint).map_err(|_| EvidenceError::InvalidEndpoint(endpoint.to_string()))
}

#[async_trait]
impl EvidenceCollector for HttpEvidenceCollector {
    async fn recognize_text(&self, image: &[u8]) -> Result<Vec<EvidenceHit>, EvidenceError> {
        let request = RecognizeRequest {
            image: STANDARD.encode(image),
            languages: &self.languages,
        };
        let response: RecognizeResponse = self.post(&self.endpoint, &request).await?;
        let total = response.results.len();

        let hits: Vec<EvidenceHit> = response
            .results
            .into_iter()
            .filter(|r| r.confidence >= self.min_confidence && !r.text.trim().is_empty())
            .map(|r| EvidenceHit::text(BoundingBox::from_quad(&r.quad), r.text, r.confidence))
            .collect();
        debug!(total, kept = hits.len(), "text recognition finished");
        Ok(hits)
    }

    async fn match_template(
        &self,
        image: &[u8],
        template: &Template,
    ) -> Result<Vec<EvidenceHit>, EvidenceError> {
        let Some(url) = &self.template_endpoint else {
            return Ok(Vec::new());
        };
        let request = TemplateRequest {
            image: STANDARD.encode(image),
            template: STANDARD.encode(&template.image),
            label: &template.label,
        };
        let response: TemplateResponse = self.post(url, &request).await?;

        Ok(response
            .matches
            .into_iter()
            .filter(|m| m.confidence >= self.min_confidence)
            .map(|m| {
                EvidenceHit::template(
                    BoundingBox::from_quad(&m.quad),
                    template.label.clone(),
                    m.confidence,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(matches!(
            HttpEvidenceCollector::new("not a url"),
            Err(EvidenceError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_from_config_without_endpoint() {
        let collector = HttpEvidenceCollector::from_config(&EvidenceConfig::default()).unwrap();
        assert!(collector.is_none());
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"results": [
            {"box": [[10, 10], [110, 12], [110, 42], [10, 40]], "text": "ส่งข้อมูล", "confidence": 0.91},
            {"box": [[0, 0], [5, 0], [5, 5], [0, 5]], "text": "x", "confidence": 0.2}
        ]}"#;
        let response: RecognizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(
            BoundingBox::from_quad(&response.results[0].quad),
            BoundingBox::new(10.0, 10.0, 100.0, 32.0)
        );
    }
}
