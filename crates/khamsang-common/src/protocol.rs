use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================
// Instruction
// ============================================================

/// Source language hint declared by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHint {
    Thai,
    #[default]
    Auto,
}

/// Language detected from the characters of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedLanguage {
    Thai,
    Latin,
}

/// A raw operator instruction. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    text: String,
    #[serde(default)]
    language: LanguageHint,
}

impl Instruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: LanguageHint::Auto,
        }
    }

    pub fn thai(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: LanguageHint::Thai,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> LanguageHint {
        self.language
    }

    /// Thai when the hint says so or when any Thai-script character is present.
    pub fn detected_language(&self) -> DetectedLanguage {
        if self.language == LanguageHint::Thai || self.text.chars().any(is_thai_char) {
            DetectedLanguage::Thai
        } else {
            DetectedLanguage::Latin
        }
    }
}

/// True for characters of the Thai Unicode block.
pub fn is_thai_char(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

// ============================================================
// Intent
// ============================================================

/// Canonical action identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionId {
    Open,
    Click,
    Type,
    Navigate,
    Screenshot,
    Scroll,
}

impl ActionId {
    /// Actions that need a resolved screen coordinate before dispatch.
    pub fn requires_target(self) -> bool {
        matches!(self, ActionId::Click | ActionId::Type | ActionId::Scroll)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionId::Open => "open",
            ActionId::Click => "click",
            ActionId::Type => "type",
            ActionId::Navigate => "navigate",
            ActionId::Screenshot => "screenshot",
            ActionId::Scroll => "scroll",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ActionId::Open),
            "click" => Ok(ActionId::Click),
            "type" => Ok(ActionId::Type),
            "navigate" => Ok(ActionId::Navigate),
            "screenshot" => Ok(ActionId::Screenshot),
            "scroll" => Ok(ActionId::Scroll),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// Canonical element category identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementCategoryId {
    Button,
    Link,
    Input,
    Form,
}

impl ElementCategoryId {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementCategoryId::Button => "button",
            ElementCategoryId::Link => "link",
            ElementCategoryId::Input => "input",
            ElementCategoryId::Form => "form",
        }
    }
}

impl fmt::Display for ElementCategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementCategoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "button" => Ok(ElementCategoryId::Button),
            "link" => Ok(ElementCategoryId::Link),
            "input" => Ok(ElementCategoryId::Input),
            "form" => Ok(ElementCategoryId::Form),
            other => Err(format!("unknown element category '{}'", other)),
        }
    }
}

/// Structured interpretation of an instruction.
///
/// `confidence` is the clamped sum of fixed per-signal weights. An intent
/// without an action is well-formed but cannot be dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Option<ActionId>,
    pub target_category: Option<ElementCategoryId>,
    pub target_description: String,
    /// Text to enter for `type` intents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub confidence: f32,
}

impl Intent {
    pub fn is_executable(&self) -> bool {
        self.action.is_some()
    }

    pub fn requires_target(&self) -> bool {
        self.action.is_some_and(ActionId::requires_target)
    }
}

// ============================================================
// Evidence
// ============================================================

/// Axis-aligned box in screenshot pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box enclosing a four-point quadrilateral (OCR engines report
    /// rotated text as corner points).
    pub fn from_quad(points: &[[f32; 2]; 4]) -> Self {
        let min_x = points.iter().map(|p| p[0]).fold(f32::INFINITY, f32::min);
        let min_y = points.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min);
        let max_x = points.iter().map(|p| p[0]).fold(f32::NEG_INFINITY, f32::max);
        let max_y = points.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    #[default]
    Text,
    Template,
}

/// A recognized text run or template match on one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceHit {
    pub bounding_box: BoundingBox,
    pub recognized_text: String,
    #[serde(deserialize_with = "unit_interval")]
    pub recognition_confidence: f32,
    #[serde(default)]
    pub kind: EvidenceKind,
}

/// Confidences from outside sources are clamped into `[0, 1]` on load.
fn unit_interval<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    Ok(if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    })
}

impl EvidenceHit {
    pub fn text(bounding_box: BoundingBox, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bounding_box,
            recognized_text: text.into(),
            recognition_confidence: confidence.clamp(0.0, 1.0),
            kind: EvidenceKind::Text,
        }
    }

    pub fn template(bounding_box: BoundingBox, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bounding_box,
            recognized_text: label.into(),
            recognition_confidence: confidence.clamp(0.0, 1.0),
            kind: EvidenceKind::Template,
        }
    }
}

// ============================================================
// Resolution & outcome
// ============================================================

/// Result of mapping a description to a coordinate. A missing `source_hit`
/// with zero confidence means resolution failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub coordinate: Option<Point>,
    pub resolution_confidence: f32,
    pub source_hit: Option<EvidenceHit>,
}

impl ResolvedTarget {
    pub fn not_found() -> Self {
        Self {
            coordinate: None,
            resolution_confidence: 0.0,
            source_hit: None,
        }
    }

    pub fn from_hit(hit: EvidenceHit, score: f32) -> Self {
        Self {
            coordinate: Some(hit.bounding_box.center()),
            resolution_confidence: score.clamp(0.0, 1.0),
            source_hit: Some(hit),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.source_hit.is_some() && self.coordinate.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoActionRecognized,
    TargetNotFound,
    CapabilityTransientFailure,
    CapabilityFatalFailure,
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NoActionRecognized => "no action recognized",
            ErrorKind::TargetNotFound => "target not found",
            ErrorKind::CapabilityTransientFailure => "transient capability failure",
            ErrorKind::CapabilityFatalFailure => "fatal capability failure",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Terminal result of one dispatched instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub succeeded: bool,
    pub attempts: u32,
    pub last_error: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing)]
    pub screenshot: Option<Vec<u8>>,
}

impl ActionOutcome {
    pub fn success(attempts: u32) -> Self {
        Self {
            succeeded: true,
            attempts,
            last_error: None,
            detail: None,
            screenshot: None,
        }
    }

    pub fn failure(kind: ErrorKind, attempts: u32) -> Self {
        Self {
            succeeded: false,
            attempts,
            last_error: Some(kind),
            detail: None,
            screenshot: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }
}
