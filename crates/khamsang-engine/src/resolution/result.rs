use khamsang_common::protocol::EvidenceHit;
use serde::{Deserialize, Serialize};

/// One scored evidence hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position of the hit in its evidence set.
    pub index: usize,
    pub hit: EvidenceHit,
    pub similarity: f32,
    /// `similarity * recognition_confidence`
    pub score: f32,
}
