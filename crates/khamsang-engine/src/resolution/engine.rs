//! Maps a target description to a screen coordinate using evidence hits.
//!
//! Candidates are ordered by combined score, then text hits before template
//! hits, then smaller boxes first, then scan order.

use super::result::Candidate;
use super::scoring::similarity_of_keys;
use crate::evidence::{EvidenceSet, Frame};
use khamsang_common::protocol::{EvidenceKind, ResolvedTarget};
use khamsang_parser::comparison_key;
use std::cmp::Ordering;
use tracing::debug;

/// Best candidates scoring below this are rejected.
pub const ACCEPTANCE_THRESHOLD: f32 = 0.5;

/// Score every hit against `description`, best first.
pub fn rank(description: &str, evidence: &EvidenceSet) -> Vec<Candidate> {
    let key = comparison_key(description);
    if key.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = evidence
        .hits
        .iter()
        .enumerate()
        .map(|(index, hit)| {
            let similarity = similarity_of_keys(&key, &comparison_key(&hit.recognized_text));
            Candidate {
                index,
                hit: hit.clone(),
                similarity,
                score: similarity * trust(hit.recognition_confidence),
            }
        })
        .collect();

    candidates.sort_by(compare_candidates);
    candidates
}

/// Recognition confidence limited to `[0, 1]`; hits can be built by hand.
fn trust(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| kind_rank(a.hit.kind).cmp(&kind_rank(b.hit.kind)))
        .then_with(|| a.hit.bounding_box.area().total_cmp(&b.hit.bounding_box.area()))
        .then_with(|| a.index.cmp(&b.index))
}

fn kind_rank(kind: EvidenceKind) -> u8 {
    match kind {
        EvidenceKind::Text => 0,
        EvidenceKind::Template => 1,
    }
}

pub fn resolve(description: &str, evidence: &EvidenceSet) -> ResolvedTarget {
    let Some(best) = rank(description, evidence).into_iter().next() else {
        debug!(description, "no candidates");
        return ResolvedTarget::not_found();
    };

    if best.score < ACCEPTANCE_THRESHOLD {
        debug!(
            description,
            best = %best.hit.recognized_text,
            score = best.score,
            "best candidate below threshold"
        );
        return ResolvedTarget::not_found();
    }

    debug!(
        description,
        matched = %best.hit.recognized_text,
        score = best.score,
        "target resolved"
    );
    ResolvedTarget::from_hit(best.hit, best.score)
}

/// Like [`resolve`], but fails when `evidence` was collected for a different
/// frame.
pub fn resolve_in_frame(description: &str, evidence: &EvidenceSet, frame: &Frame) -> ResolvedTarget {
    if evidence.frame_id != frame.id() {
        debug!(
            expected = frame.id(),
            got = evidence.frame_id,
            "evidence belongs to another frame"
        );
        return ResolvedTarget::not_found();
    }
    resolve(description, evidence)
}
