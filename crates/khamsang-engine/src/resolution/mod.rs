pub mod engine;
pub mod result;
pub mod scoring;

pub use engine::{ACCEPTANCE_THRESHOLD, rank, resolve, resolve_in_frame};
pub use result::Candidate;
pub use scoring::similarity;
