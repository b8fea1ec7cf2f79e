//! Candidate selection, priority scoring, and the dispatch orchestrator.

mod engine;
mod payload;
mod scoring;
mod selector;

pub use engine::DispatchEngine;
pub use payload::{MAX_PAYLOAD_STOPS, RideOfferPayload};
pub use scoring::{PriorityWeights, ScoredCandidate, rank_candidates, score_candidate};
pub use selector::select_candidates;
