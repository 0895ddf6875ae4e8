pub mod classifier;
pub mod models;
pub mod normalize;
pub mod rules;
pub mod summary;

pub use classifier::{clamp_score, classify, classify_with_trace, MatchTrace, ScorePenalty};
pub use models::*;
pub use normalize::normalize_label_text;
pub use summary::EMPTY_INPUT_SUMMARY;
