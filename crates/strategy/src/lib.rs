pub mod evaluator;
pub mod ratio;

pub use evaluator::RatioEvaluator;
pub use ratio::{classify, compute_ratio, percent_change};
