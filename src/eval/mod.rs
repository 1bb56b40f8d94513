//! Output quality evaluation.

pub mod hallucination;
pub mod listener;

pub use hallucination::{HallucinationMetric, HallucinationScore};
pub use listener::EvalListener;
