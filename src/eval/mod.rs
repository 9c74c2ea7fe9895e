//! Assignment evaluation.

mod eval_assignment;
mod evaluator;

pub use eval_assignment::get_assignment;
pub use evaluator::{Evaluator, EvaluatorConfig};
