use std::sync::Arc;

use crate::allocation::Variant;
use crate::bucketer::HmacSha256Bucketer;
use crate::kill_switch::KillSwitchStore;
use crate::{Assignment, EngineConfig, Result, Str};

/// Dependencies of an [`Evaluator`].
pub struct EvaluatorConfig {
    /// Kill-switch backing store shared with operator tooling.
    pub kill_switch_store: Arc<dyn KillSwitchStore>,
    /// Operational parameters (seed, salt, bucket space, failure policy).
    pub engine: EngineConfig,
}

/// Evaluator simplifies calling into evaluation functions: it carries the
/// engine configuration and the kill-switch store so callers don't thread
/// them through every request, and exposes the kill-switch management
/// operations next to assignment.
///
/// Evaluation itself is pure; an `Evaluator` is safe to share across threads.
pub struct Evaluator {
    config: EvaluatorConfig,
    bucketer: HmacSha256Bucketer,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Evaluator {
        Evaluator {
            config,
            bucketer: HmacSha256Bucketer,
        }
    }

    /// Assign `user_id` to a variant of `experiment_id`.
    pub fn get_assignment(
        &self,
        experiment_id: &Str,
        user_id: &Str,
        variants: &[Variant],
    ) -> Result<Assignment> {
        super::get_assignment(
            &self.config.engine,
            &self.bucketer,
            self.config.kill_switch_store.as_ref(),
            experiment_id,
            user_id,
            variants,
        )
    }

    /// Set the kill switch for an experiment.
    pub fn set_killed(&self, experiment_id: &str, killed: bool) -> Result<()> {
        self.config.kill_switch_store.set_killed(experiment_id, killed)
    }

    /// Read the kill switch for an experiment.
    pub fn is_killed(&self, experiment_id: &str) -> Result<bool> {
        self.config.kill_switch_store.is_killed(experiment_id)
    }
}
