use serde::Serialize;

use crate::allocation::AllocationRange;
use crate::Str;

/// Result of assignment evaluation. Created fresh per request and never
/// persisted by the core; callers may cache it or embed its fields into
/// analytics events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    /// Experiment the assignment was evaluated for.
    pub experiment_id: Str,
    /// User the assignment was evaluated for.
    pub user_id: Str,
    /// Name of the assigned variant.
    pub variant: Str,
    /// Stable identifier of the (experiment, variant) pair, always
    /// `"{experiment_id}|{variant}"`. See [`parse_assignment_id`].
    pub assignment_id: String,
    /// Bucket the user hashed into. `None` for kill-switch overrides, which
    /// bypass bucketing entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<u64>,
    /// The allocation table the bucket was resolved against, in variant input
    /// order. Empty for kill-switch overrides.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<AllocationRange>,
    /// `true` when the kill switch forced the fallback variant.
    #[serde(rename = "killer", skip_serializing_if = "is_false")]
    pub kill_switched: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Format the stable assignment identifier for an (experiment, variant) pair.
///
/// Neither identifier may contain `|`, since it is the separator that
/// [`parse_assignment_id`] splits on.
pub fn format_assignment_id(experiment_id: &str, variant: &str) -> String {
    format!("{experiment_id}|{variant}")
}

/// Split an assignment identifier back into `(experiment_id, variant)`.
/// Returns `None` if the identifier has no separator.
pub fn parse_assignment_id(assignment_id: &str) -> Option<(&str, &str)> {
    assignment_id.split_once('|')
}
