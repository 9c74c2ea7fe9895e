//! `abtest_core` is a deterministic experiment-assignment (A/B bucketing)
//! core: given a user identifier, an experiment identifier, and a list of
//! weighted variants, it always returns the same variant for the same
//! (user, experiment) pair, with traffic proportions matching the configured
//! weights, and supports an operator-controlled kill switch that overrides
//! assignment without altering the allocation math.
//!
//! # Overview
//!
//! `abtest_core` is organized as a set of small building blocks; transports
//! (HTTP routing, event persistence, UI) are expected to be thin glue on top.
//!
//! [`bucketer::Bucketer`] maps a (user, experiment, seed) triple to a stable
//! bucket in a fixed-size bucket space using a keyed cryptographic hash. The
//! default implementation is [`bucketer::HmacSha256Bucketer`].
//!
//! [`allocation::AllocationTable`] partitions the bucket space into
//! contiguous, non-overlapping ranges, one per variant, proportional to the
//! variant weights. The partition is deterministic and reproducible from the
//! variants list alone.
//!
//! [`eval::get_assignment`] orchestrates a request: kill-switch check →
//! allocation table build → bucket computation → range lookup → [`Assignment`]
//! assembly. It is a pure function; [`eval::Evaluator`] is a helper that
//! carries the configuration and kill-switch store so callers don't pass
//! repeated parameters.
//!
//! [`kill_switch::KillSwitchStore`] is the one piece of shared mutable state:
//! a mapping from experiment to a killed flag, read by every request and
//! written by operators. The in-memory implementation suits single-process
//! deployments; multi-process deployments must inject a store backed by a
//! shared system, or each process sees an independent view of kill status.
//!
//! [`events`] defines the record that callers embed assignment results into
//! and submit to their analytics storage. The core does not log events
//! itself; it guarantees that [`Assignment::assignment_id`] is stable and
//! parseable as `"{experiment_id}|{variant}"`.
//!
//! Configuration (hash seed, HMAC salt, bucket space size, fallback variant,
//! registry failure policy) lives in [`EngineConfig`]; rotating the seed or
//! salt reshuffles every bucket assignment globally.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod allocation;
pub mod bucketer;
pub mod eval;
pub mod events;
pub mod kill_switch;

mod assignment;
mod config;
mod error;
mod str;

pub use crate::str::Str;
pub use assignment::{format_assignment_id, parse_assignment_id, Assignment};
pub use config::{EngineConfig, RegistryFailurePolicy, DEFAULT_BUCKET_SPACE_SIZE};
pub use error::{Error, Result};
