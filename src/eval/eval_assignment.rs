use crate::allocation::{AllocationTable, Variant};
use crate::assignment::{format_assignment_id, Assignment};
use crate::bucketer::Bucketer;
use crate::config::{EngineConfig, RegistryFailurePolicy};
use crate::error::{Error, Result};
use crate::kill_switch::KillSwitchStore;
use crate::Str;

/// Evaluate the assignment for the given user and experiment.
///
/// Pure and synchronous: apart from the kill-switch read there is no I/O,
/// no clock, and no randomness, so repeated calls with the same inputs and
/// configuration return the same assignment.
///
/// Steps: validate the request, check the kill switch (a killed experiment
/// short-circuits to the configured fallback variant, bypassing allocation
/// math entirely), build the allocation table, hash the user into a bucket,
/// and look up the owning range.
pub fn get_assignment(
    config: &EngineConfig,
    bucketer: &impl Bucketer,
    kill_switch: &dyn KillSwitchStore,
    experiment_id: &Str,
    user_id: &Str,
    variants: &[Variant],
) -> Result<Assignment> {
    validate_request(config, experiment_id, user_id, variants)?;

    if is_killed(config, kill_switch, experiment_id)? {
        let variant = config.fallback_variant.clone();
        log::trace!(target: "abtest", experiment_id, user_id, variant;
                    "kill switch engaged, overriding assignment");
        return Ok(Assignment {
            experiment_id: experiment_id.clone(),
            user_id: user_id.clone(),
            assignment_id: format_assignment_id(experiment_id, &variant),
            variant,
            bucket: None,
            ranges: Vec::new(),
            kill_switched: true,
        });
    }

    let table = AllocationTable::build(variants, config.bucket_space_size)?;
    let bucket = bucketer.bucket(
        user_id,
        experiment_id,
        &config.hash_seed,
        &config.hmac_salt,
        config.bucket_space_size,
    );

    let variant = match table.locate(bucket) {
        Some(range) => range.variant_name.clone(),
        None => {
            // Unreachable while the table covers the whole space. Kept as a
            // safety net for an invariant violation, not a normal code path.
            log::warn!(target: "abtest", experiment_id, user_id, bucket;
                       "bucket matched no allocation range, falling back to first variant");
            variants[0].name.clone()
        }
    };

    log::trace!(target: "abtest", experiment_id, user_id, bucket, variant;
                "evaluated an assignment");

    Ok(Assignment {
        experiment_id: experiment_id.clone(),
        user_id: user_id.clone(),
        assignment_id: format_assignment_id(experiment_id, &variant),
        variant,
        bucket: Some(bucket),
        ranges: table.into_ranges(),
        kill_switched: false,
    })
}

fn validate_request(
    config: &EngineConfig,
    experiment_id: &Str,
    user_id: &Str,
    variants: &[Variant],
) -> Result<()> {
    if experiment_id.is_empty() {
        return Err(Error::ValidationError {
            reason: "experiment_id must be non-empty",
        });
    }
    if user_id.is_empty() {
        return Err(Error::ValidationError {
            reason: "user_id must be non-empty",
        });
    }
    if variants.is_empty() {
        return Err(Error::ValidationError {
            reason: "variants must be non-empty",
        });
    }
    if config.bucket_space_size == 0 {
        return Err(Error::ValidationError {
            reason: "bucket_space_size must be positive",
        });
    }
    for (index, variant) in variants.iter().enumerate() {
        if variant.name.is_empty() {
            return Err(Error::ValidationError {
                reason: "variant names must be non-empty",
            });
        }
        if variants[..index].iter().any(|v| v.name == variant.name) {
            return Err(Error::ValidationError {
                reason: "variant names must be unique within a request",
            });
        }
    }
    Ok(())
}

fn is_killed(
    config: &EngineConfig,
    kill_switch: &dyn KillSwitchStore,
    experiment_id: &Str,
) -> Result<bool> {
    match kill_switch.is_killed(experiment_id) {
        Ok(killed) => Ok(killed),
        Err(err) => match config.registry_failure_policy {
            RegistryFailurePolicy::FailOpen => {
                log::warn!(target: "abtest", experiment_id;
                           "kill-switch store unavailable, proceeding as not killed: {err}");
                Ok(false)
            }
            RegistryFailurePolicy::FailClosed => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::get_assignment;
    use crate::allocation::Variant;
    use crate::bucketer::HmacSha256Bucketer;
    use crate::kill_switch::{InMemoryKillSwitchStore, KillSwitchStore};
    use crate::{EngineConfig, Error, RegistryFailurePolicy, Result, Str};

    fn assign(
        config: &EngineConfig,
        store: &dyn KillSwitchStore,
        experiment_id: &str,
        user_id: &str,
        variants: &[Variant],
    ) -> Result<crate::Assignment> {
        get_assignment(
            config,
            &HmacSha256Bucketer,
            store,
            &Str::from(experiment_id),
            &Str::from(user_id),
            variants,
        )
    }

    fn fifty_fifty() -> Vec<Variant> {
        vec![Variant::new("A", 50.0), Variant::new("B", 50.0)]
    }

    #[test]
    fn assignment_is_stable_across_calls() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();

        let first = assign(&config, &store, "exp", "user-1", &fifty_fifty()).unwrap();
        let second = assign(&config, &store, "exp", "user-1", &fifty_fifty()).unwrap();
        assert_eq!(first.assignment_id, second.assignment_id);
        assert_eq!(first.bucket, second.bucket);
        assert_eq!(first, second);
    }

    #[test]
    fn bucket_falls_inside_assigned_range() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();

        for i in 0..100 {
            let assignment =
                assign(&config, &store, "exp", &format!("user-{i}"), &fifty_fifty()).unwrap();
            let bucket = assignment.bucket.unwrap();
            let owner = assignment
                .ranges
                .iter()
                .find(|range| range.contains(bucket))
                .unwrap();
            assert_eq!(owner.variant_name, assignment.variant);
            assert_eq!(
                assignment.assignment_id,
                format!("exp|{}", assignment.variant)
            );
        }
    }

    #[test]
    fn traffic_split_is_roughly_proportional() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();

        let mut a = 0;
        for i in 0..2000 {
            let assignment =
                assign(&config, &store, "split-exp", &format!("user-{i}"), &fifty_fifty())
                    .unwrap();
            if assignment.variant == "A" {
                a += 1;
            }
        }
        // Loose bounds: 50% ± 15 percentage points is many standard
        // deviations of slack for 2000 deterministic-but-hash-spread users.
        assert!((700..=1300).contains(&a), "variant A got {a} of 2000");
    }

    #[test]
    fn zero_weight_variant_is_never_assigned() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();
        let variants = vec![Variant::new("A", 100.0), Variant::new("B", 0.0)];

        for i in 0..200 {
            let assignment =
                assign(&config, &store, "exp", &format!("user-{i}"), &variants).unwrap();
            assert_eq!(assignment.variant, "A");
        }
    }

    #[test]
    fn kill_switch_overrides_assignment() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();
        store.set_killed("E", true).unwrap();

        // No variant named "control" in the list; the override names it
        // anyway. That is the override contract, not a table lookup.
        let variants = vec![Variant::new("treatment-1", 50.0), Variant::new("treatment-2", 50.0)];
        let assignment = assign(&config, &store, "E", "user-1", &variants).unwrap();
        assert_eq!(assignment.variant, "control");
        assert_eq!(assignment.assignment_id, "E|control");
        assert!(assignment.kill_switched);
        assert_eq!(assignment.bucket, None);
        assert!(assignment.ranges.is_empty());

        // Other experiments are unaffected.
        let other = assign(&config, &store, "F", "user-1", &variants).unwrap();
        assert!(!other.kill_switched);

        // Flipping the switch back restores normal bucketing.
        store.set_killed("E", false).unwrap();
        let restored = assign(&config, &store, "E", "user-1", &variants).unwrap();
        assert!(!restored.kill_switched);
        assert!(restored.bucket.is_some());
    }

    #[test]
    fn kill_switch_fallback_variant_is_configurable() {
        let config = EngineConfig::default().fallback_variant("baseline");
        let store = InMemoryKillSwitchStore::new();
        store.set_killed("E", true).unwrap();

        let assignment = assign(&config, &store, "E", "user-1", &fifty_fifty()).unwrap();
        assert_eq!(assignment.variant, "baseline");
        assert_eq!(assignment.assignment_id, "E|baseline");
    }

    #[test]
    fn validation_errors() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();

        let cases: Vec<(&str, &str, Vec<Variant>)> = vec![
            ("", "user", fifty_fifty()),
            ("exp", "", fifty_fifty()),
            ("exp", "user", vec![]),
            ("exp", "user", vec![Variant::new("", 50.0)]),
            (
                "exp",
                "user",
                vec![Variant::new("A", 50.0), Variant::new("A", 50.0)],
            ),
        ];
        for (experiment_id, user_id, variants) in cases {
            let err = assign(&config, &store, experiment_id, user_id, &variants).unwrap_err();
            assert!(
                matches!(err, Error::ValidationError { .. }),
                "({experiment_id:?}, {user_id:?}) returned {err:?}"
            );
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn invalid_allocation_is_propagated() {
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();
        let variants = vec![Variant::new("A", 0.0), Variant::new("B", 0.0)];

        let err = assign(&config, &store, "exp", "user", &variants).unwrap_err();
        assert_eq!(err, Error::InvalidAllocation);
    }

    #[test]
    fn kill_switch_bypasses_allocation_validation() {
        // Killed experiments never reach allocation math, so an all-zero
        // variants list still yields the override.
        let config = EngineConfig::default();
        let store = InMemoryKillSwitchStore::new();
        store.set_killed("E", true).unwrap();

        let variants = vec![Variant::new("A", 0.0), Variant::new("B", 0.0)];
        let assignment = assign(&config, &store, "E", "user", &variants).unwrap();
        assert!(assignment.kill_switched);
    }

    /// Store stub that always reports an outage.
    struct UnavailableStore;

    impl KillSwitchStore for UnavailableStore {
        fn is_killed(&self, _experiment_id: &str) -> Result<bool> {
            Err(Error::RegistryUnavailable {
                reason: "connection refused".to_owned(),
            })
        }

        fn set_killed(&self, _experiment_id: &str, _killed: bool) -> Result<()> {
            Err(Error::RegistryUnavailable {
                reason: "connection refused".to_owned(),
            })
        }
    }

    #[test]
    fn registry_outage_fails_open_by_default() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = EngineConfig::default();

        let assignment = assign(&config, &UnavailableStore, "exp", "user", &fifty_fifty()).unwrap();
        assert!(!assignment.kill_switched);
        assert!(assignment.bucket.is_some());
    }

    #[test]
    fn registry_outage_fails_closed_when_configured() {
        let config =
            EngineConfig::default().registry_failure_policy(RegistryFailurePolicy::FailClosed);

        let err = assign(&config, &UnavailableStore, "exp", "user", &fifty_fifty()).unwrap_err();
        assert!(matches!(err, Error::RegistryUnavailable { .. }));
        assert!(!err.is_client_error());
    }
}
