use crate::Str;

/// Default size of the bucket space. Global, not per-experiment.
pub const DEFAULT_BUCKET_SPACE_SIZE: u64 = 10_000;

/// How the engine reacts when the kill-switch store reports an outage.
///
/// Failing open and failing closed have opposite safety implications: open
/// keeps serving normal bucketing while an operator's kill may not be
/// visible; closed refuses to answer at all. The in-memory store never fails,
/// so this only matters with an external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryFailurePolicy {
    /// Treat the experiment as not killed, log a warning, and continue with
    /// normal bucketing. The default.
    #[default]
    FailOpen,
    /// Surface [`Error::RegistryUnavailable`](crate::Error) to the caller.
    FailClosed,
}

/// Operational parameters for the assignment engine.
///
/// # Examples
/// ```
/// # use abtest_core::EngineConfig;
/// let config = EngineConfig::new("seed-2025-q3", "s3cret-salt")
///     .bucket_space_size(100_000)
///     .fallback_variant("control");
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hash seed mixed into every bucket computation. Rotating it reshuffles
    /// all bucket assignments globally.
    pub hash_seed: Str,
    /// Key for the keyed hash. Rotating it also reshuffles all assignments.
    pub hmac_salt: Str,
    /// Size of the bucket space.
    pub bucket_space_size: u64,
    /// Variant name returned for kill-switch overrides, whether or not a
    /// variant of that name exists in the request.
    pub fallback_variant: Str,
    /// Reaction to kill-switch store outages.
    pub registry_failure_policy: RegistryFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            hash_seed: "default-seed".into(),
            hmac_salt: "temp-salt".into(),
            bucket_space_size: DEFAULT_BUCKET_SPACE_SIZE,
            fallback_variant: "control".into(),
            registry_failure_policy: RegistryFailurePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the given seed and salt and defaults for
    /// everything else.
    pub fn new(hash_seed: impl Into<Str>, hmac_salt: impl Into<Str>) -> Self {
        EngineConfig {
            hash_seed: hash_seed.into(),
            hmac_salt: hmac_salt.into(),
            ..EngineConfig::default()
        }
    }

    /// Read configuration from the environment: `HASH_SEED`, `HMAC_SALT`,
    /// and `DEFAULT_BUCKET_SPACE_SIZE`. Missing variables fall back to
    /// defaults; an unparseable bucket space size is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();
        if let Ok(seed) = std::env::var("HASH_SEED") {
            config.hash_seed = seed.into();
        }
        if let Ok(salt) = std::env::var("HMAC_SALT") {
            config.hmac_salt = salt.into();
        }
        if let Ok(size) = std::env::var("DEFAULT_BUCKET_SPACE_SIZE") {
            match size.parse() {
                Ok(size) => config.bucket_space_size = size,
                Err(_) => {
                    log::warn!(target: "abtest", size;
                               "ignoring unparseable DEFAULT_BUCKET_SPACE_SIZE");
                }
            }
        }
        config
    }

    /// Override the bucket space size.
    pub fn bucket_space_size(mut self, size: u64) -> Self {
        self.bucket_space_size = size;
        self
    }

    /// Override the kill-switch fallback variant name.
    pub fn fallback_variant(mut self, name: impl Into<Str>) -> Self {
        self.fallback_variant = name.into();
        self
    }

    /// Override the registry failure policy.
    pub fn registry_failure_policy(mut self, policy: RegistryFailurePolicy) -> Self {
        self.registry_failure_policy = policy;
        self
    }
}
