/// Represents a result type for operations in the assignment core.
///
/// This type alias is used throughout the crate to indicate the result of
/// operations that may return errors specific to assignment evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur in the assignment core.
///
/// None of these are retryable from inside the core: the evaluation path has
/// no I/O, and the one potential suspension point (an external kill-switch
/// store) reports its outages as [`Error::RegistryUnavailable`] for the
/// caller to act on.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A required request field is missing or empty. Caller's fault; surfaced
    /// as a client error and not retryable.
    #[error("invalid request: {reason}")]
    ValidationError {
        /// What exactly is wrong with the request.
        reason: &'static str,
    },

    /// Variant weights sum to zero or a negative value, so no allocation
    /// table can be built. Configuration fault; not retryable.
    #[error("total variant allocation must be greater than zero")]
    InvalidAllocation,

    /// The kill-switch backing store is unreachable. Transient; whether the
    /// engine fails open or closed on this is governed by
    /// [`RegistryFailurePolicy`](crate::RegistryFailurePolicy).
    #[error("kill-switch registry unavailable: {reason}")]
    RegistryUnavailable {
        /// Store-specific description of the outage.
        reason: String,
    },
}

impl Error {
    /// Return `true` if the error is the caller's fault (bad request or bad
    /// variant configuration) as opposed to an operational condition.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::ValidationError { .. } | Error::InvalidAllocation => true,
            Error::RegistryUnavailable { .. } => false,
        }
    }
}
