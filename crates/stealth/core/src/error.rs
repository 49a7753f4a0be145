//! Common error infrastructure for stealth-core.
//!
//! Engine operations themselves never fail: missing collaborators degrade to
//! safe defaults and out-of-range inputs are clamped. The errors here cover
//! the edges where a caller can act on a failure: validating configuration
//! and reaching an oracle that was never supplied.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; the same call may succeed later.
    Recoverable,

    /// Invalid input that should be corrected before retrying.
    ///
    /// Examples: non-monotonic thresholds, negative weights
    Validation,

    /// Unexpected state inconsistency. Indicates a bug.
    Internal,

    /// Required collaborator missing; the caller cannot proceed.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all stealth-core errors.
pub trait StealthError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier of the variant, stable across releases.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A scoring configuration violates one of its invariants.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("weight `{field}` must be non-negative (got {value})")]
    NegativeWeight { field: &'static str, value: f32 },

    #[error("thresholds in `{group}` must increase monotonically")]
    NonMonotonicThresholds { group: &'static str },

    #[error("`{field}` is out of range (got {value})")]
    OutOfRange { field: &'static str, value: f32 },
}

impl StealthError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeWeight { .. } => "CONFIG_NEGATIVE_WEIGHT",
            Self::NonMonotonicThresholds { .. } => "CONFIG_NON_MONOTONIC_THRESHOLDS",
            Self::OutOfRange { .. } => "CONFIG_OUT_OF_RANGE",
        }
    }
}

/// Errors that occur when accessing oracles through [`crate::env::Env`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("TraceOracle not available")]
    TracesNotAvailable,

    #[error("ActorOracle not available")]
    ActorsNotAvailable,

    #[error("ClockOracle not available")]
    ClockNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,
}

impl StealthError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        // Missing oracles are fatal for the operation that needs them.
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TracesNotAvailable => "ORACLE_TRACES_NOT_AVAILABLE",
            Self::ActorsNotAvailable => "ORACLE_ACTORS_NOT_AVAILABLE",
            Self::ClockNotAvailable => "ORACLE_CLOCK_NOT_AVAILABLE",
            Self::RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
        }
    }
}
