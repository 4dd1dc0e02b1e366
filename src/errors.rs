use thiserror::Error;
use time::OffsetDateTime;

/// Enumerates high-level errors returned while serving requests.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents a requested record count that is not a number or is
    /// out of range.
    #[error("Invalid count parameter. Must be a number between 1 and {max}")]
    InvalidCount { count: String, max: usize },

    /// Represents a snapshot whose lock was poisoned by a panic during
    /// an earlier generation.
    #[error("Failed to generate drum records")]
    SnapshotPoisoned,

    /// Represents a failure to render a response timestamp.
    #[error("Failed to format timestamp")]
    TimestampFormat {
        #[from]
        source: time::error::Format,
    },
}

/// Enumerates the ways a drum record can violate its invariants.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{value:?} does not start with {prefix:?}")]
    MissingPrefix { value: String, prefix: &'static str },

    #[error("weight {0} is not a two-decimal value in [10, 50)")]
    WeightOutOfRange(f64),

    #[error("unknown unit of measurement {0:?}")]
    UnknownUnit(String),

    #[error("unexpected UTC offset {0}")]
    UnexpectedUtcOffset(i8),

    #[error("invalid timestamp component")]
    InvalidTimestamp {
        #[from]
        source: time::error::ComponentRange,
    },

    #[error("tamper seal at {tamper_seal} is not within two hours after pour at {pour_date}")]
    SealOutsideWindow {
        pour_date: OffsetDateTime,
        tamper_seal: OffsetDateTime,
    },

    #[error("exactly one of sealed ({sealed}) and tampered ({tampered}) must be set")]
    AmbiguousTamperStatus { sealed: bool, tampered: bool },

    #[error("facial recognition scan hash {0:?} is not 64 lowercase hex characters")]
    MalformedScanHash(String),
}

/// Enumerates errors in the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse {name}={value:?} as a number")]
    InvalidNumber {
        name: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{0:?} is not a valid CORS origin")]
    InvalidCorsOrigin(String),
}
