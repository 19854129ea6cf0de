//! Engine error types.

use thiserror::Error;
use waypoint_core::FormError;

/// Errors raised while registering or resolving checks.
///
/// These indicate registry misuse at startup time and are fatal.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A check name was registered twice
    #[error("duplicate check name: {0}")]
    DuplicateCheckName(String),

    /// A task source referenced a check that was never registered
    #[error("unknown check name: {0}")]
    UnknownCheckName(String),

    /// Registration was attempted after loading had begun
    #[error("cannot register check `{0}`: registry is frozen once loading has begun")]
    RegistryFrozen(String),
}

/// Errors raised while loading a declarative task source.
///
/// Any of these is fatal to loading that source; callers must refuse to run
/// with a partial task list.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error reading the source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document root or a top-level field has the wrong shape
    #[error("invalid task source: {0}")]
    InvalidDocument(String),

    /// A task is missing a required field or the field has the wrong shape
    #[error("task {index}: missing or invalid field `{field}`")]
    MissingField {
        /// Zero-based position of the task in the source
        index: usize,
        /// Name of the missing field
        field: &'static str,
    },

    /// A check entry is neither a bare name nor a single-key mapping
    #[error("invalid check specification: {detail}")]
    InvalidCheckSpec {
        /// Description of the offending entry
        detail: String,
    },

    /// Check resolution failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A check factory rejected its arguments
    #[error("failed to build check `{name}`: {source}")]
    BuildFailure {
        /// Name of the check being built
        name: String,
        /// The construction error
        #[source]
        source: serde_yaml::Error,
    },

    /// Two tasks share a name
    #[error("duplicate task name: {0}")]
    DuplicateTask(String),

    /// A task declares an invalid form
    #[error("invalid form in task `{task}`: {source}")]
    Form {
        /// Name of the offending task
        task: String,
        /// The underlying form error
        #[source]
        source: FormError,
    },
}
