use thiserror::Error;

/// Structural failures that abort a reconciliation run.
///
/// Executor failures (helm exiting non-zero, garbage on stderr) are *not*
/// part of this taxonomy: they are logged where they happen and the run
/// continues. Only malformed input and invalid topology entries terminate
/// the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Topology or routing document is unreadable or does not have the
    /// shape the reconciler requires. Fatal before any mutation.
    #[error("config error: {0}")]
    Config(String),

    /// A deployment unit was declared with no language codes.
    /// Raised before any external call for that unit.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
