use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persisting learned normalization rules failed. This is a hard error:
    /// silently losing a rule would corrupt future normalization invisibly.
    #[error("Rule store failure: {0}")]
    RuleStore(String),
}

pub type Result<T> = std::result::Result<T, Error>;
