use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScullError {
    #[error("Allocation failure: could not allocate {what}")]
    AllocationFailure { what: &'static str },

    #[error("Allocation budget exhausted: {what} limit of {limit} reached")]
    BudgetExhausted { what: &'static str, limit: usize },

    #[error("Copy fault: transferred {copied} of {expected} bytes: {source}")]
    CopyFault {
        expected: usize,
        copied: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid stat value: {0}")]
    InvalidStat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl ScullError {
    /// True for every variant that means "memory could not be obtained",
    /// whether the allocator refused or a configured budget ran out.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(
            self,
            ScullError::AllocationFailure { .. } | ScullError::BudgetExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScullError>;
