//! Store configuration
//!
//! `quantum` (bytes per block) and `qset` (blocks per segment) are fixed for
//! the lifetime of a store's current layout. A new configuration only takes
//! effect when the store is trimmed.
//!
//! ```toml
//! quantum = 4000
//! qset = 1
//! max_blocks = 1024
//! ```

use crate::error::{Result, ScullError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Default block size in bytes
pub const SCULL_QUANTUM: usize = 4000;

/// Default number of blocks per segment
pub const SCULL_QSET: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Bytes per block (default: 4000)
    #[serde(default = "default_quantum")]
    #[validate(range(min = 1))]
    pub quantum: usize,

    /// Blocks per segment (default: 1)
    #[serde(default = "default_qset")]
    #[validate(range(min = 1))]
    pub qset: usize,

    /// Upper bound on the number of segments in the chain (default: unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_segments: Option<usize>,

    /// Upper bound on the number of allocated blocks (default: unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blocks: Option<usize>,
}

fn default_quantum() -> usize {
    SCULL_QUANTUM
}

fn default_qset() -> usize {
    SCULL_QSET
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quantum: default_quantum(),
            qset: default_qset(),
            max_segments: None,
            max_blocks: None,
        }
    }
}

impl StoreConfig {
    /// Create a config with the given geometry and no allocation budget
    pub fn new(quantum: usize, qset: usize) -> Self {
        Self {
            quantum,
            qset,
            ..Default::default()
        }
    }

    /// Set bytes per block
    pub fn quantum(mut self, quantum: usize) -> Self {
        self.quantum = quantum;
        self
    }

    /// Set blocks per segment
    pub fn qset(mut self, qset: usize) -> Self {
        self.qset = qset;
        self
    }

    /// Cap the number of segments the chain may grow to
    pub fn max_segments(mut self, limit: usize) -> Self {
        self.max_segments = Some(limit);
        self
    }

    /// Cap the number of blocks that may be allocated
    pub fn max_blocks(mut self, limit: usize) -> Self {
        self.max_blocks = Some(limit);
        self
    }

    /// Check that the geometry is usable
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| ScullError::InvalidConfiguration(e.to_string()))?;

        if self.quantum.checked_mul(self.qset).is_none() {
            return Err(ScullError::InvalidConfiguration(format!(
                "quantum * qset overflows ({} * {})",
                self.quantum, self.qset
            )));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
