use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Historical default base seed for worker seeding.
pub const DEFAULT_BASE_SEED: u64 = 7_713_147_777;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Worker count must be greater than zero, got {0}")]
    InvalidWorkerCount(usize),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Immutable dispatch parameters, fixed at dispatcher construction.
///
/// There are deliberately no process-wide mutable defaults: two dispatchers
/// with different settings can run side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Number of isolated workers spawned per round. Must be positive.
    pub worker_count: usize,
    /// Base value all per-worker seeds are derived from.
    pub base_seed: u64,
    /// Upper bound on adaptive rounds; `None` lets the termination criteria
    /// double the trial budget indefinitely.
    pub max_rounds: Option<usize>,
}

impl DispatchConfig {
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder::new()
    }

    /// Loads a dispatch configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Toml { source, .. } => ConfigError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawDispatchConfig = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;

        let mut builder = DispatchConfigBuilder::new().worker_count(raw.worker_count);
        if let Some(seed) = raw.base_seed {
            builder = builder.base_seed(seed);
        }
        if let Some(rounds) = raw.max_rounds {
            builder = builder.max_rounds(rounds);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
struct RawDispatchConfig {
    worker_count: usize,
    base_seed: Option<u64>,
    max_rounds: Option<usize>,
}

#[derive(Debug, Default)]
pub struct DispatchConfigBuilder {
    worker_count: Option<usize>,
    base_seed: Option<u64>,
    max_rounds: Option<usize>,
}

impl DispatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn base_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn build(self) -> Result<DispatchConfig, ConfigError> {
        let worker_count = self
            .worker_count
            .ok_or(ConfigError::MissingParameter("worker_count"))?;
        if worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount(worker_count));
        }

        Ok(DispatchConfig {
            worker_count,
            base_seed: self.base_seed.unwrap_or(DEFAULT_BASE_SEED),
            max_rounds: self.max_rounds,
        })
    }
}
