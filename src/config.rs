//! Explicit run configuration threaded into every pipeline invocation.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contraction::TieBreak;
use crate::overlap::ScorerKind;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to open config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("threads must be at least 1")]
    ZeroThreads,
}

/// Configuration options that govern graph construction and contraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    /// Minimum overlap length for an edge to be created.
    pub min_weight: usize,
    /// Overlap rule used for graph construction and strand resolution.
    pub scorer: ScorerKind,
    /// Canonicalise read strands before building the graph.
    pub strand_resolution: bool,
    /// Choice among equally heavy edges.
    pub tie_break: TieBreak,
    /// Number of independent runs in a batch.
    pub iterations: usize,
    /// Base seed for randomised tie-breaking; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Worker threads for batch runs; graph scoring uses the ambient rayon pool.
    pub threads: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            min_weight: 1,
            scorer: ScorerKind::Exact,
            strand_resolution: false,
            tie_break: TieBreak::StableFirst,
            iterations: 1,
            seed: None,
            threads: 1,
        }
    }
}

impl AssemblyConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_file_over(path, Self::default())
    }

    /// Load a configuration from JSON; missing fields are taken from `base`.
    pub fn from_json_file_over<P: AsRef<Path>>(path: P, base: Self) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse_error = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(parse_error)?;

        let merged = match (serde_json::to_value(&base).map_err(parse_error)?, overrides) {
            (serde_json::Value::Object(mut fields), serde_json::Value::Object(set)) => {
                fields.extend(set);
                serde_json::Value::Object(fields)
            }
            (_, other) => other,
        };
        let config: Self = serde_json::from_value(merged).map_err(parse_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }

    /// Short name of the scorer/strand combination, used for output folders.
    pub fn variant_name(&self) -> &'static str {
        match (self.strand_resolution, self.scorer) {
            (false, ScorerKind::Exact) => "core",
            (false, ScorerKind::Substitution) => "substitution",
            (true, ScorerKind::Exact) => "double-helix",
            (true, ScorerKind::Substitution) => "double-helix-substitution",
        }
    }
}
