//! Execution configuration (C11, SPEC_FULL §ambient stack).
//!
//! Hierarchical loading mirrors the teacher's: a base `config.toml`, a
//! git-ignored `config.local.toml` override, then `GRAPHQUERY_*`
//! environment variables, merged in that order via `figment`.
//!
//! ```toml
//! # config.toml
//! [concurrency]
//! max_parallel_nodes = 32
//!
//! [limits]
//! default_limit = 10000
//! ```
//!
//! ```bash
//! GRAPHQUERY_CONCURRENCY__MAX_PARALLEL_NODES=64
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Tunables read by the scheduler/executor (§5 Concurrency & Resource
/// Model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Upper bound on PlanNodes the scheduler may run concurrently (§5
    /// "parallel launch of independent siblings, bounded by a
    /// semaphore").
    #[serde(default = "default_max_parallel_nodes")]
    pub max_parallel_nodes: usize,

    /// Hard cap on Loop iterations, independent of any user-supplied
    /// condition, so a malformed Loop can't run forever (§8 "bounded Loop
    /// termination").
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Applied when a statement chain has no explicit LIMIT (§5 resource
    /// bounds).
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Maximum rows any single DataSet may hold before the executor
    /// fails the query rather than risk unbounded memory growth.
    #[serde(default = "default_max_rows")]
    pub max_rows_per_dataset: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_max_parallel_nodes() -> usize {
    16
}
fn default_max_loop_iterations() -> u32 {
    10_000
}
fn default_limit() -> i64 {
    10_000
}
fn default_max_rows() -> usize {
    1_000_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        ConcurrencyConfig {
            max_parallel_nodes: default_max_parallel_nodes(),
            max_loop_iterations: default_max_loop_iterations(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig { default_limit: default_limit(), max_rows_per_dataset: default_max_rows() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            concurrency: ConcurrencyConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ExecutionConfig {
    /// Merges `config.toml`, `config.local.toml`, then
    /// `GRAPHQUERY_*`-prefixed environment variables, in that order.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(ExecutionConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("GRAPHQUERY_").split("__"))
            .extract()
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(ExecutionConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GRAPHQUERY_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_bounds() {
        let cfg = ExecutionConfig::default();
        assert_eq!(cfg.concurrency.max_parallel_nodes, 16);
        assert!(cfg.limits.default_limit > 0);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = ExecutionConfig::default();
        let toml_str = toml::to_string(&cfg).unwrap();
        assert!(toml_str.contains("[concurrency]"));
        assert!(toml_str.contains("[limits]"));
    }
}
