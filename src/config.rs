//! Benchmark configuration.
//!
//! Values are layered: defaults, then a TOML file, then environment
//! variables, then whatever the CLI sets on top.

use crate::error::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "prisma-bench.toml";

/// Read-only settings for one benchmark process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Database connection URL (`mysql://...`, `postgres://...`).
    pub database_url: Option<String>,

    /// Target total row count.
    pub rows: u64,

    /// Number of segments the multiple range is split into.
    pub multiple: u64,

    /// Divisor applied to `rows` to load a fraction of the full size.
    pub scaler: u64,

    /// Starting batch size; shrunk by powers of ten until it divides evenly.
    pub batch_size: u64,

    /// Worker count for the bulk loader.
    pub workers: usize,

    /// Seed for the row generator.
    pub seed: u64,

    /// Table the benchmark populates.
    pub table: String,

    /// Create the table with encrypted columns.
    pub encrypt: bool,

    /// Drop and recreate the table when it already exists.
    pub overwrite: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            rows: 1_000_000,
            multiple: 6,
            scaler: 1,
            batch_size: 1000,
            workers: 10,
            seed: 42,
            table: "t1".to_string(),
            encrypt: true,
            overwrite: true,
        }
    }
}

impl BenchConfig {
    /// Create a new configuration builder
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> BenchResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> BenchResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration the way the CLI does.
    ///
    /// An explicit path must exist. Without one, `./prisma-bench.toml` and then
    /// `<config dir>/prisma-bench/config.toml` are tried; if neither exists the
    /// defaults are used. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> BenchResult<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(BenchError::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_paths().into_iter().find(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `PRISMA_*` overrides from the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> BenchResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PRISMA_DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(rows) = lookup("PRISMA_ROWS") {
            self.rows = parse_env("PRISMA_ROWS", &rows)?;
        }
        if let Some(multiple) = lookup("PRISMA_MULTIPLE") {
            self.multiple = parse_env("PRISMA_MULTIPLE", &multiple)?;
        }
        Ok(())
    }

    /// Reject values the planner or the pool cannot work with.
    pub fn validate(&self) -> BenchResult<()> {
        let checks = [
            ("rows", self.rows == 0),
            ("multiple", self.multiple == 0),
            ("scaler", self.scaler == 0),
            ("batch_size", self.batch_size == 0),
            ("workers", self.workers == 0),
        ];
        for (name, is_zero) in checks {
            if is_zero {
                return Err(BenchError::Config(format!("{name} must be at least 1")));
            }
        }
        if self.table.is_empty() {
            return Err(BenchError::Config("table name is empty".to_string()));
        }
        Ok(())
    }

    /// Settings handed to the worker pool.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
        }
    }
}

/// Explicit settings for [`crate::pool::WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Fixed number of concurrent workers, regardless of queue length.
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 10 }
    }
}

fn parse_env(key: &str, value: &str) -> BenchResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::Config(format!("{key}={value} is not a number")))
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("prisma-bench").join("config.toml"));
    }
    paths
}

/// Builder for BenchConfig
#[derive(Debug, Default)]
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    /// Set the database URL
    pub fn database(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn rows(mut self, rows: u64) -> Self {
        self.config.rows = rows;
        self
    }

    pub fn multiple(mut self, multiple: u64) -> Self {
        self.config.multiple = multiple;
        self
    }

    pub fn scaler(mut self, scaler: u64) -> Self {
        self.config.scaler = scaler;
        self
    }

    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the target table
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.config.table = table.into();
        self
    }

    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.config.encrypt = encrypt;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    /// Build the configuration
    pub fn build(self) -> BenchConfig {
        self.config
    }
}
