//! # prisma-bench
//!
//! Workload driver for encrypted relational databases.
//!
//! The harness fills a table with synthetic rows through a pool of
//! concurrent workers, then times point queries that exercise the engine's
//! encrypted operators (search, range, addition, multiplication, wildcard)
//! and its encrypt/decrypt/key-rotation commands.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use prisma_bench::prelude::*;
//! use std::sync::Arc;
//!
//! let config = BenchConfig::builder()
//!     .database("mysql://root@localhost/bench")
//!     .rows(100_000)
//!     .build();
//! let connector = Arc::new(SqlxConnector::new("mysql://root@localhost/bench"));
//! let loader = BulkLoader::new(WorkerPool::new(connector, config.pool_config()), &config);
//! let report = loader
//!     .setup_for_select(&DataGenerator::new(config.seed), 1, "t1")
//!     .await?;
//! println!("{}", report.measurement);
//! // => ====Time of INSERT 100000 records: 5321 ms====
//! ```

pub mod config;
pub mod datagen;
pub mod db;
pub mod error;
pub mod loader;
pub mod memory;
pub mod planner;
pub mod pool;
pub mod queue;
pub mod session;
pub mod sql;
pub mod suite;
pub mod timing;
pub mod workload;

pub mod prelude {
    pub use crate::config::{BenchConfig, PoolConfig};
    pub use crate::datagen::{DataGenerator, DataRow};
    pub use crate::db::{Connector, DbConnection, SqlxConnector};
    pub use crate::error::*;
    pub use crate::loader::{BulkLoader, LoadReport};
    pub use crate::memory::MemoryConnector;
    pub use crate::planner::{BatchDescriptor, BatchPlan, PlanRequest, RangeKind, plan};
    pub use crate::pool::{PoolReport, WorkerPool};
    pub use crate::queue::{QueryQueue, WorkItem};
    pub use crate::session::Session;
    pub use crate::sql::{EncryptKind, Operation, Statement, ToSql};
    pub use crate::timing::{Measurement, TimingHarness};
    pub use crate::workload::Workload;
}

/// Plan the bulk load for a configuration without touching a database.
///
/// # Example
///
/// ```
/// use prisma_bench::config::BenchConfig;
///
/// let config = BenchConfig::builder().rows(1_000_000).multiple(6).build();
/// let plan = prisma_bench::plan_for(&config).unwrap();
/// assert_eq!(plan.len(), 1000);
/// ```
pub fn plan_for(config: &config::BenchConfig) -> error::BenchResult<planner::BatchPlan> {
    planner::plan(planner::PlanRequest::new(
        config.rows,
        config.scaler,
        config.multiple,
        config.batch_size,
    ))
}
