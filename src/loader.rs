//! Timed concurrent bulk load.
//!
//! Planning and enqueueing finish on the calling task before any worker
//! starts; the workers then drain the queue and the clock stops once every
//! one of them has closed its connection.

use crate::config::BenchConfig;
use crate::datagen::DataGenerator;
use crate::db::Connector;
use crate::error::BenchResult;
use crate::planner::{self, BatchPlan, PlanRequest};
use crate::pool::{PoolReport, WorkerPool};
use crate::queue::QueryQueue;
use crate::sql::{Statement, ToSql};
use crate::timing::{Measurement, TimingHarness};

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one bulk load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub measurement: Measurement,
    pub pool: PoolReport,
    pub batches: usize,
    /// Row indices `[0, rows_planned)` were rendered into INSERTs.
    pub rows_planned: u64,
}

impl LoadReport {
    /// Every planned statement ran and none was rejected.
    pub fn is_complete(&self) -> bool {
        self.pool.failed() == 0 && self.pool.succeeded() == self.batches as u64
    }
}

/// Populates a table through a [`WorkerPool`].
pub struct BulkLoader<C: Connector> {
    pool: WorkerPool<C>,
    total_rows: u64,
    multiple: u64,
    initial_batch_size: u64,
}

impl<C: Connector> BulkLoader<C> {
    pub fn new(pool: WorkerPool<C>, config: &BenchConfig) -> Self {
        Self {
            pool,
            total_rows: config.rows,
            multiple: config.multiple,
            initial_batch_size: config.batch_size,
        }
    }

    pub fn pool(&self) -> &WorkerPool<C> {
        &self.pool
    }

    /// Batch plan used for a given scaler.
    pub fn plan(&self, scaler: u64) -> BenchResult<BatchPlan> {
        planner::plan(PlanRequest::new(
            self.total_rows,
            scaler,
            self.multiple,
            self.initial_batch_size,
        ))
    }

    /// Fill `table` with `rows / scaler` generated rows and time it.
    ///
    /// Failed INSERTs are logged by the workers and counted in the report;
    /// the measured time still runs until every worker has finished.
    pub async fn setup_for_select(
        &self,
        generator: &DataGenerator,
        scaler: u64,
        table: &str,
    ) -> BenchResult<LoadReport> {
        let plan = self.plan(scaler)?;
        let queue = Arc::new(QueryQueue::new());

        let timer = TimingHarness::start();
        for descriptor in &plan {
            let rows = generator.rows_for_offset_range(descriptor.offset, descriptor.count);
            queue.enqueue(Statement::Insert { table, rows: &rows }.to_sql());
        }
        let pool = self.pool.run(queue).await;
        let measurement = timer.stop("INSERT", self.total_rows);

        let report = LoadReport {
            measurement,
            pool,
            batches: plan.len(),
            rows_planned: plan.covered_rows(),
        };
        info!(
            batches = report.batches,
            workers = self.pool.workers(),
            "{}",
            report.measurement
        );
        if !report.is_complete() {
            warn!(
                failed = report.pool.failed(),
                undrained = report.pool.undrained,
                "bulk load finished with errors"
            );
        }
        Ok(report)
    }
}
