//! Fixed-size worker pool that drains a [`QueryQueue`].
//!
//! Each worker opens its own connection, executes statements until the queue
//! reports empty, then closes the connection. A rejected statement is logged
//! and skipped; it never stops the worker or the pool.

use crate::config::PoolConfig;
use crate::db::{Connector, DbConnection};
use crate::queue::QueryQueue;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What one worker did before it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub worker: usize,
    pub succeeded: u64,
    pub failed: u64,
    pub affected_rows: u64,
    /// The worker never got a connection and drained nothing.
    pub open_failed: bool,
    pub close_failed: bool,
}

impl WorkerStats {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }

    /// Statements this worker attempted.
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Aggregate outcome of one [`WorkerPool::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub workers: Vec<WorkerStats>,
    /// Workers that panicked before reporting.
    pub crashed: usize,
    /// Statements still queued after every worker exited.
    pub undrained: usize,
}

impl PoolReport {
    pub fn succeeded(&self) -> u64 {
        self.workers.iter().map(|w| w.succeeded).sum()
    }

    pub fn failed(&self) -> u64 {
        self.workers.iter().map(|w| w.failed).sum()
    }

    pub fn attempted(&self) -> u64 {
        self.workers.iter().map(WorkerStats::attempted).sum()
    }

    pub fn affected_rows(&self) -> u64 {
        self.workers.iter().map(|w| w.affected_rows).sum()
    }

    pub fn open_failures(&self) -> usize {
        self.workers.iter().filter(|w| w.open_failed).count()
    }
}

/// Runs a fixed number of draining workers.
#[derive(Debug, Clone)]
pub struct WorkerPool<C: Connector> {
    connector: Arc<C>,
    config: PoolConfig,
}

impl<C: Connector> WorkerPool<C> {
    pub fn new(connector: Arc<C>, config: PoolConfig) -> Self {
        Self { connector, config }
    }

    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Spawn the workers and wait until all of them have released their
    /// connections.
    ///
    /// Every statement must already be queued: a worker that sees an empty
    /// queue exits for good.
    pub async fn run(&self, queue: Arc<QueryQueue>) -> PoolReport {
        let handles: Vec<_> = (0..self.config.workers)
            .map(|worker| {
                let queue = Arc::clone(&queue);
                let connector = Arc::clone(&self.connector);
                tokio::spawn(drain(worker, queue, connector))
            })
            .collect();

        let mut report = PoolReport::default();
        for handle in handles {
            match handle.await {
                Ok(stats) => report.workers.push(stats),
                Err(e) => {
                    error!("worker task failed: {e}");
                    report.crashed += 1;
                }
            }
        }
        report.undrained = queue.len();
        if report.undrained > 0 {
            warn!("{} statements left in the queue", report.undrained);
        }
        report
    }
}

async fn drain<C: Connector>(worker: usize, queue: Arc<QueryQueue>, connector: Arc<C>) -> WorkerStats {
    let mut stats = WorkerStats::new(worker);

    let mut conn = match connector.open().await {
        Ok(conn) => conn,
        Err(e) => {
            error!(worker, "could not open connection: {e}");
            stats.open_failed = true;
            return stats;
        }
    };
    debug!(worker, "connected");

    while let Some(item) = queue.try_dequeue() {
        match conn.execute_statement(item.sql()).await {
            Ok(affected) => {
                stats.succeeded += 1;
                stats.affected_rows += affected;
            }
            Err(e) => {
                warn!(worker, seq = item.seq(), "{e}");
                stats.failed += 1;
            }
        }
    }

    if let Err(e) = conn.close().await {
        warn!(worker, "close failed: {e}");
        stats.close_failed = true;
    }
    debug!(worker, attempted = stats.attempted(), "drained");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use pretty_assertions::assert_eq;

    fn pool(connector: &MemoryConnector, workers: usize) -> WorkerPool<MemoryConnector> {
        WorkerPool::new(Arc::new(connector.clone()), PoolConfig { workers })
    }

    #[tokio::test]
    async fn test_empty_queue_returns_immediately() {
        let connector = MemoryConnector::new();
        let report = pool(&connector, 10).run(Arc::new(QueryQueue::new())).await;

        assert_eq!(report.attempted(), 0);
        assert_eq!(report.workers.len(), 10);
        assert_eq!((connector.opened(), connector.closed()), (10, 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_statement_runs_once() {
        let connector = MemoryConnector::new();
        let queue: Arc<QueryQueue> = Arc::new((0..500).map(|i| format!("SELECT {i}")).collect());

        let report = pool(&connector, 10).run(queue).await;

        assert_eq!(report.succeeded(), 500);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.undrained, 0);

        let mut executed = connector.executed();
        executed.sort_by_key(|sql| sql[7..].parse::<u32>().unwrap());
        let expected: Vec<String> = (0..500).map(|i| format!("SELECT {i}")).collect();
        assert_eq!(executed, expected);
    }

    #[tokio::test]
    async fn test_failed_statement_does_not_stop_drain() {
        let connector = MemoryConnector::new().fail_on("BROKEN");
        let queue: Arc<QueryQueue> = Arc::new(
            ["SELECT 1", "SELECT BROKEN", "SELECT 2", "SELECT BROKEN", "SELECT 3"]
                .into_iter()
                .collect(),
        );

        let report = pool(&connector, 1).run(queue).await;

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 2);
        assert_eq!(connector.executed(), vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_workers_that_cannot_connect() {
        let connector = MemoryConnector::new().fail_opens(3);
        let queue: Arc<QueryQueue> = Arc::new((0..20).map(|i| format!("SELECT {i}")).collect());

        let report = pool(&connector, 4).run(queue).await;

        assert_eq!(report.open_failures(), 3);
        assert_eq!(report.succeeded(), 20);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_no_connection_leaves_queue_undrained() {
        let connector = MemoryConnector::new().fail_opens(2);
        let queue: Arc<QueryQueue> = Arc::new(["SELECT 1", "SELECT 2"].into_iter().collect());

        let report = pool(&connector, 2).run(queue).await;

        assert_eq!(report.attempted(), 0);
        assert_eq!(report.undrained, 2);
    }
}
