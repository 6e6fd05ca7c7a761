//! In-memory stand-in for a live engine.
//!
//! Records every statement it is handed and tracks which tables exist, which
//! is enough to exercise the loader, the pool, and the table lifecycle without
//! a database. The CLI uses it for `--dry-run` loads.

use crate::db::{BoxFuture, Connector, DbConnection};
use crate::error::{BenchError, BenchResult};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    executed: Vec<String>,
    tables: HashSet<String>,
    opened: usize,
    closed: usize,
    failing_opens: usize,
}

/// Connector whose connections share one recorded state.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
    fail_on: Option<String>,
    latency: Option<Duration>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every statement containing `pattern`.
    pub fn fail_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on = Some(pattern.into());
        self
    }

    /// Sleep this long inside every statement.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Refuse the next `count` connection attempts.
    pub fn fail_opens(self, count: usize) -> Self {
        self.lock().failing_opens = count;
        self
    }

    /// Statements that succeeded, in completion order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.lock().tables.contains(name)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Connector for MemoryConnector {
    type Conn = MemoryConnection;

    fn open(&self) -> BoxFuture<'_, BenchResult<MemoryConnection>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state.failing_opens > 0 {
                state.failing_opens -= 1;
                return Err(BenchError::Connection("connection refused".to_string()));
            }
            state.opened += 1;
            Ok(MemoryConnection {
                owner: self.clone(),
            })
        })
    }
}

/// Connection handed out by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryConnection {
    owner: MemoryConnector,
}

impl MemoryConnection {
    async fn run(&mut self, sql: &str) -> BenchResult<u64> {
        if let Some(latency) = self.owner.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(pattern) = &self.owner.fail_on {
            if sql.contains(pattern.as_str()) {
                return Err(BenchError::statement(format!("rejected statement: {pattern}")));
            }
        }

        let mut state = self.owner.lock();
        let affected = apply_ddl(&mut state.tables, sql)?;
        state.executed.push(sql.to_string());
        Ok(affected)
    }
}

impl DbConnection for MemoryConnection {
    fn execute_statement<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, BenchResult<u64>> {
        Box::pin(self.run(sql))
    }

    fn execute_reader<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, BenchResult<String>> {
        Box::pin(async move {
            self.run(sql).await?;
            Ok(String::new())
        })
    }

    fn close(self) -> BoxFuture<'static, BenchResult<()>> {
        Box::pin(async move {
            self.owner.lock().closed += 1;
            Ok(())
        })
    }
}

/// Track CREATE/DROP TABLE and count INSERT tuples.
fn apply_ddl(tables: &mut HashSet<String>, sql: &str) -> BenchResult<u64> {
    let sql = sql.trim_start();
    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let name = table_name(rest);
        if !tables.insert(name.to_string()) {
            return Err(BenchError::statement(format!("Table '{name}' already exists")));
        }
        return Ok(0);
    }
    if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
        let name = table_name(rest);
        if !tables.remove(name) {
            return Err(BenchError::statement(format!("Unknown table '{name}'")));
        }
        return Ok(0);
    }
    if sql.starts_with("INSERT") {
        let tuples = sql
            .find("VALUES")
            .map(|idx| sql[idx..].matches('(').count())
            .unwrap_or(0);
        return Ok(tuples as u64);
    }
    Ok(0)
}

fn table_name(rest: &str) -> &str {
    rest.split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .next()
        .unwrap_or_default()
}
