//! Single-connection helpers used around the bulk load.
//!
//! Nothing here propagates engine errors: failures are logged and surface as
//! `false` / `None` so a benchmark run always gets control back.

use crate::db::{Connector, DbConnection};
use crate::error::BenchResult;
use crate::sql::{Statement, ToSql};

use tracing::{info, warn};

/// One open connection plus the table lifecycle around it.
pub struct Session<D: DbConnection> {
    conn: D,
}

impl<D: DbConnection> Session<D> {
    pub fn new(conn: D) -> Self {
        Self { conn }
    }

    pub async fn open<C>(connector: &C) -> BenchResult<Self>
    where
        C: Connector<Conn = D>,
    {
        Ok(Self::new(connector.open().await?))
    }

    /// Create the benchmark table.
    ///
    /// If it already exists and `overwrite` is set, it is dropped and created
    /// again, once. Returns whether the table was created.
    pub async fn create_table(&mut self, table: &str, overwrite: bool, encrypt: bool) -> bool {
        let sql = Statement::CreateTable { table, encrypt }.to_sql();
        let mut retried = false;
        loop {
            match self.conn.execute_statement(&sql).await {
                Ok(_) => {
                    info!("Table {table} created.");
                    return true;
                }
                Err(e) if e.is_already_exists() && overwrite && !retried => {
                    retried = true;
                    if !self.drop_table(table).await {
                        return false;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                    return false;
                }
            }
        }
    }

    /// Returns whether the table was dropped.
    pub async fn drop_table(&mut self, table: &str) -> bool {
        let sql = Statement::DropTable { table }.to_sql();
        if self.execute_query(&sql).await.is_some() {
            info!("Table {table} dropped.");
            true
        } else {
            false
        }
    }

    /// Affected row count, or `None` when the engine rejected the statement.
    pub async fn execute_query(&mut self, sql: &str) -> Option<u64> {
        match self.conn.execute_statement(sql).await {
            Ok(affected) => Some(affected),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    /// Text result, or `None` when the engine rejected the statement.
    pub async fn execute_reader(&mut self, sql: &str) -> Option<String> {
        match self.conn.execute_reader(sql).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    pub async fn close(self) -> BenchResult<()> {
        self.conn.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConnection, MemoryConnector};

    async fn session(connector: &MemoryConnector) -> Session<MemoryConnection> {
        Session::open(connector).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_then_overwrite() {
        let connector = MemoryConnector::new();
        let mut session = session(&connector).await;

        assert!(session.create_table("t1", true, true).await);
        assert!(session.create_table("t1", true, true).await);
        assert!(connector.has_table("t1"));

        let executed = connector.executed();
        assert_eq!(executed.len(), 3);
        assert_eq!(executed[1], "DROP TABLE t1");
    }

    #[tokio::test]
    async fn test_existing_table_without_overwrite() {
        let connector = MemoryConnector::new();
        let mut session = session(&connector).await;

        assert!(session.create_table("t1", false, false).await);
        assert!(!session.create_table("t1", false, false).await);
        assert_eq!(connector.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_recreate_is_attempted_once() {
        let connector = MemoryConnector::new().fail_on("DROP");
        let mut session = session(&connector).await;

        assert!(session.create_table("t1", true, true).await);
        assert!(!session.create_table("t1", true, true).await);
    }

    #[tokio::test]
    async fn test_sentinels() {
        let connector = MemoryConnector::new().fail_on("nope");
        let mut session = session(&connector).await;

        assert_eq!(session.execute_query("SELECT nope").await, None);
        assert_eq!(session.execute_query("SELECT 1").await, Some(0));
        assert_eq!(session.execute_reader("SELECT nope").await, None);
        assert!(!session.drop_table("missing").await);
        session.close().await.unwrap();
        assert_eq!(connector.closed(), 1);
    }
}
