//! The operator benchmark that runs after the table is loaded.
//!
//! Each query is sent once over a single [`Session`] and timed on its own.
//! A rejected query is recorded as failed and the suite moves on.

use crate::datagen::DataGenerator;
use crate::db::DbConnection;
use crate::planner::RangeKind;
use crate::session::Session;
use crate::sql::{EncryptKind, Operation};
use crate::timing::{Measurement, TimingHarness};
use crate::workload::Workload;

use serde::Serialize;
use std::fmt;
use tracing::info;

/// Row count of the multi-row INSERT entry.
pub const INSERT_ROWS: u64 = 100;

/// Timing for one suite query.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteEntry {
    pub name: String,
    pub sql: String,
    pub measurement: Measurement,
    pub ok: bool,
}

impl fmt::Display for SuiteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.ok { "" } else { " (failed)" };
        write!(f, "{}: {} ms{status}", self.name, self.measurement.elapsed_ms())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub entries: Vec<SuiteEntry>,
}

impl SuiteReport {
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| !e.ok).count()
    }
}

/// Named queries in the order the suite sends them.
///
/// Reads come first, then writes, then the key management statements, so
/// deletes and re-encryption cannot disturb the lookups.
pub fn queries(workload: &Workload, generator: &mut DataGenerator) -> Vec<(String, String)> {
    let ranges = [RangeKind::Single, RangeKind::Multiple];
    let mut out = Vec::new();

    for range in ranges {
        for operation in Operation::ALL {
            out.push((
                format!("select {operation} {range}"),
                workload.select_query(generator, range, operation),
            ));
        }
    }
    for range in ranges {
        out.push((
            format!("select without {range}"),
            workload.select_without_query(generator, range),
        ));
        out.push((
            format!("select join {range}"),
            workload.select_join_query(generator, range),
        ));
    }
    out.push(("insert 1".to_string(), workload.insert_query(generator, 1)));
    out.push((
        format!("insert {INSERT_ROWS}"),
        workload.insert_query(generator, INSERT_ROWS),
    ));
    for range in ranges {
        out.push((format!("update {range}"), workload.update_query(generator, range)));
    }
    for range in ranges {
        out.push((format!("delete {range}"), workload.delete_query(generator, range)));
    }

    out.push(("decrypt int".to_string(), workload.decrypt_query(false, false)));
    out.push(("decrypt int status".to_string(), workload.decrypt_query(true, false)));
    out.push(("decrypt text".to_string(), workload.decrypt_query(false, true)));
    for kind in EncryptKind::ALL {
        out.push((format!("encrypt {kind}"), workload.encrypt_query(false, kind)));
    }
    out.push(("encrypt status".to_string(), workload.encrypt_query(true, EncryptKind::Store)));
    out.push(("update keys".to_string(), workload.update_key_query(false)));
    out.push(("update keys status".to_string(), workload.update_key_query(true)));
    out
}

/// Send every suite query and time each one.
pub async fn run<D: DbConnection>(
    session: &mut Session<D>,
    workload: &Workload,
    generator: &mut DataGenerator,
) -> SuiteReport {
    let mut report = SuiteReport::default();
    for (name, sql) in queries(workload, generator) {
        let (measurement, result) =
            TimingHarness::measure(name.as_str(), 1, session.execute_reader(&sql)).await;
        let entry = SuiteEntry {
            ok: result.is_some(),
            name,
            sql,
            measurement,
        };
        info!("{entry}");
        report.entries.push(entry);
    }
    report
}
