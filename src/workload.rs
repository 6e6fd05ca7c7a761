//! Randomized point queries over the loaded ranges.

use crate::datagen::DataGenerator;
use crate::planner::{BatchPlan, RangeKind};
use crate::sql::{EncryptKind, Operation, Statement, ToSql};
use std::ops::Range;

/// Renders benchmark queries against a loaded table.
///
/// Keys for the single range come from `[0, single)`; keys for the multiple
/// range come from its first segment. Inserted rows take keys above every
/// loaded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    table: String,
    single: Range<u64>,
    multiple: Range<u64>,
    loaded: u64,
}

/// Upper bound (exclusive) for keys of freshly inserted rows.
const MAX_KEY: u64 = i32::MAX as u64;

impl Workload {
    pub fn new(table: impl Into<String>, plan: &BatchPlan) -> Self {
        Self {
            table: table.into(),
            single: plan.single_range(),
            multiple: plan.segment_range(0),
            loaded: plan.covered_rows(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn keys(&self, range: RangeKind) -> Range<u64> {
        match range {
            RangeKind::Single => self.single.clone(),
            RangeKind::Multiple => self.multiple.clone(),
        }
    }

    fn key(&self, generator: &mut DataGenerator, range: RangeKind) -> u64 {
        generator.pick(self.keys(range))
    }

    pub fn select_query(
        &self,
        generator: &mut DataGenerator,
        range: RangeKind,
        operation: Operation,
    ) -> String {
        let a = self.key(generator, range);
        Statement::Select {
            table: &self.table,
            operation,
            a,
        }
        .to_sql()
    }

    pub fn select_without_query(&self, generator: &mut DataGenerator, range: RangeKind) -> String {
        let a = self.key(generator, range);
        Statement::SelectWithout { table: &self.table, a }.to_sql()
    }

    pub fn select_join_query(&self, generator: &mut DataGenerator, range: RangeKind) -> String {
        let a = self.key(generator, range);
        Statement::SelectJoin { table: &self.table, a }.to_sql()
    }

    pub fn delete_query(&self, generator: &mut DataGenerator, range: RangeKind) -> String {
        let a = self.key(generator, range);
        Statement::Delete { table: &self.table, a }.to_sql()
    }

    /// Keys no loaded row uses.
    pub fn fresh_keys(&self) -> Range<u64> {
        self.loaded..MAX_KEY.max(self.loaded + 1)
    }

    /// A single INSERT of `n` random rows.
    ///
    /// Keys come from [`fresh_keys`](Self::fresh_keys), so the new rows never
    /// collide with the bulk-loaded ones.
    pub fn insert_query(&self, generator: &mut DataGenerator, n: u64) -> String {
        let rows: Vec<_> = (0..n)
            .map(|_| {
                let mut row = generator.random_row();
                row.a = generator.pick(self.fresh_keys()) as i64;
                row
            })
            .collect();
        Statement::Insert {
            table: &self.table,
            rows: &rows,
        }
        .to_sql()
    }

    /// Overwrite the non-key columns of one row with fresh random values.
    ///
    /// The key is drawn from the loaded `range`, so the UPDATE always hits a
    /// row. Fixed windows such as 20..100 (single) or 10..20 (multiple) would
    /// miss the multiple range entirely.
    pub fn update_query(&self, generator: &mut DataGenerator, range: RangeKind) -> String {
        let a = self.key(generator, range);
        let row = generator.random_row();
        Statement::Update {
            table: &self.table,
            a,
            row: &row,
        }
        .to_sql()
    }

    pub fn decrypt_query(&self, check: bool, text: bool) -> String {
        Statement::Decrypt {
            table: &self.table,
            check,
            text,
        }
        .to_sql()
    }

    pub fn encrypt_query(&self, check: bool, kind: EncryptKind) -> String {
        Statement::Encrypt {
            table: &self.table,
            check,
            kind,
        }
        .to_sql()
    }

    pub fn update_key_query(&self, check: bool) -> String {
        Statement::UpdateKeys { check }.to_sql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PlanRequest, plan};

    fn workload() -> Workload {
        let plan = plan(PlanRequest::new(1000, 1, 4, 100)).unwrap();
        Workload::new("t1", &plan)
    }

    fn key_of(sql: &str) -> u64 {
        sql.rsplit("a = ").next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_key_ranges() {
        let workload = workload();
        assert_eq!(workload.keys(RangeKind::Single), 0..400);
        assert_eq!(workload.keys(RangeKind::Multiple), 400..550);
    }

    #[test]
    fn test_keys_stay_in_their_range() {
        let workload = workload();
        let mut generator = DataGenerator::new(11);
        for _ in 0..200 {
            let single = workload.select_query(&mut generator, RangeKind::Single, Operation::Addition);
            assert!(key_of(&single) < 400);

            let multiple = workload.delete_query(&mut generator, RangeKind::Multiple);
            assert!((400..550).contains(&key_of(&multiple)));
        }
    }

    #[test]
    fn test_same_seed_same_queries() {
        let workload = workload();
        let mut g1 = DataGenerator::new(5);
        let mut g2 = DataGenerator::new(5);
        for range in [RangeKind::Single, RangeKind::Multiple] {
            assert_eq!(
                workload.update_query(&mut g1, range),
                workload.update_query(&mut g2, range)
            );
        }
    }

    #[test]
    fn test_update_targets_loaded_rows() {
        let workload = workload();
        let mut generator = DataGenerator::new(3);
        for _ in 0..100 {
            let sql = workload.update_query(&mut generator, RangeKind::Multiple);
            assert!((400..550).contains(&key_of(&sql)));
        }
    }

    #[test]
    fn test_insert_uses_fresh_keys() {
        let workload = workload();
        let mut generator = DataGenerator::new(9);

        let sql = workload.insert_query(&mut generator, 50);
        assert!(sql.starts_with("INSERT INTO t1 (a, b, c, d, e) VALUES ("));

        let keys: Vec<u64> = sql
            .split("), (")
            .map(|tuple| {
                let tuple = tuple.rsplit('(').next().unwrap();
                tuple.split(',').next().unwrap().trim().parse().unwrap()
            })
            .collect();
        assert_eq!(keys.len(), 50);
        assert!(keys.iter().all(|&a| a >= 1000 && a < MAX_KEY));
    }

    #[test]
    fn test_admin_queries_use_table() {
        let workload = workload();
        assert_eq!(workload.decrypt_query(false, false), "PRISMADB DECRYPT t1.b");
        assert_eq!(
            workload.encrypt_query(true, EncryptKind::Range),
            "PRISMADB ENCRYPT t1.b FOR (RANGE) STATUS"
        );
        assert_eq!(workload.update_key_query(true), "PRISMADB KEYS UPDATE STATUS");
    }
}
