//! SQL text for the benchmark workload.
//!
//! Every statement the harness sends is a [`Statement`] rendered with
//! [`ToSql`]. Rendering is pure string templating.

use crate::datagen::DataRow;
use std::fmt;

/// Trait for rendering values and statements as SQL text.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

/// Projection evaluated by a point SELECT, exercising one encrypted operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `a`
    Plain,
    /// `a + b`
    Addition,
    /// `a * c`
    Multiplication,
    /// `a + a * c + b`
    Mixed,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Plain,
        Operation::Addition,
        Operation::Multiplication,
        Operation::Mixed,
    ];

    pub fn expression(&self) -> &'static str {
        match self {
            Operation::Plain => "a",
            Operation::Addition => "a + b",
            Operation::Multiplication => "a * c",
            Operation::Mixed => "a + a * c + b",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Plain => "plain",
            Operation::Addition => "addition",
            Operation::Multiplication => "multiplication",
            Operation::Mixed => "mixed",
        };
        write!(f, "{name}")
    }
}

/// Encryption scheme requested by `PRISMADB ENCRYPT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptKind {
    Store,
    Search,
    Range,
    Wildcard,
    Addition,
    Multiplication,
    /// Every integer scheme at once.
    All,
}

impl EncryptKind {
    pub const ALL: [EncryptKind; 7] = [
        EncryptKind::Store,
        EncryptKind::Search,
        EncryptKind::Range,
        EncryptKind::Wildcard,
        EncryptKind::Addition,
        EncryptKind::Multiplication,
        EncryptKind::All,
    ];

    /// Text inside `FOR (...)`.
    pub fn schemes(&self) -> &'static str {
        match self {
            EncryptKind::Store => "STORE",
            EncryptKind::Search => "SEARCH",
            EncryptKind::Range => "RANGE",
            EncryptKind::Wildcard => "WILDCARD",
            EncryptKind::Addition => "ADDITION",
            EncryptKind::Multiplication => "MULTIPLICATION",
            EncryptKind::All => "SEARCH, STORE, RANGE, ADDITION, MULTIPLICATION",
        }
    }

    /// Wildcard matching only applies to text columns.
    pub fn column(&self) -> &'static str {
        match self {
            EncryptKind::Wildcard => "e",
            _ => "b",
        }
    }
}

impl fmt::Display for EncryptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schemes().to_lowercase().replace(", ", "+"))
    }
}

/// One statement the harness can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    CreateTable { table: &'a str, encrypt: bool },
    DropTable { table: &'a str },
    Insert { table: &'a str, rows: &'a [DataRow] },
    Select { table: &'a str, operation: Operation, a: u64 },
    /// Point lookup returning the stored row, no operator evaluated.
    SelectWithout { table: &'a str, a: u64 },
    /// Self join on the encrypted search column.
    SelectJoin { table: &'a str, a: u64 },
    Update { table: &'a str, a: u64, row: &'a DataRow },
    Delete { table: &'a str, a: u64 },
    /// Decrypt an integer column, or the text column when `text` is set.
    Decrypt { table: &'a str, check: bool, text: bool },
    Encrypt { table: &'a str, check: bool, kind: EncryptKind },
    /// Key rotation.
    UpdateKeys { check: bool },
}

impl ToSql for Statement<'_> {
    fn to_sql(&self) -> String {
        match *self {
            Statement::CreateTable { table, encrypt } => create_table_sql(table, encrypt),
            Statement::DropTable { table } => format!("DROP TABLE {table}"),
            Statement::Insert { table, rows } => insert_sql(table, rows),
            Statement::Select { table, operation, a } => {
                format!("SELECT {} FROM {table} WHERE a = {a}", operation.expression())
            }
            Statement::SelectWithout { table, a } => {
                format!("SELECT a, b, c, d, e FROM {table} WHERE a = {a}")
            }
            Statement::SelectJoin { table, a } => format!(
                "SELECT x.a, x.b, y.c FROM {table} x JOIN {table} y ON x.a = y.a WHERE x.a = {a}"
            ),
            Statement::Update { table, a, row } => format!(
                "UPDATE {table} SET b = {}, c = {}, d = {}, e = {} WHERE a = {a}",
                row.b,
                row.c,
                quote(&row.d),
                quote(&row.e)
            ),
            Statement::Delete { table, a } => format!("DELETE FROM {table} WHERE a = {a}"),
            Statement::Decrypt { table, check, text } => {
                let column = if text { "d" } else { "b" };
                with_status(format!("PRISMADB DECRYPT {table}.{column}"), check)
            }
            Statement::Encrypt { table, check, kind } => with_status(
                format!(
                    "PRISMADB ENCRYPT {table}.{} FOR ({})",
                    kind.column(),
                    kind.schemes()
                ),
                check,
            ),
            Statement::UpdateKeys { check } => with_status("PRISMADB KEYS UPDATE".to_string(), check),
        }
    }
}

impl ToSql for DataRow {
    fn to_sql(&self) -> String {
        format!(
            "({}, {}, {}, {}, {})",
            self.a,
            self.b,
            self.c,
            quote(&self.d),
            quote(&self.e)
        )
    }
}

fn create_table_sql(table: &str, encrypt: bool) -> String {
    let columns = if encrypt {
        [
            "a INT ENCRYPTED FOR(MULTIPLICATION, ADDITION, SEARCH, RANGE)",
            "b INT ENCRYPTED FOR(ADDITION)",
            "c INT ENCRYPTED FOR(MULTIPLICATION)",
            "d VARCHAR(30) ENCRYPTED FOR(SEARCH)",
            "e VARCHAR(30)",
        ]
    } else {
        [
            "a INT ENCRYPTED FOR(SEARCH)",
            "b INT",
            "c INT",
            "d VARCHAR(30)",
            "e VARCHAR(30)",
        ]
    };
    format!("CREATE TABLE {table} ({})", columns.join(", "))
}

fn insert_sql(table: &str, rows: &[DataRow]) -> String {
    let values: Vec<String> = rows.iter().map(ToSql::to_sql).collect();
    format!(
        "INSERT INTO {table} (a, b, c, d, e) VALUES {}",
        values.join(", ")
    )
}

/// `STATUS` asks the engine for progress instead of starting the job.
fn with_status(mut sql: String, check: bool) -> String {
    if check {
        sql.push_str(" STATUS");
    }
    sql
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(a: i64) -> DataRow {
        DataRow {
            a,
            b: 2,
            c: 3,
            d: "it's".to_string(),
            e: "x".to_string(),
        }
    }

    #[test]
    fn test_create_table() {
        let sql = Statement::CreateTable { table: "t1", encrypt: true }.to_sql();
        assert!(sql.starts_with("CREATE TABLE t1 (a INT ENCRYPTED FOR(MULTIPLICATION"));
        assert!(sql.ends_with("e VARCHAR(30))"));

        let plain = Statement::CreateTable { table: "t1", encrypt: false }.to_sql();
        assert!(plain.contains("b INT, c INT"));
    }

    #[test]
    fn test_insert_escapes_text() {
        let rows = [row(1), row(2)];
        let sql = Statement::Insert { table: "t1", rows: &rows }.to_sql();
        assert_eq!(
            sql,
            "INSERT INTO t1 (a, b, c, d, e) VALUES (1, 2, 3, 'it''s', 'x'), (2, 2, 3, 'it''s', 'x')"
        );
    }

    #[test]
    fn test_select_operations() {
        let sql = Statement::Select {
            table: "t1",
            operation: Operation::Mixed,
            a: 42,
        }
        .to_sql();
        assert_eq!(sql, "SELECT a + a * c + b FROM t1 WHERE a = 42");
    }

    #[test]
    fn test_dml() {
        let r = row(9);
        assert_eq!(
            Statement::Update { table: "t1", a: 5, row: &r }.to_sql(),
            "UPDATE t1 SET b = 2, c = 3, d = 'it''s', e = 'x' WHERE a = 5"
        );
        assert_eq!(
            Statement::Delete { table: "t1", a: 5 }.to_sql(),
            "DELETE FROM t1 WHERE a = 5"
        );
    }

    #[test]
    fn test_admin_statements() {
        assert_eq!(
            Statement::Decrypt { table: "t1", check: true, text: true }.to_sql(),
            "PRISMADB DECRYPT t1.d STATUS"
        );
        assert_eq!(
            Statement::Encrypt { table: "t1", check: false, kind: EncryptKind::Wildcard }.to_sql(),
            "PRISMADB ENCRYPT t1.e FOR (WILDCARD)"
        );
        assert_eq!(
            Statement::UpdateKeys { check: false }.to_sql(),
            "PRISMADB KEYS UPDATE"
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(EncryptKind::All.to_string(), "search+store+range+addition+multiplication");
        assert_eq!(Operation::Multiplication.to_string(), "multiplication");
    }
}
