use prisma_bench::prelude::*;
use prisma_bench::suite;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn loader(connector: &MemoryConnector, config: &BenchConfig) -> BulkLoader<MemoryConnector> {
    let pool = WorkerPool::new(Arc::new(connector.clone()), config.pool_config());
    BulkLoader::new(pool, config)
}

/// Every `a` value sent in an INSERT.
fn inserted_keys(statements: &[String]) -> Vec<u64> {
    statements
        .iter()
        .filter(|sql| sql.starts_with("INSERT"))
        .flat_map(|sql| {
            sql.split("), (")
                .map(|tuple| {
                    let tuple = tuple.rsplit('(').next().unwrap();
                    tuple.split(',').next().unwrap().trim().parse::<u64>().unwrap()
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_inserts_each_row_exactly_once() {
    let connector = MemoryConnector::new().latency(Duration::from_millis(1));
    let config = BenchConfig::builder()
        .rows(60_000)
        .multiple(6)
        .workers(10)
        .build();
    let generator = DataGenerator::new(config.seed);

    let report = loader(&connector, &config)
        .setup_for_select(&generator, 1, "t1")
        .await
        .expect("load failed");

    assert!(report.is_complete());
    assert_eq!(report.pool.succeeded(), report.batches as u64);
    assert_eq!(report.pool.workers.len(), 10);

    let keys = inserted_keys(&connector.executed());
    let unique: HashSet<u64> = keys.iter().copied().collect();
    assert_eq!(keys.len(), 60_000);
    assert_eq!(unique, (0..60_000).collect::<HashSet<u64>>());
    assert_eq!(connector.opened(), connector.closed());
}

#[tokio::test]
async fn test_small_table_over_provisions_workers() {
    let connector = MemoryConnector::new();
    let config = BenchConfig::builder().rows(7).multiple(1).build();
    let generator = DataGenerator::new(config.seed);

    let report = loader(&connector, &config)
        .setup_for_select(&generator, 1, "t1")
        .await
        .unwrap();

    // 2 single rows + 4 multiple rows, one row per batch
    assert_eq!(report.batches, 6);
    assert_eq!(report.pool.succeeded(), 6);
    assert_eq!(connector.opened(), 10);
    assert_eq!(connector.closed(), 10);
}

#[tokio::test]
async fn test_full_run_on_memory_engine() {
    let connector = MemoryConnector::new().fail_on("KEYS");
    let config = BenchConfig::builder().rows(1_000).multiple(2).build();
    let mut generator = DataGenerator::new(config.seed);

    let mut session = Session::open(&connector).await.unwrap();
    assert!(session.create_table(&config.table, true, true).await);

    let loader = loader(&connector, &config);
    let load = loader
        .setup_for_select(&generator, config.scaler, &config.table)
        .await
        .unwrap();
    assert_eq!(load.pool.affected_rows(), 1_000);

    let workload = Workload::new(config.table.as_str(), &loader.plan(config.scaler).unwrap());
    let report = suite::run(&mut session, &workload, &mut generator).await;
    session.close().await.unwrap();

    assert_eq!(report.failed(), 2);
    assert!(report.entries.iter().all(|e| e.measurement.rows == 1));
    assert!(connector.has_table("t1"));
}
