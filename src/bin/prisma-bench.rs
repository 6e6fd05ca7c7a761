//! prisma-bench — bulk load and operator benchmark CLI
//!
//! # Usage
//!
//! ```bash
//! # Show how a million rows would be batched
//! prisma-bench --rows 1000000 plan
//!
//! # Load the table and time it
//! prisma-bench --database-url mysql://root@localhost/bench load
//!
//! # Load, then time every encrypted operator
//! prisma-bench run --json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use prisma_bench::prelude::*;
use prisma_bench::suite::{self, SuiteReport};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prisma-bench")]
#[command(version)]
#[command(about = "Workload driver for encrypted relational databases", long_about = None)]
#[command(after_help = "EXAMPLES:
    prisma-bench --rows 7 plan
    prisma-bench sql select
    prisma-bench --database-url mysql://root@localhost/bench --scaler 10 load
    prisma-bench run --dry-run --json")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database connection URL
    #[arg(long, env = "PRISMA_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Target total row count
    #[arg(long, global = true)]
    rows: Option<u64>,

    /// Number of segments in the multiple range
    #[arg(long, global = true)]
    multiple: Option<u64>,

    /// Load rows / scaler instead of the full row count
    #[arg(long, global = true)]
    scaler: Option<u64>,

    /// Initial batch size
    #[arg(long, global = true)]
    batch_size: Option<u64>,

    /// Concurrent loader workers
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Row generator seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Benchmark table
    #[arg(long, global = true)]
    table: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the batch plan without connecting
    Plan,
    /// Print one generated statement
    Sql {
        #[arg(value_enum)]
        kind: SqlKind,
    },
    /// Create the table and time the bulk load
    Load(RunArgs),
    /// Load, then time every operator query
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Use the in-memory engine instead of a database
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SqlKind {
    Create,
    Insert,
    Select,
    SelectWithout,
    Join,
    Update,
    Delete,
    Decrypt,
    Encrypt,
    UpdateKeys,
}

#[derive(Serialize)]
struct RunOutput {
    started_at: DateTime<Utc>,
    config: BenchConfig,
    load: LoadReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    suite: Option<SuiteReport>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = execute(&cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "prisma_bench=debug"
    } else {
        "prisma_bench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli)?;

    match &cli.command {
        Commands::Plan => show_plan(&config),
        Commands::Sql { kind } => show_sql(&config, *kind),
        Commands::Load(args) | Commands::Run(args) => {
            let with_suite = matches!(cli.command, Commands::Run(_));
            if args.dry_run {
                let connector = Arc::new(MemoryConnector::new());
                benchmark(connector, &config, with_suite, args.json).await
            } else {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("No database URL. Use --database-url or set PRISMA_DATABASE_URL")
                })?;
                let connector = Arc::new(SqlxConnector::new(url));
                benchmark(connector, &config, with_suite, args.json).await
            }
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<BenchConfig> {
    let mut config = BenchConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        config.database_url = Some(url.clone());
    }
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(multiple) = cli.multiple {
        config.multiple = multiple;
    }
    if let Some(scaler) = cli.scaler {
        config.scaler = scaler;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(table) = &cli.table {
        config.table = table.clone();
    }
    config.validate()?;
    Ok(config)
}

fn show_plan(config: &BenchConfig) -> anyhow::Result<()> {
    let plan = prisma_bench::plan_for(config)?;

    println!("{}", "Batch plan".cyan().bold());
    println!("  {} {}", "Rows:".dimmed(), config.rows);
    println!("  {} {}", "Scaler:".dimmed(), config.scaler);
    println!(
        "  {} {} rows, {} batches of {}",
        "Single:".dimmed(),
        plan.single_rows,
        plan.batches_in(RangeKind::Single),
        plan.single_batch_size
    );
    println!(
        "  {} {} segments of {} rows, {} batches of {}",
        "Multiple:".dimmed(),
        plan.segments,
        plan.segment_rows,
        plan.batches_in(RangeKind::Multiple),
        plan.multiple_batch_size
    );
    println!(
        "  {} [0, {}) in {} statements",
        "Covered:".dimmed(),
        plan.covered_rows().to_string().green(),
        plan.len().to_string().cyan()
    );
    Ok(())
}

fn show_sql(config: &BenchConfig, kind: SqlKind) -> anyhow::Result<()> {
    let plan = prisma_bench::plan_for(config)?;
    let workload = Workload::new(config.table.as_str(), &plan);
    let mut generator = DataGenerator::new(config.seed);
    let table = config.table.as_str();

    let sql = match kind {
        SqlKind::Create => Statement::CreateTable {
            table,
            encrypt: config.encrypt,
        }
        .to_sql(),
        SqlKind::Insert => workload.insert_query(&mut generator, 3),
        SqlKind::Select => workload.select_query(&mut generator, RangeKind::Single, Operation::Mixed),
        SqlKind::SelectWithout => workload.select_without_query(&mut generator, RangeKind::Single),
        SqlKind::Join => workload.select_join_query(&mut generator, RangeKind::Single),
        SqlKind::Update => workload.update_query(&mut generator, RangeKind::Single),
        SqlKind::Delete => workload.delete_query(&mut generator, RangeKind::Single),
        SqlKind::Decrypt => workload.decrypt_query(false, false),
        SqlKind::Encrypt => workload.encrypt_query(false, EncryptKind::All),
        SqlKind::UpdateKeys => workload.update_key_query(false),
    };
    println!("{}", sql.white());
    Ok(())
}

async fn benchmark<C: Connector>(
    connector: Arc<C>,
    config: &BenchConfig,
    with_suite: bool,
    json: bool,
) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let mut generator = DataGenerator::new(config.seed);

    let mut session = Session::open(connector.as_ref()).await?;
    if !session
        .create_table(&config.table, config.overwrite, config.encrypt)
        .await
    {
        eprintln!("{} table {} was not created", "⚠".yellow(), config.table);
    }

    let loader = BulkLoader::new(WorkerPool::new(connector, config.pool_config()), config);
    let load = loader
        .setup_for_select(&generator, config.scaler, &config.table)
        .await?;
    if !json {
        println!("{}", load.measurement.to_string().green().bold());
        if !load.is_complete() {
            println!(
                "{} {} statements failed, {} not executed",
                "⚠".yellow(),
                load.pool.failed(),
                load.pool.undrained
            );
        }
    }

    let suite = if with_suite {
        let workload = Workload::new(config.table.as_str(), &loader.plan(config.scaler)?);
        let report = suite::run(&mut session, &workload, &mut generator).await;
        if !json {
            for entry in &report.entries {
                let line = entry.to_string();
                if entry.ok {
                    println!("  {line}");
                } else {
                    println!("  {}", line.red());
                }
            }
        }
        Some(report)
    } else {
        None
    };

    session.close().await?;

    if json {
        let output = RunOutput {
            started_at,
            config: config.clone(),
            load,
            suite,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
