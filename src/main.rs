use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use travel_seed::config::{self, DbConfig};
use travel_seed::loader::LoadOptions;
use travel_seed::orchestrator::{self, DomainSelection, SeedPlan};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "travel-seed")]
#[command(about = "Seed transport and accommodation inventory from fixtures")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear a domain and reload it from fixtures
    Seed(SeedArgs),
    /// Delete a domain's rows without reloading
    Clear(ClearArgs),
    /// Create any missing inventory table
    InitSchema(InitSchemaArgs),
}

#[derive(Args)]
struct DbArgs {
    /// Full connection URL; overrides the individual DB_* settings
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = config::DEFAULT_DB_HOST)]
    db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = config::DEFAULT_DB_PORT)]
    db_port: u16,

    #[arg(long, env = "DB_USER", default_value = config::DEFAULT_DB_USER)]
    db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = config::DEFAULT_DB_PASSWORD, hide_env_values = true)]
    db_password: String,

    #[arg(long, env = "DB_NAME", default_value = config::DEFAULT_DB_NAME)]
    db_name: String,

    /// Maximum pooled connections
    #[arg(long, env = "DB_POOL_SIZE", default_value_t = config::DEFAULT_POOL_SIZE)]
    pool_size: u32,
}

impl DbArgs {
    fn into_config(self) -> DbConfig {
        DbConfig {
            url: self.database_url.filter(|u| !u.trim().is_empty()),
            host: self.db_host,
            port: self.db_port,
            user: self.db_user,
            password: self.db_password,
            database: self.db_name,
            pool_size: self.pool_size,
        }
    }
}

#[derive(Args)]
struct SeedArgs {
    /// Domain to seed
    #[arg(short, long, value_enum, default_value_t = DomainSelection::All)]
    domain: DomainSelection,

    /// Directory holding train/ and hotel/ fixture files
    #[arg(short, long, default_value = "fixtures")]
    fixtures: PathBuf,

    /// Create missing tables before seeding
    #[arg(long)]
    init_schema: bool,

    /// Rows per batch
    #[arg(long, default_value_t = config::BATCH_SIZE)]
    batch_size: usize,

    /// Detailed log lines per entity before suppressing
    #[arg(long, default_value_t = config::LOG_FIRST_N)]
    log_limit: u32,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    #[command(flatten)]
    db: DbArgs,
}

#[derive(Args)]
struct ClearArgs {
    /// Domain to clear
    #[arg(short, long, value_enum)]
    domain: DomainSelection,

    /// Hide progress spinners
    #[arg(long)]
    no_progress: bool,

    #[command(flatten)]
    db: DbArgs,
}

#[derive(Args)]
struct InitSchemaArgs {
    #[command(flatten)]
    db: DbArgs,
}

async fn run_seed(args: SeedArgs) -> Result<()> {
    let start = Instant::now();
    let db = args.db.into_config();
    let plan = SeedPlan {
        domains: args.domain,
        fixtures: args.fixtures,
        init_schema: args.init_schema,
        load: LoadOptions {
            batch_size: args.batch_size,
            log_limit: args.log_limit,
            progress: !args.no_progress,
            ..LoadOptions::default()
        },
    };

    let reports = orchestrator::run_seed(&db, &plan).await?;
    for report in &reports {
        report.print_summary();
    }
    println!();
    println!("Total time:         {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

async fn run_clear(args: ClearArgs) -> Result<()> {
    let db = args.db.into_config();
    let reports = orchestrator::run_clear(&db, args.domain, !args.no_progress).await?;

    println!();
    println!("=== Cleared ===");
    for (domain, report) in &reports {
        println!("{:<20}{} rows", format!("{domain}:"), report.total_removed());
        for table in &report.tables {
            println!("  {:<18}{}", format!("{}:", table.table), table.removed);
        }
    }
    Ok(())
}

async fn run_init_schema(args: InitSchemaArgs) -> Result<()> {
    let db = args.db.into_config();
    orchestrator::run_init_schema(&db).await?;
    println!("Schema ready on {}", db.display_target());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("travel-seed-worker")
        .enable_io()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Seed(args) => run_seed(args).await,
            Commands::Clear(args) => run_clear(args).await,
            Commands::InitSchema(args) => run_init_schema(args).await,
        }
    });

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
