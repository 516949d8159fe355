use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use user_upload::config::Config;
use user_upload::constants::DEFAULT_CONFIG_FILE;
use user_upload::utils::{format_duration, setup_logging};
use user_upload::{Importer, RunStatistics, SqliteStore};

#[derive(Parser)]
#[command(name = "user-upload")]
#[command(about = "📥 User Upload: validate a CSV of users and load it into a database table")]
#[command(version)]
struct Args {
    #[arg(
        short,
        long,
        required_unless_present = "create_table",
        help = "CSV file to import"
    )]
    file: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, help = "Configuration file")]
    config: PathBuf,

    #[arg(short, long, help = "SQLite database file (overrides config)")]
    database: Option<String>,

    #[arg(short, long, help = "Target table name (overrides config)")]
    table: Option<String>,

    #[arg(long, help = "CSV delimiter character (overrides config)")]
    delimiter: Option<char>,

    #[arg(long, help = "Rebuild the users table and exit without importing")]
    create_table: bool,

    #[arg(long, help = "Run the full import but roll back instead of committing")]
    dry_run: bool,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let start_time = Instant::now();

    let (mut config, source) = Config::load_or_default(&args.config).await?;
    if let Some(database) = &args.database {
        config.database.path = database.clone();
    }
    if let Some(table) = &args.table {
        config.import.table = table.clone();
    }
    if let Some(delimiter) = args.delimiter {
        config.import.delimiter = delimiter;
    }
    config.validate()?;

    let verbosity = if args.verbose { "verbose" } else { config.logging.verbosity.as_str() };
    setup_logging(verbosity, &config.logging.log_file)?;
    info!("{}", source);

    let database = config.database.path.clone();
    let table = config.import.table_identifier()?;

    if args.create_table {
        info!("Creating table '{}' in {}", table, database);
        let created = table.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let store = SqliteStore::open(&database)?;
            store.create_users_table(&created)?;
            Ok(())
        })
        .await??;
        println!("🧱 Table '{}' created successfully", table);
        return Ok(());
    }

    let file = args.file.context("--file is required")?;
    let mapping = config.import.column_mapping()?;
    let delimiter = config.import.delimiter_byte()?;
    let options = config.import.options(args.dry_run);

    println!("📥 Input: {}", file.display());
    println!("🗄️ Target: {} (table '{}')", database, table);
    if args.dry_run {
        println!("🧪 Dry run: nothing will be committed");
    }

    let stats = tokio::task::spawn_blocking(move || -> Result<RunStatistics> {
        let store = SqliteStore::open(&database)?;
        if !store.table_exists(&table)? {
            anyhow::bail!("Table '{}' does not exist, run with --create-table first", table);
        }

        let mut importer = Importer::new(store, table).with_options(options);
        Ok(importer.import(&file, delimiter, &mapping)?)
    })
    .await??;

    print_summary(&stats, start_time);

    Ok(())
}

fn print_summary(stats: &RunStatistics, start_time: Instant) {
    println!("\n🎉 Import completed");
    println!("=======================================");
    println!("📊 Total rows processed: {}", stats.total_rows);
    println!("✅ Successful inserts: {}", stats.successful_inserts);
    println!("❌ Failed inserts: {}", stats.failed_inserts);
    println!("⏱️ Processing time: {}", format_duration(start_time.elapsed()));

    if !stats.errors.is_empty() {
        println!("\n⚠️ Errors encountered:");
        for error in &stats.errors {
            println!("- {}", error);
        }
    }
}
