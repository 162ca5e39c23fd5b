use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use uberport::{dump, export, pipeline};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "uberport")]
#[command(about = "Convert an uberserver SQL dump into a Teiserver import document")]
struct Cli {
    /// Path to the uberserver SQL dump (.sql or .sql.bz2)
    input: PathBuf,

    /// Where to write the export document
    #[arg(short, long, default_value = uberport::config::DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();

    let text = dump::read_dump(&cli.input)?;
    let migration = pipeline::run_with_progress(&text, |stage| println!("{}", stage))
        .with_context(|| format!("Failed to convert dump: {}", cli.input.display()))?;

    export::write_document(&migration.document, &cli.output, cli.pretty)?;

    let stats = migration.stats;
    info!(
        duration_secs = start.elapsed().as_secs_f64(),
        "Conversion complete"
    );

    println!();
    println!("=== Summary ===");
    println!("Output:                {}", cli.output.display());
    println!("Total time:            {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!("INSERT tables:         {}", stats.insert_tables);
    println!("Users exported:        {}", stats.users);
    println!("Duplicated emails:     {}", stats.duplicated_emails);
    println!("Friendship rows:       {}", stats.friend_rows);
    println!("Ignore rows:           {}", stats.ignore_rows);
    println!("Friend request rows:   {}", stats.request_rows);
    println!("Verification rows:     {}", stats.verification_rows);
    println!("Pending verifications: {}", stats.pending_verifications);

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

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
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
