//! CLI entry point for `mailsindex`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailsindex::config::Config;
use mailsindex::index::bootstrap::{ensure_index, BootstrapOutcome};
use mailsindex::index::transport::HttpTransport;
use mailsindex::ingest::{self, IngestReport};
use mailsindex::model::schema::IndexSchema;

#[derive(Parser)]
#[command(
    name = "mailsindex",
    version,
    about = "Load per-user maildir corpora into a full-text search index"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Index service base URL (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Target index name (overrides config)
    #[arg(long, global = true, value_name = "NAME")]
    index: Option<String>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a corpus: walks ROOT/DATASET/maildir
    Ingest {
        /// Directory holding the dataset
        #[arg(required_unless_present = "maildir")]
        root: Option<PathBuf>,
        /// Dataset/version directory under ROOT
        #[arg(required_unless_present = "maildir")]
        dataset: Option<String>,
        /// Walk this directory directly instead of ROOT/DATASET/maildir
        #[arg(long, value_name = "DIR", conflicts_with_all = ["root", "dataset"])]
        maildir: Option<PathBuf>,
        /// Log and continue on unreadable files or directories
        #[arg(long)]
        continue_on_error: bool,
        /// Classify and parse only; send nothing to the index
        #[arg(long)]
        dry_run: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the index if it does not exist
    Bootstrap,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => return cmd_completions(shell),
        Commands::Manpage => return cmd_manpage(),
        _ => {}
    }

    let mut config = mailsindex::config::load_config(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.server.url = url;
    }
    if let Some(index) = cli.index {
        config.server.index = index;
    }
    config.validate()?;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Ingest {
            root,
            dataset,
            maildir,
            continue_on_error,
            dry_run,
            json,
        } => {
            let corpus = match (maildir, root, dataset) {
                (Some(dir), _, _) => dir,
                (None, Some(root), Some(dataset)) => root.join(dataset).join("maildir"),
                _ => anyhow::bail!("either ROOT and DATASET or --maildir is required"),
            };
            if continue_on_error {
                config.ingest.continue_on_walk_error = true;
            }
            cmd_ingest(&corpus, &config, dry_run, json)
        }
        Commands::Bootstrap => cmd_bootstrap(&config),
        Commands::Completions { .. } | Commands::Manpage => Ok(()),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = mailsindex::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailsindex.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailsindex", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Ensure the index exists and report what happened.
fn cmd_bootstrap(config: &Config) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config.server)?;
    let schema = IndexSchema::from_config(config);
    match ensure_index(&transport, &schema)? {
        BootstrapOutcome::AlreadyPresent => {
            println!("  Index '{}' already exists", schema.index)
        }
        BootstrapOutcome::Created => println!("  Index '{}' created", schema.index),
    }
    Ok(())
}

/// Walk a corpus and upload every message.
fn cmd_ingest(corpus: &Path, config: &Config, dry_run: bool, json: bool) -> anyhow::Result<()> {
    if !corpus.is_dir() {
        anyhow::bail!("Corpus directory not found: {}", corpus.display());
    }

    let transport = HttpTransport::new(&config.server)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} Indexing {pos} file(s) [{elapsed_precise}] {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let start = Instant::now();
    let report = ingest::run_pipeline(
        corpus,
        config,
        &transport,
        dry_run,
        Some(&|report: &IngestReport| {
            pb.set_position(report.files_seen);
            pb.set_message(format!(
                "{} uploaded, {} duplicate, {} skipped",
                report.uploaded,
                report.duplicates,
                report.skipped()
            ));
        }),
    );
    pb.finish_and_clear();
    let report = report?;

    if json {
        let output = serde_json::json!({
            "corpus": corpus.to_string_lossy(),
            "dry_run": dry_run,
            "elapsed_ms": start.elapsed().as_millis(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(corpus, &report, start.elapsed(), dry_run);
        println!("Indexing complete");
    }
    Ok(())
}

/// Print the run report as a table.
fn print_report(corpus: &Path, report: &IngestReport, elapsed: std::time::Duration, dry_run: bool) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<22} {}", "Corpus", corpus.display());
    println!("  {:<22} {}", "Files seen", report.files_seen);
    println!("  {:<22} {}", "Read", format_size(report.bytes_read, BINARY));
    if dry_run {
        println!("  {:<22} {}", "Valid documents", report.validated);
    } else {
        println!("  {:<22} {}", "Uploaded", report.uploaded);
        println!("  {:<22} {}", "Already indexed", report.duplicates);
        println!("  {:<22} {}", "Rejected by index", report.upload_failures);
    }
    println!("  {:<22} {}", "Skipped (path)", report.skipped_path);
    println!("  {:<22} {}", "Skipped (malformed)", report.skipped_parse);
    println!("  {:<22} {}", "Skipped (body)", report.skipped_body);
    println!("  {:<22} {}", "Skipped (date)", report.skipped_date);
    if report.walk_errors > 0 {
        println!("  {:<22} {}", "Unreadable entries", report.walk_errors);
    }
    println!("  {:<22} {:.2?}", "Elapsed", elapsed);
    println!();
}
