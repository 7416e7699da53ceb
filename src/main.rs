//! Code Fable - terminal client for the repository analysis service
//!
//! Submits a repository, waits for the analysis job, and prints the
//! resulting report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error, or the analysis did not produce a result

use anyhow::{Context, Result};
use codefable::cli::{Args, Command};
use codefable::config::{Config, ReportFormat, CONFIG_FILE};
use codefable::report::{self, ReportView};
use codefable::{AnalysisSession, HttpApi, SessionState};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is needed before logging: it may turn on verbose output
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    init_logging(args.log_level(config.general.verbose));

    info!("codefable v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .codefable.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the requested command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let api = HttpApi::new(&config.api.base_url).context("Failed to set up the API client")?;
    let mut session = AnalysisSession::new(Arc::new(api), config.api.poll_interval());

    match args.command.clone() {
        Some(Command::Analyze { repo, cluster }) => {
            session.submit(&repo);
            wait_for_result(&mut session, args.quiet).await;
            show_result(&mut session, &config, cluster.as_deref())
        }
        Some(Command::Show { target, cluster }) => {
            session.open_shared(&target);
            wait_for_result(&mut session, args.quiet).await;
            show_result(&mut session, &config, cluster.as_deref())
        }
        Some(Command::History) => {
            session.load_history().await;
            print!("{}", report::generate_history_listing(session.history()));
            Ok(0)
        }
        None => anyhow::bail!("No command given"),
    }
}

/// Drive the session until it stops loading, with a spinner.
async fn wait_for_result(session: &mut AnalysisSession<HttpApi>, quiet: bool) {
    let spinner = if quiet || !session.is_loading() {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Analyzing... Thinking... Digesting the repo...");
        Some(pb)
    };

    while session.step().await {
        if let (Some(pb), SessionState::Loading { job_id: Some(job_id) }) =
            (&spinner, session.state())
        {
            pb.set_message(format!("Analyzing... (job {})", job_id));
        }
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Print notifications and the report. Returns the exit code.
fn show_result(
    session: &mut AnalysisSession<HttpApi>,
    config: &Config,
    cluster: Option<&str>,
) -> Result<i32> {
    for note in session.take_notifications() {
        eprintln!("❌ {}", note.message);
    }

    if session.current_result().is_none() {
        return Ok(1);
    }

    if let Err(e) = session.select_cluster(cluster) {
        let available: Vec<&str> = session
            .current_result()
            .map(|r| r.cluster_names().collect())
            .unwrap_or_default();
        anyhow::bail!("{} (available: {})", e, available.join(", "));
    }

    let Some(result) = session.current_result() else {
        return Ok(1);
    };
    let visible = session.visible_graph().unwrap_or_default();
    let share_link = session.share_link(&config.share.app_url);
    let view = ReportView {
        graph: &visible,
        cluster: session.cluster_filter(),
        share_link: share_link.as_deref(),
        max_hotspots: config.report.max_hotspots,
    };

    let output = match config.report.format {
        ReportFormat::Json => report::generate_json_report(result, &view)?,
        ReportFormat::Markdown => report::generate_markdown_report(result, &view),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(0)
}

/// Load configuration from file or use defaults. Also returns the path the
/// config came from. Runs before logging is set up.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}. Using defaults.", e);
            Ok((Config::default(), None))
        }
    }
}
