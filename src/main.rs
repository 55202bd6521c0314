mod attempt;
mod browser;
mod error;
mod orchestrator;
mod report;
mod retry;
mod roster;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{error, info};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use attempt::AttemptConfig;
use browser::{BrowserConfig, BrowserKind, WebPage, new_session};
use error::RunError;
use orchestrator::BatchOrchestrator;
use retry::RetryPolicy;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HeadlessMode {
    /// Run the browser in headless mode
    Headless,
    /// Run the browser with a visible window
    Windowed,
}

impl HeadlessMode {
    const fn is_headless(self) -> bool {
        matches!(self, Self::Headless)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary on stdout
    Console,
    /// RunSummary as pretty-printed JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "giftcode-redeemer", version)]
#[command(about = "Bulk gift code redemption - fills the portal form once per player and code")]
struct Args {
    /// Gift code to redeem (ignored when --codes-file is given)
    #[arg(long)]
    code: Option<String>,

    /// File with one gift code per line; takes precedence over --code
    #[arg(long)]
    codes_file: Option<PathBuf>,

    /// Player roster: one "id display name" pair per line
    #[arg(long, default_value = "playerIDs.txt")]
    players_file: PathBuf,

    /// Redemption form URL
    #[arg(long, default_value = "https://ks-giftcode.centurygame.com/")]
    url: String,

    /// Redirect the run log to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(long, default_value = "screenshots")]
    screenshot_dir: PathBuf,

    /// Directory for per-code failure manifests
    #[arg(long, default_value = ".")]
    manifest_dir: PathBuf,

    /// Browser to drive
    #[arg(long, value_enum, default_value_t = BrowserKind::Chrome)]
    browser: BrowserKind,

    /// Headless or windowed browser
    #[arg(long, value_enum, default_value_t = HeadlessMode::Windowed)]
    headless: HeadlessMode,

    /// Connect to a Selenium Grid/remote WebDriver hub instead of local drivers
    #[arg(long)]
    hub: Option<String>,

    /// Maximum redemption attempts per player and code
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Delay between retries of the same job, in seconds
    #[arg(long, default_value_t = 2)]
    retry_delay_secs: u64,

    /// Pacing delay between jobs, in seconds
    #[arg(long, default_value_t = 1)]
    pacing_secs: u64,

    /// Bounded wait timeout for page elements, in seconds
    #[arg(long, default_value_t = 10)]
    wait_timeout_secs: u64,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose per-step logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    announce_banner();

    if let Err(err) = run(&args).await {
        error!("run aborted: {err:#}");
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎁 Gift Code Redeemer".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn init_logging(args: &Args) -> Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn build_browser_config(args: &Args) -> BrowserConfig {
    BrowserConfig {
        headless: args.headless.is_headless(),
        remote_hub: args.hub.clone(),
    }
}

fn build_attempt_config(args: &Args) -> AttemptConfig {
    AttemptConfig {
        form_url: args.url.clone(),
        screenshot_dir: args.screenshot_dir.clone(),
        settle_delay: Duration::from_secs(1),
    }
}

fn build_orchestrator(args: &Args) -> BatchOrchestrator {
    BatchOrchestrator {
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            retry_delay: Duration::from_secs(args.retry_delay_secs),
        },
        pacing: Duration::from_secs(args.pacing_secs),
        manifest_dir: args.manifest_dir.clone(),
    }
}

async fn run(args: &Args) -> Result<()> {
    info!(
        "gift code redemption run started {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let players = roster::load_players(&args.players_file)?;
    if players.is_empty() {
        return Err(RunError::Configuration("no players loaded".into()).into());
    }
    let codes = roster::load_codes(args.codes_file.as_deref(), args.code.as_deref())?;
    println!(
        "📋 {} players × {} code(s) queued",
        players.len(),
        codes.len()
    );

    let driver = new_session(args.browser, &build_browser_config(args))
        .await
        .map_err(RunError::Session)
        .with_context(|| format!("could not start {:?}", args.browser))?;

    let page = WebPage::new(driver.clone(), Duration::from_secs(args.wait_timeout_secs));
    let cfg = build_attempt_config(args);
    let orchestrator = build_orchestrator(args);

    let outcome = orchestrator.run(&page, &cfg, &players, &codes).await;
    let _ = driver.quit().await;
    let summary = outcome?;

    let mut out = std::io::stdout();
    match args.report {
        ReportFormat::Console => report::write_console_summary(&mut out, &summary)?,
        ReportFormat::Json => report::write_json_summary(&mut out, &summary)?,
    }
    info!(
        "processed {} jobs ({} succeeded) in {:?}",
        summary.total_processed, summary.total_succeeded, summary.elapsed
    );

    Ok(())
}
