//! Starhist CLI - collect the star history of a GitHub repository.

mod config;
mod output;
mod progress;
mod shutdown;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::Term;
use starhist::gateway::AuthorizedTransport;
use starhist::github::{GitHubClient, GitHubError};
use starhist::http::ReqwestTransport;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;
use crate::progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "starhist")]
#[command(version)]
#[command(about = "Collect the full star history of a GitHub repository")]
#[command(
    long_about = "Starhist fetches every star event of a GitHub repository, in order, \
through the REST API. Conditional requests are cached in memory for the run, pages are \
fetched concurrently, and the result is printed as CSV or JSON."
)]
#[command(after_long_help = r#"EXAMPLES
    Collect a repository's star history as CSV:
        $ starhist caarlos0/starcharts

    Write the history as JSON to a file:
        $ starhist caarlos0/starcharts --format json --output stars.json

    Use a token for the higher authenticated rate limit:
        $ STARHIST_GITHUB_TOKEN=ghp_... starhist rust-lang/rust

CONFIGURATION
    Starhist reads configuration from:
      1. ~/.config/starhist/config.toml (or $XDG_CONFIG_HOME/starhist/config.toml)
      2. ./starhist.toml
      3. Environment variables (STARHIST_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STARHIST_GITHUB_TOKEN        GitHub personal access token
    STARHIST_COLLECT_PAGE_SIZE   Stargazers per page (default: 100)
    STARHIST_COLLECT_CONCURRENCY Concurrent page requests (default: 4)

EXIT STATUS
    0    History collected
    1    Any other failure
    2    GitHub rate limit exceeded
    3    Repository has more stargazer pages than GitHub will serve
    130  Interrupted
"#)]
struct Cli {
    /// Repository to collect, as owner/name
    repo: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GitHub API token (default from config or STARHIST_GITHUB_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Stargazers per page, 1-100 (default from config or 100)
    #[arg(short = 'p', long)]
    page_size: Option<u32>,

    /// Maximum concurrent page requests (default from config or 4)
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    no_rate_limit: bool,
}

/// Exit status when the GitHub rate limit cut the run short.
const EXIT_RATE_LIMITED: i32 = 2;
/// Exit status when the repository needs more pages than GitHub serves.
const EXIT_TOO_MANY_STARS: i32 = 3;
/// Exit status for an interrupted run, matching the SIGINT convention.
const EXIT_INTERRUPTED: i32 = 130;

/// HTTP timeout for a single API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cancel = shutdown::setup_shutdown_handler();

    // Structured logging only when not connected to a TTY; interactive
    // runs get the progress reporter instead.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("starhist=info,starhist_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();
    validate_repo_name(&cli.repo)?;

    let token = cli.token.clone().or_else(|| config.github_token());
    let options = config.collect_options(cli.page_size, cli.concurrency);

    let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
    let mut gateway = AuthorizedTransport::new(Arc::new(transport));
    if let Some(token) = token {
        gateway = gateway.with_token(token);
    }
    if cli.no_rate_limit || config.collect.no_rate_limit {
        gateway = gateway.with_rate_limiter(None);
    }

    let client = GitHubClient::new(Arc::new(gateway)).with_options(options);

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.callback();

    let stars = match client.collect_stars(&cli.repo, &cancel, Some(&callback)).await {
        Ok(stars) => stars,
        Err(err) => report_failure(&err),
    };

    let mut rendered = Vec::new();
    match cli.format {
        OutputFormat::Csv => output::write_csv(&mut rendered, &stars)?,
        OutputFormat::Json => output::write_json(&mut rendered, &stars)?,
    }

    match &cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => io::stdout().write_all(&rendered)?,
    }

    Ok(())
}

/// Check that `name` looks like `owner/name`.
fn validate_repo_name(name: &str) -> Result<(), String> {
    let mut parts = name.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => Ok(()),
        _ => Err(format!(
            "invalid repository '{name}', expected the owner/name form"
        )),
    }
}

/// Print the error and exit with a status distinguishing the causes a
/// script might branch on.
fn report_failure(err: &GitHubError) -> ! {
    let code = match err {
        GitHubError::RateLimited => EXIT_RATE_LIMITED,
        GitHubError::TooManyStars { .. } => EXIT_TOO_MANY_STARS,
        GitHubError::Cancelled => EXIT_INTERRUPTED,
        _ => 1,
    };
    eprintln!("error: {err}");
    std::process::exit(code);
}
