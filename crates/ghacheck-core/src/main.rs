#![warn(clippy::all)]

use std::process::ExitCode;
use std::sync::Arc;

use anstream::{eprintln, println};
use camino::Utf8PathBuf;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

mod analyzer;
mod cache;
mod compat;
mod discover;
mod error;
mod fetch;

use analyzer::Analyzer;
use cache::DocumentCache;
use discover::{DiscoverError, discover_directory, discover_file};
use error::AnalyzeError;
use fetch::{FilesystemFetcher, GitHubRestFetcher};

/// Validates GitHub Actions workflow YAML for schema conformance and
/// cross-document runtime consistency.
#[derive(Parser)]
#[command(about)]
struct App {
    /// A project directory containing `.github/workflows`, or a single
    /// workflow file inside one.
    input: Utf8PathBuf,

    /// The GitHub API token to use when resolving remote `uses:` targets.
    #[arg(long, env = "GH_TOKEN")]
    gh_token: Option<String>,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

fn init_tracing(app: &App) {
    let filter = EnvFilter::builder()
        .with_default_directive(app.verbose.tracing_level_filter().into())
        .from_env()
        .expect("failed to parse RUST_LOG");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let app = match App::try_parse() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{}: failed to start async runtime: {err}", "fatal".red().bold());
            return ExitCode::from(1);
        }
    };

    runtime.block_on(run(app))
}

async fn run(app: App) -> ExitCode {
    init_tracing(&app);

    let (root, targets) = match discover(&app.input) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("{}: {err}", "fatal".red().bold());
            return ExitCode::from(1);
        }
    };

    let local = Arc::new(FilesystemFetcher::new(root));
    let repository = Arc::new(GitHubRestFetcher::new(app.gh_token.clone()));
    let cache = Arc::new(DocumentCache::new(local, repository));
    let analyzer = Analyzer::new(cache);

    let mut all_valid = true;
    for target in &targets {
        let name = target
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| target.to_string());
        let relative = format!(".github/workflows/{name}");

        let result = analyzer.analyze_workflow_file(&relative).await;
        if !report(&name, result) {
            all_valid = false;
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Resolves the CLI's input argument into a project root and the list of
/// `.github/workflows`-relative filenames to validate.
fn discover(input: &Utf8PathBuf) -> Result<(Utf8PathBuf, Vec<Utf8PathBuf>), DiscoverError> {
    if input.is_dir() {
        let files = discover_directory(input)?;
        return Ok((input.clone(), files));
    }

    let file = discover_file(input)?;
    // file = <root>/.github/workflows/<name>
    let root = file
        .parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .expect("discover_file already validated the .github/workflows ancestry")
        .to_path_buf();

    Ok((root, vec![file]))
}

/// Prints one line for `name`'s validation result, green-check or red-✗ with
/// indented detail, and returns whether it passed.
fn report(name: &str, result: Result<(), AnalyzeError>) -> bool {
    match result {
        Ok(()) => {
            println!("{} {name} is valid", "\u{2713}".green());
            true
        }
        Err(AnalyzeError::Document(doc_err)) => {
            println!("{} {name} is invalid: {doc_err}", "\u{2717}".red());
            if let error::DocumentError::WorkflowSchema { errors, .. }
            | error::DocumentError::ActionSchema { errors, .. } = &doc_err
            {
                for schema_error in errors {
                    println!("  - {}", schema_error.message);
                    println!("      {}", schema_error.path.as_str().dimmed());
                }
            }
            false
        }
        Err(AnalyzeError::Runtime(message)) => {
            println!("{} {name} is invalid: {message}", "\u{2717}".red());
            false
        }
    }
}
