//! geo-eval - terminal client for GEO citation analysis
//!
//! Runs keyword extraction for a brand, lets the user edit the proposed
//! keywords, then ranks the companies the AI answers cite for them.

mod edit;
mod render;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geo_eval_core::{
    ClientConfig, HttpAnalysisService, Language, PhaseOutcome, Reducer, SessionDriver,
    SessionInputs, SessionView,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edit::EditCommand;

#[derive(Parser)]
#[command(name = "geo-eval", version, about = "GEO (Generative Engine Optimization) evaluator")]
struct Cli {
    /// Analysis service base URL (overrides config and GEO_EVAL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full two-phase analysis
    Analyze(AnalyzeArgs),
    /// Check that the analysis service is reachable
    Health,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Brand or company name
    #[arg(short, long)]
    brand: String,

    /// City to focus the search on
    #[arg(short, long, default_value = "")]
    city: String,

    /// Target market
    #[arg(short, long, value_enum, default_value_t = LanguageArg::EnUs)]
    language: LanguageArg,

    /// Add a keyword before ranking (repeatable)
    #[arg(long = "add", value_name = "KEYWORD")]
    add: Vec<String>,

    /// Remove a proposed keyword by 1-based position (repeatable)
    #[arg(long = "remove", value_name = "INDEX")]
    remove: Vec<usize>,

    /// Skip interactive keyword editing
    #[arg(short, long)]
    yes: bool,

    /// Print the final session as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    PtBr,
    EnUs,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::PtBr => Language::PtBr,
            LanguageArg::EnUs => Language::EnUs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ClientConfig::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    debug!("Using analysis service at {}", config.api_url);

    match cli.command {
        Command::Health => health(config).await,
        Command::Analyze(args) => analyze(config, args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "geo_eval=debug,geo_eval_core=debug"
    } else {
        "geo_eval=warn,geo_eval_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn health(config: ClientConfig) -> Result<()> {
    let service = HttpAnalysisService::new(config)?;
    let status = service
        .health()
        .await
        .context("Analysis service is not reachable")?;
    println!(
        "{} (version {})",
        status.status,
        status.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

async fn analyze(config: ClientConfig, args: AnalyzeArgs) -> Result<()> {
    let service = Arc::new(HttpAnalysisService::new(config.clone())?);
    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_progress(rx));
    let mut driver =
        SessionDriver::new(service, Reducer::default(), config.max_keywords).with_updates(tx);

    eprintln!("Starting GEO analysis for: {}", args.brand);
    let inputs = SessionInputs::new(&args.brand, &args.city, args.language.into());
    let ctrl_c = cancel_on_ctrl_c(driver.canceller());
    let outcome = driver.run_keywords_phase(inputs).await;
    ctrl_c.abort();
    if outcome.context("Failed to start analysis")? == PhaseOutcome::Cancelled {
        eprintln!("Analysis cancelled by user.");
        return Ok(());
    }

    apply_cli_edits(&mut driver, &args);
    if !args.yes && std::io::stdin().is_terminal() {
        edit_interactively(&mut driver).await?;
    }

    let ctrl_c = cancel_on_ctrl_c(driver.canceller());
    let outcome = driver.run_rankings_phase().await;
    ctrl_c.abort();
    if outcome.context("Failed to refine analysis")? == PhaseOutcome::Cancelled {
        eprintln!("Analysis cancelled by user.");
        return Ok(());
    }

    let view = driver.view();
    drop(driver);
    let _ = reporter.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::results_table(&view.results));
    }
    Ok(())
}

/// Cancel the phase in flight when the user presses Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

/// Print progress labels to stderr as they change
async fn report_progress(mut rx: mpsc::UnboundedReceiver<SessionView>) {
    let mut last_label: Option<String> = None;
    while let Some(view) = rx.recv().await {
        if view.progress_label.is_some() && view.progress_label != last_label {
            if let Some(label) = &view.progress_label {
                eprintln!("  {}", label);
            }
        }
        last_label = view.progress_label;
    }
}

fn apply_cli_edits<S: geo_eval_core::AnalysisService>(
    driver: &mut SessionDriver<S>,
    args: &AnalyzeArgs,
) {
    // Highest position first so earlier removals don't shift later ones
    let mut positions = args.remove.clone();
    positions.sort_unstable_by(|a, b| b.cmp(a));
    positions.dedup();
    for position in positions {
        let removed = position
            .checked_sub(1)
            .ok_or_else(|| "positions start at 1".to_string())
            .and_then(|index| driver.remove_keyword(index).map_err(|e| e.to_string()));
        if let Err(e) = removed {
            eprintln!("Cannot remove keyword {}: {}", position, e);
        }
    }
    for keyword in &args.add {
        if let Err(e) = driver.add_keyword(keyword) {
            eprintln!("Cannot add '{}': {}", keyword, e);
        }
    }
}

async fn edit_interactively<S: geo_eval_core::AnalysisService>(
    driver: &mut SessionDriver<S>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let view = driver.view();
        eprint!(
            "{}",
            render::keyword_list(&view.edited_keywords, driver.session().max_keywords())
        );
        eprintln!("{}", edit::HELP);

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            return Ok(());
        };
        match EditCommand::parse(&line) {
            Ok(EditCommand::Done) => return Ok(()),
            Ok(EditCommand::Add(keyword)) => {
                if let Err(e) = driver.add_keyword(&keyword) {
                    eprintln!("{}", e);
                }
            }
            Ok(EditCommand::Remove(index)) => match driver.remove_keyword(index) {
                Ok(removed) => eprintln!("Removed '{}'", removed),
                Err(e) => eprintln!("{}", e),
            },
            Err(e) => eprintln!("{}", e),
        }
    }
}
