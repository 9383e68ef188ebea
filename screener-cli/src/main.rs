//! Screener CLI: entry/exit signal screen for a single instrument.
//!
//! Commands:
//! - `screen`: fetch bars through the cache, evaluate and render once
//! - `watch`: repeat `screen` on a fixed interval
//! - `cache clear`: remove every cached bar file

mod logging;
mod render;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use logging::LogFormat;
use render::Provenance;
use screener_core::data::{
    load_bars, BarCache, CircuitBreaker, CsvProvider, DataProvider, FetchRequest,
    SyntheticProvider, YahooProvider,
};
use screener_core::{screen, ScreenError, ScreenReport, ScreenerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "screener",
    about = "Screener CLI — entry/exit signal screen for a single instrument"
)]
struct Cli {
    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Debug-level logging (overrides RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, evaluate and render once.
    Screen(ScreenArgs),
    /// Re-run the screen on a fixed interval.
    Watch {
        #[command(flatten)]
        screen: ScreenArgs,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,

        /// Stop after this many refreshes. Runs until interrupted if omitted.
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached bar file.
    Clear {
        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, Args)]
struct ScreenArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Instrument to screen (overrides the config file).
    #[arg(long)]
    ticker: Option<String>,

    /// Trailing days scored for entry.
    #[arg(long)]
    entry_window: Option<usize>,

    /// Trailing days scored for exit.
    #[arg(long)]
    exit_window: Option<usize>,

    /// Calendar days of history to request.
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Last date of the requested range (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Where bars come from.
    #[arg(long, value_enum, default_value_t = Source::Yahoo)]
    source: Source,

    /// CSV history file (required with --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Cache directory.
    #[arg(long, default_value = "data/cache")]
    cache_dir: PathBuf,

    /// Always fetch; never read or write the cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Print the full report as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Rows shown per table (0 = all). Defaults to the config value.
    #[arg(long)]
    rows: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    match cli.command {
        Commands::Screen(args) => run_screen_cmd(&args),
        Commands::Watch {
            screen,
            interval_secs,
            iterations,
        } => run_watch_cmd(&screen, interval_secs, iterations),
        Commands::Cache { action } => match action {
            CacheAction::Clear { cache_dir } => run_cache_clear(&cache_dir),
        },
    }
}

/// Config file (or defaults) with command-line overrides applied, validated.
fn load_config(args: &ScreenArgs) -> Result<ScreenerConfig> {
    let mut config = match &args.config {
        Some(path) => ScreenerConfig::from_file(path)?,
        None => ScreenerConfig::default(),
    };

    if let Some(ticker) = &args.ticker {
        config.ticker = ticker.trim().to_uppercase();
    }
    if let Some(w) = args.entry_window {
        config.entry_window = w;
    }
    if let Some(w) = args.exit_window {
        config.exit_window = w;
    }
    if let Some(days) = args.lookback_days {
        config.lookback_days = days;
    }
    if let Some(rows) = args.rows {
        config.display_rows = rows;
    }

    config.validate()?;
    Ok(config)
}

fn build_provider(args: &ScreenArgs) -> Result<Box<dyn DataProvider>> {
    let provider: Box<dyn DataProvider> = match args.source {
        Source::Yahoo => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            Box::new(YahooProvider::new(circuit_breaker)?)
        }
        Source::Csv => {
            let Some(path) = &args.csv else {
                bail!("--source csv requires --csv PATH");
            };
            if !path.is_file() {
                bail!("CSV file not found: {}", path.display());
            }
            Box::new(CsvProvider::new(path))
        }
        Source::Synthetic => Box::new(SyntheticProvider),
    };
    Ok(provider)
}

fn parse_end(end: Option<&str>) -> Result<NaiveDate> {
    match end {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --end date '{s}' (expected YYYY-MM-DD)")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// One full refresh: load bars, validate, evaluate.
fn refresh(
    provider: &dyn DataProvider,
    cache: Option<&BarCache>,
    config: &ScreenerConfig,
    end: NaiveDate,
) -> Result<(ScreenReport, Provenance)> {
    let request = FetchRequest {
        ticker: config.ticker.clone(),
        end,
        lookback_days: config.lookback_days,
        ttl: config.cache_ttl(),
    };

    let loaded = load_bars(provider, cache, &request, Utc::now()).map_err(ScreenError::from)?;
    let provenance = Provenance {
        source: loaded.source,
        from_cache: loaded.from_cache,
    };
    info!(
        ticker = %config.ticker,
        source = %loaded.source,
        from_cache = loaded.from_cache,
        start = %loaded.start,
        end = %loaded.end,
        rows = loaded.bars.len(),
        "bars loaded"
    );

    let report = screen::run_raw(&config.ticker, loaded.bars, config)?;
    Ok((report, provenance))
}

fn print_report(
    report: &ScreenReport,
    provenance: Provenance,
    json: bool,
    rows: usize,
) -> Result<()> {
    if json {
        println!("{}", render::render_json(report)?);
    } else {
        print!("{}", render::render_text(report, provenance, rows));
    }
    Ok(())
}

fn open_cache(args: &ScreenArgs) -> Option<BarCache> {
    (!args.no_cache).then(|| BarCache::new(&args.cache_dir))
}

fn run_screen_cmd(args: &ScreenArgs) -> Result<()> {
    let config = load_config(args)?;
    let provider = build_provider(args)?;
    let cache = open_cache(args);
    let end = parse_end(args.end.as_deref())?;

    let (report, provenance) = refresh(provider.as_ref(), cache.as_ref(), &config, end)?;
    print_report(&report, provenance, args.json, config.display_rows)
}

fn run_watch_cmd(args: &ScreenArgs, interval_secs: u64, iterations: Option<u64>) -> Result<()> {
    if interval_secs == 0 {
        bail!("--interval-secs must be >= 1");
    }
    let config = load_config(args)?;
    let provider = build_provider(args)?;
    let cache = open_cache(args);
    let interval = Duration::from_secs(interval_secs);

    let mut completed = 0u64;
    loop {
        // A fixed --end pins the range; otherwise every refresh ends today.
        let end = parse_end(args.end.as_deref())?;
        match refresh(provider.as_ref(), cache.as_ref(), &config, end) {
            Ok((report, provenance)) => {
                print_report(&report, provenance, args.json, config.display_rows)?;
            }
            Err(e) => error!(error = %format!("{e:#}"), "refresh failed"),
        }

        completed += 1;
        if iterations.is_some_and(|n| completed >= n) {
            return Ok(());
        }
        info!(next_in_secs = interval_secs, "waiting for next refresh");
        std::thread::sleep(interval);
        if !args.json {
            println!();
        }
    }
}

fn run_cache_clear(cache_dir: &Path) -> Result<()> {
    let cache = BarCache::new(cache_dir);
    let removed = cache.clear()?;
    println!("Removed {removed} cache file(s) from {}", cache.cache_dir().display());
    Ok(())
}
