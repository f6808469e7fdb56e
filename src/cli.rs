//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvFeed;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::system_clock::SystemClock;
use crate::domain::config_validation::{parse_time, validate_config};
use crate::domain::error::GoldenError;
use crate::domain::levels::{GOLDEN_RATIO, GoldenLevels, LevelCalculator, LevelMode};
use crate::domain::poller::{PollSettings, StopSignal};
use crate::domain::session::{SessionConfig, SessionReport, TradeSession};
use crate::domain::trade::{RiskParams, TradeState};
use crate::ports::clock_port::Clock;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataFeed;

#[derive(Parser, Debug)]
#[command(
    name = "goldentrigger",
    about = "Golden-ratio breakout levels and trade monitor"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Overrides [feed] data_dir
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Overrides [instrument] symbol
    #[arg(long)]
    pub symbol: Option<String>,
    /// Overrides [levels] mode (historical or quote)
    #[arg(long)]
    pub mode: Option<String>,
    /// Current session date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub session_date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute and print today's breakout levels
    Levels(RunArgs),
    /// Compute levels, wait for a breakout, then monitor the trade
    Watch(RunArgs),
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Levels(args) => run_levels(&args),
        Command::Watch(args) => run_watch(&args),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the config file and apply command-line overrides.
pub fn load_config(args: &RunArgs) -> Result<FileConfigAdapter, GoldenError> {
    info!(path = %args.config.display(), "loading config");
    let mut adapter = FileConfigAdapter::from_file(&args.config)?;
    if let Some(dir) = &args.data_dir {
        adapter.set("feed", "data_dir", &dir.display().to_string());
    }
    if let Some(symbol) = &args.symbol {
        adapter.set("instrument", "symbol", symbol);
    }
    if let Some(mode) = &args.mode {
        adapter.set("levels", "mode", mode);
    }
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn build_session_config(config: &dyn ConfigPort) -> Result<SessionConfig, GoldenError> {
    let symbol = config
        .get_string("instrument", "symbol")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GoldenError::ConfigMissing {
            section: "instrument".into(),
            key: "symbol".into(),
        })?;

    let mode = match config.get_string("levels", "mode") {
        Some(s) => s.parse::<LevelMode>().map_err(|reason| GoldenError::ConfigInvalid {
            section: "levels".into(),
            key: "mode".into(),
            reason,
        })?,
        None => LevelMode::default(),
    };

    let session_end = match config.get_string("polling", "session_end") {
        Some(s) if !s.trim().is_empty() => {
            Some(parse_time(&s).ok_or_else(|| GoldenError::ConfigInvalid {
                section: "polling".into(),
                key: "session_end".into(),
                reason: "expected HH:MM or HH:MM:SS".into(),
            })?)
        }
        _ => None,
    };

    Ok(SessionConfig {
        symbol,
        calculator: LevelCalculator::new(
            mode,
            config.get_double("levels", "ratio", GOLDEN_RATIO),
        ),
        risk: RiskParams {
            stop_loss_pct: config.get_double("trade", "stop_loss_pct", 0.5),
            target_pct: config.get_double("trade", "target_pct", 2.0),
        },
        poll: PollSettings {
            interval: Duration::from_secs(
                config.get_int("polling", "interval_secs", 10).max(1) as u64,
            ),
            retry_backoff: Duration::from_secs(
                config.get_int("polling", "retry_backoff_secs", 5).max(1) as u64,
            ),
            session_end,
        },
    })
}

pub fn build_feed(config: &dyn ConfigPort, session_date: NaiveDate) -> CsvFeed {
    let dir = config
        .get_string("feed", "data_dir")
        .unwrap_or_else(|| ".".to_string());
    CsvFeed::new(PathBuf::from(dir), session_date)
}

/// The `--session-date` flag, or today's date on `clock`.
pub fn resolve_session_date(args: &RunArgs, clock: &dyn Clock) -> NaiveDate {
    args.session_date.unwrap_or_else(|| clock.now().date())
}

/// Raise `stop` when the process receives Ctrl-C.
fn stop_on_ctrl_c(stop: StopSignal) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "ctrl-c handler unavailable");
                return;
            }
        };
        match runtime.block_on(tokio::signal::ctrl_c()) {
            Ok(()) => {
                info!("ctrl-c received, stopping after the current poll");
                stop.stop();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });
}

pub fn format_levels(symbol: &str, mode: LevelMode, levels: &GoldenLevels) -> String {
    format!(
        "--- {symbol} levels ({mode}) ---\n\
         Prev Close:    {:.2}\n\
         Golden Number: {:.2}\n\
         BUY ABOVE:     {:.2}\n\
         SELL BELOW:    {:.2}",
        levels.reference_close, levels.golden_number, levels.buy_above, levels.sell_below,
    )
}

pub fn format_report(symbol: &str, report: &SessionReport) -> String {
    let mut lines = vec![format!("--- {symbol} session ---")];
    match &report.entry {
        Some(trade) => {
            lines.push(format!(
                "Entry:     {} at {:.2}",
                trade.direction, trade.entry_price
            ));
            lines.push(format!(
                "Target:    {:.2} | StopLoss: {:.2}",
                trade.target, trade.stop_loss
            ));
        }
        None => lines.push("Entry:     none".to_string()),
    }
    match (&report.exit, &report.entry) {
        (Some(exit), Some(trade)) => lines.push(format!(
            "Exit:      {} at {:.2} ({:+.2} points)",
            exit.outcome,
            exit.price,
            trade.points(exit.price)
        )),
        _ => lines.push("Exit:      none".to_string()),
    }
    let state = match report.final_state {
        TradeState::None => "no trigger",
        TradeState::BuyTriggered | TradeState::SellTriggered => "open (stopped)",
        TradeState::Closed => "closed",
    };
    lines.push(format!("State:     {state}"));
    lines.join("\n")
}

fn run_levels(args: &RunArgs) -> Result<(), GoldenError> {
    let config = load_config(args)?;
    let session = build_session_config(&config)?;
    let feed = build_feed(&config, resolve_session_date(args, &SystemClock));

    let levels = session.calculator.compute_from_feed(&feed, &session.symbol)?;
    println!(
        "{}",
        format_levels(&session.symbol, session.calculator.mode, &levels)
    );
    Ok(())
}

fn run_watch(args: &RunArgs) -> Result<(), GoldenError> {
    let config = load_config(args)?;
    let session = build_session_config(&config)?;
    let feed = build_feed(&config, resolve_session_date(args, &SystemClock));

    let stop = StopSignal::new();
    stop_on_ctrl_c(stop.clone());

    let symbol = session.symbol.clone();
    let report = watch(session, &feed, &SystemClock, stop)?;
    println!("{}", format_report(&symbol, &report));
    Ok(())
}

/// Run a full session against any feed and clock, printing the levels first.
pub fn watch(
    session: SessionConfig,
    feed: &dyn DataFeed,
    clock: &dyn Clock,
    stop: StopSignal,
) -> Result<SessionReport, GoldenError> {
    let symbol = session.symbol.clone();
    let mode = session.calculator.mode;
    let mut trade_session = TradeSession::new(session, feed, clock, stop);

    let levels = trade_session.compute_levels()?;
    println!("{}", format_levels(&symbol, mode, &levels));
    trade_session.run_with_levels(levels)
}

fn run_validate(config_path: &Path) -> Result<(), GoldenError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = FileConfigAdapter::from_file(config_path)?;
    validate_config(&adapter)?;
    let session = build_session_config(&adapter)?;

    eprintln!("  symbol:        {}", session.symbol);
    eprintln!("  mode:          {}", session.calculator.mode);
    eprintln!("  ratio:         {}", session.calculator.ratio);
    eprintln!("  stop loss:     {}%", session.risk.stop_loss_pct);
    eprintln!("  target:        {}%", session.risk.target_pct);
    eprintln!("  poll interval: {:?}", session.poll.interval);
    eprintln!("  retry backoff: {:?}", session.poll.retry_backoff);
    match session.poll.session_end {
        Some(end) => eprintln!("  session end:   {end}"),
        None => eprintln!("  session end:   none"),
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
