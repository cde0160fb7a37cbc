//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_param_adapter::FileParamAdapter;
use crate::adapters::static_param_adapter::DefaultParams;
use crate::domain::engine::Engine;
use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorType;
use crate::domain::panel::StandardPanel;
use crate::ports::data_port::DataPort;
use crate::ports::param_port::ParamPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "barflow", about = "Incremental indicator engine")]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a symbol's bars through the indicator panel
    Replay {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        exchange: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// INI file with a [params] section
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Indicator such as "SMA(20)"; repeatable. Defaults to the standard set.
        #[arg(short, long = "indicator")]
        indicators: Vec<String>,
        /// CSV file for the displayed series
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        exchange: String,
    },
}

pub struct ReplayArgs<'a> {
    pub data_dir: &'a Path,
    pub code: &'a str,
    pub exchange: &'a str,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub params: Option<&'a Path>,
    pub indicators: &'a [String],
    pub output: Option<&'a Path>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match &cli.command {
        Command::Replay {
            data_dir,
            code,
            exchange,
            start,
            end,
            params,
            indicators,
            output,
        } => run_replay(&ReplayArgs {
            data_dir,
            code,
            exchange,
            start: *start,
            end: *end,
            params: params.as_deref(),
            indicators,
            output: output.as_deref(),
        }),
        Command::ListSymbols { data_dir, exchange } => run_list_symbols(data_dir, exchange),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

/// Parse `--indicator` values, keeping the first of any repeated entries.
pub fn parse_indicators(specs: &[String]) -> Result<Vec<IndicatorType>, EngineError> {
    let mut seen = HashSet::new();
    let mut indicators = Vec::with_capacity(specs.len());
    for spec in specs {
        let kind: IndicatorType = spec.parse()?;
        if seen.insert(kind.clone()) {
            indicators.push(kind);
        } else {
            warn!(indicator = %kind, "duplicate indicator ignored");
        }
    }
    Ok(indicators)
}

pub fn load_params(path: Option<&Path>) -> Result<Box<dyn ParamPort>, EngineError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading parameters");
            Ok(Box::new(FileParamAdapter::from_file(path)?))
        }
        None => Ok(Box::new(DefaultParams)),
    }
}

pub fn run_replay(args: &ReplayArgs<'_>) -> Result<(), EngineError> {
    // Stage 1: indicators and parameters
    let indicators = parse_indicators(args.indicators)?;
    let params = load_params(args.params)?;

    // Stage 2: load bars
    let data = CsvAdapter::new(args.data_dir.to_path_buf());
    let start = args.start.unwrap_or(NaiveDate::MIN);
    let end = args.end.unwrap_or(NaiveDate::MAX);
    let bars = data.fetch_ohlcv(args.code, args.exchange, start, end)?;
    info!(code = args.code, exchange = args.exchange, bars = bars.len(), "loaded bars");
    if bars.is_empty() {
        return Err(EngineError::Data {
            reason: format!("no bars for {}.{} in range", args.code, args.exchange),
        });
    }

    // Stage 3: replay
    let mut engine = Engine::new(StandardPanel::new(indicators), params);
    let cycles = engine.replay(&bars)?;
    let store = engine.context().series_store();
    info!(cycles, series = store.count(), "replay complete");
    for event in engine.computation().events() {
        info!(rule = %event.rule, index = event.index, date = %bars[event.index].date, value = event.value, "rule event");
    }

    // Stage 4: report
    match args.output {
        Some(path) => {
            CsvReportAdapter.write(store, path)?;
            info!(path = %path.display(), "report written");
        }
        None => {
            for id in CsvReportAdapter::columns(store) {
                let series = store.get(id);
                println!("{} = {}", series.name(), series.last());
            }
        }
    }
    engine.dispose();
    Ok(())
}

fn run_list_symbols(data_dir: &Path, exchange: &str) -> Result<(), EngineError> {
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = data.list_symbols(exchange)?;
    if symbols.is_empty() {
        println!("No symbols found for exchange {}", exchange);
    } else {
        for s in &symbols {
            println!("{}", s);
        }
    }
    Ok(())
}
