//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{report_path, JsonReportAdapter};
use crate::domain::analysis::{analyze_asset, analyze_portfolio, AssetAnalysis, PortfolioAnalysis};
use crate::domain::config_validation::{
    parse_date, parse_number, validate_analysis_config, validate_portfolio_config,
    validate_report_config, validate_strategy_config,
};
use crate::domain::error::AnalyticsError;
use crate::domain::portfolio::RebalancingPolicy;
use crate::domain::report::{generate_daily_report, AssetReport, DailyReport, PortfolioReport};
use crate::domain::request::{AnalysisRequest, Interval, Lookback, DEFAULT_INITIAL_VALUE};
use crate::domain::return_matrix::Alignment;
use crate::domain::strategy::{Strategy, DEFAULT_PERIOD, DEFAULT_THRESHOLD};
use crate::domain::universe::{parse_tickers, AssetUniverse};
use crate::domain::weights::WeightSpec;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(name = "quantfolio", about = "Portfolio analytics over historical prices")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one asset and run a single-asset strategy on it
    Asset {
        ticker: String,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
        /// Print the full analysis as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Simulate the configured portfolio
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        rebalancing: Option<String>,
        /// Print the full analysis as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Generate the daily JSON report
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Cli {
    /// Install a stderr fmt subscriber at the level chosen by `-v`.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("warning: logging was already initialized");
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Asset {
            ticker,
            config,
            strategy,
            json,
        } => run_asset(&config, &ticker, strategy.as_deref(), json),
        Command::Portfolio {
            config,
            tickers,
            rebalancing,
            json,
        } => run_portfolio(&config, tickers.as_deref(), rebalancing.as_deref(), json),
        Command::Report { config, output } => run_report(&config, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(e: &AnalyticsError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn missing(section: &str, key: &str) -> AnalyticsError {
    AnalyticsError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

/// Build the explicit request every analysis receives; `today` anchors relative periods.
pub fn build_analysis_request(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<AnalysisRequest, AnalyticsError> {
    let end_date = parse_date(config, "analysis", "end_date")?.unwrap_or(today);
    let start_date = match parse_date(config, "analysis", "start_date")? {
        Some(d) => d,
        None => {
            let period = config
                .get_string("analysis", "period")
                .ok_or_else(|| missing("analysis", "start_date"))?;
            Lookback::parse(&period)
                .and_then(|lookback| lookback.start_from(end_date))
                .map_err(|e| invalid("analysis", "period", e.to_string()))?
        }
    };

    let interval = match config.get_string("analysis", "interval") {
        Some(s) => Interval::parse(&s)
            .ok_or_else(|| invalid("analysis", "interval", format!("unknown interval '{s}'")))?,
        None => Interval::Daily,
    };
    let alignment = match config.get_string("portfolio", "alignment") {
        Some(s) => Alignment::parse(&s)
            .ok_or_else(|| invalid("portfolio", "alignment", format!("unknown alignment '{s}'")))?,
        None => Alignment::Intersection,
    };
    let rebalancing = config
        .get_string("portfolio", "rebalancing")
        .map(|s| RebalancingPolicy::from_label(&s))
        .unwrap_or_default();

    Ok(AnalysisRequest {
        start_date,
        end_date,
        interval,
        initial_value: parse_number(config, "analysis", "initial_value")?
            .unwrap_or(DEFAULT_INITIAL_VALUE),
        periods_per_year: parse_number(config, "analysis", "periods_per_year")?
            .unwrap_or_else(|| interval.default_periods_per_year()),
        risk_free_rate: parse_number(config, "analysis", "risk_free_rate")?.unwrap_or(0.0),
        rebalancing,
        alignment,
    })
}

pub fn build_weight_spec(config: &dyn ConfigPort) -> Result<WeightSpec, AnalyticsError> {
    let raw = match config.get_list("portfolio", "weights") {
        None => return Ok(WeightSpec::Equal),
        Some(tokens) => tokens
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| invalid("portfolio", "weights", format!("'{t}' is not a number")))
            })
            .collect::<Result<Vec<f64>, _>>()?,
    };

    let min = parse_number(config, "portfolio", "min_weight")?;
    let max = parse_number(config, "portfolio", "max_weight")?;
    Ok(match (min, max) {
        (Some(min), Some(max)) => WeightSpec::Clipped { raw, min, max },
        _ => WeightSpec::Raw(raw),
    })
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    name_override: Option<&str>,
) -> Result<Strategy, AnalyticsError> {
    let name = name_override
        .map(String::from)
        .or_else(|| config.get_string("strategy", "name"))
        .unwrap_or_else(|| "buy_and_hold".to_string());
    let period = config.get_int("strategy", "period", DEFAULT_PERIOD as i64);
    let period = usize::try_from(period)
        .map_err(|_| invalid("strategy", "period", "period must be a positive integer".into()))?;
    let threshold = parse_number(config, "strategy", "threshold")?.unwrap_or(DEFAULT_THRESHOLD);
    Strategy::parse(&name, period, threshold)
}

/// Tickers from `--tickers` if given, otherwise from `[section] key`.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<AssetUniverse, AnalyticsError> {
    let raw = match ticker_override {
        Some(t) => t.to_string(),
        None => config
            .get_string(section, key)
            .ok_or_else(|| missing(section, key))?,
    };
    parse_tickers(&raw).map_err(|e| invalid(section, key, e.to_string()))
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<CsvAdapter, AnalyticsError> {
    let path = config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| missing("data", "path"))?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&AnalyticsError::Report {
            reason: format!("failed to serialize output: {e}"),
        }),
    }
}

fn run_asset(config_path: &Path, ticker: &str, strategy: Option<&str>, json: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let prepared = validate_analysis_config(&config)
        .and_then(|()| validate_strategy_config(&config))
        .and_then(|()| build_analysis_request(&config, today()))
        .and_then(|request| Ok((request, build_strategy(&config, strategy)?)))
        .and_then(|(request, strategy)| Ok((request, strategy, build_data_port(&config)?)));
    let (request, strategy, data_port) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let ticker = ticker.trim().to_uppercase();
    eprintln!(
        "Analyzing {} from {} to {} ({})",
        ticker, request.start_date, request.end_date, request.interval
    );

    let analysis = match analyze_asset(&data_port, &ticker, strategy, &request) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    if json {
        return print_json(&analysis);
    }
    print_asset_summary(&analysis);
    ExitCode::SUCCESS
}

fn print_asset_summary(a: &AssetAnalysis) {
    println!("=== {} ===", a.ticker);
    println!("Period:           {} to {} ({} points)", a.first_date, a.last_date, a.data_points);
    println!("Total Return:     {}", pct(a.price.total_return));
    println!("Volatility:       {}", pct(a.price.annual_vol));
    println!("Sharpe Ratio:     {}", ratio(a.price.sharpe));
    println!("Max Drawdown:     {}", pct(a.price.max_drawdown));
    println!("Last Price:       {:.2}", a.price.final_value);

    println!("\n=== Strategy: {} ===", a.strategy_name);
    println!("Total Return:     {}", pct(a.strategy_summary.total_return));
    println!("Volatility:       {}", pct(a.strategy_summary.annual_vol));
    println!("Sharpe Ratio:     {}", ratio(a.strategy_summary.sharpe));
    println!("Max Drawdown:     {}", pct(a.strategy_summary.max_drawdown));
    println!("Final Value:      {:.4}", a.strategy_summary.final_value);
}

fn run_portfolio(
    config_path: &Path,
    tickers: Option<&str>,
    rebalancing: Option<&str>,
    json: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_analysis_config(&config) {
        return fail(&e);
    }
    if tickers.is_none() {
        if let Err(e) = validate_portfolio_config(&config) {
            return fail(&e);
        }
    }

    let prepared = build_analysis_request(&config, today())
        .and_then(|request| Ok((request, resolve_tickers(tickers, &config, "portfolio", "tickers")?)))
        .and_then(|(request, universe)| {
            // ad-hoc ticker lists do not line up with configured weights
            let spec = match tickers {
                Some(_) => WeightSpec::Equal,
                None => build_weight_spec(&config)?,
            };
            Ok((request, universe, spec, build_data_port(&config)?))
        });
    let (mut request, universe, spec, data_port) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    if let Some(label) = rebalancing {
        request.rebalancing = RebalancingPolicy::from_label(label);
    }

    eprintln!(
        "Simulating {} assets from {} to {}, rebalancing {}",
        universe.len(),
        request.start_date,
        request.end_date,
        request.rebalancing
    );

    let analysis = match analyze_portfolio(&data_port, &universe, &spec, &request) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    for skipped in &analysis.skipped {
        eprintln!("warning: skipped {} ({:?})", skipped.ticker, skipped.reason);
    }

    if json {
        return print_json(&analysis);
    }
    print_portfolio_summary(&analysis);
    ExitCode::SUCCESS
}

fn print_portfolio_summary(a: &PortfolioAnalysis) {
    println!("=== Weights ===");
    for (ticker, w) in a.weights.iter() {
        println!("  {:<10} {:>7.2}%", ticker, w * 100.0);
    }

    println!("\n=== {} ===", a.stats.label);
    println!("Total Return:     {}", pct(a.summary.total_return));
    println!("Annual Return:    {}", pct(a.stats.annualized_return));
    println!("Volatility:       {}", pct(a.stats.annualized_volatility));
    println!("Sharpe Ratio:     {}", ratio(a.stats.sharpe_ratio));
    println!("Max Drawdown:     {}", pct(a.summary.max_drawdown));
    println!("Initial Value:    {:.2}", a.values.initial_value());
    println!("Final Value:      {:.2}", a.summary.final_value);

    println!("\n=== Diversification ===");
    println!("Weighted Asset Vol: {}", pct(a.diversification.weighted_avg_asset_vol));
    println!("Portfolio Vol:      {}", pct(a.diversification.portfolio_vol));
    println!("Vol Reduction:      {:.1}%", a.diversification.vol_reduction_pct);

    println!("\n=== Correlation ===");
    let tickers = a.correlation.tickers();
    let header: Vec<String> = tickers.iter().map(|t| format!("{t:>8}")).collect();
    println!("{:<8} {}", "", header.join(" "));
    for (i, t) in tickers.iter().enumerate() {
        let row: Vec<String> = (0..tickers.len())
            .map(|j| a.correlation.get(i, j).map_or_else(|| format!("{:>8}", "N/A"), |r| format!("{r:>8.2}")))
            .collect();
        println!("{:<8} {}", t, row.join(" "));
    }
}

/// Ticker lists for the report: each falls back to the other when absent.
fn report_universes(config: &dyn ConfigPort) -> Result<(AssetUniverse, AssetUniverse), AnalyticsError> {
    let assets = config.get_string("report", "assets");
    let portfolio = config.get_string("portfolio", "tickers");
    let (assets, portfolio) = match (assets, portfolio) {
        (None, None) => return Err(missing("report", "assets")),
        (Some(a), None) => (a.clone(), a),
        (None, Some(p)) => (p.clone(), p),
        (Some(a), Some(p)) => (a, p),
    };
    let assets = parse_tickers(&assets).map_err(|e| invalid("report", "assets", e.to_string()))?;
    let portfolio =
        parse_tickers(&portfolio).map_err(|e| invalid("portfolio", "tickers", e.to_string()))?;
    Ok((assets, portfolio))
}

fn run_report(config_path: &Path, output: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let prepared = validate_analysis_config(&config)
        .and_then(|()| validate_report_config(&config))
        .and_then(|()| build_analysis_request(&config, today()))
        .and_then(|request| Ok((request, report_universes(&config)?)))
        .and_then(|(request, universes)| Ok((request, universes, build_data_port(&config)?)));
    let (request, (assets, portfolio), data_port) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    eprintln!("Generating asset reports for {} tickers...", assets.len());
    let report = generate_daily_report(
        &data_port,
        &assets,
        &portfolio,
        &request,
        Local::now().naive_local(),
    );
    print_report_summary(&report);

    let path = match output {
        Some(p) => p.clone(),
        None => {
            let dir = config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
            report_path(Path::new(dir.trim()), &report)
        }
    };

    match JsonReportAdapter::new().write(&report, &path) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_report_summary(report: &DailyReport) {
    for asset in &report.assets {
        match asset {
            AssetReport::Success(s) => eprintln!(
                "  {}: close {:.2}, last {}, volatility {}, drawdown {}",
                s.ticker,
                s.close_price,
                pct(s.daily_return),
                pct(s.annualized_volatility),
                pct(s.max_drawdown)
            ),
            AssetReport::Error { ticker, error } => eprintln!("  {}: error: {}", ticker, error),
        }
    }

    match &report.portfolio {
        PortfolioReport::Success(p) => {
            eprintln!("\nPortfolio ({}):", p.tickers.join(", "));
            eprintln!("  Value:        {:.2}", p.final_value);
            eprintln!("  Total Return: {}", pct(p.total_return));
            eprintln!("  Sharpe Ratio: {}", ratio(p.sharpe_ratio));
            eprintln!("  Volatility:   {}", pct(p.annualized_volatility));
            eprintln!("  Max Drawdown: {}", pct(p.max_drawdown));
        }
        PortfolioReport::Error { error } => eprintln!("\nPortfolio: error: {}", error),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_analysis_config(&config) {
        return fail(&e);
    }
    let request = match build_analysis_request(&config, today()) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    eprintln!(
        "  [analysis]  {} to {}, interval {}, {} periods/year",
        request.start_date, request.end_date, request.interval, request.periods_per_year
    );

    if config.get_string("portfolio", "tickers").is_some() {
        if let Err(e) = validate_portfolio_config(&config) {
            return fail(&e);
        }
        eprintln!(
            "  [portfolio] rebalancing {}, alignment {:?}",
            request.rebalancing, request.alignment
        );
    }

    if let Err(e) = validate_strategy_config(&config) {
        return fail(&e);
    }
    if let Err(e) = validate_report_config(&config) {
        return fail(&e);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match build_data_port(&config).and_then(|port| port.list_symbols()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
