//! Configuration validation.
//!
//! Checks every config field a command will read before any data is loaded.
//! Numeric fields are parsed strictly here even though [`ConfigPort`]
//! lookups fall back to defaults on malformed input.

use crate::domain::error::AnalyticsError;
use crate::domain::request::{Interval, Lookback};
use crate::domain::return_matrix::Alignment;
use crate::domain::strategy::Strategy;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_data_path(config)?;
    validate_dates(config)?;
    validate_interval(config)?;
    validate_initial_value(config)?;
    validate_periods_per_year(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let count = validate_tickers(config, "portfolio", "tickers")?;
    validate_weights(config, count)?;
    validate_weight_bounds(config)?;
    validate_alignment(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "buy_and_hold".to_string());
    let period = parse_number(config, "strategy", "period")?.unwrap_or(20.0);
    if period < 1.0 || period.fract() != 0.0 {
        return Err(invalid("strategy", "period", "period must be a positive integer"));
    }
    let threshold = parse_number(config, "strategy", "threshold")?.unwrap_or(0.02);

    Strategy::parse(&name, period as usize, threshold).map_err(|e| match e {
        AnalyticsError::InvalidParameter { name: key, reason } => invalid("strategy", &key, &reason),
        other => other,
    })?;
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    if config.get_string("report", "assets").is_some() {
        validate_tickers(config, "report", "assets")?;
    }
    if let Some(dir) = config.get_string("report", "output_dir") {
        if dir.trim().is_empty() {
            return Err(invalid("report", "output_dir", "output_dir must not be empty"));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Strictly parsed number; `Ok(None)` when the key is absent.
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, AnalyticsError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, &format!("'{}' is not a number", s.trim()))),
        },
    }
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, AnalyticsError> {
    config
        .get_string(section, key)
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
                invalid(section, key, &format!("invalid {key} format, expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AnalyticsError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let start = parse_date(config, "analysis", "start_date")?;
    let end = parse_date(config, "analysis", "end_date")?;
    let period = config.get_string("analysis", "period");

    if let Some(p) = &period {
        Lookback::parse(p).map_err(|_| {
            invalid("analysis", "period", &format!("invalid period '{p}', expected e.g. 5d, 3mo, 1y, ytd"))
        })?;
    }

    match (start, end) {
        (None, _) if period.is_none() => Err(AnalyticsError::ConfigMissing {
            section: "analysis".to_string(),
            key: "start_date".to_string(),
        }),
        (Some(s), Some(e)) if s >= e => Err(invalid(
            "analysis",
            "start_date",
            "start_date must be before end_date",
        )),
        _ => Ok(()),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match config.get_string("analysis", "interval") {
        Some(s) if Interval::parse(&s).is_none() => Err(invalid(
            "analysis",
            "interval",
            &format!("unknown interval '{s}', expected 1d, 1wk or 1mo"),
        )),
        _ => Ok(()),
    }
}

fn validate_initial_value(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match parse_number(config, "analysis", "initial_value")? {
        Some(v) if v <= 0.0 => Err(invalid("analysis", "initial_value", "initial_value must be positive")),
        _ => Ok(()),
    }
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match parse_number(config, "analysis", "periods_per_year")? {
        Some(v) if v <= 0.0 => Err(invalid(
            "analysis",
            "periods_per_year",
            "periods_per_year must be positive",
        )),
        _ => Ok(()),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match parse_number(config, "analysis", "risk_free_rate")? {
        Some(v) if !(0.0..1.0).contains(&v) => Err(invalid(
            "analysis",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        )),
        _ => Ok(()),
    }
}

fn validate_tickers(config: &dyn ConfigPort, section: &str, key: &str) -> Result<usize, AnalyticsError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| AnalyticsError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })?;
    let universe = parse_tickers(&raw).map_err(|e| invalid(section, key, &e.to_string()))?;
    Ok(universe.len())
}

fn validate_weights(config: &dyn ConfigPort, ticker_count: usize) -> Result<(), AnalyticsError> {
    let Some(raw) = config.get_string("portfolio", "weights") else {
        return Ok(());
    };

    let mut count = 0;
    for token in raw.split(',') {
        let token = token.trim();
        match token.parse::<f64>() {
            Ok(w) if w.is_finite() && w >= 0.0 => count += 1,
            _ => {
                return Err(invalid(
                    "portfolio",
                    "weights",
                    &format!("'{token}' is not a non-negative number"),
                ))
            }
        }
    }

    if count != ticker_count {
        return Err(invalid(
            "portfolio",
            "weights",
            &format!("{count} weights for {ticker_count} tickers"),
        ));
    }
    Ok(())
}

fn validate_weight_bounds(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let min = parse_number(config, "portfolio", "min_weight")?;
    let max = parse_number(config, "portfolio", "max_weight")?;

    match (min, max) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(AnalyticsError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "max_weight".to_string(),
        }),
        (None, Some(_)) => Err(AnalyticsError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "min_weight".to_string(),
        }),
        (Some(lo), Some(hi)) if lo < 0.0 || hi > 1.0 || lo > hi => Err(invalid(
            "portfolio",
            "min_weight",
            "weight bounds must satisfy 0 <= min_weight <= max_weight <= 1",
        )),
        _ => Ok(()),
    }
}

fn validate_alignment(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match config.get_string("portfolio", "alignment") {
        Some(s) if Alignment::parse(&s).is_none() => Err(invalid(
            "portfolio",
            "alignment",
            &format!("unknown alignment '{s}', expected intersection or union"),
        )),
        _ => Ok(()),
    }
}
