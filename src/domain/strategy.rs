//! Single-asset strategy evaluators.
//!
//! Each evaluator turns a price history into the value of one unit of capital,
//! one point per price. Signals are long/flat and act on the next period's
//! return, so a signal raised at the close of day `t` earns the return of `t + 1`.

use crate::domain::error::AnalyticsError;
use crate::domain::series::{PortfolioValueSeries, PriceSeries, SeriesPoint};
use serde::Serialize;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Strategy {
    BuyAndHold,
    Momentum { period: usize },
    MeanReversion { period: usize, threshold: f64 },
}

impl Strategy {
    /// Build a strategy by name; `period` and `threshold` apply where relevant.
    pub fn parse(name: &str, period: usize, threshold: f64) -> Result<Self, AnalyticsError> {
        let strategy = match name.trim().to_lowercase().as_str() {
            "buy_and_hold" | "buy-and-hold" | "buyandhold" => Strategy::BuyAndHold,
            "momentum" => Strategy::Momentum { period },
            "mean_reversion" | "mean-reversion" => Strategy::MeanReversion { period, threshold },
            other => {
                return Err(AnalyticsError::invalid_parameter(
                    "strategy",
                    format!("unknown strategy '{other}'"),
                ));
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        match *self {
            Strategy::BuyAndHold => Ok(()),
            Strategy::Momentum { period } => check_period(period),
            Strategy::MeanReversion { period, threshold } => {
                check_period(period)?;
                if !(0.0..1.0).contains(&threshold) {
                    return Err(AnalyticsError::invalid_parameter(
                        "threshold",
                        format!("must be in [0, 1), got {threshold}"),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn name(&self) -> String {
        match self {
            Strategy::BuyAndHold => "Buy & Hold".to_string(),
            Strategy::Momentum { period } => format!("Momentum_{period}"),
            Strategy::MeanReversion { period, threshold } => {
                format!("MeanReversion_{period}_{threshold}")
            }
        }
    }

    pub fn run(&self, prices: &PriceSeries) -> Result<PortfolioValueSeries, AnalyticsError> {
        match *self {
            Strategy::BuyAndHold => run_buy_and_hold(prices),
            Strategy::Momentum { period } => run_momentum(prices, period),
            Strategy::MeanReversion { period, threshold } => {
                run_mean_reversion(prices, period, threshold)
            }
        }
    }
}

fn check_period(period: usize) -> Result<(), AnalyticsError> {
    if period == 0 {
        return Err(AnalyticsError::invalid_parameter("period", "must be at least 1"));
    }
    Ok(())
}

fn require_prices(prices: &PriceSeries) -> Result<(), AnalyticsError> {
    if prices.is_empty() {
        return Err(AnalyticsError::NoData {
            ticker: prices.ticker().to_string(),
        });
    }
    Ok(())
}

/// Trailing simple moving average; `None` until `period` prices are available.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        out.push((period > 0 && i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// Compound next-period returns while the signal is on.
fn compound(prices: &PriceSeries, signal: &[bool]) -> PortfolioValueSeries {
    let points = prices.points();
    let mut out = Vec::with_capacity(points.len());
    let mut value = 1.0;

    for (t, p) in points.iter().enumerate() {
        if t > 0 && signal[t - 1] {
            value *= p.value / points[t - 1].value;
        }
        out.push(SeriesPoint::new(p.date, value));
    }
    PortfolioValueSeries::from_parts(out)
}

pub fn run_buy_and_hold(prices: &PriceSeries) -> Result<PortfolioValueSeries, AnalyticsError> {
    require_prices(prices)?;
    let first = prices.points()[0].value;
    let points = prices
        .points()
        .iter()
        .map(|p| SeriesPoint::new(p.date, p.value / first))
        .collect();
    Ok(PortfolioValueSeries::from_parts(points))
}

/// Long while the price closes above its `period` moving average.
pub fn run_momentum(prices: &PriceSeries, period: usize) -> Result<PortfolioValueSeries, AnalyticsError> {
    check_period(period)?;
    require_prices(prices)?;

    let values = prices.prices();
    let signal: Vec<bool> = values
        .iter()
        .zip(rolling_mean(&values, period))
        .map(|(p, ma)| ma.is_some_and(|ma| *p > ma))
        .collect();
    Ok(compound(prices, &signal))
}

/// Long while the price sits more than `threshold` below its `period` moving average.
pub fn run_mean_reversion(
    prices: &PriceSeries,
    period: usize,
    threshold: f64,
) -> Result<PortfolioValueSeries, AnalyticsError> {
    Strategy::MeanReversion { period, threshold }.validate()?;
    require_prices(prices)?;

    let values = prices.prices();
    let signal: Vec<bool> = values
        .iter()
        .zip(rolling_mean(&values, period))
        .map(|(p, ma)| ma.is_some_and(|ma| *p < ma * (1.0 - threshold)))
        .collect();
    Ok(compound(prices, &signal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    fn prices(values: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(start + Days::new(i as u64), v))
            .collect();
        PriceSeries::new("TEST", points).unwrap()
    }

    #[test]
    fn rolling_mean_warms_up() {
        let ma = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(ma, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn buy_and_hold_tracks_price() {
        let v = run_buy_and_hold(&prices(&[50.0, 55.0, 45.0])).unwrap().values();
        assert_eq!(v.len(), 3);
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn momentum_trades_on_previous_signal() {
        // ma(2): -, 10.5, 11.5, 11.5, 10.5
        // signal: off, on (11 > 10.5), on (12 > 11.5), off (11 < 11.5), off
        let series = prices(&[10.0, 11.0, 12.0, 11.0, 10.0]);
        let v = run_momentum(&series, 2).unwrap().values();

        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[1], 1.0);
        assert_relative_eq!(v[2], 12.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(v[3], 12.0 / 11.0 * 11.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(v[4], v[3], epsilon = 1e-12);
    }

    #[test]
    fn momentum_period_longer_than_history_stays_flat() {
        let v = run_momentum(&prices(&[10.0, 12.0, 14.0]), 10).unwrap().values();
        assert!(v.iter().all(|x| *x == 1.0));
    }

    #[test]
    fn mean_reversion_buys_the_dip() {
        // ma(2) at day 2 = 9.5; 9 < 9.5 * 0.98 -> long for day 3
        let series = prices(&[10.0, 10.0, 9.0, 9.9]);
        let v = run_mean_reversion(&series, 2, 0.02).unwrap().values();
        assert_relative_eq!(v[2], 1.0);
        assert_relative_eq!(v[3], 9.9 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let series = prices(&[10.0, 11.0, 12.0]);
        assert!(run_momentum(&series, 0).is_err());
        assert!(run_mean_reversion(&series, 5, 1.0).is_err());
        assert!(run_mean_reversion(&series, 5, -0.1).is_err());
        assert!(run_buy_and_hold(&PriceSeries::empty("X")).is_err());
    }

    #[test]
    fn parse_and_run() {
        let s = Strategy::parse("Momentum", 3, 0.0).unwrap();
        assert_eq!(s, Strategy::Momentum { period: 3 });
        assert_eq!(s.name(), "Momentum_3");
        assert_eq!(Strategy::parse("buy_and_hold", 0, 0.0).unwrap().name(), "Buy & Hold");
        assert!(Strategy::parse("martingale", 3, 0.0).is_err());
        assert!(Strategy::parse("momentum", 0, 0.0).is_err());

        let values = s.run(&prices(&[10.0, 11.0, 12.0, 13.0])).unwrap();
        assert_eq!(values.len(), 4);
    }
}
