//! End-to-end analysis pipelines over a mock price source.

mod common;

use approx::assert_relative_eq;
use common::*;
use quantfolio::domain::analysis::{analyze_asset, analyze_portfolio};
use quantfolio::domain::error::AnalyticsError;
use quantfolio::domain::portfolio::RebalancingPolicy;
use quantfolio::domain::report::{generate_daily_report, AssetReport, PortfolioReport};
use quantfolio::domain::request::Interval;
use quantfolio::domain::strategy::Strategy;
use quantfolio::domain::universe::{parse_tickers, validate_universe, SkipReason};
use quantfolio::domain::weights::WeightSpec;

fn asset_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

mod portfolio_pipeline {
    use super::*;

    #[test]
    fn equal_weight_daily_rebalanced() {
        let port = two_asset_port();
        let universe = parse_tickers("AAA,BBB").unwrap();
        let analysis = analyze_portfolio(&port, &universe, &WeightSpec::Equal, &request_2024()).unwrap();

        let a = asset_returns(&[100.0, 102.0, 101.0, 104.0, 106.0]);
        let b = asset_returns(&[50.0, 49.0, 50.0, 49.5, 49.0]);
        let returns = analysis.returns.values();
        assert_eq!(returns.len(), 4);
        for i in 0..4 {
            assert_relative_eq!(returns[i], 0.5 * a[i] + 0.5 * b[i], epsilon = 1e-12);
        }

        assert_eq!(analysis.values.len(), 5);
        assert_eq!(analysis.values.initial_value(), 100.0);
        assert_eq!(analysis.returns.base_date(), date(2024, 1, 2));
        assert!(analysis.skipped.is_empty());
        assert_relative_eq!(analysis.weights.sum(), 1.0, epsilon = 1e-12);
        assert_eq!(analysis.stats.label, "Portfolio");
    }

    #[test]
    fn buy_and_hold_final_value() {
        let port = two_asset_port();
        let universe = parse_tickers("AAA,BBB").unwrap();
        let mut request = request_2024();
        request.rebalancing = RebalancingPolicy::None;

        let analysis = analyze_portfolio(&port, &universe, &WeightSpec::Equal, &request).unwrap();

        // 50 in each asset: 50 * 1.06 + 50 * 0.98
        assert_relative_eq!(analysis.summary.final_value, 102.0, epsilon = 1e-9);
        assert_relative_eq!(analysis.summary.total_return, 0.02, epsilon = 1e-9);
    }

    #[test]
    fn opposite_moves_diversify() {
        let port = two_asset_port();
        let universe = parse_tickers("AAA,BBB").unwrap();
        let analysis = analyze_portfolio(&port, &universe, &WeightSpec::Equal, &request_2024()).unwrap();

        let corr = analysis.correlation.between("AAA", "BBB").unwrap();
        assert!(corr < 0.0);
        assert_eq!(analysis.correlation.between("AAA", "AAA"), Some(1.0));
        assert!(analysis.diversification.portfolio_vol < analysis.diversification.weighted_avg_asset_vol);
        assert!(analysis.diversification.vol_reduction_pct > 0.0);
    }

    #[test]
    fn skipped_tickers_keep_configured_weights() {
        let port = two_asset_port()
            .with_prices("SHORT", daily_points(date(2024, 1, 2), &[10.0, 11.0]))
            .with_error("BROKEN", "connection reset");
        let universe = parse_tickers("AAA,SHORT,BBB,BROKEN,GONE").unwrap();
        let spec = WeightSpec::Raw(vec![3.0, 1.0, 1.0, 1.0, 1.0]);

        let analysis = analyze_portfolio(&port, &universe, &spec, &request_2024()).unwrap();

        assert_eq!(analysis.universe.tickers(), ["AAA", "BBB"]);
        assert_relative_eq!(analysis.weights.weight("AAA"), 0.75, epsilon = 1e-12);
        assert_relative_eq!(analysis.weights.weight("BBB"), 0.25, epsilon = 1e-12);

        let reasons: Vec<(&str, &SkipReason)> = analysis
            .skipped
            .iter()
            .map(|s| (s.ticker.as_str(), &s.reason))
            .collect();
        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0], ("SHORT", &SkipReason::InsufficientPoints { points: 2 }));
        assert!(matches!(reasons[1], ("BROKEN", SkipReason::FetchFailed { .. })));
        assert_eq!(reasons[2], ("GONE", &SkipReason::NoData));
    }

    #[test]
    fn weight_count_must_match_configured_tickers() {
        let port = two_asset_port();
        let universe = parse_tickers("AAA,BBB").unwrap();
        let spec = WeightSpec::Raw(vec![1.0, 1.0, 1.0]);

        let result = analyze_portfolio(&port, &universe, &spec, &request_2024());
        assert!(matches!(
            result,
            Err(AnalyticsError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn no_usable_ticker_is_no_data() {
        let port = MockPriceDataPort::new();
        let universe = parse_tickers("XXX,YYY").unwrap();

        let result = analyze_portfolio(&port, &universe, &WeightSpec::Equal, &request_2024());
        assert!(matches!(result, Err(AnalyticsError::NoData { .. })));
    }

    #[test]
    fn date_range_outside_data_is_no_data() {
        let port = two_asset_port();
        let universe = parse_tickers("AAA,BBB").unwrap();
        let mut request = request_2024();
        request.start_date = date(2023, 1, 1);
        request.end_date = date(2023, 12, 31);

        let result = validate_universe(&port, &universe, &request);
        assert!(matches!(result, Err(AnalyticsError::NoData { .. })));
    }

    #[test]
    fn union_alignment_spans_all_dates() {
        let port = two_asset_port()
            .with_prices("LATE", daily_points(date(2024, 1, 4), &[20.0, 21.0, 22.0, 23.0]));
        let universe = parse_tickers("AAA,LATE").unwrap();
        let mut request = request_2024();
        request.alignment = quantfolio::domain::return_matrix::Alignment::Union;

        let analysis = analyze_portfolio(&port, &universe, &WeightSpec::Equal, &request).unwrap();
        assert_eq!(analysis.returns.len(), 5);
        assert_eq!(analysis.returns.base_date(), date(2024, 1, 2));
    }
}

mod asset_pipeline {
    use super::*;

    #[test]
    fn buy_and_hold_matches_price_path() {
        let port = two_asset_port();
        let analysis = analyze_asset(&port, "AAA", Strategy::BuyAndHold, &request_2024()).unwrap();

        assert_eq!(analysis.first_date, date(2024, 1, 2));
        assert_eq!(analysis.last_date, date(2024, 1, 6));
        assert_eq!(analysis.data_points, 5);
        assert_relative_eq!(analysis.price.total_return, 0.06, epsilon = 1e-12);
        assert_relative_eq!(analysis.strategy_summary.final_value, 1.06, epsilon = 1e-12);
        assert_relative_eq!(
            analysis.strategy_summary.total_return,
            analysis.price.total_return,
            epsilon = 1e-12
        );
        assert_eq!(analysis.strategy_name, "Buy & Hold");
    }

    #[test]
    fn momentum_starts_in_cash() {
        let port = two_asset_port();
        let strategy = Strategy::Momentum { period: 3 };
        let analysis = analyze_asset(&port, "AAA", strategy, &request_2024()).unwrap();

        let values = analysis.strategy_values.values();
        assert_eq!(values[0], 1.0);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[2], 1.0);
        assert_eq!(analysis.strategy_name, "Momentum_3");
    }

    #[test]
    fn unknown_ticker_is_no_data() {
        let port = two_asset_port();
        let result = analyze_asset(&port, "ZZZ", Strategy::BuyAndHold, &request_2024());
        assert!(matches!(result, Err(AnalyticsError::NoData { ticker }) if ticker == "ZZZ"));
    }

    #[test]
    fn two_prices_are_insufficient() {
        let port = MockPriceDataPort::new().with_prices("TINY", daily_points(date(2024, 3, 1), &[1.0, 2.0]));
        let result = analyze_asset(&port, "TINY", Strategy::BuyAndHold, &request_2024());
        assert!(matches!(result, Err(AnalyticsError::InsufficientData { .. })));
    }
}

mod daily_report {
    use super::*;

    #[test]
    fn per_asset_failures_do_not_abort() {
        let port = two_asset_port().with_error("BROKEN", "timeout");
        let assets = parse_tickers("AAA,BROKEN,BBB").unwrap();
        let portfolio = parse_tickers("AAA,BBB").unwrap();
        let now = date(2024, 12, 31).and_hms_opt(18, 0, 0).unwrap();

        let report = generate_daily_report(&port, &assets, &portfolio, &request_2024(), now);

        assert_eq!(report.report_date, now);
        assert_eq!(report.report_type, "daily");
        let tickers: Vec<&str> = report.assets.iter().map(AssetReport::ticker).collect();
        assert_eq!(tickers, ["AAA", "BROKEN", "BBB"]);
        assert!(report.assets[0].is_success());
        assert!(!report.assets[1].is_success());
        assert!(report.assets[2].is_success());
        assert!(report.portfolio.is_success());
    }

    #[test]
    fn asset_snapshot_fields() {
        let port = two_asset_port();
        let assets = parse_tickers("AAA").unwrap();
        let now = date(2024, 12, 31).and_hms_opt(18, 0, 0).unwrap();

        let report = generate_daily_report(&port, &assets, &assets, &request_2024(), now);

        let AssetReport::Success(s) = &report.assets[0] else {
            panic!("expected success");
        };
        assert_eq!(s.timestamp, date(2024, 1, 6));
        assert_eq!(s.open_price, 100.0);
        assert_eq!(s.close_price, 106.0);
        assert_eq!(s.latest_price, 106.0);
        assert_relative_eq!(s.daily_return, 106.0 / 104.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.total_return, 0.06, epsilon = 1e-12);
        assert!(s.max_drawdown < 0.0);
        assert_eq!(s.data_points, 5);
    }

    #[test]
    fn two_price_asset_is_reported_as_error() {
        let port = two_asset_port()
            .with_prices("TINY", daily_points(date(2024, 3, 1), &[10.0, 11.0]));
        let assets = parse_tickers("TINY").unwrap();
        let portfolio = parse_tickers("AAA").unwrap();
        let now = date(2024, 12, 31).and_hms_opt(18, 0, 0).unwrap();

        let report = generate_daily_report(&port, &assets, &portfolio, &request_2024(), now);

        let AssetReport::Error { ticker, error } = &report.assets[0] else {
            panic!("expected error");
        };
        assert_eq!(ticker, "TINY");
        assert!(error.starts_with("insufficient data"), "{error}");
    }

    #[test]
    fn portfolio_failure_is_captured() {
        let port = two_asset_port();
        let assets = parse_tickers("AAA").unwrap();
        let portfolio = parse_tickers("NOPE").unwrap();
        let now = date(2024, 12, 31).and_hms_opt(18, 0, 0).unwrap();

        let report = generate_daily_report(&port, &assets, &portfolio, &request_2024(), now);

        assert!(matches!(report.portfolio, PortfolioReport::Error { .. }));
        assert!(report.assets[0].is_success());
    }

    #[test]
    fn request_is_echoed() {
        let port = two_asset_port();
        let assets = parse_tickers("AAA").unwrap();
        let mut request = request_2024();
        request.interval = Interval::Daily;
        request.initial_value = 1000.0;
        let now = date(2024, 12, 31).and_hms_opt(18, 0, 0).unwrap();

        let report = generate_daily_report(&port, &assets, &assets, &request, now);
        assert_eq!(report.request, request);

        let PortfolioReport::Success(p) = &report.portfolio else {
            panic!("expected success");
        };
        assert_eq!(p.initial_value, 1000.0);
        assert_eq!(p.tickers, ["AAA"]);
    }
}
