//! Core domain types and analytics.

pub mod series;
pub mod metrics;
pub mod request;
pub mod universe;
pub mod return_matrix;
pub mod weights;
pub mod portfolio;
pub mod stats;
pub mod correlation;
pub mod backtest;
pub mod strategy;
pub mod analysis;
pub mod report;
pub mod config_validation;
pub mod error;
