//! Domain error types.

/// Top-level error type for quantfolio.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("asset universe is empty")]
    EmptyUniverse,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),

    #[error("asset {0} is not part of the universe")]
    UnknownAsset(String),

    #[error("sum of weights is zero{}, cannot normalize", clip_suffix(.clipped))]
    ZeroWeightSum { clipped: bool },

    #[error("invalid weight for {asset}: {value}")]
    InvalidWeight { asset: String, value: f64 },

    #[error("invalid weight bounds: min {min} is greater than max {max}")]
    InvalidWeightBounds { min: f64, max: f64 },

    #[error("insufficient data: have {observations} observations, need {minimum}")]
    InsufficientData { observations: usize, minimum: usize },

    #[error("invalid series: {reason}")]
    InvalidSeries { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn clip_suffix(clipped: &bool) -> &'static str {
    if *clipped { " after clipping" } else { "" }
}

impl AnalyticsError {
    pub(crate) fn insufficient(observations: usize, minimum: usize) -> Self {
        AnalyticsError::InsufficientData {
            observations,
            minimum,
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&AnalyticsError> for std::process::ExitCode {
    fn from(err: &AnalyticsError) -> Self {
        let code: u8 = match err {
            AnalyticsError::Io(_) | AnalyticsError::Report { .. } => 1,
            AnalyticsError::ConfigParse { .. }
            | AnalyticsError::ConfigMissing { .. }
            | AnalyticsError::ConfigInvalid { .. } => 2,
            AnalyticsError::DataSource { .. } => 3,
            AnalyticsError::DimensionMismatch { .. }
            | AnalyticsError::EmptyUniverse
            | AnalyticsError::DuplicateAsset(_)
            | AnalyticsError::UnknownAsset(_)
            | AnalyticsError::ZeroWeightSum { .. }
            | AnalyticsError::InvalidWeight { .. }
            | AnalyticsError::InvalidWeightBounds { .. }
            | AnalyticsError::InvalidSeries { .. }
            | AnalyticsError::InvalidParameter { .. } => 4,
            AnalyticsError::NoData { .. } | AnalyticsError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
