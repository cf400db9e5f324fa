//! Error types shared by the fetch, parse and narrative stages.

use chrono::NaiveDate;

/// Malformed tabular input.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

/// Failure to retrieve a remote table.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Reasons a county narrative could not be produced.
#[derive(thiserror::Error, Debug)]
pub enum NarrativeError {
    #[error("no records for {0} County")]
    NoData(String),

    #[error("{county} County has only one day of data ({date})")]
    InsufficientHistory { county: String, date: NaiveDate },

    #[error("failed to persist report state: {0}")]
    State(String),
}

/// Configuration file problems.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
