//! CLI error types.

use ratetree_config::ConfigError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument outside its admissible range.
    #[error("Invalid {name}: {value}. {reason}")]
    InvalidArgument {
        /// Flag name.
        name: &'static str,
        /// Value given.
        value: f64,
        /// What the flag accepts.
        reason: &'static str,
    },

    /// Failure while processing one currency of the market file.
    #[error("{currency}: {source}")]
    Currency {
        /// Currency id.
        currency: String,
        /// Underlying failure.
        #[source]
        source: ConfigError,
    },

    /// CSV output error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CliError {
    /// Tags `source` with the currency it was raised for.
    pub fn currency(currency: impl Into<String>, source: impl Into<ConfigError>) -> Self {
        Self::Currency {
            currency: currency.into(),
            source: source.into(),
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
