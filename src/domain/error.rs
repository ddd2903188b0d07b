//! Domain error types.

use std::fmt;

/// A parse error with position information for condition-list parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    DataAcquisition,
    Configuration,
    Simulation { strategy: String },
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::DataAcquisition => write!(f, "data acquisition"),
            Stage::Configuration => write!(f, "configuration"),
            Stage::Simulation { strategy } => write!(f, "simulation of '{}'", strategy),
            Stage::Export => write!(f, "export"),
        }
    }
}

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("no price data available for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("invalid strategy '{name}': {reason}")]
    InvalidStrategy { name: String, reason: String },

    #[error("strategy '{name}' failed: {source}")]
    Strategy {
        name: String,
        #[source]
        source: Box<TradesimError>,
    },

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

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    /// Wrap this error as a failure of the named strategy's run.
    pub fn in_strategy(self, name: &str) -> Self {
        match self {
            already @ TradesimError::Strategy { .. } => already,
            other => TradesimError::Strategy {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            TradesimError::DataUnavailable { .. } | TradesimError::DataSource { .. } => {
                Stage::DataAcquisition
            }
            TradesimError::Strategy { name, .. }
            | TradesimError::UnknownStrategy { name }
            | TradesimError::InvalidStrategy { name, .. } => Stage::Simulation {
                strategy: name.clone(),
            },
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. }
            | TradesimError::RuleParse(_) => Stage::Configuration,
            TradesimError::Export { .. } | TradesimError::Io(_) => Stage::Export,
        }
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::UnknownStrategy { .. }
            | TradesimError::InvalidStrategy { .. }
            | TradesimError::Strategy { .. } => 3,
            TradesimError::RuleParse(_) => 4,
            TradesimError::DataUnavailable { .. } | TradesimError::DataSource { .. } => 5,
            TradesimError::Export { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
