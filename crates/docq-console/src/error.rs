use std::path::PathBuf;

use docq_core::error::{CoercionError, FilterError, OrderByError, PathError, StoreError};
use thiserror::Error;

/// Errors surfaced by the console. Printed to stderr as `Error: {err}`.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Core(#[from] docq_core::Error),

    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no store file configured and no local data directory is available")]
    NoStorePath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    MissingInput(&'static str),

    #[error("invalid JSON format, expected an object but got {0}")]
    NotAnObject(&'static str),

    #[error("input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

macro_rules! from_core_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for ConsoleError {
                fn from(err: $source) -> Self {
                    ConsoleError::Core(err.into())
                }
            }
        )+
    };
}

from_core_error!(PathError, FilterError, OrderByError, CoercionError, StoreError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_display_unwrapped() {
        let err: ConsoleError = FilterError::UnknownOperator {
            operator: "~=".to_string(),
            field: "a".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown field operator '~=' for field 'a'");

        let err: ConsoleError = StoreError::EmptyUpdate("users/alice".to_string()).into();
        assert_eq!(err.to_string(), "no fields to update for users/alice");
    }

    #[test]
    fn test_missing_input_message() {
        let err = ConsoleError::MissingInput("one or more fields in JSON format are required");
        assert_eq!(err.to_string(), "one or more fields in JSON format are required");
    }
}
