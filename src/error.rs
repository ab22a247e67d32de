use goose::GooseError;
use std::{error::Error, fmt};

/// An enumeration of all errors that can prevent the load test from starting.
#[derive(Debug)]
pub enum LoadTestError {
    /// Wraps a [`GooseError`](https://docs.rs/goose/*/goose/enum.GooseError.html).
    Goose(GooseError),
    /// A required credential was not provided.
    MissingCredential {
        /// The environment variable that must be set.
        variable: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// Invalid option or value specified.
    InvalidOption {
        /// The environment variable holding the invalid value.
        option: String,
        /// The invalid value.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
}

impl LoadTestError {
    fn describe(&self) -> &str {
        match *self {
            LoadTestError::Goose(_) => "goose::GooseError",
            LoadTestError::MissingCredential { .. } => "missing credential",
            LoadTestError::InvalidOption { .. } => "invalid option or value specified",
        }
    }
}

impl fmt::Display for LoadTestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LoadTestError::Goose(ref source) => {
                write!(f, "LoadTestError: {} ({})", self.describe(), source)
            }
            LoadTestError::MissingCredential {
                ref variable,
                ref detail,
            } => write!(
                f,
                "LoadTestError: {}: {} ({})",
                self.describe(),
                variable,
                detail
            ),
            LoadTestError::InvalidOption {
                ref option,
                ref value,
                ref detail,
            } => write!(
                f,
                "LoadTestError: {}: {}={} ({})",
                self.describe(),
                option,
                value,
                detail
            ),
        }
    }
}

impl Error for LoadTestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            LoadTestError::Goose(ref source) => Some(source),
            _ => None,
        }
    }
}

impl From<GooseError> for LoadTestError {
    fn from(err: GooseError) -> LoadTestError {
        LoadTestError::Goose(err)
    }
}
