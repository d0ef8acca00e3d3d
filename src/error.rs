use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
    /// A k-means cluster ended an iteration with no assigned samples.
    EmptyCluster {
        cluster: usize,
    },
    /// The configured k-means iteration cap was hit before assignments settled.
    NotConverged {
        iterations: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::EmptyCluster { cluster } => {
                write!(f, "empty cluster: rbf center {cluster} has no assigned samples")
            }
            Error::NotConverged { iterations } => {
                write!(f, "k-means did not converge within {iterations} iterations")
            }
        }
    }
}

impl std::error::Error for Error {}
