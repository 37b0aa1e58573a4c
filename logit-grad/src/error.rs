use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, LogRegErr>;

/// Everything that can go wrong between generating the samples and writing the charts.
#[derive(Debug)]
pub enum LogRegErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyDataset,
    InvalidRange {
        class: &'static str,
        low: f32,
        high: f32,
    },
    InvalidConfig(String),
    Io(io::Error),
    Config(serde_json::Error),
    Plot(String),
}

impl Display for LogRegErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogRegErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => format!(
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            LogRegErr::EmptyDataset => "There are no samples to train on".to_string(),
            LogRegErr::InvalidRange { class, low, high } => {
                format!("Invalid feature range for the {class} class: [{low}, {high})")
            }
            LogRegErr::InvalidConfig(reason) => format!("Invalid training config: {reason}"),
            LogRegErr::Io(e) => format!("I/O error: {e}"),
            LogRegErr::Config(e) => format!("Failed to parse training config: {e}"),
            LogRegErr::Plot(e) => format!("Failed to draw chart: {e}"),
        };

        write!(f, "{s}")
    }
}

impl Error for LogRegErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LogRegErr::Io(e) => Some(e),
            LogRegErr::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LogRegErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LogRegErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}

/// Flattens a plotters backend error, which is generic over the drawing backend.
pub(crate) fn plot_err<E: Display>(e: E) -> LogRegErr {
    LogRegErr::Plot(e.to_string())
}
