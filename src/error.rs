/// Error type
#[derive(Debug)]
pub enum Error {
    /// An IO error.
    Io(std::io::Error),

    /// Error while reading or writing a delimited table.
    Csv(csv::Error),

    /// A batch manifest could not be parsed.
    Config(String),

    /// A requested time or value column is not in the table header.
    ColumnNotFound {
        /// Name of the missing column
        column: String,
    },

    /// A required field (the timestamp) could not be parsed.
    MalformedInput {
        /// 1-based data row (the header is not counted)
        row: usize,

        /// Column the field belongs to
        column: String,

        /// Raw cell content
        value: String,
    },

    /// The table has a header but no data rows.
    EmptySeries,

    /// Window duration is non-positive or not a valid duration token.
    InvalidWindow(String),

    /// Reducer name is not one of the supported reducers.
    UnknownReducer(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => {
                write!(f, "{e}")
            }
            Self::Csv(e) => {
                write!(f, "{e}")
            }
            Self::Config(msg) => {
                write!(f, "invalid manifest: {msg}")
            }
            Self::ColumnNotFound { column } => {
                write!(f, "column {column:?} not found in header")
            }
            Self::MalformedInput { row, column, value } => {
                write!(f, "row {row}: cannot parse {value:?} in column {column:?}")
            }
            Self::EmptySeries => {
                write!(f, "table contains no data rows")
            }
            Self::InvalidWindow(msg) => {
                write!(f, "invalid window duration: {msg}")
            }
            Self::UnknownReducer(name) => {
                write!(f, "unknown reducer {name:?}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            _ => None,
        }
    }
}

/// Result helper type
pub type Result<T> = std::result::Result<T, Error>;
