use thiserror::Error;

/// Process-level error: carries the exit code `main` terminates with.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let exit_code = match err {
            IngestError::ShutdownFailure(_) => 1,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

/// Failures that can end an ingestion cycle (or, for `ShutdownFailure`, the process).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The fetch could not complete or the endpoint answered with a non-success status.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The response is missing the mandatory timestamp or is otherwise unusable.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The timestamp string does not match `yyyy-MM-dd HH:mm`.
    #[error("malformed timestamp '{0}'")]
    MalformedTimestamp(String),

    /// Flushing buffered points to the store failed.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// Closing the writer during termination failed.
    #[error("shutdown failure: {0}")]
    ShutdownFailure(String),
}

/// A recoverable data-quality issue: part of the payload was skipped, the cycle goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataWarning {
    /// An optional list field was present but not an array.
    ListNotArray { field: &'static str, found: &'static str },
    /// One element of an optional list could not be read as an entry.
    InvalidEntry { field: &'static str, index: usize, reason: String },
    /// A numeric value does not fit a 64-bit integer field and was left out.
    OutOfRange { field: String, value: String },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataWarning::ListNotArray { field, found } => {
                write!(f, "partial data omission: '{field}' is {found}, expected an array")
            }
            DataWarning::InvalidEntry { field, index, reason } => {
                write!(f, "partial data omission: '{field}[{index}]' skipped: {reason}")
            }
            DataWarning::OutOfRange { field, value } => {
                write!(f, "partial data omission: '{field}' value {value} is outside the integer range")
            }
        }
    }
}
