//! Unified error handling.
//!
//! Every structural failure of a run is a variant of [`IspCheckError`]:
//!   * Address validation (network, mask, or a caller-supplied candidate)
//!   * Tabular input problems (wrong extension, no header, no `ip` column,
//!     unreadable file)
//!   * Missing or invalid process configuration
//!
//! Lookup failures are deliberately *not* represented here. A failed ISP
//! lookup is a result value (see `lookup::LookupFailure`) so one bad address
//! never aborts the batch.
//!
//! Categories are coarse so the CLI can pick one user-facing message:
//!   - Input: bad network/mask text or bad tabular input
//!   - Config: required settings absent or malformed
//!   - Network: HTTP client could not be built
//!   - Internal: I/O and unexpected states

use std::io;

use thiserror::Error;

use crate::address::ValidationError;
use crate::config::ConfigError;

/// High-level classification for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Config,
    Network,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Config => "config",
            ErrorCategory::Network => "network",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary application error type.
#[derive(Error, Debug)]
pub enum IspCheckError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Invalid address: {0}")]
    Validation(#[from] ValidationError),

    #[error("Octet width mismatch: expected {expected} bits, got {found} bits")]
    BitWidthMismatch { expected: u32, found: u32 },

    #[error("Unsupported input format (expected a .csv file): {path}")]
    UnsupportedFormat { path: String },

    #[error("CSV file has no header row: {path}")]
    MissingHeader { path: String },

    #[error("CSV file has no 'ip' column: {path}")]
    MissingIpColumn { path: String },

    #[error("CSV file is empty or unreadable: {path}: {reason}")]
    EmptyOrUnreadable { path: String, reason: String },

    #[error("Refusing to overwrite the input file with results: {path}")]
    OutputOverwritesInput { path: String },

    // ---------------------------- Configuration -----------------------------
    #[error("Missing required setting: {field}")]
    ConfigurationMissing { field: String },

    #[error("{message}")]
    Configuration { message: String },

    // ----------------------------- Network ----------------------------------
    #[error("Failed to build HTTP client: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IspCheckError {
    /// Categorize the error for user-facing reporting.
    pub fn category(&self) -> ErrorCategory {
        use IspCheckError::*;
        match self {
            Validation(_)
            | BitWidthMismatch { .. }
            | UnsupportedFormat { .. }
            | MissingHeader { .. }
            | MissingIpColumn { .. }
            | EmptyOrUnreadable { .. }
            | OutputOverwritesInput { .. } => ErrorCategory::Input,

            ConfigurationMissing { .. } | Configuration { .. } => ErrorCategory::Config,

            HttpClient { .. } => ErrorCategory::Network,

            Io { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// True for the structural tabular-input failures of file mode.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            IspCheckError::UnsupportedFormat { .. }
                | IspCheckError::MissingHeader { .. }
                | IspCheckError::MissingIpColumn { .. }
                | IspCheckError::EmptyOrUnreadable { .. }
        )
    }

    // ---------------------------- Constructors -----------------------------

    pub fn unsupported_format(path: impl Into<String>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    pub fn missing_header(path: impl Into<String>) -> Self {
        Self::MissingHeader { path: path.into() }
    }

    pub fn missing_ip_column(path: impl Into<String>) -> Self {
        Self::MissingIpColumn { path: path.into() }
    }

    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EmptyOrUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, IspCheckError>;

impl From<ConfigError> for IspCheckError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::MissingRequired { field } => IspCheckError::ConfigurationMissing { field },
            other => IspCheckError::Configuration {
                message: other.to_string(),
            },
        }
    }
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| IspCheckError::io(path.into(), operation.into(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    #[test]
    fn category_mapping() {
        assert_eq!(
            IspCheckError::missing_ip_column("x.csv").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            IspCheckError::ConfigurationMissing {
                field: "ISP_API_URL".into()
            }
            .category(),
            ErrorCategory::Config
        );
        assert_eq!(
            IspCheckError::internal("boom").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn validation_converts_into_input_error() {
        let err: IspCheckError = Address::parse("1.2.3").unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(!err.is_source_error());
        assert!(err.to_string().contains("1.2.3"));
    }

    #[test]
    fn missing_config_maps_to_configuration_missing() {
        let err: IspCheckError = ConfigError::MissingRequired {
            field: "ISP_API_URL".into(),
        }
        .into();
        match err {
            IspCheckError::ConfigurationMissing { field } => assert_eq!(field, "ISP_API_URL"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn io_context() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let mapped = res.with_path("/tmp/list.csv", "read");
        match mapped.err().unwrap() {
            IspCheckError::Io {
                path, operation, ..
            } => {
                assert_eq!(path, "/tmp/list.csv");
                assert_eq!(operation, "read");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
