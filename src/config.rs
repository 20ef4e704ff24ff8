//! Configuration management for ispcheck.
//!
//! Settings are read once at startup from the process environment, falling
//! back to an optional `.env` file in the working directory, then overridden
//! by command-line flags, then validated. The resulting [`Config`] is handed by
//! reference to the lookup client and the extractor; nothing reads the
//! environment after that.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

/// Dotenv file consulted for settings missing from the process environment.
pub const ENV_FILE: &str = ".env";

/// Base URL of the ISP lookup service; the address is appended verbatim.
pub const ENV_API_URL: &str = "ISP_API_URL";
/// Response header carrying the remaining request count.
pub const ENV_ATTEMPTS_HEADER: &str = "ISP_API_ATTEMPTS_HEADER";
/// Response header carrying the seconds until the quota resets.
pub const ENV_TIMEOUT_HEADER: &str = "ISP_API_TIMEOUT_HEADER";
/// Single-character CSV delimiter.
pub const ENV_CSV_DELIMITER: &str = "CSV_DELIMITER";
/// Optional per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "ISP_API_REQUEST_TIMEOUT_SECS";

/// Main configuration structure.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// ISP lookup service settings
    pub lookup: LookupConfig,

    /// Tabular input/output settings
    pub tabular: TabularConfig,
}

/// Lookup service settings.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL; requests go to `{base_url}{address}`
    pub base_url: String,

    /// Header holding the remaining request count
    pub remaining_header: String,

    /// Header holding the retry-after seconds
    pub retry_after_header: String,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// Extra wait added on top of the advertised retry-after
    pub safety_margin: Duration,
}

/// CSV settings
#[derive(Debug, Clone)]
pub struct TabularConfig {
    pub delimiter: char,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            remaining_header: String::new(),
            retry_after_header: String::new(),
            request_timeout: Duration::from_secs(62),
            safety_margin: Duration::from_secs(2),
        }
    }
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl TabularConfig {
    /// Delimiter as the byte the csv reader expects. Only valid after `validate`.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the environment and `./.env`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(ENV_FILE))
    }

    /// Load configuration from the environment and the given dotenv file.
    pub fn load_from(env_file: &Path) -> Result<Self, ConfigError> {
        Self::with_env_file(env_file, |key| std::env::var(key).ok())
    }

    /// Values from `get` win; the dotenv file fills in the rest. A missing
    /// file is not an error, a malformed one is.
    pub fn with_env_file<F>(env_file: &Path, get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_file = read_env_file(env_file)?;
        Ok(Self::from_lookup(|key| {
            get(key).or_else(|| from_file.get(key).cloned())
        }))
    }

    /// Build from an arbitrary key lookup (environment, test fixture, ...).
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = get(ENV_API_URL) {
            config.lookup.base_url = url.trim().to_string();
        }
        if let Some(header) = get(ENV_ATTEMPTS_HEADER) {
            config.lookup.remaining_header = header.trim().to_string();
        }
        if let Some(header) = get(ENV_TIMEOUT_HEADER) {
            config.lookup.retry_after_header = header.trim().to_string();
        }

        if let Some(timeout) = get(ENV_REQUEST_TIMEOUT)
            && let Ok(secs) = timeout.trim().parse::<u64>()
        {
            config.lookup.request_timeout = Duration::from_secs(secs);
        }

        if let Some(delim) = get(ENV_CSV_DELIMITER) {
            let mut chars = delim.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => config.tabular.delimiter = c,
                _ => tracing::warn!(
                    value = %delim,
                    "{ENV_CSV_DELIMITER} must be a single character; using ','"
                ),
            }
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref url) = cli.api_url {
            self.lookup.base_url = url.clone();
        }
        if let Some(delim) = cli.delimiter {
            self.tabular.delimiter = delim;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (ENV_API_URL, &self.lookup.base_url),
            (ENV_ATTEMPTS_HEADER, &self.lookup.remaining_header),
            (ENV_TIMEOUT_HEADER, &self.lookup.retry_after_header),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }

        if self.lookup.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: ENV_REQUEST_TIMEOUT.to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if !self.tabular.delimiter.is_ascii() || self.tabular.delimiter == '"' {
            return Err(ConfigError::InvalidValue {
                field: ENV_CSV_DELIMITER.to_string(),
                value: self.tabular.delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character other than '\"'"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.is_file() {
        debug!(path = %path.display(), "No dotenv file; using the process environment only");
        return Ok(HashMap::new());
    }

    let env_file_err = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let values = dotenvy::from_path_iter(path)
        .map_err(env_file_err)?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_file_err)?;
    debug!(path = %path.display(), count = values.len(), "Read dotenv file");
    Ok(values)
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Dotenv file present but unreadable or malformed
    EnvFile { path: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for '{}': {}", value, field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required configuration field: {}", field)
            }
            ConfigError::EnvFile { path, reason } => {
                write!(f, "Cannot read settings file '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_API_URL, "http://ip-api.com/json/"),
            (ENV_ATTEMPTS_HEADER, "X-Rl"),
            (ENV_TIMEOUT_HEADER, "X-Ttl"),
        ]
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lookup.request_timeout, Duration::from_secs(62));
        assert_eq!(config.lookup.safety_margin, Duration::from_secs(2));
        assert_eq!(config.tabular.delimiter, ',');
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_complete_settings_validate() {
        let mut pairs = complete();
        pairs.push((ENV_CSV_DELIMITER, ";"));
        pairs.push((ENV_REQUEST_TIMEOUT, "30"));
        let config = lookup_from(&pairs);
        assert!(config.validate().is_ok());
        assert_eq!(config.lookup.base_url, "http://ip-api.com/json/");
        assert_eq!(config.lookup.remaining_header, "X-Rl");
        assert_eq!(config.tabular.delimiter_byte(), b';');
        assert_eq!(config.lookup.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_setting_is_reported_by_name() {
        let config = lookup_from(&complete()[..2]);
        match config.validate() {
            Err(ConfigError::MissingRequired { field }) => assert_eq!(field, ENV_TIMEOUT_HEADER),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_multi_char_delimiter_falls_back() {
        let mut pairs = complete();
        pairs.push((ENV_CSV_DELIMITER, "||"));
        let config = lookup_from(&pairs);
        assert_eq!(config.tabular.delimiter, ',');
    }

    #[test]
    fn test_non_ascii_delimiter_is_invalid() {
        let mut config = lookup_from(&complete());
        config.tabular.delimiter = '§';
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_cli_takes_precedence() {
        let mut config = lookup_from(&complete());
        let cli = Cli {
            api_url: Some("http://localhost:9000/".into()),
            delimiter: Some('\t'),
            ..Default::default()
        };
        config.merge_with_cli(&cli);
        assert_eq!(config.lookup.base_url, "http://localhost:9000/");
        assert_eq!(config.tabular.delimiter_byte(), b'\t');
    }

    #[test]
    fn test_env_file_fills_missing_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE);
        fs::write(
            &path,
            "ISP_API_URL=http://ip-api.com/json/\n\
             ISP_API_ATTEMPTS_HEADER=X-Rl\n\
             ISP_API_TIMEOUT_HEADER=X-Ttl\n\
             CSV_DELIMITER=;\n",
        )
        .unwrap();

        let config = Config::with_env_file(&path, |_| None).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookup.base_url, "http://ip-api.com/json/");
        assert_eq!(config.lookup.retry_after_header, "X-Ttl");
        assert_eq!(config.tabular.delimiter_byte(), b';');
    }

    #[test]
    fn test_process_environment_beats_env_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE);
        fs::write(&path, "ISP_API_URL=http://from-file/\nISP_API_ATTEMPTS_HEADER=X-Rl\n").unwrap();

        let config = Config::with_env_file(&path, |key| {
            (key == ENV_API_URL).then(|| "http://from-env/".to_string())
        })
        .unwrap();
        assert_eq!(config.lookup.base_url, "http://from-env/");
        assert_eq!(config.lookup.remaining_header, "X-Rl");
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_env_file(&dir.path().join(ENV_FILE), |_| None).unwrap();
        assert!(config.lookup.base_url.is_empty());
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE);
        fs::write(&path, "ISP_API_URL http://ip-api.com/json/\n").unwrap();
        assert!(matches!(
            Config::with_env_file(&path, |_| None),
            Err(ConfigError::EnvFile { .. })
        ));
    }
}
