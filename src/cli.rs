use clap::{Parser, ValueEnum};

use crate::address::DEFAULT_OCTET_BITS;

/// Output style for text-source runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Numbered "address -> provider" lines
    #[default]
    Text,
    /// JSON array of {address, provider}
    Json,
}

/// Command-line interface definition.
///
/// Any of `--network`, `--mask` or `--source` left out is asked for
/// interactively on stdin.
///
/// Verbosity levels:
/// 0 - warnings and errors only
/// 1 - progress (default)
/// 2 - debug
/// 3 - trace
#[derive(Parser, Debug, Clone, Default)]
#[command(
    author,
    version,
    about = "Find which IPv4 addresses belong to a network and resolve their ISP names"
)]
pub struct Cli {
    /// Network address (e.g. 10.0.0.0)
    #[arg(short, long)]
    pub network: Option<String>,

    /// Network mask (e.g. 255.255.255.0)
    #[arg(short, long)]
    pub mask: Option<String>,

    /// Octet width in bits for network, mask and candidates
    #[arg(long, default_value_t = DEFAULT_OCTET_BITS)]
    pub bits: u32,

    /// Free text containing IPv4 addresses, or the path to a .csv file with an "ip" column
    #[arg(short, long)]
    pub source: Option<String>,

    /// ISP lookup base URL (overrides ISP_API_URL)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// CSV delimiter (overrides CSV_DELIMITER)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Output format for text-source runs
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value_t = 1)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Default tracing filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
