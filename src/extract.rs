//! Candidate address extraction.
//!
//! The input source is a single string that is either free text containing
//! addresses or the path of a CSV file. The two are told apart by one rule:
//! if the string contains anything that looks like a dotted-quad address it is
//! text, otherwise it is a file path. A path such as `backup-10.0.0.1/list.csv`
//! is therefore read as text.
//!
//! Text mode scans with [`IPV4_PATTERN`]; file mode reads one column whose
//! header is `ip` in any letter case. Values that fail [`Address`] validation
//! are dropped in both modes and never abort extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::address::Address;
use crate::errors::{IspCheckError, Result};

/// Dotted quad with every octet in 0-255.
///
/// Boundaries are checked separately in [`find_addresses`]: a match must not
/// touch a word character or a dot on either side.
pub const IPV4_PATTERN: &str =
    r"(?:25[0-5]|2[0-4]\d|1?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|1?\d?\d)){3}";

static IPV4_RE: Lazy<Regex> = Lazy::new(|| Regex::new(IPV4_PATTERN).unwrap());

/// File extension that selects CSV parsing.
pub const TABULAR_EXTENSION: &str = "csv";

/// Column name looked up case-insensitively.
pub const IP_COLUMN: &str = "ip";

/// Where candidate addresses come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Text(String),
    File(PathBuf),
}

impl InputSource {
    /// Classify a raw source string.
    pub fn detect(raw: &str) -> Self {
        if contains_address(raw) {
            InputSource::Text(raw.to_string())
        } else {
            InputSource::File(PathBuf::from(raw))
        }
    }
}

/// Header, rows and `ip` column position of a CSV source.
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub headers: csv::StringRecord,
    pub ip_column: usize,
    pub rows: Vec<csv::StringRecord>,
}

impl Table {
    /// Value of the `ip` field of a row, if the row is long enough to have one.
    pub fn ip_of<'r>(&self, row: &'r csv::StringRecord) -> Option<&'r str> {
        row.get(self.ip_column)
    }

    pub fn ip_column_name(&self) -> &str {
        self.headers.get(self.ip_column).unwrap_or(IP_COLUMN)
    }
}

/// Outcome of file-mode extraction.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub addresses: Vec<Address>,
    pub table: Table,
}

/// True if `text` holds at least one dotted-quad match.
pub fn contains_address(text: &str) -> bool {
    find_addresses(text).next().is_some()
}

/// All dotted-quad substrings of `text` that stand alone.
pub fn find_addresses(text: &str) -> impl Iterator<Item = &str> {
    IPV4_RE
        .find_iter(text)
        .filter(move |m| stands_alone(text, m.start(), m.end()))
        .map(|m| m.as_str())
}

/// Pull addresses out of free text, dropping those that fail validation
/// at the given octet width.
pub fn extract_from_text(text: &str, bits: u32) -> Vec<Address> {
    let addresses: Vec<Address> = find_addresses(text)
        .filter_map(|candidate| parse_candidate(candidate, bits))
        .collect();
    info!(
        count = addresses.len(),
        "Extracted IPv4 addresses from list; detected {} valid addresses",
        addresses.len()
    );
    addresses
}

/// Read the `ip` column of a CSV file.
///
/// Errors are structural and fatal: wrong extension, no header row, no `ip`
/// column, or a file that cannot be opened or parsed. A file whose rows hold
/// no valid address is not an error.
pub fn extract_from_file(path: &Path, delimiter: u8, bits: u32) -> Result<FileExtraction> {
    let shown = path.display().to_string();

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == TABULAR_EXTENSION);
    if !is_csv {
        return Err(IspCheckError::unsupported_format(shown));
    }

    let file = File::open(path).map_err(|e| IspCheckError::unreadable(&shown, e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| IspCheckError::unreadable(&shown, e.to_string()))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(IspCheckError::missing_header(shown));
    }

    let ip_column = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(IP_COLUMN))
        .ok_or_else(|| IspCheckError::missing_ip_column(&shown))?;

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()
        .map_err(|e| IspCheckError::unreadable(&shown, e.to_string()))?;

    let table = Table {
        path: path.to_path_buf(),
        headers,
        ip_column,
        rows,
    };

    let addresses: Vec<Address> = table
        .rows
        .iter()
        .filter_map(|row| table.ip_of(row))
        .filter_map(|candidate| parse_candidate(candidate, bits))
        .collect();

    info!(
        count = addresses.len(),
        rows = table.rows.len(),
        "Extracted IPv4 addresses from CSV file; detected {} valid addresses",
        addresses.len()
    );

    Ok(FileExtraction { addresses, table })
}

fn parse_candidate(candidate: &str, bits: u32) -> Option<Address> {
    match Address::parse_with(candidate, bits, false) {
        Ok(address) => Some(address),
        Err(e) => {
            debug!("Discarding candidate: {e}");
            None
        }
    }
}

/// Neither neighbour of `text[start..end]` may be a word character or a dot.
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let blocks = |c: char| c == '.' || c == '_' || c.is_alphanumeric();
    let before_ok = text[..start].chars().next_back().is_none_or(|c| !blocks(c));
    let after_ok = text[end..].chars().next().is_none_or(|c| !blocks(c));
    before_ok && after_ok
}
