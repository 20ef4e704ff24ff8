//! Result presentation.
//!
//! Text-source runs print one numbered line per matched address (or a JSON
//! array). File-source runs write `result.csv` next to the input: every
//! original column plus `provider`, keeping only rows whose address matched.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::{IoResultExt, IspCheckError, Result};
use crate::extract::Table;
use crate::results::MatchSet;

/// File name of the exported table.
pub const RESULT_FILE_NAME: &str = "result.csv";

/// Name of the appended column.
pub const PROVIDER_COLUMN: &str = "provider";

/// Shown for an entry that was never resolved.
const PENDING: &str = "<pending>";

/// Write `index. address -> provider` lines, numbered from 1.
pub fn write_text<W: Write>(matches: &MatchSet, out: &mut W) -> io::Result<()> {
    for (i, entry) in matches.iter().enumerate() {
        writeln!(
            out,
            "{}. {} -> {}",
            i + 1,
            entry.address,
            entry.provider.as_deref().unwrap_or(PENDING)
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    address: &'a str,
    provider: Option<&'a str>,
}

/// Write the matches as a pretty-printed JSON array.
pub fn write_json<W: Write>(matches: &MatchSet, out: &mut W) -> Result<()> {
    let entries: Vec<JsonEntry<'_>> = matches
        .iter()
        .map(|e| JsonEntry {
            address: &e.address,
            provider: e.provider.as_deref(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &entries)
        .map_err(|e| IspCheckError::internal(format!("JSON serialization failed: {e}")))?;
    writeln!(out).with_path("<stdout>", "write")?;
    Ok(())
}

/// Sibling `result.csv` of the input file.
pub fn result_path(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(RESULT_FILE_NAME),
        None => PathBuf::from(RESULT_FILE_NAME),
    }
}

/// Export target for `input`, refused when it would overwrite the input.
pub fn export_target(input: &Path) -> Result<PathBuf> {
    if input.file_name().is_some_and(|name| name == RESULT_FILE_NAME) {
        return Err(IspCheckError::OutputOverwritesInput {
            path: input.display().to_string(),
        });
    }
    Ok(result_path(input))
}

/// Write the matched rows of `table`, each with its provider appended, to
/// `result.csv` beside the input. Returns the written path.
///
/// Rows are padded or truncated to the header width so `provider` always
/// lands in its own column.
pub fn export_csv(table: &Table, matches: &MatchSet, delimiter: u8) -> Result<PathBuf> {
    let path = export_target(&table.path)?;
    let shown = path.display().to_string();
    let csv_err = |e: csv::Error| IspCheckError::internal(format!("writing {shown}: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(&path)
        .map_err(csv_err)?;

    let width = table.headers.len();
    let mut header: Vec<&str> = table.headers.iter().collect();
    header.push(PROVIDER_COLUMN);
    writer.write_record(&header).map_err(csv_err)?;

    let mut written = 0usize;
    for row in &table.rows {
        let Some(ip) = table.ip_of(row) else {
            continue;
        };
        let Some(provider) = matches.provider(ip) else {
            continue;
        };
        let mut record: Vec<&str> = (0..width).map(|i| row.get(i).unwrap_or("")).collect();
        record.push(provider);
        writer.write_record(&record).map_err(csv_err)?;
        written += 1;
    }

    writer.flush().with_path(&shown, "flush")?;
    tracing::info!(rows = written, path = %shown, "Exported results");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::extract::extract_from_file;
    use std::fs;
    use tempfile::TempDir;

    fn resolved(pairs: &[(&str, &str)]) -> MatchSet {
        let mut set = MatchSet::new();
        for (a, p) in pairs {
            set.insert(&Address::parse(a).unwrap());
            set.resolve(a, *p);
        }
        set
    }

    #[test]
    fn text_lines_are_numbered_from_one() {
        let set = resolved(&[("10.0.0.1", "Alpha Net"), ("10.0.0.9", "Beta Net")]);
        let mut buf = Vec::new();
        write_text(&set, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "1. 10.0.0.1 -> Alpha Net\n2. 10.0.0.9 -> Beta Net\n"
        );
    }

    #[test]
    fn json_lists_address_and_provider() {
        let set = resolved(&[("10.0.0.1", "Alpha Net")]);
        let mut buf = Vec::new();
        write_json(&set, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["address"], "10.0.0.1");
        assert_eq!(value[0]["provider"], "Alpha Net");
    }

    #[test]
    fn result_file_sits_next_to_input() {
        assert_eq!(
            result_path(Path::new("/data/in/list.csv")),
            PathBuf::from("/data/in/result.csv")
        );
        assert_eq!(result_path(Path::new("list.csv")), PathBuf::from("result.csv"));
    }

    #[test]
    fn input_named_like_the_result_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join(RESULT_FILE_NAME);
        let original = "ip\n10.0.0.1\n";
        fs::write(&input, original).unwrap();
        let extraction = extract_from_file(&input, b',', 8).unwrap();
        let set = resolved(&[("10.0.0.1", "Alpha Net")]);

        let err = export_csv(&extraction.table, &set, b',').unwrap_err();
        assert!(matches!(err, IspCheckError::OutputOverwritesInput { .. }));
        assert_eq!(fs::read_to_string(&input).unwrap(), original);
        assert!(export_target(Path::new("/data/list.csv")).is_ok());
    }

    #[test]
    fn export_keeps_only_matched_rows_with_provider() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("hosts.csv");
        fs::write(
            &input,
            "host;IP;owner\na;10.0.0.1;x\nb;192.168.1.1;y\nc;10.0.0.9\nd;10.0.0.1;z;extra\n",
        )
        .unwrap();
        let extraction = extract_from_file(&input, b';', 8).unwrap();
        let set = resolved(&[("10.0.0.1", "Alpha Net"), ("10.0.0.9", "Beta Net")]);

        let written = export_csv(&extraction.table, &set, b';').unwrap();
        assert_eq!(written, dir.path().join("result.csv"));
        assert_eq!(
            fs::read_to_string(written).unwrap(),
            "host;IP;owner;provider\n\
             a;10.0.0.1;x;Alpha Net\n\
             c;10.0.0.9;;Beta Net\n\
             d;10.0.0.1;z;Alpha Net\n"
        );
    }
}
