//! High-level application orchestration.
//!
//! [`Pipeline`] runs one linear pass:
//!   1. Extract candidates (text scan or CSV column)
//!   2. Keep those inside the network, deduplicated by text
//!   3. Resolve each kept address's ISP, one request at a time
//!   4. Emit: console lines/JSON for text, `result.csv` for files
//!
//! Any structural failure in step 1 aborts the run before anything is
//! emitted. Lookup failures never abort; they become the provider text.
//!
//! [`App`] is the CLI-facing wrapper: it loads configuration, prompts for
//! missing inputs, validates network and mask, and turns fatal errors into a
//! single human-readable line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::info;

use crate::address::Address;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::errors::{ErrorCategory, IoResultExt, IspCheckError, Result};
use crate::extract::{self, InputSource, Table};
use crate::lookup::{IspResolver, LookupClient};
use crate::output;
use crate::results::MatchSet;
use crate::subnet::NetworkSpec;

/// What a finished run produced.
#[derive(Debug)]
pub enum RunReport {
    /// Text source: results are ready to print.
    Listed { matches: MatchSet },
    /// File source: results were written to `path`.
    Exported { matches: MatchSet, path: PathBuf },
}

impl RunReport {
    pub fn matches(&self) -> &MatchSet {
        match self {
            RunReport::Listed { matches } | RunReport::Exported { matches, .. } => matches,
        }
    }
}

/// Candidates pulled from the source, with the table kept for file export.
enum Extracted {
    Text(Vec<Address>),
    File(Vec<Address>, Table),
}

/// Extraction, matching, enrichment and export for one source.
pub struct Pipeline<'a> {
    spec: &'a NetworkSpec,
    config: &'a Config,
    resolver: &'a dyn IspResolver,
}

impl<'a> Pipeline<'a> {
    pub fn new(spec: &'a NetworkSpec, config: &'a Config, resolver: &'a dyn IspResolver) -> Self {
        Self {
            spec,
            config,
            resolver,
        }
    }

    /// Run every stage for `source`. File sources are exported here; text
    /// sources are returned for the caller to print.
    pub async fn execute(&self, source: &str) -> Result<RunReport> {
        let extracted = self.extract(source)?;

        match extracted {
            Extracted::Text(addresses) => {
                let mut matches = self.filter(&addresses)?;
                self.enrich(&mut matches).await;
                Ok(RunReport::Listed { matches })
            }
            Extracted::File(addresses, table) => {
                let mut matches = self.filter(&addresses)?;
                self.enrich(&mut matches).await;
                let path =
                    output::export_csv(&table, &matches, self.config.tabular.delimiter_byte())?;
                Ok(RunReport::Exported { matches, path })
            }
        }
    }

    fn extract(&self, source: &str) -> Result<Extracted> {
        let bits = self.spec.bits();
        match InputSource::detect(source) {
            InputSource::Text(text) => {
                info!("Detected the list of IPv4 addresses.");
                Ok(Extracted::Text(extract::extract_from_text(&text, bits)))
            }
            InputSource::File(path) => {
                info!(path = %path.display(), "Detected the CSV file with IPv4 addresses.");
                output::export_target(&path)?;
                let found =
                    extract::extract_from_file(&path, self.config.tabular.delimiter_byte(), bits)?;
                Ok(Extracted::File(found.addresses, found.table))
            }
        }
    }

    /// Keep the candidates inside the network, first occurrence wins.
    pub fn filter(&self, candidates: &[Address]) -> Result<MatchSet> {
        let mut matches = MatchSet::new();
        for candidate in candidates {
            if self.spec.contains(candidate)? {
                matches.insert(candidate);
            }
        }
        info!(
            count = matches.len(),
            "Addresses were checked for belonging to the specified network. Detected {} such addresses.",
            matches.len()
        );
        Ok(matches)
    }

    /// Resolve every pending entry, strictly in order.
    pub async fn enrich(&self, matches: &mut MatchSet) {
        let pending = matches.pending();
        let total = pending.len();
        for (i, address) in pending.iter().enumerate() {
            info!("Receiving information about ISP. {} of {} done.", i + 1, total);
            let provider = self.resolver.resolve_isp(address).await;
            matches.resolve(address, provider);
        }
    }
}

/// User-supplied run parameters, before validation.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub network: String,
    pub mask: String,
    pub source: String,
    pub bits: u32,
}

impl RunInputs {
    /// Take values from the CLI, prompting on `input`/`prompt` for any missing.
    pub fn gather<R: BufRead, W: Write>(cli: &Cli, input: &mut R, prompt: &mut W) -> Result<Self> {
        let network = value_or_prompt(
            &cli.network,
            "Please enter the IPv4 network address: ",
            input,
            prompt,
        )?;
        let mask = value_or_prompt(&cli.mask, "Please enter the network mask: ", input, prompt)?;
        let source = value_or_prompt(
            &cli.source,
            "Please provide the list of IPs or the path to a CSV file: ",
            input,
            prompt,
        )?;
        Ok(Self {
            network,
            mask,
            source,
            bits: cli.bits,
        })
    }

    /// Parse network and mask into a [`NetworkSpec`].
    pub fn network_spec(&self) -> Result<NetworkSpec> {
        let network = Address::parse_with(&self.network, self.bits, false)?;
        let mask = Address::parse_mask(&self.mask, self.bits)?;
        NetworkSpec::new(network, mask)
    }
}

fn value_or_prompt<R: BufRead, W: Write>(
    given: &Option<String>,
    question: &str,
    input: &mut R,
    prompt: &mut W,
) -> Result<String> {
    if let Some(v) = given {
        return Ok(v.clone());
    }
    write!(prompt, "{question}").with_path("<stdout>", "prompt")?;
    prompt.flush().with_path("<stdout>", "prompt")?;
    let mut line = String::new();
    input.read_line(&mut line).with_path("<stdin>", "read")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end workflow.
    ///
    /// Returns: intended process exit code (0 = success, 1 = fatal input or
    /// configuration error, already reported on stderr).
    pub async fn run(cli: &Cli) -> Result<i32> {
        let config = match Self::configure(cli) {
            Ok(config) => config,
            Err(e) => {
                Self::report(&e, "");
                return Ok(1);
            }
        };
        info!("Settings loaded successfully.");

        let stdin = io::stdin();
        let inputs = RunInputs::gather(cli, &mut stdin.lock(), &mut io::stdout())?;

        let spec = match inputs.network_spec() {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!(
                    "Your network address ({}) or network mask ({}) are not valid: {e}",
                    inputs.network, inputs.mask
                );
                return Ok(1);
            }
        };

        let client = LookupClient::new(&config.lookup)?;
        let pipeline = Pipeline::new(&spec, &config, &client);

        match pipeline.execute(&inputs.source).await {
            Ok(RunReport::Listed { matches }) => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                match cli.format {
                    OutputFormat::Text => {
                        output::write_text(&matches, &mut out).with_path("<stdout>", "write")?
                    }
                    OutputFormat::Json => output::write_json(&matches, &mut out)?,
                }
                Ok(0)
            }
            Ok(RunReport::Exported { path, .. }) => {
                println!("Results saved to {}", path.display());
                Ok(0)
            }
            Err(e) => {
                Self::report(&e, &inputs.source);
                Ok(1)
            }
        }
    }

    /// Environment and `.env`, then CLI overrides, then validation.
    fn configure(cli: &Cli) -> Result<Config> {
        Self::settle(Config::load()?, cli)
    }

    fn settle(mut config: Config, cli: &Cli) -> Result<Config> {
        config.merge_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn report(error: &IspCheckError, source: &str) {
        if error.is_source_error() {
            eprintln!("There is no such file or incorrect file type: {source} ({error})");
            return;
        }
        match error.category() {
            ErrorCategory::Config => eprintln!("Configuration error: {error}"),
            _ => eprintln!("Error: {error}"),
        }
    }
}
