//! ispcheck library
//!
//! Finds the IPv4 addresses in a text or CSV source that belong to a given
//! network/mask pair and resolves each one's ISP through a rate-limited HTTP
//! lookup service. This library provides:
//!
//! - Address parsing with configurable octet width and netmask validation
//! - Octet-wise subnet membership testing
//! - Address extraction from free text or a CSV `ip` column
//! - A sequential lookup client that honours the service's rate-limit headers
//! - Console, JSON and CSV result output
//!
//! # Example
//!
//! ```rust
//! use ispcheck::{Address, NetworkSpec};
//!
//! let spec = NetworkSpec::new(
//!     Address::parse("10.0.0.0")?,
//!     Address::parse_mask("255.255.255.0", 8)?,
//! )?;
//! assert!(spec.contains(&Address::parse("10.0.0.42")?)?);
//! assert!(!spec.contains(&Address::parse("10.0.1.42")?)?);
//! # Ok::<(), ispcheck::IspCheckError>(())
//! ```

pub mod address;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extract;
pub mod lookup;
pub mod output;
pub mod results;
pub mod subnet;
pub mod throttle;

pub use address::{Address, ValidationError, ValidationKind};
pub use app::{App, Pipeline, RunReport};
pub use config::Config;
pub use errors::{IspCheckError, Result};
pub use extract::InputSource;
pub use lookup::{IspResolver, LookupClient, LookupFailure};
pub use results::{MatchEntry, MatchSet};
pub use subnet::{NetworkSpec, matches};
pub use throttle::{Pacer, RateLimitPolicy, TokioPacer};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
