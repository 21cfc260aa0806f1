#![warn(missing_docs)]
//! A conformance engine for the NIST [`CAVP`] Secure Hash Algorithm Validation
//! System (SHAVS).
//!
//! The library reads CAVP request files (`.req`), answers them with a
//! pluggable hash provider and writes response files (`.rsp`) in the same
//! layout NIST publishes. Response files can then be compared with known-good
//! results, digest by digest.
//!
//! Three test types are supported: ShortMsg and LongMsg, which hash every
//! record of the file, and the Monte Carlo test, which chains 100,000 hashes
//! from a single seed.
//!
//! # Example
//! ```
//! use shavs::msg::ShortLongRunner;
//! use shavs::provider::Sha256Provider;
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!   let provider = Sha256Provider::sha256();
//!   let request = "[L = 32]\n\nLen = 24\nMsg = 616263\n";
//!   let mut response = Vec::new();
//!   let report = ShortLongRunner::new(&provider).run_stream(request.as_bytes(), &mut response)?;
//!   println!("{} records", report.records);
//!   print!("{}", String::from_utf8(response)?);
//!
//!   Ok(())
//! }
//! ```
//!
//! [`CAVP`]: https://csrc.nist.gov/projects/cryptographic-algorithm-validation-program

/// `codec` converts between hex text and bytes.
pub mod codec;
/// `compare` checks a response file against known-good results.
pub mod compare;
/// `config` holds the TOML configuration of suite runs.
pub mod config;
/// `error` is the crate-wide error type.
pub mod error;
/// `files` opens request files and creates response files.
pub mod files;
/// `logging` installs the tracing subscriber.
pub mod logging;
/// `monte` implements the SHAVS Monte Carlo test.
pub mod monte;
/// `msg` answers ShortMsg and LongMsg request files.
pub mod msg;
/// `parser` reads records out of CAVP vector files.
pub mod parser;
/// `protocol` names the test types and detects them from file names.
pub mod protocol;
/// `provider` is the seam between the engine and hash implementations.
pub mod provider;
/// `registry` lists the algorithms a suite run can select.
pub mod registry;
/// `suite` dispatches requests and runs the automatic test suite.
pub mod suite;

pub use error::{Error, Result};
pub use protocol::Protocol;
pub use provider::{HashProvider, Md, Sha256Provider};
pub use registry::AlgorithmRegistry;
