use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec;
use crate::compare::{self, ComparisonResult};
use crate::config::SuiteConfig;
use crate::error::{Error, Result};
use crate::files;
use crate::monte::MonteCarloRunner;
use crate::msg::ShortLongRunner;
use crate::parser::LenPolicy;
use crate::protocol::Protocol;
use crate::provider::{HashProvider, Md};
use crate::registry::AlgorithmRegistry;

/// Diagnostics of one runner invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Protocol the request was answered with.
    pub protocol: Protocol,
    /// Records (or checkpoints) written to the response.
    pub records: usize,
    /// Malformed records dropped by the parser.
    pub skipped: usize,
}

/// run_protocol answers `input` with the runner for `protocol`.
pub fn run_protocol<P: HashProvider + ?Sized>(
    provider: &P,
    protocol: Protocol,
    input: &Path,
    output: &Path,
    policy: LenPolicy,
) -> Result<RunReport> {
    if protocol.is_message() {
        ShortLongRunner::new(provider)
            .policy(policy)
            .protocol(protocol)
            .run(input, output)
    } else {
        MonteCarloRunner::new(provider).run(input, output)
    }
}

/// run_request picks the protocol from the name of `input` and answers it.
pub fn run_request<P: HashProvider + ?Sized>(
    provider: &P,
    input: &Path,
    output: &Path,
    policy: LenPolicy,
) -> Result<RunReport> {
    let protocol = Protocol::detect(input);
    info!(%protocol, input = %input.display(), "detected test type");
    run_protocol(provider, protocol, input, output, policy)
}

/// What happened when the response was checked against known-good results.
#[derive(Debug)]
pub enum Verification {
    /// No expected file was present.
    Skipped,
    /// Both files were compared.
    Compared(ComparisonResult),
    /// The files could not be compared, e.g. no MD lines.
    Failed(Error),
}

impl Verification {
    /// passed is true only for a comparison without mismatches.
    pub fn passed(&self) -> bool {
        matches!(self, Verification::Compared(result) if result.is_match())
    }
}

/// Result of one automatic test over the vector tree.
#[derive(Debug)]
pub struct AutoTestReport {
    /// Registry name of the algorithm.
    pub algorithm: String,
    /// Request file read.
    pub request: PathBuf,
    /// Response file written.
    pub response: PathBuf,
    /// Expected file looked for.
    pub expected: PathBuf,
    /// Runner diagnostics.
    pub run: RunReport,
    /// Comparison outcome.
    pub verification: Verification,
}

/// verify compares `response` with `expected` when the latter exists.
/// Comparison failures are reported, I/O failures are returned.
pub fn verify(response: &Path, expected: &Path) -> Result<Verification> {
    if !expected.is_file() {
        return Ok(Verification::Skipped);
    }
    match compare::compare_files(response, expected) {
        Ok(result) => {
            if result.is_match() {
                info!(expected = %expected.display(), "all MD values match");
            } else {
                warn!(
                    mismatches = result.mismatches,
                    positions = ?result.mismatch_positions,
                    "MD values differ from expected results"
                );
            }
            Ok(Verification::Compared(result))
        }
        Err(err) if err.is_comparison() => {
            warn!(%err, "comparison failed");
            Ok(Verification::Failed(err))
        }
        Err(err) => Err(err),
    }
}

/// run_auto_test answers `<request>/<dir>/<prefix><protocol>.req` for the
/// named algorithm and checks the result against the expected tree.
pub fn run_auto_test(
    registry: &AlgorithmRegistry,
    config: &SuiteConfig,
    algorithm: &str,
    protocol: Protocol,
) -> Result<AutoTestReport> {
    let entry = registry.lookup(algorithm)?;
    if !entry.supports(protocol) {
        return Err(Error::UnsupportedProtocol {
            algorithm: entry.name().to_string(),
            protocol,
        });
    }

    let request_name = entry.request_file(protocol);
    let response_name = files::replace_extension(&request_name, ".req", ".rsp");
    let request = config.paths.request.join(entry.dir()).join(&request_name);
    let response = config.paths.response.join(entry.dir()).join(&response_name);
    let expected = config.paths.expected.join(entry.dir()).join(&response_name);

    info!(algorithm = entry.name(), %protocol, "starting automatic test");
    let run = run_protocol(
        entry.provider(),
        protocol,
        &request,
        &response,
        config.parser.len_policy(),
    )?;
    let verification = verify(&response, &expected)?;

    Ok(AutoTestReport {
        algorithm: entry.name().to_string(),
        request,
        response,
        expected,
        run,
        verification,
    })
}

/// run_auto_suite runs every protocol the algorithm supports. The first
/// fatal error stops the suite.
pub fn run_auto_suite(
    registry: &AlgorithmRegistry,
    config: &SuiteConfig,
    algorithm: &str,
) -> Result<Vec<AutoTestReport>> {
    let entry = registry.lookup(algorithm)?;
    entry
        .supported()
        .iter()
        .map(|protocol| run_auto_test(registry, config, algorithm, *protocol))
        .collect()
}

/// digest_input hashes a manual input: UTF-8 text as is, or hex text
/// (surrounding whitespace ignored) when `is_hex` is set.
pub fn digest_input<P: HashProvider + ?Sized>(
    provider: &P,
    input: &str,
    is_hex: bool,
) -> Result<Md> {
    if is_hex {
        let text = input.trim();
        let bytes = codec::decode(text, (text.len() + 1) / 2)?;
        Ok(provider.hash(&bytes)?)
    } else {
        Ok(provider.hash(input.as_bytes())?)
    }
}

#[cfg(test)]
pub mod test {
    use std::fs;

    use super::*;
    use crate::logging;
    use crate::monte::CHECKPOINTS;
    use crate::provider::Sha256Provider;
    use anyhow::Result;

    const SHORT_REQ: &str = "#  CAVS 11.0\n#  \"SHA-256 ShortMsg\" information\n\n[L = 32]\n\n\
Len = 0\nMsg = 00\n\nLen = 8\nMsg = d3\n\nLen = 16\nMsg = 11af\n\n";

    const SHORT_RSP: &str = "#  CAVS 11.0\n#  \"SHA-256 ShortMsg\" information\n\n[L = 32]\n\n\
Len = 0\nMsg = 00\nMD = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\n\
Len = 8\nMsg = d3\nMD = 28969cdfa74a12c82f3bad960b0b000aca2ac329deea5c2328ebc6f2ba9802c1\n\n\
Len = 16\nMsg = 11af\nMD = 5ca7133fa735326081558ac312c620eeca9970d1e70a4b95533d956f072d1f98\n\n";

    fn vector_tree(root: &Path) -> Result<SuiteConfig> {
        let config = SuiteConfig::with_root(root);
        fs::create_dir_all(config.paths.request.join("SHA_256"))?;
        fs::create_dir_all(config.paths.expected.join("SHA_256"))?;
        fs::write(
            config.paths.request.join("SHA_256").join("SHA256ShortMsg.req"),
            SHORT_REQ,
        )?;
        Ok(config)
    }

    #[test]
    fn auto_test_matches_expected() -> Result<()> {
        logging::init_for_tests();
        let dir = tempfile::tempdir()?;
        let config = vector_tree(dir.path())?;
        fs::write(
            config.paths.expected.join("SHA_256").join("SHA256ShortMsg.rsp"),
            SHORT_RSP,
        )?;

        let registry = AlgorithmRegistry::with_defaults();
        let report = run_auto_test(&registry, &config, "SHA-256", Protocol::ShortMsg)?;

        assert_eq!(report.run.records, 3);
        assert_eq!(
            report.response,
            config.paths.response.join("SHA_256").join("SHA256ShortMsg.rsp")
        );
        assert_eq!(fs::read_to_string(&report.response)?, SHORT_RSP);
        assert!(report.verification.passed(), "{:?}", report.verification);
        Ok(())
    }

    #[test]
    fn auto_test_without_expected_is_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = vector_tree(dir.path())?;
        let registry = AlgorithmRegistry::with_defaults();
        let report = run_auto_test(&registry, &config, "sha-256", Protocol::ShortMsg)?;
        assert!(matches!(report.verification, Verification::Skipped));
        assert!(!report.verification.passed());
        Ok(())
    }

    #[test]
    fn auto_test_reports_mismatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = vector_tree(dir.path())?;
        fs::write(
            config.paths.expected.join("SHA_256").join("SHA256ShortMsg.rsp"),
            SHORT_RSP.replace("28969cdf", "00000000"),
        )?;
        let registry = AlgorithmRegistry::with_defaults();
        let report = run_auto_test(&registry, &config, "SHA-256", Protocol::ShortMsg)?;
        match report.verification {
            Verification::Compared(result) => assert_eq!(result.mismatch_positions, vec![1]),
            other => panic!("unexpected verification {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn response_without_digests_is_reported_not_raised() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = vector_tree(dir.path())?;

        // a request without records leaves the response with no MD lines
        fs::write(
            config.paths.request.join("SHA_256").join("SHA256LongMsg.req"),
            "# no records\n",
        )?;
        fs::write(
            config.paths.expected.join("SHA_256").join("SHA256LongMsg.rsp"),
            SHORT_RSP,
        )?;
        let registry = AlgorithmRegistry::with_defaults();
        let report = run_auto_test(&registry, &config, "SHA-256", Protocol::LongMsg)?;
        assert_eq!(report.run.records, 0);
        assert!(matches!(
            report.verification,
            Verification::Failed(Error::NoDigestsFound(_))
        ));
        Ok(())
    }

    #[test]
    fn missing_request_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = vector_tree(dir.path())?;
        let registry = AlgorithmRegistry::with_defaults();
        let err = run_auto_test(&registry, &config, "SHA-256", Protocol::MonteCarlo).unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
        assert!(matches!(
            run_auto_test(&registry, &config, "MD5", Protocol::ShortMsg),
            Err(Error::UnknownAlgorithm(_))
        ));
        Ok(())
    }

    #[test]
    fn run_request_dispatches_on_file_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("SHA256Monte.req");
        let output = dir.path().join("SHA256Monte.rsp");
        fs::write(&input, format!("[L = 32]\n\nSeed = {}\n", "00".repeat(32)))?;

        let provider = Sha256Provider::sha256();
        let report = run_request(&provider, &input, &output, LenPolicy::Skip)?;
        assert_eq!(report.protocol, Protocol::MonteCarlo);
        assert_eq!(report.records, CHECKPOINTS);

        let long_in = dir.path().join("SHA256LongMsg.req");
        let long_out = dir.path().join("SHA256LongMsg.rsp");
        fs::write(&long_in, "Len = 8\nMsg = 61\n")?;
        let report = run_request(&provider, &long_in, &long_out, LenPolicy::Skip)?;
        assert_eq!(report.protocol, Protocol::LongMsg);
        assert_eq!(report.records, 1);
        Ok(())
    }

    #[test]
    fn manual_digest() -> Result<()> {
        let provider = Sha256Provider::sha256();
        let text = digest_input(&provider, "abc", false)?;
        let hex = digest_input(&provider, " 616263\n", true)?;
        assert_eq!(text, hex);
        assert_eq!(
            codec::encode(&digest_input(&provider, "", true)?),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(matches!(
            digest_input(&provider, "xyz", true),
            Err(Error::Hex(_))
        ));
        Ok(())
    }
}
