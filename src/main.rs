use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use shavs::compare;
use shavs::config::SuiteConfig;
use shavs::suite::{self, AutoTestReport, Verification};
use shavs::{codec, logging, AlgorithmRegistry, Protocol};

#[derive(Parser)]
#[command(name = "shavs", version, about = "NIST CAVP SHAVS conformance runner")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fail on malformed Len lines instead of skipping the record
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one request file; the test type comes from its name
    Run {
        /// Request (.req) file
        input: PathBuf,
        /// Response (.rsp) file to write
        output: PathBuf,
        /// Known-good response to compare against
        #[arg(short, long)]
        expected: Option<PathBuf>,
        /// Algorithm from the registry
        #[arg(short, long, default_value = "SHA-256")]
        algorithm: String,
    },
    /// Compare the MD values of two response files
    Compare {
        /// Response file to check
        output: PathBuf,
        /// Known-good response file
        expected: PathBuf,
    },
    /// Run the vector tree of an algorithm and verify the results
    Auto {
        /// Algorithm from the registry
        #[arg(short, long, default_value = "SHA-256")]
        algorithm: String,
        /// Only this test type (short, long or monte)
        #[arg(short, long)]
        protocol: Option<Protocol>,
    },
    /// Hash a single input and print the digest
    Digest {
        /// Treat the input as hex instead of text
        #[arg(long)]
        hex: bool,
        /// Algorithm from the registry
        #[arg(short, long, default_value = "SHA-256")]
        algorithm: String,
        /// Text or hex input
        input: String,
    },
    /// List the registered algorithms
    List,
}

fn load_config(cli: &Cli) -> Result<SuiteConfig> {
    let mut config = match &cli.config {
        Some(path) => SuiteConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SuiteConfig::default(),
    };
    if cli.strict {
        config.parser.strict_len = true;
    }
    Ok(config)
}

fn print_auto(report: &AutoTestReport) -> bool {
    let status = match &report.verification {
        Verification::Skipped => "no expected results".to_string(),
        Verification::Compared(result) if result.is_match() => {
            format!("PASS ({} digests)", result.total_compared)
        }
        Verification::Compared(result) => format!(
            "FAIL ({} mismatches at {:?})",
            result.mismatches, result.mismatch_positions
        ),
        Verification::Failed(err) => format!("FAIL ({})", err),
    };
    println!(
        "{} {}: {} records, {} skipped, {}",
        report.algorithm, report.run.protocol, report.run.records, report.run.skipped, status
    );
    matches!(report.verification, Verification::Skipped) || report.verification.passed()
}

fn execute(cli: Cli, config: SuiteConfig) -> Result<bool> {
    let registry = AlgorithmRegistry::with_defaults();
    let policy = config.parser.len_policy();

    match cli.command {
        Command::Run {
            input,
            output,
            expected,
            algorithm,
        } => {
            let entry = registry.lookup(&algorithm)?;
            let report = suite::run_request(entry.provider(), &input, &output, policy)
                .with_context(|| format!("failed to answer {}", input.display()))?;
            println!(
                "{}: {} records, {} skipped -> {}",
                report.protocol,
                report.records,
                report.skipped,
                output.display()
            );
            match expected {
                Some(expected) => {
                    let result = compare::compare_files(&output, &expected)?;
                    println!(
                        "{} of {} digests compared, {} mismatches",
                        result.total_compared, report.records, result.mismatches
                    );
                    Ok(result.is_match())
                }
                None => Ok(true),
            }
        }
        Command::Compare { output, expected } => {
            let result = compare::compare_files(&output, &expected)?;
            if result.is_match() {
                println!("all {} digests match", result.total_compared);
            } else {
                println!(
                    "{} mismatches at positions {:?}",
                    result.mismatches, result.mismatch_positions
                );
            }
            Ok(result.is_match())
        }
        Command::Auto {
            algorithm,
            protocol,
        } => {
            let reports = match protocol {
                Some(protocol) => vec![suite::run_auto_test(
                    &registry, &config, &algorithm, protocol,
                )?],
                None => suite::run_auto_suite(&registry, &config, &algorithm)?,
            };
            let mut passed = true;
            for report in &reports {
                passed &= print_auto(report);
            }
            Ok(passed)
        }
        Command::Digest {
            hex,
            algorithm,
            input,
        } => {
            let entry = registry.lookup(&algorithm)?;
            let md = suite::digest_input(entry.provider(), &input, hex)?;
            println!("{}", codec::encode(&md));
            Ok(true)
        }
        Command::List => {
            for entry in registry.iter() {
                let protocols: Vec<String> =
                    entry.supported().iter().map(|p| p.to_string()).collect();
                println!(
                    "{:<10} {:<40} {} [{}]",
                    entry.name(),
                    entry.description(),
                    entry.dir(),
                    protocols.join(", ")
                );
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.logging.json {
        logging::init_json(&config.logging.level);
    } else {
        logging::init(&config.logging.level);
    }

    match execute(cli, config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            warn!("verification failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
