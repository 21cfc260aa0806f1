use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::codec;
use crate::error::{Error, Result};
use crate::files;
use crate::parser::{LenPolicy, TestVectorRecord, VectorParser};
use crate::protocol::Protocol;
use crate::provider::{HashProvider, Md};
use crate::suite::RunReport;

/// A record together with the digest computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRecord {
    /// The parsed request record.
    pub source: TestVectorRecord,
    /// Digest of `source.message`.
    pub digest: Md,
}

impl DigestRecord {
    /// write_to emits the response form: `Len`, original `Msg` line(s), `MD`
    /// and a blank separator line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.source.write_header(out)?;
        write!(out, "MD = {}\n\n", codec::encode(&self.digest)).map_err(Error::write)?;
        Ok(())
    }
}

/// ShortLongRunner answers ShortMsg and LongMsg request files.
pub struct ShortLongRunner<'a, P: ?Sized> {
    provider: &'a P,
    policy: LenPolicy,
    protocol: Protocol,
}

impl<'a, P: HashProvider + ?Sized> ShortLongRunner<'a, P> {
    /// new returns a runner for ShortMsg files with lenient `Len` handling.
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            policy: LenPolicy::Skip,
            protocol: Protocol::ShortMsg,
        }
    }

    /// policy sets how malformed `Len` lines are handled.
    pub fn policy(mut self, policy: LenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// protocol sets the protocol reported for the run.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// digest hashes a single record.
    pub fn digest(&self, record: TestVectorRecord) -> Result<DigestRecord> {
        let digest = self.provider.hash(&record.message)?;
        Ok(DigestRecord {
            source: record,
            digest,
        })
    }

    /// run_stream reads a request from `input` and writes the response to
    /// `output`. The first hash or decode failure stops the run.
    pub fn run_stream<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<RunReport> {
        let mut parser = VectorParser::with_policy(input, self.policy);
        let mut records = 0;

        parser.copy_header(output, "Len")?;
        while let Some(record) = parser.next_record()? {
            let line = parser.line_no();
            let response = self.digest(record)?;
            response.write_to(output)?;
            records += 1;
            debug!(records, line, bits = response.source.length_bits, "hashed record");
        }
        output.flush().map_err(Error::write)?;

        Ok(RunReport {
            protocol: self.protocol,
            records,
            skipped: parser.skipped(),
        })
    }

    /// run answers the request file `input` into the response file `output`.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunReport> {
        let reader = files::open_request(input)?;
        let mut writer = files::create_response(output)?;
        let report = self
            .run_stream(reader, &mut writer)
            .map_err(|e| e.with_paths(input, output))?;
        info!(
            algorithm = self.provider.name(),
            protocol = %report.protocol,
            records = report.records,
            skipped = report.skipped,
            input = %input.display(),
            output = %output.display(),
            "message test finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::provider::{HashContext, HashError, Sha256Provider};
    use anyhow::Result;

    fn respond(input: &str) -> Result<(String, RunReport)> {
        let provider = Sha256Provider::sha256();
        let mut out = Vec::new();
        let report = ShortLongRunner::new(&provider).run_stream(input.as_bytes(), &mut out)?;
        Ok((String::from_utf8(out)?, report))
    }

    struct TestElement {
        input: &'static str,
        output: &'static str,
    }

    static TEST_VECTOR: &[TestElement] = &[
        TestElement {
            input: "Len = 8\nMsg = 61\n",
            output: "Len = 8\nMsg = 61\nMD = ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb\n\n",
        },
        TestElement {
            input: "Len = 0\nMsg = 00\n",
            output: "Len = 0\nMsg = 00\nMD = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\n",
        },
        TestElement {
            input: "Len = 0\nMsg = \n",
            output: "Len = 0\nMsg = \nMD = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\n",
        },
        TestElement {
            input: "Len = 8\nMsg = d3",
            output: "Len = 8\nMsg = d3\nMD = 28969cdfa74a12c82f3bad960b0b000aca2ac329deea5c2328ebc6f2ba9802c1\n\n",
        },
    ];

    #[test]
    fn test_vector() {
        TEST_VECTOR.iter().enumerate().for_each(|(i, element)| {
            let (output, report) = respond(element.input).unwrap();
            assert_eq!(report.records, 1);
            assert_eq!(
                element.output, output,
                "test vector element mismatched on index {} failed! got {}, want {}",
                i, output, element.output
            );
        })
    }

    #[test]
    fn keeps_header_and_order() -> Result<()> {
        let input = "#  CAVS 11.0\n#  \"SHA-256 ShortMsg\" information\n\n[L = 32]\n\n\
                     Len = 8\nMsg = d3\n\nLen = 16\nMsg = 11af\n\nLen = 24\nMsg = 616263\n\n";
        let (output, report) = respond(input)?;
        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            output,
            "#  CAVS 11.0\n#  \"SHA-256 ShortMsg\" information\n\n[L = 32]\n\n\
             Len = 8\nMsg = d3\nMD = 28969cdfa74a12c82f3bad960b0b000aca2ac329deea5c2328ebc6f2ba9802c1\n\n\
             Len = 16\nMsg = 11af\nMD = 5ca7133fa735326081558ac312c620eeca9970d1e70a4b95533d956f072d1f98\n\n\
             Len = 24\nMsg = 616263\nMD = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\n\n"
        );
        Ok(())
    }

    #[test]
    fn wrapped_msg_hashes_like_single_line() -> Result<()> {
        let (single, _) = respond("Len = 24\nMsg = 616263\n")?;
        let (wrapped, _) = respond("Len = 24\nMsg = 61\n62\n63\n")?;
        let md = |s: &str| s.lines().find(|l| l.starts_with("MD")).map(str::to_string);
        assert_eq!(md(&single), md(&wrapped));
        assert!(wrapped.starts_with("Len = 24\nMsg = 61\n62\n63\nMD = "));
        Ok(())
    }

    #[test]
    fn skipped_records_are_counted() -> Result<()> {
        let (output, report) = respond("Len = ?\nMsg = 00\n\nLen = 8\nMsg = 61\n")?;
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped, 1);
        assert!(output.starts_with("Len = 8\n"));
        Ok(())
    }

    struct BrokenProvider;

    impl HashProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn init(&self) -> std::result::Result<Box<dyn HashContext>, HashError> {
            Err(HashError::InitFailed)
        }
    }

    #[test]
    fn provider_failure_aborts() {
        let mut out = Vec::new();
        let err = ShortLongRunner::new(&BrokenProvider)
            .run_stream("Len = 8\nMsg = 61\n\nLen = 8\nMsg = 62\n".as_bytes(), &mut out)
            .unwrap_err();
        assert!(matches!(err, Error::Hash(HashError::InitFailed)));
        assert!(!String::from_utf8(out).unwrap().contains("MD ="));
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_names_the_response() {
        let provider = Sha256Provider::sha256();
        let err = ShortLongRunner::new(&provider)
            .run_stream("Len = 8\nMsg = 61\n".as_bytes(), &mut FullDisk)
            .unwrap_err();
        assert!(matches!(err, Error::Write { path: None, .. }));

        let err = err.with_paths(
            Path::new("SHA256ShortMsg.req"),
            Path::new("out/SHA256ShortMsg.rsp"),
        );
        match &err {
            Error::Write { path: Some(path), .. } => {
                assert_eq!(path, Path::new("out/SHA256ShortMsg.rsp"))
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("cannot write out/SHA256ShortMsg.rsp: "));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn run_reports_response_path_on_full_device() -> Result<()> {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("SHA256ShortMsg.req");
        std::fs::write(&input, "Len = 8\nMsg = 61\n")?;

        let provider = Sha256Provider::sha256();
        match ShortLongRunner::new(&provider).run(&input, full) {
            Err(Error::Write { path: Some(path), .. }) => assert_eq!(path, full),
            // sandboxes may forbid opening the device
            Err(Error::FileCreate { .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn run_on_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("SHA256ShortMsg.req");
        let output = dir.path().join("out").join("SHA256ShortMsg.rsp");
        std::fs::write(&input, "[L = 32]\n\nLen = 8\nMsg = 61\n")?;

        let provider = Sha256Provider::sha256();
        let report = ShortLongRunner::new(&provider).run(&input, &output)?;
        assert_eq!(report.records, 1);
        assert_eq!(
            std::fs::read_to_string(&output)?,
            "[L = 32]\n\nLen = 8\nMsg = 61\nMD = ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb\n\n"
        );
        Ok(())
    }
}
