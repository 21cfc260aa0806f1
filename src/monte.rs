use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::codec;
use crate::error::{Error, Result};
use crate::files;
use crate::parser::VectorParser;
use crate::protocol::Protocol;
use crate::provider::{HashError, HashProvider, Md, DIGEST_SIZE};
use crate::suite::RunReport;

/// Number of externally visible checkpoints.
pub const CHECKPOINTS: usize = 100;

/// Hash invocations per checkpoint.
pub const ITERATIONS: usize = 1000;

/// Digests held per checkpoint: the three seed copies plus one per iteration.
pub const HISTORY_LEN: usize = ITERATIONS + 3;

/// MonteCarloState carries the seed between checkpoints and owns the
/// per-checkpoint digest history.
pub struct MonteCarloState {
    seed: Md,
    history: Box<[Md]>,
}

impl MonteCarloState {
    /// new starts the chain from `seed`.
    pub fn new(seed: Md) -> Self {
        Self {
            seed,
            history: vec![[0u8; DIGEST_SIZE]; HISTORY_LEN].into_boxed_slice(),
        }
    }

    /// seed is the value the next checkpoint starts from.
    pub fn seed(&self) -> &Md {
        &self.seed
    }

    /// checkpoint runs one block of ITERATIONS chained hashes:
    ///
    /// MD[0] = MD[1] = MD[2] = seed
    /// MD[i] = H(MD[i-3] || MD[i-2] || MD[i-1])   for i in 3..=1002
    ///
    /// and returns MD[1002], which also becomes the new seed.
    pub fn checkpoint<P: HashProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> std::result::Result<Md, HashError> {
        self.history.fill([0u8; DIGEST_SIZE]);
        self.history[..3].fill(self.seed);

        let mut message = [0u8; DIGEST_SIZE * 3];
        for i in 3..HISTORY_LEN {
            message[..DIGEST_SIZE].copy_from_slice(&self.history[i - 3]);
            message[DIGEST_SIZE..DIGEST_SIZE * 2].copy_from_slice(&self.history[i - 2]);
            message[DIGEST_SIZE * 2..].copy_from_slice(&self.history[i - 1]);
            self.history[i] = provider.hash(&message)?;
        }

        let md = self.history[HISTORY_LEN - 1];
        self.seed = md;
        Ok(md)
    }
}

/// MonteCarloRunner answers Monte Carlo request files.
pub struct MonteCarloRunner<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: HashProvider + ?Sized> MonteCarloRunner<'a, P> {
    /// new returns a runner hashing with `provider`.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// checkpoints computes all CHECKPOINTS digests chained from `seed`.
    pub fn checkpoints(&self, seed: Md) -> Result<Vec<Md>> {
        let mut state = MonteCarloState::new(seed);
        let mut out = Vec::with_capacity(CHECKPOINTS);
        for _ in 0..CHECKPOINTS {
            out.push(state.checkpoint(self.provider)?);
        }
        Ok(out)
    }

    /// run_stream copies the request header, echoes the seed and writes one
    /// `COUNT`/`MD` pair per checkpoint.
    pub fn run_stream<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<RunReport> {
        let mut parser = VectorParser::new(input);
        if !parser.copy_header(output, "Seed")? {
            return Err(Error::Format {
                line: parser.line_no(),
                reason: "no Seed line in Monte Carlo request".into(),
            });
        }
        let seed = parser.read_seed()?;
        write!(output, "Seed = {}\n\n", codec::encode(&seed)).map_err(Error::write)?;

        let mut state = MonteCarloState::new(seed);
        for j in 0..CHECKPOINTS {
            let md = state.checkpoint(self.provider)?;
            write!(output, "COUNT = {}\nMD = {}\n\n", j, codec::encode(&md))
                .map_err(Error::write)?;
            debug!(count = j, "checkpoint done");
        }
        output.flush().map_err(Error::write)?;

        Ok(RunReport {
            protocol: Protocol::MonteCarlo,
            records: CHECKPOINTS,
            skipped: 0,
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
            checkpoints = report.records,
            input = %input.display(),
            output = %output.display(),
            "monte carlo test finished"
        );
        Ok(report)
    }
}
