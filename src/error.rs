use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::HexError;
use crate::protocol::Protocol;
use crate::provider::HashError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop or degrade a conformance run.
#[derive(Debug, Error)]
pub enum Error {
    /// A request or response file could not be opened for reading.
    #[error("cannot open {}: {source}", path.display())]
    FileOpen {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// An output file or its directory could not be created.
    #[error("cannot create {}: {source}", path.display())]
    FileCreate {
        /// File or directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Reading a request stream failed after it was opened.
    #[error("cannot read {}: {source}", describe(path))]
    Read {
        /// Request file, once known to the caller.
        path: Option<PathBuf>,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Writing a response stream failed after it was created.
    #[error("cannot write {}: {source}", describe(path))]
    Write {
        /// Response file, once known to the caller.
        path: Option<PathBuf>,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Any other I/O failure in the middle of a stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A vector file line could not be understood.
    #[error("line {line}: {reason}")]
    Format {
        /// 1-based line number in the request file.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Hex payload could not be decoded.
    #[error("hex decode failed: {0}")]
    Hex(#[from] HexError),

    /// The hash provider failed; the run cannot produce correct digests.
    #[error("hash provider failed: {0}")]
    Hash(#[from] HashError),

    /// A response file being compared has no `MD` lines.
    #[error("no MD values found in {0}")]
    NoDigestsFound(String),

    /// No registry entry with this name.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The algorithm has no vectors for this protocol.
    #[error("{algorithm} does not support the {protocol} test")]
    UnsupportedProtocol {
        /// Registry name of the algorithm.
        algorithm: String,
        /// Requested protocol.
        protocol: Protocol,
    },

    /// The registry already holds its maximum number of entries.
    #[error("algorithm registry is full ({0} entries)")]
    RegistryFull(usize),

    /// An algorithm with this name is already registered.
    #[error("algorithm already registered: {0}")]
    DuplicateAlgorithm(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "stream".to_string(),
    }
}

impl Error {
    /// read wraps a failure of the request side of a stream.
    pub fn read(source: io::Error) -> Self {
        Error::Read { path: None, source }
    }

    /// write wraps a failure of the response side of a stream.
    pub fn write(source: io::Error) -> Self {
        Error::Write { path: None, source }
    }

    /// with_paths names the request and response files in stream errors
    /// that do not carry a path yet.
    pub fn with_paths(self, input: &Path, output: &Path) -> Self {
        match self {
            Error::Read { path: None, source } => Error::Read {
                path: Some(input.to_path_buf()),
                source,
            },
            Error::Write { path: None, source } => Error::Write {
                path: Some(output.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// is_comparison reports whether the error only affects result comparison
    /// and leaves the generated response file usable.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Error::NoDigestsFound(_))
    }
}
