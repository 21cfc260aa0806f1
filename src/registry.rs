use crate::error::{Error, Result};
use crate::protocol::Protocol;
use crate::provider::{HashProvider, Sha256Provider};

/// Maximum number of algorithms a registry holds.
pub const MAX_ALGORITHMS: usize = 10;

/// A hash algorithm known to the suite and where its vectors live.
pub struct AlgorithmEntry {
    name: String,
    description: String,
    vector_dir: String,
    file_prefix: String,
    protocols: Vec<Protocol>,
    provider: Box<dyn HashProvider>,
}

impl AlgorithmEntry {
    /// new describes an algorithm supporting every protocol. The vector
    /// directory and file prefix default to `name` with `-` dropped.
    pub fn new<P: HashProvider + 'static>(name: &str, description: &str, provider: P) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            vector_dir: name.replace('-', "_"),
            file_prefix: name.replace('-', ""),
            protocols: Protocol::ALL.to_vec(),
            provider: Box::new(provider),
        }
    }

    /// vector_dir sets the per-algorithm directory below request/response/expected.
    pub fn vector_dir(mut self, dir: &str) -> Self {
        self.vector_dir = dir.to_string();
        self
    }

    /// file_prefix sets the prefix of request file names, e.g. `SHA256`.
    pub fn file_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self
    }

    /// protocols restricts the supported protocols.
    pub fn protocols(mut self, protocols: &[Protocol]) -> Self {
        self.protocols = protocols.to_vec();
        self
    }

    /// name is the registry key, e.g. `SHA-256`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// description is a human readable summary.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The vector directory name, e.g. `SHA_256`.
    pub fn dir(&self) -> &str {
        &self.vector_dir
    }

    /// supported lists the protocols with vectors.
    pub fn supported(&self) -> &[Protocol] {
        &self.protocols
    }

    /// supports reports whether `protocol` has vectors.
    pub fn supports(&self, protocol: Protocol) -> bool {
        self.protocols.contains(&protocol)
    }

    /// provider is the hash implementation under test.
    pub fn provider(&self) -> &dyn HashProvider {
        self.provider.as_ref()
    }

    /// request_file is the request file name for `protocol`,
    /// e.g. `SHA256ShortMsg.req`.
    pub fn request_file(&self, protocol: Protocol) -> String {
        format!("{}{}.req", self.file_prefix, protocol.file_stem())
    }
}

/// AlgorithmRegistry lists the algorithms a run can select from.
///
/// Build it once at start-up and pass it by reference.
#[derive(Default)]
pub struct AlgorithmRegistry {
    entries: Vec<AlgorithmEntry>,
}

impl AlgorithmRegistry {
    /// new returns an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// with_defaults returns a registry holding SHA-256.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.entries.push(
            AlgorithmEntry::new(
                "SHA-256",
                "Secure Hash Algorithm, 256-bit digest",
                Sha256Provider::sha256(),
            )
            .vector_dir("SHA_256")
            .file_prefix("SHA256"),
        );
        registry
    }

    /// register adds `entry` and returns its id.
    pub fn register(&mut self, entry: AlgorithmEntry) -> Result<usize> {
        if self.entries.len() >= MAX_ALGORITHMS {
            return Err(Error::RegistryFull(MAX_ALGORITHMS));
        }
        if self.by_name(entry.name()).is_some() {
            return Err(Error::DuplicateAlgorithm(entry.name));
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// get looks an entry up by id.
    pub fn get(&self, id: usize) -> Option<&AlgorithmEntry> {
        self.entries.get(id)
    }

    /// by_name looks an entry up by name, ignoring case.
    pub fn by_name(&self, name: &str) -> Option<&AlgorithmEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// lookup is `by_name` returning `UnknownAlgorithm` for a missing name.
    pub fn lookup(&self, name: &str) -> Result<&AlgorithmEntry> {
        self.by_name(name)
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
    }

    /// Number of registered algorithms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is_empty reports whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// iter walks the entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AlgorithmEntry> {
        self.entries.iter()
    }
}
