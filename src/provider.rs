use std::marker::PhantomData;

use digest::Digest;
use thiserror::Error;

/// The size in bytes of a digest produced by a provider.
pub const DIGEST_SIZE: usize = 32;

/// Size of the slices `hash` feeds to `update`.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A message digest as written in the `MD =` lines.
pub type Md = [u8; DIGEST_SIZE];

/// Failures reported by a hash provider. All of them are fatal for a run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HashError {
    /// The hash context could not be created.
    #[error("hash initialization failed")]
    InitFailed,
    /// Feeding data to the context failed.
    #[error("hash update failed")]
    UpdateFailed,
    /// The digest could not be produced.
    #[error("hash finalization failed")]
    FinalFailed,
}

/// An in-progress hash computation.
pub trait HashContext {
    /// update absorbs more message bytes.
    fn update(&mut self, data: &[u8]) -> Result<(), HashError>;
    /// finalize consumes the context and returns the digest.
    fn finalize(self: Box<Self>) -> Result<Md, HashError>;
}

/// The hash primitive under test.
pub trait HashProvider {
    /// Display name, e.g. `SHA-256`.
    fn name(&self) -> &str;

    /// init starts a new hash computation.
    fn init(&self) -> Result<Box<dyn HashContext>, HashError>;

    /// hash computes the digest of `message` in one call. The message is fed
    /// in `CHUNK_SIZE` pieces; the result equals a single-shot update.
    fn hash(&self, message: &[u8]) -> Result<Md, HashError> {
        let mut ctx = self.init()?;
        for chunk in message.chunks(CHUNK_SIZE) {
            ctx.update(chunk)?;
        }
        ctx.finalize()
    }
}

/// DigestProvider adapts any RustCrypto `Digest` with a 32 byte output.
pub struct DigestProvider<D> {
    name: &'static str,
    _digest: PhantomData<fn() -> D>,
}

impl<D> DigestProvider<D> {
    /// new returns a provider reporting itself as `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _digest: PhantomData,
        }
    }
}

/// Sha256Provider is the provider backed by the `sha2` crate.
pub type Sha256Provider = DigestProvider<sha2::Sha256>;

impl Sha256Provider {
    /// sha256 returns the default SHA-256 provider.
    pub const fn sha256() -> Self {
        Self::new("SHA-256")
    }
}

impl Default for Sha256Provider {
    fn default() -> Self {
        Self::sha256()
    }
}

struct DigestContext<D>(D);

impl<D: Digest> HashContext for DigestContext<D> {
    fn update(&mut self, data: &[u8]) -> Result<(), HashError> {
        Digest::update(&mut self.0, data);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Md, HashError> {
        let DigestContext(inner) = *self;
        let out = Digest::finalize(inner);
        // only 256-bit digests fit the response format
        if out.len() != DIGEST_SIZE {
            return Err(HashError::FinalFailed);
        }
        let mut md = [0u8; DIGEST_SIZE];
        md.copy_from_slice(&out);
        Ok(md)
    }
}

impl<D: Digest + 'static> HashProvider for DigestProvider<D> {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&self) -> Result<Box<dyn HashContext>, HashError> {
        Ok(Box::new(DigestContext(D::new())))
    }
}
