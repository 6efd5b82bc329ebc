//! Incremental hashing over the configurable algorithm set.
//!
//! The audit chain and evidence hashes feed fields into the hasher one by
//! one (the byte layouts are documented where each hash is computed), so
//! the wrapper exposes the same update/finalize shape as the underlying
//! `sha2` digests. Output is always lowercase hex.

use sha2::{Digest, Sha256, Sha384, Sha512};

use aegis_contracts::config::HashAlgorithm;

/// An in-progress digest over one of the supported algorithms.
pub enum ChainHasher {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl ChainHasher {
    /// Start a new digest with the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => ChainHasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => ChainHasher::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => ChainHasher::Sha512(Sha512::new()),
        }
    }

    /// Feed bytes into the digest.
    pub fn update(&mut self, bytes: impl AsRef<[u8]>) {
        match self {
            ChainHasher::Sha256(h) => h.update(bytes),
            ChainHasher::Sha384(h) => h.update(bytes),
            ChainHasher::Sha512(h) => h.update(bytes),
        }
    }

    /// Consume the hasher and return the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            ChainHasher::Sha256(h) => hex::encode(h.finalize()),
            ChainHasher::Sha384(h) => hex::encode(h.finalize()),
            ChainHasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// One-shot digest of a byte slice.
pub fn digest_hex(algorithm: HashAlgorithm, bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = ChainHasher::new(algorithm);
    hasher.update(bytes);
    hasher.finalize_hex()
}
