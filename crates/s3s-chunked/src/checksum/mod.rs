//! Checksum algorithms
//!
//! A [`Checksum`] is a live, incrementally updated digest. Reading
//! [`Checksum::digest`] does not consume the accumulated state, so the same
//! instance can be consulted by a trailer provider after the payload has been
//! streamed through it.

mod cache;
pub use self::cache::{ChecksumCache, ChecksumTrailerProvider};

mod io;
pub use self::io::{ChecksumReader, ChecksumStream};

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use numeric_cast::TruncatingCast;
use serde::{Deserialize, Serialize};

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChecksumAlgorithm {
    Crc32,
    Crc32c,
    Crc64Nvme,
    Sha1,
    Sha256,
    Md5,
}

impl ChecksumAlgorithm {
    /// Name of the header (or trailer) carrying the checksum value
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::Crc32 => "x-amz-checksum-crc32",
            Self::Crc32c => "x-amz-checksum-crc32c",
            Self::Crc64Nvme => "x-amz-checksum-crc64nvme",
            Self::Sha1 => "x-amz-checksum-sha1",
            Self::Sha256 => "x-amz-checksum-sha256",
            Self::Md5 => "content-md5",
        }
    }

    /// Length of the raw digest in bytes
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Crc32 | Self::Crc32c => 4,
            Self::Crc64Nvme => 8,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Md5 => 16,
        }
    }

    /// Length of the base64-encoded digest
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        self.digest_len().div_ceil(3) * 4
    }

    /// Creates a fresh checksum for this algorithm
    #[must_use]
    pub fn new_checksum(self) -> Box<dyn Checksum> {
        match self {
            Self::Crc32 => Box::new(Crc32::default()),
            Self::Crc32c => Box::new(Crc32c::default()),
            Self::Crc64Nvme => Box::new(Crc64Nvme::default()),
            Self::Sha1 => Box::new(Sha1::default()),
            Self::Sha256 => Box::new(Sha256::default()),
            Self::Md5 => Box::new(Md5::default()),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Crc64Nvme => "CRC64NVME",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Md5 => "MD5",
        };
        f.write_str(s)
    }
}

/// An incrementally updated checksum
pub trait Checksum: Send {
    fn update(&mut self, data: &[u8]);

    /// Clears the accumulated state.
    fn reset(&mut self);

    /// Digest of everything accumulated so far, big-endian for CRCs.
    #[must_use]
    fn digest(&self) -> Vec<u8>;
}

pub struct Crc32(crc_fast::Digest);

impl Default for Crc32 {
    fn default() -> Self {
        Self(crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc32IsoHdlc))
    }
}

impl Checksum for Crc32 {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        self.0.finalize().truncating_cast::<u32>().to_be_bytes().to_vec()
    }
}

pub struct Crc32c(crc_fast::Digest);

impl Default for Crc32c {
    fn default() -> Self {
        Self(crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc32Iscsi))
    }
}

impl Checksum for Crc32c {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        self.0.finalize().truncating_cast::<u32>().to_be_bytes().to_vec()
    }
}

pub struct Crc64Nvme(crc_fast::Digest);

impl Default for Crc64Nvme {
    fn default() -> Self {
        Self(crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc64Nvme))
    }
}

impl Checksum for Crc64Nvme {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        self.0.finalize().to_be_bytes().to_vec()
    }
}

#[derive(Default)]
pub struct Sha1(sha1::Sha1);

impl Checksum for Sha1 {
    fn update(&mut self, data: &[u8]) {
        use sha1::Digest as _;
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        use sha1::Digest as _;
        self.0.clone().finalize().to_vec()
    }
}

#[derive(Default)]
pub struct Sha256(sha2::Sha256);

impl Checksum for Sha256 {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest as _;
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        use sha2::Digest as _;
        self.0.clone().finalize().to_vec()
    }
}

#[derive(Default)]
pub struct Md5(md5::Md5);

impl Checksum for Md5 {
    fn update(&mut self, data: &[u8]) {
        use md5::Digest as _;
        self.0.update(data);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn digest(&self) -> Vec<u8> {
        use md5::Digest as _;
        self.0.clone().finalize().to_vec()
    }
}

/// A live checksum shared between the payload adapter that feeds it and the
/// trailer provider that reads it.
#[derive(Clone)]
pub struct SharedChecksum {
    algorithm: ChecksumAlgorithm,
    inner: Arc<Mutex<Box<dyn Checksum>>>,
}

impl fmt::Debug for SharedChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedChecksum")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SharedChecksum {
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self::from_checksum(algorithm, algorithm.new_checksum())
    }

    /// Wraps an existing checksum implementation.
    #[must_use]
    pub fn from_checksum(algorithm: ChecksumAlgorithm, checksum: Box<dyn Checksum>) -> Self {
        Self {
            algorithm,
            inner: Arc::new(Mutex::new(checksum)),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn update(&self, data: &[u8]) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).update(data);
    }

    pub fn reset(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).reset();
    }

    #[must_use]
    pub fn digest(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).digest()
    }
}
