use super::{ChecksumAlgorithm, SharedChecksum};

use crate::encoding::{Trailer, TrailerProvider};
use crate::error::StdError;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tracing::debug;

/// Request-scoped store of finalized checksum digests.
///
/// Once a digest is cached for an algorithm, readers get the cached bytes
/// and the live checksum is left alone.
#[derive(Debug, Default)]
pub struct ChecksumCache {
    values: Mutex<HashMap<ChecksumAlgorithm, Bytes>>,
}

impl ChecksumCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, algorithm: ChecksumAlgorithm) -> Option<Bytes> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&algorithm)
            .cloned()
    }

    pub fn put(&self, algorithm: ChecksumAlgorithm, digest: impl Into<Bytes>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(algorithm, digest.into());
    }
}

/// Trailer provider emitting `<checksum-header>:<base64 digest>`.
///
/// The digest is read from the cache when present. Otherwise the live
/// checksum is read once and the result is cached.
#[derive(Debug)]
pub struct ChecksumTrailerProvider {
    checksum: SharedChecksum,
    header_name: String,
    cache: Arc<ChecksumCache>,
}

impl ChecksumTrailerProvider {
    #[must_use]
    pub fn new(checksum: SharedChecksum, cache: Arc<ChecksumCache>) -> Self {
        let header_name = checksum.algorithm().header_name().to_owned();
        Self {
            checksum,
            header_name,
            cache,
        }
    }

    /// Overrides the trailer name
    #[must_use]
    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    /// Returns the base64-encoded digest, computing and caching it on first use.
    #[must_use]
    pub fn get(&self) -> String {
        let algorithm = self.checksum.algorithm();
        let digest = if let Some(cached) = self.cache.get(algorithm) {
            debug!(%algorithm, "using cached payload checksum");
            cached
        } else {
            let digest = Bytes::from(self.checksum.digest());
            self.cache.put(algorithm, digest.clone());
            digest
        };
        base64_simd::STANDARD.encode_to_string(&digest)
    }
}

impl TrailerProvider for ChecksumTrailerProvider {
    fn trailer(&mut self, _preceding: &[Trailer]) -> Result<Trailer, StdError> {
        Ok(Trailer::single(self.header_name.clone(), self.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChecksum {
        digests: Arc<AtomicUsize>,
    }

    impl Checksum for CountingChecksum {
        fn update(&mut self, _data: &[u8]) {}

        fn reset(&mut self) {}

        fn digest(&self) -> Vec<u8> {
            self.digests.fetch_add(1, Ordering::SeqCst);
            vec![0xa0, 0xbf, 0x9a, 0xfe]
        }
    }

    fn counting(digests: &Arc<AtomicUsize>) -> SharedChecksum {
        let checksum = CountingChecksum {
            digests: Arc::clone(digests),
        };
        SharedChecksum::from_checksum(ChecksumAlgorithm::Crc32, Box::new(checksum))
    }

    #[test]
    fn cache_get_put() {
        let cache = ChecksumCache::new();
        assert!(cache.get(ChecksumAlgorithm::Sha256).is_none());
        cache.put(ChecksumAlgorithm::Sha256, vec![1, 2, 3]);
        assert_eq!(cache.get(ChecksumAlgorithm::Sha256).unwrap().as_ref(), &[1, 2, 3]);
        assert!(cache.get(ChecksumAlgorithm::Crc32).is_none());
    }

    #[test]
    fn provider_reads_live_checksum_once() {
        let digests = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ChecksumCache::new());
        let provider = ChecksumTrailerProvider::new(counting(&digests), Arc::clone(&cache));

        let first = provider.get();
        let second = provider.get();

        assert_eq!(first, "oL+a/g==");
        assert_eq!(first, second);
        assert_eq!(digests.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(ChecksumAlgorithm::Crc32).unwrap().as_ref(), &[0xa0, 0xbf, 0x9a, 0xfe]);
    }

    #[test]
    fn provider_prefers_cached_digest() {
        let digests = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ChecksumCache::new());
        cache.put(ChecksumAlgorithm::Crc32, vec![0, 0, 0, 0]);

        let mut provider = ChecksumTrailerProvider::new(counting(&digests), cache);
        let trailer = provider.trailer(&[]).unwrap();

        assert_eq!(trailer, Trailer::single("x-amz-checksum-crc32", "AAAAAA=="));
        assert_eq!(digests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_does_not_clear_cache() {
        let cache = Arc::new(ChecksumCache::new());
        let checksum = SharedChecksum::new(ChecksumAlgorithm::Crc32);
        checksum.update(b"{\"TableName\": \"foo\"}");

        let provider = ChecksumTrailerProvider::new(checksum.clone(), Arc::clone(&cache));
        assert_eq!(provider.get(), "oL+a/g==");

        checksum.reset();
        assert_eq!(provider.get(), "oL+a/g==");
    }

    #[test]
    fn custom_header_name() {
        let cache = Arc::new(ChecksumCache::new());
        let mut provider =
            ChecksumTrailerProvider::new(SharedChecksum::new(ChecksumAlgorithm::Crc32), cache).with_header_name("x-checksum");
        assert_eq!(provider.trailer(&[]).unwrap().name, "x-checksum");
    }
}
