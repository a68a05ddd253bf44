//! aws-chunked payload signing
//!
//! [`AwsChunkedPayloadSigner::before_signing`] rewrites the request headers
//! for an aws-chunked body and returns a [`PayloadPlan`].
//! [`AwsChunkedPayloadSigner::sign`] and
//! [`AwsChunkedPayloadSigner::sign_stream`] then encode the payload according
//! to that plan.
//!
//! Trailers are written in this order: the trailers lifted from the request
//! headers, the checksum trailer, the trailer signature.

mod length;
pub use self::length::{encoded_content_length, trailer_block_length, trailer_line_length};

use crate::checksum::{ChecksumAlgorithm, ChecksumCache, ChecksumReader, ChecksumStream, ChecksumTrailerProvider, SharedChecksum};
use crate::config::{ChunkedConfigProvider, ChunkedEncodingConfig};
use crate::encoding::{ChunkedEncodedPublisher, ChunkedEncodedReader, Providers, Trailer};
use crate::error::{ConfigError, SignerError, StdError};
use crate::header::{
    AWS_CHUNKED, CONTENT_ENCODING, CONTENT_LENGTH, X_AMZ_CONTENT_SHA256, X_AMZ_DECODED_CONTENT_LENGTH,
    X_AMZ_TRAILER, X_AMZ_TRAILER_SIGNATURE,
};
use crate::sig_v4::{
    ChunkSigningKey, CredentialScope, RollingSigner, STREAMING_ECDSA_SIGNED_PAYLOAD, STREAMING_ECDSA_SIGNED_PAYLOAD_TRAILER,
    STREAMING_SIGNED_PAYLOAD, STREAMING_SIGNED_PAYLOAD_TRAILER, STREAMING_UNSIGNED_PAYLOAD_TRAILER, SigV4ChunkExtension,
    SigV4TrailerSignature, SigningAlgorithm,
};

use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use transform_stream::AsyncTryStream;

/// `x-amz-content-sha256` streaming modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamingMode {
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    SignedPayload,
    /// `STREAMING-UNSIGNED-PAYLOAD-TRAILER`
    UnsignedPayloadTrailer,
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER`
    SignedPayloadTrailer,
    /// `STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD`
    EcdsaSignedPayload,
    /// `STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD-TRAILER`
    EcdsaSignedPayloadTrailer,
}

impl StreamingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignedPayload => STREAMING_SIGNED_PAYLOAD,
            Self::UnsignedPayloadTrailer => STREAMING_UNSIGNED_PAYLOAD_TRAILER,
            Self::SignedPayloadTrailer => STREAMING_SIGNED_PAYLOAD_TRAILER,
            Self::EcdsaSignedPayload => STREAMING_ECDSA_SIGNED_PAYLOAD,
            Self::EcdsaSignedPayloadTrailer => STREAMING_ECDSA_SIGNED_PAYLOAD_TRAILER,
        }
    }

    /// The algorithm signing chunks, or `None` for unsigned chunks
    #[must_use]
    pub const fn algorithm(self) -> Option<SigningAlgorithm> {
        match self {
            Self::SignedPayload | Self::SignedPayloadTrailer => Some(SigningAlgorithm::HmacSha256),
            Self::EcdsaSignedPayload | Self::EcdsaSignedPayloadTrailer => Some(SigningAlgorithm::EcdsaP256Sha256),
            Self::UnsignedPayloadTrailer => None,
        }
    }

    /// Whether chunks carry `chunk-signature`
    #[must_use]
    pub const fn is_signed(self) -> bool {
        self.algorithm().is_some()
    }

    /// Whether trailers follow the terminal chunk
    #[must_use]
    pub const fn has_trailer(self) -> bool {
        matches!(
            self,
            Self::UnsignedPayloadTrailer | Self::SignedPayloadTrailer | Self::EcdsaSignedPayloadTrailer
        )
    }

    /// Whether `x-amz-trailer-signature` ends the trailers
    #[must_use]
    pub const fn signs_trailers(self) -> bool {
        matches!(self, Self::SignedPayloadTrailer | Self::EcdsaSignedPayloadTrailer)
    }

    /// Bytes added to every chunk header by the chunk signature
    #[must_use]
    pub const fn extension_len(self) -> usize {
        match self.algorithm() {
            Some(algorithm) => algorithm.chunk_extension_len(),
            None => 0,
        }
    }

    /// Length of the `x-amz-trailer-signature` line, or zero
    #[must_use]
    pub fn trailer_signature_len(self) -> u64 {
        match self.algorithm() {
            Some(algorithm) if self.signs_trailers() => {
                trailer_line_length(X_AMZ_TRAILER_SIGNATURE, algorithm.signature_len())
            }
            _ => 0,
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamingMode {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STREAMING_SIGNED_PAYLOAD => Ok(Self::SignedPayload),
            STREAMING_UNSIGNED_PAYLOAD_TRAILER => Ok(Self::UnsignedPayloadTrailer),
            STREAMING_SIGNED_PAYLOAD_TRAILER => Ok(Self::SignedPayloadTrailer),
            STREAMING_ECDSA_SIGNED_PAYLOAD => Ok(Self::EcdsaSignedPayload),
            STREAMING_ECDSA_SIGNED_PAYLOAD_TRAILER => Ok(Self::EcdsaSignedPayloadTrailer),
            _ => Err(SignerError::UnsupportedMode(s.to_owned())),
        }
    }
}

/// Everything [`AwsChunkedPayloadSigner::before_signing`] decided for one request
#[derive(Debug, Clone)]
pub struct PayloadPlan {
    config: Arc<ChunkedEncodingConfig>,
    mode: StreamingMode,
    decoded_content_length: u64,
    encoded_content_length: u64,
    trailers: Vec<Trailer>,
    checksum: Option<ChecksumAlgorithm>,
    cache: Arc<ChecksumCache>,
}

impl PayloadPlan {
    #[must_use]
    pub fn config(&self) -> &ChunkedEncodingConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> StreamingMode {
        self.mode
    }

    #[must_use]
    pub fn decoded_content_length(&self) -> u64 {
        self.decoded_content_length
    }

    #[must_use]
    pub fn encoded_content_length(&self) -> u64 {
        self.encoded_content_length
    }

    /// Trailers lifted from the request headers
    #[must_use]
    pub fn trailers(&self) -> &[Trailer] {
        &self.trailers
    }

    #[must_use]
    pub fn checksum(&self) -> Option<ChecksumAlgorithm> {
        self.checksum
    }

    /// The checksum cache of this request, shared by every signing of the plan
    #[must_use]
    pub fn cache(&self) -> &Arc<ChecksumCache> {
        &self.cache
    }
}

/// Signing inputs that come from the request signer
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub scope: Arc<CredentialScope>,
    /// [`SigningKey`](crate::sig_v4::SigningKey) or [`EcdsaSigningKey`](crate::sig_v4::EcdsaSigningKey)
    pub signing_key: Arc<dyn ChunkSigningKey>,
    /// Signature of the request headers, the first link of the chain
    pub seed_signature: Box<str>,
}

impl SigningContext {
    #[must_use]
    pub fn new(scope: CredentialScope, signing_key: impl ChunkSigningKey, seed_signature: impl Into<Box<str>>) -> Self {
        Self {
            scope: Arc::new(scope),
            signing_key: Arc::new(signing_key),
            seed_signature: seed_signature.into(),
        }
    }
}

/// Prepares and encodes aws-chunked request bodies
pub struct AwsChunkedPayloadSigner {
    config: Arc<dyn ChunkedConfigProvider>,
    checksum: Option<ChecksumAlgorithm>,
    cache: Option<Arc<ChecksumCache>>,
}

impl fmt::Debug for AwsChunkedPayloadSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsChunkedPayloadSigner")
            .field("checksum", &self.checksum)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AwsChunkedPayloadSigner {
    #[must_use]
    pub fn new(config: Arc<dyn ChunkedConfigProvider>) -> Self {
        Self {
            config,
            checksum: None,
            cache: None,
        }
    }

    /// Adds a checksum trailer computed with `algorithm`
    #[must_use]
    pub fn with_checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum = Some(algorithm);
        self
    }

    /// Shares a checksum cache with other stages of the same request.
    ///
    /// Without it every [`before_signing`](Self::before_signing) starts a new cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ChecksumCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Rewrites `headers` for an aws-chunked body.
    ///
    /// `payload_len` is used when the request has no `content-length`.
    ///
    /// # Errors
    /// Returns [`SignerError`] if the payload length is unknown, a header named
    /// by `x-amz-trailer` is missing, a header value is invalid, or the
    /// configuration is rejected.
    pub fn before_signing(
        &self,
        headers: &mut HeaderMap,
        mode: StreamingMode,
        payload_len: Option<u64>,
    ) -> Result<PayloadPlan, SignerError> {
        let config = self.config.snapshot();
        config.validate()?;

        let decoded_content_length = match headers.remove(CONTENT_LENGTH) {
            Some(val) => val
                .to_str()?
                .trim()
                .parse::<u64>()
                .map_err(|_| SignerError::InvalidContentLength)?,
            None => payload_len.ok_or(SignerError::MissingContentLength)?,
        };

        let (trailers, checksum) = if mode.has_trailer() {
            let trailers = lift_trailers(headers)?;
            let checksum = self.checksum;
            let mut names: Vec<String> = trailers.iter().map(|t| t.name.clone()).collect();
            if let Some(algorithm) = checksum {
                let name = algorithm.header_name();
                if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    names.push(name.to_owned());
                }
            }
            if names.is_empty() {
                headers.remove(X_AMZ_TRAILER);
            } else {
                headers.insert(X_AMZ_TRAILER, HeaderValue::try_from(names.join(","))?);
            }
            (trailers, checksum)
        } else {
            (Vec::new(), None)
        };

        let has_trailers = !trailers.is_empty() || checksum.is_some() || mode.signs_trailers();
        if has_trailers && !config.add_empty_trailing_chunk {
            return Err(ConfigError::TrailersRequireTerminalChunk.into());
        }

        let encoded_content_length = {
            let chunk_size = u64::try_from(config.chunk_size).unwrap_or(u64::MAX);
            let extension_len = u64::try_from(mode.extension_len()).unwrap_or(u64::MAX);
            let add_terminal = config.add_empty_trailing_chunk;
            let mut len = encoded_content_length(decoded_content_length, chunk_size, extension_len, add_terminal);
            if config.add_empty_trailing_chunk {
                len += trailer_block_length(&trailers);
                if let Some(algorithm) = checksum {
                    len += trailer_line_length(algorithm.header_name(), algorithm.encoded_len());
                }
                len += mode.trailer_signature_len();
            }
            len
        };

        headers.insert(X_AMZ_CONTENT_SHA256, HeaderValue::from_static(mode.as_str()));
        headers.insert(X_AMZ_DECODED_CONTENT_LENGTH, HeaderValue::from(decoded_content_length));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(encoded_content_length));
        // SigV4a requests are not marked aws-chunked
        if mode.algorithm() != Some(SigningAlgorithm::EcdsaP256Sha256) {
            add_content_encoding(headers)?;
        }

        debug!(%mode, decoded_content_length, encoded_content_length, trailers = trailers.len(), "prepared aws-chunked payload");

        Ok(PayloadPlan {
            config,
            mode,
            decoded_content_length,
            encoded_content_length,
            trailers,
            checksum,
            cache: self.cache.clone().unwrap_or_default(),
        })
    }

    /// Returns the checksum to feed while encoding, or `None` when the cache
    /// already holds the digest.
    fn live_checksum(plan: &PayloadPlan) -> Option<SharedChecksum> {
        let algorithm = plan.checksum?;
        if plan.cache.get(algorithm).is_some() {
            debug!(%algorithm, "payload checksum already cached");
            return None;
        }
        Some(SharedChecksum::new(algorithm))
    }

    fn providers(plan: &PayloadPlan, ctx: &SigningContext, checksum: Option<SharedChecksum>) -> Result<Providers, SignerError> {
        let mut providers = Providers::new();

        let signer = match plan.mode.algorithm() {
            Some(expected) => {
                let found = ctx.signing_key.algorithm();
                if found != expected {
                    return Err(SignerError::KeyMismatch { expected, found });
                }
                Some(Arc::new(RollingSigner::new(Arc::clone(&ctx.signing_key), ctx.seed_signature.clone())))
            }
            None => None,
        };

        if let Some(signer) = &signer {
            providers = providers.extension(SigV4ChunkExtension::new(Arc::clone(signer), Arc::clone(&ctx.scope)));
        }

        for trailer in &plan.trailers {
            providers = providers.trailer(trailer.clone());
        }

        if let Some(algorithm) = plan.checksum {
            let checksum = checksum.unwrap_or_else(|| SharedChecksum::new(algorithm));
            providers = providers.trailer(ChecksumTrailerProvider::new(checksum, Arc::clone(&plan.cache)));
        }

        if let Some(signer) = signer.filter(|_| plan.mode.signs_trailers()) {
            providers = providers.trailer(SigV4TrailerSignature::new(signer, Arc::clone(&ctx.scope)));
        }

        Ok(providers)
    }

    /// Encodes `source` into a blocking reader.
    ///
    /// At most the decoded content length is read from `source`. Every call
    /// starts a new signature chain from the seed signature.
    ///
    /// # Errors
    /// Returns [`SignerError::Config`] if the plan's configuration is rejected,
    /// or [`SignerError::KeyMismatch`] if the key does not fit the mode
    #[allow(clippy::unused_self)] // request state lives in the plan
    pub fn sign<'a, R>(
        &self,
        plan: &PayloadPlan,
        ctx: &SigningContext,
        source: R,
    ) -> Result<ChunkedEncodedReader<Box<dyn Read + Send + 'a>>, SignerError>
    where
        R: Read + Send + 'a,
    {
        let checksum = Self::live_checksum(plan);
        let providers = Self::providers(plan, ctx, checksum.clone())?;
        let source = source.take(plan.decoded_content_length);
        let source: Box<dyn Read + Send + 'a> = match checksum {
            Some(checksum) => Box::new(ChecksumReader::new(source, checksum)),
            None => Box::new(source),
        };
        Ok(ChunkedEncodedReader::new(source, &plan.config, providers)?)
    }

    /// Encodes `upstream` into an async publisher.
    ///
    /// The decoded content length is the truncation budget. Only bytes within
    /// the budget reach the checksum. Every call starts a new signature chain
    /// from the seed signature.
    ///
    /// # Errors
    /// Returns [`SignerError::Config`] if the plan's configuration is rejected,
    /// or [`SignerError::KeyMismatch`] if the key does not fit the mode
    #[allow(clippy::unused_self)] // request state lives in the plan
    pub fn sign_stream<S, E>(
        &self,
        plan: &PayloadPlan,
        ctx: &SigningContext,
        upstream: S,
    ) -> Result<ChunkedEncodedPublisher, SignerError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StdError> + Send + 'static,
    {
        let checksum = Self::live_checksum(plan);
        let budget = Some(plan.decoded_content_length);
        let providers = Self::providers(plan, ctx, checksum.clone())?;
        let publisher = match checksum {
            Some(checksum) => {
                let upstream = ChecksumStream::new(limit_stream(upstream, plan.decoded_content_length), checksum);
                ChunkedEncodedPublisher::new(upstream, budget, &plan.config, providers)?
            }
            None => ChunkedEncodedPublisher::new(upstream, budget, &plan.config, providers)?,
        };
        Ok(publisher)
    }
}

/// Yields at most `limit` bytes of `stream`, then ends without polling it again.
fn limit_stream<S, E>(stream: S, limit: u64) -> impl Stream<Item = Result<Bytes, E>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    AsyncTryStream::<Bytes, E, _>::new(move |mut y| async move {
        pin_mut!(stream);
        let mut remaining = limit;
        while remaining > 0 {
            let Some(result) = stream.next().await else { break };
            let mut bytes = result?;
            if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > remaining {
                bytes.truncate(usize::try_from(remaining).unwrap_or(usize::MAX));
            }
            remaining -= u64::try_from(bytes.len()).unwrap_or(remaining);
            y.yield_ok(bytes).await;
        }
        Ok(())
    })
}

/// Removes every header named by `x-amz-trailer` and returns them as trailers.
fn lift_trailers(headers: &mut HeaderMap) -> Result<Vec<Trailer>, SignerError> {
    let Some(declared) = headers.get(X_AMZ_TRAILER) else { return Ok(Vec::new()) };
    let declared = declared.to_str()?.to_owned();

    let mut trailers = Vec::new();
    for name in declared.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| SignerError::MissingTrailerHeader(name.to_owned()))?;
        let values = headers
            .get_all(&header_name)
            .iter()
            .map(|v| v.to_str().map(str::to_owned))
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Err(SignerError::MissingTrailerHeader(name.to_owned()));
        }
        headers.remove(&header_name);
        trailers.push(Trailer::new(header_name.as_str(), values));
    }
    Ok(trailers)
}

/// Puts `aws-chunked` first in `content-encoding`.
fn add_content_encoding(headers: &mut HeaderMap) -> Result<(), SignerError> {
    let value = match headers.get(CONTENT_ENCODING) {
        None => HeaderValue::from_static(AWS_CHUNKED),
        Some(existing) => {
            let existing = existing.to_str()?;
            if existing.split(',').any(|e| e.trim().eq_ignore_ascii_case(AWS_CHUNKED)) {
                return Ok(());
            }
            HeaderValue::try_from(format!("{AWS_CHUNKED},{existing}"))?
        }
    };
    headers.insert(CONTENT_ENCODING, value);
    Ok(())
}
