use super::frame::{write_chunk, write_chunk_header, write_trailer_block};
use super::{ChunkExtension, ChunkExtensionProvider, ChunkHeader, HexLength, Trailer, TrailerProvider};

use crate::config::ChunkedEncodingConfig;
use crate::error::{ChunkedEncodingError, ConfigError};

use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace};

/// The pluggable parts of an encoder, owned by the stream that uses them
pub struct Providers {
    header: Box<dyn ChunkHeader>,
    extensions: Vec<Box<dyn ChunkExtensionProvider>>,
    trailers: Vec<Box<dyn TrailerProvider>>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            header: Box::new(HexLength),
            extensions: Vec::new(),
            trailers: Vec::new(),
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("extensions", &self.extensions.len())
            .field("trailers", &self.trailers.len())
            .finish_non_exhaustive()
    }
}

impl Providers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the chunk length formatter ([`HexLength`] by default)
    #[must_use]
    pub fn header(mut self, header: impl ChunkHeader + 'static) -> Self {
        self.header = Box::new(header);
        self
    }

    /// Appends an extension provider
    #[must_use]
    pub fn extension(mut self, provider: impl ChunkExtensionProvider + 'static) -> Self {
        self.extensions.push(Box::new(provider));
        self
    }

    /// Appends a trailer provider
    #[must_use]
    pub fn trailer(mut self, provider: impl TrailerProvider + 'static) -> Self {
        self.trailers.push(Box::new(provider));
        self
    }

    #[must_use]
    pub fn has_trailers(&self) -> bool {
        !self.trailers.is_empty()
    }
}

/// Framing state for one encoded stream
pub struct ChunkEncoder {
    chunk_size: usize,
    add_empty_trailing_chunk: bool,
    providers: Providers,
    chunks: usize,
    finished: bool,
}

impl fmt::Debug for ChunkEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkEncoder")
            .field("chunk_size", &self.chunk_size)
            .field("add_empty_trailing_chunk", &self.add_empty_trailing_chunk)
            .field("providers", &self.providers)
            .field("chunks", &self.chunks)
            .field("finished", &self.finished)
            .finish()
    }
}

impl ChunkEncoder {
    /// # Errors
    /// Returns [`ConfigError`] if the chunk size is zero, or if trailers are
    /// registered while the terminal chunk is disabled.
    pub fn new(config: &ChunkedEncodingConfig, providers: Providers) -> Result<Self, ConfigError> {
        config.validate()?;
        if !config.add_empty_trailing_chunk && providers.has_trailers() {
            return Err(ConfigError::TrailersRequireTerminalChunk);
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            add_empty_trailing_chunk: config.add_empty_trailing_chunk,
            providers,
            chunks: 0,
            finished: false,
        })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of data chunks encoded so far
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn extensions(&mut self, chunk: &[u8]) -> Result<Vec<ChunkExtension>, ChunkedEncodingError> {
        let mut ans = Vec::with_capacity(self.providers.extensions.len());
        for provider in &mut self.providers.extensions {
            match provider.extension(chunk) {
                Ok(ext) => ans.push(ext),
                Err(e) => {
                    self.finished = true;
                    return Err(ChunkedEncodingError::Provider(e));
                }
            }
        }
        Ok(ans)
    }

    /// Frames one data chunk.
    ///
    /// `chunk` must not be empty; the empty chunk is written by [`finish`](Self::finish).
    ///
    /// # Errors
    /// Returns [`ChunkedEncodingError::Provider`] if an extension provider
    /// fails, and [`ChunkedEncodingError::Finished`] after the stream has
    /// ended or failed.
    pub fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Bytes, ChunkedEncodingError> {
        if self.finished {
            return Err(ChunkedEncodingError::Finished);
        }
        debug_assert!(!chunk.is_empty() && chunk.len() <= self.chunk_size);

        let extensions = self.extensions(chunk)?;

        let mut out = Vec::with_capacity(chunk.len() + 128);
        write_chunk(&*self.providers.header, chunk, &extensions, &mut out);

        self.chunks += 1;
        trace!(index = self.chunks, len = chunk.len(), "encoded chunk");

        Ok(out.into())
    }

    /// Frames the terminal chunk, the trailer lines and the closing CRLF.
    ///
    /// Returns `None` when the terminal chunk is disabled. Trailer providers
    /// run here, once.
    ///
    /// # Errors
    /// Returns [`ChunkedEncodingError::Provider`] if a provider fails, and
    /// [`ChunkedEncodingError::Finished`] if called more than once.
    pub fn finish(&mut self) -> Result<Option<Bytes>, ChunkedEncodingError> {
        if self.finished {
            return Err(ChunkedEncodingError::Finished);
        }
        if !self.add_empty_trailing_chunk {
            self.finished = true;
            debug!(chunks = self.chunks, "terminal chunk suppressed");
            return Ok(None);
        }

        let extensions = self.extensions(&[])?;
        self.finished = true;

        let mut trailers: Vec<Trailer> = Vec::with_capacity(self.providers.trailers.len());
        for provider in &mut self.providers.trailers {
            let trailer = provider.trailer(&trailers).map_err(ChunkedEncodingError::Provider)?;
            trailers.push(trailer);
        }

        let mut out = Vec::with_capacity(128);
        write_chunk_header(&*self.providers.header, 0, &extensions, &mut out);
        write_trailer_block(&trailers, &mut out);

        debug!(chunks = self.chunks, trailers = trailers.len(), "encoded terminal chunk");

        Ok(Some(out.into()))
    }
}
