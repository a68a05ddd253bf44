use super::{ChunkEncoder, Providers};

use crate::config::ChunkedEncodingConfig;
use crate::error::{ChunkedEncodingError, ConfigError};

use std::io::{self, Read};

use bytes::{Buf, Bytes};

/// A reader that yields the aws-chunked encoding of `inner`.
///
/// Upstream errors are returned as-is from the `read` call that hit them, and
/// the bytes buffered so far are kept, so a retried `read` continues where the
/// failed one stopped. Provider errors are wrapped in [`io::Error::other`]
/// and end the stream.
#[derive(Debug)]
pub struct ChunkedEncodedReader<R> {
    inner: R,
    encoder: ChunkEncoder,
    buf: Vec<u8>,
    filled: usize,
    pending: Bytes,
    upstream_done: bool,
    done: bool,
}

impl<R: Read> ChunkedEncodedReader<R> {
    /// # Errors
    /// Returns [`ConfigError`] if the configuration or providers are invalid
    pub fn new(inner: R, config: &ChunkedEncodingConfig, providers: Providers) -> Result<Self, ConfigError> {
        let encoder = ChunkEncoder::new(config, providers)?;
        Ok(Self {
            inner,
            buf: vec![0; encoder.chunk_size()],
            encoder,
            filled: 0,
            pending: Bytes::new(),
            upstream_done: false,
            done: false,
        })
    }

    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fills the chunk buffer, then frames it (or the terminal chunk) into `pending`.
    fn produce(&mut self) -> io::Result<()> {
        while !self.upstream_done && self.filled < self.buf.len() {
            match self.inner.read(&mut self.buf[self.filled..])? {
                0 => self.upstream_done = true,
                n => self.filled += n,
            }
        }

        if self.filled > 0 {
            self.pending = self.encoder.encode_chunk(&self.buf[..self.filled])?;
            self.filled = 0;
            return Ok(());
        }

        let terminal = self.encoder.finish()?;
        self.done = true;
        self.buf = Vec::new();
        if let Some(bytes) = terminal {
            self.pending = bytes;
        }
        Ok(())
    }
}

impl<R: Read> Read for ChunkedEncodedReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            if !self.pending.is_empty() {
                let n = out.len().min(self.pending.len());
                out[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok(n);
            }
            if self.done {
                return Ok(0);
            }
            self.produce()?;
        }
    }
}

impl From<ChunkedEncodingError> for io::Error {
    fn from(e: ChunkedEncodingError) -> Self {
        match e {
            ChunkedEncodingError::Upstream(e) => match e.downcast::<io::Error>() {
                Ok(e) => *e,
                Err(e) => io::Error::other(e),
            },
            e => io::Error::other(e),
        }
    }
}
