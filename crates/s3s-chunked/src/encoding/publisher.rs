use super::{ChunkEncoder, Providers};

use crate::config::ChunkedEncodingConfig;
use crate::error::{ChunkedEncodingError, ConfigError, StdError};

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::pin_mut;
use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use transform_stream::AsyncTryStream;

/// Async aws-chunked encoder over a byte stream.
///
/// Every data chunk is one element. The terminal chunk, the trailer lines and
/// the closing CRLF form the last element. Upstream is polled only when the
/// consumer polls.
pub struct ChunkedEncodedPublisher {
    inner: AsyncTryStream<Bytes, ChunkedEncodingError, BoxFuture<'static, Result<(), ChunkedEncodingError>>>,
}

impl fmt::Debug for ChunkedEncodedPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedEncodedPublisher").finish_non_exhaustive()
    }
}

impl ChunkedEncodedPublisher {
    /// Constructs a publisher.
    ///
    /// With `content_length`, at most that many payload bytes are encoded and
    /// any excess from upstream is dropped. Without it, everything is encoded.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the configuration or providers are invalid
    pub fn new<S, E>(
        upstream: S,
        content_length: Option<u64>,
        config: &ChunkedEncodingConfig,
        providers: Providers,
    ) -> Result<Self, ConfigError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StdError> + Send + 'static,
    {
        let mut encoder = ChunkEncoder::new(config, providers)?;

        let inner = AsyncTryStream::<_, _, BoxFuture<'static, Result<(), ChunkedEncodingError>>>::new(|mut y| {
            #[allow(clippy::shadow_same)] // necessary for `pin_mut!`
            Box::pin(async move {
                pin_mut!(upstream);

                let chunk_size = encoder.chunk_size();
                let mut remaining = content_length;
                let mut buf = BytesMut::with_capacity(chunk_size);
                let mut leftover = Bytes::new();
                let mut upstream_done = false;

                loop {
                    while buf.len() < chunk_size && remaining != Some(0) {
                        if leftover.is_empty() {
                            if upstream_done {
                                break;
                            }
                            match upstream.next().await {
                                None => upstream_done = true,
                                Some(Err(e)) => return Err(ChunkedEncodingError::Upstream(e.into())),
                                Some(Ok(bytes)) => leftover = bytes,
                            }
                            continue;
                        }

                        let mut take = leftover.len().min(chunk_size - buf.len());
                        if let Some(rem) = remaining.as_mut() {
                            take = take.min(usize::try_from(*rem).unwrap_or(usize::MAX));
                            *rem -= u64::try_from(take).unwrap_or(u64::MAX).min(*rem);
                        }
                        buf.extend_from_slice(&leftover.split_to(take));
                    }

                    if buf.is_empty() {
                        break;
                    }

                    let bytes = encoder.encode_chunk(&buf)?;
                    buf.clear();
                    y.yield_ok(bytes).await;
                }

                if remaining == Some(0) && !leftover.is_empty() {
                    debug!(dropped = leftover.len(), "payload truncated at content length");
                }
                drop(leftover);
                drop(buf);

                if let Some(bytes) = encoder.finish()? {
                    y.yield_ok(bytes).await;
                }

                Ok(())
            })
        });

        Ok(Self { inner })
    }

    /// Drives the publisher on a tokio task.
    ///
    /// The task runs at most `capacity` elements ahead of the receiver. It
    /// stops after the first error, or when the receiver is cancelled or
    /// dropped.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime
    #[must_use]
    pub fn spawn(mut self, capacity: usize) -> ChunkedReceiver {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(async move {
            while let Some(item) = self.next().await {
                let is_err = item.is_err();
                if tx.send(item).await.is_err() {
                    debug!("chunked receiver dropped");
                    return;
                }
                if is_err {
                    return;
                }
            }
        });
        ChunkedReceiver {
            rx,
            task,
            cancelled: false,
        }
    }
}

impl Stream for ChunkedEncodedPublisher {
    type Item = Result<Bytes, ChunkedEncodingError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

/// The consuming end of [`ChunkedEncodedPublisher::spawn`]
#[derive(Debug)]
pub struct ChunkedReceiver {
    rx: mpsc::Receiver<Result<Bytes, ChunkedEncodingError>>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl ChunkedReceiver {
    /// Stops the publisher task. No element is delivered afterwards.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            debug!("chunked receiver cancelled");
            self.cancelled = true;
            self.task.abort();
            self.rx.close();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Stream for ChunkedReceiver {
    type Item = Result<Bytes, ChunkedEncodingError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for ChunkedReceiver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
