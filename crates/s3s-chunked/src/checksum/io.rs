use super::SharedChecksum;

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

/// A reader that feeds every byte it yields into a checksum
#[derive(Debug)]
pub struct ChecksumReader<R> {
    inner: R,
    checksum: SharedChecksum,
}

impl<R> ChecksumReader<R> {
    #[must_use]
    pub fn new(inner: R, checksum: SharedChecksum) -> Self {
        Self { inner, checksum }
    }

    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.checksum.update(&buf[..n]);
        Ok(n)
    }
}

pin_project_lite::pin_project! {
    /// A byte stream that feeds every chunk it yields into a checksum
    pub struct ChecksumStream<S> {
        #[pin]
        inner: S,
        checksum: SharedChecksum,
    }
}

impl<S> ChecksumStream<S> {
    #[must_use]
    pub fn new(inner: S, checksum: SharedChecksum) -> Self {
        Self { inner, checksum }
    }
}

impl<S, E> Stream for ChecksumStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        this.inner.poll_next(cx).map(|opt| {
            opt.map(|result| {
                result.inspect(|bytes| {
                    this.checksum.update(bytes);
                })
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
