use crate::error::StdError;

use bytes::Bytes;

/// A `name[=value]` pair attached to a chunk header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkExtension {
    pub name: Bytes,
    pub value: Option<Bytes>,
}

impl ChunkExtension {
    #[must_use]
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// An extension without a value
    #[must_use]
    pub fn flag(name: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// `;name` or `;name=value`. An empty value is written without `=`.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b';');
        out.extend_from_slice(&self.name);
        if let Some(value) = self.value.as_ref().filter(|v| !v.is_empty()) {
            out.push(b'=');
            out.extend_from_slice(value);
        }
    }

    /// Number of bytes added to the chunk header
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let value_len = self.value.as_ref().map_or(0, |v| if v.is_empty() { 0 } else { 1 + v.len() });
        1 + self.name.len() + value_len
    }
}

/// Computes one extension per chunk.
///
/// Called once for every data chunk and once for the terminal chunk, in chunk
/// order, before the chunk is written.
pub trait ChunkExtensionProvider: Send {
    /// # Errors
    /// A failure aborts the encoded stream before the chunk is emitted
    fn extension(&mut self, chunk: &[u8]) -> Result<ChunkExtension, StdError>;
}

impl ChunkExtensionProvider for ChunkExtension {
    fn extension(&mut self, _chunk: &[u8]) -> Result<ChunkExtension, StdError> {
        Ok(self.clone())
    }
}

/// [`ChunkExtensionProvider`] backed by a closure
pub struct FnExtension<F>(F);

/// Wraps a closure as a [`ChunkExtensionProvider`]
#[must_use]
pub fn extension_fn<F>(f: F) -> FnExtension<F>
where
    F: FnMut(&[u8]) -> Result<ChunkExtension, StdError> + Send,
{
    FnExtension(f)
}

impl<F> ChunkExtensionProvider for FnExtension<F>
where
    F: FnMut(&[u8]) -> Result<ChunkExtension, StdError> + Send,
{
    fn extension(&mut self, chunk: &[u8]) -> Result<ChunkExtension, StdError> {
        (self.0)(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_matches_written_bytes() {
        for ext in [
            ChunkExtension::new("chunk-signature", "0".repeat(64)),
            ChunkExtension::flag("foo"),
            ChunkExtension::new("foo", ""),
        ] {
            let mut out = Vec::new();
            ext.write_to(&mut out);
            assert_eq!(out.len(), ext.encoded_len());
        }
        assert_eq!(ChunkExtension::new("chunk-signature", "0".repeat(64)).encoded_len(), 81);
    }

    #[test]
    fn closure_provider() {
        let mut provider = extension_fn(|chunk: &[u8]| Ok(ChunkExtension::new("len", chunk.len().to_string())));
        assert_eq!(provider.extension(b"abc").unwrap(), ChunkExtension::new("len", "3"));
    }
}
