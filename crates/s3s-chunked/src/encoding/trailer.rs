use crate::error::StdError;

/// A trailing header line: `name:value1,value2,...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub name: String,
    pub values: Vec<String>,
}

impl Trailer {
    #[must_use]
    pub fn new<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.name.as_bytes());
        out.push(b':');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend_from_slice(value.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
    }

    /// Length of the trailer line including its CRLF
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let values: usize = self.values.iter().map(String::len).sum();
        let commas = self.values.len().saturating_sub(1);
        self.name.len() + 1 + values + commas + 2
    }
}

/// Produces one trailer after the terminal chunk.
///
/// Each provider is invoked exactly once per encoded stream, in registration
/// order. `preceding` holds the trailers produced by earlier providers.
pub trait TrailerProvider: Send {
    /// # Errors
    /// A failure aborts the encoded stream before the trailer block is emitted
    fn trailer(&mut self, preceding: &[Trailer]) -> Result<Trailer, StdError>;
}

impl TrailerProvider for Trailer {
    fn trailer(&mut self, _preceding: &[Trailer]) -> Result<Trailer, StdError> {
        Ok(self.clone())
    }
}

/// [`TrailerProvider`] backed by a closure
pub struct FnTrailer<F>(F);

/// Wraps a closure as a [`TrailerProvider`]
#[must_use]
pub fn trailer_fn<F>(f: F) -> FnTrailer<F>
where
    F: FnMut(&[Trailer]) -> Result<Trailer, StdError> + Send,
{
    FnTrailer(f)
}

impl<F> TrailerProvider for FnTrailer<F>
where
    F: FnMut(&[Trailer]) -> Result<Trailer, StdError> + Send,
{
    fn trailer(&mut self, preceding: &[Trailer]) -> Result<Trailer, StdError> {
        (self.0)(preceding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_matches_written_bytes() {
        for trailer in [
            Trailer::single("x-amz-checksum-crc32", "oL+a/g=="),
            Trailer::new("foo", ["bar1", "bar2", "bar3"]),
            Trailer::new("empty", Vec::<String>::new()),
        ] {
            let mut out = Vec::new();
            trailer.write_to(&mut out);
            assert_eq!(out.len(), trailer.encoded_len());
        }
    }

    #[test]
    fn multiple_values_joined_with_comma() {
        let mut out = Vec::new();
        Trailer::new("foo", ["bar1", "bar2", "bar3"]).write_to(&mut out);
        assert_eq!(out, b"foo:bar1,bar2,bar3\r\n");
    }

    #[test]
    fn closure_sees_preceding() {
        let mut provider = trailer_fn(|preceding: &[Trailer]| Ok(Trailer::single("count", preceding.len().to_string())));
        let trailer = provider.trailer(&[Trailer::single("a", "1")]).unwrap();
        assert_eq!(trailer, Trailer::single("count", "1"));
    }
}
