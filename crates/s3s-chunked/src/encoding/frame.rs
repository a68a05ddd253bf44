use super::{ChunkExtension, Trailer};

use std::io::Write;

const CRLF: &[u8] = b"\r\n";

/// Formats the length token that starts a chunk header
pub trait ChunkHeader: Send + Sync {
    fn write_length(&self, len: usize, out: &mut Vec<u8>);
}

/// Lowercase hex without padding
#[derive(Debug, Clone, Copy, Default)]
pub struct HexLength;

impl ChunkHeader for HexLength {
    fn write_length(&self, len: usize, out: &mut Vec<u8>) {
        let _ = write!(out, "{len:x}");
    }
}

/// `<len>[;name[=value]]*\r\n`
pub fn write_chunk_header(header: &dyn ChunkHeader, len: usize, extensions: &[ChunkExtension], out: &mut Vec<u8>) {
    header.write_length(len, out);
    for ext in extensions {
        ext.write_to(out);
    }
    out.extend_from_slice(CRLF);
}

/// Header, payload and the closing CRLF of one data chunk
pub fn write_chunk(header: &dyn ChunkHeader, payload: &[u8], extensions: &[ChunkExtension], out: &mut Vec<u8>) {
    write_chunk_header(header, payload.len(), extensions, out);
    out.extend_from_slice(payload);
    out.extend_from_slice(CRLF);
}

/// Trailer lines followed by the CRLF that ends the body
pub fn write_trailer_block(trailers: &[Trailer], out: &mut Vec<u8>) {
    for trailer in trailers {
        trailer.write_to(out);
    }
    out.extend_from_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(len: usize, extensions: &[ChunkExtension]) -> Vec<u8> {
        let mut out = Vec::new();
        write_chunk_header(&HexLength, len, extensions, &mut out);
        out
    }

    #[test]
    fn hex_length_is_lowercase_unpadded() {
        assert_eq!(header(0, &[]), b"0\r\n");
        assert_eq!(header(3, &[]), b"3\r\n");
        assert_eq!(header(255, &[]), b"ff\r\n");
        assert_eq!(header(0x10000, &[]), b"10000\r\n");
    }

    #[test]
    fn hex_length_appends() {
        let mut out = b"prefix;".to_vec();
        HexLength.write_length(usize::MAX, &mut out);
        assert_eq!(out, format!("prefix;{:x}", usize::MAX).as_bytes());
    }

    #[test]
    fn extensions_in_order() {
        let exts = [ChunkExtension::new("foo", "bar"), ChunkExtension::flag("baz"), ChunkExtension::new("qux", "")];
        assert_eq!(header(10, &exts), b"a;foo=bar;baz;qux\r\n");
    }

    #[test]
    fn chunk_with_payload() {
        let mut out = Vec::new();
        write_chunk(&HexLength, b"abc", &[], &mut out);
        assert_eq!(out, b"3\r\nabc\r\n");
    }

    #[test]
    fn trailer_block() {
        let mut out = Vec::new();
        write_trailer_block(&[], &mut out);
        assert_eq!(out, b"\r\n");

        let mut out = Vec::new();
        let trailers = [Trailer::new("foo", ["bar1", "bar2", "bar3"]), Trailer::single("x", "1")];
        write_trailer_block(&trailers, &mut out);
        assert_eq!(out, b"foo:bar1,bar2,bar3\r\nx:1\r\n\r\n");
    }

    #[test]
    fn custom_header() {
        struct Decimal;
        impl ChunkHeader for Decimal {
            fn write_length(&self, len: usize, out: &mut Vec<u8>) {
                out.extend_from_slice(len.to_string().as_bytes());
            }
        }

        let mut out = Vec::new();
        write_chunk(&Decimal, &[b'x'; 12], &[], &mut out);
        assert_eq!(&out[..4], b"12\r\n");
    }
}
