//! Exact `content-length` of an aws-chunked body

use crate::encoding::Trailer;

fn hex_len(n: u64) -> u64 {
    if n == 0 { 1 } else { u64::from(n.ilog2() / 4 + 1) }
}

/// Length of the framed chunks, including the terminal chunk header when
/// `add_terminal` is set. Every chunk, the terminal one included, carries
/// `extension_len` bytes of extensions.
#[must_use]
pub fn encoded_content_length(decoded: u64, chunk_size: u64, extension_len: u64, add_terminal: bool) -> u64 {
    let chunk_size = chunk_size.max(1);
    let full = decoded / chunk_size;
    let rem = decoded % chunk_size;

    let mut ans = full * (hex_len(chunk_size) + extension_len + 2 + chunk_size + 2);
    if rem > 0 {
        ans += hex_len(rem) + extension_len + 2 + rem + 2;
    }
    if add_terminal {
        ans += 1 + extension_len + 2;
    }
    ans
}

/// Length of the trailer lines plus the closing CRLF
#[must_use]
pub fn trailer_block_length(trailers: &[Trailer]) -> u64 {
    let lines: usize = trailers.iter().map(Trailer::encoded_len).sum();
    u64::try_from(lines).unwrap_or(u64::MAX) + 2
}

/// Length of a `name:value\r\n` trailer line whose value is `value_len` bytes long
#[must_use]
pub fn trailer_line_length(name: &str, value_len: usize) -> u64 {
    u64::try_from(name.len() + 1 + value_len + 2).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ChunkedEncodingConfig;
    use crate::encoding::{ChunkExtension, ChunkedEncodedReader, Providers};

    use std::io::Read;

    #[test]
    fn hex_lengths() {
        assert_eq!(hex_len(0), 1);
        assert_eq!(hex_len(1), 1);
        assert_eq!(hex_len(15), 1);
        assert_eq!(hex_len(16), 2);
        assert_eq!(hex_len(0x10000), 5);
        assert_eq!(hex_len(u64::MAX), 16);
    }

    #[test]
    fn signed_without_trailers() {
        assert_eq!(encoded_content_length(20, 4, 81, true) + 2, 536);
    }

    #[test]
    fn aws_example_length() {
        // 64 KiB + 1 KiB, with the 0-byte trailing chunk and closing CRLF
        assert_eq!(encoded_content_length(66560, 65536, 81, true) + 2, 66824);
    }

    #[test]
    fn matches_encoder_output() {
        let ext = ChunkExtension::new("x", "yz");
        for (len, chunk_size) in [(0usize, 3usize), (1, 3), (3, 3), (10, 3), (100, 16), (257, 256)] {
            let data = vec![b'a'; len];
            let trailers = [Trailer::new("foo", ["bar1", "bar2"]), Trailer::single("x-amz-checksum-crc32", "AAAAAA==")];

            let mut providers = Providers::new().extension(ext.clone());
            for t in &trailers {
                providers = providers.trailer(t.clone());
            }
            let config = ChunkedEncodingConfig::with_chunk_size(chunk_size).unwrap();
            let mut out = Vec::new();
            ChunkedEncodedReader::new(&data[..], &config, providers)
                .unwrap()
                .read_to_end(&mut out)
                .unwrap();

            let expected = encoded_content_length(len as u64, chunk_size as u64, ext.encoded_len() as u64, true)
                + trailer_block_length(&trailers);
            assert_eq!(out.len() as u64, expected, "len={len} chunk_size={chunk_size}");
        }
    }

    #[test]
    fn trailer_line() {
        assert_eq!(trailer_line_length("x-amz-trailer-signature", 64), 90);
        assert_eq!(trailer_line_length("x-amz-checksum-crc32", 8), 31);
    }
}
