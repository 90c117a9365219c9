//! The run-length layer inside modern object blobs.
//!
//! After the zlib wrapper comes off, the byte stream is chunked: a positive
//! i32 tag is followed by that many literal bytes, a negative tag stands for
//! that many implicit zero bytes. The filter reconstructs the plain stream
//! and stops at the declared uncompressed length, so large sparse blobs
//! never materialize an intermediate buffer.

use std::io;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt as _};


#[derive(Debug)]
pub(crate) struct RleReader<R> {
    inner:           R,
    /// Output bytes still owed to the caller.
    remaining:       usize,
    pending_literal: usize,
    pending_zeros:   usize,
}

impl<R: Read> RleReader<R> {
    pub(crate) fn new(inner: R, uncompressed_len: usize) -> Self {
        Self {
            inner,
            remaining: uncompressed_len,
            pending_literal: 0,
            pending_zeros: 0,
        }
    }
}

impl<R: Read> Read for RleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        while self.pending_literal == 0 && self.pending_zeros == 0 {
            let tag = self.inner.read_i32::<LittleEndian>()?;
            let run = tag.unsigned_abs() as usize;
            if run > self.remaining {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "run of {run} bytes exceeds the {} still owed by the declared length",
                        self.remaining,
                    ),
                ));
            }
            if tag > 0 {
                self.pending_literal = run;
            } else if tag < 0 {
                self.pending_zeros = run;
            }
            // A zero tag is an empty chunk; keep scanning.
        }

        if self.pending_literal > 0 {
            let want = buf.len().min(self.pending_literal);
            let got = self.inner.read(&mut buf[.. want])?;
            if got == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "compressed stream ended inside a literal run",
                ));
            }
            self.pending_literal -= got;
            self.remaining -= got;
            Ok(got)
        } else {
            let want = buf.len().min(self.pending_zeros);
            buf[.. want].fill(0);
            self.pending_zeros -= want;
            self.remaining -= want;
            Ok(want)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;
    use super::RleReader;

    fn chunked(parts: &[(i32, &[u8])]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (tag, literals) in parts {
            bytes.extend_from_slice(&tag.to_le_bytes());
            bytes.extend_from_slice(literals);
        }
        bytes
    }

    fn decode(encoded: &[u8], len: usize) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        RleReader::new(encoded, len).read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn literals_and_zero_runs_interleave() {
        let encoded = chunked(&[(3, b"abc"), (-4, b""), (2, b"xy")]);
        let decoded = decode(&encoded, 9).expect("well-formed stream");
        assert_eq!(decoded, b"abc\0\0\0\0xy");
    }

    #[test]
    fn stops_exactly_at_the_declared_length() {
        let encoded = chunked(&[(4, b"data"), (99, b"junk after the declared end")]);
        let decoded = decode(&encoded, 4).expect("trailing junk is never visited");
        assert_eq!(decoded, b"data");
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let encoded = chunked(&[(0, b""), (-2, b""), (0, b""), (1, b"!")]);
        let decoded = decode(&encoded, 3).expect("zero tags carry nothing");
        assert_eq!(decoded, b"\0\0!");
    }

    #[test]
    fn runs_past_the_declared_length_are_invalid() {
        let encoded = chunked(&[(-50, b"")]);
        let err = decode(&encoded, 10).expect_err("over-long run");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_literal_run_is_an_eof() {
        let encoded = chunked(&[(8, b"abc")]);
        let err = decode(&encoded, 8).expect_err("missing literal bytes");
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
