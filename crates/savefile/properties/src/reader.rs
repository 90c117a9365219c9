use thiserror::Error;


/// Cap on the decoded payload of a single `FString`. A length prefix beyond
/// this is treated as corruption rather than attempted as an allocation.
pub const MAX_FSTRING_LEN: usize = 64 * 1024 * 1024;

/// Describes an error hit while reading raw bytes out of a save buffer.
///
/// Both variants are fatal at the point they occur; whether the surrounding
/// decoder can recover (by skipping to a declared end offset) is decided a
/// layer up, in the property parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A read ran past the end of the buffer.
    #[error(
        "unexpected end of data at offset {offset}: \
         wanted {wanted} bytes but only {remaining} remain",
    )]
    EndOfData {
        offset:    usize,
        wanted:    usize,
        remaining: usize,
    },
    /// The bytes are structurally impossible (negative counts, absurd
    /// lengths, missing terminators, invalid text encodings).
    #[error("corrupt data at offset {offset}: {message}")]
    Corrupt {
        offset:  usize,
        message: String,
    },
}

impl ReadError {
    pub(crate) fn corrupt<M: Into<String>>(offset: usize, message: M) -> Self {
        Self::Corrupt {
            offset,
            message: message.into(),
        }
    }
}

/// A bounds-checked little-endian cursor over a byte buffer.
///
/// Every save format handled by this workspace is little-endian, so the
/// reader does not thread an endianness option the way a general-purpose
/// codec would.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos:  usize,
}

macro_rules! impl_read_le {
    ($($fn_name:ident, $ty:ty, $n:literal;)*) => {
        $(
            #[inline]
            pub fn $fn_name(&mut self) -> Result<$ty, ReadError> {
                Ok(<$ty>::from_le_bytes(self.read_array::<$n>()?))
            }
        )*
    };
}

impl<'a> SliceReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Move the cursor to an absolute offset. Seeking to one past the last
    /// byte is permitted (the "end" position); anything further is an error.
    pub fn seek(&mut self, pos: usize) -> Result<(), ReadError> {
        if pos > self.data.len() {
            return Err(ReadError::corrupt(
                self.pos,
                format!("seek target {pos} is beyond the {}-byte buffer", self.data.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ReadError> {
        let _ = self.read_bytes(n)?;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(ReadError::EndOfData {
                offset: self.pos,
                wanted: n,
                remaining,
            });
        }
        let bytes = &self.data[self.pos .. self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    impl_read_le! {
        read_u8,  u8,  1;
        read_u16, u16, 2;
        read_u32, u32, 4;
        read_u64, u64, 8;
        read_i8,  i8,  1;
        read_i16, i16, 2;
        read_i32, i32, 4;
        read_i64, i64, 8;
        read_f32, f32, 4;
        read_f64, f64, 8;
    }

    #[inline]
    pub fn read_bool8(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u8()? != 0)
    }

    #[inline]
    pub fn read_bool16(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u16()? != 0)
    }

    #[inline]
    pub fn read_bool32(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u32()? != 0)
    }

    #[inline]
    pub fn read_guid(&mut self) -> Result<[u8; 16], ReadError> {
        self.read_array::<16>()
    }

    /// Read a length-prefixed string.
    ///
    /// The prefix is a signed 32-bit count: zero means the empty string, a
    /// positive count is that many UTF-8 bytes including a trailing NUL, and
    /// a negative count is that many UTF-16LE code units including a trailing
    /// NUL. The decoded string never includes the NUL.
    pub fn read_fstring(&mut self) -> Result<String, ReadError> {
        let start = self.pos;
        let len = self.read_i32()?;

        if len == 0 {
            return Ok(String::new());
        }

        if len > 0 {
            let len = len as usize;
            if len > MAX_FSTRING_LEN {
                return Err(ReadError::corrupt(
                    start,
                    format!("string length {len} exceeds the sanity cap"),
                ));
            }
            let bytes = self.read_bytes(len)?;
            let (content, terminator) = bytes.split_at(len - 1);
            if terminator != [0] {
                return Err(ReadError::corrupt(start, "string is not NUL-terminated"));
            }
            String::from_utf8(content.to_vec())
                .map_err(|_| ReadError::corrupt(start, "string is not valid UTF-8"))
        } else {
            let units = len.unsigned_abs() as usize;
            if units > MAX_FSTRING_LEN / 2 {
                return Err(ReadError::corrupt(
                    start,
                    format!("wide string length {units} exceeds the sanity cap"),
                ));
            }
            let bytes = self.read_bytes(units * 2)?;
            let mut code_units = Vec::with_capacity(units - 1);
            for pair in bytes.chunks_exact(2).take(units - 1) {
                code_units.push(u16::from_le_bytes([pair[0], pair[1]]));
            }
            let terminator = u16::from_le_bytes([bytes[units * 2 - 2], bytes[units * 2 - 1]]);
            if terminator != 0 {
                return Err(ReadError::corrupt(start, "wide string is not NUL-terminated"));
            }
            String::from_utf16(&code_units)
                .map_err(|_| ReadError::corrupt(start, "string is not valid UTF-16"))
        }
    }

    /// Read a count-prefixed list of `FString`s (name tables, data-file
    /// lists).
    pub fn read_fstrings(&mut self) -> Result<Vec<String>, ReadError> {
        let start = self.pos;
        let count = self.read_i32()?;
        if count < 0 {
            return Err(ReadError::corrupt(start, format!("negative list count {count}")));
        }
        // Each entry takes at least the 4-byte prefix.
        if count as usize > self.remaining() / 4 + 1 {
            return Err(ReadError::corrupt(
                start,
                format!("list count {count} cannot fit in the remaining buffer"),
            ));
        }
        let mut strings = Vec::with_capacity(count as usize);
        for _ in 0 .. count {
            strings.push(self.read_fstring()?);
        }
        Ok(strings)
    }
}
