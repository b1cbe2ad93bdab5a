use crate::boxes::FourCC;
use crate::parser::{ParseError, Result};
use crate::util::latin1;
use byteorder::{BigEndian, ByteOrder};

/// A bounded, zero-copy window over the input with its own cursor.
///
/// `base` is the absolute offset of `data[0]` in the original buffer, so
/// nested views still report file positions.
#[derive(Debug, Clone)]
pub struct View<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> View<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn absolute_position(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The whole window, independent of the cursor.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos - self.pos));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Everything from the cursor to the end of the window.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u24(self.read_bytes(3)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_fourcc(&mut self) -> Result<FourCC> {
        let b = self.read_bytes(4)?;
        Ok(FourCC([b[0], b[1], b[2], b[3]]))
    }

    /// Fixed-length byte string, one char per byte.
    pub fn read_str(&mut self, n: usize) -> Result<String> {
        Ok(latin1(self.read_bytes(n)?))
    }

    /// String up to a NUL terminator (consumed) or the end of the window.
    pub fn read_cstr(&mut self) -> String {
        let tail = &self.data[self.pos..];
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => {
                self.pos += nul + 1;
                latin1(&tail[..nul])
            }
            None => latin1(self.rest()),
        }
    }

    /// A child window over `[start, start + len)` of this one.
    pub fn sub_view(&self, start: usize, len: usize) -> Result<View<'a>> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| ParseError::Bounds {
                offset: self.base + start as u64,
                need: len,
                available: self.data.len().saturating_sub(start),
            })?;
        Ok(View::with_base(&self.data[start..end], self.base + start as u64))
    }

    fn out_of_bounds(&self, need: usize) -> ParseError {
        ParseError::Bounds {
            offset: self.absolute_position(),
            need,
            available: self.remaining(),
        }
    }
}
