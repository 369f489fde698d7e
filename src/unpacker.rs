//! XDR decoder.

use byteorder::{BigEndian, ByteOrder};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::types::{padded_len, LIST_CONTINUE, LIST_END};

/// Unpacker decodes XDR values from a borrowed byte buffer.
///
/// Reads start at the cursor and advance it by exactly the number of wire
/// bytes consumed. A failed read leaves the cursor where that read began.
#[derive(Debug, Clone)]
pub struct Unpacker<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    /// Creates a new unpacker positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            pos: 0,
        }
    }

    /// Replaces the buffer and rewinds the cursor to 0.
    pub fn reset(&mut self, data: &'a [u8]) {
        #[cfg(feature = "logging")]
        trace!("Resetting unpacker onto {} bytes", data.len());

        self.buffer = data;
        self.pos = 0;
    }

    /// Returns the current offset within the buffer.
    pub fn get_position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. The position is not checked until the next read.
    pub fn set_position(&mut self, position: usize) {
        self.pos = position;
    }

    /// Returns the complete buffer being decoded.
    pub fn get_buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the number of bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.pos)
    }

    /// Returns true if there is more data to read.
    pub fn has_more(&self) -> bool {
        self.pos < self.buffer.len()
    }

    /// Asserts that the whole buffer has been consumed.
    pub fn done(&self) -> Result<()> {
        if self.has_more() {
            #[cfg(feature = "logging")]
            debug!(
                "Unextracted data at offset {}: {} bytes remain",
                self.pos,
                self.remaining()
            );

            return Err(Error::UnextractedData {
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Consumes `n` bytes, or fails without moving the cursor.
    ///
    /// A cursor past the end fails even for `n == 0`.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if self.pos > self.buffer.len() || n > available {
            #[cfg(feature = "logging")]
            debug!(
                "Read of {} bytes at offset {} runs past end of {}-byte buffer",
                n,
                self.pos,
                self.buffer.len()
            );

            return Err(Error::end_of_buffer(n, available));
        }
        let bytes = &self.buffer[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Unpacks a 32-bit unsigned integer.
    pub fn unpack_uint(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    /// Unpacks a 32-bit signed integer.
    pub fn unpack_int(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    /// Unpacks an enumeration value.
    pub fn unpack_enum(&mut self) -> Result<i32> {
        self.unpack_int()
    }

    /// Unpacks a boolean. Any nonzero value is true.
    pub fn unpack_bool(&mut self) -> Result<bool> {
        Ok(self.unpack_int()? != 0)
    }

    /// Unpacks a 64-bit unsigned integer.
    pub fn unpack_uhyper(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Unpacks a 64-bit signed integer.
    pub fn unpack_hyper(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    /// Unpacks a single-precision float.
    pub fn unpack_float(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    /// Unpacks a double-precision float.
    pub fn unpack_double(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// Unpacks `n` bytes of fixed-length data.
    ///
    /// The padding after the data is consumed but not returned, and its
    /// contents are not checked.
    pub fn unpack_fstring(&mut self, n: usize) -> Result<&'a [u8]> {
        let padded = padded_len(n).ok_or_else(|| Error::end_of_buffer(n, self.remaining()))?;
        let window = self.take(padded)?;
        Ok(&window[..n])
    }

    /// Unpacks fixed-length opaque data. Same as [`Unpacker::unpack_fstring`].
    pub fn unpack_fopaque(&mut self, n: usize) -> Result<&'a [u8]> {
        self.unpack_fstring(n)
    }

    /// Unpacks a variable-length string: a 4-byte length, then the bytes.
    pub fn unpack_string(&mut self) -> Result<&'a [u8]> {
        let n = self.unpack_uint()? as usize;
        self.unpack_fstring(n)
    }

    /// Unpacks variable-length opaque data.
    pub fn unpack_opaque(&mut self) -> Result<&'a [u8]> {
        self.unpack_string()
    }

    /// Unpacks variable-length opaque data.
    pub fn unpack_bytes(&mut self) -> Result<&'a [u8]> {
        self.unpack_string()
    }

    /// Unpacks a list of items, each preceded by a `1` marker and the whole
    /// terminated by a `0` marker.
    pub fn unpack_list<T, F>(&mut self, mut unpack_item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let mut seq = Vec::new();
        loop {
            match self.unpack_uint()? {
                LIST_END => break,
                LIST_CONTINUE => seq.push(unpack_item(self)?),
                marker => {
                    #[cfg(feature = "logging")]
                    debug!(
                        "Bad list marker {} at offset {}",
                        marker,
                        self.pos - 4
                    );

                    return Err(Error::conversion(format!("0 or 1 expected, got {marker}")));
                }
            }
        }
        Ok(seq)
    }

    /// Unpacks a fixed-length array of `n` items.
    pub fn unpack_farray<T, F>(&mut self, n: usize, mut unpack_item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        // The count may come off the wire, so it does not size the allocation alone.
        let mut seq = Vec::with_capacity(n.min(self.remaining()));
        for _ in 0..n {
            seq.push(unpack_item(self)?);
        }
        Ok(seq)
    }

    /// Unpacks a variable-length array: a 4-byte count, then the items.
    pub fn unpack_array<T, F>(&mut self, unpack_item: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let n = self.unpack_uint()? as usize;
        self.unpack_farray(n, unpack_item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_unpack_uint() {
        let data = [0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff];
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_uint().unwrap(), 1);
        assert_eq!(unpacker.unpack_uint().unwrap(), u32::MAX);
        assert!(unpacker.done().is_ok());
    }

    #[test]
    fn test_unpack_int() {
        let data = [0xff, 0xff, 0xff, 0xfe, 0x80, 0, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_int().unwrap(), -2);
        assert_eq!(unpacker.unpack_enum().unwrap(), i32::MIN);
    }

    #[test]
    fn test_unpack_hyper() {
        let data = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 7, 8,
        ];
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_hyper().unwrap(), -1);
        assert_eq!(unpacker.unpack_uhyper().unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_unpack_bool_nonzero_is_true() {
        let data = [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 7];
        let mut unpacker = Unpacker::new(&data);
        assert!(!unpacker.unpack_bool().unwrap());
        assert!(unpacker.unpack_bool().unwrap());
        assert!(unpacker.unpack_bool().unwrap());
    }

    #[test]
    fn test_unpack_floats() {
        let data = [0x3f, 0x80, 0, 0, 0xc0, 0, 0, 0, 0, 0, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_float().unwrap(), 1.0);
        assert_eq!(unpacker.unpack_double().unwrap(), -2.0);
    }

    #[test]
    fn test_end_of_buffer() {
        let data = [0, 0, 1];
        let mut unpacker = Unpacker::new(&data);
        let err = unpacker.unpack_uint().unwrap_err();
        assert_eq!(err, Error::end_of_buffer(4, 3));
        assert_eq!(unpacker.get_position(), 0);

        let data = [0, 0, 0, 0, 0, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_hyper().unwrap_err().kind(), ErrorKind::EndOfBuffer);
        assert_eq!(unpacker.unpack_double().unwrap_err().kind(), ErrorKind::EndOfBuffer);
    }

    #[test]
    fn test_unpack_fopaque_ignores_padding() {
        let data = *b"ABCDE\xff\xff\xff";
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_fopaque(5).unwrap(), b"ABCDE");
        assert_eq!(unpacker.get_position(), 8);
    }

    #[test]
    fn test_unpack_fstring_requires_padding_bytes() {
        let data = *b"ABCDE\0";
        let mut unpacker = Unpacker::new(&data);
        let err = unpacker.unpack_fstring(5).unwrap_err();
        assert_eq!(err, Error::end_of_buffer(8, 6));
        assert_eq!(unpacker.get_position(), 0);
    }

    #[test]
    fn test_unpack_fstring_huge_length() {
        let data = [0u8; 8];
        let mut unpacker = Unpacker::new(&data);
        let err = unpacker.unpack_fstring(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfBuffer);
    }

    #[test]
    fn test_unpack_string() {
        let data = *b"\x00\x00\x00\x03ABC\x00";
        let mut unpacker = Unpacker::new(&data);
        assert_eq!(unpacker.unpack_string().unwrap(), b"ABC");
        assert_eq!(unpacker.get_position(), 8);

        unpacker.set_position(0);
        assert_eq!(unpacker.unpack_opaque().unwrap(), b"ABC");
        unpacker.set_position(0);
        assert_eq!(unpacker.unpack_bytes().unwrap(), b"ABC");
    }

    #[test]
    fn test_unpack_list() {
        let data = [0, 0, 0, 1, 0, 0, 0, 9, 0, 0, 0, 1, 0, 0, 0, 8, 0, 0, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        let seq = unpacker.unpack_list(|u| u.unpack_uint()).unwrap();
        assert_eq!(seq, vec![9, 8]);
        assert!(unpacker.done().is_ok());
    }

    #[test]
    fn test_unpack_list_bad_marker() {
        let data = [0, 0, 0, 2, 0, 0, 0, 9, 0, 0, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        let err = unpacker.unpack_list(|u| u.unpack_uint()).unwrap_err();
        assert_eq!(err, Error::conversion("0 or 1 expected, got 2"));
        assert_eq!(unpacker.get_position(), 4);
    }

    #[test]
    fn test_unpack_farray_propagates_item_error() {
        let data = [0, 0, 0, 1, 0, 0];
        let mut unpacker = Unpacker::new(&data);
        let mut calls = 0;
        let err = unpacker
            .unpack_farray(3, |u| {
                calls += 1;
                u.unpack_uint()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfBuffer);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_unpack_array_untrusted_count() {
        let data = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 1];
        let mut unpacker = Unpacker::new(&data);
        let err = unpacker.unpack_array(|u| u.unpack_uint()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfBuffer);
    }

    #[test]
    fn test_position_past_end() {
        let data = [0, 0, 0, 1];
        let mut unpacker = Unpacker::new(&data);
        unpacker.set_position(14);
        assert_eq!(unpacker.remaining(), 0);
        assert_eq!(unpacker.unpack_uint().unwrap_err(), Error::end_of_buffer(4, 0));
        assert!(unpacker.done().is_ok());
    }

    #[test]
    fn test_zero_length_read_past_end() {
        let data = [0, 0, 0, 1];
        let mut unpacker = Unpacker::new(&data);
        unpacker.set_position(14);
        assert_eq!(unpacker.unpack_fopaque(0).unwrap_err(), Error::end_of_buffer(0, 0));
        assert_eq!(
            unpacker.unpack_farray(2, |u| u.unpack_fstring(0)).unwrap_err(),
            Error::end_of_buffer(0, 0)
        );
        assert_eq!(unpacker.get_position(), 14);

        unpacker.set_position(4);
        assert_eq!(unpacker.unpack_fopaque(0).unwrap(), b"");
        assert_eq!(unpacker.get_position(), 4);
    }

    #[test]
    fn test_done() {
        let data = [0, 0, 0, 1, 0];
        let mut unpacker = Unpacker::new(&data);
        unpacker.unpack_uint().unwrap();
        assert_eq!(
            unpacker.done().unwrap_err(),
            Error::UnextractedData { remaining: 1 }
        );
    }

    #[test]
    fn test_reset() {
        let first = [0, 0, 0, 1];
        let second = [0, 0, 0, 2];
        let mut unpacker = Unpacker::new(&first);
        unpacker.unpack_uint().unwrap();
        unpacker.reset(&second);
        assert_eq!(unpacker.get_position(), 0);
        assert_eq!(unpacker.get_buffer(), &second);
        assert_eq!(unpacker.unpack_uint().unwrap(), 2);
    }
}
