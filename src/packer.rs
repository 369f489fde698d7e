//! XDR encoder.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

#[cfg(feature = "logging")]
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{padding_len, LIST_CONTINUE, LIST_END, PADDING, XDR_FALSE, XDR_TRUE};

const INITIAL_CAPACITY: usize = 256;

/// Packer encodes values into an XDR byte buffer.
///
/// Every `pack_*` method appends the canonical encoding of one value. A
/// failing call leaves the buffer as it was before the call, including
/// composites whose item callback fails part way through.
#[derive(Debug, Clone)]
pub struct Packer {
    buffer: Vec<u8>,
}

fn out_of_range(value: impl fmt::Display, width: &str) -> Error {
    Error::conversion(format!("{value} out of range for {width}"))
}

impl Packer {
    /// Creates a new packer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a new packer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes packed so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been packed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards all packed data.
    pub fn reset(&mut self) {
        #[cfg(feature = "logging")]
        trace!("Resetting packer, discarding {} bytes", self.buffer.len());

        self.buffer.clear();
    }

    /// Returns a copy of the packed data.
    pub fn get_buffer(&self) -> Vec<u8> {
        self.buffer.clone()
    }

    /// Returns a copy of the packed data.
    #[deprecated(note = "use `get_buffer()` instead")]
    pub fn get_buf(&self) -> Vec<u8> {
        self.get_buffer()
    }

    /// Returns the packed data as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the packer and returns the packed data.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Runs `f`, truncating the buffer back to its current length if `f`
    /// fails after writing part of the value.
    fn atomically<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let start = self.buffer.len();
        let result = f(self);
        if result.is_err() {
            self.buffer.truncate(start);
        }
        result
    }

    fn put_u32(&mut self, value: u32) {
        let mut word = [0u8; 4];
        BigEndian::write_u32(&mut word, value);
        self.buffer.extend_from_slice(&word);
    }

    fn put_u64(&mut self, value: u64) {
        let mut word = [0u8; 8];
        BigEndian::write_u64(&mut word, value);
        self.buffer.extend_from_slice(&word);
    }

    /// Packs a 32-bit unsigned integer.
    pub fn pack_uint<T>(&mut self, x: T) -> Result<()>
    where
        T: TryInto<u32> + Copy + fmt::Display,
    {
        let value = x.try_into().map_err(|_| out_of_range(x, "uint"))?;
        self.put_u32(value);
        Ok(())
    }

    /// Packs a 32-bit signed integer.
    pub fn pack_int<T>(&mut self, x: T) -> Result<()>
    where
        T: TryInto<i32> + Copy + fmt::Display,
    {
        let value = x.try_into().map_err(|_| out_of_range(x, "int"))?;
        self.put_u32(value as u32);
        Ok(())
    }

    /// Packs an enumeration value.
    pub fn pack_enum<T>(&mut self, x: T) -> Result<()>
    where
        T: TryInto<i32> + Copy + fmt::Display,
    {
        self.pack_int(x)
    }

    /// Packs a boolean.
    pub fn pack_bool(&mut self, x: bool) -> Result<()> {
        self.put_u32(if x { XDR_TRUE } else { XDR_FALSE });
        Ok(())
    }

    /// Packs a 64-bit unsigned integer.
    pub fn pack_uhyper<T>(&mut self, x: T) -> Result<()>
    where
        T: TryInto<u64> + Copy + fmt::Display,
    {
        let value = x.try_into().map_err(|_| out_of_range(x, "uhyper"))?;
        self.put_u64(value);
        Ok(())
    }

    /// Packs a 64-bit signed integer.
    pub fn pack_hyper<T>(&mut self, x: T) -> Result<()>
    where
        T: TryInto<i64> + Copy + fmt::Display,
    {
        let value = x.try_into().map_err(|_| out_of_range(x, "hyper"))?;
        self.put_u64(value as u64);
        Ok(())
    }

    /// Packs a single-precision float (IEEE 754, big-endian).
    ///
    /// Fails if a finite `x` rounds to infinity in single precision.
    pub fn pack_float(&mut self, x: f64) -> Result<()> {
        let value = x as f32;
        if value.is_infinite() && x.is_finite() {
            return Err(Error::conversion(format!("float {x} too large to pack")));
        }
        self.put_u32(value.to_bits());
        Ok(())
    }

    /// Packs a double-precision float (IEEE 754, big-endian).
    pub fn pack_double(&mut self, x: f64) -> Result<()> {
        self.put_u64(x.to_bits());
        Ok(())
    }

    /// Packs fixed-length opaque data.
    ///
    /// Writes the first `length` bytes of `data` followed by zero padding
    /// to a 4-byte boundary. The length itself is not written.
    pub fn pack_fopaque(&mut self, length: usize, data: &[u8]) -> Result<()> {
        if data.len() < length {
            return Err(Error::invalid_argument(format!(
                "data size {} less than specified size {}",
                data.len(),
                length
            )));
        }
        self.buffer.extend_from_slice(&data[..length]);
        self.buffer.extend_from_slice(&PADDING[..padding_len(length)]);
        Ok(())
    }

    /// Packs a fixed-length string. Same encoding as [`Packer::pack_fopaque`].
    pub fn pack_fstring(&mut self, length: usize, data: &[u8]) -> Result<()> {
        self.pack_fopaque(length, data)
    }

    /// Packs variable-length opaque data: a 4-byte length, then the bytes
    /// padded to a 4-byte boundary.
    pub fn pack_opaque(&mut self, data: &[u8]) -> Result<()> {
        let length = data.len();
        self.atomically(|p| {
            p.pack_uint(length)?;
            p.pack_fopaque(length, data)
        })
    }

    /// Packs a variable-length string. Text should be encoded first,
    /// typically `s.as_bytes()`.
    pub fn pack_string(&mut self, data: &[u8]) -> Result<()> {
        self.pack_opaque(data)
    }

    /// Packs a byte slice as variable-length opaque data.
    pub fn pack_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.pack_opaque(data)
    }

    /// Packs a fixed-length array. `seq` must hold exactly `length` items;
    /// no count is written.
    pub fn pack_farray<T, F>(&mut self, length: usize, seq: &[T], mut pack_item: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        if seq.len() != length {
            return Err(Error::invalid_argument(format!(
                "wrong array size: expected {}, got {}",
                length,
                seq.len()
            )));
        }
        self.atomically(|p| {
            for item in seq {
                pack_item(p, item)?;
            }
            Ok(())
        })
    }

    /// Packs a variable-length array: a 4-byte count, then each item.
    pub fn pack_array<T, F>(&mut self, seq: &[T], pack_item: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        let length = seq.len();
        self.atomically(|p| {
            p.pack_uint(length)?;
            p.pack_farray(length, seq, pack_item)
        })
    }

    /// Packs a list: each item is preceded by a 4-byte `1`, and the list
    /// ends with a 4-byte `0`.
    pub fn pack_list<T, F>(&mut self, seq: &[T], mut pack_item: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        self.atomically(|p| {
            for item in seq {
                p.put_u32(LIST_CONTINUE);
                pack_item(p, item)?;
            }
            p.put_u32(LIST_END);
            Ok(())
        })
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}
