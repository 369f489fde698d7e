//! xdrlib - Packer and Unpacker for the XDR external data representation (RFC 1014).
//!
//! XDR encodes every item in a multiple of 4 bytes, big-endian. Lengths of
//! fixed-size constructs are known to both sides and never sent; variable
//! constructs carry a 4-byte length or count prefix.
//!
//! # Example
//!
//! ```rust
//! use xdrlib::{Packer, Unpacker, Result};
//!
//! fn main() -> Result<()> {
//!     // Encoding
//!     let mut packer = Packer::new();
//!     packer.pack_int(42)?;
//!     packer.pack_string(b"hello")?;
//!     packer.pack_array(&[1u32, 2, 3], |p, x| p.pack_uint(*x))?;
//!     let data = packer.get_buffer();
//!
//!     // Decoding
//!     let mut unpacker = Unpacker::new(&data);
//!     assert_eq!(unpacker.unpack_int()?, 42);
//!     assert_eq!(unpacker.unpack_string()?, b"hello");
//!     assert_eq!(unpacker.unpack_array(|u| u.unpack_uint())?, vec![1, 2, 3]);
//!     unpacker.done()?;
//!     Ok(())
//! }
//! ```

mod error;
mod packer;
mod types;
mod unpacker;

pub use error::{Error, ErrorKind, Result};
pub use packer::Packer;
pub use types::{padded_len, padding_len, LIST_CONTINUE, LIST_END, XDR_FALSE, XDR_TRUE, XDR_UNIT};
pub use unpacker::Unpacker;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Packs a value with the given encoder function and returns the bytes.
pub fn pack<T, F>(value: &T, encoder: F) -> Result<Vec<u8>>
where
    T: ?Sized,
    F: FnOnce(&mut Packer, &T) -> Result<()>,
{
    let mut packer = Packer::new();
    encoder(&mut packer, value)?;
    Ok(packer.into_bytes())
}

/// Unpacks a value with the given decoder function, requiring that the
/// whole of `data` is consumed.
pub fn unpack<'a, T, F>(data: &'a [u8], decoder: F) -> Result<T>
where
    F: FnOnce(&mut Unpacker<'a>) -> Result<T>,
{
    let mut unpacker = Unpacker::new(data);
    let value = decoder(&mut unpacker)?;
    unpacker.done()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_helpers() {
        let data = pack(&(7u32, true), |p, (n, flag)| {
            p.pack_uint(*n)?;
            p.pack_bool(*flag)
        })
        .unwrap();
        assert_eq!(data, vec![0, 0, 0, 7, 0, 0, 0, 1]);

        let value = unpack(&data, |u| Ok((u.unpack_uint()?, u.unpack_bool()?))).unwrap();
        assert_eq!(value, (7, true));
    }

    #[test]
    fn test_unpack_helper_rejects_trailing_bytes() {
        let data = [0, 0, 0, 7, 0];
        let err = unpack(&data, |u| u.unpack_uint()).unwrap_err();
        assert_eq!(err, Error::UnextractedData { remaining: 1 });
    }
}
