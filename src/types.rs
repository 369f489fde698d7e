//! Wire format constants and padding arithmetic.

/// Size of the basic XDR block. Every item occupies a multiple of this.
pub const XDR_UNIT: usize = 4;

/// List marker preceding each element.
pub const LIST_CONTINUE: u32 = 1;

/// List marker after the last element.
pub const LIST_END: u32 = 0;

/// Canonical encoding of `true`.
pub const XDR_TRUE: u32 = 1;

/// Encoding of `false`.
pub const XDR_FALSE: u32 = 0;

/// Zero bytes used for padding; at most `XDR_UNIT - 1` are ever needed.
pub(crate) const PADDING: [u8; XDR_UNIT] = [0; XDR_UNIT];

/// Rounds `n` up to the next multiple of [`XDR_UNIT`].
///
/// Returns `None` if the result does not fit in `usize`.
#[inline]
pub fn padded_len(n: usize) -> Option<usize> {
    Some(n.checked_add(XDR_UNIT - 1)? / XDR_UNIT * XDR_UNIT)
}

/// Number of zero bytes that follow `n` bytes of opaque data.
#[inline]
pub fn padding_len(n: usize) -> usize {
    (XDR_UNIT - n % XDR_UNIT) % XDR_UNIT
}
