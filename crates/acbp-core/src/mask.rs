//! Fixed-width flag masks.
//!
//! A mask is a plain `u64`; bit `i` carries the flag declared at index `i`.

/// Bitmask over the declared flags.
pub type Mask = u64;

/// Widest supported mask.
pub const MAX_WIDTH: u32 = 64;

/// Returns the mask with only `index` set.
#[inline]
pub fn bit(index: u8) -> Mask {
    1u64 << index
}

/// Returns true if bit `index` is set in `mask`.
#[inline]
pub fn is_set(mask: Mask, index: u8) -> bool {
    (mask >> index) & 1 == 1
}

/// Returns true if every bit of `required` is set in `mask`.
///
/// An empty `required` is vacuously contained.
#[inline]
pub fn contains_all(mask: Mask, required: Mask) -> bool {
    mask & required == required
}

/// Returns the mask with the low `width` bits set.
#[inline]
pub fn width_mask(width: u32) -> Mask {
    if width >= MAX_WIDTH {
        Mask::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Number of distinct masks of the given width.
#[inline]
pub fn mask_space(width: u32) -> u128 {
    1u128 << width.min(MAX_WIDTH)
}

/// Iterates the indices of set bits, lowest first.
pub fn set_bits(mask: Mask) -> impl Iterator<Item = u8> {
    let mut rest = mask;
    std::iter::from_fn(move || {
        if rest == 0 {
            return None;
        }
        let idx = rest.trailing_zeros() as u8;
        rest &= rest - 1;
        Some(idx)
    })
}
