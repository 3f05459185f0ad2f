//! Alignment and bit-depth helpers shared by the session compiler and readers.
//!
//! Both return `None` when the result does not fit a `u32`.

/// Round `value` up to the next multiple of `multiple` (0 leaves it unchanged).
#[inline]
pub fn align_multiple_ceil(value: u32, multiple: u32) -> Option<u32> {
    if multiple == 0 {
        return Some(value);
    }
    value.checked_next_multiple_of(multiple)
}

/// Bytes needed to hold `pixels` samples of `depth` bits, rounded up.
#[inline]
pub fn multiply_by_depth_ceil(pixels: u32, depth: u32) -> Option<u32> {
    if depth == 1 {
        Some(pixels.div_ceil(8))
    } else {
        pixels.checked_mul(depth / 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_alignment() {
        assert_eq!(align_multiple_ceil(5101, 2), Some(5102));
        assert_eq!(align_multiple_ceil(5100, 4), Some(5100));
        assert_eq!(align_multiple_ceil(7, 0), Some(7));
        assert_eq!(align_multiple_ceil(u32::MAX, 2), None);
    }

    #[test]
    fn depth_bytes() {
        assert_eq!(multiply_by_depth_ceil(2550, 8), Some(2550));
        assert_eq!(multiply_by_depth_ceil(2550, 16), Some(5100));
        assert_eq!(multiply_by_depth_ceil(9, 1), Some(2));
        assert_eq!(multiply_by_depth_ceil(u32::MAX, 1), Some(u32::MAX.div_ceil(8)));
        assert_eq!(multiply_by_depth_ceil(1 << 31, 16), None);
    }
}
