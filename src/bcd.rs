//! Binary digit decoding for the selector switches.
//!
//! Each selector digit arrives as an array of switch states with index 0 as
//! the most significant bit. The array length is the digit width, so the
//! width is always stated by the caller through the type.

/// Decodes `N` bits (index 0 = MSB) into their unsigned value.
///
/// Any pattern is accepted; the result lies in `0..2^N`. Whether it is a
/// valid decimal digit is decided by [`crate::selector::compose`].
///
/// ```
/// use motor_pwm::bcd::decode;
///
/// assert_eq!(decode(&[false, true, false, true]), 5);
/// assert_eq!(decode(&[true]), 1);
/// ```
pub const fn decode<const N: usize>(bits: &[bool; N]) -> u16 {
    assert!(N <= 16, "digit wider than the decoded value");

    let mut value = 0u16;
    let mut i = 0;
    while i < N {
        value = (value << 1) | bits[i] as u16;
        i += 1;
    }
    value
}

/// Splits the low `N` bits of `value` into an MSB-first bit array.
pub const fn encode<const N: usize>(value: u16) -> [bool; N] {
    let mut bits = [false; N];
    let mut i = 0;
    while i < N {
        bits[i] = (value >> (N - 1 - i)) & 1 == 1;
        i += 1;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_matches_weighted_sum() {
        for value in 0u16..16 {
            let bits: [bool; 4] = encode(value);
            let expected: u16 = bits
                .iter()
                .enumerate()
                .map(|(i, &b)| (b as u16) << (4 - 1 - i))
                .sum();
            assert_eq!(decode(&bits), expected);
            assert_eq!(decode(&bits), value);
        }
    }

    #[test]
    fn test_decode_extremes() {
        assert_eq!(decode(&[false; 4]), 0);
        assert_eq!(decode(&[true; 4]), 15);
        assert_eq!(decode(&[true; 1]), 1);
        assert_eq!(decode::<0>(&[]), 0);
    }

    #[test]
    fn test_index_zero_is_most_significant() {
        assert_eq!(decode(&[true, false, false, false]), 8);
        assert_eq!(decode(&[false, false, false, true]), 1);
    }

    #[test]
    fn test_width_comes_from_caller() {
        // Same leading bits, different declared widths
        assert_eq!(decode(&[true, true]), 3);
        assert_eq!(decode(&[true, true, false]), 6);
    }
}
