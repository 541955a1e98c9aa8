//! Packed BCD conversion for the MCP7940 timekeeping registers.
//!
//! Most timekeeping registers share their byte with control or status flags
//! (ST, OSCRUN, VBATEN, LPYR, the 12/24-hour select ...). Every decode takes
//! the mask of the digits that belong to the value, and every write goes
//! through [`merge`] so the flags outside that mask survive.

/// Digits of the seconds and minutes registers.
pub const MASK_SECONDS: u8 = 0x7F;
/// Digits of the minutes register.
pub const MASK_MINUTES: u8 = 0x7F;
/// Digits of an hours register in 24-hour mode.
pub const MASK_HOURS_24: u8 = 0x3F;
/// Digits of an hours register in 12-hour mode.
pub const MASK_HOURS_12: u8 = 0x1F;
/// Weekday counter (binary, 1-7).
pub const MASK_WEEKDAY: u8 = 0x07;
/// Digits of the date register.
pub const MASK_DATE: u8 = 0x3F;
/// Digits of the month register.
pub const MASK_MONTH: u8 = 0x1F;
/// Digits of the year register.
pub const MASK_YEAR: u8 = 0xFF;

/// Decodes the BCD digits selected by `mask` into a binary value.
///
/// Invalid digits (a nibble above 9) are not rejected here; callers that need
/// validation check the decoded value against the field's range.
pub const fn decode(byte: u8, mask: u8) -> u8 {
    let digits = byte & mask;
    (digits >> 4) * 10 + (digits & 0x0F)
}

/// Like [`decode`], but returns `None` when either selected nibble is not a
/// decimal digit.
pub const fn checked_decode(byte: u8, mask: u8) -> Option<u8> {
    let digits = byte & mask;
    if digits >> 4 > 9 || digits & 0x0F > 9 {
        None
    } else {
        Some(decode(byte, mask))
    }
}

/// Encodes a binary value in the range 0-99 as two packed BCD digits.
///
/// Values above 99 produce a meaningless encoding; range checking is the
/// caller's job.
pub const fn encode(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Replaces the bits of `current` selected by `mask` with those of `value`.
pub const fn merge(current: u8, value: u8, mask: u8) -> u8 {
    (current & !mask) | (value & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_two_digit_values() {
        for n in 0..=99u8 {
            assert_eq!(decode(encode(n), 0xFF), n, "round trip failed for {}", n);
        }
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(0), 0x00);
        assert_eq!(encode(9), 0x09);
        assert_eq!(encode(10), 0x10);
        assert_eq!(encode(45), 0x45);
        assert_eq!(encode(59), 0x59);
        assert_eq!(encode(99), 0x99);
    }

    #[test]
    fn test_decode_ignores_flag_bits() {
        // ST bit set on a seconds register holding 37
        assert_eq!(decode(0x80 | 0x37, MASK_SECONDS), 37);
        // 12-hour mode, PM, 11 o'clock
        assert_eq!(decode(0x71, MASK_HOURS_12), 11);
        // OSCRUN + VBATEN on the weekday register
        assert_eq!(decode(0x2B, MASK_WEEKDAY), 3);
        // LPYR on the month register
        assert_eq!(decode(0x22, MASK_MONTH), 2);
    }

    #[test]
    fn test_checked_decode_rejects_non_decimal_nibbles() {
        assert_eq!(checked_decode(0x59, MASK_SECONDS), Some(59));
        assert_eq!(checked_decode(0x1A, MASK_SECONDS), None);
        assert_eq!(checked_decode(0xA1, MASK_YEAR), None);
        // flag bits above the mask don't count as digits
        assert_eq!(checked_decode(0xF9, MASK_DATE), Some(39));
    }

    #[test]
    fn test_merge_preserves_flags() {
        // ST stays set while the seconds digits change
        assert_eq!(merge(0x80 | 0x12, encode(45), MASK_SECONDS), 0xC5);
        // VBATEN and OSCRUN stay set while the weekday changes
        assert_eq!(merge(0x29, 0x05, MASK_WEEKDAY), 0x2D);
        // value bits outside the mask are dropped
        assert_eq!(merge(0x00, 0xFF, MASK_MONTH), 0x1F);
    }
}
