// ABOUTME: Reads and writes 64-bit integers as two big-endian 32-bit words in a byte view.
// ABOUTME: Bridges f64-backed numbers (exact to 2^53) and BigInt (exact for all 64 bits).

use crate::error::{Error, Result};
use num_bigint::BigInt;

const WORD: f64 = 4_294_967_296.0; // 2^32

/// A 64-bit integer source for the writers: either a native number or an exact
/// arbitrary-precision integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Int64Input {
    Number(f64),
    Big(BigInt),
}

impl From<f64> for Int64Input {
    fn from(n: f64) -> Self {
        Int64Input::Number(n)
    }
}

impl From<BigInt> for Int64Input {
    fn from(n: BigInt) -> Self {
        Int64Input::Big(n)
    }
}

impl From<&BigInt> for Int64Input {
    fn from(n: &BigInt) -> Self {
        Int64Input::Big(n.clone())
    }
}

impl From<u64> for Int64Input {
    fn from(n: u64) -> Self {
        Int64Input::Big(BigInt::from(n))
    }
}

impl From<i64> for Int64Input {
    fn from(n: i64) -> Self {
        Int64Input::Big(BigInt::from(n))
    }
}

/// Write an unsigned 64-bit integer at `offset`: high word first, then low word.
///
/// Native numbers are truncated and each word is reduced modulo 2^32, so values past
/// 2^64 wrap instead of failing. Arbitrary-precision inputs must lie in
/// `[0, 2^64 - 1]`.
pub fn write_uint64(view: &mut [u8], offset: usize, value: impl Into<Int64Input>) -> Result<()> {
    check_view(view.len(), offset)?;
    let (high, low) = match value.into() {
        Int64Input::Number(n) => (to_uint32(n / WORD), to_uint32(n)),
        Int64Input::Big(n) => {
            let v = u64::try_from(&n).map_err(|_| Error::Overflow {
                value: n.to_string(),
                target: "uint64",
            })?;
            ((v >> 32) as u32, v as u32)
        }
    };
    write_words(view, offset, high, low);
    Ok(())
}

/// Write a signed 64-bit integer at `offset` in two's complement.
///
/// The high word is the floor of `value / 2^32`, so `high * 2^32 + low` reconstructs
/// the value exactly with `low` in `[0, 2^32)`. Arbitrary-precision inputs must lie in
/// `[-2^63, 2^63 - 1]`.
pub fn write_int64(view: &mut [u8], offset: usize, value: impl Into<Int64Input>) -> Result<()> {
    check_view(view.len(), offset)?;
    let (high, low) = match value.into() {
        Int64Input::Number(n) => (to_uint32((n / WORD).floor()), to_uint32(n)),
        Int64Input::Big(n) => {
            let v = i64::try_from(&n).map_err(|_| Error::Overflow {
                value: n.to_string(),
                target: "int64",
            })?;
            // arithmetic shift is floor division by 2^32
            ((v >> 32) as u32, v as u32)
        }
    };
    write_words(view, offset, high, low);
    Ok(())
}

/// Read a signed 64-bit integer at `offset`, exactly.
pub fn read_int64(view: &[u8], offset: usize) -> Result<BigInt> {
    check_view(view.len(), offset)?;
    let high = i64::from(read_word(view, offset) as i32);
    let low = i64::from(read_word(view, offset + 4));
    Ok(BigInt::from((high << 32) | low))
}

/// Read an unsigned 64-bit integer at `offset`, exactly.
pub fn read_uint64(view: &[u8], offset: usize) -> Result<BigInt> {
    check_view(view.len(), offset)?;
    let high = u64::from(read_word(view, offset));
    let low = u64::from(read_word(view, offset + 4));
    Ok(BigInt::from((high << 32) | low))
}

#[inline]
fn check_view(len: usize, offset: usize) -> Result<()> {
    match offset.checked_add(8) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::ViewOutOfBounds { offset, len }),
    }
}

#[inline]
fn read_word(view: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        view[offset],
        view[offset + 1],
        view[offset + 2],
        view[offset + 3],
    ])
}

#[inline]
fn write_words(view: &mut [u8], offset: usize, high: u32, low: u32) {
    view[offset..offset + 4].copy_from_slice(&high.to_be_bytes());
    view[offset + 4..offset + 8].copy_from_slice(&low.to_be_bytes());
}

/// Reduce a native number to an unsigned 32-bit word: truncate toward zero, then wrap
/// modulo 2^32. Non-finite numbers become 0.
#[inline]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(WORD) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint64_layout() {
        let mut view = [0u8; 8];
        write_uint64(&mut view, 0, 0x0102_0304_0506_0708u64).unwrap();
        assert_eq!(view, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            read_uint64(&view, 0).unwrap(),
            BigInt::from(0x0102_0304_0506_0708u64)
        );
    }

    #[test]
    fn test_uint64_extremes() {
        let mut view = [0u8; 8];
        write_uint64(&mut view, 0, u64::MAX).unwrap();
        assert_eq!(view, [0xff; 8]);
        assert_eq!(read_uint64(&view, 0).unwrap(), BigInt::from(u64::MAX));
        // same bytes read as signed
        assert_eq!(read_int64(&view, 0).unwrap(), BigInt::from(-1));
    }

    #[test]
    fn test_uint64_rejects_out_of_range_bigint() {
        let mut view = [0u8; 8];
        let too_big = BigInt::from(u64::MAX) + 1;
        assert!(matches!(
            write_uint64(&mut view, 0, too_big),
            Err(Error::Overflow { target: "uint64", .. })
        ));
        assert!(matches!(
            write_uint64(&mut view, 0, BigInt::from(-1)),
            Err(Error::Overflow { .. })
        ));
    }

    #[test]
    fn test_int64_negative_words() {
        let mut view = [0u8; 8];
        write_int64(&mut view, 0, -1i64).unwrap();
        assert_eq!(view, [0xff; 8]);

        // -2^32: high = -1, low = 0
        write_int64(&mut view, 0, -4_294_967_296i64).unwrap();
        assert_eq!(view, [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);

        // -2^32 - 1: high = floor(-1.0000000002) = -2, low = 2^32 - 1
        write_int64(&mut view, 0, -4_294_967_297i64).unwrap();
        assert_eq!(view, [0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(read_int64(&view, 0).unwrap(), BigInt::from(-4_294_967_297i64));
    }

    #[test]
    fn test_int64_extremes() {
        let mut view = [0u8; 8];
        write_int64(&mut view, 0, i64::MIN).unwrap();
        assert_eq!(view, [0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_int64(&view, 0).unwrap(), BigInt::from(i64::MIN));

        write_int64(&mut view, 0, i64::MAX).unwrap();
        assert_eq!(read_int64(&view, 0).unwrap(), BigInt::from(i64::MAX));

        let too_big = BigInt::from(i64::MAX) + 1;
        assert!(matches!(
            write_int64(&mut view, 0, too_big),
            Err(Error::Overflow { target: "int64", .. })
        ));
        let too_small = BigInt::from(i64::MIN) - 1;
        assert!(write_int64(&mut view, 0, too_small).is_err());
    }

    #[test]
    fn test_native_number_inputs() {
        let mut view = [0u8; 8];
        write_uint64(&mut view, 0, 9_007_199_254_740_991.0).unwrap();
        assert_eq!(
            read_uint64(&view, 0).unwrap(),
            BigInt::from(9_007_199_254_740_991u64)
        );

        write_int64(&mut view, 0, -9_007_199_254_740_991.0).unwrap();
        assert_eq!(
            read_int64(&view, 0).unwrap(),
            BigInt::from(-9_007_199_254_740_991i64)
        );

        write_int64(&mut view, 0, -1.0).unwrap();
        assert_eq!(view, [0xff; 8]);
    }

    #[test]
    fn test_offset_and_bounds() {
        let mut view = [0u8; 10];
        write_uint64(&mut view, 2, 258u64).unwrap();
        assert_eq!(view, [0, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(read_uint64(&view, 2).unwrap(), BigInt::from(258));

        assert!(matches!(
            write_uint64(&mut view, 3, 1u64),
            Err(Error::ViewOutOfBounds { offset: 3, len: 10 })
        ));
        assert!(read_int64(&view, usize::MAX).is_err());
    }

    #[test]
    fn test_to_uint32() {
        assert_eq!(to_uint32(-1.0), u32::MAX);
        assert_eq!(to_uint32(4_294_967_296.0), 0);
        assert_eq!(to_uint32(1.9), 1);
        assert_eq!(to_uint32(f64::NAN), 0);
        assert_eq!(to_uint32(f64::INFINITY), 0);
    }
}
