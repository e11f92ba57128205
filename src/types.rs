// ABOUTME: Defines MessagePack tag bytes and the default resource limits.
// ABOUTME: Tag values map directly to the MessagePack specification byte values.

/// Tag bytes for MessagePack values.
/// These match the MessagePack specification exactly.
pub mod tag {
    // Positive fixint: 0x00-0x7f
    pub const POSITIVE_FIXINT_MAX: u8 = 0x7f;

    // Fixed-size containers and strings
    pub const FIXMAP: u8 = 0x80;
    pub const FIXMAP_MAX: u8 = 0x8f;
    pub const FIXARRAY: u8 = 0x90;
    pub const FIXARRAY_MAX: u8 = 0x9f;
    pub const FIXSTR: u8 = 0xa0;
    pub const FIXSTR_MAX: u8 = 0xbf;

    pub const NIL: u8 = 0xc0;
    // 0xc1 is never used; the decoder rejects it
    pub const NEVER_USED: u8 = 0xc1;
    pub const FALSE: u8 = 0xc2;
    pub const TRUE: u8 = 0xc3;

    pub const BIN8: u8 = 0xc4;
    pub const BIN16: u8 = 0xc5;
    pub const BIN32: u8 = 0xc6;

    pub const EXT8: u8 = 0xc7;
    pub const EXT16: u8 = 0xc8;
    pub const EXT32: u8 = 0xc9;

    pub const FLOAT32: u8 = 0xca;
    pub const FLOAT64: u8 = 0xcb;

    pub const UINT8: u8 = 0xcc;
    pub const UINT16: u8 = 0xcd;
    pub const UINT32: u8 = 0xce;
    pub const UINT64: u8 = 0xcf;

    pub const INT8: u8 = 0xd0;
    pub const INT16: u8 = 0xd1;
    pub const INT32: u8 = 0xd2;
    pub const INT64: u8 = 0xd3;

    pub const FIXEXT1: u8 = 0xd4;
    pub const FIXEXT2: u8 = 0xd5;
    pub const FIXEXT4: u8 = 0xd6;
    pub const FIXEXT8: u8 = 0xd7;
    pub const FIXEXT16: u8 = 0xd8;

    pub const STR8: u8 = 0xd9;
    pub const STR16: u8 = 0xda;
    pub const STR32: u8 = 0xdb;

    pub const ARRAY16: u8 = 0xdc;
    pub const ARRAY32: u8 = 0xdd;

    pub const MAP16: u8 = 0xde;
    pub const MAP32: u8 = 0xdf;

    // Negative fixint: 0xe0-0xff
    pub const NEGATIVE_FIXINT_MIN: u8 = 0xe0;

    /// Decode a fixint tag to its value
    #[inline]
    pub const fn fixint_value(tag: u8) -> i8 {
        tag as i8
    }

    /// Entry or element count of a fixmap / fixarray tag
    #[inline]
    pub const fn fix_container_len(tag: u8) -> usize {
        (tag & 0x0f) as usize
    }

    /// Byte length of a fixstr tag
    #[inline]
    pub const fn fixstr_len(tag: u8) -> usize {
        (tag & 0x1f) as usize
    }

    /// Payload size of a fixext tag, or `None` for any other tag
    #[inline]
    pub const fn fixext_len(tag: u8) -> Option<usize> {
        match tag {
            FIXEXT1 => Some(1),
            FIXEXT2 => Some(2),
            FIXEXT4 => Some(4),
            FIXEXT8 => Some(8),
            FIXEXT16 => Some(16),
            _ => None,
        }
    }
}

/// Default resource limits.
pub mod limits {
    /// Default maximum for every length limit (`u32::MAX`, the largest length the
    /// format can declare).
    pub const DEFAULT_MAX_LENGTH: usize = u32::MAX as usize;

    /// Largest integer magnitude an `f64` represents exactly (2^53).
    pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixint_tags() {
        assert_eq!(tag::fixint_value(0x7f), 127);
        assert_eq!(tag::fixint_value(0xff), -1);
        assert_eq!(tag::fixint_value(0xe0), -32);
    }

    #[test]
    fn test_fix_container_tags() {
        assert_eq!(tag::fix_container_len(0x8f), 15);
        assert_eq!(tag::fix_container_len(0x93), 3);
    }

    #[test]
    fn test_fixstr_tags() {
        assert_eq!(tag::fixstr_len(0xa0), 0);
        assert_eq!(tag::fixstr_len(0xbf), 31);
    }

    #[test]
    fn test_fixext_sizes() {
        assert_eq!(tag::fixext_len(tag::FIXEXT1), Some(1));
        assert_eq!(tag::fixext_len(tag::FIXEXT16), Some(16));
        assert_eq!(tag::fixext_len(tag::EXT8), None);
    }
}
