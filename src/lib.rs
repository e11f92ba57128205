// ABOUTME: MessagePack value decoder for Rust with exact 64-bit integers and resource limits.
// ABOUTME: Exposes synchronous, multi-value and incremental decoding plus a mirror encoder.

//! # msgpack_value
//!
//! Decodes MessagePack bytes into a dynamically typed [`Value`] tree.
//!
//! - Integers on the 64-bit tags decode to exact [`num_bigint::BigInt`]s; all other
//!   numbers decode to `f64`.
//! - Containers are built with an explicit stack, so nesting depth never touches the
//!   native call stack, and decoding can pause mid-container when input runs out.
//! - Every declared length is checked against a [`LimitPolicy`] before anything is
//!   allocated for it.
//!
//! ## Quick Start
//!
//! ```rust
//! use msgpack_value::{decode, encode_value, msgpack};
//!
//! let value = msgpack!({
//!     "name" => "test",
//!     "values" => [1, 2, 3],
//!     "active" => true
//! });
//!
//! let bytes = encode_value(&value).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(decoded.get_key("name").and_then(|v| v.as_str()), Some("test"));
//! ```
//!
//! ## Incremental Decoding
//!
//! ```rust
//! use msgpack_value::{Decoder, Value};
//!
//! let mut decoder = Decoder::new();
//! decoder.feed(&[0xa5, b'h', b'e']);
//! assert_eq!(decoder.next_value().unwrap(), None);
//! decoder.feed(&[b'l', b'l', b'o']);
//! assert_eq!(decoder.next_value().unwrap(), Some(Value::Str("hello".into())));
//! ```
//!
//! ## Resource Limits
//!
//! Every limit defaults to 2^32 - 1, the largest length the format can declare:
//! - Maximum string length (bytes)
//! - Maximum binary length (bytes)
//! - Maximum array length (elements)
//! - Maximum map length (entries)
//! - Maximum extension payload length (bytes)

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod int64;
pub mod limits;
pub mod types;
pub mod value;

// Re-export commonly used items at the crate root
pub use decoder::{decode_single_sync, DecodeMulti, DecodeOptions, Decoder};
pub use encoder::{encode_value, Encoder};
pub use error::{Error, LimitKind, Result};
pub use extension::{
    ExtData, Extension, ExtensionCodec, ExtensionRegistry, Timestamp, TIMESTAMP_EXT_TYPE,
};
pub use int64::{read_int64, read_uint64, write_int64, write_uint64, Int64Input};
pub use limits::LimitPolicy;
pub use types::tag;
pub use value::Value;

// The msgpack! macro is automatically exported at crate root via #[macro_export]

use crate::types::limits::MAX_SAFE_INTEGER;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Decode a single MessagePack value with default options.
///
/// # Example
///
/// ```rust
/// use msgpack_value::{decode, Value};
///
/// let value = decode(&[0x93, 0x01, 0x02, 0x03]).unwrap(); // [1, 2, 3]
/// assert!(value.is_array());
/// assert_eq!(value.get(2), Some(&Value::Number(3.0)));
/// ```
pub fn decode(data: &[u8]) -> Result<Value> {
    decode_single_sync(data, &DecodeOptions::default())
}

/// Decode a single MessagePack value with custom options.
pub fn decode_with_options(data: &[u8], options: &DecodeOptions) -> Result<Value> {
    decode_single_sync(data, options)
}

/// Decode every top-level value in `data`, in order.
///
/// ```rust
/// use msgpack_value::{decode_multi, DecodeOptions, Value};
///
/// let values: Vec<Value> = decode_multi(&[0x01, 0xc3], DecodeOptions::default())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(values, vec![Value::Number(1.0), Value::Bool(true)]);
/// ```
pub fn decode_multi(data: &[u8], options: DecodeOptions) -> DecodeMulti<'_> {
    DecodeMulti::new(data, options)
}

/// Decode exactly one value from a sequence of byte chunks.
///
/// Fails with [`Error::ExtraBytes`] if anything follows the value and with
/// [`Error::IncompleteInput`] if the chunks end before it is complete.
pub fn decode_chunks<I, B>(chunks: I, options: &DecodeOptions) -> Result<Value>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut decoder = Decoder::with_options(options.clone());
    let mut result = None;
    for chunk in chunks {
        decoder.feed(chunk.as_ref());
        if result.is_none() {
            result = decoder.next_value()?;
        }
        if result.is_some() && decoder.buffered() > 0 {
            return Err(Error::ExtraBytes {
                offset: decoder.position(),
                count: decoder.buffered(),
            });
        }
    }
    match result {
        Some(value) => Ok(value),
        None => {
            let offset = decoder.position();
            decoder.finish()?;
            // nothing was fed at all
            Err(Error::IncompleteInput { offset, needed: 1 })
        }
    }
}

/// Encode a `Value` to a writer.
pub fn encode_value_to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encoder.write_value(value)
}

// Implement Serialize for Value
impl Serialize for Value {
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                // Whole numbers keep their integer form in formats that distinguish them;
                // -0.0 stays a float so the sign survives
                let negative_zero = *n == 0.0 && n.is_sign_negative();
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER && !negative_zero {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::BigInt(n) => {
                if let Some(v) = n.to_i64() {
                    serializer.serialize_i64(v)
                } else if let Some(v) = n.to_u64() {
                    serializer.serialize_u64(v)
                } else {
                    serializer.collect_str(n)
                }
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bin(b) => serializer.serialize_bytes(b),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                use serde::ser::SerializeMap;
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (key, val) in map {
                    m.serialize_entry(key, val)?;
                }
                m.end()
            }
            Value::Ext(Extension::Timestamp(ts)) => ts.serialize(serializer),
            Value::Ext(Extension::Raw(raw)) => raw.serialize(serializer),
            Value::Ext(Extension::Value { ext_type, value }) => {
                (ext_type, value.as_ref()).serialize(serializer)
            }
        }
    }
}

fn number_from_i64(v: i64) -> Value {
    if v.unsigned_abs() <= 1 << 53 {
        Value::Number(v as f64)
    } else {
        Value::BigInt(BigInt::from(v))
    }
}

// Implement Deserialize for Value
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "any valid MessagePack value")
            }

            fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
                Ok(number_from_i64(v))
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
                if v <= 1 << 53 {
                    Ok(Value::Number(v as f64))
                } else {
                    Ok(Value::BigInt(BigInt::from(v)))
                }
            }

            fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
                Ok(Value::Number(v))
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
                Ok(Value::Str(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
                Ok(Value::Str(v))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Value, E> {
                Ok(Value::Bin(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Bin(v))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D: serde::Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Value, D::Error> {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Value, A::Error> {
                let mut arr = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(elem) = seq.next_element()? {
                    arr.push(elem);
                }
                Ok(Value::Array(arr))
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, val)) = map.next_entry::<Value, Value>()? {
                    entries.push((key, val));
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgpack;

    #[test]
    fn test_value_roundtrip() {
        let value = msgpack!({
            "name" => "test",
            "values" => [1, 2, 3],
            "nested" => {
                "flag" => true,
                nil => [1.5]
            }
        });

        let bytes = encode_value(&value).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_chunks() {
        let bytes = encode_value(&msgpack!(["abc", {"k" => 300}])).unwrap();
        let chunks: Vec<&[u8]> = bytes.chunks(2).collect();
        assert_eq!(
            decode_chunks(chunks, &DecodeOptions::default()).unwrap(),
            decode(&bytes).unwrap()
        );
    }

    #[test]
    fn test_decode_chunks_errors() {
        let options = DecodeOptions::default();
        assert_eq!(
            decode_chunks([&[0x01u8][..], &[0x02][..]], &options),
            Err(Error::ExtraBytes { offset: 1, count: 1 })
        );
        assert_eq!(
            decode_chunks([&[0x92u8, 0x01][..]], &options),
            Err(Error::IncompleteInput { offset: 2, needed: 1 })
        );
        assert_eq!(
            decode_chunks(Vec::<Vec<u8>>::new(), &options),
            Err(Error::IncompleteInput { offset: 0, needed: 1 })
        );
    }

    #[test]
    fn test_serialize_to_json() {
        let value = msgpack!({"a" => [1, 2.5, nil], "b" => true});
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"a":[1,2.5,null],"b":true}"#);

        let big = Value::BigInt(BigInt::from(u64::MAX));
        assert_eq!(serde_json::to_string(&big).unwrap(), "18446744073709551615");
        let huge = Value::BigInt(BigInt::from(u64::MAX) * 2);
        assert_eq!(serde_json::to_string(&huge).unwrap(), "\"36893488147419103230\"");
    }

    #[test]
    fn test_serialize_keeps_negative_zero() {
        assert_eq!(serde_json::to_string(&Value::Number(-0.0)).unwrap(), "-0.0");
        assert_eq!(serde_json::to_string(&Value::Number(0.0)).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Value::Number(-3.0)).unwrap(), "-3");
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"{"x": [1, -2, 0.5, "s"], "n": null}"#).unwrap();
        assert_eq!(
            value,
            msgpack!({"x" => [1, (-2), 0.5, "s"], "n" => nil})
        );

        // beyond 2^53 stays exact
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value, Value::BigInt(BigInt::from(u64::MAX)));
        let value: Value = serde_json::from_str("-9223372036854775808").unwrap();
        assert_eq!(value, Value::BigInt(BigInt::from(i64::MIN)));
    }

    #[test]
    fn test_encode_to_writer() {
        let mut buf = Vec::new();
        encode_value_to_writer(&mut buf, &Value::from("hi")).unwrap();
        assert_eq!(buf, vec![0xa2, b'h', b'i']);
    }
}
