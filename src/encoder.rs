// ABOUTME: MessagePack encoder that mirrors the decoder, choosing the smallest encoding per value.
// ABOUTME: 64-bit integers are written through the int64 word codec.

#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::int64::{write_int64, write_uint64};
use crate::types::tag;
use crate::value::Value;
use num_bigint::{BigInt, Sign};
use std::io::Write;

/// A MessagePack encoder that writes to any [`Write`] sink.
pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new encoder that writes to the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.writer.write_all(&[byte])?;
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    pub fn write_nil(&mut self) -> Result<()> {
        self.write_byte(tag::NIL)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(if value { tag::TRUE } else { tag::FALSE })
    }

    /// Encode a number.
    ///
    /// Integral values in `[-2^31, 2^32 - 1]` use the smallest integer tag. Everything
    /// else, including `-0.0`, NaN and the infinities, is written as float64 so it
    /// decodes back to the same [`Value::Number`].
    #[allow(clippy::float_cmp)]
    pub fn write_number(&mut self, value: f64) -> Result<()> {
        let integral = value.fract() == 0.0 && !(value == 0.0 && value.is_sign_negative());
        if integral && (0.0..=f64::from(u32::MAX)).contains(&value) {
            return self.write_unsigned(value as u32);
        }
        if integral && (f64::from(i32::MIN)..0.0).contains(&value) {
            return self.write_signed(value as i32);
        }
        self.write_byte(tag::FLOAT64)?;
        self.write_bytes(&value.to_be_bytes())
    }

    fn write_unsigned(&mut self, value: u32) -> Result<()> {
        if value <= u32::from(tag::POSITIVE_FIXINT_MAX) {
            self.write_byte(value as u8)
        } else if let Ok(v) = u8::try_from(value) {
            self.write_bytes(&[tag::UINT8, v])
        } else if let Ok(v) = u16::try_from(value) {
            self.write_byte(tag::UINT16)?;
            self.write_bytes(&v.to_be_bytes())
        } else {
            self.write_byte(tag::UINT32)?;
            self.write_bytes(&value.to_be_bytes())
        }
    }

    // Only called for negative values.
    fn write_signed(&mut self, value: i32) -> Result<()> {
        if value >= -32 {
            self.write_bytes(&(value as i8).to_be_bytes())
        } else if let Ok(v) = i8::try_from(value) {
            self.write_byte(tag::INT8)?;
            self.write_bytes(&v.to_be_bytes())
        } else if let Ok(v) = i16::try_from(value) {
            self.write_byte(tag::INT16)?;
            self.write_bytes(&v.to_be_bytes())
        } else {
            self.write_byte(tag::INT32)?;
            self.write_bytes(&value.to_be_bytes())
        }
    }

    /// Encode an exact integer on the 64-bit tags: `uint 64` when non-negative,
    /// `int 64` otherwise.
    pub fn write_bigint(&mut self, value: &BigInt) -> Result<()> {
        let mut buf = [0u8; 9];
        if value.sign() == Sign::Minus {
            buf[0] = tag::INT64;
            write_int64(&mut buf, 1, value)?;
        } else {
            buf[0] = tag::UINT64;
            write_uint64(&mut buf, 1, value)?;
        }
        self.write_bytes(&buf)
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let len = length_u32(value.len(), "str 32 length")?;
        if len <= 31 {
            self.write_byte(tag::FIXSTR | len as u8)?;
        } else if let Ok(n) = u8::try_from(len) {
            self.write_bytes(&[tag::STR8, n])?;
        } else if let Ok(n) = u16::try_from(len) {
            self.write_byte(tag::STR16)?;
            self.write_bytes(&n.to_be_bytes())?;
        } else {
            self.write_byte(tag::STR32)?;
            self.write_bytes(&len.to_be_bytes())?;
        }
        self.write_bytes(value.as_bytes())
    }

    pub fn write_bin(&mut self, value: &[u8]) -> Result<()> {
        let len = length_u32(value.len(), "bin 32 length")?;
        self.write_sized(len, [tag::BIN8, tag::BIN16, tag::BIN32])?;
        self.write_bytes(value)
    }

    /// Write an array header; the caller then writes `len` values.
    pub fn write_array_len(&mut self, len: usize) -> Result<()> {
        let len = length_u32(len, "array 32 length")?;
        if len <= 15 {
            self.write_byte(tag::FIXARRAY | len as u8)
        } else {
            self.write_wide(len, tag::ARRAY16, tag::ARRAY32)
        }
    }

    /// Write a map header; the caller then writes `len` key/value pairs.
    pub fn write_map_len(&mut self, len: usize) -> Result<()> {
        let len = length_u32(len, "map 32 length")?;
        if len <= 15 {
            self.write_byte(tag::FIXMAP | len as u8)
        } else {
            self.write_wide(len, tag::MAP16, tag::MAP32)
        }
    }

    /// Write an extension value with the given type byte and payload.
    pub fn write_ext(&mut self, ext_type: i8, data: &[u8]) -> Result<()> {
        let fixed = match data.len() {
            1 => Some(tag::FIXEXT1),
            2 => Some(tag::FIXEXT2),
            4 => Some(tag::FIXEXT4),
            8 => Some(tag::FIXEXT8),
            16 => Some(tag::FIXEXT16),
            _ => None,
        };
        match fixed {
            Some(tc) => self.write_byte(tc)?,
            None => {
                let len = length_u32(data.len(), "ext 32 length")?;
                self.write_sized(len, [tag::EXT8, tag::EXT16, tag::EXT32])?;
            }
        }
        self.write_bytes(&ext_type.to_be_bytes())?;
        self.write_bytes(data)
    }

    pub fn write_extension(&mut self, ext: &Extension) -> Result<()> {
        match ext {
            Extension::Timestamp(ts) => self.write_ext(ext.ext_type(), &ts.to_payload()),
            Extension::Raw(raw) => self.write_ext(raw.ext_type, &raw.data),
            Extension::Value { ext_type, value } => {
                self.write_ext(*ext_type, &encode_value(value)?)
            }
        }
    }

    /// Encode a whole value tree.
    ///
    /// Containers are walked with an explicit stack, so nesting depth is bounded only
    /// by memory.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let mut pending = vec![value];
        while let Some(value) = pending.pop() {
            match value {
                Value::Nil => self.write_nil()?,
                Value::Bool(b) => self.write_bool(*b)?,
                Value::Number(n) => self.write_number(*n)?,
                Value::BigInt(n) => self.write_bigint(n)?,
                Value::Str(s) => self.write_str(s)?,
                Value::Bin(b) => self.write_bin(b)?,
                Value::Ext(e) => self.write_extension(e)?,
                Value::Array(items) => {
                    self.write_array_len(items.len())?;
                    pending.extend(items.iter().rev());
                }
                Value::Map(entries) => {
                    self.write_map_len(entries.len())?;
                    for (k, v) in entries.iter().rev() {
                        pending.push(v);
                        pending.push(k);
                    }
                }
            }
        }
        Ok(())
    }

    // 8/16/32-bit length prefix selected by size.
    fn write_sized(&mut self, len: u32, tags: [u8; 3]) -> Result<()> {
        if let Ok(n) = u8::try_from(len) {
            self.write_bytes(&[tags[0], n])
        } else {
            self.write_wide(len, tags[1], tags[2])
        }
    }

    fn write_wide(&mut self, len: u32, tag16: u8, tag32: u8) -> Result<()> {
        if let Ok(n) = u16::try_from(len) {
            self.write_byte(tag16)?;
            self.write_bytes(&n.to_be_bytes())
        } else {
            self.write_byte(tag32)?;
            self.write_bytes(&len.to_be_bytes())
        }
    }
}

#[inline]
fn length_u32(len: usize, target: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::Overflow {
        value: len.to_string(),
        target,
    })
}

/// Encode a value to a byte vector.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.write_value(value)?;
    Ok(encoder.into_inner())
}
