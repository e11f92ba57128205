// ABOUTME: Tag-dispatch MessagePack decoder with an explicit container stack.
// ABOUTME: Drives both the synchronous entry points and the incremental feed/next_value API.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, LimitKind, Result};
use crate::extension::{ExtensionCodec, ExtensionRegistry};
use crate::int64::{read_int64, read_uint64};
use crate::limits::LimitPolicy;
use crate::types::tag;
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Validate and convert bytes to a UTF-8 string.
/// Uses simdutf8 for SIMD-accelerated validation when the feature is enabled.
#[cfg(feature = "simd-utf8")]
#[inline]
fn validate_utf8(bytes: &[u8], offset: usize) -> Result<&str> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { offset })
}

#[cfg(not(feature = "simd-utf8"))]
#[inline]
fn validate_utf8(bytes: &[u8], offset: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { offset })
}

/// Configuration options for decoding.
#[derive(Clone)]
pub struct DecodeOptions {
    /// Resolves extension payloads (default: lenient [`ExtensionRegistry`])
    pub extension_codec: Arc<dyn ExtensionCodec + Send + Sync>,
    /// Length limits and key ordering
    pub limits: LimitPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            extension_codec: Arc::new(ExtensionRegistry::new()),
            limits: LimitPolicy::default(),
        }
    }
}

impl DecodeOptions {
    /// Default options with the given limit policy.
    #[must_use]
    pub fn with_limits(limits: LimitPolicy) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Replace the extension codec.
    #[must_use]
    pub fn extension_codec(mut self, codec: impl ExtensionCodec + Send + Sync + 'static) -> Self {
        self.extension_codec = Arc::new(codec);
        self
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// A container under construction.
#[derive(Debug)]
enum Frame {
    Array {
        remaining: usize,
        items: Vec<Value>,
    },
    Map {
        remaining: usize,
        entries: Vec<(Value, Value)>,
        /// Key waiting for its value
        key: Option<Value>,
    },
}

impl Frame {
    /// Add a finished child. Returns true once every child has arrived.
    fn accept(&mut self, value: Value, sorted_keys: bool, offset: usize) -> Result<bool> {
        match self {
            Frame::Array { remaining, items } => {
                items.push(value);
                *remaining -= 1;
                Ok(*remaining == 0)
            }
            Frame::Map {
                remaining,
                entries,
                key,
            } => match key.take() {
                None => {
                    if sorted_keys {
                        if let Some((prev, _)) = entries.last() {
                            if value.total_cmp(prev) != Ordering::Greater {
                                return Err(Error::KeyOrderViolation { offset });
                            }
                        }
                    }
                    *key = Some(value);
                    Ok(false)
                }
                Some(k) => {
                    entries.push((k, value));
                    *remaining -= 1;
                    Ok(*remaining == 0)
                }
            },
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::Array { items, .. } => Value::Array(items),
            Frame::Map { entries, .. } => Value::Map(entries),
        }
    }
}

/// One step of the tag dispatch.
enum Item {
    Leaf(Value),
    Array(usize),
    Map(usize),
}

/// Read position over a byte slice. `base` is the absolute offset of `data[0]`
/// within the whole stream.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    fn offset(&self) -> usize {
        self.base + self.pos
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read exactly n bytes.
    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(Error::IncompleteInput {
                offset: self.offset(),
                needed: n - available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }
}

/// Decode one item: a leaf value or a container header.
fn read_item(cur: &mut Cursor<'_>, options: &DecodeOptions) -> Result<Item> {
    let start = cur.offset();
    let tc = cur.read_u8()?;
    let limits = &options.limits;

    let item = match tc {
        0x00..=tag::POSITIVE_FIXINT_MAX => Item::Leaf(Value::Number(f64::from(tc))),
        tag::FIXMAP..=tag::FIXMAP_MAX => {
            container(limits, LimitKind::Map, tag::fix_container_len(tc))?
        }
        tag::FIXARRAY..=tag::FIXARRAY_MAX => {
            container(limits, LimitKind::Array, tag::fix_container_len(tc))?
        }
        tag::FIXSTR..=tag::FIXSTR_MAX => Item::Leaf(read_str(cur, limits, tag::fixstr_len(tc))?),
        tag::NIL => Item::Leaf(Value::Nil),
        tag::FALSE => Item::Leaf(Value::Bool(false)),
        tag::TRUE => Item::Leaf(Value::Bool(true)),

        tag::BIN8 => {
            let len = usize::from(cur.read_u8()?);
            Item::Leaf(read_bin(cur, limits, len)?)
        }
        tag::BIN16 => {
            let len = usize::from(cur.read_u16()?);
            Item::Leaf(read_bin(cur, limits, len)?)
        }
        tag::BIN32 => {
            let len = cur.read_u32()? as usize;
            Item::Leaf(read_bin(cur, limits, len)?)
        }

        tag::EXT8 => {
            let len = usize::from(cur.read_u8()?);
            Item::Leaf(read_ext(cur, options, len)?)
        }
        tag::EXT16 => {
            let len = usize::from(cur.read_u16()?);
            Item::Leaf(read_ext(cur, options, len)?)
        }
        tag::EXT32 => {
            let len = cur.read_u32()? as usize;
            Item::Leaf(read_ext(cur, options, len)?)
        }

        tag::FLOAT32 => Item::Leaf(Value::Number(f64::from(f32::from_be_bytes(cur.read_array()?)))),
        tag::FLOAT64 => Item::Leaf(Value::Number(f64::from_be_bytes(cur.read_array()?))),

        tag::UINT8 => Item::Leaf(Value::Number(f64::from(cur.read_u8()?))),
        tag::UINT16 => Item::Leaf(Value::Number(f64::from(cur.read_u16()?))),
        tag::UINT32 => Item::Leaf(Value::Number(f64::from(cur.read_u32()?))),
        tag::UINT64 => Item::Leaf(Value::BigInt(read_uint64(cur.take(8)?, 0)?)),

        tag::INT8 => Item::Leaf(Value::Number(f64::from(i8::from_be_bytes(cur.read_array()?)))),
        tag::INT16 => Item::Leaf(Value::Number(f64::from(i16::from_be_bytes(cur.read_array()?)))),
        tag::INT32 => Item::Leaf(Value::Number(f64::from(i32::from_be_bytes(cur.read_array()?)))),
        tag::INT64 => Item::Leaf(Value::BigInt(read_int64(cur.take(8)?, 0)?)),

        tag::FIXEXT1..=tag::FIXEXT16 => {
            let len = tag::fixext_len(tc).unwrap_or_default();
            Item::Leaf(read_ext(cur, options, len)?)
        }

        tag::STR8 => {
            let len = usize::from(cur.read_u8()?);
            Item::Leaf(read_str(cur, limits, len)?)
        }
        tag::STR16 => {
            let len = usize::from(cur.read_u16()?);
            Item::Leaf(read_str(cur, limits, len)?)
        }
        tag::STR32 => {
            let len = cur.read_u32()? as usize;
            Item::Leaf(read_str(cur, limits, len)?)
        }

        tag::ARRAY16 => {
            let len = usize::from(cur.read_u16()?);
            container(limits, LimitKind::Array, len)?
        }
        tag::ARRAY32 => {
            let len = cur.read_u32()? as usize;
            container(limits, LimitKind::Array, len)?
        }
        tag::MAP16 => {
            let len = usize::from(cur.read_u16()?);
            container(limits, LimitKind::Map, len)?
        }
        tag::MAP32 => {
            let len = cur.read_u32()? as usize;
            container(limits, LimitKind::Map, len)?
        }

        tag::NEGATIVE_FIXINT_MIN..=0xff => {
            Item::Leaf(Value::Number(f64::from(tag::fixint_value(tc))))
        }

        tag::NEVER_USED => return Err(Error::UnrecognizedTag { tag: tc, offset: start }),
    };
    Ok(item)
}

#[inline]
fn container(limits: &LimitPolicy, kind: LimitKind, len: usize) -> Result<Item> {
    limits.check(kind, len)?;
    Ok(match kind {
        LimitKind::Map => Item::Map(len),
        _ => Item::Array(len),
    })
}

fn read_str(cur: &mut Cursor<'_>, limits: &LimitPolicy, len: usize) -> Result<Value> {
    limits.check(LimitKind::Str, len)?;
    let offset = cur.offset();
    let bytes = cur.take(len)?;
    Ok(Value::Str(validate_utf8(bytes, offset)?.to_owned()))
}

fn read_bin(cur: &mut Cursor<'_>, limits: &LimitPolicy, len: usize) -> Result<Value> {
    limits.check(LimitKind::Bin, len)?;
    Ok(Value::Bin(cur.take(len)?.to_vec()))
}

fn read_ext(cur: &mut Cursor<'_>, options: &DecodeOptions, len: usize) -> Result<Value> {
    options.limits.check(LimitKind::Ext, len)?;
    let ext_type = i8::from_be_bytes(cur.read_array()?);
    let data = cur.take(len)?;
    let ext = options.extension_codec.decode_extension(ext_type, data)?;
    Ok(Value::Ext(ext))
}

/// Decode one complete top-level value, continuing whatever containers are already
/// on `stack`.
///
/// On `IncompleteInput` the cursor is rewound to the start of the unfinished item and
/// the stack keeps every finished child, so the call can be repeated once more bytes
/// are available.
fn decode_value(
    cur: &mut Cursor<'_>,
    stack: &mut Vec<Frame>,
    options: &DecodeOptions,
) -> Result<Value> {
    let sorted_keys = options.limits.sorted_keys;
    loop {
        let start = cur.pos;
        let item = match read_item(cur, options) {
            Ok(item) => item,
            Err(err) => {
                if err.is_incomplete() {
                    cur.pos = start;
                }
                return Err(err);
            }
        };

        let mut value = match item {
            Item::Leaf(value) => value,
            Item::Array(0) => Value::Array(Vec::new()),
            Item::Map(0) => Value::Map(Vec::new()),
            Item::Array(n) => {
                // every element takes at least one byte
                let items = Vec::with_capacity(n.min(cur.remaining()));
                stack.push(Frame::Array { remaining: n, items });
                continue;
            }
            Item::Map(n) => {
                let entries = Vec::with_capacity(n.min(cur.remaining() / 2));
                stack.push(Frame::Map {
                    remaining: n,
                    entries,
                    key: None,
                });
                continue;
            }
        };

        // Fold the finished value into its parents until one is still waiting.
        loop {
            let Some(mut frame) = stack.pop() else {
                return Ok(value);
            };
            if frame.accept(value, sorted_keys, cur.offset())? {
                value = frame.into_value();
            } else {
                stack.push(frame);
                break;
            }
        }
    }
}

/// Decode exactly one value from a complete buffer.
///
/// Truncated input fails with [`Error::IncompleteInput`]; bytes after the value fail
/// with [`Error::ExtraBytes`].
pub fn decode_single_sync(data: &[u8], options: &DecodeOptions) -> Result<Value> {
    let mut cur = Cursor {
        data,
        pos: 0,
        base: 0,
    };
    let mut stack = Vec::new();
    let value = decode_value(&mut cur, &mut stack, options)?;
    if cur.pos < data.len() {
        return Err(Error::ExtraBytes {
            offset: cur.pos,
            count: data.len() - cur.pos,
        });
    }
    Ok(value)
}

/// Iterator over consecutive top-level values in one complete buffer.
///
/// Stops after the first error.
pub struct DecodeMulti<'a> {
    data: &'a [u8],
    pos: usize,
    options: DecodeOptions,
    failed: bool,
}

impl<'a> DecodeMulti<'a> {
    #[must_use]
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            data,
            pos: 0,
            options,
            failed: false,
        }
    }

    /// Absolute offset of the next value.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for DecodeMulti<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let mut cur = Cursor {
            data: self.data,
            pos: self.pos,
            base: 0,
        };
        let mut stack = Vec::new();
        let result = decode_value(&mut cur, &mut stack, &self.options);
        self.pos = cur.pos;
        self.failed = result.is_err();
        Some(result)
    }
}

/// Incremental decoder fed from a sequence of partial buffers.
///
/// ```rust
/// use msgpack_value::{Decoder, Value};
///
/// let mut decoder = Decoder::new();
/// decoder.feed(&[0x92, 0x01]);
/// assert_eq!(decoder.next_value().unwrap(), None);
/// decoder.feed(&[0x02]);
/// assert_eq!(
///     decoder.next_value().unwrap(),
///     Some(Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
/// );
/// ```
#[derive(Debug, Default)]
pub struct Decoder {
    buffer: Vec<u8>,
    /// Read position within `buffer`
    pos: usize,
    /// Absolute stream offset of `buffer[0]`
    base: usize,
    stack: Vec<Frame>,
    options: DecodeOptions,
    failed: Option<Error>,
}

impl Decoder {
    /// Create a new incremental decoder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new incremental decoder with custom options.
    #[must_use]
    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Append more input. Bytes already consumed are released first.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.base += self.pos;
            self.pos = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Decode the next complete value.
    ///
    /// Returns `Ok(None)` when the buffered input ends inside a value; feed more
    /// bytes and call again. After any other error the decoder is unusable and keeps
    /// returning that error.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.stack.is_empty() && self.pos == self.buffer.len() {
            return Ok(None);
        }
        let mut cur = Cursor {
            data: &self.buffer,
            pos: self.pos,
            base: self.base,
        };
        let result = decode_value(&mut cur, &mut self.stack, &self.options);
        self.pos = cur.pos;
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_incomplete() => Ok(None),
            Err(err) => {
                self.stack.clear();
                self.failed = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Absolute stream offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Number of bytes fed but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Number of containers currently under construction.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Get the decoder options.
    #[must_use]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Finish the stream.
    ///
    /// Fails with [`Error::IncompleteInput`] if a value was left half decoded, or with
    /// [`Error::ExtraBytes`] if a complete value was fed but never read.
    pub fn finish(mut self) -> Result<()> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        if self.stack.is_empty() && self.pos == self.buffer.len() {
            return Ok(());
        }
        let offset = self.position();
        let count = self.buffered();
        let mut cur = Cursor {
            data: &self.buffer,
            pos: self.pos,
            base: self.base,
        };
        decode_value(&mut cur, &mut self.stack, &self.options)?;
        Err(Error::ExtraBytes { offset, count })
    }
}
