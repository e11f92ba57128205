// ABOUTME: Dynamic value tree produced by the MessagePack decoder.
// ABOUTME: Keeps 64-bit integers exact as BigInt and defines the total order used for key checks.

use crate::extension::{ExtData, Extension, Timestamp};
use crate::types::limits::MAX_SAFE_INTEGER;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;

/// A decoded MessagePack value.
///
/// Integers from the 8/16/32-bit tags and fixints decode to [`Value::Number`]; the
/// 64-bit integer tags always decode to [`Value::BigInt`] so no precision is lost.
/// Map entries keep their wire order and keys may be any value.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// nil
    #[default]
    Nil,
    /// true / false
    Bool(bool),
    /// A float, or an integer from a narrow integer tag
    Number(f64),
    /// An exact integer from a 64-bit integer tag
    BigInt(BigInt),
    /// A UTF-8 string
    Str(String),
    /// Raw bytes
    Bin(Vec<u8>),
    /// An ordered sequence
    Array(Vec<Value>),
    /// Key/value pairs in wire order
    Map(Vec<(Value, Value)>),
    /// An extension value produced by the extension codec
    Ext(Extension),
}

impl Value {
    /// Returns true if this value is nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns true if this value is a boolean.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if this value is any numeric type.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_) | Value::BigInt(_))
    }

    #[must_use]
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    #[must_use]
    pub fn is_bin(&self) -> bool {
        matches!(self, Value::Bin(_))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[must_use]
    pub fn is_ext(&self) -> bool {
        matches!(self, Value::Ext(_))
    }

    /// If this is a boolean, returns the value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If this is an integer that fits in an i64, returns it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Range checked before cast
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(f)
                if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER =>
            {
                Some(*f as i64)
            }
            Value::BigInt(n) => n.to_i64(),
            _ => None,
        }
    }

    /// If this is a non-negative integer that fits in a u64, returns it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Range checked before cast
    #[allow(clippy::cast_sign_loss)] // >= 0 checked before cast
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= MAX_SAFE_INTEGER => {
                Some(*f as u64)
            }
            Value::BigInt(n) => n.to_u64(),
            _ => None,
        }
    }

    /// If this is a number, returns it as f64.
    ///
    /// Big integers beyond 2^53 are rounded to the nearest representable f64.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(f) => Some(*f),
            Value::BigInt(n) => n.to_f64(),
            _ => None,
        }
    }

    /// If this is a big integer, returns a reference to it.
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(n) => Some(n),
            _ => None,
        }
    }

    /// If this is a string, returns a reference to it.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// If this is binary data, returns a reference to it.
    #[must_use]
    pub fn as_bin(&self) -> Option<&[u8]> {
        match self {
            Value::Bin(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Vec<(Value, Value)>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Vec<(Value, Value)>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ext(&self) -> Option<&Extension> {
        match self {
            Value::Ext(e) => Some(e),
            _ => None,
        }
    }

    /// Index into an array. Returns None if not an array or index out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Look up a string key in a map. The first matching entry wins.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Rank of the variant in the cross-kind order.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::BigInt(_) => 3,
            Value::Str(_) => 4,
            Value::Bin(_) => 5,
            Value::Array(_) => 6,
            Value::Map(_) => 7,
            Value::Ext(_) => 8,
        }
    }

    /// Total order over values.
    ///
    /// Values of different kinds order by kind:
    /// `Nil < Bool < Number < BigInt < Str < Bin < Array < Map < Ext`.
    /// Within a kind: numeric order (`-0.0` equals `0.0`; NaN falls back to
    /// `f64::total_cmp`), byte order for
    /// strings and binaries, element-wise for arrays, entry-wise (key, then value) for
    /// maps, and extension type then payload for extensions.
    #[must_use]
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bin(a), Value::Bin(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => cmp_seq(a, b, Value::total_cmp),
            (Value::Map(a), Value::Map(b)) => cmp_seq(a, b, |(ak, av), (bk, bv)| {
                ak.total_cmp(bk).then_with(|| av.total_cmp(bv))
            }),
            (Value::Ext(a), Value::Ext(b)) => cmp_ext(a, b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

fn cmp_seq<T>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match cmp(x, y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_ext(a: &Extension, b: &Extension) -> Ordering {
    fn rank(e: &Extension) -> u8 {
        match e {
            Extension::Timestamp(_) => 0,
            Extension::Raw(_) => 1,
            Extension::Value { .. } => 2,
        }
    }
    a.ext_type()
        .cmp(&b.ext_type())
        .then_with(|| match (a, b) {
            (Extension::Timestamp(x), Extension::Timestamp(y)) => x.cmp(y),
            (Extension::Raw(x), Extension::Raw(y)) => x.data.cmp(&y.data),
            (Extension::Value { value: x, .. }, Extension::Value { value: y, .. }) => {
                x.total_cmp(y)
            }
            _ => rank(a).cmp(&rank(b)),
        })
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bin(b) => write!(f, "Bin({b:02x?})"),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Value::Ext(e) => f.debug_tuple("Ext").field(e).finish(),
        }
    }
}

// Human-readable, JSON-like output
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.is_finite() {
                    write!(f, "{n}")
                } else if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_sign_positive() {
                    write!(f, "Infinity")
                } else {
                    write!(f, "-Infinity")
                }
            }
            Value::BigInt(n) => write!(f, "{n}n"),
            Value::Str(s) => write!(f, "\"{}\"", s.escape_default()),
            Value::Bin(b) => {
                write!(f, "<")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, ">")
            }
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Ext(Extension::Timestamp(ts)) => write!(f, "Timestamp({ts})"),
            Value::Ext(Extension::Raw(raw)) => {
                write!(f, "Ext({}, {} bytes)", raw.ext_type, raw.data.len())
            }
            Value::Ext(Extension::Value { ext_type, value }) => {
                write!(f, "Ext({ext_type}, {value})")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(f64::from(n))
                }
            }
        )*
    };
}

from_number!(i8, i16, i32, u8, u16, u32, f32, f64);

// 64-bit integers take the same exact path as the 64-bit wire tags
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::BigInt(BigInt::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::BigInt(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bin(b.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Extension> for Value {
    fn from(e: Extension) -> Self {
        Value::Ext(e)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Ext(Extension::Timestamp(ts))
    }
}

impl From<ExtData> for Value {
    fn from(data: ExtData) -> Self {
        Value::Ext(Extension::Raw(data))
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

/// Macro for building values.
///
/// Map entries use `key => value` and keep the written order; keys can be any value.
///
/// ```rust
/// use msgpack_value::msgpack;
///
/// let value = msgpack!({
///     "name" => "test",
///     "values" => [1, 2, 3],
///     1 => nil
/// });
/// assert_eq!(value.get_key("name").and_then(|v| v.as_str()), Some("test"));
/// ```
#[macro_export]
macro_rules! msgpack {
    (nil) => {
        $crate::Value::Nil
    };

    (true) => {
        $crate::Value::Bool(true)
    };
    (false) => {
        $crate::Value::Bool(false)
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![ $( $crate::msgpack!($elem) ),* ])
    };

    ({ $($key:tt => $value:tt),* $(,)? }) => {
        $crate::Value::Map(vec![ $( ($crate::msgpack!($key), $crate::msgpack!($value)) ),* ])
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(Value::Nil.is_nil());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::Number(1.5).is_number());
        assert!(Value::BigInt(BigInt::from(7)).is_number());
        assert!(Value::Str("x".into()).is_str());
        assert!(Value::Bin(vec![1]).is_bin());
        assert!(Value::Array(vec![]).is_array());
        assert!(Value::Map(vec![]).is_map());
        assert!(Value::from(Timestamp::new(0, 0)).is_ext());
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Number(42.0).as_i64(), Some(42));
        assert_eq!(Value::Number(-3.0).as_u64(), None);
        assert_eq!(Value::Number(1.5).as_i64(), None);
        assert_eq!(Value::BigInt(BigInt::from(u64::MAX)).as_u64(), Some(u64::MAX));
        assert_eq!(Value::BigInt(BigInt::from(u64::MAX)).as_i64(), None);
        assert_eq!(Value::BigInt(BigInt::from(-5)).as_f64(), Some(-5.0));
    }

    #[test]
    fn test_kind_order() {
        let ordered = [
            Value::Nil,
            Value::Bool(false),
            Value::Number(1e300),
            Value::BigInt(BigInt::from(-1)),
            Value::Str(String::new()),
            Value::Bin(vec![]),
            Value::Array(vec![]),
            Value::Map(vec![]),
            Value::from(ExtData::new(0, vec![])),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].total_cmp(&pair[1]), Ordering::Less, "{pair:?}");
        }
    }

    #[test]
    fn test_within_kind_order() {
        assert_eq!(Value::Number(-1.0).total_cmp(&Value::Number(2.0)), Ordering::Less);
        assert_eq!(Value::from("ab").total_cmp(&Value::from("b")), Ordering::Less);
        assert_eq!(Value::from("ab").total_cmp(&Value::from("a")), Ordering::Greater);
        assert_eq!(
            msgpack!([1, 2]).total_cmp(&msgpack!([1, 2, 0])),
            Ordering::Less
        );
        assert_eq!(
            msgpack!({"a" => 1}).total_cmp(&msgpack!({"a" => 2})),
            Ordering::Less
        );
        assert_eq!(
            Value::from(Timestamp::new(5, 0)).total_cmp(&Value::from(Timestamp::new(5, 1))),
            Ordering::Less
        );
        assert_eq!(Value::Nil.total_cmp(&Value::Nil), Ordering::Equal);
        assert_eq!(Value::Number(-0.0).total_cmp(&Value::Number(0.0)), Ordering::Equal);
        assert_eq!(
            Value::Number(f64::NAN).total_cmp(&Value::Number(f64::INFINITY)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_macro_and_get_key() {
        let v = msgpack!({
            "name" => "test",
            1 => [true, nil]
        });
        assert_eq!(v.get_key("name").and_then(Value::as_str), Some("test"));
        assert_eq!(v.as_map().map(Vec::len), Some(2));
        let (k, inner) = &v.as_map().unwrap()[1];
        assert_eq!(k, &Value::Number(1.0));
        assert_eq!(inner.get(1), Some(&Value::Nil));
    }

    #[test]
    fn test_display() {
        let v = msgpack!({"a" => [1, "x"]});
        assert_eq!(v.to_string(), "{\"a\": [1, \"x\"]}");
        assert_eq!(Value::from(u64::MAX).to_string(), "18446744073709551615n");
        assert_eq!(Value::Bin(vec![0xde, 0xad]).to_string(), "<dead>");
    }
}
