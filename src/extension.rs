// ABOUTME: Extension codec interface and the default registry of extension decoders.
// ABOUTME: Includes the standard timestamp extension (type -1) in all three layouts.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Extension type reserved for timestamps.
pub const TIMESTAMP_EXT_TYPE: i8 = -1;

/// Resolves an extension type byte and its payload into an application value.
///
/// The decoder calls this exactly once per extension-tagged value and inserts the
/// result into the tree without inspecting it.
pub trait ExtensionCodec {
    fn decode_extension(&self, ext_type: i8, data: &[u8]) -> Result<Extension>;
}

/// A decoded extension value.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// The standard timestamp extension.
    Timestamp(Timestamp),
    /// An extension no decoder was registered for, kept verbatim.
    Raw(ExtData),
    /// An application decoder mapped the payload to a value tree.
    Value { ext_type: i8, value: Box<Value> },
}

impl Extension {
    /// The extension type byte this value was (or will be) tagged with.
    #[must_use]
    pub fn ext_type(&self) -> i8 {
        match self {
            Extension::Timestamp(_) => TIMESTAMP_EXT_TYPE,
            Extension::Raw(data) => data.ext_type,
            Extension::Value { ext_type, .. } => *ext_type,
        }
    }
}

/// Raw extension payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtData {
    pub ext_type: i8,
    pub data: Vec<u8>,
}

impl ExtData {
    #[must_use]
    pub fn new(ext_type: i8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            ext_type,
            data: data.into(),
        }
    }
}

/// Largest nanoseconds field a timestamp extension may carry.
const MAX_NANOSECONDS: u32 = 999_999_999;

/// A point in time as seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since 1970-01-01T00:00:00Z (may be negative)
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanoseconds: u32,
}

impl Timestamp {
    #[inline]
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Decode a timestamp extension payload (4, 8, or 12 bytes).
    pub fn from_payload(data: &[u8]) -> Result<Self> {
        match *data {
            // timestamp 32: u32 seconds
            [a, b, c, d] => Ok(Self::new(i64::from(u32::from_be_bytes([a, b, c, d])), 0)),
            // timestamp 64: 30-bit nanoseconds | 34-bit seconds
            [a, b, c, d, e, f, g, h] => {
                let high = u32::from_be_bytes([a, b, c, d]);
                let low = u32::from_be_bytes([e, f, g, h]);
                let seconds = (i64::from(high & 0x3) << 32) | i64::from(low);
                Self::checked(seconds, high >> 2)
            }
            // timestamp 96: u32 nanoseconds, i64 seconds
            [a, b, c, d, ref rest @ ..] if rest.len() == 8 => {
                let mut secs = [0u8; 8];
                secs.copy_from_slice(rest);
                Self::checked(i64::from_be_bytes(secs), u32::from_be_bytes([a, b, c, d]))
            }
            _ => Err(Error::MalformedExtension {
                ext_type: TIMESTAMP_EXT_TYPE,
                reason: format!("timestamp payload must be 4, 8 or 12 bytes, got {}", data.len()),
            }),
        }
    }

    fn checked(seconds: i64, nanoseconds: u32) -> Result<Self> {
        if nanoseconds > MAX_NANOSECONDS {
            return Err(Error::MalformedExtension {
                ext_type: TIMESTAMP_EXT_TYPE,
                reason: format!("timestamp nanoseconds out of range: {nanoseconds}"),
            });
        }
        Ok(Self::new(seconds, nanoseconds))
    }

    /// Encode using the smallest timestamp layout that holds this value.
    ///
    /// The 64-bit layout only has 30 bits for nanoseconds; anything wider goes out
    /// in the 96-bit layout.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn to_payload(&self) -> Vec<u8> {
        if self.seconds >= 0 && self.seconds >> 34 == 0 && self.nanoseconds >> 30 == 0 {
            let seconds = self.seconds as u64;
            if self.nanoseconds == 0 && seconds <= u64::from(u32::MAX) {
                return (seconds as u32).to_be_bytes().to_vec();
            }
            let packed = (u64::from(self.nanoseconds) << 34) | seconds;
            return packed.to_be_bytes().to_vec();
        }
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&self.nanoseconds.to_be_bytes());
        out.extend_from_slice(&self.seconds.to_be_bytes());
        out
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

type DecodeFn = dyn Fn(&[u8]) -> Result<Extension> + Send + Sync;

/// A table of extension decoders keyed by extension type.
///
/// The timestamp decoder is registered from the start. What happens to unregistered
/// types depends on how the registry was built: [`ExtensionRegistry::new`] keeps them
/// as [`Extension::Raw`], [`ExtensionRegistry::strict`] rejects them with
/// [`Error::UnknownExtensionType`].
#[derive(Clone)]
pub struct ExtensionRegistry {
    decoders: HashMap<i8, Arc<DecodeFn>>,
    strict: bool,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// A registry that passes unregistered types through as raw data.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
            strict: false,
        };
        registry.register(TIMESTAMP_EXT_TYPE, |data| {
            Timestamp::from_payload(data).map(Extension::Timestamp)
        });
        registry
    }

    /// A registry that fails on unregistered types.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    /// Register (or replace) the decoder for `ext_type`.
    pub fn register<F>(&mut self, ext_type: i8, decode: F) -> &mut Self
    where
        F: Fn(&[u8]) -> Result<Extension> + Send + Sync + 'static,
    {
        self.decoders.insert(ext_type, Arc::new(decode));
        self
    }

    /// Check whether a decoder is registered for `ext_type`.
    #[must_use]
    pub fn is_registered(&self, ext_type: i8) -> bool {
        self.decoders.contains_key(&ext_type)
    }
}

impl ExtensionCodec for ExtensionRegistry {
    fn decode_extension(&self, ext_type: i8, data: &[u8]) -> Result<Extension> {
        match self.decoders.get(&ext_type) {
            Some(decode) => decode(data),
            None if self.strict => Err(Error::UnknownExtensionType(ext_type)),
            None => Ok(Extension::Raw(ExtData::new(ext_type, data))),
        }
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<i8> = self.decoders.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("ExtensionRegistry")
            .field("types", &types)
            .field("strict", &self.strict)
            .finish()
    }
}
