//! Argument extraction and return-value encoding.
//!
//! Strings, integers and booleans are read through the engine's typed
//! accessors, which already coerce the JS value. Everything else is read as
//! text and parsed as JSON, either through [`Json`] or directly for
//! [`serde_json::Value`] and floats. Return values go the other way through
//! [`IntoReply`].

use crate::error::{Result, WebUiError};
use crate::event::Event;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::ops::{Deref, DerefMut};

// ============================================================================
// Decoding
// ============================================================================

/// A type that can be built from one argument slot.
///
/// [`Event::arg_at`] rejects empty slots before calling `from_arg`, so
/// implementations only deal with slots that carry data.
pub trait FromArg: Sized {
    fn from_arg(event: &Event, index: usize) -> Result<Self>;
}

impl FromArg for String {
    fn from_arg(event: &Event, index: usize) -> Result<Self> {
        Ok(event.engine().string_at(event.raw(), index))
    }
}

impl FromArg for bool {
    fn from_arg(event: &Event, index: usize) -> Result<Self> {
        Ok(event.engine().bool_at(event.raw(), index))
    }
}

impl FromArg for i64 {
    fn from_arg(event: &Event, index: usize) -> Result<Self> {
        Ok(event.engine().int_at(event.raw(), index))
    }
}

macro_rules! narrowed_int_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(event: &Event, index: usize) -> Result<Self> {
                    let wide = event.engine().int_at(event.raw(), index);
                    <$ty>::try_from(wide)
                        .map_err(|e| WebUiError::decode(event.element(), type_name::<$ty>(), e))
                }
            }
        )*
    };
}

narrowed_int_arg!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

macro_rules! json_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(event: &Event, index: usize) -> Result<Self> {
                    decode_json(event, index)
                }
            }
        )*
    };
}

json_arg!(f32, f64, serde_json::Value);

/// Read slot `index` as text and parse it as JSON.
pub fn decode_json<T: DeserializeOwned>(event: &Event, index: usize) -> Result<T> {
    let text = event.engine().string_at(event.raw(), index);
    serde_json::from_str(&text)
        .map_err(|e| WebUiError::decode(event.element(), type_name::<T>(), e))
}

/// Wrapper selecting the JSON path for any serde type.
///
/// ```ignore
/// let Json(settings) = event.arg::<Json<Settings>>()?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: DeserializeOwned> FromArg for Json<T> {
    fn from_arg(event: &Event, index: usize) -> Result<Self> {
        decode_json(event, index).map(Json)
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// What a callback hands back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing is sent; the JS promise stays pending.
    Void,
    /// JSON text delivered against the event number.
    Json(String),
}

impl Reply {
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            Self::Void => None,
            Self::Json(text) => Some(text),
        }
    }
}

/// Serialize `value` into a [`Reply::Json`].
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Reply> {
    serde_json::to_string(value)
        .map(Reply::Json)
        .map_err(|e| WebUiError::encode(type_name::<T>(), e))
}

/// Return types accepted from bound callbacks.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Void)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(Reply::Void),
        }
    }
}

/// A failed callback sends nothing; the error is logged.
impl<T: IntoReply, E: std::fmt::Display> IntoReply for Result<T, E> {
    fn into_reply(self) -> Result<Reply> {
        match self {
            Ok(value) => value.into_reply(),
            Err(err) => {
                tracing::warn!(error = %err, "Callback returned an error, no response sent");
                Ok(Reply::Void)
            }
        }
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply> {
        encode(&self.0)
    }
}

impl<T: Serialize> IntoReply for Vec<T> {
    fn into_reply(self) -> Result<Reply> {
        encode(&self)
    }
}

impl<K: Serialize, V: Serialize, S: BuildHasher> IntoReply for HashMap<K, V, S> {
    fn into_reply(self) -> Result<Reply> {
        encode(&self)
    }
}

impl<K: Serialize, V: Serialize> IntoReply for BTreeMap<K, V> {
    fn into_reply(self) -> Result<Reply> {
        encode(&self)
    }
}

impl IntoReply for &str {
    fn into_reply(self) -> Result<Reply> {
        encode(self)
    }
}

macro_rules! serialize_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Reply> {
                    encode(&self)
                }
            }
        )*
    };
}

serialize_reply!(
    String,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    serde_json::Value,
);

// ============================================================================
// Tests
// ============================================================================
