// src/codec/mod.rs

//! Pluggable payload serialization backends.
//!
//! A [`Codec`] turns a JSON-representable value into wire bytes and back.
//! Two backends ship with the crate: [`Json`] (text) and [`MsgPack`]
//! (compact binary map). Both round-trip numbers, strings, booleans,
//! nulls, ordered lists, and string-keyed maps.

mod json;
mod msgpack;

pub use json::Json;
pub use msgpack::MsgPack;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Failures raised while packing or unpacking a payload.
///
/// These propagate to the immediate caller of the safe facade; they are
/// never swallowed or retried.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
  #[error("JSON codec error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("MessagePack encode error: {0}")]
  MsgPackEncode(#[from] rmp_serde::encode::Error),

  #[error("MessagePack decode error: {0}")]
  MsgPackDecode(#[from] rmp_serde::decode::Error),
}

/// A payload serialization backend.
pub trait Codec: Send + Sync + 'static {
  /// Serializes a value into wire bytes.
  fn pack(&self, value: &Value) -> Result<Bytes, CodecError>;

  /// Deserializes wire bytes back into a value.
  fn unpack(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}
