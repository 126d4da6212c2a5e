// src/codec/msgpack.rs

use super::{Codec, CodecError};

use bytes::Bytes;
use serde_json::Value;

/// Serializes to and from MessagePack, a compact binary map encoding.
///
/// Wire-compatible with any msgpack peer as long as payloads stay within
/// the JSON data model (string-keyed maps, lists, numbers, strings,
/// booleans, null).
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPack;

impl Codec for MsgPack {
  fn pack(&self, value: &Value) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(rmp_serde::to_vec(value)?))
  }

  fn unpack(&self, bytes: &[u8]) -> Result<Value, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
  }
}
