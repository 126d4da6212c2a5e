// src/codec/json.rs

use super::{Codec, CodecError};

use bytes::Bytes;
use serde_json::Value;

/// Serializes to and from JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Codec for Json {
  fn pack(&self, value: &Value) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
  }

  fn unpack(&self, bytes: &[u8]) -> Result<Value, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
  }
}
