// src/event.rs

use bytes::Bytes;
use serde_json::Value;
use std::borrow::Cow;

/// PUB/SUB event container.
///
/// An opaque value representing one entire event: `topic` and `data`.
/// Events are produced only by receive-side operations and are never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
  topic: Bytes,
  data: Value,
}

impl Event {
  pub(crate) fn new(topic: Bytes, data: Value) -> Self {
    Self { topic, data }
  }

  /// The topic bytes. Zero-length in absence of a topic.
  pub fn topic(&self) -> &[u8] {
    &self.topic
  }

  /// The topic rendered as UTF-8, lossily if necessary.
  pub fn topic_str(&self) -> Cow<'_, str> {
    String::from_utf8_lossy(&self.topic)
  }

  /// The deserialized event payload.
  pub fn data(&self) -> &Value {
    &self.data
  }

  /// Consumes the event, returning `(topic, data)`.
  pub fn into_parts(self) -> (Bytes, Value) {
    (self.topic, self.data)
  }
}
