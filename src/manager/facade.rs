// src/manager/facade.rs

//! The safe I/O facade: readiness waiting combined with serialization so
//! one call either completes the operation or reports "not yet".

use super::subscription::{decode_event, KeepPolling, Subscription};
use super::SocketManager;
use crate::error::SocketError;
use crate::event::Event;
use crate::transport::{options, InterestMask};

use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;

impl SocketManager {
  /// Serializes `data` with the configured backend and sends it through
  /// the named endpoint once it is write-ready.
  ///
  /// Returns `Ok(true)` when the message was sent, `Ok(false)` when the
  /// endpoint never became available within `timeout`: in that case
  /// the serializer is never invoked and no side effect occurs.
  ///
  /// Raises [`SocketError::NotFound`] when the socket name is wrong.
  pub async fn send_safe(
    &self,
    name: &str,
    data: &Value,
    timeout: Option<Duration>,
  ) -> Result<bool, SocketError> {
    let Some(endpoint) = self
      .wait_until_ready(name, InterestMask::WRITABLE, timeout, None)
      .await?
    else {
      return Ok(false);
    };

    let payload = self.inner.codec.pack(data)?;
    endpoint.send(payload).await?;
    Ok(true)
  }

  /// Waits for the named endpoint to become read-ready, receives a
  /// single frame and deserializes it.
  ///
  /// Returns `Ok(None)` when the endpoint never became available within
  /// `timeout`. That is the normal not-yet-available case, not a fault.
  pub async fn recv_safe(
    &self,
    name: &str,
    timeout: Option<Duration>,
  ) -> Result<Option<Value>, SocketError> {
    let Some(endpoint) = self
      .wait_until_ready(name, InterestMask::READABLE, timeout, None)
      .await?
    else {
      return Ok(None);
    };

    let raw = endpoint.recv().await?;
    Ok(Some(self.inner.codec.unpack(&raw)?))
  }

  /// Serializes `data` and publishes it under `topic` as a two-frame
  /// message `[topic, payload]`.
  ///
  /// Publish endpoints are assumed always writable in the
  /// fire-and-forget pattern, so no readiness wait happens here; the
  /// endpoint is looked up directly.
  pub async fn publish_safe(&self, name: &str, topic: &str, data: &Value) -> Result<(), SocketError> {
    let endpoint = self.get_by_name(name)?;
    let payload = self.inner.codec.pack(data)?;
    endpoint
      .send_multipart(vec![Bytes::copy_from_slice(topic.as_bytes()), payload])
      .await?;
    Ok(())
  }

  /// Waits read-ready, receives one two-frame pub/sub message and
  /// returns it as an [`Event`].
  ///
  /// A non-empty `topic` first narrows the subscription filter to that
  /// prefix. Returns `Ok(None)` when the wait timed out; a message with
  /// a frame count other than two is [`SocketError::InvalidMessage`].
  pub async fn recv_event_safe(
    &self,
    name: &str,
    topic: Option<&str>,
    timeout: Option<Duration>,
  ) -> Result<Option<Event>, SocketError> {
    if let Some(topic) = topic {
      if !topic.is_empty() {
        self.set_topic(name, topic).await?;
      }
    }

    let Some(endpoint) = self
      .wait_until_ready(name, InterestMask::READABLE, timeout, None)
      .await?
    else {
      return Ok(None);
    };

    let frames = endpoint.recv_multipart().await?;
    decode_event(self.inner.codec.as_ref(), frames).map(Some)
  }

  /// Sets the subscription filter (empty `topic` subscribes to all
  /// topics) and returns a lazy, conceptually infinite sequence of
  /// events.
  ///
  /// The sequence keeps yielding while `keep_polling` returns true; the
  /// default predicate checks that the named endpoint still exists. Each
  /// call produces a fresh iteration starting from the current filter
  /// state.
  pub async fn subscribe(
    &self,
    name: &str,
    topic: &str,
    keep_polling: Option<KeepPolling>,
  ) -> Result<Subscription, SocketError> {
    let endpoint = self.get_by_name(name)?;
    endpoint
      .set_option(options::SUBSCRIBE, topic.as_bytes())
      .await?;

    let keep_polling = keep_polling.unwrap_or_else(|| {
      let manager = self.clone();
      let name = name.to_string();
      Box::new(move || manager.contains(&name))
    });

    Ok(Subscription::new(self.clone(), endpoint, keep_polling))
  }

  /// Sets a transport-level option on the named endpoint.
  ///
  /// See [`crate::transport::options`] for the IDs understood by
  /// ZeroMQ-compatible transports.
  pub async fn set_socket_option(
    &self,
    name: &str,
    option: i32,
    value: &[u8],
  ) -> Result<(), SocketError> {
    let endpoint = self.get_by_name(name)?;
    endpoint.set_option(option, value).await?;
    Ok(())
  }

  /// Shortcut for setting the subscription filter on a Sub endpoint.
  ///
  /// An empty `topic` subscribes to every topic.
  pub async fn set_topic(&self, name: &str, topic: &str) -> Result<(), SocketError> {
    self
      .set_socket_option(name, options::SUBSCRIBE, topic.as_bytes())
      .await
  }
}
