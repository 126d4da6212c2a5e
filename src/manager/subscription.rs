// src/manager/subscription.rs

use super::SocketManager;
use crate::codec::Codec;
use crate::error::SocketError;
use crate::event::Event;
use crate::transport::Endpoint;

use bytes::Bytes;
use futures::Stream;
use std::sync::Arc;

/// Zero-argument predicate deciding whether a [`Subscription`] keeps
/// polling. The construction contract the original enforced at runtime
/// is carried by the type here.
pub type KeepPolling = Box<dyn FnMut() -> bool + Send>;

/// A lazy, conceptually infinite sequence of pub/sub [`Event`]s.
///
/// Produced by [`SocketManager::subscribe`]. Each `next` performs one
/// blocking two-frame receive; the sequence ends when the `keep_polling`
/// predicate turns false (by default, when the subscribed endpoint no
/// longer exists).
pub struct Subscription {
  manager: SocketManager,
  endpoint: Arc<dyn Endpoint>,
  keep_polling: KeepPolling,
}

impl Subscription {
  pub(crate) fn new(manager: SocketManager, endpoint: Arc<dyn Endpoint>, keep_polling: KeepPolling) -> Self {
    Self {
      manager,
      endpoint,
      keep_polling,
    }
  }

  /// Receives the next event, or `Ok(None)` once the predicate says to
  /// stop. Transport and codec failures propagate to the caller.
  pub async fn next(&mut self) -> Result<Option<Event>, SocketError> {
    if !(self.keep_polling)() {
      return Ok(None);
    }
    let frames = self.endpoint.recv_multipart().await?;
    decode_event(self.manager.inner.codec.as_ref(), frames).map(Some)
  }

  /// Adapts the subscription into a [`futures::Stream`].
  ///
  /// The stream ends after the predicate stops the iteration or after
  /// the first error is yielded.
  pub fn into_stream(self) -> impl Stream<Item = Result<Event, SocketError>> {
    futures::stream::unfold(Some(self), |state| async move {
      let mut subscription = state?;
      match subscription.next().await {
        Ok(Some(event)) => Some((Ok(event), Some(subscription))),
        Ok(None) => None,
        Err(error) => Some((Err(error), None)),
      }
    })
  }
}

/// Builds an [`Event`] from a two-frame `[topic, payload]` message.
pub(crate) fn decode_event(codec: &dyn Codec, frames: Vec<Bytes>) -> Result<Event, SocketError> {
  if frames.len() != 2 {
    return Err(SocketError::InvalidMessage(format!(
      "expected a two-frame event, got {} frames",
      frames.len()
    )));
  }
  let mut frames = frames.into_iter();
  let topic = frames.next().unwrap_or_default();
  let raw = frames.next().unwrap_or_default();
  let data = codec.unpack(&raw)?;
  Ok(Event::new(topic, data))
}
