// src/transport/mod.rs

//! The transport boundary: traits a messaging library implements so the
//! manager can drive it.
//!
//! Everything here is an interface; the manager never assumes a concrete
//! wire protocol. Addresses are opaque strings in whatever URI form the
//! transport understands (`tcp://host:port`, `inproc://name`, ...) and
//! are not validated beyond rejecting empty strings.

pub mod options;

use crate::error::TransportError;

use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Represents the messaging pattern of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
  /// Publish messages to subscribers (Pub-Sub pattern).
  Pub,
  /// Subscribe to messages from publishers (Pub-Sub pattern).
  Sub,
  /// Send requests and receive replies (Req-Rep pattern).
  Req,
  /// Receive requests and send replies (Req-Rep pattern).
  Rep,
  /// Asynchronous request-reply, load-balancing outgoing (Dealer-Router pattern).
  Dealer,
  /// Asynchronous request-reply, routing incoming (Dealer-Router pattern).
  Router,
  /// Distribute messages to a pool of workers (Push-Pull pattern).
  Push,
  /// Collect messages from a pool of distributors (Push-Pull pattern).
  Pull,
}

/// Stable identity token for a registered endpoint.
///
/// Minted by the manager at `create` time from a monotonic counter and
/// never recycled while the manager lives, so registry bookkeeping stays
/// correct even if the transport handle's own identity is mutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub(crate) u64);

impl fmt::Display for EndpointId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "endpoint-{}", self.0)
  }
}

bitflags! {
  /// Readiness conditions of interest for an endpoint.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct InterestMask: u8 {
    /// The endpoint has data available to receive.
    const READABLE = 0b01;
    /// The endpoint can accept an outgoing message.
    const WRITABLE = 0b10;
  }
}

/// One registration handed to [`Transport::poll`]: which endpoint, under
/// which identity, with which interest.
#[derive(Clone)]
pub struct PollInterest {
  pub id: EndpointId,
  pub endpoint: Arc<dyn Endpoint>,
  pub mask: InterestMask,
}

impl fmt::Debug for PollInterest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PollInterest")
      .field("id", &self.id)
      .field("mask", &self.mask)
      .finish_non_exhaustive()
  }
}

/// The result of one poll call: an ordered mapping from endpoint identity
/// to the readiness mask currently satisfied.
///
/// A snapshot is valid only for the instant it was produced. It is
/// recomputed on every poll and never retained as authoritative state.
#[derive(Debug, Clone, Default)]
pub struct ReadinessSnapshot {
  entries: Vec<(EndpointId, InterestMask)>,
}

impl ReadinessSnapshot {
  pub fn new(entries: Vec<(EndpointId, InterestMask)>) -> Self {
    Self { entries }
  }

  /// The readiness mask the poll reported for `id`, if any.
  pub fn ready_mask(&self, id: EndpointId) -> Option<InterestMask> {
    self.entries.iter().find(|(e, _)| *e == id).map(|(_, m)| *m)
  }

  /// Ordered `(id, mask)` pairs as the transport reported them.
  pub fn entries(&self) -> &[(EndpointId, InterestMask)] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

/// A single addressable transport object capable of independent
/// bind/connect/send/recv.
///
/// Handles are exclusively owned by the manager's registry; no other
/// component may close or mutate them directly.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
  /// Binds the endpoint to listen on a local address.
  async fn bind(&self, address: &str) -> Result<(), TransportError>;

  /// Connects the endpoint to a remote address.
  async fn connect(&self, address: &str) -> Result<(), TransportError>;

  /// Disconnects from a previously connected address.
  async fn disconnect(&self, address: &str) -> Result<(), TransportError>;

  /// Binds to an ephemeral port on `local_address`, returning the port.
  async fn bind_to_random_port(&self, local_address: &str) -> Result<u16, TransportError>;

  /// Non-blocking best-effort send of a single frame.
  async fn send(&self, frame: Bytes) -> Result<(), TransportError>;

  /// Non-blocking best-effort send of a multi-part message.
  async fn send_multipart(&self, frames: Vec<Bytes>) -> Result<(), TransportError>;

  /// Receives a single frame.
  async fn recv(&self) -> Result<Bytes, TransportError>;

  /// Receives all frames of one multi-part message.
  async fn recv_multipart(&self) -> Result<Vec<Bytes>, TransportError>;

  /// Sets a transport-level option (see [`options`]).
  async fn set_option(&self, option: i32, value: &[u8]) -> Result<(), TransportError>;

  /// Releases the endpoint. Synchronous so teardown can run from `Drop`.
  fn close(&self) -> Result<(), TransportError>;
}

/// Factory and multiplexer provided by the external messaging library.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  /// Creates a fresh, unbound endpoint of the given kind.
  fn create_endpoint(&self, kind: EndpointKind) -> Result<Arc<dyn Endpoint>, TransportError>;

  /// Polls the given registrations, returning the subset currently ready
  /// for their requested interest. A zero `timeout` checks without
  /// waiting; otherwise the call may block up to `timeout` for the first
  /// readiness change.
  async fn poll(
    &self,
    interest: &[PollInterest],
    timeout: Duration,
  ) -> Result<ReadinessSnapshot, TransportError>;
}
