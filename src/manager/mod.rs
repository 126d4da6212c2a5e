// src/manager/mod.rs

//! The named-socket registry and its public handle, [`SocketManager`].

mod facade;
mod lifecycle;
mod readiness;
mod subscription;

pub use subscription::{KeepPolling, Subscription};

use crate::codec::{Codec, Json};
use crate::error::SocketError;
use crate::scheduler::{Scheduler, TokioYield};
use crate::transport::{options, Endpoint, EndpointId, EndpointKind, InterestMask, PollInterest, Transport};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Default wall-clock budget for wait-capable operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-attempt poll timeout inside the wait loop.
pub const DEFAULT_POLLING_TIMEOUT: Duration = Duration::from_millis(1000);

/// One live endpoint held by the registry.
#[derive(Clone)]
pub(crate) struct EndpointEntry {
  pub(crate) id: EndpointId,
  pub(crate) kind: EndpointKind,
  pub(crate) endpoint: Arc<dyn Endpoint>,
}

/// State shared by all clones of a [`SocketManager`] handle.
pub(crate) struct ManagerInner {
  pub(crate) transport: Arc<dyn Transport>,
  pub(crate) codec: Arc<dyn Codec>,
  pub(crate) scheduler: Arc<dyn Scheduler>,
  pub(crate) timeout: Duration,
  pub(crate) polling_timeout: Duration,
  /// Next identity token. Never recycled while the manager lives.
  next_id: AtomicU64,
  // book-keeping of the sockets themselves
  sockets: RwLock<HashMap<String, EndpointEntry>>,
  addresses: RwLock<HashMap<String, String>>,
  // book-keeping of endpoints registered with the poller, in
  // registration order
  registry: RwLock<Vec<PollInterest>>,
}

// The maps are only ever locked for short synchronous sections; guards
// are never held across an await. Poisoning is therefore recoverable.
impl ManagerInner {
  pub(crate) fn sockets_read(&self) -> RwLockReadGuard<'_, HashMap<String, EndpointEntry>> {
    self.sockets.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn sockets_write(&self) -> RwLockWriteGuard<'_, HashMap<String, EndpointEntry>> {
    self.sockets.write().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn addresses_read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
    self.addresses.read().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn addresses_write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
    self.addresses.write().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn registry_read(&self) -> RwLockReadGuard<'_, Vec<PollInterest>> {
    self.registry.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn registry_write(&self) -> RwLockWriteGuard<'_, Vec<PollInterest>> {
    self.registry.write().unwrap_or_else(PoisonError::into_inner)
  }

  fn next_id(&self) -> EndpointId {
    EndpointId(self.next_id.fetch_add(1, Ordering::Relaxed))
  }
}

impl Drop for ManagerInner {
  fn drop(&mut self) {
    let sockets = match self.sockets.get_mut() {
      Ok(map) => std::mem::take(map),
      Err(poisoned) => std::mem::take(poisoned.into_inner()),
    };
    for (name, entry) in sockets {
      if let Err(error) = entry.endpoint.close() {
        tracing::warn!(socket = %name, %error, "suppressed endpoint close failure during teardown");
      }
    }
  }
}

/// High-level abstraction for a non-blocking messaging transport.
///
/// A `SocketManager` creates, retrieves, connects and binds endpoints by
/// logical name, registers each with one shared multiplexer, and can wait
/// for an endpoint to become available for receiving, sending, or both.
///
/// Handles are cheap to clone; all clones share the same registry. The
/// manager is meant to be driven by one logical owner (one task, or one
/// cooperative pool sharing a transport context); it does not arbitrate
/// concurrent registry mutation from independent threads.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use sockmux::{EndpointKind, InterestMask, SocketManager};
/// # async fn example(transport: Arc<dyn sockmux::Transport>) -> Result<(), sockmux::SocketError> {
/// let sockets = SocketManager::new(transport);
/// sockets
///   .ensure_and_connect(
///     "requester",
///     EndpointKind::Req,
///     "tcp://192.168.2.42:5051",
///     InterestMask::READABLE | InterestMask::WRITABLE,
///   )
///   .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SocketManager {
  pub(crate) inner: Arc<ManagerInner>,
}

impl SocketManager {
  /// Creates a manager over `transport` with the JSON codec, the tokio
  /// yield hook, and the default timeouts.
  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self::with_options(
      transport,
      Arc::new(Json),
      Arc::new(TokioYield),
      DEFAULT_TIMEOUT,
      DEFAULT_POLLING_TIMEOUT,
    )
  }

  /// Creates a manager with a specific serialization backend.
  pub fn with_codec(transport: Arc<dyn Transport>, codec: Arc<dyn Codec>) -> Self {
    Self::with_options(transport, codec, Arc::new(TokioYield), DEFAULT_TIMEOUT, DEFAULT_POLLING_TIMEOUT)
  }

  /// Creates a manager with every collaborator supplied explicitly.
  pub fn with_options(
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    scheduler: Arc<dyn Scheduler>,
    timeout: Duration,
    polling_timeout: Duration,
  ) -> Self {
    Self {
      inner: Arc::new(ManagerInner {
        transport,
        codec,
        scheduler,
        timeout,
        polling_timeout,
        next_id: AtomicU64::new(1),
        sockets: RwLock::new(HashMap::new()),
        addresses: RwLock::new(HashMap::new()),
        registry: RwLock::new(Vec::new()),
      }),
    }
  }

  /// Creates a named endpoint of the given kind.
  ///
  /// Assigns the endpoint a unique routing identity so distinct
  /// endpoints can be told apart even when the transport handle's own
  /// identity is mutable. Fails with [`SocketError::AlreadyExists`] when
  /// `name` is taken.
  pub async fn create(&self, name: &str, kind: EndpointKind) -> Result<Arc<dyn Endpoint>, SocketError> {
    if self.inner.sockets_read().contains_key(name) {
      return Err(SocketError::AlreadyExists(name.to_string()));
    }

    let endpoint = self.inner.transport.create_endpoint(kind)?;
    let id = self.inner.next_id();
    endpoint
      .set_option(options::ROUTING_ID, identity_token().as_bytes())
      .await?;

    let mut sockets = self.inner.sockets_write();
    if sockets.contains_key(name) {
      return Err(SocketError::AlreadyExists(name.to_string()));
    }
    sockets.insert(
      name.to_string(),
      EndpointEntry {
        id,
        kind,
        endpoint: endpoint.clone(),
      },
    );
    drop(sockets);

    tracing::debug!(socket = name, %id, ?kind, "socket created");
    Ok(endpoint)
  }

  /// Returns an existing endpoint by name, or [`SocketError::NotFound`].
  pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn Endpoint>, SocketError> {
    self.entry(name).map(|e| e.endpoint)
  }

  /// Ensures an endpoint exists under `name` and is registered with the
  /// poller under `mask`.
  pub async fn get_or_create(
    &self,
    name: &str,
    kind: EndpointKind,
    mask: InterestMask,
  ) -> Result<Arc<dyn Endpoint>, SocketError> {
    if !self.contains(name) {
      self.create(name, kind).await?;
    }
    let entry = self.entry(name)?;
    self.inner.register(&entry, mask);
    Ok(entry.endpoint)
  }

  /// Whether a live endpoint is registered under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.inner.sockets_read().contains_key(name)
  }

  /// The logical names of all live endpoints.
  pub fn socket_names(&self) -> Vec<String> {
    self.inner.sockets_read().keys().cloned().collect()
  }

  /// The address recorded for `name` at bind/connect time, if any.
  pub fn address_of(&self, name: &str) -> Option<String> {
    self.inner.addresses_read().get(name).cloned()
  }

  /// The messaging pattern `name` was created with, if it is live.
  pub fn kind_of(&self, name: &str) -> Option<EndpointKind> {
    self.inner.sockets_read().get(name).map(|e| e.kind)
  }

  pub(crate) fn entry(&self, name: &str) -> Result<EndpointEntry, SocketError> {
    self
      .inner
      .sockets_read()
      .get(name)
      .cloned()
      .ok_or_else(|| SocketError::NotFound(name.to_string()))
  }
}

impl fmt::Debug for SocketManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SocketManager")
      .field("sockets", &self.socket_names())
      .finish()
  }
}

/// A fresh random routing identity.
fn identity_token() -> String {
  format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}
