// tests/common.rs
#![allow(dead_code)] // Not every helper is used by every test binary

use sockmux::codec::{Codec, CodecError, Json};
use sockmux::scheduler::Scheduler;
use sockmux::transport::options;
use sockmux::{
  Endpoint, EndpointKind, InterestMask, PollInterest, ReadinessSnapshot, SocketManager, Transport,
  TransportError,
};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Use std::sync::Once for one-time initialization
static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    let default_filter = "sockmux=trace,debug,info,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_max_level(tracing::Level::TRACE)
      .with_env_filter(env_filter)
      .with_target(true)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

// Helper to create a manager over a fresh in-memory transport, with
// short timeouts so wait loops expire quickly in tests.
pub fn test_manager() -> (SocketManager, Arc<MemoryTransport>) {
  test_manager_with_codec(Arc::new(Json))
}

pub fn test_manager_with_codec(codec: Arc<dyn Codec>) -> (SocketManager, Arc<MemoryTransport>) {
  setup_tracing();
  let transport = MemoryTransport::new();
  let manager = SocketManager::with_options(
    transport.clone(),
    codec,
    Arc::new(sockmux::TokioYield),
    Duration::from_millis(300),
    Duration::from_millis(20),
  );
  (manager, transport)
}

pub const BOTH: InterestMask = InterestMask::READABLE.union(InterestMask::WRITABLE);

// --- In-memory transport ---
//
// Implements the Transport/Endpoint contract entirely in process:
// bindings are keyed by address string, connect wires peers directly,
// and pub/sub delivery applies prefix filters on the subscriber side.
// Instrumentation counters let tests assert how the manager drove the
// transport.

pub struct MemoryTransport {
  self_ref: Weak<MemoryTransport>,
  endpoints: Mutex<Vec<Arc<MemoryEndpoint>>>,
  bindings: Mutex<HashMap<String, Arc<MemoryEndpoint>>>,
  next_port: AtomicU16,
  poll_calls: AtomicUsize,
  last_poll_interest: AtomicUsize,
  bind_calls: AtomicUsize,
  connect_calls: AtomicUsize,
  disconnect_calls: AtomicUsize,
  close_calls: AtomicUsize,
}

impl MemoryTransport {
  pub fn new() -> Arc<Self> {
    Arc::new_cyclic(|weak| Self {
      self_ref: weak.clone(),
      endpoints: Mutex::new(Vec::new()),
      bindings: Mutex::new(HashMap::new()),
      next_port: AtomicU16::new(49152),
      poll_calls: AtomicUsize::new(0),
      last_poll_interest: AtomicUsize::new(0),
      bind_calls: AtomicUsize::new(0),
      connect_calls: AtomicUsize::new(0),
      disconnect_calls: AtomicUsize::new(0),
      close_calls: AtomicUsize::new(0),
    })
  }

  pub fn poll_count(&self) -> usize {
    self.poll_calls.load(Ordering::SeqCst)
  }

  /// Number of registrations handed to the most recent poll call.
  pub fn last_poll_interest(&self) -> usize {
    self.last_poll_interest.load(Ordering::SeqCst)
  }

  pub fn bind_count(&self) -> usize {
    self.bind_calls.load(Ordering::SeqCst)
  }

  pub fn connect_count(&self) -> usize {
    self.connect_calls.load(Ordering::SeqCst)
  }

  pub fn disconnect_count(&self) -> usize {
    self.disconnect_calls.load(Ordering::SeqCst)
  }

  pub fn close_count(&self) -> usize {
    self.close_calls.load(Ordering::SeqCst)
  }

  /// Makes the `index`-th created endpoint fail its close call.
  pub fn fail_close(&self, index: usize) {
    let endpoints = self.endpoints.lock().unwrap();
    endpoints[index].fail_close.store(true, Ordering::SeqCst);
  }

  fn resolve(&self, endpoint: &Arc<dyn Endpoint>) -> Option<Arc<MemoryEndpoint>> {
    // Trait objects hide the concrete type; match on the data pointer.
    let target = Arc::as_ptr(endpoint) as *const ();
    self
      .endpoints
      .lock()
      .unwrap()
      .iter()
      .find(|e| Arc::as_ptr(e) as *const () == target)
      .cloned()
  }
}

#[async_trait]
impl Transport for MemoryTransport {
  fn create_endpoint(&self, kind: EndpointKind) -> Result<Arc<dyn Endpoint>, TransportError> {
    let transport = self.self_ref.clone();
    let endpoint =
      Arc::new_cyclic(|weak: &Weak<MemoryEndpoint>| MemoryEndpoint::new(kind, transport, weak.clone()));
    self.endpoints.lock().unwrap().push(endpoint.clone());
    Ok(endpoint)
  }

  async fn poll(
    &self,
    interest: &[PollInterest],
    timeout: Duration,
  ) -> Result<ReadinessSnapshot, TransportError> {
    self.poll_calls.fetch_add(1, Ordering::SeqCst);
    self.last_poll_interest.store(interest.len(), Ordering::SeqCst);

    let started = Instant::now();
    loop {
      let mut entries = Vec::new();
      for registration in interest {
        let Some(endpoint) = self.resolve(&registration.endpoint) else {
          continue;
        };
        // Report only the conditions that were asked for.
        let ready = endpoint.readiness() & registration.mask;
        if !ready.is_empty() {
          entries.push((registration.id, ready));
        }
      }
      if !entries.is_empty() || started.elapsed() >= timeout {
        return Ok(ReadinessSnapshot::new(entries));
      }
      tokio::time::sleep(Duration::from_millis(1)).await;
    }
  }
}

pub struct MemoryEndpoint {
  kind: EndpointKind,
  transport: Weak<MemoryTransport>,
  self_ref: Weak<MemoryEndpoint>,
  inbox_tx: async_channel::Sender<Vec<Bytes>>,
  inbox_rx: async_channel::Receiver<Vec<Bytes>>,
  peers: Mutex<Vec<Arc<MemoryEndpoint>>>,
  subscriptions: Mutex<Vec<Vec<u8>>>,
  options: Mutex<HashMap<i32, Vec<u8>>>,
  connected: Mutex<Vec<String>>,
  closed: AtomicBool,
  fail_close: AtomicBool,
}

impl MemoryEndpoint {
  fn new(kind: EndpointKind, transport: Weak<MemoryTransport>, self_ref: Weak<MemoryEndpoint>) -> Self {
    let (inbox_tx, inbox_rx) = async_channel::unbounded();
    Self {
      kind,
      transport,
      self_ref,
      inbox_tx,
      inbox_rx,
      peers: Mutex::new(Vec::new()),
      subscriptions: Mutex::new(Vec::new()),
      options: Mutex::new(HashMap::new()),
      connected: Mutex::new(Vec::new()),
      closed: AtomicBool::new(false),
      fail_close: AtomicBool::new(false),
    }
  }

  fn transport(&self) -> Result<Arc<MemoryTransport>, TransportError> {
    self.transport.upgrade().ok_or(TransportError::EndpointClosed)
  }

  fn own(&self) -> Result<Arc<MemoryEndpoint>, TransportError> {
    self.self_ref.upgrade().ok_or(TransportError::EndpointClosed)
  }

  fn can_send(&self) -> bool {
    !matches!(self.kind, EndpointKind::Sub | EndpointKind::Pull)
  }

  fn readiness(&self) -> InterestMask {
    let mut mask = InterestMask::empty();
    if !self.inbox_rx.is_empty() {
      mask |= InterestMask::READABLE;
    }
    if self.can_send() && !self.peers.lock().unwrap().is_empty() {
      mask |= InterestMask::WRITABLE;
    }
    mask
  }

  fn accepts(&self, topic: &[u8]) -> bool {
    let subscriptions = self.subscriptions.lock().unwrap();
    subscriptions.iter().any(|prefix| topic.starts_with(&prefix[..]))
  }

  fn deliver(&self, frames: Vec<Bytes>) {
    // Unbounded channel; send only fails when the inbox is closed.
    let _ = self.inbox_tx.try_send(frames);
  }

  fn link(self: &Arc<Self>, peer: &Arc<MemoryEndpoint>) {
    self.peers.lock().unwrap().push(peer.clone());
    peer.peers.lock().unwrap().push(self.clone());
  }

  fn unlink(self: &Arc<Self>, peer: &Arc<MemoryEndpoint>) {
    let target = Arc::as_ptr(peer);
    self.peers.lock().unwrap().retain(|p| Arc::as_ptr(p) != target);
    let own = Arc::as_ptr(self);
    peer.peers.lock().unwrap().retain(|p| Arc::as_ptr(p) != own);
  }
}

#[async_trait]
impl Endpoint for MemoryEndpoint {
  async fn bind(&self, address: &str) -> Result<(), TransportError> {
    let transport = self.transport()?;
    transport.bind_calls.fetch_add(1, Ordering::SeqCst);
    let mut bindings = transport.bindings.lock().unwrap();
    if bindings.contains_key(address) {
      return Err(TransportError::AddrInUse(address.to_string()));
    }
    bindings.insert(address.to_string(), self.own()?);
    Ok(())
  }

  async fn connect(&self, address: &str) -> Result<(), TransportError> {
    let transport = self.transport()?;
    transport.connect_calls.fetch_add(1, Ordering::SeqCst);
    let peer = {
      let bindings = transport.bindings.lock().unwrap();
      bindings
        .get(address)
        .cloned()
        .ok_or_else(|| TransportError::ConnectionRefused(address.to_string()))?
    };
    self.own()?.link(&peer);
    self.connected.lock().unwrap().push(address.to_string());
    Ok(())
  }

  async fn disconnect(&self, address: &str) -> Result<(), TransportError> {
    let transport = self.transport()?;
    transport.disconnect_calls.fetch_add(1, Ordering::SeqCst);
    self.connected.lock().unwrap().retain(|a| a != address);
    let peer = transport.bindings.lock().unwrap().get(address).cloned();
    if let Some(peer) = peer {
      self.own()?.unlink(&peer);
    }
    Ok(())
  }

  async fn bind_to_random_port(&self, local_address: &str) -> Result<u16, TransportError> {
    let transport = self.transport()?;
    let port = transport.next_port.fetch_add(1, Ordering::SeqCst);
    let address = format!("{}:{}", local_address, port);
    self.bind(&address).await?;
    Ok(port)
  }

  async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
    self.send_multipart(vec![frame]).await
  }

  async fn send_multipart(&self, frames: Vec<Bytes>) -> Result<(), TransportError> {
    if self.closed.load(Ordering::SeqCst) {
      return Err(TransportError::EndpointClosed);
    }
    let peers = self.peers.lock().unwrap().clone();
    match self.kind {
      EndpointKind::Pub => {
        let topic = frames.first().cloned().unwrap_or_default();
        for peer in peers {
          if peer.accepts(&topic) {
            peer.deliver(frames.clone());
          }
        }
      }
      _ => {
        if let Some(peer) = peers.first() {
          peer.deliver(frames);
        }
      }
    }
    Ok(())
  }

  async fn recv(&self) -> Result<Bytes, TransportError> {
    let frames = self.recv_multipart().await?;
    frames
      .into_iter()
      .next()
      .ok_or_else(|| TransportError::Internal("empty message".into()))
  }

  async fn recv_multipart(&self) -> Result<Vec<Bytes>, TransportError> {
    self
      .inbox_rx
      .recv()
      .await
      .map_err(|_| TransportError::EndpointClosed)
  }

  async fn set_option(&self, option: i32, value: &[u8]) -> Result<(), TransportError> {
    if option == options::SUBSCRIBE {
      self.subscriptions.lock().unwrap().push(value.to_vec());
    } else if option == options::UNSUBSCRIBE {
      self.subscriptions.lock().unwrap().retain(|p| p != value);
    }
    self.options.lock().unwrap().insert(option, value.to_vec());
    Ok(())
  }

  fn close(&self) -> Result<(), TransportError> {
    if let Some(transport) = self.transport.upgrade() {
      transport.close_calls.fetch_add(1, Ordering::SeqCst);
    }
    if self.fail_close.load(Ordering::SeqCst) {
      return Err(TransportError::Internal("injected close failure".into()));
    }
    self.closed.store(true, Ordering::SeqCst);
    self.inbox_tx.close();
    Ok(())
  }
}

// --- Instrumented collaborators ---

/// Codec wrapper that counts pack/unpack invocations.
pub struct CountingCodec {
  inner: Json,
  packs: AtomicUsize,
  unpacks: AtomicUsize,
}

impl CountingCodec {
  pub fn new() -> Self {
    Self {
      inner: Json,
      packs: AtomicUsize::new(0),
      unpacks: AtomicUsize::new(0),
    }
  }

  pub fn pack_count(&self) -> usize {
    self.packs.load(Ordering::SeqCst)
  }

  pub fn unpack_count(&self) -> usize {
    self.unpacks.load(Ordering::SeqCst)
  }
}

impl Codec for CountingCodec {
  fn pack(&self, value: &Value) -> Result<Bytes, CodecError> {
    self.packs.fetch_add(1, Ordering::SeqCst);
    self.inner.pack(value)
  }

  fn unpack(&self, bytes: &[u8]) -> Result<Value, CodecError> {
    self.unpacks.fetch_add(1, Ordering::SeqCst);
    self.inner.unpack(bytes)
  }
}

/// Scheduler that counts suspension points while still yielding.
pub struct CountingScheduler {
  yields: AtomicUsize,
}

impl CountingScheduler {
  pub fn new() -> Self {
    Self {
      yields: AtomicUsize::new(0),
    }
  }

  pub fn yield_count(&self) -> usize {
    self.yields.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Scheduler for CountingScheduler {
  async fn yield_now(&self) {
    self.yields.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
  }
}
