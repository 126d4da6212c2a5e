// src/manager/readiness.rs

//! The readiness engine: `engage`, `ready` and `wait_until_ready`.
//!
//! This is how "blocking" semantics are synthesized on top of the
//! non-blocking transport: poll everything registered, check the
//! snapshot for the endpoint of interest, yield, repeat until the
//! wall-clock budget runs out.

use super::{EndpointEntry, ManagerInner, SocketManager};
use crate::error::SocketError;
use crate::transport::{Endpoint, EndpointId, InterestMask, PollInterest, ReadinessSnapshot};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

impl ManagerInner {
  /// Adds `entry` to the multiplexer's interest set exactly once. If the
  /// endpoint is already registered, the first mask sticks.
  pub(crate) fn register(&self, entry: &EndpointEntry, mask: InterestMask) {
    let mut registry = self.registry_write();
    if registry.iter().any(|p| p.id == entry.id) {
      tracing::trace!(id = %entry.id, "endpoint already registered with poller");
      return;
    }
    registry.push(PollInterest {
      id: entry.id,
      endpoint: entry.endpoint.clone(),
      mask,
    });
    tracing::debug!(id = %entry.id, ?mask, "endpoint registered with poller");
  }

  /// Removes `id` from the interest set. Tolerates the endpoint already
  /// being absent.
  pub(crate) fn unregister(&self, id: EndpointId) {
    let mut registry = self.registry_write();
    let before = registry.len();
    registry.retain(|p| p.id != id);
    if registry.len() != before {
      tracing::debug!(%id, "endpoint unregistered from poller");
    }
  }
}

impl SocketManager {
  /// Replaces the poll registration for `name` so that `mask` becomes
  /// the effective interest.
  ///
  /// Plain registration is first-mask-wins; this is the dedicated
  /// update path for callers that really do want a different mask.
  pub fn re_register(&self, name: &str, mask: InterestMask) -> Result<(), SocketError> {
    let entry = self.entry(name)?;
    self.inner.unregister(entry.id);
    self.inner.register(&entry, mask);
    Ok(())
  }

  /// Polls every registered endpoint with the given timeout.
  ///
  /// A `Duration::ZERO` timeout performs a non-blocking check. The
  /// returned snapshot is valid only for the instant it was produced.
  pub async fn engage(&self, timeout: Duration) -> Result<ReadinessSnapshot, SocketError> {
    let interest: Vec<PollInterest> = self.inner.registry_read().clone();
    let snapshot = self.inner.transport.poll(&interest, timeout).await?;
    tracing::trace!(
      registered = interest.len(),
      ready = snapshot.len(),
      ?timeout,
      "engage"
    );
    Ok(snapshot)
  }

  /// Polls once and checks whether the named endpoint satisfies `mask`.
  ///
  /// Returns the endpoint when the snapshot's readiness contains every
  /// requested condition, `None` otherwise. `timeout` defaults to the
  /// configured polling timeout.
  pub async fn ready(
    &self,
    name: &str,
    mask: InterestMask,
    timeout: Option<Duration>,
  ) -> Result<Option<Arc<dyn Endpoint>>, SocketError> {
    let entry = self.entry(name)?;
    let timeout = timeout.unwrap_or(self.inner.polling_timeout);
    let snapshot = self.engage(timeout).await?;
    Ok(
      snapshot
        .ready_mask(entry.id)
        .filter(|ready| ready.contains(mask))
        .map(|_| entry.endpoint),
    )
  }

  /// Waits until the named endpoint is ready for `mask`, yielding to the
  /// scheduler between poll attempts.
  ///
  /// Returns the endpoint as soon as one snapshot satisfies the mask, or
  /// `None` once `timeout` has elapsed. At least one poll attempt is
  /// made even when `timeout` is smaller than `polling_timeout`; the
  /// final attempt is not shrunk to fit the remaining budget, so the
  /// worst case is `ceil(timeout / polling_timeout)` iterations.
  /// Both timeouts default to the manager's configured values.
  pub async fn wait_until_ready(
    &self,
    name: &str,
    mask: InterestMask,
    timeout: Option<Duration>,
    polling_timeout: Option<Duration>,
  ) -> Result<Option<Arc<dyn Endpoint>>, SocketError> {
    let entry = self.entry(name)?;
    let timeout = timeout.unwrap_or(self.inner.timeout);
    let polling_timeout = polling_timeout.unwrap_or(self.inner.polling_timeout);

    let started = Instant::now();
    loop {
      let snapshot = self.engage(polling_timeout).await?;
      if let Some(ready) = snapshot.ready_mask(entry.id) {
        if ready.contains(mask) {
          return Ok(Some(entry.endpoint.clone()));
        }
      }
      // Wall-clock sample taken immediately after the poll attempt.
      if started.elapsed() >= timeout {
        tracing::trace!(socket = name, ?mask, ?timeout, "wait_until_ready timed out");
        return Ok(None);
      }
      self.inner.scheduler.yield_now().await;
    }
  }
}
