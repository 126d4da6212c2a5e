// src/manager/lifecycle.rs

//! bind/connect/close/disconnect and the one-shot setup helpers.

use super::SocketManager;
use crate::error::SocketError;
use crate::transport::{Endpoint, EndpointKind, InterestMask};

use std::sync::Arc;
use std::time::Duration;

impl SocketManager {
  /// Connects a named endpoint to an address and registers it with the
  /// poller under `mask`.
  ///
  /// The registration is flushed with a zero-timeout engage before the
  /// transport connect runs. Transport rejection is re-raised as
  /// [`SocketError::Connect`] carrying the original cause.
  pub async fn connect(
    &self,
    name: &str,
    address: &str,
    mask: InterestMask,
  ) -> Result<Arc<dyn Endpoint>, SocketError> {
    if address.is_empty() {
      return Err(SocketError::connect(name, address, None));
    }
    let entry = self.entry(name)?;

    self
      .inner
      .addresses_write()
      .insert(name.to_string(), address.to_string());
    self.inner.register(&entry, mask);
    self.engage(Duration::ZERO).await?;

    if let Err(cause) = entry.endpoint.connect(address).await {
      return Err(SocketError::connect(name, address, Some(cause)));
    }
    tracing::debug!(socket = name, address, "socket connected");
    Ok(entry.endpoint)
  }

  /// Binds a named endpoint to an address and registers it with the
  /// poller under `mask`.
  ///
  /// Transport rejection is re-raised as [`SocketError::Bind`] carrying
  /// the original cause.
  pub async fn bind(
    &self,
    name: &str,
    address: &str,
    mask: InterestMask,
  ) -> Result<Arc<dyn Endpoint>, SocketError> {
    if address.is_empty() {
      return Err(SocketError::bind(name, address, None));
    }
    let entry = self.entry(name)?;

    self
      .inner
      .addresses_write()
      .insert(name.to_string(), address.to_string());
    self.inner.register(&entry, mask);
    self.engage(Duration::ZERO).await?;

    if let Err(cause) = entry.endpoint.bind(address).await {
      return Err(SocketError::bind(name, address, Some(cause)));
    }
    tracing::debug!(socket = name, address, "socket bound");
    Ok(entry.endpoint)
  }

  /// Binds a named endpoint to an ephemeral port on `local_address`.
  ///
  /// Returns the endpoint together with the composed
  /// `local_address:port` string, which is also recorded in the address
  /// book.
  pub async fn bind_to_random_port(
    &self,
    name: &str,
    mask: InterestMask,
    local_address: &str,
  ) -> Result<(Arc<dyn Endpoint>, String), SocketError> {
    if local_address.is_empty() {
      return Err(SocketError::bind(name, local_address, None));
    }
    let entry = self.entry(name)?;

    self.inner.register(&entry, mask);
    self.engage(Duration::ZERO).await?;

    let port = match entry.endpoint.bind_to_random_port(local_address).await {
      Ok(port) => port,
      Err(cause) => return Err(SocketError::bind(name, local_address, Some(cause))),
    };

    let address = format!("{}:{}", local_address, port);
    self
      .inner
      .addresses_write()
      .insert(name.to_string(), address.clone());
    tracing::debug!(socket = name, address = %address, "socket bound to random port");
    Ok((entry.endpoint, address))
  }

  /// Closes a named endpoint if it exists.
  ///
  /// Unregisters from the poller (tolerating "not registered"), drops
  /// the address-book entry, removes the registry entry and closes the
  /// endpoint. A no-op when `name` is absent.
  pub async fn close(&self, name: &str) -> Result<(), SocketError> {
    let removed = {
      let mut sockets = self.inner.sockets_write();
      sockets.remove(name)
    };
    let Some(entry) = removed else {
      return Ok(());
    };

    self.inner.unregister(entry.id);
    self.inner.addresses_write().remove(name);
    entry.endpoint.close()?;
    tracing::debug!(socket = name, "socket closed");
    Ok(())
  }

  /// Disconnects a named endpoint.
  ///
  /// Removes the address-book entry and, when an address was recorded,
  /// issues a transport-level disconnect to it; also removes the poll
  /// registration. Returns `Ok(false)` when no endpoint exists under
  /// `name`, `Ok(true)` otherwise, even when there was no recorded
  /// address to disconnect from.
  pub async fn disconnect(&self, name: &str) -> Result<bool, SocketError> {
    let Ok(entry) = self.entry(name) else {
      return Ok(false);
    };

    let address = self.inner.addresses_write().remove(name);
    if let Some(address) = address {
      entry.endpoint.disconnect(&address).await?;
      tracing::debug!(socket = name, address = %address, "socket disconnected");
    }
    self.inner.unregister(entry.id);
    Ok(true)
  }

  /// Ensures a socket exists, is *connected* to `address`, and is
  /// registered with the poller: `get_or_create` + `connect` + a full
  /// engage flush in one call.
  pub async fn ensure_and_connect(
    &self,
    name: &str,
    kind: EndpointKind,
    address: &str,
    mask: InterestMask,
  ) -> Result<Arc<dyn Endpoint>, SocketError> {
    self.get_or_create(name, kind, mask).await?;
    let endpoint = self.connect(name, address, mask).await?;
    self.engage(self.inner.polling_timeout).await?;
    Ok(endpoint)
  }

  /// Ensures a socket exists, is *bound* to `address`, and is registered
  /// with the poller: `get_or_create` + `bind` + a full engage flush in
  /// one call.
  pub async fn ensure_and_bind(
    &self,
    name: &str,
    kind: EndpointKind,
    address: &str,
    mask: InterestMask,
  ) -> Result<Arc<dyn Endpoint>, SocketError> {
    self.get_or_create(name, kind, mask).await?;
    let endpoint = self.bind(name, address, mask).await?;
    self.engage(self.inner.polling_timeout).await?;
    Ok(endpoint)
  }
}
