use std::io;
use thiserror::Error;

use crate::codec::CodecError;

/// Errors reported across the transport boundary.
///
/// Implementations of [`crate::transport::Transport`] and
/// [`crate::transport::Endpoint`] map their native failures onto these
/// variants; the manager either propagates them or wraps them into the
/// lifecycle variants of [`SocketError`].
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum TransportError {
  // --- I/O Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  // --- Connection/Binding Errors ---
  #[error("Address already in use: {0}")]
  AddrInUse(String),
  #[error("Address not available: {0}")]
  AddrNotAvailable(String),
  #[error("Connection refused by peer: {0}")]
  ConnectionRefused(String),
  #[error("Connection closed by peer or transport")]
  ConnectionClosed,
  #[error("Permission denied for endpoint: {0}")]
  PermissionDenied(String),

  // --- Endpoint Errors ---
  #[error("Invalid endpoint address: {0}")]
  InvalidAddress(String),
  #[error("Endpoint is closed")]
  EndpointClosed,

  // --- Option Errors ---
  #[error("Invalid socket option ID: {0}")]
  InvalidOption(i32),
  #[error("Invalid value provided for option ID {0}")]
  InvalidOptionValue(i32),

  // --- Unsupported ---
  #[error("Operation not supported by this endpoint kind: {0}")]
  UnsupportedOperation(&'static str),

  // --- Internal Errors ---
  #[error("Internal transport error: {0}")]
  Internal(String),
}

impl TransportError {
  /// Maps common `std::io::Error` kinds onto address-carrying variants.
  pub fn from_io_endpoint(e: io::Error, address: &str) -> Self {
    match e.kind() {
      io::ErrorKind::AddrInUse => TransportError::AddrInUse(address.to_string()),
      io::ErrorKind::AddrNotAvailable => TransportError::AddrNotAvailable(address.to_string()),
      io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused(address.to_string()),
      io::ErrorKind::PermissionDenied => TransportError::PermissionDenied(address.to_string()),
      io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => TransportError::ConnectionClosed,
      _ => TransportError::Io(e),
    }
  }
}

/// Errors raised by [`crate::SocketManager`] operations.
///
/// Transient unavailability is never reported through this enum: the safe
/// facade returns `Ok(false)` / `Ok(None)` when a socket does not become
/// ready in time. These variants cover lifecycle and lookup mistakes and
/// hard transport/codec failures only.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SocketError {
  #[error("no socket named {0:?}")]
  NotFound(String),

  #[error("a socket named {0:?} already exists")]
  AlreadyExists(String),

  #[error("socket {name:?} could not bind to address {address:?}")]
  Bind {
    name: String,
    address: String,
    #[source]
    source: Option<TransportError>,
  },

  #[error("socket {name:?} could not connect to address {address:?}")]
  Connect {
    name: String,
    address: String,
    #[source]
    source: Option<TransportError>,
  },

  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String),

  #[error("Invalid message format for operation: {0}")]
  InvalidMessage(String),

  #[error("serialization backend error: {0}")]
  Codec(#[from] CodecError),

  #[error("transport error: {0}")]
  Transport(#[from] TransportError),
}

impl SocketError {
  pub(crate) fn bind(name: &str, address: &str, source: Option<TransportError>) -> Self {
    SocketError::Bind {
      name: name.to_string(),
      address: address.to_string(),
      source,
    }
  }

  pub(crate) fn connect(name: &str, address: &str, source: Option<TransportError>) -> Self {
    SocketError::Connect {
      name: name.to_string(),
      address: address.to_string(),
      source,
    }
  }
}
