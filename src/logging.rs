// src/logging.rs

//! Republishing of log records as pub/sub events.
//!
//! A [`LogPublisher`] is a thin sink bound to one endpoint and topic. It
//! formats a structured record into a small map and pushes it through
//! [`SocketManager::publish_safe`], consuming the facade exactly as any
//! other producer would.

use crate::error::SocketError;
use crate::manager::SocketManager;

use serde_json::{json, Value};
use tracing::Level;

/// A logging sink that publishes records through a Pub endpoint.
#[derive(Debug, Clone)]
pub struct LogPublisher {
  sockets: SocketManager,
  socket_name: String,
  topic: String,
}

impl LogPublisher {
  pub(crate) fn new(sockets: SocketManager, socket_name: &str, topic: &str) -> Self {
    Self {
      sockets,
      socket_name: socket_name.to_string(),
      topic: topic.to_string(),
    }
  }

  /// Publishes one record as `{"message", "arguments", "level"}` under
  /// the configured topic.
  pub async fn emit(&self, level: Level, message: &str, arguments: Value) -> Result<(), SocketError> {
    let record = json!({
      "message": message,
      "arguments": arguments,
      "level": level.to_string(),
    });
    self
      .sockets
      .publish_safe(&self.socket_name, &self.topic, &record)
      .await
  }

  /// Publishes an info-level record with no arguments.
  pub async fn info(&self, message: &str) -> Result<(), SocketError> {
    self.emit(Level::INFO, message, Value::Null).await
  }

  /// Publishes a warn-level record with no arguments.
  pub async fn warn(&self, message: &str) -> Result<(), SocketError> {
    self.emit(Level::WARN, message, Value::Null).await
  }

  /// Publishes an error-level record with no arguments.
  pub async fn error(&self, message: &str) -> Result<(), SocketError> {
    self.emit(Level::ERROR, message, Value::Null).await
  }
}

impl SocketManager {
  /// Returns a [`LogPublisher`] bound to a previously created endpoint.
  ///
  /// ```no_run
  /// # use std::sync::Arc;
  /// # use sockmux::{EndpointKind, InterestMask, SocketManager};
  /// # async fn example(sockets: SocketManager) -> Result<(), sockmux::SocketError> {
  /// sockets
  ///   .ensure_and_bind("logs", EndpointKind::Pub, "tcp://0.0.0.0:6000", InterestMask::WRITABLE)
  ///   .await?;
  /// let logger = sockets.log_publisher("logs", "logs");
  /// logger.info("server is up").await?;
  /// # Ok(())
  /// # }
  /// ```
  pub fn log_publisher(&self, socket_name: &str, topic: &str) -> LogPublisher {
    LogPublisher::new(self.clone(), socket_name, topic)
  }
}
