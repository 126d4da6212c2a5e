//! sockmux - named-socket registry and cooperative readiness
//! multiplexing for non-blocking messaging transports.
//!
//! Applications refer to transport endpoints by logical name, register
//! each with one shared multiplexer, and send/receive only when the
//! transport signals readiness, turning a poll-driven transport into
//! operations that "wait" cooperatively without blocking the process.

pub mod codec;
pub mod error;
pub mod event;
pub mod logging;
pub mod manager;
pub mod scheduler;
pub mod transport;

// Re-export core types for user convenience
pub use codec::{Codec, CodecError, Json, MsgPack};
pub use error::{SocketError, TransportError};
pub use event::Event;
pub use logging::LogPublisher;
pub use manager::{KeepPolling, SocketManager, Subscription, DEFAULT_POLLING_TIMEOUT, DEFAULT_TIMEOUT};
pub use scheduler::{Scheduler, TokioYield};
pub use transport::{
  Endpoint, EndpointId, EndpointKind, InterestMask, PollInterest, ReadinessSnapshot, Transport,
};

// --- Top-Level Functions ---

const VERSION_MAJOR: i32 = 0;
const VERSION_MINOR: i32 = 1;
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

/// Returns the major version number of the library.
pub fn version_major() -> i32 {
  VERSION_MAJOR
}

/// Returns the minor version number of the library.
pub fn version_minor() -> i32 {
  VERSION_MINOR
}

/// Returns the patch version number of the library.
pub fn version_patch() -> i32 {
  VERSION_PATCH
}
