// src/transport/options.rs

//! Numeric option IDs understood by [`crate::transport::Endpoint::set_option`].
//!
//! Values are kept consistent with libzmq so transports backed by a real
//! ZeroMQ stack can pass them straight through.

/// Routing identity of the endpoint (often called ZMQ_IDENTITY).
pub const ROUTING_ID: i32 = 5;
/// Establish a message filter on a Sub endpoint. An empty value
/// subscribes to every topic.
pub const SUBSCRIBE: i32 = 6;
/// Remove a message filter from a Sub endpoint.
pub const UNSUBSCRIBE: i32 = 7;
/// Linger period for endpoint shutdown.
pub const LINGER: i32 = 17;
/// High water mark for outbound messages.
pub const SNDHWM: i32 = 23;
/// High water mark for inbound messages.
pub const RCVHWM: i32 = 24;
