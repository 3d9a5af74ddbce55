// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Request/reply transport to the simulation backend
//!
//! The channel only needs a strict request/reply exchange, so the transport
//! surface is reduced to [`RequestReplyClient::request`]. [`ZmqReq`] is the
//! production implementation (ZMQ REQ socket, blocking, no timeout).

pub mod traits;
pub mod zmq_req;

pub use traits::{RequestReplyClient, Transport};
pub use zmq_req::ZmqReq;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Socket-level failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Transport is not connected")]
    NotConnected,

    #[error("Transport is already connected")]
    AlreadyConnected,

    #[error("ZMQ error: {0}")]
    Zmq(#[from] zmq::Error),
}
