// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! RPC channel to the simulation backend
//!
//! One request, one reply, over a persistent request/reply transport. A
//! reply carrying an `error` key becomes [`SessionError::Backend`] with the
//! backend's message verbatim; the transport stays in a consistent state, so
//! the next call can proceed. A reply missing an expected key is a
//! [`SessionError::Protocol`] error.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::codec::{self, Action, Observation, ResetInfo};
use crate::error::{SessionError, SessionResult};
use crate::transport::{RequestReplyClient, Transport, ZmqReq};

/// Result of a `step` exchange
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub terminated: bool,
    /// Backend-defined extra information, passed through untouched. A `null`
    /// info is reported as an empty map; any other non-map is rejected.
    pub info: Map<String, Value>,
}

pub struct RpcChannel {
    transport: Box<dyn RequestReplyClient>,
    exchanges: u64,
}

impl RpcChannel {
    /// Wrap an already started transport
    pub fn new(transport: Box<dyn RequestReplyClient>) -> Self {
        Self {
            transport,
            exchanges: 0,
        }
    }

    /// Connect a ZMQ REQ socket to `tcp://host:port`
    pub fn connect(context: Arc<zmq::Context>, host: &str, port: u16) -> SessionResult<Self> {
        let mut transport = ZmqReq::new(context, format!("tcp://{}:{}", host, port));
        transport.start()?;
        debug!(
            "[CHANNEL] {} transport to {}",
            transport.transport_type(),
            transport.address()
        );
        Ok(Self::new(Box::new(transport)))
    }

    /// Start an episode; must be the first call after connecting
    pub fn reset(&mut self, wind: [f64; 2], rate: u32) -> SessionResult<(Observation, ResetInfo)> {
        let mut reply = self.exchange("reset", codec::encode_reset(wind, rate)?)?;
        let obs = codec::decode_observation(take_field(&mut reply, "obs")?)?;
        let info = codec::decode_reset_info(take_field(&mut reply, "info")?)?;
        Ok((obs, info))
    }

    /// Advance the simulation by one backend tick
    pub fn step(&mut self, action: &Action) -> SessionResult<StepOutcome> {
        let mut reply = self.exchange("action", codec::encode_action(action)?)?;
        let observation = codec::decode_observation(take_field(&mut reply, "obs")?)?;
        let terminated = match take_field(&mut reply, "done")? {
            Value::Bool(done) => done,
            other => {
                return Err(SessionError::Protocol(format!(
                    "'done' must be a bool, got {}",
                    codec::value_kind(&other)
                )))
            }
        };
        let info = match take_field(&mut reply, "info")? {
            Value::Object(info) => info,
            Value::Null => Map::new(),
            other => {
                return Err(SessionError::Protocol(format!(
                    "'info' must be a map, got {}",
                    codec::value_kind(&other)
                )))
            }
        };

        Ok(StepOutcome {
            observation,
            terminated,
            info,
        })
    }

    /// Graceful shutdown handshake; any map reply counts as the ack
    pub fn close(&mut self) -> SessionResult<()> {
        self.exchange("close", codec::encode_close()?)?;
        Ok(())
    }

    /// Number of completed request/reply exchanges
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    fn exchange(&mut self, kind: &str, request: Vec<u8>) -> SessionResult<Map<String, Value>> {
        trace!("[CHANNEL] -> {} ({} bytes)", kind, request.len());
        let raw = self.transport.request(&request)?;
        self.exchanges += 1;
        trace!("[CHANNEL] <- {} ({} bytes)", kind, raw.len());

        let mut reply = codec::decode_reply(&raw)?;
        if let Some(error) = reply.remove("error") {
            let message = match error {
                Value::String(message) => message,
                other => other.to_string(),
            };
            debug!("[CHANNEL] Backend rejected '{}': {}", kind, message);
            return Err(SessionError::Backend(message));
        }
        Ok(reply)
    }
}

impl Drop for RpcChannel {
    fn drop(&mut self) {
        let _ = self.transport.stop();
    }
}

fn take_field(reply: &mut Map<String, Value>, key: &str) -> SessionResult<Value> {
    reply
        .remove(key)
        .ok_or_else(|| SessionError::Protocol(format!("Reply is missing '{}'", key)))
}
