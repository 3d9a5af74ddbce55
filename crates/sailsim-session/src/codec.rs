// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Message codec between the backend wire schema and typed observations
//!
//! The backend speaks MessagePack maps of named scalars (`{x, y, z}` groups,
//! bare angles). This module flattens them into fixed-shape arrays in
//! `x, y, z` order and wraps bare scalars into one-element arrays, so every
//! observation field has a static shape.
//!
//! Decoding is strict: a missing named field is an error, never a default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SessionError, SessionResult};

/// Wire `{x, y, z}` group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Wire `{x, y}` group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVector2 {
    pub x: f64,
    pub y: f64,
}

/// `obs` payload as sent by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireObservation {
    pub p_boat: WireVector3,
    pub dt_p_boat: WireVector3,
    pub theta_boat: WireVector3,
    pub dt_theta_boat: WireVector3,
    pub theta_rudder: f64,
    pub dt_theta_rudder: f64,
    pub theta_sail: f64,
    pub dt_theta_sail: f64,
    pub wind: WireVector2,
}

/// `info` payload of a reset reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireResetInfo {
    pub min_position: WireVector2,
    pub max_position: WireVector2,
}

/// One simulation time-slice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Boat position (x, y, z)
    pub p_boat: [f32; 3],
    /// Boat linear velocity
    pub dt_p_boat: [f32; 3],
    /// Boat orientation, one angle per rotational axis
    pub theta_boat: [f32; 3],
    /// Boat angular velocity
    pub dt_theta_boat: [f32; 3],
    pub theta_rudder: [f32; 1],
    pub dt_theta_rudder: [f32; 1],
    pub theta_sail: [f32; 1],
    pub dt_theta_sail: [f32; 1],
    /// Wind vector (x, y)
    pub wind: [f32; 2],
}

/// Navigable area returned by a reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetInfo {
    /// `[min corner, max corner]`
    pub map_bounds: [[f32; 3]; 2],
}

impl ResetInfo {
    pub fn min_position(&self) -> [f32; 3] {
        self.map_bounds[0]
    }

    pub fn max_position(&self) -> [f32; 3] {
        self.map_bounds[1]
    }
}

/// Commanded rudder and sail angles, in radians
///
/// Range is not enforced here; the backend clamps or rejects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub theta_rudder: f64,
    pub theta_sail: f64,
}

impl Action {
    pub fn new(theta_rudder: f64, theta_sail: f64) -> Self {
        Self {
            theta_rudder,
            theta_sail,
        }
    }

    /// Build from one-element buffers, the shape an observation uses for angles
    pub fn from_slices(theta_rudder: &[f64], theta_sail: &[f64]) -> SessionResult<Self> {
        Ok(Self::new(
            single_scalar("theta_rudder", theta_rudder)?,
            single_scalar("theta_sail", theta_sail)?,
        ))
    }
}

impl From<(f64, f64)> for Action {
    fn from((theta_rudder, theta_sail): (f64, f64)) -> Self {
        Self::new(theta_rudder, theta_sail)
    }
}

impl From<[f64; 2]> for Action {
    fn from([theta_rudder, theta_sail]: [f64; 2]) -> Self {
        Self::new(theta_rudder, theta_sail)
    }
}

impl From<([f32; 1], [f32; 1])> for Action {
    fn from((theta_rudder, theta_sail): ([f32; 1], [f32; 1])) -> Self {
        Self::new(f64::from(theta_rudder[0]), f64::from(theta_sail[0]))
    }
}

fn single_scalar(field: &str, values: &[f64]) -> SessionResult<f64> {
    match values {
        [value] => Ok(*value),
        _ => Err(SessionError::Codec(format!(
            "{} must hold exactly one value, got {}",
            field,
            values.len()
        ))),
    }
}

#[derive(Serialize)]
struct ResetRequest {
    reset: ResetBody,
}

#[derive(Serialize)]
struct ResetBody {
    wind: WireVector2,
    freq: u32,
}

#[derive(Serialize)]
struct ActionRequest {
    action: Action,
}

#[derive(Serialize)]
struct CloseRequest {
    close: bool,
}

/// `{reset: {wind: {x, y}, freq}}`
pub fn encode_reset(wind: [f64; 2], rate: u32) -> SessionResult<Vec<u8>> {
    let request = ResetRequest {
        reset: ResetBody {
            wind: WireVector2 {
                x: wind[0],
                y: wind[1],
            },
            freq: rate,
        },
    };
    Ok(rmp_serde::to_vec_named(&request)?)
}

/// `{action: {theta_rudder, theta_sail}}`
pub fn encode_action(action: &Action) -> SessionResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(&ActionRequest { action: *action })?)
}

/// `{close: true}`
pub fn encode_close() -> SessionResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(&CloseRequest { close: true })?)
}

/// Decode a reply frame into its top-level map
pub fn decode_reply(bytes: &[u8]) -> SessionResult<Map<String, Value>> {
    match rmp_serde::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(SessionError::Protocol(format!(
            "Reply must be a map, got {}",
            value_kind(&other)
        ))),
    }
}

pub fn decode_observation(value: Value) -> SessionResult<Observation> {
    let wire: WireObservation = serde_json::from_value(value)
        .map_err(|e| SessionError::Protocol(format!("Malformed obs: {}", e)))?;
    Observation::try_from(wire)
}

pub fn decode_reset_info(value: Value) -> SessionResult<ResetInfo> {
    let wire: WireResetInfo = serde_json::from_value(value)
        .map_err(|e| SessionError::Protocol(format!("Malformed reset info: {}", e)))?;
    ResetInfo::try_from(wire)
}

/// Narrow to `f32`, rejecting values that do not survive as finite
fn narrow(field: &str, value: f64) -> SessionResult<f32> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(SessionError::Protocol(format!(
            "'{}' is not a finite f32: {}",
            field, value
        )))
    }
}

fn narrow3(field: &str, v: WireVector3) -> SessionResult<[f32; 3]> {
    Ok([
        narrow(&format!("{}.x", field), v.x)?,
        narrow(&format!("{}.y", field), v.y)?,
        narrow(&format!("{}.z", field), v.z)?,
    ])
}

fn narrow2(field: &str, v: WireVector2) -> SessionResult<[f32; 2]> {
    Ok([
        narrow(&format!("{}.x", field), v.x)?,
        narrow(&format!("{}.y", field), v.y)?,
    ])
}

impl TryFrom<WireObservation> for Observation {
    type Error = SessionError;

    fn try_from(obs: WireObservation) -> SessionResult<Self> {
        Ok(Self {
            p_boat: narrow3("p_boat", obs.p_boat)?,
            dt_p_boat: narrow3("dt_p_boat", obs.dt_p_boat)?,
            theta_boat: narrow3("theta_boat", obs.theta_boat)?,
            dt_theta_boat: narrow3("dt_theta_boat", obs.dt_theta_boat)?,
            theta_rudder: [narrow("theta_rudder", obs.theta_rudder)?],
            dt_theta_rudder: [narrow("dt_theta_rudder", obs.dt_theta_rudder)?],
            theta_sail: [narrow("theta_sail", obs.theta_sail)?],
            dt_theta_sail: [narrow("dt_theta_sail", obs.dt_theta_sail)?],
            wind: narrow2("wind", obs.wind)?,
        })
    }
}

impl TryFrom<WireResetInfo> for ResetInfo {
    type Error = SessionError;

    /// The backend only reports the horizontal extent; the vertical one is
    /// normalised to `[0, 1]`.
    fn try_from(info: WireResetInfo) -> SessionResult<Self> {
        let [min_x, min_y] = narrow2("min_position", info.min_position)?;
        let [max_x, max_y] = narrow2("max_position", info.max_position)?;
        Ok(Self {
            map_bounds: [[min_x, min_y, 0.0], [max_x, max_y, 1.0]],
        })
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
