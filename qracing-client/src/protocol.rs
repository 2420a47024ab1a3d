// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Client-server protocol for Q-Racing.
//!
//! All messages are JSON-serialized over WebSocket text frames.

use std::fmt;
use std::str::FromStr;

use qracing_math::StateVector;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProtocolError;
use crate::phase::Outcome;

/// Track length in distance units; `distance_to_finish` counts down from here.
pub const RACE_DISTANCE: f64 = 10_000.0;

/// Simulation frames per second, used to turn `frames_alive` into seconds.
pub const FRAMES_PER_SECOND: u64 = 60;

/// A stopped legacy snapshot counts as a win only above this score.
pub const LEGACY_WIN_SCORE: i64 = 800;

// ─── Speed ──────────────────────────────────────────

/// Race speed (difficulty) chosen at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slow => write!(f, "slow"),
            Self::Normal => write!(f, "normal"),
            Self::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            other => Err(format!("unknown speed '{other}' (expected slow, normal or fast)")),
        }
    }
}

// ─── Client → Server ────────────────────────────────

/// Commands sent from the client to the simulation. No reply is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Initial configuration, sent once the transport opens.
    Start { speed: Speed },
    /// Toggle pause. The server decides and reports the result in snapshots.
    Pause,
    /// Hadamard gate: put the car into superposition.
    Hadamard,
    ShiftLeft,
    ShiftRight,
    /// Collapse the state to a definite lane.
    Measure,
    SetSpeed { speed: Speed },
    /// Ask the server to drop the current simulation.
    Restart,
}

impl Command {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ─── Server → Client ────────────────────────────────

/// Messages sent from the simulation to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Periodic state snapshot.
    GameState(Snapshot),
    /// Terminal loss; carries the final snapshot.
    GameOver(Snapshot),
    /// Terminal win; carries the final snapshot.
    GameWon(Snapshot),
}

/// Server-reported game data. Obstacle lists and other render-only fields
/// are ignored. An explicit `null` reads the same as a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub quantum_state: Option<StateVector>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i64,
    /// Scoring events ("lasers passed") so far. Non-decreasing.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lasers_passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paused: bool,
    #[serde(default = "default_running", deserialize_with = "null_as_running")]
    pub running: bool,
    #[serde(default = "default_distance", deserialize_with = "null_as_distance")]
    pub distance_to_finish: f64,
    /// Seconds since the race started.
    #[serde(default, deserialize_with = "null_as_default")]
    pub elapsed_time: f64,
    #[serde(default)]
    pub vehicle: Option<VehicleStats>,
}

fn default_running() -> bool {
    true
}

fn default_distance() -> f64 {
    RACE_DISTANCE
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn null_as_running<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(de)?.unwrap_or_else(default_running))
}

fn null_as_distance<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(de)?.unwrap_or_else(default_distance))
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            quantum_state: None,
            score: 0,
            lasers_passed: 0,
            paused: false,
            running: true,
            distance_to_finish: RACE_DISTANCE,
            elapsed_time: 0.0,
            vehicle: None,
        }
    }
}

impl Snapshot {
    /// Race progress in percent, clamped to `[0, 100]`.
    pub fn progress_percent(&self) -> f64 {
        ((RACE_DISTANCE - self.distance_to_finish) / RACE_DISTANCE * 100.0).clamp(0.0, 100.0)
    }

    /// The reported quantum state. Older servers only send real per-lane
    /// amplitudes on the vehicle; those are read as `(c00, c01, c10, c11)`.
    pub fn state(&self) -> Option<StateVector> {
        if let Some(state) = self.quantum_state {
            return Some(state);
        }
        match self.vehicle.as_ref()?.amplitudes.as_deref()? {
            &[c00, c01, c10, c11] => Some(StateVector::from_real(c00, c01, c10, c11)),
            _ => None,
        }
    }
}

/// Per-run vehicle statistics shown on the game-over screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleStats {
    #[serde(deserialize_with = "null_as_default")]
    pub alive: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub hadamard_uses: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub successful_measures: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub frames_alive: u64,
    /// Real lane amplitudes, sent by servers that predate `quantum_state`.
    pub amplitudes: Option<Vec<f64>>,
}

impl VehicleStats {
    pub fn seconds_survived(&self) -> u64 {
        self.frames_alive / FRAMES_PER_SECOND
    }
}

/// An inbound message after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Snapshot(Snapshot),
    Terminal { outcome: Outcome, snapshot: Snapshot },
}

impl ServerMsg {
    /// Parse a text frame. Returns `None` for anything that is not a
    /// recognizable server message.
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Sort the message into snapshot or terminal and validate its state.
    ///
    /// A `game_state` with `running == false` and a vehicle block is the
    /// legacy terminal form: won above [`LEGACY_WIN_SCORE`], lost otherwise.
    /// Without a vehicle it is still an ordinary snapshot.
    pub fn classify(self) -> Result<Inbound, ProtocolError> {
        let inbound = match self {
            Self::GameOver(snapshot) => Inbound::Terminal {
                outcome: Outcome::Lost,
                snapshot,
            },
            Self::GameWon(snapshot) => Inbound::Terminal {
                outcome: Outcome::Won,
                snapshot,
            },
            Self::GameState(snapshot) if !snapshot.running && snapshot.vehicle.is_some() => {
                let outcome = if snapshot.score > LEGACY_WIN_SCORE {
                    Outcome::Won
                } else {
                    Outcome::Lost
                };
                Inbound::Terminal { outcome, snapshot }
            }
            Self::GameState(snapshot) => Inbound::Snapshot(snapshot),
        };

        let snapshot = match &inbound {
            Inbound::Snapshot(s) | Inbound::Terminal { snapshot: s, .. } => s,
        };
        if let Some(state) = snapshot.state() {
            if !state.is_normalized() {
                return Err(ProtocolError::Denormalized {
                    norm_sqr: state.norm_sqr(),
                });
            }
        }
        Ok(inbound)
    }
}
