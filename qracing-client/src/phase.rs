// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Session lifecycle phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Final result reported by a terminal message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
}

impl Outcome {
    pub fn is_won(self) -> bool {
        self == Self::Won
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// Paused flag inside `Active`, as last reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

impl RunState {
    pub fn from_paused(paused: bool) -> Self {
        if paused {
            Self::Paused
        } else {
            Self::Running
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A terminal message arrived.
    Finished(Outcome),
    /// The transport closed before any terminal message.
    Abnormal,
}

/// Lifecycle of one session.
///
/// ```text
/// Idle ─start─▶ Connecting ─open─▶ Active(Running ⇄ Paused) ─terminal/close─▶ Terminated
///   ▲               │                                                           │
///   └── failure ────┘◀──────────────── back_to_menu / restart ──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    Active(RunState),
    Terminated(Termination),
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn is_running(self) -> bool {
        self == Self::Active(RunState::Running)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Active(RunState::Running) => write!(f, "running"),
            Self::Active(RunState::Paused) => write!(f, "paused"),
            Self::Terminated(Termination::Finished(outcome)) => write!(f, "terminated ({outcome})"),
            Self::Terminated(Termination::Abnormal) => write!(f, "terminated (connection lost)"),
        }
    }
}
