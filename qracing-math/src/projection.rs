// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Joint state → per-universe lane probabilities.
//!
//! Universe A reads the first coordinate, universe B the second. Each
//! universe's lane distribution is the marginal over the other coordinate:
//!
//! ```text
//! A: lane0 = p00 + p01   lane1 = p10 + p11
//! B: lane0 = p00 + p10   lane1 = p01 + p11
//! ```
//!
//! Values are returned exactly as computed. Consumers may skip drawing lanes
//! below [`RENDER_EPSILON`].

use serde::Serialize;

use crate::state::StateVector;

/// Probability below which a renderer treats a lane as empty.
pub const RENDER_EPSILON: f64 = 0.01;

/// Lane probabilities for one universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LanePair {
    pub lane0: f64,
    pub lane1: f64,
}

impl LanePair {
    /// Fully classical, lane 0.
    pub const CLASSICAL: Self = Self { lane0: 1.0, lane1: 0.0 };

    pub fn sum(&self) -> f64 {
        self.lane0 + self.lane1
    }

    /// Lanes whose probability reaches [`RENDER_EPSILON`].
    pub fn visible_lanes(&self) -> impl Iterator<Item = (usize, f64)> {
        [self.lane0, self.lane1]
            .into_iter()
            .enumerate()
            .filter(|&(_, p)| p >= RENDER_EPSILON)
    }
}

impl Default for LanePair {
    fn default() -> Self {
        Self::CLASSICAL
    }
}

/// Marginal lane distributions for both universes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct UniverseProbabilities {
    pub a: LanePair,
    pub b: LanePair,
}

/// Project a joint state onto its two marginals.
pub fn project_state(state: &StateVector) -> UniverseProbabilities {
    let [p00, p01, p10, p11] = state.probabilities();
    UniverseProbabilities {
        a: LanePair {
            lane0: p00 + p01,
            lane1: p10 + p11,
        },
        b: LanePair {
            lane0: p00 + p10,
            lane1: p01 + p11,
        },
    }
}

/// Project an optional state. `None` (nothing received yet) yields `(1, 0)`
/// for both universes.
pub fn project(state: Option<&StateVector>) -> UniverseProbabilities {
    state.map(project_state).unwrap_or_default()
}
