// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Two-qubit amplitude vector.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Maximum allowed deviation of `Σ|c|²` from 1 before a state is rejected.
pub const NORM_TOLERANCE: f64 = 0.05;

/// Amplitudes `(c00, c01, c10, c11)` indexed by `(lane_a, lane_b)`.
///
/// On the wire each amplitude is a `[re, im]` pair, so a full vector is
/// `[[re, im], [re, im], [re, im], [re, im]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector {
    pub amplitudes: [Complex<f64>; 4],
}

impl StateVector {
    pub fn new(amplitudes: [Complex<f64>; 4]) -> Self {
        Self { amplitudes }
    }

    /// Build from real amplitudes (zero imaginary parts).
    pub fn from_real(c00: f64, c01: f64, c10: f64, c11: f64) -> Self {
        Self::new([
            Complex::new(c00, 0.0),
            Complex::new(c01, 0.0),
            Complex::new(c10, 0.0),
            Complex::new(c11, 0.0),
        ])
    }

    /// The classical `|00⟩` state: both cars in lane 0.
    pub fn ground() -> Self {
        Self::from_real(1.0, 0.0, 0.0, 0.0)
    }

    /// Amplitude for lane `a` in universe A and lane `b` in universe B.
    pub fn amplitude(&self, a: usize, b: usize) -> Complex<f64> {
        self.amplitudes[(a << 1) | b]
    }

    /// Born-rule probabilities `|c_k|²` in storage order.
    pub fn probabilities(&self) -> [f64; 4] {
        self.amplitudes.map(|c| c.norm_sqr())
    }

    /// Total probability mass `Σ|c_k|²`.
    pub fn norm_sqr(&self) -> f64 {
        self.probabilities().iter().sum()
    }

    /// Whether every amplitude is finite and the norm is within [`NORM_TOLERANCE`] of 1.
    pub fn is_normalized(&self) -> bool {
        let finite = self
            .amplitudes
            .iter()
            .all(|c| c.re.is_finite() && c.im.is_finite());
        finite && (self.norm_sqr() - 1.0).abs() <= NORM_TOLERANCE
    }
}

impl Default for StateVector {
    fn default() -> Self {
        Self::ground()
    }
}
