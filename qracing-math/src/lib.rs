// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Q-Racing numerics.
//!
//! The race is driven by a two-qubit state `(c00, c01, c10, c11)`: the first
//! coordinate is the lane in universe A, the second the lane in universe B.
//! This crate holds the state vector type and the marginal projection the
//! client uses to turn it into per-universe lane probabilities.

pub mod projection;
pub mod state;

pub use projection::{project, project_state, LanePair, UniverseProbabilities, RENDER_EPSILON};
pub use state::{StateVector, NORM_TOLERANCE};
