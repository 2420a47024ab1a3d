// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Error types for the session layer.
//!
//! Nothing here escapes [`crate::session::SessionManager`] as a panic; the
//! manager logs transport and ledger failures and only hands
//! [`SessionError`] back from `start`/`restart`.

use thiserror::Error;

/// Failures of the message transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport could not be opened (bad address, no runtime, refused).
    #[error("connect failed: {0}")]
    Connect(String),

    /// A frame could not be handed to the transport.
    #[error("send failed: {0}")]
    Send(String),

    /// The transport has already been closed.
    #[error("transport closed")]
    Closed,
}

/// Failures of the key-value persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures while persisting the score list.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("score list encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Inbound payloads that parse but violate the message contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// `Σ|c|²` is too far from 1 (or not finite).
    #[error("quantum state is not normalized (norm² = {norm_sqr})")]
    Denormalized { norm_sqr: f64 },
}

/// Errors returned to the caller of the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not be opened; the session is back in `Idle`.
    #[error("could not open session transport: {0}")]
    Connect(#[from] TransportError),

    /// `start` was called while a session is already connecting or active.
    #[error("session already {phase}")]
    AlreadyStarted { phase: String },

    /// `restart` was called before any session was ever started.
    #[error("no previous session to restart")]
    NoPreviousSession,
}
