// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Q-Racing session synchronization layer.
//!
//! The simulation runs on a remote server; this crate keeps one session with
//! it in sync:
//! - [`session::SessionManager`]: lifecycle, message dispatch, exactly-once
//!   score recording, restart and teardown
//! - [`command`]: key presses to outbound commands, gated on phase
//! - [`ledger::ScoreLedger`]: the ten most recent results, persisted
//! - [`protocol`]: JSON wire messages
//! - [`transport`] / [`ws`]: the transport seam and its WebSocket implementation

pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod phase;
pub mod protocol;
pub mod session;
pub mod store;
pub mod transport;
pub mod ws;

pub use config::ClientConfig;
pub use error::{LedgerError, ProtocolError, SessionError, StoreError, TransportError};
pub use ledger::{ScoreLedger, ScoreRecord, MAX_ENTRIES, SCORES_KEY};
pub use phase::{Outcome, Phase, RunState, Termination};
pub use protocol::{
    Command, ServerMsg, Snapshot, Speed, VehicleStats, LEGACY_WIN_SCORE, RACE_DISTANCE,
};
pub use session::{FinalResult, SessionConfig, SessionEvent, SessionManager};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{
    Connector, MemoryConnector, TransportEvent, TransportEventKind, TransportHandle, TransportId,
};
pub use ws::WsConnector;
