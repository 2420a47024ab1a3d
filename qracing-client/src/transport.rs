// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Message transport seam.
//!
//! A [`Connector`] opens one duplex text transport per session. Inbound
//! traffic does not flow through the returned handle: the connector's
//! implementation delivers [`TransportEvent`]s, tagged with the
//! [`TransportId`] it was opened under, to whoever drives the session
//! manager. The id is what lets the manager drop events from transports it
//! has already retired.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::TransportError;
use crate::protocol::Command;

/// Identity of one opened transport. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(pub u64);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Open,
    Message(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub id: TransportId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(id: TransportId, kind: TransportEventKind) -> Self {
        Self { id, kind }
    }
}

/// Outbound half of an open transport.
///
/// Dropping a handle must release the transport as if `close` were called.
pub trait TransportHandle {
    fn send(&mut self, text: String) -> Result<(), TransportError>;
    fn close(&mut self);
}

/// Opens transports addressed by client identifier.
pub trait Connector {
    type Handle: TransportHandle;

    fn connect(&mut self, id: TransportId, client_id: &str)
        -> Result<Self::Handle, TransportError>;
}

// ─── In-memory transport ────────────────────────────

/// Everything that went over a [`MemoryConnector`].
#[derive(Debug, Default)]
pub struct MemoryWire {
    /// `(transport, client_id)` per successful connect.
    pub connects: Vec<(TransportId, String)>,
    /// `(transport, frame)` per sent frame.
    pub sent: Vec<(TransportId, String)>,
    /// Transports closed by their owner, in order.
    pub closed: Vec<TransportId>,
    /// When set, `connect` fails.
    pub refuse: bool,
}

/// Scripted transport for driving a session without a network.
///
/// Clones share one [`MemoryWire`], so a test keeps a clone to inspect
/// traffic after handing the connector to a session manager. Inbound events
/// are fed by calling `SessionManager::handle_event` directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    wire: Arc<Mutex<MemoryWire>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wire(&self) -> MutexGuard<'_, MemoryWire> {
        self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.wire().refuse = refuse;
    }

    /// Sent frames decoded as commands, with their transport.
    pub fn sent_commands(&self) -> Vec<(TransportId, Command)> {
        self.wire()
            .sent
            .iter()
            .filter_map(|(id, text)| serde_json::from_str(text).ok().map(|c| (*id, c)))
            .collect()
    }

    pub fn is_closed(&self, id: TransportId) -> bool {
        self.wire().closed.contains(&id)
    }
}

impl Connector for MemoryConnector {
    type Handle = MemoryTransport;

    fn connect(
        &mut self,
        id: TransportId,
        client_id: &str,
    ) -> Result<MemoryTransport, TransportError> {
        let mut wire = self.wire();
        if wire.refuse {
            return Err(TransportError::Connect("connection refused".into()));
        }
        wire.connects.push((id, client_id.to_string()));
        drop(wire);
        Ok(MemoryTransport {
            id,
            wire: Arc::clone(&self.wire),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    id: TransportId,
    wire: Arc<Mutex<MemoryWire>>,
    closed: bool,
}

impl MemoryTransport {
    fn wire(&self) -> MutexGuard<'_, MemoryWire> {
        self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TransportHandle for MemoryTransport {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let id = self.id;
        self.wire().sent.push((id, text));
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let id = self.id;
            self.wire().closed.push(id);
        }
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_records_traffic() {
        let mut connector = MemoryConnector::new();
        let peer = connector.clone();
        let mut handle = connector.connect(TransportId(1), "abc").unwrap();
        handle.send(Command::Measure.to_json().unwrap()).unwrap();
        handle.close();
        assert!(matches!(
            handle.send("late".into()),
            Err(TransportError::Closed)
        ));

        assert_eq!(peer.wire().connects, vec![(TransportId(1), "abc".to_string())]);
        assert_eq!(peer.sent_commands(), vec![(TransportId(1), Command::Measure)]);
        assert!(peer.is_closed(TransportId(1)));
    }

    #[test]
    fn test_drop_closes_once() {
        let mut connector = MemoryConnector::new();
        let peer = connector.clone();
        let mut handle = connector.connect(TransportId(7), "abc").unwrap();
        handle.close();
        drop(handle);
        assert_eq!(peer.wire().closed, vec![TransportId(7)]);
    }

    #[test]
    fn test_refused() {
        let mut connector = MemoryConnector::new();
        connector.refuse_connections(true);
        assert!(connector.connect(TransportId(1), "abc").is_err());
        assert!(connector.wire().connects.is_empty());
    }
}
