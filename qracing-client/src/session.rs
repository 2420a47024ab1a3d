// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Session manager: one connection to the remote simulation at a time.
//!
//! The manager never blocks or awaits. A driver feeds it transport events
//! ([`SessionManager::handle_event`]) and player input
//! ([`SessionManager::handle_input`]) in arrival order, and drains the
//! resulting [`SessionEvent`]s for whatever presents them.
//!
//! Two guards make late delivery harmless:
//! 1. Events whose [`TransportId`] is not the live transport are dropped, so
//!    a retired transport can never touch a newer session.
//! 2. Terminal handling only runs from `Active` and only while the
//!    terminal-recorded flag is clear, so the score ledger is written at most
//!    once per session even if the server repeats itself before the close
//!    completes.

use qracing_math::{project, UniverseProbabilities};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command;
use crate::error::SessionError;
use crate::ledger::ScoreLedger;
use crate::phase::{Outcome, Phase, RunState, Termination};
use crate::protocol::{Command, Inbound, ServerMsg, Snapshot, Speed};
use crate::store::KeyValueStore;
use crate::transport::{Connector, TransportEvent, TransportEventKind, TransportHandle, TransportId};

/// Settings captured once per session at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub player_name: String,
    pub speed: Speed,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            speed: Speed::Normal,
        }
    }
}

/// Notifications for observers, drained with [`SessionManager::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    /// The scoring-event counter increased to `total`.
    ScoringEvent { total: u64 },
    /// A terminal message was processed. `recorded` is whether the ledger
    /// accepted a new entry.
    Finished {
        outcome: Outcome,
        score: i64,
        recorded: bool,
    },
    /// The transport failed to open; the session is back in `Idle`.
    ConnectFailed { reason: String },
    /// The transport reported an error. Not fatal on its own.
    TransportError { message: String },
}

/// Authoritative end-of-race data, taken from the terminal message.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalResult {
    pub outcome: Outcome,
    pub score: i64,
    pub snapshot: Snapshot,
}

/// Per-session state, rebuilt from scratch on every start.
#[derive(Debug, Default)]
struct SessionState {
    lasers_seen: u64,
    terminal_recorded: bool,
    last_snapshot: Option<Snapshot>,
    final_result: Option<FinalResult>,
}

struct LiveTransport<H> {
    id: TransportId,
    handle: H,
}

pub struct SessionManager<C: Connector, S> {
    client_id: String,
    connector: C,
    ledger: ScoreLedger<S>,
    phase: Phase,
    config: Option<SessionConfig>,
    transport: Option<LiveTransport<C::Handle>>,
    next_transport: u64,
    state: SessionState,
    events: Vec<SessionEvent>,
}

impl<C: Connector, S: KeyValueStore> SessionManager<C, S> {
    /// Create an idle manager with a fresh client identifier.
    pub fn new(connector: C, store: S) -> Self {
        Self {
            client_id: Uuid::new_v4().simple().to_string(),
            connector,
            ledger: ScoreLedger::new(store),
            phase: Phase::Idle,
            config: None,
            transport: None,
            next_transport: 0,
            state: SessionState::default(),
            events: Vec::new(),
        }
    }

    // ─── Lifecycle ──────────────────────────────────

    /// `Idle`/`Terminated` → `Connecting`. Opens a new transport.
    ///
    /// On failure the session stays in `Idle` and the error is returned.
    pub fn start(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        if matches!(self.phase, Phase::Connecting | Phase::Active(_)) {
            return Err(SessionError::AlreadyStarted {
                phase: self.phase.to_string(),
            });
        }

        self.retire_transport();
        self.state = SessionState::default();
        self.config = Some(config);

        self.next_transport += 1;
        let id = TransportId(self.next_transport);
        match self.connector.connect(id, &self.client_id) {
            Ok(handle) => {
                self.transport = Some(LiveTransport { id, handle });
                self.set_phase(Phase::Connecting);
                Ok(())
            }
            Err(e) => {
                warn!(transport = %id, "transport open failed: {e}");
                self.set_phase(Phase::Idle);
                Err(e.into())
            }
        }
    }

    /// Tear down whatever is live and start again with the last config.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        let config = self.config.clone().ok_or(SessionError::NoPreviousSession)?;
        if self.phase.is_active() {
            // Best effort: let the server drop the old simulation.
            self.transmit(Command::Restart);
        }
        info!(client_id = %self.client_id, "restarting session");
        self.reset();
        self.start(config)
    }

    /// Tear down whatever is live and return to `Idle`.
    pub fn back_to_menu(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.retire_transport();
        self.state = SessionState::default();
        self.set_phase(Phase::Idle);
    }

    fn retire_transport(&mut self) {
        if let Some(mut live) = self.transport.take() {
            debug!(transport = %live.id, "releasing transport");
            live.handle.close();
        }
    }

    // ─── Transport events ───────────────────────────

    /// Apply one transport event. Events from retired transports are ignored.
    pub fn handle_event(&mut self, event: TransportEvent) {
        let live = self.transport.as_ref().map(|t| t.id);
        if live != Some(event.id) {
            debug!(transport = %event.id, "dropping event from retired transport");
            return;
        }

        match event.kind {
            TransportEventKind::Open => self.on_open(),
            TransportEventKind::Message(text) => self.on_message(&text),
            TransportEventKind::Error(message) => self.on_error(message),
            TransportEventKind::Closed => self.on_closed(),
        }
    }

    fn on_open(&mut self) {
        if self.phase != Phase::Connecting {
            return;
        }
        let speed = self.config.as_ref().map(|c| c.speed).unwrap_or_default();
        info!(client_id = %self.client_id, %speed, "connected to simulation");
        self.set_phase(Phase::Active(RunState::Running));
        self.transmit(Command::Start { speed });
    }

    fn on_error(&mut self, message: String) {
        warn!("transport error: {message}");
        self.events.push(SessionEvent::TransportError {
            message: message.clone(),
        });
        if self.phase == Phase::Connecting {
            self.fail_connect(message);
        }
    }

    fn on_closed(&mut self) {
        match self.phase {
            Phase::Connecting => self.fail_connect("closed before open".to_string()),
            Phase::Active(_) => {
                warn!("transport closed before a terminal message");
                self.retire_transport();
                self.set_phase(Phase::Terminated(Termination::Abnormal));
            }
            Phase::Idle | Phase::Terminated(_) => {}
        }
    }

    fn fail_connect(&mut self, reason: String) {
        self.retire_transport();
        self.set_phase(Phase::Idle);
        self.events.push(SessionEvent::ConnectFailed { reason });
    }

    fn on_message(&mut self, text: &str) {
        if !self.phase.is_active() {
            debug!(phase = %self.phase, "ignoring message outside active session");
            return;
        }
        let Some(msg) = ServerMsg::decode(text) else {
            debug!("dropping unrecognized payload");
            return;
        };
        match msg.classify() {
            Ok(Inbound::Snapshot(snapshot)) => self.apply_snapshot(snapshot),
            Ok(Inbound::Terminal { outcome, snapshot }) => self.finish(outcome, snapshot),
            Err(e) => warn!("dropping payload: {e}"),
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot.lasers_passed > self.state.lasers_seen {
            self.state.lasers_seen = snapshot.lasers_passed;
            self.events.push(SessionEvent::ScoringEvent {
                total: snapshot.lasers_passed,
            });
        }
        self.set_phase(Phase::Active(RunState::from_paused(snapshot.paused)));
        self.state.last_snapshot = Some(snapshot);
    }

    fn finish(&mut self, outcome: Outcome, snapshot: Snapshot) {
        if self.state.terminal_recorded {
            debug!("duplicate terminal message ignored");
            return;
        }
        self.state.terminal_recorded = true;

        let score = snapshot.score;
        let recorded = score > 0 && self.record_score(score, outcome);
        info!(%outcome, score, recorded, "race finished");

        self.state.final_result = Some(FinalResult {
            outcome,
            score,
            snapshot: snapshot.clone(),
        });
        self.state.last_snapshot = Some(snapshot);
        self.events.push(SessionEvent::Finished {
            outcome,
            score,
            recorded,
        });

        self.retire_transport();
        self.set_phase(Phase::Terminated(Termination::Finished(outcome)));
    }

    fn record_score(&mut self, score: i64, outcome: Outcome) -> bool {
        let player = self
            .config
            .as_ref()
            .map(|c| c.player_name.as_str())
            .unwrap_or_default();
        match self.ledger.record(score, outcome.is_won(), player) {
            Ok(_) => true,
            Err(e) => {
                warn!("failed to persist score: {e}");
                false
            }
        }
    }

    // ─── Player commands ────────────────────────────

    /// Encode a key press and send it if the phase allows.
    /// Returns whether a command went out.
    pub fn handle_input(&mut self, key: &str) -> bool {
        match command::encode(key, self.phase) {
            Some(cmd) => self.transmit(cmd),
            None => false,
        }
    }

    /// Send a player command if the phase allows.
    pub fn send_command(&mut self, cmd: Command) -> bool {
        command::permits(self.phase, &cmd) && self.transmit(cmd)
    }

    /// Ask the server to pause. The phase only changes once a snapshot
    /// reports `paused`.
    pub fn pause(&mut self) -> bool {
        self.phase.is_running() && self.transmit(Command::Pause)
    }

    /// Ask the server to resume.
    pub fn resume(&mut self) -> bool {
        self.phase == Phase::Active(RunState::Paused) && self.transmit(Command::Pause)
    }

    fn transmit(&mut self, cmd: Command) -> bool {
        let Some(live) = self.transport.as_mut() else {
            return false;
        };
        let text = match cmd.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("could not encode {cmd:?}: {e}");
                return false;
            }
        };
        match live.handle.send(text) {
            Ok(()) => {
                debug!(transport = %live.id, ?cmd, "sent");
                true
            }
            Err(e) => {
                warn!(transport = %live.id, "send failed: {e}");
                self.events.push(SessionEvent::TransportError {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    // ─── Observers ──────────────────────────────────

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        if from != to {
            info!(%from, %to, "session phase");
            self.phase = to;
            self.events.push(SessionEvent::PhaseChanged { from, to });
        }
    }

    /// Take all pending notifications.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Configuration of the current (or last) session.
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Id of the live transport, if any.
    pub fn transport_id(&self) -> Option<TransportId> {
        self.transport.as_ref().map(|t| t.id)
    }

    /// Last snapshot received (the terminal one once finished).
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.state.last_snapshot.as_ref()
    }

    pub fn final_result(&self) -> Option<&FinalResult> {
        self.state.final_result.as_ref()
    }

    /// Highest scoring-event counter seen this session.
    pub fn lasers_seen(&self) -> u64 {
        self.state.lasers_seen
    }

    /// Lane probabilities of the last snapshot, `(1, 0)` before any state.
    pub fn probabilities(&self) -> UniverseProbabilities {
        project(self.snapshot().and_then(Snapshot::state).as_ref())
    }

    pub fn progress_percent(&self) -> f64 {
        self.snapshot().map_or(0.0, Snapshot::progress_percent)
    }

    pub fn ledger(&self) -> &ScoreLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ScoreLedger<S> {
        &mut self.ledger
    }
}
