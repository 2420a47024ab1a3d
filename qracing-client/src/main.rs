// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Q-Racing headless client
//!
//! Connects to a Q-Racing simulation over WebSocket and drives one session
//! from stdin:
//! - a key name (`h`, `ArrowLeft`, `d`, `m`, `Escape`, `1`..`3`) is sent as a
//!   player command
//! - `start`, `restart`, `menu`, `scores`, `clear`, `quit` control the session
//!
//! Configuration comes from `QRACING_*` environment variables, logging
//! from `RUST_LOG`.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use qracing_client::{
    ClientConfig, FileStore, SessionEvent, SessionManager, TransportEvent, WsConnector,
};

type Session = SessionManager<WsConnector, FileStore>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    let store = FileStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TransportEvent>();
    let connector = WsConnector::new(config.server_url.clone(), event_tx);
    let mut session = Session::new(connector, store);
    info!(
        client_id = session.client_id(),
        server = %config.server_url,
        "Q-Racing client ready, type 'start' to race, 'quit' to exit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => session.handle_event(event),
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if !handle_line(&mut session, &config, line.trim()) {
                    break;
                }
            }
        }
        report(&mut session);
    }

    session.back_to_menu();
    Ok(())
}

/// Apply one stdin line. Returns `false` to quit.
fn handle_line(session: &mut Session, config: &ClientConfig, line: &str) -> bool {
    match line {
        "" => {}
        "quit" | "exit" => return false,
        "start" => {
            if let Err(e) = session.start(config.session_config()) {
                warn!("{e}");
            }
        }
        "restart" => {
            if let Err(e) = session.restart() {
                warn!("{e}");
            }
        }
        "menu" => session.back_to_menu(),
        "scores" => {
            let scores = session.ledger().load();
            if scores.is_empty() {
                info!("no scores yet");
            }
            for (rank, record) in scores.iter().enumerate() {
                info!(
                    "{:>2}. {:>6} {:<4} {}",
                    rank + 1,
                    record.score,
                    record.outcome,
                    record.player_name
                );
            }
        }
        "clear" => {
            if let Err(e) = session.ledger_mut().clear() {
                warn!("{e}");
            }
        }
        key => {
            if !session.handle_input(key) {
                debug!(key, phase = %session.phase(), "input ignored");
            }
        }
    }
    true
}

/// Log pending session notifications and the latest snapshot.
fn report(session: &mut Session) {
    for event in session.drain_events() {
        match event {
            SessionEvent::PhaseChanged { to, .. } => info!("session {to}"),
            SessionEvent::ScoringEvent { total } => info!(total, "laser passed"),
            SessionEvent::Finished {
                outcome,
                score,
                recorded,
            } => {
                info!(%outcome, score, recorded, "final score");
                if let Some(stats) = session
                    .final_result()
                    .and_then(|r| r.snapshot.vehicle.as_ref())
                {
                    info!(
                        hadamard_uses = stats.hadamard_uses,
                        successful_measures = stats.successful_measures,
                        seconds = stats.seconds_survived(),
                        "run stats"
                    );
                }
            }
            SessionEvent::ConnectFailed { reason } => {
                warn!("could not reach simulation: {reason}");
            }
            SessionEvent::TransportError { message } => debug!("transport: {message}"),
        }
    }

    if let Some(snapshot) = session.snapshot() {
        let p = session.probabilities();
        debug!(
            score = snapshot.score,
            progress = %format!("{:.1}%", session.progress_percent()),
            a = %format!("{:.2}/{:.2}", p.a.lane0, p.a.lane1),
            b = %format!("{:.2}/{:.2}", p.b.lane0, p.b.lane1),
            "state"
        );
    }
}
