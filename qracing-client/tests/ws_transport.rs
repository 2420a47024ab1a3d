// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! End-to-end: the real WebSocket connector against a scripted axum server.
//!
//! Run with: `cargo test -p qracing-client --test ws_transport`

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, WebSocketUpgrade};
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;

use qracing_client::{
    Command, MemoryStore, Outcome, Phase, ServerMsg, SessionConfig, SessionEvent, SessionManager,
    Snapshot, Speed, Termination, TransportEvent, WsConnector,
};

type Session = SessionManager<WsConnector, MemoryStore>;

fn frame(msg: ServerMsg) -> String {
    serde_json::to_string(&msg).unwrap()
}

fn snapshot(lasers: u64, score: i64) -> Snapshot {
    Snapshot {
        lasers_passed: lasers,
        score,
        distance_to_finish: 10_000.0 - 2_000.0 * lasers as f64,
        ..Snapshot::default()
    }
}

/// Waits for `start`, streams three snapshots and a doubled win, then
/// idles until the client closes.
async fn scripted_race(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            if let Ok(Command::Start { .. }) = serde_json::from_str::<Command>(text.as_str()) {
                break;
            }
        }
    }

    let won = Snapshot {
        running: false,
        distance_to_finish: 0.0,
        ..snapshot(2, 900)
    };
    let frames = [
        frame(ServerMsg::GameState(snapshot(0, 0))),
        frame(ServerMsg::GameState(snapshot(1, 300))),
        frame(ServerMsg::GameState(snapshot(2, 600))),
        frame(ServerMsg::GameWon(won.clone())),
        frame(ServerMsg::GameWon(won)),
    ];
    for text in frames {
        if socket.send(Message::Text(text.into())).await.is_err() {
            return;
        }
    }

    while let Some(Ok(msg)) = socket.recv().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }
}

async fn serve() -> String {
    let app = Router::new().route(
        "/ws/{client_id}",
        get(|ws: WebSocketUpgrade, Path(_client_id): Path<String>| async move {
            ws.on_upgrade(scripted_race)
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}")
}

async fn drive_until(
    session: &mut Session,
    events: &mut mpsc::UnboundedReceiver<TransportEvent>,
    done: impl Fn(Phase) -> bool,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for transport")
            .expect("event channel closed");
        session.handle_event(event);
        seen.extend(session.drain_events());
        if done(session.phase()) {
            return seen;
        }
    }
}

#[tokio::test]
async fn race_over_websocket_records_once() {
    let url = serve().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = Session::new(WsConnector::new(url, tx), MemoryStore::new());

    session
        .start(SessionConfig {
            player_name: "grace".into(),
            speed: Speed::Slow,
        })
        .unwrap();
    let events = drive_until(&mut session, &mut rx, |p| matches!(p, Phase::Terminated(_))).await;

    let totals: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::ScoringEvent { total } => Some(*total),
            _ => None,
        })
        .collect();
    assert_eq!(totals, vec![1, 2]);
    assert_eq!(
        session.phase(),
        Phase::Terminated(Termination::Finished(Outcome::Won))
    );

    // Whatever the retired socket still delivers changes nothing.
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await {
        session.handle_event(event);
    }
    assert!(session.drain_events().is_empty());

    let scores = session.ledger().load();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, 900);
    assert_eq!(scores[0].player_name, "grace");
}

#[tokio::test]
async fn unreachable_server_reports_connect_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = Session::new(WsConnector::new(format!("ws://{addr}"), tx), MemoryStore::new());
    session.start(SessionConfig::default()).unwrap();
    assert_eq!(session.phase(), Phase::Connecting);

    let events = drive_until(&mut session, &mut rx, |p| p == Phase::Idle).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::ConnectFailed { .. })));
    assert!(!session.handle_input("h"));
}
