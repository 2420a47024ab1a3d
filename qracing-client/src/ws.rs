// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each connect spawns one socket task on the current tokio runtime. The
//! task reports open / message / error / close on the shared event channel
//! and drains an outbound queue fed by [`WsTransport`].

use futures::stream::StreamExt;
use futures::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{Connector, TransportEvent, TransportEventKind, TransportHandle, TransportId};

enum Outgoing {
    Text(String),
    Close,
}

/// Opens `{base_url}/ws/{client_id}` sockets.
pub struct WsConnector {
    base_url: String,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            base_url: base_url.into(),
            events,
        }
    }

    pub fn endpoint(&self, client_id: &str) -> String {
        format!("{}/ws/{}", self.base_url.trim_end_matches('/'), client_id)
    }
}

impl Connector for WsConnector {
    type Handle = WsTransport;

    fn connect(&mut self, id: TransportId, client_id: &str) -> Result<WsTransport, TransportError> {
        let url = self.endpoint(client_id);
        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(format!("{url}: {e}")))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        debug!(transport = %id, %url, "opening websocket");
        runtime.spawn(run_socket(id, request, outgoing_rx, self.events.clone()));

        Ok(WsTransport {
            outgoing: outgoing_tx,
        })
    }
}

/// Outbound queue of one socket task.
pub struct WsTransport {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl TransportHandle for WsTransport {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_socket(
    id: TransportId,
    request: Request,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let emit = |kind| {
        let _ = events.send(TransportEvent::new(id, kind));
    };

    let socket = match tokio_tungstenite::connect_async(request).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            emit(TransportEventKind::Error(e.to_string()));
            emit(TransportEventKind::Closed);
            return;
        }
    };
    emit(TransportEventKind::Open);

    let (mut sink, mut source) = socket.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEventKind::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEventKind::Error(e.to_string()));
                    break;
                }
            },
            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        emit(TransportEventKind::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    debug!(transport = %id, "websocket closed");
    emit(TransportEventKind::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let connector = WsConnector::new("ws://localhost:8000/", tx);
        assert_eq!(connector.endpoint("k3x9"), "ws://localhost:8000/ws/k3x9");
    }

    #[test]
    fn test_connect_outside_runtime_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut connector = WsConnector::new("ws://localhost:8000", tx);
        assert!(matches!(
            connector.connect(TransportId(1), "abc"),
            Err(TransportError::Connect(_))
        ));
    }

    #[test]
    fn test_bad_url_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut connector = WsConnector::new("not a url", tx);
        assert!(connector.connect(TransportId(1), "abc").is_err());
    }
}
