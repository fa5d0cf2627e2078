// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! WebSocket channel for live collaboration.
//!
//! Messages in both directions are JSON objects of the form
//! `{"event": "<name>", "data": ...}`. The first message on a connection is
//! `client:connected` with the id to quote in `X-Client-Id` on HTTP
//! mutations. Each connection gets its own thread,
//! which alternates between reading client messages and forwarding the
//! events the hub has queued for it.

use crate::error::{CustomizerError, Result};
use crate::models::element::TransformPatch;
use crate::session::hub::{ClientId, ServerEvent};
use crate::session::Session;
use serde::Deserialize;
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tungstenite::{accept, Message, WebSocket};
use uuid::Uuid;

/// How long a read may block before queued events are flushed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join:project")]
    JoinProject(Uuid),
    #[serde(rename = "leave:project")]
    LeaveProject(Uuid),
    /// A live drag or resize; applied and relayed to the other subscribers.
    #[serde(rename = "design:transform", rename_all = "camelCase")]
    DesignTransform { project_id: Uuid, element_id: Uuid, transform: TransformPatch },
}

pub fn parse_client_event(text: &str) -> Result<ClientEvent> {
    serde_json::from_str(text).map_err(|e| CustomizerError::InvalidRequest(format!("bad event: {}", e)))
}

/// Apply one client event.
pub fn handle_event(session: &Session, client: ClientId, event: ClientEvent) -> Result<()> {
    match event {
        ClientEvent::JoinProject(project_id) => {
            session.join(client, project_id)?;
        }
        ClientEvent::LeaveProject(project_id) => session.hub().leave(client, project_id),
        ClientEvent::DesignTransform { project_id, element_id, transform } => {
            session.transform_element(project_id, element_id, &transform, Some(client))?;
        }
    }
    Ok(())
}

/// Parse and apply a text message, reporting failures back to the sender.
fn dispatch(session: &Session, client: ClientId, text: &str) {
    if let Err(e) = parse_client_event(text).and_then(|event| handle_event(session, client, event)) {
        log::debug!("Client {} event failed: {}", client, e);
        session.hub().send_to(client, ServerEvent::Error { message: e.to_string() });
    }
}

/// Register a new connection and queue its `client:connected` greeting.
fn open_client(session: &Session) -> (ClientId, Receiver<ServerEvent>) {
    let (client, events) = session.hub().connect();
    session.hub().send_to(client, ServerEvent::Connected { client_id: client });
    (client, events)
}

fn forward(socket: &mut WebSocket<TcpStream>, events: &Receiver<ServerEvent>) -> tungstenite::Result<()> {
    for event in events.try_iter() {
        match serde_json::to_string(&event) {
            Ok(json) => socket.write(Message::Text(json))?,
            Err(e) => log::error!("Failed to encode {} event: {}", event.name(), e),
        }
    }
    socket.flush()
}

fn serve_client(session: Arc<Session>, stream: TcpStream) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "unknown".to_string());
    let mut socket = match accept(stream) {
        Ok(socket) => socket,
        Err(e) => {
            log::warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };
    if let Err(e) = socket.get_ref().set_read_timeout(Some(POLL_INTERVAL)) {
        log::warn!("Failed to set read timeout for {}: {}", peer, e);
        return;
    }

    let (client, events) = open_client(&session);
    log::info!("Client {} connected from {}", client, peer);

    loop {
        match socket.read() {
            Ok(Message::Text(text)) => dispatch(&session, client, &text),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => break,
            Err(e) => {
                log::warn!("Client {} read failed: {}", client, e);
                break;
            }
        }
        if let Err(e) = forward(&mut socket, &events) {
            log::debug!("Client {} write failed: {}", client, e);
            break;
        }
    }

    session.hub().disconnect(client);
    log::info!("Client {} disconnected", client);
}

/// Bind the real-time channel and accept connections on a background thread.
pub fn spawn(session: Arc<Session>, bind: &str) -> Result<JoinHandle<()>> {
    let listener = TcpListener::bind(bind)?;
    log::info!("Real-time channel listening on {}", bind);

    Ok(std::thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let session = Arc::clone(&session);
                    std::thread::spawn(move || serve_client(session, stream));
                }
                Err(e) => log::warn!("Failed to accept connection: {}", e),
            }
        }
    }))
}
