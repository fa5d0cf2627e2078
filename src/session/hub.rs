// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Broadcast groups.
//!
//! Every connected client owns an outbound channel. Clients join one group
//! per project they follow; mutations are fanned out to a project's group,
//! optionally skipping the client that caused them. Clients whose receiver
//! has gone away are dropped on the next send.

use crate::models::color::Color;
use crate::models::element::{Element, TransformPatch};
use crate::models::project::{FabricPattern, Project};
use crate::util::geometry::UvRect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use uuid::Uuid;

/// Identifies one connected client.
pub type ClientId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignAction {
    Add,
    Remove,
}

/// Events pushed to clients, as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// First message on a connection; the id goes in `X-Client-Id` on HTTP
    /// mutations so the client is not sent its own changes back.
    #[serde(rename = "client:connected", rename_all = "camelCase")]
    Connected { client_id: ClientId },
    /// Full snapshot, sent on join.
    #[serde(rename = "project:state")]
    ProjectState(Project),
    #[serde(rename = "project:created", rename_all = "camelCase")]
    ProjectCreated { project_id: Uuid, project: Project },
    #[serde(rename = "design:update", rename_all = "camelCase")]
    DesignUpdate { project_id: Uuid, element: Element, action: DesignAction },
    #[serde(rename = "color:changed", rename_all = "camelCase")]
    ColorChanged { project_id: Uuid, color: Color },
    #[serde(rename = "pattern:changed", rename_all = "camelCase")]
    PatternChanged { project_id: Uuid, pattern: Option<FabricPattern> },
    #[serde(rename = "render:complete", rename_all = "camelCase")]
    RenderComplete { project_id: Uuid, texture_url: String, width: u32, height: u32 },
    /// The stored values of the patched fields, plus what the server
    /// derived from them.
    #[serde(rename = "element:transformed", rename_all = "camelCase")]
    ElementTransformed {
        project_id: Uuid,
        element_id: Uuid,
        transform: TransformPatch,
        uv: UvRect,
        warnings: Vec<String>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "client:connected",
            ServerEvent::ProjectState(_) => "project:state",
            ServerEvent::ProjectCreated { .. } => "project:created",
            ServerEvent::DesignUpdate { .. } => "design:update",
            ServerEvent::ColorChanged { .. } => "color:changed",
            ServerEvent::PatternChanged { .. } => "pattern:changed",
            ServerEvent::RenderComplete { .. } => "render:complete",
            ServerEvent::ElementTransformed { .. } => "element:transformed",
            ServerEvent::Error { .. } => "error",
        }
    }
}

#[derive(Default)]
struct HubState {
    next_id: ClientId,
    clients: HashMap<ClientId, Sender<ServerEvent>>,
    groups: HashMap<Uuid, BTreeSet<ClientId>>,
}

impl HubState {
    fn send(&mut self, client: ClientId, event: ServerEvent) -> bool {
        let delivered = self.clients.get(&client).is_some_and(|tx| tx.send(event).is_ok());
        if !delivered {
            self.drop_client(client);
        }
        delivered
    }

    fn drop_client(&mut self, client: ClientId) {
        if self.clients.remove(&client).is_some() {
            log::debug!("Client {} disconnected", client);
        }
        self.groups.retain(|_, members| {
            members.remove(&client);
            !members.is_empty()
        });
    }
}

/// Registry of connected clients and their project groups.
#[derive(Default)]
pub struct Hub {
    state: Mutex<HubState>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut HubState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Register a client; events for it arrive on the returned receiver.
    pub fn connect(&self) -> (ClientId, Receiver<ServerEvent>) {
        let (tx, rx) = channel();
        let id = self.with_state(|state| {
            state.next_id += 1;
            state.clients.insert(state.next_id, tx);
            state.next_id
        });
        log::debug!("Client {} connected", id);
        (id, rx)
    }

    pub fn disconnect(&self, client: ClientId) {
        self.with_state(|state| state.drop_client(client));
    }

    /// Add a client to a project's group. Returns false for unknown clients.
    pub fn join(&self, client: ClientId, project: Uuid) -> bool {
        self.with_state(|state| {
            if !state.clients.contains_key(&client) {
                return false;
            }
            state.groups.entry(project).or_default().insert(client);
            true
        })
    }

    pub fn leave(&self, client: ClientId, project: Uuid) {
        self.with_state(|state| {
            if let Some(members) = state.groups.get_mut(&project) {
                members.remove(&client);
                if members.is_empty() {
                    state.groups.remove(&project);
                }
            }
        });
    }

    pub fn send_to(&self, client: ClientId, event: ServerEvent) -> bool {
        self.with_state(|state| state.send(client, event))
    }

    /// Send to every member of `project`'s group except `exclude`. Returns
    /// the number of clients reached.
    pub fn broadcast(&self, project: Uuid, event: ServerEvent, exclude: Option<ClientId>) -> usize {
        self.with_state(|state| {
            let members: Vec<ClientId> = state
                .groups
                .get(&project)
                .map(|m| m.iter().copied().filter(|c| Some(*c) != exclude).collect())
                .unwrap_or_default();
            let reached = members.into_iter().filter(|c| state.send(*c, event.clone())).count();
            log::debug!("Broadcast {} for {} to {} clients", event.name(), project, reached);
            reached
        })
    }

    /// Send to every connected client regardless of group.
    pub fn broadcast_all(&self, event: ServerEvent) -> usize {
        self.with_state(|state| {
            let clients: Vec<ClientId> = state.clients.keys().copied().collect();
            clients.into_iter().filter(|c| state.send(*c, event.clone())).count()
        })
    }

    pub fn subscribers(&self, project: Uuid) -> usize {
        self.with_state(|state| state.groups.get(&project).map_or(0, BTreeSet::len))
    }
}
