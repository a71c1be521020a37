//! Accept loop and the single task that owns all tournament state.
//!
//! Every participant task funnels its decoded frames into one unbounded
//! channel; the loop below is the only place the [`Authority`] is touched,
//! so confirmation order is total without any locking.

use std::collections::HashMap;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use shiai_shared::actions::Action;
use shiai_shared::protocol::Message;
use shiai_shared::store::tournament::TournamentStore;

use crate::authority::{Authority, Directive, ParticipantId};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::participant::{self, Inbound};

/// Requests from the hub process itself (its own UI or scripting layer).
#[derive(Debug)]
pub enum ServerCommand {
    Dispatch(Action),
    Shutdown,
}

struct ParticipantEntry {
    sender: mpsc::Sender<Message>,
    /// False between the sync payload going out and the sync-ack coming
    /// back. Broadcasts are parked in `backlog` meanwhile so the
    /// participant sees every confirmation after its snapshot, in order.
    live: bool,
    backlog: Vec<Message>,
}

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    authority: Authority,
}

impl Server {
    pub async fn bind(config: ServerConfig, store: TournamentStore) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        log::info!("listening on {}", listener.local_addr()?);
        let authority = Authority::new(store, config.retention);
        Ok(Self {
            listener,
            config,
            authority,
        })
    }

    /// The actual bound address, which differs from the configured one when
    /// binding to port zero.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<ServerCommand>,
    ) -> Result<(), ServerError> {
        let Server {
            listener,
            config,
            mut authority,
        } = self;
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let mut participants: HashMap<ParticipantId, ParticipantEntry> = HashMap::new();
        let mut next_participant: ParticipantId = 0;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, addr) = accepted?;
                    next_participant += 1;
                    let id = next_participant;
                    log::info!("participant {} connected from {}", id, addr);
                    tokio::spawn(participant::run(
                        id,
                        stream,
                        inbound_tx.clone(),
                        config.queue_capacity,
                    ));
                }
                Some(inbound) = inbound_rx.recv() => {
                    handle_inbound(&mut authority, &mut participants, inbound);
                }
                command = commands.recv() => {
                    match command {
                        Some(ServerCommand::Dispatch(action)) => {
                            match authority.dispatch_local(action) {
                                Ok((id, directives)) => {
                                    log::debug!("local action {} confirmed", id);
                                    apply_directives(&mut participants, directives);
                                }
                                Err(err) => log::warn!("local action rejected: {}", err),
                            }
                        }
                        Some(ServerCommand::Shutdown) | None => {
                            log::info!("shutting down");
                            apply_directives(
                                &mut participants,
                                vec![Directive::Broadcast(Message::Quit)],
                            );
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

pub async fn run(
    config: ServerConfig,
    store: TournamentStore,
    commands: mpsc::UnboundedReceiver<ServerCommand>,
) -> Result<(), ServerError> {
    Server::bind(config, store).await?.run(commands).await
}

fn handle_inbound(
    authority: &mut Authority,
    participants: &mut HashMap<ParticipantId, ParticipantEntry>,
    inbound: Inbound,
) {
    match inbound {
        Inbound::Joined { id, sender } => {
            let payload = authority.sync_payload();
            let mut entry = ParticipantEntry {
                sender,
                live: false,
                backlog: Vec::new(),
            };
            if push(&mut entry, Message::Sync(Box::new(payload))) {
                participants.insert(id, entry);
                log::info!("participant {} syncing", id);
            } else {
                log::warn!("participant {} dropped before sync", id);
            }
        }
        Inbound::Ready { id } => {
            let drained = match participants.get_mut(&id) {
                Some(entry) if entry.live => {
                    log::warn!("participant {} acked sync while live", id);
                    return;
                }
                Some(entry) => {
                    entry.live = true;
                    let backlog = std::mem::take(&mut entry.backlog);
                    backlog.into_iter().all(|message| push(entry, message))
                }
                None => return,
            };
            if drained {
                log::info!("participant {} live", id);
            } else {
                participants.remove(&id);
                log::warn!("participant {} dropped draining backlog", id);
            }
        }
        Inbound::Action {
            id,
            action_id,
            action,
        } => {
            if !is_live(participants, id) {
                log::warn!("ignoring action {} from syncing participant {}", action_id, id);
                return;
            }
            let directives = authority.receive_action(id, action_id, action);
            apply_directives(participants, directives);
        }
        Inbound::Undo { id, action_id } => {
            if !is_live(participants, id) {
                log::warn!("ignoring undo {} from syncing participant {}", action_id, id);
                return;
            }
            let directives = authority.receive_undo(id, action_id);
            apply_directives(participants, directives);
        }
        Inbound::Disconnected { id } => {
            if participants.remove(&id).is_some() {
                log::info!("participant {} disconnected", id);
            }
        }
    }
}

fn is_live(participants: &HashMap<ParticipantId, ParticipantEntry>, id: ParticipantId) -> bool {
    participants.get(&id).is_some_and(|entry| entry.live)
}

fn apply_directives(
    participants: &mut HashMap<ParticipantId, ParticipantEntry>,
    directives: Vec<Directive>,
) {
    for directive in directives {
        match directive {
            Directive::Broadcast(message) => {
                let mut dropped = Vec::new();
                for (&id, entry) in participants.iter_mut() {
                    if entry.live {
                        if !push(entry, message.clone()) {
                            dropped.push(id);
                        }
                    } else {
                        entry.backlog.push(message.clone());
                    }
                }
                for id in dropped {
                    participants.remove(&id);
                    log::warn!("participant {} dropped: outbound queue full", id);
                }
            }
            Directive::Send(id, message) => {
                let Some(entry) = participants.get_mut(&id) else {
                    continue;
                };
                // A forced resync restarts the participant's sync phase:
                // everything confirmed from here on reaches it through the
                // backlog, after the fresh payload.
                if matches!(message, Message::Sync(_)) {
                    entry.live = false;
                    entry.backlog.clear();
                }
                if !push(entry, message) {
                    participants.remove(&id);
                    log::warn!("participant {} dropped: outbound queue full", id);
                }
            }
        }
    }
}

/// Queues a frame; a full or closed queue means the participant is beyond
/// saving and the caller should forget it.
fn push(entry: &mut ParticipantEntry, message: Message) -> bool {
    match entry.sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
    }
}
