use thiserror::Error;

use shiai_shared::actions::Action;
use shiai_shared::id::ClientActionId;
use shiai_shared::protocol::clock;
use shiai_shared::protocol::message::Message;
use shiai_shared::protocol::version::ProtocolVersion;
use shiai_shared::store::tournament::TournamentStore;
use shiai_shared::store_manager::{StoreManager, StoreManagerError};

/// Connection lifecycle. Transitions only move forward; any protocol
/// violation jumps straight to `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Syncing,
    Live,
    Closed,
}

/// Notifications for the embedding layer (the excluded user interface).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ClockSynchronized { offset_ms: i64 },
    /// The store was replaced wholesale by a sync; all cached references
    /// into it are stale.
    StoreReset,
    ActionConfirmed(ClientActionId),
    UndoConfirmed(ClientActionId),
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unexpected {message} message in {state:?} state")]
    UnexpectedMessage {
        state: SessionState,
        message: &'static str,
    },

    #[error("peer protocol version {theirs} is incompatible with {ours}")]
    IncompatibleVersion {
        ours: ProtocolVersion,
        theirs: ProtocolVersion,
    },

    #[error(transparent)]
    StoreManager(#[from] StoreManagerError),

    #[error("session is not live")]
    NotLive,
}

/// Pure session state machine: consumes decoded messages and user commands,
/// produces outbound messages and events. Transport-free so the full
/// protocol flow is testable without sockets.
pub struct Session {
    state: SessionState,
    manager: StoreManager,
    clock_request_sent: Option<i64>,
    clock_offset_ms: Option<i64>,
    outbound: Vec<Message>,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(store: TournamentStore) -> Self {
        Self::with_manager(StoreManager::new(store))
    }

    /// Deterministic construction for tests.
    pub fn with_seed(store: TournamentStore, seed: u64) -> Self {
        Self::with_manager(StoreManager::with_seed(store, seed))
    }

    fn with_manager(manager: StoreManager) -> Self {
        Self {
            state: SessionState::Connecting,
            manager,
            clock_request_sent: None,
            clock_offset_ms: None,
            outbound: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &TournamentStore {
        self.manager.store()
    }

    pub fn manager(&self) -> &StoreManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut StoreManager {
        &mut self.manager
    }

    /// Estimated offset of the authority's clock relative to ours, known
    /// once the handshake completes.
    pub fn clock_offset_ms(&self) -> Option<i64> {
        self.clock_offset_ms
    }

    pub fn take_outbound(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbound)
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// The transport established the connection; open with our handshake.
    pub fn on_connected(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Handshaking;
            self.outbound
                .push(Message::Handshake(ProtocolVersion::current()));
        }
    }

    /// Consumes one decoded message. On error the session is closed and the
    /// transport should tear the connection down.
    pub fn handle_message(&mut self, message: Message, now_ms: i64) -> Result<(), SessionError> {
        let result = self.handle(message, now_ms);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn handle(&mut self, message: Message, now_ms: i64) -> Result<(), SessionError> {
        match (self.state, message) {
            (SessionState::Handshaking, Message::Handshake(theirs)) => {
                let ours = ProtocolVersion::current();
                if !ours.compatible_with(&theirs) {
                    return Err(SessionError::IncompatibleVersion { ours, theirs });
                }
                log::debug!("handshake complete, peer version {theirs}");
                self.clock_request_sent = Some(now_ms);
                self.outbound.push(Message::ClockSyncRequest);
                Ok(())
            }
            (SessionState::Handshaking, Message::ClockSync { timestamp_ms }) => {
                let request_sent = self.clock_request_sent.take().ok_or({
                    SessionError::UnexpectedMessage {
                        state: SessionState::Handshaking,
                        message: "clock-sync",
                    }
                })?;
                let offset_ms = clock::estimate_offset(request_sent, now_ms, timestamp_ms);
                log::debug!("clock offset estimated at {offset_ms}ms");
                self.clock_offset_ms = Some(offset_ms);
                self.events
                    .push(SessionEvent::ClockSynchronized { offset_ms });
                self.state = SessionState::Syncing;
                Ok(())
            }
            // A sync in the live state is the authority forcing a resync.
            (SessionState::Syncing | SessionState::Live, Message::Sync(payload)) => {
                let retransmit = self.manager.sync(payload.tournament, payload.confirmed)?;
                self.outbound.push(Message::SyncAck);
                for (id, action) in retransmit {
                    self.outbound.push(Message::Action { id, action });
                }
                self.events.push(SessionEvent::StoreReset);
                self.state = SessionState::Live;
                Ok(())
            }
            (SessionState::Live, Message::Action { id, action }) => {
                self.manager.receive_confirmed_action(id, action)?;
                self.events.push(SessionEvent::ActionConfirmed(id));
                Ok(())
            }
            (SessionState::Live, Message::ActionAck { id }) => {
                self.manager.receive_action_ack(id)?;
                Ok(())
            }
            (SessionState::Live, Message::Undo { id }) => {
                self.manager.receive_confirmed_undo(id)?;
                self.events.push(SessionEvent::UndoConfirmed(id));
                Ok(())
            }
            (SessionState::Live, Message::UndoAck { id }) => {
                self.manager.receive_undo_ack(id);
                Ok(())
            }
            (_, Message::Quit) => {
                log::info!("server closed the session");
                self.close();
                Ok(())
            }
            (state, message) => Err(SessionError::UnexpectedMessage {
                state,
                message: message.label(),
            }),
        }
    }

    /// Applies a local edit optimistically and queues it for transmission.
    pub fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        if self.state != SessionState::Live {
            return Err(SessionError::NotLive);
        }
        let (id, transmit) = self.manager.dispatch(action)?;
        self.outbound.push(Message::Action {
            id,
            action: transmit,
        });
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Live {
            return Err(SessionError::NotLive);
        }
        if let Some(id) = self.manager.undo()? {
            self.outbound.push(Message::Undo { id });
        }
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Live {
            return Err(SessionError::NotLive);
        }
        if let Some((id, transmit)) = self.manager.redo()? {
            self.outbound.push(Message::Action {
                id,
                action: transmit,
            });
        }
        Ok(())
    }

    /// Initiates an orderly shutdown.
    pub fn quit(&mut self) {
        if self.state != SessionState::Closed {
            self.outbound.push(Message::Quit);
            self.close();
        }
    }

    fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            self.events.push(SessionEvent::Closed);
        }
    }
}
