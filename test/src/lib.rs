//! In-memory harness wiring several store managers to one authority.
//!
//! Replicas talk to the authority directly; confirmations and acks land in
//! per-replica inboxes that tests drain in whatever order the scenario
//! calls for. Per-replica delivery order is FIFO, mirroring the in-order
//! guarantee of a real connection, while cross-replica interleaving is
//! fully under test control.

use std::collections::VecDeque;

use shiai_server::{Authority, Directive, ParticipantId};
use shiai_shared::actions::Action;
use shiai_shared::id::{ClientActionId, IdGenerator, TournamentId};
use shiai_shared::protocol::Message;
use shiai_shared::store::tournament::TournamentStore;
use shiai_shared::store_manager::{StoreManager, StoreManagerError};

pub fn empty_tournament() -> TournamentStore {
    TournamentStore::new(TournamentId::new(1), "spring cup".into())
}

struct Replica {
    manager: StoreManager,
    inbox: VecDeque<Message>,
}

pub struct Cluster {
    pub authority: Authority,
    replicas: Vec<Replica>,
}

impl Cluster {
    pub fn new(replica_count: usize, retention: usize) -> Self {
        let store = empty_tournament();
        let authority =
            Authority::with_generator(store.clone(), retention, IdGenerator::from_seed(1000));
        let replicas = (0..replica_count)
            .map(|index| Replica {
                manager: StoreManager::with_seed(store.clone(), 1 + index as u64),
                inbox: VecDeque::new(),
            })
            .collect();
        Self {
            authority,
            replicas,
        }
    }

    fn participant(index: usize) -> ParticipantId {
        index as ParticipantId + 1
    }

    pub fn manager(&self, index: usize) -> &StoreManager {
        &self.replicas[index].manager
    }

    /// Mutable access for constructing actions against a replica's view.
    pub fn manager_mut(&mut self, index: usize) -> &mut StoreManager {
        &mut self.replicas[index].manager
    }

    /// Applies an action optimistically on one replica and hands it to
    /// the authority. Confirmations queue up in every inbox; nothing is
    /// delivered until the test asks.
    pub fn dispatch(&mut self, index: usize, action: Action) -> Result<(), StoreManagerError> {
        let (id, transmit) = self.replicas[index].manager.dispatch(action)?;
        let directives = self
            .authority
            .receive_action(Self::participant(index), id, transmit);
        self.route(directives);
        Ok(())
    }

    pub fn undo(&mut self, index: usize) -> Result<(), StoreManagerError> {
        if let Some(id) = self.replicas[index].manager.undo()? {
            let directives = self.authority.receive_undo(Self::participant(index), id);
            self.route(directives);
        }
        Ok(())
    }

    pub fn redo(&mut self, index: usize) -> Result<(), StoreManagerError> {
        if let Some((id, transmit)) = self.replicas[index].manager.redo()? {
            let directives = self
                .authority
                .receive_action(Self::participant(index), id, transmit);
            self.route(directives);
        }
        Ok(())
    }

    /// Feeds the authority an action that bypassed replica-side validation,
    /// as a delayed retransmission or a faulty client would.
    pub fn inject_action(&mut self, index: usize, id: ClientActionId, action: Action) {
        let directives = self
            .authority
            .receive_action(Self::participant(index), id, action);
        self.route(directives);
    }

    fn route(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Broadcast(message) => {
                    for replica in &mut self.replicas {
                        replica.inbox.push_back(message.clone());
                    }
                }
                Directive::Send(participant, message) => {
                    let index = participant as usize - 1;
                    self.replicas[index].inbox.push_back(message);
                }
            }
        }
    }

    /// Delivers one queued message to a replica. Returns false when its
    /// inbox is empty. Panics on desynchronization, which a correct
    /// delivery schedule never produces.
    pub fn deliver_next(&mut self, index: usize) -> bool {
        let Some(message) = self.replicas[index].inbox.pop_front() else {
            return false;
        };
        let manager = &mut self.replicas[index].manager;
        let retransmit = match message {
            Message::Action { id, action } => {
                manager
                    .receive_confirmed_action(id, action)
                    .unwrap_or_else(|err| panic!("replica {index}: {err}"));
                Vec::new()
            }
            Message::ActionAck { id } => {
                manager
                    .receive_action_ack(id)
                    .unwrap_or_else(|err| panic!("replica {index}: {err}"));
                Vec::new()
            }
            Message::Undo { id } => {
                manager
                    .receive_confirmed_undo(id)
                    .unwrap_or_else(|err| panic!("replica {index}: {err}"));
                Vec::new()
            }
            Message::UndoAck { id } => {
                manager.receive_undo_ack(id);
                Vec::new()
            }
            Message::Sync(payload) => manager
                .sync(payload.tournament, payload.confirmed)
                .unwrap_or_else(|err| panic!("replica {index}: {err}")),
            other => panic!("replica {index} received {}", other.label()),
        };
        for (id, action) in retransmit {
            let directives = self
                .authority
                .receive_action(Self::participant(index), id, action);
            self.route(directives);
        }
        true
    }

    /// Drains every inbox, including messages queued by the draining
    /// itself (forced syncs, retransmissions).
    pub fn settle(&mut self) {
        loop {
            let mut progressed = false;
            for index in 0..self.replicas.len() {
                while self.deliver_next(index) {
                    progressed = true;
                }
            }
            if !progressed {
                return;
            }
        }
    }

    /// Every replica's store must equal the authority's once all traffic
    /// has been delivered.
    pub fn assert_converged(&self) {
        let reference = self.authority.current();
        for (index, replica) in self.replicas.iter().enumerate() {
            assert_eq!(
                replica.manager.unconfirmed_len(),
                0,
                "replica {index} still has unconfirmed actions"
            );
            assert_eq!(
                replica.manager.store(),
                reference,
                "replica {index} diverged from the authority"
            );
        }
    }
}

/// Action constructors against a replica's current view.
pub mod fixtures {
    use shiai_shared::actions::{AddCategory, AddPlayers, AddPlayersToCategory};
    use shiai_shared::id::{CategoryId, PlayerId};
    use shiai_shared::store::player::PlayerFields;
    use shiai_shared::store_manager::StoreManager;

    pub fn player_fields(first: &str, last: &str) -> PlayerFields {
        PlayerFields {
            first_name: first.into(),
            last_name: last.into(),
            ..PlayerFields::default()
        }
    }

    pub fn add_players(manager: &mut StoreManager, names: &[(&str, &str)]) -> AddPlayers {
        let fields = names
            .iter()
            .map(|(first, last)| player_fields(first, last))
            .collect();
        let (store, generator) = manager.store_and_generator_mut();
        AddPlayers::new(store, generator, fields)
    }

    pub fn add_category(manager: &mut StoreManager, name: &str) -> AddCategory {
        let (store, generator) = manager.store_and_generator_mut();
        AddCategory::new(store, generator, name.into())
    }

    pub fn attach_players(
        category: CategoryId,
        players: Vec<PlayerId>,
        seed: u64,
    ) -> AddPlayersToCategory {
        AddPlayersToCategory::new(category, players, seed)
    }
}
