//! The hub's side of the action protocol, free of any socket plumbing.
//!
//! The authority keeps a baseline tournament plus a bounded ring of
//! confirmed actions. Arrivals are validated against a live copy of the
//! store before confirmation; rejected or unretained requests force the
//! offending participant back through a full sync instead of letting it
//! drift.

use std::collections::{HashSet, VecDeque};

use shiai_shared::actions::{Action, ActionError, StoreAction};
use shiai_shared::id::{ActionId, ClientActionId, ClientId, IdGenerator};
use shiai_shared::protocol::{Message, SyncPayload};
use shiai_shared::store::tournament::TournamentStore;

/// Identifies one connected participant for the lifetime of its connection.
pub type ParticipantId = u64;

/// Delivery instruction produced by the authority; the transport layer turns
/// these into queued frames.
#[derive(Debug)]
pub enum Directive {
    Broadcast(Message),
    Send(ParticipantId, Message),
}

pub struct Authority {
    /// State with every action older than the ring already folded in.
    baseline: TournamentStore,
    /// Baseline plus the ring, kept applied for validating arrivals.
    current: TournamentStore,
    /// Confirmed actions still eligible for undo, in confirmation order.
    /// Entries are pristine; they are cloned for every replay.
    ring: VecDeque<(ClientActionId, Action)>,
    ring_ids: HashSet<ClientActionId>,
    retention: usize,
    /// Identity for actions the hub process dispatches itself.
    client_id: ClientId,
    generator: IdGenerator,
}

impl Authority {
    pub fn new(store: TournamentStore, retention: usize) -> Self {
        Self::with_generator(store, retention, IdGenerator::new())
    }

    pub fn with_generator(
        store: TournamentStore,
        retention: usize,
        mut generator: IdGenerator,
    ) -> Self {
        let client_id = generator.sample();
        Self {
            baseline: store.clone(),
            current: store,
            ring: VecDeque::new(),
            ring_ids: HashSet::new(),
            retention,
            client_id,
            generator,
        }
    }

    pub fn current(&self) -> &TournamentStore {
        &self.current
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn confirmed_count(&self) -> usize {
        self.ring.len()
    }

    /// Snapshot handed to a participant entering (or re-entering) sync.
    pub fn sync_payload(&self) -> SyncPayload {
        SyncPayload {
            tournament: self.baseline.clone(),
            confirmed: self.ring.clone().into(),
        }
    }

    fn forced_sync(&self, target: ParticipantId) -> Vec<Directive> {
        vec![Directive::Send(
            target,
            Message::Sync(Box::new(self.sync_payload())),
        )]
    }

    /// Handles an action request from a participant. On acceptance the
    /// action is broadcast to every participant, the sender included, and
    /// the sender additionally receives an ack. On rejection the sender is
    /// forced back through a full sync.
    pub fn receive_action(
        &mut self,
        from: ParticipantId,
        id: ClientActionId,
        action: Action,
    ) -> Vec<Directive> {
        if self.ring_ids.contains(&id) {
            log::warn!("ignoring duplicate action {}", id);
            return Vec::new();
        }
        if let Err(err) = self.confirm(id, action.clone()) {
            log::warn!(
                "rejecting {} ({}): {}; forcing resync",
                action.description(),
                id,
                err
            );
            return self.forced_sync(from);
        }
        vec![
            Directive::Broadcast(Message::Action { id, action }),
            Directive::Send(from, Message::ActionAck { id }),
        ]
    }

    /// Handles an undo request. Targets outside the retained window force
    /// the sender through a full sync rather than being dropped silently.
    pub fn receive_undo(&mut self, from: ParticipantId, id: ClientActionId) -> Vec<Directive> {
        if !self.ring_ids.remove(&id) {
            log::info!("undo target {} outside retained window; forcing resync", id);
            return self.forced_sync(from);
        }
        self.ring.retain(|(entry_id, _)| *entry_id != id);
        self.rebuild_current();
        vec![
            Directive::Broadcast(Message::Undo { id }),
            Directive::Send(from, Message::UndoAck { id }),
        ]
    }

    /// Confirms an action originated by the hub process itself. It takes
    /// the same validation path as remote actions; the only difference is
    /// that rejection surfaces as an error instead of a resync.
    pub fn dispatch_local(
        &mut self,
        action: Action,
    ) -> Result<(ClientActionId, Vec<Directive>), ActionError> {
        let id = self.mint_local_id();
        self.confirm(id, action.clone())?;
        Ok((id, vec![Directive::Broadcast(Message::Action { id, action })]))
    }

    fn mint_local_id(&mut self) -> ClientActionId {
        loop {
            let action_id: ActionId = self.generator.sample();
            let id = ClientActionId::new(self.client_id, action_id);
            if !self.ring_ids.contains(&id) {
                return id;
            }
        }
    }

    fn confirm(&mut self, id: ClientActionId, action: Action) -> Result<(), ActionError> {
        let mut applied = action.clone();
        applied.redo(&mut self.current)?;
        self.current.take_events();
        self.ring.push_back((id, action));
        self.ring_ids.insert(id);
        while self.ring.len() > self.retention {
            self.evict_oldest();
        }
        Ok(())
    }

    /// Folds the oldest retained action into the baseline; it can no longer
    /// be undone.
    fn evict_oldest(&mut self) {
        if let Some((id, action)) = self.ring.pop_front() {
            self.ring_ids.remove(&id);
            let mut applied = action;
            if let Err(err) = applied.redo(&mut self.baseline) {
                // The same action applied cleanly to `current` when it was
                // confirmed, so the baseline replay cannot diverge.
                log::error!("evicted action {} failed against baseline: {}", id, err);
            }
            self.baseline.take_events();
        }
    }

    fn rebuild_current(&mut self) {
        let mut current = self.baseline.clone();
        for (id, action) in &self.ring {
            let mut applied = action.clone();
            if let Err(err) = applied.redo(&mut current) {
                log::warn!("confirmed action {} no longer applies: {}", id, err);
            }
        }
        current.take_events();
        self.current = current;
    }
}
