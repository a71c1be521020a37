//! The optimistic local action log.
//!
//! Local edits apply immediately and sit in the unconfirmed list until the
//! authority echoes them back. Foreign confirmed actions rebase the
//! unconfirmed tail: unwind it, apply the confirmed action, replay. Undo is
//! optimistic too, tracked through a pending-undo set until confirmed.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::actions::{Action, StoreAction};
use crate::id::{ActionId, ClientActionId, ClientId, IdGenerator};
use crate::store::tournament::TournamentStore;

/// Undone entries beyond this are forgotten.
pub const REDO_STACK_MAX_SIZE: usize = 20;

/// Confirmed entries kept for undo. Mirrors the authority's retained
/// window; anything older has been folded into its baseline and could not
/// be undone anyway.
pub const CONFIRMED_RETENTION: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreManagerError {
    /// A locally dispatched action violated a precondition; the store is
    /// untouched and the action is not logged.
    #[error("action failed: {0}")]
    Action(#[from] crate::actions::ActionError),

    /// The log can no longer be reconciled with the authority's ordering;
    /// only a full resync recovers from this.
    #[error("action log has diverged from the authority")]
    Desynchronized,
}

struct LogEntry {
    id: ClientActionId,
    action: Action,
    done: bool,
}

pub struct StoreManager {
    store: TournamentStore,
    client_id: ClientId,
    generator: IdGenerator,
    confirmed: VecDeque<LogEntry>,
    confirmed_ids: HashSet<ClientActionId>,
    unconfirmed: VecDeque<LogEntry>,
    unconfirmed_ids: HashSet<ClientActionId>,
    pending_undos: HashSet<ClientActionId>,
    redo_stack: Vec<Action>,
    undo_cursor: Option<ClientActionId>,
}

impl StoreManager {
    pub fn new(store: TournamentStore) -> Self {
        Self::with_generator(store, IdGenerator::new())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(store: TournamentStore, seed: u64) -> Self {
        Self::with_generator(store, IdGenerator::from_seed(seed))
    }

    fn with_generator(store: TournamentStore, mut generator: IdGenerator) -> Self {
        let client_id: ClientId = generator.sample();
        Self {
            store,
            client_id,
            generator,
            confirmed: VecDeque::new(),
            confirmed_ids: HashSet::new(),
            unconfirmed: VecDeque::new(),
            unconfirmed_ids: HashSet::new(),
            pending_undos: HashSet::new(),
            redo_stack: Vec::new(),
            undo_cursor: None,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn store(&self) -> &TournamentStore {
        &self.store
    }

    /// Access for constructing actions that mint ids against the current
    /// store state.
    pub fn store_and_generator_mut(&mut self) -> (&TournamentStore, &mut IdGenerator) {
        (&self.store, &mut self.generator)
    }

    pub fn take_events(&mut self) -> Vec<crate::store::event::StoreEvent> {
        self.store.take_events()
    }

    pub fn unconfirmed_len(&self) -> usize {
        self.unconfirmed.len()
    }

    pub fn confirmed_len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Applies `action` optimistically. Returns the minted id and the
    /// pristine clone to transmit to the authority.
    pub fn dispatch(
        &mut self,
        action: Action,
    ) -> Result<(ClientActionId, Action), StoreManagerError> {
        self.redo_stack.clear();
        self.dispatch_inner(action)
    }

    fn dispatch_inner(
        &mut self,
        mut action: Action,
    ) -> Result<(ClientActionId, Action), StoreManagerError> {
        let id = self.mint_action_id();
        let transmit = action.fresh_clone();
        action.redo(&mut self.store)?;
        log::debug!("dispatched {} as {}", action.description(), id);
        self.unconfirmed.push_back(LogEntry {
            id,
            action,
            done: true,
        });
        self.unconfirmed_ids.insert(id);
        self.undo_cursor = Some(id);
        Ok((id, transmit))
    }

    /// Forgets confirmed entries the authority can no longer undo. A stale
    /// undo cursor left behind is recomputed on the next undo attempt.
    fn trim_confirmed(&mut self) {
        while self.confirmed.len() > CONFIRMED_RETENTION {
            if let Some(entry) = self.confirmed.pop_front() {
                self.confirmed_ids.remove(&entry.id);
                self.pending_undos.remove(&entry.id);
            }
        }
    }

    fn mint_action_id(&mut self) -> ClientActionId {
        loop {
            let action_id: ActionId = self.generator.sample();
            let id = ClientActionId::new(self.client_id, action_id);
            if !self.confirmed_ids.contains(&id) && !self.unconfirmed_ids.contains(&id) {
                return id;
            }
        }
    }

    /// Undoes the most recent own action that is still done. Returns the id
    /// to transmit as an undo request, or `None` when nothing is undoable.
    pub fn undo(&mut self) -> Result<Option<ClientActionId>, StoreManagerError> {
        let target = match self.undo_cursor {
            Some(target) => target,
            None => return Ok(None),
        };

        let clone = if let Some(index) = self.unconfirmed.iter().position(|e| e.id == target) {
            let len = self.unconfirmed.len();
            for j in (index..len).rev() {
                if self.unconfirmed[j].done {
                    self.unconfirmed[j].action.undo(&mut self.store);
                }
            }
            self.unconfirmed[index].done = false;
            let clone = self.unconfirmed[index].action.fresh_clone();
            for j in index + 1..len {
                if self.unconfirmed[j].done {
                    self.unconfirmed[j]
                        .action
                        .redo(&mut self.store)
                        .map_err(|_| StoreManagerError::Desynchronized)?;
                }
            }
            clone
        } else if let Some(index) = self.confirmed.iter().position(|e| e.id == target) {
            for j in (0..self.unconfirmed.len()).rev() {
                if self.unconfirmed[j].done {
                    self.unconfirmed[j].action.undo(&mut self.store);
                }
            }
            let len = self.confirmed.len();
            for j in (index..len).rev() {
                if self.confirmed[j].done {
                    self.confirmed[j].action.undo(&mut self.store);
                }
            }
            self.confirmed[index].done = false;
            let clone = self.confirmed[index].action.fresh_clone();
            for j in index + 1..len {
                if self.confirmed[j].done {
                    self.confirmed[j]
                        .action
                        .redo(&mut self.store)
                        .map_err(|_| StoreManagerError::Desynchronized)?;
                }
            }
            for j in 0..self.unconfirmed.len() {
                if self.unconfirmed[j].done {
                    self.unconfirmed[j]
                        .action
                        .redo(&mut self.store)
                        .map_err(|_| StoreManagerError::Desynchronized)?;
                }
            }
            clone
        } else {
            // Stale cursor; the entry was evicted or confirmed-undone.
            self.recompute_undo_cursor();
            return Ok(None);
        };

        self.pending_undos.insert(target);
        self.redo_stack.push(clone);
        if self.redo_stack.len() > REDO_STACK_MAX_SIZE {
            self.redo_stack.remove(0);
        }
        self.recompute_undo_cursor();
        log::debug!("undid {}", target);
        Ok(Some(target))
    }

    /// Re-dispatches the most recently undone action as a fresh action with
    /// a new id.
    pub fn redo(&mut self) -> Result<Option<(ClientActionId, Action)>, StoreManagerError> {
        match self.redo_stack.pop() {
            Some(action) => self.dispatch_inner(action).map(Some),
            None => Ok(None),
        }
    }

    /// Handles a confirmed action from the authority. Our own echoes promote
    /// the front unconfirmed entry in place; foreign actions rebase the
    /// unconfirmed tail around the new confirmed entry.
    pub fn receive_confirmed_action(
        &mut self,
        id: ClientActionId,
        action: Action,
    ) -> Result<(), StoreManagerError> {
        if self.confirmed_ids.contains(&id) {
            log::warn!("duplicate confirmed action {}", id);
            return Err(StoreManagerError::Desynchronized);
        }

        if id.client == self.client_id {
            // Echoes arrive in dispatch order, so ours is always at the
            // front of the unconfirmed list.
            let entry = self
                .unconfirmed
                .pop_front()
                .ok_or(StoreManagerError::Desynchronized)?;
            if entry.id != id {
                return Err(StoreManagerError::Desynchronized);
            }
            self.unconfirmed_ids.remove(&id);
            self.confirmed_ids.insert(id);
            self.confirmed.push_back(entry);
            self.trim_confirmed();
            return Ok(());
        }

        for j in (0..self.unconfirmed.len()).rev() {
            if self.unconfirmed[j].done {
                self.unconfirmed[j].action.undo(&mut self.store);
            }
        }

        let mut entry = LogEntry {
            id,
            action,
            done: true,
        };
        entry
            .action
            .redo(&mut self.store)
            .map_err(|_| StoreManagerError::Desynchronized)?;
        self.confirmed_ids.insert(id);
        self.confirmed.push_back(entry);
        self.trim_confirmed();

        for j in 0..self.unconfirmed.len() {
            if self.unconfirmed[j].done {
                self.unconfirmed[j]
                    .action
                    .redo(&mut self.store)
                    .map_err(|_| StoreManagerError::Desynchronized)?;
            }
        }
        Ok(())
    }

    /// Handles a confirmed undo. The target is always in the confirmed list
    /// by the time the authority's undo arrives, because per-connection
    /// ordering delivers the action's own confirmation first.
    pub fn receive_confirmed_undo(&mut self, id: ClientActionId) -> Result<(), StoreManagerError> {
        let index = self
            .confirmed
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreManagerError::Desynchronized)?;

        for j in (0..self.unconfirmed.len()).rev() {
            if self.unconfirmed[j].done {
                self.unconfirmed[j].action.undo(&mut self.store);
            }
        }
        let len = self.confirmed.len();
        for j in (index + 1..len).rev() {
            if self.confirmed[j].done {
                self.confirmed[j].action.undo(&mut self.store);
            }
        }

        let mut entry = self
            .confirmed
            .remove(index)
            .ok_or(StoreManagerError::Desynchronized)?;
        if entry.done {
            entry.action.undo(&mut self.store);
        }
        self.confirmed_ids.remove(&id);
        self.pending_undos.remove(&id);

        for j in index..self.confirmed.len() {
            if self.confirmed[j].done {
                self.confirmed[j]
                    .action
                    .redo(&mut self.store)
                    .map_err(|_| StoreManagerError::Desynchronized)?;
            }
        }
        for j in 0..self.unconfirmed.len() {
            if self.unconfirmed[j].done {
                self.unconfirmed[j]
                    .action
                    .redo(&mut self.store)
                    .map_err(|_| StoreManagerError::Desynchronized)?;
            }
        }

        self.recompute_undo_cursor();
        log::debug!("confirmed undo of {}", id);
        Ok(())
    }

    /// The authority accepted our action. The state change already happened
    /// when the echo arrived; the ack only validates ordering.
    pub fn receive_action_ack(&mut self, id: ClientActionId) -> Result<(), StoreManagerError> {
        if self.unconfirmed_ids.contains(&id) {
            // The ack overtook the echo, which per-connection ordering
            // forbids.
            return Err(StoreManagerError::Desynchronized);
        }
        Ok(())
    }

    /// The authority accepted our undo. Normally a no-op because the undo
    /// echo already removed the entry; clears stragglers otherwise.
    pub fn receive_undo_ack(&mut self, id: ClientActionId) {
        self.pending_undos.remove(&id);
        if let Some(index) = self.confirmed.iter().position(|e| e.id == id) {
            self.confirmed.remove(index);
            self.confirmed_ids.remove(&id);
        }
    }

    /// Replaces all state from a sync payload: adopt the baseline, replay
    /// the authority's confirmed window, then re-apply surviving local
    /// unconfirmed actions. Returns the survivors for retransmission.
    pub fn sync(
        &mut self,
        tournament: TournamentStore,
        window: Vec<(ClientActionId, Action)>,
    ) -> Result<Vec<(ClientActionId, Action)>, StoreManagerError> {
        let old_unconfirmed = std::mem::take(&mut self.unconfirmed);
        self.unconfirmed_ids.clear();
        self.confirmed.clear();
        self.confirmed_ids.clear();
        self.pending_undos.clear();
        self.redo_stack.clear();
        self.store = tournament;

        for (id, mut action) in window {
            action
                .redo(&mut self.store)
                .map_err(|_| StoreManagerError::Desynchronized)?;
            self.confirmed_ids.insert(id);
            self.confirmed.push_back(LogEntry {
                id,
                action,
                done: true,
            });
        }

        let mut retransmit = Vec::new();
        for entry in old_unconfirmed {
            if !entry.done || self.confirmed_ids.contains(&entry.id) {
                continue;
            }
            let mut action = entry.action.fresh_clone();
            match action.redo(&mut self.store) {
                Ok(()) => {
                    let transmit = action.fresh_clone();
                    self.unconfirmed_ids.insert(entry.id);
                    self.unconfirmed.push_back(LogEntry {
                        id: entry.id,
                        action,
                        done: true,
                    });
                    retransmit.push((entry.id, transmit));
                }
                Err(err) => {
                    log::warn!("dropping local action {} after resync: {}", entry.id, err);
                }
            }
        }

        self.trim_confirmed();
        self.recompute_undo_cursor();
        log::info!(
            "synced: {} confirmed, {} local actions retransmitted",
            self.confirmed.len(),
            retransmit.len()
        );
        Ok(retransmit)
    }

    fn recompute_undo_cursor(&mut self) {
        let client_id = self.client_id;
        let pending = &self.pending_undos;
        let own = |e: &&LogEntry| e.done && e.id.client == client_id && !pending.contains(&e.id);
        let cursor = self
            .unconfirmed
            .iter()
            .rev()
            .find(own)
            .or_else(|| self.confirmed.iter().rev().find(own))
            .map(|e| e.id);
        self.undo_cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AddCategory, AddPlayers, AddPlayersToCategory, ChangePlayersFirstName};
    use crate::id::TournamentId;
    use crate::store::player::PlayerFields;

    fn empty_store() -> TournamentStore {
        TournamentStore::new(TournamentId::new(1), "test".into())
    }

    fn fields(first: &str) -> PlayerFields {
        PlayerFields {
            first_name: first.into(),
            ..PlayerFields::default()
        }
    }

    fn add_player_action(manager: &mut StoreManager, first: &str) -> Action {
        let (store, generator) = manager.store_and_generator_mut();
        AddPlayers::new(store, generator, vec![fields(first)]).into()
    }

    #[test]
    fn echo_promotes_unconfirmed_entry() {
        let mut manager = StoreManager::with_seed(empty_store(), 1);
        let action = add_player_action(&mut manager, "a");
        let (id, transmit) = manager.dispatch(action).unwrap();
        assert_eq!(manager.unconfirmed_len(), 1);

        let applied = manager.store().clone();
        manager.receive_confirmed_action(id, transmit).unwrap();
        manager.receive_action_ack(id).unwrap();

        assert_eq!(manager.unconfirmed_len(), 0);
        assert_eq!(*manager.store(), applied);
        assert!(manager.can_undo());
    }

    #[test]
    fn foreign_action_rebases_under_local_tail() {
        // Both replicas share the confirmed prefix, then apply the same two
        // actions in opposite optimistic orders.
        let mut alice = StoreManager::with_seed(empty_store(), 1);
        let mut bob = StoreManager::with_seed(empty_store(), 2);

        let local = add_player_action(&mut alice, "a");
        let (local_id, local_transmit) = alice.dispatch(local).unwrap();

        let foreign = add_player_action(&mut bob, "b");
        let (foreign_id, foreign_transmit) = bob.dispatch(foreign).unwrap();

        // Authority confirms the foreign action first.
        alice
            .receive_confirmed_action(foreign_id, foreign_transmit.fresh_clone())
            .unwrap();
        alice
            .receive_confirmed_action(local_id, local_transmit.fresh_clone())
            .unwrap();

        bob.receive_confirmed_action(foreign_id, foreign_transmit)
            .unwrap();
        bob.receive_confirmed_action(local_id, local_transmit)
            .unwrap();

        assert_eq!(*alice.store(), *bob.store());
        assert_eq!(alice.store().players().len(), 2);
    }

    #[test]
    fn undo_of_unconfirmed_action_reverts_and_survives_echo() {
        let mut manager = StoreManager::with_seed(empty_store(), 3);
        let before = manager.store().clone();

        let action = add_player_action(&mut manager, "a");
        let (id, transmit) = manager.dispatch(action).unwrap();
        let undone = manager.undo().unwrap();
        assert_eq!(undone, Some(id));
        assert_eq!(*manager.store(), before);
        assert!(!manager.can_undo());

        // Echo arrives after the local undo: entry promotes as not-done.
        manager.receive_confirmed_action(id, transmit).unwrap();
        assert_eq!(*manager.store(), before);

        // The authority's undo then clears the entry entirely.
        manager.receive_confirmed_undo(id).unwrap();
        manager.receive_undo_ack(id);
        assert_eq!(*manager.store(), before);
    }

    #[test]
    fn undo_of_confirmed_action_unwinds_and_replays() {
        let mut manager = StoreManager::with_seed(empty_store(), 4);

        let first = add_player_action(&mut manager, "a");
        let (first_id, first_transmit) = manager.dispatch(first).unwrap();
        manager
            .receive_confirmed_action(first_id, first_transmit)
            .unwrap();

        let second = add_player_action(&mut manager, "b");
        let (second_id, second_transmit) = manager.dispatch(second).unwrap();
        manager
            .receive_confirmed_action(second_id, second_transmit)
            .unwrap();

        // Undo the older entry: not the top of the log, so the newer one is
        // unwound and replayed around it.
        let undone = manager.undo().unwrap();
        assert_eq!(undone, Some(second_id));
        let undone = manager.undo().unwrap();
        assert_eq!(undone, Some(first_id));

        assert_eq!(manager.store().players().len(), 0);

        manager.receive_confirmed_undo(second_id).unwrap();
        manager.receive_confirmed_undo(first_id).unwrap();
        assert_eq!(manager.store().players().len(), 0);
    }

    #[test]
    fn redo_re_dispatches_with_fresh_id() {
        let mut manager = StoreManager::with_seed(empty_store(), 5);

        let action = add_player_action(&mut manager, "a");
        let (id, _) = manager.dispatch(action).unwrap();
        manager.undo().unwrap();
        assert!(manager.can_redo());

        let (redo_id, _redo_transmit) = manager.redo().unwrap().unwrap();
        assert_ne!(redo_id, id);
        assert_eq!(manager.store().players().len(), 1);
    }

    #[test]
    fn dispatch_clears_redo_stack() {
        let mut manager = StoreManager::with_seed(empty_store(), 6);

        let action = add_player_action(&mut manager, "a");
        manager.dispatch(action).unwrap();
        manager.undo().unwrap();
        assert!(manager.can_redo());

        let other = add_player_action(&mut manager, "b");
        manager.dispatch(other).unwrap();
        assert!(!manager.can_redo());
    }

    #[test]
    fn sync_retransmits_surviving_unconfirmed_actions() {
        let mut manager = StoreManager::with_seed(empty_store(), 7);

        let confirmed = add_player_action(&mut manager, "a");
        let (confirmed_id, confirmed_transmit) = manager.dispatch(confirmed).unwrap();
        let unseen = add_player_action(&mut manager, "b");
        let (unseen_id, _) = manager.dispatch(unseen).unwrap();

        // The authority only saw the first action before the resync.
        let retransmit = manager
            .sync(empty_store(), vec![(confirmed_id, confirmed_transmit)])
            .unwrap();

        assert_eq!(retransmit.len(), 1);
        assert_eq!(retransmit[0].0, unseen_id);
        assert_eq!(manager.store().players().len(), 2);
        assert_eq!(manager.unconfirmed_len(), 1);
    }

    #[test]
    fn sync_drops_locally_undone_actions() {
        let mut manager = StoreManager::with_seed(empty_store(), 8);

        let action = add_player_action(&mut manager, "a");
        manager.dispatch(action).unwrap();
        manager.undo().unwrap();

        let retransmit = manager.sync(empty_store(), Vec::new()).unwrap();
        assert!(retransmit.is_empty());
        assert_eq!(manager.store().players().len(), 0);
        assert!(!manager.can_redo());
    }

    #[test]
    fn composite_actions_rebase_deterministically() {
        // A foreign rename interleaves with a local category draw; both
        // replicas converge because the draw seed travels with the action.
        let mut alice = StoreManager::with_seed(empty_store(), 9);
        let mut bob = StoreManager::with_seed(empty_store(), 10);

        let setup = add_player_action(&mut alice, "a");
        let (setup_id, setup_transmit) = alice.dispatch(setup).unwrap();
        alice
            .receive_confirmed_action(setup_id, setup_transmit.fresh_clone())
            .unwrap();
        bob.receive_confirmed_action(setup_id, setup_transmit)
            .unwrap();
        let player_id = *alice.store().players().keys().next().unwrap();

        let category: Action = {
            let (store, generator) = alice.store_and_generator_mut();
            AddCategory::new(store, generator, "u60".into()).into()
        };
        let (category_id_action, category_transmit) = alice.dispatch(category).unwrap();
        let category_id = match &category_transmit {
            Action::AddCategory(add) => add.id(),
            _ => unreachable!(),
        };

        let attach: Action = AddPlayersToCategory::new(category_id, vec![player_id], 77).into();
        let (attach_id, attach_transmit) = alice.dispatch(attach).unwrap();

        let rename: Action = ChangePlayersFirstName::new(vec![player_id], "z".into()).into();
        let (rename_id, rename_transmit) = bob.dispatch(rename).unwrap();

        // Authority order: rename, category, attach.
        for (id, transmit) in [
            (rename_id, rename_transmit),
            (category_id_action, category_transmit),
            (attach_id, attach_transmit),
        ] {
            alice
                .receive_confirmed_action(id, transmit.fresh_clone())
                .unwrap();
            bob.receive_confirmed_action(id, transmit).unwrap();
        }

        assert_eq!(*alice.store(), *bob.store());
    }

    #[test]
    fn confirmed_log_is_trimmed_to_the_retained_window() {
        let mut manager = StoreManager::with_seed(empty_store(), 11);

        for _ in 0..CONFIRMED_RETENTION + 5 {
            let action = add_player_action(&mut manager, "a");
            let (id, transmit) = manager.dispatch(action).unwrap();
            manager.receive_confirmed_action(id, transmit).unwrap();
        }

        // The store keeps everything; the undo log only the window.
        assert_eq!(manager.confirmed_len(), CONFIRMED_RETENTION);
        assert_eq!(manager.store().players().len(), CONFIRMED_RETENTION + 5);

        // Recent entries are still undoable.
        assert!(manager.can_undo());
        assert!(manager.undo().unwrap().is_some());
        assert_eq!(manager.store().players().len(), CONFIRMED_RETENTION + 4);
    }
}
