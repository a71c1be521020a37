//! Forced-resync paths: rejected actions and undo targets that fell out of
//! the authority's retained window.

use shiai_shared::actions::StoreAction;
use shiai_shared::id::{ActionId, ClientActionId, ClientId};
use shiai_test::{fixtures, Cluster};

#[test]
fn undo_beyond_retention_forces_a_full_resync() {
    let mut cluster = Cluster::new(2, 2);

    for name in ["u60", "u66", "u73"] {
        let category = fixtures::add_category(cluster.manager_mut(0), name);
        cluster.dispatch(0, category.into()).unwrap();
    }
    cluster.settle();
    // Retention is two, so the first creation has been folded into the
    // authority's baseline.
    assert_eq!(cluster.authority.confirmed_count(), 2);

    // Replica 0 unwinds its own three creations; the third target has
    // left the window and the authority answers with a sync instead.
    cluster.undo(0).unwrap();
    cluster.undo(0).unwrap();
    cluster.undo(0).unwrap();
    cluster.settle();

    cluster.assert_converged();
    // The two retained creations are undone; the evicted one survives, and
    // replica 0's optimistic third undo was rolled back by the sync.
    let names: Vec<&str> = cluster
        .manager(0)
        .store()
        .categories()
        .values()
        .map(|category| category.name())
        .collect();
    assert_eq!(names, vec!["u60"]);
}

#[test]
fn replayed_action_is_rejected_and_the_sender_resynced() {
    let mut cluster = Cluster::new(2, 64);

    let category = fixtures::add_category(cluster.manager_mut(0), "u73");
    let replay = category.fresh_clone();
    cluster.dispatch(0, category.into()).unwrap();
    cluster.settle();

    // A delayed duplicate of the creation arrives under a new id, as if a
    // faulty client retransmitted it. Validation rejects it and replica 1
    // is pushed through a full sync.
    let stale_id = ClientActionId::new(ClientId::new(999), ActionId::new(1));
    cluster.inject_action(1, stale_id, replay.into());
    cluster.settle();

    cluster.assert_converged();
    assert_eq!(cluster.manager(1).store().categories().len(), 1);
    assert_eq!(cluster.authority.confirmed_count(), 1);
}

#[test]
fn resync_preserves_unconfirmed_work_via_retransmission() {
    let mut cluster = Cluster::new(2, 64);

    let first = fixtures::add_category(cluster.manager_mut(0), "u73");
    let replay = first.fresh_clone();
    cluster.dispatch(0, first.into()).unwrap();
    cluster.settle();

    // Replica 1 has a local edit in flight when a replayed duplicate gets
    // it resynced. The sync resets its store, and the harness routes its
    // retransmission back to the authority, so the edit still lands.
    let keep = fixtures::add_category(cluster.manager_mut(1), "u81");
    let (id, transmit) = cluster.manager_mut(1).dispatch(keep.into()).unwrap();
    let stale_id = ClientActionId::new(ClientId::new(999), ActionId::new(1));
    cluster.inject_action(1, stale_id, replay.into());
    cluster.inject_action(1, id, transmit);
    cluster.settle();

    cluster.assert_converged();
    assert_eq!(cluster.manager(0).store().categories().len(), 2);
}
