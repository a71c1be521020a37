//! Multi-replica convergence under interleaved edits and undo traffic.

use shiai_shared::actions::{Action, ChangePlayersFirstName};
use shiai_test::{fixtures, Cluster};

#[test]
fn concurrent_edits_from_two_replicas_converge() {
    let mut cluster = Cluster::new(2, 64);

    // Neither replica has seen the other's edit when it dispatches.
    let players = fixtures::add_players(
        cluster.manager_mut(0),
        &[("Ama", "Kita"), ("Leni", "Vogel")],
    );
    cluster.dispatch(0, players.into()).unwrap();
    let category = fixtures::add_category(cluster.manager_mut(1), "u73");
    cluster.dispatch(1, category.into()).unwrap();

    cluster.settle();
    cluster.assert_converged();
    assert_eq!(cluster.manager(0).store().players().len(), 2);
    assert_eq!(cluster.manager(0).store().categories().len(), 1);
}

#[test]
fn foreign_confirmation_rebases_a_pending_local_edit() {
    let mut cluster = Cluster::new(2, 64);

    let players = fixtures::add_players(cluster.manager_mut(0), &[("Ama", "Kita")]);
    let player_id = players.ids()[0];
    cluster.dispatch(0, players.into()).unwrap();
    cluster.settle();

    // Both replicas rename the same player; replica 1 dispatches before it
    // sees replica 0's rename, so it must rebase. Confirmation order puts
    // replica 0 first, so replica 1's value wins everywhere.
    let rename_a: Action = ChangePlayersFirstName::new(vec![player_id], "Amara".into()).into();
    let rename_b: Action = ChangePlayersFirstName::new(vec![player_id], "Amaia".into()).into();
    cluster.dispatch(0, rename_a).unwrap();
    cluster.dispatch(1, rename_b).unwrap();

    cluster.settle();
    cluster.assert_converged();
    for index in 0..2 {
        let store = cluster.manager(index).store();
        let player = store.players().get(&player_id).unwrap();
        assert_eq!(player.fields().first_name, "Amaia");
    }
}

#[test]
fn confirmed_undo_fans_out_to_every_replica() {
    let mut cluster = Cluster::new(2, 64);

    let category = fixtures::add_category(cluster.manager_mut(0), "u73");
    cluster.dispatch(0, category.into()).unwrap();
    cluster.settle();
    assert_eq!(cluster.manager(1).store().categories().len(), 1);

    // Replica 0 undoes its own confirmed action; the authority's undo
    // reaches replica 1 as well.
    cluster.undo(0).unwrap();
    cluster.settle();

    cluster.assert_converged();
    assert_eq!(cluster.manager(0).store().categories().len(), 0);
    assert_eq!(cluster.manager(1).store().categories().len(), 0);
}

#[test]
fn undo_cursor_never_targets_foreign_actions() {
    let mut cluster = Cluster::new(2, 64);

    let category = fixtures::add_category(cluster.manager_mut(0), "u73");
    cluster.dispatch(0, category.into()).unwrap();
    cluster.settle();

    // Replica 1 only ever saw replica 0's action; it has nothing of its
    // own to take back, so undo is a no-op everywhere.
    assert!(!cluster.manager(1).can_undo());
    cluster.undo(1).unwrap();
    cluster.settle();

    cluster.assert_converged();
    assert_eq!(cluster.manager(0).store().categories().len(), 1);
    assert_eq!(cluster.manager(1).store().categories().len(), 1);
}

#[test]
fn redo_reintroduces_the_edit_under_a_fresh_identity() {
    let mut cluster = Cluster::new(2, 64);

    let category = fixtures::add_category(cluster.manager_mut(0), "u73");
    cluster.dispatch(0, category.into()).unwrap();
    cluster.settle();

    cluster.undo(0).unwrap();
    cluster.settle();
    assert_eq!(cluster.manager(1).store().categories().len(), 0);

    cluster.redo(0).unwrap();
    cluster.settle();

    cluster.assert_converged();
    assert_eq!(cluster.manager(1).store().categories().len(), 1);
}

#[test]
fn seeded_draw_produces_identical_brackets_on_every_replica() {
    let mut cluster = Cluster::new(2, 64);

    let players = fixtures::add_players(
        cluster.manager_mut(0),
        &[
            ("Ama", "Kita"),
            ("Leni", "Vogel"),
            ("Mara", "Ito"),
            ("Noa", "Lund"),
        ],
    );
    let ids = players.ids().to_vec();
    cluster.dispatch(0, players.into()).unwrap();
    let category = fixtures::add_category(cluster.manager_mut(0), "u73");
    let category_id = category.id();
    cluster.dispatch(0, category.into()).unwrap();

    // Attaching players spawns a seeded redraw; the bracket must come out
    // identical from the replica that drew it and the one that replayed it.
    cluster
        .dispatch(0, fixtures::attach_players(category_id, ids, 17).into())
        .unwrap();
    cluster.settle();

    cluster.assert_converged();
    for index in 0..2 {
        let store = cluster.manager(index).store();
        let category = store.categories().get(&category_id).unwrap();
        // Four players: two elimination matches plus a final.
        assert_eq!(category.matches().len(), 3);
    }
}

#[test]
fn out_of_order_delivery_across_replicas_still_converges() {
    let mut cluster = Cluster::new(3, 64);

    for (index, name) in ["u60", "u66", "u73"].iter().enumerate() {
        let category = fixtures::add_category(cluster.manager_mut(index), name);
        cluster.dispatch(index, category.into()).unwrap();
    }

    // Drain the replicas in rotating order, one message at a time, so each
    // sees the others' confirmations at different points in its own log.
    let mut progressed = true;
    while progressed {
        progressed = false;
        for index in [2, 0, 1] {
            progressed |= cluster.deliver_next(index);
        }
    }

    cluster.assert_converged();
    assert_eq!(cluster.manager(0).store().categories().len(), 3);
}
