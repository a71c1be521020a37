//! Randomized schedules: any interleaving of edits, undo traffic, and
//! per-replica delivery must leave every replica equal to the authority
//! once the remaining traffic drains.

use proptest::prelude::*;

use shiai_shared::actions::{Action, ChangeCategoriesName, ChangePlayersFirstName};
use shiai_shared::store_manager::StoreManagerError;
use shiai_test::{fixtures, Cluster};

const REPLICAS: usize = 3;

#[derive(Clone, Debug)]
enum Op {
    AddPlayer(usize),
    AddCategory(usize),
    RenamePlayers(usize),
    RenameCategories(usize),
    Undo(usize),
    Redo(usize),
    /// Deliver one queued message to the replica.
    Deliver(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let replica = 0..REPLICAS;
    prop_oneof![
        2 => replica.clone().prop_map(Op::AddPlayer),
        2 => replica.clone().prop_map(Op::AddCategory),
        2 => replica.clone().prop_map(Op::RenamePlayers),
        2 => replica.clone().prop_map(Op::RenameCategories),
        2 => replica.clone().prop_map(Op::Undo),
        1 => replica.clone().prop_map(Op::Redo),
        6 => replica.prop_map(Op::Deliver),
    ]
}

/// A locally rejected action (e.g. redoing a creation someone else already
/// redid) is a legitimate outcome; desynchronization is not.
fn tolerate<T>(replica: usize, result: Result<T, StoreManagerError>) {
    match result {
        Ok(_) | Err(StoreManagerError::Action(_)) => {}
        Err(err) => panic!("replica {replica}: {err}"),
    }
}

fn apply(cluster: &mut Cluster, op: &Op) {
    match *op {
        Op::AddPlayer(replica) => {
            let action = fixtures::add_players(cluster.manager_mut(replica), &[("Ama", "Kita")]);
            tolerate(replica, cluster.dispatch(replica, action.into()));
        }
        Op::AddCategory(replica) => {
            let action = fixtures::add_category(cluster.manager_mut(replica), "u73");
            tolerate(replica, cluster.dispatch(replica, action.into()));
        }
        Op::RenamePlayers(replica) => {
            // Rename every player this replica currently knows about;
            // vanished referents no-op on replay.
            let ids = cluster
                .manager(replica)
                .store()
                .players()
                .keys()
                .copied()
                .collect::<Vec<_>>();
            if ids.is_empty() {
                return;
            }
            let action: Action = ChangePlayersFirstName::new(ids, "Leni".into()).into();
            tolerate(replica, cluster.dispatch(replica, action));
        }
        Op::RenameCategories(replica) => {
            let ids = cluster
                .manager(replica)
                .store()
                .categories()
                .keys()
                .copied()
                .collect::<Vec<_>>();
            if ids.is_empty() {
                return;
            }
            let action: Action = ChangeCategoriesName::new(ids, "u81".into()).into();
            tolerate(replica, cluster.dispatch(replica, action));
        }
        Op::Undo(replica) => {
            tolerate(replica, cluster.undo(replica));
        }
        Op::Redo(replica) => {
            tolerate(replica, cluster.redo(replica));
        }
        Op::Deliver(replica) => {
            cluster.deliver_next(replica);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn replicas_converge_under_any_schedule(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut cluster = Cluster::new(REPLICAS, 512);
        for op in &ops {
            apply(&mut cluster, op);
        }
        cluster.settle();
        cluster.assert_converged();
    }
}
