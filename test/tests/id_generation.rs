//! Properties of random id minting: freshness against arbitrary claimed
//! sets, and determinism per seed.

use std::collections::HashSet;

use proptest::prelude::*;

use shiai_shared::id::{IdGenerator, PlayerId};

proptest! {
    #[test]
    fn generated_id_is_never_in_the_taken_set(
        seed in any::<u64>(),
        taken in prop::collection::hash_set(any::<u64>(), 0..256),
    ) {
        let taken: HashSet<PlayerId> = taken.into_iter().map(PlayerId::new).collect();
        let mut generator = IdGenerator::from_seed(seed);
        let id: PlayerId = generator.generate(|id| taken.contains(&id));
        prop_assert!(!taken.contains(&id));
    }

    #[test]
    fn same_seed_mints_the_same_stream(seed in any::<u64>()) {
        let mut a = IdGenerator::from_seed(seed);
        let mut b = IdGenerator::from_seed(seed);
        for _ in 0..16 {
            let left: PlayerId = a.sample();
            let right: PlayerId = b.sample();
            prop_assert_eq!(left, right);
        }
    }
}
