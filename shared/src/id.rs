use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Defines an opaque 64-bit identifier type for one entity kind.
///
/// Identifiers are minted by random sampling (see [`IdGenerator`]), never
/// sequentially, so two processes that have never spoken can both create
/// entities that merge without collision.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{:x}", self.0)
            }
        }
    };
}

define_id!(PlayerId);
define_id!(CategoryId);
define_id!(MatchId);
define_id!(PositionId);
define_id!(ActionId);
define_id!(ClientId);
define_id!(TournamentId);

/// Globally unique identifier for a single action instance.
///
/// Each client mints its own `ActionId`s, so the `(ClientId, ActionId)` pair
/// is unique across the whole tournament without any coordination.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClientActionId {
    pub client: ClientId,
    pub action: ActionId,
}

impl ClientActionId {
    pub fn new(client: ClientId, action: ActionId) -> Self {
        Self { client, action }
    }
}

impl fmt::Display for ClientActionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.action)
    }
}

/// Addresses a match within its owning category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombinedId {
    pub category: CategoryId,
    pub match_id: MatchId,
}

impl CombinedId {
    pub fn new(category: CategoryId, match_id: MatchId) -> Self {
        Self { category, match_id }
    }
}

impl fmt::Display for CombinedId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.match_id)
    }
}

/// Mints random identifiers, resampling on collision.
///
/// One generator is held per process context (store manager, test harness)
/// rather than behind a global, so determinism is available where tests need
/// it. Collisions are resolved silently; callers never observe them.
pub struct IdGenerator {
    rng: ChaCha8Rng,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns a fresh id for which `taken` is false. Loops until one is
    /// found; with 64-bit ids and realistic populations the expected number
    /// of attempts is one.
    pub fn generate<I, F>(&mut self, mut taken: F) -> I
    where
        I: From<u64> + Copy,
        F: FnMut(I) -> bool,
    {
        loop {
            let id = I::from(self.rng.gen::<u64>());
            if !taken(id) {
                return id;
            }
        }
    }

    /// Raw sample without a collision check, for callers that manage their
    /// own uniqueness (e.g. match lists that were just cleared).
    pub fn sample<I: From<u64>>(&mut self) -> I {
        I::from(self.rng.gen::<u64>())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
