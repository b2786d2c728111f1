//! # Game Rule Seams
//!
//! The replication layer must not know game-specific policy: which
//! animation states belong to one sequence, how much friction an
//! object feels, which engine flag bits are worth the bandwidth.
//! The game plugin implements [`GameRules`]; the engine calls through
//! it and nothing else.
//!
//! All callbacks are pure and synchronous; the tick loop never waits.

use crate::ids::{ObjectId, StateId};
use crate::world::World;

/// Friction applied when the game supplies no override.
pub const DEFAULT_FRICTION: f32 = 0.906_25;

/// Game-supplied policy hooks.
pub trait GameRules {
    /// Returns true if `a` and `b` belong to the same animation
    /// sequence. Transitions within a sequence are predictable
    /// client-side and need not be replicated.
    fn same_state_sequence(&self, a: StateId, b: StateId) -> bool;

    /// Friction coefficient for the given object.
    fn friction(&self, world: &World, object: ObjectId) -> f32 {
        let _ = (world, object);
        DEFAULT_FRICTION
    }

    /// Mask selecting the engine flag bits that travel to clients.
    /// The bit layout is game-defined; the engine only masks with it.
    fn pack_mask(&self) -> u32 {
        u32::MAX
    }
}

/// Default rules: every state is its own sequence, default friction,
/// all flag bits replicated. Useful for tests and headless tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRules;

impl GameRules for DefaultRules {
    fn same_state_sequence(&self, a: StateId, b: StateId) -> bool {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = DefaultRules;
        assert!(rules.same_state_sequence(StateId(3), StateId(3)));
        assert!(!rules.same_state_sequence(StateId(3), StateId(4)));
        assert_eq!(rules.pack_mask(), u32::MAX);
        let world = World::new();
        assert_eq!(rules.friction(&world, ObjectId(1)), DEFAULT_FRICTION);
    }
}
