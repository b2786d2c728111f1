//! # The World Aggregate
//!
//! Everything the server simulates, in one place. Single-threaded by
//! contract: the tick loop is the only writer, and the replication
//! layer reads between writes.

use crate::ids::ObjectId;
use crate::map::Map;
use crate::object::{GameObject, ObjectSet};
use crate::player::Player;
use crate::MAX_PLAYERS;

/// The authoritative world state.
#[derive(Debug, Default)]
pub struct World {
    /// Simulation tick counter.
    pub tic: i32,
    /// Live mobile objects.
    pub objects: ObjectSet,
    /// Player slots.
    pub players: [Player; MAX_PLAYERS],
    /// Map geometry.
    pub map: Map,
}

impl World {
    /// Creates an empty world with no map loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world around the given map.
    #[must_use]
    pub fn with_map(map: Map) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    /// Returns the player slot.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    /// Returns the player slot mutably.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn player_mut(&mut self, index: usize) -> &mut Player {
        &mut self.players[index]
    }

    /// The object a player views the world from, if any.
    #[must_use]
    pub fn player_object(&self, index: usize) -> Option<&GameObject> {
        let id = self.players.get(index)?.object;
        if id.is_none() {
            return None;
        }
        self.objects.get(id)
    }

    /// Marks a player slot as in-game and ready, controlling `object`.
    pub fn join_player(&mut self, index: usize, object: ObjectId) {
        let slot = &mut self.players[index];
        slot.in_game = true;
        slot.ready = true;
        slot.object = object;
    }

    /// Clears a player slot.
    pub fn leave_player(&mut self, index: usize) {
        self.players[index] = Player::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave() {
        let mut world = World::new();
        let id = world.objects.spawn(GameObject::default());
        world.join_player(2, id);
        assert!(world.player(2).in_game);
        assert_eq!(world.player_object(2).map(|o| o.id), Some(id));

        world.leave_player(2);
        assert!(!world.player(2).in_game);
        assert!(world.player_object(2).is_none());
    }

    #[test]
    fn test_player_object_requires_live_object() {
        let mut world = World::new();
        let id = world.objects.spawn(GameObject::default());
        world.join_player(0, id);
        world.objects.remove(id);
        assert!(world.player_object(0).is_none());
    }
}
