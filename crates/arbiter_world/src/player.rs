//! # Player Slots
//!
//! Fixed array of player slots; a slot is live while `in_game` is set.
//! Frames are only built for players that are also `ready`.

use crate::ids::{BinAngle, ObjectId, StateId};

/// One of the two sprite layers drawn over a player's view
/// (weapon and flash, typically).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerSprite {
    /// Current animation state of the layer.
    pub state: StateId,
    /// Remaining tics of the current frame.
    pub tics: i32,
    /// Layer opacity.
    pub alpha: f32,
    /// Game-defined state number.
    pub state_id: i32,
    /// 2D draw offset.
    pub offset: [f32; 2],
}

/// A player slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    /// Slot is occupied and participating in the game.
    pub in_game: bool,
    /// Client has finished joining and may receive frames.
    pub ready: bool,
    /// The object this player controls and views from.
    pub object: ObjectId,
    /// View pitch, degrees.
    pub look_dir: f32,
    /// Facing angle at the previous tick, for turn deltas.
    pub last_angle: BinAngle,
    /// Additional light level around this player.
    pub extra_light: i32,
    /// Fixed colour-map override index.
    pub fixed_color_map: i32,
    /// Screen filter colour, meaningful when `FLAG_VIEW_FILTER` is set.
    pub filter_color: [f32; 4],
    /// Player state flags (`FLAG_*`).
    pub flags: u32,
    /// View sprite layers.
    pub psprites: [PlayerSprite; 2],
}

impl Player {
    /// The screen filter colour is active.
    pub const FLAG_VIEW_FILTER: u32 = 1 << 0;

    /// Creates an empty, unoccupied slot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            in_game: false,
            ready: false,
            object: ObjectId::NONE,
            look_dir: 0.0,
            last_angle: 0,
            extra_light: 0,
            fixed_color_map: 0,
            filter_color: [0.0; 4],
            flags: 0,
            psprites: [PlayerSprite::default(); 2],
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let slot = Player::empty();
        assert!(!slot.in_game);
        assert!(!slot.ready);
        assert!(slot.object.is_none());
    }
}
