//! # ARBITER World - Canonical Simulation State
//!
//! The authoritative game world as the server simulates it: mobile
//! objects, player slots, and the static-but-mutable map geometry
//! (sectors, sides, polyobjects) with their sound emitters.
//!
//! ## Design
//!
//! - Plain data, owned in one place; the replication layer only reads
//! - Identity over pointers: objects, animation states, and materials
//!   are referred to by id so snapshots survive the owning data
//! - Game-specific judgement calls (animation sequences, friction,
//!   which flag bits travel) enter through the [`GameRules`] seam
//!
//! ```text
//! game tic code ──writes──▶ World ◀──reads── replication layer
//!                             │
//!                        GameRules (game plugin)
//! ```

#![deny(unsafe_code)]

pub mod ids;
pub mod map;
pub mod math;
pub mod object;
pub mod player;
pub mod rules;
pub mod world;

// Re-exports for convenience
pub use ids::{BinAngle, MaterialId, ObjectId, StateId, COORD_MAX, COORD_MIN};
pub use map::{Map, Plane, PlaneKind, Polyobject, Sector, Side, SideSection, SideSectionKind};
pub use math::{approx_distance, approx_distance_3, pack_rgba};
pub use object::{GameObject, ObjectSet};
pub use player::{Player, PlayerSprite};
pub use rules::{DefaultRules, GameRules, DEFAULT_FRICTION};
pub use world::World;

/// Maximum number of player slots in a game.
pub const MAX_PLAYERS: usize = 16;
