//! # ARBITER Replication - The Authority Protocol
//!
//! The authoritative world-state delta pool engine. The server holds
//! the canonical simulation; every connected client holds an
//! approximation that must track it within a bandwidth budget over an
//! unreliable link. Each tick this crate answers the hard question:
//! *given the world's current state, what minimal, prioritised set of
//! updates should each client receive now, accounting for what it has
//! and has not already acknowledged?*
//!
//! ## Architecture
//!
//! ```text
//! world state ──(diff against register)──▶ candidate deltas
//!                                            │
//!                                   (add with merge/subtract)
//!                                            ▼
//!                                   per-client delta pool
//!                                            │
//!                                        (rate)
//!                                            ▼
//!                                     priority queue
//!                                            │
//!                                  (frame builder seam)
//!                                            ▼
//!                                     wire (external)
//!                                            │
//!                                        (on ack)
//!                                            ▼
//!                                     delta removed
//! ```
//!
//! - [`register`]: full-world snapshots, the reference for every diff
//! - [`delta`]: the typed change records and their merge algebra
//! - [`pool`]: per-client stores with ack tracking and missile records
//! - [`diff`]: the per-tick generation passes
//! - [`rate`]: distance/age/content scoring for the priority queue
//! - [`engine`]: the per-server facade tying it all together
//!
//! ## Concurrency model
//!
//! Single-threaded, cooperative, tick-driven. The main loop runs one
//! diff pass per world step, builds frames immediately after, and
//! feeds acks in synchronously. No operation suspends or blocks.

#![deny(unsafe_code)]

pub mod config;
pub mod delta;
pub mod diff;
pub mod engine;
pub mod error;
pub mod pool;
pub mod rate;
pub mod register;

// Re-exports for convenience
pub use config::ReplicationConfig;
pub use delta::{
    Delta, DeltaKind, DeltaPayload, DeltaState, ObjectFlags, PlayerFlags, PolyFlags, SectorFlags,
    SideFlags, SoundFlags, SoundPayload,
};
pub use diff::SoundSource;
pub use engine::{ReplicationEngine, MAX_CLIENTS};
pub use error::ConfigError;
pub use pool::{DeltaHandle, MissileRecord, Pool};
pub use rate::OwnerInfo;
pub use register::{
    RegisteredObject, RegisteredPlayer, RegisteredPolyobject, RegisteredPsprite, RegisteredSector,
    RegisteredSide, WorldRegister,
};
