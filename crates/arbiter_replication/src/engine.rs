//! # The Replication Engine
//!
//! Owns both world registers, the sixteen client pools, the base
//! score table and the side-partition cursor; one instance per server.
//! The surrounding engine calls a narrow surface:
//!
//! ```text
//! map start          init_pools(world)
//! client joined      init_pool_for_client(client, world)
//! every tick         generate_frame_deltas(world)
//! frame building     rate_pool / next_delta / mark_for_transmission
//!                    / end_frame
//! network intake     acknowledge_set(client, set, resend)
//! game events        add_sound_delta, object_removed, player_removed
//! ```
//!
//! Everything runs on the server's main thread; nothing here blocks.

use std::time::Instant;

use tracing::{debug, info};

use arbiter_world::{GameRules, ObjectId, World, MAX_PLAYERS};

use crate::config::ReplicationConfig;
use crate::delta::{Delta, DeltaKind};
use crate::diff::{self, SoundSource};
use crate::pool::{DeltaHandle, Pool};
use crate::rate;
use crate::register::{RegisteredPlayer, WorldRegister};

/// Maximum number of client slots, one pool each.
pub const MAX_CLIENTS: usize = MAX_PLAYERS;

/// The authoritative delta pool engine.
pub struct ReplicationEngine {
    config: ReplicationConfig,
    rules: Box<dyn GameRules>,
    /// Rolls forward with every per-tick diff.
    current: WorldRegister,
    /// Frozen at map start; the reference for new-client bootstraps.
    initial: WorldRegister,
    pools: Vec<Pool>,
    base_scores: [f32; DeltaKind::COUNT],
    side_cursor: u32,
    epoch: Instant,
}

impl ReplicationEngine {
    /// Creates an engine with no map registered yet.
    #[must_use]
    pub fn new(config: ReplicationConfig, rules: Box<dyn GameRules>) -> Self {
        Self {
            config,
            rules,
            current: WorldRegister::empty(),
            initial: WorldRegister::empty(),
            pools: (0..MAX_CLIENTS).map(Pool::new).collect(),
            base_scores: rate::base_scores(),
            side_cursor: 0,
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the engine came up; the delta age clock.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// True if the client should receive frames: it must be in the
    /// game and have told us it is ready.
    #[must_use]
    pub fn is_frame_target(world: &World, client: usize) -> bool {
        world
            .players
            .get(client)
            .is_some_and(|player| player.in_game && player.ready)
    }

    /// Per-map initialisation: re-seeds the base scores, drains every
    /// pool and snapshots the world into both registers.
    pub fn init_pools(&mut self, world: &World) {
        let started = Instant::now();

        self.base_scores = rate::base_scores();
        for pool in &mut self.pools {
            pool.reset_for_map();
        }

        self.current = WorldRegister::capture(world, self.rules.as_ref(), false);
        self.initial = WorldRegister::capture(world, self.rules.as_ref(), true);
        self.side_cursor = 0;

        info!(elapsed = ?started.elapsed(), "world registered");
    }

    /// Bootstraps a newly accepted client: drains its pool, then diffs
    /// the world against the frozen initial register so the pool fills
    /// with the client's complete create-from-nothing view. The
    /// initial register is left untouched.
    pub fn init_pool_for_client(&mut self, client: usize, world: &World) {
        if client >= MAX_CLIENTS {
            debug!(client, "init for out-of-range client ignored");
            return;
        }

        self.pools[client].drain();
        self.pools[client].mark_first();

        let now = self.timestamp();
        let targets = [client];
        let Self {
            initial,
            pools,
            rules,
            config,
            side_cursor,
            ..
        } = self;
        diff::generate(
            initial,
            world,
            rules.as_ref(),
            config,
            now,
            false,
            pools,
            &targets,
            side_cursor,
        );
    }

    /// Returns a client's pool.
    ///
    /// # Panics
    /// Panics if `client` is out of range.
    #[must_use]
    pub fn pool(&self, client: usize) -> &Pool {
        &self.pools[client]
    }

    /// Returns a client's pool mutably.
    ///
    /// # Panics
    /// Panics if `client` is out of range.
    pub fn pool_mut(&mut self, client: usize) -> &mut Pool {
        &mut self.pools[client]
    }

    /// Once per tick: diffs the world against the current register,
    /// updating it, and feeds the deltas to every frame-target pool.
    pub fn generate_frame_deltas(&mut self, world: &World) {
        let targets: Vec<usize> =
            (0..MAX_CLIENTS).filter(|&i| Self::is_frame_target(world, i)).collect();
        let now = self.timestamp();
        let Self {
            current,
            pools,
            rules,
            config,
            side_cursor,
            ..
        } = self;
        diff::generate(
            current,
            world,
            rules.as_ref(),
            config,
            now,
            true,
            pools,
            &targets,
            side_cursor,
        );
    }

    /// Feeds an audible event into the pools selected by `client_mask`
    /// (bit per client slot). Kind and emitter flags derive from the
    /// source; out-of-range sounds never enter a pool.
    pub fn add_sound_delta(
        &mut self,
        sound_id: i32,
        source: SoundSource,
        volume: f32,
        repeating: bool,
        client_mask: u32,
        world: &World,
    ) {
        let delta = diff::build_sound_delta(sound_id, source, volume, repeating, self.timestamp());
        for (index, pool) in self.pools.iter_mut().enumerate() {
            if client_mask & (1 << index) != 0 && world.players[index].in_game {
                pool.add_delta(&delta, world, &self.config);
            }
        }
    }

    /// Handles a predictable object removal (its state chain ended):
    /// the register entry is dropped and every connected pool forgets
    /// its pending NEW deltas and missile record. No Null delta is
    /// sent; clients run the same chain and remove the object locally.
    pub fn object_removed(&mut self, id: ObjectId, world: &World) {
        if !self.current.objects.remove(id) {
            return;
        }
        for (index, pool) in self.pools.iter_mut().enumerate() {
            if world.players[index].in_game {
                pool.object_removed(id);
            }
        }
    }

    /// Zeroes a leaving player's registration so a rejoin before the
    /// next map change receives a full update.
    pub fn player_removed(&mut self, client: usize) {
        if client >= MAX_CLIENTS {
            debug!(client, "removal of out-of-range player ignored");
            return;
        }
        self.current.players[client] = RegisteredPlayer::default();
    }

    /// Rates a client's pool and rebuilds its priority queue. Run once
    /// before building that client's frame.
    pub fn rate_pool(&mut self, client: usize, world: &World) {
        let now = self.timestamp();
        let Self {
            pools,
            config,
            base_scores,
            ..
        } = self;
        pools[client].rate(world, config, base_scores, now);
    }

    /// Extracts the highest-priority delta for the frame, or `None`
    /// when the queue is exhausted.
    pub fn next_delta(&mut self, client: usize) -> Option<DeltaHandle> {
        self.pools[client].queue_extract()
    }

    /// Reads a queued delta for serialisation.
    #[must_use]
    pub fn delta(&self, client: usize, handle: DeltaHandle) -> Option<&Delta> {
        self.pools[client].delta(handle)
    }

    /// Marks a delta as transmitted in the current frame's set (or as
    /// a retry with a fresh resend id).
    pub fn mark_for_transmission(&mut self, client: usize, handle: DeltaHandle) {
        let now = self.timestamp();
        self.pools[client].mark_for_transmission(handle, now);
    }

    /// Closes the frame: advances the set dealer and clears the
    /// pool's first-frame flag.
    pub fn end_frame(&mut self, client: usize) {
        self.pools[client].end_frame();
    }

    /// Acknowledges a transmission set (or, with `resend` nonzero, a
    /// retransmission): matching in-flight deltas are finished and
    /// removed, with missile-record side effects applied.
    pub fn acknowledge_set(&mut self, client: usize, set: u8, resend: u8) {
        if client >= MAX_CLIENTS {
            debug!(client, "ack from out-of-range client ignored");
            return;
        }
        self.pools[client].acknowledge(set, resend);
    }

    /// Diagnostic: number of deltas the client has not yet confirmed.
    #[must_use]
    pub fn count_unacked_deltas(&self, client: usize) -> usize {
        self.pools.get(client).map_or(0, Pool::count_unacked)
    }

    /// Read access to the rolling register, for diagnostics and tests.
    #[must_use]
    pub fn current_register(&self) -> &WorldRegister {
        &self.current
    }

    /// Read access to the frozen initial register.
    #[must_use]
    pub fn initial_register(&self) -> &WorldRegister {
        &self.initial
    }
}
