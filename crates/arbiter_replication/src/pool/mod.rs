//! # Delta Pools
//!
//! One pool per client slot. A pool holds everything its client has
//! not yet confirmed: NEW deltas waiting for a first transmission and
//! UNACKED deltas in flight, hashed by target id, plus the missile
//! records and the frame priority queue.
//!
//! ## Pool invariants
//!
//! - At most one NEW delta per (kind, id); colliding additions merge
//! - Any number of UNACKED deltas per (kind, id); newer data subtracts
//!   from them so resends never carry stale fields
//! - No void delta (flags == 0) is ever stored
//!
//! Adding a delta walks exactly one hash bucket, so the per-tick cost
//! tracks the number of actually-changed entities.

pub mod missile;
pub mod queue;
pub mod store;

use tracing::trace;

use arbiter_world::{GameObject, ObjectId, World};

use crate::config::ReplicationConfig;
use crate::delta::{Delta, DeltaKind, DeltaPayload, DeltaState, ObjectFlags, PlayerFlags};
use crate::rate::{self, OwnerInfo};

pub use missile::{MissileRecord, MissileRecords};
pub use queue::PriorityQueue;
pub use store::{DeltaHandle, DeltaStore};

/// Bucket count of the pool delta hash.
pub const POOL_HASH_SIZE: usize = 1024;
const POOL_HASH_MASK: u32 = 0x3ff;

/// Per-client store of pending and in-flight deltas.
#[derive(Debug)]
pub struct Pool {
    /// Owning client slot.
    owner: usize,
    /// Backing storage for all deltas in the pool.
    store: DeltaStore,
    /// Id-hashed buckets of delta handles, in insertion order.
    buckets: Vec<Vec<DeltaHandle>>,
    /// Acknowledged missiles eligible for extrapolation elision.
    missiles: MissileRecords,
    /// Cached owner situation, refreshed per generation pass.
    pub owner_info: OwnerInfo,
    /// Next transmission batch number.
    set_dealer: u8,
    /// Next retransmission id (0 is never dealt).
    resend_dealer: u8,
    /// Frame priority queue, rebuilt by every rating pass.
    queue: PriorityQueue,
    /// True until the first frame goes out; widens the side diff.
    is_first: bool,
}

impl Pool {
    /// Creates an empty pool for a client slot.
    #[must_use]
    pub fn new(owner: usize) -> Self {
        Self {
            owner,
            store: DeltaStore::new(),
            buckets: (0..POOL_HASH_SIZE).map(|_| Vec::new()).collect(),
            missiles: MissileRecords::new(),
            owner_info: OwnerInfo::default(),
            set_dealer: 0,
            resend_dealer: 0,
            queue: PriorityQueue::new(),
            is_first: true,
        }
    }

    #[inline]
    fn bucket_of(id: u32) -> usize {
        (id & POOL_HASH_MASK) as usize
    }

    /// The owning client slot.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> usize {
        self.owner
    }

    /// True until the pool's first frame has been transmitted.
    #[inline]
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.is_first
    }

    /// Marks the pool as never having sent a frame.
    pub fn mark_first(&mut self) {
        self.is_first = true;
    }

    /// Empties the pool completely and resets the dealers.
    pub fn drain(&mut self) {
        self.set_dealer = 0;
        self.resend_dealer = 0;
        self.queue.clear();
        self.store.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.missiles.clear();
    }

    /// Per-map reset: drained, resend dealer re-armed, first frame
    /// pending again.
    pub fn reset_for_map(&mut self) {
        self.drain();
        self.resend_dealer = 1;
        self.is_first = true;
    }

    /// Flags of `incoming` that survive viewpoint exclusion for this
    /// pool's owner. Returns 0 when the delta should be dropped whole.
    fn excluded_flags(
        &mut self,
        incoming: &Delta,
        world: &World,
        config: &ReplicationConfig,
    ) -> u32 {
        let mut flags = incoming.flags;

        match incoming.kind {
            DeltaKind::Object => {
                if let DeltaPayload::Object(payload) = &incoming.payload {
                    let viewer = world.players[self.owner].object;
                    if !viewer.is_none() && viewer.0 == incoming.id {
                        // The owner's own camera object: it maintains
                        // position, momentum and angle itself.
                        flags &= !ObjectFlags::CAMERA_EXCLUDE;
                    }

                    if payload.engine_flags & GameObject::FLAG_MISSILE != 0 {
                        if incoming.is_null_object() {
                            // The missile is being removed entirely.
                            self.missiles.remove(ObjectId(incoming.id));
                        } else if !incoming.is_create_object() {
                            // The record goes in when the client acks
                            // the Create; until the missile dies it
                            // covers the extrapolatable fields.
                            flags &= !self.missiles.check(incoming);
                        }
                    }
                }
            }
            DeltaKind::Player => {
                if self.owner as u32 == incoming.id {
                    flags &= !PlayerFlags::CAMERA_EXCLUDE;
                } else {
                    // Remote players: view sprites and screen effects
                    // are not this client's business.
                    flags &= !PlayerFlags::NONCAMERA_EXCLUDE;
                }
            }
            kind if kind.is_sound() => {
                let distance = rate::delta_distance(incoming, &self.owner_info, world);
                if distance > rate::max_sound_distance(incoming, config) {
                    trace!(
                        owner = self.owner,
                        id = incoming.id,
                        distance,
                        "sound delta out of range, dropped"
                    );
                    return 0;
                }
            }
            _ => {}
        }

        flags
    }

    /// Adds a freshly generated delta to the pool.
    ///
    /// Subtracts its flags from every matching UNACKED entry (removing
    /// entries that become void), then merges it into the matching NEW
    /// entry or stores a copy at the bucket tail.
    pub fn add_delta(&mut self, incoming: &Delta, world: &World, config: &ReplicationConfig) {
        let flags = self.excluded_flags(incoming, world, config);
        if flags == 0 {
            // No data remains for this client.
            return;
        }

        let mut delta = *incoming;
        delta.flags = flags;

        let bucket = Self::bucket_of(delta.id);
        let mut existing_new: Option<DeltaHandle> = None;

        // Entries may be removed mid-walk; iterate over a snapshot of
        // the bucket rather than the live list.
        let handles: Vec<DeltaHandle> = self.buckets[bucket].clone();
        for handle in handles {
            let Some(entry) = self.store.get_mut(handle) else {
                continue;
            };
            if !entry.is_same(&delta) {
                continue;
            }
            match entry.state {
                DeltaState::New => {
                    existing_new = Some(handle);
                }
                DeltaState::Unacked => {
                    // Sound deltas are events, not field sets: an
                    // in-flight Start must stay on record so a Stop
                    // for the same source waits for its ack.
                    if delta.is_sound() {
                        continue;
                    }
                    // The new data overrides whatever is in flight; a
                    // resend must not carry obsolete fields.
                    entry.subtract(&delta);
                    let void = entry.is_void();
                    if void {
                        self.remove(handle);
                    }
                }
            }
        }

        if let Some(handle) = existing_new {
            let annihilated = match self.store.get_mut(handle) {
                Some(target) => !target.merge(&delta),
                None => false,
            };
            if annihilated {
                self.remove(handle);
            }
        } else {
            let handle = self.store.insert(delta);
            self.buckets[bucket].push(handle);
        }
    }

    /// Removes a delta from the pool.
    pub fn remove(&mut self, handle: DeltaHandle) {
        if let Some(delta) = self.store.remove(handle) {
            let bucket = Self::bucket_of(delta.id);
            if let Some(pos) = self.buckets[bucket].iter().position(|&h| h == handle) {
                self.buckets[bucket].remove(pos);
            }
        }
    }

    /// Looks up a delta by handle.
    #[must_use]
    pub fn delta(&self, handle: DeltaHandle) -> Option<&Delta> {
        self.store.get(handle)
    }

    /// Iterates over every delta in the pool.
    pub fn iter(&self) -> impl Iterator<Item = (DeltaHandle, &Delta)> {
        self.store.iter()
    }

    /// Number of deltas in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the pool holds no deltas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The pool's missile records.
    #[must_use]
    pub fn missiles(&self) -> &MissileRecords {
        &self.missiles
    }

    /// Drops all NEW object deltas for a predictably removed object,
    /// along with its missile record. The client performs the same
    /// removal on its own, so nothing needs to travel.
    pub fn object_removed(&mut self, id: ObjectId) {
        let bucket = Self::bucket_of(id.0);
        let handles: Vec<DeltaHandle> = self.buckets[bucket].clone();
        for handle in handles {
            let Some(entry) = self.store.get(handle) else {
                continue;
            };
            if entry.state == DeltaState::New
                && entry.kind == DeltaKind::Object
                && entry.id == id.0
            {
                self.remove(handle);
            }
        }
        self.missiles.remove(id);
    }

    /// True if the delta must wait for a later frame.
    ///
    /// UNACKED deltas wait out the ack threshold; a NEW Stop-sound
    /// waits while a Start for the same source is still unconfirmed,
    /// preserving start-before-stop across unordered acks.
    #[must_use]
    pub fn is_postponed(&self, delta: &Delta, now: u32) -> bool {
        match delta.state {
            DeltaState::Unacked => delta.age(now) < self.owner_info.ack_threshold,
            DeltaState::New => {
                if !delta.is_stop_sound() {
                    return false;
                }
                self.buckets[Self::bucket_of(delta.id)].iter().any(|&handle| {
                    self.store.get(handle).is_some_and(|entry| {
                        entry.state == DeltaState::Unacked
                            && entry.is_same(delta)
                            && entry.is_start_sound()
                    })
                })
            }
        }
    }

    /// Rates every delta and rebuilds the priority queue.
    pub fn rate(
        &mut self,
        world: &World,
        config: &ReplicationConfig,
        base_scores: &[f32; DeltaKind::COUNT],
        now: u32,
    ) {
        self.queue.clear();
        let handles: Vec<DeltaHandle> = self.store.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            let Some(&delta) = self.store.get(handle) else {
                continue;
            };
            if self.is_postponed(&delta, now) {
                continue;
            }
            let score = rate::score_delta(&delta, &self.owner_info, world, config, base_scores, now);
            if let Some(entry) = self.store.get_mut(handle) {
                entry.score = score;
            }
            if score > 0.0 {
                self.queue.insert(handle, score);
            }
        }
    }

    /// Extracts the highest-priority delta queued by the last rating.
    pub fn queue_extract(&mut self) -> Option<DeltaHandle> {
        self.queue.extract()
    }

    /// Number of deltas in the priority queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Transitions a delta into the in-flight state.
    ///
    /// A NEW delta joins the current transmission set; an UNACKED one
    /// is being retried and receives a fresh resend id instead. Either
    /// way the timestamp restarts the resend clock.
    pub fn mark_for_transmission(&mut self, handle: DeltaHandle, now: u32) {
        let set = self.set_dealer;
        let Some(delta) = self.store.get_mut(handle) else {
            return;
        };
        match delta.state {
            DeltaState::New => {
                delta.state = DeltaState::Unacked;
                delta.set = set;
                delta.resend = 0;
                delta.timestamp = now;
            }
            DeltaState::Unacked => {
                if self.resend_dealer == 0 {
                    self.resend_dealer = 1;
                }
                delta.resend = self.resend_dealer;
                self.resend_dealer = self.resend_dealer.wrapping_add(1);
                delta.timestamp = now;
            }
        }
    }

    /// Closes the current transmission set after a frame is built.
    pub fn end_frame(&mut self) {
        self.set_dealer = self.set_dealer.wrapping_add(1);
        self.is_first = false;
    }

    /// Removes every UNACKED delta confirmed by the client.
    ///
    /// `resend` nonzero acknowledges a retransmission by resend id and
    /// ignores `set`. Acking a missile Create puts the missile on
    /// record for extrapolation elision.
    pub fn acknowledge(&mut self, set: u8, resend: u8) {
        let handles: Vec<DeltaHandle> = self.store.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            let Some(&delta) = self.store.get(handle) else {
                continue;
            };
            if delta.state != DeltaState::Unacked {
                continue;
            }
            let matches = if resend != 0 {
                delta.resend == resend
            } else {
                delta.set == set
            };
            if !matches {
                continue;
            }

            if delta.is_create_object() {
                if let DeltaPayload::Object(payload) = &delta.payload {
                    if payload.engine_flags & GameObject::FLAG_MISSILE != 0 {
                        // Creates always carry the full field set, so
                        // the record sees valid flight parameters.
                        self.missiles.insert(&delta);
                    }
                }
            }

            self.remove(handle);
        }
    }

    /// Counts deltas awaiting acknowledgement.
    #[must_use]
    pub fn count_unacked(&self) -> usize {
        self.store
            .iter()
            .filter(|(_, delta)| delta.state == DeltaState::Unacked)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{SoundFlags, SoundPayload};
    use crate::rate::base_scores;
    use crate::register::RegisteredObject;
    use bytemuck::Zeroable;

    fn world() -> World {
        World::new()
    }

    fn config() -> ReplicationConfig {
        ReplicationConfig::default()
    }

    fn object_delta(id: u32, flags: u32) -> Delta {
        let mut payload = RegisteredObject::zeroed();
        payload.id = ObjectId(id);
        payload.radius = 20.0;
        payload.height = 20.0;
        let mut d = Delta::new(DeltaKind::Object, id, 0, DeltaPayload::Object(payload));
        d.flags = flags;
        d
    }

    fn missile_delta(id: u32, flags: u32) -> Delta {
        let mut d = object_delta(id, flags);
        if let DeltaPayload::Object(payload) = &mut d.payload {
            payload.engine_flags |= GameObject::FLAG_MISSILE;
            payload.mom = [8.0, 0.0, 0.0];
        }
        d
    }

    fn sound_delta(id: u32, volume: f32) -> Delta {
        let mut d = Delta::new(
            DeltaKind::ObjectSound,
            id,
            0,
            DeltaPayload::Sound(SoundPayload {
                sound: 3,
                emitter: ObjectId(id),
                volume,
            }),
        );
        d.flags = SoundFlags::VOLUME;
        d
    }

    fn new_handles(pool: &Pool) -> Vec<DeltaHandle> {
        pool.iter()
            .filter(|(_, d)| d.state == DeltaState::New)
            .map(|(h, _)| h)
            .collect()
    }

    #[test]
    fn test_add_stores_copy() {
        let mut pool = Pool::new(0);
        pool.add_delta(&object_delta(5, ObjectFlags::ANGLE), &world(), &config());
        assert_eq!(pool.len(), 1);
        let (_, stored) = pool.iter().next().unwrap();
        assert_eq!(stored.flags, ObjectFlags::ANGLE);
        assert_eq!(stored.state, DeltaState::New);
    }

    #[test]
    fn test_single_new_delta_per_entity() {
        let mut pool = Pool::new(0);
        pool.add_delta(&object_delta(5, ObjectFlags::ANGLE), &world(), &config());
        pool.add_delta(&object_delta(5, ObjectFlags::HEALTH), &world(), &config());
        assert_eq!(pool.len(), 1, "colliding NEW deltas must merge");
        let (_, stored) = pool.iter().next().unwrap();
        assert_eq!(stored.flags, ObjectFlags::ANGLE | ObjectFlags::HEALTH);
    }

    #[test]
    fn test_subtract_voids_unacked() {
        let mut pool = Pool::new(0);
        let flags = ObjectFlags::ORIGIN_X | ObjectFlags::MOM_X;
        pool.add_delta(&object_delta(50, flags), &world(), &config());

        // Transmit it so it sits UNACKED.
        let handle = new_handles(&pool)[0];
        pool.mark_for_transmission(handle, 0);
        assert_eq!(pool.count_unacked(), 1);

        // The same fields change again.
        pool.add_delta(&object_delta(50, flags), &world(), &config());

        // The in-flight delta became void and was removed; one NEW
        // delta carries the fresh data.
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.count_unacked(), 0);
        let (_, stored) = pool.iter().next().unwrap();
        assert_eq!(stored.state, DeltaState::New);
        assert_eq!(stored.flags, flags);
    }

    #[test]
    fn test_partial_subtract_keeps_unacked() {
        let mut pool = Pool::new(0);
        pool.add_delta(
            &object_delta(50, ObjectFlags::ORIGIN_X | ObjectFlags::HEALTH),
            &world(),
            &config(),
        );
        let handle = new_handles(&pool)[0];
        pool.mark_for_transmission(handle, 0);

        pool.add_delta(&object_delta(50, ObjectFlags::ORIGIN_X), &world(), &config());

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.count_unacked(), 1);
        let unacked = pool
            .iter()
            .find(|(_, d)| d.state == DeltaState::Unacked)
            .map(|(_, d)| d.flags);
        assert_eq!(unacked, Some(ObjectFlags::HEALTH));
    }

    #[test]
    fn test_create_null_annihilation() {
        let mut pool = Pool::new(0);
        pool.add_delta(
            &object_delta(
                100,
                ObjectFlags::CREATE | ObjectFlags::EVERYTHING | ObjectFlags::TYPE,
            ),
            &world(),
            &config(),
        );
        pool.add_delta(&object_delta(100, ObjectFlags::NULL), &world(), &config());
        assert!(pool.is_empty(), "Create + Null must cancel completely");
    }

    #[test]
    fn test_camera_exclusion_for_owner_object() {
        let mut w = World::new();
        let id = w.objects.spawn(GameObject::default());
        w.join_player(0, id);

        let mut pool = Pool::new(0);
        pool.add_delta(
            &object_delta(id.0, ObjectFlags::ORIGIN | ObjectFlags::MOM | ObjectFlags::ANGLE),
            &w,
            &config(),
        );
        assert!(pool.is_empty(), "camera-owned fields must not replicate");

        pool.add_delta(
            &object_delta(id.0, ObjectFlags::ORIGIN | ObjectFlags::HEALTH),
            &w,
            &config(),
        );
        let (_, stored) = pool.iter().next().unwrap();
        assert_eq!(stored.flags, ObjectFlags::HEALTH);
    }

    #[test]
    fn test_remote_player_psprites_excluded() {
        let mut pool = Pool::new(0);
        let mut delta = Delta::new(
            DeltaKind::Player,
            3,
            0,
            DeltaPayload::Player(crate::register::RegisteredPlayer::default()),
        );
        delta.flags = PlayerFlags::PSPRITES | PlayerFlags::FILTER | PlayerFlags::FRICTION;
        pool.add_delta(&delta, &world(), &config());

        let (_, stored) = pool.iter().next().unwrap();
        assert_eq!(stored.flags, PlayerFlags::FRICTION);
    }

    #[test]
    fn test_sound_distance_gate() {
        let mut w = World::new();
        let owner = w.objects.spawn(GameObject::default());
        w.join_player(0, owner);
        let emitter = w.objects.spawn(GameObject {
            origin: [900.0, 900.0, 0.0],
            ..GameObject::default()
        });

        let mut cfg = ReplicationConfig::default();
        cfg.sound_max_distance = 1000.0;

        let mut pool = Pool::new(0);
        pool.owner_info = OwnerInfo::capture(&w, 0, &cfg);

        // Volume 0.5 halves the audible range; the emitter is too far.
        pool.add_delta(&sound_delta(emitter.0, 0.5), &w, &cfg);
        assert!(pool.is_empty());

        // A stop for the same source is heard everywhere.
        pool.add_delta(&sound_delta(emitter.0, 0.0), &w, &cfg);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_stop_sound_postponed_behind_unacked_start() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();

        pool.add_delta(&sound_delta(7, 1.0), &w, &cfg);
        let start = new_handles(&pool)[0];
        pool.mark_for_transmission(start, 0);

        pool.add_delta(&sound_delta(7, 0.0), &w, &cfg);

        pool.rate(&w, &cfg, &base_scores(), 0);
        assert_eq!(pool.queue_len(), 0, "stop must wait for the start's ack");

        // Ack the start; the stop becomes eligible.
        pool.acknowledge(0, 0);
        pool.end_frame();
        pool.rate(&w, &cfg, &base_scores(), 0);
        assert_eq!(pool.queue_len(), 1);
    }

    #[test]
    fn test_unacked_within_threshold_postponed() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();
        pool.owner_info.ack_threshold = 500;

        pool.add_delta(&object_delta(5, ObjectFlags::ANGLE), &w, &cfg);
        let handle = new_handles(&pool)[0];
        pool.mark_for_transmission(handle, 1000);

        pool.rate(&w, &cfg, &base_scores(), 1200);
        assert_eq!(pool.queue_len(), 0, "ack may still be in flight");

        pool.rate(&w, &cfg, &base_scores(), 1600);
        assert_eq!(pool.queue_len(), 1, "past the threshold it is retried");
    }

    #[test]
    fn test_ack_by_set_and_resend() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();

        pool.add_delta(&object_delta(1, ObjectFlags::ANGLE), &w, &cfg);
        pool.add_delta(&object_delta(2, ObjectFlags::ANGLE), &w, &cfg);
        for handle in new_handles(&pool) {
            pool.mark_for_transmission(handle, 0);
        }
        pool.end_frame();
        assert_eq!(pool.count_unacked(), 2);

        // Retry one of them; it gets a resend id.
        pool.rate(&w, &cfg, &base_scores(), 10);
        let retry = pool.queue_extract().unwrap();
        pool.mark_for_transmission(retry, 10);
        let resend_id = pool.delta(retry).unwrap().resend;
        assert_ne!(resend_id, 0);

        // Ack the retry by resend id.
        pool.acknowledge(0, resend_id);
        assert_eq!(pool.count_unacked(), 1);

        // Ack the rest by set.
        pool.acknowledge(0, 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_ack_of_missile_create_inserts_record() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();

        pool.add_delta(
            &missile_delta(
                9,
                ObjectFlags::CREATE | ObjectFlags::EVERYTHING | ObjectFlags::TYPE,
            ),
            &w,
            &cfg,
        );
        let handle = new_handles(&pool)[0];
        pool.mark_for_transmission(handle, 0);
        pool.acknowledge(0, 0);

        assert!(pool.is_empty());
        assert_eq!(pool.missiles().len(), 1);

        // Follow-up ballistic updates lose their origin bits.
        pool.add_delta(&missile_delta(9, ObjectFlags::ORIGIN), &w, &cfg);
        assert!(pool.is_empty());

        // A course change goes through whole.
        pool.add_delta(
            &missile_delta(9, ObjectFlags::ORIGIN | ObjectFlags::MOM_X),
            &w,
            &cfg,
        );
        assert_eq!(pool.len(), 1);

        // The missile's removal also drops the record.
        pool.add_delta(&missile_delta(9, ObjectFlags::NULL), &w, &cfg);
        assert!(pool.missiles().is_empty());
    }

    #[test]
    fn test_object_removed_drops_new_only() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();

        pool.add_delta(&object_delta(4, ObjectFlags::ANGLE), &w, &cfg);
        let handle = new_handles(&pool)[0];
        pool.mark_for_transmission(handle, 0);
        pool.add_delta(&object_delta(4, ObjectFlags::HEALTH), &w, &cfg);

        pool.object_removed(ObjectId(4));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.count_unacked(), 1);
    }

    #[test]
    fn test_drain_and_reset() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();
        pool.add_delta(&object_delta(4, ObjectFlags::ANGLE), &w, &cfg);
        pool.end_frame();
        assert!(!pool.is_first());

        pool.reset_for_map();
        assert!(pool.is_empty());
        assert!(pool.is_first());
        assert_eq!(pool.count_unacked(), 0);
    }

    #[test]
    fn test_rate_orders_by_score() {
        let mut pool = Pool::new(0);
        let w = world();
        let cfg = config();

        // An old delta outranks an identical fresh one.
        let mut old = object_delta(1, ObjectFlags::ANGLE);
        old.timestamp = 0;
        let mut fresh = object_delta(2, ObjectFlags::ANGLE);
        fresh.timestamp = 5000;
        pool.add_delta(&fresh, &w, &cfg);
        pool.add_delta(&old, &w, &cfg);

        pool.rate(&w, &cfg, &base_scores(), 5000);
        let first = pool.queue_extract().unwrap();
        assert_eq!(pool.delta(first).unwrap().id, 1);
    }
}
