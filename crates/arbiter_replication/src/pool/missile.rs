//! # Missile Records
//!
//! A missile's flight is fully determined by its creation origin and
//! momentum, so once a client has acknowledged the Create delta it can
//! extrapolate the position on its own. The record remembers the
//! create-time values; while it exists, pure position updates for the
//! missile are stripped before they reach the pool.
//!
//! A momentum change breaks the extrapolation, so such deltas pass
//! through untouched. The record dies with the missile.

use arbiter_world::ObjectId;

use crate::delta::{Delta, DeltaPayload, ObjectFlags};

const MISSILE_HASH_SIZE: usize = 256;
const MISSILE_HASH_MASK: u32 = 0xff;

/// Create-time flight parameters of one acknowledged missile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MissileRecord {
    /// Missile object id.
    pub id: ObjectId,
    /// Origin when the Create delta was acknowledged.
    pub origin: [f64; 3],
    /// Momentum when the Create delta was acknowledged.
    pub mom: [f64; 3],
}

/// Id-hashed set of missile records, one per pool.
#[derive(Debug)]
pub struct MissileRecords {
    buckets: Vec<Vec<MissileRecord>>,
}

impl MissileRecords {
    /// Creates an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: (0..MISSILE_HASH_SIZE).map(|_| Vec::new()).collect(),
        }
    }

    #[inline]
    fn bucket_of(id: ObjectId) -> usize {
        (id.0 & MISSILE_HASH_MASK) as usize
    }

    /// Records a missile from its acknowledged Create delta.
    pub fn insert(&mut self, delta: &Delta) {
        let DeltaPayload::Object(payload) = &delta.payload else {
            return;
        };
        let id = ObjectId(delta.id);
        let record = MissileRecord {
            id,
            origin: payload.origin,
            mom: payload.mom,
        };
        let bucket = &mut self.buckets[Self::bucket_of(id)];
        if let Some(existing) = bucket.iter_mut().find(|r| r.id == id) {
            *existing = record;
        } else {
            bucket.push(record);
        }
    }

    /// Looks up a record.
    #[must_use]
    pub fn find(&self, id: ObjectId) -> Option<&MissileRecord> {
        self.buckets[Self::bucket_of(id)].iter().find(|r| r.id == id)
    }

    /// Removes the record for a dead missile. Returns true if found.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let bucket = &mut self.buckets[Self::bucket_of(id)];
        let Some(pos) = bucket.iter().position(|r| r.id == id) else {
            return false;
        };
        bucket.remove(pos);
        true
    }

    /// Flag bits of `delta` the client can recover by extrapolation.
    ///
    /// Origin bits are excluded while a record exists and the delta
    /// leaves the momentum alone; a course change must travel whole.
    #[must_use]
    pub fn check(&self, delta: &Delta) -> u32 {
        if self.find(ObjectId(delta.id)).is_none() {
            return 0;
        }
        if delta.flags & ObjectFlags::MOM != 0 {
            return 0;
        }
        ObjectFlags::ORIGIN
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns true if no records exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

impl Default for MissileRecords {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::DeltaKind;
    use crate::register::RegisteredObject;
    use bytemuck::Zeroable;

    fn missile_delta(id: u32, flags: u32, mom: [f64; 3]) -> Delta {
        let mut payload = RegisteredObject::zeroed();
        payload.id = ObjectId(id);
        payload.origin = [100.0, 200.0, 32.0];
        payload.mom = mom;
        let mut d = Delta::new(DeltaKind::Object, id, 0, DeltaPayload::Object(payload));
        d.flags = flags;
        d
    }

    #[test]
    fn test_insert_and_remove() {
        let mut records = MissileRecords::new();
        let create = missile_delta(7, ObjectFlags::CREATE | ObjectFlags::EVERYTHING, [8.0, 0.0, 0.0]);
        records.insert(&create);
        assert_eq!(records.len(), 1);
        assert_eq!(records.find(ObjectId(7)).map(|r| r.mom[0]), Some(8.0));

        assert!(records.remove(ObjectId(7)));
        assert!(!records.remove(ObjectId(7)));
        assert!(records.is_empty());
    }

    #[test]
    fn test_check_excludes_origin_for_ballistic_updates() {
        let mut records = MissileRecords::new();
        records.insert(&missile_delta(
            7,
            ObjectFlags::CREATE | ObjectFlags::EVERYTHING,
            [8.0, 0.0, 0.0],
        ));

        let update = missile_delta(7, ObjectFlags::ORIGIN, [8.0, 0.0, 0.0]);
        assert_eq!(records.check(&update), ObjectFlags::ORIGIN);
    }

    #[test]
    fn test_check_passes_course_changes_through() {
        let mut records = MissileRecords::new();
        records.insert(&missile_delta(
            7,
            ObjectFlags::CREATE | ObjectFlags::EVERYTHING,
            [8.0, 0.0, 0.0],
        ));

        let veer = missile_delta(7, ObjectFlags::ORIGIN | ObjectFlags::MOM_X, [2.0, 0.0, 0.0]);
        assert_eq!(records.check(&veer), 0);
    }

    #[test]
    fn test_check_without_record() {
        let records = MissileRecords::new();
        let update = missile_delta(9, ObjectFlags::ORIGIN, [0.0; 3]);
        assert_eq!(records.check(&update), 0);
    }
}
