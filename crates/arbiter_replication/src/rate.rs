//! # Delta Rating
//!
//! Assigns every pending delta a priority score for the next frame:
//!
//! ```text
//! score = base[kind] / distance^2
//!       * (1 + age_ms / doubling_period_ms)
//!       * content bonuses
//! ```
//!
//! Distance uses the game's weighted approximation; age pressure makes
//! sure nothing starves; bonuses push creations, movement and plane
//! motion ahead of cosmetics. Sounds age on a 1 ms doubling period so
//! they rocket up the queue.

use arbiter_world::{approx_distance, approx_distance_3, GameObject, World, COORD_MAX, COORD_MIN};

use crate::config::ReplicationConfig;
use crate::delta::{
    Delta, DeltaKind, DeltaPayload, ObjectFlags, PlayerFlags, PolyFlags, SectorFlags, SoundFlags,
};
use crate::register::RegisteredObject;

/// Score given to delta kinds without a tuned base score.
pub const DEFAULT_BASE_SCORE: f32 = 10_000.0;

/// Seeds the kind-indexed base score table.
#[must_use]
pub fn base_scores() -> [f32; DeltaKind::COUNT] {
    let mut scores = [DEFAULT_BASE_SCORE; DeltaKind::COUNT];
    scores[DeltaKind::Object.index()] = 1000.0;
    scores[DeltaKind::Player.index()] = 1000.0;
    scores[DeltaKind::Sector.index()] = 2000.0;
    scores[DeltaKind::Side.index()] = 800.0;
    scores[DeltaKind::Polyobject.index()] = 2000.0;
    scores[DeltaKind::Sound.index()] = 2000.0;
    scores[DeltaKind::ObjectSound.index()] = 3000.0;
    scores[DeltaKind::SectorSound.index()] = 5000.0;
    scores[DeltaKind::SideSound.index()] = 5500.0;
    scores[DeltaKind::PolyobjectSound.index()] = 5000.0;
    scores
}

/// Cached view of a pool owner's situation, refreshed before each
/// generation pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct OwnerInfo {
    /// Origin of the owner's camera object, or zeros without one.
    pub origin: [f64; 3],
    /// Facing angle of the camera object.
    pub angle: u32,
    /// Approximate planar speed of the camera object.
    pub speed: f64,
    /// Milliseconds before an UNACKED delta is reconsidered.
    /// 0 means every rate pass reconsiders it.
    pub ack_threshold: u32,
}

impl OwnerInfo {
    /// Rebuilds the info from the owner's live object.
    #[must_use]
    pub fn capture(world: &World, owner: usize, config: &ReplicationConfig) -> Self {
        let mut info = Self {
            ack_threshold: config.ack_threshold_ms,
            ..Self::default()
        };
        if let Some(object) = world.player_object(owner) {
            info.origin = object.origin;
            info.angle = object.angle;
            info.speed = approx_distance(object.mom[0], object.mom[1]);
        }
        info
    }
}

/// Distance beyond which a sound delta is not worth sending.
///
/// Volume shortens the audible range; silencing has no range at all -
/// a Stop must reach everyone who might have the sound playing.
#[must_use]
pub fn max_sound_distance(delta: &Delta, config: &ReplicationConfig) -> f64 {
    let mut volume = 1.0_f32;
    if delta.flags & SoundFlags::VOLUME != 0 {
        if let DeltaPayload::Sound(sound) = &delta.payload {
            volume = sound.volume;
        }
    }
    if volume <= 0.0 {
        return f64::MAX;
    }
    f64::from(volume) * config.sound_max_distance
}

fn registered_object_distance(payload: &RegisteredObject, info: &OwnerInfo) -> f64 {
    // Registered z may hold a floor/ceiling sentinel.
    let mut z = payload.origin[2];
    if z == COORD_MIN {
        z = payload.floor_z;
    }
    if z == COORD_MAX {
        z = payload.ceiling_z - payload.height;
    }
    approx_distance_3(
        info.origin[0] - payload.origin[0],
        info.origin[1] - payload.origin[1],
        (info.origin[2] - z + payload.height / 2.0) * 1.2,
    )
}

fn live_object_distance(object: &GameObject, info: &OwnerInfo) -> f64 {
    approx_distance_3(
        info.origin[0] - object.origin[0],
        info.origin[1] - object.origin[1],
        (info.origin[2] - object.origin[2] + object.height / 2.0) * 1.2,
    )
}

fn emitter_distance(origin: [f64; 3], info: &OwnerInfo) -> f64 {
    approx_distance_3(
        info.origin[0] - origin[0],
        info.origin[1] - origin[1],
        (info.origin[2] - origin[2]) * 1.2,
    )
}

/// Distance from the pool owner to the delta's entity.
///
/// Entities that cannot be located (already destroyed, index beyond
/// the current map) rate as infinitely far, which keeps them out of
/// frames without special cases.
#[must_use]
pub fn delta_distance(delta: &Delta, info: &OwnerInfo, world: &World) -> f64 {
    match delta.kind {
        DeltaKind::Object => {
            // The registered position; may be somewhat stale for
            // old unacked data, which is fine for a priority.
            match &delta.payload {
                DeltaPayload::Object(payload) => registered_object_distance(payload, info),
                _ => 1.0,
            }
        }
        DeltaKind::Player => world
            .player_object(delta.id as usize)
            .map_or(1.0, |object| live_object_distance(object, info)),
        DeltaKind::Sector | DeltaKind::SectorSound => world
            .map
            .sectors
            .get(delta.id as usize)
            .map_or(f64::MAX, |sector| emitter_distance(sector.emitter_origin, info)),
        DeltaKind::Side => world.map.sides.get(delta.id as usize).map_or(f64::MAX, |side| {
            approx_distance(
                info.origin[0] - side.line_center[0],
                info.origin[1] - side.line_center[1],
            )
        }),
        DeltaKind::SideSound => world.map.sides.get(delta.id as usize).map_or(f64::MAX, |side| {
            let section = if delta.flags & SoundFlags::SIDE_MIDDLE != 0 {
                &side.middle
            } else if delta.flags & SoundFlags::SIDE_TOP != 0 {
                &side.top
            } else {
                &side.bottom
            };
            emitter_distance(section.emitter_origin, info)
        }),
        DeltaKind::Polyobject | DeltaKind::PolyobjectSound => world
            .map
            .polyobjs
            .get(delta.id as usize)
            .map_or(f64::MAX, |poly| {
                approx_distance(info.origin[0] - poly.origin[0], info.origin[1] - poly.origin[1])
            }),
        DeltaKind::ObjectSound => match &delta.payload {
            DeltaPayload::Sound(sound) => world
                .objects
                .get(sound.emitter)
                .map_or(f64::MAX, |object| live_object_distance(object, info)),
            _ => f64::MAX,
        },
        DeltaKind::Sound => 1.0,
    }
}

/// Scores a delta for the coming frame. Non-positive scores exclude
/// the delta.
#[must_use]
pub fn score_delta(
    delta: &Delta,
    info: &OwnerInfo,
    world: &World,
    config: &ReplicationConfig,
    base_scores: &[f32; DeltaKind::COUNT],
    now: u32,
) -> f32 {
    let distance = delta_distance(delta, info, world).max(1.0);
    let mut score = f64::from(base_scores[delta.kind.index()]) / (distance * distance);

    let doubling = if delta.is_sound() {
        config.sound_age_double_ms
    } else {
        config.age_double_ms
    }
    .max(1);
    score *= 1.0 + f64::from(delta.age(now)) / f64::from(doubling);

    let df = delta.flags;
    match delta.kind {
        DeltaKind::Object => {
            if let DeltaPayload::Object(payload) = &delta.payload {
                // Seeing new objects is interesting.
                if df & ObjectFlags::CREATE != 0 {
                    score *= 1.5;
                }
                // Position changes are important.
                if df & (ObjectFlags::ORIGIN_X | ObjectFlags::ORIGIN_Y) != 0 {
                    score *= 1.2;
                }
                // Small objects matter less, large ones more.
                let size = payload.radius.max(payload.height);
                if size < 16.0 {
                    score *= size.max(2.0) / 16.0;
                } else if size > 50.0 {
                    score *= size / 50.0;
                }
            }
        }
        DeltaKind::Player => {
            // Knowing the player's object is quite important.
            if df & PlayerFlags::OWNER_OBJECT != 0 {
                score *= 2.0;
            }
        }
        DeltaKind::Sector => {
            // Light changes are very noticeable.
            if df & SectorFlags::LIGHT != 0 {
                score *= 1.2;
            }
            // Plane movement can be seen from far away.
            if df & SectorFlags::PLANE_MOTION != 0 {
                score *= 3.0;
            }
        }
        DeltaKind::Polyobject => {
            if df & PolyFlags::SPEED != 0 {
                score *= 1.2;
            }
        }
        _ => {}
    }

    score as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::SoundPayload;
    use arbiter_world::{Map, ObjectId, Sector};
    use bytemuck::Zeroable;

    fn object_delta(id: u32, flags: u32, origin: [f64; 3]) -> Delta {
        let mut payload = RegisteredObject::zeroed();
        payload.id = ObjectId(id);
        payload.origin = origin;
        payload.radius = 20.0;
        payload.height = 20.0;
        let mut d = Delta::new(DeltaKind::Object, id, 0, DeltaPayload::Object(payload));
        d.flags = flags;
        d
    }

    fn sound_delta(kind: DeltaKind, id: u32, volume: f32) -> Delta {
        let mut d = Delta::new(
            kind,
            id,
            0,
            DeltaPayload::Sound(SoundPayload {
                sound: 1,
                emitter: ObjectId(id),
                volume,
            }),
        );
        d.flags = SoundFlags::VOLUME;
        d
    }

    #[test]
    fn test_base_scores_table() {
        let scores = base_scores();
        assert_eq!(scores[DeltaKind::Side.index()], 800.0);
        assert_eq!(scores[DeltaKind::SideSound.index()], 5500.0);
    }

    #[test]
    fn test_nearby_scores_higher() {
        let world = World::new();
        let config = ReplicationConfig::default();
        let scores = base_scores();
        let info = OwnerInfo::default();

        let near = object_delta(1, ObjectFlags::ANGLE, [10.0, 0.0, 0.0]);
        let far = object_delta(2, ObjectFlags::ANGLE, [5000.0, 0.0, 0.0]);
        let near_score = score_delta(&near, &info, &world, &config, &scores, 0);
        let far_score = score_delta(&far, &info, &world, &config, &scores, 0);
        assert!(near_score > far_score);
    }

    #[test]
    fn test_age_raises_score() {
        let world = World::new();
        let config = ReplicationConfig::default();
        let scores = base_scores();
        let info = OwnerInfo::default();

        let delta = object_delta(1, ObjectFlags::ANGLE, [100.0, 0.0, 0.0]);
        let fresh = score_delta(&delta, &info, &world, &config, &scores, 0);
        let aged = score_delta(&delta, &info, &world, &config, &scores, 2000);
        assert!(aged > 2.5 * fresh);
    }

    #[test]
    fn test_create_bonus() {
        let world = World::new();
        let config = ReplicationConfig::default();
        let scores = base_scores();
        let info = OwnerInfo::default();

        let plain = object_delta(1, ObjectFlags::HEALTH, [100.0, 0.0, 0.0]);
        let create = object_delta(
            1,
            ObjectFlags::CREATE | ObjectFlags::HEALTH,
            [100.0, 0.0, 0.0],
        );
        let plain_score = score_delta(&plain, &info, &world, &config, &scores, 0);
        let create_score = score_delta(&create, &info, &world, &config, &scores, 0);
        assert!((create_score / plain_score - 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_small_object_penalty() {
        let world = World::new();
        let config = ReplicationConfig::default();
        let scores = base_scores();
        let info = OwnerInfo::default();

        let mut small = object_delta(1, ObjectFlags::HEALTH, [100.0, 0.0, 0.0]);
        if let DeltaPayload::Object(o) = &mut small.payload {
            o.radius = 8.0;
            o.height = 8.0;
        }
        let normal = object_delta(2, ObjectFlags::HEALTH, [100.0, 0.0, 0.0]);
        let small_score = score_delta(&small, &info, &world, &config, &scores, 0);
        let normal_score = score_delta(&normal, &info, &world, &config, &scores, 0);
        assert!((small_score / normal_score - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_stop_sound_unbounded_range() {
        let config = ReplicationConfig::default();
        let stop = sound_delta(DeltaKind::ObjectSound, 1, 0.0);
        assert_eq!(max_sound_distance(&stop, &config), f64::MAX);

        let start = sound_delta(DeltaKind::ObjectSound, 1, 0.5);
        assert_eq!(max_sound_distance(&start, &config), 0.5 * config.sound_max_distance);
    }

    #[test]
    fn test_sector_distance_uses_emitter() {
        let mut map = Map::new();
        map.sectors.push(Sector {
            emitter_origin: [300.0, 0.0, 0.0],
            ..Sector::default()
        });
        let world = World::with_map(map);
        let info = OwnerInfo::default();

        let delta = sound_delta(DeltaKind::SectorSound, 0, 1.0);
        assert_eq!(delta_distance(&delta, &info, &world), 300.0);
    }

    #[test]
    fn test_missing_entity_is_infinitely_far() {
        let world = World::new();
        let info = OwnerInfo::default();
        let delta = sound_delta(DeltaKind::SectorSound, 9, 1.0);
        assert_eq!(delta_distance(&delta, &info, &world), f64::MAX);
    }

    #[test]
    fn test_registered_sentinel_z_substitution() {
        let info = OwnerInfo::default();
        let mut payload = RegisteredObject::zeroed();
        payload.origin = [0.0, 0.0, COORD_MIN];
        payload.floor_z = 0.0;
        payload.height = 0.0;
        // Sentinel z falls back to the floor height instead of -inf.
        let d = registered_object_distance(&payload, &info);
        assert!(d.is_finite());
    }

    #[test]
    fn test_owner_info_capture() {
        let mut world = World::new();
        let id = world.objects.spawn(GameObject {
            origin: [5.0, 6.0, 7.0],
            mom: [3.0, 4.0, 0.0],
            angle: 0x4000_0000,
            ..GameObject::default()
        });
        world.join_player(0, id);

        let config = ReplicationConfig::default();
        let info = OwnerInfo::capture(&world, 0, &config);
        assert_eq!(info.origin, [5.0, 6.0, 7.0]);
        assert_eq!(info.angle, 0x4000_0000);
        assert_eq!(info.speed, approx_distance(3.0, 4.0));
        assert_eq!(info.ack_threshold, 0);
    }
}
