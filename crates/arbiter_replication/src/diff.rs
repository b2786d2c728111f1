//! # Diff Generation
//!
//! Compares the live world against a register and feeds the resulting
//! deltas to a set of target pools. Six passes, in a fixed order:
//!
//! 1. Null pass - registered objects that no longer exist
//! 2. Object pass - every live, non-local object
//! 3. Player pass - every in-game player slot
//! 4. Sector pass - lighting, tints, materials, plane motion
//! 5. Side pass - a rolling partition of the side array
//! 6. Polyobject pass - motion parameters
//!
//! With `do_update` the register is rolled forward in the same sweep,
//! so an immediate second run emits nothing.

use tracing::{debug, trace};

use arbiter_world::{
    GameObject, GameRules, ObjectId, PlaneKind, SideSectionKind, World, MAX_PLAYERS,
};

use crate::config::ReplicationConfig;
use crate::delta::{
    Delta, DeltaKind, DeltaPayload, ObjectFlags, PlayerFlags, PolyFlags, SectorFlags, SideFlags,
    SoundFlags, SoundPayload,
};
use crate::pool::Pool;
use crate::rate::OwnerInfo;
use crate::register::{
    maxed_z, RegisteredObject, RegisteredPlayer, RegisteredPolyobject, RegisteredSector,
    RegisteredSide, WorldRegister,
};

/// Where a sound event originates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundSource {
    /// No positional source; heard everywhere.
    Global,
    /// A mobile object.
    Object(ObjectId),
    /// A sector, through its own emitter.
    Sector(usize),
    /// A specific plane of a sector.
    Plane {
        /// Sector index.
        sector: usize,
        /// Which plane emits.
        plane: PlaneKind,
    },
    /// A side surface section.
    SideSection {
        /// Side index.
        side: usize,
        /// Which section emits.
        section: SideSectionKind,
    },
    /// A polyobject.
    Polyobject(usize),
}

fn add_to_targets(
    delta: &Delta,
    pools: &mut [Pool],
    targets: &[usize],
    world: &World,
    config: &ReplicationConfig,
) {
    for &index in targets {
        pools[index].add_delta(delta, world, config);
    }
}

/// Compares one live object against the register.
///
/// Returns `None` for a void result, and also when the object's
/// animation chain has ended (`state == NONE`): the object is about to
/// disappear predictably and the next Null pass handles it.
pub fn compare_object(
    reg: &WorldRegister,
    object: &GameObject,
    rules: &dyn GameRules,
    now: u32,
) -> Option<Delta> {
    let sentinel = RegisteredObject::sentinel();
    let registered = reg.objects.find(object.id);
    let (r, mut df) = match registered {
        Some(r) => (r, 0u32),
        // Never seen: a full creation.
        None => (
            &sentinel,
            ObjectFlags::CREATE | ObjectFlags::EVERYTHING | ObjectFlags::TYPE,
        ),
    };

    if r.origin[0] != object.origin[0] {
        df |= ObjectFlags::ORIGIN_X;
    }
    if r.origin[1] != object.origin[1] {
        df |= ObjectFlags::ORIGIN_Y;
    }
    if r.origin[2] != maxed_z(object) || r.floor_z != object.floor_z || r.ceiling_z != object.ceiling_z
    {
        df |= ObjectFlags::ORIGIN_Z;
        if df & ObjectFlags::CREATE == 0 && object.origin[2] <= object.floor_z {
            // Resting on the floor: the client can place it on its own
            // floor and ignore the exact z.
            df |= ObjectFlags::ON_FLOOR;
        }
    }

    if r.mom[0] != object.mom[0] {
        df |= ObjectFlags::MOM_X;
    }
    if r.mom[1] != object.mom[1] {
        df |= ObjectFlags::MOM_Y;
    }
    if r.mom[2] != object.mom[2] {
        df |= ObjectFlags::MOM_Z;
    }

    if r.angle != object.angle {
        df |= ObjectFlags::ANGLE;
    }
    if r.selector != object.selector {
        df |= ObjectFlags::SELECTOR;
    }
    if r.translucency != object.translucency {
        df |= ObjectFlags::TRANSLUCENCY;
    }
    if r.fade_target != object.fade_target {
        df |= ObjectFlags::FADE_TARGET;
    }
    if r.type_id != object.type_id {
        df |= ObjectFlags::TYPE;
    }

    // State is replicated only across sequence boundaries; within a
    // sequence the client animates on its own.
    if registered.is_some() && !rules.same_state_sequence(object.state, r.state) {
        df |= ObjectFlags::STATE;
        if object.state.is_none() {
            // The chain ended; no comparison can be made and the
            // object will go away by itself.
            return None;
        }
    }

    if r.radius != object.radius {
        df |= ObjectFlags::RADIUS;
    }
    if r.height != object.height {
        df |= ObjectFlags::HEIGHT;
    }
    let pack = rules.pack_mask();
    if (r.engine_flags & pack) != (object.engine_flags & pack) || r.game_flags != object.game_flags
    {
        df |= ObjectFlags::FLAGS;
    }
    if r.health != object.health {
        df |= ObjectFlags::HEALTH;
    }
    if r.floor_clip != object.floor_clip {
        df |= ObjectFlags::FLOOR_CLIP;
    }

    if df == 0 {
        return None;
    }
    let mut delta = Delta::new(
        DeltaKind::Object,
        object.id.0,
        now,
        DeltaPayload::Object(RegisteredObject::capture(object)),
    );
    delta.flags = df;
    Some(delta)
}

/// Null pass: registered objects whose id is no longer live become
/// Null-object deltas carrying their last-known data.
fn null_pass(
    reg: &mut WorldRegister,
    world: &World,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
) {
    let dead: Vec<RegisteredObject> = reg
        .objects
        .iter()
        .filter(|r| !world.objects.contains(r.id))
        .copied()
        .collect();

    for record in dead {
        let mut delta = Delta::new(
            DeltaKind::Object,
            record.id.0,
            now,
            // Last-known data, so late joiners can still locate the
            // removal effect.
            DeltaPayload::Object(record),
        );
        delta.flags = ObjectFlags::NULL;
        add_to_targets(&delta, pools, targets, world, config);

        if do_update {
            reg.objects.remove(record.id);
        }
    }
}

fn object_pass(
    reg: &mut WorldRegister,
    world: &World,
    rules: &dyn GameRules,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
) {
    for object in world.objects.iter() {
        if object.is_local() {
            continue;
        }
        if let Some(delta) = compare_object(reg, object, rules, now) {
            add_to_targets(&delta, pools, targets, world, config);

            if do_update {
                *reg.objects.add_or_find(object.id) = RegisteredObject::capture(object);
            }
        }
    }
}

fn player_pass(
    reg: &mut WorldRegister,
    world: &World,
    rules: &dyn GameRules,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
) {
    for index in 0..MAX_PLAYERS {
        if !world.players[index].in_game {
            continue;
        }

        let candidate = RegisteredPlayer::capture(world, index, rules);
        let r = &reg.players[index];
        let mut df = 0u32;

        if r.object != candidate.object {
            df |= PlayerFlags::OWNER_OBJECT;
        }
        if r.forward_move != candidate.forward_move {
            df |= PlayerFlags::FORWARD_MOVE;
        }
        if r.side_move != candidate.side_move {
            df |= PlayerFlags::SIDE_MOVE;
        }
        if r.turn_delta != candidate.turn_delta {
            df |= PlayerFlags::TURN_DELTA;
        }
        if r.friction != candidate.friction {
            df |= PlayerFlags::FRICTION;
        }
        if r.extra_light != candidate.extra_light || r.fixed_color_map != candidate.fixed_color_map
        {
            df |= PlayerFlags::EXTRA_LIGHT;
        }
        if r.filter != candidate.filter {
            df |= PlayerFlags::FILTER;
        }

        if df != 0 {
            if do_update && df & PlayerFlags::OWNER_OBJECT != 0 {
                // The old object must forget its registration, or the
                // viewpoint exclusions applied while this player owned
                // it would shadow its rediscovery by everyone.
                let old = reg.players[index].object;
                if let Some(record) = reg.objects.find_mut(old) {
                    record.reset();
                }
            }

            let mut delta = Delta::new(
                DeltaKind::Player,
                index as u32,
                now,
                DeltaPayload::Player(candidate),
            );
            delta.flags = df;
            add_to_targets(&delta, pools, targets, world, config);
        }

        if do_update {
            reg.players[index] = candidate;
        }
    }
}

/// Compares one sector. Plane heights are tracked in the register even
/// when no delta fires, because clients interpolate moving planes.
fn compare_sector(
    reg: &mut WorldRegister,
    world: &World,
    index: usize,
    do_update: bool,
    now: u32,
    plane_skip_limit: f64,
) -> Option<Delta> {
    let sector = &world.map.sectors[index];
    let Some(r) = reg.sectors.get_mut(index) else {
        trace!(index, "sector index not in register, skipped");
        return None;
    };
    let mut df = 0u32;

    const FLOOR: PlaneKind = PlaneKind::Floor;
    const CEILING: PlaneKind = PlaneKind::Ceiling;

    if sector.floor.material != r.plane(FLOOR).material {
        df |= SectorFlags::FLOOR_MATERIAL;
    }
    if sector.ceiling.material != r.plane(CEILING).material {
        df |= SectorFlags::CEILING_MATERIAL;
    }
    if r.light_level != sector.light_level {
        df |= SectorFlags::LIGHT;
    }
    for c in 0..3 {
        if r.light_color[c] != sector.light_color[c] {
            df |= SectorFlags::COLOR_RED << c;
        }
        if r.plane(FLOOR).rgba[c] != sector.floor.rgba[c] {
            df |= SectorFlags::FLOOR_COLOR_RED << c;
        }
        if r.plane(CEILING).rgba[c] != sector.ceiling.rgba[c] {
            df |= SectorFlags::CEILING_COLOR_RED << c;
        }
    }

    // A height correction is needed when a resting plane sits at the
    // wrong height, or a moving plane has drifted past the skip limit
    // (the client interpolates small differences away itself).
    if r.plane(FLOOR).speed == 0.0 && sector.floor.speed == 0.0 {
        if r.plane(FLOOR).height != sector.floor.height {
            df |= SectorFlags::FLOOR_HEIGHT;
        }
    } else if (r.plane(FLOOR).height - sector.floor.height).abs() > plane_skip_limit {
        df |= SectorFlags::FLOOR_HEIGHT;
    }

    if r.plane(CEILING).speed == 0.0 && sector.ceiling.speed == 0.0 {
        if r.plane(CEILING).height != sector.ceiling.height {
            df |= SectorFlags::CEILING_HEIGHT;
        }
    } else if (r.plane(CEILING).height - sector.ceiling.height).abs() > plane_skip_limit {
        df |= SectorFlags::CEILING_HEIGHT;
    }

    // Target and speed always travel together.
    if r.plane(FLOOR).target != sector.floor.target {
        df |= SectorFlags::FLOOR_TARGET | SectorFlags::FLOOR_SPEED;
    }
    if r.plane(FLOOR).speed != sector.floor.speed {
        df |= SectorFlags::FLOOR_SPEED | SectorFlags::FLOOR_TARGET;
    }
    if r.plane(CEILING).target != sector.ceiling.target {
        df |= SectorFlags::CEILING_TARGET | SectorFlags::CEILING_SPEED;
    }
    if r.plane(CEILING).speed != sector.ceiling.speed {
        df |= SectorFlags::CEILING_SPEED | SectorFlags::CEILING_TARGET;
    }

    if df & (SectorFlags::CEILING_HEIGHT | SectorFlags::CEILING_SPEED | SectorFlags::CEILING_TARGET)
        != 0
    {
        debug!(index, target = sector.ceiling.target, "ceiling state change noted");
    }

    let mut result = None;
    if df != 0 {
        let mut delta = Delta::new(
            DeltaKind::Sector,
            index as u32,
            now,
            DeltaPayload::Sector(RegisteredSector::capture(sector)),
        );
        delta.flags = df;
        result = Some(delta);

        if do_update {
            *r = RegisteredSector::capture(sector);
        }
    }

    if do_update {
        // Heights are tracked regardless of the change flags.
        r.plane_mut(FLOOR).height = sector.floor.height;
        r.plane_mut(CEILING).height = sector.ceiling.height;
    }

    result
}

fn sector_pass(
    reg: &mut WorldRegister,
    world: &World,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
) {
    for index in 0..world.map.sectors.len() {
        if let Some(delta) =
            compare_sector(reg, world, index, do_update, now, config.plane_skip_limit)
        {
            add_to_targets(&delta, pools, targets, world, config);
        }
    }
}

/// Compares one side. Sections carrying an engine-injected fix
/// material are never diffed. Register updates are per field.
fn compare_side(
    reg: &mut WorldRegister,
    world: &World,
    index: usize,
    do_update: bool,
    now: u32,
) -> Option<Delta> {
    let side = &world.map.sides[index];
    let Some(r) = reg.sides.get_mut(index) else {
        trace!(index, "side index not in register, skipped");
        return None;
    };
    let mut df = 0u32;

    if side.has_sections {
        if !side.top.fix_material && r.top.material != side.top.material {
            df |= SideFlags::TOP_MATERIAL;
            if do_update {
                r.top.material = side.top.material;
            }
        }
        if !side.middle.fix_material && r.middle.material != side.middle.material {
            df |= SideFlags::MID_MATERIAL;
            if do_update {
                r.middle.material = side.middle.material;
            }
        }
        if !side.bottom.fix_material && r.bottom.material != side.bottom.material {
            df |= SideFlags::BOTTOM_MATERIAL;
            if do_update {
                r.bottom.material = side.bottom.material;
            }
        }

        for c in 0..3 {
            if r.top.rgba[c] != side.top.rgba[c] {
                df |= SideFlags::TOP_COLOR_RED << c;
                if do_update {
                    r.top.rgba[c] = side.top.rgba[c];
                }
            }
            if r.middle.rgba[c] != side.middle.rgba[c] {
                df |= SideFlags::MID_COLOR_RED << c;
                if do_update {
                    r.middle.rgba[c] = side.middle.rgba[c];
                }
            }
            if r.bottom.rgba[c] != side.bottom.rgba[c] {
                df |= SideFlags::BOTTOM_COLOR_RED << c;
                if do_update {
                    r.bottom.rgba[c] = side.bottom.rgba[c];
                }
            }
        }

        if r.middle.rgba[3] != side.middle.rgba[3] {
            df |= SideFlags::MID_COLOR_ALPHA;
            if do_update {
                r.middle.rgba[3] = side.middle.rgba[3];
            }
        }
        if r.middle.blend_mode != side.middle.blend_mode {
            df |= SideFlags::MID_BLEND_MODE;
            if do_update {
                r.middle.blend_mode = side.middle.blend_mode;
            }
        }
    }

    if r.line_flags != side.line_flags {
        df |= SideFlags::LINE_FLAGS;
        if do_update {
            r.line_flags = side.line_flags;
        }
    }
    if r.flags != side.flags {
        df |= SideFlags::FLAGS;
        if do_update {
            r.flags = side.flags;
        }
    }

    if df == 0 {
        return None;
    }
    // Side changes are rare enough that the full payload is cheap.
    let mut delta = Delta::new(
        DeltaKind::Side,
        index as u32,
        now,
        DeltaPayload::Side(RegisteredSide::capture(side)),
    );
    delta.flags = df;
    Some(delta)
}

/// Side pass. Maps carry tens of thousands of sides, so per tick only
/// one partition of the array is compared, advancing a rolling cursor.
/// Initial-register diffs and pools awaiting their first frame get a
/// full scan instead.
#[allow(clippy::too_many_arguments)]
fn side_pass(
    reg: &mut WorldRegister,
    world: &World,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
    cursor: &mut u32,
) {
    let count = world.map.sides.len();
    let full_scan = reg.is_initial() || targets.iter().any(|&index| pools[index].is_first());

    let (start, end) = if full_scan {
        (0, count)
    } else {
        let shifts = (config.side_partitions.max(1)) as usize;
        let shift = (*cursor as usize) % shifts;
        let start = shift * count / shifts;
        let end = (shift + 1) * count / shifts;
        *cursor = ((shift + 1) % shifts) as u32;
        (start, end)
    };

    for index in start..end {
        if let Some(delta) = compare_side(reg, world, index, do_update, now) {
            add_to_targets(&delta, pools, targets, world, config);
        }
    }
}

fn poly_pass(
    reg: &mut WorldRegister,
    world: &World,
    do_update: bool,
    now: u32,
    pools: &mut [Pool],
    targets: &[usize],
    config: &ReplicationConfig,
) {
    for (index, poly) in world.map.polyobjs.iter().enumerate() {
        let candidate = RegisteredPolyobject::capture(poly);
        let Some(r) = reg.polyobjs.get_mut(index) else {
            trace!(index, "polyobject index not in register, skipped");
            continue;
        };
        let mut df = 0u32;

        if r.dest[0] != candidate.dest[0] {
            df |= PolyFlags::DEST_X;
        }
        if r.dest[1] != candidate.dest[1] {
            df |= PolyFlags::DEST_Y;
        }
        if r.speed != candidate.speed {
            df |= PolyFlags::SPEED;
        }
        if r.dest_angle != candidate.dest_angle {
            df |= PolyFlags::DEST_ANGLE;
        }
        if r.angle_speed != candidate.angle_speed {
            df |= PolyFlags::ANGLE_SPEED;
        }

        if df != 0 {
            debug!(index, "change in polyobject");
            let mut delta = Delta::new(
                DeltaKind::Polyobject,
                index as u32,
                now,
                DeltaPayload::Polyobject(candidate),
            );
            delta.flags = df;
            add_to_targets(&delta, pools, targets, world, config);
        }

        if do_update {
            *r = candidate;
        }
    }
}

/// Runs all six passes against `reg` for the given target pools.
///
/// Owner info is refreshed first. With `do_update` the register is
/// rolled forward to the world's current tick.
#[allow(clippy::too_many_arguments)]
pub fn generate(
    reg: &mut WorldRegister,
    world: &World,
    rules: &dyn GameRules,
    config: &ReplicationConfig,
    now: u32,
    do_update: bool,
    pools: &mut [Pool],
    targets: &[usize],
    side_cursor: &mut u32,
) {
    for &index in targets {
        pools[index].owner_info = OwnerInfo::capture(world, index, config);
    }

    null_pass(reg, world, do_update, now, pools, targets, config);
    object_pass(reg, world, rules, do_update, now, pools, targets, config);
    player_pass(reg, world, rules, do_update, now, pools, targets, config);
    sector_pass(reg, world, do_update, now, pools, targets, config);
    side_pass(reg, world, do_update, now, pools, targets, config, side_cursor);
    poly_pass(reg, world, do_update, now, pools, targets, config);

    if do_update {
        reg.tic = world.tic;
    }
}

/// Builds the delta for an audible event. The kind, target id and
/// emitter-selector flags all derive from the source.
#[must_use]
pub fn build_sound_delta(
    sound_id: i32,
    source: SoundSource,
    volume: f32,
    repeating: bool,
    now: u32,
) -> Delta {
    let mut df = 0u32;
    let mut emitter = ObjectId::NONE;

    let (kind, id) = match source {
        SoundSource::Global => (DeltaKind::Sound, sound_id as u32),
        SoundSource::Object(object) => {
            emitter = object;
            (DeltaKind::ObjectSound, object.0)
        }
        // The client assumes the sector's own emitter.
        SoundSource::Sector(sector) => (DeltaKind::SectorSound, sector as u32),
        SoundSource::Plane { sector, plane } => {
            df |= match plane {
                PlaneKind::Floor => SoundFlags::PLANE_FLOOR,
                PlaneKind::Ceiling => SoundFlags::PLANE_CEILING,
            };
            (DeltaKind::SectorSound, sector as u32)
        }
        SoundSource::SideSection { side, section } => {
            df |= match section {
                SideSectionKind::Middle => SoundFlags::SIDE_MIDDLE,
                SideSectionKind::Top => SoundFlags::SIDE_TOP,
                SideSectionKind::Bottom => SoundFlags::SIDE_BOTTOM,
            };
            (DeltaKind::SideSound, side as u32)
        }
        SoundSource::Polyobject(poly) => (DeltaKind::PolyobjectSound, poly as u32),
    };

    // Volume is always stated.
    df |= SoundFlags::VOLUME;
    if repeating {
        df |= SoundFlags::REPEAT;
    }

    debug!(?kind, id, flags = df, "new sound delta");

    let mut delta = Delta::new(
        kind,
        id,
        now,
        DeltaPayload::Sound(SoundPayload {
            sound: sound_id,
            emitter,
            volume,
        }),
    );
    delta.flags = df;
    delta
}
