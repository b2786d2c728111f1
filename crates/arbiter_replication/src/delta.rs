//! # Delta Taxonomy
//!
//! A delta is one atomic change record targeting a single entity: a
//! kind tag, a target id, a 32-bit flag set selecting the meaningful
//! payload fields, and the payload itself.
//!
//! ## Convergence rules
//!
//! Pools rely on two algebraic operations to stay correct under
//! arbitrary delivery order:
//!
//! - `subtract` removes from an in-flight delta every field a newer
//!   delta re-states, so a stale retransmission can never overwrite
//!   fresh data
//! - `merge` folds a new delta into a pending one, unioning flags and
//!   payload fields
//!
//! Null-object and sound deltas override the generic rules; see
//! [`Delta::merge`].

use arbiter_world::ObjectId;

use crate::register::{
    RegisteredObject, RegisteredPlayer, RegisteredPolyobject, RegisteredSector, RegisteredSide,
};

/// What kind of entity a delta targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeltaKind {
    /// Mobile object.
    Object = 0,
    /// Player slot.
    Player = 1,
    /// Sector.
    Sector = 2,
    /// Side.
    Side = 3,
    /// Polyobject.
    Polyobject = 4,
    /// Sound with no positional source.
    Sound = 5,
    /// Sound emitted by a mobile object.
    ObjectSound = 6,
    /// Sound emitted by a sector or one of its planes.
    SectorSound = 7,
    /// Sound emitted by a side surface section.
    SideSound = 8,
    /// Sound emitted by a polyobject.
    PolyobjectSound = 9,
}

impl DeltaKind {
    /// Number of delta kinds.
    pub const COUNT: usize = 10;

    /// Index for kind-keyed tables (base scores).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for the five sound kinds.
    #[inline]
    #[must_use]
    pub const fn is_sound(self) -> bool {
        matches!(
            self,
            Self::Sound
                | Self::ObjectSound
                | Self::SectorSound
                | Self::SideSound
                | Self::PolyobjectSound
        )
    }
}

/// Lifecycle state of a delta within a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaState {
    /// Generated but not yet transmitted. At most one per (kind, id).
    New,
    /// Transmitted, awaiting acknowledgement.
    Unacked,
}

/// Flag bits of object deltas.
pub struct ObjectFlags;

impl ObjectFlags {
    /// X position changed.
    pub const ORIGIN_X: u32 = 0x0000_0001;
    /// Y position changed.
    pub const ORIGIN_Y: u32 = 0x0000_0002;
    /// Z position (or floor/ceiling reference) changed.
    pub const ORIGIN_Z: u32 = 0x0000_0004;
    /// X momentum changed.
    pub const MOM_X: u32 = 0x0000_0008;
    /// Y momentum changed.
    pub const MOM_Y: u32 = 0x0000_0010;
    /// Z momentum changed.
    pub const MOM_Z: u32 = 0x0000_0020;
    /// Facing angle changed.
    pub const ANGLE: u32 = 0x0000_0040;
    /// Appearance selector changed.
    pub const SELECTOR: u32 = 0x0000_0080;
    /// Animation sequence changed.
    pub const STATE: u32 = 0x0000_0100;
    /// Collision radius changed.
    pub const RADIUS: u32 = 0x0000_0200;
    /// Collision height changed.
    pub const HEIGHT: u32 = 0x0000_0400;
    /// One of the flag banks changed.
    pub const FLAGS: u32 = 0x0000_0800;
    /// Health changed.
    pub const HEALTH: u32 = 0x0000_1000;
    /// Floor clip changed.
    pub const FLOOR_CLIP: u32 = 0x0000_2000;
    /// Translucency changed.
    pub const TRANSLUCENCY: u32 = 0x0000_4000;
    /// Fade target changed.
    pub const FADE_TARGET: u32 = 0x0000_8000;
    /// Object type changed (or first sighting).
    pub const TYPE: u32 = 0x0001_0000;
    /// The client must create this object.
    pub const CREATE: u32 = 0x0002_0000;
    /// The object is gone; the client must remove it.
    pub const NULL: u32 = 0x0004_0000;
    /// Hint: object rests on the floor, exact z unnecessary.
    pub const ON_FLOOR: u32 = 0x0008_0000;

    /// All position bits.
    pub const ORIGIN: u32 = Self::ORIGIN_X | Self::ORIGIN_Y | Self::ORIGIN_Z;
    /// All momentum bits.
    pub const MOM: u32 = Self::MOM_X | Self::MOM_Y | Self::MOM_Z;
    /// Every payload field bit.
    pub const EVERYTHING: u32 = 0x0000_ffff;
    /// Fields a client authoritatively owns for its own camera object.
    pub const CAMERA_EXCLUDE: u32 = Self::ORIGIN | Self::MOM | Self::ANGLE;
}

/// Flag bits of player deltas.
pub struct PlayerFlags;

impl PlayerFlags {
    /// The owning object changed.
    pub const OWNER_OBJECT: u32 = 0x0000_0001;
    /// Forward analog input changed.
    pub const FORWARD_MOVE: u32 = 0x0000_0002;
    /// Sideways analog input changed.
    pub const SIDE_MOVE: u32 = 0x0000_0004;
    /// Turn delta changed.
    pub const TURN_DELTA: u32 = 0x0000_0008;
    /// Friction changed.
    pub const FRICTION: u32 = 0x0000_0010;
    /// Extra light or fixed colour map changed.
    pub const EXTRA_LIGHT: u32 = 0x0000_0020;
    /// Screen filter changed.
    pub const FILTER: u32 = 0x0000_0040;
    /// Client-side yaw (forced updates only).
    pub const CLIENT_YAW: u32 = 0x0000_0080;
    /// Client-side pitch (forced updates only).
    pub const CLIENT_PITCH: u32 = 0x0000_0100;
    /// Any view-sprite sub-flag is set.
    pub const PSPRITES: u32 = 0x0000_0200;

    /// View-sprite sub-flag: state pointer (and frame tics).
    pub const PSPRITE_STATE: u32 = 0x01;
    /// View-sprite sub-flag: opacity.
    pub const PSPRITE_ALPHA: u32 = 0x02;
    /// View-sprite sub-flag: state number.
    pub const PSPRITE_STATE_ID: u32 = 0x04;
    /// View-sprite sub-flag: draw offset.
    pub const PSPRITE_OFFSET: u32 = 0x08;

    /// Bit offset of the sub-flag window for sprite slot `slot`.
    #[inline]
    #[must_use]
    pub const fn psprite_shift(slot: usize) -> u32 {
        16 + (slot as u32) * 8
    }

    /// Fields the owning client maintains locally.
    pub const CAMERA_EXCLUDE: u32 = Self::FORWARD_MOVE
        | Self::SIDE_MOVE
        | Self::TURN_DELTA
        | Self::CLIENT_YAW
        | Self::CLIENT_PITCH;
    /// Fields a client never needs about other players.
    pub const NONCAMERA_EXCLUDE: u32 = Self::EXTRA_LIGHT
        | Self::FILTER
        | Self::CLIENT_YAW
        | Self::CLIENT_PITCH
        | Self::PSPRITES
        | 0xffff_0000;
}

/// Flag bits of sector deltas.
pub struct SectorFlags;

impl SectorFlags {
    /// Floor material changed.
    pub const FLOOR_MATERIAL: u32 = 0x0000_0001;
    /// Ceiling material changed.
    pub const CEILING_MATERIAL: u32 = 0x0000_0002;
    /// Light level changed.
    pub const LIGHT: u32 = 0x0000_0004;
    /// Light tint red changed.
    pub const COLOR_RED: u32 = 0x0000_0008;
    /// Light tint green changed.
    pub const COLOR_GREEN: u32 = 0x0000_0010;
    /// Light tint blue changed.
    pub const COLOR_BLUE: u32 = 0x0000_0020;
    /// Floor movement target changed.
    pub const FLOOR_TARGET: u32 = 0x0000_0040;
    /// Floor movement speed changed.
    pub const FLOOR_SPEED: u32 = 0x0000_0080;
    /// Ceiling movement target changed.
    pub const CEILING_TARGET: u32 = 0x0000_0100;
    /// Ceiling movement speed changed.
    pub const CEILING_SPEED: u32 = 0x0000_0200;
    /// Floor height correction.
    pub const FLOOR_HEIGHT: u32 = 0x0000_0400;
    /// Ceiling height correction.
    pub const CEILING_HEIGHT: u32 = 0x0000_0800;
    /// Floor surface tint red changed.
    pub const FLOOR_COLOR_RED: u32 = 0x0000_1000;
    /// Floor surface tint green changed.
    pub const FLOOR_COLOR_GREEN: u32 = 0x0000_2000;
    /// Floor surface tint blue changed.
    pub const FLOOR_COLOR_BLUE: u32 = 0x0000_4000;
    /// Ceiling surface tint red changed.
    pub const CEILING_COLOR_RED: u32 = 0x0000_8000;
    /// Ceiling surface tint green changed.
    pub const CEILING_COLOR_GREEN: u32 = 0x0001_0000;
    /// Ceiling surface tint blue changed.
    pub const CEILING_COLOR_BLUE: u32 = 0x0002_0000;

    /// Any plane-motion bit.
    pub const PLANE_MOTION: u32 = Self::FLOOR_HEIGHT
        | Self::CEILING_HEIGHT
        | Self::FLOOR_SPEED
        | Self::CEILING_SPEED
        | Self::FLOOR_TARGET
        | Self::CEILING_TARGET;
}

/// Flag bits of side deltas.
pub struct SideFlags;

impl SideFlags {
    /// Top material changed.
    pub const TOP_MATERIAL: u32 = 0x0000_0001;
    /// Middle material changed.
    pub const MID_MATERIAL: u32 = 0x0000_0002;
    /// Bottom material changed.
    pub const BOTTOM_MATERIAL: u32 = 0x0000_0004;
    /// Owning-line flags changed.
    pub const LINE_FLAGS: u32 = 0x0000_0008;
    /// Top tint red changed.
    pub const TOP_COLOR_RED: u32 = 0x0000_0010;
    /// Top tint green changed.
    pub const TOP_COLOR_GREEN: u32 = 0x0000_0020;
    /// Top tint blue changed.
    pub const TOP_COLOR_BLUE: u32 = 0x0000_0040;
    /// Middle tint red changed.
    pub const MID_COLOR_RED: u32 = 0x0000_0080;
    /// Middle tint green changed.
    pub const MID_COLOR_GREEN: u32 = 0x0000_0100;
    /// Middle tint blue changed.
    pub const MID_COLOR_BLUE: u32 = 0x0000_0200;
    /// Middle opacity changed.
    pub const MID_COLOR_ALPHA: u32 = 0x0000_0400;
    /// Bottom tint red changed.
    pub const BOTTOM_COLOR_RED: u32 = 0x0000_0800;
    /// Bottom tint green changed.
    pub const BOTTOM_COLOR_GREEN: u32 = 0x0000_1000;
    /// Bottom tint blue changed.
    pub const BOTTOM_COLOR_BLUE: u32 = 0x0000_2000;
    /// Middle blend mode changed.
    pub const MID_BLEND_MODE: u32 = 0x0000_4000;
    /// Side flags changed.
    pub const FLAGS: u32 = 0x0000_8000;
}

/// Flag bits of polyobject deltas.
pub struct PolyFlags;

impl PolyFlags {
    /// Destination x changed.
    pub const DEST_X: u32 = 0x0000_0001;
    /// Destination y changed.
    pub const DEST_Y: u32 = 0x0000_0002;
    /// Movement speed changed.
    pub const SPEED: u32 = 0x0000_0004;
    /// Destination angle changed.
    pub const DEST_ANGLE: u32 = 0x0000_0008;
    /// Rotation speed changed.
    pub const ANGLE_SPEED: u32 = 0x0000_0010;
}

/// Flag bits of sound deltas.
pub struct SoundFlags;

impl SoundFlags {
    /// Volume is meaningful; volume 0 silences the source.
    pub const VOLUME: u32 = 0x0000_0001;
    /// The sound loops until stopped.
    pub const REPEAT: u32 = 0x0000_0002;
    /// Emitter is the sector's floor plane.
    pub const PLANE_FLOOR: u32 = 0x0000_0004;
    /// Emitter is the sector's ceiling plane.
    pub const PLANE_CEILING: u32 = 0x0000_0008;
    /// Emitter is the side's middle section.
    pub const SIDE_MIDDLE: u32 = 0x0000_0010;
    /// Emitter is the side's top section.
    pub const SIDE_TOP: u32 = 0x0000_0020;
    /// Emitter is the side's bottom section.
    pub const SIDE_BOTTOM: u32 = 0x0000_0040;
}

/// Payload of the five sound delta kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SoundPayload {
    /// Game sound number.
    pub sound: i32,
    /// Emitting object, for object sounds.
    pub emitter: ObjectId,
    /// Volume, 0..=1; non-positive means stop.
    pub volume: f32,
}

/// Kind-specific payload, selected by the header kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeltaPayload {
    /// Object snapshot.
    Object(RegisteredObject),
    /// Player snapshot.
    Player(RegisteredPlayer),
    /// Sector snapshot.
    Sector(RegisteredSector),
    /// Side snapshot.
    Side(RegisteredSide),
    /// Polyobject snapshot.
    Polyobject(RegisteredPolyobject),
    /// Sound event (all five sound kinds).
    Sound(SoundPayload),
}

/// One atomic change record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    /// Entity kind.
    pub kind: DeltaKind,
    /// Target id: object id, player index or map element index.
    pub id: u32,
    /// Lifecycle state.
    pub state: DeltaState,
    /// Kind-specific change flags; a delta with no flags is void.
    pub flags: u32,
    /// Transmission batch the delta went out with.
    pub set: u8,
    /// Retransmission id; nonzero only for resent deltas.
    pub resend: u8,
    /// Creation time, engine milliseconds.
    pub timestamp: u32,
    /// Priority score; meaningful only after the latest rating pass.
    pub score: f32,
    /// Kind-specific payload.
    pub payload: DeltaPayload,
}

impl Delta {
    /// Creates a delta in the NEW state with cleared bookkeeping.
    #[must_use]
    pub fn new(kind: DeltaKind, id: u32, timestamp: u32, payload: DeltaPayload) -> Self {
        Self {
            kind,
            id,
            state: DeltaState::New,
            flags: 0,
            set: 0,
            resend: 0,
            timestamp,
            score: 0.0,
            payload,
        }
    }

    /// A void delta carries no information and must not live in a pool.
    #[inline]
    #[must_use]
    pub const fn is_void(&self) -> bool {
        self.flags == 0
    }

    /// True when both deltas target the same entity.
    #[inline]
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }

    /// True for the five sound kinds.
    #[inline]
    #[must_use]
    pub const fn is_sound(&self) -> bool {
        self.kind.is_sound()
    }

    /// True for a sound delta that starts a sound.
    #[must_use]
    pub fn is_start_sound(&self) -> bool {
        self.is_sound()
            && self.flags & SoundFlags::VOLUME != 0
            && matches!(&self.payload, DeltaPayload::Sound(s) if s.volume > 0.0)
    }

    /// True for a sound delta that silences a source.
    #[must_use]
    pub fn is_stop_sound(&self) -> bool {
        self.is_sound()
            && self.flags & SoundFlags::VOLUME != 0
            && matches!(&self.payload, DeltaPayload::Sound(s) if s.volume <= 0.0)
    }

    /// True for an object delta announcing a removal.
    #[inline]
    #[must_use]
    pub fn is_null_object(&self) -> bool {
        self.kind == DeltaKind::Object && self.flags & ObjectFlags::NULL != 0
    }

    /// True for an object delta announcing a creation.
    #[inline]
    #[must_use]
    pub fn is_create_object(&self) -> bool {
        self.kind == DeltaKind::Object && self.flags & ObjectFlags::CREATE != 0
    }

    /// Age of the delta at `now`, in milliseconds.
    #[inline]
    #[must_use]
    pub const fn age(&self, now: u32) -> u32 {
        now.wrapping_sub(self.timestamp)
    }

    /// Subtracts `other` from this delta: every field `other`
    /// re-states is cleared here, so the two can be applied in any
    /// order. A Null-object subtrahend clears everything.
    pub fn subtract(&mut self, other: &Self) {
        debug_assert!(self.is_same(other), "subtract: deltas target different entities");
        if other.is_null_object() {
            self.flags = 0;
        } else {
            self.flags &= !other.flags;
        }
    }

    /// Merges `other` into this NEW delta.
    ///
    /// Returns false when the pair annihilates (a Null arriving on an
    /// untransmitted Create) and the delta must be removed.
    ///
    /// # Panics
    /// Panics if the deltas target different entities or this delta is
    /// not in the NEW state; both indicate corrupted pool state.
    pub fn merge(&mut self, other: &Self) -> bool {
        assert!(
            self.is_same(other),
            "merge: {:?}/{} does not match {:?}/{}",
            self.kind,
            self.id,
            other.kind,
            other.id
        );
        assert!(
            self.state == DeltaState::New,
            "merge: target {:?}/{} is not NEW",
            self.kind,
            self.id
        );

        if self.is_null_object() {
            // Nothing merges into an announced removal.
            return true;
        }
        if other.is_null_object() {
            if self.is_create_object() {
                // The client never saw the object; the pair cancels.
                self.flags = 0;
                return false;
            }
            self.flags = ObjectFlags::NULL;
            return true;
        }
        if other.is_start_sound() || other.is_stop_sound() {
            // One sound per source at a time; the later event wins
            // outright rather than blending with the pending one.
            match (&mut self.payload, &other.payload) {
                (DeltaPayload::Sound(dest), DeltaPayload::Sound(src)) => *dest = *src,
                _ => panic!("merge: sound delta {:?}/{} with non-sound payload", self.kind, self.id),
            }
            self.flags = other.flags;
            return true;
        }

        self.flags |= other.flags;
        // The timestamp is deliberately not refreshed: the target may
        // hold overdue data whose age pressure must survive the merge.
        self.apply_payload(other);
        true
    }

    /// Copies the payload fields selected by `other.flags` into this
    /// delta's payload.
    ///
    /// # Panics
    /// Panics on mismatched payload kinds.
    pub fn apply_payload(&mut self, other: &Self) {
        let flags = other.flags;
        match (&mut self.payload, &other.payload) {
            (DeltaPayload::Object(dest), DeltaPayload::Object(src)) => {
                apply_object(dest, src, flags);
            }
            (DeltaPayload::Player(dest), DeltaPayload::Player(src)) => {
                apply_player(dest, src, flags);
            }
            (DeltaPayload::Sector(dest), DeltaPayload::Sector(src)) => {
                apply_sector(dest, src, flags);
            }
            (DeltaPayload::Side(dest), DeltaPayload::Side(src)) => {
                apply_side(dest, src, flags);
            }
            (DeltaPayload::Polyobject(dest), DeltaPayload::Polyobject(src)) => {
                apply_polyobject(dest, src, flags);
            }
            (DeltaPayload::Sound(dest), DeltaPayload::Sound(src)) => {
                if flags & SoundFlags::VOLUME != 0 {
                    dest.volume = src.volume;
                }
                dest.sound = src.sound;
            }
            _ => panic!(
                "apply: payload mismatch between {:?}/{} and {:?}/{}",
                self.kind, self.id, other.kind, other.id
            ),
        }
    }
}

fn apply_object(dest: &mut RegisteredObject, src: &RegisteredObject, flags: u32) {
    if flags & ObjectFlags::ORIGIN_X != 0 {
        dest.origin[0] = src.origin[0];
    }
    if flags & ObjectFlags::ORIGIN_Y != 0 {
        dest.origin[1] = src.origin[1];
    }
    if flags & ObjectFlags::ORIGIN_Z != 0 {
        dest.origin[2] = src.origin[2];
        dest.floor_z = src.floor_z;
        dest.ceiling_z = src.ceiling_z;
    }
    if flags & ObjectFlags::MOM_X != 0 {
        dest.mom[0] = src.mom[0];
    }
    if flags & ObjectFlags::MOM_Y != 0 {
        dest.mom[1] = src.mom[1];
    }
    if flags & ObjectFlags::MOM_Z != 0 {
        dest.mom[2] = src.mom[2];
    }
    if flags & ObjectFlags::ANGLE != 0 {
        dest.angle = src.angle;
    }
    if flags & ObjectFlags::SELECTOR != 0 {
        dest.selector = src.selector;
    }
    if flags & ObjectFlags::STATE != 0 {
        dest.state = src.state;
    }
    if flags & ObjectFlags::RADIUS != 0 {
        dest.radius = src.radius;
    }
    if flags & ObjectFlags::HEIGHT != 0 {
        dest.height = src.height;
    }
    if flags & ObjectFlags::FLAGS != 0 {
        dest.engine_flags = src.engine_flags;
        dest.game_flags = src.game_flags;
    }
    if flags & ObjectFlags::HEALTH != 0 {
        dest.health = src.health;
    }
    if flags & ObjectFlags::FLOOR_CLIP != 0 {
        dest.floor_clip = src.floor_clip;
    }
    if flags & ObjectFlags::TRANSLUCENCY != 0 {
        dest.translucency = src.translucency;
    }
    if flags & ObjectFlags::FADE_TARGET != 0 {
        dest.fade_target = src.fade_target;
    }
    if flags & ObjectFlags::TYPE != 0 {
        dest.type_id = src.type_id;
    }
}

fn apply_player(dest: &mut RegisteredPlayer, src: &RegisteredPlayer, flags: u32) {
    if flags & PlayerFlags::OWNER_OBJECT != 0 {
        dest.object = src.object;
    }
    if flags & PlayerFlags::FORWARD_MOVE != 0 {
        dest.forward_move = src.forward_move;
    }
    if flags & PlayerFlags::SIDE_MOVE != 0 {
        dest.side_move = src.side_move;
    }
    if flags & PlayerFlags::TURN_DELTA != 0 {
        dest.turn_delta = src.turn_delta;
    }
    if flags & PlayerFlags::FRICTION != 0 {
        dest.friction = src.friction;
    }
    if flags & PlayerFlags::EXTRA_LIGHT != 0 {
        dest.extra_light = src.extra_light;
        dest.fixed_color_map = src.fixed_color_map;
    }
    if flags & PlayerFlags::FILTER != 0 {
        dest.filter = src.filter;
    }
    if flags & PlayerFlags::PSPRITES != 0 {
        for slot in 0..2 {
            let shift = PlayerFlags::psprite_shift(slot);
            if flags & (PlayerFlags::PSPRITE_STATE << shift) != 0 {
                dest.psprites[slot].state = src.psprites[slot].state;
                dest.psprites[slot].tics = src.psprites[slot].tics;
            }
            if flags & (PlayerFlags::PSPRITE_ALPHA << shift) != 0 {
                dest.psprites[slot].alpha = src.psprites[slot].alpha;
            }
            if flags & (PlayerFlags::PSPRITE_STATE_ID << shift) != 0 {
                dest.psprites[slot].state_id = src.psprites[slot].state_id;
            }
            if flags & (PlayerFlags::PSPRITE_OFFSET << shift) != 0 {
                dest.psprites[slot].offset = src.psprites[slot].offset;
            }
        }
    }
}

fn apply_sector(dest: &mut RegisteredSector, src: &RegisteredSector, flags: u32) {
    const FLOOR: usize = 0;
    const CEILING: usize = 1;

    if flags & SectorFlags::FLOOR_MATERIAL != 0 {
        dest.planes[FLOOR].material = src.planes[FLOOR].material;
    }
    if flags & SectorFlags::CEILING_MATERIAL != 0 {
        dest.planes[CEILING].material = src.planes[CEILING].material;
    }
    if flags & SectorFlags::LIGHT != 0 {
        dest.light_level = src.light_level;
    }
    if flags & SectorFlags::FLOOR_TARGET != 0 {
        dest.planes[FLOOR].target = src.planes[FLOOR].target;
    }
    if flags & SectorFlags::FLOOR_SPEED != 0 {
        dest.planes[FLOOR].speed = src.planes[FLOOR].speed;
    }
    if flags & SectorFlags::CEILING_TARGET != 0 {
        dest.planes[CEILING].target = src.planes[CEILING].target;
    }
    if flags & SectorFlags::CEILING_SPEED != 0 {
        dest.planes[CEILING].speed = src.planes[CEILING].speed;
    }
    if flags & SectorFlags::FLOOR_HEIGHT != 0 {
        dest.planes[FLOOR].height = src.planes[FLOOR].height;
    }
    if flags & SectorFlags::CEILING_HEIGHT != 0 {
        dest.planes[CEILING].height = src.planes[CEILING].height;
    }
    for c in 0..3 {
        if flags & (SectorFlags::COLOR_RED << c) != 0 {
            dest.light_color[c] = src.light_color[c];
        }
        if flags & (SectorFlags::FLOOR_COLOR_RED << c) != 0 {
            dest.planes[FLOOR].rgba[c] = src.planes[FLOOR].rgba[c];
        }
        if flags & (SectorFlags::CEILING_COLOR_RED << c) != 0 {
            dest.planes[CEILING].rgba[c] = src.planes[CEILING].rgba[c];
        }
    }
}

fn apply_side(dest: &mut RegisteredSide, src: &RegisteredSide, flags: u32) {
    if flags & SideFlags::TOP_MATERIAL != 0 {
        dest.top.material = src.top.material;
    }
    if flags & SideFlags::MID_MATERIAL != 0 {
        dest.middle.material = src.middle.material;
    }
    if flags & SideFlags::BOTTOM_MATERIAL != 0 {
        dest.bottom.material = src.bottom.material;
    }
    if flags & SideFlags::LINE_FLAGS != 0 {
        dest.line_flags = src.line_flags;
    }
    for c in 0..3 {
        if flags & (SideFlags::TOP_COLOR_RED << c) != 0 {
            dest.top.rgba[c] = src.top.rgba[c];
        }
        if flags & (SideFlags::MID_COLOR_RED << c) != 0 {
            dest.middle.rgba[c] = src.middle.rgba[c];
        }
        if flags & (SideFlags::BOTTOM_COLOR_RED << c) != 0 {
            dest.bottom.rgba[c] = src.bottom.rgba[c];
        }
    }
    if flags & SideFlags::MID_COLOR_ALPHA != 0 {
        dest.middle.rgba[3] = src.middle.rgba[3];
    }
    if flags & SideFlags::MID_BLEND_MODE != 0 {
        dest.middle.blend_mode = src.middle.blend_mode;
    }
    if flags & SideFlags::FLAGS != 0 {
        dest.flags = src.flags;
    }
}

fn apply_polyobject(dest: &mut RegisteredPolyobject, src: &RegisteredPolyobject, flags: u32) {
    if flags & PolyFlags::DEST_X != 0 {
        dest.dest[0] = src.dest[0];
    }
    if flags & PolyFlags::DEST_Y != 0 {
        dest.dest[1] = src.dest[1];
    }
    if flags & PolyFlags::SPEED != 0 {
        dest.speed = src.speed;
    }
    if flags & PolyFlags::DEST_ANGLE != 0 {
        dest.dest_angle = src.dest_angle;
    }
    if flags & PolyFlags::ANGLE_SPEED != 0 {
        dest.angle_speed = src.angle_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn object_delta(id: u32, flags: u32) -> Delta {
        let mut payload = RegisteredObject::zeroed();
        payload.id = ObjectId(id);
        let mut d = Delta::new(DeltaKind::Object, id, 0, DeltaPayload::Object(payload));
        d.flags = flags;
        d
    }

    fn sound_delta(id: u32, volume: f32) -> Delta {
        let mut d = Delta::new(
            DeltaKind::ObjectSound,
            id,
            0,
            DeltaPayload::Sound(SoundPayload {
                sound: 12,
                emitter: ObjectId(id),
                volume,
            }),
        );
        d.flags = SoundFlags::VOLUME;
        d
    }

    #[test]
    fn test_predicates() {
        let create = object_delta(5, ObjectFlags::CREATE | ObjectFlags::EVERYTHING);
        assert!(create.is_create_object());
        assert!(!create.is_null_object());
        assert!(!create.is_sound());

        let null = object_delta(5, ObjectFlags::NULL);
        assert!(null.is_null_object());

        assert!(sound_delta(1, 0.8).is_start_sound());
        assert!(sound_delta(1, 0.0).is_stop_sound());
        assert!(!sound_delta(1, 0.0).is_start_sound());
    }

    #[test]
    fn test_void_and_same() {
        let a = object_delta(5, 0);
        assert!(a.is_void());
        let b = object_delta(5, ObjectFlags::ANGLE);
        assert!(a.is_same(&b));
        let c = sound_delta(5, 1.0);
        assert!(!a.is_same(&c));
    }

    #[test]
    fn test_subtract_self_is_void() {
        let mut a = object_delta(5, ObjectFlags::ORIGIN_X | ObjectFlags::MOM_X);
        let b = a;
        a.subtract(&b);
        assert!(a.is_void());
    }

    #[test]
    fn test_subtract_partial_overlap() {
        let mut a = object_delta(5, ObjectFlags::ORIGIN_X | ObjectFlags::HEALTH);
        let b = object_delta(5, ObjectFlags::ORIGIN_X);
        a.subtract(&b);
        assert_eq!(a.flags, ObjectFlags::HEALTH);
    }

    #[test]
    fn test_subtract_null_clears_everything() {
        let mut a = object_delta(5, ObjectFlags::EVERYTHING);
        let b = object_delta(5, ObjectFlags::NULL);
        a.subtract(&b);
        assert!(a.is_void());
    }

    #[test]
    fn test_merge_unions_flags_and_payload() {
        let mut dest = object_delta(5, ObjectFlags::ORIGIN_X);
        if let DeltaPayload::Object(o) = &mut dest.payload {
            o.origin[0] = 1.0;
        }
        let mut src = object_delta(5, ObjectFlags::HEALTH);
        src.timestamp = 999;
        if let DeltaPayload::Object(o) = &mut src.payload {
            o.health = 55;
            o.origin[0] = 2.0; // not selected by flags, must not land
        }

        assert!(dest.merge(&src));
        assert_eq!(dest.flags, ObjectFlags::ORIGIN_X | ObjectFlags::HEALTH);
        assert_eq!(dest.timestamp, 0, "merge must keep the older timestamp");
        match &dest.payload {
            DeltaPayload::Object(o) => {
                assert_eq!(o.health, 55);
                assert_eq!(o.origin[0], 1.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_merge_into_copy_is_identity() {
        let mut a = object_delta(9, ObjectFlags::ORIGIN_X | ObjectFlags::ANGLE);
        let copy = a;
        assert!(a.merge(&copy));
        assert_eq!(a, copy);
    }

    #[test]
    fn test_merge_null_into_create_annihilates() {
        let mut create = object_delta(5, ObjectFlags::CREATE | ObjectFlags::EVERYTHING);
        let null = object_delta(5, ObjectFlags::NULL);
        assert!(!create.merge(&null));
        assert!(create.is_void());
    }

    #[test]
    fn test_merge_null_into_update_replaces_flags() {
        let mut update = object_delta(5, ObjectFlags::ORIGIN_X | ObjectFlags::HEALTH);
        let null = object_delta(5, ObjectFlags::NULL);
        assert!(update.merge(&null));
        assert_eq!(update.flags, ObjectFlags::NULL);
    }

    #[test]
    fn test_merge_into_null_is_inert() {
        let mut null = object_delta(5, ObjectFlags::NULL);
        let update = object_delta(5, ObjectFlags::ORIGIN_X);
        assert!(null.merge(&update));
        assert_eq!(null.flags, ObjectFlags::NULL);
    }

    #[test]
    fn test_merge_sound_overrides_verbatim() {
        let mut pending = sound_delta(4, 1.0);
        let mut stop = sound_delta(4, 0.0);
        stop.flags |= SoundFlags::REPEAT;
        assert!(pending.merge(&stop));
        assert_eq!(pending.flags, stop.flags);
        match &pending.payload {
            DeltaPayload::Sound(s) => assert_eq!(s.volume, 0.0),
            _ => unreachable!(),
        }
    }

    #[test]
    #[should_panic(expected = "merge")]
    fn test_merge_different_entities_panics() {
        let mut a = object_delta(5, ObjectFlags::ANGLE);
        let b = object_delta(6, ObjectFlags::ANGLE);
        let _ = a.merge(&b);
    }

    #[test]
    #[should_panic(expected = "not NEW")]
    fn test_merge_into_unacked_panics() {
        let mut a = object_delta(5, ObjectFlags::ANGLE);
        a.state = DeltaState::Unacked;
        let b = object_delta(5, ObjectFlags::ANGLE);
        let _ = a.merge(&b);
    }

    #[test]
    fn test_psprite_apply_respects_subflags() {
        let mut dest = Delta::new(
            DeltaKind::Player,
            0,
            0,
            DeltaPayload::Player(RegisteredPlayer::default()),
        );
        let mut src_payload = RegisteredPlayer::default();
        src_payload.psprites[1].alpha = 0.5;
        src_payload.psprites[1].state_id = 7;
        let mut src = Delta::new(DeltaKind::Player, 0, 0, DeltaPayload::Player(src_payload));
        src.flags = PlayerFlags::PSPRITES
            | (PlayerFlags::PSPRITE_ALPHA << PlayerFlags::psprite_shift(1));

        dest.apply_payload(&src);
        match &dest.payload {
            DeltaPayload::Player(p) => {
                assert_eq!(p.psprites[1].alpha, 0.5);
                // state_id sub-flag was not set, so it must not copy.
                assert_eq!(p.psprites[1].state_id, 0);
            }
            _ => unreachable!(),
        }
    }
}
