//! # World Registers
//!
//! A register is a snapshot of the entire map state, used as the
//! reference side of every diff. Two exist per map:
//!
//! - `current` - rolls forward as deltas are generated each tick
//! - `initial` - frozen at map start; diffing a new client against it
//!   yields the full create-from-nothing view
//!
//! ## Design
//!
//! Registered records hold ids and opaque handles, never references
//! into the live world: on map change everything here is dropped in
//! one go while the pools are drained independently.
//!
//! The object index starts empty in *both* registers. A register with
//! no record for an object diffs as a full creation, which is exactly
//! what a client that has never heard of the object needs.

use bytemuck::Zeroable;

use arbiter_world::{
    pack_rgba, GameObject, GameRules, MaterialId, ObjectId, Player, PlaneKind, Polyobject, Sector,
    Side, StateId, World, COORD_MIN, MAX_PLAYERS,
};

/// Bucket count of the register object index.
pub const OBJECT_HASH_SIZE: usize = 1024;
const OBJECT_HASH_MASK: u32 = 0x3ff;

/// Reset z coordinate: far below any real geometry.
const RESET_Z: f64 = -1.0e6;

/// Snapshot of one mobile object.
#[derive(Clone, Copy, Debug, PartialEq, Zeroable)]
pub struct RegisteredObject {
    /// Object id.
    pub id: ObjectId,
    /// Position (z passed through [`maxed_z`]).
    pub origin: [f64; 3],
    /// Momentum.
    pub mom: [f64; 3],
    /// Floor height under the object.
    pub floor_z: f64,
    /// Ceiling height over the object.
    pub ceiling_z: f64,
    /// Facing angle.
    pub angle: u32,
    /// Appearance selector.
    pub selector: u32,
    /// Collision radius.
    pub radius: f64,
    /// Collision height.
    pub height: f64,
    /// Engine flag bank.
    pub engine_flags: u32,
    /// Game flag banks.
    pub game_flags: [u32; 3],
    /// Hit points.
    pub health: i32,
    /// Floor clip depth.
    pub floor_clip: f64,
    /// Translucency level.
    pub translucency: u8,
    /// Fade animation target.
    pub fade_target: i16,
    /// Object type, -1 = none.
    pub type_id: i32,
    /// Animation state handle.
    pub state: StateId,
}

/// The z coordinate as stored in a register.
///
/// The sentinel values [`COORD_MIN`]/[`COORD_MAX`] are reserved for
/// "on the floor"/"against the ceiling"; the clamp itself is not
/// applied at present, but all readers go through the sentinels'
/// substitution rules, so enabling it stays a one-line change.
#[inline]
#[must_use]
pub fn maxed_z(object: &GameObject) -> f64 {
    object.origin[2]
}

impl RegisteredObject {
    /// Captures the replicated fields of a live object.
    #[must_use]
    pub fn capture(object: &GameObject) -> Self {
        Self {
            id: object.id,
            origin: [object.origin[0], object.origin[1], maxed_z(object)],
            mom: object.mom,
            floor_z: object.floor_z,
            ceiling_z: object.ceiling_z,
            angle: object.angle,
            selector: object.selector,
            radius: object.radius,
            height: object.height,
            engine_flags: object.engine_flags,
            game_flags: object.game_flags,
            health: object.health,
            floor_clip: object.floor_clip,
            translucency: object.translucency,
            fade_target: object.fade_target,
            type_id: object.type_id,
            state: object.state,
        }
    }

    /// Forces the record back to the never-seen sentinel, preserving
    /// the id. The next diff of this object emits a full update.
    pub fn reset(&mut self) {
        let id = self.id;
        *self = Self::sentinel();
        self.id = id;
    }

    /// The stand-in record used when an object has no register entry.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            origin: [COORD_MIN, COORD_MIN, RESET_Z],
            radius: -1.0,
            height: -1.0,
            type_id: -1,
            ..Self::zeroed()
        }
    }
}

/// Snapshot of one player view-sprite slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredPsprite {
    /// Animation state handle.
    pub state: StateId,
    /// Remaining frame tics.
    pub tics: i32,
    /// Layer opacity.
    pub alpha: f32,
    /// Game-defined state number.
    pub state_id: i32,
    /// 2D draw offset.
    pub offset: [f32; 2],
}

/// Snapshot of one player slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredPlayer {
    /// The player's owning object (0 = none).
    pub object: ObjectId,
    /// Forward analog input.
    pub forward_move: i8,
    /// Sideways analog input.
    pub side_move: i8,
    /// View angle.
    pub angle: u32,
    /// Angle change since the previous tick.
    pub turn_delta: u32,
    /// Friction under the player.
    pub friction: f32,
    /// Extra light around the player.
    pub extra_light: i32,
    /// Fixed colour-map index.
    pub fixed_color_map: i32,
    /// Packed screen filter colour, 0 = none.
    pub filter: u32,
    /// Client-side yaw.
    pub client_yaw: u32,
    /// Client-side pitch.
    pub client_pitch: f32,
    /// View sprite slots.
    pub psprites: [RegisteredPsprite; 2],
}

impl RegisteredPlayer {
    /// Captures the replicated fields of a player slot.
    #[must_use]
    pub fn capture(world: &World, index: usize, rules: &dyn GameRules) -> Self {
        let player: &Player = world.player(index);
        let object = world.player_object(index);

        let (angle, turn_delta, friction) = match object {
            Some(obj) => (
                obj.angle,
                obj.angle.wrapping_sub(player.last_angle),
                rules.friction(world, obj.id),
            ),
            None => (0, 0, arbiter_world::DEFAULT_FRICTION),
        };

        let filter = if player.flags & Player::FLAG_VIEW_FILTER != 0 {
            pack_rgba(player.filter_color)
        } else {
            0
        };

        let capture_psp = |psp: &arbiter_world::PlayerSprite| RegisteredPsprite {
            state: psp.state,
            tics: psp.tics,
            alpha: psp.alpha,
            state_id: psp.state_id,
            offset: psp.offset,
        };

        Self {
            object: object.map_or(ObjectId::NONE, |o| o.id),
            // Analog inputs are echoed back by game code, not diffed here.
            forward_move: 0,
            side_move: 0,
            angle,
            turn_delta,
            friction,
            extra_light: player.extra_light,
            fixed_color_map: player.fixed_color_map,
            filter,
            client_yaw: angle,
            client_pitch: player.look_dir,
            psprites: [capture_psp(&player.psprites[0]), capture_psp(&player.psprites[1])],
        }
    }
}

/// Snapshot of one sector plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredPlane {
    /// Current height.
    pub height: f64,
    /// Movement target height.
    pub target: f64,
    /// Movement speed.
    pub speed: f64,
    /// Surface tint.
    pub rgba: [f32; 4],
    /// Surface material.
    pub material: MaterialId,
}

/// Snapshot of one sector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredSector {
    /// Ambient light level.
    pub light_level: f32,
    /// Ambient light tint.
    pub light_color: [f32; 3],
    /// Floor and ceiling planes, indexed by [`PlaneKind`].
    pub planes: [RegisteredPlane; 2],
}

impl RegisteredSector {
    /// Captures the replicated fields of a sector.
    #[must_use]
    pub fn capture(sector: &Sector) -> Self {
        let plane = |kind: PlaneKind| {
            let p = sector.plane(kind);
            RegisteredPlane {
                height: p.height,
                target: p.target,
                speed: p.speed,
                rgba: p.rgba,
                material: p.material,
            }
        };
        Self {
            light_level: sector.light_level,
            light_color: sector.light_color,
            planes: [plane(PlaneKind::Floor), plane(PlaneKind::Ceiling)],
        }
    }

    /// Returns the requested plane snapshot.
    #[must_use]
    pub fn plane(&self, kind: PlaneKind) -> &RegisteredPlane {
        &self.planes[kind as usize]
    }

    /// Returns the requested plane snapshot mutably.
    pub fn plane_mut(&mut self, kind: PlaneKind) -> &mut RegisteredPlane {
        &mut self.planes[kind as usize]
    }
}

/// Snapshot of one side section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredSideSection {
    /// Surface material.
    pub material: MaterialId,
    /// Tint (alpha meaningful on the middle section only).
    pub rgba: [f32; 4],
    /// Blend mode (middle section only).
    pub blend_mode: u8,
}

/// Snapshot of one side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredSide {
    /// Top section.
    pub top: RegisteredSideSection,
    /// Middle section.
    pub middle: RegisteredSideSection,
    /// Bottom section.
    pub bottom: RegisteredSideSection,
    /// Owning-line flags.
    pub line_flags: u8,
    /// Side flags.
    pub flags: u8,
}

impl RegisteredSide {
    /// Captures the replicated fields of a side.
    #[must_use]
    pub fn capture(side: &Side) -> Self {
        let mut reg = Self::default();
        if side.has_sections {
            reg.top.material = side.top.material;
            reg.middle.material = side.middle.material;
            reg.bottom.material = side.bottom.material;
            reg.top.rgba = side.top.rgba;
            reg.middle.rgba = side.middle.rgba;
            reg.bottom.rgba = side.bottom.rgba;
            reg.middle.blend_mode = side.middle.blend_mode;
        }
        reg.line_flags = side.line_flags;
        reg.flags = side.flags;
        reg
    }
}

/// Snapshot of one polyobject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct RegisteredPolyobject {
    /// Destination position.
    pub dest: [f64; 2],
    /// Movement speed.
    pub speed: f64,
    /// Destination angle.
    pub dest_angle: u32,
    /// Rotation speed.
    pub angle_speed: u32,
}

impl RegisteredPolyobject {
    /// Captures the replicated fields of a polyobject.
    #[must_use]
    pub fn capture(poly: &Polyobject) -> Self {
        Self {
            dest: poly.dest,
            speed: poly.speed,
            dest_angle: poly.dest_angle,
            angle_speed: poly.angle_speed,
        }
    }
}

/// Id-hashed index of registered objects.
///
/// Fixed bucket array; each bucket keeps insertion order so removal
/// during traversal stays predictable.
#[derive(Debug)]
pub struct ObjectIndex {
    buckets: Vec<Vec<RegisteredObject>>,
}

impl ObjectIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: (0..OBJECT_HASH_SIZE).map(|_| Vec::new()).collect(),
        }
    }

    #[inline]
    fn bucket_of(id: ObjectId) -> usize {
        (id.0 & OBJECT_HASH_MASK) as usize
    }

    /// Looks up a record.
    #[must_use]
    pub fn find(&self, id: ObjectId) -> Option<&RegisteredObject> {
        self.buckets[Self::bucket_of(id)].iter().find(|o| o.id == id)
    }

    /// Looks up a record mutably.
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut RegisteredObject> {
        self.buckets[Self::bucket_of(id)]
            .iter_mut()
            .find(|o| o.id == id)
    }

    /// Returns the record for `id`, inserting a zeroed one if missing.
    pub fn add_or_find(&mut self, id: ObjectId) -> &mut RegisteredObject {
        let bucket = Self::bucket_of(id);
        let pos = self.buckets[bucket].iter().position(|o| o.id == id);
        let slot = match pos {
            Some(p) => p,
            None => {
                let mut node = RegisteredObject::zeroed();
                node.id = id;
                self.buckets[bucket].push(node);
                self.buckets[bucket].len() - 1
            }
        };
        &mut self.buckets[bucket][slot]
    }

    /// Removes a record. Returns true if it existed.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let bucket = Self::bucket_of(id);
        let Some(pos) = self.buckets[bucket].iter().position(|o| o.id == id) else {
            return false;
        };
        self.buckets[bucket].remove(pos);
        true
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredObject> {
        self.buckets.iter().flatten()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns true if the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

impl Default for ObjectIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// One full-world snapshot.
#[derive(Debug)]
pub struct WorldRegister {
    /// Tick at which the register was last brought up to date.
    pub(crate) tic: i32,
    /// True for the frozen initial-state register.
    pub(crate) is_initial: bool,
    /// Registered objects (empty until the diff populates it).
    pub(crate) objects: ObjectIndex,
    /// Registered player slots.
    pub(crate) players: [RegisteredPlayer; MAX_PLAYERS],
    /// Registered sectors, sized to the map.
    pub(crate) sectors: Vec<RegisteredSector>,
    /// Registered sides, sized to the map.
    pub(crate) sides: Vec<RegisteredSide>,
    /// Registered polyobjects, sized to the map.
    pub(crate) polyobjs: Vec<RegisteredPolyobject>,
}

impl WorldRegister {
    /// Creates an empty register for when no map is loaded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tic: 0,
            is_initial: false,
            objects: ObjectIndex::new(),
            players: [RegisteredPlayer::default(); MAX_PLAYERS],
            sectors: Vec::new(),
            sides: Vec::new(),
            polyobjs: Vec::new(),
        }
    }

    /// Snapshots the current world.
    ///
    /// Sectors, sides, polyobjects and players are captured in full;
    /// the object index intentionally starts empty so every object
    /// later diffs as a creation.
    #[must_use]
    pub fn capture(world: &World, rules: &dyn GameRules, is_initial: bool) -> Self {
        let mut players = [RegisteredPlayer::default(); MAX_PLAYERS];
        for (index, slot) in players.iter_mut().enumerate() {
            *slot = RegisteredPlayer::capture(world, index, rules);
        }

        Self {
            tic: world.tic,
            is_initial,
            objects: ObjectIndex::new(),
            players,
            sectors: world.map.sectors.iter().map(RegisteredSector::capture).collect(),
            sides: world.map.sides.iter().map(RegisteredSide::capture).collect(),
            polyobjs: world
                .map
                .polyobjs
                .iter()
                .map(RegisteredPolyobject::capture)
                .collect(),
        }
    }

    /// True if this is the frozen initial-state register.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// Tick at which the register was last updated.
    #[must_use]
    pub fn tic(&self) -> i32 {
        self.tic
    }

    /// Looks up a registered object, for diagnostics and tests.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&RegisteredObject> {
        self.objects.find(id)
    }
}
