//! # Map Geometry
//!
//! The mutable parts of the static map: sector lighting and plane
//! movement, side surface appearance, polyobject motion. Geometry
//! construction (loading, BSP) happens elsewhere; this is the state
//! the replication layer watches.

use crate::ids::{BinAngle, MaterialId};

/// Which plane of a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaneKind {
    /// The floor plane.
    Floor = 0,
    /// The ceiling plane.
    Ceiling = 1,
}

/// A sector plane (floor or ceiling) and its surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Current height.
    pub height: f64,
    /// Height the plane is moving towards.
    pub target: f64,
    /// Movement speed, world units per tick; 0 = at rest.
    pub speed: f64,
    /// Surface tint, RGBA.
    pub rgba: [f32; 4],
    /// Surface material.
    pub material: MaterialId,
    /// Sound-emitter origin of this plane.
    pub emitter_origin: [f64; 3],
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            height: 0.0,
            target: 0.0,
            speed: 0.0,
            rgba: [1.0, 1.0, 1.0, 1.0],
            material: MaterialId::NONE,
            emitter_origin: [0.0; 3],
        }
    }
}

/// A map sector: a volume bounded by a floor and a ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sector {
    /// Ambient light level, 0..=1.
    pub light_level: f32,
    /// Ambient light tint.
    pub light_color: [f32; 3],
    /// Floor plane.
    pub floor: Plane,
    /// Ceiling plane.
    pub ceiling: Plane,
    /// Sound-emitter origin of the sector as a whole.
    pub emitter_origin: [f64; 3],
}

impl Sector {
    /// Returns the requested plane.
    #[must_use]
    pub fn plane(&self, kind: PlaneKind) -> &Plane {
        match kind {
            PlaneKind::Floor => &self.floor,
            PlaneKind::Ceiling => &self.ceiling,
        }
    }
}

/// Which section of a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SideSectionKind {
    /// Above the opening.
    Top = 0,
    /// Across the opening.
    Middle = 1,
    /// Below the opening.
    Bottom = 2,
}

/// One drawable section of a side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideSection {
    /// Surface material.
    pub material: MaterialId,
    /// The material was injected by the engine to patch a missing
    /// definition; such sections are never replicated.
    pub fix_material: bool,
    /// Tint, RGBA (alpha meaningful on the middle section only).
    pub rgba: [f32; 4],
    /// Blend mode (`BLEND_*`, middle section only).
    pub blend_mode: u8,
    /// Sound-emitter origin of this section.
    pub emitter_origin: [f64; 3],
}

impl SideSection {
    /// Opaque blending.
    pub const BLEND_NORMAL: u8 = 0;
    /// Additive blending.
    pub const BLEND_ADD: u8 = 1;
    /// Subtractive blending.
    pub const BLEND_SUBTRACT: u8 = 2;
}

impl Default for SideSection {
    fn default() -> Self {
        Self {
            material: MaterialId::NONE,
            fix_material: false,
            rgba: [1.0, 1.0, 1.0, 1.0],
            blend_mode: Self::BLEND_NORMAL,
            emitter_origin: [0.0; 3],
        }
    }
}

/// One side of a map line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Side {
    /// The side has drawable sections (false for degenerate sides).
    pub has_sections: bool,
    /// Top section.
    pub top: SideSection,
    /// Middle section.
    pub middle: SideSection,
    /// Bottom section.
    pub bottom: SideSection,
    /// Replicated flags of the owning line (low 8 bits).
    pub line_flags: u8,
    /// Replicated side flags (low 8 bits).
    pub flags: u8,
    /// Centre point of the owning line.
    pub line_center: [f64; 2],
}

impl Side {
    /// Returns the requested section.
    #[must_use]
    pub fn section(&self, kind: SideSectionKind) -> &SideSection {
        match kind {
            SideSectionKind::Top => &self.top,
            SideSectionKind::Middle => &self.middle,
            SideSectionKind::Bottom => &self.bottom,
        }
    }
}

/// A movable group of map lines.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Polyobject {
    /// Current position.
    pub origin: [f64; 2],
    /// Destination position.
    pub dest: [f64; 2],
    /// Movement speed.
    pub speed: f64,
    /// Destination angle.
    pub dest_angle: BinAngle,
    /// Rotation speed per tick.
    pub angle_speed: u32,
}

/// The whole map, sized at load time.
#[derive(Debug, Default)]
pub struct Map {
    /// All sectors, in map load order.
    pub sectors: Vec<Sector>,
    /// All sides, in map load order.
    pub sides: Vec<Side>,
    /// All polyobjects, in map load order.
    pub polyobjs: Vec<Polyobject>,
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
