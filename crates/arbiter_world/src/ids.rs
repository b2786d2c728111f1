//! # Identity Handles
//!
//! Stable ids used to refer to world data without holding pointers.
//!
//! Snapshots taken by the replication layer must outlive the data they
//! describe (the world is torn down wholesale on map change), so
//! everything cross-referenced is an id compared by equality.

use bytemuck::Zeroable;

/// Binary angle: the full `u32` range maps to one revolution.
///
/// All angle arithmetic wraps.
pub type BinAngle = u32;

/// Sentinel world coordinate meaning "below everything".
pub const COORD_MIN: f64 = f64::MIN;

/// Sentinel world coordinate meaning "above everything".
pub const COORD_MAX: f64 = f64::MAX;

/// Stable identifier of a mobile object, assigned by the world.
///
/// Id 0 is reserved and means "no object".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Zeroable)]
#[repr(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The null object id.
    pub const NONE: Self = Self(0);

    /// Returns true if this id refers to no object.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Opaque handle to a game-defined animation state.
///
/// Id 0 means "no state" (the animation chain has ended).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Zeroable)]
#[repr(transparent)]
pub struct StateId(pub u32);

impl StateId {
    /// The null state.
    pub const NONE: Self = Self(0);

    /// Returns true if this is the null state.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Opaque handle to a surface material definition.
///
/// Id 0 means "no material". Compared by equality only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Zeroable)]
#[repr(transparent)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// The null material.
    pub const NONE: Self = Self(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handles() {
        assert!(ObjectId::NONE.is_none());
        assert!(!ObjectId(7).is_none());
        assert!(StateId::NONE.is_none());
        assert_eq!(MaterialId::default(), MaterialId::NONE);
    }
}
