// Core value types shared across the navigator.
//
// Defines lattice coordinates (`CellCoord`), the six cardinal `Direction`s,
// a small world-space `Vec3`, raw cell records (`CellState`) and their
// traversal buckets (`CellClass`), and the generation-tagged handles used
// to refer to boxes (`BoxId`) and grids (`GridId`) without owning them,
// plus the plain `AgentId` hosts use to tell agents apart in events.
//
// See also: `grid.rs` for the storage traits these types flow through,
// `neighborhood.rs` for the classifier that consumes `CellClass`.
//
// **Critical constraint: determinism.** All iteration orders exposed here
// (`Direction::ALL`, `Direction::CANDIDATE_ORDER`) are fixed arrays; the
// selector's tie-breaking depends on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A cell in one voxel grid's integer lattice. Local to that grid: the same
/// coordinate in two grids is two different places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring cell one step along `dir`.
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.offset();
        self.shifted(dx, dy, dz)
    }

    pub fn shifted(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chebyshev (max-axis) distance.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
            .max((self.z - other.z).unsigned_abs())
    }

    /// Center of the cell in grid-local space (cells are unit cubes with
    /// their minimum corner at the coordinate).
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    /// Component-wise difference as a float vector (`self - other`).
    pub fn delta(self, other: Self) -> Vec3 {
        Vec3::new(
            (self.x - other.x) as f32,
            (self.y - other.y) as f32,
            (self.z - other.z) as f32,
        )
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// World-space (or grid-local) float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Linear interpolation. `t` is not clamped.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// Lattice axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The two axes perpendicular to this one.
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Unit step along this axis with the given sign.
    pub fn step(self, sign: i32) -> (i32, i32, i32) {
        match self {
            Axis::X => (sign, 0, 0),
            Axis::Y => (0, sign, 0),
            Axis::Z => (0, 0, sign),
        }
    }
}

/// One of the six face directions an agent can step in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl Direction {
    /// Canonical order: positive before negative on each axis.
    pub const ALL: [Direction; 6] = [
        Direction::PositiveX,
        Direction::NegativeX,
        Direction::PositiveY,
        Direction::NegativeY,
        Direction::PositiveZ,
        Direction::NegativeZ,
    ];

    /// Order in which the step classifier reports legal moves. Dot-product
    /// ties resolve to the earliest entry.
    pub const CANDIDATE_ORDER: [Direction; 6] = [
        Direction::NegativeX,
        Direction::PositiveX,
        Direction::NegativeY,
        Direction::PositiveY,
        Direction::NegativeZ,
        Direction::PositiveZ,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::PositiveX | Direction::NegativeX => Axis::X,
            Direction::PositiveY | Direction::NegativeY => Axis::Y,
            Direction::PositiveZ | Direction::NegativeZ => Axis::Z,
        }
    }

    /// `+1` or `-1`.
    pub fn sign(self) -> i32 {
        match self {
            Direction::PositiveX | Direction::PositiveY | Direction::PositiveZ => 1,
            Direction::NegativeX | Direction::NegativeY | Direction::NegativeZ => -1,
        }
    }

    pub fn offset(self) -> (i32, i32, i32) {
        self.axis().step(self.sign())
    }

    pub fn vector(self) -> Vec3 {
        let (x, y, z) = self.offset();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    /// The direction of the dominant component of `v`. X wins only when
    /// strictly largest, then Y over Z. `None` for the zero vector.
    pub fn from_vector(v: Vec3) -> Option<Self> {
        let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
        if ax > ay && ax > az {
            Some(if v.x > 0.0 { Direction::PositiveX } else { Direction::NegativeX })
        } else if ay > az {
            Some(if v.y > 0.0 { Direction::PositiveY } else { Direction::NegativeY })
        } else if v.z > 0.0 {
            Some(Direction::PositiveZ)
        } else if v.z < 0.0 {
            Some(Direction::NegativeZ)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Cell contents
// ---------------------------------------------------------------------------

/// Material identifier as stored by the voxel layer. `0` is empty space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

impl MaterialId {
    pub const EMPTY: MaterialId = MaterialId(0);
}

/// Raw per-cell record read from storage. Agents never see this directly;
/// their filter turns it into a `CellClass`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellState {
    pub material: MaterialId,
    /// Part of the level's fixed geometry; destruction systems leave it alone.
    pub permanent: bool,
    /// Resists tunnelling agents.
    pub hard: bool,
}

impl CellState {
    pub const EMPTY: CellState = CellState {
        material: MaterialId::EMPTY,
        permanent: false,
        hard: false,
    };

    pub const fn of(material: MaterialId) -> Self {
        Self {
            material,
            permanent: false,
            hard: false,
        }
    }

    pub fn is_empty(self) -> bool {
        self.material == MaterialId::EMPTY
    }
}

/// Traversal bucket a filter places a cell into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellClass {
    /// Open space. Can be entered, gives no support.
    #[default]
    Empty,
    /// Soft material the agent can pass through and also cling to.
    Penetrable,
    /// Solid structure. Supports, cannot be entered.
    Filled,
    /// Neither entered nor used for support.
    Avoid,
}

impl CellClass {
    /// Whether an agent may occupy a cell of this class.
    pub fn is_traversable(self) -> bool {
        matches!(self, CellClass::Empty | CellClass::Penetrable)
    }

    /// Whether a cell of this class keeps an adjacent agent from floating.
    pub fn is_support(self) -> bool {
        matches!(self, CellClass::Filled | CellClass::Penetrable)
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

macro_rules! generational_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            pub index: u32,
            pub generation: u32,
        }

        impl $name {
            pub const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}v{})", stringify!($name), self.index, self.generation)
            }
        }
    };
}

generational_id!(
    /// Handle to a merged box inside one grid's `BoxArena`. Goes stale when
    /// the box is merged away or split; resolving a stale id yields `None`.
    BoxId
);
generational_id!(
    /// Weak handle to a grid in a `GridSet`. Resolving it is the liveness
    /// check.
    GridId
);

/// Caller-assigned agent identifier, echoed back in events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent#{}", self.0)
    }
}
