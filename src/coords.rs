use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A block position in the voxel world. `y` is the vertical axis.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

pub const CARDINALS: [Coordinates; 4] = [
    Coordinates::new(1, 0, 0),
    Coordinates::new(-1, 0, 0),
    Coordinates::new(0, 0, 1),
    Coordinates::new(0, 0, -1),
];

pub const DIAGONALS: [Coordinates; 4] = [
    Coordinates::new(1, 0, 1),
    Coordinates::new(1, 0, -1),
    Coordinates::new(-1, 0, 1),
    Coordinates::new(-1, 0, -1),
];

/// The cells two steps away along each axis.
pub const AXIAL_TWO: [Coordinates; 4] = [
    Coordinates::new(2, 0, 0),
    Coordinates::new(-2, 0, 0),
    Coordinates::new(0, 0, 2),
    Coordinates::new(0, 0, -2),
];

impl Coordinates {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Coordinates { x, y, z }
    }

    /// The ground-plane projection, used as the key for a column.
    pub const fn ground(&self) -> Self {
        Coordinates::new(self.x, 0, self.z)
    }

    pub const fn with_y(&self, y: i32) -> Self {
        Coordinates::new(self.x, y, self.z)
    }

    pub fn shift(&self, x: i32, y: i32, z: i32) -> Self {
        Coordinates::new(self.x + x, self.y + y, self.z + z)
    }

    pub fn manhattan_distance(&self, other: &Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    /// Largest per-axis distance on the ground plane.
    pub fn chebyshev_distance_2d(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Rotates about the vertical axis through `pivot`. Equivalent to applying the rounded 2x2
    /// rotation matrix to `(x, z)`.
    pub fn rotate_around(&self, pivot: &Self, rotation: Rotation) -> Self {
        let d = *self - *pivot;
        let (x, z) = match rotation {
            Rotation::None => (d.x, d.z),
            Rotation::Quarter => (-d.z, d.x),
            Rotation::Half => (-d.x, -d.z),
            Rotation::ThreeQuarters => (d.z, -d.x),
        };

        *pivot + Coordinates::new(x, d.y, z)
    }

    pub fn cardinals(&self) -> impl Iterator<Item = Coordinates> {
        let c = *self;
        (0..CARDINALS.len()).map(move |i| c + CARDINALS[i])
    }

    pub fn diagonals(&self) -> impl Iterator<Item = Coordinates> {
        let c = *self;
        (0..DIAGONALS.len()).map(move |i| c + DIAGONALS[i])
    }

    pub fn axial_two(&self) -> impl Iterator<Item = Coordinates> {
        let c = *self;
        (0..AXIAL_TWO.len()).map(move |i| c + AXIAL_TWO[i])
    }

    /// Whether this column lies in the half-open ground rectangle `[min, min + size)`.
    pub fn within(&self, min: &Coordinates, size: &Size) -> bool {
        self.x >= min.x && self.x < min.x + size.x && self.z >= min.z && self.z < min.z + size.z
    }
}

impl From<[i32; 3]> for Coordinates {
    fn from(a: [i32; 3]) -> Self {
        Coordinates::new(a[0], a[1], a[2])
    }
}

impl Add for Coordinates {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Coordinates::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Coordinates {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Coordinates {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Coordinates::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Coordinates {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<i32> for Coordinates {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Coordinates::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Coordinates {
    type Output = Self;

    fn neg(self) -> Self {
        Coordinates::new(-self.x, -self.y, -self.z)
    }
}

/// A rotation about the vertical axis, in quarter turns.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Rotation {
    None,
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Quarter,
        Rotation::Half,
        Rotation::ThreeQuarters,
    ];

    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Quarter),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::ThreeQuarters),
            _ => None,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarters => 270,
        }
    }
}

/// A ground-plane extent: `x` is the width, `z` the depth.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Size {
    pub x: i32,
    pub z: i32,
}

impl Size {
    pub const fn new(x: i32, z: i32) -> Self {
        Size { x, z }
    }

    pub fn is_positive(&self) -> bool {
        self.x > 0 && self.z > 0
    }

    pub fn area(&self) -> i32 {
        self.x * self.z
    }

    /// Width and depth swap on quarter turns.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::None | Rotation::Half => *self,
            Rotation::Quarter | Rotation::ThreeQuarters => Size::new(self.z, self.x),
        }
    }

    /// The translation that moves a footprint rotated about its minimum corner back onto
    /// that corner, so the rotated bounding box starts where the unrotated one did.
    pub fn rotation_shift(&self, rotation: Rotation) -> Coordinates {
        match rotation {
            Rotation::None => Coordinates::new(0, 0, 0),
            Rotation::Quarter => Coordinates::new(self.z - 1, 0, 0),
            Rotation::Half => Coordinates::new(self.x - 1, 0, self.z - 1),
            Rotation::ThreeQuarters => Coordinates::new(0, 0, self.x - 1),
        }
    }

    /// Every column of the footprint rooted at `origin`, in x-major order.
    pub fn cells(&self, origin: Coordinates) -> impl Iterator<Item = Coordinates> {
        let (sx, sz) = (self.x, self.z);
        (0..sx).flat_map(move |dx| (0..sz).map(move |dz| origin.ground().shift(dx, 0, dz)))
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Size::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Size::new(self.x - rhs.x, self.z - rhs.z)
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
