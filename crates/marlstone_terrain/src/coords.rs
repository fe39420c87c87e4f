use std::ops::{Add, Sub};

use glam::{IVec3, Vec3};

/// World-space corner of a chunk. X and Z are multiples of the chunk width; Y is always 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkOrigin {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkOrigin {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkOrigin {
    fn from(value: IVec3) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl Add<IVec3> for ChunkOrigin {
    type Output = IVec3;

    fn add(self, rhs: IVec3) -> Self::Output {
        self.as_ivec3() + rhs
    }
}

impl Sub<ChunkOrigin> for IVec3 {
    type Output = IVec3;

    fn sub(self, rhs: ChunkOrigin) -> Self::Output {
        self - rhs.as_ivec3()
    }
}

/// How the world is cut into chunks. Only X and Z are partitioned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    pub width: i32,
    pub height: i32,
}

fn div_floor(value: i32, divisor: i32) -> i32 {
    let mut q = value / divisor;
    if value % divisor < 0 {
        q -= 1;
    }
    q
}

impl ChunkLayout {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "chunk dimensions must be non-zero");
        assert!(
            width <= i32::MAX as u32 && height <= i32::MAX as u32,
            "chunk dimensions {width}x{height} do not fit the lattice"
        );
        Self {
            width: width as i32,
            height: height as i32,
        }
    }

    /// Origin of the chunk at column `x`, row `z` of the grid.
    pub fn grid_origin(&self, x: i32, z: i32) -> ChunkOrigin {
        ChunkOrigin::new(x * self.width, 0, z * self.width)
    }

    /// Positions beyond the `i32` lattice saturate to the outermost origin.
    pub fn origin_for(&self, world: Vec3) -> ChunkOrigin {
        let width = self.width as f32;
        ChunkOrigin::new(
            ((world.x / width).floor() as i32).saturating_mul(self.width),
            0,
            ((world.z / width).floor() as i32).saturating_mul(self.width),
        )
    }

    /// Origin of the chunk owning a lattice point. A point on a seam resolves
    /// to the chunk on its positive side.
    pub fn origin_for_sample(&self, world: IVec3) -> ChunkOrigin {
        ChunkOrigin::new(
            div_floor(world.x, self.width).saturating_mul(self.width),
            0,
            div_floor(world.z, self.width).saturating_mul(self.width),
        )
    }

    /// Lattice extent of one chunk volume: `(width, height, width)`.
    pub fn dimensions(&self) -> IVec3 {
        IVec3::new(self.width, self.height, self.width)
    }

    /// Whether the chunk at `origin` stores a sample for `world`. Seam points
    /// are stored by both neighbours.
    pub fn stores_sample(&self, origin: ChunkOrigin, world: IVec3) -> bool {
        let local = world.saturating_sub(origin.as_ivec3());
        local.cmpge(IVec3::ZERO).all() && local.cmple(self.dimensions()).all()
    }
}
