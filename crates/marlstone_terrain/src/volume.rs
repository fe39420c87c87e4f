use glam::IVec3;

use crate::coords::ChunkOrigin;
use crate::error::TerrainError;
use crate::height::HeightSource;

/// Samples strictly above this value are inside the terrain.
pub const SURFACE_THRESHOLD: f32 = 0.5;

/// Number of samples stored for `width x height x width` cubes, or `None`
/// if it does not fit in memory addressing.
pub fn sample_count(width: u32, height: u32) -> Option<usize> {
    let side = width as usize + 1;
    side.checked_mul(height as usize + 1)?.checked_mul(side)
}

/// Dense density lattice for one chunk.
///
/// A chunk of `width x height x width` cubes needs corner samples up to and
/// including the far boundary, so every axis stores one extra sample. Valid
/// points are `[0, dimension]` inclusive on each axis.
#[derive(Clone, Debug)]
pub struct Volume {
    dimensions: IVec3,
    samples: Box<[f32]>,
}

impl Volume {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "volume dimensions must be non-zero");
        let Some(len) = sample_count(width, height) else {
            panic!("volume of {width}x{height} cubes has too many samples");
        };
        let dimensions = IVec3::new(width as i32, height as i32, width as i32);
        Self {
            dimensions,
            samples: vec![0.0; len].into_boxed_slice(),
        }
    }

    pub fn dimensions(&self) -> IVec3 {
        self.dimensions
    }

    pub fn contains(&self, point: IVec3) -> bool {
        point.cmpge(IVec3::ZERO).all() && point.cmple(self.dimensions).all()
    }

    pub fn sample(&self, point: IVec3) -> Result<f32, TerrainError> {
        self.check(point)?;
        Ok(self.samples[self.index(point)])
    }

    pub fn set(&mut self, point: IVec3, value: f32) -> Result<(), TerrainError> {
        self.check(point)?;
        let index = self.index(point);
        self.samples[index] = value;
        Ok(())
    }

    /// Seeds every sample with `height(origin + p) - p.y`, so values above
    /// the threshold sit below the surface. Overwrites all previous edits.
    pub fn populate<H>(&mut self, origin: ChunkOrigin, height: &H)
    where
        H: HeightSource + ?Sized,
    {
        for y in 0..=self.dimensions.y {
            for z in 0..=self.dimensions.z {
                for x in 0..=self.dimensions.x {
                    let local = IVec3::new(x, y, z);
                    let index = self.index(local);
                    self.samples[index] = height.height_at(origin + local) - y as f32;
                }
            }
        }
    }

    pub fn fill(&mut self, value: f32) {
        self.samples.fill(value);
    }

    /// Flat view ordered x fastest, then z, then y.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Unchecked-by-contract read used by the mesher. Panics out of range.
    pub(crate) fn at(&self, point: IVec3) -> f32 {
        assert!(
            self.contains(point),
            "volume read at {point} outside extent {}",
            self.dimensions
        );
        self.samples[self.index(point)]
    }

    pub(crate) fn at_mut(&mut self, point: IVec3) -> &mut f32 {
        assert!(
            self.contains(point),
            "volume write at {point} outside extent {}",
            self.dimensions
        );
        let index = self.index(point);
        &mut self.samples[index]
    }

    fn check(&self, point: IVec3) -> Result<(), TerrainError> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(TerrainError::OutOfRange {
                point,
                dimensions: self.dimensions,
            })
        }
    }

    fn index(&self, point: IVec3) -> usize {
        let stride_z = (self.dimensions.x + 1) as usize;
        let stride_y = stride_z * (self.dimensions.z + 1) as usize;
        point.x as usize + point.z as usize * stride_z + point.y as usize * stride_y
    }
}
