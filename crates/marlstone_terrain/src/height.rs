use glam::IVec3;
use noise::{NoiseFn, Perlin};

use crate::config::SurfaceConfig;

/// Surface elevation sampled while seeding a volume. Must be deterministic.
pub trait HeightSource {
    fn height_at(&self, world: IVec3) -> f32;
}

impl<F> HeightSource for F
where
    F: Fn(IVec3) -> f32,
{
    fn height_at(&self, world: IVec3) -> f32 {
        self(world)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantHeight(pub f32);

impl HeightSource for ConstantHeight {
    fn height_at(&self, _world: IVec3) -> f32 {
        self.0
    }
}

/// Rolling heightmap: `base_height + height_range * perlin(x, z)`.
#[derive(Clone)]
pub struct NoiseHeight {
    perlin: Perlin,
    base_height: f64,
    height_range: f64,
    frequency: f64,
}

impl NoiseHeight {
    pub fn new(surface: &SurfaceConfig) -> Self {
        Self {
            perlin: Perlin::new(surface.seed),
            base_height: f64::from(surface.base_height),
            height_range: f64::from(surface.height_range),
            frequency: f64::from(surface.frequency),
        }
    }
}

impl HeightSource for NoiseHeight {
    fn height_at(&self, world: IVec3) -> f32 {
        let sample = self.perlin.get([
            f64::from(world.x) * self.frequency,
            f64::from(world.z) * self.frequency,
        ]);
        (self.base_height + self.height_range * sample) as f32
    }
}
