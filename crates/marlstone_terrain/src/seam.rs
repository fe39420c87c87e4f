//! Which chunks an edit has to touch.
//!
//! Neighbouring chunks both store the samples on their shared boundary, so an
//! edit there has to reach both volumes or their meshes disagree along the
//! seam. Regions are assumed to span at most two chunks per axis.

use bitflags::bitflags;
use glam::{IVec3, Vec3};

use crate::coords::{ChunkLayout, ChunkOrigin};

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct SeamMask: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

/// Inclusive box of lattice points in world space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EditRegion {
    pub min: IVec3,
    pub max: IVec3,
}

impl EditRegion {
    pub fn point(sample: IVec3) -> Self {
        Self {
            min: sample,
            max: sample,
        }
    }

    /// Lattice points inside the axis-aligned box around a sphere.
    pub fn around(center: Vec3, radius: f32) -> Self {
        let reach = Vec3::splat(radius.max(0.0));
        Self {
            min: (center - reach).ceil().as_ivec3(),
            max: (center + reach).floor().as_ivec3(),
        }
    }

    /// Grows the region by one sample towards negative X and Z. A sample on a
    /// seam is also the last sample of the chunk on its negative side, and
    /// this pulls that chunk into the region. Saturates at the lattice edge.
    pub fn seam_reach(self) -> Self {
        Self {
            min: self.min.saturating_sub(IVec3::new(1, 0, 1)),
            max: self.max,
        }
    }

    /// Clips Y to the stored lattice rows `[0, height]`. `None` if nothing is left.
    pub fn clip_height(self, height: i32) -> Option<Self> {
        let min_y = self.min.y.max(0);
        let max_y = self.max.y.min(height);
        if min_y > max_y {
            return None;
        }
        Some(Self {
            min: IVec3::new(self.min.x, min_y, self.min.z),
            max: IVec3::new(self.max.x, max_y, self.max.z),
        })
    }

    /// Box corner by index: bit 0 picks max X, bit 1 max Y, bit 2 max Z.
    /// Corner 7 is `max`.
    pub fn corner(&self, index: u8) -> IVec3 {
        IVec3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }
}

/// Axes on which the region crosses into a second chunk: the chunk holding
/// the max corner starts after the region's min on that axis.
pub fn seam_mask(layout: &ChunkLayout, region: &EditRegion) -> SeamMask {
    let far = layout.origin_for_sample(region.max);
    let mut mask = SeamMask::empty();
    if far.x > region.min.x {
        mask |= SeamMask::X;
    }
    if far.y > region.min.y {
        mask |= SeamMask::Y;
    }
    if far.z > region.min.z {
        mask |= SeamMask::Z;
    }
    mask
}

/// One chunk origin per corner combination of the set seam bits, starting
/// with the chunk holding the max corner.
pub fn affected_origins(layout: &ChunkLayout, region: &EditRegion, mask: SeamMask) -> Vec<ChunkOrigin> {
    let bits = mask.bits();
    (0u8..8)
        .filter(|flip| flip & !bits == 0)
        .map(|flip| layout.origin_for_sample(region.corner(0b111 & !flip)))
        .collect()
}
