use glam::{IVec3, Vec3};
use marlstone_core::edits::{Brush, EditKind};
use tracing::{debug, trace};

use crate::coords::ChunkOrigin;
use crate::error::TerrainError;
use crate::height::HeightSource;
use crate::marching::{march_volume, MeshOptions};
use crate::mesh::{ChunkMesh, MeshSink};
use crate::volume::Volume;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Uninitialized,
    Populated,
    Meshed,
}

/// One grid cell of terrain: its density volume and the mesh built from it.
#[derive(Clone, Debug)]
pub struct Chunk {
    origin: ChunkOrigin,
    volume: Volume,
    mesh: ChunkMesh,
    options: MeshOptions,
    state: ChunkState,
}

impl Chunk {
    pub fn allocate(origin: ChunkOrigin, width: u32, height: u32, options: MeshOptions) -> Self {
        Self {
            origin,
            volume: Volume::new(width, height),
            mesh: ChunkMesh::default(),
            options,
            state: ChunkState::Uninitialized,
        }
    }

    pub fn create<H>(
        origin: ChunkOrigin,
        width: u32,
        height: u32,
        height_source: &H,
        options: MeshOptions,
    ) -> Self
    where
        H: HeightSource + ?Sized,
    {
        let mut chunk = Self::allocate(origin, width, height, options);
        chunk.regenerate(height_source);
        chunk
    }

    pub fn origin(&self) -> ChunkOrigin {
        self.origin
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn populate<H>(&mut self, height_source: &H)
    where
        H: HeightSource + ?Sized,
    {
        self.volume.populate(self.origin, height_source);
        self.state = ChunkState::Populated;
    }

    /// Rebuilds the whole mesh from the current volume.
    pub fn remesh(&mut self) {
        self.mesh.clear();
        march_volume(&self.volume, &self.options, &mut self.mesh);
        self.state = ChunkState::Meshed;
        debug!(
            "Meshed chunk {:?}: {} triangles",
            self.origin,
            self.mesh.triangle_count()
        );
    }

    /// Discards all edits and rebuilds the chunk from `height_source`.
    pub fn regenerate<H>(&mut self, height_source: &H)
    where
        H: HeightSource + ?Sized,
    {
        self.populate(height_source);
        self.remesh();
    }

    /// Writes `value` at the lattice point nearest `world` (rounded up for
    /// adds, down for removes) and rebuilds the mesh. Returns the local point
    /// written. Nothing changes when the point falls outside this chunk.
    pub fn edit_at(
        &mut self,
        world: Vec3,
        value: f32,
        kind: EditKind,
    ) -> Result<IVec3, TerrainError> {
        let local = kind.snap(world) - self.origin;
        self.volume.set(local, value)?;
        self.remesh();
        Ok(local)
    }

    /// Blends every sample inside the brush sphere towards the brush target.
    /// Returns the number of samples changed; the mesh is rebuilt only if
    /// that is non-zero.
    pub fn apply_brush(&mut self, brush: &Brush) -> usize {
        let origin = self.origin.as_ivec3();
        let reach = Vec3::splat(brush.radius.max(0.0));
        let min = (brush.center - reach).ceil().as_ivec3().max(origin);
        let max = (brush.center + reach)
            .floor()
            .as_ivec3()
            .min(origin + self.volume.dimensions());

        let target = brush.kind.target_value();
        let speed = brush.speed.clamp(0.0, 1.0);
        let mut changed = 0;

        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    let world = IVec3::new(x, y, z);
                    let distance = world.as_vec3().distance(brush.center);
                    if distance > brush.radius {
                        continue;
                    }
                    let weight = if brush.radius > 0.0 {
                        speed * (1.0 - distance / brush.radius)
                    } else {
                        speed
                    };

                    let sample = self.volume.at_mut(world - self.origin);
                    let old = *sample;
                    let blended = old + (target - old) * weight;
                    let new = match brush.kind {
                        EditKind::Add => old.max(blended),
                        EditKind::Remove => old.min(blended),
                    };
                    if new != old {
                        trace!("Brush sample {world}: {old} -> {new}");
                        *sample = new;
                        changed += 1;
                    }
                }
            }
        }

        if changed > 0 {
            self.remesh();
        }
        changed
    }

    pub fn submit(&self, sink: &mut dyn MeshSink) {
        sink.submit(self.origin, &self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};
    use marlstone_core::edits::{Brush, EditKind};

    use super::{Chunk, ChunkState};
    use crate::coords::ChunkOrigin;
    use crate::error::TerrainError;
    use crate::height::ConstantHeight;
    use crate::marching::{build_mesh, MeshOptions};
    use crate::mesh::{ChunkMesh, MeshSink};

    fn flat_chunk(origin: ChunkOrigin) -> Chunk {
        Chunk::create(origin, 4, 4, &ConstantHeight(2.0), MeshOptions::default())
    }

    #[test]
    fn chunk_moves_through_its_lifecycle() {
        let mut chunk = Chunk::allocate(ChunkOrigin::default(), 4, 4, MeshOptions::default());
        assert_eq!(chunk.state(), ChunkState::Uninitialized);

        chunk.populate(&ConstantHeight(2.0));
        assert_eq!(chunk.state(), ChunkState::Populated);
        assert!(chunk.mesh().is_empty());

        chunk.remesh();
        assert_eq!(chunk.state(), ChunkState::Meshed);
        assert!(!chunk.mesh().is_empty());

        chunk
            .edit_at(Vec3::new(1.0, 1.0, 1.0), 0.0, EditKind::Remove)
            .expect("edit in range");
        assert_eq!(chunk.state(), ChunkState::Meshed);
    }

    #[test]
    fn create_builds_the_mesh_of_its_volume() {
        let chunk = flat_chunk(ChunkOrigin::new(4, 0, 8));
        assert_eq!(chunk.mesh(), &build_mesh(chunk.volume(), chunk.options()));
    }

    #[test]
    fn regenerate_is_bit_identical() {
        let height = |world: IVec3| 2.0 + (world.x as f32 * 0.7).sin() * 0.9;
        let mut chunk = Chunk::create(ChunkOrigin::new(4, 0, 0), 4, 4, &height, MeshOptions::default());
        let first = chunk.mesh().clone();

        chunk.regenerate(&height);
        assert_eq!(chunk.mesh().vertices, first.vertices);
        assert_eq!(chunk.mesh().indices, first.indices);
    }

    #[test]
    fn edit_at_rounds_up_for_add_and_down_for_remove() {
        let mut chunk = flat_chunk(ChunkOrigin::new(4, 0, 0));

        let local = chunk
            .edit_at(Vec3::new(5.2, 2.1, 1.0), 1.0, EditKind::Add)
            .expect("add in range");
        assert_eq!(local, IVec3::new(2, 3, 1));
        assert_eq!(chunk.volume().sample(local), Ok(1.0));

        let local = chunk
            .edit_at(Vec3::new(5.8, 1.9, 1.0), 0.0, EditKind::Remove)
            .expect("remove in range");
        assert_eq!(local, IVec3::new(1, 1, 1));
        assert_eq!(chunk.volume().sample(local), Ok(0.0));
    }

    #[test]
    fn edit_at_leaves_the_mesh_a_fresh_build_would_produce() {
        let mut chunk = flat_chunk(ChunkOrigin::default());
        let before = chunk.mesh().clone();

        chunk
            .edit_at(Vec3::new(2.0, 1.0, 2.0), 0.0, EditKind::Remove)
            .expect("edit in range");

        assert_ne!(chunk.mesh(), &before);
        assert!(chunk.mesh().is_well_formed());
        assert_eq!(chunk.mesh(), &build_mesh(chunk.volume(), chunk.options()));
    }

    #[test]
    fn out_of_range_edits_change_nothing() {
        let mut chunk = flat_chunk(ChunkOrigin::default());
        let before = chunk.mesh().clone();
        let samples = chunk.volume().samples().to_vec();

        let err = chunk
            .edit_at(Vec3::new(1.0, 9.0, 1.0), 1.0, EditKind::Add)
            .unwrap_err();
        assert!(matches!(err, TerrainError::OutOfRange { .. }));
        assert_eq!(chunk.mesh(), &before);
        assert_eq!(chunk.volume().samples(), samples.as_slice());
    }

    #[test]
    fn brush_raises_samples_with_falloff() {
        let mut chunk = flat_chunk(ChunkOrigin::default());
        let brush = Brush {
            center: Vec3::new(2.0, 3.0, 2.0),
            radius: 1.0,
            speed: 1.0,
            kind: EditKind::Add,
        };

        let changed = chunk.apply_brush(&brush);
        // Only the center moves; the six neighbours on the rim get zero weight.
        assert_eq!(changed, 1);
        assert_eq!(chunk.volume().sample(IVec3::new(2, 3, 2)), Ok(1.0));
        assert_eq!(chunk.volume().sample(IVec3::new(2, 3, 1)), Ok(-1.0));
        assert_eq!(chunk.mesh(), &build_mesh(chunk.volume(), chunk.options()));
    }

    #[test]
    fn brush_never_works_against_its_direction() {
        let mut chunk = flat_chunk(ChunkOrigin::default());
        let samples = chunk.volume().samples().to_vec();

        // Samples below y = 1 are already above 1.0; an add brush leaves them alone.
        let brush = Brush {
            center: Vec3::new(2.0, 0.0, 2.0),
            radius: 1.5,
            speed: 1.0,
            kind: EditKind::Add,
        };
        assert_eq!(chunk.apply_brush(&brush), 0);
        assert_eq!(chunk.volume().samples(), samples.as_slice());

        let idle = Brush {
            speed: 0.0,
            kind: EditKind::Remove,
            ..brush
        };
        assert_eq!(chunk.apply_brush(&idle), 0);
    }

    #[test]
    fn brush_outside_the_chunk_touches_nothing() {
        let mut chunk = flat_chunk(ChunkOrigin::default());
        let brush = Brush {
            center: Vec3::new(40.0, 2.0, 40.0),
            radius: 2.0,
            speed: 1.0,
            kind: EditKind::Remove,
        };
        assert_eq!(chunk.apply_brush(&brush), 0);
    }

    #[derive(Default)]
    struct RecordingSink {
        submitted: Vec<(ChunkOrigin, usize, bool)>,
    }

    impl MeshSink for RecordingSink {
        fn submit(&mut self, origin: ChunkOrigin, mesh: &ChunkMesh) {
            self.submitted
                .push((origin, mesh.triangle_count(), mesh.has_colors()));
        }
    }

    #[test]
    fn submit_hands_the_current_mesh_to_the_sink() {
        let chunk = flat_chunk(ChunkOrigin::new(0, 0, 4));
        let mut sink = RecordingSink::default();
        chunk.submit(&mut sink);
        assert_eq!(
            sink.submitted,
            vec![(ChunkOrigin::new(0, 0, 4), chunk.mesh().triangle_count(), false)]
        );
    }
}
