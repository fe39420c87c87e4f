use glam::Vec3;
use marlstone_core::edits::{Brush, EditCommand, EditKind, EditReceiver};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::chunk::Chunk;
use crate::config::TerrainConfig;
use crate::coords::{ChunkLayout, ChunkOrigin};
use crate::error::TerrainError;
use crate::height::{HeightSource, NoiseHeight};
use crate::marching::MeshOptions;
use crate::mesh::MeshSink;
use crate::seam::{affected_origins, seam_mask, EditRegion, SeamMask};

/// Outcome of one edit: which chunks were rebuilt and which origins had no chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditReport {
    pub seams: SeamMask,
    pub remeshed: Vec<ChunkOrigin>,
    pub skipped: Vec<ChunkOrigin>,
}

impl EditReport {
    fn new(seams: SeamMask) -> Self {
        Self {
            seams,
            remeshed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Owns every chunk of the terrain and routes edits to them.
pub struct TerrainGrid {
    layout: ChunkLayout,
    chunks: FxHashMap<ChunkOrigin, Chunk>,
}

impl TerrainGrid {
    pub fn generate<H>(
        chunks_wide: u32,
        chunks_long: u32,
        chunk_width: u32,
        chunk_height: u32,
        height_source: &H,
        options: MeshOptions,
    ) -> Self
    where
        H: HeightSource + ?Sized,
    {
        let layout = ChunkLayout::new(chunk_width, chunk_height);
        let mut chunks = FxHashMap::default();
        chunks.reserve(chunks_wide as usize * chunks_long as usize);

        for x in 0..chunks_wide as i32 {
            for z in 0..chunks_long as i32 {
                let origin = layout.grid_origin(x, z);
                let chunk = Chunk::create(origin, chunk_width, chunk_height, height_source, options);
                chunks.insert(origin, chunk);
            }
        }

        let grid = Self { layout, chunks };
        info!(
            "Generated {}x{} terrain chunks ({}x{} cubes each, {} triangles)",
            chunks_wide,
            chunks_long,
            chunk_width,
            chunk_height,
            grid.triangle_count()
        );
        grid
    }

    pub fn from_config(config: &TerrainConfig) -> Self {
        Self::from_config_with(config, &NoiseHeight::new(&config.surface))
    }

    pub fn from_config_with<H>(config: &TerrainConfig, height_source: &H) -> Self
    where
        H: HeightSource + ?Sized,
    {
        Self::generate(
            config.chunks_wide,
            config.chunks_long,
            config.chunk_width,
            config.chunk_height,
            height_source,
            config.mesh_options(),
        )
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.chunks.values().map(|c| c.mesh().triangle_count()).sum()
    }

    pub fn chunk_origin_for(&self, world: Vec3) -> ChunkOrigin {
        self.layout.origin_for(world)
    }

    pub fn chunk(&self, origin: ChunkOrigin) -> Option<&Chunk> {
        self.chunks.get(&origin)
    }

    pub fn chunk_at(&self, origin: ChunkOrigin) -> Result<&Chunk, TerrainError> {
        self.chunks
            .get(&origin)
            .ok_or(TerrainError::UnknownChunk { origin })
    }

    pub fn chunk_for(&self, world: Vec3) -> Option<&Chunk> {
        self.chunk(self.chunk_origin_for(world))
    }

    /// All chunks ordered by origin.
    pub fn chunks(&self) -> Vec<&Chunk> {
        let mut chunks: Vec<&Chunk> = self.chunks.values().collect();
        chunks.sort_by_key(|chunk| chunk.origin());
        chunks
    }

    /// Adds (`1.0`) or removes (`0.0`) terrain at the sample nearest
    /// `position` and rebuilds every chunk that stores that sample.
    ///
    /// Origins with no chunk are skipped. A sample above or below the chunk
    /// rows is rejected before anything is touched.
    pub fn apply_edit(&mut self, position: Vec3, is_adding: bool) -> Result<EditReport, TerrainError> {
        let kind = EditKind::from_adding(is_adding);
        let sample = kind.snap(position);
        if sample.y < 0 || sample.y > self.layout.height {
            return Err(TerrainError::OutOfRange {
                point: sample,
                dimensions: self.layout.dimensions(),
            });
        }

        let region = EditRegion::point(sample).seam_reach();
        let seams = seam_mask(&self.layout, &region);
        let mut report = EditReport::new(seams);

        for origin in affected_origins(&self.layout, &region, seams) {
            match self.chunks.get_mut(&origin) {
                Some(chunk) => {
                    debug_assert!(self.layout.stores_sample(origin, sample));
                    chunk.edit_at(position, kind.target_value(), kind)?;
                    report.remeshed.push(origin);
                }
                None => {
                    debug!("{}; edit skipped there", TerrainError::UnknownChunk { origin });
                    report.skipped.push(origin);
                }
            }
        }

        debug!(
            "{:?} at {} (sample {}): seams {:?}, remeshed {:?}",
            kind, position, sample, seams, report.remeshed
        );
        Ok(report)
    }

    /// Keeps a brush inside the two-chunks-per-axis reach of the seam model.
    pub fn clamp_brush(&self, brush: Brush) -> Brush {
        let max_radius = ((self.layout.width - 1) / 2) as f32;
        let radius = brush.radius.clamp(0.0, max_radius);
        if radius != brush.radius {
            warn!(
                "Brush radius {} clamped to {} for chunk width {}",
                brush.radius, radius, self.layout.width
            );
        }
        Brush {
            radius,
            speed: brush.speed.clamp(0.0, 1.0),
            ..brush
        }
    }

    pub fn apply_brush(&mut self, brush: Brush) -> EditReport {
        let brush = self.clamp_brush(brush);
        let Some(region) = EditRegion::around(brush.center, brush.radius)
            .seam_reach()
            .clip_height(self.layout.height)
        else {
            debug!("Brush at {} misses every sample row", brush.center);
            return EditReport::new(SeamMask::empty());
        };

        let seams = seam_mask(&self.layout, &region);
        let mut report = EditReport::new(seams);
        for origin in affected_origins(&self.layout, &region, seams) {
            match self.chunks.get_mut(&origin) {
                Some(chunk) => {
                    if chunk.apply_brush(&brush) > 0 {
                        report.remeshed.push(origin);
                    }
                }
                None => report.skipped.push(origin),
            }
        }

        debug!(
            "Brush {:?} at {} r={}: seams {:?}, remeshed {:?}",
            brush.kind, brush.center, brush.radius, seams, report.remeshed
        );
        report
    }

    pub fn apply_command(&mut self, command: EditCommand) -> Result<EditReport, TerrainError> {
        match command {
            EditCommand::Point { position, kind } => self.apply_edit(position, kind.is_adding()),
            EditCommand::Brush(brush) => Ok(self.apply_brush(brush)),
        }
    }

    /// Applies every queued edit in arrival order. Rejected edits are logged
    /// and reported without stopping the rest.
    pub fn drain_edits(&mut self, edits: &EditReceiver) -> Vec<Result<EditReport, TerrainError>> {
        edits
            .pending()
            .map(|command| {
                let result = self.apply_command(command);
                if let Err(err) = &result {
                    warn!("Rejected terrain edit {:?}: {}", command, err);
                }
                result
            })
            .collect()
    }

    pub fn submit_all(&self, sink: &mut dyn MeshSink) {
        for chunk in self.chunks() {
            chunk.submit(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use glam::{IVec3, Vec3};
    use marlstone_core::edits::{edit_queue, Brush, EditKind};

    use super::TerrainGrid;
    use crate::chunk::Chunk;
    use crate::config::TerrainConfig;
    use crate::coords::ChunkOrigin;
    use crate::error::TerrainError;
    use crate::height::ConstantHeight;
    use crate::marching::{build_mesh, MeshOptions};
    use crate::mesh::{ChunkMesh, MeshSink};
    use crate::seam::SeamMask;

    fn flat_grid(wide: u32, long: u32, width: u32, height: u32, surface: f32) -> TerrainGrid {
        TerrainGrid::generate(
            wide,
            long,
            width,
            height,
            &ConstantHeight(surface),
            MeshOptions::default(),
        )
    }

    /// `(y, z)` bit patterns of the vertices a chunk puts on the plane `local_x`.
    fn face_vertices(chunk: &Chunk, local_x: f32) -> BTreeSet<(u32, u32)> {
        chunk
            .mesh()
            .vertices
            .iter()
            .filter(|v| v.x == local_x)
            .map(|v| (v.y.to_bits(), v.z.to_bits()))
            .collect()
    }

    #[test]
    fn generate_lays_chunks_out_on_the_xz_grid() {
        let grid = flat_grid(3, 2, 4, 4, 2.0);
        assert_eq!(grid.len(), 6);
        let origins: Vec<ChunkOrigin> = grid.chunks().iter().map(|c| c.origin()).collect();
        assert_eq!(
            origins,
            vec![
                ChunkOrigin::new(0, 0, 0),
                ChunkOrigin::new(0, 0, 4),
                ChunkOrigin::new(4, 0, 0),
                ChunkOrigin::new(4, 0, 4),
                ChunkOrigin::new(8, 0, 0),
                ChunkOrigin::new(8, 0, 4),
            ]
        );
    }

    #[test]
    fn chunk_origin_for_maps_world_positions() {
        let grid = flat_grid(2, 2, 16, 16, 8.0);
        let origin = grid.chunk_origin_for(Vec3::new(17.0, 3.0, 30.0));
        assert_eq!(origin, ChunkOrigin::new(16, 0, 16));
        assert!(grid.chunk(origin).is_some());

        let outside = grid.chunk_origin_for(Vec3::new(-0.25, 3.0, -1.0));
        assert_eq!(outside, ChunkOrigin::new(-16, 0, -16));
        assert_eq!(
            grid.chunk_at(outside).unwrap_err(),
            TerrainError::UnknownChunk { origin: outside }
        );
        assert!(grid.chunk_for(Vec3::new(-0.25, 3.0, -1.0)).is_none());
    }

    #[test]
    fn flat_grid_chunks_are_symmetric() {
        let grid = flat_grid(2, 2, 4, 4, 2.0);
        let counts: Vec<usize> = grid
            .chunks()
            .iter()
            .map(|chunk| {
                let mesh = chunk.mesh();
                assert!(!mesh.is_empty());
                assert!(mesh.is_well_formed());
                assert!(mesh.vertices.iter().all(|v| (0.0..=4.0).contains(&v.y)));
                mesh.triangle_count()
            })
            .collect();
        assert_eq!(counts.len(), 4);
        assert!(counts.iter().all(|&count| count == counts[0]));
    }

    #[test]
    fn seam_edit_remeshes_both_neighbours() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        let report = grid
            .apply_edit(Vec3::new(16.0, 7.0, 8.0), false)
            .expect("edit in range");

        assert_eq!(report.seams, SeamMask::X);
        let remeshed: BTreeSet<ChunkOrigin> = report.remeshed.iter().copied().collect();
        assert_eq!(
            remeshed,
            BTreeSet::from([ChunkOrigin::new(0, 0, 0), ChunkOrigin::new(16, 0, 0)])
        );
        assert!(report.skipped.is_empty());
        assert!(report
            .remeshed
            .iter()
            .all(|&origin| grid.layout().stores_sample(origin, IVec3::new(16, 7, 8))));

        let left = grid.chunk(ChunkOrigin::new(0, 0, 0)).expect("left chunk");
        let right = grid.chunk(ChunkOrigin::new(16, 0, 0)).expect("right chunk");
        assert_eq!(left.volume().sample(IVec3::new(16, 7, 8)), Ok(0.0));
        assert_eq!(right.volume().sample(IVec3::new(0, 7, 8)), Ok(0.0));
    }

    #[test]
    fn interior_edit_remeshes_one_chunk() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        let untouched = grid.chunk(ChunkOrigin::new(16, 0, 0)).expect("right").mesh().clone();

        let report = grid
            .apply_edit(Vec3::new(8.0, 7.0, 8.0), false)
            .expect("edit in range");

        assert_eq!(report.seams, SeamMask::empty());
        assert_eq!(report.remeshed, vec![ChunkOrigin::new(0, 0, 0)]);
        assert_eq!(
            grid.chunk(ChunkOrigin::new(16, 0, 0)).expect("right").mesh(),
            &untouched
        );
    }

    #[test]
    fn seam_geometry_matches_after_an_edit() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        grid.apply_edit(Vec3::new(16.0, 7.0, 8.0), false)
            .expect("carve on the seam");
        grid.apply_edit(Vec3::new(15.6, 8.4, 3.2), true)
            .expect("build on the seam");

        let left = grid.chunk(ChunkOrigin::new(0, 0, 0)).expect("left");
        let right = grid.chunk(ChunkOrigin::new(16, 0, 0)).expect("right");
        let left_face = face_vertices(left, 16.0);
        assert!(!left_face.is_empty());
        assert_eq!(left_face, face_vertices(right, 0.0));

        for chunk in [left, right] {
            assert_eq!(chunk.mesh(), &build_mesh(chunk.volume(), chunk.options()));
        }
    }

    #[test]
    fn edits_at_the_world_edge_skip_missing_neighbours() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        let report = grid
            .apply_edit(Vec3::new(0.0, 7.0, 8.0), false)
            .expect("edit in range");
        assert_eq!(report.remeshed, vec![ChunkOrigin::new(0, 0, 0)]);
        assert_eq!(report.skipped, vec![ChunkOrigin::new(-16, 0, 0)]);

        let report = grid
            .apply_edit(Vec3::new(-3.5, 7.0, -0.5), true)
            .expect("edit in range");
        assert!(report.remeshed.is_empty());
        assert!(!report.skipped.is_empty());

        let report = grid
            .apply_edit(Vec3::new(100.0, 7.0, 100.0), true)
            .expect("edit in range");
        assert!(report.remeshed.is_empty());
    }

    #[test]
    fn edits_beyond_the_lattice_are_no_ops() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        let far = Vec3::new(-3.0e9, 7.0, 8.0);

        let report = grid.apply_edit(far, false).expect("y is in range");
        assert!(report.remeshed.is_empty());
        assert_eq!(report.skipped.len(), 1);

        let report = grid.apply_brush(Brush {
            center: far,
            radius: 2.0,
            speed: 1.0,
            kind: EditKind::Add,
        });
        assert!(report.remeshed.is_empty());

        let report = grid.apply_edit(Vec3::new(4.0e9, 7.0, -4.0e9), true).expect("y is in range");
        assert!(report.remeshed.is_empty());

        assert!(grid.chunk_for(Vec3::new(1.0e10, 3.0, 8.0)).is_none());
    }

    #[test]
    fn edits_above_the_chunk_rows_are_rejected_untouched() {
        let mut grid = flat_grid(1, 1, 4, 4, 2.0);
        let before = grid.chunk(ChunkOrigin::default()).expect("chunk").mesh().clone();

        let err = grid.apply_edit(Vec3::new(1.0, 4.5, 1.0), true).unwrap_err();
        assert!(matches!(err, TerrainError::OutOfRange { .. }));
        assert!(grid.apply_edit(Vec3::new(1.0, -0.5, 1.0), false).is_err());
        assert_eq!(grid.chunk(ChunkOrigin::default()).expect("chunk").mesh(), &before);
    }

    #[test]
    fn brushes_are_clamped_and_reach_across_seams() {
        let mut grid = flat_grid(2, 1, 16, 16, 8.0);
        let brush = Brush {
            center: Vec3::new(16.0, 8.0, 8.0),
            radius: 40.0,
            speed: 3.0,
            kind: EditKind::Add,
        };
        let clamped = grid.clamp_brush(brush);
        assert_eq!(clamped.radius, 7.0);
        assert_eq!(clamped.speed, 1.0);

        let report = grid.apply_brush(Brush { radius: 2.0, ..brush });
        assert_eq!(report.seams, SeamMask::X);
        assert_eq!(report.remeshed.len(), 2);

        let left = grid.chunk(ChunkOrigin::new(0, 0, 0)).expect("left");
        let right = grid.chunk(ChunkOrigin::new(16, 0, 0)).expect("right");
        assert_eq!(left.volume().sample(IVec3::new(16, 8, 8)), Ok(1.0));
        assert_eq!(right.volume().sample(IVec3::new(0, 8, 8)), Ok(1.0));
        assert_eq!(face_vertices(left, 16.0), face_vertices(right, 0.0));
    }

    #[test]
    fn brushes_outside_the_rows_do_nothing() {
        let mut grid = flat_grid(1, 1, 8, 8, 4.0);
        let report = grid.apply_brush(Brush {
            center: Vec3::new(4.0, 30.0, 4.0),
            radius: 2.0,
            speed: 1.0,
            kind: EditKind::Remove,
        });
        assert!(report.remeshed.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn queued_edits_apply_in_order() {
        let mut grid = flat_grid(1, 1, 8, 8, 4.0);
        let (tx, rx) = edit_queue();
        tx.point(Vec3::new(3.0, 5.0, 3.0), true).expect("send");
        tx.point(Vec3::new(3.0, 5.0, 3.0), false).expect("send");
        tx.point(Vec3::new(3.0, 50.0, 3.0), true).expect("send");

        let results = grid.drain_edits(&rx);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());

        let chunk = grid.chunk(ChunkOrigin::default()).expect("chunk");
        assert_eq!(chunk.volume().sample(IVec3::new(3, 5, 3)), Ok(0.0));
        assert!(grid.drain_edits(&rx).is_empty());
    }

    #[derive(Default)]
    struct CountingSink {
        origins: Vec<ChunkOrigin>,
        triangles: usize,
    }

    impl MeshSink for CountingSink {
        fn submit(&mut self, origin: ChunkOrigin, mesh: &ChunkMesh) {
            self.origins.push(origin);
            self.triangles += mesh.triangle_count();
        }
    }

    #[test]
    fn submit_all_visits_chunks_in_origin_order() {
        let grid = flat_grid(2, 2, 4, 4, 2.0);
        let mut sink = CountingSink::default();
        grid.submit_all(&mut sink);

        assert_eq!(sink.origins.len(), 4);
        assert!(sink.origins.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(sink.triangles, grid.triangle_count());
    }

    #[test]
    fn config_drives_generation() {
        let config = TerrainConfig::from_toml_str(
            r#"
            chunks_wide = 2
            chunks_long = 1
            chunk_width = 8
            chunk_height = 24
            "#,
        )
        .expect("parse config");

        let grid = TerrainGrid::from_config(&config);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.layout().width, 8);
        // Noise surface sits between 5 and 15, well inside 24 rows.
        assert!(grid.chunks().iter().all(|c| !c.mesh().is_empty()));
    }
}
