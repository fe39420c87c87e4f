//! Marching-cubes surface extraction over a chunk [`Volume`].
//!
//! Cubes are visited with `x` outermost, then `y`, then `z`, and each cube's
//! triangles are emitted in table order, so a given volume and option set
//! always produces the same vertex and index sequences.

use glam::{IVec3, Vec3};

use crate::mesh::ChunkMesh;
use crate::tables::{triangle_edges, CORNER_OFFSETS, EDGE_CORNERS};
use crate::volume::{Volume, SURFACE_THRESHOLD};

const HIGHLAND_MIN_Y: f32 = 1.5;
// Dark olive green and dark khaki.
const HIGHLAND_COLOR: [f32; 3] = [0.333, 0.420, 0.184];
const LOWLAND_COLOR: [f32; 3] = [0.741, 0.718, 0.420];

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshOptions {
    /// Interpolate vertices along each edge; otherwise use edge midpoints.
    pub smooth: bool,
    pub vertex_colors: bool,
    pub threshold: f32,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            smooth: true,
            vertex_colors: false,
            threshold: SURFACE_THRESHOLD,
        }
    }
}

/// Bit `i` is set when corner `i` is strictly above `threshold`.
pub fn cube_configuration(cube: &[f32; 8], threshold: f32) -> u8 {
    let mut configuration = 0u8;
    for (corner, &sample) in cube.iter().enumerate() {
        if sample > threshold {
            configuration |= 1 << corner;
        }
    }
    configuration
}

/// Position of the surface crossing along an edge, as a fraction from the
/// first endpoint.
///
/// Equal endpoint samples fall back to `threshold` itself. The result is not
/// clamped to `[0, 1]`; with non-monotonic samples the vertex can leave the
/// edge.
pub fn edge_crossing(threshold: f32, from: f32, to: f32) -> f32 {
    let diff = to - from;
    if diff == 0.0 {
        threshold
    } else {
        (threshold - from) / diff
    }
}

/// Appends the triangles for the unit cube whose minimum corner is `cube_pos`.
/// Returns the number of triangles emitted.
pub fn march_cube(
    volume: &Volume,
    cube_pos: IVec3,
    options: &MeshOptions,
    mesh: &mut ChunkMesh,
) -> usize {
    let cube = cube_samples(volume, cube_pos);
    let configuration = cube_configuration(&cube, options.threshold);
    if configuration == 0 || configuration == u8::MAX {
        return 0;
    }

    let color = options.vertex_colors.then(|| {
        if cube_pos.y as f32 > HIGHLAND_MIN_Y {
            HIGHLAND_COLOR
        } else {
            LOWLAND_COLOR
        }
    });

    let mut emitted = 0;
    for edge in triangle_edges(configuration) {
        let [c0, c1] = EDGE_CORNERS[edge];
        let vert1 = (cube_pos + CORNER_OFFSETS[c0]).as_vec3();
        let vert2 = (cube_pos + CORNER_OFFSETS[c1]).as_vec3();

        let position = if options.smooth {
            let t = edge_crossing(options.threshold, cube[c0], cube[c1]);
            vert1 + (vert2 - vert1) * t
        } else {
            (vert1 + vert2) / 2.0
        };

        mesh.push_vertex(position, color);
        emitted += 1;
    }
    emitted / 3
}

/// Appends the surface of every cube in `volume` to `mesh`.
pub fn march_volume(volume: &Volume, options: &MeshOptions, mesh: &mut ChunkMesh) {
    let dims = volume.dimensions();
    for x in 0..dims.x {
        for y in 0..dims.y {
            for z in 0..dims.z {
                march_cube(volume, IVec3::new(x, y, z), options, mesh);
            }
        }
    }
}

pub fn build_mesh(volume: &Volume, options: &MeshOptions) -> ChunkMesh {
    let mut mesh = ChunkMesh::default();
    march_volume(volume, options, &mut mesh);
    mesh
}

/// Corner samples of the cube at `cube_pos`, in corner-table order.
pub fn cube_samples(volume: &Volume, cube_pos: IVec3) -> [f32; 8] {
    std::array::from_fn(|i| volume.at(cube_pos + CORNER_OFFSETS[i]))
}

/// Whether two corners of a triangle coincide.
pub fn is_degenerate(triangle: &[Vec3; 3]) -> bool {
    triangle[0] == triangle[1] || triangle[1] == triangle[2] || triangle[0] == triangle[2]
}
