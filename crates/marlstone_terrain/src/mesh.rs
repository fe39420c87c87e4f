use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::coords::ChunkOrigin;

/// Interleaved vertex layout for GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}
const _: [(); 24] = [(); std::mem::size_of::<MeshVertex>()];

/// Triangle soup for one chunk, in chunk-local space.
///
/// Every triangle corner owns its own vertex; nothing is welded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Empty unless the mesh was built with vertex colours.
    pub colors: Vec<[f32; 3]>,
}

impl ChunkMesh {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.colors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub(crate) fn push_vertex(&mut self, position: Vec3, color: Option<[f32; 3]>) {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        if let Some(color) = color {
            self.colors.push(color);
        }
        self.indices.push(index);
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Axis-aligned bounds of all vertices, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
        )
    }

    /// Index count is a multiple of three and every index names a vertex.
    pub fn is_well_formed(&self) -> bool {
        let vertex_count = self.vertices.len();
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < vertex_count)
            && (self.colors.is_empty() || self.colors.len() == vertex_count)
    }

    /// Interleaved copy for upload. Vertices without colour get white.
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| MeshVertex {
                position: position.to_array(),
                color: self.colors.get(i).copied().unwrap_or([1.0; 3]),
            })
            .collect()
    }

    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn indices_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Receives finished chunk meshes for rendering and collision shape building.
pub trait MeshSink {
    fn submit(&mut self, origin: ChunkOrigin, mesh: &ChunkMesh);
}
