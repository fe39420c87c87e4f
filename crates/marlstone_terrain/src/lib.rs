pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod grid;
pub mod height;
pub mod marching;
pub mod mesh;
pub mod seam;
pub mod tables;
pub mod volume;

pub use chunk::Chunk;
pub use config::{ConfigError, TerrainConfig};
pub use coords::{ChunkLayout, ChunkOrigin};
pub use error::TerrainError;
pub use grid::{EditReport, TerrainGrid};
pub use mesh::{ChunkMesh, MeshSink};
