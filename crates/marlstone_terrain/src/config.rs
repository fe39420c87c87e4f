use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::coords::ChunkLayout;
use crate::marching::MeshOptions;
use crate::volume::SURFACE_THRESHOLD;

/// Largest accepted chunk width or height, in cubes.
pub const MAX_CHUNK_DIMENSION: u32 = 256;
/// Largest accepted number of chunks along either grid axis.
pub const MAX_GRID_CHUNKS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub seed: u32,
    pub base_height: f32,
    pub height_range: f32,
    pub frequency: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            base_height: 10.0,
            height_range: 5.0,
            frequency: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub chunks_wide: u32,
    pub chunks_long: u32,
    pub chunk_width: u32,
    pub chunk_height: u32,
    pub smooth: bool,
    pub vertex_colors: bool,
    pub surface: SurfaceConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunks_wide: 10,
            chunks_long: 10,
            chunk_width: 16,
            chunk_height: 16,
            smooth: true,
            vertex_colors: false,
            surface: SurfaceConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read terrain config {}: {source}", path.display())
            }
            Self::Parse(source) => write!(f, "failed to parse terrain config: {source}"),
            Self::Invalid(reason) => write!(f, "invalid terrain config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl TerrainConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunks_wide == 0 || self.chunks_long == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one chunk, got {}x{}",
                self.chunks_wide, self.chunks_long
            )));
        }
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "chunk dimensions must be non-zero, got {}x{}",
                self.chunk_width, self.chunk_height
            )));
        }
        if self.chunks_wide > MAX_GRID_CHUNKS || self.chunks_long > MAX_GRID_CHUNKS {
            return Err(ConfigError::Invalid(format!(
                "grid of {}x{} chunks exceeds {MAX_GRID_CHUNKS} per axis",
                self.chunks_wide, self.chunks_long
            )));
        }
        if self.chunk_width > MAX_CHUNK_DIMENSION || self.chunk_height > MAX_CHUNK_DIMENSION {
            return Err(ConfigError::Invalid(format!(
                "chunk dimensions {}x{} exceed {MAX_CHUNK_DIMENSION}",
                self.chunk_width, self.chunk_height
            )));
        }
        if !self.surface.frequency.is_finite() {
            return Err(ConfigError::Invalid(
                "surface frequency must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn layout(&self) -> ChunkLayout {
        ChunkLayout::new(self.chunk_width, self.chunk_height)
    }

    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            smooth: self.smooth,
            vertex_colors: self.vertex_colors,
            threshold: SURFACE_THRESHOLD,
        }
    }
}
