use std::fmt;

use glam::IVec3;

use crate::coords::ChunkOrigin;

#[derive(Debug, Clone, PartialEq)]
pub enum TerrainError {
    /// A sample was addressed outside a volume's `[0, dimension]` extent.
    OutOfRange { point: IVec3, dimensions: IVec3 },
    /// No chunk was generated at this origin.
    UnknownChunk { origin: ChunkOrigin },
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { point, dimensions } => write!(
                f,
                "sample ({}, {}, {}) is outside volume extent ({}, {}, {})",
                point.x, point.y, point.z, dimensions.x, dimensions.y, dimensions.z
            ),
            Self::UnknownChunk { origin } => {
                write!(f, "no chunk at origin ({}, {}, {})", origin.x, origin.y, origin.z)
            }
        }
    }
}

impl std::error::Error for TerrainError {}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::TerrainError;
    use crate::coords::ChunkOrigin;

    #[test]
    fn messages_name_the_offending_coordinates() {
        let err = TerrainError::OutOfRange {
            point: IVec3::new(17, 0, -1),
            dimensions: IVec3::new(16, 16, 16),
        };
        assert_eq!(
            err.to_string(),
            "sample (17, 0, -1) is outside volume extent (16, 16, 16)"
        );

        let err = TerrainError::UnknownChunk {
            origin: ChunkOrigin::new(-16, 0, 32),
        };
        assert_eq!(err.to_string(), "no chunk at origin (-16, 0, 32)");
    }
}
