//! Material identity and coarse material classification

use serde::{Deserialize, Serialize};

/// Opaque identifier for a voxel material, assigned by the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Coarse material bucket so visually similar surfaces share a draw batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialClass {
    /// Stone-like surfaces
    Stone,
    /// Wooden surfaces, including logs and planks
    Wood,
    /// Soil, grass and similar ground cover
    Dirt,
    /// Sand and gravel
    Sand,
    /// Transparent panes and blocks
    Glass,
    /// Metallic surfaces
    Metal,
    /// Everything else
    Other,
}

impl std::fmt::Display for MaterialClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stone => "stone",
            Self::Wood => "wood",
            Self::Dirt => "dirt",
            Self::Sand => "sand",
            Self::Glass => "glass",
            Self::Metal => "metal",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}
