//! Per-frame culling: frustum plane tests and distance-based LOD

mod frustum;
mod lod;

pub use frustum::FrustumCuller;
pub use lod::{AdaptiveBias, LodClassifier, LodLevel};
