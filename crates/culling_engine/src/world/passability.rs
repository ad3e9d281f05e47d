//! Pluggable passability rules for flood fill and line-of-sight
//!
//! The connectivity graph and the sight-line walker share one notion of
//! "can space flow through this cell". It is injected as a strategy so the
//! host can swap or compose rules without touching the graph itself.

use super::{GridCoordinate, MaterialClass, WorldQuery, WorldQueryError};

/// Strategy deciding whether a cell lets space (and sight) pass through
pub trait Passability: Send + Sync {
    /// Whether flood fill and sight lines may traverse the cell
    fn is_passable(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
    ) -> Result<bool, WorldQueryError>;
}

/// Default rule: empty space and anything that does not occlude passes,
/// plus a configurable allow-list of material classes.
///
/// Door-class cells deliberately do NOT pass: rooms on either side of a
/// door stay in separate connectivity groups, and the gate is resolved
/// per query from the door's dynamic open state.
#[derive(Debug, Clone)]
pub struct TransparentPassability {
    allow_classes: Vec<MaterialClass>,
}

impl Default for TransparentPassability {
    fn default() -> Self {
        Self {
            allow_classes: vec![MaterialClass::Glass],
        }
    }
}

impl TransparentPassability {
    /// Create a rule with an explicit allow-list of material classes
    pub fn with_allowed(allow_classes: Vec<MaterialClass>) -> Self {
        Self { allow_classes }
    }
}

impl Passability for TransparentPassability {
    fn is_passable(
        &self,
        world: &dyn WorldQuery,
        coord: GridCoordinate,
    ) -> Result<bool, WorldQueryError> {
        let material = world.material_at(coord)?;
        if !world.is_opaque(material) {
            return Ok(true);
        }
        Ok(self.allow_classes.contains(&world.material_class(material)))
    }
}
