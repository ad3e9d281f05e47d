//! Visibility decisions
//!
//! Builds on the connectivity graph to answer "is this cell visible from
//! that observer" cheaply: group membership first, then a per-region cache,
//! and only on a cache miss the 3-D sight-line walk. Every failure path in
//! this module resolves to "visible" - hiding content incorrectly is a
//! worse defect than a missed optimization.

mod line_of_sight;
mod oracle;
mod region_cache;

pub use line_of_sight::{cells_between, connected_by_door, has_line_of_sight, DOOR_BRIDGE_RANGE};
pub use oracle::{ObserverState, VisibilityOracle};
pub use region_cache::RegionVisibilityCache;

use crate::foundation::collections::new_key_type;

new_key_type! {
    /// Stable handle for a registered observer
    pub struct ObserverKey;
}
