//! Spatial data model: patch limits, dense grids and the maps built on them

/// Sky and redshift limits
pub mod boundaries;
/// Dense multi-plane grids
pub mod grid;
/// Shear and convergence maps
pub mod maps;
/// Observed-pixel masks
pub mod mask;

pub use boundaries::Boundaries;
pub use grid::Grid;
pub use maps::{ConvergenceMap, ShearMap};
pub use mask::Mask;
