//! Cell families and point bookkeeping shared by the catalog and assembly.
//!
//! - [`cell_type`]: cell families and element type name inference.
//! - [`reorder`]: node order tables for higher-order cells.
//! - [`point_map`]: file point id to output point id squeezing.
//! - [`cache`]: the [`InvalidateCache`] trait.

pub mod cache;
pub mod cell_type;
pub mod point_map;
pub mod reorder;

pub use cache::InvalidateCache;
pub use cell_type::{CellShape, CellType};
pub use point_map::PointMap;
