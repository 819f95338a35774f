//! Turning cached arrays into per-object unstructured meshes.
//!
//! - [`connectivity`]: block cells, point remapping and coordinates.
//! - [`polyhedra`]: `NFACED` blocks through a face-block cache.
//! - [`sets`]: node, edge, face, element and side set cells.
//! - [`procedural`]: id arrays derived from metadata.
//! - [`output`]: the per-time-step driver and output container.

pub mod connectivity;
pub mod output;
pub mod polyhedra;
pub mod procedural;
pub mod sets;

pub use output::{ConnectivityGroup, MeshOutput, OutputSlot, assemble_time_step};
