//! Data module: arrays, cell arrays and per-object meshes

/// Named, typed, multi-component value arrays.
pub mod array;
/// Flat cell storage with per-cell types and offsets.
pub mod cell_array;
/// Per-object mesh and attached field data.
pub mod unstructured;

pub use array::{ArrayValues, DataArray, SharedArray};
pub use cell_array::{CellArray, CellRef};
pub use unstructured::{FieldData, UnstructuredMesh};
