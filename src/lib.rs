//! # exo-sieve
//!
//! exo-sieve reads Exodus II finite-element result files into per-object
//! unstructured meshes. It catalogs the blocks, sets, maps and result
//! variables of a file, groups scalar variables into vector and tensor
//! arrays, caches every array it derives in a byte-bounded LRU cache, and
//! assembles cell connectivity, squeezed point sets and field arrays for the
//! objects the caller selects.
//!
//! ## Layers
//! - [`io`]: the [`ExodusSource`](io::ExodusSource) record API the engine
//!   reads through, plus an in-memory implementation.
//! - [`catalog`]: object and array metadata, variable glomming.
//! - [`cache`]: the array cache and its keys.
//! - [`assembly`]: connectivity, points, sets, polyhedra and output.
//! - [`reader`]: the [`ExodusReader`](reader::ExodusReader) driver.
//!
//! ## Determinism
//!
//! Objects are visited in ascending id order and arrays in glommed order, so
//! the same file and settings always produce the same output.
//!
//! ## Shared arrays
//! Arrays are handed out as `Arc<DataArray>`. A handle held by the caller
//! pins the entry in the cache until it is dropped.

pub mod assembly;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod mesh_error;
pub mod reader;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::assembly::{ConnectivityGroup, MeshOutput, OutputSlot};
    pub use crate::cache::{ArrayCache, CacheKey, CacheKeyMask, CacheKind};
    pub use crate::catalog::Catalog;
    pub use crate::catalog::glom::{ArrayInfo, GlomKind};
    pub use crate::catalog::object::{ConnectivityKind, ObjectType, VarType};
    pub use crate::config::ReaderSettings;
    pub use crate::data::array::{DataArray, SharedArray};
    pub use crate::data::cell_array::CellArray;
    pub use crate::data::unstructured::{FieldData, UnstructuredMesh};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::ExodusSource;
    pub use crate::io::memory::{InMemoryExodus, MemBlock, MemSet};
    pub use crate::mesh_error::MeshIoError;
    pub use crate::reader::ExodusReader;
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::cell_type::CellType;
}
