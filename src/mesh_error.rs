//! MeshIoError: unified error type for exo-sieve public APIs
//!
//! Every fallible operation in the crate returns `Result<T, MeshIoError>`.
//! Object-local failures during assembly are captured as values of this type
//! in the output diagnostics instead of aborting the whole time step.

use thiserror::Error;

use crate::catalog::object::{ObjectType, VarType};

/// Unified error type for catalog, cache and assembly operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshIoError {
    /// The underlying record API reported a failure.
    #[error("source read failed: {0}")]
    Source(String),
    /// File data did not have the expected shape or content.
    #[error("mesh IO parse error: {0}")]
    MeshIoParse(String),
    /// A block declared a type name that no cell family matches.
    #[error("unsupported element type `{type_name}` with {nodes_per_entry} nodes per entry")]
    UnsupportedElementType {
        type_name: String,
        nodes_per_entry: usize,
    },
    /// Operation requires a loaded catalog.
    #[error("metadata has not been loaded")]
    MetadataNotLoaded,
    /// Object index (file order or sorted order) outside the collection.
    #[error("no {object_type:?} object at index {index} (have {count})")]
    ObjectIndexOutOfRange {
        object_type: ObjectType,
        index: usize,
        count: usize,
    },
    /// Lookup by name failed.
    #[error("no {object_type:?} object named `{name}`")]
    UnknownObjectName {
        object_type: ObjectType,
        name: String,
    },
    /// Logical array index outside the glommed array list.
    #[error("no {var_type:?} array at index {index} (have {count})")]
    ArrayIndexOutOfRange {
        var_type: VarType,
        index: usize,
        count: usize,
    },
    /// Attribute index outside the block's attribute list.
    #[error("block {block} has no attribute {index}")]
    AttributeIndexOutOfRange { block: usize, index: usize },
    /// Requested time step beyond the file's time values.
    #[error("time step {step} out of range (file has {count} steps)")]
    TimeStepOutOfRange { step: usize, count: usize },
    /// Cell connectivity could not be read for an object.
    #[error("connectivity for {object_type:?} object {index} is unavailable")]
    MissingConnectivity { object_type: ObjectType, index: usize },
    /// Per-cell node or face counts could not be read.
    #[error("entity counts for {object_type:?} object {index} are unavailable")]
    MissingEntityCounts { object_type: ObjectType, index: usize },
    /// Polyhedral face data could not be resolved.
    #[error("face data for polyhedral block {index} is unavailable: {reason}")]
    MissingFaceData { index: usize, reason: String },
    /// The requested cache key kind has no reader.
    #[error("array kind {0:?} cannot be read from the source")]
    UnreadableArray(String),
    /// A data-structure invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
