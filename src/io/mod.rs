//! Record-level access to Exodus files.
//!
//! The engine never parses files itself. It talks to an [`ExodusSource`],
//! a thin layer over the file's record API, and builds everything else
//! (catalog, cached arrays, output meshes) on top of it.
//!
//! All object, variable and attribute indices are 0-based. Connectivity,
//! set entries and maps are returned exactly as stored, i.e. with 1-based
//! entity ids.

pub mod memory;

pub use memory::InMemoryExodus;

use crate::catalog::object::{ObjectType, VarType};
use crate::mesh_error::MeshIoError;

/// Global model parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelParameters {
    pub title: String,
    pub num_dim: usize,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub num_faces: usize,
    pub num_elems: usize,
}

impl ModelParameters {
    /// Number of entities a map of `map_type` spans.
    pub fn map_length(&self, map_type: ObjectType) -> usize {
        match map_type {
            ObjectType::NodeMap => self.num_nodes,
            ObjectType::EdgeMap => self.num_edges,
            ObjectType::FaceMap => self.num_faces,
            ObjectType::ElemMap => self.num_elems,
            _ => 0,
        }
    }
}

/// Declared parameters of one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockParams {
    pub type_name: String,
    pub size: usize,
    pub nodes_per_entry: usize,
    pub edges_per_entry: usize,
    pub faces_per_entry: usize,
    pub attributes: usize,
}

/// Declared parameters of one set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetParams {
    pub size: usize,
    pub distribution_factors: usize,
}

/// Entity connectivity stored with a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnEntity {
    Node,
    Edge,
    Face,
}

/// Members of a set plus their per-entry extra column.
///
/// The extra column holds orientations for edge and face sets and local side
/// numbers for side sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetEntries {
    pub entries: Vec<i64>,
    pub extra: Option<Vec<i64>>,
}

/// Node list of a side set: a node count per side followed by the nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideSetNodes {
    pub counts: Vec<i64>,
    pub nodes: Vec<i64>,
}

/// Low-level record API of an Exodus file.
///
/// Implementations report failures as [`MeshIoError::Source`]. Methods with
/// default bodies describe optional records.
pub trait ExodusSource {
    fn model_parameters(&self) -> Result<ModelParameters, MeshIoError>;

    fn times(&self) -> Result<Vec<f64>, MeshIoError>;

    /// Ids of all objects of `object_type`, in file order.
    fn object_ids(&self, object_type: ObjectType) -> Result<Vec<i64>, MeshIoError>;

    /// Names in file order; may be shorter than the id list or blank.
    fn object_names(&self, object_type: ObjectType) -> Result<Vec<String>, MeshIoError>;

    fn block_params(&self, object_type: ObjectType, id: i64) -> Result<BlockParams, MeshIoError>;

    fn set_params(&self, object_type: ObjectType, id: i64) -> Result<SetParams, MeshIoError>;

    fn attribute_names(
        &self,
        object_type: ObjectType,
        id: i64,
    ) -> Result<Vec<String>, MeshIoError> {
        let count = self.block_params(object_type, id)?.attributes;
        Ok(vec![String::new(); count])
    }

    fn variable_names(&self, var_type: VarType) -> Result<Vec<String>, MeshIoError>;

    /// One row per object in file order, one column per variable.
    ///
    /// Files without a truth table define every variable everywhere.
    fn truth_table(&self, var_type: VarType) -> Result<Vec<Vec<bool>>, MeshIoError> {
        let objects = match var_type.object_type() {
            Some(ot) => self.object_ids(ot)?.len(),
            None => 1,
        };
        let vars = self.variable_names(var_type)?.len();
        Ok(vec![vec![true; vars]; objects])
    }

    /// Values of variable `var` at `step` over all entries of object `id`.
    /// `id` is ignored for nodal and global variables.
    fn variable_values(
        &self,
        var_type: VarType,
        step: usize,
        var: usize,
        id: i64,
    ) -> Result<Vec<f64>, MeshIoError>;

    /// Global variable `var` at every time step.
    fn global_values_over_time(&self, var: usize) -> Result<Vec<f64>, MeshIoError> {
        let steps = self.times()?.len();
        let mut out = Vec::with_capacity(steps);
        for step in 0..steps {
            let values = self.variable_values(VarType::Global, step, var, 0)?;
            let value = values.first().copied().ok_or_else(|| {
                MeshIoError::Source(format!("global variable {var} missing at step {step}"))
            })?;
            out.push(value);
        }
        Ok(out)
    }

    /// One coordinate vector per spatial dimension.
    fn coordinates(&self) -> Result<Vec<Vec<f64>>, MeshIoError>;

    fn connectivity(
        &self,
        object_type: ObjectType,
        id: i64,
        entity: ConnEntity,
    ) -> Result<Vec<i64>, MeshIoError>;

    /// Per-entry node counts (polygons) or face counts (polyhedra).
    fn entity_counts(&self, object_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError>;

    fn set_entries(&self, object_type: ObjectType, id: i64) -> Result<SetEntries, MeshIoError>;

    fn side_set_nodes(&self, id: i64) -> Result<SideSetNodes, MeshIoError>;

    fn attribute_values(
        &self,
        object_type: ObjectType,
        id: i64,
        attribute: usize,
    ) -> Result<Vec<f64>, MeshIoError>;

    fn map_values(&self, map_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError>;

    /// Legacy file-wide node or element numbering, when present.
    fn id_map(&self, _map_type: ObjectType) -> Result<Option<Vec<i64>>, MeshIoError> {
        Ok(None)
    }

    fn info_records(&self) -> Result<Vec<String>, MeshIoError> {
        Ok(Vec::new())
    }

    /// Code name, code version, date and time per record.
    fn qa_records(&self) -> Result<Vec<[String; 4]>, MeshIoError> {
        Ok(Vec::new())
    }
}

impl<T: ExodusSource + ?Sized> ExodusSource for &T {
    fn model_parameters(&self) -> Result<ModelParameters, MeshIoError> {
        (**self).model_parameters()
    }
    fn times(&self) -> Result<Vec<f64>, MeshIoError> {
        (**self).times()
    }
    fn object_ids(&self, object_type: ObjectType) -> Result<Vec<i64>, MeshIoError> {
        (**self).object_ids(object_type)
    }
    fn object_names(&self, object_type: ObjectType) -> Result<Vec<String>, MeshIoError> {
        (**self).object_names(object_type)
    }
    fn block_params(&self, object_type: ObjectType, id: i64) -> Result<BlockParams, MeshIoError> {
        (**self).block_params(object_type, id)
    }
    fn set_params(&self, object_type: ObjectType, id: i64) -> Result<SetParams, MeshIoError> {
        (**self).set_params(object_type, id)
    }
    fn attribute_names(
        &self,
        object_type: ObjectType,
        id: i64,
    ) -> Result<Vec<String>, MeshIoError> {
        (**self).attribute_names(object_type, id)
    }
    fn variable_names(&self, var_type: VarType) -> Result<Vec<String>, MeshIoError> {
        (**self).variable_names(var_type)
    }
    fn truth_table(&self, var_type: VarType) -> Result<Vec<Vec<bool>>, MeshIoError> {
        (**self).truth_table(var_type)
    }
    fn variable_values(
        &self,
        var_type: VarType,
        step: usize,
        var: usize,
        id: i64,
    ) -> Result<Vec<f64>, MeshIoError> {
        (**self).variable_values(var_type, step, var, id)
    }
    fn global_values_over_time(&self, var: usize) -> Result<Vec<f64>, MeshIoError> {
        (**self).global_values_over_time(var)
    }
    fn coordinates(&self) -> Result<Vec<Vec<f64>>, MeshIoError> {
        (**self).coordinates()
    }
    fn connectivity(
        &self,
        object_type: ObjectType,
        id: i64,
        entity: ConnEntity,
    ) -> Result<Vec<i64>, MeshIoError> {
        (**self).connectivity(object_type, id, entity)
    }
    fn entity_counts(&self, object_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError> {
        (**self).entity_counts(object_type, id)
    }
    fn set_entries(&self, object_type: ObjectType, id: i64) -> Result<SetEntries, MeshIoError> {
        (**self).set_entries(object_type, id)
    }
    fn side_set_nodes(&self, id: i64) -> Result<SideSetNodes, MeshIoError> {
        (**self).side_set_nodes(id)
    }
    fn attribute_values(
        &self,
        object_type: ObjectType,
        id: i64,
        attribute: usize,
    ) -> Result<Vec<f64>, MeshIoError> {
        (**self).attribute_values(object_type, id, attribute)
    }
    fn map_values(&self, map_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError> {
        (**self).map_values(map_type, id)
    }
    fn id_map(&self, map_type: ObjectType) -> Result<Option<Vec<i64>>, MeshIoError> {
        (**self).id_map(map_type)
    }
    fn info_records(&self) -> Result<Vec<String>, MeshIoError> {
        (**self).info_records()
    }
    fn qa_records(&self) -> Result<Vec<[String; 4]>, MeshIoError> {
        (**self).qa_records()
    }
}
