//! An [`ExodusSource`] backed by in-memory records.
//!
//! Used to drive the engine without a file, e.g. from a converter that
//! already holds the mesh or from tests.
//!
//! ```
//! use exo_sieve::io::{ExodusSource, InMemoryExodus, memory::MemBlock};
//! use exo_sieve::catalog::object::ObjectType;
//!
//! let src = InMemoryExodus::new("demo", 2)
//!     .with_coordinates(vec![vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0]])
//!     .with_block(ObjectType::ElemBlock, MemBlock::new(1, "QUAD4", 4, vec![1, 2, 3, 4]));
//! assert_eq!(src.model_parameters().unwrap().num_elems, 1);
//! ```

use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::{
    BlockParams, ConnEntity, ExodusSource, ModelParameters, SetEntries, SetParams, SideSetNodes,
};
use crate::catalog::object::{ObjectType, VarType};
use crate::mesh_error::MeshIoError;

/// Block records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemBlock {
    pub id: i64,
    pub name: String,
    pub params: BlockParams,
    pub nodes: Vec<i64>,
    pub edges: Option<Vec<i64>>,
    pub faces: Option<Vec<i64>>,
    pub entity_counts: Option<Vec<i64>>,
    pub attributes: Vec<(String, Vec<f64>)>,
}

impl MemBlock {
    /// Fixed-size block; the entry count follows from the connectivity length.
    pub fn new(id: i64, type_name: &str, nodes_per_entry: usize, nodes: Vec<i64>) -> Self {
        let size = if nodes_per_entry == 0 {
            0
        } else {
            nodes.len() / nodes_per_entry
        };
        Self {
            id,
            params: BlockParams {
                type_name: type_name.to_string(),
                size,
                nodes_per_entry,
                ..Default::default()
            },
            nodes,
            ..Default::default()
        }
    }

    /// Polygon block (`NSIDED`): `counts[i]` nodes for entry `i`.
    pub fn polygons(id: i64, counts: Vec<i64>, nodes: Vec<i64>) -> Self {
        let mut block = Self::new(id, "NSIDED", 0, nodes);
        block.params.nodes_per_entry = block.nodes.len();
        block.params.size = counts.len();
        block.entity_counts = Some(counts);
        block
    }

    /// Polyhedron block (`NFACED`): `face_counts[i]` faces for entry `i`,
    /// `faces` lists 1-based face ids of the file's face blocks.
    pub fn polyhedra(id: i64, face_counts: Vec<i64>, faces: Vec<i64>) -> Self {
        let mut block = Self::new(id, "NFACED", 0, Vec::new());
        block.params.size = face_counts.len();
        block.params.faces_per_entry = faces.len();
        block.entity_counts = Some(face_counts);
        block.faces = Some(faces);
        block
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_attribute(mut self, name: &str, values: Vec<f64>) -> Self {
        self.attributes.push((name.to_string(), values));
        self.params.attributes = self.attributes.len();
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.params.size = size;
        self
    }
}

/// Set records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemSet {
    pub id: i64,
    pub name: String,
    pub entries: SetEntries,
    pub distribution_factors: usize,
    pub side_nodes: Option<SideSetNodes>,
}

impl MemSet {
    pub fn new(id: i64, entries: Vec<i64>) -> Self {
        Self {
            id,
            entries: SetEntries {
                entries,
                extra: None,
            },
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, extra: Vec<i64>) -> Self {
        self.entries.extra = Some(extra);
        self
    }

    pub fn with_side_nodes(mut self, counts: Vec<i64>, nodes: Vec<i64>) -> Self {
        self.side_nodes = Some(SideSetNodes { counts, nodes });
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct MemVariables {
    names: Vec<String>,
    truth: Option<Vec<Vec<bool>>>,
    values: HashMap<(usize, usize, i64), Vec<f64>>,
}

/// Complete in-memory file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryExodus {
    title: String,
    num_dim: usize,
    times: Vec<f64>,
    coordinates: Vec<Vec<f64>>,
    blocks: BTreeMap<ObjectType, Vec<MemBlock>>,
    sets: BTreeMap<ObjectType, Vec<MemSet>>,
    maps: BTreeMap<ObjectType, Vec<(i64, String, Vec<i64>)>>,
    variables: BTreeMap<VarType, MemVariables>,
    id_maps: BTreeMap<ObjectType, Vec<i64>>,
    info: Vec<String>,
    qa: Vec<[String; 4]>,
}

fn missing(what: impl std::fmt::Display) -> MeshIoError {
    MeshIoError::Source(format!("no record for {what}"))
}

impl InMemoryExodus {
    pub fn new(title: &str, num_dim: usize) -> Self {
        Self {
            title: title.to_string(),
            num_dim,
            ..Default::default()
        }
    }

    pub fn with_coordinates(mut self, coordinates: Vec<Vec<f64>>) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = times;
        self
    }

    pub fn with_block(mut self, block_type: ObjectType, block: MemBlock) -> Self {
        self.blocks.entry(block_type).or_default().push(block);
        self
    }

    pub fn with_set(mut self, set_type: ObjectType, set: MemSet) -> Self {
        self.sets.entry(set_type).or_default().push(set);
        self
    }

    pub fn with_map(mut self, map_type: ObjectType, id: i64, name: &str, values: Vec<i64>) -> Self {
        self.maps
            .entry(map_type)
            .or_default()
            .push((id, name.to_string(), values));
        self
    }

    pub fn with_id_map(mut self, map_type: ObjectType, values: Vec<i64>) -> Self {
        self.id_maps.insert(map_type, values);
        self
    }

    /// Declares the variables of `var_type`; `truth` rows follow object file order.
    pub fn with_variables(
        mut self,
        var_type: VarType,
        names: &[&str],
        truth: Option<Vec<Vec<bool>>>,
    ) -> Self {
        let vars = self.variables.entry(var_type).or_default();
        vars.names = names.iter().map(|s| s.to_string()).collect();
        vars.truth = truth;
        self
    }

    /// Stores values of variable `var` at `step` for object `id`
    /// (use 0 for nodal and global variables).
    pub fn with_values(
        mut self,
        var_type: VarType,
        step: usize,
        var: usize,
        id: i64,
        values: Vec<f64>,
    ) -> Self {
        self.variables
            .entry(var_type)
            .or_default()
            .values
            .insert((step, var, id), values);
        self
    }

    pub fn with_info(mut self, info: Vec<String>) -> Self {
        self.info = info;
        self
    }

    pub fn with_qa(mut self, qa: Vec<[String; 4]>) -> Self {
        self.qa = qa;
        self
    }

    fn block(&self, block_type: ObjectType, id: i64) -> Result<&MemBlock, MeshIoError> {
        self.blocks
            .get(&block_type)
            .and_then(|b| b.iter().find(|b| b.id == id))
            .ok_or_else(|| missing(format_args!("{block_type:?} {id}")))
    }

    fn set(&self, set_type: ObjectType, id: i64) -> Result<&MemSet, MeshIoError> {
        self.sets
            .get(&set_type)
            .and_then(|s| s.iter().find(|s| s.id == id))
            .ok_or_else(|| missing(format_args!("{set_type:?} {id}")))
    }

    fn block_total(&self, block_type: ObjectType) -> usize {
        self.blocks
            .get(&block_type)
            .map(|b| b.iter().map(|b| b.params.size).sum())
            .unwrap_or(0)
    }
}

impl ExodusSource for InMemoryExodus {
    fn model_parameters(&self) -> Result<ModelParameters, MeshIoError> {
        Ok(ModelParameters {
            title: self.title.clone(),
            num_dim: self.num_dim,
            num_nodes: self.coordinates.first().map_or(0, Vec::len),
            num_edges: self.block_total(ObjectType::EdgeBlock),
            num_faces: self.block_total(ObjectType::FaceBlock),
            num_elems: self.block_total(ObjectType::ElemBlock),
        })
    }

    fn times(&self) -> Result<Vec<f64>, MeshIoError> {
        Ok(self.times.clone())
    }

    fn object_ids(&self, object_type: ObjectType) -> Result<Vec<i64>, MeshIoError> {
        let ids = if object_type.is_block() {
            self.blocks
                .get(&object_type)
                .map(|b| b.iter().map(|b| b.id).collect())
        } else if object_type.is_set() {
            self.sets
                .get(&object_type)
                .map(|s| s.iter().map(|s| s.id).collect())
        } else {
            self.maps
                .get(&object_type)
                .map(|m| m.iter().map(|m| m.0).collect())
        };
        Ok(ids.unwrap_or_default())
    }

    fn object_names(&self, object_type: ObjectType) -> Result<Vec<String>, MeshIoError> {
        let names = if object_type.is_block() {
            self.blocks
                .get(&object_type)
                .map(|b| b.iter().map(|b| b.name.clone()).collect())
        } else if object_type.is_set() {
            self.sets
                .get(&object_type)
                .map(|s| s.iter().map(|s| s.name.clone()).collect())
        } else {
            self.maps
                .get(&object_type)
                .map(|m| m.iter().map(|m| m.1.clone()).collect())
        };
        Ok(names.unwrap_or_default())
    }

    fn block_params(&self, object_type: ObjectType, id: i64) -> Result<BlockParams, MeshIoError> {
        Ok(self.block(object_type, id)?.params.clone())
    }

    fn set_params(&self, object_type: ObjectType, id: i64) -> Result<SetParams, MeshIoError> {
        let set = self.set(object_type, id)?;
        Ok(SetParams {
            size: set.entries.entries.len(),
            distribution_factors: set.distribution_factors,
        })
    }

    fn attribute_names(
        &self,
        object_type: ObjectType,
        id: i64,
    ) -> Result<Vec<String>, MeshIoError> {
        Ok(self
            .block(object_type, id)?
            .attributes
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    fn variable_names(&self, var_type: VarType) -> Result<Vec<String>, MeshIoError> {
        Ok(self
            .variables
            .get(&var_type)
            .map(|v| v.names.clone())
            .unwrap_or_default())
    }

    fn truth_table(&self, var_type: VarType) -> Result<Vec<Vec<bool>>, MeshIoError> {
        if let Some(truth) = self.variables.get(&var_type).and_then(|v| v.truth.clone()) {
            return Ok(truth);
        }
        let objects = match var_type.object_type() {
            Some(ot) => self.object_ids(ot)?.len(),
            None => 1,
        };
        let vars = self.variable_names(var_type)?.len();
        Ok(vec![vec![true; vars]; objects])
    }

    fn variable_values(
        &self,
        var_type: VarType,
        step: usize,
        var: usize,
        id: i64,
    ) -> Result<Vec<f64>, MeshIoError> {
        let id = if var_type.object_type().is_some() { id } else { 0 };
        self.variables
            .get(&var_type)
            .and_then(|v| v.values.get(&(step, var, id)))
            .cloned()
            .ok_or_else(|| missing(format_args!("{var_type:?} variable {var} step {step} object {id}")))
    }

    fn coordinates(&self) -> Result<Vec<Vec<f64>>, MeshIoError> {
        Ok(self.coordinates.clone())
    }

    fn connectivity(
        &self,
        object_type: ObjectType,
        id: i64,
        entity: ConnEntity,
    ) -> Result<Vec<i64>, MeshIoError> {
        let block = self.block(object_type, id)?;
        match entity {
            ConnEntity::Node => Ok(block.nodes.clone()),
            ConnEntity::Edge => block
                .edges
                .clone()
                .ok_or_else(|| missing(format_args!("edge connectivity of block {id}"))),
            ConnEntity::Face => block
                .faces
                .clone()
                .ok_or_else(|| missing(format_args!("face connectivity of block {id}"))),
        }
    }

    fn entity_counts(&self, object_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError> {
        self.block(object_type, id)?
            .entity_counts
            .clone()
            .ok_or_else(|| missing(format_args!("entity counts of block {id}")))
    }

    fn set_entries(&self, object_type: ObjectType, id: i64) -> Result<SetEntries, MeshIoError> {
        Ok(self.set(object_type, id)?.entries.clone())
    }

    fn side_set_nodes(&self, id: i64) -> Result<SideSetNodes, MeshIoError> {
        self.set(ObjectType::SideSet, id)?
            .side_nodes
            .clone()
            .ok_or_else(|| missing(format_args!("node list of side set {id}")))
    }

    fn attribute_values(
        &self,
        object_type: ObjectType,
        id: i64,
        attribute: usize,
    ) -> Result<Vec<f64>, MeshIoError> {
        self.block(object_type, id)?
            .attributes
            .get(attribute)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| missing(format_args!("attribute {attribute} of block {id}")))
    }

    fn map_values(&self, map_type: ObjectType, id: i64) -> Result<Vec<i64>, MeshIoError> {
        self.maps
            .get(&map_type)
            .and_then(|m| m.iter().find(|m| m.0 == id))
            .map(|m| m.2.clone())
            .ok_or_else(|| missing(format_args!("{map_type:?} {id}")))
    }

    fn id_map(&self, map_type: ObjectType) -> Result<Option<Vec<i64>>, MeshIoError> {
        Ok(self.id_maps.get(&map_type).cloned())
    }

    fn info_records(&self) -> Result<Vec<String>, MeshIoError> {
        Ok(self.info.clone())
    }

    fn qa_records(&self) -> Result<Vec<[String; 4]>, MeshIoError> {
        Ok(self.qa.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_blocks() {
        let src = InMemoryExodus::new("t", 3)
            .with_coordinates(vec![vec![0.0; 5], vec![0.0; 5], vec![0.0; 5]])
            .with_block(
                ObjectType::ElemBlock,
                MemBlock::new(7, "TET4", 4, vec![1, 2, 3, 4, 2, 3, 4, 5]),
            )
            .with_block(
                ObjectType::FaceBlock,
                MemBlock::polygons(1, vec![3, 3], vec![1, 2, 3, 2, 3, 4]),
            );
        let model = src.model_parameters().unwrap();
        assert_eq!(model.num_nodes, 5);
        assert_eq!(model.num_elems, 2);
        assert_eq!(model.num_faces, 2);
        assert_eq!(src.object_ids(ObjectType::ElemBlock).unwrap(), vec![7]);
        assert!(src.block_params(ObjectType::ElemBlock, 8).is_err());
    }

    #[test]
    fn default_truth_table_is_full() {
        let src = InMemoryExodus::new("t", 2)
            .with_block(ObjectType::ElemBlock, MemBlock::new(1, "QUAD", 4, vec![1, 2, 3, 4]))
            .with_block(ObjectType::ElemBlock, MemBlock::new(2, "QUAD", 4, vec![1, 2, 3, 4]))
            .with_variables(VarType::ElemBlock, &["p", "q", "r"], None);
        let truth = src.truth_table(VarType::ElemBlock).unwrap();
        assert_eq!(truth, vec![vec![true; 3]; 2]);
    }

    #[test]
    fn global_values_over_time_walks_steps() {
        let src = InMemoryExodus::new("t", 2)
            .with_times(vec![0.0, 1.0])
            .with_variables(VarType::Global, &["energy"], None)
            .with_values(VarType::Global, 0, 0, 0, vec![1.5])
            .with_values(VarType::Global, 1, 0, 0, vec![2.5]);
        assert_eq!(src.global_values_over_time(0).unwrap(), vec![1.5, 2.5]);
    }
}
