//! Structural metadata of one Exodus file.
//!
//! A [`Catalog`] lists every block, set and map per [`ObjectType`] in file
//! order, the glommed result arrays per [`VarType`], the time values and the
//! file-wide records. Objects are addressed by their file-order index; the
//! per-type sorted index translates the ascending-id order users enumerate
//! in.
//!
//! [`Catalog::load`] builds a fresh catalog and fails as a whole, so a
//! caller replacing an older catalog keeps it intact on error.

pub mod glom;
pub mod object;

use itertools::Itertools;

use crate::config::ReaderSettings;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::io::{ExodusSource, ModelParameters};
use crate::mesh_error::MeshIoError;
use crate::topology::cache::InvalidateCache;
use crate::topology::cell_type::{CellShape, CellType, infer_cell_shape};

use glom::{ArrayInfo, clean_name, glom_variables};
use object::{AttributeInfo, BlockInfo, ObjectFamily, ObjectInfo, ObjectKind, ObjectType, SetInfo, VarType};

/// Metadata of a loaded file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    model: ModelParameters,
    times: Vec<f64>,
    objects: [Vec<ObjectInfo>; 12],
    sorted: [Vec<usize>; 12],
    arrays: [Vec<ArrayInfo>; 10],
    info_records: Vec<String>,
    qa_records: Vec<[String; 4]>,
}

impl Catalog {
    /// Reads all metadata from `source`.
    pub fn load<S: ExodusSource + ?Sized>(source: &S) -> Result<Self, MeshIoError> {
        let model = source.model_parameters()?;
        let times = source.times()?;
        let mut catalog = Catalog {
            model,
            times,
            ..Default::default()
        };

        for object_type in ObjectType::ALL {
            let objects = load_objects(source, &catalog.model, object_type)?;
            catalog.sorted[object_type.index()] = (0..objects.len())
                .sorted_by_key(|&i| objects[i].id)
                .collect();
            catalog.objects[object_type.index()] = objects;
        }

        if !catalog.times.is_empty() {
            for var_type in VarType::ALL {
                let names = source.variable_names(var_type)?;
                if names.is_empty() {
                    continue;
                }
                let truth = match var_type.object_type() {
                    Some(ot) => {
                        let truth = source.truth_table(var_type)?;
                        check_truth_table(&truth, catalog.num_objects(ot), names.len(), var_type)?;
                        truth
                    }
                    None => vec![vec![true; names.len()]],
                };
                catalog.arrays[var_type.index()] = glom_variables(&names, &truth);
            }
        }

        catalog.info_records = source.info_records()?;
        catalog.qa_records = source.qa_records()?;
        catalog.debug_assert_invariants();
        Ok(catalog)
    }

    pub fn model(&self) -> &ModelParameters {
        &self.model
    }

    pub fn title(&self) -> &str {
        &self.model.title
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn num_time_steps(&self) -> usize {
        self.times.len()
    }

    pub fn info_records(&self) -> &[String] {
        &self.info_records
    }

    pub fn qa_records(&self) -> &[[String; 4]] {
        &self.qa_records
    }

    /// Objects of `object_type` in file order.
    pub fn objects(&self, object_type: ObjectType) -> &[ObjectInfo] {
        &self.objects[object_type.index()]
    }

    pub fn num_objects(&self, object_type: ObjectType) -> usize {
        self.objects[object_type.index()].len()
    }

    pub fn object(&self, object_type: ObjectType, index: usize) -> Result<&ObjectInfo, MeshIoError> {
        let objects = &self.objects[object_type.index()];
        objects.get(index).ok_or(MeshIoError::ObjectIndexOutOfRange {
            object_type,
            index,
            count: objects.len(),
        })
    }

    pub fn object_mut(
        &mut self,
        object_type: ObjectType,
        index: usize,
    ) -> Result<&mut ObjectInfo, MeshIoError> {
        let objects = &mut self.objects[object_type.index()];
        let count = objects.len();
        objects.get_mut(index).ok_or(MeshIoError::ObjectIndexOutOfRange {
            object_type,
            index,
            count,
        })
    }

    /// File-order indices in ascending id order.
    pub fn sorted(&self, object_type: ObjectType) -> &[usize] {
        &self.sorted[object_type.index()]
    }

    /// File-order index of the object at `sorted` in ascending id order.
    pub fn file_index(&self, object_type: ObjectType, sorted: usize) -> Result<usize, MeshIoError> {
        let order = &self.sorted[object_type.index()];
        order.get(sorted).copied().ok_or(MeshIoError::ObjectIndexOutOfRange {
            object_type,
            index: sorted,
            count: order.len(),
        })
    }

    /// Position of file-order object `index` in ascending id order.
    pub fn sorted_position(&self, object_type: ObjectType, index: usize) -> Option<usize> {
        self.sorted[object_type.index()]
            .iter()
            .position(|&i| i == index)
    }

    pub fn find_by_name(&self, object_type: ObjectType, name: &str) -> Option<usize> {
        self.objects(object_type).iter().position(|o| o.name == name)
    }

    pub fn find_by_id(&self, object_type: ObjectType, id: i64) -> Option<usize> {
        self.objects(object_type).iter().position(|o| o.id == id)
    }

    /// Block of `block_type` holding 0-based file entry `entry`.
    pub fn block_containing(&self, block_type: ObjectType, entry: usize) -> Option<usize> {
        let blocks = self.objects(block_type);
        let after = blocks.partition_point(|b| b.file_offset().is_some_and(|o| o <= entry + 1));
        let index = after.checked_sub(1)?;
        let block = &blocks[index];
        let local = entry + 1 - block.file_offset()?;
        (local < block.size).then_some(index)
    }

    pub fn arrays(&self, var_type: VarType) -> &[ArrayInfo] {
        &self.arrays[var_type.index()]
    }

    pub fn array(&self, var_type: VarType, index: usize) -> Result<&ArrayInfo, MeshIoError> {
        let arrays = &self.arrays[var_type.index()];
        arrays.get(index).ok_or(MeshIoError::ArrayIndexOutOfRange {
            var_type,
            index,
            count: arrays.len(),
        })
    }

    pub fn array_mut(
        &mut self,
        var_type: VarType,
        index: usize,
    ) -> Result<&mut ArrayInfo, MeshIoError> {
        let arrays = &mut self.arrays[var_type.index()];
        let count = arrays.len();
        arrays.get_mut(index).ok_or(MeshIoError::ArrayIndexOutOfRange {
            var_type,
            index,
            count,
        })
    }

    pub fn find_array(&self, var_type: VarType, name: &str) -> Option<usize> {
        self.arrays(var_type).iter().position(|a| a.name == name)
    }

    /// Nodal array holding displacements: the first whose name starts with
    /// `DIS` (any case) and whose width matches the spatial dimension.
    pub fn displacement_array(&self) -> Option<usize> {
        self.arrays(VarType::Nodal).iter().position(|a| {
            a.name
                .get(..3)
                .is_some_and(|p| p.eq_ignore_ascii_case("DIS"))
                && a.components == self.model.num_dim
        })
    }

    /// Applies name-based initial selections. Unknown names are reported and
    /// skipped.
    pub fn apply_status_rules(&mut self, settings: &ReaderSettings) {
        for rule in &settings.initial_object_status {
            match self.find_by_name(rule.object_type, &rule.name) {
                Some(i) => self.objects[rule.object_type.index()][i].status = rule.status,
                None => log::warn!("no {:?} named `{}` to select", rule.object_type, rule.name),
            }
        }
        for rule in &settings.initial_array_status {
            match self.find_array(rule.var_type, &rule.name) {
                Some(i) => self.arrays[rule.var_type.index()][i].status = rule.status,
                None => log::warn!("no {:?} array named `{}` to select", rule.var_type, rule.name),
            }
        }
    }

    /// Drops every block and set structural cache.
    pub fn clear_structures(&mut self) {
        for objects in &mut self.objects {
            for object in objects {
                if let Some(slot) = object.structure_slot() {
                    *slot = None;
                }
            }
        }
    }
}

impl InvalidateCache for Catalog {
    fn invalidate_cache(&mut self) {
        self.clear_structures();
    }
}

fn check_truth_table(
    truth: &[Vec<bool>],
    objects: usize,
    vars: usize,
    var_type: VarType,
) -> Result<(), MeshIoError> {
    if truth.len() != objects || truth.iter().any(|row| row.len() != vars) {
        return Err(MeshIoError::MeshIoParse(format!(
            "{var_type:?} truth table is not {objects} x {vars}"
        )));
    }
    Ok(())
}

fn object_name(raw: Option<&String>, object_type: ObjectType, id: i64) -> String {
    let trimmed = raw.map_or("", |n| {
        n.trim_matches(|c: char| c.is_whitespace() || c.is_control())
    });
    if trimmed.is_empty() {
        format!("Unnamed {} ID: {id}", object_type.unnamed_label())
    } else {
        trimmed.to_string()
    }
}

fn load_objects<S: ExodusSource + ?Sized>(
    source: &S,
    model: &ModelParameters,
    object_type: ObjectType,
) -> Result<Vec<ObjectInfo>, MeshIoError> {
    let ids = source.object_ids(object_type)?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let names = source.object_names(object_type)?;
    let mut objects = Vec::with_capacity(ids.len());
    let mut offset = 1;

    for (k, &id) in ids.iter().enumerate() {
        let name = object_name(names.get(k), object_type, id);
        let (size, status, kind) = match object_type.family() {
            ObjectFamily::Block => {
                let params = source.block_params(object_type, id)?;
                let mut bounds = [
                    params.nodes_per_entry,
                    params.edges_per_entry,
                    params.faces_per_entry,
                ];
                if object_type != ObjectType::ElemBlock {
                    bounds[1] = 0;
                    bounds[2] = 0;
                }
                let shape = infer_cell_shape(&params.type_name, bounds[0], params.size)
                    .unwrap_or_else(|e| {
                        log::error!("{object_type:?} {id}: {e}");
                        CellShape {
                            cell_type: CellType::Empty,
                            points_per_cell: 0,
                        }
                    });
                let attributes = source
                    .attribute_names(object_type, id)?
                    .iter()
                    .enumerate()
                    .map(|(a, n)| AttributeInfo {
                        name: clean_name(n, a),
                        status: false,
                    })
                    .collect();
                let info = BlockInfo {
                    type_name: params.type_name,
                    file_offset: offset,
                    bounds_per_entry: bounds,
                    shape,
                    attributes,
                    structure: None,
                };
                offset += params.size;
                (
                    params.size,
                    object_type == ObjectType::ElemBlock,
                    ObjectKind::Block(info),
                )
            }
            ObjectFamily::Set => {
                let params = source.set_params(object_type, id)?;
                let info = SetInfo {
                    file_offset: offset,
                    distribution_factors: params.distribution_factors,
                    structure: None,
                };
                offset += params.size;
                (params.size, false, ObjectKind::Set(info))
            }
            ObjectFamily::Map => (model.map_length(object_type), k == 0, ObjectKind::Map),
        };
        objects.push(ObjectInfo {
            name,
            id,
            size,
            status,
            loadable: true,
            kind,
        });
    }
    Ok(objects)
}

impl DebugInvariants for Catalog {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Catalog");
    }

    fn validate_invariants(&self) -> Result<(), MeshIoError> {
        for object_type in ObjectType::ALL {
            let objects = self.objects(object_type);
            let mut expected = 1;
            for object in objects {
                if let Some(offset) = object.file_offset() {
                    ensure(offset == expected, || {
                        format!(
                            "{object_type:?} {} starts at {offset}, expected {expected}",
                            object.id
                        )
                    })?;
                    expected += object.size;
                }
                if let Some(structure) = object.structure() {
                    ensure(structure.cells.num_cells() == object.size, || {
                        format!(
                            "{object_type:?} {} caches {} cells for {} entries",
                            object.id,
                            structure.cells.num_cells(),
                            object.size
                        )
                    })?;
                }
            }
            ensure(self.sorted(object_type).len() == objects.len(), || {
                format!("{object_type:?} sorted index is stale")
            })?;
        }
        for var_type in VarType::ALL {
            let objects = var_type
                .object_type()
                .map_or(1, |ot| self.num_objects(ot));
            for array in self.arrays(var_type) {
                ensure(array.object_truth.len() == objects, || {
                    format!(
                        "{var_type:?} array `{}` has {} truth entries for {objects} objects",
                        array.name,
                        array.object_truth.len()
                    )
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InMemoryExodus;
    use crate::io::memory::{MemBlock, MemSet};

    fn two_blocks() -> InMemoryExodus {
        InMemoryExodus::new("two blocks", 2)
            .with_coordinates(vec![vec![0.0; 12], vec![0.0; 12]])
            .with_times(vec![0.0])
            .with_block(
                ObjectType::ElemBlock,
                MemBlock::new(20, "QUAD4", 4, vec![1; 24]).named("right"),
            )
            .with_block(ObjectType::ElemBlock, MemBlock::new(10, "QUAD4", 4, vec![1; 16]))
            .with_set(ObjectType::NodeSet, MemSet::new(3, vec![1, 2]))
            .with_set(ObjectType::NodeSet, MemSet::new(1, vec![3]))
            .with_map(ObjectType::ElemMap, 1, "", (1..=10).collect())
            .with_map(ObjectType::ElemMap, 2, "alt", (1..=10).collect())
            .with_variables(VarType::Nodal, &["disp_x", "disp_y", "temp"], None)
    }

    #[test]
    fn offsets_are_cumulative_and_sorted_index_follows_ids() {
        let cat = Catalog::load(&two_blocks()).unwrap();
        let blocks = cat.objects(ObjectType::ElemBlock);
        assert_eq!(blocks[0].file_offset(), Some(1));
        assert_eq!(blocks[1].file_offset(), Some(7));
        assert_eq!(cat.sorted(ObjectType::ElemBlock), &[1, 0]);
        assert_eq!(cat.file_index(ObjectType::ElemBlock, 0).unwrap(), 1);
        assert_eq!(cat.sorted_position(ObjectType::ElemBlock, 0), Some(1));
        assert_eq!(cat.objects(ObjectType::NodeSet)[1].file_offset(), Some(3));
        cat.validate_invariants().unwrap();
    }

    #[test]
    fn default_names_and_statuses() {
        let cat = Catalog::load(&two_blocks()).unwrap();
        let blocks = cat.objects(ObjectType::ElemBlock);
        assert_eq!(blocks[0].name, "right");
        assert_eq!(blocks[1].name, "Unnamed block ID: 10");
        assert!(blocks.iter().all(|b| b.status));
        let sets = cat.objects(ObjectType::NodeSet);
        assert_eq!(sets[0].name, "Unnamed set ID: 3");
        assert!(sets.iter().all(|s| !s.status));
        let maps = cat.objects(ObjectType::ElemMap);
        assert_eq!(maps[0].name, "Unnamed map ID: 1");
        assert!(maps[0].status && !maps[1].status);
        assert_eq!(maps[0].size, 10);
    }

    #[test]
    fn nodal_variables_are_glommed() {
        let cat = Catalog::load(&two_blocks()).unwrap();
        let arrays = cat.arrays(VarType::Nodal);
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].name, "disp");
        assert_eq!(arrays[0].object_truth, vec![true]);
        assert_eq!(cat.displacement_array(), Some(0));
    }

    #[test]
    fn no_time_steps_means_no_arrays() {
        let src = two_blocks().with_times(Vec::new());
        let cat = Catalog::load(&src).unwrap();
        assert!(cat.arrays(VarType::Nodal).is_empty());
    }

    #[test]
    fn block_lookup_by_file_entry() {
        let cat = Catalog::load(&two_blocks()).unwrap();
        assert_eq!(cat.block_containing(ObjectType::ElemBlock, 0), Some(0));
        assert_eq!(cat.block_containing(ObjectType::ElemBlock, 5), Some(0));
        assert_eq!(cat.block_containing(ObjectType::ElemBlock, 6), Some(1));
        assert_eq!(cat.block_containing(ObjectType::ElemBlock, 9), Some(1));
        assert_eq!(cat.block_containing(ObjectType::ElemBlock, 10), None);
    }

    #[test]
    fn bad_truth_table_fails_load() {
        let src = two_blocks().with_variables(
            VarType::ElemBlock,
            &["p"],
            Some(vec![vec![true]]),
        );
        assert!(matches!(
            Catalog::load(&src),
            Err(MeshIoError::MeshIoParse(_))
        ));
    }

    #[test]
    fn status_rules_apply_by_name() {
        let mut cat = Catalog::load(&two_blocks()).unwrap();
        let settings = ReaderSettings {
            initial_object_status: vec![crate::config::ObjectStatusRule {
                object_type: ObjectType::ElemBlock,
                name: "right".into(),
                status: false,
            }],
            initial_array_status: vec![crate::config::ArrayStatusRule {
                var_type: VarType::Nodal,
                name: "temp".into(),
                status: true,
            }],
            ..Default::default()
        };
        cat.apply_status_rules(&settings);
        assert!(!cat.objects(ObjectType::ElemBlock)[0].status);
        assert!(cat.arrays(VarType::Nodal)[1].status);
    }
}
