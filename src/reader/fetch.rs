//! Read-through access to the array cache.
//!
//! [`ReadContext::get`] answers a [`CacheKey`] from the cache, or reads and
//! derives the array from the source and caches it. Key layout per kind:
//!
//! | kind | time | object | array |
//! |---|---|---|---|
//! | `Variable` | step | object index (0 for nodal/global) | array index |
//! | `Attribute` | -1 | block index | attribute index |
//! | `Connectivity`, `SetExtra`, `EntityCounts`, `ElemFaceConnectivity`, `SideSetNodes` | -1 | object index | 0 |
//! | `NodalCoords` | step when displaced, else -1 | 0 | 0 |
//! | `Map` | -1 | map index | 0 |
//! | `IdMap` | -1 | 0 | 0 = global numbering, 1 = implicit numbering |
//! | `GlobalTemporal` | -1 | 0 | array index |
//! | procedural ids | -1 | object type index | object index |

use std::sync::Arc;

use crate::cache::{ArrayCache, CacheKey, CacheKind};
use crate::catalog::Catalog;
use crate::catalog::object::{ObjectInfo, ObjectType, VarType};
use crate::config::ReaderSettings;
use crate::data::array::{DataArray, SharedArray};
use crate::io::{ConnEntity, ExodusSource};
use crate::mesh_error::MeshIoError;
use crate::topology::cell_type::CellType;
use crate::topology::point_map::PointMap;
use crate::topology::reorder::reorder_cells;

/// Borrowed view of everything needed to produce arrays.
pub struct ReadContext<'a, S: ?Sized> {
    pub source: &'a S,
    pub catalog: &'a Catalog,
    pub settings: &'a ReaderSettings,
    pub cache: &'a mut ArrayCache,
}

fn to_zero_based(ids: Vec<i64>) -> Vec<i64> {
    ids.into_iter().map(|id| id - 1).collect()
}

fn object_type_at(index: i64) -> Result<ObjectType, MeshIoError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| ObjectType::ALL.get(i).copied())
        .ok_or_else(|| MeshIoError::MeshIoParse(format!("no object type with index {index}")))
}

fn as_index(value: i64) -> Result<usize, MeshIoError> {
    usize::try_from(value)
        .map_err(|_| MeshIoError::MeshIoParse(format!("negative index {value} in cache key")))
}

impl<'a, S: ExodusSource + ?Sized> ReadContext<'a, S> {
    pub fn new(
        source: &'a S,
        catalog: &'a Catalog,
        settings: &'a ReaderSettings,
        cache: &'a mut ArrayCache,
    ) -> Self {
        Self {
            source,
            catalog,
            settings,
            cache,
        }
    }

    /// Cached array for `key`, reading it on a miss.
    pub fn get(&mut self, key: CacheKey) -> Result<SharedArray, MeshIoError> {
        if let Some(array) = self.cache.find(&key) {
            return Ok(array);
        }
        let array = Arc::new(self.read(key)?);
        if self.cacheable(&key) {
            self.cache.insert(key, Arc::clone(&array));
        }
        Ok(array)
    }

    fn cacheable(&self, key: &CacheKey) -> bool {
        !(key.kind == CacheKind::NodalCoords
            && key.time >= 0
            && self.settings.has_mode_shapes)
    }

    fn object(&self, object_type: ObjectType, index: i64) -> Result<&'a ObjectInfo, MeshIoError> {
        self.catalog.object(object_type, as_index(index)?)
    }

    /// Time key for coordinates at `step`.
    pub fn coordinate_time(&self, step: usize) -> i64 {
        if self.settings.apply_displacements && self.catalog.displacement_array().is_some() {
            step as i64
        } else {
            CacheKey::TIME_INVARIANT
        }
    }

    /// Point map of a block or set, when its points are squeezed.
    pub fn point_map(&self, object_type: ObjectType, index: usize) -> Option<&'a PointMap> {
        let structure = self.catalog.object(object_type, index).ok()?.structure()?;
        structure.squeezed.then_some(&structure.point_map)
    }

    fn read(&mut self, key: CacheKey) -> Result<DataArray, MeshIoError> {
        match key.kind {
            CacheKind::Variable(var_type) => self.read_variable(var_type, key),
            CacheKind::Attribute(block_type) => {
                let block = self.object(block_type, key.object)?;
                let index = as_index(key.array)?;
                let name = block
                    .attributes()
                    .get(index)
                    .map(|a| a.name.clone())
                    .ok_or(MeshIoError::AttributeIndexOutOfRange {
                        block: as_index(key.object)?,
                        index,
                    })?;
                let values = self.source.attribute_values(block_type, block.id, index)?;
                Ok(DataArray::float(name, 1, values))
            }
            CacheKind::Connectivity(object_type) => self.read_connectivity(object_type, key.object),
            CacheKind::SetExtra(set_type) => {
                let set = self.object(set_type, key.object)?;
                let extra = self
                    .source
                    .set_entries(set_type, set.id)?
                    .extra
                    .ok_or_else(|| {
                        MeshIoError::Source(format!("{set_type:?} {} has no extra column", set.id))
                    })?;
                Ok(DataArray::int("extra", 1, extra))
            }
            CacheKind::ElemFaceConnectivity => {
                let block = self.object(ObjectType::ElemBlock, key.object)?;
                let faces = self
                    .source
                    .connectivity(ObjectType::ElemBlock, block.id, ConnEntity::Face)?;
                Ok(DataArray::int("faces", 1, to_zero_based(faces)))
            }
            CacheKind::EntityCounts(block_type) => {
                let block = self.object(block_type, key.object)?;
                let counts = self.source.entity_counts(block_type, block.id)?;
                Ok(DataArray::int("counts", 1, counts))
            }
            CacheKind::SideSetNodes => {
                let set = self.object(ObjectType::SideSet, key.object)?;
                let nodes = self.source.side_set_nodes(set.id)?;
                if nodes.counts.len() != set.size {
                    return Err(MeshIoError::MeshIoParse(format!(
                        "side set {} lists {} node counts for {} sides",
                        set.id,
                        nodes.counts.len(),
                        set.size
                    )));
                }
                let mut values = nodes.counts;
                values.extend(nodes.nodes.into_iter().map(|n| n - 1));
                Ok(DataArray::int("side nodes", 1, values))
            }
            CacheKind::NodalCoords => self.read_coordinates(key.time),
            CacheKind::Map(map_type) => {
                let map = self.object(map_type, key.object)?;
                let values = self.source.map_values(map_type, map.id)?;
                Ok(DataArray::int(map.name.clone(), 1, values))
            }
            CacheKind::IdMap(map_type) => self.read_id_map(map_type, key.array),
            CacheKind::GlobalTemporal => {
                let array = self.catalog.array(VarType::Global, as_index(key.array)?)?;
                let steps = self.catalog.num_time_steps();
                let mut values = vec![0.0; steps * array.components];
                for (c, &var) in array.original_indices.iter().enumerate() {
                    let series = self.source.global_values_over_time(var)?;
                    for (t, v) in series.into_iter().take(steps).enumerate() {
                        values[t * array.components + c] = v;
                    }
                }
                Ok(DataArray::float(
                    format!("{}OverTime", array.name),
                    array.components,
                    values,
                ))
            }
            CacheKind::ObjectId => {
                let object = self.object(object_type_at(key.object)?, key.array)?;
                Ok(DataArray::int("ObjectId", 1, vec![object.id; object.size]))
            }
            CacheKind::GlobalElementId | CacheKind::ImplicitElementId => {
                let block_type = object_type_at(key.object)?;
                let block = self.object(block_type, key.array)?;
                let map_type = element_map_for(block_type)?;
                let numbering = if key.kind == CacheKind::GlobalElementId { 0 } else { 1 };
                let ids = self.get(CacheKey::invariant(CacheKind::IdMap(map_type), 0, numbering))?;
                let name = if numbering == 0 {
                    "GlobalElementId"
                } else {
                    "ImplicitElementId"
                };
                let start = block.file_offset().unwrap_or(1) - 1;
                let slice = ids
                    .as_i64()
                    .and_then(|v| v.get(start..start + block.size))
                    .ok_or_else(|| {
                        MeshIoError::MeshIoParse(format!(
                            "{map_type:?} numbering does not cover {block_type:?} {}",
                            block.id
                        ))
                    })?;
                Ok(DataArray::int(name, 1, slice.to_vec()))
            }
            CacheKind::GlobalNodeId | CacheKind::ImplicitNodeId => {
                let object_type = object_type_at(key.object)?;
                let index = as_index(key.array)?;
                let numbering = if key.kind == CacheKind::GlobalNodeId { 0 } else { 1 };
                let ids = self.get(CacheKey::invariant(
                    CacheKind::IdMap(ObjectType::NodeMap),
                    0,
                    numbering,
                ))?;
                let name = if numbering == 0 {
                    "GlobalNodeId"
                } else {
                    "ImplicitNodeId"
                };
                let ids = ids.as_i64().unwrap_or(&[]);
                let values = match self.point_map(object_type, index) {
                    Some(map) => map.gather(ids, 1),
                    None => ids.to_vec(),
                };
                Ok(DataArray::int(name, 1, values))
            }
            CacheKind::SideSourceElement | CacheKind::SideSourceSide => {
                self.read_side_source(key.kind, key.array)
            }
            CacheKind::InfoRecords => Ok(DataArray::text(
                "Info_Records",
                self.catalog.info_records().to_vec(),
            )),
            CacheKind::QaRecords => {
                let flat = self
                    .catalog
                    .qa_records()
                    .iter()
                    .flat_map(|r| r.iter().cloned())
                    .collect();
                Ok(DataArray::new(
                    "QA_Records",
                    4,
                    crate::data::array::ArrayValues::Text(flat),
                ))
            }
        }
    }

    fn read_variable(&mut self, var_type: VarType, key: CacheKey) -> Result<DataArray, MeshIoError> {
        let step = as_index(key.time)?;
        let array = self.catalog.array(var_type, as_index(key.array)?)?;
        let (id, expected) = match var_type.object_type() {
            Some(ot) => {
                let object = self.object(ot, key.object)?;
                (object.id, object.size)
            }
            None if var_type == VarType::Nodal => (0, self.catalog.model().num_nodes),
            None => (0, 1),
        };
        let width = if var_type == VarType::Nodal
            && array.components == 2
            && self.catalog.model().num_dim == 2
        {
            3
        } else {
            array.components
        };
        let mut values = vec![0.0; expected * width];
        for (c, &var) in array.original_indices.iter().enumerate() {
            let component = self.source.variable_values(var_type, step, var, id)?;
            if component.len() < expected {
                return Err(MeshIoError::MeshIoParse(format!(
                    "variable `{}` has {} values, expected {expected}",
                    array.original_names[c],
                    component.len()
                )));
            }
            for (t, v) in component.into_iter().take(expected).enumerate() {
                values[t * width + c] = v;
            }
        }
        Ok(DataArray::float(array.name.clone(), width, values))
    }

    fn read_connectivity(&mut self, object_type: ObjectType, index: i64) -> Result<DataArray, MeshIoError> {
        let object = self.object(object_type, index)?;
        if let Some(block) = object.block() {
            let mut conn = to_zero_based(self.source.connectivity(
                object_type,
                object.id,
                ConnEntity::Node,
            )?);
            let stride = block.bounds_per_entry[0];
            let components = if block.shape.cell_type.has_variable_size() || stride == 0 {
                1
            } else {
                reorder_cells(block.shape.cell_type, stride, &mut conn);
                stride
            };
            return Ok(DataArray::int("connectivity", components, conn));
        }
        let entries = self.source.set_entries(object_type, object.id)?.entries;
        Ok(DataArray::int("entries", 1, to_zero_based(entries)))
    }

    fn read_coordinates(&mut self, time: i64) -> Result<DataArray, MeshIoError> {
        let model = self.catalog.model();
        let raw = self.source.coordinates()?;
        let nodes = model.num_nodes;
        let mut coords = vec![0.0; nodes * 3];
        for (d, axis) in raw.iter().take(3).enumerate() {
            for (n, &x) in axis.iter().take(nodes).enumerate() {
                coords[n * 3 + d] = x;
            }
        }
        if time >= 0 {
            if let Some(disp) = self.catalog.displacement_array() {
                let scale = self.settings.displacement_scale();
                let key = CacheKey::new(time, CacheKind::Variable(VarType::Nodal), 0, disp as i64);
                let displacement = self.get(key)?;
                let width = displacement.components();
                if let Some(d) = displacement.as_f64() {
                    for n in 0..nodes {
                        for c in 0..width.min(3) {
                            coords[n * 3 + c] += scale * d.get(n * width + c).copied().unwrap_or(0.0);
                        }
                    }
                }
            }
        }
        Ok(DataArray::float("Points", 3, coords))
    }

    fn read_id_map(&mut self, map_type: ObjectType, numbering: i64) -> Result<DataArray, MeshIoError> {
        let length = self.catalog.model().map_length(map_type);
        let stored = if numbering == 0 {
            match self.catalog.objects(map_type).first() {
                Some(map) => Some(self.source.map_values(map_type, map.id)?),
                None => self.source.id_map(map_type)?,
            }
        } else {
            self.source.id_map(map_type)?
        };
        let values = stored.unwrap_or_else(|| (1..=length as i64).collect());
        Ok(DataArray::int(format!("{map_type:?}Numbering"), 1, values))
    }

    fn read_side_source(&mut self, kind: CacheKind, index: i64) -> Result<DataArray, MeshIoError> {
        let set = self.object(ObjectType::SideSet, index)?;
        let entries = self.get(CacheKey::new(
            CacheKey::TIME_INVARIANT,
            CacheKind::Connectivity(ObjectType::SideSet),
            index,
            0,
        ))?;
        let entries = entries.as_i64().unwrap_or(&[]);
        if kind == CacheKind::SideSourceElement {
            let ids = self.get(CacheKey::invariant(CacheKind::IdMap(ObjectType::ElemMap), 0, 0))?;
            let ids = ids.as_i64().unwrap_or(&[]);
            let values = entries
                .iter()
                .map(|&e| {
                    usize::try_from(e)
                        .ok()
                        .and_then(|e| ids.get(e).copied())
                        .unwrap_or(e + 1)
                })
                .collect();
            return Ok(DataArray::int("SourceElementId", 1, values));
        }
        let sides = self.get(CacheKey::new(
            CacheKey::TIME_INVARIANT,
            CacheKind::SetExtra(ObjectType::SideSet),
            index,
            0,
        ))?;
        let sides = sides.as_i64().unwrap_or(&[]);
        let mut values = Vec::with_capacity(set.size);
        for (&entry, &side) in entries.iter().zip(sides) {
            let cell_type = usize::try_from(entry)
                .ok()
                .and_then(|e| self.catalog.block_containing(ObjectType::ElemBlock, e))
                .and_then(|b| self.catalog.object(ObjectType::ElemBlock, b).ok())
                .map_or(CellType::Empty, ObjectInfo::cell_type);
            values.push(source_side(cell_type, side));
        }
        Ok(DataArray::int("SourceElementSide", 1, values))
    }
}

/// Element map collection matching a block collection.
fn element_map_for(block_type: ObjectType) -> Result<ObjectType, MeshIoError> {
    match block_type {
        ObjectType::ElemBlock => Ok(ObjectType::ElemMap),
        ObjectType::FaceBlock => Ok(ObjectType::FaceMap),
        ObjectType::EdgeBlock => Ok(ObjectType::EdgeMap),
        other => Err(MeshIoError::UnreadableArray(format!(
            "element ids of {other:?}"
        ))),
    }
}

const HEX_SIDES: [i64; 6] = [2, 1, 3, 0, 4, 5];
const WEDGE_SIDES: [i64; 5] = [2, 3, 4, 0, 1];

/// Converts a 1-based Exodus side number to the 0-based face index of the
/// output cell.
pub fn source_side(cell_type: CellType, side: i64) -> i64 {
    let local = side - 1;
    let table: &[i64] = match cell_type {
        CellType::Hexahedron | CellType::QuadraticHexahedron | CellType::TriquadraticHexahedron => {
            &HEX_SIDES
        }
        CellType::Wedge | CellType::QuadraticWedge | CellType::LagrangeWedge => &WEDGE_SIDES,
        _ => return local,
    };
    usize::try_from(local)
        .ok()
        .and_then(|i| table.get(i).copied())
        .unwrap_or(local)
}
