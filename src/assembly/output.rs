//! Assembly of one time step into the two-level output container.
//!
//! The output holds one [`ConnectivityGroup`] per [`ConnectivityKind`], in
//! fixed order, and within each group one [`OutputSlot`] per object in
//! ascending id order. Unselected objects keep their slot with no mesh.
//!
//! Failures are contained per object: a missing structure makes the object
//! unloadable and leaves its slot empty; a missing field array is recorded in
//! the slot's diagnostics while the mesh is still produced.

use std::sync::Arc;

use crate::cache::{ArrayCache, CacheKey, CacheKind};
use crate::catalog::Catalog;
use crate::catalog::object::{ConnectivityKind, ObjectStructure, ObjectType, VarType};
use crate::config::ReaderSettings;
use crate::data::array::{ArrayValues, DataArray, SharedArray};
use crate::data::unstructured::UnstructuredMesh;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::reader::fetch::ReadContext;

use super::connectivity::{assemble_points, build_structure};
use super::procedural::add_procedural_arrays;

/// One object's place in the output.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSlot {
    pub name: String,
    pub id: i64,
    /// `None` for unselected or unloadable objects.
    pub mesh: Option<UnstructuredMesh>,
    pub diagnostics: Vec<MeshIoError>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityGroup {
    pub kind: ConnectivityKind,
    pub label: &'static str,
    pub slots: Vec<OutputSlot>,
}

/// Everything produced for one time step.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshOutput {
    pub time_step: usize,
    pub groups: Vec<ConnectivityGroup>,
}

impl MeshOutput {
    pub fn group(&self, kind: ConnectivityKind) -> Option<&ConnectivityGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Slot of the object at sorted position `sorted` in group `kind`.
    pub fn slot(&self, kind: ConnectivityKind, sorted: usize) -> Option<&OutputSlot> {
        self.group(kind)?.slots.get(sorted)
    }

    /// Meshes of all loaded objects, in output order.
    pub fn meshes(&self) -> impl Iterator<Item = &UnstructuredMesh> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .filter_map(|s| s.mesh.as_ref())
    }

    /// Every diagnostic recorded for this time step.
    pub fn diagnostics(&self) -> impl Iterator<Item = &MeshIoError> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .flat_map(|s| s.diagnostics.iter())
    }
}

/// Builds the output of time `step`.
///
/// Structures built along the way are stored in `catalog` so later time steps
/// reuse them.
pub fn assemble_time_step<S: ExodusSource + ?Sized>(
    source: &S,
    catalog: &mut Catalog,
    settings: &ReaderSettings,
    cache: &mut ArrayCache,
    step: usize,
) -> Result<MeshOutput, MeshIoError> {
    let mut groups = Vec::with_capacity(ConnectivityKind::ALL.len());
    for kind in ConnectivityKind::ALL {
        let object_type = kind.object_type();
        let order = catalog.sorted(object_type).to_vec();
        let mut slots = Vec::with_capacity(order.len());
        for index in order {
            let object = catalog.object(object_type, index)?;
            let mut slot = OutputSlot {
                name: object.name.clone(),
                id: object.id,
                mesh: None,
                diagnostics: Vec::new(),
            };
            if object.status && object.loadable {
                match assemble_object(source, catalog, settings, cache, step, object_type, index) {
                    Ok((mesh, diagnostics)) => {
                        slot.mesh = Some(mesh);
                        slot.diagnostics = diagnostics;
                    }
                    Err(e) => {
                        log::error!("{object_type:?} {} `{}` skipped: {e}", slot.id, slot.name);
                        catalog.object_mut(object_type, index)?.loadable = false;
                        slot.diagnostics.push(e);
                    }
                }
            }
            slots.push(slot);
        }
        groups.push(ConnectivityGroup {
            kind,
            label: kind.label(),
            slots,
        });
    }
    Ok(MeshOutput {
        time_step: step,
        groups,
    })
}

/// Structure of an object, building and storing it on first use.
fn object_structure<S: ExodusSource + ?Sized>(
    source: &S,
    catalog: &mut Catalog,
    settings: &ReaderSettings,
    cache: &mut ArrayCache,
    object_type: ObjectType,
    index: usize,
) -> Result<ObjectStructure, MeshIoError> {
    if let Some(structure) = catalog.object(object_type, index)?.structure() {
        return Ok(structure.clone());
    }
    let structure = {
        let mut ctx = ReadContext::new(source, &*catalog, settings, cache);
        build_structure(&mut ctx, object_type, index)?
    };
    if let Some(slot) = catalog.object_mut(object_type, index)?.structure_slot() {
        *slot = Some(structure.clone());
    }
    Ok(structure)
}

fn assemble_object<S: ExodusSource + ?Sized>(
    source: &S,
    catalog: &mut Catalog,
    settings: &ReaderSettings,
    cache: &mut ArrayCache,
    step: usize,
    object_type: ObjectType,
    index: usize,
) -> Result<(UnstructuredMesh, Vec<MeshIoError>), MeshIoError> {
    let mut structure = object_structure(source, catalog, settings, cache, object_type, index)?;
    let catalog = &*catalog;
    let mut ctx = ReadContext::new(source, catalog, settings, cache);
    let points = assemble_points(&mut ctx, step, &structure)?;
    let mut mesh = UnstructuredMesh {
        points,
        ..UnstructuredMesh::default()
    };
    let mut diagnostics = Vec::new();
    let time = step as i64;

    // point variables
    for (i, array) in catalog.arrays(VarType::Nodal).iter().enumerate() {
        if !array.status {
            continue;
        }
        let key = CacheKey::new(time, CacheKind::Variable(VarType::Nodal), 0, i as i64);
        match ctx.get(key) {
            Ok(values) => mesh.point_data.insert(subset_points(values, &structure)),
            Err(e) => report(&mut diagnostics, e),
        }
    }

    // cell attributes, then cell variables
    let object = catalog.object(object_type, index)?;
    for (a, attribute) in object.attributes().iter().enumerate() {
        if !attribute.status {
            continue;
        }
        match ctx.get(CacheKey::invariant(CacheKind::Attribute(object_type), index, a)) {
            Ok(values) => mesh.cell_data.insert(values),
            Err(e) => report(&mut diagnostics, e),
        }
    }
    if let Some(var_type) = VarType::from_object(object_type) {
        for (i, array) in catalog.arrays(var_type).iter().enumerate() {
            if !array.status || !array.object_truth.get(index).copied().unwrap_or(false) {
                continue;
            }
            let key = CacheKey::new(time, CacheKind::Variable(var_type), index as i64, i as i64);
            match ctx.get(key) {
                Ok(values) => mesh.cell_data.insert(values),
                Err(e) => report(&mut diagnostics, e),
            }
        }
    }

    mesh.cells = std::mem::take(&mut structure.cells);
    if let Err(e) = add_procedural_arrays(&mut ctx, object_type, index, &mut mesh) {
        report(&mut diagnostics, e);
    }
    if let Err(e) = add_field_data(&mut ctx, object_type, &mut mesh) {
        report(&mut diagnostics, e);
    }

    // number maps
    for (m, map) in catalog.objects(ObjectType::NodeMap).iter().enumerate() {
        if !map.status {
            continue;
        }
        match ctx.get(CacheKey::invariant(CacheKind::Map(ObjectType::NodeMap), m, 0)) {
            Ok(values) => mesh.point_data.insert(subset_points(values, &structure)),
            Err(e) => report(&mut diagnostics, e),
        }
    }
    if let (Some(map_type), Some(offset)) = (entry_map_type(object_type), object.file_offset()) {
        let range = offset - 1..offset - 1 + object.size;
        for (m, map) in catalog.objects(map_type).iter().enumerate() {
            if !map.status {
                continue;
            }
            let sliced = ctx
                .get(CacheKey::invariant(CacheKind::Map(map_type), m, 0))
                .and_then(|values| {
                    values
                        .as_i64()
                        .and_then(|v| v.get(range.clone()))
                        .map(|v| Arc::new(DataArray::int(values.name(), 1, v.to_vec())))
                        .ok_or_else(|| {
                            MeshIoError::MeshIoParse(format!(
                                "map `{}` does not cover {object_type:?} {}",
                                map.name, object.id
                            ))
                        })
                });
            match sliced {
                Ok(values) => mesh.cell_data.insert(values),
                Err(e) => report(&mut diagnostics, e),
            }
        }
    }
    Ok((mesh, diagnostics))
}

/// File-wide records attached to every mesh.
fn add_field_data<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    object_type: ObjectType,
    mesh: &mut UnstructuredMesh,
) -> Result<(), MeshIoError> {
    let catalog = ctx.catalog;
    for (i, array) in catalog.arrays(VarType::Global).iter().enumerate() {
        if array.status {
            let values = ctx.get(CacheKey::invariant(CacheKind::GlobalTemporal, 0, i))?;
            mesh.field_data.insert(values);
        }
    }
    if object_type == ObjectType::ElemBlock {
        let ids = catalog
            .objects(ObjectType::ElemBlock)
            .iter()
            .map(|b| b.id)
            .collect();
        mesh.field_data
            .insert(Arc::new(DataArray::int("ElementBlockIds", 1, ids)));
    }
    if !catalog.qa_records().is_empty() {
        mesh.field_data
            .insert(ctx.get(CacheKey::invariant(CacheKind::QaRecords, 0, 0))?);
    }
    mesh.field_data.insert(Arc::new(DataArray::text(
        "Title",
        vec![catalog.title().to_string()],
    )));
    if !catalog.info_records().is_empty() {
        mesh.field_data
            .insert(ctx.get(CacheKey::invariant(CacheKind::InfoRecords, 0, 0))?);
    }
    Ok(())
}

/// Map collection numbering the entries of a block collection.
fn entry_map_type(block_type: ObjectType) -> Option<ObjectType> {
    match block_type {
        ObjectType::ElemBlock => Some(ObjectType::ElemMap),
        ObjectType::FaceBlock => Some(ObjectType::FaceMap),
        ObjectType::EdgeBlock => Some(ObjectType::EdgeMap),
        _ => None,
    }
}

/// Restricts a file-wide point array to the object's squeezed points.
fn subset_points(array: SharedArray, structure: &ObjectStructure) -> SharedArray {
    if !structure.squeezed {
        return array;
    }
    let map = &structure.point_map;
    let components = array.components();
    let values = match array.values() {
        ArrayValues::Float(v) => ArrayValues::Float(map.gather(v, components)),
        ArrayValues::Int(v) => ArrayValues::Int(map.gather(v, components)),
        ArrayValues::Text(_) => return array,
    };
    Arc::new(DataArray::new(array.name(), components, values))
}

fn report(diagnostics: &mut Vec<MeshIoError>, error: MeshIoError) {
    log::warn!("{error}");
    diagnostics.push(error);
}
