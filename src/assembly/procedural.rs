//! Arrays synthesised from catalog metadata rather than stored variables.

use std::sync::Arc;

use crate::cache::{CacheKey, CacheKind};
use crate::catalog::object::ObjectType;
use crate::data::array::DataArray;
use crate::data::unstructured::UnstructuredMesh;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::reader::fetch::ReadContext;

fn procedural_key(kind: CacheKind, object_type: ObjectType, index: usize) -> CacheKey {
    CacheKey::invariant(kind, object_type.index(), index)
}

/// Adds the enabled id arrays of one object to `mesh`.
///
/// Cell arrays: `ObjectId`, `GlobalElementId` and `ImplicitElementId` (blocks
/// only), `SourceElementId` and `SourceElementSide` (side sets, with global
/// element ids on) and the uncached `FileId`. Point arrays: `GlobalNodeId`
/// and `ImplicitNodeId`, subset through the object's point map.
pub fn add_procedural_arrays<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    object_type: ObjectType,
    index: usize,
    mesh: &mut UnstructuredMesh,
) -> Result<(), MeshIoError> {
    let settings = ctx.settings;
    let mut cell_kinds = Vec::new();
    if settings.generate_object_id_array {
        cell_kinds.push(CacheKind::ObjectId);
    }
    if object_type.is_block() {
        if settings.generate_global_element_id_array {
            cell_kinds.push(CacheKind::GlobalElementId);
        }
        if settings.generate_implicit_element_id_array {
            cell_kinds.push(CacheKind::ImplicitElementId);
        }
    }
    if object_type == ObjectType::SideSet && settings.generate_global_element_id_array {
        cell_kinds.extend([CacheKind::SideSourceElement, CacheKind::SideSourceSide]);
    }
    for kind in cell_kinds {
        let array = ctx.get(procedural_key(kind, object_type, index))?;
        mesh.cell_data.insert(array);
    }

    let mut point_kinds = Vec::new();
    if settings.generate_global_node_id_array {
        point_kinds.push(CacheKind::GlobalNodeId);
    }
    if settings.generate_implicit_node_id_array {
        point_kinds.push(CacheKind::ImplicitNodeId);
    }
    for kind in point_kinds {
        let array = ctx.get(procedural_key(kind, object_type, index))?;
        mesh.point_data.insert(array);
    }

    if settings.generate_file_id_array {
        mesh.cell_data.insert(Arc::new(DataArray::int(
            "FileId",
            1,
            vec![settings.file_id; mesh.num_cells()],
        )));
    }
    Ok(())
}
