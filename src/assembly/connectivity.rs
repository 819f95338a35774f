//! Per-object cell connectivity and point sets.
//!
//! [`build_structure`] turns the cached connectivity of one block or set into
//! an [`ObjectStructure`]: a [`CellArray`] plus, when squeezing, the
//! [`PointMap`] that renumbers the referenced file points to `0..n`.

use std::sync::Arc;

use crate::cache::{CacheKey, CacheKind};
use crate::catalog::object::{ObjectFamily, ObjectStructure, ObjectType};
use crate::data::array::{DataArray, SharedArray};
use crate::data::cell_array::CellArray;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::reader::fetch::ReadContext;
use crate::topology::cell_type::CellType;
use crate::topology::point_map::PointMap;

use super::{polyhedra, sets};

/// Maps file point ids to output point ids.
pub(crate) struct Remap {
    pub squeeze: bool,
    pub map: PointMap,
}

impl Remap {
    pub fn new(squeeze: bool) -> Self {
        Self {
            squeeze,
            map: PointMap::new(),
        }
    }

    #[inline]
    pub fn point(&mut self, file_id: i64) -> i64 {
        if self.squeeze {
            self.map.squeeze(file_id) as i64
        } else {
            file_id
        }
    }

    pub fn finish(self, cells: CellArray) -> ObjectStructure {
        ObjectStructure {
            cells,
            point_map: self.map,
            squeezed: self.squeeze,
        }
    }
}

pub(crate) fn conn_key(kind: CacheKind, index: usize) -> CacheKey {
    CacheKey::invariant(kind, index, 0)
}

/// Builds the structural cache of block or set `index`.
///
/// Objects without entries produce an empty structure.
pub fn build_structure<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    object_type: ObjectType,
    index: usize,
) -> Result<ObjectStructure, MeshIoError> {
    let object = ctx.catalog.object(object_type, index)?;
    let mut remap = Remap::new(ctx.settings.squeeze_points);
    if object.size == 0 {
        return Ok(remap.finish(CellArray::new()));
    }
    let cells = match object_type.family() {
        ObjectFamily::Block => insert_block_cells(ctx, object_type, index, &mut remap)?,
        ObjectFamily::Set => sets::insert_set_cells(ctx, object_type, index, &mut remap)?,
        ObjectFamily::Map => {
            return Err(MeshIoError::UnreadableArray(format!(
                "connectivity of {object_type:?}"
            )));
        }
    };
    let structure = remap.finish(cells);
    crate::debug_invariants!(
        crate::DebugInvariants::validate_invariants(&structure.point_map),
        "squeezed point map"
    );
    Ok(structure)
}

fn insert_block_cells<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    block_type: ObjectType,
    index: usize,
    remap: &mut Remap,
) -> Result<CellArray, MeshIoError> {
    let object = ctx.catalog.object(block_type, index)?;
    let block = object
        .block()
        .ok_or_else(|| MeshIoError::UnreadableArray(format!("{block_type:?} {index} is not a block")))?;
    let shape = block.shape;

    match shape.cell_type {
        CellType::Polyhedron => polyhedra::insert_polyhedra(ctx, block_type, index, remap),
        CellType::Polygon => {
            let counts = ctx
                .get(conn_key(CacheKind::EntityCounts(block_type), index))
                .map_err(|e| {
                    log::error!("{block_type:?} {}: {e}", object.id);
                    MeshIoError::MissingEntityCounts {
                        object_type: block_type,
                        index,
                    }
                })?;
            let conn = fetch_connectivity(ctx, block_type, index)?;
            let counts = counts.as_i64().unwrap_or(&[]);
            let conn = conn.as_i64().unwrap_or(&[]);
            let mut cells = CellArray::with_capacity(object.size, conn.len());
            let mut pos = 0;
            for &n in counts.iter().take(object.size) {
                let n = usize::try_from(n).unwrap_or(0);
                let points = conn.get(pos..pos + n).ok_or_else(|| {
                    MeshIoError::MeshIoParse(format!(
                        "polygon block {} ends after {} of {} nodes",
                        object.id,
                        conn.len(),
                        pos + n
                    ))
                })?;
                cells.push_cell_iter(CellType::Polygon, points.iter().map(|&p| remap.point(p)));
                pos += n;
            }
            if cells.num_cells() != object.size {
                return Err(MeshIoError::MissingEntityCounts {
                    object_type: block_type,
                    index,
                });
            }
            Ok(cells)
        }
        CellType::Empty => Err(MeshIoError::UnsupportedElementType {
            type_name: block.type_name.clone(),
            nodes_per_entry: block.bounds_per_entry[0],
        }),
        cell_type => {
            let conn = fetch_connectivity(ctx, block_type, index)?;
            let conn = conn.as_i64().unwrap_or(&[]);
            let stride = block.bounds_per_entry[0];
            let ppc = shape.points_per_cell.min(stride);
            if stride == 0 || conn.len() < object.size * stride {
                return Err(MeshIoError::MeshIoParse(format!(
                    "{block_type:?} {} has {} connectivity entries for {} cells of {stride}",
                    object.id,
                    conn.len(),
                    object.size
                )));
            }
            let mut cells = CellArray::with_capacity(object.size, object.size * ppc);
            for cell in conn.chunks_exact(stride).take(object.size) {
                cells.push_cell_iter(cell_type, cell[..ppc].iter().map(|&p| remap.point(p)));
            }
            Ok(cells)
        }
    }
}

pub(crate) fn fetch_connectivity<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    object_type: ObjectType,
    index: usize,
) -> Result<SharedArray, MeshIoError> {
    ctx.get(conn_key(CacheKind::Connectivity(object_type), index))
        .map_err(|e| {
            log::error!("{object_type:?} {index}: {e}");
            MeshIoError::MissingConnectivity { object_type, index }
        })
}

/// Point coordinates for one object at `step`.
///
/// Squeezed objects get their own compacted array; otherwise the shared,
/// file-wide coordinate array is returned.
pub fn assemble_points<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    step: usize,
    structure: &ObjectStructure,
) -> Result<SharedArray, MeshIoError> {
    let time = ctx.coordinate_time(step);
    let coords = ctx.get(CacheKey::new(time, CacheKind::NodalCoords, 0, 0))?;
    if !structure.squeezed {
        return Ok(coords);
    }
    let values = structure
        .point_map
        .gather(coords.as_f64().unwrap_or(&[]), 3);
    Ok(Arc::new(DataArray::float("Points", 3, values)))
}
