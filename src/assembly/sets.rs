//! Cells of node, edge, face, element and side sets.
//!
//! Node sets become vertices. Edge, face and element sets copy the cells
//! they reference out of the owning blocks, one output cell per set entry
//! and in set order. Side sets use the node list the file stores per side.

use hashbrown::HashMap;

use crate::cache::CacheKind;
use crate::catalog::object::ObjectType;
use crate::data::array::SharedArray;
use crate::data::cell_array::CellArray;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::reader::fetch::ReadContext;
use crate::topology::cell_type::CellType;

use super::connectivity::{Remap, conn_key, fetch_connectivity};

pub(crate) fn insert_set_cells<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    set_type: ObjectType,
    index: usize,
    remap: &mut Remap,
) -> Result<CellArray, MeshIoError> {
    match set_type {
        ObjectType::NodeSet => {
            let entries = fetch_connectivity(ctx, set_type, index)?;
            let entries = entries.as_i64().unwrap_or(&[]);
            let mut cells = CellArray::with_capacity(entries.len(), entries.len());
            for &node in entries {
                cells.push_cell(CellType::Vertex, &[remap.point(node)]);
            }
            Ok(cells)
        }
        ObjectType::SideSet => insert_side_cells(ctx, index, remap),
        ObjectType::EdgeSet | ObjectType::FaceSet | ObjectType::ElemSet => {
            insert_referenced_cells(ctx, set_type, index, remap)
        }
        other => Err(MeshIoError::UnreadableArray(format!(
            "set cells of {other:?}"
        ))),
    }
}

/// Copies block cells named by an edge, face or element set.
///
/// Negative orientations in edge and face sets reverse the copied points.
/// Entries that resolve to no fixed-size block yield an empty cell, keeping
/// the cell count equal to the set size.
///
/// Only the first `points_per_cell` nodes of each entry are copied, so a
/// reversed cell reverses its corner nodes and drops any extra per-entry
/// nodes of the block.
fn insert_referenced_cells<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    set_type: ObjectType,
    index: usize,
    remap: &mut Remap,
) -> Result<CellArray, MeshIoError> {
    let set = ctx.catalog.object(set_type, index)?;
    let block_type = set_type
        .referenced_block()
        .ok_or_else(|| MeshIoError::UnreadableArray(format!("blocks of {set_type:?}")))?;
    let entries = fetch_connectivity(ctx, set_type, index)?;
    let orientation = if set_type == ObjectType::ElemSet {
        None
    } else {
        ctx.get(conn_key(CacheKind::SetExtra(set_type), index)).ok()
    };
    let entries = entries.as_i64().unwrap_or(&[]);
    let orientation = orientation.as_ref().and_then(|o| o.as_i64());

    let mut blocks: HashMap<usize, SharedArray> = HashMap::new();
    let mut cells = CellArray::with_capacity(entries.len(), 0);
    let mut skipped = 0usize;
    for (i, &entry) in entries.iter().enumerate() {
        let found = usize::try_from(entry)
            .ok()
            .and_then(|e| Some((e, ctx.catalog.block_containing(block_type, e)?)));
        let Some((entry, block_index)) = found else {
            skipped += 1;
            cells.push_cell(CellType::Empty, &[]);
            continue;
        };
        let block = ctx.catalog.object(block_type, block_index)?;
        let shape = block.block().map(|b| (b.shape, b.bounds_per_entry[0]));
        let Some((shape, stride)) = shape.filter(|(s, n)| !s.cell_type.has_variable_size() && *n > 0)
        else {
            skipped += 1;
            cells.push_cell(CellType::Empty, &[]);
            continue;
        };
        if !blocks.contains_key(&block_index) {
            let conn = fetch_connectivity(ctx, block_type, block_index)?;
            blocks.insert(block_index, conn);
        }
        let local = entry + 1 - block.file_offset().unwrap_or(1);
        let points = blocks
            .get(&block_index)
            .and_then(|conn| conn.as_i64())
            .and_then(|conn| conn.get(local * stride..local * stride + shape.points_per_cell.min(stride)));
        let Some(points) = points else {
            skipped += 1;
            cells.push_cell(CellType::Empty, &[]);
            continue;
        };
        let reversed = orientation
            .and_then(|o| o.get(i))
            .is_some_and(|&o| o < 0);
        if reversed {
            cells.push_cell_iter(shape.cell_type, points.iter().rev().map(|&p| remap.point(p)));
        } else {
            cells.push_cell_iter(shape.cell_type, points.iter().map(|&p| remap.point(p)));
        }
    }
    if skipped > 0 {
        log::warn!(
            "{set_type:?} {}: {skipped} of {} entries do not resolve to a fixed-size {block_type:?}",
            set.id,
            entries.len()
        );
    }
    Ok(cells)
}

fn insert_side_cells<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    index: usize,
    remap: &mut Remap,
) -> Result<CellArray, MeshIoError> {
    let set = ctx.catalog.object(ObjectType::SideSet, index)?;
    let nodes = ctx
        .get(conn_key(CacheKind::SideSetNodes, index))
        .map_err(|e| {
            log::error!("side set {}: {e}", set.id);
            MeshIoError::MissingConnectivity {
                object_type: ObjectType::SideSet,
                index,
            }
        })?;
    let data = nodes.as_i64().unwrap_or(&[]);
    let (counts, nodes) = data.split_at(set.size.min(data.len()));

    let mut cells = CellArray::with_capacity(counts.len(), nodes.len());
    let mut pos = 0;
    for &n in counts {
        let n = usize::try_from(n).unwrap_or(0);
        let points = nodes.get(pos..pos + n).ok_or_else(|| {
            MeshIoError::MeshIoParse(format!(
                "side set {} node list ends at {} of {}",
                set.id,
                nodes.len(),
                pos + n
            ))
        })?;
        pos += n;
        match CellType::for_side_node_count(n) {
            Some(cell_type) => {
                cells.push_cell_iter(cell_type, points.iter().map(|&p| remap.point(p)));
            }
            None => {
                log::warn!("side set {}: no cell family has {n} nodes per side", set.id);
                cells.push_cell(CellType::Empty, &[]);
            }
        }
    }
    Ok(cells)
}
