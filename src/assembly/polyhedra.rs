//! Polyhedral (`NFACED`) element blocks.
//!
//! An `NFACED` block stores, per element, a count of faces and a list of
//! file-global face ids. Faces live in face blocks, each a run-length list of
//! nodes. A [`FaceBlockCache`] decodes each face block at most once per
//! assembly and then serves faces by index.

use hashbrown::HashMap;

use crate::cache::CacheKind;
use crate::catalog::object::ObjectType;
use crate::data::cell_array::CellArray;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::reader::fetch::ReadContext;

use super::connectivity::{Remap, conn_key, fetch_connectivity};

/// Decoded faces per face block, keyed by face block index.
#[derive(Debug, Default)]
pub struct FaceBlockCache {
    blocks: HashMap<usize, Vec<Vec<i64>>>,
}

impl FaceBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node list of 0-based file face `face`, or `None` if no face block
    /// holds it.
    pub fn face<S: ExodusSource + ?Sized>(
        &mut self,
        ctx: &mut ReadContext<'_, S>,
        face: usize,
    ) -> Result<Option<&[i64]>, MeshIoError> {
        let Some(block_index) = ctx.catalog.block_containing(ObjectType::FaceBlock, face) else {
            return Ok(None);
        };
        let block = ctx.catalog.object(ObjectType::FaceBlock, block_index)?;
        let local = face + 1 - block.file_offset().unwrap_or(1);
        if !self.blocks.contains_key(&block_index) {
            let decoded = decode_face_block(ctx, block_index)?;
            self.blocks.insert(block_index, decoded);
        }
        Ok(self
            .blocks
            .get(&block_index)
            .and_then(|faces| faces.get(local))
            .map(Vec::as_slice))
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

fn decode_face_block<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    index: usize,
) -> Result<Vec<Vec<i64>>, MeshIoError> {
    let object = ctx.catalog.object(ObjectType::FaceBlock, index)?;
    let block = object.block().ok_or_else(|| MeshIoError::MissingFaceData {
        index,
        reason: "face collection entry is not a block".into(),
    })?;
    let conn = fetch_connectivity(ctx, ObjectType::FaceBlock, index)?;
    let conn = conn.as_i64().unwrap_or(&[]);

    let counts: Vec<usize> = if block.shape.cell_type.has_variable_size() {
        let counts = ctx.get(conn_key(CacheKind::EntityCounts(ObjectType::FaceBlock), index))?;
        counts
            .as_i64()
            .unwrap_or(&[])
            .iter()
            .map(|&n| usize::try_from(n).unwrap_or(0))
            .collect()
    } else {
        vec![block.bounds_per_entry[0]; object.size]
    };

    let mut faces = Vec::with_capacity(counts.len());
    let mut pos = 0;
    for n in counts {
        let nodes = conn.get(pos..pos + n).ok_or_else(|| MeshIoError::MissingFaceData {
            index,
            reason: format!("face list ends at {} of {}", conn.len(), pos + n),
        })?;
        faces.push(nodes.to_vec());
        pos += n;
    }
    Ok(faces)
}

/// Appends one polyhedron per element of `NFACED` block `index`.
pub(crate) fn insert_polyhedra<S: ExodusSource + ?Sized>(
    ctx: &mut ReadContext<'_, S>,
    block_type: ObjectType,
    index: usize,
    remap: &mut Remap,
) -> Result<CellArray, MeshIoError> {
    let object = ctx.catalog.object(block_type, index)?;
    let face_counts = ctx
        .get(conn_key(CacheKind::EntityCounts(block_type), index))
        .map_err(|e| {
            log::warn!("polyhedral block {} has no face counts: {e}", object.id);
            MeshIoError::MissingEntityCounts {
                object_type: block_type,
                index,
            }
        })?;
    let elem_faces = ctx
        .get(conn_key(CacheKind::ElemFaceConnectivity, index))
        .map_err(|e| MeshIoError::MissingFaceData {
            index,
            reason: e.to_string(),
        })?;
    let face_counts = face_counts.as_i64().unwrap_or(&[]);
    let elem_faces = elem_faces.as_i64().unwrap_or(&[]);

    let mut cache = FaceBlockCache::new();
    let mut cells = CellArray::new();
    let mut pos = 0;
    for &nfaces in face_counts.iter().take(object.size) {
        let nfaces = usize::try_from(nfaces).unwrap_or(0);
        let face_ids = elem_faces
            .get(pos..pos + nfaces)
            .ok_or_else(|| MeshIoError::MissingFaceData {
                index,
                reason: format!("element-face list ends at {}", elem_faces.len()),
            })?;
        pos += nfaces;

        let mut faces: Vec<Vec<i64>> = Vec::with_capacity(nfaces);
        for &face in face_ids {
            let resolved = match usize::try_from(face) {
                Ok(face) => cache.face(ctx, face)?,
                Err(_) => None,
            };
            match resolved {
                Some(points) => faces.push(points.iter().map(|&p| remap.point(p)).collect()),
                None => log::warn!(
                    "polyhedral block {}: face {} is not in any face block",
                    object.id,
                    face + 1
                ),
            }
        }
        cells.push_polyhedron(&faces);
    }
    if cells.num_cells() != object.size {
        return Err(MeshIoError::MissingEntityCounts {
            object_type: block_type,
            index,
        });
    }
    Ok(cells)
}
