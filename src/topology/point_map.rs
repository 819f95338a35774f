//! Squeezed point numbering for one block or set.
//!
//! A [`PointMap`] hands out compact local ids the first time a file point is
//! referenced, so an object's output only carries the points it uses.

use hashbrown::HashMap;

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::MeshIoError;

/// Bidirectional file-point to local-point map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointMap {
    forward: HashMap<usize, usize>,
    reverse: Vec<usize>,
}

impl PointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the local id of `file_id`, allocating the next one on first sight.
    ///
    /// Negative ids come from corrupt connectivity; they are reported and
    /// treated as point 0.
    pub fn squeeze(&mut self, file_id: i64) -> usize {
        let file_id = if file_id < 0 {
            log::warn!("negative point id {file_id} in connectivity, using 0");
            0
        } else {
            file_id as usize
        };
        let next = self.reverse.len();
        *self.forward.entry(file_id).or_insert_with(|| {
            self.reverse.push(file_id);
            next
        })
    }

    /// Local id of `file_id` if it has been squeezed.
    pub fn local(&self, file_id: usize) -> Option<usize> {
        self.forward.get(&file_id).copied()
    }

    /// File id of `local`.
    pub fn file(&self, local: usize) -> Option<usize> {
        self.reverse.get(local).copied()
    }

    /// File ids in local order.
    pub fn file_ids(&self) -> &[usize] {
        &self.reverse
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// Gathers `components`-wide tuples of a file-indexed array in local order.
    ///
    /// File ids beyond the source array produce zero tuples and a warning.
    pub fn gather<T: Copy + Default>(&self, values: &[T], components: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(self.reverse.len() * components);
        for &file_id in &self.reverse {
            let range = file_id
                .checked_mul(components)
                .and_then(|start| Some(start..start.checked_add(components)?));
            match range.and_then(|r| values.get(r)) {
                Some(tuple) => out.extend_from_slice(tuple),
                None => {
                    log::warn!("point {file_id} outside of {}-tuple array", components);
                    out.extend(std::iter::repeat_n(T::default(), components));
                }
            }
        }
        out
    }
}

impl DebugInvariants for PointMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PointMap");
    }

    fn validate_invariants(&self) -> Result<(), MeshIoError> {
        ensure(self.forward.len() == self.reverse.len(), || {
            format!(
                "point map sizes differ: {} forward, {} reverse",
                self.forward.len(),
                self.reverse.len()
            )
        })?;
        for (local, file_id) in self.reverse.iter().enumerate() {
            ensure(self.forward.get(file_id) == Some(&local), || {
                format!("file point {file_id} does not map back to {local}")
            })?;
        }
        Ok(())
    }
}
