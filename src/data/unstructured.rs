//! Leaf meshes of the assembled output.

use std::sync::Arc;

use super::array::{DataArray, SharedArray};
use super::cell_array::CellArray;

/// Ordered, name-addressable collection of arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldData {
    arrays: Vec<SharedArray>,
}

impl FieldData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `array`, replacing any array with the same name.
    pub fn insert(&mut self, array: SharedArray) {
        match self.arrays.iter_mut().find(|a| a.name() == array.name()) {
            Some(slot) => *slot = array,
            None => self.arrays.push(array),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SharedArray> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.arrays.iter().map(|a| a.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedArray> + '_ {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

/// One block or set as an unstructured mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct UnstructuredMesh {
    /// Three-component point coordinates.
    pub points: SharedArray,
    pub cells: CellArray,
    pub point_data: FieldData,
    pub cell_data: FieldData,
    /// File-wide records (title, info, QA, global variables).
    pub field_data: FieldData,
}

impl Default for UnstructuredMesh {
    fn default() -> Self {
        Self {
            points: Arc::new(DataArray::float("Points", 3, Vec::new())),
            cells: CellArray::new(),
            point_data: FieldData::new(),
            cell_data: FieldData::new(),
            field_data: FieldData::new(),
        }
    }
}

impl UnstructuredMesh {
    pub fn num_points(&self) -> usize {
        self.points.tuples()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.num_cells()
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        let xyz = self.points.as_f64()?.get(3 * i..3 * i + 3)?;
        Some([xyz[0], xyz[1], xyz[2]])
    }
}
