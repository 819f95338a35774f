//! Flat, cell-indexed connectivity.

use serde::{Deserialize, Serialize};

use crate::topology::cell_type::CellType;

/// Cells of one output mesh.
///
/// Ordinary cells store their point ids. Polyhedra store a face stream
/// `[n0, p.., n1, p.., ...]` and report the face count as their size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellArray {
    types: Vec<CellType>,
    sizes: Vec<usize>,
    offsets: Vec<usize>,
    connectivity: Vec<i64>,
}

/// Borrowed view of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRef<'a> {
    pub cell_type: CellType,
    /// Point count, or face count for polyhedra.
    pub size: usize,
    pub connectivity: &'a [i64],
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            sizes: Vec::new(),
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    pub fn with_capacity(cells: usize, entries: usize) -> Self {
        let mut offsets = Vec::with_capacity(cells + 1);
        offsets.push(0);
        Self {
            types: Vec::with_capacity(cells),
            sizes: Vec::with_capacity(cells),
            offsets,
            connectivity: Vec::with_capacity(entries),
        }
    }

    pub fn push_cell(&mut self, cell_type: CellType, points: &[i64]) {
        self.push_raw(cell_type, points.len(), points.iter().copied());
    }

    pub fn push_cell_iter<I>(&mut self, cell_type: CellType, points: I)
    where
        I: IntoIterator<Item = i64>,
    {
        let before = self.connectivity.len();
        self.connectivity.extend(points);
        let size = self.connectivity.len() - before;
        self.finish_cell(cell_type, size);
    }

    /// Appends a polyhedron given its faces as point lists.
    pub fn push_polyhedron<F>(&mut self, faces: &[F])
    where
        F: AsRef<[i64]>,
    {
        for face in faces {
            let face = face.as_ref();
            self.connectivity.push(face.len() as i64);
            self.connectivity.extend_from_slice(face);
        }
        self.finish_cell(CellType::Polyhedron, faces.len());
    }

    fn push_raw<I>(&mut self, cell_type: CellType, size: usize, points: I)
    where
        I: IntoIterator<Item = i64>,
    {
        self.connectivity.extend(points);
        self.finish_cell(cell_type, size);
    }

    fn finish_cell(&mut self, cell_type: CellType, size: usize) {
        self.types.push(cell_type);
        self.sizes.push(size);
        self.offsets.push(self.connectivity.len());
    }

    pub fn num_cells(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn cell(&self, i: usize) -> Option<CellRef<'_>> {
        let cell_type = *self.types.get(i)?;
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        Some(CellRef {
            cell_type,
            size: self.sizes[i],
            connectivity: &self.connectivity[start..end],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = CellRef<'_>> + '_ {
        (0..self.num_cells()).filter_map(move |i| self.cell(i))
    }

    pub fn cell_types(&self) -> &[CellType] {
        &self.types
    }

    pub fn connectivity(&self) -> &[i64] {
        &self.connectivity
    }

    /// Faces of polyhedron `i` as point slices.
    pub fn polyhedron_faces(&self, i: usize) -> Option<Vec<&[i64]>> {
        let cell = self.cell(i)?;
        if cell.cell_type != CellType::Polyhedron {
            return None;
        }
        let mut faces = Vec::with_capacity(cell.size);
        let mut rest = cell.connectivity;
        while let Some((&n, tail)) = rest.split_first() {
            let n = usize::try_from(n).ok()?;
            if tail.len() < n {
                return None;
            }
            let (face, tail) = tail.split_at(n);
            faces.push(face);
            rest = tail;
        }
        Some(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_cells() {
        let mut cells = CellArray::new();
        cells.push_cell(CellType::Triangle, &[0, 1, 2]);
        cells.push_polyhedron(&[vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
        cells.push_cell_iter(CellType::Line, [3, 4]);

        assert_eq!(cells.num_cells(), 3);
        let poly = cells.cell(1).unwrap();
        assert_eq!(poly.size, 2);
        assert_eq!(poly.connectivity.len(), 10);
        assert_eq!(cells.polyhedron_faces(1).unwrap()[1], &[1, 4, 5, 2]);
        assert_eq!(cells.cell(2).unwrap().connectivity, &[3, 4]);
        assert!(cells.polyhedron_faces(0).is_none());
        assert!(cells.cell(3).is_none());
    }

    #[test]
    fn default_array_accepts_cells() {
        let mut cells = CellArray::default();
        assert_eq!(cells, CellArray::new());
        cells.push_cell(CellType::Vertex, &[9]);
        assert_eq!(cells.cell(0).unwrap().connectivity, &[9]);
    }
}
