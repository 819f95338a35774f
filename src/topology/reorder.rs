//! Node reordering between Exodus and in-memory higher-order cell layouts.
//!
//! The file enumerates mid-edge and mid-face nodes of a few higher-order
//! families in a different order than the output cells expect. Each table
//! lists, for output slot `i`, the file slot it is taken from:
//! `out[i] = file[PERM[i]]`.

use super::cell_type::CellType;

const QUADRATIC_HEX: [usize; 20] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15,
];

const TRIQUADRATIC_HEX: [usize; 27] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15, 23, 24, 25, 26, 21,
    22, 20,
];

const QUADRATIC_WEDGE: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 14, 9, 10, 11];

const LAGRANGE_WEDGE: [usize; 21] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 14, 9, 10, 11, 16, 17, 20, 18, 19, 15,
];

const LAGRANGE_TETRA: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 14, 12, 13, 10];

/// Permutation table for `cell_type`, if its file layout differs.
pub fn permutation(cell_type: CellType) -> Option<&'static [usize]> {
    match cell_type {
        CellType::QuadraticHexahedron => Some(&QUADRATIC_HEX),
        CellType::TriquadraticHexahedron => Some(&TRIQUADRATIC_HEX),
        CellType::QuadraticWedge => Some(&QUADRATIC_WEDGE),
        CellType::LagrangeWedge => Some(&LAGRANGE_WEDGE),
        CellType::LagrangeTetra => Some(&LAGRANGE_TETRA),
        _ => None,
    }
}

/// Reorders every cell of a flat connectivity buffer in place.
///
/// Cells are `stride` entries apart; only the first `perm.len()` entries of
/// each cell are permuted, which lets 21-node hexahedra keep their trailing
/// center node. Trailing partial cells are left untouched.
pub fn reorder_cells(cell_type: CellType, stride: usize, conn: &mut [i64]) {
    let Some(perm) = permutation(cell_type) else {
        return;
    };
    if stride < perm.len() {
        return;
    }
    let mut scratch = vec![0i64; perm.len()];
    for cell in conn.chunks_exact_mut(stride) {
        for (dst, &src) in scratch.iter_mut().zip(perm) {
            *dst = cell[src];
        }
        cell[..perm.len()].copy_from_slice(&scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(p: &[usize]) -> bool {
        let mut seen = vec![false; p.len()];
        p.iter().all(|&i| i < p.len() && !std::mem::replace(&mut seen[i], true))
    }

    #[test]
    fn tables_are_permutations() {
        for ty in [
            CellType::QuadraticHexahedron,
            CellType::TriquadraticHexahedron,
            CellType::QuadraticWedge,
            CellType::LagrangeWedge,
            CellType::LagrangeTetra,
        ] {
            assert!(is_permutation(permutation(ty).unwrap()), "{ty:?}");
        }
        assert!(permutation(CellType::Hexahedron).is_none());
    }

    #[test]
    fn quadratic_hex_swaps_mid_edge_rings() {
        let mut conn: Vec<i64> = (0..40).collect();
        reorder_cells(CellType::QuadraticHexahedron, 20, &mut conn);
        assert_eq!(&conn[12..20], &[16, 17, 18, 19, 12, 13, 14, 15]);
        assert_eq!(&conn[32..40], &[36, 37, 38, 39, 32, 33, 34, 35]);
        assert_eq!(&conn[0..12], &(0..12).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn triquadratic_hex_face_centers() {
        let mut conn: Vec<i64> = (0..27).collect();
        reorder_cells(CellType::TriquadraticHexahedron, 27, &mut conn);
        assert_eq!(&conn[20..27], &[23, 24, 25, 26, 21, 22, 20]);
    }

    #[test]
    fn lagrange_tetra_and_wedge() {
        let mut tet: Vec<i64> = (0..15).collect();
        reorder_cells(CellType::LagrangeTetra, 15, &mut tet);
        assert_eq!(&tet[10..15], &[11, 14, 12, 13, 10]);

        let mut wedge: Vec<i64> = (0..21).collect();
        reorder_cells(CellType::LagrangeWedge, 21, &mut wedge);
        assert_eq!(&wedge[9..15], &[12, 13, 14, 9, 10, 11]);
        assert_eq!(&wedge[15..21], &[16, 17, 20, 18, 19, 15]);
    }

    #[test]
    fn wider_stride_keeps_trailing_nodes() {
        let mut conn: Vec<i64> = (0..21).collect();
        reorder_cells(CellType::QuadraticHexahedron, 21, &mut conn);
        assert_eq!(conn[20], 20);
        assert_eq!(conn[12], 16);
    }
}
