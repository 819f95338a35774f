//! Cell families produced by the assembler and the block type-name lookup.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshIoError;

/// Cell types emitted into output meshes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CellType {
    /// Placeholder for cells that could not be typed.
    #[default]
    Empty,
    Vertex,
    /// Vertex cloud with a per-block point count (superelements).
    PolyVertex,
    Line,
    QuadraticEdge,
    Triangle,
    QuadraticTriangle,
    Quad,
    QuadraticQuad,
    BiquadraticQuad,
    Tetra,
    QuadraticTetra,
    LagrangeTetra,
    Pyramid,
    QuadraticPyramid,
    Wedge,
    QuadraticWedge,
    LagrangeWedge,
    Hexahedron,
    QuadraticHexahedron,
    TriquadraticHexahedron,
    /// Arbitrary polygon, point count stored per cell.
    Polygon,
    /// Arbitrary polyhedron, face list stored per cell.
    Polyhedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Empty | CellType::Vertex | CellType::PolyVertex => 0,
            CellType::Line | CellType::QuadraticEdge => 1,
            CellType::Triangle
            | CellType::QuadraticTriangle
            | CellType::Quad
            | CellType::QuadraticQuad
            | CellType::BiquadraticQuad
            | CellType::Polygon => 2,
            _ => 3,
        }
    }

    /// True for cells whose point count varies per cell.
    pub fn has_variable_size(self) -> bool {
        matches!(self, CellType::Polygon | CellType::Polyhedron)
    }

    /// Cell type of a side-set face with `nodes` nodes, if any family fits.
    pub fn for_side_node_count(nodes: usize) -> Option<CellType> {
        match nodes {
            1 => Some(CellType::Vertex),
            2 => Some(CellType::Line),
            3 => Some(CellType::Triangle),
            4 => Some(CellType::Quad),
            6 => Some(CellType::QuadraticTriangle),
            8 => Some(CellType::QuadraticQuad),
            9 => Some(CellType::BiquadraticQuad),
            _ => None,
        }
    }
}

/// Result of matching a block's declared type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellShape {
    pub cell_type: CellType,
    /// Points per cell; zero for variable-size families.
    pub points_per_cell: usize,
}

impl CellShape {
    const fn new(cell_type: CellType, points_per_cell: usize) -> Self {
        Self {
            cell_type,
            points_per_cell,
        }
    }
}

/// Infers the cell family from an Exodus element type name.
///
/// Only the first three characters of the upper-cased name are significant,
/// except for `STRAIGHT` and `NULL`. `nodes_per_entry` disambiguates higher
/// order families. A `NULL` block with no entries yields an empty shape
/// without error, so do blocks of partitioned files that declare nothing.
pub fn infer_cell_shape(
    type_name: &str,
    nodes_per_entry: usize,
    size: usize,
) -> Result<CellShape, MeshIoError> {
    use CellType::*;

    let upper = type_name.trim().to_ascii_uppercase();
    let head: String = upper.chars().take(3).collect();
    let head = head.as_str();
    let n = nodes_per_entry;

    let shape = match (head, n) {
        ("TRI", 6) => CellShape::new(QuadraticTriangle, 6),
        ("SHE", 8 | 9) => CellShape::new(QuadraticQuad, 8),
        ("TET", 10 | 11) => CellShape::new(QuadraticTetra, 10),
        ("TET", 15) => CellShape::new(LagrangeTetra, 15),
        ("WED", 15) => CellShape::new(QuadraticWedge, 15),
        ("WED", 21) => CellShape::new(LagrangeWedge, 21),
        ("HEX", 20 | 21) => CellShape::new(QuadraticHexahedron, 20),
        ("HEX", 27) => CellShape::new(TriquadraticHexahedron, 27),
        ("QUA", 8) => CellShape::new(QuadraticQuad, 8),
        ("QUA", 9) => CellShape::new(BiquadraticQuad, 9),
        ("TRU" | "BEA" | "BAR" | "EDG", 3) => CellShape::new(QuadraticEdge, 3),
        ("PYR", 13) => CellShape::new(QuadraticPyramid, 13),
        ("CIR" | "SPH", _) => CellShape::new(Vertex, 1),
        ("BAR" | "TRU" | "BEA" | "EDG", _) => CellShape::new(Line, 2),
        ("TRI", _) => CellShape::new(Triangle, 3),
        ("QUA", _) => CellShape::new(Quad, 4),
        ("TET", _) => CellShape::new(Tetra, 4),
        ("PYR", _) => CellShape::new(Pyramid, 5),
        ("WED", _) => CellShape::new(Wedge, 6),
        ("HEX", _) => CellShape::new(Hexahedron, 8),
        ("NSI", _) => CellShape::new(Polygon, 0),
        ("NFA", _) => CellShape::new(Polyhedron, 0),
        ("SHE", 3) => CellShape::new(Triangle, 3),
        ("SHE", 4) => CellShape::new(Quad, 4),
        ("SUP", _) => CellShape::new(PolyVertex, n),
        _ if upper.starts_with("STRAIGHT") && n == 2 => CellShape::new(Line, 2),
        _ if upper.starts_with("NULL") && size == 0 => CellShape::new(Empty, 0),
        _ => {
            return Err(MeshIoError::UnsupportedElementType {
                type_name: type_name.to_string(),
                nodes_per_entry,
            });
        }
    };
    Ok(shape)
}
