//! Object kinds, per-object metadata and connectivity families.

use serde::{Deserialize, Serialize};

use crate::data::cell_array::CellArray;
use crate::topology::cell_type::{CellShape, CellType};
use crate::topology::point_map::PointMap;

/// Block, set and map collections of an Exodus file, in metadata load order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    EdgeBlock,
    FaceBlock,
    ElemBlock,
    NodeSet,
    EdgeSet,
    FaceSet,
    SideSet,
    ElemSet,
    NodeMap,
    EdgeMap,
    FaceMap,
    ElemMap,
}

/// Coarse grouping of [`ObjectType`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectFamily {
    Block,
    Set,
    Map,
}

impl ObjectType {
    pub const ALL: [ObjectType; 12] = [
        ObjectType::EdgeBlock,
        ObjectType::FaceBlock,
        ObjectType::ElemBlock,
        ObjectType::NodeSet,
        ObjectType::EdgeSet,
        ObjectType::FaceSet,
        ObjectType::SideSet,
        ObjectType::ElemSet,
        ObjectType::NodeMap,
        ObjectType::EdgeMap,
        ObjectType::FaceMap,
        ObjectType::ElemMap,
    ];

    /// Position in [`ObjectType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn family(self) -> ObjectFamily {
        use ObjectType::*;
        match self {
            EdgeBlock | FaceBlock | ElemBlock => ObjectFamily::Block,
            NodeSet | EdgeSet | FaceSet | SideSet | ElemSet => ObjectFamily::Set,
            NodeMap | EdgeMap | FaceMap | ElemMap => ObjectFamily::Map,
        }
    }

    pub fn is_block(self) -> bool {
        self.family() == ObjectFamily::Block
    }

    pub fn is_set(self) -> bool {
        self.family() == ObjectFamily::Set
    }

    pub fn is_map(self) -> bool {
        self.family() == ObjectFamily::Map
    }

    /// Block collection a set or map refers into.
    pub fn referenced_block(self) -> Option<ObjectType> {
        use ObjectType::*;
        match self {
            EdgeSet | EdgeMap => Some(EdgeBlock),
            FaceSet | FaceMap => Some(FaceBlock),
            ElemSet | SideSet | ElemMap => Some(ElemBlock),
            _ => None,
        }
    }

    pub(crate) fn unnamed_label(self) -> &'static str {
        match self.family() {
            ObjectFamily::Block => "block",
            ObjectFamily::Set => "set",
            ObjectFamily::Map => "map",
        }
    }
}

/// Owners of result variables. Global and nodal variables have no object
/// collection; the others follow their [`ObjectType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VarType {
    Global,
    Nodal,
    EdgeBlock,
    FaceBlock,
    ElemBlock,
    NodeSet,
    EdgeSet,
    FaceSet,
    SideSet,
    ElemSet,
}

impl VarType {
    pub const ALL: [VarType; 10] = [
        VarType::Global,
        VarType::Nodal,
        VarType::EdgeBlock,
        VarType::FaceBlock,
        VarType::ElemBlock,
        VarType::NodeSet,
        VarType::EdgeSet,
        VarType::FaceSet,
        VarType::SideSet,
        VarType::ElemSet,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn object_type(self) -> Option<ObjectType> {
        match self {
            VarType::Global | VarType::Nodal => None,
            VarType::EdgeBlock => Some(ObjectType::EdgeBlock),
            VarType::FaceBlock => Some(ObjectType::FaceBlock),
            VarType::ElemBlock => Some(ObjectType::ElemBlock),
            VarType::NodeSet => Some(ObjectType::NodeSet),
            VarType::EdgeSet => Some(ObjectType::EdgeSet),
            VarType::FaceSet => Some(ObjectType::FaceSet),
            VarType::SideSet => Some(ObjectType::SideSet),
            VarType::ElemSet => Some(ObjectType::ElemSet),
        }
    }

    pub fn from_object(object_type: ObjectType) -> Option<VarType> {
        VarType::ALL
            .into_iter()
            .find(|v| v.object_type() == Some(object_type))
    }
}

/// Output containers, in output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectivityKind {
    ElemBlock,
    FaceBlock,
    EdgeBlock,
    ElemSet,
    SideSet,
    FaceSet,
    EdgeSet,
    NodeSet,
}

impl ConnectivityKind {
    pub const ALL: [ConnectivityKind; 8] = [
        ConnectivityKind::ElemBlock,
        ConnectivityKind::FaceBlock,
        ConnectivityKind::EdgeBlock,
        ConnectivityKind::ElemSet,
        ConnectivityKind::SideSet,
        ConnectivityKind::FaceSet,
        ConnectivityKind::EdgeSet,
        ConnectivityKind::NodeSet,
    ];

    pub fn object_type(self) -> ObjectType {
        match self {
            ConnectivityKind::ElemBlock => ObjectType::ElemBlock,
            ConnectivityKind::FaceBlock => ObjectType::FaceBlock,
            ConnectivityKind::EdgeBlock => ObjectType::EdgeBlock,
            ConnectivityKind::ElemSet => ObjectType::ElemSet,
            ConnectivityKind::SideSet => ObjectType::SideSet,
            ConnectivityKind::FaceSet => ObjectType::FaceSet,
            ConnectivityKind::EdgeSet => ObjectType::EdgeSet,
            ConnectivityKind::NodeSet => ObjectType::NodeSet,
        }
    }

    /// Container label shown to consumers.
    pub fn label(self) -> &'static str {
        match self {
            ConnectivityKind::ElemBlock => "Element Blocks",
            ConnectivityKind::FaceBlock => "Face Blocks",
            ConnectivityKind::EdgeBlock => "Edge Blocks",
            ConnectivityKind::ElemSet => "Element Sets",
            ConnectivityKind::SideSet => "Side Sets",
            ConnectivityKind::FaceSet => "Face Sets",
            ConnectivityKind::EdgeSet => "Edge Sets",
            ConnectivityKind::NodeSet => "Node Sets",
        }
    }
}

/// A block attribute and whether it is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub status: bool,
}

/// Cached connectivity and point numbering of one block or set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectStructure {
    pub cells: CellArray,
    /// Empty when squeezing is off.
    pub point_map: PointMap,
    pub squeezed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockInfo {
    pub type_name: String,
    /// 1-based position of the first entry within all blocks of this type.
    pub file_offset: usize,
    /// Nodes, edges and faces per entry.
    pub bounds_per_entry: [usize; 3],
    pub shape: CellShape,
    pub attributes: Vec<AttributeInfo>,
    pub structure: Option<ObjectStructure>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetInfo {
    pub file_offset: usize,
    pub distribution_factors: usize,
    pub structure: Option<ObjectStructure>,
}

/// Kind-specific part of [`ObjectInfo`].
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Block(BlockInfo),
    Set(SetInfo),
    Map,
}

/// Metadata for one block, set or map.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectInfo {
    pub name: String,
    /// Id as stored in the file.
    pub id: i64,
    /// Number of entries.
    pub size: usize,
    /// Selected for output.
    pub status: bool,
    /// False after a read failure during assembly.
    pub loadable: bool,
    pub kind: ObjectKind,
}

impl ObjectInfo {
    pub fn block(&self) -> Option<&BlockInfo> {
        match &self.kind {
            ObjectKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut BlockInfo> {
        match &mut self.kind {
            ObjectKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn set(&self) -> Option<&SetInfo> {
        match &self.kind {
            ObjectKind::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn file_offset(&self) -> Option<usize> {
        match &self.kind {
            ObjectKind::Block(b) => Some(b.file_offset),
            ObjectKind::Set(s) => Some(s.file_offset),
            ObjectKind::Map => None,
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.block()
            .map(|b| b.shape.cell_type)
            .unwrap_or(CellType::Empty)
    }

    pub fn structure(&self) -> Option<&ObjectStructure> {
        match &self.kind {
            ObjectKind::Block(b) => b.structure.as_ref(),
            ObjectKind::Set(s) => s.structure.as_ref(),
            ObjectKind::Map => None,
        }
    }

    /// Slot for the structural cache; `None` for maps.
    pub fn structure_slot(&mut self) -> Option<&mut Option<ObjectStructure>> {
        match &mut self.kind {
            ObjectKind::Block(b) => Some(&mut b.structure),
            ObjectKind::Set(s) => Some(&mut s.structure),
            ObjectKind::Map => None,
        }
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        self.block().map(|b| b.attributes.as_slice()).unwrap_or(&[])
    }
}
