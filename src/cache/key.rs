//! Keys of the array cache and the wildcard mask used to invalidate them.

use crate::catalog::object::{ObjectType, VarType};

/// What a cached array holds; the "object type" field of a [`CacheKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKind {
    /// Result variable values; `array` is the glommed array index.
    Variable(VarType),
    /// Block attribute; `array` is the attribute index.
    Attribute(ObjectType),
    /// 0-based, reordered node connectivity of a block, or entry list of a set.
    Connectivity(ObjectType),
    /// Orientation or side column of a set.
    SetExtra(ObjectType),
    /// Element to face connectivity of polyhedral blocks.
    ElemFaceConnectivity,
    /// Per-entry node or face counts of variable-size blocks.
    EntityCounts(ObjectType),
    /// Node list of a side set, prefixed by per-side counts.
    SideSetNodes,
    /// Three-component coordinates, displaced when `time >= 0`.
    NodalCoords,
    /// Number map; `array` is the map index.
    Map(ObjectType),
    /// File-wide numbering of nodes or elements.
    IdMap(ObjectType),
    /// Global variable over all time steps.
    GlobalTemporal,
    ObjectId,
    GlobalElementId,
    GlobalNodeId,
    ImplicitElementId,
    ImplicitNodeId,
    SideSourceElement,
    SideSourceSide,
    InfoRecords,
    QaRecords,
}

impl CacheKind {
    /// Arrays that depend on an object's point map.
    pub fn depends_on_point_map(self) -> bool {
        matches!(self, CacheKind::GlobalNodeId | CacheKind::ImplicitNodeId)
    }
}

/// Identity of a cached array.
///
/// `time == -1` marks arrays that do not change between time steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub time: i64,
    pub kind: CacheKind,
    pub object: i64,
    pub array: i64,
}

impl CacheKey {
    pub const TIME_INVARIANT: i64 = -1;

    pub fn new(time: i64, kind: CacheKind, object: i64, array: i64) -> Self {
        Self {
            time,
            kind,
            object,
            array,
        }
    }

    /// Key of a time-invariant array.
    pub fn invariant(kind: CacheKind, object: usize, array: usize) -> Self {
        Self::new(Self::TIME_INVARIANT, kind, object as i64, array as i64)
    }

    /// True if `other` equals `self` on every field selected by `mask`.
    pub fn matches(&self, other: &CacheKey, mask: CacheKeyMask) -> bool {
        (!mask.time || self.time == other.time)
            && (!mask.kind || self.kind == other.kind)
            && (!mask.object || self.object == other.object)
            && (!mask.array || self.array == other.array)
    }
}

/// Fields of a [`CacheKey`] that must match during invalidation.
/// Unset fields act as wildcards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CacheKeyMask {
    pub time: bool,
    pub kind: bool,
    pub object: bool,
    pub array: bool,
}

impl CacheKeyMask {
    /// Exact-key match.
    pub const EXACT: CacheKeyMask = CacheKeyMask {
        time: true,
        kind: true,
        object: true,
        array: true,
    };

    /// Every array of one kind, any time, object or index.
    pub const KIND: CacheKeyMask = CacheKeyMask {
        time: false,
        kind: true,
        object: false,
        array: false,
    };

    /// One array of one object at every time step.
    pub const ALL_TIMES: CacheKeyMask = CacheKeyMask {
        time: false,
        kind: true,
        object: true,
        array: true,
    };
}
