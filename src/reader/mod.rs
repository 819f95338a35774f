//! The reader driver.
//!
//! [`ExodusReader`] owns a record source, the [`ReaderSettings`], the
//! [`Catalog`] of the loaded file and the [`ArrayCache`]. Every setter applies
//! the invalidation its change requires, so a following
//! [`request_data`](ExodusReader::request_data) never serves stale arrays.
//!
//! ```
//! use exo_sieve::prelude::*;
//!
//! let source = InMemoryExodus::new("cube", 3)
//!     .with_coordinates(vec![vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0], vec![0.0; 4]])
//!     .with_block(ObjectType::ElemBlock, MemBlock::new(1, "QUAD4", 4, vec![1, 2, 3, 4]));
//! let mut reader = ExodusReader::new(source, ReaderSettings::default());
//! reader.load_metadata()?;
//! let output = reader.request_data(0)?;
//! let mesh = output.meshes().next().unwrap();
//! assert_eq!(mesh.num_cells(), 1);
//! assert_eq!(mesh.num_points(), 4);
//! # Ok::<(), MeshIoError>(())
//! ```

pub mod fetch;

use crate::assembly::output::{MeshOutput, assemble_time_step};
use crate::cache::{ArrayCache, CacheKey, CacheKeyMask, CacheKind};
use crate::catalog::Catalog;
use crate::catalog::object::{ObjectType, VarType};
use crate::config::ReaderSettings;
use crate::data::array::SharedArray;
use crate::io::ExodusSource;
use crate::mesh_error::MeshIoError;
use crate::topology::cache::InvalidateCache;

use fetch::ReadContext;

/// Cached, selection-aware access to one Exodus file.
#[derive(Debug)]
pub struct ExodusReader<S> {
    source: S,
    settings: ReaderSettings,
    catalog: Option<Catalog>,
    cache: ArrayCache,
}

impl<S: ExodusSource> ExodusReader<S> {
    pub fn new(source: S, settings: ReaderSettings) -> Self {
        let cache = ArrayCache::new(settings.cache_capacity);
        Self {
            source,
            settings,
            catalog: None,
            cache,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ArrayCache {
        &self.cache
    }

    /// (Re)reads all metadata.
    ///
    /// On failure the previous catalog, if any, is kept.
    pub fn load_metadata(&mut self) -> Result<&Catalog, MeshIoError> {
        let mut catalog = Catalog::load(&self.source).inspect_err(|e| {
            log::error!("failed to load metadata: {e}");
        })?;
        catalog.apply_status_rules(&self.settings);
        self.cache.clear();
        log::info!(
            "loaded `{}`: {} nodes, {} element blocks, {} time steps",
            catalog.title(),
            catalog.model().num_nodes,
            catalog.num_objects(ObjectType::ElemBlock),
            catalog.num_time_steps()
        );
        Ok(self.catalog.insert(catalog))
    }

    pub fn catalog(&self) -> Result<&Catalog, MeshIoError> {
        self.catalog.as_ref().ok_or(MeshIoError::MetadataNotLoaded)
    }

    fn catalog_mut(&mut self) -> Result<&mut Catalog, MeshIoError> {
        self.catalog.as_mut().ok_or(MeshIoError::MetadataNotLoaded)
    }

    /// Assembles every selected object at time `step`.
    ///
    /// Files without time values accept step 0 only.
    pub fn request_data(&mut self, step: usize) -> Result<MeshOutput, MeshIoError> {
        let catalog = self.catalog.as_mut().ok_or(MeshIoError::MetadataNotLoaded)?;
        let count = catalog.num_time_steps();
        if step >= count.max(1) {
            return Err(MeshIoError::TimeStepOutOfRange { step, count });
        }
        assemble_time_step(&self.source, catalog, &self.settings, &mut self.cache, step)
    }

    /// Any cached or derivable array, read through the cache.
    pub fn array(&mut self, key: CacheKey) -> Result<SharedArray, MeshIoError> {
        let catalog = self.catalog.as_ref().ok_or(MeshIoError::MetadataNotLoaded)?;
        ReadContext::new(&self.source, catalog, &self.settings, &mut self.cache).get(key)
    }

    /// Selects or deselects the object at sorted position `sorted`.
    pub fn set_object_status(
        &mut self,
        object_type: ObjectType,
        sorted: usize,
        status: bool,
    ) -> Result<(), MeshIoError> {
        let catalog = self.catalog_mut()?;
        let index = catalog.file_index(object_type, sorted)?;
        self.set_object_status_at(object_type, index, status)
    }

    pub fn set_object_status_by_name(
        &mut self,
        object_type: ObjectType,
        name: &str,
        status: bool,
    ) -> Result<(), MeshIoError> {
        let index = self
            .catalog()?
            .find_by_name(object_type, name)
            .ok_or_else(|| MeshIoError::UnknownObjectName {
                object_type,
                name: name.to_string(),
            })?;
        self.set_object_status_at(object_type, index, status)
    }

    fn set_object_status_at(
        &mut self,
        object_type: ObjectType,
        index: usize,
        status: bool,
    ) -> Result<(), MeshIoError> {
        let object = self.catalog_mut()?.object_mut(object_type, index)?;
        if object.status == status {
            return Ok(());
        }
        object.status = status;
        self.invalidate_point_maps();
        Ok(())
    }

    pub fn set_array_status(
        &mut self,
        var_type: VarType,
        index: usize,
        status: bool,
    ) -> Result<(), MeshIoError> {
        self.catalog_mut()?.array_mut(var_type, index)?.status = status;
        Ok(())
    }

    pub fn set_array_status_by_name(
        &mut self,
        var_type: VarType,
        name: &str,
        status: bool,
    ) -> Result<(), MeshIoError> {
        let catalog = self.catalog_mut()?;
        let index = catalog.find_array(var_type, name).ok_or_else(|| {
            MeshIoError::MeshIoParse(format!("no {var_type:?} array named `{name}`"))
        })?;
        catalog.array_mut(var_type, index)?.status = status;
        Ok(())
    }

    /// Selects attribute `attribute` of the block at sorted position `sorted`.
    pub fn set_attribute_status(
        &mut self,
        block_type: ObjectType,
        sorted: usize,
        attribute: usize,
        status: bool,
    ) -> Result<(), MeshIoError> {
        let catalog = self.catalog_mut()?;
        let index = catalog.file_index(block_type, sorted)?;
        let attr = catalog
            .object_mut(block_type, index)?
            .block_mut()
            .and_then(|b| b.attributes.get_mut(attribute))
            .ok_or(MeshIoError::AttributeIndexOutOfRange {
                block: index,
                index: attribute,
            })?;
        attr.status = status;
        Ok(())
    }

    pub fn set_squeeze_points(&mut self, squeeze: bool) {
        if self.settings.squeeze_points != squeeze {
            self.settings.squeeze_points = squeeze;
            self.invalidate_point_maps();
        }
    }

    pub fn set_apply_displacements(&mut self, apply: bool) {
        if self.settings.apply_displacements != apply {
            self.settings.apply_displacements = apply;
            self.invalidate_coordinates();
        }
    }

    pub fn set_displacement_magnitude(&mut self, magnitude: f64) {
        if self.settings.displacement_magnitude != magnitude {
            self.settings.displacement_magnitude = magnitude;
            self.invalidate_coordinates();
        }
    }

    pub fn set_has_mode_shapes(&mut self, has_mode_shapes: bool) {
        if self.settings.has_mode_shapes != has_mode_shapes {
            self.settings.has_mode_shapes = has_mode_shapes;
            self.invalidate_coordinates();
        }
    }

    pub fn set_mode_shape_time(&mut self, time: f64) {
        if self.settings.mode_shape_time != time {
            self.settings.mode_shape_time = time;
            self.invalidate_coordinates();
        }
    }

    pub fn set_animate_mode_shapes(&mut self, animate: bool) {
        if self.settings.animate_mode_shapes != animate {
            self.settings.animate_mode_shapes = animate;
            self.invalidate_coordinates();
        }
    }

    /// New byte budget; applies immediately.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.settings.cache_capacity = capacity;
        self.cache.set_capacity(capacity);
    }

    pub fn set_generate_object_id_array(&mut self, on: bool) {
        self.settings.generate_object_id_array = on;
    }

    pub fn set_generate_global_element_id_array(&mut self, on: bool) {
        self.settings.generate_global_element_id_array = on;
    }

    pub fn set_generate_global_node_id_array(&mut self, on: bool) {
        self.settings.generate_global_node_id_array = on;
    }

    pub fn set_generate_implicit_element_id_array(&mut self, on: bool) {
        self.settings.generate_implicit_element_id_array = on;
    }

    pub fn set_generate_implicit_node_id_array(&mut self, on: bool) {
        self.settings.generate_implicit_node_id_array = on;
    }

    pub fn set_generate_file_id_array(&mut self, on: bool, file_id: i64) {
        self.settings.generate_file_id_array = on;
        self.settings.file_id = file_id;
    }

    /// Drops cached arrays and structures; keeps the catalog.
    pub fn reset_cache(&mut self) {
        self.cache.clear();
        self.catalog.invalidate_cache();
    }

    /// Drops everything derived from the file, including the catalog.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.catalog = None;
    }

    fn invalidate_coordinates(&mut self) {
        let key = CacheKey::invariant(CacheKind::NodalCoords, 0, 0);
        self.cache.invalidate(&key, CacheKeyMask::KIND);
    }

    fn invalidate_point_maps(&mut self) {
        self.catalog.invalidate_cache();
        for kind in [CacheKind::GlobalNodeId, CacheKind::ImplicitNodeId] {
            debug_assert!(kind.depends_on_point_map());
            self.cache
                .invalidate(&CacheKey::invariant(kind, 0, 0), CacheKeyMask::KIND);
        }
    }
}

impl<S: ExodusSource> InvalidateCache for ExodusReader<S> {
    fn invalidate_cache(&mut self) {
        self.reset_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{InMemoryExodus, MemBlock};

    fn reader() -> ExodusReader<InMemoryExodus> {
        let source = InMemoryExodus::new("t", 3)
            .with_coordinates(vec![vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]])
            .with_block(ObjectType::ElemBlock, MemBlock::new(7, "QUAD4", 4, vec![5, 6, 7, 8]))
            .with_block(ObjectType::ElemBlock, MemBlock::new(3, "QUAD4", 4, vec![1, 2, 3, 4]));
        ExodusReader::new(source, ReaderSettings::default())
    }

    #[test]
    fn requires_metadata() {
        let mut r = reader();
        assert_eq!(r.request_data(0).unwrap_err(), MeshIoError::MetadataNotLoaded);
        assert!(r.catalog().is_err());
    }

    #[test]
    fn step_bounds() {
        let mut r = reader();
        r.load_metadata().unwrap();
        assert!(r.request_data(0).is_ok());
        assert_eq!(
            r.request_data(1).unwrap_err(),
            MeshIoError::TimeStepOutOfRange { step: 1, count: 0 }
        );
    }

    #[test]
    fn selection_change_drops_structures() {
        let mut r = reader();
        r.load_metadata().unwrap();
        r.request_data(0).unwrap();
        let cat = r.catalog().unwrap();
        assert!(cat.object(ObjectType::ElemBlock, 0).unwrap().structure().is_some());

        r.set_object_status(ObjectType::ElemBlock, 0, false).unwrap();
        let cat = r.catalog().unwrap();
        assert!(cat.object(ObjectType::ElemBlock, 0).unwrap().structure().is_none());
        // sorted position 0 is the block with id 3, file index 1
        assert!(!cat.object(ObjectType::ElemBlock, 1).unwrap().status);
    }

    #[test]
    fn squeeze_toggle_rebuilds_points() {
        let mut r = reader();
        r.load_metadata().unwrap();
        let squeezed = r.request_data(0).unwrap();
        assert!(squeezed.meshes().all(|m| m.num_points() == 4));

        r.set_squeeze_points(false);
        let full = r.request_data(0).unwrap();
        assert!(full.meshes().all(|m| m.num_points() == 8));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut r = reader();
        r.load_metadata().unwrap();
        assert!(matches!(
            r.set_object_status_by_name(ObjectType::ElemBlock, "nope", true),
            Err(MeshIoError::UnknownObjectName { .. })
        ));
    }

    #[test]
    fn reset_drops_catalog() {
        let mut r = reader();
        r.load_metadata().unwrap();
        r.request_data(0).unwrap();
        assert!(!r.cache().is_empty());
        r.reset();
        assert!(r.cache().is_empty());
        assert!(r.catalog().is_err());
    }
}
