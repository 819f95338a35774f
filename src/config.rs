//! Reader settings.
//!
//! Settings can be built in code or deserialized, e.g. from JSON:
//!
//! ```
//! use exo_sieve::config::ReaderSettings;
//!
//! let s: ReaderSettings = serde_json::from_str(r#"{ "squeeze_points": false }"#).unwrap();
//! assert!(!s.squeeze_points);
//! assert!(s.generate_object_id_array);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::object::{ObjectType, VarType};

/// Initial selection of an object by name, applied after metadata load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStatusRule {
    pub object_type: ObjectType,
    pub name: String,
    pub status: bool,
}

/// Initial selection of a glommed array by name, applied after metadata load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayStatusRule {
    pub var_type: VarType,
    pub name: String,
    pub status: bool,
}

/// Options recognised by [`ExodusReader`](crate::reader::ExodusReader).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Keep only the points each object references.
    pub squeeze_points: bool,
    /// Add the displacement array to coordinates.
    pub apply_displacements: bool,
    pub displacement_magnitude: f64,
    /// Treat time values as mode shape indices.
    pub has_mode_shapes: bool,
    /// Phase in `[0, 1]` used when animating mode shapes.
    pub mode_shape_time: f64,
    pub animate_mode_shapes: bool,
    /// Array cache budget in bytes; zero disables eviction.
    pub cache_capacity: usize,
    pub generate_object_id_array: bool,
    pub generate_global_element_id_array: bool,
    pub generate_global_node_id_array: bool,
    pub generate_implicit_element_id_array: bool,
    pub generate_implicit_node_id_array: bool,
    pub generate_file_id_array: bool,
    /// Value of the file id array.
    pub file_id: i64,
    pub initial_object_status: Vec<ObjectStatusRule>,
    pub initial_array_status: Vec<ArrayStatusRule>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            squeeze_points: true,
            apply_displacements: true,
            displacement_magnitude: 1.0,
            has_mode_shapes: false,
            mode_shape_time: 0.0,
            animate_mode_shapes: false,
            cache_capacity: 0,
            generate_object_id_array: true,
            generate_global_element_id_array: false,
            generate_global_node_id_array: false,
            generate_implicit_element_id_array: false,
            generate_implicit_node_id_array: false,
            generate_file_id_array: false,
            file_id: 0,
            initial_object_status: Vec::new(),
            initial_array_status: Vec::new(),
        }
    }
}

impl ReaderSettings {
    /// Factor applied to displacements.
    pub fn displacement_scale(&self) -> f64 {
        if self.has_mode_shapes && self.animate_mode_shapes {
            self.displacement_magnitude * (2.0 * std::f64::consts::PI * self.mode_shape_time).cos()
        } else {
            self.displacement_magnitude
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ReaderSettings::default();
        assert!(s.squeeze_points);
        assert!(s.apply_displacements);
        assert_eq!(s.displacement_magnitude, 1.0);
        assert!(s.generate_object_id_array);
        assert!(!s.generate_global_node_id_array);
        assert_eq!(s.cache_capacity, 0);
    }

    #[test]
    fn json_overrides_and_rules() {
        let json = r#"{
            "cache_capacity": 1048576,
            "initial_object_status": [
                { "object_type": "NodeSet", "name": "inlet", "status": true }
            ],
            "initial_array_status": [
                { "var_type": "Nodal", "name": "disp", "status": true }
            ]
        }"#;
        let s: ReaderSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.cache_capacity, 1 << 20);
        assert_eq!(s.initial_object_status[0].object_type, ObjectType::NodeSet);
        assert_eq!(s.initial_array_status[0].var_type, VarType::Nodal);
        assert!(s.squeeze_points);
    }

    #[test]
    fn animated_mode_shapes_scale_by_phase() {
        let s = ReaderSettings {
            has_mode_shapes: true,
            animate_mode_shapes: true,
            displacement_magnitude: 2.0,
            mode_shape_time: 0.5,
            ..Default::default()
        };
        assert!((s.displacement_scale() + 2.0).abs() < 1e-12);
    }
}
