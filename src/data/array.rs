//! Shared data arrays handed out by the array cache.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Value storage of a [`DataArray`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ArrayValues {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Float(v) => v.len(),
            ArrayValues::Int(v) => v.len(),
            ArrayValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, tuple-structured array.
///
/// Values are stored interleaved: tuple `t`, component `c` lives at
/// `t * components + c`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataArray {
    name: String,
    components: usize,
    values: ArrayValues,
}

/// Handle type returned by the cache and stored in output meshes.
pub type SharedArray = Arc<DataArray>;

impl DataArray {
    pub fn new(name: impl Into<String>, components: usize, values: ArrayValues) -> Self {
        Self {
            name: name.into(),
            components: components.max(1),
            values,
        }
    }

    pub fn float(name: impl Into<String>, components: usize, values: Vec<f64>) -> Self {
        Self::new(name, components, ArrayValues::Float(values))
    }

    pub fn int(name: impl Into<String>, components: usize, values: Vec<i64>) -> Self {
        Self::new(name, components, ArrayValues::Int(values))
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, 1, ArrayValues::Text(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn values(&self) -> &ArrayValues {
        &self.values
    }

    pub fn into_values(self) -> ArrayValues {
        self.values
    }

    /// Number of tuples.
    pub fn tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.values {
            ArrayValues::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.values {
            ArrayValues::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match &self.values {
            ArrayValues::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Copy of the array under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Approximate heap footprint, used for cache accounting.
    pub fn byte_size(&self) -> usize {
        let payload = match &self.values {
            ArrayValues::Float(v) => std::mem::size_of_val(v.as_slice()),
            ArrayValues::Int(v) => std::mem::size_of_val(v.as_slice()),
            ArrayValues::Text(v) => v
                .iter()
                .map(|s| s.len() + std::mem::size_of::<String>())
                .sum(),
        };
        payload + self.name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuples_and_sizes() {
        let a = DataArray::float("disp", 3, vec![0.0; 12]);
        assert_eq!(a.tuples(), 4);
        assert_eq!(a.byte_size(), 12 * 8 + 4);
        assert!(a.as_i64().is_none());

        let ids = DataArray::int("ids", 1, vec![1, 2, 3]);
        assert_eq!(ids.as_i64(), Some(&[1, 2, 3][..]));
        assert_eq!(ids.renamed("ObjectId").name(), "ObjectId");
    }

    #[test]
    fn zero_components_clamp_to_one() {
        let a = DataArray::int("x", 0, vec![5, 6]);
        assert_eq!(a.components(), 1);
        assert_eq!(a.tuples(), 2);
    }
}
