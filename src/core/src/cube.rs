//! Labeled N-dimensional cubes.
//!
//! A [`Cube`] pairs an `f64` array with named coordinate axes and a metadata
//! mapping. Missing values are stored as `NaN`. Cubes are immutable once
//! constructed: every field is private and [`Cube::new`] is the only way in,
//! so the shape invariant holds for the cube's whole lifetime.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TotalError};

// ═══════════════════════════════════════════════════════════════════════════════
// Coordinate Ticks
// ═══════════════════════════════════════════════════════════════════════════════

/// A single coordinate value along a dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tick {
    Int(i64),
    #[serde(with = "nan_as_null")]
    Float(f64),
    Label(String),
}

impl Tick {
    /// Integer value of this tick, accepting floats with no fractional part.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

/// Ticks never coerce between kinds: `Int(1)` and `Float(1.0)` differ.
impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Label(a), Self::Label(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Label(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for Tick {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Tick {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Tick {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Tick {
    fn from(v: &str) -> Self {
        Self::Label(v.to_string())
    }
}

impl From<String> for Tick {
    fn from(v: String) -> Self {
        Self::Label(v)
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// JSON has no NaN: non-finite floats are written as `null`, and `null` reads
/// back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dimensions
// ═══════════════════════════════════════════════════════════════════════════════

/// A named axis with its ordered coordinate ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    name: String,
    ticks: Vec<Tick>,
}

impl Dimension {
    pub fn new<T: Into<Tick>>(name: impl Into<String>, ticks: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: name.into(),
            ticks: ticks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Attributes
// ═══════════════════════════════════════════════════════════════════════════════

/// A scalar or string metadata value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    #[serde(with = "nan_as_null")]
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttrValue {}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Immutable copy-on-write metadata mapping.
///
/// Clones share storage; [`Attributes::with`] copies only when the mapping is
/// shared, so no holder ever observes another holder's insertions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Arc<BTreeMap<String, AttrValue>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    /// Return a mapping with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Arc::make_mut(&mut self.0).insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auxiliary Coordinates
// ═══════════════════════════════════════════════════════════════════════════════

/// A named coordinate carried along one dimension, such as `lat` and `lon`
/// along `locations`. It labels the dimension's ticks and holds no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    name: String,
    dimension: String,
    values: Vec<Tick>,
}

impl Coordinate {
    pub fn new<T: Into<Tick>>(
        name: impl Into<String>,
        dimension: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            name: name.into(),
            dimension: dimension.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the dimension this coordinate runs along.
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn values(&self) -> &[Tick] {
        &self.values
    }

    /// The same coordinate restricted to the given tick positions.
    pub(crate) fn select(&self, keep: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            dimension: self.dimension.clone(),
            values: keep.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cube
// ═══════════════════════════════════════════════════════════════════════════════

/// A labeled N-dimensional numeric dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    dimensions: Vec<Dimension>,
    data: ArrayD<f64>,
    attributes: Attributes,
    coordinates: Vec<Coordinate>,
}

impl Cube {
    /// Build a cube, checking that `data` has one axis per dimension with a
    /// length equal to that dimension's tick count.
    pub fn new(dimensions: Vec<Dimension>, data: ArrayD<f64>, attributes: Attributes) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = dimensions.iter().find(|d| !seen.insert(d.name())) {
            return Err(TotalError::invalid_cube(format!(
                "dimension '{}' appears more than once",
                dup.name()
            )));
        }

        let expected: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        if data.shape() != expected.as_slice() {
            return Err(TotalError::invalid_cube(format!(
                "data shape {:?} does not match dimension lengths {:?}",
                data.shape(),
                expected
            )));
        }

        Ok(Self {
            dimensions,
            data,
            attributes,
            coordinates: Vec::new(),
        })
    }

    /// Attach auxiliary coordinates.
    ///
    /// Each must run along one of the cube's dimensions with one value per
    /// tick, and its name must not repeat another coordinate or dimension.
    pub fn with_coordinates(mut self, coordinates: Vec<Coordinate>) -> Result<Self> {
        let mut names: HashSet<&str> = self.dimensions.iter().map(Dimension::name).collect();
        for coordinate in &coordinates {
            if !names.insert(coordinate.name()) {
                return Err(TotalError::invalid_cube(format!(
                    "coordinate '{}' repeats an existing name",
                    coordinate.name()
                )));
            }
            let dimension = self.dimension(coordinate.dimension()).ok_or_else(|| {
                TotalError::invalid_cube(format!(
                    "coordinate '{}' runs along unknown dimension '{}'",
                    coordinate.name(),
                    coordinate.dimension()
                ))
            })?;
            if dimension.len() != coordinate.values().len() {
                return Err(TotalError::invalid_cube(format!(
                    "coordinate '{}' has {} values for {} '{}' ticks",
                    coordinate.name(),
                    coordinate.values().len(),
                    dimension.len(),
                    dimension.name()
                )));
            }
        }

        self.coordinates = coordinates;
        Ok(self)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Axis position of the named dimension.
    pub fn axis_of(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name() == name)
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(Dimension::name).collect()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.iter().find(|c| c.name() == name)
    }

    /// Dimensions, data and attributes. Coordinates are not included; read
    /// them with [`Cube::coordinates`] first when they are needed.
    pub fn into_parts(self) -> (Vec<Dimension>, ArrayD<f64>, Attributes) {
        (self.dimensions, self.data, self.attributes)
    }
}
