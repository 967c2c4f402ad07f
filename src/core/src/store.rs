//! Reading and writing cube files.
//!
//! Cubes are stored as JSON documents:
//!
//! ```json
//! {
//!   "name": "total",
//!   "dimensions": [{"name": "years", "ticks": [2020, 2030]}],
//!   "data": [1.5, null],
//!   "attributes": {"units": "mm", "missing_value": null},
//!   "coordinates": [{"name": "lat", "dimension": "locations", "values": [40.7]}]
//! }
//! ```
//!
//! `data` is flattened in row-major order and `null` marks a missing value.
//! Float attributes and ticks use `null` for NaN the same way.

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::cube::{Attributes, Coordinate, Cube, Dimension};
use crate::error::{Result, TotalError};
use crate::total::TotalCube;

/// On-disk representation of a cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub dimensions: Vec<Dimension>,

    pub data: Vec<Option<f64>>,

    #[serde(default)]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<Coordinate>,
}

impl CubeRecord {
    pub fn from_cube(cube: &Cube) -> Self {
        Self {
            name: None,
            dimensions: cube.dimensions().to_vec(),
            data: cube
                .data()
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect(),
            attributes: cube.attributes().clone(),
            coordinates: cube.coordinates().to_vec(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn into_cube(self) -> Result<Cube> {
        let shape: Vec<usize> = self.dimensions.iter().map(Dimension::len).collect();
        let values: Vec<f64> = self
            .data
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| TotalError::invalid_cube(format!("data does not fit dimensions {:?}: {}", shape, e)))?;
        Cube::new(self.dimensions, data, self.attributes)?.with_coordinates(self.coordinates)
    }
}

/// Read a cube record without validating it.
pub fn read_record(path: impl AsRef<Path>) -> Result<CubeRecord> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| TotalError::io(&display, e))?;
    let record: CubeRecord = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| TotalError::serialization(&display, e))?;
    debug!(path = %path.display(), dimensions = record.dimensions.len(), "Read cube record");
    Ok(record)
}

/// Read and validate a cube.
pub fn read_cube(path: impl AsRef<Path>) -> Result<Cube> {
    let path = path.as_ref();
    read_record(path)?.into_cube().map_err(|e| match e {
        TotalError::InvalidCube { reason } => {
            TotalError::invalid_cube(format!("{}: {}", path.display(), reason))
        }
        other => other,
    })
}

/// Write a record, creating parent directories as needed.
pub fn write_record(path: impl AsRef<Path>, record: &CubeRecord) -> Result<()> {
    let path = path.as_ref();
    let display = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TotalError::io(parent.display().to_string(), e))?;
    }

    let file = File::create(path).map_err(|e| TotalError::io(&display, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)
        .map_err(|e| TotalError::serialization(&display, e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| TotalError::io(&display, e))?;
    Ok(())
}

pub fn write_cube(path: impl AsRef<Path>, cube: &Cube, name: Option<&str>) -> Result<()> {
    let mut record = CubeRecord::from_cube(cube);
    record.name = name.map(str::to_string);
    write_record(path, &record)
}

/// Write a totaled cube; its `source` attribute is written with it.
pub fn write_total(path: impl AsRef<Path>, total: &TotalCube, name: Option<&str>) -> Result<()> {
    let path = path.as_ref();
    write_cube(path, total.cube(), name)?;
    info!(
        path = %path.display(),
        contributors = total.sources().len(),
        "Totaled cube written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_maps_null_to_nan() {
        let record: CubeRecord = serde_json::from_str(
            r#"{
                "dimensions": [{"name": "x", "ticks": [0, 1, 2]}],
                "data": [1.0, null, 3.0]
            }"#,
        )
        .unwrap();

        let cube = record.into_cube().unwrap();
        assert!(cube.data()[[1]].is_nan());
        assert!(cube.attributes().is_empty());

        let back = CubeRecord::from_cube(&cube);
        assert_eq!(back.data, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_record_rejects_wrong_length() {
        let record: CubeRecord = serde_json::from_str(
            r#"{
                "dimensions": [{"name": "x", "ticks": [0, 1]}, {"name": "y", "ticks": ["a", "b"]}],
                "data": [1.0, 2.0, 3.0]
            }"#,
        )
        .unwrap();

        assert!(matches!(record.into_cube(), Err(TotalError::InvalidCube { .. })));
    }

    #[test]
    fn test_record_with_coordinates() {
        let record: CubeRecord = serde_json::from_str(
            r#"{
                "dimensions": [{"name": "locations", "ticks": ["nyc", "boston"]}],
                "data": [1.0, 2.0],
                "coordinates": [
                    {"name": "lat", "dimension": "locations", "values": [40.7, 42.4]},
                    {"name": "lon", "dimension": "locations", "values": [-74.0, -71.1]}
                ]
            }"#,
        )
        .unwrap();

        let cube = record.into_cube().unwrap();
        assert_eq!(cube.coordinates().len(), 2);
        assert_eq!(cube.coordinate("lon").unwrap().values()[1], crate::cube::Tick::Float(-71.1));
    }

    #[test]
    fn test_row_major_layout() {
        let record: CubeRecord = serde_json::from_str(
            r#"{
                "dimensions": [{"name": "x", "ticks": [0, 1]}, {"name": "y", "ticks": ["a", "b", "c"]}],
                "data": [1, 2, 3, 4, 5, 6]
            }"#,
        )
        .unwrap();

        let cube = record.into_cube().unwrap();
        assert_eq!(cube.data()[[0, 2]], 3.0);
        assert_eq!(cube.data()[[1, 0]], 4.0);
    }
}
