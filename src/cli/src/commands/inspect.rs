//! The `inspect` command: summarizes cube files without totaling them.

use anyhow::Result;
use clap::Args;
use facts_total_core::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::Printer;

#[derive(Args)]
pub struct InspectArgs {
    /// Cube files to inspect
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Tabled, Serialize)]
struct CubeRow {
    #[tabled(rename = "File")]
    path: String,
    #[tabled(rename = "Dimensions")]
    dimensions: String,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "Missing")]
    missing: usize,
    #[tabled(rename = "Coordinates")]
    coordinates: String,
    #[tabled(skip)]
    attributes: Attributes,
}

impl CubeRow {
    fn new(path: String, cube: &Cube) -> Self {
        let shape: Vec<String> = cube.shape().iter().map(usize::to_string).collect();
        Self {
            path,
            dimensions: cube.dimension_names().join(", "),
            shape: format!("({})", shape.join(", ")),
            missing: cube.data().iter().filter(|v| v.is_nan()).count(),
            coordinates: cube
                .coordinates()
                .iter()
                .map(|c| format!("{} ({})", c.name(), c.dimension()))
                .collect::<Vec<_>>()
                .join(", "),
            attributes: cube.attributes().clone(),
        }
    }
}

pub fn execute(args: InspectArgs, printer: &Printer) -> Result<()> {
    let rows = args
        .paths
        .iter()
        .map(|path| {
            let cube = read_cube(path)?;
            Ok(CubeRow::new(path.display().to_string(), &cube))
        })
        .collect::<Result<Vec<_>>>()?;

    printer.rows(&rows, "No cube files.")?;

    for row in rows.iter().filter(|r| !r.attributes.is_empty()) {
        printer.section(&row.path);
        for (key, value) in row.attributes.iter() {
            printer.field(key, &value.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use ndarray::arr2;

    #[test]
    fn test_row_summarizes_cube() {
        let cube = Cube::new(
            vec![
                Dimension::new("years", [2020, 2030]),
                Dimension::new("locations", ["nyc", "boston", "miami"]),
            ],
            arr2(&[[1.0, f64::NAN, 3.0], [4.0, 5.0, f64::NAN]]).into_dyn(),
            [("units", "mm")].into_iter().collect(),
        )
        .unwrap()
        .with_coordinates(vec![Coordinate::new("lat", "locations", [40.7, 42.4, 25.8])])
        .unwrap();

        let row = CubeRow::new("/runs/ais.json".to_string(), &cube);
        assert_eq!(row.dimensions, "years, locations");
        assert_eq!(row.shape, "(2, 3)");
        assert_eq!(row.missing, 2);
        assert_eq!(row.attributes.len(), 1);
        assert_eq!(row.coordinates, "lat (locations)");
    }

    #[test]
    fn test_missing_file_fails() {
        let args = InspectArgs {
            paths: vec![PathBuf::from("/nonexistent/ais.json")],
        };
        let error = execute(args, &Printer::new(OutputFormat::Json)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TotalError>(),
            Some(TotalError::Io { .. })
        ));
    }
}
