//! Year-window checks applied to cubes as they are loaded.
//!
//! Component projections are produced with their own start/end/step year
//! settings. Before totaling, each input is checked against the requested
//! window: a wider range is subset to the window, a differing step is
//! reported, and a non-uniform step is rejected.

use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::cube::{Cube, Dimension};
use crate::error::{Result, TotalError};

/// Default name of the year dimension.
pub const DEFAULT_YEAR_DIMENSION: &str = "years";

/// The requested year range and step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    #[serde(default = "default_year_dimension")]
    pub dimension: String,
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

/// A cube after windowing, with the year step it was found to use.
#[derive(Debug, Clone)]
pub struct WindowedCube {
    pub cube: Cube,
    /// `None` when fewer than two years remain
    pub step: Option<i64>,
}

impl YearWindow {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self {
            dimension: default_year_dimension(),
            start,
            end,
            step,
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>) -> Self {
        self.dimension = name.into();
        self
    }

    /// Check `cube` against the window, subsetting it when its years extend
    /// past the window. `path` identifies the cube in logs and errors.
    pub fn apply(&self, cube: Cube, path: &str) -> Result<WindowedCube> {
        let axis = cube.axis_of(&self.dimension).ok_or_else(|| {
            TotalError::invalid_cube(format!(
                "{}: no '{}' dimension",
                path, self.dimension
            ))
        })?;
        let years = year_values(&cube.dimensions()[axis], path)?;

        let (first, last) = match (years.iter().min(), years.iter().max()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => {
                return Err(TotalError::invalid_cube(format!(
                    "{}: '{}' dimension has no ticks",
                    path, self.dimension
                )))
            }
        };

        let (cube, years) = if first != self.start || last != self.end {
            warn!(
                path,
                found_start = first,
                found_end = last,
                start = self.start,
                end = self.end,
                "Year range does not match the requested window; subsetting"
            );
            let keep: Vec<usize> = years
                .iter()
                .enumerate()
                .filter(|(_, y)| (self.start..=self.end).contains(*y))
                .map(|(i, _)| i)
                .collect();
            if keep.is_empty() {
                return Err(TotalError::invalid_cube(format!(
                    "{}: no years fall within {}..={}",
                    path, self.start, self.end
                )));
            }
            let years = keep.iter().map(|&i| years[i]).collect::<Vec<_>>();
            (subset(cube, axis, &keep)?, years)
        } else {
            (cube, years)
        };

        let steps = years
            .windows(2)
            .map(|w| {
                w[1].checked_sub(w[0]).ok_or_else(|| {
                    TotalError::invalid_cube(format!(
                        "{}: step between years {} and {} is out of range",
                        path, w[0], w[1]
                    ))
                })
            })
            .collect::<Result<BTreeSet<i64>>>()?;
        if steps.len() > 1 {
            return Err(TotalError::NonUniformYearStep {
                path: path.to_string(),
                steps: steps.into_iter().collect(),
            });
        }

        let step = steps.into_iter().next();
        if let Some(found) = step {
            if found != self.step {
                warn!(
                    path,
                    found_step = found,
                    step = self.step,
                    "Year step does not match the requested step"
                );
            }
        }

        Ok(WindowedCube { cube, step })
    }
}

/// Warn when windowed cubes disagree on their year step.
///
/// Returns `true` when all known steps agree.
pub fn check_consistent_steps(cubes: &[WindowedCube]) -> bool {
    let steps: BTreeSet<i64> = cubes.iter().filter_map(|c| c.step).collect();
    if steps.len() > 1 {
        warn!(steps = ?steps, "Year steps are not the same across all inputs");
        return false;
    }
    true
}

fn year_values(dimension: &Dimension, path: &str) -> Result<Vec<i64>> {
    dimension
        .ticks()
        .iter()
        .map(|tick| {
            tick.as_int().ok_or_else(|| {
                TotalError::invalid_cube(format!(
                    "{}: year tick {} is not an integer",
                    path, tick
                ))
            })
        })
        .collect()
}

fn subset(cube: Cube, axis: usize, keep: &[usize]) -> Result<Cube> {
    let year_dimension = cube.dimensions()[axis].name().to_string();
    let coordinates = cube
        .coordinates()
        .iter()
        .map(|c| {
            if c.dimension() == year_dimension {
                c.select(keep)
            } else {
                c.clone()
            }
        })
        .collect();
    let (mut dimensions, data, attributes) = cube.into_parts();
    let data = data.select(Axis(axis), keep);

    let ticks: Vec<_> = keep
        .iter()
        .map(|&i| dimensions[axis].ticks()[i].clone())
        .collect();
    dimensions[axis] = Dimension::new(year_dimension, ticks);

    Cube::new(dimensions, data, attributes)?.with_coordinates(coordinates)
}

fn default_year_dimension() -> String {
    DEFAULT_YEAR_DIMENSION.to_string()
}
