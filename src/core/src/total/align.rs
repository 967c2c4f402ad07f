//! Dimensional compatibility checks across input cubes.

use crate::cube::{Coordinate, Cube, Dimension, Tick};
use crate::error::{AlignmentError, CubeRef, Result, TotalError};

/// The common coordinate structure of a set of aligned cubes.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Common dimensions with the aggregation axis removed
    dimensions: Vec<Dimension>,

    /// Position of the aggregation axis in every input cube
    aggregation_axis: Option<usize>,

    /// Auxiliary coordinates shared by every input, except those along the
    /// aggregation axis
    coordinates: Vec<Coordinate>,
}

impl Alignment {
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn aggregation_axis(&self) -> Option<usize> {
        self.aggregation_axis
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Shape implied by the common dimensions.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::len).collect()
    }

    pub(crate) fn into_parts(self) -> (Vec<Dimension>, Vec<Coordinate>) {
        (self.dimensions, self.coordinates)
    }
}

/// Verify that all cubes share dimension names and coordinates.
///
/// Ticks along `aggregation_dim` may differ between cubes since that axis is
/// summed away. Auxiliary coordinates on the other dimensions must be present
/// in every cube with identical values. Nothing is reindexed or resampled: any
/// other difference is an error.
pub fn align(cubes: &[Cube], aggregation_dim: Option<&str>) -> Result<Alignment> {
    let reference = cubes.first().ok_or(TotalError::EmptyInput)?;

    let aggregation_axis = match aggregation_dim {
        Some(name) => Some(reference.axis_of(name).ok_or_else(|| {
            AlignmentError::new(
                name,
                vec![CubeRef::new(0)],
                "aggregation dimension is not present",
            )
        })?),
        None => None,
    };

    for (index, cube) in cubes.iter().enumerate() {
        if index > 0 {
            check_names(reference, cube, index)?;
        }

        if let Some(axis) = aggregation_axis {
            let dimension = &cube.dimensions()[axis];
            if dimension.is_empty() {
                return Err(AlignmentError::new(
                    dimension.name(),
                    vec![CubeRef::new(index)],
                    "aggregation dimension has no ticks",
                )
                .into());
            }
        }

        if index == 0 {
            continue;
        }

        for (axis, (expected, actual)) in reference
            .dimensions()
            .iter()
            .zip(cube.dimensions())
            .enumerate()
        {
            if Some(axis) == aggregation_axis {
                continue;
            }
            if let Some(detail) = tick_mismatch(expected.ticks(), actual.ticks()) {
                return Err(AlignmentError::new(
                    expected.name(),
                    vec![CubeRef::new(0), CubeRef::new(index)],
                    detail,
                )
                .into());
            }
        }

        check_coordinates(reference, cube, index, aggregation_dim)?;
    }

    let coordinates = reference
        .coordinates()
        .iter()
        .filter(|c| Some(c.dimension()) != aggregation_dim)
        .cloned()
        .collect();

    let dimensions = reference
        .dimensions()
        .iter()
        .enumerate()
        .filter(|(axis, _)| Some(*axis) != aggregation_axis)
        .map(|(_, d)| d.clone())
        .collect();

    Ok(Alignment {
        dimensions,
        aggregation_axis,
        coordinates,
    })
}

fn check_names(reference: &Cube, cube: &Cube, index: usize) -> Result<()> {
    let expected = reference.dimension_names();
    let actual = cube.dimension_names();
    if expected == actual {
        return Ok(());
    }

    let position = expected
        .iter()
        .zip(&actual)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| expected.len().min(actual.len()));
    let dimension = expected
        .get(position)
        .or_else(|| actual.get(position))
        .copied()
        .unwrap_or_default();

    Err(AlignmentError::new(
        dimension,
        vec![CubeRef::new(0), CubeRef::new(index)],
        format!(
            "dimension names differ: [{}] vs [{}]",
            expected.join(", "),
            actual.join(", ")
        ),
    )
    .into())
}

fn check_coordinates(
    reference: &Cube,
    cube: &Cube,
    index: usize,
    aggregation_dim: Option<&str>,
) -> Result<()> {
    let carried = |c: &&Coordinate| Some(c.dimension()) != aggregation_dim;
    let fail = |dimension: &str, detail: String| -> Result<()> {
        Err(AlignmentError::new(
            dimension,
            vec![CubeRef::new(0), CubeRef::new(index)],
            detail,
        )
        .into())
    };

    for expected in reference.coordinates().iter().filter(carried) {
        let Some(actual) = cube.coordinate(expected.name()) else {
            return fail(
                expected.dimension(),
                format!("coordinate '{}' is missing", expected.name()),
            );
        };
        if actual.dimension() != expected.dimension() {
            return fail(
                expected.dimension(),
                format!(
                    "coordinate '{}' runs along '{}' instead of '{}'",
                    expected.name(),
                    actual.dimension(),
                    expected.dimension()
                ),
            );
        }
        if let Some(detail) = tick_mismatch(expected.values(), actual.values()) {
            let at = first_difference(expected.values(), actual.values())
                .and_then(|i| reference.dimension(expected.dimension())?.ticks().get(i))
                .map(|tick| format!(" at {}={}", expected.dimension(), tick))
                .unwrap_or_default();
            return fail(
                expected.dimension(),
                format!("coordinate '{}' varies across inputs{}: {}", expected.name(), at, detail),
            );
        }
    }

    if let Some(extra) = cube
        .coordinates()
        .iter()
        .filter(carried)
        .find(|c| reference.coordinate(c.name()).is_none())
    {
        return fail(
            extra.dimension(),
            format!("coordinate '{}' is not present in every input", extra.name()),
        );
    }

    Ok(())
}

fn first_difference(expected: &[Tick], actual: &[Tick]) -> Option<usize> {
    expected.iter().zip(actual).position(|(a, b)| a != b)
}

fn tick_mismatch(expected: &[Tick], actual: &[Tick]) -> Option<String> {
    if expected.len() != actual.len() {
        return Some(format!(
            "expected {} ticks, found {}",
            expected.len(),
            actual.len()
        ));
    }

    first_difference(expected, actual)
        .map(|i| format!("tick {} differs: {} vs {}", i, expected[i], actual[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::Attributes;
    use ndarray::ArrayD;

    fn cube(dimensions: Vec<Dimension>) -> Cube {
        let shape: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        Cube::new(dimensions, ArrayD::zeros(shape), Attributes::new()).unwrap()
    }

    fn alignment_error(result: Result<Alignment>) -> AlignmentError {
        match result {
            Err(TotalError::Alignment(e)) => e,
            other => panic!("expected alignment error, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_cubes_align() {
        let a = cube(vec![Dimension::new("x", [0, 1, 2])]);
        let b = cube(vec![Dimension::new("x", [0, 1, 2])]);

        let alignment = align(&[a, b], None).unwrap();
        assert_eq!(alignment.shape(), vec![3]);
        assert_eq!(alignment.aggregation_axis(), None);
    }

    #[test]
    fn test_differing_ticks_name_the_dimension() {
        let a = cube(vec![Dimension::new("x", [0, 1, 2])]);
        let b = cube(vec![Dimension::new("x", [0, 1, 3])]);

        let error = alignment_error(align(&[a, b], None));
        assert_eq!(error.dimension, "x");
        assert_eq!(error.cubes, vec![CubeRef::new(0), CubeRef::new(1)]);
        assert!(error.detail.contains("tick 2"));
    }

    #[test]
    fn test_differing_tick_counts() {
        let a = cube(vec![Dimension::new("y", ["a", "b"]), Dimension::new("x", [0, 1])]);
        let b = cube(vec![Dimension::new("y", ["a", "b"]), Dimension::new("x", [0, 1, 2])]);

        let error = alignment_error(align(&[a, b], None));
        assert_eq!(error.dimension, "x");
        assert!(error.detail.contains("expected 2 ticks, found 3"));
    }

    #[test]
    fn test_differing_dimensionality_is_rejected() {
        let a = cube(vec![Dimension::new("x", [0, 1])]);
        let b = cube(vec![Dimension::new("x", [0, 1]), Dimension::new("y", [0])]);

        let error = alignment_error(align(&[a, b], None));
        assert_eq!(error.dimension, "y");
    }

    #[test]
    fn test_reordered_dimensions_are_rejected() {
        let a = cube(vec![Dimension::new("x", [0, 1]), Dimension::new("y", [0, 1])]);
        let b = cube(vec![Dimension::new("y", [0, 1]), Dimension::new("x", [0, 1])]);

        let error = alignment_error(align(&[a, b], None));
        assert_eq!(error.dimension, "x");
    }

    #[test]
    fn test_aggregation_axis_may_differ() {
        let a = cube(vec![Dimension::new("file", ["a"]), Dimension::new("x", [0, 1])]);
        let b = cube(vec![Dimension::new("file", ["b", "c"]), Dimension::new("x", [0, 1])]);

        let alignment = align(&[a, b], Some("file")).unwrap();
        assert_eq!(alignment.aggregation_axis(), Some(0));
        assert_eq!(alignment.dimensions().len(), 1);
        assert_eq!(alignment.dimensions()[0].name(), "x");
    }

    #[test]
    fn test_missing_aggregation_dimension() {
        let a = cube(vec![Dimension::new("x", [0, 1])]);

        let error = alignment_error(align(&[a], Some("file")));
        assert_eq!(error.dimension, "file");
    }

    #[test]
    fn test_empty_aggregation_axis_is_rejected() {
        let a = cube(vec![Dimension::new("file", ["a"]), Dimension::new("x", [0])]);
        let b = cube(vec![Dimension::new("file", Vec::<Tick>::new()), Dimension::new("x", [0])]);

        let error = alignment_error(align(&[a, b], Some("file")));
        assert_eq!(error.cubes, vec![CubeRef::new(1)]);
    }

    fn located(lat: [f64; 2]) -> Cube {
        cube(vec![Dimension::new("file", ["a"]), Dimension::new("locations", ["nyc", "boston"])])
            .with_coordinates(vec![
                Coordinate::new("lat", "locations", lat),
                Coordinate::new("file_id", "file", [7]),
            ])
            .unwrap()
    }

    #[test]
    fn test_shared_coordinates_are_carried() {
        let alignment = align(&[located([40.7, 42.4]), located([40.7, 42.4])], Some("file")).unwrap();

        let names: Vec<_> = alignment.coordinates().iter().map(Coordinate::name).collect();
        assert_eq!(names, vec!["lat"]);
    }

    #[test]
    fn test_varying_coordinate_names_the_location() {
        let error = alignment_error(align(&[located([40.7, 42.4]), located([40.7, 42.5])], None));

        assert_eq!(error.dimension, "locations");
        assert!(error.detail.contains("'lat'"), "{}", error.detail);
        assert!(error.detail.contains("locations=\"boston\""), "{}", error.detail);
    }

    #[test]
    fn test_coordinate_missing_from_one_input() {
        let bare = cube(vec![Dimension::new("file", ["a"]), Dimension::new("locations", ["nyc", "boston"])]);

        let error = alignment_error(align(&[located([40.7, 42.4]), bare.clone()], None));
        assert!(error.detail.contains("missing"));

        let error = alignment_error(align(&[bare, located([40.7, 42.4])], None));
        assert!(error.detail.contains("not present in every input"));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(align(&[], None), Err(TotalError::EmptyInput)));
    }
}
