//! Construction of the final totaled cube.

use ndarray::ArrayD;

use super::align::Alignment;
use super::merge::SOURCE_KEY;
use super::provenance::Provenance;
use crate::cube::{Attributes, Coordinate, Cube, Dimension};
use crate::error::{Result, TotalError};

/// The immutable result of a totaling call.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalCube {
    cube: Cube,
    sources: Vec<String>,
}

impl TotalCube {
    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn dimensions(&self) -> &[Dimension] {
        self.cube.dimensions()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        self.cube.data()
    }

    pub fn attributes(&self) -> &Attributes {
        self.cube.attributes()
    }

    /// Auxiliary coordinates shared by every contributor.
    pub fn coordinates(&self) -> &[Coordinate] {
        self.cube.coordinates()
    }

    /// The rendered `source` attribute.
    pub fn source(&self) -> Option<&str> {
        self.cube.attributes().get(SOURCE_KEY).and_then(|v| v.as_str())
    }

    /// Full paths of every contributor, in caller order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn into_cube(self) -> Cube {
        self.cube
    }
}

impl AsRef<Cube> for TotalCube {
    fn as_ref(&self) -> &Cube {
        &self.cube
    }
}

/// Combine the stage outputs into a [`TotalCube`].
///
/// A shape mismatch here means an upstream stage is broken, not that the
/// input was bad.
pub fn assemble(
    alignment: Alignment,
    data: ArrayD<f64>,
    attributes: Attributes,
    provenance: Provenance,
) -> Result<TotalCube> {
    let expected = alignment.shape();
    if data.shape() != expected.as_slice() {
        return Err(TotalError::Assembly {
            expected,
            actual: data.shape().to_vec(),
        });
    }

    let attributes = attributes.with(SOURCE_KEY, provenance.render());
    let (dimensions, coordinates) = alignment.into_parts();
    let cube = Cube::new(dimensions, data, attributes)?.with_coordinates(coordinates)?;

    Ok(TotalCube {
        cube,
        sources: provenance.into_paths(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::total::align::align;
    use crate::total::provenance::record_provenance;
    use ndarray::arr1;

    fn alignment() -> Alignment {
        let cube = Cube::new(
            vec![Dimension::new("x", [0, 1])],
            arr1(&[0.0, 0.0]).into_dyn(),
            Attributes::new(),
        )
        .unwrap();
        align(&[cube], None).unwrap()
    }

    #[test]
    fn test_shape_mismatch_is_an_assembly_error() {
        let provenance = record_provenance(&["/a.json"], ", ").unwrap();
        let result = assemble(
            alignment(),
            arr1(&[1.0, 2.0, 3.0]).into_dyn(),
            Attributes::new(),
            provenance,
        );

        match result {
            Err(TotalError::Assembly { expected, actual }) => {
                assert_eq!(expected, vec![2]);
                assert_eq!(actual, vec![3]);
            }
            other => panic!("expected assembly error, got {other:?}"),
        }
    }

    #[test]
    fn test_source_is_always_written() {
        let provenance = record_provenance(&["/a.json", "/b.json"], ", ").unwrap();
        let total = assemble(
            alignment(),
            arr1(&[1.0, 2.0]).into_dyn(),
            Attributes::new(),
            provenance,
        )
        .unwrap();

        assert_eq!(total.source(), Some("/a.json, /b.json"));
        assert_eq!(total.sources().len(), 2);
    }
}
