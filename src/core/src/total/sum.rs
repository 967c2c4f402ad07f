//! Elementwise summation of aligned cubes.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::align::Alignment;
use crate::cube::Cube;
use crate::error::{Result, TotalError};

/// How missing (`NaN`) values combine during summation.
///
/// The policy applies both when reducing a cube along the aggregation axis
/// and when adding cubes together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// A missing value in any contributor makes the result cell missing.
    #[default]
    Propagate,
    /// Missing values count as zero; a cell is missing only when every
    /// contributor is missing there.
    SkipMissing,
}

impl MissingPolicy {
    fn identity(self) -> f64 {
        match self {
            Self::Propagate => 0.0,
            Self::SkipMissing => f64::NAN,
        }
    }

    /// Combine a running total with one contribution.
    pub fn combine(self, acc: f64, value: f64) -> f64 {
        match self {
            Self::Propagate => acc + value,
            Self::SkipMissing if acc.is_nan() => value,
            Self::SkipMissing if value.is_nan() => acc,
            Self::SkipMissing => acc + value,
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::SkipMissing => write!(f, "skip-missing"),
        }
    }
}

impl FromStr for MissingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "propagate" => Ok(Self::Propagate),
            "skip-missing" | "skip" => Ok(Self::SkipMissing),
            other => Err(format!(
                "unknown missing-value policy '{}' (expected propagate or skip-missing)",
                other
            )),
        }
    }
}

/// Sum all cubes into one array shaped like the common dimensions.
pub fn sum(cubes: &[Cube], alignment: &Alignment, policy: MissingPolicy) -> Result<ArrayD<f64>> {
    let shape = alignment.shape();
    let mut total = ArrayD::from_elem(IxDyn(&shape), policy.identity());

    for cube in cubes {
        match alignment.aggregation_axis() {
            Some(axis) => {
                let reduced = reduce_axis(cube.data(), axis, policy);
                accumulate(&mut total, reduced.view(), policy)?;
            }
            None => accumulate(&mut total, cube.data().view(), policy)?,
        }
    }

    Ok(total)
}

fn reduce_axis(data: &ArrayD<f64>, axis: usize, policy: MissingPolicy) -> ArrayD<f64> {
    data.map_axis(Axis(axis), |lane| {
        lane.iter()
            .fold(policy.identity(), |acc, &v| policy.combine(acc, v))
    })
}

fn accumulate(total: &mut ArrayD<f64>, contribution: ArrayViewD<'_, f64>, policy: MissingPolicy) -> Result<()> {
    if total.shape() != contribution.shape() {
        return Err(TotalError::Assembly {
            expected: total.shape().to_vec(),
            actual: contribution.shape().to_vec(),
        });
    }

    Zip::from(total)
        .and(contribution)
        .for_each(|acc, &value| *acc = policy.combine(*acc, value));
    Ok(())
}
