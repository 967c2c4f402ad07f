//! Totaling engine: combines component cubes into one total cube.
//!
//! This module handles:
//! - Alignment checks on dimension names and coordinates
//! - Elementwise summation with an explicit missing-value policy
//! - Lossless attribute merging with a deterministic conflict rule
//! - Provenance recording of every contributor's full path
//! - Assembly of the immutable result
//!
//! Every stage is a pure function of its inputs. A [`Totaler`] holds only
//! its options, so one instance can serve concurrent calls.

mod align;
mod assemble;
mod merge;
mod provenance;
mod sum;

pub use align::{align, Alignment};
pub use assemble::{assemble, TotalCube};
pub use merge::{merge_attributes, ConflictRule, SOURCE_KEY};
pub use provenance::{record_provenance, Provenance, DEFAULT_SOURCE_DELIMITER};
pub use sum::{sum, MissingPolicy};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::cube::Cube;
use crate::error::{Result, TotalError};

/// Options controlling a totaling call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalOptions {
    /// Dimension summed away within and across cubes, if any
    pub aggregation_dim: Option<String>,

    /// Missing-value policy for summation
    pub missing: MissingPolicy,

    /// Conflict rule for attribute merging
    pub conflicts: ConflictRule,

    /// Delimiter between paths in the `source` attribute
    pub source_delimiter: String,
}

impl Default for TotalOptions {
    fn default() -> Self {
        Self {
            aggregation_dim: None,
            missing: MissingPolicy::default(),
            conflicts: ConflictRule::default(),
            source_delimiter: DEFAULT_SOURCE_DELIMITER.to_string(),
        }
    }
}

impl TotalOptions {
    pub fn with_aggregation_dim(mut self, name: impl Into<String>) -> Self {
        self.aggregation_dim = Some(name.into());
        self
    }

    pub fn with_missing(mut self, policy: MissingPolicy) -> Self {
        self.missing = policy;
        self
    }

    pub fn with_conflicts(mut self, rule: ConflictRule) -> Self {
        self.conflicts = rule;
        self
    }

    pub fn with_source_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.source_delimiter = delimiter.into();
        self
    }
}

/// Runs the totaling pipeline with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Totaler {
    options: TotalOptions,
}

impl Totaler {
    pub fn new(options: TotalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TotalOptions {
        &self.options
    }

    /// Sum `cubes` into a [`TotalCube`].
    ///
    /// `paths[i]` is the full path `cubes[i]` was loaded from. The call either
    /// returns a complete result or an error; nothing partial is produced.
    #[instrument(
        skip_all,
        fields(
            cubes = cubes.len(),
            aggregation_dim = ?self.options.aggregation_dim,
            missing = %self.options.missing,
            conflicts = %self.options.conflicts,
        )
    )]
    pub fn total<P: AsRef<Path>>(&self, cubes: &[Cube], paths: &[P]) -> Result<TotalCube> {
        if cubes.is_empty() {
            return Err(TotalError::EmptyInput);
        }
        if cubes.len() != paths.len() {
            return Err(TotalError::PathCountMismatch {
                cubes: cubes.len(),
                paths: paths.len(),
            });
        }
        let provenance = record_provenance(paths, &self.options.source_delimiter)?;
        // lossy labels only name cubes in error messages
        let labels: Vec<String> = paths
            .iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .collect();

        let alignment = align(cubes, self.options.aggregation_dim.as_deref())
            .map_err(|e| e.with_paths(&labels))?;
        debug!(shape = ?alignment.shape(), "Cubes aligned");

        let data = sum(cubes, &alignment, self.options.missing)?;
        debug!("Cubes summed");

        let attributes = merge_attributes(cubes.iter().map(Cube::attributes), self.options.conflicts)
            .map_err(|e| e.with_paths(&labels))?;
        debug!(
            attributes = attributes.len(),
            contributors = provenance.paths().len(),
            "Attributes merged and provenance recorded"
        );

        let total = assemble(alignment, data, attributes, provenance)?;
        info!(
            contributors = total.sources().len(),
            shape = ?total.data().shape(),
            "Totaled cubes"
        );
        Ok(total)
    }
}

/// Total `cubes` with default options.
pub fn total<P: AsRef<Path>>(cubes: &[Cube], paths: &[P]) -> Result<TotalCube> {
    Totaler::default().total(cubes, paths)
}
