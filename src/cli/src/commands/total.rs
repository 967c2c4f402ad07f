//! The `total` command: reads component files, totals them and writes the
//! result.

use anyhow::{bail, Context, Result};
use clap::Args;
use facts_total_core::prelude::*;
use facts_total_core::window::check_consistent_steps;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::info;

use crate::output::Printer;

#[derive(Args)]
pub struct TotalArgs {
    /// Name of the workflow being totaled
    #[arg(long, default_value = "my_workflow_name")]
    pub name: String,

    /// Component projection file to include (repeat for each file)
    #[arg(long = "item", required = true)]
    pub items: Vec<PathBuf>,

    /// First year of the projection window
    #[arg(long)]
    pub pyear_start: Option<i64>,

    /// Last year of the projection window
    #[arg(long)]
    pub pyear_end: Option<i64>,

    /// Step between projection years
    #[arg(long)]
    pub pyear_step: Option<i64>,

    /// Where to write the totaled file
    #[arg(long)]
    pub output_path: PathBuf,

    /// Dimension to sum away within and across files
    #[arg(long)]
    pub aggregation_dim: Option<String>,

    /// Missing-value policy (propagate or skip-missing)
    #[arg(long)]
    pub missing: Option<MissingPolicy>,

    /// Attribute conflict rule (first-wins or strict)
    #[arg(long)]
    pub conflicts: Option<ConflictRule>,

    /// Delimiter between paths in the `source` attribute
    #[arg(long)]
    pub source_delimiter: Option<String>,
}

#[derive(Tabled, Serialize)]
struct ContributorRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Source")]
    path: String,
}

#[derive(Serialize)]
struct TotalSummary {
    workflow: String,
    output_path: String,
    dimensions: Vec<String>,
    shape: Vec<usize>,
    coordinates: Vec<String>,
    contributors: Vec<String>,
}

impl TotalArgs {
    fn options(&self, settings: &Config) -> TotalOptions {
        let mut options = settings.totaling.clone();
        if let Some(dim) = &self.aggregation_dim {
            options.aggregation_dim = Some(dim.clone());
        }
        if let Some(missing) = self.missing {
            options.missing = missing;
        }
        if let Some(conflicts) = self.conflicts {
            options.conflicts = conflicts;
        }
        if let Some(delimiter) = &self.source_delimiter {
            options.source_delimiter = delimiter.clone();
        }
        options
    }

    fn window(&self, settings: &Config) -> Result<Option<YearWindow>> {
        match (self.pyear_start, self.pyear_end, self.pyear_step) {
            (Some(start), Some(end), Some(step)) => Ok(Some(
                YearWindow::new(start, end, step).with_dimension(&settings.window.dimension),
            )),
            (None, None, None) => Ok(settings.window.year_window()),
            _ => bail!("--pyear-start, --pyear-end and --pyear-step must be given together"),
        }
    }
}

/// Resolve `items` to absolute paths without following symlinks.
fn resolve_paths(items: &[PathBuf]) -> Result<Vec<PathBuf>> {
    items
        .iter()
        .map(|item| {
            std::path::absolute(item)
                .with_context(|| format!("Failed to resolve {}", item.display()))
        })
        .collect()
}

fn load_cubes(paths: &[PathBuf], window: Option<&YearWindow>) -> Result<Vec<Cube>> {
    let Some(window) = window else {
        return paths
            .iter()
            .map(|path| read_cube(path).map_err(Into::into))
            .collect();
    };

    let windowed = paths
        .iter()
        .map(|path| {
            let cube = read_cube(path)?;
            window.apply(cube, &path.display().to_string())
        })
        .collect::<facts_total_core::Result<Vec<_>>>()?;
    check_consistent_steps(&windowed);
    Ok(windowed.into_iter().map(|w| w.cube).collect())
}

pub fn execute(args: TotalArgs, settings: &Config, printer: &Printer) -> Result<()> {
    let options = args.options(settings);
    let window = args.window(settings)?;
    let paths = resolve_paths(&args.items)?;

    info!(workflow = %args.name, files = paths.len(), "Totaling workflow");
    let cubes = load_cubes(&paths, window.as_ref())?;

    let totaler = Totaler::new(options);
    let result = totaler.total(&cubes, &paths)?;
    write_total(&args.output_path, &result, Some(&args.name))?;

    report(&args.name, &args.output_path, &result, printer)
}

fn report(name: &str, output_path: &Path, result: &TotalCube, printer: &Printer) -> Result<()> {
    let rows: Vec<ContributorRow> = result
        .sources()
        .iter()
        .enumerate()
        .map(|(index, path)| ContributorRow {
            index,
            path: path.clone(),
        })
        .collect();

    if printer.format().is_document() {
        return printer.document(&TotalSummary {
            workflow: name.to_string(),
            output_path: output_path.display().to_string(),
            dimensions: result
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            shape: result.data().shape().to_vec(),
            coordinates: result
                .coordinates()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            contributors: result.sources().to_vec(),
        });
    }

    printer.section(&format!("Total: {}", name));
    printer.rows(&rows, "No contributors.")?;
    printer.done(&format!(
        "Totaled {} file(s) into {}",
        rows.len(),
        output_path.display()
    ));
    Ok(())
}
