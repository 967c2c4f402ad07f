//! Provenance recording for totaled cubes.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TotalError};

/// Delimiter placed between contributor paths in the `source` attribute.
pub const DEFAULT_SOURCE_DELIMITER: &str = ", ";

/// The ordered, full paths of every contributing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    paths: Vec<String>,
    delimiter: String,
}

impl Provenance {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// The `source` attribute value.
    pub fn render(&self) -> String {
        self.paths.join(&self.delimiter)
    }

    pub(crate) fn into_paths(self) -> Vec<String> {
        self.paths
    }
}

/// Record the caller-supplied paths exactly as given, in order.
///
/// Paths are never shortened or normalized. Only byte-for-byte duplicates are
/// dropped, keeping the first occurrence. A path that is empty or not valid
/// UTF-8 cannot be written into `source` verbatim and is rejected.
pub fn record_provenance<P: AsRef<Path>>(paths: &[P], delimiter: &str) -> Result<Provenance> {
    let mut seen: HashSet<&OsStr> = HashSet::with_capacity(paths.len());
    let mut recorded = Vec::with_capacity(paths.len());

    for (index, path) in paths.iter().enumerate() {
        let raw = path.as_ref().as_os_str();
        let full = match raw.to_str() {
            Some(full) if !full.is_empty() => full,
            _ => return Err(TotalError::InvalidPath { index }),
        };
        if !seen.insert(raw) {
            debug!(path = %full, index, "Duplicate source path recorded once");
            continue;
        }
        recorded.push(full.to_string());
    }

    Ok(Provenance {
        paths: recorded,
        delimiter: delimiter.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_paths_in_caller_order() {
        let paths = [
            "/scratch/run-7/ais/output/ais.lslr.json",
            "/scratch/run-7/glaciers/output/glaciers.lslr.json",
        ];

        let provenance = record_provenance(&paths, DEFAULT_SOURCE_DELIMITER).unwrap();
        assert_eq!(
            provenance.render(),
            "/scratch/run-7/ais/output/ais.lslr.json, /scratch/run-7/glaciers/output/glaciers.lslr.json"
        );
    }

    #[test]
    fn test_exact_duplicates_only() {
        let paths = ["/a/x.json", "/b/x.json", "/a/x.json"];

        let provenance = record_provenance(&paths, ";").unwrap();
        assert_eq!(provenance.paths(), &["/a/x.json", "/b/x.json"]);
        assert_eq!(provenance.render(), "/a/x.json;/b/x.json");
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let paths = ["/a/x.json", ""];
        assert!(matches!(
            record_provenance(&paths, ", "),
            Err(TotalError::InvalidPath { index: 1 })
        ));
    }

    #[test]
    fn test_paths_are_not_normalized_before_deduplication() {
        let paths = ["/a//x.json", "/a/x.json", "/a/./x.json"];

        let provenance = record_provenance(&paths, ", ").unwrap();
        assert_eq!(provenance.paths().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_are_rejected() {
        use std::os::unix::ffi::OsStrExt;

        let first = Path::new(OsStr::from_bytes(b"/runs/\xff.json"));
        let second = Path::new(OsStr::from_bytes(b"/runs/\xfe.json"));

        assert!(matches!(
            record_provenance(&[Path::new("/runs/ok.json"), first, second], ", "),
            Err(TotalError::InvalidPath { index: 1 })
        ));
    }
}
