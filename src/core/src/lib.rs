//! # FACTS Total Core
//!
//! Combines component projection cubes into a single total cube.
//!
//! ## Architecture
//!
//! - **Cube**: Labeled N-dimensional arrays with copy-on-write attributes
//! - **Totaling**: Alignment, summation, attribute merging, provenance and assembly
//! - **Window**: Year-range checks and subsetting applied to inputs
//! - **Store**: JSON cube files
//! - **Config**: Layered file and environment configuration
//! - **Telemetry**: Structured logging
//!
//! ```rust
//! use facts_total_core::prelude::*;
//! use ndarray::arr1;
//!
//! let a = Cube::new(
//!     vec![Dimension::new("x", [0, 1])],
//!     arr1(&[1.0, 2.0]).into_dyn(),
//!     [("units", "mm")].into_iter().collect(),
//! )?;
//! let b = a.clone();
//!
//! let result = total(&[a, b], &["/runs/a.json", "/runs/b.json"])?;
//! assert_eq!(result.data(), &arr1(&[2.0, 4.0]).into_dyn());
//! assert_eq!(result.source(), Some("/runs/a.json, /runs/b.json"));
//! # Ok::<(), facts_total_core::TotalError>(())
//! ```

pub mod config;
pub mod cube;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod total;
pub mod window;

pub use error::{AlignmentError, CubeRef, ErrorCode, ErrorSeverity, Result, TotalError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::cube::{AttrValue, Attributes, Coordinate, Cube, Dimension, Tick};
    pub use crate::error::{AlignmentError, CubeRef, ErrorCode, Result, TotalError};
    pub use crate::store::{read_cube, write_total, CubeRecord};
    pub use crate::total::{
        total, ConflictRule, MissingPolicy, TotalCube, TotalOptions, Totaler, SOURCE_KEY,
    };
    pub use crate::window::{YearWindow, WindowedCube};
}
