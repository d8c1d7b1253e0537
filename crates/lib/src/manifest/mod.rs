//! Manifest loading and normalization.
//!
//! A project declares its units in a `.lambgo.yml` file next to the root
//! `go.mod`. Resolution turns that file into a [`Config`]: units from both
//! declaration styles merged and de-duplicated, build flags expanded, and
//! fallback defaults applied.

mod error;
pub mod normalize;
pub mod resolve;
mod template;
mod types;

pub use error::{ManifestError, UnitOrigin};
pub use normalize::{normalize_path, normalize_units};
pub use resolve::{Defaults, FileReader, FsReader, ManifestResolver};
pub use template::EXAMPLE_MANIFEST;
pub use types::*;
