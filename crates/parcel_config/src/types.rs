//! Configuration types deserialized from `parcel.toml`.

use std::path::{Path, PathBuf};

use parcel_common::Staleness;
use serde::Deserialize;

/// Default directory (relative to the project) for built component archives.
pub const DEFAULT_OUTPUT_DIR: &str = "component-archives";

/// The top-level configuration parsed from `parcel.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParcelConfig {
    /// Input and cache directories.
    #[serde(default)]
    pub roots: RootsConfig,
    /// Dependency analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Packaging settings.
    #[serde(default)]
    pub package: PackageConfig,
}

/// Locations of compiled units, archives and the dependency cache.
///
/// Each root is optional: a missing units root disables the unit relations,
/// a missing archives root disables the archive relations, and a missing
/// cache root disables caching.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootsConfig {
    /// Root of the compiled unit tree.
    #[serde(default)]
    pub units: Option<PathBuf>,
    /// Root of the archive tree, searched recursively.
    #[serde(default)]
    pub archives: Option<PathBuf>,
    /// Directory under which `dependencies-cache/` is kept.
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

/// How dependency analysis runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    /// Rule for invalidating cached dependency entries.
    #[serde(default)]
    pub staleness: Staleness,
    /// Analyse the targets of one relation in parallel.
    #[serde(default)]
    pub parallel: bool,
    /// Report per-target progress at info level.
    #[serde(default)]
    pub verbose: bool,
}

/// Packaging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageConfig {
    /// Archive file-name prefixes provided by the execution platform.
    /// Matching archives are never bundled (compared case-insensitively).
    #[serde(default)]
    pub platform_prefixes: Vec<String>,
    /// Directory for component and applet archives.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            platform_prefixes: Vec::new(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl ParcelConfig {
    /// Makes every relative directory absolute against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.roots.units = self.roots.units.map(anchor);
        self.roots.archives = self.roots.archives.map(anchor);
        self.roots.cache = self.roots.cache.map(anchor);
        self.package.output_dir = anchor(self.package.output_dir);
        self
    }

    /// Returns `true` if a cache root is configured.
    pub fn caching_enabled(&self) -> bool {
        self.roots.cache.is_some()
    }
}
