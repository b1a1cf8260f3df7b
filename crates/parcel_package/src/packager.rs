//! Planning and installing component archives.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use parcel_common::{unit_path, TargetPath, ARCHIVE_EXTENSION};
use parcel_config::PackageConfig;
use parcel_resolve::Resolver;
use parcel_scan::find_files_in_directory;
use tracing::{debug, info, warn};

use crate::boundary::{ArchiveEntry, ArchiveWriter, Uploader};
use crate::descriptor::{AppletDescriptor, ComponentDescriptor};
use crate::error::PackageError;

const COMPONENT_MANIFEST: &[(&str, &str)] = &[("Manifest-Version", "1.0"), ("isComponent", "true")];
const APPLET_MANIFEST: &[(&str, &str)] = &[("Manifest-Version", "1.0")];

/// Packaging settings.
#[derive(Debug, Clone, Default)]
pub struct PackagerOptions {
    /// Where component and applet archives are written.
    pub output_dir: PathBuf,
    /// Archive file-name prefixes provided by the platform; compared
    /// case-insensitively.
    pub platform_prefixes: Vec<String>,
    /// Report per-step progress at info level.
    pub verbose: bool,
}

impl PackagerOptions {
    /// Options from the `[package]` table.
    pub fn from_config(config: &PackageConfig, verbose: bool) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            platform_prefixes: config.platform_prefixes.clone(),
            verbose,
        }
    }
}

/// An archive the packager will write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArchive {
    /// Output location.
    pub path: PathBuf,
    /// Manifest attributes.
    pub manifest: &'static [(&'static str, &'static str)],
    /// Files to include, sorted by entry name.
    pub entries: Vec<ArchiveEntry>,
}

/// Everything needed to install one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePlan {
    /// The component's class name.
    pub component: String,
    /// The component archive followed by one archive per applet.
    pub archives: Vec<PlannedArchive>,
    /// Existing archives shipped alongside.
    pub supporting: BTreeSet<PathBuf>,
}

impl PackagePlan {
    /// The files handed to the uploader: every planned archive plus the
    /// supporting archives.
    pub fn upload_set(&self) -> BTreeSet<PathBuf> {
        self.archives
            .iter()
            .map(|a| a.path.clone())
            .chain(self.supporting.iter().cloned())
            .collect()
    }
}

/// Outcome of [`Packager::install_all`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Class names of components that were installed.
    pub installed: Vec<String>,
    /// Class names of components that failed, with the reason.
    pub failed: Vec<(String, PackageError)>,
}

impl BatchReport {
    /// Returns `true` if every component was installed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Turns component descriptors into archives using a built [`Resolver`].
pub struct Packager<'r> {
    resolver: &'r Resolver,
    options: PackagerOptions,
}

impl<'r> Packager<'r> {
    /// Creates a packager over `resolver`.
    pub fn new(resolver: &'r Resolver, options: PackagerOptions) -> Self {
        Self { resolver, options }
    }

    /// Location of the archive for component `class_name`.
    pub fn component_archive_path(&self, class_name: &str) -> PathBuf {
        self.options
            .output_dir
            .join(format!("{class_name}.{ARCHIVE_EXTENSION}"))
    }

    /// Location of the archive for applet `class_name`. Applet archive names
    /// are lowercase.
    pub fn applet_archive_path(&self, class_name: &str) -> PathBuf {
        self.options
            .output_dir
            .join(format!("{class_name}.{ARCHIVE_EXTENSION}").to_lowercase())
    }

    /// Returns `true` if `archive` is provided by the platform and must not
    /// be bundled.
    pub fn is_platform_archive(&self, archive: &Path) -> bool {
        let Some(name) = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
        else {
            return false;
        };
        self.options
            .platform_prefixes
            .iter()
            .any(|prefix| name.starts_with(&prefix.to_lowercase()))
    }

    /// Works out the archives to write and the files to ship for `descriptor`.
    pub fn plan(&self, descriptor: &ComponentDescriptor) -> Result<PackagePlan, PackageError> {
        let (entries, mut supporting) = self.collect(
            &descriptor.class_name,
            &descriptor.resources,
            &descriptor.archive_deps,
        )?;
        let mut archives = vec![PlannedArchive {
            path: self.component_archive_path(&descriptor.class_name),
            manifest: COMPONENT_MANIFEST,
            entries,
        }];

        for applet in &descriptor.applets {
            let (planned, applet_supporting) = self.plan_applet(applet)?;
            archives.push(planned);
            supporting.extend(applet_supporting);
        }

        Ok(PackagePlan {
            component: descriptor.class_name.clone(),
            archives,
            supporting,
        })
    }

    /// Plans, writes the archives, then uploads.
    ///
    /// A failed archive write removes that archive and aborts this component.
    pub fn install(
        &self,
        descriptor: &ComponentDescriptor,
        writer: &dyn ArchiveWriter,
        uploader: &dyn Uploader,
    ) -> Result<PackagePlan, PackageError> {
        self.progress(&descriptor.class_name, "looking up dependencies");
        let plan = self.plan(descriptor)?;

        std::fs::create_dir_all(&self.options.output_dir).map_err(|e| PackageError::Io {
            path: self.options.output_dir.clone(),
            source: e,
        })?;
        for archive in &plan.archives {
            self.progress(&descriptor.class_name, "building archive");
            let written =
                writer.write_archive(&archive.path, archive.manifest, &archive.entries);
            if let Err(source) = written {
                if let Err(e) = std::fs::remove_file(&archive.path) {
                    debug!(
                        path = %archive.path.display(),
                        error = %e,
                        "no partial archive to remove"
                    );
                }
                return Err(PackageError::Write {
                    archive: archive.path.clone(),
                    source,
                });
            }
        }

        let files = plan.upload_set();
        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        info!(component = %descriptor.class_name, files = %names.join(", "), "installing");
        uploader
            .upload(descriptor, &files)
            .map_err(|source| PackageError::Upload {
                component: descriptor.class_name.clone(),
                source,
            })?;
        Ok(plan)
    }

    /// Installs every component, continuing past failures.
    pub fn install_all<'d>(
        &self,
        descriptors: impl IntoIterator<Item = &'d ComponentDescriptor>,
        writer: &dyn ArchiveWriter,
        uploader: &dyn Uploader,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for descriptor in descriptors {
            match self.install(descriptor, writer, uploader) {
                Ok(_) => report.installed.push(descriptor.class_name.clone()),
                Err(e) => {
                    warn!(
                        component = %descriptor.class_name,
                        error = %e,
                        "component not installed"
                    );
                    report.failed.push((descriptor.class_name.clone(), e));
                }
            }
        }
        report
    }

    fn plan_applet(
        &self,
        applet: &AppletDescriptor,
    ) -> Result<(PlannedArchive, BTreeSet<PathBuf>), PackageError> {
        let (entries, supporting) =
            self.collect(&applet.class_name, &applet.resources, &applet.archive_deps)?;
        let planned = PlannedArchive {
            path: self.applet_archive_path(&applet.class_name),
            manifest: APPLET_MANIFEST,
            entries,
        };
        Ok((planned, supporting))
    }

    /// Archive entries for the unit closure and resources of `class_name`,
    /// and the archives that closure needs.
    fn collect(
        &self,
        class_name: &str,
        resources: &BTreeSet<String>,
        archive_deps: &BTreeSet<String>,
    ) -> Result<(Vec<ArchiveEntry>, BTreeSet<PathBuf>), PackageError> {
        let units_root = self.resolver.units_root().ok_or(PackageError::NoUnitsRoot)?;
        let unit = TargetPath::new(unit_path(class_name, units_root));

        let closure = self.resolver.deep_unit_deps(&unit)?;
        let resource_files =
            find_files_in_directory(resources.iter().map(String::as_str), units_root)
                .map_err(|e| PackageError::from_scan(class_name, e))?;
        let mut entries: Vec<ArchiveEntry> = closure
            .iter()
            .map(TargetPath::as_path)
            .chain(resource_files.iter().map(PathBuf::as_path))
            .map(|file| ArchiveEntry {
                name: entry_name(file, units_root),
                source: file.to_path_buf(),
            })
            .collect();
        entries.sort();
        entries.dedup();

        let mut supporting: BTreeSet<PathBuf> = self
            .resolver
            .deep_archive_deps_of_unit_all(&closure)?
            .into_iter()
            .map(TargetPath::into_path_buf)
            .filter(|archive| {
                let platform = self.is_platform_archive(archive);
                if platform {
                    debug!(archive = %archive.display(), "skipping platform archive");
                }
                !platform
            })
            .collect();

        if !archive_deps.is_empty() {
            let archives_root =
                self.resolver
                    .archives_root()
                    .ok_or_else(|| PackageError::NoArchivesRoot {
                        component: class_name.to_string(),
                    })?;
            let declared =
                find_files_in_directory(archive_deps.iter().map(String::as_str), archives_root)
                    .map_err(|e| PackageError::from_scan(class_name, e))?;
            supporting.extend(declared);
        }

        debug!(
            class = class_name,
            units = closure.len(),
            resources = resource_files.len(),
            archives = supporting.len(),
            "collected package contents"
        );
        Ok((entries, supporting))
    }

    fn progress(&self, component: &str, step: &str) {
        if self.options.verbose {
            info!(component, "{step}");
        } else {
            debug!(component, "{step}");
        }
    }
}

/// `/`-separated name of `file` relative to `root`. Files outside `root` keep
/// their full path, minus the root component.
fn entry_name(file: &Path, root: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    segments.join("/")
}
