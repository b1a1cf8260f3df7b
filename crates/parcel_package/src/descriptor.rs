//! What a component declares about itself.

use std::collections::BTreeSet;

/// An applet shipped with a component. It is packaged into its own archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppletDescriptor {
    /// Fully-qualified class name (`org.example.ui.Viewer`).
    pub class_name: String,
    /// File names of archives the applet needs beyond its detected ones.
    pub archive_deps: BTreeSet<String>,
    /// File names of resources (under the units root) bundled with the applet.
    pub resources: BTreeSet<String>,
}

/// A component to package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Fully-qualified class name (`org.example.Tokenizer`).
    pub class_name: String,
    /// File names of archives the component needs beyond its detected ones.
    pub archive_deps: BTreeSet<String>,
    /// File names of resources (under the units root) bundled with the component.
    pub resources: BTreeSet<String>,
    /// Applets shipped with the component.
    pub applets: Vec<AppletDescriptor>,
}

impl ComponentDescriptor {
    /// A component with nothing declared.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Declares an extra archive dependency.
    pub fn with_archive_dep(mut self, name: impl Into<String>) -> Self {
        self.archive_deps.insert(name.into());
        self
    }

    /// Declares a resource file.
    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resources.insert(name.into());
        self
    }

    /// Adds an applet.
    pub fn with_applet(mut self, applet: AppletDescriptor) -> Self {
        self.applets.push(applet);
        self
    }
}

impl AppletDescriptor {
    /// An applet with nothing declared.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Declares an extra archive dependency.
    pub fn with_archive_dep(mut self, name: impl Into<String>) -> Self {
        self.archive_deps.insert(name.into());
        self
    }

    /// Declares a resource file.
    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resources.insert(name.into());
        self
    }
}
