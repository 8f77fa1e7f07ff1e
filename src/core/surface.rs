//! The transitive dependency surface a unit compiles and links against.
//!
//! All large collections are [`DepSet`]s so that a unit whose dependencies
//! share most of their closure pays for the shared structure once.

use std::collections::BTreeSet;

use crate::core::artifact::{Artifact, DepSet};

/// A clang module map artifact together with its module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMap {
    pub artifact: Artifact,
    pub name: String,
}

impl ModuleMap {
    pub fn new(artifact: Artifact, name: impl Into<String>) -> Self {
        ModuleMap {
            artifact,
            name: name.into(),
        }
    }
}

/// Everything the unit's dependencies contribute to compilation and linking.
#[derive(Debug, Clone, Default)]
pub struct DepSurface {
    /// Transitively reachable headers, declared as compile inputs
    pub headers: DepSet<Artifact>,
    /// Module maps of all dependencies, declared as inputs when module maps
    /// are enabled
    pub module_maps: DepSet<Artifact>,
    /// Module maps of direct dependencies, referenced as extern modules
    pub direct_dep_module_maps: Vec<ModuleMap>,
    /// Header search paths (-I)
    pub includes: DepSet<String>,
    /// System header search paths (-isystem)
    pub system_includes: DepSet<String>,
    /// Preprocessor defines, without the -D prefix
    pub defines: DepSet<String>,
    /// Directories of .framework bundles to compile/link against
    pub framework_dirs: DepSet<String>,
    /// Framework directories contributing search paths only
    pub framework_search_only_dirs: DepSet<String>,
    pub static_framework_files: DepSet<Artifact>,
    pub dynamic_framework_files: DepSet<Artifact>,
    /// SDK frameworks linked with -framework
    pub sdk_frameworks: DepSet<String>,
    /// SDK frameworks linked with -weak_framework
    pub weak_sdk_frameworks: DepSet<String>,
    /// SDK dylib names linked with -l
    pub sdk_dylibs: DepSet<String>,
    /// Archives built by dependency units, in link order
    pub libraries: DepSet<Artifact>,
    /// Prebuilt archives imported from outside the build
    pub imported_libraries: DepSet<Artifact>,
    /// Link artifacts contributed by C/C++ dependencies
    pub cc_libraries: DepSet<Artifact>,
    /// Libraries whose every object must be linked regardless of use
    pub force_load_libraries: DepSet<Artifact>,
    /// The tracked subset of prebuilt archives eligible for dead-code
    /// pruning
    pub prunable_archives: DepSet<Artifact>,
    /// Raw linker options contributed by dependencies
    pub linkopts: DepSet<String>,
    /// Some dependency compiles C++, so linking uses the C++ driver
    pub uses_cpp: bool,
    /// Some dependency compiles Swift, so linking adds the Swift lib dir
    pub uses_swift: bool,
}

impl DepSurface {
    /// Archives visible to the linker, dependency archives first, then this
    /// unit's own if present.
    pub fn built_libraries(&self, own_archive: Option<Artifact>) -> Vec<Artifact> {
        let mut libs = self.libraries.to_vec();
        if let Some(archive) = own_archive {
            if !libs.contains(&archive) {
                libs.push(archive);
            }
        }
        libs
    }

    /// cc libraries that must be force-loaded (always-link archives, by the
    /// `.lo` naming convention).
    pub fn always_link_cc_libraries(&self) -> Vec<Artifact> {
        self.cc_libraries
            .to_vec()
            .into_iter()
            .filter(|lib| lib.as_str().ends_with(".lo") || lib.as_str().ends_with(".pic.lo"))
            .collect()
    }
}

/// Cross-reference data driving dead-code pruning of prebuilt archives.
#[derive(Debug, Clone, Default)]
pub struct PruneInfo {
    pub dependency_mappings: DepSet<Artifact>,
    pub header_mappings: DepSet<Artifact>,
    pub archive_source_mappings: DepSet<Artifact>,
    /// Known-live entry points; sorted so the parameter file is stable
    pub entry_points: BTreeSet<String>,
}

impl PruneInfo {
    pub fn has_entry_points(&self) -> bool {
        !self.entry_points.is_empty()
    }
}
