//! The unit manifest: a TOML description of one compilation unit, its
//! dependency surface, and the build configuration, as handed to the CLI.
//!
//! The manifest mirrors the planner's input types but keeps every
//! collection a plain list; conversion into [`DepSet`]s happens once at
//! load time.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::artifact::{Artifact, DepSet};
use crate::core::config::{BuildConfig, TargetAttributes};
use crate::core::naming::IntermediateArtifacts;
use crate::core::surface::{DepSurface, ModuleMap, PruneInfo};
use crate::core::unit::CompilationUnit;

/// Top-level manifest document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Root directory for all planned outputs.
    #[serde(default = "default_output_root")]
    pub output_root: String,
    pub target: TargetAttributes,
    pub config: BuildConfig,
    #[serde(default)]
    pub unit: UnitManifest,
    #[serde(default)]
    pub deps: DepsManifest,
    #[serde(default)]
    pub request: RequestManifest,
    #[serde(default)]
    pub prune: PruneManifest,
}

fn default_output_root() -> String {
    "bin".to_string()
}

/// Sources and headers of the unit.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    #[serde(default)]
    pub srcs: Vec<Artifact>,
    #[serde(default)]
    pub non_arc_srcs: Vec<Artifact>,
    #[serde(default)]
    pub precompiled_srcs: Vec<Artifact>,
    #[serde(default)]
    pub hdrs: Vec<Artifact>,
    #[serde(default)]
    pub private_hdrs: Vec<Artifact>,
    #[serde(default)]
    pub additional_hdrs: Vec<Artifact>,
    #[serde(default)]
    pub pch: Option<Artifact>,
}

/// Everything dependencies contribute, as flat lists.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepsManifest {
    #[serde(default)]
    pub headers: Vec<Artifact>,
    #[serde(default)]
    pub module_maps: Vec<Artifact>,
    #[serde(default)]
    pub direct_module_maps: Vec<ModuleMapManifest>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub system_includes: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub framework_dirs: Vec<String>,
    #[serde(default)]
    pub framework_search_only_dirs: Vec<String>,
    #[serde(default)]
    pub static_framework_files: Vec<Artifact>,
    #[serde(default)]
    pub dynamic_framework_files: Vec<Artifact>,
    #[serde(default)]
    pub sdk_frameworks: Vec<String>,
    #[serde(default)]
    pub weak_sdk_frameworks: Vec<String>,
    #[serde(default)]
    pub sdk_dylibs: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<Artifact>,
    #[serde(default)]
    pub imported_libraries: Vec<Artifact>,
    #[serde(default)]
    pub cc_libraries: Vec<Artifact>,
    #[serde(default)]
    pub force_load_libraries: Vec<Artifact>,
    #[serde(default)]
    pub prunable_archives: Vec<Artifact>,
    #[serde(default)]
    pub linkopts: Vec<String>,
    #[serde(default)]
    pub uses_cpp: bool,
    #[serde(default)]
    pub uses_swift: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleMapManifest {
    pub artifact: Artifact,
    pub name: String,
}

/// Per-invocation planning knobs.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestManifest {
    #[serde(default)]
    pub link_binary: bool,
    #[serde(default)]
    pub fully_link: bool,
    #[serde(default)]
    pub extra_compile_args: Vec<String>,
    #[serde(default)]
    pub priority_headers: Vec<String>,
    #[serde(default)]
    pub extra_link_args: Vec<String>,
    #[serde(default)]
    pub extra_link_inputs: Vec<Artifact>,
}

/// Pruning cross-reference data.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PruneManifest {
    #[serde(default)]
    pub dependency_mappings: Vec<Artifact>,
    #[serde(default)]
    pub header_mappings: Vec<Artifact>,
    #[serde(default)]
    pub archive_source_mappings: Vec<Artifact>,
    #[serde(default)]
    pub entry_points: Vec<String>,
}

impl Manifest {
    /// Loads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Manifest> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&text)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    pub fn compilation_unit(&self) -> CompilationUnit {
        CompilationUnit::builder()
            .srcs(self.unit.srcs.iter().copied())
            .non_arc_srcs(self.unit.non_arc_srcs.iter().copied())
            .precompiled_srcs(self.unit.precompiled_srcs.iter().copied())
            .public_hdrs(self.unit.hdrs.iter().copied())
            .private_hdrs(self.unit.private_hdrs.iter().copied())
            .additional_hdrs(self.unit.additional_hdrs.iter().copied())
            .pch(self.unit.pch)
            .build()
    }

    pub fn dep_surface(&self) -> DepSurface {
        let deps = &self.deps;
        DepSurface {
            headers: DepSet::of(deps.headers.iter().copied()),
            module_maps: DepSet::of(deps.module_maps.iter().copied()),
            direct_dep_module_maps: deps
                .direct_module_maps
                .iter()
                .map(|m| ModuleMap::new(m.artifact, m.name.clone()))
                .collect(),
            includes: DepSet::of(deps.includes.iter().cloned()),
            system_includes: DepSet::of(deps.system_includes.iter().cloned()),
            defines: DepSet::of(deps.defines.iter().cloned()),
            framework_dirs: DepSet::of(deps.framework_dirs.iter().cloned()),
            framework_search_only_dirs: DepSet::of(deps.framework_search_only_dirs.iter().cloned()),
            static_framework_files: DepSet::of(deps.static_framework_files.iter().copied()),
            dynamic_framework_files: DepSet::of(deps.dynamic_framework_files.iter().copied()),
            sdk_frameworks: DepSet::of(deps.sdk_frameworks.iter().cloned()),
            weak_sdk_frameworks: DepSet::of(deps.weak_sdk_frameworks.iter().cloned()),
            sdk_dylibs: DepSet::of(deps.sdk_dylibs.iter().cloned()),
            libraries: DepSet::of(deps.libraries.iter().copied()),
            imported_libraries: DepSet::of(deps.imported_libraries.iter().copied()),
            cc_libraries: DepSet::of(deps.cc_libraries.iter().copied()),
            force_load_libraries: DepSet::of(deps.force_load_libraries.iter().copied()),
            prunable_archives: DepSet::of(deps.prunable_archives.iter().copied()),
            linkopts: DepSet::of(deps.linkopts.iter().cloned()),
            uses_cpp: deps.uses_cpp,
            uses_swift: deps.uses_swift,
        }
    }

    pub fn prune_info(&self) -> PruneInfo {
        PruneInfo {
            dependency_mappings: DepSet::of(self.prune.dependency_mappings.iter().copied()),
            header_mappings: DepSet::of(self.prune.header_mappings.iter().copied()),
            archive_source_mappings: DepSet::of(self.prune.archive_source_mappings.iter().copied()),
            entry_points: self
                .prune
                .entry_points
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>(),
        }
    }

    /// The default artifact layout for this unit.
    pub fn namer(&self) -> IntermediateArtifacts {
        IntermediateArtifacts::new(self.output_root.clone(), self.target.label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [target]
        label = "app"

        [config]
        platform = "ios-simulator"
        arch = "x86_64"
        sdk_version = "8.4"
        sdk_root = "/sdk"
        minimum_os = "7.0"
        platform_developer_framework_dir = "/dev/frameworks"
        swift_lib_dir = "/swift/lib"

        [config.tools]
        xcrun_wrapper = "tools/xcrunwrapper.sh"
        libtool = "tools/libtool"
        pruner = "tools/pruner.py"
        dummy_archive = "tools/dummy.a"

        [unit]
        srcs = ["src/a.m"]
        hdrs = ["src/a.h"]

        [deps]
        sdk_frameworks = ["UIKit"]

        [request]
        link_binary = true
    "#;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest: Manifest = toml::from_str(MINIMAL).unwrap();
        assert_eq!(manifest.output_root, "bin");
        assert_eq!(manifest.target.label, "app");
        assert!(manifest.request.link_binary);

        let unit = manifest.compilation_unit();
        assert_eq!(unit.srcs(), &[Artifact::new("src/a.m")]);

        let surface = manifest.dep_surface();
        assert_eq!(surface.sdk_frameworks.to_vec(), vec!["UIKit".to_string()]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let text = format!("{}\nnonsense = true\n", MINIMAL);
        assert!(toml::from_str::<Manifest>(&text).is_err());
    }

    #[test]
    fn test_entry_points_sorted_and_deduped() {
        let mut manifest: Manifest = toml::from_str(MINIMAL).unwrap();
        manifest.prune.entry_points =
            vec!["z".to_string(), "a".to_string(), "z".to_string()];
        let info = manifest.prune_info();
        assert_eq!(
            info.entry_points.iter().cloned().collect::<Vec<_>>(),
            vec!["a".to_string(), "z".to_string()]
        );
    }
}
