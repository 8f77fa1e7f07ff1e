//! Action planning.
//!
//! [`CompilationPlanner`] turns one compilation unit plus its dependency
//! surface and build configuration into an [`ActionGraph`]: compile actions
//! per source, an archive action, and optionally module-map, link, strip,
//! debug-symbol, and archive-pruning actions. Planning is pure; nothing here
//! touches the filesystem or spawns a process.

pub mod action;
pub mod archive;
pub mod compile;
pub mod flags;
pub mod link;
pub mod module_map;
pub mod prune;
pub mod swift;
pub mod validate;

use thiserror::Error;

use crate::core::config::{BuildConfig, TargetAttributes};
use crate::core::naming::ArtifactNamer;
use crate::core::surface::{DepSurface, PruneInfo};
use crate::core::unit::CompilationUnit;
use crate::planner::action::ActionGraph;
use crate::util::diagnostic::has_errors;
use crate::util::Diagnostic;

/// Planning failure. Attribute validation is the only fallible step; all
/// later stages work over already-validated inputs.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid target attributes: {}", format_diagnostics(.diagnostics))]
    InvalidAttributes { diagnostics: Vec<Diagnostic> },
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Per-invocation planning knobs that are not part of the unit, surface, or
/// configuration. All default to off.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Extra arguments appended to every compile command.
    pub extra_compile_args: Vec<String>,
    /// Header search paths inserted before dependency-provided ones.
    pub priority_headers: Vec<String>,
    /// Also link the unit and its closure into a binary.
    pub link_binary: bool,
    /// Also produce a single archive of the whole transitive closure.
    pub fully_link: bool,
    /// Extra arguments appended to the link command.
    pub extra_link_args: Vec<String>,
    /// Extra declared inputs of the link action.
    pub extra_link_inputs: Vec<crate::core::artifact::Artifact>,
    /// Cross-reference data for dead-code pruning of prebuilt archives.
    pub prune_info: PruneInfo,
}

/// Plans the actions for one compilation unit.
///
/// The planner borrows everything; callers keep ownership of the unit and
/// configuration and can plan many units against one configuration.
pub struct CompilationPlanner<'a> {
    pub(crate) unit: &'a CompilationUnit,
    pub(crate) surface: &'a DepSurface,
    pub(crate) config: &'a BuildConfig,
    pub(crate) attrs: &'a TargetAttributes,
    pub(crate) namer: &'a dyn ArtifactNamer,
}

impl<'a> CompilationPlanner<'a> {
    pub fn new(
        unit: &'a CompilationUnit,
        surface: &'a DepSurface,
        config: &'a BuildConfig,
        attrs: &'a TargetAttributes,
        namer: &'a dyn ArtifactNamer,
    ) -> Self {
        CompilationPlanner {
            unit,
            surface,
            config,
            attrs,
            namer,
        }
    }

    /// Runs the full planning pass: validate, then module map, compiles,
    /// archive, and the requested link stages.
    ///
    /// On validation errors no actions are planned and the graph is empty.
    /// Warnings are logged and planning proceeds.
    pub fn plan(&self, request: &PlanRequest) -> Result<ActionGraph, PlanError> {
        let diagnostics = self.validate_attributes();
        for diagnostic in diagnostics.iter().filter(|d| !d.is_error()) {
            tracing::warn!(attribute = diagnostic.attribute, "{}", diagnostic.message);
        }
        if has_errors(&diagnostics) {
            return Err(PlanError::InvalidAttributes { diagnostics });
        }

        let mut graph = ActionGraph::new();
        self.plan_module_map(&mut graph);
        self.plan_compile_and_archive(
            &request.extra_compile_args,
            &request.priority_headers,
            &mut graph,
        );
        if request.fully_link {
            self.plan_fully_link(&mut graph);
        }
        if request.link_binary {
            self.plan_link(
                &request.prune_info,
                &request.extra_link_args,
                &request.extra_link_inputs,
                &mut graph,
            );
        }
        tracing::info!(
            label = %self.attrs.label,
            actions = graph.len(),
            "planned unit"
        );
        Ok(graph)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::core::artifact::Artifact;
    use crate::core::config::{
        BuildConfig, CompilationMode, Platform, TargetAttributes, ToolPaths,
    };
    use crate::core::naming::IntermediateArtifacts;

    pub(crate) fn test_config(platform: Platform) -> BuildConfig {
        BuildConfig {
            platform,
            arch: "x86_64".to_string(),
            sdk_version: "8.4".to_string(),
            sdk_root: "/sdk".to_string(),
            minimum_os: "7.0".to_string(),
            platform_developer_framework_dir: "/dev/frameworks".to_string(),
            swift_lib_dir: "/swift/lib".to_string(),
            compilation_mode: CompilationMode::Fastbuild,
            coverage_enabled: false,
            module_maps_enabled: false,
            strip_binary: false,
            generate_dsym: false,
            generate_linkmap: false,
            dead_code_removal: false,
            prioritize_static_libs: false,
            copts: vec![],
            user_header_search_paths: vec![],
            genfiles_dir: "genfiles".to_string(),
            tools: ToolPaths {
                xcrun_wrapper: Artifact::new("tools/xcrunwrapper.sh"),
                libtool: Artifact::new("tools/libtool"),
                pruner: Artifact::new("tools/pruner.py"),
                dummy_archive: Artifact::new("tools/dummy.a"),
            },
        }
    }

    pub(crate) fn test_attrs(label: &str) -> TargetAttributes {
        TargetAttributes {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn test_namer(label: &str) -> IntermediateArtifacts {
        IntermediateArtifacts::new("bin", label)
    }
}
