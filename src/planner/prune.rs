//! Dead-code pruning of prebuilt archives before linking.
//!
//! Every prunable archive is rewritten by the pruning tool with entries not
//! reachable from a known entry point removed. The tool's arguments travel
//! in a parameter file, one argument per line, because the mapping-file
//! lists can exceed command-line limits.

use std::collections::BTreeMap;

use crate::core::artifact::{Artifact, DepSet};
use crate::core::surface::PruneInfo;
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::CompilationPlanner;

impl CompilationPlanner<'_> {
    /// Whether pruned archives replace the originals for this link. Requires
    /// both the configuration switch and at least one known entry point;
    /// with no entry points everything would be pruned away.
    pub(crate) fn prune_archives(&self, prune_info: &PruneInfo) -> bool {
        self.config.dead_code_removal
            && prune_info.has_entry_points()
            && !self.surface.prunable_archives.is_empty()
    }

    /// Plans one pruning action per prunable archive and returns the
    /// original-to-pruned substitution applied to the link inputs.
    ///
    /// The substitution is total over the prunable set: the link never mixes
    /// pruned and unpruned prunable archives. Ordered map so every iteration
    /// over it (notably the link action's declared inputs) is stable.
    pub(crate) fn plan_prune_actions(
        &self,
        prune_info: &PruneInfo,
        graph: &mut ActionGraph,
    ) -> BTreeMap<Artifact, Artifact> {
        let mut substitution = BTreeMap::new();
        for archive in self.surface.prunable_archives.to_vec() {
            let pruned = self.namer.pruned_archive(archive);
            let param_file = self.namer.prune_param_file(archive);

            graph.register(
                ActionBuilder::write_file(
                    "PruneParamFile",
                    param_file_contents(archive, pruned, prune_info, self),
                )
                .output(param_file)
                .build(),
            );

            graph.register(
                ActionBuilder::spawn(
                    "ArchivePrune",
                    self.config.tools.pruner.as_str(),
                    vec![format!("@{}", param_file)],
                    self.config.action_env(),
                )
                .input(self.config.tools.dummy_archive)
                .input(self.config.tools.pruner)
                .input(param_file)
                .input(archive)
                .input(self.config.tools.xcrun_wrapper)
                .transitive_inputs(&prune_info.dependency_mappings)
                .transitive_inputs(&prune_info.header_mappings)
                .transitive_inputs(&prune_info.archive_source_mappings)
                .output(pruned)
                .build(),
            );

            substitution.insert(archive, pruned);
        }
        substitution
    }
}

fn param_file_contents(
    archive: Artifact,
    pruned: Artifact,
    prune_info: &PruneInfo,
    planner: &CompilationPlanner<'_>,
) -> String {
    let mut lines: Vec<String> = vec![
        "--input_archive".to_string(),
        archive.as_str().to_string(),
        "--output_archive".to_string(),
        pruned.as_str().to_string(),
        "--dummy_archive".to_string(),
        planner.config.tools.dummy_archive.as_str().to_string(),
        "--xcrunwrapper".to_string(),
        planner.config.tools.xcrun_wrapper.as_str().to_string(),
        "--dependency_mapping_files".to_string(),
        joined_paths(&prune_info.dependency_mappings),
        "--header_mapping_files".to_string(),
        joined_paths(&prune_info.header_mappings),
        "--archive_source_mapping_files".to_string(),
        joined_paths(&prune_info.archive_source_mappings),
        "--entry_points".to_string(),
    ];
    // BTreeSet iteration keeps the entry-point list sorted and the file
    // stable across runs.
    lines.push(
        prune_info
            .entry_points
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(","),
    );
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn joined_paths(set: &DepSet<Artifact>) -> String {
    set.to_vec()
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Platform;
    use crate::core::surface::DepSurface;
    use crate::core::unit::CompilationUnit;
    use crate::planner::action::Invocation;
    use crate::planner::testing::{test_attrs, test_config, test_namer};

    fn prune_info() -> PruneInfo {
        PruneInfo {
            dependency_mappings: DepSet::of(vec![Artifact::new("map/dep.mapping")]),
            header_mappings: DepSet::of(vec![Artifact::new("map/hdr.mapping")]),
            archive_source_mappings: DepSet::of(vec![Artifact::new("map/src.mapping")]),
            entry_points: ["zebra".to_string(), "alpha".to_string()].into(),
        }
    }

    #[test]
    fn test_prune_gating() {
        let unit = CompilationUnit::builder().build();
        let surface = DepSurface {
            prunable_archives: DepSet::of(vec![Artifact::new("gen/liba.a")]),
            ..Default::default()
        };
        let mut config = test_config(Platform::IosSimulator);
        let attrs = test_attrs("app");
        let namer = test_namer("app");

        let planner = CompilationPlanner::new(&unit, &surface, &config, &attrs, &namer);
        assert!(!planner.prune_archives(&prune_info()));

        config.dead_code_removal = true;
        let planner = CompilationPlanner::new(&unit, &surface, &config, &attrs, &namer);
        assert!(planner.prune_archives(&prune_info()));
        assert!(!planner.prune_archives(&PruneInfo::default()));
    }

    #[test]
    fn test_param_file_and_substitution() {
        let unit = CompilationUnit::builder().build();
        let surface = DepSurface {
            prunable_archives: DepSet::of(vec![Artifact::new("gen/liba.a")]),
            ..Default::default()
        };
        let mut config = test_config(Platform::IosSimulator);
        config.dead_code_removal = true;
        let attrs = test_attrs("app");
        let namer = test_namer("app");
        let planner = CompilationPlanner::new(&unit, &surface, &config, &attrs, &namer);

        let mut graph = ActionGraph::new();
        let substitution = planner.plan_prune_actions(&prune_info(), &mut graph);
        assert_eq!(
            substitution.get(&Artifact::new("gen/liba.a")),
            Some(&Artifact::new("bin/_pruned/gen/liba.a"))
        );

        let param = graph
            .producer(Artifact::new("bin/_pruned/gen/liba.a.param"))
            .unwrap();
        let contents = match &param.invocation {
            Invocation::WriteFile { contents } => contents.clone(),
            other => panic!("expected a file write, got {:?}", other),
        };
        assert!(contents.contains("--input_archive\ngen/liba.a\n"));
        assert!(contents.contains("--output_archive\nbin/_pruned/gen/liba.a\n"));
        // sorted entry points
        assert!(contents.ends_with("--entry_points\nalpha,zebra\n"));

        let prune = graph.with_mnemonic("ArchivePrune")[0];
        assert_eq!(prune.arguments()[1], "@bin/_pruned/gen/liba.a.param");
        assert!(prune.inputs.contains(&Artifact::new("tools/dummy.a")));
        assert!(prune.inputs.contains(&Artifact::new("map/hdr.mapping")));
    }
}
