//! Archiving: the unit's static library and the fully-linked closure
//! archive.

use crate::core::artifact::Artifact;
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::CompilationPlanner;

impl CompilationPlanner<'_> {
    /// Plans the archive of the unit's objects into its static library.
    ///
    /// Object paths go through a file list rather than the command line, so
    /// the command stays fixed-size regardless of the unit. The list is
    /// deduplicated and newline-delimited; identical inputs always produce
    /// identical bytes.
    pub(crate) fn plan_archive(&self, objects: &[Artifact], graph: &mut ActionGraph) {
        let obj_list = self.namer.archive_obj_list();
        let archive = self.namer.archive();

        graph.register(
            ActionBuilder::write_file("ObjFilelist", filelist_contents(objects))
                .output(obj_list)
                .build(),
        );

        graph.register(
            ActionBuilder::spawn(
                "ObjcLink",
                self.config.tools.libtool.as_str(),
                vec![
                    "-static".to_string(),
                    "-filelist".to_string(),
                    obj_list.as_str().to_string(),
                    "-arch_only".to_string(),
                    self.config.arch.clone(),
                    "-syslibroot".to_string(),
                    self.config.sdk_root.clone(),
                    "-o".to_string(),
                    archive.as_str().to_string(),
                ],
                self.config.action_env(),
            )
            .input(self.config.tools.libtool)
            .inputs(objects.iter().copied())
            .input(obj_list)
            .output(archive)
            .build(),
        );
    }

    /// Plans a single archive statically linking the unit's whole transitive
    /// closure: built libraries, imported archives, and cc libraries.
    pub(crate) fn plan_fully_link(&self, graph: &mut ActionGraph) {
        let fully_linked = self.namer.fully_linked_archive();
        let own_archive = self
            .unit
            .has_compilation_artifacts()
            .then(|| self.namer.archive());

        let mut libs = self.surface.built_libraries(own_archive);
        libs.extend(self.surface.imported_libraries.to_vec());
        libs.extend(self.surface.cc_libraries.to_vec());

        let mut args = vec![
            "-static".to_string(),
            "-arch_only".to_string(),
            self.config.arch.clone(),
            "-syslibroot".to_string(),
            self.config.sdk_root.clone(),
            "-o".to_string(),
            fully_linked.as_str().to_string(),
        ];
        args.extend(libs.iter().map(|l| l.as_str().to_string()));

        graph.register(
            ActionBuilder::spawn(
                "ObjcLink",
                self.config.tools.libtool.as_str(),
                args,
                self.config.action_env(),
            )
            .input(self.config.tools.libtool)
            .inputs(libs)
            .output(fully_linked)
            .build(),
        );
    }
}

/// Newline-delimited, deduplicated artifact paths.
pub(crate) fn filelist_contents(artifacts: &[Artifact]) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out = String::new();
    for artifact in artifacts {
        if seen.insert(*artifact) {
            out.push_str(artifact.as_str());
            out.push('\n');
        }
    }
    out
}
