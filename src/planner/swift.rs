//! Swift frontend planning: per-file compiles and the module merge.
//!
//! Each Swift source compiles alone as the primary file (the rest of the
//! unit's Swift sources ride along for type checking) and emits a partial
//! module. A merge action then combines the partials into the unit's module
//! and the Objective-C interop header.

use crate::core::artifact::Artifact;
use crate::core::config::SWIFT;
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::{flags, CompilationPlanner};

impl CompilationPlanner<'_> {
    /// Plans the compile of one Swift source. Returns its object file.
    pub(crate) fn plan_swift_compile(&self, source: Artifact, graph: &mut ActionGraph) -> Artifact {
        let object = self.namer.obj_file(source);
        let partial = self.namer.swift_partial_module(source);

        let mut args: Vec<String> = vec![
            SWIFT.to_string(),
            "-frontend".to_string(),
            "-emit-object".to_string(),
            "-target".to_string(),
            self.config.swift_target(),
            "-sdk".to_string(),
            self.config.sdk_root.clone(),
            "-enable-objc-interop".to_string(),
        ];
        args.extend(
            self.config
                .compilation_mode
                .swift_copts()
                .iter()
                .map(|c| c.to_string()),
        );
        if self.config.generate_dsym {
            args.push("-g".to_string());
        }
        args.push("-module-name".to_string());
        args.push(self.module_name());
        args.push("-parse-as-library".to_string());
        args.push("-primary-file".to_string());
        args.push(source.as_str().to_string());
        for other in self.unit.swift_srcs() {
            if other != source {
                args.push(other.as_str().to_string());
            }
        }
        args.push("-o".to_string());
        args.push(object.as_str().to_string());
        args.push("-emit-module-path".to_string());
        args.push(partial.as_str().to_string());
        args.extend(self.swift_include_args());

        if let Some(bridging) = self.attrs.bridging_header {
            args.push("-import-objc-header".to_string());
            args.push(bridging.as_str().to_string());
        }

        // With module maps the unit's Objective-C half is visible to Swift
        // as the underlying module of the same name.
        if self.config.module_maps_enabled {
            args.push("-I".to_string());
            args.push(self.namer.module_map().artifact.parent_dir().to_string());
            args.push("-import-underlying-module".to_string());
        }

        args.extend(flags::framework_search_flags(self.surface, self.config));

        let mut builder = ActionBuilder::spawn(
            "SwiftCompile",
            self.config.tools.xcrun_wrapper.as_str(),
            args,
            self.config.action_env(),
        )
        .input(self.config.tools.xcrun_wrapper)
        .input(source)
        .inputs(self.unit.swift_srcs())
        .inputs(self.unit.public_hdrs().iter().copied())
        .inputs(self.unit.additional_hdrs().iter().copied())
        .transitive_inputs(&self.surface.headers);
        if let Some(bridging) = self.attrs.bridging_header {
            builder = builder.input(bridging);
        }
        if self.config.module_maps_enabled {
            builder = builder
                .input(self.namer.module_map().artifact)
                .transitive_inputs(&self.surface.module_maps);
        }
        graph.register(builder.output(object).output(partial).build());
        object
    }

    /// Plans the merge of the unit's partial Swift modules into the final
    /// module, emitting the Objective-C interop header alongside.
    pub(crate) fn plan_swift_module_merge(&self, graph: &mut ActionGraph) {
        let partials: Vec<Artifact> = self
            .unit
            .swift_srcs()
            .into_iter()
            .map(|src| self.namer.swift_partial_module(src))
            .collect();
        let module = self.namer.swift_module();
        let header = self.namer.swift_header();

        let mut args: Vec<String> = vec![
            SWIFT.to_string(),
            "-frontend".to_string(),
            "-emit-module".to_string(),
            "-sdk".to_string(),
            self.config.sdk_root.clone(),
            "-target".to_string(),
            self.config.swift_target(),
        ];
        args.extend(
            self.config
                .compilation_mode
                .swift_copts()
                .iter()
                .map(|c| c.to_string()),
        );
        if self.config.generate_dsym {
            args.push("-g".to_string());
        }
        args.push("-module-name".to_string());
        args.push(self.module_name());
        args.push("-parse-as-library".to_string());
        for partial in &partials {
            args.push(partial.as_str().to_string());
        }
        args.push("-o".to_string());
        args.push(module.as_str().to_string());
        args.push("-emit-objc-header-path".to_string());
        args.push(header.as_str().to_string());
        args.extend(self.swift_include_args());
        if self.config.module_maps_enabled {
            args.push("-I".to_string());
            args.push(self.namer.module_map().artifact.parent_dir().to_string());
        }
        args.extend(flags::framework_search_flags(self.surface, self.config));

        let mut builder = ActionBuilder::spawn(
            "SwiftModuleMerge",
            self.config.tools.xcrun_wrapper.as_str(),
            args,
            self.config.action_env(),
        )
        .input(self.config.tools.xcrun_wrapper)
        .inputs(partials)
        .transitive_inputs(&self.surface.headers);
        if self.config.module_maps_enabled {
            builder = builder
                .input(self.namer.module_map().artifact)
                .transitive_inputs(&self.surface.module_maps);
        }
        graph.register(builder.output(module).output(header).build());
    }

    /// Header search paths forwarded to the embedded clang importer.
    fn swift_include_args(&self) -> Vec<String> {
        let mut args = vec!["-Xcc".to_string(), "-I.".to_string()];
        for include in self.surface.includes.to_vec() {
            args.push("-Xcc".to_string());
            args.push(format!("-I{}", include));
        }
        args
    }

    /// The Swift module name: the module map's when module maps are
    /// enabled, the target label otherwise.
    fn module_name(&self) -> String {
        if self.config.module_maps_enabled {
            self.namer.module_map().name
        } else {
            self.attrs.label.clone()
        }
    }
}
