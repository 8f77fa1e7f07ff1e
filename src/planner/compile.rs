//! Per-source compile planning and the compile/archive orchestration.

use crate::core::artifact::Artifact;
use crate::core::config::CLANG;
use crate::core::unit::{is_cpp_source, is_instrumentable, SourceKind};
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::{flags, CompilationPlanner};

/// Directory under the genfiles root holding the implicit clang module
/// cache.
pub const MODULE_CACHE_DIR: &str = "_objc_module_cache";

impl CompilationPlanner<'_> {
    /// Plans one compile action per source and, if the unit compiles
    /// anything, the archive of the resulting objects.
    ///
    /// Swift sources additionally get a module-merge action; precompiled
    /// objects go straight into the archive.
    pub fn plan_compile_and_archive(
        &self,
        extra_compile_args: &[String],
        priority_headers: &[String],
        graph: &mut ActionGraph,
    ) {
        let mut objects = Vec::new();
        for source in self.unit.sources() {
            let object = match source.kind {
                SourceKind::Arc => self.plan_objc_compile(
                    source.artifact,
                    true,
                    extra_compile_args,
                    priority_headers,
                    graph,
                ),
                SourceKind::NonArc => self.plan_objc_compile(
                    source.artifact,
                    false,
                    extra_compile_args,
                    priority_headers,
                    graph,
                ),
                SourceKind::Swift => self.plan_swift_compile(source.artifact, graph),
                SourceKind::Precompiled => source.artifact,
            };
            objects.push(object);
        }

        if self.unit.has_swift_sources() {
            self.plan_swift_module_merge(graph);
        }

        if self.unit.has_compilation_artifacts() {
            self.plan_archive(&objects, graph);
        }
    }

    /// Plans a clang compile of one Objective-C/C/C++ source.
    ///
    /// Returns the object file the action produces. Argument order is fixed;
    /// see the module docs of [`flags`](crate::planner::flags).
    fn plan_objc_compile(
        &self,
        source: Artifact,
        arc: bool,
        extra_compile_args: &[String],
        priority_headers: &[String],
        graph: &mut ActionGraph,
    ) -> Artifact {
        let object = self.namer.obj_file(source);
        let dotd = self.namer.dotd_file(source);

        let mut args: Vec<String> = vec![CLANG.to_string()];
        if is_cpp_source(source) {
            args.push("-stdlib=libc++".to_string());
            args.push("-std=gnu++11".to_string());
        }

        let mixed_swift = self.unit.has_swift_sources();
        if mixed_swift {
            // The generated interop header lets Objective-C sources see the
            // unit's Swift declarations.
            args.push("-I".to_string());
            args.push(self.namer.swift_header().parent_dir().to_string());
        }

        // The linker needs full debug information to dead-strip safely.
        if self.config.strip_binary {
            args.push("-g".to_string());
        }

        args.extend(flags::compile_flags(self.config));
        args.extend(flags::common_link_and_compile_flags(
            self.surface,
            self.config,
        ));
        args.extend(
            self.config
                .compilation_mode
                .copts()
                .iter()
                .map(|c| c.to_string()),
        );
        for path in &self.config.user_header_search_paths {
            args.push("-iquote".to_string());
            args.push(path.clone());
        }
        if let Some(pch) = self.unit.pch() {
            args.push("-include".to_string());
            args.push(pch.as_str().to_string());
        }
        for path in priority_headers {
            args.push("-I".to_string());
            args.push(path.clone());
        }
        for path in self.surface.includes.to_vec() {
            args.push("-I".to_string());
            args.push(path);
        }
        for path in self.surface.system_includes.to_vec() {
            args.push("-isystem".to_string());
            args.push(path);
        }

        args.extend(extra_compile_args.iter().cloned());
        let arc_flag = if arc { "-fobjc-arc" } else { "-fno-objc-arc" };
        args.push(arc_flag.to_string());

        for define in self.surface.defines.to_vec() {
            args.push(format!("-D{}", define));
        }

        let instrumented = self.config.coverage_enabled && is_instrumentable(source);
        if instrumented {
            args.extend(
                flags::COMPILE_COVERAGE_FLAGS
                    .iter()
                    .map(|f| f.to_string()),
            );
        }

        args.extend(self.rule_copts());

        args.push("-c".to_string());
        args.push(source.as_str().to_string());
        args.push("-o".to_string());
        args.push(object.as_str().to_string());
        args.push("-MD".to_string());
        args.push("-MF".to_string());
        args.push(dotd.as_str().to_string());

        if self.config.module_maps_enabled {
            let map = self.namer.module_map();
            if !self.attrs.enable_modules {
                args.push("-fmodule-maps".to_string());
            }
            args.push("-iquote".to_string());
            args.push(map.artifact.parent_dir().to_string());
            args.push(format!("-fmodule-name={}", map.name));
        }

        let mut builder = ActionBuilder::spawn(
            "ObjcCompile",
            self.config.tools.xcrun_wrapper.as_str(),
            args,
            self.config.action_env(),
        )
        .input(self.config.tools.xcrun_wrapper)
        .input(source);
        if mixed_swift {
            builder = builder.input(self.namer.swift_header());
        }
        if self.config.module_maps_enabled {
            builder = builder
                .input(self.namer.module_map().artifact)
                .transitive_inputs(&self.surface.module_maps);
        }
        builder = builder
            .transitive_inputs(&self.surface.headers)
            .inputs(self.unit.public_hdrs().iter().copied())
            .inputs(self.unit.private_hdrs().iter().copied())
            .inputs(self.unit.additional_hdrs().iter().copied())
            .transitive_inputs(&self.surface.static_framework_files)
            .transitive_inputs(&self.surface.dynamic_framework_files);
        if let Some(pch) = self.unit.pch() {
            builder = builder.input(pch);
        }
        builder = builder.output(object);
        if instrumented {
            builder = builder.output(self.namer.gcno_file(source));
        }
        graph.register(builder.output(dotd).build());
        object
    }

    /// Copts declared on the configuration and the target, with module
    /// flags resolved. Manual cache paths are unsupported since the cache
    /// location is fixed per configuration.
    pub(crate) fn rule_copts(&self) -> Vec<String> {
        let mut copts = self.config.copts.clone();
        copts.extend(self.attrs.copts.iter().cloned());
        if copts.iter().any(|c| c.contains("-fmodules-cache-path")) {
            tracing::warn!("setting '-fmodules-cache-path' manually in copts is unsupported");
        }
        if self.attrs.enable_modules {
            copts.push("-fmodules".to_string());
        }
        if copts.iter().any(|c| c == "-fmodules") {
            copts.push(format!(
                "-fmodules-cache-path={}/{}",
                self.config.genfiles_dir, MODULE_CACHE_DIR
            ));
        }
        copts
    }
}
