//! Binary linking, symbol stripping, and debug-symbol extraction.

use crate::core::artifact::Artifact;
use crate::core::config::{CLANG, CLANG_PLUSPLUS, DSYMUTIL, STRIP};
use crate::core::surface::PruneInfo;
use crate::planner::action::{ActionBuilder, ActionGraph};
use crate::planner::archive::filelist_contents;
use crate::planner::{flags, CompilationPlanner};

const DSYM_ZIP_SUFFIX: &str = ".temp.zip";

impl CompilationPlanner<'_> {
    /// Plans the link of the unit and its closure into a binary, plus the
    /// follow-on strip and debug-symbol actions the configuration asks for.
    ///
    /// Library paths travel through a file list like archive inputs do. The
    /// link command itself is a single shell command so the debug-symbol
    /// extraction can chain onto the same action.
    pub fn plan_link(
        &self,
        prune_info: &PruneInfo,
        extra_link_args: &[String],
        extra_link_inputs: &[Artifact],
        graph: &mut ActionGraph,
    ) {
        let substitution = if self.prune_archives(prune_info) {
            self.plan_prune_actions(prune_info, graph)
        } else {
            Default::default()
        };

        let own_archive = self
            .unit
            .has_compilation_artifacts()
            .then(|| self.namer.archive());
        let built_libraries: Vec<Artifact> = self
            .surface
            .built_libraries(own_archive)
            .into_iter()
            .map(|lib| substitution.get(&lib).copied().unwrap_or(lib))
            .collect();

        let mut force_load: Vec<Artifact> = self.surface.force_load_libraries.to_vec();
        force_load.extend(self.surface.always_link_cc_libraries());

        let mut filelist_entries = built_libraries.clone();
        filelist_entries.extend(self.surface.imported_libraries.to_vec());
        filelist_entries.extend(self.surface.cc_libraries.to_vec());
        filelist_entries.retain(|lib| !force_load.contains(lib));

        let obj_list = self.namer.linker_obj_list();
        graph.register(
            ActionBuilder::write_file("ObjFilelist", filelist_contents(&filelist_entries))
                .output(obj_list)
                .build(),
        );

        // A strip or debug-symbol step needs the unstripped output around;
        // otherwise the link produces the final binary directly.
        let post_processed = self.config.strip_binary || self.config.generate_dsym;
        let binary = if post_processed {
            self.namer.unstripped_binary()
        } else {
            self.namer.stripped_binary()
        };

        let mut cmd: Vec<String> = vec![self.config.tools.xcrun_wrapper.as_str().to_string()];
        if self.surface.uses_cpp {
            cmd.push(CLANG_PLUSPLUS.to_string());
            cmd.push("-stdlib=libc++".to_string());
            cmd.push("-std=gnu++11".to_string());
        } else {
            cmd.push(CLANG.to_string());
        }
        if self.config.strip_binary && !self.attrs.is_test {
            cmd.push("-dead_strip".to_string());
            cmd.push("-no_dead_strip_inits_and_terms".to_string());
        }
        if self.config.prioritize_static_libs {
            cmd.push("-filelist".to_string());
            cmd.push(obj_list.as_str().to_string());
        }
        cmd.extend(flags::common_link_and_compile_flags(
            self.surface,
            self.config,
        ));
        cmd.extend(
            [
                "-Xlinker",
                "-objc_abi_version",
                "-Xlinker",
                "2",
                "-Xlinker",
                "-rpath",
                "-Xlinker",
                "@executable_path/Frameworks",
                "-fobjc-link-runtime",
            ]
            .map(String::from),
        );
        cmd.extend(flags::DEFAULT_LINKER_FLAGS.iter().map(|f| f.to_string()));
        for framework in flags::framework_names(self.surface) {
            cmd.push("-framework".to_string());
            cmd.push(framework);
        }
        for framework in self.surface.weak_sdk_frameworks.to_vec() {
            cmd.push("-weak_framework".to_string());
            cmd.push(framework);
        }
        for lib in flags::library_names(self.surface) {
            cmd.push(format!("-l{}", lib));
        }
        if !self.config.prioritize_static_libs {
            cmd.push("-filelist".to_string());
            cmd.push(obj_list.as_str().to_string());
        }
        cmd.push("-o".to_string());
        cmd.push(binary.as_str().to_string());
        for lib in &force_load {
            cmd.push("-force_load".to_string());
            cmd.push(lib.as_str().to_string());
        }
        cmd.extend(extra_link_args.iter().cloned());
        cmd.extend(self.surface.linkopts.to_vec());
        if self.config.coverage_enabled {
            cmd.extend(flags::LINKER_COVERAGE_FLAGS.iter().map(|f| f.to_string()));
        }
        if self.surface.uses_swift {
            cmd.push("-L".to_string());
            cmd.push(self.config.swift_lib_dir.clone());
        }
        for opt in &self.attrs.linkopts {
            cmd.push(format!("-Wl,{}", opt));
        }
        if self.config.generate_linkmap {
            cmd.push("-Xlinker".to_string());
            cmd.push("-map".to_string());
            cmd.push("-Xlinker".to_string());
            cmd.push(self.namer.linkmap().as_str().to_string());
        }
        if self.config.generate_dsym {
            cmd.extend(self.dsym_command_suffix(binary));
        }

        // The flag can arrive through any of the linkopt channels, so the
        // assembled command is what gets inspected.
        let links_dynamic_lib = cmd.iter().any(|a| a == "-dynamiclib");

        let mut builder = ActionBuilder::shell("ObjcLink", cmd.join(" "), self.config.action_env())
            .input(self.config.tools.xcrun_wrapper)
            .inputs(built_libraries)
            .transitive_inputs(&self.surface.imported_libraries)
            .transitive_inputs(&self.surface.static_framework_files)
            .transitive_inputs(&self.surface.dynamic_framework_files)
            .transitive_inputs(&self.surface.cc_libraries)
            .inputs(extra_link_inputs.iter().copied())
            .inputs(substitution.values().copied())
            .input(obj_list)
            .output(binary);
        if self.config.generate_dsym {
            builder = builder.output(self.namer.dsym_bundle_zip());
        }
        if self.config.generate_linkmap {
            builder = builder.output(self.namer.linkmap());
        }
        graph.register(builder.build());

        if self.config.strip_binary {
            self.plan_strip(links_dynamic_lib, graph);
        }
        if self.config.generate_dsym {
            self.plan_dsym_unzip(binary, graph);
        }
    }

    /// Shell suffix chaining debug-symbol extraction onto the link: run
    /// dsymutil into the bundle directory, then zip the bundle in place so
    /// the action has a flat file output.
    fn dsym_command_suffix(&self, binary: Artifact) -> Vec<String> {
        let zip = self.namer.dsym_bundle_zip();
        let bundle_dir = dsym_bundle_dir(zip);
        vec![
            "&&".to_string(),
            self.config.tools.xcrun_wrapper.as_str().to_string(),
            DSYMUTIL.to_string(),
            binary.as_str().to_string(),
            "-o".to_string(),
            bundle_dir.to_string(),
            "&&".to_string(),
            format!("zipped_bundle=${{PWD}}/{}", zip),
            "&&".to_string(),
            "cd".to_string(),
            bundle_dir.to_string(),
            "&&".to_string(),
            "/usr/bin/zip".to_string(),
            "-q".to_string(),
            "-r".to_string(),
            "\"${zipped_bundle}\"".to_string(),
            ".".to_string(),
        ]
    }

    /// Plans the strip of the linked binary. Test binaries keep their
    /// debugging symbol table; dynamic libraries keep local symbols.
    fn plan_strip(&self, links_dynamic_lib: bool, graph: &mut ActionGraph) {
        let unstripped = self.namer.unstripped_binary();
        let stripped = self.namer.stripped_binary();

        let mut args = vec![STRIP.to_string()];
        if self.attrs.is_test {
            args.push("-S".to_string());
        } else if links_dynamic_lib {
            args.push("-x".to_string());
        }
        args.push("-o".to_string());
        args.push(stripped.as_str().to_string());
        args.push(unstripped.as_str().to_string());

        graph.register(
            ActionBuilder::spawn(
                "ObjcBinarySymbolStrip",
                self.config.tools.xcrun_wrapper.as_str(),
                args,
                self.config.action_env(),
            )
            .input(self.config.tools.xcrun_wrapper)
            .input(unstripped)
            .output(stripped)
            .build(),
        );
    }

    /// Plans the extraction of the Info.plist and DWARF file from the zipped
    /// debug-symbol bundle into declared artifacts.
    fn plan_dsym_unzip(&self, binary: Artifact, graph: &mut ActionGraph) {
        let zip = self.namer.dsym_bundle_zip();
        let bundle_dir = dsym_bundle_dir(zip);
        let plist = self.namer.dsym_plist();
        let symbol = self.namer.dsym_symbol(binary.file_name());

        let command = format!(
            "unzip -p {zip} {plist_entry} > {plist} && unzip -p {zip} {symbol_entry} > {symbol}",
            zip = zip,
            plist_entry = zip_entry(plist, bundle_dir),
            plist = plist,
            symbol_entry = zip_entry(symbol, bundle_dir),
            symbol = symbol,
        );

        graph.register(
            ActionBuilder::shell("UnzipDsym", command, self.config.action_env())
                .input(zip)
                .output(plist)
                .output(symbol)
                .build(),
        );
    }
}

/// The bundle directory a debug-symbol zip unpacks from. The zip path must
/// carry the temp suffix; anything else is a naming-contract violation.
fn dsym_bundle_dir(zip: Artifact) -> &'static str {
    match zip.as_str().strip_suffix(DSYM_ZIP_SUFFIX) {
        Some(dir) => dir,
        None => panic!(
            "dSYM bundle zip {} lacks expected suffix {}",
            zip, DSYM_ZIP_SUFFIX
        ),
    }
}

fn zip_entry(artifact: Artifact, bundle_dir: &str) -> &'static str {
    artifact
        .as_str()
        .strip_prefix(bundle_dir)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(artifact.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::DepSet;
    use crate::core::config::Platform;
    use crate::core::surface::DepSurface;
    use crate::core::unit::CompilationUnit;
    use crate::planner::action::Invocation;
    use crate::planner::testing::{test_attrs, test_config, test_namer};

    fn link_command(graph: &ActionGraph, binary: &str) -> String {
        match &graph.producer(Artifact::new(binary)).unwrap().invocation {
            Invocation::Shell { command, .. } => command.clone(),
            other => panic!("expected a shell link, got {:?}", other),
        }
    }

    fn plan(
        surface: &DepSurface,
        config: &crate::core::config::BuildConfig,
        attrs: &crate::core::config::TargetAttributes,
        extra_link_args: &[String],
    ) -> ActionGraph {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("src/a.m")])
            .build();
        let namer = test_namer("app");
        let planner = CompilationPlanner::new(&unit, surface, config, attrs, &namer);
        let mut graph = ActionGraph::new();
        planner.plan_link(&PruneInfo::default(), extra_link_args, &[], &mut graph);
        graph
    }

    #[test]
    fn test_link_command_shape() {
        let surface = DepSurface {
            sdk_frameworks: DepSet::of(vec!["UIKit".to_string()]),
            weak_sdk_frameworks: DepSet::of(vec!["CoreMotion".to_string()]),
            sdk_dylibs: DepSet::of(vec!["libz".to_string()]),
            ..Default::default()
        };
        let config = test_config(Platform::IosDevice);
        let graph = plan(&surface, &config, &test_attrs("app"), &[]);

        let cmd = link_command(&graph, "bin/app_bin");
        assert!(cmd.starts_with("tools/xcrunwrapper.sh clang "));
        assert!(cmd.contains("-Xlinker -objc_abi_version -Xlinker 2"));
        assert!(cmd.contains("-Xlinker -rpath -Xlinker @executable_path/Frameworks"));
        assert!(cmd.contains("-fobjc-link-runtime -ObjC"));
        assert!(cmd.contains("-framework UIKit"));
        assert!(cmd.contains("-weak_framework CoreMotion"));
        assert!(cmd.contains(" -lz "));
        // file list after the library flags by default
        assert!(cmd.contains("-lz -filelist bin/app-linker.objlist -o bin/app_bin"));
        assert!(!cmd.contains("-dead_strip"));
    }

    #[test]
    fn test_cpp_closure_links_with_cpp_driver() {
        let surface = DepSurface {
            uses_cpp: true,
            ..Default::default()
        };
        let config = test_config(Platform::IosDevice);
        let graph = plan(&surface, &config, &test_attrs("app"), &[]);
        let cmd = link_command(&graph, "bin/app_bin");
        assert!(cmd.starts_with("tools/xcrunwrapper.sh clang++ -stdlib=libc++ -std=gnu++11"));
    }

    #[test]
    fn test_prioritized_filelist_precedes_common_flags() {
        let mut config = test_config(Platform::IosDevice);
        config.prioritize_static_libs = true;
        let graph = plan(&DepSurface::default(), &config, &test_attrs("app"), &[]);
        let cmd = link_command(&graph, "bin/app_bin");
        let filelist = cmd.find("-filelist").unwrap();
        let min_os = cmd.find("-miphoneos-version-min").unwrap();
        assert!(filelist < min_os);
    }

    #[test]
    fn test_strip_follows_link() {
        let mut config = test_config(Platform::IosDevice);
        config.strip_binary = true;
        let graph = plan(&DepSurface::default(), &config, &test_attrs("app"), &[]);

        let cmd = link_command(&graph, "bin/app_bin.unstripped");
        assert!(cmd.contains("-dead_strip -no_dead_strip_inits_and_terms"));

        let strip = graph.with_mnemonic("ObjcBinarySymbolStrip")[0];
        assert_eq!(
            strip.arguments(),
            vec![
                "tools/xcrunwrapper.sh",
                "strip",
                "-o",
                "bin/app_bin",
                "bin/app_bin.unstripped",
            ]
        );
    }

    #[test]
    fn test_strip_flag_variants() {
        let mut config = test_config(Platform::IosDevice);
        config.strip_binary = true;

        let mut attrs = test_attrs("app");
        attrs.is_test = true;
        let graph = plan(&DepSurface::default(), &config, &attrs, &[]);
        let strip = graph.with_mnemonic("ObjcBinarySymbolStrip")[0];
        assert!(strip.arguments().contains(&"-S".to_string()));
        // tests are never dead-stripped
        assert!(!link_command(&graph, "bin/app_bin.unstripped").contains("-dead_strip"));

        let graph = plan(
            &DepSurface::default(),
            &config,
            &test_attrs("app"),
            &["-dynamiclib".to_string()],
        );
        let strip = graph.with_mnemonic("ObjcBinarySymbolStrip")[0];
        assert!(strip.arguments().contains(&"-x".to_string()));

        // the flag also counts when it rides in on the closure's linkopts
        let surface = DepSurface {
            linkopts: DepSet::of(vec!["-dynamiclib".to_string()]),
            ..Default::default()
        };
        let graph = plan(&surface, &config, &test_attrs("app"), &[]);
        let strip = graph.with_mnemonic("ObjcBinarySymbolStrip")[0];
        assert!(strip.arguments().contains(&"-x".to_string()));
    }

    #[test]
    fn test_dsym_chain_and_unzip() {
        let mut config = test_config(Platform::IosDevice);
        config.generate_dsym = true;
        let graph = plan(&DepSurface::default(), &config, &test_attrs("app"), &[]);

        let cmd = link_command(&graph, "bin/app_bin.unstripped");
        assert!(cmd.contains(
            "&& tools/xcrunwrapper.sh dsymutil bin/app_bin.unstripped -o bin/app.app.dSYM"
        ));
        assert!(cmd.contains("zipped_bundle=${PWD}/bin/app.app.dSYM.temp.zip"));
        let link = graph.producer(Artifact::new("bin/app_bin.unstripped")).unwrap();
        assert!(link
            .outputs
            .contains(&Artifact::new("bin/app.app.dSYM.temp.zip")));

        let unzip = graph.with_mnemonic("UnzipDsym")[0];
        match &unzip.invocation {
            Invocation::Shell { command, .. } => {
                assert!(command.contains(
                    "unzip -p bin/app.app.dSYM.temp.zip Contents/Info.plist > \
                     bin/app.app.dSYM/Contents/Info.plist"
                ));
                assert!(command.contains("Contents/Resources/DWARF/app_bin.unstripped"));
            }
            other => panic!("expected a shell unzip, got {:?}", other),
        }
    }

    #[test]
    fn test_linkmap_output() {
        let mut config = test_config(Platform::IosDevice);
        config.generate_linkmap = true;
        let graph = plan(&DepSurface::default(), &config, &test_attrs("app"), &[]);
        let cmd = link_command(&graph, "bin/app_bin");
        assert!(cmd.contains("-Xlinker -map -Xlinker bin/app.linkmap"));
        let link = graph.producer(Artifact::new("bin/app_bin")).unwrap();
        assert!(link.outputs.contains(&Artifact::new("bin/app.linkmap")));
    }

    #[test]
    fn test_force_load_excluded_from_filelist() {
        let surface = DepSurface {
            libraries: DepSet::of(vec![Artifact::new("bin/libdep.a")]),
            force_load_libraries: DepSet::of(vec![Artifact::new("bin/libdep.a")]),
            cc_libraries: DepSet::of(vec![Artifact::new("cc/libinit.lo")]),
            ..Default::default()
        };
        let config = test_config(Platform::IosDevice);
        let graph = plan(&surface, &config, &test_attrs("app"), &[]);

        let filelist = graph
            .producer(Artifact::new("bin/app-linker.objlist"))
            .unwrap();
        match &filelist.invocation {
            Invocation::WriteFile { contents } => {
                assert!(!contents.contains("libdep.a"));
                assert!(!contents.contains("libinit.lo"));
                assert!(contents.contains("bin/libapp.a"));
            }
            other => panic!("expected a file write, got {:?}", other),
        }
        let cmd = link_command(&graph, "bin/app_bin");
        assert!(cmd.contains("-force_load bin/libdep.a"));
        assert!(cmd.contains("-force_load cc/libinit.lo"));
    }

    #[test]
    fn test_swift_closure_adds_runtime_search_path() {
        let surface = DepSurface {
            uses_swift: true,
            ..Default::default()
        };
        let config = test_config(Platform::IosDevice);
        let graph = plan(&surface, &config, &test_attrs("app"), &[]);
        assert!(link_command(&graph, "bin/app_bin").contains("-L /swift/lib"));
    }

    #[test]
    fn test_pruned_archives_substitute_originals() {
        let surface = DepSurface {
            libraries: DepSet::of(vec![Artifact::new("gen/libj.a")]),
            prunable_archives: DepSet::of(vec![Artifact::new("gen/libj.a")]),
            ..Default::default()
        };
        let mut config = test_config(Platform::IosDevice);
        config.dead_code_removal = true;

        let prune_info = PruneInfo {
            entry_points: ["Main".to_string()].into(),
            ..Default::default()
        };
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("src/a.m")])
            .build();
        let attrs = test_attrs("app");
        let namer = test_namer("app");
        let planner = CompilationPlanner::new(&unit, &surface, &config, &attrs, &namer);
        let mut graph = ActionGraph::new();
        planner.plan_link(&prune_info, &[], &[], &mut graph);

        assert_eq!(graph.with_mnemonic("ArchivePrune").len(), 1);
        let filelist = graph
            .producer(Artifact::new("bin/app-linker.objlist"))
            .unwrap();
        match &filelist.invocation {
            Invocation::WriteFile { contents } => {
                assert!(contents.contains("bin/_pruned/gen/libj.a"));
                assert!(!contents.contains("\ngen/libj.a"));
                assert!(!contents.starts_with("gen/libj.a"));
            }
            other => panic!("expected a file write, got {:?}", other),
        }

        // without entry points, originals link unchanged
        let mut graph = ActionGraph::new();
        planner.plan_link(&PruneInfo::default(), &[], &[], &mut graph);
        assert!(graph.with_mnemonic("ArchivePrune").is_empty());
    }
}
