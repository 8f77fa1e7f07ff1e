//! Shared flag composition for compile, Swift, and link command lines.
//!
//! Every function here is pure and returns an ordered `Vec<String>`. Flag
//! order is part of the contract: some toolchains are order-sensitive and
//! cached executors fingerprint the exact command line, so the same inputs
//! must always produce the same sequence.

use crate::core::config::{BuildConfig, Platform};
use crate::core::surface::DepSurface;

/// Coverage flags for compile actions.
pub const COMPILE_COVERAGE_FLAGS: [&str; 2] = ["-fprofile-arcs", "-ftest-coverage"];

/// Coverage flags for link actions. Same flags, historically reversed order.
pub const LINKER_COVERAGE_FLAGS: [&str; 2] = ["-ftest-coverage", "-fprofile-arcs"];

/// Added for simulator builds, which run against the OS X Objective-C
/// runtime.
pub const SIMULATOR_COMPILE_FLAGS: [&str; 4] = [
    "-fexceptions",
    "-fasm-blocks",
    "-fobjc-abi-version=2",
    "-fobjc-legacy-dispatch",
];

pub const DEFAULT_COMPILER_FLAGS: [&str; 1] = ["-DOS_IOS"];

pub const DEFAULT_LINKER_FLAGS: [&str; 1] = ["-ObjC"];

/// Warnings enabled on every clang compile.
pub const DEFAULT_WARNING_FLAGS: [&str; 10] = [
    "-Wshorten-64-to-32",
    "-Wbool-conversion",
    "-Wconstant-conversion",
    "-Wduplicate-method-match",
    "-Wempty-body",
    "-Wenum-conversion",
    "-Wint-conversion",
    "-Wunreachable-code",
    "-Wmismatched-return-types",
    "-Wundeclared-selector",
];

const FRAMEWORK_SUFFIX: &str = ".framework";

/// The minimum-OS flag for the configured platform. Simulator and device
/// spellings differ, and watch platforms key off the SDK version.
pub fn platform_version_flag(config: &BuildConfig) -> String {
    match config.platform {
        Platform::IosSimulator => {
            format!("-mios-simulator-version-min={}", config.minimum_os)
        }
        Platform::IosDevice => format!("-miphoneos-version-min={}", config.minimum_os),
        Platform::WatchosSimulator => {
            format!("-mwatchos-simulator-version-min={}", config.sdk_version)
        }
        Platform::WatchosDevice => format!("-mwatchos-version-min={}", config.sdk_version),
    }
}

/// Flags shared by every clang compile and link invocation, in contract
/// order: min-OS flag, debug flag, arch/SDK root, framework search paths.
pub fn common_link_and_compile_flags(surface: &DepSurface, config: &BuildConfig) -> Vec<String> {
    let mut flags = vec![platform_version_flag(config)];

    if config.generate_dsym {
        flags.push("-g".to_string());
    }

    flags.push("-arch".to_string());
    flags.push(config.arch.clone());
    flags.push("-isysroot".to_string());
    flags.push(config.sdk_root.clone());
    flags.extend(framework_search_flags(surface, config));
    flags
}

/// One `-F` per framework search directory.
pub fn framework_search_flags(surface: &DepSurface, config: &BuildConfig) -> Vec<String> {
    framework_search_dirs(surface, config)
        .into_iter()
        .flat_map(|dir| ["-F".to_string(), dir])
        .collect()
}

/// Framework search directories: the SDK frameworks dir, the platform
/// developer frameworks dir on iOS (XCTest lives there), then the
/// deduplicated parent of every framework bundle and search-only path.
pub fn framework_search_dirs(surface: &DepSurface, config: &BuildConfig) -> Vec<String> {
    let mut dirs = vec![config.sdk_framework_dir()];
    if config.platform.is_ios() {
        dirs.push(config.platform_developer_framework_dir.clone());
    }
    dirs.extend(unique_parent_directories(&surface.framework_dirs.to_vec()));
    dirs.extend(unique_parent_directories(
        &surface.framework_search_only_dirs.to_vec(),
    ));
    dirs
}

/// Default compile flags: warnings, platform-specific flags, `-DOS_IOS`.
pub fn compile_flags(config: &BuildConfig) -> Vec<String> {
    let mut flags: Vec<String> = DEFAULT_WARNING_FLAGS.iter().map(|f| f.to_string()).collect();
    if config.platform.is_simulator() {
        flags.extend(SIMULATOR_COMPILE_FLAGS.iter().map(|f| f.to_string()));
    }
    flags.extend(DEFAULT_COMPILER_FLAGS.iter().map(|f| f.to_string()));
    flags
}

/// Framework names for `-framework` arguments: SDK frameworks plus the
/// basename of every framework bundle directory.
///
/// Panics if a framework directory does not end in ".framework"; that means
/// an upstream collaborator violated its contract, not a user error.
pub fn framework_names(surface: &DepSurface) -> Vec<String> {
    let mut names = surface.sdk_frameworks.to_vec();
    for dir in surface.framework_dirs.to_vec() {
        let segment = dir.rsplit('/').next().unwrap_or(&dir);
        assert!(
            segment.ends_with(FRAMEWORK_SUFFIX),
            "expect {} to end with {}, but it does not",
            segment,
            FRAMEWORK_SUFFIX
        );
        names.push(segment[..segment.len() - FRAMEWORK_SUFFIX.len()].to_string());
    }
    names
}

/// Dylib names for `-l` arguments, with the conventional "lib" prefix
/// removed (libxml.dylib links as -lxml).
pub fn library_names(surface: &DepSurface) -> Vec<String> {
    surface
        .sdk_dylibs
        .to_vec()
        .into_iter()
        .map(|dylib| match dylib.strip_prefix("lib") {
            Some(rest) => rest.to_string(),
            None => dylib,
        })
        .collect()
}

/// Parent directory of each path, deduplicated in first-seen order.
fn unique_parent_directories(paths: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for path in paths {
        let parent = match path.rfind('/') {
            Some(idx) => path[..idx].to_string(),
            None => String::new(),
        };
        if seen.insert(parent.clone()) {
            out.push(parent);
        }
    }
    out
}
