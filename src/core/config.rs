//! Build configuration: platform, compilation mode, tool handles, and
//! per-target attributes.
//!
//! Everything here arrives already resolved (architecture, SDK paths,
//! minimum OS). The planner never probes the machine; it only reads these
//! values while composing command lines.

use serde::{Deserialize, Serialize};

use crate::core::artifact::Artifact;

/// Tool names dispatched through the xcrun wrapper.
pub const CLANG: &str = "clang";
pub const CLANG_PLUSPLUS: &str = "clang++";
pub const SWIFT: &str = "swift";
pub const DSYMUTIL: &str = "dsymutil";
pub const STRIP: &str = "strip";

/// The Apple platform an action targets.
///
/// The set is closed: every match over it is exhaustive, so an unsupported
/// configuration cannot reach flag composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    IosSimulator,
    IosDevice,
    WatchosSimulator,
    WatchosDevice,
}

impl Platform {
    pub fn is_simulator(&self) -> bool {
        matches!(self, Platform::IosSimulator | Platform::WatchosSimulator)
    }

    pub fn is_ios(&self) -> bool {
        matches!(self, Platform::IosSimulator | Platform::IosDevice)
    }

    /// Platform name as used in the Apple SDK layout and action environment.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::IosSimulator => "iPhoneSimulator",
            Platform::IosDevice => "iPhoneOS",
            Platform::WatchosSimulator => "WatchSimulator",
            Platform::WatchosDevice => "WatchOS",
        }
    }
}

/// Compilation mode, selecting the default optimization/diagnostic copts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilationMode {
    #[default]
    Fastbuild,
    Dbg,
    Opt,
}

impl CompilationMode {
    /// Clang copts implied by the mode.
    pub fn copts(&self) -> &'static [&'static str] {
        match self {
            CompilationMode::Fastbuild => &["-O0", "-DDEBUG=1"],
            CompilationMode::Dbg => &["-g", "-O0", "-DDEBUG=1"],
            CompilationMode::Opt => &["-Os", "-DNDEBUG=1"],
        }
    }

    /// Swift copts implied by the mode.
    pub fn swift_copts(&self) -> &'static [&'static str] {
        match self {
            CompilationMode::Fastbuild => &["-Onone", "-DDEBUG"],
            CompilationMode::Dbg => &["-Onone", "-DDEBUG", "-g"],
            CompilationMode::Opt => &["-O", "-DNDEBUG"],
        }
    }
}

/// Opaque executable handles for the wrapped toolchain.
///
/// The wrapper resolves tool names (`clang`, `swift`, ...) against the
/// selected Xcode; it is itself a declared input of every action that runs
/// through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    /// xcrun wrapper executable
    pub xcrun_wrapper: Artifact,
    /// libtool executable (archiver)
    pub libtool: Artifact,
    /// archive pruning tool
    pub pruner: Artifact,
    /// placeholder archive substituted for fully pruned inputs
    pub dummy_archive: Artifact,
}

/// Global build configuration for one unit's planning pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub platform: Platform,
    /// Target architecture, e.g. "arm64" or "x86_64"
    pub arch: String,
    /// SDK version, e.g. "8.4"
    pub sdk_version: String,
    /// Resolved SDK root path
    pub sdk_root: String,
    /// Minimum OS version for iOS version-min flags
    pub minimum_os: String,
    /// Developer frameworks directory for the selected platform
    pub platform_developer_framework_dir: String,
    /// Swift support library directory, used when any dependency uses Swift
    pub swift_lib_dir: String,
    #[serde(default)]
    pub compilation_mode: CompilationMode,
    #[serde(default)]
    pub coverage_enabled: bool,
    #[serde(default)]
    pub module_maps_enabled: bool,
    /// Strip the linked binary in a separate action
    #[serde(default)]
    pub strip_binary: bool,
    /// Extract a debug-symbol bundle after linking
    #[serde(default)]
    pub generate_dsym: bool,
    #[serde(default)]
    pub generate_linkmap: bool,
    /// Rewrite prunable archives with dead entries removed before linking
    #[serde(default)]
    pub dead_code_removal: bool,
    /// Place the linker file list before the library flags
    #[serde(default)]
    pub prioritize_static_libs: bool,
    /// Configuration-level copts, applied before per-target copts
    #[serde(default)]
    pub copts: Vec<String>,
    /// Quoted (-iquote) user header search paths
    #[serde(default)]
    pub user_header_search_paths: Vec<String>,
    /// Root for the implicit module cache path
    #[serde(default)]
    pub genfiles_dir: String,
    pub tools: ToolPaths,
}

impl BuildConfig {
    /// SDK frameworks directory under the SDK root.
    pub fn sdk_framework_dir(&self) -> String {
        format!("{}/System/Library/Frameworks", self.sdk_root)
    }

    /// Target triple for the Swift compiler, e.g. "arm64-apple-ios8.4".
    pub fn swift_target(&self) -> String {
        format!("{}-apple-ios{}", self.arch, self.sdk_version)
    }

    /// Environment injected into every spawned action.
    pub fn action_env(&self) -> Vec<(String, String)> {
        vec![
            (
                "APPLE_SDK_VERSION_OVERRIDE".to_string(),
                self.sdk_version.clone(),
            ),
            ("APPLE_SDK_PLATFORM".to_string(), self.platform.name().to_string()),
        ]
    }
}

/// Per-target attributes, as declared on the rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetAttributes {
    /// Target label, also the fallback module name
    pub label: String,
    /// Test bundles are linked without an entry point and stripped
    /// differently
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub copts: Vec<String>,
    #[serde(default)]
    pub linkopts: Vec<String>,
    /// Whether clang modules (-fmodules) are enabled for this target
    #[serde(default)]
    pub enable_modules: bool,
    /// Header search paths relative to the workspace; absolute paths are a
    /// validation error
    #[serde(default)]
    pub includes: Vec<String>,
    /// Objective-C bridging header imported into Swift compiles
    #[serde(default)]
    pub bridging_header: Option<Artifact>,
}
