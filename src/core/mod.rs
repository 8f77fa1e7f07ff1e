//! Core data model: artifacts, compilation units, dependency surfaces,
//! build configuration, and artifact naming.

pub mod artifact;
pub mod config;
pub mod manifest;
pub mod naming;
pub mod surface;
pub mod unit;

pub use artifact::{Artifact, DepSet};
pub use config::{BuildConfig, CompilationMode, Platform, TargetAttributes, ToolPaths};
pub use naming::{ArtifactNamer, IntermediateArtifacts};
pub use surface::{DepSurface, ModuleMap, PruneInfo};
pub use unit::{CompilationUnit, SourceFile, SourceKind};
