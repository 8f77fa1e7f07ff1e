//! Gantry - A build-action planner for Apple native compilation units
//!
//! This crate translates a declarative description of a compilation unit
//! (Objective-C/C/C++/Swift sources, headers, build configuration) into an
//! ordered graph of build-action descriptors with fully resolved command
//! lines and complete declared input/output sets. The descriptors are meant
//! to be handed to an external executor that runs them in parallel, keyed by
//! command-line fingerprint, so construction must be pure and deterministic.

pub mod core;
pub mod planner;
pub mod util;

pub use crate::core::{
    artifact::{Artifact, DepSet},
    config::{BuildConfig, CompilationMode, Platform, TargetAttributes, ToolPaths},
    naming::{ArtifactNamer, IntermediateArtifacts},
    surface::{DepSurface, ModuleMap, PruneInfo},
    unit::{CompilationUnit, SourceKind},
};

pub use crate::planner::{
    action::{ActionDescriptor, ActionGraph, Invocation},
    CompilationPlanner, PlanError,
};
