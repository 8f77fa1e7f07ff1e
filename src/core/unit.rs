//! Compilation units and source classification.

use serde::{Deserialize, Serialize};

use crate::core::artifact::Artifact;

/// Language/memory-management variant of a source file.
///
/// The set is closed; compile dispatch, archiving, and validation all match
/// on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Objective-C/C/C++ compiled with ARC enabled
    Arc,
    /// Objective-C/Objective-C++ compiled with ARC disabled
    NonArc,
    /// Swift source, compiled by the Swift frontend
    Swift,
    /// Already-compiled object, passed straight to the archiver
    Precompiled,
}

/// A source file tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFile {
    pub artifact: Artifact,
    pub kind: SourceKind,
}

/// One logical group of sources and headers compiled and archived together.
///
/// Built once per rule invocation and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    srcs: Vec<Artifact>,
    non_arc_srcs: Vec<Artifact>,
    precompiled_srcs: Vec<Artifact>,
    public_hdrs: Vec<Artifact>,
    private_hdrs: Vec<Artifact>,
    additional_hdrs: Vec<Artifact>,
    pch: Option<Artifact>,
}

impl CompilationUnit {
    pub fn builder() -> CompilationUnitBuilder {
        CompilationUnitBuilder {
            unit: CompilationUnit::default(),
        }
    }

    /// ARC sources, possibly including Swift files.
    pub fn srcs(&self) -> &[Artifact] {
        &self.srcs
    }

    pub fn non_arc_srcs(&self) -> &[Artifact] {
        &self.non_arc_srcs
    }

    pub fn precompiled_srcs(&self) -> &[Artifact] {
        &self.precompiled_srcs
    }

    pub fn public_hdrs(&self) -> &[Artifact] {
        &self.public_hdrs
    }

    pub fn private_hdrs(&self) -> &[Artifact] {
        &self.private_hdrs
    }

    pub fn additional_hdrs(&self) -> &[Artifact] {
        &self.additional_hdrs
    }

    pub fn pch(&self) -> Option<Artifact> {
        self.pch
    }

    /// All sources in deterministic order (ARC, non-ARC, precompiled),
    /// each tagged with its kind.
    pub fn sources(&self) -> Vec<SourceFile> {
        let mut out = Vec::with_capacity(
            self.srcs.len() + self.non_arc_srcs.len() + self.precompiled_srcs.len(),
        );
        for &artifact in &self.srcs {
            let kind = if is_swift_source(artifact) {
                SourceKind::Swift
            } else {
                SourceKind::Arc
            };
            out.push(SourceFile { artifact, kind });
        }
        for &artifact in &self.non_arc_srcs {
            out.push(SourceFile {
                artifact,
                kind: SourceKind::NonArc,
            });
        }
        for &artifact in &self.precompiled_srcs {
            out.push(SourceFile {
                artifact,
                kind: SourceKind::Precompiled,
            });
        }
        out
    }

    /// Swift sources within the ARC set, in declaration order.
    pub fn swift_srcs(&self) -> Vec<Artifact> {
        self.srcs
            .iter()
            .copied()
            .filter(|s| is_swift_source(*s))
            .collect()
    }

    pub fn has_swift_sources(&self) -> bool {
        self.srcs.iter().any(|s| is_swift_source(*s))
    }

    /// True if the unit produces an archive (and so a module map).
    pub fn has_compilation_artifacts(&self) -> bool {
        !self.srcs.is_empty() || !self.non_arc_srcs.is_empty() || !self.precompiled_srcs.is_empty()
    }
}

/// Builder for [`CompilationUnit`].
pub struct CompilationUnitBuilder {
    unit: CompilationUnit,
}

impl CompilationUnitBuilder {
    pub fn srcs(mut self, srcs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.srcs.extend(srcs);
        self
    }

    pub fn non_arc_srcs(mut self, srcs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.non_arc_srcs.extend(srcs);
        self
    }

    pub fn precompiled_srcs(mut self, srcs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.precompiled_srcs.extend(srcs);
        self
    }

    pub fn public_hdrs(mut self, hdrs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.public_hdrs.extend(hdrs);
        self
    }

    pub fn private_hdrs(mut self, hdrs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.private_hdrs.extend(hdrs);
        self
    }

    pub fn additional_hdrs(mut self, hdrs: impl IntoIterator<Item = Artifact>) -> Self {
        self.unit.additional_hdrs.extend(hdrs);
        self
    }

    pub fn pch(mut self, pch: Option<Artifact>) -> Self {
        self.unit.pch = pch;
        self
    }

    pub fn build(self) -> CompilationUnit {
        self.unit
    }
}

/// C++-family extension test; these sources get the libc++ flags.
pub fn is_cpp_source(artifact: Artifact) -> bool {
    matches!(artifact.extension(), "cc" | "cpp" | "mm" | "cxx" | "C")
}

pub fn is_swift_source(artifact: Artifact) -> bool {
    artifact.extension() == "swift"
}

/// Whether coverage instrumentation applies to a source. Assembly is
/// compiled but never instrumented.
pub fn is_instrumentable(artifact: Artifact) -> bool {
    !matches!(artifact.extension(), "s" | "S" | "asm")
}

/// Headers usable in a module map. Only plain `.h` files qualify: other
/// header kinds are implicitly textual, which the supported module-map
/// dialect cannot express.
pub fn is_module_map_header(artifact: Artifact) -> bool {
    artifact.extension() == "h"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_tagged_in_order() {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("a.m"), Artifact::new("b.swift")])
            .non_arc_srcs(vec![Artifact::new("c.mm")])
            .precompiled_srcs(vec![Artifact::new("d.o")])
            .build();

        let sources = unit.sources();
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].kind, SourceKind::Arc);
        assert_eq!(sources[1].kind, SourceKind::Swift);
        assert_eq!(sources[2].kind, SourceKind::NonArc);
        assert_eq!(sources[3].kind, SourceKind::Precompiled);
    }

    #[test]
    fn test_has_compilation_artifacts() {
        let empty = CompilationUnit::builder().build();
        assert!(!empty.has_compilation_artifacts());

        let precompiled_only = CompilationUnit::builder()
            .precompiled_srcs(vec![Artifact::new("d.o")])
            .build();
        assert!(precompiled_only.has_compilation_artifacts());
    }

    #[test]
    fn test_swift_detection() {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("a.m"), Artifact::new("b.swift")])
            .build();
        assert!(unit.has_swift_sources());
        assert_eq!(unit.swift_srcs(), vec![Artifact::new("b.swift")]);
    }

    #[test]
    fn test_extension_classification() {
        assert!(is_cpp_source(Artifact::new("x.mm")));
        assert!(is_cpp_source(Artifact::new("x.cc")));
        assert!(is_cpp_source(Artifact::new("x.C")));
        assert!(!is_cpp_source(Artifact::new("x.c")));
        assert!(!is_cpp_source(Artifact::new("x.m")));

        assert!(is_instrumentable(Artifact::new("x.m")));
        assert!(!is_instrumentable(Artifact::new("x.S")));

        assert!(is_module_map_header(Artifact::new("x.h")));
        assert!(!is_module_map_header(Artifact::new("x.inc")));
        assert!(!is_module_map_header(Artifact::new("x.hpp")));
    }
}
