//! Artifact naming collaborator.
//!
//! The planner never decides where outputs live; it asks an
//! [`ArtifactNamer`] for the path of each logical role. The default
//! [`IntermediateArtifacts`] implementation lays everything out under one
//! output root, but callers with their own layout policy provide their own
//! implementation.

use crate::core::artifact::Artifact;
use crate::core::surface::ModuleMap;

/// Maps (unit, role, optional per-source key) to a unique output path.
pub trait ArtifactNamer {
    /// Object file compiled from a source.
    fn obj_file(&self, source: Artifact) -> Artifact;

    /// Makefile-style dependency file written alongside an object.
    fn dotd_file(&self, source: Artifact) -> Artifact;

    /// Coverage-notes file for an instrumented source.
    fn gcno_file(&self, source: Artifact) -> Artifact;

    /// Per-file partial Swift module, merged later.
    fn swift_partial_module(&self, source: Artifact) -> Artifact;

    /// Merged Swift module for the unit.
    fn swift_module(&self) -> Artifact;

    /// Generated Objective-C interop header for the unit's Swift code.
    fn swift_header(&self) -> Artifact;

    /// The unit's module map.
    fn module_map(&self) -> ModuleMap;

    /// The unit's static library.
    fn archive(&self) -> Artifact;

    /// Newline-delimited object list consumed by the archiver.
    fn archive_obj_list(&self) -> Artifact;

    /// Newline-delimited library list consumed by the linker.
    fn linker_obj_list(&self) -> Artifact;

    /// Archive statically linking the whole transitive closure.
    fn fully_linked_archive(&self) -> Artifact;

    /// Linker output used when a strip or debug-symbol step follows.
    fn unstripped_binary(&self) -> Artifact;

    /// The user-visible binary.
    fn stripped_binary(&self) -> Artifact;

    /// Zipped debug-symbol bundle emitted by the link action. The path must
    /// end in ".temp.zip"; the bundle directory is the path without that
    /// suffix.
    fn dsym_bundle_zip(&self) -> Artifact;

    /// Property list extracted from the debug-symbol bundle.
    fn dsym_plist(&self) -> Artifact;

    /// DWARF symbol file extracted from the debug-symbol bundle.
    fn dsym_symbol(&self, binary_name: &str) -> Artifact;

    /// Linker map output.
    fn linkmap(&self) -> Artifact;

    /// Pruned counterpart of a prebuilt archive, keyed by its path.
    fn pruned_archive(&self, original: Artifact) -> Artifact;

    /// Parameter file for the pruning action on an archive.
    fn prune_param_file(&self, original: Artifact) -> Artifact;
}

/// Default layout: all intermediate artifacts under `<output_root>/<label>`.
#[derive(Debug, Clone)]
pub struct IntermediateArtifacts {
    output_root: String,
    label: String,
}

impl IntermediateArtifacts {
    pub fn new(output_root: impl Into<String>, label: impl Into<String>) -> Self {
        IntermediateArtifacts {
            output_root: output_root.into(),
            label: label.into(),
        }
    }

    fn prefixed(&self, suffix: &str) -> Artifact {
        Artifact::new(format!("{}/{}{}", self.output_root, self.label, suffix))
    }

    fn per_source(&self, source: Artifact, new_ext: &str) -> Artifact {
        Artifact::new(format!(
            "{}/_objs/{}/{}",
            self.output_root,
            self.label,
            replace_extension(source.as_str(), new_ext)
        ))
    }
}

impl ArtifactNamer for IntermediateArtifacts {
    fn obj_file(&self, source: Artifact) -> Artifact {
        self.per_source(source, "o")
    }

    fn dotd_file(&self, source: Artifact) -> Artifact {
        self.per_source(source, "d")
    }

    fn gcno_file(&self, source: Artifact) -> Artifact {
        self.per_source(source, "gcno")
    }

    fn swift_partial_module(&self, source: Artifact) -> Artifact {
        self.per_source(source, "partial_swiftmodule")
    }

    fn swift_module(&self) -> Artifact {
        self.prefixed(".swiftmodule")
    }

    fn swift_header(&self) -> Artifact {
        self.prefixed("-Swift.h")
    }

    fn module_map(&self) -> ModuleMap {
        ModuleMap::new(
            self.prefixed(".modulemaps/module.modulemap"),
            self.label.clone(),
        )
    }

    fn archive(&self) -> Artifact {
        Artifact::new(format!("{}/lib{}.a", self.output_root, self.label))
    }

    fn archive_obj_list(&self) -> Artifact {
        self.prefixed("-archive.objlist")
    }

    fn linker_obj_list(&self) -> Artifact {
        self.prefixed("-linker.objlist")
    }

    fn fully_linked_archive(&self) -> Artifact {
        self.prefixed("_fully_linked.a")
    }

    fn unstripped_binary(&self) -> Artifact {
        self.prefixed("_bin.unstripped")
    }

    fn stripped_binary(&self) -> Artifact {
        self.prefixed("_bin")
    }

    fn dsym_bundle_zip(&self) -> Artifact {
        self.prefixed(".app.dSYM.temp.zip")
    }

    fn dsym_plist(&self) -> Artifact {
        self.prefixed(".app.dSYM/Contents/Info.plist")
    }

    fn dsym_symbol(&self, binary_name: &str) -> Artifact {
        self.prefixed(&format!(
            ".app.dSYM/Contents/Resources/DWARF/{}",
            binary_name
        ))
    }

    fn linkmap(&self) -> Artifact {
        self.prefixed(".linkmap")
    }

    fn pruned_archive(&self, original: Artifact) -> Artifact {
        Artifact::new(format!(
            "{}/_pruned/{}",
            self.output_root,
            original.as_str()
        ))
    }

    fn prune_param_file(&self, original: Artifact) -> Artifact {
        Artifact::new(format!(
            "{}/_pruned/{}.param",
            self.output_root,
            original.as_str()
        ))
    }
}

/// Replace the extension of a path string, or append one if absent.
fn replace_extension(path: &str, new_ext: &str) -> String {
    let dir_end = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[dir_end..].rfind('.') {
        Some(dot) => format!("{}.{}", &path[..dir_end + dot], new_ext),
        None => format!("{}.{}", path, new_ext),
    }
}
