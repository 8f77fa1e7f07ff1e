//! Attribute validation, run before any action is planned.

use std::collections::HashSet;

use crate::core::artifact::Artifact;
use crate::planner::CompilationPlanner;
use crate::util::Diagnostic;

impl CompilationPlanner<'_> {
    /// Checks the target's attributes for conflicts the toolchain would
    /// otherwise surface much later or silently miscompile.
    ///
    /// Returns all findings; an error among them aborts planning, warnings
    /// do not.
    pub fn validate_attributes(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for include in &self.attrs.includes {
            if include.starts_with('/') {
                diagnostics.push(Diagnostic::error(
                    "includes",
                    format!(
                        "The path '{}' is absolute, but only relative paths are allowed.",
                        include
                    ),
                ));
            }
        }

        let hdrs: HashSet<Artifact> = self.unit.public_hdrs().iter().copied().collect();
        for src in self.unit.srcs() {
            if hdrs.contains(src) {
                diagnostics.push(Diagnostic::warning(
                    "srcs",
                    format!("File '{}' is in both srcs and hdrs.", src),
                ));
            }
        }

        let non_arc: HashSet<Artifact> = self.unit.non_arc_srcs().iter().copied().collect();
        for src in self.unit.srcs() {
            if non_arc.contains(src) {
                diagnostics.push(Diagnostic::error(
                    "srcs",
                    format!(
                        "File '{}' is present in both srcs and non_arc_srcs which is forbidden.",
                        src
                    ),
                ));
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Platform, TargetAttributes};
    use crate::core::surface::DepSurface;
    use crate::core::unit::CompilationUnit;
    use crate::planner::testing::{test_config, test_namer};
    use crate::util::Severity;

    fn validate(unit: &CompilationUnit, attrs: &TargetAttributes) -> Vec<Diagnostic> {
        let surface = DepSurface::default();
        let config = test_config(Platform::IosSimulator);
        let namer = test_namer("app");
        CompilationPlanner::new(unit, &surface, &config, attrs, &namer).validate_attributes()
    }

    #[test]
    fn test_absolute_include_is_error() {
        let unit = CompilationUnit::builder().build();
        let attrs = TargetAttributes {
            includes: vec!["/usr/include".to_string(), "relative/dir".to_string()],
            ..Default::default()
        };
        let diagnostics = validate(&unit, &attrs);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].attribute, "includes");
        assert!(diagnostics[0].message.contains("/usr/include"));
    }

    #[test]
    fn test_src_in_hdrs_is_warning() {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("a.m"), Artifact::new("shared.h")])
            .public_hdrs(vec![Artifact::new("shared.h")])
            .build();
        let diagnostics = validate(&unit, &TargetAttributes::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("both srcs and hdrs"));
    }

    #[test]
    fn test_arc_overlap_is_error() {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("dup.m")])
            .non_arc_srcs(vec![Artifact::new("dup.m")])
            .build();
        let diagnostics = validate(&unit, &TargetAttributes::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0]
            .message
            .contains("both srcs and non_arc_srcs"));
    }

    #[test]
    fn test_clean_unit_has_no_diagnostics() {
        let unit = CompilationUnit::builder()
            .srcs(vec![Artifact::new("a.m")])
            .public_hdrs(vec![Artifact::new("a.h")])
            .build();
        assert!(validate(&unit, &TargetAttributes::default()).is_empty());
    }
}
