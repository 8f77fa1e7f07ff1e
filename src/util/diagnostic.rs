//! Attribute-scoped diagnostics for unit validation.
//!
//! Configuration problems are attached to the logical attribute they were
//! found on (`includes`, `srcs`, ...) and collected, so a caller sees every
//! problem for a unit at once instead of failing on the first.

use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic tied to a unit attribute.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The attribute the problem was found on (e.g. "srcs", "includes")
    pub attribute: &'static str,
    /// Severity level
    pub severity: Severity,
    /// Primary message
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic for an attribute.
    pub fn error(attribute: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            attribute,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic for an attribute.
    pub fn warning(attribute: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            attribute,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: in attribute '{}': {}",
            self.severity, self.attribute, self.message
        )
    }
}

/// True if any diagnostic in the slice is a hard error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_attribute() {
        let d = Diagnostic::error("includes", "the path '/usr/include' is absolute");
        let s = d.to_string();
        assert!(s.starts_with("error: in attribute 'includes'"));
        assert!(s.contains("/usr/include"));
    }

    #[test]
    fn test_has_errors() {
        let warn = Diagnostic::warning("srcs", "file is in both srcs and hdrs");
        assert!(!has_errors(&[warn.clone()]));
        let err = Diagnostic::error("srcs", "conflict");
        assert!(has_errors(&[warn, err]));
    }
}
