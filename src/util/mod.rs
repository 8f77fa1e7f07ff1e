//! Shared utilities

pub mod diagnostic;
pub mod intern;

pub use diagnostic::{Diagnostic, Severity};
pub use intern::Symbol;
