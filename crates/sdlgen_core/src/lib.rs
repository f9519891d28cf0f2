//! Core utilities for sdlgen.
//!
//! This crate provides foundational types shared by every layer:
//! - `span`: Source location tracking and line/column lookup
//! - `text`: String interning for schema names
//! - `diagnostics`: Error reporting used by the parser

pub mod diagnostics;
pub mod span;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::{LineIndex, Span};
pub use text::{Interner, Text};
