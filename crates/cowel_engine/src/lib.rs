//! # cowel-engine
//!
//! The processing engine of the cowel markup language: everything
//! between a parsed document and its final HTML bytes.
//!
//! ## Pipeline
//!
//! ```text
//! source ──parse──▶ AST ──evaluate──▶ policies ──assemble──▶ HTML
//! ```
//!
//! - [`types`]/[`value`] — the type system and runtime values.
//! - [`stack`] — the call stack, frames, and the invocation model.
//! - [`params`] — binding call arguments to declared parameters.
//! - [`policy`] — the sink stack output flows through (HTML writing,
//!   paragraph splitting, highlight capture).
//! - [`sections`] — named, out-of-order document sections.
//! - [`directives`] — the engine's builtin directive set.
//! - [`eval`] — resolution, invocation, splicing, evaluation.
//! - [`generate`] — the [`generate_html`] entry point.
//!
//! Embedders provide three services: a [`FileLoader`], a [`Logger`]
//! (re-exported from `cowel-base`), and a [`SyntaxHighlighter`].
//!
//! ## Example
//!
//! ```
//! use cowel_engine::{generate_html, GenerateOptions, GenerationMode};
//!
//! let mut options = GenerateOptions::new("hello");
//! options.mode = GenerationMode::Minimal;
//!
//! let result = generate_html(options);
//! assert_eq!(result.output, "<p>hello</p>");
//! ```

pub mod context;
pub mod directives;
pub mod eval;
pub mod generate;
pub mod highlight;
pub mod loader;
pub mod logger;
pub mod params;
pub mod policy;
pub mod sections;
pub mod stack;
pub mod theme;
pub mod types;
pub mod value;

pub use context::{Context, MacroDef, Resolved};
pub use generate::{
    generate_html, run_generation, write_head_body_document, GenerateOptions, GenerateResult,
    GenerationMode, RunOptions,
};
pub use highlight::{HighlightError, HighlightKind, HighlightSpan, SyntaxHighlighter};
pub use loader::{FileEntry, FileLoadError, FileLoader, RelativeFileLoader};
pub use sections::DocumentSections;
pub use stack::{CallStack, FrameIndex, Invocation, StackFrame};
pub use theme::Theme;
pub use types::{Type, TypeKind};
pub use value::Value;

pub use cowel_base::{Diagnostic, Logger, MemoryLogger, ProcessingStatus, Severity};
