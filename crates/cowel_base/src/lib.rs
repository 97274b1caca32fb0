//! # cowel-base
//!
//! Pure structural atoms for the cowel ecosystem.
//!
//! This crate provides the foundational types used throughout cowel:
//!
//! - [`SourcePosition`]/[`Span`]/[`FileSpan`] — Source location tracking
//! - [`Severity`]/[`Diagnostic`]/[`Logger`] — The diagnostic channel
//! - [`ProcessingStatus`] — The five-state result of every evaluation step
//! - [`StringKind`] — ASCII/Unicode content hints carried by strings
//!
//! # Design Principles
//!
//! This crate has **no knowledge of markup syntax or I/O**. It provides
//! only generic, reusable infrastructure that higher-level crates build
//! upon.
//!
//! # Example
//!
//! ```
//! use cowel_base::{SourcePosition, Span, FileId};
//!
//! let mut pos = SourcePosition::default();
//! pos.advance("ab\nc");
//!
//! assert_eq!(pos.line, 1);
//! assert_eq!(pos.column, 1);
//! assert_eq!(pos.byte, 4);
//! assert_eq!(FileId::MAIN.0, -1);
//! ```

pub mod diag;
pub mod span;
pub mod status;
pub mod strkind;

pub use diag::{Diagnostic, Logger, MemoryLogger, Severity};
pub use span::{FileId, FileSpan, SourcePosition, Span};
pub use status::ProcessingStatus;
pub use strkind::StringKind;
