//! # cowel-syntax
//!
//! The syntactic front end of cowel: lexing, scanning, the typed AST, and
//! the recursive-descent parser.
//!
//! ## Pipeline
//!
//! ```text
//! source ──lex──▶ tokens ──parse──▶ Vec<MarkupElement>
//! ```
//!
//! The AST borrows the source text (zero-copy) and is immutable once
//! built. Lexing and parsing are total: malformed input is reported
//! through error callbacks and marked with error tokens, but a complete
//! token sequence and a best-effort tree are always produced.
//!
//! ## Example
//!
//! ```
//! use cowel_base::FileId;
//! use cowel_syntax::parse;
//!
//! let source = "hello \\b{world}";
//! let (elements, success) = parse(source, FileId::MAIN, &mut |_, _, _| {});
//!
//! assert!(success);
//! assert_eq!(elements.len(), 2);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod scan;
pub mod token;

pub use lexer::lex;
pub use parser::parse;
pub use token::{Token, TokenKind};
