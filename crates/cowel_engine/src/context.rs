//! The evaluation context.
//!
//! A [`Context`] bundles everything one generation run owns: the call
//! stack, the section store, the macro/alias/variable tables, and the
//! embedder-provided services (file loader, logger, syntax
//! highlighter). Exactly one context exists per generation; independent
//! generations in separate threads each own their own.

use rustc_hash::FxHashMap;

use cowel_base::diag::ids;
use cowel_base::{Diagnostic, FileSpan, Logger, Severity};
use cowel_syntax::ast::Primary;

use crate::directives::{self, BuiltinDirective};
use crate::highlight::SyntaxHighlighter;
use crate::loader::FileLoader;
use crate::sections::DocumentSections;
use crate::stack::CallStack;
use crate::theme::Theme;

/// A user-defined macro: its body block and where it was defined.
#[derive(Debug, Clone, Copy)]
pub struct MacroDef<'a> {
    /// The definition body; `None` for a macro defined without a block.
    pub body: Option<&'a Primary<'a>>,
    /// The span of the defining directive, for diagnostics.
    pub definition_span: FileSpan,
}

/// The result of directive-name resolution.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Builtin(BuiltinDirective),
    Macro(MacroDef<'a>),
}

/// Everything one generation run owns.
pub struct Context<'a, 'env> {
    pub stack: CallStack<'a>,
    pub sections: DocumentSections,
    pub macros: FxHashMap<String, MacroDef<'a>>,
    /// Alias name to target name. Targets must exist at definition
    /// time, and names are never redefined, so resolution by name is
    /// stable.
    pub aliases: FxHashMap<String, String>,
    /// Variables defined during generation, for the preserved-variable
    /// capture hook.
    pub variables: FxHashMap<String, String>,
    pub loader: &'env mut dyn FileLoader,
    pub highlighter: &'env dyn SyntaxHighlighter,
    /// A user-supplied highlight theme, if any.
    pub theme: Option<Theme>,
    /// Whether recovered errors emit a visible placeholder element.
    pub emit_error_placeholders: bool,
    logger: &'env mut dyn Logger,
    min_severity: Severity,
}

impl<'a, 'env> Context<'a, 'env> {
    pub fn new(
        loader: &'env mut dyn FileLoader,
        logger: &'env mut dyn Logger,
        highlighter: &'env dyn SyntaxHighlighter,
        min_severity: Severity,
    ) -> Self {
        Self {
            stack: CallStack::new(),
            sections: DocumentSections::new(),
            macros: FxHashMap::default(),
            aliases: FxHashMap::default(),
            variables: FxHashMap::default(),
            loader,
            highlighter,
            theme: None,
            emit_error_placeholders: true,
            logger,
            min_severity,
        }
    }

    /// Resolves a directive name: macros and aliases take precedence
    /// over builtins. Alias chains are followed.
    pub fn find_directive(&self, name: &str) -> Option<Resolved<'a>> {
        let mut name = name;
        // The bound only guards against pathological alias chains;
        // definition-time checks prevent cycles.
        for _ in 0..64 {
            if let Some(def) = self.macros.get(name) {
                return Some(Resolved::Macro(*def));
            }
            match self.aliases.get(name) {
                Some(target) => name = target,
                None => return directives::builtin(name).map(Resolved::Builtin),
            }
        }
        None
    }

    /// Whether `name` is taken by a macro or an alias.
    pub fn is_user_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Emits a diagnostic if its severity passes the minimum level.
    pub fn emit(
        &mut self,
        severity: Severity,
        id: &'static str,
        location: FileSpan,
        message: String,
    ) {
        if !severity.is_emittable() || severity < self.min_severity {
            return;
        }
        if severity < self.logger.min_severity() {
            return;
        }
        self.logger.log(Diagnostic {
            severity,
            id,
            location,
            message,
        });
    }

    pub fn try_debug(&mut self, id: &'static str, location: FileSpan, message: String) {
        self.emit(Severity::Debug, id, location, message);
    }

    pub fn try_soft_warning(&mut self, id: &'static str, location: FileSpan, message: String) {
        self.emit(Severity::SoftWarning, id, location, message);
    }

    pub fn try_warning(&mut self, id: &'static str, location: FileSpan, message: String) {
        self.emit(Severity::Warning, id, location, message);
    }

    pub fn try_error(&mut self, id: &'static str, location: FileSpan, message: String) {
        self.emit(Severity::Error, id, location, message);
    }

    pub fn try_fatal(&mut self, id: &'static str, location: FileSpan, message: String) {
        self.emit(Severity::Fatal, id, location, message);
    }

    /// Reports a section-assembly error without a source location.
    pub fn try_section_error(&mut self, id: &'static str, message: String) {
        debug_assert!(id == ids::SECTION_REF_NOT_FOUND || id == ids::SECTION_REF_CIRCULAR);
        self.emit(Severity::Error, id, FileSpan::default(), message);
    }
}
