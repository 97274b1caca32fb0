//! Driving a generation run: parse, evaluate, assemble, emit.
//!
//! [`generate_html`] is the public entry point. It parses the source,
//! builds the evaluation context, streams the root content through the
//! default policy stack (HTML writer wrapped in paragraph splitting),
//! resolves section references, and renders either a full
//! `<!DOCTYPE html>` document or the bare body (*minimal* mode).
//!
//! On a `Fatal` status the partial output is discarded; diagnostics
//! emitted before the failure are preserved.

use cowel_base::{Diagnostic, FileId, Logger, ProcessingStatus, Severity};
use cowel_syntax::parse;

use crate::context::Context;
use crate::eval;
use crate::highlight::{NoHighlighter, SyntaxHighlighter};
use crate::loader::{FileLoader, NoFileLoader};
use crate::logger::NoLogger;
use crate::policy::{ParagraphSplitPolicy, VecTextSink};
use crate::theme::Theme;

/// What kind of output a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// A complete `<!DOCTYPE html>` document with head and body.
    #[default]
    Document,
    /// The body content only, with no surrounding skeleton.
    Minimal,
}

/// Options for [`generate_html`].
pub struct GenerateOptions<'env> {
    /// The UTF-8 source text of the main document.
    pub source: &'env str,
    pub mode: GenerationMode,
    /// Diagnostics below this severity are discarded.
    pub min_log_severity: Severity,
    /// JSON for the highlight theme; empty selects the builtin theme.
    pub highlight_theme_source: &'env [u8],
    /// Variable names whose final values are captured into
    /// [`GenerateResult::variables`].
    pub preserved_variables: &'env [&'env str],
    pub loader: Option<&'env mut dyn FileLoader>,
    pub logger: Option<&'env mut dyn Logger>,
    pub highlighter: Option<&'env dyn SyntaxHighlighter>,
    /// Whether recovered errors emit a visible placeholder element.
    pub emit_error_placeholders: bool,
}

impl<'env> GenerateOptions<'env> {
    pub fn new(source: &'env str) -> Self {
        Self {
            source,
            mode: GenerationMode::Document,
            min_log_severity: Severity::Warning,
            highlight_theme_source: &[],
            preserved_variables: &[],
            loader: None,
            logger: None,
            highlighter: None,
            emit_error_placeholders: true,
        }
    }
}

/// The outcome of a generation run.
#[derive(Debug)]
pub struct GenerateResult {
    /// The most severe status encountered. On `Fatal` the output is
    /// empty.
    pub status: ProcessingStatus,
    pub output: String,
    /// Final values of the preserved variables, in request order.
    /// Variables never defined capture as empty strings.
    pub variables: Vec<(String, String)>,
}

/// Writes the standard document skeleton around pre-rendered head and
/// body content.
pub fn write_head_body_document(out: &mut String, head: &str, body: &str) {
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str(head);
    out.push_str("</head>\n<body>\n");
    out.push_str(body);
    out.push_str("</body>\n</html>\n");
}

/// Services and settings for [`run_generation`].
pub struct RunOptions<'env> {
    pub loader: &'env mut dyn FileLoader,
    pub logger: &'env mut dyn Logger,
    pub highlighter: &'env dyn SyntaxHighlighter,
    pub min_log_severity: Severity,
    pub theme: Option<Theme>,
    pub emit_error_placeholders: bool,
}

/// Creates the evaluation context for one generation run and hands it to
/// `write`. Embedders that need more control than [`generate_html`]
/// drive parsing and policies themselves inside the callback.
pub fn run_generation<'a, 'env, R>(
    options: RunOptions<'env>,
    write: impl FnOnce(&mut Context<'a, 'env>) -> R,
) -> R {
    let mut ctx = Context::new(
        options.loader,
        options.logger,
        options.highlighter,
        options.min_log_severity,
    );
    ctx.theme = options.theme;
    ctx.emit_error_placeholders = options.emit_error_placeholders;
    write(&mut ctx)
}

/// Compiles a cowel document to HTML.
pub fn generate_html(options: GenerateOptions<'_>) -> GenerateResult {
    let mut default_loader = NoFileLoader;
    let mut default_logger = NoLogger;
    let default_highlighter = NoHighlighter;

    let loader: &mut dyn FileLoader = match options.loader {
        Some(loader) => loader,
        None => &mut default_loader,
    };
    let logger: &mut dyn Logger = match options.logger {
        Some(logger) => logger,
        None => &mut default_logger,
    };
    let highlighter: &dyn SyntaxHighlighter = match options.highlighter {
        Some(highlighter) => highlighter,
        None => &default_highlighter,
    };
    let min_severity = options.min_log_severity;

    // Parse. Errors are recoverable: a best-effort tree is still
    // produced and generation continues.
    let (content, parse_success) = {
        let logger = &mut *logger;
        let mut on_error = |id: &'static str, location, message: String| {
            if Severity::Error >= min_severity && Severity::Error >= logger.min_severity() {
                logger.log(Diagnostic {
                    severity: Severity::Error,
                    id,
                    location,
                    message,
                });
            }
        };
        parse(options.source, FileId::MAIN, &mut on_error)
    };
    let status = if parse_success {
        ProcessingStatus::Ok
    } else {
        ProcessingStatus::Error
    };

    let theme = parse_theme(options.highlight_theme_source, &mut *logger, min_severity);
    let mode = options.mode;
    let preserved_variables = options.preserved_variables;

    let run_options = RunOptions {
        loader,
        logger,
        highlighter,
        min_log_severity: min_severity,
        theme,
        emit_error_placeholders: options.emit_error_placeholders,
    };

    let (status, output, variables) = run_generation(run_options, |ctx| {
        // Root content flows through the default policy stack.
        let mut body_sink = VecTextSink::new();
        let splice_status = {
            let mut policy = ParagraphSplitPolicy::new(&mut body_sink);
            eval::splice_root(&mut policy, &content, ctx)
        };
        let mut status = status.max(splice_status);

        let variables = capture_variables(ctx, preserved_variables);
        if status == ProcessingStatus::Fatal {
            return (status, String::new(), variables);
        }

        // Final assembly: the root output joins the default section,
        // then references are substituted and remaining sections
        // flattened.
        ctx.sections.make("").append_html(body_sink.as_str());
        let mut assembly_errors = Vec::new();
        let body = ctx
            .sections
            .assemble(&mut |id, message| assembly_errors.push((id, message)));
        if !assembly_errors.is_empty() {
            status = status.max(ProcessingStatus::Error);
            for (id, message) in assembly_errors {
                ctx.try_section_error(id, message);
            }
        }

        let output = match mode {
            GenerationMode::Minimal => body,
            GenerationMode::Document => {
                let head = match &ctx.theme {
                    Some(theme) if !theme.colors.is_empty() => {
                        format!("<style>\n{}</style>\n", theme.to_css())
                    }
                    _ => String::new(),
                };
                let mut document = String::new();
                write_head_body_document(&mut document, &head, &body);
                document
            }
        };
        (status, output, variables)
    });

    log::debug!(
        "generation finished with status {status:?}, {} bytes of output",
        output.len()
    );
    GenerateResult {
        status,
        output,
        variables,
    }
}

fn parse_theme(
    source: &[u8],
    logger: &mut dyn Logger,
    min_severity: Severity,
) -> Option<Theme> {
    if source.is_empty() {
        return None;
    }
    match Theme::from_json(source) {
        Ok(theme) => Some(theme),
        Err(error) => {
            if Severity::Error >= min_severity && Severity::Error >= logger.min_severity() {
                logger.log(Diagnostic {
                    severity: Severity::Error,
                    id: cowel_base::diag::ids::THEME_CONVERSION,
                    location: Default::default(),
                    message: error.to_string(),
                });
            }
            None
        }
    }
}

fn capture_variables(ctx: &Context<'_, '_>, names: &[&str]) -> Vec<(String, String)> {
    names
        .iter()
        .map(|name| {
            let value = ctx.variables.get(*name).cloned().unwrap_or_default();
            (name.to_string(), value)
        })
        .collect()
}
