//! Syntax-highlighted code.

use cowel_base::diag::ids;
use cowel_base::ProcessingStatus;

use crate::context::Context;
use crate::eval;
use crate::highlight::HighlightError;
use crate::params::{
    GroupMemberMatcher, Optionality, PackUsualMatcher, SpliceableToStringMatcher,
};
use crate::policy::{ContentPolicy, OutputLanguage, SyntaxHighlightPolicy, TextSink};
use crate::stack::Invocation;

/// Adapts a content policy to the plain [`TextSink`] interface expected
/// by the highlight flush.
struct PolicySink<'x, 'p, 'a> {
    policy: &'x mut (dyn ContentPolicy<'a> + 'p),
}

impl TextSink for PolicySink<'_, '_, '_> {
    fn write(&mut self, chars: &str, language: OutputLanguage) -> bool {
        self.policy.write(chars, language)
    }
}

/// `\cowel_code(lang){content}`
pub fn splice_code<'a>(
    out: &mut dyn ContentPolicy<'a>,
    call: &Invocation<'a>,
    ctx: &mut Context<'a, '_>,
) -> ProcessingStatus {
    let mut language = SpliceableToStringMatcher::new();
    let match_status = {
        let mut parameters = [GroupMemberMatcher::new(
            "lang",
            Optionality::Optional,
            &mut language,
        )];
        PackUsualMatcher::new(&mut parameters).match_call(call, ctx, ProcessingStatus::Error)
    };
    if match_status != ProcessingStatus::Ok {
        return eval::try_generate_error(out, call.directive, ctx, match_status);
    }
    let language = language.get_or_default("");

    let mut capture = SyntaxHighlightPolicy::new();
    let status = eval::splice_all(
        &mut capture,
        call.content_elements(),
        call.content_frame,
        ctx,
    );
    if !status.is_continuable() {
        return status;
    }

    out.write("<code>", OutputLanguage::Html);
    let highlight_result = {
        let mut sink = PolicySink { policy: out };
        capture.write_highlighted(&mut sink, ctx, &language)
    };
    out.write("</code>", OutputLanguage::Html);

    // A failed highlight still emits the code, just unhighlighted; only
    // explicitly requested languages are worth a diagnostic.
    if !language.is_empty() {
        match highlight_result {
            Ok(()) => {}
            Err(HighlightError::UnsupportedLanguage) => {
                ctx.try_warning(
                    ids::HIGHLIGHT_LANGUAGE,
                    call.arguments_span,
                    format!("The language \"{language}\" is not supported."),
                );
            }
            Err(HighlightError::MalformedCode) => {
                ctx.try_warning(
                    ids::HIGHLIGHT_MALFORMED,
                    call.content_span(),
                    "The code could not be highlighted because it is malformed.".into(),
                );
            }
            Err(HighlightError::Other) => {
                ctx.try_warning(
                    ids::HIGHLIGHT_ERROR,
                    call.content_span(),
                    "Syntax highlighting failed.".into(),
                );
            }
        }
    }
    status
}
