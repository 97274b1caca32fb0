//! End-to-end document generation scenarios.

use cowel_engine::{
    generate_html, GenerateOptions, GenerationMode, MemoryLogger, ProcessingStatus, Severity,
};

fn minimal(source: &str) -> (ProcessingStatus, String) {
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    let result = generate_html(options);
    (result.status, result.output)
}

fn minimal_ok(source: &str) -> String {
    let (status, output) = minimal(source);
    assert_eq!(status, ProcessingStatus::Ok);
    output
}

#[test]
fn empty_document() {
    let result = generate_html(GenerateOptions::new(""));
    assert_eq!(result.status, ProcessingStatus::Ok);
    assert_eq!(
        result.output,
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         </head>\n\
         <body>\n\
         </body>\n\
         </html>\n"
    );
}

#[test]
fn text_only_minimal() {
    assert_eq!(minimal_ok("hello"), "<p>hello</p>");
}

#[test]
fn escapes_yield_the_escaped_character() {
    assert_eq!(minimal_ok("\\{x\\}"), "<p>{x}</p>");
}

#[test]
fn line_comment_is_removed() {
    assert_eq!(minimal_ok("\\: this is ignored\nrest"), "<p>rest</p>");
}

#[test]
fn blank_lines_split_paragraphs() {
    assert_eq!(minimal_ok("a\n\nb"), "<p>a</p><p>b</p>");
}

#[test]
fn text_is_html_escaped() {
    assert_eq!(minimal_ok("1 < 2 & 3"), "<p>1 &lt; 2 &amp; 3</p>");
}

#[test]
fn unknown_directive_logs_and_emits_placeholder() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("\\nosuch");
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(result.output.contains("<error->"));
    assert!(result.output.contains("</error->"));
    assert!(logger.was_logged("directive-lookup.unresolved"));
}

#[test]
fn error_placeholders_can_be_disabled() {
    let mut options = GenerateOptions::new("\\nosuch");
    options.mode = GenerationMode::Minimal;
    options.emit_error_placeholders = false;
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(!result.output.contains("<error->"));
}

#[test]
fn parse_errors_are_recoverable() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("\\x{unclosed");
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(logger.was_logged("parse.block.unclosed"));
}

#[test]
fn diagnostics_below_minimum_severity_are_discarded() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("\\nosuch");
    options.mode = GenerationMode::Minimal;
    options.min_log_severity = Severity::None;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    // The error still affects the status, it is just not logged.
    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn macro_expansion_substitutes_the_body() {
    let source = "\\cowel_macro(greet){hi}\\greet";
    assert_eq!(minimal_ok(source), "hi");
}

#[test]
fn macro_put_inserts_call_content() {
    let source = "\\cowel_macro(boxed){[\\cowel_put]}\\boxed{X}";
    assert_eq!(minimal_ok(source), "[X]");
}

#[test]
fn macro_put_selects_positional_arguments() {
    let source = "\\cowel_macro(second){\\cowel_put(1)}\\second(a, b, c)";
    assert_eq!(minimal_ok(source), "b");
}

#[test]
fn macro_put_selects_named_arguments() {
    let source = "\\cowel_macro(pick){\\cowel_put(key)}\\pick(key = chosen)";
    assert_eq!(minimal_ok(source), "chosen");
}

#[test]
fn macro_put_out_of_range_is_reported() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let source = "\\cowel_macro(second){\\cowel_put(5)}\\second(a)";
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(logger.was_logged("macro:put.out-of-range"));
}

#[test]
fn invalid_macro_name_is_reported() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let source = "\\cowel_macro(\"not a name\"){x}";
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(logger.was_logged("macro:name.invalid"));
}

#[test]
fn macro_redefinition_is_reported() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let source = "\\cowel_macro(m){a}\\cowel_macro(m){b}\\m";
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert!(logger.was_logged("macro:redefinition"));
    // The first definition stays in effect.
    assert!(result.output.contains('a'));
}

#[test]
fn ellipsis_forwards_macro_arguments_through_invoke() {
    let source = "\\cowel_macro(wrap){\\cowel_invoke(cowel_var_let, ...)}\
                  \\wrap(captured, value = it-worked)";
    let mut options = GenerateOptions::new(source);
    options.mode = GenerationMode::Minimal;
    options.preserved_variables = &["captured"];
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Ok);
    assert_eq!(
        result.variables,
        [("captured".to_string(), "it-worked".to_string())]
    );
}

#[test]
fn aliases_resolve_to_their_target() {
    let source = "\\cowel_macro(m){hi}\\cowel_alias(m2){m}\\m2";
    assert_eq!(minimal_ok(source), "hi");
}

#[test]
fn alias_to_unknown_target_is_fatal() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("\\cowel_alias(x){nosuchtarget}after");
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Fatal);
    // Fatal discards the partial output.
    assert_eq!(result.output, "");
    assert!(logger.was_logged("alias:name.invalid"));
}

#[test]
fn variables_are_captured_at_end_of_generation() {
    let mut options = GenerateOptions::new("\\cowel_var_let(x, 42)");
    options.mode = GenerationMode::Minimal;
    options.preserved_variables = &["x", "never_defined"];
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Ok);
    assert_eq!(
        result.variables,
        [
            ("x".to_string(), "42".to_string()),
            ("never_defined".to_string(), String::new()),
        ]
    );
}

#[test]
fn sections_compose_out_of_order() {
    let source = "a\\cowel_there(notes){N}b\\cowel_here(notes)c";
    assert_eq!(minimal_ok(source), "<p>abNc</p>");
}

#[test]
fn section_content_can_be_written_after_the_reference() {
    let source = "-\\cowel_here(late)\\cowel_there(late){content}";
    assert_eq!(minimal_ok(source), "<p>-content</p>");
}

#[test]
fn unreferenced_sections_are_appended() {
    let source = "body\\cowel_there(extra){tail}";
    assert_eq!(minimal_ok(source), "<p>body</p>tail");
}

#[test]
fn reference_to_missing_section_is_reported() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("\\cowel_here(ghost)");
    options.mode = GenerationMode::Minimal;
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Error);
    assert!(logger.was_logged("section-ref.not-found"));
}

#[test]
fn paragraphs_directive_inherits_splitting() {
    let source = "\\cowel_paragraphs{a\n\nb}";
    assert_eq!(minimal_ok(source), "<p>a</p><p>b</p>");
}

#[test]
fn paragraph_enter_and_leave_control_boundaries() {
    let source = "\\cowel_paragraph_enter x\\cowel_paragraph_leave";
    assert_eq!(minimal_ok(source), "<p> x</p>");
}

#[test]
fn user_theme_emits_a_style_block() {
    let mut options = GenerateOptions::new("");
    options.highlight_theme_source = br##"{"colors": {"kw": "#00f"}}"##;
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Ok);
    assert!(result.output.contains("<style>"));
    assert!(result.output.contains("h-[data-h=\"kw\"]{color:#00f}"));
}

#[test]
fn malformed_theme_is_reported() {
    let mut logger = MemoryLogger::new(Severity::Trace);
    let mut options = GenerateOptions::new("");
    options.highlight_theme_source = b"{broken";
    options.logger = Some(&mut logger);
    let result = generate_html(options);

    assert_eq!(result.status, ProcessingStatus::Ok);
    assert!(logger.was_logged("theme.conversion"));
}
