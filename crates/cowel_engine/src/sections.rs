//! Named document sections and out-of-order composition.
//!
//! A section is a named buffer of generated HTML. Directives may
//! redirect their output into a section, and may emit *references* to a
//! section into the normal output stream; during final assembly every
//! reference is substituted by the referenced section's accumulated
//! content.
//!
//! Sections are kept in insertion order; the empty name denotes the
//! default section, which always exists and holds the root output.
//!
//! ## Reference encoding
//!
//! A reference is a single code point in the Supplementary Private Use
//! Area-A whose offset from the block's first code point encodes the
//! length of the section name in UTF-8 code units, followed by the name
//! itself. Names longer than the encodable maximum cannot be referenced.

use rustc_hash::{FxHashMap, FxHashSet};

use cowel_base::diag::ids;

/// First code point of the reference block (Supplementary PUA-A).
const REFERENCE_BLOCK_MIN: u32 = 0xF0000;
/// Last code point of the reference block.
const REFERENCE_BLOCK_MAX: u32 = 0xFFFFD;

/// The longest section name, in UTF-8 code units, that a reference can
/// encode.
pub const MAX_REFERENCE_NAME_LENGTH: usize = (REFERENCE_BLOCK_MAX - REFERENCE_BLOCK_MIN) as usize;

/// Appends a section reference for `name` to `out`.
///
/// Returns `false` (and appends nothing) if the name is too long to be
/// encoded.
pub fn reference_section(out: &mut String, name: &str) -> bool {
    if name.len() > MAX_REFERENCE_NAME_LENGTH {
        return false;
    }
    let Some(marker) = char::from_u32(REFERENCE_BLOCK_MIN + name.len() as u32) else {
        return false;
    };
    out.push(marker);
    out.push_str(name);
    true
}

/// The accumulated output of one section.
#[derive(Debug, Default)]
pub struct SectionContent {
    data: String,
}

impl SectionContent {
    pub fn text(&self) -> &str {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends already-generated HTML.
    pub fn append_html(&mut self, html: &str) {
        self.data.push_str(html);
    }
}

/// The section store: an insertion-ordered map from name to content,
/// with a current-section pointer.
#[derive(Debug)]
pub struct DocumentSections {
    entries: Vec<(String, SectionContent)>,
    by_name: FxHashMap<String, usize>,
    current: usize,
}

impl Default for DocumentSections {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSections {
    /// Creates the store with the default (empty-named) section current.
    pub fn new() -> Self {
        let mut by_name = FxHashMap::default();
        by_name.insert(String::new(), 0);
        Self {
            entries: vec![(String::new(), SectionContent::default())],
            by_name,
            current: 0,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the section named `name`, if it exists. No allocation.
    pub fn find(&self, name: &str) -> Option<&SectionContent> {
        self.index_of(name).map(|i| &self.entries[i].1)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SectionContent> {
        self.index_of(name).map(|i| &mut self.entries[i].1)
    }

    /// Returns the section named `name`, creating it if absent.
    pub fn make(&mut self, name: &str) -> &mut SectionContent {
        let index = self.make_index(name);
        &mut self.entries[index].1
    }

    fn make_index(&mut self, name: &str) -> usize {
        if let Some(index) = self.index_of(name) {
            return index;
        }
        let index = self.entries.len();
        self.entries.push((name.to_string(), SectionContent::default()));
        self.by_name.insert(name.to_string(), index);
        index
    }

    /// Makes `name` current if it already exists; returns whether it
    /// does. No allocation.
    pub fn try_go_to(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Makes `name` current, creating the section if absent.
    pub fn go_to(&mut self, name: &str) -> &mut SectionContent {
        let index = self.make_index(name);
        self.current = index;
        &mut self.entries[index].1
    }

    /// Like [`DocumentSections::go_to`], but returns a guard that
    /// restores the previously current section when dropped.
    ///
    /// Useful for temporarily writing content to a different section.
    pub fn go_to_scoped(&mut self, name: &str) -> ScopedSection<'_> {
        let previous = self.current;
        self.go_to(name);
        ScopedSection {
            sections: self,
            previous,
        }
    }

    pub fn current(&self) -> &SectionContent {
        &self.entries[self.current].1
    }

    pub fn current_mut(&mut self) -> &mut SectionContent {
        &mut self.entries[self.current].1
    }

    pub fn current_name(&self) -> &str {
        &self.entries[self.current].0
    }

    /// The current section's index, for explicit save/restore in code
    /// that cannot hold the scoped guard across other borrows.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn set_current_index(&mut self, index: usize) {
        debug_assert!(index < self.entries.len());
        self.current = index;
    }

    /// Section names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Resolves all section references in the default section and
    /// appends any unreferenced, non-empty sections in insertion order.
    ///
    /// Unknown references and reference cycles are reported through
    /// `on_error` with the `section-ref` diagnostic ids and substitute
    /// nothing.
    pub fn assemble(&self, on_error: &mut dyn FnMut(&'static str, String)) -> String {
        let mut out = String::new();
        let mut consumed = FxHashSet::default();
        let mut visiting = vec![String::new()];
        self.resolve_into(
            &mut out,
            self.entries[0].1.text(),
            &mut visiting,
            &mut consumed,
            on_error,
        );

        for (name, content) in &self.entries[1..] {
            if consumed.contains(name.as_str()) || content.is_empty() {
                continue;
            }
            let mut visiting = vec![String::new(), name.clone()];
            self.resolve_into(&mut out, content.text(), &mut visiting, &mut consumed, on_error);
        }
        out
    }

    fn resolve_into(
        &self,
        out: &mut String,
        text: &str,
        visiting: &mut Vec<String>,
        consumed: &mut FxHashSet<String>,
        on_error: &mut dyn FnMut(&'static str, String),
    ) {
        let mut rest = text;
        while let Some((offset, marker)) = rest
            .char_indices()
            .find(|(_, c)| (REFERENCE_BLOCK_MIN..=REFERENCE_BLOCK_MAX).contains(&(*c as u32)))
        {
            out.push_str(&rest[..offset]);
            let name_begin = offset + marker.len_utf8();
            let name_length = marker as u32 as usize - REFERENCE_BLOCK_MIN as usize;
            let Some(name) = rest.get(name_begin..name_begin + name_length) else {
                on_error(
                    ids::SECTION_REF_NOT_FOUND,
                    "Malformed section reference.".into(),
                );
                rest = &rest[name_begin..];
                continue;
            };
            rest = &rest[name_begin + name_length..];

            if visiting.iter().any(|v| v == name) {
                on_error(
                    ids::SECTION_REF_CIRCULAR,
                    format!("Reference to section \"{name}\" is circular."),
                );
                continue;
            }
            let Some(content) = self.find(name) else {
                on_error(
                    ids::SECTION_REF_NOT_FOUND,
                    format!("Reference to unknown section \"{name}\"."),
                );
                continue;
            };
            consumed.insert(name.to_string());
            visiting.push(name.to_string());
            self.resolve_into(out, content.text(), visiting, consumed, on_error);
            visiting.pop();
        }
        out.push_str(rest);
    }
}

/// Restores the previously current section on drop.
pub struct ScopedSection<'s> {
    sections: &'s mut DocumentSections,
    previous: usize,
}

impl ScopedSection<'_> {
    pub fn current_mut(&mut self) -> &mut SectionContent {
        self.sections.current_mut()
    }
}

impl Drop for ScopedSection<'_> {
    fn drop(&mut self) {
        self.sections.current = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_errors() -> impl FnMut(&'static str, String) {
        |id, message| panic!("unexpected section error [{id}]: {message}")
    }

    #[test]
    fn default_section_exists_and_is_current() {
        let sections = DocumentSections::new();
        assert_eq!(sections.current_name(), "");
        assert!(sections.find("").is_some());
        assert!(sections.find("x").is_none());
    }

    #[test]
    fn scoped_go_to_restores_current() {
        let mut sections = DocumentSections::new();
        {
            let mut scope = sections.go_to_scoped("x");
            scope.current_mut().append_html("1");
        }
        // The current section is restored; writes now go elsewhere.
        sections.current_mut().append_html("2");
        assert_eq!(sections.current().text(), "2");
        assert_eq!(sections.find("x").unwrap().text(), "1");
    }

    #[test]
    fn try_go_to_does_not_insert() {
        let mut sections = DocumentSections::new();
        assert!(!sections.try_go_to("missing"));
        assert!(sections.find("missing").is_none());
        sections.make("present");
        assert!(sections.try_go_to("present"));
        assert_eq!(sections.current_name(), "present");
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut sections = DocumentSections::new();
        sections.make("b");
        sections.make("a");
        sections.make("b");
        let names: Vec<&str> = sections.names().collect();
        assert_eq!(names, ["", "b", "a"]);
    }

    #[test]
    fn reference_roundtrip() {
        let mut sections = DocumentSections::new();
        sections.make("notes").append_html("<p>note</p>");

        let mut root = String::from("before ");
        assert!(reference_section(&mut root, "notes"));
        root.push_str(" after");
        sections.make("").append_html(&root);

        let html = sections.assemble(&mut no_errors());
        assert_eq!(html, "before <p>note</p> after");
    }

    #[test]
    fn nested_references_resolve() {
        let mut sections = DocumentSections::new();
        let mut outer = String::new();
        assert!(reference_section(&mut outer, "inner"));
        sections.make("outer").append_html(&outer);
        sections.make("inner").append_html("x");

        let mut root = String::new();
        assert!(reference_section(&mut root, "outer"));
        sections.make("").append_html(&root);

        assert_eq!(sections.assemble(&mut no_errors()), "x");
    }

    #[test]
    fn unknown_reference_reports_and_substitutes_nothing() {
        let mut sections = DocumentSections::new();
        let mut root = String::from("a");
        assert!(reference_section(&mut root, "ghost"));
        root.push('b');
        sections.make("").append_html(&root);

        let mut seen = Vec::new();
        let html = sections.assemble(&mut |id, _| seen.push(id));
        assert_eq!(html, "ab");
        assert_eq!(seen, [ids::SECTION_REF_NOT_FOUND]);
    }

    #[test]
    fn circular_reference_reports() {
        let mut sections = DocumentSections::new();
        let mut a = String::new();
        assert!(reference_section(&mut a, "b"));
        sections.make("a").append_html(&a);
        let mut b = String::new();
        assert!(reference_section(&mut b, "a"));
        sections.make("b").append_html(&b);

        let mut root = String::new();
        assert!(reference_section(&mut root, "a"));
        sections.make("").append_html(&root);

        let mut seen = Vec::new();
        sections.assemble(&mut |id, _| seen.push(id));
        assert_eq!(seen, [ids::SECTION_REF_CIRCULAR]);
    }

    #[test]
    fn unreferenced_sections_flatten_in_insertion_order() {
        let mut sections = DocumentSections::new();
        sections.make("").append_html("root.");
        sections.make("x").append_html("first.");
        sections.make("y").append_html("second.");
        assert_eq!(sections.assemble(&mut no_errors()), "root.first.second.");
    }

    #[test]
    fn oversized_names_cannot_be_referenced() {
        let long_name = "x".repeat(MAX_REFERENCE_NAME_LENGTH + 1);
        let mut out = String::new();
        assert!(!reference_section(&mut out, &long_name));
        assert!(out.is_empty());
    }
}
