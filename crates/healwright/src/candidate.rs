//! Candidate selector lists for a logical field name.
//!
//! A field such as `"username"` is expanded into an ordered list of
//! Playwright selectors, most specific first:
//!
//! ```text
//! text="username"                       visible text
//! [name="username"]                     name attribute
//! #username                             id (or [id="..."] for non-identifiers)
//! [placeholder*="username" i]           placeholder, case-insensitive
//! input[type="text"][id*="username"]    typed inputs by partial id
//! input[type="password"][id*="username"]
//! input[type="email"][id*="username"]
//! textarea[name="username"]
//! [data-testid*="username"]             test id, partial
//! ```
//!
//! An empty field yields a generic baseline list instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input types probed by the typed-input candidates, in order
pub const TYPED_INPUTS: [InputType; 3] = [InputType::Text, InputType::Password, InputType::Email];

/// `type` attribute of an `<input>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// `type="text"`
    Text,
    /// `type="password"`
    Password,
    /// `type="email"`
    Email,
}

impl InputType {
    /// Attribute value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Email => "email",
        }
    }
}

/// Strategy a candidate uses to find the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "input_type")]
pub enum CandidateKind {
    /// Exact visible text
    Text,
    /// `name` attribute
    Name,
    /// `id` attribute
    Id,
    /// `placeholder` attribute, substring, case-insensitive
    Placeholder,
    /// `<input>` of a given type with an id containing the field
    TypedInput(InputType),
    /// `<textarea>` by name
    TextareaName,
    /// `data-testid` attribute, substring
    TestId,
}

impl CandidateKind {
    /// Short label used in logs and reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Name => "name",
            Self::Id => "id",
            Self::Placeholder => "placeholder",
            Self::TypedInput(InputType::Text) => "input-text",
            Self::TypedInput(InputType::Password) => "input-password",
            Self::TypedInput(InputType::Email) => "input-email",
            Self::TextareaName => "textarea",
            Self::TestId => "test-id",
        }
    }
}

/// One lookup expression for a field
///
/// An empty `value` renders the generic form of the kind (no attribute
/// filter), which is how the baseline list is expressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Lookup strategy
    pub kind: CandidateKind,
    /// Field text the strategy matches against
    pub value: String,
}

impl Candidate {
    /// Create a candidate
    #[must_use]
    pub fn new(kind: CandidateKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Render as a Playwright selector string
    #[must_use]
    pub fn selector(&self) -> String {
        let generic = self.value.is_empty();
        let v = || escape_attr(&self.value);
        match self.kind {
            CandidateKind::Text => format!("text=\"{}\"", escape_text(&self.value)),
            CandidateKind::Name => format!("[name=\"{}\"]", v()),
            CandidateKind::Id if is_css_identifier(&self.value) => format!("#{}", self.value),
            CandidateKind::Id => format!("[id=\"{}\"]", v()),
            CandidateKind::Placeholder => format!("[placeholder*=\"{}\" i]", v()),
            CandidateKind::TypedInput(t) if generic => format!("input[type=\"{}\"]", t.as_str()),
            CandidateKind::TypedInput(t) => format!("input[type=\"{}\"][id*=\"{}\"]", t.as_str(), v()),
            CandidateKind::TextareaName if generic => "textarea".to_string(),
            CandidateKind::TextareaName => format!("textarea[name=\"{}\"]", v()),
            CandidateKind::TestId if generic => "[data-testid]".to_string(),
            CandidateKind::TestId => format!("[data-testid*=\"{}\"]", v()),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

/// Ordered, non-empty candidate list for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    field: String,
    candidates: Vec<Candidate>,
}

impl CandidateList {
    /// Field the list was built for (trimmed)
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false for lists produced by [`build_candidates`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// True when the list is the generic baseline for an empty field
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.field.is_empty()
    }

    /// Iterate candidates in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Candidate at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Rendered selectors in priority order
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        self.candidates.iter().map(Candidate::selector).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Build the ordered candidate list for `field`
///
/// Pure and deterministic. Never returns an empty list: a blank field
/// produces the generic baseline (text, password and email inputs, any
/// textarea, any element with a test id).
#[must_use]
pub fn build_candidates(field: &str) -> CandidateList {
    let field = field.trim();
    if field.is_empty() {
        return baseline();
    }

    let mut candidates = Vec::with_capacity(9);
    candidates.push(Candidate::new(CandidateKind::Text, field));
    candidates.push(Candidate::new(CandidateKind::Name, field));
    candidates.push(Candidate::new(CandidateKind::Id, field));
    candidates.push(Candidate::new(CandidateKind::Placeholder, field));
    for input in TYPED_INPUTS {
        candidates.push(Candidate::new(CandidateKind::TypedInput(input), field));
    }
    candidates.push(Candidate::new(CandidateKind::TextareaName, field));
    candidates.push(Candidate::new(CandidateKind::TestId, field));

    CandidateList {
        field: field.to_string(),
        candidates,
    }
}

fn baseline() -> CandidateList {
    let mut candidates: Vec<Candidate> = TYPED_INPUTS
        .iter()
        .map(|&t| Candidate::new(CandidateKind::TypedInput(t), ""))
        .collect();
    candidates.push(Candidate::new(CandidateKind::TextareaName, ""));
    candidates.push(Candidate::new(CandidateKind::TestId, ""));
    CandidateList {
        field: String::new(),
        candidates,
    }
}

/// Escape a value for a double-quoted CSS attribute string
///
/// Line breaks use CSS hex escapes (`\A `, `\D `).
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\A "),
            '\r' => out.push_str("\\D "),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value for Playwright's quoted `text="..."` engine
///
/// The text engine reads the body as a JSON-style string, so line breaks
/// are `\n`/`\r` rather than CSS hex escapes.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Whether `value` can follow `#` in a CSS selector without escaping
#[must_use]
pub fn is_css_identifier(value: &str) -> bool {
    let mut chars = value.chars().peekable();
    match chars.next() {
        Some('-') => match chars.peek() {
            Some(&c) => (c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()) && all_name_chars(chars),
            None => false,
        },
        Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => all_name_chars(chars),
        _ => false,
    }
}

fn all_name_chars(mut chars: impl Iterator<Item = char>) -> bool {
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod ordering_tests {
        use super::*;

        #[test]
        fn test_username_full_order() {
            let list = build_candidates("username");
            assert_eq!(
                list.selectors(),
                vec![
                    r#"text="username""#,
                    r#"[name="username"]"#,
                    "#username",
                    r#"[placeholder*="username" i]"#,
                    r#"input[type="text"][id*="username"]"#,
                    r#"input[type="password"][id*="username"]"#,
                    r#"input[type="email"][id*="username"]"#,
                    r#"textarea[name="username"]"#,
                    r#"[data-testid*="username"]"#,
                ]
            );
        }

        #[test]
        fn test_text_first_test_id_last() {
            let list = build_candidates("Email Address");
            assert_eq!(list.get(0).unwrap().kind, CandidateKind::Text);
            assert_eq!(list.iter().last().unwrap().kind, CandidateKind::TestId);
        }

        #[test]
        fn test_field_is_trimmed() {
            assert_eq!(build_candidates("  password ").field(), "password");
        }
    }

    mod baseline_tests {
        use super::*;

        #[test]
        fn test_empty_field_yields_baseline() {
            let list = build_candidates("");
            assert!(list.is_baseline());
            assert_eq!(
                list.selectors(),
                vec![
                    r#"input[type="text"]"#,
                    r#"input[type="password"]"#,
                    r#"input[type="email"]"#,
                    "textarea",
                    "[data-testid]",
                ]
            );
        }

        #[test]
        fn test_whitespace_field_yields_baseline() {
            assert_eq!(build_candidates(" \t "), build_candidates(""));
        }
    }

    mod escaping_tests {
        use super::*;

        #[test]
        fn test_quotes_are_escaped() {
            let list = build_candidates(r#"say "hi""#);
            assert_eq!(list.get(1).unwrap().selector(), r#"[name="say \"hi\""]"#);
        }

        #[test]
        fn test_line_breaks_escaped_per_engine() {
            let text = Candidate::new(CandidateKind::Text, "Sign\nin");
            assert_eq!(text.selector(), r#"text="Sign\nin""#);
            let name = Candidate::new(CandidateKind::Name, "Sign\nin");
            assert_eq!(name.selector(), r#"[name="Sign\A in"]"#);
            let placeholder = Candidate::new(CandidateKind::Placeholder, "a\rb");
            assert_eq!(placeholder.selector(), r#"[placeholder*="a\D b" i]"#);
        }

        #[test]
        fn test_text_engine_escapes_quotes_and_backslashes() {
            assert_eq!(escape_text(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
            assert_eq!(escape_text("tab\there"), r"tab\there");
        }

        #[test]
        fn test_non_identifier_id_uses_attribute_form() {
            let list = build_candidates("First Name");
            assert_eq!(list.get(2).unwrap().selector(), r#"[id="First Name"]"#);
            let list = build_candidates("2fa");
            assert_eq!(list.get(2).unwrap().selector(), r#"[id="2fa"]"#);
        }

        #[test]
        fn test_css_identifier_rules() {
            assert!(is_css_identifier("login-button"));
            assert!(is_css_identifier("_private"));
            assert!(is_css_identifier("-webkit"));
            assert!(!is_css_identifier("-"));
            assert!(!is_css_identifier("-1"));
            assert!(!is_css_identifier("a.b"));
            assert!(!is_css_identifier(""));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_never_empty(field in ".{0,40}") {
                prop_assert!(!build_candidates(&field).is_empty());
            }

            #[test]
            fn prop_deterministic(field in ".{0,40}") {
                prop_assert_eq!(build_candidates(&field), build_candidates(&field));
            }

            #[test]
            fn prop_non_blank_has_nine(field in "[a-zA-Z][a-zA-Z0-9 _-]{0,20}") {
                prop_assert_eq!(build_candidates(&field).len(), 9);
            }
        }
    }
}
