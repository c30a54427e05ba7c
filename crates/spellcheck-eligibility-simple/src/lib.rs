//! `spellcheck-eligibility-simple` - Simple (regex-based) eligibility classification for
//! `spellcheck-core`.
//!
//! This crate is intended for hosts without a real highlighter: a handful of
//! regex rules mark spans (comments, string literals, inline code, URLs) with
//! attributes, and each attribute is either eligible for checking or not.
//! It is *not* intended to be a full parser.

use regex::Regex;
use spellcheck_core::{AttributeId, Document, HighlightSource, HighlightToken, Position};
use std::collections::HashMap;

/// A single regex eligibility rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    attribute: AttributeId,
    eligible: bool,
    capture_group: Option<usize>,
}

impl RegexRule {
    /// Create a rule marking every match of `pattern` with `attribute`.
    pub fn new(pattern: &str, attribute: AttributeId, eligible: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            attribute,
            eligible,
            capture_group: None,
        })
    }

    /// Mark only a capture group of each match.
    ///
    /// Example (line comment body):
    /// - pattern: `//\s*(.*)$`
    /// - capture_group: `1` (the comment text, without the marker)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// The attribute this rule assigns.
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }
}

/// A regex-based eligibility classifier.
///
/// Run [`RegexClassifier::classify`] after each document change to get a
/// [`ClassifiedSource`] snapshot usable as the engine's [`HighlightSource`].
#[derive(Debug, Clone)]
pub struct RegexClassifier {
    rules: Vec<RegexRule>,
    default_eligible: bool,
}

impl RegexClassifier {
    /// Create a classifier. Text matched by no rule carries [`ATTR_PLAIN`]
    /// and is eligible iff `default_eligible`.
    pub fn new(rules: Vec<RegexRule>, default_eligible: bool) -> Self {
        Self {
            rules,
            default_eligible,
        }
    }

    /// The configured rules.
    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    /// Run all rules over `doc` and return a position-queryable snapshot.
    pub fn classify(&self, doc: &dyn Document) -> ClassifiedSource {
        let mut lines = Vec::with_capacity(doc.line_count());
        for line in 0..doc.line_count() {
            let mut spans = Vec::new();
            if let Some(text) = doc.line_text(line) {
                for rule in &self.rules {
                    if let Some(group) = rule.capture_group {
                        for caps in rule.regex.captures_iter(&text) {
                            let Some(m) = caps.get(group) else {
                                continue;
                            };
                            if let Some(span) =
                                span_from_match(&text, m.start(), m.end(), rule.attribute)
                            {
                                spans.push(span);
                            }
                        }
                    } else {
                        for m in rule.regex.find_iter(&text) {
                            if let Some(span) =
                                span_from_match(&text, m.start(), m.end(), rule.attribute)
                            {
                                spans.push(span);
                            }
                        }
                    }
                }
            }
            // `token_at` takes the first covering span, so where matches
            // overlap the earliest-starting one answers; ties keep rule
            // order through the stable sort.
            spans.sort_by_key(|s| s.start_col);
            lines.push(spans);
        }

        let mut eligibility = HashMap::new();
        for rule in &self.rules {
            eligibility.entry(rule.attribute).or_insert(rule.eligible);
        }

        ClassifiedSource {
            lines,
            eligibility,
            default_eligible: self.default_eligible,
        }
    }

    /// A small default grammar for source code: line comments and string
    /// literals checkable, everything else skipped.
    pub fn source_code_default() -> Result<Self, regex::Error> {
        Ok(Self::new(
            vec![
                // Line comment body: //... or #...
                RegexRule::new(r#"(?://|\#)\s*(.*)$"#, ATTR_COMMENT, true)?.with_capture_group(1),
                // String literal (single-line, handles escapes)
                RegexRule::new(r#""(?:\\.|[^"\\])*""#, ATTR_STRING, true)?,
            ],
            false,
        ))
    }

    /// A small default grammar for markup: inline code and bare URLs skipped,
    /// everything else checkable.
    pub fn markup_default() -> Result<Self, regex::Error> {
        Ok(Self::new(
            vec![
                // Inline code span: `...`
                RegexRule::new(r#"`[^`]*`"#, ATTR_CODE, false)?,
                // Bare URL
                RegexRule::new(r#"https?://\S+"#, ATTR_URL, false)?,
            ],
            true,
        ))
    }
}

/// Attribute constants assigned by the default grammars.
///
/// These are only identifiers. The engine never interprets them beyond the
/// eligibility mapping this crate supplies.
pub const ATTR_PLAIN: AttributeId = 0;
pub const ATTR_COMMENT: AttributeId = 0x0100_0001;
pub const ATTR_STRING: AttributeId = 0x0100_0002;
pub const ATTR_CODE: AttributeId = 0x0100_0003;
pub const ATTR_URL: AttributeId = 0x0100_0004;

#[derive(Debug, Clone, Copy)]
struct AttrSpan {
    start_col: usize,
    end_col: usize,
    attribute: AttributeId,
}

/// A classification snapshot, queryable by document position.
///
/// Re-run [`RegexClassifier::classify`] after the document changes; a stale
/// snapshot answers for the text it was built from.
#[derive(Debug, Clone)]
pub struct ClassifiedSource {
    lines: Vec<Vec<AttrSpan>>,
    eligibility: HashMap<AttributeId, bool>,
    default_eligible: bool,
}

impl HighlightSource for ClassifiedSource {
    fn token_at(&self, pos: Position) -> HighlightToken {
        let attribute = self
            .lines
            .get(pos.line)
            .and_then(|spans| {
                spans
                    .iter()
                    .find(|s| s.start_col <= pos.column && pos.column < s.end_col)
            })
            .map_or(ATTR_PLAIN, |s| s.attribute);
        HighlightToken::single(attribute)
    }

    fn eligible_for_check(&self, attribute: AttributeId) -> bool {
        self.eligibility
            .get(&attribute)
            .copied()
            .unwrap_or(self.default_eligible)
    }

    fn is_empty_line(&self, line: usize) -> bool {
        if self.default_eligible {
            return false;
        }
        self.lines.get(line).is_some_and(Vec::is_empty)
    }
}

fn span_from_match(
    line_text: &str,
    match_start_byte: usize,
    match_end_byte: usize,
    attribute: AttributeId,
) -> Option<AttrSpan> {
    if match_start_byte >= match_end_byte || match_end_byte > line_text.len() {
        return None;
    }

    let start_col = line_text[..match_start_byte].chars().count();
    let end_col = line_text[..match_end_byte].chars().count();
    if start_col >= end_col {
        return None;
    }

    Some(AttrSpan {
        start_col,
        end_col,
        attribute,
    })
}
