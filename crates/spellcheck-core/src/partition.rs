//! Range partitioning.
//!
//! Before a raw edited or newly-exposed range can be queued for checking it is
//! (1) snapped outward to word boundaries, (2) split by dictionary assignment,
//! and (3) split into highlighting-eligibility runs. The output ranges cover
//! the input with no gaps and no overlaps, and never cut through a word.

use unicode_segmentation::UnicodeSegmentation;

use crate::collaborators::{CheckContext, DictionaryMap, Document, HighlightSource};
use crate::position::{DocRange, Position};

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Word-boundary candidates for a line, as char columns.
///
/// Base boundaries come from Unicode word segmentation; a boundary inside a
/// contraction ("isn't") is then rejected: a candidate directly preceded or
/// followed by an apostrophe sitting between letters is not a boundary.
fn line_boundaries(line_text: &str) -> Vec<usize> {
    let chars: Vec<char> = line_text.chars().collect();
    let mut boundaries = Vec::new();

    let mut col = 0;
    for (_, segment) in line_text.split_word_bound_indices() {
        boundaries.push(col);
        col += segment.chars().count();
    }
    boundaries.push(col);

    boundaries.retain(|&b| !splits_contraction(&chars, b));
    boundaries
}

fn splits_contraction(chars: &[char], b: usize) -> bool {
    if b == 0 || b >= chars.len() {
        return false;
    }
    let prev = chars[b - 1];
    let cur = chars[b];
    // Boundary right before the apostrophe of letter'letter.
    if is_apostrophe(cur)
        && prev.is_alphabetic()
        && chars.get(b + 1).is_some_and(|c| c.is_alphabetic())
    {
        return true;
    }
    // Boundary right after the apostrophe of letter'letter.
    if is_apostrophe(prev)
        && cur.is_alphabetic()
        && b >= 2
        && chars[b - 2].is_alphabetic()
    {
        return true;
    }
    false
}

/// Snap `range` outward to the nearest word boundaries.
///
/// The start is extended backward within its line and the end forward within
/// its line; words never span lines. Contractions are kept whole, so a range
/// anchored inside `isn't` comes back covering all five characters.
pub fn find_word_boundaries(document: &dyn Document, range: DocRange) -> DocRange {
    let start = {
        let line = range.start.line;
        let text = document.line_text(line).unwrap_or_default();
        let col = range.start.column.min(text.chars().count());
        let column = line_boundaries(&text)
            .into_iter()
            .filter(|&b| b <= col)
            .next_back()
            .unwrap_or(0);
        Position::new(line, column)
    };

    let end = {
        let line = range.end.line;
        let text = document.line_text(line).unwrap_or_default();
        let len = text.chars().count();
        let col = range.end.column.min(len);
        let column = line_boundaries(&text)
            .into_iter()
            .find(|&b| b >= col)
            .unwrap_or(len);
        Position::new(line, column)
    };

    DocRange::new(start.min(end), start.max(end))
}

/// Split `range` by dictionary assignment.
///
/// Declared dictionary ranges win over the default where they intersect; the
/// rest falls to the default dictionary. The result is ordered by start and
/// covers `range` exactly, with no gaps or overlaps.
pub fn partition_by_dictionary(
    dictionaries: &dyn DictionaryMap,
    range: DocRange,
) -> Vec<(DocRange, String)> {
    let default = dictionaries.default_dictionary();
    let declared = dictionaries.dictionary_ranges();

    let mut out: Vec<(DocRange, String)> = Vec::new();
    let mut pending = vec![range];

    while let Some(current) = pending.pop() {
        if current.is_empty() {
            continue;
        }
        let hit = declared
            .iter()
            .find_map(|(r, dict)| current.intersect(r).map(|i| (i, dict.clone())));

        match hit {
            Some((intersection, dict)) => {
                // Set difference of `current` minus the intersection: at most a
                // head piece and a tail piece go back on the work list.
                if current.start < intersection.start {
                    pending.push(DocRange::new(current.start, intersection.start));
                }
                if intersection.end < current.end {
                    pending.push(DocRange::new(intersection.end, current.end));
                }
                out.push((intersection, dict));
            }
            None => out.push((current, default.clone())),
        }
    }

    out.sort_by(|a, b| a.0.start.cmp(&b.0.start));
    out
}

/// Split `range` into spellcheck-eligible runs, trimming whitespace and
/// control characters off each run's edges.
///
/// Atomic tokens (`atom_len > 1`) are consumed whole and always count as
/// eligible. Lines the highlighter reports via
/// [`HighlightSource::is_empty_line`] are skipped whole while no run is open.
/// With `stop_after_first` the walk ends at the first emitted run.
pub fn partition_by_eligibility(
    document: &dyn Document,
    highlight: &dyn HighlightSource,
    range: DocRange,
    dictionary: &str,
    stop_after_first: bool,
) -> Vec<(DocRange, String)> {
    let mut out = Vec::new();
    let mut run_start: Option<Position> = None;
    let mut pos = range.start;

    while pos < range.end {
        if run_start.is_none() && pos.column == 0 && highlight.is_empty_line(pos.line) {
            // Nothing checkable anywhere on the line; skip it wholesale
            // instead of classifying every column.
            pos = Position::new(pos.line + 1, 0);
            continue;
        }

        let line_len = document.line_length(pos.line);
        if pos.column >= line_len {
            // A line break continues the current run; the backend sees it as
            // plain whitespace in the decoded text.
            pos = Position::new(pos.line + 1, 0);
            continue;
        }

        let token = highlight.token_at(pos);
        let atom_len = token.atom_len.max(1);
        let eligible = atom_len > 1 || highlight.eligible_for_check(token.attribute);

        if eligible {
            run_start.get_or_insert(pos);
        } else if let Some(start) = run_start.take() {
            if emit_trimmed(document, start, pos, dictionary, &mut out) && stop_after_first {
                return out;
            }
        }

        pos.column = (pos.column + atom_len).min(line_len);
    }

    if let Some(start) = run_start {
        emit_trimmed(document, start, range.end, dictionary, &mut out);
        if stop_after_first {
            out.truncate(1);
        }
    }
    out
}

/// Full partition of an already word-aligned range: dictionary first, then
/// eligibility within each dictionary piece. Results are ordered by start.
pub fn partition(ctx: &CheckContext<'_>, range: DocRange) -> Vec<(DocRange, String)> {
    let mut out = Vec::new();
    for (piece, dictionary) in partition_by_dictionary(ctx.dictionaries, range) {
        out.extend(partition_by_eligibility(
            ctx.document,
            ctx.highlight,
            piece,
            &dictionary,
            false,
        ));
    }
    out
}

fn emit_trimmed(
    document: &dyn Document,
    start: Position,
    end: Position,
    dictionary: &str,
    out: &mut Vec<(DocRange, String)>,
) -> bool {
    let Some(trimmed) = trim_run(document, DocRange::new(start, end)) else {
        return false;
    };
    out.push((trimmed, dictionary.to_string()));
    true
}

fn is_trimmable(c: Option<char>) -> bool {
    // `None` is a line-end position: whitespace as far as words go.
    match c {
        None => true,
        Some(c) => c.is_whitespace() || c.is_control(),
    }
}

fn trim_run(document: &dyn Document, run: DocRange) -> Option<DocRange> {
    let mut start = run.start;
    let mut end = run.end;

    while start < end {
        if !is_trimmable(document.char_at(start)) {
            break;
        }
        start = if start.column < document.line_length(start.line) {
            Position::new(start.line, start.column + 1)
        } else {
            Position::new(start.line + 1, 0)
        };
    }

    while start < end {
        let prev = if end.column > 0 {
            Position::new(end.line, end.column - 1)
        } else {
            let prev_line = end.line - 1;
            Position::new(prev_line, document.line_length(prev_line))
        };
        if !is_trimmable(document.char_at(prev)) {
            break;
        }
        end = prev;
    }

    (start < end).then(|| DocRange::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        AttributeId, HighlightToken, PlainTextEligibility, StaticDictionaryMap,
    };
    use crate::document::BufferDocument;

    #[test]
    fn test_word_boundaries_simple_word() {
        let doc = BufferDocument::new("one two three");
        let r = find_word_boundaries(&doc, DocRange::from_coords(0, 5, 0, 6));
        assert_eq!(r, DocRange::from_coords(0, 4, 0, 7));
    }

    #[test]
    fn test_word_boundaries_contraction_kept_whole() {
        let doc = BufferDocument::new("He isn't there");
        // Anchored inside "isn't", both on the 'n' and on the 't'.
        for col in 3..=8 {
            let r =
                find_word_boundaries(&doc, DocRange::from_coords(0, col, 0, col));
            assert!(
                r.start.column >= 3 && r.end.column <= 8,
                "col {col} escaped the contraction: {r}"
            );
        }
        let r = find_word_boundaries(&doc, DocRange::from_coords(0, 4, 0, 7));
        assert_eq!(r, DocRange::from_coords(0, 3, 0, 8));
    }

    #[test]
    fn test_word_boundaries_typographic_apostrophe() {
        let doc = BufferDocument::new("it\u{2019}s fine");
        let r = find_word_boundaries(&doc, DocRange::from_coords(0, 1, 0, 2));
        assert_eq!(r, DocRange::from_coords(0, 0, 0, 4));
    }

    #[test]
    fn test_word_boundaries_trailing_apostrophe_is_boundary() {
        // The trailing apostrophe of "players'" is not letter'letter.
        let doc = BufferDocument::new("the players' room");
        let r = find_word_boundaries(&doc, DocRange::from_coords(0, 5, 0, 6));
        assert_eq!(r, DocRange::from_coords(0, 4, 0, 11));
    }

    #[test]
    fn test_word_boundaries_whole_edit_range() {
        let doc = BufferDocument::new("alpha beta gamma");
        let r = find_word_boundaries(&doc, DocRange::from_coords(0, 2, 0, 12));
        assert_eq!(r, DocRange::from_coords(0, 0, 0, 16));
    }

    #[test]
    fn test_dictionary_partition_coverage() {
        let map = StaticDictionaryMap::new("de")
            .with_range(DocRange::from_coords(0, 0, 0, 5), "en")
            .with_range(DocRange::from_coords(0, 10, 0, 15), "fr");

        let parts = partition_by_dictionary(&map, DocRange::from_coords(0, 0, 0, 15));
        assert_eq!(
            parts,
            vec![
                (DocRange::from_coords(0, 0, 0, 5), "en".to_string()),
                (DocRange::from_coords(0, 5, 0, 10), "de".to_string()),
                (DocRange::from_coords(0, 10, 0, 15), "fr".to_string()),
            ]
        );
    }

    #[test]
    fn test_dictionary_partition_no_declared_ranges() {
        let map = StaticDictionaryMap::new("en");
        let parts = partition_by_dictionary(&map, DocRange::from_coords(0, 2, 1, 3));
        assert_eq!(
            parts,
            vec![(DocRange::from_coords(0, 2, 1, 3), "en".to_string())]
        );
    }

    /// Attribute 1 is eligible prose, attribute 0 ineligible code; columns are
    /// classified by a per-line mask string ('p' = prose, anything else code).
    struct MaskHighlight {
        masks: Vec<&'static str>,
    }

    impl HighlightSource for MaskHighlight {
        fn token_at(&self, pos: Position) -> HighlightToken {
            let eligible = self
                .masks
                .get(pos.line)
                .and_then(|m| m.chars().nth(pos.column))
                .is_some_and(|c| c == 'p');
            HighlightToken::single(if eligible { 1 } else { 0 })
        }

        fn eligible_for_check(&self, attribute: AttributeId) -> bool {
            attribute == 1
        }
    }

    #[test]
    fn test_eligibility_runs_split_and_trim() {
        let doc = BufferDocument::new("abc def ghi");
        // Columns 0..5 prose, 5..8 code, 8..11 prose.
        let mask = MaskHighlight {
            masks: vec!["pppppcccppp"],
        };
        let runs = partition_by_eligibility(
            &doc,
            &mask,
            DocRange::from_coords(0, 0, 0, 11),
            "en",
            false,
        );
        // Interior whitespace stays; only run edges are trimmed.
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].0, DocRange::from_coords(0, 0, 0, 5));
        assert_eq!(runs[1].0, DocRange::from_coords(0, 8, 0, 11));
    }

    #[test]
    fn test_eligibility_trims_whitespace_edges() {
        let doc = BufferDocument::new("  word  ");
        let runs = partition_by_eligibility(
            &doc,
            &PlainTextEligibility,
            DocRange::from_coords(0, 0, 0, 8),
            "en",
            false,
        );
        assert_eq!(runs, vec![(DocRange::from_coords(0, 2, 0, 6), "en".to_string())]);
    }

    #[test]
    fn test_eligibility_stop_after_first() {
        let doc = BufferDocument::new("abc def");
        let mask = MaskHighlight {
            masks: vec!["pppcppp"],
        };
        let runs = partition_by_eligibility(
            &doc,
            &mask,
            DocRange::from_coords(0, 0, 0, 7),
            "en",
            true,
        );
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, DocRange::from_coords(0, 0, 0, 3));
    }

    /// Columns 2..5 form one atomic token with an ineligible attribute.
    struct AtomicHighlight;

    impl HighlightSource for AtomicHighlight {
        fn token_at(&self, pos: Position) -> HighlightToken {
            if pos.line == 0 && pos.column == 2 {
                HighlightToken {
                    attribute: 0,
                    atom_len: 3,
                }
            } else {
                HighlightToken::single(1)
            }
        }

        fn eligible_for_check(&self, attribute: AttributeId) -> bool {
            attribute == 1
        }
    }

    #[test]
    fn test_atomic_token_is_always_eligible() {
        let doc = BufferDocument::new("abXYZcd");
        let runs = partition_by_eligibility(
            &doc,
            &AtomicHighlight,
            DocRange::from_coords(0, 0, 0, 7),
            "en",
            false,
        );
        // The atomic token does not break the run even though its attribute
        // is not eligible on its own.
        assert_eq!(runs, vec![(DocRange::from_coords(0, 0, 0, 7), "en".to_string())]);
    }

    /// Everything eligible token-wise, but line 1 is declared to hold nothing
    /// checkable.
    struct EmptyLineHighlight;

    impl HighlightSource for EmptyLineHighlight {
        fn token_at(&self, _pos: Position) -> HighlightToken {
            HighlightToken::single(1)
        }

        fn eligible_for_check(&self, attribute: AttributeId) -> bool {
            attribute == 1
        }

        fn is_empty_line(&self, line: usize) -> bool {
            line == 1
        }
    }

    #[test]
    fn test_empty_line_is_skipped_when_no_run_is_open() {
        let doc = BufferDocument::new("abc\ndef\nghi");
        let runs = partition_by_eligibility(
            &doc,
            &EmptyLineHighlight,
            DocRange::from_coords(1, 0, 2, 3),
            "en",
            false,
        );
        // The line-level verdict overrides the per-token one: line 1 never
        // opens a run and the output starts on line 2.
        assert_eq!(runs, vec![(DocRange::from_coords(2, 0, 2, 3), "en".to_string())]);
    }

    #[test]
    fn test_run_spans_lines() {
        let doc = BufferDocument::new("one\ntwo");
        let runs = partition_by_eligibility(
            &doc,
            &PlainTextEligibility,
            DocRange::from_coords(0, 0, 1, 3),
            "en",
            false,
        );
        assert_eq!(runs, vec![(DocRange::from_coords(0, 0, 1, 3), "en".to_string())]);
    }

    #[test]
    fn test_empty_after_trim_emits_nothing() {
        let doc = BufferDocument::new("   ");
        let runs = partition_by_eligibility(
            &doc,
            &PlainTextEligibility,
            DocRange::from_coords(0, 0, 0, 3),
            "en",
            false,
        );
        assert!(runs.is_empty());
    }
}
