//! Lightweight structural analysis of prose.
//!
//! A `Document` indexes one input text once per pass: line starts,
//! paragraphs (blank-line separated), sentences and quoted dialogue spans.
//! All ranges are byte offsets into the original text, so spans reported by
//! checks address the caller's string directly.
//!
//! Dialogue detection accepts straight (`"`) and curly (`“ ”`) double quotes
//! and single (`'…'`, `‘…’`) quotes. An unterminated double quote closes at
//! the end of its paragraph, matching the convention for multi-paragraph
//! speeches.

use crate::models::TextSpan;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\r?\n\s*").expect("paragraph regex"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9'’-]*").expect("word regex"));

const EXCERPT_CHARS: usize = 120;

pub struct Document<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
    paragraphs: Vec<Range<usize>>,
    sentences: Vec<Range<usize>>,
    quotes: Vec<Range<usize>>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let paragraphs = split_paragraphs(text);
        let sentences = paragraphs
            .iter()
            .flat_map(|p| split_sentences(text, p.clone()))
            .collect();
        let quotes = find_quotes(text, &paragraphs);
        Document {
            text,
            line_starts,
            paragraphs,
            sentences,
            quotes,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 1-based line number containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= offset)
    }

    pub fn span(&self, range: Range<usize>) -> TextSpan {
        TextSpan {
            start: range.start,
            end: range.end,
            line: self.line_of(range.start),
        }
    }

    /// Span covering the whole text; used for scene-level findings.
    pub fn whole(&self) -> TextSpan {
        self.span(0..self.text.len())
    }

    pub fn slice(&self, range: Range<usize>) -> &'a str {
        &self.text[range]
    }

    /// Byte ranges of each line, without the trailing newline.
    pub fn lines(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.line_starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .line_starts
                .get(i + 1)
                .map(|next| next - 1)
                .unwrap_or(self.text.len());
            let end = if end > start && self.text.as_bytes()[end - 1] == b'\r' {
                end - 1
            } else {
                end
            };
            start..end
        })
    }

    pub fn paragraphs(&self) -> &[Range<usize>] {
        &self.paragraphs
    }

    pub fn sentences(&self) -> &[Range<usize>] {
        &self.sentences
    }

    /// Quoted dialogue spans, quote marks included.
    pub fn quotes(&self) -> &[Range<usize>] {
        &self.quotes
    }

    pub fn in_dialogue(&self, offset: usize) -> bool {
        let i = self.quotes.partition_point(|q| q.end <= offset);
        self.quotes.get(i).is_some_and(|q| q.start <= offset)
    }

    /// Whether `range` lies entirely outside quoted dialogue.
    pub fn in_narration(&self, range: &Range<usize>) -> bool {
        !self
            .quotes
            .iter()
            .any(|q| q.start < range.end && range.start < q.end)
    }

    pub fn sentence_index(&self, offset: usize) -> usize {
        self.sentences.partition_point(|s| s.end <= offset)
    }

    pub fn paragraph_index(&self, offset: usize) -> usize {
        self.paragraphs.partition_point(|p| p.end <= offset)
    }

    pub fn sentence_containing(&self, offset: usize) -> Option<Range<usize>> {
        self.sentences.get(self.sentence_index(offset)).cloned()
    }

    pub fn paragraph_containing(&self, offset: usize) -> Option<Range<usize>> {
        self.paragraphs.get(self.paragraph_index(offset)).cloned()
    }

    /// Words in `range` with their absolute start offsets.
    pub fn words(&self, range: Range<usize>) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let base = range.start;
        WORD.find_iter(&self.text[range])
            .map(move |m| (base + m.start(), m.as_str()))
    }

    pub fn word_count(&self, range: Range<usize>) -> usize {
        WORD.find_iter(&self.text[range]).count()
    }

    /// Trimmed line around `offset`, shortened for reports.
    pub fn excerpt(&self, offset: usize) -> String {
        let line = self.line_of(offset);
        let range = self
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or(0..self.text.len());
        truncate(self.text[range].trim(), EXCERPT_CHARS)
    }
}

/// Shorten to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

fn split_paragraphs(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in PARAGRAPH_BREAK.find_iter(text) {
        if m.start() > start {
            out.push(start..m.start());
        }
        start = m.end();
    }
    if start < text.len() {
        out.push(start..text.len());
    }
    out
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '”' | '’' | '\'' | ')' | ']')
}

fn split_sentences(text: &str, para: Range<usize>) -> Vec<Range<usize>> {
    let body = &text[para.clone()];
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?' | '…') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') || is_closing(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let boundary = match chars.peek() {
            None => true,
            Some(&(_, next)) => next.is_whitespace(),
        };
        if boundary {
            out.push(para.start + start..para.start + end);
            while let Some(&(j, next)) = chars.peek() {
                if next.is_whitespace() {
                    chars.next();
                    start = j + next.len_utf8();
                } else {
                    break;
                }
            }
            if chars.peek().is_none() {
                start = body.len();
            }
        }
    }
    if start < body.len() {
        out.push(para.start + start..para.end);
    }
    out
}

/// A single quote opens at a word start and closes at a word end, so
/// apostrophes inside words ("don't", "Mira's") are left alone.
fn opens_single(prev: Option<char>, next: Option<char>) -> bool {
    prev.map_or(true, |p| !p.is_alphanumeric()) && next.is_some_and(|n| !n.is_whitespace())
}

fn closes_single(prev: Option<char>, next: Option<char>) -> bool {
    prev.is_some_and(|p| !p.is_whitespace()) && next.map_or(true, |n| !n.is_alphanumeric())
}

fn find_quotes(text: &str, paragraphs: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    for para in paragraphs {
        let chars: Vec<(usize, char)> = text[para.clone()].char_indices().collect();
        let mut double: Option<usize> = None;
        let mut single: Option<usize> = None;
        for (k, &(i, c)) in chars.iter().enumerate() {
            let at = para.start + i;
            let prev = k.checked_sub(1).map(|p| chars[p].1);
            let next = chars.get(k + 1).map(|&(_, n)| n);
            match c {
                '"' | '“' | '”' => {
                    // A double quote inside an open single quote means the
                    // single quote was an apostrophe after all.
                    single = None;
                    match (c, double.take()) {
                        ('“', Some(s)) => double = Some(s),
                        ('“', None) | ('"', None) => double = Some(at),
                        (_, Some(s)) => out.push(s..at + c.len_utf8()),
                        _ => {}
                    }
                }
                '\'' | '‘' | '’' if double.is_none() => match single {
                    Some(s) if c != '‘' && closes_single(prev, next) => {
                        out.push(s..at + c.len_utf8());
                        single = None;
                    }
                    None if c != '’' && opens_single(prev, next) => single = Some(at),
                    _ => {}
                },
                _ => {}
            }
        }
        // Unterminated single quotes are dropped: too often an elision.
        if let Some(s) = double {
            out.push(s..para.end);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers_are_one_based() {
        let doc = Document::new("alpha\nbeta\ngamma");
        assert_eq!(doc.line_of(0), 1);
        assert_eq!(doc.line_of(6), 2);
        assert_eq!(doc.line_of(11), 3);
        let lines: Vec<&str> = doc.lines().map(|r| doc.slice(r)).collect();
        assert_eq!(lines, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_sentences_split_on_terminal_punctuation() {
        let text = "She waited. \"Is that you?\" he asked. Nothing moved\n\nA new paragraph.";
        let doc = Document::new(text);
        let sentences: Vec<&str> = doc.sentences().iter().map(|r| doc.slice(r.clone())).collect();
        assert_eq!(
            sentences,
            vec![
                "She waited.",
                "\"Is that you?\"",
                "he asked.",
                "Nothing moved",
                "A new paragraph."
            ]
        );
    }

    #[test]
    fn test_quotes_straight_curly_and_unterminated() {
        let text = "Mira said, \"Go.\" Then “stay” she added.\n\n\"I never finished\nthis one\n\nNext.";
        let doc = Document::new(text);
        let quotes: Vec<&str> = doc.quotes().iter().map(|r| doc.slice(r.clone())).collect();
        assert_eq!(quotes, vec!["\"Go.\"", "“stay”", "\"I never finished\nthis one"]);
        assert!(doc.in_dialogue(text.find("Go").unwrap()));
        assert!(!doc.in_dialogue(text.find("Then").unwrap()));
        assert!(doc.in_dialogue(text.find("this one").unwrap()));
        assert!(!doc.in_dialogue(text.find("Next").unwrap()));
    }

    #[test]
    fn test_single_quotes_without_apostrophes() {
        let text = "'You should go, I think,' Mira said. Mira's cat didn't move. ‘Stay,’ she said.";
        let doc = Document::new(text);
        let quotes: Vec<&str> = doc.quotes().iter().map(|r| doc.slice(r.clone())).collect();
        assert_eq!(quotes, vec!["'You should go, I think,'", "‘Stay,’"]);
        assert!(doc.in_dialogue(text.find("You").unwrap()));
        assert!(!doc.in_dialogue(text.find("cat").unwrap()));

        let doc = Document::new("The boys' coats hung by the door. 'Tis late, she thought.");
        assert!(doc.quotes().is_empty());
    }

    #[test]
    fn test_excerpt_truncates_long_lines() {
        let long = "word ".repeat(60);
        let doc = Document::new(&long);
        let ex = doc.excerpt(10);
        assert!(ex.ends_with('…'));
        assert_eq!(ex.chars().count(), EXCERPT_CHARS + 1);
    }

    #[test]
    fn test_words_report_absolute_offsets() {
        let text = "One two, three.";
        let doc = Document::new(text);
        let words: Vec<(usize, &str)> = doc.words(4..text.len()).collect();
        assert_eq!(words, vec![(4, "two"), (9, "three")]);
    }
}
