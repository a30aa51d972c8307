//! Word indexing.
//!
//! Every text node of a document is cut into alternating separator and word
//! tokens. Each word becomes a [`WordRecord`] that remembers exactly where it
//! came from, so edits computed on word sequences can be mapped back onto the
//! tree.

use std::ops::Index;

use regex::Regex;

use crate::config::Boundary;
use crate::dom::{Dom, NodeId, char_len};
use crate::error::{Error, Result};

/// Whether a token is a word or the text between words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Separator,
}

/// A slice of a text node with its character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'t> {
    pub kind: TokenKind,
    pub text: &'t str,
    pub start: usize,
    pub end: usize,
}

/// Splits text into words and separators according to a [`Boundary`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    separator: Regex,
}

impl Tokenizer {
    /// Compile a boundary rule. Custom patterns that do not compile, or that
    /// match the empty string, are rejected here so they never fail mid-build.
    pub fn new(boundary: &Boundary) -> Result<Self> {
        let pattern = match boundary {
            Boundary::Alphanumeric => r"[^\p{Alphabetic}\p{N}]+",
            Boundary::Whitespace => r"\s+",
            Boundary::Pattern(pattern) => pattern.as_str(),
        };

        let separator = Regex::new(pattern).map_err(|e| Error::InvalidBoundary {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        if separator.is_match("") {
            return Err(Error::InvalidBoundary {
                pattern: pattern.to_string(),
                reason: "pattern matches the empty string".to_string(),
            });
        }

        Ok(Self { separator })
    }

    /// Cut `text` into tokens. Kinds alternate; empty words are never produced.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Token<'t>> {
        let mut tokens = Vec::new();
        let mut byte = 0;
        let mut chars = 0;

        let mut push = |kind, slice: &'t str, chars: &mut usize| {
            let len = char_len(slice);
            tokens.push(Token {
                kind,
                text: slice,
                start: *chars,
                end: *chars + len,
            });
            *chars += len;
        };

        for found in self.separator.find_iter(text) {
            if found.start() > byte {
                push(TokenKind::Word, &text[byte..found.start()], &mut chars);
            }
            push(TokenKind::Separator, found.as_str(), &mut chars);
            byte = found.end();
        }
        if byte < text.len() {
            push(TokenKind::Word, &text[byte..], &mut chars);
        }

        tokens
    }
}

/// One indexed word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    /// Text node the word lives in
    pub node: NodeId,
    /// Comparison key (lower-cased when comparing case-insensitively)
    pub index_text: String,
    /// First character of the word in the node's original content
    pub start: usize,
    /// One past the last character of the word
    pub end: usize,
    /// Text between the previous word of the same node (or the node start) and this one
    pub separator: String,
}

/// Ordered words of one document: text nodes in preorder, left to right within a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: Vec<WordRecord>,
}

impl WordList {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordRecord> {
        self.words.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordRecord> {
        self.words.iter()
    }

    /// Comparison keys, in order.
    pub fn index_texts(&self) -> Vec<&str> {
        self.words.iter().map(|word| word.index_text.as_str()).collect()
    }

    /// Whether the words at `a` and `b` live in the same text node.
    /// Out-of-range indices never share a node.
    pub fn same_node(&self, a: usize, b: usize) -> bool {
        match (self.words.get(a), self.words.get(b)) {
            (Some(a), Some(b)) => a.node == b.node,
            _ => false,
        }
    }
}

impl Index<usize> for WordList {
    type Output = WordRecord;

    fn index(&self, index: usize) -> &WordRecord {
        &self.words[index]
    }
}

impl<'a> IntoIterator for &'a WordList {
    type Item = &'a WordRecord;
    type IntoIter = std::slice::Iter<'a, WordRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

/// Index every word of a document.
///
/// Text inside raw-text elements (`<script>`, `<style>`, ...) is not prose and
/// is skipped.
pub fn index_document(dom: &Dom, tokenizer: &Tokenizer, case_insensitive: bool) -> WordList {
    let mut words = Vec::new();

    for node in dom.text_nodes() {
        if dom.is_raw_text(node) {
            continue;
        }
        let Some(text) = dom.text(node) else {
            continue;
        };

        let mut separator = String::new();
        for token in tokenizer.split(text) {
            match token.kind {
                TokenKind::Separator => separator.push_str(token.text),
                TokenKind::Word => words.push(WordRecord {
                    node,
                    index_text: if case_insensitive {
                        token.text.to_lowercase()
                    } else {
                        token.text.to_string()
                    },
                    start: token.start,
                    end: token.end,
                    separator: std::mem::take(&mut separator),
                }),
            }
        }
    }

    trace!(count = words.len(), "indexed words");
    WordList { words }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::char_slice;

    fn tokenizer(boundary: Boundary) -> Tokenizer {
        Tokenizer::new(&boundary).unwrap()
    }

    fn index(html: &str, boundary: Boundary) -> (Dom, WordList) {
        let dom = Dom::parse(html).unwrap();
        let words = index_document(&dom, &tokenizer(boundary), true);
        (dom, words)
    }

    #[test]
    fn test_split_alternates_kinds() {
        let tokens = tokenizer(Boundary::Alphanumeric).split("  Hello, world!");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(
            kinds,
            [
                (TokenKind::Separator, "  "),
                (TokenKind::Word, "Hello"),
                (TokenKind::Separator, ", "),
                (TokenKind::Word, "world"),
                (TokenKind::Separator, "!"),
            ]
        );
    }

    #[test]
    fn test_split_offsets_are_characters() {
        let tokens = tokenizer(Boundary::Whitespace).split("café au lait");
        assert_eq!((tokens[0].start, tokens[0].end), (0, 4));
        assert_eq!((tokens[2].start, tokens[2].end), (5, 7));
    }

    #[test]
    fn test_whitespace_boundary_keeps_punctuation() {
        let texts: Vec<_> = tokenizer(Boundary::Whitespace)
            .split("Hello, world!")
            .into_iter()
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, ["Hello,", "world!"]);
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        assert!(matches!(
            Tokenizer::new(&Boundary::Pattern("(".to_string())),
            Err(Error::InvalidBoundary { .. })
        ));
        assert!(matches!(
            Tokenizer::new(&Boundary::Pattern(",*".to_string())),
            Err(Error::InvalidBoundary { .. })
        ));
        assert!(Tokenizer::new(&Boundary::Pattern("[;,]".to_string())).is_ok());
    }

    #[test]
    fn test_records_span_nodes_in_document_order() {
        let (dom, words) = index(
            "<p>The <em>quick</em> brown</p><p>Fox</p>",
            Boundary::Alphanumeric,
        );
        let keys = words.index_texts();
        assert_eq!(keys, ["the", "quick", "brown", "fox"]);
        assert_eq!(dom.text(words[1].node), Some("quick"));
        assert_eq!(words[2].separator, " ");
        assert_eq!((words[2].start, words[2].end), (1, 6));
        assert!(!words.same_node(0, 1));
        assert!(!words.same_node(3, 4));
    }

    #[test]
    fn test_case_sensitive_keys() {
        let dom = Dom::parse("<p>Hello World</p>").unwrap();
        let words = index_document(&dom, &tokenizer(Boundary::Alphanumeric), false);
        assert_eq!(words.index_texts(), ["Hello", "World"]);
    }

    #[test]
    fn test_script_and_style_are_not_indexed() {
        let (_, words) = index(
            "<style>p { color: red }</style><p>shown</p><script>var hidden = 1;</script>",
            Boundary::Alphanumeric,
        );
        assert_eq!(words.index_texts(), ["shown"]);
    }

    #[test]
    fn test_separator_resets_per_node() {
        let (_, words) = index("<p>one, </p><p>two</p>", Boundary::Alphanumeric);
        assert_eq!(words[1].separator, "");
    }

    #[test]
    fn test_records_reconstruct_node_content() {
        let (dom, words) = index(
            "<p>  Hello, <b>big</b> wide world... again</p>",
            Boundary::Alphanumeric,
        );
        for node in dom.text_nodes() {
            let content = dom.text(node).unwrap();
            let mut rebuilt = String::new();
            let mut last_end = 0;
            for word in words.iter().filter(|w| w.node == node) {
                rebuilt.push_str(&word.separator);
                rebuilt.push_str(char_slice(content, word.start, word.end));
                last_end = word.end;
            }
            rebuilt.push_str(char_slice(content, last_end, char_len(content)));
            assert_eq!(rebuilt, content);
        }
    }
}
