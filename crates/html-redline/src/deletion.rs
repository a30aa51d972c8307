//! Deletion wrapper: removed words stay in place, wrapped in a marker.

use crate::dom::{Dom, NodeId};
use crate::script::DeletionRun;
use crate::surgery::FragmentMap;
use crate::words::WordList;

/// Wrap the words of `run` in `tag` elements, one wrapper per stretch of
/// words sharing a text node. Nothing is removed from the document.
pub fn apply(dom: &mut Dom, fragments: &mut FragmentMap, words: &WordList, run: &DeletionRun, tag: &str) {
    for (node, start, end) in node_spans(words, run.a_start, run.a_end) {
        fragments.modify_range(dom, node, start, end, |dom, fragment| {
            let marker = dom.create_element(tag);
            dom.append_child(marker, fragment);
            marker
        });
    }
}

/// Group words `first..=last` by owning node: `(node, first word start, last word end)`.
fn node_spans(words: &WordList, first: usize, last: usize) -> Vec<(NodeId, usize, usize)> {
    let mut spans: Vec<(NodeId, usize, usize)> = Vec::new();
    for index in first..=last {
        let word = &words[index];
        match spans.last_mut() {
            Some((node, _, end)) if *node == word.node => *end = word.end,
            _ => spans.push((word.node, word.start, word.end)),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Boundary;
    use crate::script::EditKind;
    use crate::words::{Tokenizer, index_document};

    fn delete(html: &str, a_start: usize, a_end: usize) -> String {
        let mut dom = Dom::parse(html).unwrap();
        let tokenizer = Tokenizer::new(&Boundary::Alphanumeric).unwrap();
        let words = index_document(&dom, &tokenizer, true);
        let run = DeletionRun {
            a_start,
            a_end,
            prev: EditKind::Match,
            next: EditKind::Match,
        };
        let mut fragments = FragmentMap::new();
        apply(&mut dom, &mut fragments, &words, &run, "del");
        let body = dom.find_element("body").unwrap();
        dom.children(body)
            .iter()
            .map(|&child| dom.node_to_html(child))
            .collect()
    }

    #[test]
    fn test_separators_inside_a_run_are_covered() {
        assert_eq!(
            delete("<p>keep these three words</p>", 1, 2),
            "<p>keep <del>these three</del> words</p>"
        );
    }

    #[test]
    fn test_run_across_nodes_wraps_each_node() {
        assert_eq!(
            delete("<p>a <b>bold</b> tail end</p>", 1, 2),
            "<p>a <b><del>bold</del></b> <del>tail</del> end</p>"
        );
    }

    #[test]
    fn test_node_spans_group_consecutive_words() {
        let dom = Dom::parse("<p>one two</p><p>three</p>").unwrap();
        let tokenizer = Tokenizer::new(&Boundary::Alphanumeric).unwrap();
        let words = index_document(&dom, &tokenizer, true);
        let spans = node_spans(&words, 0, 2);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].1, spans[0].2), (0, 7));
        assert_eq!((spans[1].1, spans[1].2), (0, 5));
    }
}
