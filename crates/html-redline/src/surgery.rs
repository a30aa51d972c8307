//! DOM surgery.
//!
//! Word offsets always refer to the content a text node had when it was
//! indexed. Once a node has been split, the pieces live on as *fragments*;
//! [`FragmentMap`] remembers them so later edits can still be addressed in
//! original offsets. Inserted content is linked in among the fragments but
//! marked *foreign*, so it never counts towards those offsets.

use std::collections::{HashMap, HashSet};

use crate::dom::{Dom, NodeId, char_len};

/// Live fragments of every text node touched during one build.
#[derive(Debug, Default)]
pub struct FragmentMap {
    fragments: HashMap<NodeId, Vec<NodeId>>,
    foreign: HashSet<NodeId>,
}

impl FragmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragments of `node` in document order, including foreign content
    /// spliced between them. A node that was never split is its own only
    /// fragment.
    pub fn fragments(&self, node: NodeId) -> Vec<NodeId> {
        self.fragments
            .get(&node)
            .cloned()
            .unwrap_or_else(|| vec![node])
    }

    /// Whether `id` was spliced in rather than cut from an original node.
    pub fn is_foreign(&self, id: NodeId) -> bool {
        self.foreign.contains(&id)
    }

    /// Apply `transform` to the content of `node` between the original
    /// character offsets `start` and `end`.
    ///
    /// Fragments straddling a boundary are split first, so `transform` only
    /// ever sees fragments that lie entirely inside the range. If it returns
    /// a different, unlinked node, that node takes the fragment's former place.
    pub fn modify_range<F>(&mut self, dom: &mut Dom, node: NodeId, start: usize, end: usize, mut transform: F)
    where
        F: FnMut(&mut Dom, NodeId) -> NodeId,
    {
        let mut updated = Vec::new();
        let mut pos = 0;

        for fragment in self.fragments(node) {
            if self.is_foreign(fragment) {
                updated.push(fragment);
                continue;
            }

            let len = char_len(&dom.text_content(fragment));
            let (fragment_start, fragment_end) = (pos, pos + len);
            pos = fragment_end;

            // Cut the fragment wherever a range boundary falls strictly inside it
            let mut pieces = Vec::with_capacity(3);
            let mut current = fragment;
            let mut current_start = fragment_start;
            for cut in [start, end] {
                if cut > current_start && cut < fragment_end {
                    assert!(
                        dom.is_text(current),
                        "cannot split non-text fragment {current} of {node} at {cut}"
                    );
                    let tail = dom.split_text(current, cut - current_start);
                    pieces.push((current, current_start, cut));
                    current = tail;
                    current_start = cut;
                }
            }
            pieces.push((current, current_start, fragment_end));

            for (piece, piece_start, piece_end) in pieces {
                if piece_start < piece_end && piece_start >= start && piece_end <= end {
                    let parent = dom.parent(piece);
                    let index = dom.child_index(piece);
                    let replacement = transform(dom, piece);
                    if replacement != piece
                        && dom.parent(replacement).is_none()
                        && let (Some(parent), Some(index)) = (parent, index)
                    {
                        dom.insert_at(parent, index, replacement);
                    }
                    updated.push(replacement);
                } else {
                    updated.push(piece);
                }
            }
        }

        trace!(%node, start, end, fragments = updated.len(), "modified range");
        self.fragments.insert(node, updated);
    }

    /// Link `content` into `node` at the original character offset `offset`.
    ///
    /// Content lands after anything spliced at the same offset earlier, and
    /// after the last fragment when `offset` is at (or past) the end.
    pub fn splice(&mut self, dom: &mut Dom, node: NodeId, offset: usize, content: &[NodeId]) {
        if content.is_empty() {
            return;
        }

        let mut fragments = self.fragments(node);
        let mut before = None;
        let mut pos = 0;

        for (index, &fragment) in fragments.iter().enumerate() {
            if self.is_foreign(fragment) {
                continue;
            }
            if pos >= offset {
                before = Some((index, None));
                break;
            }
            let len = char_len(&dom.text_content(fragment));
            if offset < pos + len {
                before = Some((index, Some(offset - pos)));
                break;
            }
            pos += len;
        }

        let before = before.map(|(index, split)| match split {
            Some(at) => {
                let fragment = fragments[index];
                assert!(
                    dom.is_text(fragment),
                    "cannot split non-text fragment {fragment} of {node} at {offset}"
                );
                let tail = dom.split_text(fragment, at);
                fragments.insert(index + 1, tail);
                index + 1
            }
            None => index,
        });

        match before {
            Some(index) => {
                let reference = fragments[index];
                for &item in content {
                    dom.insert_before(reference, item);
                }
                fragments.splice(index..index, content.iter().copied());
            }
            None => {
                let mut reference = fragments[fragments.len() - 1];
                for &item in content {
                    dom.insert_after(reference, item);
                    reference = item;
                }
                fragments.extend_from_slice(content);
            }
        }

        self.foreign.extend(content.iter().copied());
        trace!(%node, offset, items = content.len(), "spliced content");
        self.fragments.insert(node, fragments);
    }

    /// Link `content` right after `anchor`, past any foreign content already
    /// placed there.
    pub fn place_after(&mut self, dom: &mut Dom, anchor: NodeId, content: &[NodeId]) {
        // A split text node continues up to its last fragment
        let mut reference = self
            .fragments
            .get(&anchor)
            .and_then(|fragments| fragments.last().copied())
            .unwrap_or(anchor);

        while let Some(next) = next_sibling(dom, reference)
            && self.is_foreign(next)
        {
            reference = next;
        }

        for &item in content {
            dom.insert_after(reference, item);
            reference = item;
        }
        self.foreign.extend(content.iter().copied());
    }

    /// Link `content` right before `anchor`.
    pub fn place_before(&mut self, dom: &mut Dom, anchor: NodeId, content: &[NodeId]) {
        let reference = self
            .fragments
            .get(&anchor)
            .and_then(|fragments| fragments.first().copied())
            .unwrap_or(anchor);

        for &item in content {
            dom.insert_before(reference, item);
        }
        self.foreign.extend(content.iter().copied());
    }

    /// Append `content` to `parent`.
    pub fn append(&mut self, dom: &mut Dom, parent: NodeId, content: &[NodeId]) {
        for &item in content {
            dom.append_child(parent, item);
        }
        self.foreign.extend(content.iter().copied());
    }
}

fn next_sibling(dom: &Dom, id: NodeId) -> Option<NodeId> {
    let parent = dom.parent(id)?;
    let index = dom.child_index(id)?;
    dom.children(parent).get(index + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(html: &str) -> (Dom, NodeId, NodeId) {
        let dom = Dom::parse(html).unwrap();
        let p = dom.find_element("p").unwrap();
        let text = dom.children(p)[0];
        (dom, p, text)
    }

    fn wrap_in(tag: &'static str) -> impl FnMut(&mut Dom, NodeId) -> NodeId {
        move |dom, fragment| {
            let wrapper = dom.create_element(tag);
            dom.append_child(wrapper, fragment);
            wrapper
        }
    }

    #[test]
    fn test_modify_range_splits_and_wraps() {
        let (mut dom, p, text) = paragraph("<p>the cat sat</p>");
        let mut map = FragmentMap::new();
        map.modify_range(&mut dom, text, 4, 7, wrap_in("del"));
        assert_eq!(dom.node_to_html(p), "<p>the <del>cat</del> sat</p>");
        assert_eq!(map.fragments(text).len(), 3);
    }

    #[test]
    fn test_offsets_stay_original_after_splits() {
        let (mut dom, p, text) = paragraph("<p>one two three</p>");
        let mut map = FragmentMap::new();
        map.modify_range(&mut dom, text, 4, 7, wrap_in("del"));
        map.modify_range(&mut dom, text, 8, 13, wrap_in("del"));
        map.modify_range(&mut dom, text, 0, 3, wrap_in("del"));
        assert_eq!(
            dom.node_to_html(p),
            "<p><del>one</del> <del>two</del> <del>three</del></p>"
        );
    }

    #[test]
    fn test_whole_node_range_is_not_split() {
        let (mut dom, p, text) = paragraph("<p>gone</p>");
        let mut map = FragmentMap::new();
        map.modify_range(&mut dom, text, 0, 4, wrap_in("del"));
        assert_eq!(dom.node_to_html(p), "<p><del>gone</del></p>");
        assert_eq!(dom.children(p).len(), 1);
    }

    #[test]
    fn test_splice_content_is_foreign() {
        let (mut dom, p, text) = paragraph("<p>red apple</p>");
        let mut map = FragmentMap::new();
        let ins = dom.create_element("ins");
        let green = dom.create_text("green");
        dom.append_child(ins, green);

        map.splice(&mut dom, text, 3, &[ins]);
        assert!(map.is_foreign(ins));
        map.modify_range(&mut dom, text, 0, 3, wrap_in("del"));
        assert_eq!(
            dom.node_to_html(p),
            "<p><del>red</del><ins>green</ins> apple</p>"
        );
    }

    #[test]
    fn test_splice_at_same_offset_keeps_order() {
        let (mut dom, p, text) = paragraph("<p>ab</p>");
        let mut map = FragmentMap::new();
        let first = dom.create_text("1");
        let second = dom.create_text("2");
        map.splice(&mut dom, text, 1, &[first]);
        map.splice(&mut dom, text, 1, &[second]);
        assert_eq!(dom.node_to_html(p), "<p>a12b</p>");
    }

    #[test]
    fn test_splice_at_end_appends_after_earlier_content() {
        let (mut dom, p, text) = paragraph("<p>ab</p>");
        let mut map = FragmentMap::new();
        let first = dom.create_text("1");
        let second = dom.create_text("2");
        map.splice(&mut dom, text, 2, &[first]);
        map.splice(&mut dom, text, 2, &[second]);
        assert_eq!(dom.node_to_html(p), "<p>ab12</p>");
    }

    #[test]
    fn test_place_after_skips_placed_content() {
        let mut dom = Dom::parse("<ul><li>one</li><li>four</li></ul>").unwrap();
        let ul = dom.find_element("ul").unwrap();
        let (one, four) = (dom.children(ul)[0], dom.children(ul)[1]);
        let mut map = FragmentMap::new();

        let two = dom.create_element("li");
        let three = dom.create_element("li");
        map.place_after(&mut dom, one, &[two]);
        map.place_after(&mut dom, one, &[three]);
        assert_eq!(dom.children(ul), [one, two, three, four]);
    }

    #[test]
    fn test_place_after_split_text_goes_after_last_fragment() {
        let (mut dom, p, text) = paragraph("<p>one two</p>");
        let mut map = FragmentMap::new();
        map.modify_range(&mut dom, text, 0, 3, wrap_in("del"));
        let extra = dom.create_text("!");
        map.place_after(&mut dom, text, &[extra]);
        assert_eq!(dom.node_to_html(p), "<p><del>one</del> two!</p>");
    }

    #[test]
    fn test_place_before_and_append() {
        let (mut dom, p, text) = paragraph("<p>x</p>");
        let mut map = FragmentMap::new();
        let before = dom.create_text("<");
        let after = dom.create_text(">");
        map.place_before(&mut dom, text, &[before]);
        map.append(&mut dom, p, &[after]);
        assert_eq!(dom.node_to_html(p), "<p>&lt;x&gt;</p>");
    }
}
