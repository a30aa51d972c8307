//! Insertion materializer.
//!
//! An insertion run names a range of words in the revised document. To show
//! them in the original, the smallest subtree of the revised document that
//! holds both boundary words is copied into the original's arena, cut down to
//! exactly the inserted words, marked, and given a place to go.

use crate::config::DiffConfig;
use crate::dom::{Dom, NodeId, char_len, char_slice};
use crate::script::{EditKind, InsertionRun};
use crate::surgery::FragmentMap;
use crate::words::WordList;

/// Where prepared content goes in the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Inside an original text node, at a character offset of its original content
    Text { node: NodeId, offset: usize },
    /// Right after a node
    After(NodeId),
    /// Right before a node
    Before(NodeId),
    /// At the end of a container
    Append(NodeId),
}

/// Marked content, detached in the original's arena, plus its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInsertion {
    pub content: Vec<NodeId>,
    pub target: Target,
}

impl PreparedInsertion {
    /// Link the content into the document.
    pub fn apply(&self, dom: &mut Dom, fragments: &mut FragmentMap) {
        match self.target {
            Target::Text { node, offset } => fragments.splice(dom, node, offset, &self.content),
            Target::After(anchor) => fragments.place_after(dom, anchor, &self.content),
            Target::Before(anchor) => fragments.place_before(dom, anchor, &self.content),
            Target::Append(parent) => fragments.append(dom, parent, &self.content),
        }
    }
}

/// Read-only view of one build's inputs, used to prepare insertions.
pub struct Materializer<'a> {
    pub original_words: &'a WordList,
    pub revised: &'a Dom,
    pub revised_words: &'a WordList,
    pub config: &'a DiffConfig,
}

impl Materializer<'_> {
    /// Build the content for one insertion run inside `original`'s arena.
    ///
    /// Only detached nodes are created; `original`'s tree is left untouched,
    /// so every run can be prepared before any of them is applied.
    pub fn prepare(&self, original: &mut Dom, run: &InsertionRun) -> PreparedInsertion {
        let revised = self.revised;
        let words = self.revised_words;
        let start_word = &words[run.b_start];
        let end_word = &words[run.b_end];

        let cca = common_ancestor(revised, start_word.node, end_word.node);
        let start_path = child_path(revised, cca, start_word.node);
        let end_path = child_path(revised, cca, end_word.node);

        let root = original.import(revised, cca);
        let start_node = follow(original, root, &start_path);
        let end_node = follow(original, root, &end_path);

        prune_preceding(original, root, start_node);
        prune_following(original, root, end_node);

        // End first: when both words share a node, its start offset stays valid
        trim(original, end_node, 0, end_word.end);
        let len = original.text(start_node).map_or(0, char_len);
        trim(original, start_node, start_word.start, len);

        let separator = self.separator_before(run.b_start);
        if run.prev != EditKind::Deletion && run.b_start > 0 && !separator.is_empty() {
            let text = format!("{separator}{}", original.text(start_node).unwrap_or_default());
            original.set_text(start_node, text);
        }
        if run.anchor.is_none() && words.same_node(run.b_end, run.b_end + 1) {
            let next = &words[run.b_end + 1];
            let text = format!("{}{}", original.text(end_node).unwrap_or_default(), next.separator);
            original.set_text(end_node, text);
        }

        let touches_start = run.b_start == 0 || !words.same_node(run.b_start - 1, run.b_start);
        let touches_end = !words.same_node(run.b_end, run.b_end + 1);
        let whole = touches_start && touches_end;

        // The copied subtree belongs to the run alone when no neighbouring word lives in it
        let owned = [run.b_start.checked_sub(1), Some(run.b_end + 1)]
            .into_iter()
            .flatten()
            .filter_map(|index| words.get(index))
            .all(|word| !revised.ancestors(word.node).any(|ancestor| ancestor == cca));

        let root_tag = original.tag_name(root).map(str::to_string);
        let content = if whole && owned {
            vec![root]
        } else {
            let children = original.children(root).to_vec();
            for &child in &children {
                original.detach(child);
            }
            if !whole && children.iter().any(|&child| original.tag_name(child).is_some()) {
                let inline = original.create_element(&self.config.inline_tag);
                for &child in &children {
                    original.append_child(inline, child);
                }
                vec![inline]
            } else {
                children
            }
        };
        let content = mark_inserted(original, content, &self.config.insert_tag);

        let target = self.target(original, run, whole, owned, root_tag.as_deref());
        debug!(
            b_start = run.b_start,
            b_end = run.b_end,
            whole,
            owned,
            ?target,
            "prepared insertion"
        );

        PreparedInsertion { content, target }
    }

    /// Text between revised word `index` and the word before it.
    ///
    /// When the previous word lives in another text node, the whitespace that
    /// ends that node is carried over, so `Hello <em>world</em>` keeps its space.
    fn separator_before(&self, index: usize) -> String {
        let words = self.revised_words;
        let word = &words[index];
        if index == 0 || words.same_node(index - 1, index) {
            return word.separator.clone();
        }

        let prev = &words[index - 1];
        let tail = self
            .revised
            .text(prev.node)
            .map_or("", |text| char_slice(text, prev.end, char_len(text)));
        let carried = &tail[tail.trim_end().len()..];
        format!("{carried}{}", word.separator)
    }

    fn target(&self, original: &Dom, run: &InsertionRun, whole: bool, owned: bool, root_tag: Option<&str>) -> Target {
        let words = self.original_words;

        let Some(anchor) = run.anchor else {
            let Some(first) = words.get(0) else {
                return Target::Append(container(original));
            };
            if whole
                && let Some(target) = hoist_before(original, first.node, first.start, root_tag, owned)
            {
                return target;
            }
            return Target::Text {
                node: first.node,
                offset: first.start,
            };
        };

        let word = &words[anchor];
        let mut offset = word.end;
        if whole {
            // Step over the separator that followed the inserted words, but
            // never past the original's own separator after the anchor
            let gap_end = if words.same_node(anchor, anchor + 1) {
                words[anchor + 1].start
            } else {
                original.text(word.node).map_or(word.end, char_len)
            };
            let following = self
                .revised_words
                .get(run.b_end + 1)
                .map_or(0, |next| char_len(&next.separator));
            offset += following.min(gap_end - word.end);

            if let Some(target) = hoist_after(original, word.node, offset, root_tag, owned) {
                return target;
            }
        }

        Target::Text {
            node: word.node,
            offset,
        }
    }
}

/// Wrap every text node of `content` in a `tag` marker.
///
/// Leading and trailing whitespace stays outside the marker; text that is
/// only whitespace and text inside raw-text elements are left alone. Returns
/// the content list with top-level text nodes replaced by their marked pieces.
pub fn mark_inserted(dom: &mut Dom, content: Vec<NodeId>, tag: &str) -> Vec<NodeId> {
    let mut marked = Vec::with_capacity(content.len());
    for root in content {
        if dom.is_text(root) {
            marked.extend(mark_text(dom, root, tag));
            continue;
        }
        for node in dom.descendants(root) {
            if dom.is_text(node) && !dom.is_raw_text(node) {
                mark_text(dom, node, tag);
            }
        }
        marked.push(root);
    }
    marked
}

/// Wrap one text node. Returns the nodes now standing where it stood.
fn mark_text(dom: &mut Dom, id: NodeId, tag: &str) -> Vec<NodeId> {
    let Some(text) = dom.text(id) else {
        return vec![id];
    };
    let core = text.trim();
    if core.is_empty() {
        return vec![id];
    }

    let leading = text[..text.len() - text.trim_start().len()].to_string();
    let trailing = text[text.trim_end().len()..].to_string();
    let core = core.to_string();

    dom.set_text(id, core);
    let marker = dom.wrap(id, tag);
    let linked = dom.parent(marker).is_some();

    let mut pieces = Vec::with_capacity(3);
    if !leading.is_empty() {
        let lead = dom.create_text(leading);
        if linked {
            dom.insert_before(marker, lead);
        }
        pieces.push(lead);
    }
    pieces.push(marker);
    if !trailing.is_empty() {
        let trail = dom.create_text(trailing);
        if linked {
            dom.insert_after(marker, trail);
        }
        pieces.push(trail);
    }
    pieces
}

/// Deepest strict ancestor shared by both nodes.
fn common_ancestor(dom: &Dom, a: NodeId, b: NodeId) -> NodeId {
    let above_a: Vec<NodeId> = dom.ancestors(a).collect();
    dom.ancestors(b)
        .find(|ancestor| above_a.contains(ancestor))
        .unwrap_or(dom.document())
}

/// Child indices leading from `ancestor` down to `node`.
fn child_path(dom: &Dom, ancestor: NodeId, node: NodeId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node;
    while current != ancestor {
        let (Some(parent), Some(index)) = (dom.parent(current), dom.child_index(current)) else {
            break;
        };
        path.push(index);
        current = parent;
    }
    path.reverse();
    path
}

fn follow(dom: &Dom, root: NodeId, path: &[usize]) -> NodeId {
    path.iter()
        .fold(root, |node, &index| dom.children(node)[index])
}

/// Drop everything that comes before `node` inside `root`.
fn prune_preceding(dom: &mut Dom, root: NodeId, node: NodeId) {
    let mut current = node;
    while current != root {
        let Some(parent) = dom.parent(current) else {
            break;
        };
        let index = dom.child_index(current).unwrap_or(0);
        for sibling in dom.children(parent)[..index].to_vec() {
            dom.detach(sibling);
        }
        current = parent;
    }
}

/// Drop everything that comes after `node` inside `root`.
fn prune_following(dom: &mut Dom, root: NodeId, node: NodeId) {
    let mut current = node;
    while current != root {
        let Some(parent) = dom.parent(current) else {
            break;
        };
        let index = dom.child_index(current).unwrap_or(0);
        for sibling in dom.children(parent)[index + 1..].to_vec() {
            dom.detach(sibling);
        }
        current = parent;
    }
}

/// Keep characters `[start, end)` of a text node.
fn trim(dom: &mut Dom, node: NodeId, start: usize, end: usize) {
    if let Some(text) = dom.text(node) {
        let kept = char_slice(text, start, end).to_string();
        dom.set_text(node, kept);
    }
}

fn is_blank(dom: &Dom, id: NodeId) -> bool {
    dom.text(id).is_some_and(|text| text.trim().is_empty())
}

fn siblings(dom: &Dom, id: NodeId) -> (&[NodeId], &[NodeId]) {
    match (dom.parent(id), dom.child_index(id)) {
        (Some(parent), Some(index)) => {
            let children = dom.children(parent);
            (&children[..index], &children[index + 1..])
        }
        _ => (&[], &[]),
    }
}

fn blank_after(dom: &Dom, id: NodeId) -> bool {
    siblings(dom, id).1.iter().all(|&sibling| is_blank(dom, sibling))
}

fn blank_before(dom: &Dom, id: NodeId) -> bool {
    siblings(dom, id).0.iter().all(|&sibling| is_blank(dom, sibling))
}

/// Lift content inserted at the very end of an element with the same tag as
/// the content's root out of that element, so a new list item lands next to
/// the previous one instead of inside it.
fn hoist_after(dom: &Dom, node: NodeId, offset: usize, tag: Option<&str>, owned: bool) -> Option<Target> {
    let tag = tag?;
    let text = dom.text(node)?;
    if !char_slice(text, offset, char_len(text)).trim().is_empty() {
        return None;
    }

    let mut current = node;
    loop {
        let parent = dom.parent(current)?;
        if dom.tag_name(parent) == Some(tag) {
            return if !owned {
                Some(Target::After(current))
            } else if blank_after(dom, current) {
                Some(Target::After(parent))
            } else {
                None
            };
        }
        if !blank_after(dom, current) {
            return None;
        }
        current = parent;
    }
}

/// Mirror of [`hoist_after`] for content inserted before the first word.
fn hoist_before(dom: &Dom, node: NodeId, offset: usize, tag: Option<&str>, owned: bool) -> Option<Target> {
    let tag = tag?;
    let text = dom.text(node)?;
    if !char_slice(text, 0, offset).trim().is_empty() {
        return None;
    }

    let mut current = node;
    loop {
        let parent = dom.parent(current)?;
        if dom.tag_name(parent) == Some(tag) {
            return if !owned {
                Some(Target::Before(current))
            } else if blank_before(dom, current) {
                Some(Target::Before(parent))
            } else {
                None
            };
        }
        if !blank_before(dom, current) {
            return None;
        }
        current = parent;
    }
}

/// Where content goes when the original has no words at all.
fn container(dom: &Dom) -> NodeId {
    let document = dom.document();
    dom.find_element("body")
        .or_else(|| {
            dom.children(document)
                .iter()
                .copied()
                .find(|&child| dom.tag_name(child).is_some())
        })
        .unwrap_or(document)
}
