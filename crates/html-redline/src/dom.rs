//! Arena-backed HTML tree.
//!
//! Documents are parsed with html5ever into an rcdom and then flattened into an
//! arena of [`Node`]s addressed by [`NodeId`]. Parent links are plain ids, used
//! for lookups only: cloning, splitting and re-linking move indices around and
//! never fight over ownership.

use std::fmt;

use crate::error::{Error, Result};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized verbatim.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Stable identity of a node within one [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document root
    Document,
    /// `<!DOCTYPE ...>`
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// An element with its local name (e.g., "div", "p") and attributes in source order
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Text content
    Text(String),
    /// `<!-- ... -->`
    Comment(String),
    /// `<?target data>`
    ProcessingInstruction { target: String, data: String },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML document stored as an arena of nodes.
///
/// Detached nodes stay in the arena; they simply have no parent until they are
/// linked somewhere.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            document: NodeId(0),
        }
    }

    /// Parse a full HTML document.
    ///
    /// Malformed markup is repaired by html5ever the same way a browser would.
    pub fn parse(html: &str) -> Result<Self> {
        use html5ever::tendril::TendrilSink;
        use html5ever::{ParseOpts, parse_document};
        use markup5ever_rcdom::RcDom;

        let rcdom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(Error::Parse)?;

        let mut dom = Dom::new();
        let document = dom.document;
        for child in rcdom.document.children.borrow().iter() {
            dom.convert_rcdom_node(child, document);
        }
        Ok(dom)
    }

    /// Convert an rcdom handle (and its subtree) into arena nodes under `parent`.
    fn convert_rcdom_node(&mut self, handle: &markup5ever_rcdom::Handle, parent: NodeId) {
        use markup5ever_rcdom::NodeData as RcData;

        let data = match &handle.data {
            RcData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_rcdom_node(child, parent);
                }
                return;
            }
            RcData::Doctype {
                name,
                public_id,
                system_id,
            } => NodeData::Doctype {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            },
            RcData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
            RcData::Comment { contents } => NodeData::Comment(contents.to_string()),
            RcData::Element { name, attrs, .. } => NodeData::Element {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|attr| {
                        let key = match &attr.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                            None => attr.name.local.to_string(),
                        };
                        (key, attr.value.to_string())
                    })
                    .collect(),
            },
            RcData::ProcessingInstruction { target, contents } => {
                NodeData::ProcessingInstruction {
                    target: target.to_string(),
                    data: contents.to_string(),
                }
            }
        };

        let id = self.push(data);
        self.append_child(parent, id);

        for child in handle.children.borrow().iter() {
            self.convert_rcdom_node(child, id);
        }

        // <template> keeps its content in a separate fragment; fold it back in
        if let RcData::Element {
            template_contents, ..
        } = &handle.data
            && let Some(contents) = template_contents.borrow().as_ref()
        {
            for child in contents.children.borrow().iter() {
                self.convert_rcdom_node(child, id);
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element with no attributes.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element {
            name: name.to_string(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// The document root.
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Text of a text node, `None` for every other kind of node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    /// Local name of an element, `None` for every other kind of node.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the text node sits directly inside a raw-text element like `<script>`.
    pub fn is_raw_text(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|parent| self.tag_name(parent))
            .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name))
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        match &mut self.nodes[id.0].data {
            NodeData::Text(current) => *current = text.into(),
            other => panic!("set_text on non-text node {id}: {other:?}"),
        }
    }

    /// Position of a node among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Strict ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.parent(id),
        }
    }

    /// The node and all of its descendants, in preorder.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Every text node of the document in preorder.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .filter(|&id| self.is_text(id))
            .collect()
    }

    /// Concatenated text of all text nodes under `id` (including `id` itself).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// First element with the given local name, in document order.
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(name))
    }

    /// Unlink a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Insert `child` into `parent` at `index`, detaching it from wherever it was.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Link `node` as the previous sibling of `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        self.detach(node);
        let (parent, index) = self.position(reference);
        self.insert_at(parent, index, node);
    }

    /// Link `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        self.detach(node);
        let (parent, index) = self.position(reference);
        self.insert_at(parent, index + 1, node);
    }

    fn position(&self, id: NodeId) -> (NodeId, usize) {
        match (self.parent(id), self.child_index(id)) {
            (Some(parent), Some(index)) => (parent, index),
            _ => panic!("node {id} is not linked into the tree"),
        }
    }

    /// Wrap `node` in a new element, which takes the node's place. Returns the wrapper.
    pub fn wrap(&mut self, node: NodeId, tag: &str) -> NodeId {
        let wrapper = self.create_element(tag);
        if self.parent(node).is_some() {
            self.insert_before(node, wrapper);
        }
        self.append_child(wrapper, node);
        wrapper
    }

    /// Replace an element by its children, keeping their order and position.
    pub fn replace_with_children(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let index = self.child_index(id).unwrap_or(0);
        let children = std::mem::take(&mut self.nodes[id.0].children);
        self.detach(id);
        for (offset, child) in children.into_iter().enumerate() {
            self.nodes[child.0].parent = None;
            self.insert_at(parent, index + offset, child);
        }
    }

    /// Split a text node at a character offset.
    ///
    /// The node keeps `[0, at)`; a new text node holding `[at, ..)` is linked
    /// right after it (if the node is linked) and returned.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> NodeId {
        let Some(text) = self.text(id) else {
            panic!("split_text on non-text node {id}");
        };
        let split = byte_offset(text, at);
        let tail = text[split..].to_string();
        let head = text[..split].to_string();
        self.set_text(id, head);
        let after = self.create_text(tail);
        if self.parent(id).is_some() {
            self.insert_after(id, after);
        }
        after
    }

    /// Deep-copy a subtree of another arena into this one. The copy is detached.
    pub fn import(&mut self, source: &Dom, id: NodeId) -> NodeId {
        let copy = self.push(source.data(id).clone());
        for &child in source.children(id) {
            let child_copy = self.import(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.node_to_html(self.document)
    }

    /// Serialize one node and its subtree.
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut html = String::new();
        self.write_node(id, &mut html);
        html
    }

    fn write_node(&self, id: NodeId, html: &mut String) {
        match self.data(id) {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(child, html);
                }
            }
            NodeData::Doctype { name, .. } => {
                html.push_str("<!DOCTYPE ");
                html.push_str(name);
                html.push('>');
            }
            NodeData::Element { name, attrs } => {
                html.push('<');
                html.push_str(name);
                for (key, value) in attrs {
                    html.push(' ');
                    html.push_str(key);
                    html.push_str("=\"");
                    html_escape::encode_double_quoted_attribute_to_string(value, html);
                    html.push('"');
                }
                html.push('>');

                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }

                // The parser drops one newline right after these start tags
                if matches!(name.as_str(), "pre" | "textarea" | "listing")
                    && let Some(&first) = self.children(id).first()
                    && self.text(first).is_some_and(|text| text.starts_with('\n'))
                {
                    html.push('\n');
                }

                for &child in self.children(id) {
                    self.write_node(child, html);
                }

                html.push_str("</");
                html.push_str(name);
                html.push('>');
            }
            NodeData::Text(text) => {
                if self.is_raw_text(id) {
                    html.push_str(text);
                } else {
                    html_escape::encode_text_to_string(text, html);
                }
            }
            NodeData::Comment(comment) => {
                html.push_str("<!--");
                html.push_str(comment);
                html.push_str("-->");
            }
            NodeData::ProcessingInstruction { target, data } => {
                html.push_str("<?");
                html.push_str(target);
                html.push(' ');
                html.push_str(data);
                html.push('>');
            }
        }
    }
}

/// Iterator over the strict ancestors of a node.
pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}

/// Number of characters (Unicode scalar values) in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte position of the `chars`-th character, or `text.len()` past the end.
pub(crate) fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

/// Characters `[start, end)` of `text`.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end).max(from);
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(dom: &Dom) -> NodeId {
        dom.find_element("body").unwrap()
    }

    fn body_html(dom: &Dom) -> String {
        let body = body(dom);
        dom.children(body)
            .iter()
            .map(|&child| dom.node_to_html(child))
            .collect()
    }

    #[test]
    fn test_parse_and_serialize_roundtrip() {
        let html = r#"<!DOCTYPE html><html><head><title>T</title></head><body><p class="x">Hello <em>big</em> world</p><br><img src="a.png"></body></html>"#;
        let dom = Dom::parse(html).unwrap();
        assert_eq!(dom.to_html(), html);
    }

    #[test]
    fn test_fragment_gets_document_structure() {
        let dom = Dom::parse("<p>Hello</p>").unwrap();
        assert_eq!(
            dom.to_html(),
            "<html><head></head><body><p>Hello</p></body></html>"
        );
    }

    #[test]
    fn test_text_escaping() {
        let dom = Dom::parse("<p>a &lt; b &amp; c</p><script>if (a < b) {}</script>").unwrap();
        let html = dom.to_html();
        assert!(html.contains("<p>a &lt; b &amp; c</p>"), "{html}");
        assert!(html.contains("<script>if (a < b) {}</script>"), "{html}");
    }

    #[test]
    fn test_attribute_escaping() {
        let dom = Dom::parse(r#"<p title="say &quot;hi&quot;">x</p>"#).unwrap();
        assert!(dom.to_html().contains(r#"<p title="say &quot;hi&quot;">x</p>"#));
    }

    #[test]
    fn test_pre_leading_newline_survives() {
        let html = "<html><head></head><body><pre>\n\nindented</pre></body></html>";
        let dom = Dom::parse(html).unwrap();
        assert_eq!(Dom::parse(&dom.to_html()).unwrap().to_html(), dom.to_html());
        assert_eq!(dom.to_html(), html);
    }

    #[test]
    fn test_split_text_links_tail_after_head() {
        let mut dom = Dom::parse("<p>héllo world</p>").unwrap();
        let text = dom.text_nodes()[0];
        let tail = dom.split_text(text, 5);
        assert_eq!(dom.text(text), Some("héllo"));
        assert_eq!(dom.text(tail), Some(" world"));
        assert_eq!(dom.child_index(tail), Some(1));
        assert_eq!(body_html(&dom), "<p>héllo world</p>");
    }

    #[test]
    fn test_wrap_keeps_position() {
        let mut dom = Dom::parse("<p>a<b>b</b>c</p>").unwrap();
        let b = dom.find_element("b").unwrap();
        let wrapper = dom.wrap(b, "del");
        assert_eq!(dom.child_index(wrapper), Some(1));
        assert_eq!(body_html(&dom), "<p>a<del><b>b</b></del>c</p>");
    }

    #[test]
    fn test_replace_with_children() {
        let mut dom = Dom::parse("<div>x<span>a<i>b</i></span>y</div>").unwrap();
        let span = dom.find_element("span").unwrap();
        dom.replace_with_children(span);
        assert_eq!(body_html(&dom), "<div>xa<i>b</i>y</div>");
    }

    #[test]
    fn test_import_is_independent_of_source() {
        let source = Dom::parse("<ul><li>one</li></ul>").unwrap();
        let mut target = Dom::parse("<p>x</p>").unwrap();
        let li = source.find_element("li").unwrap();
        let copy = target.import(&source, li);
        let text = target.children(copy)[0];
        target.set_text(text, "changed");
        assert_eq!(target.node_to_html(copy), "<li>changed</li>");
        assert_eq!(source.node_to_html(li), "<li>one</li>");
        assert_eq!(target.parent(copy), None);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let dom = Dom::parse("<div><p><em>x</em></p></div>").unwrap();
        let text = dom.text_nodes()[0];
        let names: Vec<_> = dom
            .ancestors(text)
            .filter_map(|id| dom.tag_name(id))
            .collect();
        assert_eq!(names, ["em", "p", "div", "body", "html"]);
    }

    #[test]
    fn test_char_slice_counts_characters() {
        assert_eq!(char_slice("naïve café", 2, 5), "ïve");
        assert_eq!(char_slice("abc", 1, 10), "bc");
        assert_eq!(char_len("naïve"), 5);
    }
}
