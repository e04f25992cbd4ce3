//! Element tree consumed by the Wombat style engine.
//!
//! This crate provides an arena-based tree following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), trimmed to what style
//! computation needs: elements with namespaces, ordered attributes, derived
//! id/class state, shadow roots, and style-dirty bookkeeping.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. Shadow
//! roots are nodes of their own with no parent; they point back at their host.

mod element;

pub use element::{Attribute, ElementData, ElementState, namespace};

/// A type-safe index into the tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,

    needs_style_update: bool,
    child_needs_style_update: bool,
}

impl Node {
    const fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
            needs_style_update: true,
            child_needs_style_update: false,
        }
    }
}

/// [§ 4.8 Interface ShadowRoot](https://dom.spec.whatwg.org/#interface-shadowroot)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowRootData {
    /// "Shadow roots have an associated host. The host is never null."
    pub host: NodeId,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.8 Interface ShadowRoot](https://dom.spec.whatwg.org/#interface-shadowroot)
    ShadowRoot(ShadowRootData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// Arena-based tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
    /// [§ 4.5](https://dom.spec.whatwg.org/#concept-document-quirks)
    quirks_mode: bool,
}

impl DomTree {
    /// Create a new tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeType::Document)],
            quirks_mode: false,
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Whether the document is in quirks mode.
    #[must_use]
    pub const fn is_quirks_mode(&self) -> bool {
        self.quirks_mode
    }

    /// Switch the document's quirks mode.
    pub const fn set_quirks_mode(&mut self, quirks: bool) {
        self.quirks_mode = quirks;
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node_type));
        id
    }

    /// [§ 4.9 create an element](https://dom.spec.whatwg.org/#concept-create-element)
    pub fn create_element(&mut self, local_name: &str, namespace: Option<&str>) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(local_name, namespace)))
    }

    /// Create an element in the HTML namespace.
    pub fn create_html_element(&mut self, local_name: &str) -> NodeId {
        self.alloc(NodeType::Element(ElementData::html(local_name)))
    }

    /// Create a text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(NodeType::Text(data.to_string()))
    }

    /// [§ 4.9 attach a shadow root](https://dom.spec.whatwg.org/#concept-attach-a-shadow-root)
    ///
    /// Returns the existing shadow root if `host` already has one, and `None`
    /// if `host` is not an element.
    pub fn attach_shadow(&mut self, host: NodeId) -> Option<NodeId> {
        if let Some(existing) = self.as_element(host)?.shadow_root {
            return Some(existing);
        }
        let root = self.alloc(NodeType::ShadowRoot(ShadowRootData { host }));
        if let Some(element) = self.as_element_mut(host) {
            element.shadow_root = Some(root);
        }
        self.mark_style_dirty(host);
        Some(root)
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// [§ 4.2.3 Insert](https://dom.spec.whatwg.org/#concept-node-insert)
    ///
    /// Inserts `child` into `parent` before `reference`, or last when
    /// `reference` is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let index = reference
            .and_then(|r| self.nodes[parent.0].children.iter().position(|&c| c == r))
            .unwrap_or(self.nodes[parent.0].children.len());

        let prev = index
            .checked_sub(1)
            .map(|i| self.nodes[parent.0].children[i]);
        let next = self.nodes[parent.0].children.get(index).copied();

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = prev;
        self.nodes[child.0].next_sibling = next;
        if let Some(prev) = prev {
            self.nodes[prev.0].next_sibling = Some(child);
        }
        if let Some(next) = next {
            self.nodes[next.0].prev_sibling = Some(child);
        }
        self.mark_style_dirty(child);
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Detaches `child` from `parent`. Does nothing if `child` is not a child
    /// of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let Some(index) = self.nodes[parent.0].children.iter().position(|&c| c == child) else {
            return;
        };
        let _ = self.nodes[parent.0].children.remove(index);

        let prev = self.nodes[child.0].prev_sibling.take();
        let next = self.nodes[child.0].next_sibling.take();
        self.nodes[child.0].parent = None;
        if let Some(prev) = prev {
            self.nodes[prev.0].next_sibling = next;
        }
        if let Some(next) = next {
            self.nodes[next.0].prev_sibling = prev;
        }
        self.mark_style_dirty(parent);
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The parent, if it is an element.
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// The parent element, or the shadow host when the parent is a shadow root.
    #[must_use]
    pub fn parent_or_shadow_host_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        match &self.get(parent)?.node_type {
            NodeType::Element(_) => Some(parent),
            NodeType::ShadowRoot(data) => Some(data.host),
            _ => None,
        }
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Element children only.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> SiblingIterator<'_> {
        SiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
            forward: false,
        }
    }

    /// Iterate over following siblings (from immediately after to last child).
    #[must_use]
    pub fn following_siblings(&self, id: NodeId) -> SiblingIterator<'_> {
        SiblingIterator {
            tree: self,
            current: self.next_sibling(id),
            forward: true,
        }
    }

    /// Pre-order descendants of `id`, not including `id` itself. Does not
    /// enter shadow trees.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Whether `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.as_element(id).is_some()
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Mutable element data.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The host of a shadow root node.
    #[must_use]
    pub fn shadow_host(&self, shadow_root: NodeId) -> Option<NodeId> {
        self.get(shadow_root).and_then(|n| match n.node_type {
            NodeType::ShadowRoot(data) => Some(data.host),
            _ => None,
        })
    }

    /// The shadow root attached to `element`, if it is a shadow host.
    #[must_use]
    pub fn shadow_root_of(&self, element: NodeId) -> Option<NodeId> {
        self.as_element(element).and_then(|e| e.shadow_root)
    }

    /// [§ 4.2.2 root](https://dom.spec.whatwg.org/#concept-tree-root)
    ///
    /// The shadow root whose tree contains `id`, or `None` for nodes in the
    /// document tree (or detached).
    #[must_use]
    pub fn containing_shadow_root(&self, id: NodeId) -> Option<NodeId> {
        let root = self.ancestors(id).last().unwrap_or(id);
        matches!(self.get(root)?.node_type, NodeType::ShadowRoot(_)).then_some(root)
    }

    /// Set an attribute on an element, returning the old value. Marks the
    /// element dirty. Callers that want fine-grained invalidation should go
    /// through the style engine instead.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Option<String> {
        let old = self.as_element_mut(element)?.set_attribute(name, value);
        self.mark_style_dirty(element);
        old
    }

    /// Remove an attribute from an element.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Option<String> {
        let old = self.as_element_mut(element)?.remove_attribute(name);
        self.mark_style_dirty(element);
        old
    }

    /// Replace an element's inline style text (its `style` attribute).
    pub fn set_inline_style(&mut self, element: NodeId, css: &str) {
        let _ = self.set_attribute(element, "style", css);
    }

    /// Toggle dynamic state on an element.
    pub fn set_element_state(&mut self, element: NodeId, state: ElementState, on: bool) {
        if let Some(data) = self.as_element_mut(element) {
            data.state.set(state, on);
        }
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(NodeId::ROOT).next()
    }

    /// Whether `id` needs its style recomputed.
    #[must_use]
    pub fn needs_style_update(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.needs_style_update)
    }

    /// Whether some node below `id` needs its style recomputed.
    #[must_use]
    pub fn child_needs_style_update(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.child_needs_style_update)
    }

    /// Flag `id` for style recomputation and propagate the
    /// child-needs-update bit up through ancestors and shadow hosts.
    pub fn mark_style_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.needs_style_update = true;
        }
        let mut current = id;
        while let Some(next) = self.parent(current).or_else(|| self.shadow_host(current)) {
            let node = &mut self.nodes[next.0];
            if node.child_needs_style_update {
                break;
            }
            node.child_needs_style_update = true;
            current = next;
        }
    }

    /// Flag every node for style recomputation.
    pub fn mark_all_style_dirty(&mut self) {
        for node in &mut self.nodes {
            node.needs_style_update = true;
            node.child_needs_style_update = true;
        }
    }

    /// Clear both dirty bits on `id`.
    pub fn clear_style_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.needs_style_update = false;
            node.child_needs_style_update = false;
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over the siblings of a node in one direction.
pub struct SiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
    forward: bool,
}

impl Iterator for SiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = if self.forward {
            self.tree.next_sibling(id)
        } else {
            self.tree.prev_sibling(id)
        };
        Some(id)
    }
}
