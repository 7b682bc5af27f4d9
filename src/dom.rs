use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("no template named '{0}'")]
    UnknownTemplate(String),
    #[error("no element matches '{0}'")]
    MissingElement(String),
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    templates: HashMap<String, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            templates: HashMap::new(),
        };
        let html = doc.create_element("html");
        doc.root = html;
        let body = doc.append_element(html, "body");
        doc.append_element(body, "main");
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // Returns the subtree's slots to the free list. Handles into it are dead afterwards.
    fn release(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let released = self.node_mut(id);
            stack.append(&mut released.children);
            released.parent = None;
            released.kind = NodeKind::Text(String::new());
            self.free.push(id);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }
        self.remove(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        true
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let child = self.create_element(tag);
        self.append_child(parent, child);
        child
    }

    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|c| *c != node);
        self.node_mut(node).parent = None;
        true
    }

    /// Drops every child subtree of `node` and frees its nodes.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.release(child);
        }
    }

    /// Like `clear_children`, but the children stay alive as detached subtrees.
    pub fn detach_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .filter(|c| matches!(self.node(*c).kind, NodeKind::Element { .. }))
            .collect()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(node).kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(node).kind {
            attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get_attribute(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(node, t);
        }
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.node(node).kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { .. } => {
                for child in &self.node(node).children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == self.root {
                return true;
            }
            cur = self.node(id).parent;
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.node(id).parent;
        }
        false
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let chain = parse_selector(selector);
        if chain.is_empty() {
            return None;
        }
        self.descendants(scope)
            .into_iter()
            .find(|id| self.matches_chain(*id, &chain))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let chain = parse_selector(selector);
        if chain.is_empty() {
            return Vec::new();
        }
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.matches_chain(*id, &chain))
            .collect()
    }

    fn matches_chain(&self, node: NodeId, chain: &[Compound]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }
        let mut cur = self.node(node).parent;
        for compound in rest.iter().rev() {
            loop {
                match cur {
                    Some(id) if self.matches_compound(id, compound) => {
                        cur = self.node(id).parent;
                        break;
                    }
                    Some(id) => cur = self.node(id).parent,
                    None => return false,
                }
            }
        }
        true
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(tag) = self.tag_name(node) else {
            return false;
        };
        if let Some(want) = &compound.tag {
            if want != tag {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if self.get_attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        compound.classes.iter().all(|c| self.has_class(node, c))
    }

    pub fn define_template(&mut self, name: &str) -> NodeId {
        let template = self.create_element("template");
        self.set_attribute(template, "id", name);
        self.templates.insert(name.to_string(), template);
        template
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn clone_template_into(&mut self, name: &str, host: NodeId) -> Result<(), DomError> {
        let template = *self
            .templates
            .get(name)
            .ok_or_else(|| DomError::UnknownTemplate(name.to_string()))?;
        let content = self.node(template).children.clone();
        for child in content {
            let copy = self.deep_clone(child);
            self.append_child(host, copy);
        }
        Ok(())
    }

    fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let kind = self.node(node).kind.clone();
        let copy = self.push(kind);
        let children = self.node(node).children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.node(node).children {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.node(node).kind {
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    if !v.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(v));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.node(node).children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn parse_selector(selector: &str) -> Vec<Compound> {
    selector.split_whitespace().map(parse_compound).collect()
}

fn parse_compound(part: &str) -> Compound {
    let mut compound = Compound::default();
    let mut current = String::new();
    let mut marker: Option<char> = None;
    for ch in part.chars() {
        if ch == '#' || ch == '.' {
            flush_segment(marker, &mut current, &mut compound);
            marker = Some(ch);
        } else {
            current.push(ch);
        }
    }
    flush_segment(marker, &mut current, &mut compound);
    compound
}

fn flush_segment(marker: Option<char>, text: &mut String, compound: &mut Compound) {
    let value = std::mem::take(text);
    if value.is_empty() {
        return;
    }
    match marker {
        Some('#') => compound.id = Some(value),
        Some('.') => compound.classes.push(value),
        _ if value == "*" => {}
        _ => compound.tag = Some(value.to_ascii_lowercase()),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Shared handle to a [`Document`]. The lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    inner: Arc<Mutex<Document>>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
