use crate::comments::CommentLine;
use std::fmt::{Display, Formatter};
use yam_common::{FlowStyle, Marker, ScalarType, Span};

/// Index of a node inside its [`NodeGraph`]. Identity of a node is its id, two
/// nodes with the same content are still different nodes.
pub type NodeId = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Scalar => f.write_str("scalar"),
            NodeKind::Sequence => f.write_str("sequence"),
            NodeKind::Mapping => f.write_str("mapping"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Scalar {
        value: String,
        style: ScalarType,
    },
    Sequence {
        items: Vec<NodeId>,
        flow_style: FlowStyle,
    },
    Mapping {
        pairs: Vec<(NodeId, NodeId)>,
        flow_style: FlowStyle,
        /// Set when at least one key is `<<`.
        merged: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub tag: String,
    pub span: Span,
    pub anchor: Option<String>,
    /// `true` when the tag was inferred rather than written out.
    pub resolved: bool,
    /// The node (directly or through a key) contains itself and has to be filled
    /// after it is created.
    pub two_steps: bool,
    /// Tag to construct with instead of the resolved one, set by object binding.
    pub type_hint: Option<String>,
    pub block_comments: Vec<CommentLine>,
    pub inline_comments: Vec<CommentLine>,
    pub end_comments: Vec<CommentLine>,
    pub data: NodeData,
}

impl Node {
    #[must_use]
    pub fn new(tag: impl Into<String>, data: NodeData) -> Node {
        Node {
            tag: tag.into(),
            span: Span::default(),
            anchor: None,
            resolved: false,
            two_steps: false,
            type_hint: None,
            block_comments: Vec::new(),
            inline_comments: Vec::new(),
            end_comments: Vec::new(),
            data,
        }
    }

    #[must_use]
    pub fn scalar(tag: impl Into<String>, value: impl Into<String>, style: ScalarType) -> Node {
        Node::new(
            tag,
            NodeData::Scalar {
                value: value.into(),
                style,
            },
        )
    }

    #[must_use]
    pub fn sequence(tag: impl Into<String>, items: Vec<NodeId>, flow_style: FlowStyle) -> Node {
        Node::new(tag, NodeData::Sequence { items, flow_style })
    }

    #[must_use]
    pub fn mapping(
        tag: impl Into<String>,
        pairs: Vec<(NodeId, NodeId)>,
        flow_style: FlowStyle,
    ) -> Node {
        Node::new(
            tag,
            NodeData::Mapping {
                pairs,
                flow_style,
                merged: false,
            },
        )
    }

    #[must_use]
    pub fn with_span(mut self, start: Marker, end: Marker) -> Node {
        self.span = Span::new(start, end);
        self
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Scalar { .. } => NodeKind::Scalar,
            NodeData::Sequence { .. } => NodeKind::Sequence,
            NodeData::Mapping { .. } => NodeKind::Mapping,
        }
    }

    /// Tag the constructor dispatches on.
    #[must_use]
    pub fn construct_tag(&self) -> &str {
        match (&self.type_hint, self.resolved) {
            (Some(hint), true) => hint,
            _ => &self.tag,
        }
    }

    #[must_use]
    pub fn scalar_value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn flow_style(&self) -> FlowStyle {
        match self.data {
            NodeData::Sequence { flow_style, .. } | NodeData::Mapping { flow_style, .. } => {
                flow_style
            }
            NodeData::Scalar { .. } => FlowStyle::Auto,
        }
    }

    pub fn set_flow_style(&mut self, style: FlowStyle) {
        match &mut self.data {
            NodeData::Sequence { flow_style, .. } | NodeData::Mapping { flow_style, .. } => {
                *flow_style = style;
            }
            NodeData::Scalar { .. } => {}
        }
    }

    /// Children in document order; mapping keys come before their values.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match &self.data {
            NodeData::Scalar { .. } => Vec::new(),
            NodeData::Sequence { items, .. } => items.clone(),
            NodeData::Mapping { pairs, .. } => {
                pairs.iter().flat_map(|(key, value)| [*key, *value]).collect()
            }
        }
    }
}

/// Arena holding the nodes of one document. Aliases share ids, so the graph may
/// contain cycles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl NodeGraph {
    #[must_use]
    pub fn new() -> Self {
        NodeGraph::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    #[must_use]
    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push_item(&mut self, sequence: NodeId, item: NodeId) {
        if let Some(NodeData::Sequence { items, .. }) = self.get_mut(sequence).map(|n| &mut n.data)
        {
            items.push(item);
        }
    }

    pub fn push_pair(&mut self, mapping: NodeId, key: NodeId, value: NodeId) {
        if let Some(NodeData::Mapping { pairs, .. }) = self.get_mut(mapping).map(|n| &mut n.data) {
            pairs.push((key, value));
        }
    }

    /// Structural comparison that follows shared ids: two graphs are equal when
    /// their nodes match in tag, value and shape, and sharing sits in the same places.
    #[must_use]
    pub fn same_shape(&self, other: &NodeGraph) -> bool {
        match (self.root, other.root) {
            (Some(a), Some(b)) => {
                let mut seen = hashbrown::HashMap::new();
                self.same_node(a, other, b, &mut seen)
            }
            (None, None) => true,
            _ => false,
        }
    }

    fn same_node(
        &self,
        a: NodeId,
        other: &NodeGraph,
        b: NodeId,
        seen: &mut hashbrown::HashMap<NodeId, NodeId>,
    ) -> bool {
        if let Some(&mapped) = seen.get(&a) {
            return mapped == b;
        }
        seen.insert(a, b);
        let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
            return false;
        };
        if left.tag != right.tag {
            return false;
        }
        match (&left.data, &right.data) {
            (NodeData::Scalar { value: l, .. }, NodeData::Scalar { value: r, .. }) => l == r,
            (NodeData::Sequence { items: l, .. }, NodeData::Sequence { items: r, .. }) => {
                l.len() == r.len()
                    && l
                        .iter()
                        .zip(r)
                        .all(|(x, y)| self.same_node(*x, other, *y, seen))
            }
            (NodeData::Mapping { pairs: l, .. }, NodeData::Mapping { pairs: r, .. }) => {
                l.len() == r.len()
                    && l.iter().zip(r).all(|((lk, lv), (rk, rv))| {
                        self.same_node(*lk, other, *rk, seen) && self.same_node(*lv, other, *rv, seen)
                    })
            }
            _ => false,
        }
    }
}

impl std::ops::Index<NodeId> for NodeGraph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl std::ops::IndexMut<NodeId> for NodeGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::tags;

    #[test]
    fn shared_nodes_compare_by_position() {
        let mut shared = NodeGraph::new();
        let item = shared.add(Node::scalar(tags::STR, "x", ScalarType::Plain));
        let root = shared.add(Node::sequence(tags::SEQ, vec![item, item], FlowStyle::Auto));
        shared.set_root(root);

        let mut copied = NodeGraph::new();
        let first = copied.add(Node::scalar(tags::STR, "x", ScalarType::Plain));
        let second = copied.add(Node::scalar(tags::STR, "x", ScalarType::Plain));
        let root = copied.add(Node::sequence(tags::SEQ, vec![first, second], FlowStyle::Auto));
        copied.set_root(root);

        assert!(shared.same_shape(&shared.clone()));
        assert!(!shared.same_shape(&copied));
    }

    #[test]
    fn children_order() {
        let mut graph = NodeGraph::new();
        let k = graph.add(Node::scalar(tags::STR, "k", ScalarType::Plain));
        let v = graph.add(Node::scalar(tags::STR, "v", ScalarType::Plain));
        let map = graph.add(Node::mapping(tags::MAP, Vec::new(), FlowStyle::Block));
        graph.push_pair(map, k, v);
        assert_eq!(graph[map].children(), vec![k, v]);
        assert_eq!(graph[map].kind(), NodeKind::Mapping);
        assert_eq!(graph[map].flow_style(), FlowStyle::Block);
    }
}
