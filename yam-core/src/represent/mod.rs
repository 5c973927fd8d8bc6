//! Values to node graphs.

use crate::construct::{FieldKind, ObjectRef, TypeRegistry, Value};
use crate::options::{DumperOptions, NonPrintableStyle};
use crate::tokenizer::char_utils::is_printable;
use crate::treebuild::{Node, NodeData, NodeGraph, NodeId, NodeKind};
use base64::Engine;
use hashbrown::HashMap;
use tracing::debug;
use yam_common::{tags, FlowStyle, ScalarType, YamlError, YamlResult};

///
/// Turns a [`Value`] into a [`NodeGraph`].
///
/// Containers and objects are tracked by identity: the second time the same
/// shared container is met, the node built for it the first time is reused.
/// The serializer turns such shared nodes into anchors and aliases, and a
/// container holding itself becomes a cycle in the graph instead of endless
/// recursion.
pub struct Representer<'c> {
    types: &'c TypeRegistry,
    options: &'c DumperOptions,
    default_flow_style: FlowStyle,
    graph: NodeGraph,
    represented: HashMap<usize, NodeId>,
}

impl<'c> Representer<'c> {
    #[must_use]
    pub fn new(types: &'c TypeRegistry, options: &'c DumperOptions) -> Self {
        Representer {
            types,
            options,
            default_flow_style: options.default_flow_style,
            graph: NodeGraph::new(),
            represented: HashMap::new(),
        }
    }

    /// Overrides the flow style of the options for collections.
    #[must_use]
    pub fn with_flow_style(mut self, flow_style: FlowStyle) -> Self {
        self.default_flow_style = flow_style;
        self
    }

    /// Represents one document. The identity table starts empty for every call.
    pub fn represent(&mut self, value: &Value) -> YamlResult<NodeGraph> {
        self.represented.clear();
        self.graph = NodeGraph::new();
        let root = self.represent_data(value)?;
        self.graph.set_root(root);
        debug!("represented a document of {} nodes", self.graph.len());
        Ok(std::mem::take(&mut self.graph))
    }

    fn represent_data(&mut self, value: &Value) -> YamlResult<NodeId> {
        if let Some(identity) = value.identity() {
            if let Some(&id) = self.represented.get(&identity) {
                return Ok(id);
            }
        }
        match value {
            Value::Null => Ok(self.scalar(tags::NULL, "null", None)),
            Value::Bool(b) => Ok(self.scalar(tags::BOOL, if *b { "true" } else { "false" }, None)),
            Value::Int(i) => Ok(self.scalar(tags::INT, &i.to_string(), None)),
            Value::Float(f) => Ok(self.scalar(tags::FLOAT, &format_float(*f), None)),
            Value::Str(s) => Ok(self.represent_str(s)),
            Value::Binary(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                Ok(self.scalar(tags::BINARY, &encoded, Some(ScalarType::Literal)))
            }
            Value::Timestamp(ts) => Ok(self.scalar(tags::TIMESTAMP, &ts.to_string(), None)),
            Value::Seq(items) => {
                let items = items.borrow().clone();
                self.represent_sequence(value, tags::SEQ, &items)
            }
            Value::Map(map) => {
                let pairs: Vec<(Value, Value)> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                self.represent_mapping(value, tags::MAP, &pairs)
            }
            Value::Set(set) => {
                let pairs: Vec<(Value, Value)> = set
                    .borrow()
                    .iter()
                    .map(|k| (k.clone(), Value::Null))
                    .collect();
                self.represent_mapping(value, tags::SET, &pairs)
            }
            Value::Omap(map) => {
                let pairs: Vec<(Value, Value)> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                self.represent_pairs(value, tags::OMAP, &pairs)
            }
            Value::Pairs(pairs) => {
                let pairs = pairs.borrow().clone();
                self.represent_pairs(value, tags::PAIRS, &pairs)
            }
            Value::Object(object) => self.represent_object(value, object),
        }
    }

    fn scalar(&mut self, tag: &str, value: &str, style: Option<ScalarType>) -> NodeId {
        let style = style.unwrap_or(self.options.default_scalar_style);
        self.graph.add(Node::scalar(tag, value, style))
    }

    fn represent_str(&mut self, value: &str) -> NodeId {
        let mut tag = tags::STR;
        let mut style = None;
        let mut value = value.to_string();
        if self.options.non_printable_style == NonPrintableStyle::Binary
            && !value.chars().all(is_printable)
        {
            tag = tags::BINARY;
            value = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
            style = Some(ScalarType::Literal);
        }
        if self.options.default_scalar_style == ScalarType::Plain && is_multiline(&value) {
            style = Some(ScalarType::Literal);
        }
        self.scalar(tag, &value, style)
    }

    /// Adds an empty collection node and records it under the identity of `value`
    /// before any child is represented.
    fn open_collection(&mut self, value: &Value, node: Node) -> NodeId {
        let id = self.graph.add(node);
        if let Some(identity) = value.identity() {
            self.represented.insert(identity, id);
        }
        id
    }

    fn is_plain_scalar(&self, id: NodeId) -> bool {
        matches!(
            self.graph[id].data,
            NodeData::Scalar {
                style: ScalarType::Plain,
                ..
            }
        )
    }

    fn best_style(&self, plain: bool) -> FlowStyle {
        match self.default_flow_style {
            FlowStyle::Auto if plain => FlowStyle::Flow,
            FlowStyle::Auto => FlowStyle::Block,
            style => style,
        }
    }

    fn represent_sequence(&mut self, value: &Value, tag: &str, items: &[Value]) -> YamlResult<NodeId> {
        let id = self.open_collection(value, Node::sequence(tag, Vec::new(), FlowStyle::Auto));
        let mut plain = true;
        for item in items {
            let child = self.represent_data(item)?;
            plain &= self.is_plain_scalar(child);
            self.graph.push_item(id, child);
        }
        let style = self.best_style(plain);
        self.graph[id].set_flow_style(style);
        Ok(id)
    }

    fn represent_mapping(
        &mut self,
        value: &Value,
        tag: &str,
        pairs: &[(Value, Value)],
    ) -> YamlResult<NodeId> {
        let id = self.open_collection(value, Node::mapping(tag, Vec::new(), FlowStyle::Auto));
        let mut plain = true;
        for (key, item) in pairs {
            let key = self.represent_data(key)?;
            let item = self.represent_data(item)?;
            plain &= self.is_plain_scalar(key) && self.is_plain_scalar(item);
            self.graph.push_pair(id, key, item);
        }
        let style = self.best_style(plain);
        self.graph[id].set_flow_style(style);
        Ok(id)
    }

    /// `!!omap` and `!!pairs`: a sequence of single pair mappings.
    fn represent_pairs(
        &mut self,
        value: &Value,
        tag: &str,
        pairs: &[(Value, Value)],
    ) -> YamlResult<NodeId> {
        let id = self.open_collection(value, Node::sequence(tag, Vec::new(), FlowStyle::Auto));
        for (key, item) in pairs {
            let key = self.represent_data(key)?;
            let item = self.represent_data(item)?;
            let flow = if self.is_plain_scalar(key) && self.is_plain_scalar(item) {
                FlowStyle::Flow
            } else {
                FlowStyle::Block
            };
            let entry = self.graph.add(Node::mapping(tags::MAP, vec![(key, item)], flow));
            self.graph.push_item(id, entry);
        }
        let style = self.best_style(false);
        self.graph[id].set_flow_style(style);
        Ok(id)
    }

    fn represent_object(&mut self, value: &Value, object: &ObjectRef) -> YamlResult<NodeId> {
        let types = self.types;
        let (tag, scalar, properties) = {
            let borrowed = object.try_borrow().map_err(|_| {
                YamlError::Representer("object is borrowed while being represented".to_string())
            })?;
            let Some(description) = types.by_object(&*borrowed) else {
                return Err(YamlError::Representer(format!(
                    "no type description registered for {}",
                    borrowed.type_name()
                )));
            };
            (
                description.tag().to_string(),
                borrowed.to_scalar(),
                borrowed.properties(),
            )
        };
        if let Some(scalar) = scalar {
            let id = self.scalar(&tag, &scalar, None);
            if let Some(identity) = value.identity() {
                self.represented.insert(identity, id);
            }
            return Ok(id);
        }

        let id = self.open_collection(value, Node::mapping(tag, Vec::new(), FlowStyle::Auto));
        let mut plain = true;
        for (name, kind, property) in properties {
            let key = self.represent_str(name);
            let already = property
                .identity()
                .is_some_and(|identity| self.represented.contains_key(&identity));
            let item = self.represent_data(&property)?;
            if !already {
                self.hide_declared_tag(kind, &property, item);
            }
            plain &= self.is_plain_scalar(key) && self.is_plain_scalar(item);
            self.graph.push_pair(id, key, item);
        }
        let style = self.best_style(plain);
        self.graph[id].set_flow_style(style);
        Ok(id)
    }

    /// A property whose declared kind already names the tag of its value is
    /// written without that tag; loading restores it from the declaration.
    fn hide_declared_tag(&mut self, kind: FieldKind, property: &Value, item: NodeId) {
        match kind {
            FieldKind::Object(tag) => {
                let node = &mut self.graph[item];
                if node.kind() == NodeKind::Mapping && node.tag == tag {
                    node.tag = tags::MAP.to_string();
                }
            }
            FieldKind::SeqOf(tag) => {
                let Value::Seq(values) = property else {
                    return;
                };
                if self.graph[item].kind() != NodeKind::Sequence {
                    return;
                }
                let children = self.graph[item].children();
                let values = values.borrow();
                for (child, element) in children.into_iter().zip(values.iter()) {
                    if matches!(element, Value::Object(_)) {
                        let node = &mut self.graph[child];
                        if node.kind() == NodeKind::Mapping && node.tag == tag {
                            node.tag = tags::MAP.to_string();
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_multiline(value: &str) -> bool {
    let bytes = value.as_bytes();
    if memchr::memchr(b'\n', bytes).is_some() {
        return true;
    }
    // NEL, LS and PS all start with one of these lead bytes
    memchr::memchr2(0xC2, 0xE2, bytes).is_some()
        && value.contains(['\u{85}', '\u{2028}', '\u{2029}'])
}

/// Text of a float that resolves back to `!!float`.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".NaN".to_string()
    } else if value == f64::INFINITY {
        ".inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        // Debug keeps a `.0` or an exponent on integral values
        format!("{value:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{FieldSet, TypeDescription, YamlObject};

    fn represent(value: &Value) -> NodeGraph {
        let types = TypeRegistry::new();
        let options = DumperOptions::default();
        Representer::new(&types, &options)
            .represent(value)
            .expect("represent")
    }

    fn scalar(graph: &NodeGraph, id: NodeId) -> (&str, &str, ScalarType) {
        match &graph[id].data {
            NodeData::Scalar { value, style } => (graph[id].tag.as_str(), value.as_str(), *style),
            other => panic!("expected a scalar, got {other:?}"),
        }
    }

    #[test]
    fn scalars() {
        let graph = represent(&Value::seq(vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::Float(1.0),
            Value::Float(f64::NEG_INFINITY),
            Value::Float(f64::NAN),
            Value::from("plain"),
        ]));
        let root = graph.root_node().expect("root");
        let items = root.children();
        assert_eq!(scalar(&graph, items[0]), (tags::NULL, "null", ScalarType::Plain));
        assert_eq!(scalar(&graph, items[1]).1, "true");
        assert_eq!(scalar(&graph, items[2]), (tags::INT, "-7", ScalarType::Plain));
        assert_eq!(scalar(&graph, items[3]), (tags::FLOAT, "1.0", ScalarType::Plain));
        assert_eq!(scalar(&graph, items[4]).1, "-.inf");
        assert_eq!(scalar(&graph, items[5]).1, ".NaN");
        assert_eq!(scalar(&graph, items[6]), (tags::STR, "plain", ScalarType::Plain));
        assert_eq!(root.flow_style(), FlowStyle::Flow);
    }

    #[test]
    fn multiline_is_literal() {
        let graph = represent(&Value::from("line1\nline2"));
        let root = graph.root().expect("root");
        assert_eq!(scalar(&graph, root), (tags::STR, "line1\nline2", ScalarType::Literal));
    }

    #[test]
    fn non_printable_is_binary() {
        let graph = represent(&Value::from("\u{1}bell"));
        let root = graph.root().expect("root");
        assert_eq!(scalar(&graph, root), (tags::BINARY, "AWJlbGw=", ScalarType::Literal));

        let types = TypeRegistry::new();
        let options = DumperOptions {
            non_printable_style: NonPrintableStyle::Escape,
            ..DumperOptions::default()
        };
        let graph = Representer::new(&types, &options)
            .represent(&Value::from("\u{1}bell"))
            .expect("represent");
        let root = graph.root().expect("root");
        assert_eq!(scalar(&graph, root).0, tags::STR);
    }

    #[test]
    fn shared_containers_share_nodes() {
        let shared = Value::seq(vec![Value::Int(1), Value::Int(2)]);
        let graph = represent(&Value::map([("a", shared.clone()), ("b", shared)]));
        let root = graph.root_node().expect("root");
        let children = root.children();
        assert_eq!(children[1], children[3]);
        assert_eq!(graph.len(), 6);
        // a collection child makes the parent block
        assert_eq!(root.flow_style(), FlowStyle::Block);
    }

    #[test]
    fn cycles_terminate() {
        let list = Value::seq(vec![Value::Int(1)]);
        if let Value::Seq(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        let graph = represent(&list);
        let root = graph.root().expect("root");
        assert_eq!(graph[root].children()[1], root);
    }

    #[test]
    fn sets_and_ordered_maps() {
        let graph = represent(&Value::set(["x", "y"]));
        let root = graph.root_node().expect("root");
        assert_eq!(root.tag, tags::SET);
        assert_eq!(scalar(&graph, root.children()[1]).0, tags::NULL);

        let graph = represent(&Value::omap([("one", 1), ("two", 2)]));
        let root = graph.root_node().expect("root");
        assert_eq!(root.tag, tags::OMAP);
        assert_eq!(root.kind(), NodeKind::Sequence);
        let first = &graph[root.children()[0]];
        assert_eq!(first.kind(), NodeKind::Mapping);
        assert_eq!(first.children().len(), 2);
    }

    #[test]
    fn default_flow_style_wins() {
        let types = TypeRegistry::new();
        let options = DumperOptions::default();
        let graph = Representer::new(&types, &options)
            .with_flow_style(FlowStyle::Block)
            .represent(&Value::seq(vec![Value::Int(1)]))
            .expect("represent");
        assert_eq!(graph.root_node().expect("root").flow_style(), FlowStyle::Block);
    }

    #[derive(Clone, Debug, Default)]
    struct Inner {
        name: String,
    }

    impl YamlObject for Inner {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.field(
                "name",
                FieldKind::Str,
                |i| i.name.clone().into(),
                |i, v| {
                    i.name = v.try_into()?;
                    Ok(())
                },
            );
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Outer {
        inner: Option<Value>,
    }

    impl YamlObject for Outer {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.field(
                "inner",
                FieldKind::Object("!inner"),
                |o| o.inner.clone().unwrap_or(Value::Null),
                |o, v| {
                    o.inner = Some(v);
                    Ok(())
                },
            );
        }
    }

    #[test]
    fn objects() {
        let mut types = TypeRegistry::new();
        types
            .register(TypeDescription::of::<Inner>("!inner"))
            .expect("inner");
        types
            .register(TypeDescription::of::<Outer>("!outer"))
            .expect("outer");
        let options = DumperOptions::default();
        let inner = Value::object(Inner {
            name: "x".to_string(),
        });
        let outer = Value::object(Outer { inner: Some(inner) });
        let graph = Representer::new(&types, &options)
            .represent(&outer)
            .expect("represent");
        let root = graph.root_node().expect("root");
        assert_eq!(root.tag, "!outer");
        let inner = &graph[root.children()[1]];
        assert_eq!(inner.tag, tags::MAP);

        let unknown = Representer::new(&TypeRegistry::new(), &options).represent(&outer);
        assert!(matches!(unknown, Err(YamlError::Representer(_))));
    }
}
