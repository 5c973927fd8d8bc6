use crate::comments::CommentLine;
use crate::emitter::Emitter;
use crate::options::{AnchorGenerator, DumperOptions, NumberAnchorGenerator};
use crate::resolver::Resolver;
use crate::treebuild::{NodeData, NodeGraph, NodeId, NodeKind};
use hashbrown::{HashMap, HashSet};
use tracing::debug;
use yam_common::{tags, Event, EventType, ImplicitTuple, YamlError, YamlResult};

/// Receives the events a [`Serializer`] derives from a node graph.
pub trait EventSink {
    fn emit(&mut self, event: Event) -> YamlResult<()>;
}

impl EventSink for Emitter<'_> {
    fn emit(&mut self, event: Event) -> YamlResult<()> {
        Emitter::emit(self, event)
    }
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> YamlResult<()> {
        self.push(event);
        Ok(())
    }
}

fn serializer_error(problem: &str) -> YamlError {
    YamlError::Serializer(problem.to_string())
}

///
/// Turns node graphs back into events, one document per [`Serializer::serialize`].
///
/// Each document is walked twice: the first pass finds the nodes that are
/// reachable more than once and names them, the second writes the events,
/// using an alias for every visit after the first.
///
/// # Methods
/// - `open()`/`close()`: Emit the stream start and end.
/// - `serialize(graph)`: Emit one document.
pub struct Serializer<'r, S> {
    sink: S,
    resolver: &'r Resolver,
    options: &'r DumperOptions,
    explicit_root: Option<String>,
    anchor_generator: Box<dyn AnchorGenerator>,
    anchors: HashMap<NodeId, Option<String>>,
    serialized: HashSet<NodeId>,
    /// `None` before `open`, then whether `close` was called.
    closed: Option<bool>,
}

impl<'r, S: EventSink> Serializer<'r, S> {
    pub fn new(sink: S, resolver: &'r Resolver, options: &'r DumperOptions) -> Self {
        Serializer {
            sink,
            resolver,
            options,
            explicit_root: None,
            anchor_generator: Box::new(NumberAnchorGenerator::new(0)),
            anchors: HashMap::new(),
            serialized: HashSet::new(),
            closed: None,
        }
    }

    /// Tag written on every root node instead of its own.
    #[must_use]
    pub fn with_root_tag(mut self, tag: Option<String>) -> Self {
        self.explicit_root = tag;
        self
    }

    #[must_use]
    pub fn with_anchor_generator(mut self, generator: Box<dyn AnchorGenerator>) -> Self {
        self.anchor_generator = generator;
        self
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    pub fn open(&mut self) -> YamlResult<()> {
        match self.closed {
            None => {
                debug!("serializer opened");
                self.sink.emit(Event::synthetic(EventType::StreamStart))?;
                self.closed = Some(false);
                Ok(())
            }
            Some(true) => Err(serializer_error("serializer is closed")),
            Some(false) => Err(serializer_error("serializer is already opened")),
        }
    }

    pub fn close(&mut self) -> YamlResult<()> {
        match self.closed {
            None => Err(serializer_error("serializer is not opened")),
            Some(true) => Ok(()),
            Some(false) => {
                debug!("serializer closed");
                self.sink.emit(Event::synthetic(EventType::StreamEnd))?;
                self.closed = Some(true);
                self.anchors.clear();
                self.serialized.clear();
                Ok(())
            }
        }
    }

    pub fn serialize(&mut self, graph: &NodeGraph) -> YamlResult<()> {
        match self.closed {
            None => return Err(serializer_error("serializer is not opened")),
            Some(true) => return Err(serializer_error("serializer is closed")),
            Some(false) => {}
        }
        let root = graph
            .root()
            .ok_or_else(|| serializer_error("document has no root node"))?;
        debug!(nodes = graph.len(), "serializing document");
        self.sink.emit(Event::synthetic(EventType::DocumentStart {
            explicit: self.options.explicit_start,
            version: self.options.version,
            tags: self.options.tags.clone(),
        }))?;
        self.anchor_node(graph, root);
        let root_tag = self.explicit_root.clone();
        self.serialize_node(graph, root, root_tag.as_deref())?;
        self.sink.emit(Event::synthetic(EventType::DocumentEnd {
            explicit: self.options.explicit_end,
        }))?;
        self.anchors.clear();
        self.serialized.clear();
        Ok(())
    }

    /// First pass: a node seen twice gets a name. Nodes that carried an
    /// anchor when composed get one right away.
    fn anchor_node(&mut self, graph: &NodeGraph, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(anchor) = self.anchors.get_mut(&id) {
                if anchor.is_none() {
                    *anchor = Some(self.anchor_generator.next_anchor());
                }
                continue;
            }
            let anchor = graph[id]
                .anchor
                .as_ref()
                .map(|_| self.anchor_generator.next_anchor());
            self.anchors.insert(id, anchor);
            let mut children = graph[id].children();
            children.reverse();
            stack.extend(children);
        }
    }

    fn serialize_comments(&mut self, lines: &[CommentLine]) -> YamlResult<()> {
        if !self.options.process_comments {
            return Ok(());
        }
        for line in lines {
            self.sink.emit(line.to_event())?;
        }
        Ok(())
    }

    fn serialize_node(
        &mut self,
        graph: &NodeGraph,
        id: NodeId,
        tag_override: Option<&str>,
    ) -> YamlResult<()> {
        let anchor = self.anchors.get(&id).cloned().flatten();
        if !self.serialized.insert(id) {
            let anchor = anchor.ok_or_else(|| serializer_error("alias to a node without anchor"))?;
            return self
                .sink
                .emit(Event::synthetic(EventType::Alias { anchor }));
        }
        let node = &graph[id];
        let tag = tag_override.unwrap_or(&node.tag);
        self.serialize_comments(&node.block_comments)?;
        match &node.data {
            NodeData::Scalar { value, style } => {
                let detected = self.resolver.resolve(NodeKind::Scalar, value, true);
                let default = self.resolver.resolve(NodeKind::Scalar, value, false);
                self.sink.emit(Event::synthetic(EventType::Scalar {
                    anchor,
                    tag: Some(tag.to_string()),
                    implicit: ImplicitTuple::new(tag == detected, tag == default),
                    value: value.clone(),
                    style: *style,
                }))?;
            }
            NodeData::Sequence { items, flow_style } => {
                let implicit = tag == self.resolver.resolve(NodeKind::Sequence, "", true);
                self.sink.emit(Event::synthetic(EventType::SequenceStart {
                    anchor,
                    tag: Some(tag.to_string()),
                    implicit,
                    flow_style: *flow_style,
                }))?;
                for &item in items {
                    self.serialize_node(graph, item, None)?;
                }
                self.sink.emit(Event::synthetic(EventType::SequenceEnd))?;
            }
            NodeData::Mapping { .. } if tag == tags::COMMENT => {}
            NodeData::Mapping {
                pairs, flow_style, ..
            } => {
                let implicit = tag == self.resolver.resolve(NodeKind::Mapping, "", true);
                self.sink.emit(Event::synthetic(EventType::MappingStart {
                    anchor,
                    tag: Some(tag.to_string()),
                    implicit,
                    flow_style: *flow_style,
                }))?;
                for &(key, value) in pairs {
                    self.serialize_node(graph, key, None)?;
                    self.serialize_node(graph, value, None)?;
                }
                self.sink.emit(Event::synthetic(EventType::MappingEnd))?;
            }
        }
        self.serialize_comments(&node.inline_comments)?;
        self.serialize_comments(&node.end_comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebuild::Node;
    use yam_common::{EventKind, FlowStyle, ScalarType};

    fn events(graph: &NodeGraph) -> Vec<Event> {
        let resolver = Resolver::default();
        let options = DumperOptions::default();
        let mut serializer = Serializer::new(Vec::new(), &resolver, &options);
        serializer.open().expect("open");
        serializer.serialize(graph).expect("serialize");
        serializer.close().expect("close");
        serializer.into_inner()
    }

    #[test]
    fn lifecycle() {
        let resolver = Resolver::default();
        let options = DumperOptions::default();
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::scalar(tags::STR, "a", ScalarType::Plain));
        graph.set_root(root);

        let mut serializer = Serializer::new(Vec::new(), &resolver, &options);
        let err = serializer.serialize(&graph).expect_err("not opened");
        assert_eq!(err.to_string(), serializer_error("serializer is not opened").to_string());
        assert!(serializer.close().is_err());
        serializer.open().expect("open");
        let err = serializer.open().expect_err("twice");
        assert_eq!(
            err.to_string(),
            serializer_error("serializer is already opened").to_string()
        );
        serializer.close().expect("close");
        let err = serializer.serialize(&graph).expect_err("closed");
        assert_eq!(err.to_string(), serializer_error("serializer is closed").to_string());
        let err = serializer.open().expect_err("closed");
        assert_eq!(err.to_string(), serializer_error("serializer is closed").to_string());
    }

    #[test]
    fn implicit_flags() {
        let mut graph = NodeGraph::new();
        let int = graph.add(Node::scalar(tags::INT, "12", ScalarType::Plain));
        let quoted = graph.add(Node::scalar(tags::STR, "12", ScalarType::Plain));
        let seq = graph.add(Node::sequence(tags::SEQ, vec![int, quoted], FlowStyle::Block));
        graph.set_root(seq);

        let events = events(&graph);
        let kinds: Vec<EventKind> = events.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::StreamStart,
                EventKind::DocumentStart,
                EventKind::SequenceStart,
                EventKind::Scalar,
                EventKind::Scalar,
                EventKind::SequenceEnd,
                EventKind::DocumentEnd,
                EventKind::StreamEnd,
            ]
        );
        let implicit: Vec<ImplicitTuple> = events
            .iter()
            .filter_map(|ev| match &ev.event_type {
                EventType::Scalar { implicit, .. } => Some(*implicit),
                _ => None,
            })
            .collect();
        assert_eq!(implicit[0], ImplicitTuple::new(true, false));
        assert_eq!(implicit[1], ImplicitTuple::new(false, true));
        assert!(matches!(
            events[2].event_type,
            EventType::SequenceStart { implicit: true, .. }
        ));
    }

    #[test]
    fn shared_nodes_become_aliases() {
        let mut graph = NodeGraph::new();
        let shared = graph.add(Node::sequence(tags::SEQ, vec![], FlowStyle::Flow));
        let root = graph.add(Node::sequence(tags::SEQ, vec![shared, shared], FlowStyle::Block));
        graph.set_root(root);

        let events = events(&graph);
        assert_eq!(events[3].event_type.anchor(), Some("id001"));
        assert!(matches!(
            &events[5].event_type,
            EventType::Alias { anchor } if anchor == "id001"
        ));
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::sequence(tags::SEQ, vec![], FlowStyle::Block));
        graph.push_item(root, root);
        graph.set_root(root);

        let events = events(&graph);
        assert_eq!(events[2].event_type.anchor(), Some("id001"));
        assert!(matches!(events[3].event_type, EventType::Alias { .. }));
        assert!(events[4].is(EventKind::SequenceEnd));
    }

    #[test]
    fn explicit_root_tag() {
        let resolver = Resolver::default();
        let options = DumperOptions::default();
        let mut graph = NodeGraph::new();
        let root = graph.add(Node::mapping(tags::MAP, vec![], FlowStyle::Block));
        graph.set_root(root);

        let mut serializer = Serializer::new(Vec::new(), &resolver, &options)
            .with_root_tag(Some("!point".to_string()));
        serializer.open().expect("open");
        serializer.serialize(&graph).expect("serialize");
        let events = serializer.into_inner();
        assert!(matches!(
            &events[2].event_type,
            EventType::MappingStart { tag: Some(tag), implicit: false, .. } if tag == "!point"
        ));
    }
}
