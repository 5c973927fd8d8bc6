use crate::comments::{collect_any, CommentCollector, CommentLine};
use crate::options::LoaderOptions;
use crate::resolver::Resolver;
use crate::tokenizer::{Parser, Scanner};
use crate::treebuild::node::{Node, NodeData, NodeGraph, NodeId, NodeKind};
use hashbrown::{HashMap, HashSet};
use std::str::Chars;
use tracing::debug;
use yam_common::{tags, Event, EventKind, EventType, FlowStyle, Span, YamlError, YamlResult};

///
/// Builds node graphs out of parser events, one document at a time.
///
/// Anchors are registered before the children of a collection are composed, so
/// an alias can point at one of its own ancestors. Such a node is flagged as
/// `two_steps` and constructed after its contents.
///
/// # Methods
/// - [`Composer::check_node`] tells whether another document follows.
/// - [`Composer::get_node`] composes the next document.
/// - [`Composer::get_single_node`] composes a stream that must hold at most one document.
pub struct Composer<'r, I> {
    parser: Parser<I>,
    resolver: &'r Resolver,
    options: LoaderOptions,
    graph: NodeGraph,
    anchors: HashMap<String, NodeId>,
    /// Collections whose children are still being composed.
    recursive: HashSet<NodeId>,
    non_scalar_aliases: usize,
    block_comments: CommentCollector,
    inline_comments: CommentCollector,
}

impl<'r, 'a> Composer<'r, Chars<'a>> {
    /// Composer over a string, with a scanner set up from `options`.
    #[must_use]
    pub fn from_str(
        input: &'a str,
        resolver: &'r Resolver,
        options: LoaderOptions,
    ) -> Composer<'r, Chars<'a>> {
        let mut scanner = Scanner::new_from_str(input);
        scanner
            .emit_comments(options.process_comments)
            .simple_key_window(options.simple_key_window);
        Composer::new(Parser::new(scanner), resolver, options)
    }
}

impl<'r, I: Iterator<Item = char>> Composer<'r, I> {
    pub fn new(parser: Parser<I>, resolver: &'r Resolver, options: LoaderOptions) -> Self {
        Composer {
            parser,
            resolver,
            options,
            graph: NodeGraph::new(),
            anchors: HashMap::new(),
            recursive: HashSet::new(),
            non_scalar_aliases: 0,
            block_comments: CommentCollector::block(),
            inline_comments: CommentCollector::inline(),
        }
    }

    pub fn check_node(&mut self) -> YamlResult<bool> {
        if self.parser.check_event(EventKind::StreamStart)? {
            self.parser.get_event()?;
        }
        Ok(!self.parser.check_event(EventKind::StreamEnd)?)
    }

    /// Composes the next document. A stream that ends with nothing but comments
    /// gives an empty mapping tagged [`tags::COMMENT`] holding them; `None` means
    /// there is nothing left at all.
    pub fn get_node(&mut self) -> YamlResult<Option<NodeGraph>> {
        if self.parser.check_event(EventKind::StreamStart)? {
            self.parser.get_event()?;
        }
        self.block_comments.collect(&mut self.parser)?;
        if self.parser.check_event(EventKind::StreamEnd)? {
            let lines = self.block_comments.consume();
            let Some(first) = lines.first() else {
                return Ok(None);
            };
            let start = first.span.start;
            let mut graph = NodeGraph::new();
            let mut node = Node::mapping(tags::COMMENT, Vec::new(), FlowStyle::Block);
            node.span = Span::empty(start);
            node.block_comments = lines;
            let root = graph.add(node);
            graph.set_root(root);
            return Ok(Some(graph));
        }

        let doc_start = self.next_event()?;
        if !doc_start.is(EventKind::DocumentStart) {
            return Err(unexpected(&doc_start, "expected <document start>"));
        }
        debug!("composing document at {}", doc_start.span.start);
        let leading = self.block_comments.consume();
        let root = self.compose_node(None, leading)?;

        self.block_comments.collect(&mut self.parser)?;
        if !self.block_comments.is_empty() {
            self.graph[root].end_comments = self.block_comments.consume();
        }
        let doc_end = self.next_event()?;
        if !doc_end.is(EventKind::DocumentEnd) {
            return Err(unexpected(&doc_end, "expected <document end>"));
        }

        self.anchors.clear();
        self.recursive.clear();
        self.non_scalar_aliases = 0;
        let mut graph = std::mem::take(&mut self.graph);
        graph.set_root(root);
        Ok(Some(graph))
    }

    /// Composes the only document of the stream, failing when a second one follows.
    pub fn get_single_node(&mut self) -> YamlResult<Option<NodeGraph>> {
        self.next_event()?;
        self.skip_comments()?;
        let mut document = None;
        if !self.parser.check_event(EventKind::StreamEnd)? {
            document = self.get_node()?;
        }
        self.skip_comments()?;
        if !self.parser.check_event(EventKind::StreamEnd)? {
            let event = self.next_event()?;
            let context_mark = document
                .as_ref()
                .and_then(NodeGraph::root_node)
                .map(|node| node.span.start);
            return Err(YamlError::composer(
                Some("expected a single document in the stream"),
                context_mark,
                "but found another document",
                Some(event.span.start),
            ));
        }
        self.next_event()?;
        Ok(document)
    }

    fn skip_comments(&mut self) -> YamlResult<()> {
        while self.parser.check_event(EventKind::Comment)? {
            self.parser.get_event()?;
        }
        Ok(())
    }

    fn next_event(&mut self) -> YamlResult<Event> {
        self.parser.get_event()?.ok_or_else(|| {
            YamlError::composer(None, None, "unexpected end of the event stream", None)
        })
    }

    fn compose_node(
        &mut self,
        parent: Option<NodeId>,
        block_comments: Vec<CommentLine>,
    ) -> YamlResult<NodeId> {
        if let Some(parent) = parent {
            self.recursive.insert(parent);
        }

        let id = if self.parser.check_event(EventKind::Alias)? {
            let event = self.next_event()?;
            let EventType::Alias { anchor } = &event.event_type else {
                return Err(unexpected(&event, "expected an alias"));
            };
            let Some(&id) = self.anchors.get(anchor) else {
                return Err(YamlError::composer(
                    None,
                    None,
                    format!("found undefined alias {anchor}"),
                    Some(event.span.start),
                ));
            };
            if self.graph[id].kind() != NodeKind::Scalar {
                self.non_scalar_aliases += 1;
                if self.non_scalar_aliases > self.options.max_aliases_for_collections {
                    return Err(YamlError::AliasLimit(
                        self.options.max_aliases_for_collections,
                    ));
                }
            }
            if self.recursive.remove(&id) {
                self.graph[id].two_steps = true;
            }
            if !block_comments.is_empty() {
                self.graph[id].block_comments = block_comments;
            }
            id
        } else {
            let event = self.next_event()?;
            match event.event_type {
                EventType::Scalar { .. } => self.compose_scalar(event, block_comments)?,
                EventType::SequenceStart { .. } => self.compose_sequence(event, block_comments)?,
                EventType::MappingStart { .. } => self.compose_mapping(event, block_comments)?,
                _ => return Err(unexpected(&event, "expected a node")),
            }
        };

        if let Some(parent) = parent {
            self.recursive.remove(&parent);
        }
        Ok(id)
    }

    fn register(&mut self, anchor: Option<String>, node: Node) -> NodeId {
        let id = self.graph.add(node);
        if let Some(anchor) = anchor {
            if let Some(previous) = self.anchors.get(&anchor) {
                debug!(
                    "anchor {anchor} redefined, first at {}, again at {}",
                    self.graph[*previous].span.start, self.graph[id].span.start
                );
            }
            self.graph[id].anchor = Some(anchor.clone());
            self.anchors.insert(anchor, id);
        }
        id
    }

    fn node_tag(&self, tag: Option<String>, kind: NodeKind, value: &str, implicit: bool) -> (String, bool) {
        match tag {
            Some(tag) if tag != tags::NON_SPECIFIC => (tag, false),
            _ => (self.resolver.resolve(kind, value, implicit), true),
        }
    }

    fn compose_scalar(
        &mut self,
        event: Event,
        block_comments: Vec<CommentLine>,
    ) -> YamlResult<NodeId> {
        let span = event.span;
        let EventType::Scalar {
            anchor,
            tag,
            implicit,
            value,
            style,
        } = event.event_type
        else {
            return Err(YamlError::composer(None, None, "expected a scalar", Some(span.start)));
        };
        let (tag, resolved) = self.node_tag(tag, NodeKind::Scalar, &value, implicit.plain);
        let mut node = Node::new(tag, NodeData::Scalar { value, style });
        node.span = span;
        node.resolved = resolved;
        node.block_comments = block_comments;
        let id = self.register(anchor, node);
        self.graph[id].inline_comments = self.inline_comments.collect(&mut self.parser)?.consume();
        Ok(id)
    }

    fn compose_sequence(
        &mut self,
        start: Event,
        block_comments: Vec<CommentLine>,
    ) -> YamlResult<NodeId> {
        let span = start.span;
        let EventType::SequenceStart {
            anchor,
            tag,
            implicit,
            flow_style,
        } = start.event_type
        else {
            return Err(YamlError::composer(None, None, "expected a sequence", Some(span.start)));
        };
        let (tag, resolved) = self.node_tag(tag, NodeKind::Sequence, "", implicit);
        let mut node = Node::sequence(tag, Vec::new(), flow_style);
        node.span = span;
        node.resolved = resolved;
        node.block_comments = block_comments;
        let id = self.register(anchor, node);
        self.graph[id].inline_comments = self.inline_comments.collect(&mut self.parser)?.consume();

        while !self.parser.check_event(EventKind::SequenceEnd)? {
            let mut leading = self.block_comments.consume();
            collect_any(&mut self.parser, &mut leading)?;
            if self.parser.check_event(EventKind::SequenceEnd)? {
                self.block_comments.extend(leading);
                break;
            }
            let item = self.compose_node(Some(id), leading)?;
            self.graph.push_item(id, item);
        }
        let end = self.next_event()?;
        self.finish_collection(id, &end)?;
        Ok(id)
    }

    fn compose_mapping(
        &mut self,
        start: Event,
        block_comments: Vec<CommentLine>,
    ) -> YamlResult<NodeId> {
        let span = start.span;
        let EventType::MappingStart {
            anchor,
            tag,
            implicit,
            flow_style,
        } = start.event_type
        else {
            return Err(YamlError::composer(None, None, "expected a mapping", Some(span.start)));
        };
        let (tag, resolved) = self.node_tag(tag, NodeKind::Mapping, "", implicit);
        let mut node = Node::mapping(tag, Vec::new(), flow_style);
        node.span = span;
        node.resolved = resolved;
        node.block_comments = block_comments;
        let id = self.register(anchor, node);
        self.graph[id].inline_comments = self.inline_comments.collect(&mut self.parser)?.consume();

        while !self.parser.check_event(EventKind::MappingEnd)? {
            let mut leading = self.block_comments.consume();
            collect_any(&mut self.parser, &mut leading)?;
            if self.parser.check_event(EventKind::MappingEnd)? {
                self.block_comments.extend(leading);
                break;
            }
            let key = self.compose_node(Some(id), leading)?;
            if self.graph[key].tag == tags::MERGE {
                if let NodeData::Mapping { merged, .. } = &mut self.graph[id].data {
                    *merged = true;
                }
            }
            let mut value_comments = Vec::new();
            collect_any(&mut self.parser, &mut value_comments)?;
            let value = self.compose_node(Some(id), value_comments)?;
            self.graph.push_pair(id, key, value);
        }
        let end = self.next_event()?;
        self.finish_collection(id, &end)?;
        Ok(id)
    }

    fn finish_collection(&mut self, id: NodeId, end: &Event) -> YamlResult<()> {
        self.graph[id].span.end = end.span.end;
        self.inline_comments.collect(&mut self.parser)?;
        if !self.inline_comments.is_empty() {
            self.graph[id].inline_comments = self.inline_comments.consume();
        }
        Ok(())
    }
}

impl<'r, I: Iterator<Item = char>> Iterator for Composer<'r, I> {
    type Item = YamlResult<NodeGraph>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.check_node() {
            Ok(true) => self.get_node().transpose(),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

fn unexpected(event: &Event, context: &str) -> YamlError {
    YamlError::composer(
        Some(context),
        None,
        format!("but found {}", event.kind()),
        Some(event.span.start),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::{CommentType, ScalarType};

    fn compose(input: &str) -> YamlResult<NodeGraph> {
        let resolver = Resolver::default();
        let mut composer = Composer::from_str(input, &resolver, LoaderOptions::default());
        composer
            .get_single_node()
            .map(|graph| graph.unwrap_or_default())
    }

    fn compose_with(input: &str, options: LoaderOptions) -> YamlResult<NodeGraph> {
        let resolver = Resolver::default();
        let mut composer = Composer::from_str(input, &resolver, options);
        composer
            .get_single_node()
            .map(|graph| graph.unwrap_or_default())
    }

    fn pair_ids(graph: &NodeGraph, id: NodeId) -> Vec<(NodeId, NodeId)> {
        match &graph[id].data {
            NodeData::Mapping { pairs, .. } => pairs.clone(),
            _ => panic!("not a mapping"),
        }
    }

    #[test]
    fn resolves_scalar_tags() {
        let graph = compose("a: 1\nb: '1'\nc: !!str 2\nd: ! 3\n").expect("compose");
        let root = graph.root().expect("root");
        let pairs = pair_ids(&graph, root);
        assert_eq!(graph[root].tag, tags::MAP);
        assert!(graph[root].resolved);
        assert_eq!(graph[pairs[0].1].tag, tags::INT);
        assert_eq!(graph[pairs[1].1].tag, tags::STR);
        assert_eq!(graph[pairs[2].1].tag, tags::STR);
        assert!(!graph[pairs[2].1].resolved);
        // `!` goes through the resolver like an untagged scalar
        assert_eq!(graph[pairs[3].1].tag, tags::INT);
        assert!(graph[pairs[3].1].resolved);
    }

    #[test]
    fn aliases_share_ids() {
        let graph = compose("a: &x [1, 2]\nb: *x\n").expect("compose");
        let root = graph.root().expect("root");
        let pairs = pair_ids(&graph, root);
        assert_eq!(pairs[0].1, pairs[1].1);
        assert_eq!(graph[pairs[0].1].anchor.as_deref(), Some("x"));
        assert_eq!(graph[pairs[0].1].flow_style(), FlowStyle::Flow);
    }

    #[test]
    fn undefined_alias() {
        let err = compose("a: *missing\n").expect_err("undefined alias");
        assert_eq!(err.problem(), "found undefined alias missing");
    }

    #[test]
    fn self_reference_is_two_step() {
        let graph = compose("&a [*a]\n").expect("compose");
        let root = graph.root().expect("root");
        assert!(graph[root].two_steps);
        assert_eq!(graph[root].children(), vec![root]);
    }

    #[test]
    fn collection_alias_limit() {
        let input = "a: &a [x]\nb: [*a, *a, *a]\n";
        let options = LoaderOptions {
            max_aliases_for_collections: 2,
            ..LoaderOptions::default()
        };
        let err = compose_with(input, options).expect_err("too many aliases");
        assert_eq!(err, YamlError::AliasLimit(2));

        let scalars = "a: &a x\nb: [*a, *a, *a]\n";
        let options = LoaderOptions {
            max_aliases_for_collections: 2,
            ..LoaderOptions::default()
        };
        assert!(compose_with(scalars, options).is_ok());
    }

    #[test]
    fn merge_key_marks_mapping() {
        let graph = compose("base: &b {a: 1}\nderived:\n  <<: *b\n  c: 2\n").expect("compose");
        let root = graph.root().expect("root");
        let derived = pair_ids(&graph, root)[1].1;
        assert!(matches!(
            graph[derived].data,
            NodeData::Mapping { merged: true, .. }
        ));
        assert!(matches!(
            graph[root].data,
            NodeData::Mapping { merged: false, .. }
        ));
    }

    #[test]
    fn single_document_only() {
        let err = compose("a\n---\nb\n").expect_err("two documents");
        let marked = err.marked().expect("marked");
        assert_eq!(
            marked.context.as_deref(),
            Some("expected a single document in the stream")
        );
        assert_eq!(marked.problem, "but found another document");
    }

    #[test]
    fn empty_stream() {
        let resolver = Resolver::default();
        let mut composer = Composer::from_str("", &resolver, LoaderOptions::default());
        assert!(composer.get_single_node().expect("compose").is_none());
        let mut composer = Composer::from_str("", &resolver, LoaderOptions::default());
        assert!(!composer.check_node().expect("check"));
    }

    #[test]
    fn documents_reset_anchors() {
        let resolver = Resolver::default();
        let mut composer =
            Composer::from_str("--- &a x\n--- *a\n", &resolver, LoaderOptions::default());
        assert!(composer.next().expect("first").is_ok());
        let err = composer.next().expect("second").expect_err("anchor is gone");
        assert_eq!(err.problem(), "found undefined alias a");
    }

    #[test]
    fn comments_attach_to_nodes() {
        let options = LoaderOptions {
            process_comments: true,
            ..LoaderOptions::default()
        };
        let graph = compose_with("# head\na: 1 # tail\n# end\n", options).expect("compose");
        let root = graph.root().expect("root");
        let key = pair_ids(&graph, root)[0].0;
        let value = pair_ids(&graph, root)[0].1;
        assert_eq!(graph[root].block_comments.len(), 1);
        assert_eq!(graph[root].block_comments[0].value, " head");
        assert_eq!(graph[value].inline_comments[0].value, " tail");
        assert_eq!(graph[value].inline_comments[0].comment_type, CommentType::InLine);
        assert!(graph[key].inline_comments.is_empty());
        assert_eq!(graph[root].end_comments[0].value, " end");
    }

    #[test]
    fn comment_only_stream() {
        let options = LoaderOptions {
            process_comments: true,
            ..LoaderOptions::default()
        };
        let resolver = Resolver::default();
        let mut composer = Composer::from_str("# only\n", &resolver, options);
        let graph = composer.get_node().expect("compose").expect("comment node");
        let root = graph.root_node().expect("root");
        assert_eq!(root.tag, tags::COMMENT);
        assert_eq!(root.block_comments[0].value, " only");
        assert_eq!(root.children(), Vec::<NodeId>::new());
    }

    #[test]
    fn spans_cover_collections() {
        let graph = compose("[a, b]").expect("compose");
        let root = graph.root_node().expect("root");
        assert_eq!(root.span.start.pos, 0);
        assert_eq!(root.span.end.pos, 6);
        let first = graph[root.children()[0]].clone();
        assert!(matches!(
            first.data,
            NodeData::Scalar { ref value, style: ScalarType::Plain } if value == "a"
        ));
    }
}
