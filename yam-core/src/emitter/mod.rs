//! Events to text.

pub use analysis::{analyze_scalar, choose_scalar_style, ScalarAnalysis, StyleContext};
pub use serializer::{EventSink, Serializer};

mod analysis;
mod serializer;

use crate::comments::CommentLine;
use crate::options::DumperOptions;
use crate::tokenizer::char_utils::{escape_char, is_alpha, is_break, is_printable, is_uri_char};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};
use yam_common::{
    tags, CommentType, Event, EventType, ImplicitTuple, ScalarType, Version, YamlError,
    YamlResult,
};

const DEFAULT_TAG_PREFIXES: [(&str, &str); 2] = [("!", "!"), (tags::PREFIX, "!!")];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum EmitterState {
    StreamStart,
    DocumentStart { first: bool },
    DocumentRoot,
    DocumentEnd,
    FlowSequenceItem { first: bool },
    FlowMappingKey { first: bool },
    FlowMappingSimpleValue,
    FlowMappingValue,
    BlockSequenceItem { first: bool },
    BlockMappingKey { first: bool },
    BlockMappingSimpleValue,
    BlockMappingValue,
    Nothing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Comments {
    /// Blank lines and comments on their own line.
    Block,
    InLine,
}

impl Comments {
    fn accepts(self, event: &Event) -> bool {
        match &event.event_type {
            EventType::Comment { comment_type, .. } => match self {
                Comments::Block => {
                    matches!(comment_type, CommentType::BlankLine | CommentType::Block)
                }
                Comments::InLine => *comment_type == CommentType::InLine,
            },
            _ => false,
        }
    }
}

fn emitter_error(problem: impl Into<String>) -> YamlError {
    YamlError::Emitter(problem.into())
}

fn unexpected(expected: &str, event: Option<&Event>) -> YamlError {
    match event {
        Some(event) => emitter_error(format!("expected {expected}, but got {}", event.kind())),
        None => emitter_error(format!("expected {expected}, but got nothing")),
    }
}

///
/// Writes events as YAML text.
///
/// Events are queued until enough lookahead is available to decide on the
/// layout: one event after a document start or a scalar, two after a
/// sequence start and three after a mapping start. Like the parser, the
/// emitter is a pushdown automaton over [`EmitterState`].
///
/// # Methods
/// - `emit(event)`: Queue an event and write whatever it unblocks.
pub struct Emitter<'w> {
    writer: &'w mut dyn fmt::Write,
    states: Vec<EmitterState>,
    state: EmitterState,
    events: VecDeque<Event>,
    event: Option<Event>,
    indents: Vec<Option<usize>>,
    indent: Option<usize>,
    flow_level: usize,

    root_context: bool,
    mapping_context: bool,
    simple_key_context: bool,

    column: usize,
    whitespace: bool,
    indention: bool,
    open_ended: bool,

    canonical: bool,
    pretty_flow: bool,
    allow_unicode: bool,
    best_indent: usize,
    indicator_indent: usize,
    indent_with_indicator: bool,
    best_width: usize,
    best_line_break: &'static str,
    split_lines: bool,
    max_simple_key_length: usize,
    emit_comments: bool,

    /// Known tag prefixes and their handles, in declaration order.
    tag_prefixes: Vec<(String, String)>,
    prepared_anchor: Option<String>,
    prepared_tag: Option<String>,
    analysis: Option<ScalarAnalysis>,
    style: Option<ScalarType>,

    block_comments: Vec<CommentLine>,
    inline_comments: Vec<CommentLine>,
}

impl<'w> Emitter<'w> {
    pub fn new(writer: &'w mut dyn fmt::Write, options: &DumperOptions) -> Self {
        let indent = options.indent();
        let best_indent = if indent > 1 && indent < 10 { indent } else { 2 };
        let best_width = if options.width > best_indent * 2 {
            options.width
        } else {
            80
        };
        Emitter {
            writer,
            states: Vec::with_capacity(100),
            state: EmitterState::StreamStart,
            events: VecDeque::with_capacity(100),
            event: None,
            indents: Vec::with_capacity(10),
            indent: None,
            flow_level: 0,
            root_context: false,
            mapping_context: false,
            simple_key_context: false,
            column: 0,
            whitespace: true,
            indention: true,
            open_ended: false,
            canonical: options.canonical,
            pretty_flow: options.pretty_flow,
            allow_unicode: options.allow_unicode,
            best_indent,
            indicator_indent: options.indicator_indent(),
            indent_with_indicator: options.indent_with_indicator,
            best_width,
            best_line_break: options.line_break.as_str(),
            split_lines: options.split_lines,
            max_simple_key_length: options.max_simple_key_length(),
            emit_comments: options.process_comments,
            tag_prefixes: Vec::new(),
            prepared_anchor: None,
            prepared_tag: None,
            analysis: None,
            style: None,
            block_comments: Vec::new(),
            inline_comments: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) -> YamlResult<()> {
        trace!(kind = %event.kind(), "emit");
        self.events.push_back(event);
        while !self.need_more_events() {
            self.event = self.events.pop_front();
            self.state_machine()?;
            self.event = None;
        }
        Ok(())
    }

    fn need_more_events(&self) -> bool {
        let mut iter = self.events.iter().skip_while(|ev| ev.is_comment());
        let Some(head) = iter.next() else {
            return true;
        };
        let count = match head.event_type {
            EventType::DocumentStart { .. } => 1,
            EventType::SequenceStart { .. } | EventType::StreamStart => 2,
            EventType::MappingStart { .. } => 3,
            EventType::StreamEnd => return false,
            _ => 1,
        };
        let mut level: isize = 0;
        let mut actual = 0;
        for event in iter.filter(|ev| !ev.is_comment()) {
            actual += 1;
            match event.event_type {
                EventType::DocumentStart { .. }
                | EventType::SequenceStart { .. }
                | EventType::MappingStart { .. } => level += 1,
                EventType::DocumentEnd { .. }
                | EventType::SequenceEnd
                | EventType::MappingEnd => level -= 1,
                EventType::StreamEnd => level = -1,
                _ => {}
            }
            if level < 0 {
                return false;
            }
        }
        actual < count
    }

    fn state_machine(&mut self) -> YamlResult<()> {
        match self.state {
            EmitterState::StreamStart => self.expect_stream_start(),
            EmitterState::DocumentStart { first } => self.expect_document_start(first),
            EmitterState::DocumentRoot => self.expect_document_root(),
            EmitterState::DocumentEnd => self.expect_document_end(),
            EmitterState::FlowSequenceItem { first } => self.expect_flow_sequence_item(first),
            EmitterState::FlowMappingKey { first } => self.expect_flow_mapping_key(first),
            EmitterState::FlowMappingSimpleValue => self.expect_flow_mapping_simple_value(),
            EmitterState::FlowMappingValue => self.expect_flow_mapping_value(),
            EmitterState::BlockSequenceItem { first } => self.expect_block_sequence_item(first),
            EmitterState::BlockMappingKey { first } => self.expect_block_mapping_key(first),
            EmitterState::BlockMappingSimpleValue => self.expect_block_mapping_simple_value(),
            EmitterState::BlockMappingValue => self.expect_block_mapping_value(),
            EmitterState::Nothing => Err(unexpected("nothing", self.event.as_ref())),
        }
    }

    fn pop_state(&mut self) -> YamlResult<()> {
        self.state = self
            .states
            .pop()
            .ok_or_else(|| emitter_error("unbalanced collection end"))?;
        Ok(())
    }

    fn pop_indent(&mut self) {
        self.indent = self.indents.pop().flatten();
    }

    fn event_type(&self) -> Option<&EventType> {
        self.event.as_ref().map(|ev| &ev.event_type)
    }

    fn event_is_comment(&self) -> bool {
        self.event.as_ref().map_or(false, Event::is_comment)
    }

    // Comments

    fn comments_mut(&mut self, which: Comments) -> &mut Vec<CommentLine> {
        match which {
            Comments::Block => &mut self.block_comments,
            Comments::InLine => &mut self.inline_comments,
        }
    }

    fn collect_queued(&mut self, which: Comments) {
        while self.events.front().map_or(false, |ev| which.accepts(ev)) {
            if let Some(line) = self.events.pop_front().as_ref().and_then(CommentLine::from_event) {
                self.comments_mut(which).push(line);
            }
        }
    }

    /// Takes the current event if it is an accepted comment, together with
    /// the accepted comments queued right behind it.
    fn collect_current(&mut self, which: Comments) {
        if self.event.as_ref().map_or(false, |ev| which.accepts(ev)) {
            if let Some(line) = self.event.take().as_ref().and_then(CommentLine::from_event) {
                self.comments_mut(which).push(line);
            }
            self.collect_queued(which);
        }
    }

    /// [`Emitter::collect_current`], then moves on to the next queued event
    /// when the current one was consumed.
    fn collect_and_poll(&mut self, which: Comments) {
        if self.event.as_ref().map_or(false, |ev| which.accepts(ev)) {
            self.collect_current(which);
            self.event = self.events.pop_front();
        }
    }

    fn write_block_comment(&mut self) -> YamlResult<()> {
        let lines = std::mem::take(&mut self.block_comments);
        if self.emit_comments && !lines.is_empty() {
            self.write_indent()?;
        }
        self.write_comment_lines(&lines)?;
        Ok(())
    }

    fn write_inline_comments(&mut self) -> YamlResult<bool> {
        let lines = std::mem::take(&mut self.inline_comments);
        self.write_comment_lines(&lines)
    }

    fn write_comment_lines(&mut self, lines: &[CommentLine]) -> YamlResult<bool> {
        if !self.emit_comments {
            return Ok(false);
        }
        let mut indent_columns = 0;
        let mut first = true;
        for line in lines {
            if line.comment_type != CommentType::BlankLine {
                if first {
                    first = false;
                    self.write_indicator(
                        "#",
                        line.comment_type == CommentType::InLine,
                        false,
                        false,
                    )?;
                    indent_columns = self.column.saturating_sub(1);
                } else {
                    self.write_whitespace(indent_columns)?;
                    self.write_indicator("#", false, false, false)?;
                }
                self.writer.write_str(&line.value)?;
                self.write_line_break(None)?;
            } else {
                self.write_line_break(None)?;
                self.write_indent()?;
            }
        }
        Ok(!lines.is_empty())
    }

    // Stream and documents

    fn expect_stream_start(&mut self) -> YamlResult<()> {
        match self.event_type() {
            Some(EventType::StreamStart) => {
                self.state = EmitterState::DocumentStart { first: true };
                Ok(())
            }
            _ => Err(unexpected("StreamStartEvent", self.event.as_ref())),
        }
    }

    fn expect_document_start(&mut self, first: bool) -> YamlResult<()> {
        let Some(event) = self.event.take() else {
            return Err(unexpected("DocumentStartEvent", None));
        };
        match event.event_type {
            EventType::DocumentStart {
                explicit,
                version,
                tags,
            } => {
                debug!(explicit, first, "emitting document");
                if (version.is_some() || !tags.is_empty()) && self.open_ended {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                if let Some(version) = version {
                    let text = prepare_version(version)?;
                    self.write_version_directive(&text)?;
                }
                self.tag_prefixes = DEFAULT_TAG_PREFIXES
                    .iter()
                    .map(|(prefix, handle)| ((*prefix).to_string(), (*handle).to_string()))
                    .collect();
                let mut directives = tags.clone();
                directives.sort_unstable();
                for (handle, prefix) in directives {
                    let handle_text = prepare_tag_handle(&handle)?;
                    let prefix_text = prepare_tag_prefix(&prefix)?;
                    match self.tag_prefixes.iter_mut().find(|(p, _)| *p == prefix) {
                        Some(entry) => entry.1 = handle.clone(),
                        None => self.tag_prefixes.push((prefix.clone(), handle.clone())),
                    }
                    self.write_tag_directive(&handle_text, &prefix_text)?;
                }
                let implicit = first
                    && !explicit
                    && !self.canonical
                    && version.is_none()
                    && tags.is_empty()
                    && !self.check_empty_document();
                if !implicit {
                    self.write_indent()?;
                    self.write_indicator("---", true, false, false)?;
                    if self.canonical {
                        self.write_indent()?;
                    }
                }
                self.state = EmitterState::DocumentRoot;
                Ok(())
            }
            EventType::StreamEnd => {
                self.state = EmitterState::Nothing;
                Ok(())
            }
            EventType::Comment { .. } => {
                self.event = Some(event);
                self.collect_current(Comments::Block);
                self.write_block_comment()
            }
            _ => Err(unexpected("DocumentStartEvent", Some(&event))),
        }
    }

    fn expect_document_root(&mut self) -> YamlResult<()> {
        self.collect_and_poll(Comments::Block);
        if !self.block_comments.is_empty() {
            self.write_block_comment()?;
            if matches!(self.event_type(), Some(EventType::DocumentEnd { .. })) {
                return self.expect_document_end();
            }
        }
        self.states.push(EmitterState::DocumentEnd);
        self.expect_node(true, false, false)
    }

    fn expect_document_end(&mut self) -> YamlResult<()> {
        self.collect_and_poll(Comments::Block);
        self.write_block_comment()?;
        match self.event_type() {
            Some(EventType::DocumentEnd { explicit }) => {
                let explicit = *explicit;
                self.write_indent()?;
                if explicit {
                    self.write_indicator("...", true, false, false)?;
                    self.write_indent()?;
                }
                self.state = EmitterState::DocumentStart { first: false };
                Ok(())
            }
            _ => Err(unexpected("DocumentEndEvent", self.event.as_ref())),
        }
    }

    // Nodes

    fn expect_node(&mut self, root: bool, mapping: bool, simple_key: bool) -> YamlResult<()> {
        self.root_context = root;
        self.mapping_context = mapping;
        self.simple_key_context = simple_key;
        while self.event_is_comment() {
            trace!("dropping a comment the layout has no room for");
            self.event = self.events.pop_front();
        }
        match self.event_type() {
            Some(EventType::Alias { .. }) => self.expect_alias(),
            Some(EventType::Scalar { .. }) => {
                self.process_anchor("&")?;
                self.process_tag()?;
                self.expect_scalar()
            }
            Some(EventType::SequenceStart { flow_style, .. }) => {
                let flow = flow_style.is_flow();
                self.process_anchor("&")?;
                self.process_tag()?;
                if self.flow_level == 0 && !self.canonical && !flow && !self.check_empty_sequence()
                {
                    self.expect_block_sequence();
                } else {
                    self.expect_flow_sequence()?;
                }
                Ok(())
            }
            Some(EventType::MappingStart { flow_style, .. }) => {
                let flow = flow_style.is_flow();
                self.process_anchor("&")?;
                self.process_tag()?;
                if self.flow_level == 0 && !self.canonical && !flow && !self.check_empty_mapping() {
                    self.expect_block_mapping();
                } else {
                    self.expect_flow_mapping()?;
                }
                Ok(())
            }
            _ => Err(unexpected("NodeEvent", self.event.as_ref())),
        }
    }

    fn expect_alias(&mut self) -> YamlResult<()> {
        self.process_anchor("*")?;
        self.pop_state()
    }

    fn expect_scalar(&mut self) -> YamlResult<()> {
        self.increase_indent(true, false);
        self.process_scalar()?;
        self.pop_indent();
        self.pop_state()
    }

    fn increase_indent(&mut self, flow: bool, indentless: bool) {
        self.indents.push(self.indent);
        match self.indent {
            None => self.indent = Some(if flow { self.best_indent } else { 0 }),
            Some(indent) if !indentless => self.indent = Some(indent + self.best_indent),
            Some(_) => {}
        }
    }

    // Flow sequences

    fn expect_flow_sequence(&mut self) -> YamlResult<()> {
        self.write_indicator("[", true, true, false)?;
        self.flow_level += 1;
        self.increase_indent(true, false);
        if self.pretty_flow {
            self.write_indent()?;
        }
        self.state = EmitterState::FlowSequenceItem { first: true };
        Ok(())
    }

    fn expect_flow_sequence_item(&mut self, first: bool) -> YamlResult<()> {
        if matches!(self.event_type(), Some(EventType::SequenceEnd)) {
            self.pop_indent();
            self.flow_level -= 1;
            if !first {
                if self.canonical {
                    self.write_indicator(",", false, false, false)?;
                    self.write_indent()?;
                } else if self.pretty_flow {
                    self.write_indent()?;
                }
            }
            self.write_indicator("]", false, false, false)?;
            self.collect_queued(Comments::InLine);
            self.write_inline_comments()?;
            return self.pop_state();
        }
        if self.event_is_comment() {
            self.collect_current(Comments::Block);
            if first {
                self.write_block_comment()?;
            }
            return Ok(());
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
            self.write_block_comment()?;
        }
        if self.canonical || (self.column > self.best_width && self.split_lines) || self.pretty_flow
        {
            self.write_indent()?;
        }
        self.states.push(EmitterState::FlowSequenceItem { first: false });
        self.expect_node(false, false, false)?;
        self.collect_queued(Comments::InLine);
        self.write_inline_comments()?;
        Ok(())
    }

    // Flow mappings

    fn expect_flow_mapping(&mut self) -> YamlResult<()> {
        self.write_indicator("{", true, true, false)?;
        self.flow_level += 1;
        self.increase_indent(true, false);
        if self.pretty_flow {
            self.write_indent()?;
        }
        self.state = EmitterState::FlowMappingKey { first: true };
        Ok(())
    }

    fn expect_flow_mapping_key(&mut self, first: bool) -> YamlResult<()> {
        if matches!(self.event_type(), Some(EventType::MappingEnd)) {
            self.pop_indent();
            self.flow_level -= 1;
            if !first {
                if self.canonical {
                    self.write_indicator(",", false, false, false)?;
                    self.write_indent()?;
                }
                if self.pretty_flow {
                    self.write_indent()?;
                }
            }
            self.write_indicator("}", false, false, false)?;
            self.collect_queued(Comments::InLine);
            self.write_inline_comments()?;
            return self.pop_state();
        }
        if !first {
            self.write_indicator(",", false, false, false)?;
            self.collect_and_poll(Comments::Block);
            self.write_block_comment()?;
        }
        if self.canonical || (self.column > self.best_width && self.split_lines) || self.pretty_flow
        {
            self.write_indent()?;
        }
        if !self.canonical && self.check_simple_key()? {
            self.states.push(EmitterState::FlowMappingSimpleValue);
            self.expect_node(false, true, true)
        } else {
            self.write_indicator("?", true, false, false)?;
            self.states.push(EmitterState::FlowMappingValue);
            self.expect_node(false, true, false)
        }
    }

    fn expect_flow_mapping_simple_value(&mut self) -> YamlResult<()> {
        self.write_indicator(":", false, false, false)?;
        self.collect_and_poll(Comments::InLine);
        self.write_inline_comments()?;
        self.states.push(EmitterState::FlowMappingKey { first: false });
        self.expect_node(false, true, false)
    }

    fn expect_flow_mapping_value(&mut self) -> YamlResult<()> {
        if self.canonical || self.column > self.best_width || self.pretty_flow {
            self.write_indent()?;
        }
        self.write_indicator(":", true, false, false)?;
        self.collect_and_poll(Comments::InLine);
        self.write_inline_comments()?;
        self.states.push(EmitterState::FlowMappingKey { first: false });
        self.expect_node(false, true, false)
    }

    // Block sequences

    fn expect_block_sequence(&mut self) {
        let indentless = self.mapping_context && !self.indention;
        self.increase_indent(false, indentless);
        self.state = EmitterState::BlockSequenceItem { first: true };
    }

    fn expect_block_sequence_item(&mut self, first: bool) -> YamlResult<()> {
        if !first && matches!(self.event_type(), Some(EventType::SequenceEnd)) {
            self.pop_indent();
            return self.pop_state();
        }
        if self.event_is_comment() {
            self.collect_current(Comments::Block);
            return self.write_block_comment();
        }
        self.write_indent()?;
        if !self.indent_with_indicator || first {
            self.write_whitespace(self.indicator_indent)?;
        }
        self.write_indicator("-", true, false, true)?;
        if self.indent_with_indicator && first {
            self.indent = self.indent.map(|indent| indent + self.indicator_indent);
        }
        self.states.push(EmitterState::BlockSequenceItem { first: false });
        self.expect_node(false, false, false)?;
        self.collect_queued(Comments::InLine);
        self.write_inline_comments()?;
        Ok(())
    }

    // Block mappings

    fn expect_block_mapping(&mut self) {
        self.increase_indent(false, false);
        self.state = EmitterState::BlockMappingKey { first: true };
    }

    fn expect_block_mapping_key(&mut self, first: bool) -> YamlResult<()> {
        self.collect_and_poll(Comments::Block);
        self.write_block_comment()?;
        if !first && matches!(self.event_type(), Some(EventType::MappingEnd)) {
            self.pop_indent();
            return self.pop_state();
        }
        self.write_indent()?;
        if self.check_simple_key()? {
            self.states.push(EmitterState::BlockMappingSimpleValue);
            self.expect_node(false, true, true)
        } else {
            self.write_indicator("?", true, false, true)?;
            self.states.push(EmitterState::BlockMappingValue);
            self.expect_node(false, true, false)
        }
    }

    fn expect_block_mapping_simple_value(&mut self) -> YamlResult<()> {
        self.write_indicator(":", false, false, false)?;
        self.collect_and_poll(Comments::InLine);
        if !self.is_folded_or_literal() && self.write_inline_comments()? {
            self.increase_indent(true, false);
            self.write_indent()?;
            self.pop_indent();
        }
        self.collect_and_poll(Comments::Block);
        if !self.block_comments.is_empty() {
            self.increase_indent(true, false);
            self.write_block_comment()?;
            self.write_indent()?;
            self.pop_indent();
        }
        self.states.push(EmitterState::BlockMappingKey { first: false });
        self.expect_node(false, true, false)?;
        self.collect_queued(Comments::InLine);
        self.write_inline_comments()?;
        Ok(())
    }

    fn expect_block_mapping_value(&mut self) -> YamlResult<()> {
        self.write_indent()?;
        self.write_indicator(":", true, false, true)?;
        self.collect_and_poll(Comments::InLine);
        self.write_inline_comments()?;
        self.collect_and_poll(Comments::Block);
        self.write_block_comment()?;
        self.states.push(EmitterState::BlockMappingKey { first: false });
        self.expect_node(false, true, false)?;
        self.collect_queued(Comments::InLine);
        self.write_inline_comments()?;
        Ok(())
    }

    // Checkers

    fn is_folded_or_literal(&self) -> bool {
        matches!(
            self.event_type(),
            Some(EventType::Scalar {
                style: ScalarType::Folded | ScalarType::Literal,
                ..
            })
        )
    }

    fn check_empty_sequence(&self) -> bool {
        matches!(self.event_type(), Some(EventType::SequenceStart { .. }))
            && matches!(
                self.events.front().map(|ev| &ev.event_type),
                Some(EventType::SequenceEnd)
            )
    }

    fn check_empty_mapping(&self) -> bool {
        matches!(self.event_type(), Some(EventType::MappingStart { .. }))
            && matches!(
                self.events.front().map(|ev| &ev.event_type),
                Some(EventType::MappingEnd)
            )
    }

    /// The document holds a single empty untagged scalar, so the `---` marker
    /// can't be left out.
    fn check_empty_document(&self) -> bool {
        matches!(
            self.events.front().map(|ev| &ev.event_type),
            Some(EventType::Scalar {
                anchor: None,
                tag: None,
                value,
                ..
            }) if value.is_empty()
        )
    }

    fn check_simple_key(&mut self) -> YamlResult<bool> {
        let Some(event) = self.event.as_ref() else {
            return Ok(false);
        };
        let mut length = 0;
        if let Some(anchor) = event.event_type.anchor() {
            if self.prepared_anchor.is_none() {
                self.prepared_anchor = Some(prepare_anchor(anchor)?);
            }
            length += self.prepared_anchor.as_ref().map_or(0, |a| a.chars().count());
        }
        if let Some(tag) = event.event_type.tag() {
            if self.prepared_tag.is_none() {
                self.prepared_tag = Some(self.prepare_tag(tag)?);
            }
            length += self.prepared_tag.as_ref().map_or(0, |t| t.chars().count());
        }
        let mut short_scalar = false;
        if let EventType::Scalar { value, .. } = &event.event_type {
            if self.analysis.is_none() {
                self.analysis = Some(analyze_scalar(value, self.allow_unicode));
            }
            if let Some(analysis) = &self.analysis {
                length += analysis.scalar.chars().count();
                short_scalar = !analysis.empty && !analysis.multiline;
            }
        }
        let is_alias = matches!(event.event_type, EventType::Alias { .. });
        Ok(length < self.max_simple_key_length
            && (is_alias
                || short_scalar
                || self.check_empty_sequence()
                || self.check_empty_mapping()))
    }

    // Anchors, tags and scalars

    fn process_anchor(&mut self, indicator: &str) -> YamlResult<()> {
        let Some(anchor) = self.event.as_ref().and_then(|ev| ev.event_type.anchor()) else {
            if indicator == "*" {
                return Err(emitter_error("anchor is not specified for alias"));
            }
            self.prepared_anchor = None;
            return Ok(());
        };
        let prepared = match self.prepared_anchor.take() {
            Some(prepared) => prepared,
            None => prepare_anchor(anchor)?,
        };
        self.write_indicator(&format!("{indicator}{prepared}"), true, false, false)
    }

    fn style_context(&self, implicit: ImplicitTuple) -> StyleContext {
        StyleContext {
            canonical: self.canonical,
            flow_level: self.flow_level,
            simple_key: self.simple_key_context,
            plain_implicit: implicit.plain,
        }
    }

    fn process_tag(&mut self) -> YamlResult<()> {
        let tag = match self.event.as_ref().map(|ev| &ev.event_type) {
            Some(EventType::Scalar {
                tag,
                implicit,
                value,
                style,
                ..
            }) => {
                let analysis = match self.analysis.take() {
                    Some(analysis) => analysis,
                    None => analyze_scalar(value, self.allow_unicode),
                };
                let chosen = match self.style {
                    Some(chosen) => chosen,
                    None => choose_scalar_style(*style, &analysis, self.style_context(*implicit)),
                };
                self.analysis = Some(analysis);
                self.style = Some(chosen);
                let plain = chosen == ScalarType::Plain;
                if (!self.canonical || tag.is_none())
                    && ((plain && implicit.plain) || (!plain && implicit.non_plain))
                {
                    self.prepared_tag = None;
                    return Ok(());
                }
                if implicit.plain && tag.is_none() {
                    self.prepared_tag = None;
                    Some(tags::NON_SPECIFIC.to_string())
                } else {
                    tag.clone()
                }
            }
            Some(
                EventType::SequenceStart { tag, implicit, .. }
                | EventType::MappingStart { tag, implicit, .. },
            ) => {
                if (!self.canonical || tag.is_none()) && *implicit {
                    self.prepared_tag = None;
                    return Ok(());
                }
                tag.clone()
            }
            _ => None,
        };
        let Some(tag) = tag else {
            return Err(emitter_error("tag is not specified"));
        };
        let prepared = match self.prepared_tag.take() {
            Some(prepared) => prepared,
            None => self.prepare_tag(&tag)?,
        };
        self.write_indicator(&prepared, true, false, false)
    }

    fn process_scalar(&mut self) -> YamlResult<()> {
        let (value, requested, implicit) = match self.event_type() {
            Some(EventType::Scalar {
                value,
                style,
                implicit,
                ..
            }) => (value.clone(), *style, *implicit),
            _ => return Err(unexpected("ScalarEvent", self.event.as_ref())),
        };
        let analysis = match self.analysis.take() {
            Some(analysis) => analysis,
            None => analyze_scalar(&value, self.allow_unicode),
        };
        let style = match self.style.take() {
            Some(style) => style,
            None => choose_scalar_style(requested, &analysis, self.style_context(implicit)),
        };
        let split = !self.simple_key_context && self.split_lines;
        let text: Vec<char> = analysis.scalar.chars().collect();
        match style {
            ScalarType::Plain => self.write_plain(&text, split),
            ScalarType::DoubleQuote => self.write_double_quoted(&text, split),
            ScalarType::SingleQuote => self.write_single_quoted(&text, split),
            ScalarType::Folded => self.write_folded(&text, split),
            ScalarType::Literal => self.write_literal(&text),
        }
    }

    fn prepare_tag(&self, tag: &str) -> YamlResult<String> {
        if tag.is_empty() {
            return Err(emitter_error("tag must not be empty"));
        }
        if tag == "!" {
            return Ok(tag.to_string());
        }
        let mut matched: Option<&(String, String)> = None;
        for entry in &self.tag_prefixes {
            let prefix = &entry.0;
            if tag.starts_with(prefix.as_str()) && (prefix == "!" || prefix.len() < tag.len()) {
                matched = Some(entry);
            }
        }
        let (handle, suffix) = match matched {
            Some((prefix, handle)) => (Some(handle.as_str()), &tag[prefix.len()..]),
            None => (None, tag),
        };
        let mut suffix_text = String::with_capacity(suffix.len());
        for c in suffix.chars() {
            if is_uri_char(c) {
                suffix_text.push(c);
            } else {
                suffix_text.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
            }
        }
        Ok(match handle {
            Some(handle) => format!("{handle}{suffix_text}"),
            None => format!("!<{suffix_text}>"),
        })
    }

    // Writers

    fn write_indicator(
        &mut self,
        indicator: &str,
        need_whitespace: bool,
        whitespace: bool,
        indentation: bool,
    ) -> YamlResult<()> {
        if !self.whitespace && need_whitespace {
            self.column += 1;
            self.writer.write_char(' ')?;
        }
        self.whitespace = whitespace;
        self.indention = self.indention && indentation;
        self.column += indicator.chars().count();
        self.open_ended = false;
        self.writer.write_str(indicator)?;
        Ok(())
    }

    fn write_indent(&mut self) -> YamlResult<()> {
        let indent = self.indent.unwrap_or(0);
        if !self.indention || self.column > indent || (self.column == indent && !self.whitespace) {
            self.write_line_break(None)?;
        }
        self.write_whitespace(indent.saturating_sub(self.column))
    }

    fn write_whitespace(&mut self, length: usize) -> YamlResult<()> {
        if length > 0 {
            self.whitespace = true;
            self.column += length;
            for _ in 0..length {
                self.writer.write_char(' ')?;
            }
        }
        Ok(())
    }

    fn write_line_break(&mut self, data: Option<char>) -> YamlResult<()> {
        self.whitespace = true;
        self.indention = true;
        self.column = 0;
        match data {
            Some(c) => self.writer.write_char(c)?,
            None => self.writer.write_str(self.best_line_break)?,
        }
        Ok(())
    }

    fn write_chars(&mut self, text: &[char]) -> YamlResult<()> {
        self.column += text.len();
        for &c in text {
            self.writer.write_char(c)?;
        }
        Ok(())
    }

    /// Writes the line breaks in `text`; `\n` becomes the configured line break.
    fn write_breaks(&mut self, text: &[char]) -> YamlResult<()> {
        for &br in text {
            if br == '\n' {
                self.write_line_break(None)?;
            } else {
                self.write_line_break(Some(br))?;
            }
        }
        Ok(())
    }

    fn write_version_directive(&mut self, version: &str) -> YamlResult<()> {
        self.writer.write_str("%YAML ")?;
        self.writer.write_str(version)?;
        self.write_line_break(None)
    }

    fn write_tag_directive(&mut self, handle: &str, prefix: &str) -> YamlResult<()> {
        self.writer.write_str("%TAG ")?;
        self.writer.write_str(handle)?;
        self.writer.write_char(' ')?;
        self.writer.write_str(prefix)?;
        self.write_line_break(None)
    }

    fn write_single_quoted(&mut self, text: &[char], split: bool) -> YamlResult<()> {
        self.write_indicator("'", true, false, false)?;
        let mut spaces = false;
        let mut breaks = false;
        let mut start = 0;
        for end in 0..=text.len() {
            let ch = text.get(end).copied();
            if spaces {
                if ch != Some(' ') {
                    if start + 1 == end
                        && self.column > self.best_width
                        && split
                        && start != 0
                        && end != text.len()
                    {
                        self.write_indent()?;
                    } else {
                        self.write_chars(&text[start..end])?;
                    }
                    start = end;
                }
            } else if breaks {
                if ch.map_or(true, |c| !is_break(c)) {
                    if text[start] == '\n' {
                        self.write_line_break(None)?;
                    }
                    self.write_breaks(&text[start..end])?;
                    self.write_indent()?;
                    start = end;
                }
            } else if ch.map_or(true, |c| is_break(c) || c == ' ' || c == '\'') && start < end {
                self.write_chars(&text[start..end])?;
                start = end;
            }
            if ch == Some('\'') {
                self.column += 2;
                self.writer.write_str("''")?;
                start = end + 1;
            }
            if let Some(c) = ch {
                spaces = c == ' ';
                breaks = is_break(c);
            }
        }
        self.write_indicator("'", false, false, false)
    }

    fn write_double_quoted(&mut self, text: &[char], split: bool) -> YamlResult<()> {
        self.write_indicator("\"", true, false, false)?;
        let mut start = 0;
        for end in 0..=text.len() {
            let ch = text.get(end).copied();
            let special = ch.map_or(true, |c| {
                "\"\\\u{85}\u{2028}\u{2029}\u{FEFF}".contains(c) || !(' '..='~').contains(&c)
            });
            if special {
                if start < end {
                    self.write_chars(&text[start..end])?;
                    start = end;
                }
                if let Some(c) = ch {
                    let escaped = match escape_char(c) {
                        Some(letter) => format!("\\{letter}"),
                        None if self.allow_unicode && is_printable(c) => c.to_string(),
                        None if u32::from(c) <= 0xFF => format!("\\x{:02X}", u32::from(c)),
                        None if u32::from(c) <= 0xFFFF => format!("\\u{:04X}", u32::from(c)),
                        None => format!("\\U{:08X}", u32::from(c)),
                    };
                    self.column += escaped.chars().count();
                    self.writer.write_str(&escaped)?;
                    start = end + 1;
                }
            }
            if 0 < end
                && end + 1 < text.len()
                && (ch == Some(' ') || start >= end)
                && self.column + end.saturating_sub(start) > self.best_width
                && split
            {
                let mut data: String = if start < end {
                    text[start..end].iter().collect()
                } else {
                    String::new()
                };
                data.push('\\');
                if start < end {
                    start = end;
                }
                self.column += data.chars().count();
                self.writer.write_str(&data)?;
                self.write_indent()?;
                self.whitespace = false;
                self.indention = false;
                if text.get(start) == Some(&' ') {
                    self.column += 1;
                    self.writer.write_char('\\')?;
                }
            }
        }
        self.write_indicator("\"", false, false, false)
    }

    fn determine_block_hints(&self, text: &[char]) -> String {
        let mut hints = String::new();
        if let Some(&first) = text.first() {
            if is_break(first) || first == ' ' {
                hints.push_str(&self.best_indent.to_string());
            }
        }
        match text.last() {
            Some(&last) if !is_break(last) => hints.push('-'),
            Some(_) if text.len() == 1 || is_break(text[text.len() - 2]) => hints.push('+'),
            _ => {}
        }
        hints
    }

    fn write_folded(&mut self, text: &[char], split: bool) -> YamlResult<()> {
        let hints = self.determine_block_hints(text);
        self.write_indicator(&format!(">{hints}"), true, false, false)?;
        if hints.ends_with('+') {
            self.open_ended = true;
        }
        if !self.write_inline_comments()? {
            self.write_line_break(None)?;
        }
        let mut leading_space = true;
        let mut spaces = false;
        let mut breaks = true;
        let mut start = 0;
        for end in 0..=text.len() {
            let ch = text.get(end).copied();
            if breaks {
                if ch.map_or(true, |c| !is_break(c)) {
                    if !leading_space && ch.is_some() && ch != Some(' ') && text[start] == '\n' {
                        self.write_line_break(None)?;
                    }
                    leading_space = ch == Some(' ');
                    self.write_breaks(&text[start..end])?;
                    if ch.is_some() {
                        self.write_indent()?;
                    }
                    start = end;
                }
            } else if spaces {
                if ch != Some(' ') {
                    if start + 1 == end && self.column > self.best_width && split {
                        self.write_indent()?;
                    } else {
                        self.write_chars(&text[start..end])?;
                    }
                    start = end;
                }
            } else if ch.map_or(true, |c| is_break(c) || c == ' ') {
                self.write_chars(&text[start..end])?;
                if ch.is_none() {
                    self.write_line_break(None)?;
                }
                start = end;
            }
            if let Some(c) = ch {
                breaks = is_break(c);
                spaces = c == ' ';
            }
        }
        Ok(())
    }

    fn write_literal(&mut self, text: &[char]) -> YamlResult<()> {
        let hints = self.determine_block_hints(text);
        self.write_indicator(&format!("|{hints}"), true, false, false)?;
        if hints.ends_with('+') {
            self.open_ended = true;
        }
        if !self.write_inline_comments()? {
            self.write_line_break(None)?;
        }
        let mut breaks = true;
        let mut start = 0;
        for end in 0..=text.len() {
            let ch = text.get(end).copied();
            if breaks {
                if ch.map_or(true, |c| !is_break(c)) {
                    self.write_breaks(&text[start..end])?;
                    if ch.is_some() {
                        self.write_indent()?;
                    }
                    start = end;
                }
            } else if ch.map_or(true, is_break) {
                self.write_chars(&text[start..end])?;
                if ch.is_none() {
                    self.write_line_break(None)?;
                }
                start = end;
            }
            if let Some(c) = ch {
                breaks = is_break(c);
            }
        }
        Ok(())
    }

    fn write_plain(&mut self, text: &[char], split: bool) -> YamlResult<()> {
        if self.root_context {
            self.open_ended = true;
        }
        if text.is_empty() {
            return Ok(());
        }
        if !self.whitespace {
            self.column += 1;
            self.writer.write_char(' ')?;
        }
        self.whitespace = false;
        self.indention = false;
        let mut spaces = false;
        let mut breaks = false;
        let mut start = 0;
        for end in 0..=text.len() {
            let ch = text.get(end).copied();
            if spaces {
                if ch != Some(' ') {
                    if start + 1 == end && self.column > self.best_width && split {
                        self.write_indent()?;
                        self.whitespace = false;
                        self.indention = false;
                    } else {
                        self.write_chars(&text[start..end])?;
                    }
                    start = end;
                }
            } else if breaks {
                if ch.map_or(true, |c| !is_break(c)) {
                    if text[start] == '\n' {
                        self.write_line_break(None)?;
                    }
                    self.write_breaks(&text[start..end])?;
                    self.write_indent()?;
                    self.whitespace = false;
                    self.indention = false;
                    start = end;
                }
            } else if ch.map_or(true, |c| is_break(c) || c == ' ') {
                self.write_chars(&text[start..end])?;
                start = end;
            }
            if let Some(c) = ch {
                spaces = c == ' ';
                breaks = is_break(c);
            }
        }
        Ok(())
    }
}

fn prepare_version(version: Version) -> YamlResult<String> {
    if version.major != 1 {
        return Err(emitter_error(format!("unsupported YAML version: {version}")));
    }
    Ok(version.to_string())
}

fn prepare_tag_handle(handle: &str) -> YamlResult<String> {
    if handle.is_empty() {
        return Err(emitter_error("tag handle must not be empty"));
    }
    if !handle.starts_with('!') || !handle.ends_with('!') {
        return Err(emitter_error(format!(
            "tag handle must start and end with '!': {handle}"
        )));
    }
    if handle != "!" && !handle[1..handle.len() - 1].chars().all(is_alpha) {
        return Err(emitter_error(format!(
            "invalid character in the tag handle: {handle}"
        )));
    }
    Ok(handle.to_string())
}

fn prepare_tag_prefix(prefix: &str) -> YamlResult<String> {
    if prefix.is_empty() {
        return Err(emitter_error("tag prefix must not be empty"));
    }
    Ok(prefix.to_string())
}

fn prepare_anchor(anchor: &str) -> YamlResult<String> {
    if anchor.is_empty() {
        return Err(emitter_error("anchor must not be empty"));
    }
    if let Some(invalid) = anchor.chars().find(|c| "[]{},*&".contains(*c)) {
        return Err(emitter_error(format!(
            "Invalid character '{invalid}' in the anchor: {anchor}"
        )));
    }
    if anchor.chars().any(char::is_whitespace) {
        return Err(emitter_error(format!(
            "Anchor may not contain spaces: {anchor}"
        )));
    }
    Ok(anchor.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::FlowStyle;

    fn scalar(value: &str) -> EventType {
        styled(value, ScalarType::Plain)
    }

    fn styled(value: &str, style: ScalarType) -> EventType {
        EventType::Scalar {
            anchor: None,
            tag: None,
            implicit: ImplicitTuple::new(true, false),
            value: value.to_string(),
            style,
        }
    }

    fn mapping(flow_style: FlowStyle) -> EventType {
        EventType::MappingStart {
            anchor: None,
            tag: None,
            implicit: true,
            flow_style,
        }
    }

    fn sequence(flow_style: FlowStyle) -> EventType {
        EventType::SequenceStart {
            anchor: None,
            tag: None,
            implicit: true,
            flow_style,
        }
    }

    fn doc(body: Vec<EventType>) -> Vec<EventType> {
        let mut events = vec![
            EventType::StreamStart,
            EventType::DocumentStart {
                explicit: false,
                version: None,
                tags: vec![],
            },
        ];
        events.extend(body);
        events.push(EventType::DocumentEnd { explicit: false });
        events.push(EventType::StreamEnd);
        events
    }

    fn emit_with(events: Vec<EventType>, options: &DumperOptions) -> YamlResult<String> {
        let mut out = String::new();
        let mut emitter = Emitter::new(&mut out, options);
        for event in events {
            emitter.emit(Event::synthetic(event))?;
        }
        Ok(out)
    }

    fn emit(events: Vec<EventType>) -> String {
        emit_with(events, &DumperOptions::default()).expect("emit")
    }

    #[test]
    fn block_mapping() {
        let out = emit(doc(vec![
            mapping(FlowStyle::Block),
            scalar("a"),
            scalar("1"),
            scalar("b"),
            scalar("2"),
            EventType::MappingEnd,
        ]));
        assert_eq!(out, "a: 1\nb: 2\n");
    }

    #[test]
    fn flow_sequence() {
        let out = emit(doc(vec![
            sequence(FlowStyle::Flow),
            scalar("a"),
            scalar("b"),
            EventType::SequenceEnd,
        ]));
        assert_eq!(out, "[a, b]\n");
    }

    #[test]
    fn indentless_sequence_in_mapping() {
        let out = emit(doc(vec![
            mapping(FlowStyle::Block),
            scalar("k"),
            sequence(FlowStyle::Block),
            scalar("a"),
            EventType::SequenceEnd,
            EventType::MappingEnd,
        ]));
        assert_eq!(out, "k:\n- a\n");
    }

    #[test]
    fn quoting() {
        let out = emit(doc(vec![
            mapping(FlowStyle::Block),
            scalar("k"),
            scalar("a: b"),
            EventType::MappingEnd,
        ]));
        assert_eq!(out, "k: 'a: b'\n");

        let out = emit(doc(vec![styled("it's", ScalarType::SingleQuote)]));
        assert_eq!(out, "'it''s'\n");

        let out = emit(doc(vec![styled("tab\there", ScalarType::Plain)]));
        assert_eq!(out, "\"tab\\there\"\n");
    }

    #[test]
    fn literal_block() {
        let out = emit(doc(vec![
            mapping(FlowStyle::Block),
            scalar("k"),
            styled("line1\nline2", ScalarType::Literal),
            EventType::MappingEnd,
        ]));
        assert_eq!(out, "k: |-\n  line1\n  line2\n");
    }

    #[test]
    fn anchors_and_aliases() {
        let out = emit(doc(vec![
            sequence(FlowStyle::Block),
            EventType::Scalar {
                anchor: Some("x".to_string()),
                tag: None,
                implicit: ImplicitTuple::new(true, false),
                value: "a".to_string(),
                style: ScalarType::Plain,
            },
            EventType::Alias {
                anchor: "x".to_string(),
            },
            EventType::SequenceEnd,
        ]));
        assert_eq!(out, "- &x a\n- *x\n");
    }

    #[test]
    fn tags() {
        let out = emit(doc(vec![EventType::Scalar {
            anchor: None,
            tag: Some("!foo".to_string()),
            implicit: ImplicitTuple::new(false, false),
            value: "x".to_string(),
            style: ScalarType::Plain,
        }]));
        assert_eq!(out, "!foo 'x'\n");

        let out = emit(doc(vec![EventType::Scalar {
            anchor: None,
            tag: Some(tags::BINARY.to_string()),
            implicit: ImplicitTuple::new(false, false),
            value: "AQID".to_string(),
            style: ScalarType::Plain,
        }]));
        assert_eq!(out, "!!binary 'AQID'\n");
    }

    #[test]
    fn explicit_document() {
        let out = emit(vec![
            EventType::StreamStart,
            EventType::DocumentStart {
                explicit: true,
                version: None,
                tags: vec![],
            },
            scalar("a"),
            EventType::DocumentEnd { explicit: true },
            EventType::StreamEnd,
        ]);
        assert_eq!(out, "--- a\n...\n");
    }

    #[test]
    fn version_directive() {
        let out = emit(vec![
            EventType::StreamStart,
            EventType::DocumentStart {
                explicit: false,
                version: Some(Version::V1_1),
                tags: vec![],
            },
            scalar("a"),
            EventType::DocumentEnd { explicit: false },
            EventType::StreamEnd,
        ]);
        assert_eq!(out, "%YAML 1.1\n--- a\n");

        let result = emit_with(
            vec![
                EventType::StreamStart,
                EventType::DocumentStart {
                    explicit: false,
                    version: Some(Version { major: 2, minor: 0 }),
                    tags: vec![],
                },
                scalar("a"),
                EventType::DocumentEnd { explicit: false },
                EventType::StreamEnd,
            ],
            &DumperOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn comments() {
        let options = DumperOptions {
            process_comments: true,
            ..DumperOptions::default()
        };
        let out = emit_with(
            doc(vec![
                mapping(FlowStyle::Block),
                EventType::Comment {
                    comment_type: CommentType::Block,
                    value: " top".to_string(),
                },
                scalar("a"),
                scalar("b"),
                EventType::Comment {
                    comment_type: CommentType::InLine,
                    value: " note".to_string(),
                },
                EventType::MappingEnd,
            ]),
            &options,
        )
        .expect("emit");
        assert_eq!(out, "# top\na: b # note\n");
    }

    #[test]
    fn out_of_order_events() {
        let mut out = String::new();
        let options = DumperOptions::default();
        let mut emitter = Emitter::new(&mut out, &options);
        emitter
            .emit(Event::synthetic(scalar("a")))
            .expect("queued");
        let err = emitter
            .emit(Event::synthetic(scalar("b")))
            .expect_err("no stream start");
        assert_eq!(
            err.to_string(),
            YamlError::Emitter("expected StreamStartEvent, but got ScalarEvent".to_string())
                .to_string()
        );
    }

    #[test]
    fn directive_checks() {
        assert!(prepare_anchor("a b").is_err());
        assert!(prepare_anchor("a,b").is_err());
        assert!(prepare_anchor("").is_err());
        assert!(prepare_anchor("id001").is_ok());
        assert!(prepare_tag_handle("!a").is_err());
        assert!(prepare_tag_handle("!e!").is_ok());
        assert!(prepare_tag_handle("!!").is_ok());
    }
}
