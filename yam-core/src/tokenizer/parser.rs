use crate::tokenizer::scanner::Scanner;
use hashbrown::HashMap;
use std::str::Chars;
use tracing::trace;
use yam_common::{
    Event, EventKind, EventType, FlowStyle, ImplicitTuple, Marker, ScalarType, Span, Token,
    TokenKind, TokenType, Version, YamlError, YamlResult,
};

const DEFAULT_TAGS: [(&str, &str); 2] = [("!", "!"), ("!!", "tag:yaml.org,2002:")];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ParserState {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentEnd,
    DocumentContent,
    BlockNode,
    /// Resumes a node interrupted by a comment.
    Node { block: bool, indentless: bool },
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    BlockMappingValueComment,
    FlowSequenceFirstEntry,
    FlowSequenceEntry { first: bool },
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey { first: bool },
    FlowMappingValue,
    FlowMappingEmptyValue,
    FlowEndComment,
    End,
}

/// Anchor and tag read in front of a node.
#[derive(Clone, Debug, Default)]
struct NodeProperties {
    anchor: Option<String>,
    tag: Option<String>,
    start: Option<Marker>,
    end: Option<Marker>,
}

impl NodeProperties {
    fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.tag.is_none()
    }
}

fn comment_event(tok: Token) -> Event {
    match tok.token_type {
        TokenType::Comment {
            comment_type,
            value,
        } => Event::new(
            tok.span,
            EventType::Comment {
                comment_type,
                value,
            },
        ),
        _ => Event::new(tok.span, EventType::StreamEnd),
    }
}

fn empty_scalar(mark: Marker) -> Event {
    Event::new(
        Span::empty(mark),
        EventType::Scalar {
            anchor: None,
            tag: None,
            implicit: ImplicitTuple::new(true, false),
            value: String::new(),
            style: ScalarType::Plain,
        },
    )
}

///
/// Turns the token stream into events.
///
/// The parser is a pushdown automaton: `state` says which production runs next
/// and `states` remembers where to return once a nested node is finished.
/// Every call to [`Parser::peek_event`] runs exactly one production.
///
/// # Methods
/// - `check_event(kind)`: Is the next event of the given kind?
/// - `peek_event()`: Next event without consuming it, `None` after the stream end.
/// - `get_event()`: Next event, consuming it.
pub struct Parser<I> {
    scanner: Scanner<I>,
    current_event: Option<Event>,
    state: ParserState,
    states: Vec<ParserState>,
    marks: Vec<Marker>,
    tag_handles: HashMap<String, String>,
    pending: Option<NodeProperties>,
}

impl<'a> Parser<Chars<'a>> {
    #[must_use]
    pub fn new_from_str(input: &'a str) -> Parser<Chars<'a>> {
        Parser::new(Scanner::new_from_str(input))
    }
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(scanner: Scanner<I>) -> Parser<I> {
        Parser {
            scanner,
            current_event: None,
            state: ParserState::StreamStart,
            states: Vec::with_capacity(100),
            marks: Vec::with_capacity(10),
            tag_handles: default_tag_handles(),
            pending: None,
        }
    }

    pub fn check_event(&mut self, kind: EventKind) -> YamlResult<bool> {
        Ok(self.peek_event()?.map_or(false, |ev| ev.is(kind)))
    }

    pub fn peek_event(&mut self) -> YamlResult<Option<&Event>> {
        if self.current_event.is_none() && self.state != ParserState::End {
            let event = self.state_machine()?;
            trace!(kind = %event.kind(), "event");
            self.current_event = Some(event);
        }
        Ok(self.current_event.as_ref())
    }

    pub fn get_event(&mut self) -> YamlResult<Option<Event>> {
        self.peek_event()?;
        Ok(self.current_event.take())
    }

    fn state_machine(&mut self) -> YamlResult<Event> {
        match self.state {
            ParserState::StreamStart => self.stream_start(),
            ParserState::ImplicitDocumentStart => self.implicit_document_start(),
            ParserState::DocumentStart => self.document_start(),
            ParserState::DocumentEnd => self.document_end(),
            ParserState::DocumentContent => self.document_content(),
            ParserState::BlockNode => self.parse_node(true, false),
            ParserState::Node { block, indentless } => self.resume_node(block, indentless),
            ParserState::BlockSequenceFirstEntry => self.block_sequence_first_entry(),
            ParserState::BlockSequenceEntry => self.block_sequence_entry(),
            ParserState::IndentlessSequenceEntry => self.indentless_sequence_entry(),
            ParserState::BlockMappingFirstKey => self.block_mapping_first_key(),
            ParserState::BlockMappingKey => self.block_mapping_key(),
            ParserState::BlockMappingValue => self.block_mapping_value(),
            ParserState::BlockMappingValueComment => self.block_mapping_value_comment(),
            ParserState::FlowSequenceFirstEntry => self.flow_sequence_first_entry(),
            ParserState::FlowSequenceEntry { first } => self.flow_sequence_entry(first),
            ParserState::FlowSequenceEntryMappingKey => self.flow_sequence_entry_mapping_key(),
            ParserState::FlowSequenceEntryMappingValue => {
                self.flow_sequence_entry_mapping_value()
            }
            ParserState::FlowSequenceEntryMappingEnd => self.flow_sequence_entry_mapping_end(),
            ParserState::FlowMappingFirstKey => self.flow_mapping_first_key(),
            ParserState::FlowMappingKey { first } => self.flow_mapping_key(first),
            ParserState::FlowMappingValue => self.flow_mapping_value(),
            ParserState::FlowMappingEmptyValue => self.flow_mapping_empty_value(),
            ParserState::FlowEndComment => self.flow_end_comment(),
            ParserState::End => Err(YamlError::parser(
                None,
                None,
                "no more events after the end of the stream",
                None,
            )),
        }
    }

    fn check(&mut self, choices: &[TokenKind]) -> YamlResult<bool> {
        self.scanner.check_token(choices)
    }

    fn peek_token(&mut self) -> YamlResult<&Token> {
        self.scanner.peek_token()
    }

    fn peek_start(&mut self) -> YamlResult<Marker> {
        Ok(self.peek_token()?.span.start)
    }

    fn pop_state(&mut self) -> ParserState {
        self.states.pop().unwrap_or(ParserState::End)
    }

    fn pop_mark(&mut self) -> Option<Marker> {
        self.marks.pop()
    }

    fn next_comment(&mut self) -> YamlResult<Event> {
        Ok(comment_event(self.scanner.get_token()?))
    }

    fn stream_start(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        self.state = ParserState::ImplicitDocumentStart;
        Ok(Event::new(tok.span, EventType::StreamStart))
    }

    fn implicit_document_start(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            return self.next_comment();
        }
        if self.check(&[
            TokenKind::Directive,
            TokenKind::DocumentStart,
            TokenKind::StreamEnd,
        ])? {
            return self.document_start();
        }
        self.tag_handles = default_tag_handles();
        let mark = self.peek_start()?;
        self.states.push(ParserState::DocumentEnd);
        self.state = ParserState::BlockNode;
        Ok(Event::new(
            Span::empty(mark),
            EventType::DocumentStart {
                explicit: false,
                version: None,
                tags: Vec::new(),
            },
        ))
    }

    fn document_start(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            return self.next_comment();
        }
        while self.check(&[TokenKind::DocumentEnd])? {
            self.scanner.get_token()?;
        }
        if self.check(&[TokenKind::Comment])? {
            return self.next_comment();
        }

        if !self.check(&[TokenKind::StreamEnd])? {
            let start = self.peek_start()?;
            let (version, tags) = self.process_directives()?;
            while self.check(&[TokenKind::Comment])? {
                self.scanner.get_token()?;
            }
            if !self.check(&[TokenKind::StreamEnd])? {
                if !self.check(&[TokenKind::DocumentStart])? {
                    let tok = self.peek_token()?;
                    let (kind, mark) = (tok.kind(), tok.span.start);
                    return Err(YamlError::parser(
                        None,
                        None,
                        format!("expected '<document start>', but found '{kind}'"),
                        Some(mark),
                    ));
                }
                let tok = self.scanner.get_token()?;
                self.states.push(ParserState::DocumentEnd);
                self.state = ParserState::DocumentContent;
                return Ok(Event::new(
                    Span::new(start, tok.span.end),
                    EventType::DocumentStart {
                        explicit: true,
                        version,
                        tags,
                    },
                ));
            }
        }

        let tok = self.scanner.get_token()?;
        if !self.states.is_empty() {
            return Err(YamlError::parser(
                None,
                None,
                format!("Unexpected end of stream. States left: {:?}", self.states),
                Some(tok.span.start),
            ));
        }
        if !self.marks.is_empty() {
            return Err(YamlError::parser(
                None,
                None,
                format!("Unexpected end of stream. Marks left: {:?}", self.marks),
                Some(tok.span.start),
            ));
        }
        self.state = ParserState::End;
        Ok(Event::new(tok.span, EventType::StreamEnd))
    }

    /// Reads the directives in front of an explicit document. Every document starts
    /// from the default tag handles.
    fn process_directives(&mut self) -> YamlResult<(Option<Version>, Vec<(String, String)>)> {
        let mut version = None;
        let mut declared: Vec<(String, String)> = Vec::new();
        self.tag_handles = default_tag_handles();

        while self.check(&[TokenKind::Directive])? {
            let tok = self.scanner.get_token()?;
            let mark = tok.span.start;
            match tok.token_type {
                TokenType::VersionDirective { major, minor } => {
                    if version.is_some() {
                        return Err(YamlError::parser(
                            None,
                            None,
                            "found duplicate YAML directive",
                            Some(mark),
                        ));
                    }
                    if major != 1 {
                        return Err(YamlError::parser(
                            None,
                            None,
                            "found incompatible YAML document (version 1.* is required)",
                            Some(mark),
                        ));
                    }
                    version = Some(Version { major, minor });
                }
                TokenType::TagDirective { handle, prefix } => {
                    if declared.iter().any(|(known, _)| *known == handle) {
                        return Err(YamlError::parser(
                            None,
                            None,
                            format!("duplicate tag handle {handle}"),
                            Some(mark),
                        ));
                    }
                    self.tag_handles.insert(handle.clone(), prefix.clone());
                    declared.push((handle, prefix));
                }
                _ => {}
            }
        }
        Ok((version, declared))
    }

    fn document_end(&mut self) -> YamlResult<Event> {
        let start = self.peek_start()?;
        let mut end = start;
        let mut explicit = false;
        if self.check(&[TokenKind::DocumentEnd])? {
            end = self.scanner.get_token()?.span.end;
            explicit = true;
        }
        self.state = ParserState::DocumentStart;
        Ok(Event::new(
            Span::new(start, end),
            EventType::DocumentEnd { explicit },
        ))
    }

    fn document_content(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            return self.next_comment();
        }
        if self.check(&[
            TokenKind::Directive,
            TokenKind::DocumentStart,
            TokenKind::DocumentEnd,
            TokenKind::StreamEnd,
        ])? {
            let mark = self.peek_start()?;
            self.state = self.pop_state();
            return Ok(empty_scalar(mark));
        }
        self.parse_node(true, false)
    }

    fn parse_node_properties(&mut self) -> YamlResult<NodeProperties> {
        let mut props = NodeProperties::default();
        let mut tag_token = None;
        let mut tag_mark = None;
        loop {
            if props.anchor.is_none() && self.check(&[TokenKind::Anchor])? {
                let tok = self.scanner.get_token()?;
                props.start.get_or_insert(tok.span.start);
                props.end = Some(tok.span.end);
                if let TokenType::Anchor(name) = tok.token_type {
                    props.anchor = Some(name);
                }
            } else if tag_token.is_none() && self.check(&[TokenKind::Tag])? {
                let tok = self.scanner.get_token()?;
                props.start.get_or_insert(tok.span.start);
                props.end = Some(tok.span.end);
                tag_mark = Some(tok.span.start);
                if let TokenType::Tag(tag) = tok.token_type {
                    tag_token = Some(tag);
                }
            } else {
                break;
            }
        }

        if let Some(tag) = tag_token {
            if tag.handle.is_empty() {
                props.tag = Some(tag.suffix);
            } else {
                match self.tag_handles.get(&tag.handle) {
                    Some(prefix) => props.tag = Some(format!("{prefix}{}", tag.suffix)),
                    None => {
                        return Err(YamlError::parser(
                            Some("while parsing a node"),
                            props.start,
                            format!("found undefined tag handle {}", tag.handle),
                            tag_mark,
                        ))
                    }
                }
            }
        }
        Ok(props)
    }

    fn resume_node(&mut self, block: bool, indentless: bool) -> YamlResult<Event> {
        if self.pending.is_none() {
            let closes = if block {
                self.check(&[
                    TokenKind::BlockEnd,
                    TokenKind::Key,
                    TokenKind::Value,
                    TokenKind::DocumentStart,
                    TokenKind::DocumentEnd,
                    TokenKind::StreamEnd,
                    TokenKind::Directive,
                ])? || (!indentless && self.check(&[TokenKind::BlockEntry])?)
            } else {
                self.check(&[
                    TokenKind::FlowEntry,
                    TokenKind::FlowSequenceEnd,
                    TokenKind::FlowMappingEnd,
                ])?
            };
            if closes {
                let mark = self.peek_start()?;
                self.state = self.pop_state();
                return Ok(empty_scalar(mark));
            }
        }
        self.parse_node(block, indentless)
    }

    fn parse_node(&mut self, block: bool, indentless: bool) -> YamlResult<Event> {
        if self.pending.is_none() && self.check(&[TokenKind::Alias])? {
            let tok = self.scanner.get_token()?;
            self.state = self.pop_state();
            let anchor = match tok.token_type {
                TokenType::Alias(anchor) => anchor,
                _ => String::new(),
            };
            return Ok(Event::new(tok.span, EventType::Alias { anchor }));
        }

        let props = match self.pending.take() {
            Some(props) => props,
            None => self.parse_node_properties()?,
        };

        if self.check(&[TokenKind::Comment])? {
            if !props.is_empty() {
                self.pending = Some(props);
            }
            self.state = ParserState::Node { block, indentless };
            return self.next_comment();
        }

        let NodeProperties {
            anchor,
            tag,
            start,
            end,
        } = props;
        let next_start = self.peek_start()?;
        let start = start.unwrap_or(next_start);
        let end = end.unwrap_or(start);
        let implicit = tag.is_none() || tag.as_deref() == Some("!");

        if indentless && self.check(&[TokenKind::BlockEntry])? {
            let end = self.peek_token()?.span.end;
            self.state = ParserState::IndentlessSequenceEntry;
            return Ok(Event::new(
                Span::new(start, end),
                EventType::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    flow_style: FlowStyle::Block,
                },
            ));
        }

        if self.check(&[TokenKind::Scalar])? {
            let tok = self.scanner.get_token()?;
            let (value, style) = match tok.token_type {
                TokenType::Scalar { scalar_type, value } => (value, scalar_type),
                _ => (String::new(), ScalarType::Plain),
            };
            let plain = style == ScalarType::Plain;
            let implicit = if (plain && tag.is_none()) || tag.as_deref() == Some("!") {
                ImplicitTuple::new(true, false)
            } else if tag.is_none() {
                ImplicitTuple::new(false, true)
            } else {
                ImplicitTuple::new(false, false)
            };
            self.state = self.pop_state();
            return Ok(Event::new(
                Span::new(start, tok.span.end),
                EventType::Scalar {
                    anchor,
                    tag,
                    implicit,
                    value,
                    style,
                },
            ));
        }

        let collection = if self.check(&[TokenKind::FlowSequenceStart])? {
            Some((true, FlowStyle::Flow, ParserState::FlowSequenceFirstEntry))
        } else if self.check(&[TokenKind::FlowMappingStart])? {
            Some((false, FlowStyle::Flow, ParserState::FlowMappingFirstKey))
        } else if block && self.check(&[TokenKind::BlockSequenceStart])? {
            Some((true, FlowStyle::Block, ParserState::BlockSequenceFirstEntry))
        } else if block && self.check(&[TokenKind::BlockMappingStart])? {
            Some((false, FlowStyle::Block, ParserState::BlockMappingFirstKey))
        } else {
            None
        };

        if let Some((is_sequence, flow_style, next_state)) = collection {
            let tok_span = self.peek_token()?.span;
            let end = if flow_style.is_flow() {
                tok_span.end
            } else {
                tok_span.start
            };
            self.state = next_state;
            let span = Span::new(start, end);
            let event_type = if is_sequence {
                EventType::SequenceStart {
                    anchor,
                    tag,
                    implicit,
                    flow_style,
                }
            } else {
                EventType::MappingStart {
                    anchor,
                    tag,
                    implicit,
                    flow_style,
                }
            };
            return Ok(Event::new(span, event_type));
        }

        if anchor.is_none() && tag.is_none() {
            let context = if block {
                "while parsing a block node"
            } else {
                "while parsing a flow node"
            };
            let tok = self.peek_token()?;
            let (kind, mark) = (tok.kind(), tok.span.start);
            return Err(YamlError::parser(
                Some(context),
                Some(start),
                format!("expected the node content, but found '{kind}'"),
                Some(mark),
            ));
        }

        self.state = self.pop_state();
        Ok(Event::new(
            Span::new(start, end),
            EventType::Scalar {
                anchor,
                tag,
                implicit: ImplicitTuple::new(implicit, false),
                value: String::new(),
                style: ScalarType::Plain,
            },
        ))
    }

    fn block_sequence_first_entry(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        self.marks.push(tok.span.start);
        self.block_sequence_entry()
    }

    fn block_sequence_entry(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            self.state = ParserState::BlockSequenceEntry;
            return self.next_comment();
        }
        if self.check(&[TokenKind::BlockEntry])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[TokenKind::BlockEntry, TokenKind::BlockEnd])? {
                self.state = ParserState::BlockSequenceEntry;
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::BlockSequenceEntry);
            return self.parse_node(true, false);
        }
        if !self.check(&[TokenKind::BlockEnd])? {
            let tok = self.peek_token()?;
            let (kind, mark) = (tok.kind(), tok.span.start);
            return Err(YamlError::parser(
                Some("while parsing a block collection"),
                self.pop_mark(),
                format!("expected <block end>, but found '{kind}'"),
                Some(mark),
            ));
        }
        let tok = self.scanner.get_token()?;
        self.state = self.pop_state();
        self.pop_mark();
        Ok(Event::new(tok.span, EventType::SequenceEnd))
    }

    fn indentless_sequence_entry(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            self.state = ParserState::IndentlessSequenceEntry;
            return self.next_comment();
        }
        if self.check(&[TokenKind::BlockEntry])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[
                TokenKind::BlockEntry,
                TokenKind::Key,
                TokenKind::Value,
                TokenKind::BlockEnd,
            ])? {
                self.state = ParserState::IndentlessSequenceEntry;
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::IndentlessSequenceEntry);
            return self.parse_node(true, false);
        }
        let span = self.peek_token()?.span;
        self.state = self.pop_state();
        Ok(Event::new(span, EventType::SequenceEnd))
    }

    fn block_mapping_first_key(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        self.marks.push(tok.span.start);
        self.block_mapping_key()
    }

    fn block_mapping_key(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            self.state = ParserState::BlockMappingKey;
            return self.next_comment();
        }
        if self.check(&[TokenKind::Key])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[TokenKind::Key, TokenKind::Value, TokenKind::BlockEnd])? {
                self.state = ParserState::BlockMappingValue;
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::BlockMappingValue);
            return self.parse_node(true, true);
        }
        if !self.check(&[TokenKind::BlockEnd])? {
            let tok = self.peek_token()?;
            let (kind, mark) = (tok.kind(), tok.span.start);
            return Err(YamlError::parser(
                Some("while parsing a block mapping"),
                self.pop_mark(),
                format!("expected <block end>, but found '{kind}'"),
                Some(mark),
            ));
        }
        let tok = self.scanner.get_token()?;
        self.state = self.pop_state();
        self.pop_mark();
        Ok(Event::new(tok.span, EventType::MappingEnd))
    }

    fn block_mapping_value(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Value])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[TokenKind::Comment])? {
                self.state = ParserState::BlockMappingValueComment;
                return self.block_mapping_value_comment();
            }
            if self.check(&[TokenKind::Key, TokenKind::Value, TokenKind::BlockEnd])? {
                self.state = ParserState::BlockMappingKey;
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::BlockMappingKey);
            return self.parse_node(true, true);
        }
        if self.check(&[TokenKind::Scalar])? {
            self.states.push(ParserState::BlockMappingKey);
            return self.parse_node(true, true);
        }
        let mark = self.peek_start()?;
        self.state = ParserState::BlockMappingKey;
        Ok(empty_scalar(mark))
    }

    /// Comments between `:` and the value they belong to.
    fn block_mapping_value_comment(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            return self.next_comment();
        }
        if self.check(&[TokenKind::Key, TokenKind::Value, TokenKind::BlockEnd])? {
            let mark = self.peek_start()?;
            self.state = ParserState::BlockMappingKey;
            return Ok(empty_scalar(mark));
        }
        self.states.push(ParserState::BlockMappingKey);
        self.parse_node(true, true)
    }

    fn flow_sequence_first_entry(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        self.marks.push(tok.span.start);
        self.flow_sequence_entry(true)
    }

    fn flow_sequence_entry(&mut self, mut first: bool) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            self.state = ParserState::FlowSequenceEntry { first };
            return self.next_comment();
        }
        if !self.check(&[TokenKind::FlowSequenceEnd])? {
            if !first {
                if !self.check(&[TokenKind::FlowEntry])? {
                    let tok = self.peek_token()?;
                    let (kind, mark) = (tok.kind(), tok.span.start);
                    return Err(YamlError::parser(
                        Some("while parsing a flow sequence"),
                        self.pop_mark(),
                        format!("expected ',' or ']', but got {kind}"),
                        Some(mark),
                    ));
                }
                self.scanner.get_token()?;
                first = true;
                if self.check(&[TokenKind::Comment])? {
                    self.state = ParserState::FlowSequenceEntry { first };
                    return self.next_comment();
                }
            }

            if self.check(&[TokenKind::Key])? {
                let span = self.peek_token()?.span;
                self.state = ParserState::FlowSequenceEntryMappingKey;
                return Ok(Event::new(
                    span,
                    EventType::MappingStart {
                        anchor: None,
                        tag: None,
                        implicit: true,
                        flow_style: FlowStyle::Flow,
                    },
                ));
            }
            if !self.check(&[TokenKind::FlowSequenceEnd])? {
                self.states.push(ParserState::FlowSequenceEntry { first: false });
                return self.parse_node(false, false);
            }
        }

        let tok = self.scanner.get_token()?;
        self.pop_mark();
        self.state = if self.check(&[TokenKind::Comment])? {
            ParserState::FlowEndComment
        } else {
            self.pop_state()
        };
        Ok(Event::new(tok.span, EventType::SequenceEnd))
    }

    fn flow_sequence_entry_mapping_key(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        if self.check(&[
            TokenKind::Value,
            TokenKind::FlowEntry,
            TokenKind::FlowSequenceEnd,
        ])? {
            self.state = ParserState::FlowSequenceEntryMappingValue;
            return Ok(empty_scalar(tok.span.end));
        }
        self.states.push(ParserState::FlowSequenceEntryMappingValue);
        self.parse_node(false, false)
    }

    fn flow_sequence_entry_mapping_value(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Value])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[TokenKind::FlowEntry, TokenKind::FlowSequenceEnd])? {
                self.state = ParserState::FlowSequenceEntryMappingEnd;
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::FlowSequenceEntryMappingEnd);
            return self.parse_node(false, false);
        }
        let mark = self.peek_start()?;
        self.state = ParserState::FlowSequenceEntryMappingEnd;
        Ok(empty_scalar(mark))
    }

    fn flow_sequence_entry_mapping_end(&mut self) -> YamlResult<Event> {
        self.state = ParserState::FlowSequenceEntry { first: false };
        let span = self.peek_token()?.span;
        Ok(Event::new(span, EventType::MappingEnd))
    }

    fn flow_mapping_first_key(&mut self) -> YamlResult<Event> {
        let tok = self.scanner.get_token()?;
        self.marks.push(tok.span.start);
        self.flow_mapping_key(true)
    }

    fn flow_mapping_key(&mut self, mut first: bool) -> YamlResult<Event> {
        if self.check(&[TokenKind::Comment])? {
            self.state = ParserState::FlowMappingKey { first };
            return self.next_comment();
        }
        if !self.check(&[TokenKind::FlowMappingEnd])? {
            if !first {
                if !self.check(&[TokenKind::FlowEntry])? {
                    let tok = self.peek_token()?;
                    let (kind, mark) = (tok.kind(), tok.span.start);
                    return Err(YamlError::parser(
                        Some("while parsing a flow mapping"),
                        self.pop_mark(),
                        format!("expected ',' or '}}', but got {kind}"),
                        Some(mark),
                    ));
                }
                self.scanner.get_token()?;
                first = true;
                if self.check(&[TokenKind::Comment])? {
                    self.state = ParserState::FlowMappingKey { first };
                    return self.next_comment();
                }
            }
            if self.check(&[TokenKind::Key])? {
                let tok = self.scanner.get_token()?;
                if self.check(&[
                    TokenKind::Value,
                    TokenKind::FlowEntry,
                    TokenKind::FlowMappingEnd,
                ])? {
                    self.state = ParserState::FlowMappingValue;
                    return Ok(empty_scalar(tok.span.end));
                }
                self.states.push(ParserState::FlowMappingValue);
                return self.parse_node(false, false);
            }
            if !self.check(&[TokenKind::FlowMappingEnd])? {
                self.states.push(ParserState::FlowMappingEmptyValue);
                return self.parse_node(false, false);
            }
        }

        let tok = self.scanner.get_token()?;
        self.pop_mark();
        self.state = if self.check(&[TokenKind::Comment])? {
            ParserState::FlowEndComment
        } else {
            self.pop_state()
        };
        Ok(Event::new(tok.span, EventType::MappingEnd))
    }

    fn flow_mapping_value(&mut self) -> YamlResult<Event> {
        if self.check(&[TokenKind::Value])? {
            let tok = self.scanner.get_token()?;
            if self.check(&[TokenKind::FlowEntry, TokenKind::FlowMappingEnd])? {
                self.state = ParserState::FlowMappingKey { first: false };
                return Ok(empty_scalar(tok.span.end));
            }
            self.states.push(ParserState::FlowMappingKey { first: false });
            return self.parse_node(false, false);
        }
        let mark = self.peek_start()?;
        self.state = ParserState::FlowMappingKey { first: false };
        Ok(empty_scalar(mark))
    }

    fn flow_mapping_empty_value(&mut self) -> YamlResult<Event> {
        self.state = ParserState::FlowMappingKey { first: false };
        let mark = self.peek_start()?;
        Ok(empty_scalar(mark))
    }

    fn flow_end_comment(&mut self) -> YamlResult<Event> {
        let event = self.next_comment()?;
        if !self.check(&[TokenKind::Comment])? {
            self.state = self.pop_state();
        }
        Ok(event)
    }
}

fn default_tag_handles() -> HashMap<String, String> {
    DEFAULT_TAGS
        .iter()
        .map(|(handle, prefix)| ((*handle).to_string(), (*prefix).to_string()))
        .collect()
}

impl<I: Iterator<Item = char>> Iterator for Parser<I> {
    type Item = YamlResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.get_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(err) => {
                self.state = ParserState::End;
                self.current_event = None;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::CommentType;

    fn kinds(input: &str) -> Vec<EventKind> {
        Parser::new_from_str(input)
            .map(|ev| ev.expect("event").kind())
            .collect()
    }

    fn parse_err(input: &str) -> YamlError {
        Parser::new_from_str(input)
            .find_map(Result::err)
            .expect("parser error")
    }

    #[test]
    fn empty_stream() {
        assert_eq!(kinds(""), vec![EventKind::StreamStart, EventKind::StreamEnd]);
    }

    #[test]
    fn block_mapping_with_sequence() {
        use EventKind::*;
        assert_eq!(
            kinds("a:\n- 1\n- 2\nb: c\n"),
            vec![
                StreamStart,
                DocumentStart,
                MappingStart,
                Scalar,
                SequenceStart,
                Scalar,
                Scalar,
                SequenceEnd,
                Scalar,
                Scalar,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn single_pair_in_flow_sequence() {
        use EventKind::*;
        assert_eq!(
            kinds("[a: b, c]"),
            vec![
                StreamStart,
                DocumentStart,
                SequenceStart,
                MappingStart,
                Scalar,
                Scalar,
                MappingEnd,
                Scalar,
                SequenceEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn implicit_flags() {
        let events: Vec<EventType> = Parser::new_from_str("- a\n- 'b'\n- !!str c\n- ! d\n")
            .map(|ev| ev.expect("event").event_type)
            .collect();
        let implicits: Vec<ImplicitTuple> = events
            .iter()
            .filter_map(|ev| match ev {
                EventType::Scalar { implicit, .. } => Some(*implicit),
                _ => None,
            })
            .collect();
        assert_eq!(
            implicits,
            vec![
                ImplicitTuple::new(true, false),
                ImplicitTuple::new(false, true),
                ImplicitTuple::new(false, false),
                ImplicitTuple::new(true, false),
            ]
        );
        assert!(events.iter().any(|ev| ev.tag() == Some("tag:yaml.org,2002:str")));
    }

    #[test]
    fn tag_directive_expands_handles() {
        let mut parser =
            Parser::new_from_str("%TAG !e! tag:example.com,2000:app/\n---\n!e!foo bar\n");
        let mut node_tags = Vec::new();
        let mut declared = Vec::new();
        while let Some(ev) = parser.get_event().expect("event") {
            match &ev.event_type {
                EventType::DocumentStart { tags, .. } => declared.clone_from(tags),
                other => node_tags.extend(other.tag().map(str::to_string)),
            }
        }
        assert_eq!(node_tags, vec!["tag:example.com,2000:app/foo".to_string()]);
        assert_eq!(
            declared,
            vec![("!e!".to_string(), "tag:example.com,2000:app/".to_string())]
        );
    }

    #[test]
    fn directives_do_not_leak_into_next_document() {
        let err = parse_err("%TAG !e! tag:e/\n--- !e!a x\n--- !e!b y\n");
        assert_eq!(err.problem(), "found undefined tag handle !e!");
    }

    #[test]
    fn directive_errors() {
        assert_eq!(
            parse_err("%YAML 1.1\n%YAML 1.1\n--- a").problem(),
            "found duplicate YAML directive"
        );
        assert_eq!(
            parse_err("%YAML 2.0\n--- a").problem(),
            "found incompatible YAML document (version 1.* is required)"
        );
        assert_eq!(
            parse_err("%TAG !a! x\n%TAG !a! y\n--- a").problem(),
            "duplicate tag handle !a!"
        );
        assert_eq!(
            parse_err("%YAML 1.1\na").problem(),
            "expected '<document start>', but found '<scalar>'"
        );
    }

    #[test]
    fn version_is_reported() {
        let version = Parser::new_from_str("%YAML 1.1\n--- a\n")
            .find_map(|ev| match ev.expect("event").event_type {
                EventType::DocumentStart { version, .. } => version,
                _ => None,
            });
        assert_eq!(version, Some(Version::V1_1));
    }

    #[test]
    fn missing_node_content() {
        let err = parse_err("[a, b");
        assert!(err.to_string().starts_with("while parsing a flow sequence"));
        assert!(err.problem().starts_with("expected ',' or ']', but got"));
        let err = parse_err("{a: b c: d");
        assert!(err.problem().starts_with("expected ',' or '}', but got"));
        let err = parse_err("- a\nb: c");
        assert_eq!(err.problem(), "expected <block end>, but found '?'");
    }

    #[test]
    fn anchor_without_content_is_empty_scalar() {
        let events: Vec<EventType> = Parser::new_from_str("a: &x\nb: *x\n")
            .map(|ev| ev.expect("event").event_type)
            .collect();
        assert!(events.contains(&EventType::Scalar {
            anchor: Some("x".into()),
            tag: None,
            implicit: ImplicitTuple::new(true, false),
            value: String::new(),
            style: ScalarType::Plain,
        }));
        assert!(events.contains(&EventType::Alias { anchor: "x".into() }));
    }

    #[test]
    fn comments_inside_sequences() {
        let mut scanner = Scanner::new_from_str("- # first\n  a\n- # empty\n- b # tail\n");
        scanner.emit_comments(true);
        let events: Vec<EventType> = Parser::new(scanner)
            .map(|ev| ev.expect("event").event_type)
            .collect();
        let values: Vec<&str> = events
            .iter()
            .filter_map(|ev| match ev {
                EventType::Scalar { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec!["a", "", "b"]);
        let comments = events
            .iter()
            .filter(|ev| matches!(ev, EventType::Comment { .. }))
            .count();
        assert_eq!(comments, 3);
    }

    #[test]
    fn comment_after_value_indicator() {
        let mut scanner = Scanner::new_from_str("key: # note\n  value\n");
        scanner.emit_comments(true);
        let events: Vec<EventType> = Parser::new(scanner)
            .map(|ev| ev.expect("event").event_type)
            .collect();
        assert!(events.contains(&EventType::Comment {
            comment_type: CommentType::InLine,
            value: " note".into()
        }));
        assert!(events.iter().any(|ev| matches!(
            ev,
            EventType::Scalar { value, .. } if value == "value"
        )));
        assert_eq!(events.last().map(EventType::kind), Some(EventKind::StreamEnd));
    }

    #[test]
    fn check_and_peek() {
        let mut parser = Parser::new_from_str("a");
        assert!(parser.check_event(EventKind::StreamStart).expect("check"));
        assert!(parser.check_event(EventKind::StreamStart).expect("check"));
        parser.get_event().expect("event");
        assert!(parser.check_event(EventKind::DocumentStart).expect("check"));
        while parser.get_event().expect("event").is_some() {}
        assert!(parser.peek_event().expect("peek").is_none());
    }
}
