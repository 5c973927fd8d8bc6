//! Comments kept for round-tripping.

use crate::tokenizer::Parser;
use yam_common::{CommentType, Event, EventKind, EventType, Span, YamlResult};

/// One comment or blank line, as attached to a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentLine {
    pub span: Span,
    pub comment_type: CommentType,
    /// Text after `#`, or the line break itself for blank lines.
    pub value: String,
}

impl CommentLine {
    #[must_use]
    pub fn new(comment_type: CommentType, value: impl Into<String>) -> Self {
        CommentLine {
            span: Span::default(),
            comment_type,
            value: value.into(),
        }
    }

    /// Builds a line from a comment event, `None` for any other event.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        match &event.event_type {
            EventType::Comment {
                comment_type,
                value,
            } => Some(CommentLine {
                span: event.span,
                comment_type: *comment_type,
                value: value.clone(),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_event(&self) -> Event {
        Event::new(
            self.span,
            EventType::Comment {
                comment_type: self.comment_type,
                value: self.value.clone(),
            },
        )
    }
}

/// Pulls consecutive comment events of the accepted types off a parser.
#[derive(Clone, Debug)]
pub struct CommentCollector {
    accepted: &'static [CommentType],
    lines: Vec<CommentLine>,
}

impl CommentCollector {
    /// Blank lines and comments on their own line.
    #[must_use]
    pub fn block() -> Self {
        CommentCollector {
            accepted: &[CommentType::BlankLine, CommentType::Block],
            lines: Vec::new(),
        }
    }

    /// Comments trailing content on the same line.
    #[must_use]
    pub fn inline() -> Self {
        CommentCollector {
            accepted: &[CommentType::InLine],
            lines: Vec::new(),
        }
    }

    fn accepts(&self, event: Option<&Event>) -> bool {
        match event.map(|ev| &ev.event_type) {
            Some(EventType::Comment { comment_type, .. }) => self.accepted.contains(comment_type),
            _ => false,
        }
    }

    pub fn collect<I: Iterator<Item = char>>(
        &mut self,
        parser: &mut Parser<I>,
    ) -> YamlResult<&mut Self> {
        while self.accepts(parser.peek_event()?) {
            if let Some(line) = parser.get_event()?.as_ref().and_then(CommentLine::from_event) {
                self.lines.push(line);
            }
        }
        Ok(self)
    }

    /// Takes every collected line, leaving the collector empty.
    pub fn consume(&mut self) -> Vec<CommentLine> {
        std::mem::take(&mut self.lines)
    }

    /// Puts lines back, e.g. when they turned out to trail a collection.
    pub fn extend(&mut self, lines: Vec<CommentLine>) {
        self.lines.extend(lines);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Takes all leading comment events regardless of their type.
pub fn collect_any<I: Iterator<Item = char>>(
    parser: &mut Parser<I>,
    lines: &mut Vec<CommentLine>,
) -> YamlResult<()> {
    while parser.check_event(EventKind::Comment)? {
        if let Some(line) = parser.get_event()?.as_ref().and_then(CommentLine::from_event) {
            lines.push(line);
        }
    }
    Ok(())
}
