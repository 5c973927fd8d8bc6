use crate::{CommentType, FlowStyle, Marker, ScalarType, Span, Version};
use std::fmt::{Display, Formatter};

/// Whether the tag of a scalar may be left out when it is written
/// as a plain scalar (`plain`) or with any other style (`non_plain`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct ImplicitTuple {
    pub plain: bool,
    pub non_plain: bool,
}

impl ImplicitTuple {
    #[must_use]
    pub const fn new(plain: bool, non_plain: bool) -> ImplicitTuple {
        ImplicitTuple { plain, non_plain }
    }

    #[must_use]
    pub fn both_false(self) -> bool {
        !self.plain && !self.non_plain
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EventType {
    StreamStart,
    StreamEnd,
    DocumentStart {
        explicit: bool,
        version: Option<Version>,
        /// `%TAG` directives declared for this document, as `(handle, prefix)`.
        tags: Vec<(String, String)>,
    },
    DocumentEnd {
        explicit: bool,
    },
    Alias {
        anchor: String,
    },
    Scalar {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: ImplicitTuple,
        value: String,
        style: ScalarType,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        flow_style: FlowStyle,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        implicit: bool,
        flow_style: FlowStyle,
    },
    MappingEnd,
    Comment {
        comment_type: CommentType,
        value: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Alias,
    Scalar,
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
    Comment,
}

impl EventType {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            EventType::StreamStart => EventKind::StreamStart,
            EventType::StreamEnd => EventKind::StreamEnd,
            EventType::DocumentStart { .. } => EventKind::DocumentStart,
            EventType::DocumentEnd { .. } => EventKind::DocumentEnd,
            EventType::Alias { .. } => EventKind::Alias,
            EventType::Scalar { .. } => EventKind::Scalar,
            EventType::SequenceStart { .. } => EventKind::SequenceStart,
            EventType::SequenceEnd => EventKind::SequenceEnd,
            EventType::MappingStart { .. } => EventKind::MappingStart,
            EventType::MappingEnd => EventKind::MappingEnd,
            EventType::Comment { .. } => EventKind::Comment,
        }
    }

    /// Anchor of a node event.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        match self {
            EventType::Alias { anchor } => Some(anchor),
            EventType::Scalar { anchor, .. }
            | EventType::SequenceStart { anchor, .. }
            | EventType::MappingStart { anchor, .. } => anchor.as_deref(),
            _ => None,
        }
    }

    /// Tag of a node event.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            EventType::Scalar { tag, .. }
            | EventType::SequenceStart { tag, .. }
            | EventType::MappingStart { tag, .. } => tag.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_collection_start(&self) -> bool {
        matches!(
            self,
            EventType::SequenceStart { .. } | EventType::MappingStart { .. }
        )
    }

    #[must_use]
    pub fn is_collection_end(&self) -> bool {
        matches!(self, EventType::SequenceEnd | EventType::MappingEnd)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::StreamStart => "StreamStartEvent",
            EventKind::StreamEnd => "StreamEndEvent",
            EventKind::DocumentStart => "DocumentStartEvent",
            EventKind::DocumentEnd => "DocumentEndEvent",
            EventKind::Alias => "AliasEvent",
            EventKind::Scalar => "ScalarEvent",
            EventKind::SequenceStart => "SequenceStartEvent",
            EventKind::SequenceEnd => "SequenceEndEvent",
            EventKind::MappingStart => "MappingStartEvent",
            EventKind::MappingEnd => "MappingEndEvent",
            EventKind::Comment => "CommentEvent",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Event {
    pub span: Span,
    pub event_type: EventType,
}

impl Event {
    #[must_use]
    pub fn new(span: Span, event_type: EventType) -> Event {
        Event { span, event_type }
    }

    /// An event with no meaningful source position, as produced by the serializer.
    #[must_use]
    pub fn synthetic(event_type: EventType) -> Event {
        Event {
            span: Span::empty(Marker::default()),
            event_type,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event_type.kind()
    }

    #[must_use]
    pub fn is(&self, kind: EventKind) -> bool {
        self.kind() == kind
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self.event_type, EventType::Comment { .. })
    }
}
