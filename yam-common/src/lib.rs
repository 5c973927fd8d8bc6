extern crate core;

pub mod error;
pub mod event;
pub mod tags;

pub use error::{MarkedError, YamlError};
pub use event::{Event, EventKind, EventType, ImplicitTuple};

use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ScalarType {
    /// Unquoted string type like:
    /// ```yaml
    ///   multiline
    ///   string
    /// ```
    Plain,
    /// Folded string type like:
    /// ```yaml
    ///   >
    ///     folded
    ///     string
    /// ```
    Folded,
    /// Literal string type like:
    /// ```yaml
    ///   |
    ///     literal
    ///     string
    /// ```
    Literal,
    /// Single quote string which permits any symbol inside
    /// E.g. :
    /// ```yaml
    /// ' This is a quoted string
    ///    with ''quoted'' string within.'
    /// ```
    SingleQuote,
    /// Double quote string which permits escapes inside
    /// E.g. :
    /// ```yaml
    /// "This is a quoted string
    ///    with \"double quoted\" string within."
    /// ```
    DoubleQuote,
}

impl ScalarType {
    /// Indicator character that opens a scalar of this type, `None` for plain scalars.
    #[must_use]
    pub fn indicator(self) -> Option<char> {
        match self {
            ScalarType::Plain => None,
            ScalarType::Folded => Some('>'),
            ScalarType::Literal => Some('|'),
            ScalarType::SingleQuote => Some('\''),
            ScalarType::DoubleQuote => Some('"'),
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Plain => write!(f, ":"),
            ScalarType::Folded => write!(f, ">"),
            ScalarType::Literal => write!(f, "|"),
            ScalarType::SingleQuote => write!(f, "'"),
            ScalarType::DoubleQuote => write!(f, "\""),
        }
    }
}

/// Layout of a collection.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum FlowStyle {
    /// `[a, b]` and `{a: b}`
    Flow,
    /// Indentation based layout.
    Block,
    /// Let the representer decide per collection.
    #[default]
    Auto,
}

impl FlowStyle {
    #[must_use]
    pub fn is_flow(self) -> bool {
        self == FlowStyle::Flow
    }
}

/// Position of a comment relative to the node it belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum CommentType {
    /// An empty line, kept so blank-line layout survives a round-trip.
    BlankLine,
    /// A comment on its own line.
    Block,
    /// A comment trailing some content on the same line.
    InLine,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenType {
    StreamStart,
    StreamEnd,
    VersionDirective {
        major: u32,
        minor: u32,
    },
    TagDirective {
        handle: String,
        prefix: String,
    },
    /// Any directive other than `%YAML` and `%TAG`, kept by name and otherwise ignored.
    ReservedDirective(String),
    DocumentStart,
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    BlockEntry,
    FlowEntry,
    Key,
    Value,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    Alias(String),
    Anchor(String),
    Tag(Tag),
    Scalar {
        scalar_type: ScalarType,
        value: String,
    },
    Comment {
        comment_type: CommentType,
        value: String,
    },
}

impl TokenType {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenType::StreamStart => TokenKind::StreamStart,
            TokenType::StreamEnd => TokenKind::StreamEnd,
            TokenType::VersionDirective { .. }
            | TokenType::TagDirective { .. }
            | TokenType::ReservedDirective(_) => TokenKind::Directive,
            TokenType::DocumentStart => TokenKind::DocumentStart,
            TokenType::DocumentEnd => TokenKind::DocumentEnd,
            TokenType::BlockSequenceStart => TokenKind::BlockSequenceStart,
            TokenType::BlockMappingStart => TokenKind::BlockMappingStart,
            TokenType::BlockEnd => TokenKind::BlockEnd,
            TokenType::BlockEntry => TokenKind::BlockEntry,
            TokenType::FlowEntry => TokenKind::FlowEntry,
            TokenType::Key => TokenKind::Key,
            TokenType::Value => TokenKind::Value,
            TokenType::FlowSequenceStart => TokenKind::FlowSequenceStart,
            TokenType::FlowSequenceEnd => TokenKind::FlowSequenceEnd,
            TokenType::FlowMappingStart => TokenKind::FlowMappingStart,
            TokenType::FlowMappingEnd => TokenKind::FlowMappingEnd,
            TokenType::Alias(_) => TokenKind::Alias,
            TokenType::Anchor(_) => TokenKind::Anchor,
            TokenType::Tag(_) => TokenKind::Tag,
            TokenType::Scalar { .. } => TokenKind::Scalar,
            TokenType::Comment { .. } => TokenKind::Comment,
        }
    }
}

/// Payload-free discriminant of [`TokenType`], used for lookahead checks.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TokenKind {
    StreamStart,
    StreamEnd,
    Directive,
    DocumentStart,
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    BlockEntry,
    FlowEntry,
    Key,
    Value,
    FlowSequenceStart,
    FlowSequenceEnd,
    FlowMappingStart,
    FlowMappingEnd,
    Alias,
    Anchor,
    Tag,
    Scalar,
    Comment,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::StreamStart => "<stream start>",
            TokenKind::StreamEnd => "<stream end>",
            TokenKind::Directive => "<directive>",
            TokenKind::DocumentStart => "<document start>",
            TokenKind::DocumentEnd => "<document end>",
            TokenKind::BlockSequenceStart => "<block sequence start>",
            TokenKind::BlockMappingStart => "<block mapping start>",
            TokenKind::BlockEnd => "<block end>",
            TokenKind::BlockEntry => "-",
            TokenKind::FlowEntry => ",",
            TokenKind::Key => "?",
            TokenKind::Value => ":",
            TokenKind::FlowSequenceStart => "[",
            TokenKind::FlowSequenceEnd => "]",
            TokenKind::FlowMappingStart => "{",
            TokenKind::FlowMappingEnd => "}",
            TokenKind::Alias => "<alias>",
            TokenKind::Anchor => "<anchor>",
            TokenKind::Tag => "<tag>",
            TokenKind::Scalar => "<scalar>",
            TokenKind::Comment => "#",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub span: Span,
    pub token_type: TokenType,
}

impl Token {
    #[must_use]
    pub fn new(start: Marker, end: Marker, token_type: TokenType) -> Token {
        Token {
            span: Span::new(start, end),
            token_type,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.token_type.kind()
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ChompIndicator {
    /// `-` final line break and any trailing empty lines are excluded from the scalar’s content
    Strip,
    ///  ` ` final line break character is preserved in the scalar’s content
    Clip,
    /// `+` final line break and any trailing empty lines are considered to be part of the scalar’s content
    Keep,
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Marker {
    /// Index in code points of the input.
    pub pos: usize,
    /// Line of mark. Zero indexed.
    pub line: usize,
    /// Column of mark. Zero indexed.
    pub col: usize,
}

impl Marker {
    #[must_use]
    pub fn new(pos: usize, line: usize, col: usize) -> Marker {
        Marker { pos, line, col }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.col + 1)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Eq, Default, Hash)]
pub struct Span {
    pub start: Marker,
    pub end: Marker,
}

impl Span {
    #[must_use]
    pub fn new(start: Marker, end: Marker) -> Self {
        Span { start, end }
    }

    #[must_use]
    pub fn empty(mark: Marker) -> Self {
        Span {
            start: mark,
            end: mark,
        }
    }
}

/// Version announced by a `%YAML` directive.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const V1_0: Version = Version { major: 1, minor: 0 };
    pub const V1_1: Version = Version { major: 1, minor: 1 };
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`YamlError`].
pub type YamlResult<T> = Result<T, YamlError>;
pub type ScanResult = Result<(), YamlError>;

/// A YAML tag as written in the source, before handle expansion.
#[derive(Clone, PartialEq, Debug, Eq, Ord, PartialOrd, Hash)]
pub struct Tag {
    /// Handle of the tag (`!` included). Empty for verbatim tags (`!<...>`) and the lone `!`.
    pub handle: String,
    /// The suffix of the tag.
    pub suffix: String,
}

impl Tag {
    /// Returns whether the tag uses the secondary handle that maps onto the YAML core schema
    /// (`!!str`, `!!int`, ...).
    #[must_use]
    pub fn is_yaml_core_schema(&self) -> bool {
        self.handle == "!!"
    }

    #[must_use]
    pub fn is_verbatim(&self) -> bool {
        self.handle.is_empty()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.handle.is_empty() && self.suffix != "!" {
            write!(f, "!<{}>", self.suffix)
        } else {
            write!(f, "{}{}", self.handle, self.suffix)
        }
    }
}
