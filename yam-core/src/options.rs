//! Loading and dumping settings. Nothing here is global: every stage gets the
//! options it needs when it is built.

use crate::tokenizer::DEFAULT_SIMPLE_KEY_WINDOW;
use yam_common::{FlowStyle, ScalarType, Version, YamlError, YamlResult};

/// Upper bound for the block indentation step.
pub const MAX_INDENT: usize = 10;
pub const MIN_INDENT: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderOptions {
    /// When `false` a repeated mapping key is a [`YamlError::DuplicateKey`],
    /// otherwise the later entry wins.
    pub allow_duplicate_keys: bool,
    /// Limit on aliases that point at sequences or mappings, guards against
    /// "billion laughs" style documents.
    pub max_aliases_for_collections: usize,
    /// Permit a mapping or set to contain itself as a key.
    pub allow_recursive_keys: bool,
    /// Keep comments and blank lines as events and attach them to nodes.
    pub process_comments: bool,
    /// How far, in code points, a simple key may reach before its `:`.
    pub simple_key_window: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            allow_duplicate_keys: true,
            max_aliases_for_collections: 50,
            allow_recursive_keys: false,
            process_comments: false,
            simple_key_window: DEFAULT_SIMPLE_KEY_WINDOW,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LineBreak {
    #[default]
    Unix,
    Win,
    Mac,
}

impl LineBreak {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LineBreak::Unix => "\n",
            LineBreak::Win => "\r\n",
            LineBreak::Mac => "\r",
        }
    }
}

/// What to do with strings that contain characters a YAML stream can't carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NonPrintableStyle {
    /// Represent them as `!!binary`.
    #[default]
    Binary,
    /// Keep them as strings, the emitter escapes them in double quotes.
    Escape,
}

/// Produces anchor names for nodes referenced more than once.
pub trait AnchorGenerator {
    fn next_anchor(&mut self) -> String;
}

/// `id001`, `id002`, ...
#[derive(Clone, Debug, Default)]
pub struct NumberAnchorGenerator {
    last: usize,
}

impl NumberAnchorGenerator {
    #[must_use]
    pub fn new(last: usize) -> Self {
        NumberAnchorGenerator { last }
    }
}

impl AnchorGenerator for NumberAnchorGenerator {
    fn next_anchor(&mut self) -> String {
        self.last += 1;
        format!("id{:03}", self.last)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumperOptions {
    pub default_scalar_style: ScalarType,
    pub default_flow_style: FlowStyle,
    pub canonical: bool,
    pub allow_unicode: bool,
    pub(crate) indent: usize,
    pub(crate) indicator_indent: usize,
    pub indent_with_indicator: bool,
    pub width: usize,
    pub split_lines: bool,
    pub line_break: LineBreak,
    pub explicit_start: bool,
    pub explicit_end: bool,
    pub version: Option<Version>,
    /// `%TAG` directives written in front of every document, as `(handle, prefix)`.
    pub tags: Vec<(String, String)>,
    pub pretty_flow: bool,
    pub(crate) max_simple_key_length: usize,
    pub non_printable_style: NonPrintableStyle,
    pub process_comments: bool,
}

impl Default for DumperOptions {
    fn default() -> Self {
        DumperOptions {
            default_scalar_style: ScalarType::Plain,
            default_flow_style: FlowStyle::Auto,
            canonical: false,
            allow_unicode: true,
            indent: 2,
            indicator_indent: 0,
            indent_with_indicator: false,
            width: 80,
            split_lines: true,
            line_break: LineBreak::Unix,
            explicit_start: false,
            explicit_end: false,
            version: None,
            tags: Vec::new(),
            pretty_flow: false,
            max_simple_key_length: 128,
            non_printable_style: NonPrintableStyle::Binary,
            process_comments: false,
        }
    }
}

impl DumperOptions {
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn set_indent(&mut self, indent: usize) -> YamlResult<()> {
        if indent < MIN_INDENT {
            return Err(YamlError::Config(format!(
                "Indent must be at least {MIN_INDENT}"
            )));
        }
        if indent > MAX_INDENT {
            return Err(YamlError::Config(format!(
                "Indent must be at most {MAX_INDENT}"
            )));
        }
        self.indent = indent;
        Ok(())
    }

    #[must_use]
    pub fn indicator_indent(&self) -> usize {
        self.indicator_indent
    }

    pub fn set_indicator_indent(&mut self, indicator_indent: usize) -> YamlResult<()> {
        if indicator_indent > MAX_INDENT - 1 {
            return Err(YamlError::Config(format!(
                "Indicator indent must be at most {}",
                MAX_INDENT - 1
            )));
        }
        self.indicator_indent = indicator_indent;
        Ok(())
    }

    #[must_use]
    pub fn max_simple_key_length(&self) -> usize {
        self.max_simple_key_length
    }

    pub fn set_max_simple_key_length(&mut self, length: usize) -> YamlResult<()> {
        if length > DEFAULT_SIMPLE_KEY_WINDOW {
            return Err(YamlError::Config(format!(
                "The simple key must not span more than {DEFAULT_SIMPLE_KEY_WINDOW} stream characters"
            )));
        }
        self.max_simple_key_length = length;
        Ok(())
    }

    /// Checks the combination of settings that can't be validated one at a time.
    pub fn validate(&self) -> YamlResult<()> {
        if !self.indent_with_indicator && self.indicator_indent >= self.indent {
            return Err(YamlError::Config(
                "Indicator indent must be smaller than indent".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_bounds() {
        let mut options = DumperOptions::default();
        assert!(options.set_indent(0).is_err());
        assert!(options.set_indent(11).is_err());
        options.set_indent(4).expect("indent");
        assert_eq!(options.indent(), 4);
        assert!(options.set_indicator_indent(10).is_err());
        options.set_indicator_indent(4).expect("indicator");
        assert!(options.validate().is_err());
        options.indent_with_indicator = true;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn simple_key_limit() {
        let mut options = DumperOptions::default();
        assert_eq!(options.max_simple_key_length(), 128);
        assert!(options.set_max_simple_key_length(1025).is_err());
        options.set_max_simple_key_length(1024).expect("limit");
    }

    #[test]
    fn anchors_are_numbered() {
        let mut gen = NumberAnchorGenerator::default();
        assert_eq!(gen.next_anchor(), "id001");
        assert_eq!(gen.next_anchor(), "id002");
    }
}
