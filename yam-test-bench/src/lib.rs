pub mod consts;

use std::fmt::Write;
use yam_common::{Event, EventType, FlowStyle, ScalarType};
use yam_core::Parser;

///
/// Assert that for a given input, the parser generates the expected set of events.
/// An expected string ending in `ERR` only requires the parser to fail.
///
/// # Panics
///
///    Function panics if there is a difference between expected events string and one generated
///    from the input.
pub fn assert_eq_event(input: &str, events: &str) {
    let line = event_notation(input, false);
    let expected_err = events.ends_with("ERR");
    let actual_err = line.ends_with("ERR");
    assert_eq!(actual_err, expected_err, "Error mismatch in case: {input}\n{line}");
    if !expected_err {
        assert_eq!(line, events, "Error in case: {input}");
    }
}

/// Events of `input`, one per line, each line preceded by `\n`. Stream events
/// are only written with `emit_stream_token`; a failure ends the text in `ERR`.
#[must_use]
pub fn event_notation(input: &str, emit_stream_token: bool) -> String {
    let mut line = String::new();
    for ev in Parser::new_from_str(input) {
        match ev {
            Ok(ev) => write_event(&mut line, &ev, emit_stream_token),
            Err(_) => {
                line.push_str("\nERR");
                break;
            }
        }
    }
    line
}

pub fn write_event(line: &mut String, ev: &Event, emit_stream_token: bool) {
    let _ = match &ev.event_type {
        EventType::StreamStart if emit_stream_token => write!(line, "\n+STR"),
        EventType::StreamEnd if emit_stream_token => write!(line, "\n-STR"),
        EventType::DocumentStart { explicit, .. } => {
            write!(line, "\n+DOC{}", if *explicit { " ---" } else { "" })
        }
        EventType::DocumentEnd { explicit } => {
            write!(line, "\n-DOC{}", if *explicit { " ..." } else { "" })
        }
        EventType::Alias { anchor } => write!(line, "\n=ALI *{anchor}"),
        EventType::Scalar {
            anchor,
            tag,
            value,
            style,
            ..
        } => {
            let props = properties(anchor.as_deref(), tag.as_deref());
            let indicator = match style {
                ScalarType::Plain => ':',
                ScalarType::SingleQuote => '\'',
                ScalarType::DoubleQuote => '"',
                ScalarType::Literal => '|',
                ScalarType::Folded => '>',
            };
            write!(line, "\n=VAL{props} {indicator}{}", escape_text(value))
        }
        EventType::SequenceStart {
            anchor,
            tag,
            flow_style,
            ..
        } => {
            let flow = if *flow_style == FlowStyle::Flow { " []" } else { "" };
            let props = properties(anchor.as_deref(), tag.as_deref());
            write!(line, "\n+SEQ{flow}{props}")
        }
        EventType::SequenceEnd => write!(line, "\n-SEQ"),
        EventType::MappingStart {
            anchor,
            tag,
            flow_style,
            ..
        } => {
            let flow = if *flow_style == FlowStyle::Flow { " {}" } else { "" };
            let props = properties(anchor.as_deref(), tag.as_deref());
            write!(line, "\n+MAP{flow}{props}")
        }
        EventType::MappingEnd => write!(line, "\n-MAP"),
        _ => Ok(()),
    };
}

fn properties(anchor: Option<&str>, tag: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(anchor) = anchor {
        let _ = write!(out, " &{anchor}");
    }
    if let Some(tag) = tag {
        let _ = write!(out, " <{tag}>");
    }
    out
}

/// Writes line breaks, tabs and backslashes as escapes so a value stays on one line.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            c => out.push(c),
        }
    }
    out
}
