use crate::tokenizer::char_utils::{is_break, is_printable};
use yam_common::ScalarType;

/// What a scalar's text allows when it is written back out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScalarAnalysis {
    pub scalar: String,
    pub empty: bool,
    pub multiline: bool,
    pub allow_flow_plain: bool,
    pub allow_block_plain: bool,
    pub allow_single_quoted: bool,
    pub allow_block: bool,
}

fn is_whitespace_or_end(c: Option<&char>) -> bool {
    match c {
        None => true,
        Some(&c) => c == '\0' || c == ' ' || c == '\t' || is_break(c),
    }
}

/// Scans `scalar` for indicators, line breaks and special characters.
/// With `allow_unicode` off every non ASCII character counts as special.
#[must_use]
pub fn analyze_scalar(scalar: &str, allow_unicode: bool) -> ScalarAnalysis {
    if scalar.is_empty() {
        return ScalarAnalysis {
            scalar: String::new(),
            empty: true,
            multiline: false,
            allow_flow_plain: false,
            allow_block_plain: true,
            allow_single_quoted: true,
            allow_block: false,
        };
    }

    let mut block_indicators = false;
    let mut flow_indicators = false;
    let mut line_breaks = false;
    let mut special_characters = false;

    let mut leading_space = false;
    let mut leading_break = false;
    let mut trailing_space = false;
    let mut trailing_break = false;
    let mut break_space = false;
    let mut space_break = false;

    if scalar.starts_with("---") || scalar.starts_with("...") {
        block_indicators = true;
        flow_indicators = true;
    }

    let chars: Vec<char> = scalar.chars().collect();
    let last = chars.len() - 1;
    let mut preceded_by_whitespace = true;
    let mut previous_space = false;
    let mut previous_break = false;

    for (index, &ch) in chars.iter().enumerate() {
        let followed_by_whitespace = is_whitespace_or_end(chars.get(index + 1));
        if index == 0 {
            if "#,[]{}&*!|>'\"%@`".contains(ch) {
                flow_indicators = true;
                block_indicators = true;
            }
            if ch == '?' || ch == ':' {
                flow_indicators = true;
                if followed_by_whitespace {
                    block_indicators = true;
                }
            }
            if ch == '-' && followed_by_whitespace {
                flow_indicators = true;
                block_indicators = true;
            }
        } else {
            if ",?[]{}".contains(ch) {
                flow_indicators = true;
            }
            if ch == ':' {
                flow_indicators = true;
                if followed_by_whitespace {
                    block_indicators = true;
                }
            }
            if ch == '#' && preceded_by_whitespace {
                flow_indicators = true;
                block_indicators = true;
            }
        }

        let is_line_break = is_break(ch);
        if is_line_break {
            line_breaks = true;
        }
        if ch != '\n' && !(' '..='~').contains(&ch) {
            if ch == '\t' || ch == '\r' || !is_printable(ch) || !allow_unicode {
                special_characters = true;
            }
        }

        if ch == ' ' {
            if index == 0 {
                leading_space = true;
            }
            if index == last {
                trailing_space = true;
            }
            if previous_break {
                break_space = true;
            }
            previous_space = true;
            previous_break = false;
        } else if is_line_break {
            if index == 0 {
                leading_break = true;
            }
            if index == last {
                trailing_break = true;
            }
            if previous_space {
                space_break = true;
            }
            previous_space = false;
            previous_break = true;
        } else {
            previous_space = false;
            previous_break = false;
        }
        preceded_by_whitespace = ch == '\0' || ch == ' ' || ch == '\t' || is_line_break;
    }

    let mut allow_flow_plain = true;
    let mut allow_block_plain = true;
    let mut allow_single_quoted = true;
    let mut allow_block = true;

    if leading_space || leading_break || trailing_space || trailing_break {
        allow_flow_plain = false;
        allow_block_plain = false;
    }
    if trailing_space {
        allow_block = false;
    }
    if break_space {
        allow_flow_plain = false;
        allow_block_plain = false;
        allow_single_quoted = false;
    }
    if space_break || special_characters {
        allow_flow_plain = false;
        allow_block_plain = false;
        allow_single_quoted = false;
        allow_block = false;
    }
    if line_breaks {
        allow_flow_plain = false;
    }
    if flow_indicators {
        allow_flow_plain = false;
    }
    if block_indicators {
        allow_block_plain = false;
    }

    ScalarAnalysis {
        scalar: scalar.to_string(),
        empty: false,
        multiline: line_breaks,
        allow_flow_plain,
        allow_block_plain,
        allow_single_quoted,
        allow_block,
    }
}

/// Where the scalar being styled sits.
#[derive(Copy, Clone, Debug, Default)]
pub struct StyleContext {
    pub canonical: bool,
    pub flow_level: usize,
    pub simple_key: bool,
    /// The tag may be left out if the scalar is written plain.
    pub plain_implicit: bool,
}

/// Picks the style a scalar is written with: the requested one when the text
/// allows it, otherwise the next safer style down to double quotes.
#[must_use]
pub fn choose_scalar_style(
    requested: ScalarType,
    analysis: &ScalarAnalysis,
    ctx: StyleContext,
) -> ScalarType {
    if requested == ScalarType::DoubleQuote || ctx.canonical {
        return ScalarType::DoubleQuote;
    }
    if requested == ScalarType::Plain
        && ctx.plain_implicit
        && (!ctx.simple_key || (!analysis.empty && !analysis.multiline))
        && ((ctx.flow_level > 0 && analysis.allow_flow_plain)
            || (ctx.flow_level == 0 && analysis.allow_block_plain))
    {
        return ScalarType::Plain;
    }
    if matches!(requested, ScalarType::Literal | ScalarType::Folded)
        && ctx.flow_level == 0
        && !ctx.simple_key
        && analysis.allow_block
    {
        return requested;
    }
    if matches!(requested, ScalarType::Plain | ScalarType::SingleQuote)
        && analysis.allow_single_quoted
        && !(ctx.simple_key && analysis.multiline)
    {
        return ScalarType::SingleQuote;
    }
    ScalarType::DoubleQuote
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(plain_implicit: bool) -> StyleContext {
        StyleContext {
            plain_implicit,
            ..StyleContext::default()
        }
    }

    #[test]
    fn indicators() {
        let analysis = analyze_scalar("a: b", true);
        assert!(!analysis.allow_block_plain);
        assert!(!analysis.allow_flow_plain);
        assert!(analysis.allow_single_quoted);

        let analysis = analyze_scalar("a:b", true);
        assert!(analysis.allow_block_plain);
        assert!(!analysis.allow_flow_plain);

        assert!(!analyze_scalar("- x", true).allow_block_plain);
        assert!(analyze_scalar("-x", true).allow_block_plain);
        assert!(!analyze_scalar("a #b", true).allow_block_plain);
        assert!(analyze_scalar("a#b", true).allow_block_plain);
        assert!(!analyze_scalar("--- x", true).allow_block_plain);
    }

    #[test]
    fn whitespace_edges() {
        let analysis = analyze_scalar(" lead", true);
        assert!(!analysis.allow_block_plain);
        assert!(analysis.allow_block);
        let analysis = analyze_scalar("trail ", true);
        assert!(!analysis.allow_block);
        let analysis = analyze_scalar("line1\nline2", true);
        assert!(analysis.multiline);
        assert!(analysis.allow_block);
        assert!(!analysis.allow_flow_plain);
    }

    #[test]
    fn special_characters() {
        let analysis = analyze_scalar("tab\there", true);
        assert!(!analysis.allow_single_quoted);
        assert!(!analysis.allow_block);
        assert!(analyze_scalar("caf\u{e9}", true).allow_block_plain);
        assert!(!analyze_scalar("caf\u{e9}", false).allow_single_quoted);
    }

    #[test]
    fn style_choice() {
        let quoted = analyze_scalar("a: b", true);
        assert_eq!(
            choose_scalar_style(ScalarType::Plain, &quoted, block(true)),
            ScalarType::SingleQuote
        );
        let empty = analyze_scalar("", true);
        assert_eq!(
            choose_scalar_style(ScalarType::Plain, &empty, block(false)),
            ScalarType::SingleQuote
        );
        let lines = analyze_scalar("line1\nline2", true);
        assert_eq!(
            choose_scalar_style(ScalarType::Literal, &lines, block(false)),
            ScalarType::Literal
        );
        let in_key = StyleContext {
            simple_key: true,
            ..block(false)
        };
        assert_eq!(
            choose_scalar_style(ScalarType::Literal, &lines, in_key),
            ScalarType::DoubleQuote
        );
        let word = analyze_scalar("word", true);
        assert_eq!(
            choose_scalar_style(ScalarType::Plain, &word, block(true)),
            ScalarType::Plain
        );
        // a plain scalar that would resolve to another tag gets quoted
        assert_eq!(
            choose_scalar_style(ScalarType::Plain, &analyze_scalar("123", true), block(false)),
            ScalarType::SingleQuote
        );
    }
}
