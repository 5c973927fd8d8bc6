/// Space or tab.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Any of the line break characters a YAML 1.1 stream recognizes.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_break(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Line break or the end of input sentinel.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_breakz(c: char) -> bool {
    c == '\0' || is_break(c)
}

/// Line break, end of input or space. Tabs are content here.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_blankz_no_tab(c: char) -> bool {
    c == ' ' || is_breakz(c)
}

#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_blank_or_breakz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_flow(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_alpha(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' | '-')
}

/// Check whether the character is a valid URI character.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_uri_char(c: char) -> bool {
    is_alpha(c) || ";/?:@&=+$,_.!~*'()[]%".contains(c)
}

/// Characters that may be part of an anchor or alias name.
#[cfg_attr(not(feature = "no-inline"), inline)]
#[must_use]
pub fn is_anchor_char(c: char) -> bool {
    !is_blank_or_breakz(c) && !":,[]{}/.*&".contains(c)
}

/// Code points a YAML stream is allowed to carry.
#[must_use]
pub fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{7E}' | '\u{85}'
        | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

#[inline]
#[must_use]
pub fn as_hex(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Character produced by a single-letter escape in a double quoted scalar.
#[must_use]
pub fn unescape_char(c: char) -> Option<char> {
    Some(match c {
        '0' => '\0',
        'a' => '\x07',
        'b' => '\x08',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\x0b',
        'f' => '\x0c',
        'r' => '\r',
        'e' => '\x1b',
        ' ' => ' ',
        '"' => '"',
        '/' => '/',
        '\\' => '\\',
        'N' => '\u{85}',
        '_' => '\u{A0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        _ => return None,
    })
}

/// Inverse of [`unescape_char`]: the escape letter used when writing `c` double quoted.
#[must_use]
pub fn escape_char(c: char) -> Option<char> {
    Some(match c {
        '\0' => '0',
        '\x07' => 'a',
        '\x08' => 'b',
        '\t' => 't',
        '\n' => 'n',
        '\x0b' => 'v',
        '\x0c' => 'f',
        '\r' => 'r',
        '\x1b' => 'e',
        '"' => '"',
        '\\' => '\\',
        '\u{85}' => 'N',
        '\u{A0}' => '_',
        '\u{2028}' => 'L',
        '\u{2029}' => 'P',
        _ => return None,
    })
}

/// Number of hex digits following `x`, `u` and `U` escapes.
#[must_use]
pub fn escape_code_len(c: char) -> Option<usize> {
    match c {
        'x' => Some(2),
        'u' => Some(4),
        'U' => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_ranges() {
        assert!(is_printable('a'));
        assert!(is_printable('\u{85}'));
        assert!(is_printable('😀'));
        assert!(!is_printable('\u{1}'));
        assert!(!is_printable('\u{7F}'));
        assert!(!is_printable('\u{FFFE}'));
    }

    #[test]
    fn escapes_are_symmetric() {
        for c in ['\0', '\x07', '\t', '\n', '\x1b', '"', '\\', '\u{85}', '\u{2029}'] {
            let letter = escape_char(c).unwrap();
            assert_eq!(unescape_char(letter), Some(c));
        }
        assert_eq!(escape_code_len('U'), Some(8));
        assert_eq!(unescape_char('q'), None);
    }

    #[test]
    fn anchor_chars() {
        assert!(is_anchor_char('a'));
        assert!(is_anchor_char('!'));
        assert!(!is_anchor_char(','));
        assert!(!is_anchor_char(' '));
        assert!(!is_anchor_char('\0'));
    }
}
