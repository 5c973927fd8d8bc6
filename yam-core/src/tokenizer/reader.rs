use crate::tokenizer::char_utils::is_printable;
use std::str::Chars;
use yam_common::{Marker, YamlError};

const CHUNK_SIZE: usize = 1024;

///
/// Random access window over a stream of code points.
///
/// The reader pulls characters from the underlying iterator in chunks of
/// `1024` code points and keeps only the unconsumed part of the window.
/// Every chunk is checked for characters YAML does not allow; the first
/// offending character truncates the window and is reported through
/// [`StreamReader::error`].
///
/// # Methods
/// ## Peeking
/// - `peek(k) -> char`: Code point `k` positions ahead, `'\0'` past the end of input.
/// - `prefix(n) -> String`: The next `n` code points (fewer at the end of input).
///
/// ## Consuming
/// - `forward(n)`: Skips `n` code points, keeping `line`/`column` current.
///   `\r\n`, `\r`, `\n`, NEL, LS and PS each count as a single line break.
/// - `prefix_forward(n) -> String`: `prefix(n)` followed by `forward(n)`.
pub struct StreamReader<I> {
    name: String,
    source: I,
    buffer: Vec<char>,
    pointer: usize,
    eof: bool,
    index: usize,
    line: usize,
    column: usize,
    error: Option<YamlError>,
}

impl<'a> StreamReader<Chars<'a>> {
    #[must_use]
    pub fn from_str(input: &'a str) -> StreamReader<Chars<'a>> {
        StreamReader::new("'string'", input.chars())
    }
}

impl<I: Iterator<Item = char>> StreamReader<I> {
    pub fn new(name: impl Into<String>, source: I) -> StreamReader<I> {
        StreamReader {
            name: name.into(),
            source,
            buffer: Vec::with_capacity(CHUNK_SIZE),
            pointer: 0,
            eof: false,
            index: 0,
            line: 0,
            column: 0,
            error: None,
        }
    }

    /// Returns `true` when code point `size` ahead is available.
    fn ensure_enough_data(&mut self, size: usize) -> bool {
        while !self.eof && self.pointer + size >= self.buffer.len() {
            self.update();
        }
        self.pointer + size < self.buffer.len()
    }

    fn update(&mut self) {
        if self.pointer > 0 {
            self.buffer.drain(..self.pointer);
            self.pointer = 0;
        }
        let start = self.buffer.len();
        for _ in 0..CHUNK_SIZE {
            match self.source.next() {
                Some(c) => self.buffer.push(c),
                None => {
                    self.eof = true;
                    break;
                }
            }
        }

        let bad = self.buffer[start..]
            .iter()
            .position(|&c| !is_printable(c))
            .map(|offset| start + offset);
        if let Some(at) = bad {
            let character = self.buffer[at];
            self.error = Some(YamlError::Reader {
                name: self.name.clone(),
                position: self.index + at,
                character,
                code: u32::from(character),
            });
            self.buffer.truncate(at);
            self.eof = true;
        }
    }

    /// Reports the first non-printable character found so far, if any.
    pub fn error(&self) -> Option<&YamlError> {
        self.error.as_ref()
    }

    #[cfg_attr(not(feature = "no-inline"), inline)]
    pub fn peek(&mut self, k: usize) -> char {
        if self.ensure_enough_data(k) {
            self.buffer[self.pointer + k]
        } else {
            '\0'
        }
    }

    pub fn prefix(&mut self, n: usize) -> String {
        if n == 0 {
            return String::new();
        }
        self.ensure_enough_data(n - 1);
        let end = usize::min(self.pointer + n, self.buffer.len());
        self.buffer[self.pointer..end].iter().collect()
    }

    pub fn prefix_forward(&mut self, n: usize) -> String {
        let prefix = self.prefix(n);
        self.forward(n);
        prefix
    }

    pub fn forward(&mut self, n: usize) {
        for _ in 0..n {
            if !self.ensure_enough_data(0) {
                return;
            }
            let c = self.buffer[self.pointer];
            self.pointer += 1;
            self.index += 1;
            let crlf = c == '\r' && self.peek(0) == '\n';
            if matches!(c, '\n' | '\u{85}' | '\u{2028}' | '\u{2029}') || (c == '\r' && !crlf) {
                self.line += 1;
                self.column = 0;
            } else if c != '\u{FEFF}' {
                self.column += 1;
            }
        }
    }

    #[must_use]
    pub fn get_mark(&self) -> Marker {
        Marker::new(self.index, self.line, self.column)
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_and_forward() {
        let mut reader = StreamReader::from_str("ab\ncd");
        assert_eq!(reader.peek(0), 'a');
        assert_eq!(reader.peek(3), 'c');
        assert_eq!(reader.peek(10), '\0');
        reader.forward(3);
        assert_eq!(reader.get_mark(), Marker::new(3, 1, 0));
        assert_eq!(reader.prefix_forward(2), "cd");
        assert_eq!(reader.peek(0), '\0');
    }

    #[test]
    fn line_breaks_count_once() {
        let mut reader = StreamReader::from_str("a\r\nb\rc\u{2028}d");
        reader.forward(3);
        assert_eq!((reader.line(), reader.column()), (1, 0));
        reader.forward(2);
        assert_eq!((reader.line(), reader.column()), (2, 0));
        reader.forward(2);
        assert_eq!((reader.line(), reader.column()), (3, 0));
    }

    #[test]
    fn bom_does_not_move_column() {
        let mut reader = StreamReader::from_str("\u{FEFF}a");
        reader.forward(1);
        assert_eq!(reader.column(), 0);
        assert_eq!(reader.index(), 1);
    }

    #[test]
    fn non_printable_is_reported() {
        let mut reader = StreamReader::from_str("ok\u{1}rest");
        assert_eq!(reader.peek(0), 'o');
        assert_eq!(reader.peek(2), '\0');
        match reader.error() {
            Some(YamlError::Reader { position, code, .. }) => {
                assert_eq!(*position, 2);
                assert_eq!(*code, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn long_input_refills() {
        let input = "x".repeat(3000);
        let mut reader = StreamReader::from_str(&input);
        assert_eq!(reader.peek(2500), 'x');
        reader.forward(2999);
        assert_eq!(reader.prefix(5), "x");
        assert_eq!(reader.column(), 2999);
    }
}
