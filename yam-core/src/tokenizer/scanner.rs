use crate::tokenizer::char_utils::{
    escape_char, escape_code_len, is_alpha, is_blank, is_blank_or_breakz, is_blankz_no_tab,
    is_break, is_breakz, is_anchor_char, is_uri_char, unescape_char,
};
use crate::tokenizer::reader::StreamReader;
use std::collections::{BTreeMap, VecDeque};
use std::str::Chars;
use tracing::trace;
use yam_common::{
    CommentType, Marker, ScalarType, ScanResult, Tag, Token, TokenKind, TokenType, YamlError,
    YamlResult,
};

/// Default number of code points a simple key may span before its `:`.
pub const DEFAULT_SIMPLE_KEY_WINDOW: usize = 1024;

/// A place in the token queue where a `Key` token may have to be inserted
/// once the matching `:` shows up.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SimpleKey {
    token_number: usize,
    required: bool,
    index: usize,
    line: usize,
    column: usize,
    mark: Marker,
}

/// Trailing line break policy of a block scalar header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct BlockHeader {
    /// `Some(true)` for `+`, `Some(false)` for `-`.
    chomping: Option<bool>,
    increment: Option<usize>,
}

fn describe_char(c: char) -> String {
    format!("{c}({})", u32::from(c))
}

pub struct Scanner<I> {
    reader: StreamReader<I>,
    done: bool,
    failed: bool,
    flow_level: usize,
    tokens: VecDeque<Token>,
    tokens_taken: usize,
    indent: isize,
    indents: Vec<isize>,
    allow_simple_key: bool,
    /// At most one candidate per flow level.
    possible_simple_keys: BTreeMap<usize, SimpleKey>,
    /// Candidates that outgrew the window on their own line. A `:` reaching
    /// one of them is an error.
    expired_simple_keys: BTreeMap<usize, SimpleKey>,
    emit_comments: bool,
    simple_key_window: usize,
}

impl<'a> Scanner<Chars<'a>> {
    #[must_use]
    pub fn new_from_str(input: &'a str) -> Scanner<Chars<'a>> {
        Scanner::new(StreamReader::from_str(input))
    }
}

impl<I: Iterator<Item = char>> Scanner<I> {
    pub fn new(reader: StreamReader<I>) -> Scanner<I> {
        let mut scanner = Scanner {
            reader,
            done: false,
            failed: false,
            flow_level: 0,
            tokens: VecDeque::with_capacity(100),
            tokens_taken: 0,
            indent: -1,
            indents: Vec::with_capacity(10),
            allow_simple_key: true,
            possible_simple_keys: BTreeMap::new(),
            expired_simple_keys: BTreeMap::new(),
            emit_comments: false,
            simple_key_window: DEFAULT_SIMPLE_KEY_WINDOW,
        };
        scanner.fetch_stream_start();
        scanner
    }

    /// Produce `Comment` tokens for comments and blank lines.
    pub fn emit_comments(&mut self, emit_comments: bool) -> &mut Self {
        self.emit_comments = emit_comments;
        self
    }

    /// How many code points a simple key may span before the `:` that confirms it.
    pub fn simple_key_window(&mut self, window: usize) -> &mut Self {
        self.simple_key_window = window;
        self
    }

    #[must_use]
    pub fn is_emit_comments(&self) -> bool {
        self.emit_comments
    }

    fn prepare(&mut self) -> ScanResult {
        if self.failed {
            return Err(YamlError::new_str(
                self.reader.get_mark(),
                "scanner stopped after a previous error",
            ));
        }
        let res = self.fetch_until_decidable();
        if res.is_err() {
            self.failed = true;
        }
        res
    }

    fn fetch_until_decidable(&mut self) -> ScanResult {
        while self.need_more_tokens()? {
            self.fetch_more_tokens()?;
            if let Some(err) = self.reader.error() {
                return Err(err.clone());
            }
        }
        Ok(())
    }

    /// Checks whether the next token is one of `choices`. An empty slice asks whether
    /// any token is left at all.
    pub fn check_token(&mut self, choices: &[TokenKind]) -> YamlResult<bool> {
        self.prepare()?;
        Ok(match self.tokens.front() {
            Some(tok) => choices.is_empty() || choices.contains(&tok.kind()),
            None => false,
        })
    }

    pub fn peek_token(&mut self) -> YamlResult<&Token> {
        self.prepare()?;
        let mark = self.reader.get_mark();
        self.tokens
            .front()
            .ok_or_else(|| YamlError::new_str(mark, "no more tokens are available"))
    }

    pub fn get_token(&mut self) -> YamlResult<Token> {
        self.prepare()?;
        let mark = self.reader.get_mark();
        let tok = self
            .tokens
            .pop_front()
            .ok_or_else(|| YamlError::new_str(mark, "no more tokens are available"))?;
        self.tokens_taken += 1;
        trace!(kind = %tok.kind(), "token");
        Ok(tok)
    }

    fn need_more_tokens(&mut self) -> YamlResult<bool> {
        if self.done {
            return Ok(false);
        }
        if self.tokens.is_empty() {
            return Ok(true);
        }
        self.stale_possible_simple_keys()?;
        Ok(self.next_possible_simple_key() == Some(self.tokens_taken))
    }

    fn fetch_more_tokens(&mut self) -> ScanResult {
        self.scan_to_next_token();
        self.stale_possible_simple_keys()?;
        self.unwind_indent(self.reader.column() as isize);

        let c = self.reader.peek(0);
        match c {
            '\0' => return self.fetch_stream_end(),
            '!' => return self.fetch_tag(),
            '"' => return self.fetch_flow_scalar(ScalarType::DoubleQuote),
            '%' if self.check_directive() => return self.fetch_directive(),
            '&' => return self.fetch_anchor(true),
            '\'' => return self.fetch_flow_scalar(ScalarType::SingleQuote),
            '*' => return self.fetch_anchor(false),
            ',' => return self.fetch_flow_entry(),
            '-' if self.check_document_indicator('-') => {
                return self.fetch_document_indicator(TokenType::DocumentStart)
            }
            '-' if is_blank_or_breakz(self.reader.peek(1)) => return self.fetch_block_entry(),
            '.' if self.check_document_indicator('.') => {
                return self.fetch_document_indicator(TokenType::DocumentEnd)
            }
            ':' if self.check_key_or_value() => return self.fetch_value(),
            '>' if self.flow_level == 0 => return self.fetch_block_scalar(ScalarType::Folded),
            '?' if self.check_key_or_value() => return self.fetch_key(),
            '[' => return self.fetch_flow_collection_start(TokenType::FlowSequenceStart),
            ']' => return self.fetch_flow_collection_end(TokenType::FlowSequenceEnd),
            '{' => return self.fetch_flow_collection_start(TokenType::FlowMappingStart),
            '|' if self.flow_level == 0 => return self.fetch_block_scalar(ScalarType::Literal),
            '}' => return self.fetch_flow_collection_end(TokenType::FlowMappingEnd),
            _ => {}
        }

        if self.check_plain() {
            return self.fetch_plain();
        }

        let mut repr = match escape_char(c) {
            Some(letter) => format!("\\{letter}"),
            None => c.to_string(),
        };
        if c == '\t' {
            repr.push_str("(TAB)");
        }
        Err(YamlError::Scanner(yam_common::MarkedError::new(
            Some("while scanning for the next token"),
            None,
            format!(
                "found character '{repr}' that cannot start any token. (Do not use {repr} for indentation)"
            ),
            Some(self.reader.get_mark()),
        )))
    }

    fn next_possible_simple_key(&self) -> Option<usize> {
        self.possible_simple_keys
            .values()
            .map(|key| key.token_number)
            .min()
    }

    /// Drops candidates that can no longer become keys: the line changed or the key
    /// grew past the window. Dropping a required candidate is an error, a candidate
    /// dropped for its length is remembered until the line ends.
    fn stale_possible_simple_keys(&mut self) -> ScanResult {
        let line = self.reader.line();
        let index = self.reader.index();
        let window = self.simple_key_window;
        let mut stale = Vec::new();
        for (level, key) in &self.possible_simple_keys {
            let too_long = index - key.index > window;
            if key.line != line || too_long {
                if key.required {
                    return Err(YamlError::scanner(
                        "while scanning a simple key",
                        key.mark,
                        "could not find expected ':'",
                        self.reader.get_mark(),
                    ));
                }
                stale.push((*level, key.line == line && too_long));
            }
        }
        for (level, expired) in stale {
            if let Some(key) = self.possible_simple_keys.remove(&level) {
                if expired {
                    trace!(level, "simple key outgrew the window");
                    self.expired_simple_keys.insert(level, key);
                }
            }
        }
        self.expired_simple_keys.retain(|_, key| key.line == line);
        Ok(())
    }

    /// A `:` on the line of a candidate that outgrew the window.
    fn check_expired_simple_key(&mut self) -> ScanResult {
        match self.expired_simple_keys.remove(&self.flow_level) {
            Some(key) if key.line == self.reader.line() => Err(YamlError::scanner(
                "while scanning a simple key",
                key.mark,
                "could not find expected ':'",
                self.reader.get_mark(),
            )),
            _ => Ok(()),
        }
    }

    fn save_possible_simple_key(&mut self) -> ScanResult {
        let column = self.reader.column();
        let required = self.flow_level == 0 && self.indent == column as isize;

        if !self.allow_simple_key && required {
            return Err(YamlError::new_str(
                self.reader.get_mark(),
                "A simple key is required only if it is the first token in the current line",
            ));
        }
        if self.allow_simple_key {
            self.remove_possible_simple_key()?;
            let key = SimpleKey {
                token_number: self.tokens_taken + self.tokens.len(),
                required,
                index: self.reader.index(),
                line: self.reader.line(),
                column,
                mark: self.reader.get_mark(),
            };
            self.possible_simple_keys.insert(self.flow_level, key);
        }
        Ok(())
    }

    fn remove_possible_simple_key(&mut self) -> ScanResult {
        self.expired_simple_keys.remove(&self.flow_level);
        match self.possible_simple_keys.remove(&self.flow_level) {
            Some(key) if key.required => Err(YamlError::scanner(
                "while scanning a simple key",
                key.mark,
                "could not find expected ':'",
                self.reader.get_mark(),
            )),
            _ => Ok(()),
        }
    }

    /// Closes every block collection indented deeper than `col`. Flow context ignores
    /// indentation entirely.
    fn unwind_indent(&mut self, col: isize) {
        if self.flow_level != 0 {
            return;
        }
        while self.indent > col {
            let mark = self.reader.get_mark();
            self.indent = self.indents.pop().unwrap_or(-1);
            self.tokens.push_back(Token::new(mark, mark, TokenType::BlockEnd));
        }
    }

    fn add_indent(&mut self, column: usize) -> bool {
        let column = column as isize;
        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;
            true
        } else {
            false
        }
    }

    fn fetch_stream_start(&mut self) {
        let mark = self.reader.get_mark();
        self.tokens
            .push_back(Token::new(mark, mark, TokenType::StreamStart));
    }

    fn fetch_stream_end(&mut self) -> ScanResult {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        self.possible_simple_keys.clear();
        self.expired_simple_keys.clear();
        let mark = self.reader.get_mark();
        self.tokens.push_back(Token::new(mark, mark, TokenType::StreamEnd));
        self.done = true;
        Ok(())
    }

    fn fetch_directive(&mut self) -> ScanResult {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let tokens = self.scan_directive()?;
        self.tokens.extend(tokens);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, token_type: TokenType) -> ScanResult {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let start = self.reader.get_mark();
        self.reader.forward(3);
        let end = self.reader.get_mark();
        self.tokens.push_back(Token::new(start, end, token_type));
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, token_type: TokenType) -> ScanResult {
        self.save_possible_simple_key()?;
        self.flow_level += 1;
        self.allow_simple_key = true;
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens.push_back(Token::new(start, end, token_type));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, token_type: TokenType) -> ScanResult {
        self.remove_possible_simple_key()?;
        self.flow_level = self.flow_level.saturating_sub(1);
        self.allow_simple_key = false;
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens.push_back(Token::new(start, end, token_type));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> ScanResult {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens
            .push_back(Token::new(start, end, TokenType::FlowEntry));
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> ScanResult {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(YamlError::new_str(
                    self.reader.get_mark(),
                    "sequence entries are not allowed here",
                ));
            }
            if self.add_indent(self.reader.column()) {
                let mark = self.reader.get_mark();
                self.tokens
                    .push_back(Token::new(mark, mark, TokenType::BlockSequenceStart));
            }
        }
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens
            .push_back(Token::new(start, end, TokenType::BlockEntry));
        Ok(())
    }

    fn fetch_key(&mut self) -> ScanResult {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(YamlError::new_str(
                    self.reader.get_mark(),
                    "mapping keys are not allowed here",
                ));
            }
            if self.add_indent(self.reader.column()) {
                let mark = self.reader.get_mark();
                self.tokens
                    .push_back(Token::new(mark, mark, TokenType::BlockMappingStart));
            }
        }
        self.allow_simple_key = self.flow_level == 0;
        self.remove_possible_simple_key()?;
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens.push_back(Token::new(start, end, TokenType::Key));
        Ok(())
    }

    fn fetch_value(&mut self) -> ScanResult {
        if let Some(key) = self.possible_simple_keys.remove(&self.flow_level) {
            // The candidate is confirmed: retroactively insert the key before it.
            let at = key.token_number - self.tokens_taken;
            self.tokens
                .insert(at, Token::new(key.mark, key.mark, TokenType::Key));
            if self.flow_level == 0 && self.add_indent(key.column) {
                self.tokens.insert(
                    at,
                    Token::new(key.mark, key.mark, TokenType::BlockMappingStart),
                );
            }
            self.allow_simple_key = false;
        } else {
            self.check_expired_simple_key()?;
            if self.flow_level == 0 && !self.allow_simple_key {
                return Err(YamlError::new_str(
                    self.reader.get_mark(),
                    "mapping values are not allowed here",
                ));
            }
            if self.flow_level == 0 && self.add_indent(self.reader.column()) {
                let mark = self.reader.get_mark();
                self.tokens
                    .push_back(Token::new(mark, mark, TokenType::BlockMappingStart));
            }
            self.allow_simple_key = self.flow_level == 0;
            self.remove_possible_simple_key()?;
        }
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let end = self.reader.get_mark();
        self.tokens.push_back(Token::new(start, end, TokenType::Value));
        Ok(())
    }

    fn fetch_anchor(&mut self, is_anchor: bool) -> ScanResult {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let tok = self.scan_anchor(is_anchor)?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn fetch_tag(&mut self) -> ScanResult {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let tok = self.scan_tag()?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, style: ScalarType) -> ScanResult {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let tokens = self.scan_block_scalar(style)?;
        self.tokens.extend(tokens);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, style: ScalarType) -> ScanResult {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let tok = self.scan_flow_scalar(style)?;
        self.tokens.push_back(tok);
        Ok(())
    }

    fn fetch_plain(&mut self) -> ScanResult {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let tok = self.scan_plain();
        self.tokens.push_back(tok);
        Ok(())
    }

    fn check_directive(&self) -> bool {
        self.reader.column() == 0
    }

    fn check_document_indicator(&mut self, indicator: char) -> bool {
        self.reader.column() == 0
            && self.reader.peek(0) == indicator
            && self.reader.peek(1) == indicator
            && self.reader.peek(2) == indicator
            && is_blank_or_breakz(self.reader.peek(3))
    }

    fn check_key_or_value(&mut self) -> bool {
        self.flow_level != 0 || is_blank_or_breakz(self.reader.peek(1))
    }

    fn check_plain(&mut self) -> bool {
        let c = self.reader.peek(0);
        let starts_plain = !is_blank_or_breakz(c) && !"-?:,[]{}#&*!|>'\"%@`".contains(c);
        starts_plain
            || (!is_blank_or_breakz(self.reader.peek(1))
                && (c == '-' || (self.flow_level == 0 && (c == '?' || c == ':'))))
    }

    /// Skips spaces, comments and line breaks up to the next token. Tabs are not
    /// skipped here, they are reported by the dispatcher instead.
    fn scan_to_next_token(&mut self) {
        if self.reader.index() == 0 && self.reader.peek(0) == '\u{FEFF}' {
            self.reader.forward(1);
        }

        let mut inline_start_column: Option<usize> = None;
        loop {
            let start = self.reader.get_mark();
            let mut comment_seen = false;

            let mut ff = 0;
            while self.reader.peek(ff) == ' ' {
                ff += 1;
            }
            self.reader.forward(ff);

            if self.reader.peek(0) == '#' {
                comment_seen = true;
                let comment_type = if start.col != 0 {
                    inline_start_column = Some(self.reader.column());
                    CommentType::InLine
                } else if inline_start_column == Some(self.reader.column()) {
                    CommentType::InLine
                } else {
                    inline_start_column = None;
                    CommentType::Block
                };
                let tok = self.scan_comment(comment_type);
                if self.emit_comments {
                    self.tokens.push_back(tok);
                }
            }

            let line_break = self.scan_line_break();
            if line_break.is_empty() {
                return;
            }
            if self.emit_comments && !comment_seen && start.col == 0 {
                let end = self.reader.get_mark();
                self.tokens.push_back(Token::new(
                    start,
                    end,
                    TokenType::Comment {
                        comment_type: CommentType::BlankLine,
                        value: line_break,
                    },
                ));
            }
            if self.flow_level == 0 {
                self.allow_simple_key = true;
            }
        }
    }

    fn scan_comment(&mut self, comment_type: CommentType) -> Token {
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let mut length = 0;
        while !is_breakz(self.reader.peek(length)) {
            length += 1;
        }
        let value = self.reader.prefix_forward(length);
        let end = self.reader.get_mark();
        Token::new(
            start,
            end,
            TokenType::Comment {
                comment_type,
                value,
            },
        )
    }

    fn scan_directive(&mut self) -> YamlResult<Vec<Token>> {
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let name = self.scan_directive_name(start)?;
        let token_type = match name.as_str() {
            "YAML" => {
                let (major, minor) = self.scan_yaml_directive_value(start)?;
                TokenType::VersionDirective { major, minor }
            }
            "TAG" => {
                let (handle, prefix) = self.scan_tag_directive_value(start)?;
                TokenType::TagDirective { handle, prefix }
            }
            _ => {
                let mut length = 0;
                while !is_breakz(self.reader.peek(length)) {
                    length += 1;
                }
                let end = self.reader.get_mark();
                self.reader.forward(length);
                let comment = self.scan_directive_ignored_line(start)?;
                let mut tokens = vec![Token::new(start, end, TokenType::ReservedDirective(name))];
                tokens.extend(comment);
                return Ok(tokens);
            }
        };
        let end = self.reader.get_mark();
        let comment = self.scan_directive_ignored_line(start)?;
        let mut tokens = vec![Token::new(start, end, token_type)];
        tokens.extend(comment);
        Ok(tokens)
    }

    fn scan_directive_name(&mut self, start: Marker) -> YamlResult<String> {
        let mut length = 0;
        let mut c = self.reader.peek(length);
        while is_alpha(c) {
            length += 1;
            c = self.reader.peek(length);
        }
        if length == 0 {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!(
                    "expected alphabetic or numeric character, but found {}",
                    describe_char(c)
                ),
                self.reader.get_mark(),
            ));
        }
        let value = self.reader.prefix_forward(length);
        let c = self.reader.peek(0);
        if !is_blankz_no_tab(c) {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!(
                    "expected alphabetic or numeric character, but found {}",
                    describe_char(c)
                ),
                self.reader.get_mark(),
            ));
        }
        Ok(value)
    }

    fn scan_yaml_directive_value(&mut self, start: Marker) -> YamlResult<(u32, u32)> {
        while self.reader.peek(0) == ' ' {
            self.reader.forward(1);
        }
        let major = self.scan_yaml_directive_number(start)?;
        let c = self.reader.peek(0);
        if c != '.' {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!("expected a digit or '.', but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        self.reader.forward(1);
        let minor = self.scan_yaml_directive_number(start)?;
        let c = self.reader.peek(0);
        if !is_blankz_no_tab(c) {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!("expected a digit or ' ', but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        Ok((major, minor))
    }

    fn scan_yaml_directive_number(&mut self, start: Marker) -> YamlResult<u32> {
        let c = self.reader.peek(0);
        if !c.is_ascii_digit() {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!("expected a digit, but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        let mut length = 0;
        while self.reader.peek(length).is_ascii_digit() {
            length += 1;
        }
        let digits = self.reader.prefix_forward(length);
        digits.parse::<u32>().map_err(|_| {
            YamlError::scanner(
                "while scanning a directive",
                start,
                format!("version number {digits} is too large"),
                self.reader.get_mark(),
            )
        })
    }

    fn scan_tag_directive_value(&mut self, start: Marker) -> YamlResult<(String, String)> {
        while self.reader.peek(0) == ' ' {
            self.reader.forward(1);
        }
        let handle = self.scan_tag_handle("directive", start)?;
        let c = self.reader.peek(0);
        if c != ' ' {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!("expected ' ', but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        while self.reader.peek(0) == ' ' {
            self.reader.forward(1);
        }
        let prefix = self.scan_tag_uri("directive", start)?;
        let c = self.reader.peek(0);
        if !is_blankz_no_tab(c) {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!("expected ' ', but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        Ok((handle, prefix))
    }

    fn scan_directive_ignored_line(&mut self, start: Marker) -> YamlResult<Option<Token>> {
        while self.reader.peek(0) == ' ' {
            self.reader.forward(1);
        }
        let mut comment = None;
        if self.reader.peek(0) == '#' {
            let tok = self.scan_comment(CommentType::InLine);
            if self.emit_comments {
                comment = Some(tok);
            }
        }
        let c = self.reader.peek(0);
        if self.scan_line_break().is_empty() && c != '\0' {
            return Err(YamlError::scanner(
                "while scanning a directive",
                start,
                format!(
                    "expected a comment or a line break, but found {}",
                    describe_char(c)
                ),
                self.reader.get_mark(),
            ));
        }
        Ok(comment)
    }

    fn scan_anchor(&mut self, is_anchor: bool) -> YamlResult<Token> {
        let start = self.reader.get_mark();
        let context = if is_anchor {
            "while scanning an anchor"
        } else {
            "while scanning an alias"
        };
        self.reader.forward(1);
        let mut length = 0;
        let mut c = self.reader.peek(length);
        while is_anchor_char(c) {
            length += 1;
            c = self.reader.peek(length);
        }
        if length == 0 {
            return Err(YamlError::scanner(
                context,
                start,
                format!("unexpected character found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        let value = self.reader.prefix_forward(length);
        let c = self.reader.peek(0);
        if !is_blank_or_breakz(c) && !"?:,]}%@`".contains(c) {
            return Err(YamlError::scanner(
                context,
                start,
                format!("unexpected character found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        let end = self.reader.get_mark();
        let token_type = if is_anchor {
            TokenType::Anchor(value)
        } else {
            TokenType::Alias(value)
        };
        Ok(Token::new(start, end, token_type))
    }

    fn scan_tag(&mut self) -> YamlResult<Token> {
        let start = self.reader.get_mark();
        let mut c = self.reader.peek(1);
        let handle;
        let suffix;
        if c == '<' {
            self.reader.forward(2);
            suffix = self.scan_tag_uri("tag", start)?;
            let c = self.reader.peek(0);
            if c != '>' {
                return Err(YamlError::scanner(
                    "while scanning a tag",
                    start,
                    format!("expected '>', but found '{c}' ({})", u32::from(c)),
                    self.reader.get_mark(),
                ));
            }
            self.reader.forward(1);
            handle = String::new();
        } else if is_blank_or_breakz(c) {
            suffix = "!".to_string();
            handle = String::new();
            self.reader.forward(1);
        } else {
            let mut length = 1;
            let mut use_handle = false;
            while !is_blankz_no_tab(c) {
                if c == '!' {
                    use_handle = true;
                    break;
                }
                length += 1;
                c = self.reader.peek(length);
            }
            if use_handle {
                handle = self.scan_tag_handle("tag", start)?;
            } else {
                handle = "!".to_string();
                self.reader.forward(1);
            }
            suffix = self.scan_tag_uri("tag", start)?;
        }

        let c = self.reader.peek(0);
        if !is_blankz_no_tab(c) && !(self.flow_level > 0 && ",]}".contains(c)) {
            return Err(YamlError::scanner(
                "while scanning a tag",
                start,
                format!("expected ' ', but found '{c}' ({})", u32::from(c)),
                self.reader.get_mark(),
            ));
        }
        let end = self.reader.get_mark();
        Ok(Token::new(start, end, TokenType::Tag(Tag { handle, suffix })))
    }

    fn scan_tag_handle(&mut self, name: &str, start: Marker) -> YamlResult<String> {
        let context = format!("while scanning a {name}");
        let c = self.reader.peek(0);
        if c != '!' {
            return Err(YamlError::scanner(
                &context,
                start,
                format!("expected '!', but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        let mut length = 1;
        let mut c = self.reader.peek(length);
        if c != ' ' {
            while is_alpha(c) {
                length += 1;
                c = self.reader.peek(length);
            }
            if c != '!' {
                self.reader.forward(length);
                return Err(YamlError::scanner(
                    &context,
                    start,
                    format!("expected '!', but found {}", describe_char(c)),
                    self.reader.get_mark(),
                ));
            }
            length += 1;
        }
        Ok(self.reader.prefix_forward(length))
    }

    fn scan_tag_uri(&mut self, name: &str, start: Marker) -> YamlResult<String> {
        let mut chunks = String::new();
        let mut length = 0;
        let mut c = self.reader.peek(length);
        while is_uri_char(c) && !(self.flow_level > 0 && ",[]{}".contains(c)) {
            if c == '%' {
                chunks.push_str(&self.reader.prefix_forward(length));
                length = 0;
                chunks.push_str(&self.scan_uri_escapes(name, start)?);
            } else {
                length += 1;
            }
            c = self.reader.peek(length);
        }
        if length != 0 {
            chunks.push_str(&self.reader.prefix_forward(length));
        }
        if chunks.is_empty() {
            return Err(YamlError::scanner(
                &format!("while scanning a {name}"),
                start,
                format!("expected URI, but found {}", describe_char(c)),
                self.reader.get_mark(),
            ));
        }
        Ok(chunks)
    }

    /// Decodes a run of `%XX` escapes as UTF-8.
    fn scan_uri_escapes(&mut self, name: &str, start: Marker) -> YamlResult<String> {
        let context = format!("while scanning a {name}");
        let beginning = self.reader.get_mark();
        let mut raw = String::new();
        while self.reader.peek(0) == '%' {
            self.reader.forward(1);
            let (c1, c2) = (self.reader.peek(0), self.reader.peek(1));
            if !c1.is_ascii_hexdigit() || !c2.is_ascii_hexdigit() {
                return Err(YamlError::scanner(
                    &context,
                    start,
                    format!(
                        "expected URI escape sequence of 2 hexadecimal numbers, but found {} and {}",
                        describe_char(c1),
                        describe_char(c2)
                    ),
                    self.reader.get_mark(),
                ));
            }
            raw.push('%');
            raw.push_str(&self.reader.prefix_forward(2));
        }
        urlencoding::decode(&raw)
            .map(|decoded| decoded.into_owned())
            .map_err(|err| {
                YamlError::scanner(
                    &context,
                    start,
                    format!("expected URI in UTF-8: {err}"),
                    beginning,
                )
            })
    }

    fn scan_block_scalar(&mut self, style: ScalarType) -> YamlResult<Vec<Token>> {
        let folded = style == ScalarType::Folded;
        let mut chunks = String::new();
        let start = self.reader.get_mark();
        self.reader.forward(1);
        let header = self.scan_block_scalar_indicators(start)?;
        let leading_comment = self.scan_block_scalar_ignored_line(start)?;

        let min_indent = usize::try_from(self.indent + 1).unwrap_or(0).max(1);
        let mut breaks;
        let indent;
        let mut end;
        match header.increment {
            None => {
                let (found_breaks, max_indent, found_end) = self.scan_block_scalar_indentation();
                breaks = found_breaks;
                end = found_end;
                indent = min_indent.max(max_indent);
            }
            Some(increment) => {
                indent = min_indent + increment - 1;
                let (found_breaks, found_end) = self.scan_block_scalar_breaks(indent);
                breaks = found_breaks;
                end = found_end;
            }
        }

        let mut line_break = String::new();
        while self.reader.column() == indent && self.reader.peek(0) != '\0' {
            chunks.push_str(&breaks);
            let leading_non_space = !is_blank(self.reader.peek(0));
            let mut length = 0;
            while !is_breakz(self.reader.peek(length)) {
                length += 1;
            }
            chunks.push_str(&self.reader.prefix_forward(length));
            line_break = self.scan_line_break();
            let (found_breaks, found_end) = self.scan_block_scalar_breaks(indent);
            breaks = found_breaks;
            end = found_end;
            if self.reader.column() != indent || self.reader.peek(0) == '\0' {
                break;
            }
            // A single break between two non-indented lines folds into a space.
            if folded && line_break == "\n" && leading_non_space && !is_blank(self.reader.peek(0))
            {
                if breaks.is_empty() {
                    chunks.push(' ');
                }
            } else {
                chunks.push_str(&line_break);
            }
        }

        if header.chomping != Some(false) {
            chunks.push_str(&line_break);
        }
        let mut trailing_comment = None;
        if header.chomping == Some(true) {
            if self.emit_comments {
                trailing_comment = Some(Token::new(
                    start,
                    end,
                    TokenType::Comment {
                        comment_type: CommentType::BlankLine,
                        value: breaks.clone(),
                    },
                ));
            }
            chunks.push_str(&breaks);
        }

        let mut tokens = Vec::with_capacity(3);
        tokens.extend(leading_comment);
        tokens.push(Token::new(
            start,
            end,
            TokenType::Scalar {
                scalar_type: style,
                value: chunks,
            },
        ));
        tokens.extend(trailing_comment);
        Ok(tokens)
    }

    fn scan_block_scalar_indicators(&mut self, start: Marker) -> YamlResult<BlockHeader> {
        let mut chomping = None;
        let mut increment = None;
        let mut c = self.reader.peek(0);
        if c == '-' || c == '+' {
            chomping = Some(c == '+');
            self.reader.forward(1);
            c = self.reader.peek(0);
            if let Some(digit) = c.to_digit(10) {
                increment = Some(self.check_increment(digit, start)?);
                self.reader.forward(1);
            }
        } else if let Some(digit) = c.to_digit(10) {
            increment = Some(self.check_increment(digit, start)?);
            self.reader.forward(1);
            c = self.reader.peek(0);
            if c == '-' || c == '+' {
                chomping = Some(c == '+');
                self.reader.forward(1);
            }
        }
        let c = self.reader.peek(0);
        if !is_blankz_no_tab(c) {
            return Err(YamlError::scanner(
                "while scanning a block scalar",
                start,
                format!(
                    "expected chomping or indentation indicators, but found {}",
                    describe_char(c)
                ),
                self.reader.get_mark(),
            ));
        }
        Ok(BlockHeader {
            chomping,
            increment,
        })
    }

    fn check_increment(&self, digit: u32, start: Marker) -> YamlResult<usize> {
        if digit == 0 {
            return Err(YamlError::scanner(
                "while scanning a block scalar",
                start,
                "expected indentation indicator in the range 1-9, but found 0",
                self.reader.get_mark(),
            ));
        }
        Ok(digit as usize)
    }

    fn scan_block_scalar_ignored_line(&mut self, start: Marker) -> YamlResult<Option<Token>> {
        while self.reader.peek(0) == ' ' {
            self.reader.forward(1);
        }
        let mut comment = None;
        if self.reader.peek(0) == '#' {
            let tok = self.scan_comment(CommentType::InLine);
            if self.emit_comments {
                comment = Some(tok);
            }
        }
        let c = self.reader.peek(0);
        if self.scan_line_break().is_empty() && c != '\0' {
            return Err(YamlError::scanner(
                "while scanning a block scalar",
                start,
                format!(
                    "expected a comment or a line break, but found {}",
                    describe_char(c)
                ),
                self.reader.get_mark(),
            ));
        }
        Ok(comment)
    }

    /// Collects leading empty lines and finds the deepest indentation among them.
    fn scan_block_scalar_indentation(&mut self) -> (String, usize, Marker) {
        let mut chunks = String::new();
        let mut max_indent = 0;
        let mut end = self.reader.get_mark();
        loop {
            let c = self.reader.peek(0);
            if c == ' ' {
                self.reader.forward(1);
                max_indent = max_indent.max(self.reader.column());
            } else if is_break(c) {
                chunks.push_str(&self.scan_line_break());
                end = self.reader.get_mark();
            } else {
                break;
            }
        }
        (chunks, max_indent, end)
    }

    fn scan_block_scalar_breaks(&mut self, indent: usize) -> (String, Marker) {
        let mut chunks = String::new();
        let mut end = self.reader.get_mark();
        let mut col = self.reader.column();
        while col < indent && self.reader.peek(0) == ' ' {
            self.reader.forward(1);
            col += 1;
        }
        loop {
            let line_break = self.scan_line_break();
            if line_break.is_empty() {
                break;
            }
            chunks.push_str(&line_break);
            end = self.reader.get_mark();
            let mut col = self.reader.column();
            while col < indent && self.reader.peek(0) == ' ' {
                self.reader.forward(1);
                col += 1;
            }
        }
        (chunks, end)
    }

    fn scan_flow_scalar(&mut self, style: ScalarType) -> YamlResult<Token> {
        let double = style == ScalarType::DoubleQuote;
        let mut chunks = String::new();
        let start = self.reader.get_mark();
        let quote = self.reader.peek(0);
        self.reader.forward(1);
        self.scan_flow_scalar_non_spaces(double, start, &mut chunks)?;
        while self.reader.peek(0) != quote {
            self.scan_flow_scalar_spaces(start, &mut chunks)?;
            self.scan_flow_scalar_non_spaces(double, start, &mut chunks)?;
        }
        self.reader.forward(1);
        let end = self.reader.get_mark();
        Ok(Token::new(
            start,
            end,
            TokenType::Scalar {
                scalar_type: style,
                value: chunks,
            },
        ))
    }

    fn scan_flow_scalar_non_spaces(
        &mut self,
        double: bool,
        start: Marker,
        chunks: &mut String,
    ) -> ScanResult {
        loop {
            let mut length = 0;
            loop {
                let c = self.reader.peek(length);
                if is_blank_or_breakz(c) || "'\"\\".contains(c) {
                    break;
                }
                length += 1;
            }
            if length != 0 {
                chunks.push_str(&self.reader.prefix_forward(length));
            }

            let c = self.reader.peek(0);
            if !double && c == '\'' && self.reader.peek(1) == '\'' {
                chunks.push('\'');
                self.reader.forward(2);
            } else if (double && c == '\'') || (!double && (c == '"' || c == '\\')) {
                chunks.push(c);
                self.reader.forward(1);
            } else if double && c == '\\' {
                self.reader.forward(1);
                let c = self.reader.peek(0);
                if let Some(replacement) = unescape_char(c) {
                    chunks.push(replacement);
                    self.reader.forward(1);
                } else if let Some(length) = escape_code_len(c) {
                    self.reader.forward(1);
                    let hex = self.reader.prefix(length);
                    let decoded = if hex.chars().count() == length
                        && hex.chars().all(|x| x.is_ascii_hexdigit())
                    {
                        u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                    } else {
                        None
                    };
                    match decoded {
                        Some(ch) => chunks.push(ch),
                        None => {
                            return Err(YamlError::scanner(
                                "while scanning a double-quoted scalar",
                                start,
                                format!(
                                    "expected escape sequence of {length} hexadecimal numbers, but found: {hex}"
                                ),
                                self.reader.get_mark(),
                            ))
                        }
                    }
                    self.reader.forward(length);
                } else if !self.scan_line_break().is_empty() {
                    self.scan_flow_scalar_breaks(start, chunks)?;
                } else {
                    return Err(YamlError::scanner(
                        "while scanning a double-quoted scalar",
                        start,
                        format!("found unknown escape character {}", describe_char(c)),
                        self.reader.get_mark(),
                    ));
                }
            } else {
                return Ok(());
            }
        }
    }

    fn scan_flow_scalar_spaces(&mut self, start: Marker, chunks: &mut String) -> ScanResult {
        let mut length = 0;
        while is_blank(self.reader.peek(length)) {
            length += 1;
        }
        let whitespaces = self.reader.prefix_forward(length);
        if self.reader.peek(0) == '\0' {
            return Err(YamlError::scanner(
                "while scanning a quoted scalar",
                start,
                "found unexpected end of stream",
                self.reader.get_mark(),
            ));
        }
        let line_break = self.scan_line_break();
        if line_break.is_empty() {
            chunks.push_str(&whitespaces);
            return Ok(());
        }
        let mut breaks = String::new();
        self.scan_flow_scalar_breaks(start, &mut breaks)?;
        if line_break != "\n" {
            chunks.push_str(&line_break);
        } else if breaks.is_empty() {
            chunks.push(' ');
        }
        chunks.push_str(&breaks);
        Ok(())
    }

    fn scan_flow_scalar_breaks(&mut self, start: Marker, chunks: &mut String) -> ScanResult {
        loop {
            if self.at_document_separator() {
                return Err(YamlError::scanner(
                    "while scanning a quoted scalar",
                    start,
                    "found unexpected document separator",
                    self.reader.get_mark(),
                ));
            }
            while is_blank(self.reader.peek(0)) {
                self.reader.forward(1);
            }
            let line_break = self.scan_line_break();
            if line_break.is_empty() {
                return Ok(());
            }
            chunks.push_str(&line_break);
        }
    }

    fn at_document_separator(&mut self) -> bool {
        let prefix = self.reader.prefix(3);
        (prefix == "---" || prefix == "...") && is_blank_or_breakz(self.reader.peek(3))
    }

    fn scan_plain(&mut self) -> Token {
        let mut chunks = String::new();
        let start = self.reader.get_mark();
        let mut end = start;
        let indent = self.indent + 1;
        let mut spaces = String::new();

        loop {
            if self.reader.peek(0) == '#' {
                break;
            }
            let mut length = 0;
            loop {
                let c = self.reader.peek(length);
                let next = self.reader.peek(length + 1);
                let ends_with_value = c == ':'
                    && (is_blank_or_breakz(next)
                        || (self.flow_level != 0 && ",[]{}".contains(next)));
                if is_blank_or_breakz(c)
                    || ends_with_value
                    || (self.flow_level != 0 && ",?[]{}".contains(c))
                {
                    break;
                }
                length += 1;
            }
            if length == 0 {
                break;
            }
            self.allow_simple_key = false;
            chunks.push_str(&spaces);
            chunks.push_str(&self.reader.prefix_forward(length));
            end = self.reader.get_mark();
            spaces = self.scan_plain_spaces();
            if spaces.is_empty()
                || self.reader.peek(0) == '#'
                || (self.flow_level == 0 && (self.reader.column() as isize) < indent)
            {
                break;
            }
        }
        Token::new(
            start,
            end,
            TokenType::Scalar {
                scalar_type: ScalarType::Plain,
                value: chunks,
            },
        )
    }

    /// Whitespace between two chunks of a plain scalar, already folded.
    fn scan_plain_spaces(&mut self) -> String {
        let mut length = 0;
        while is_blank(self.reader.peek(length)) {
            length += 1;
        }
        let whitespaces = self.reader.prefix_forward(length);
        let line_break = self.scan_line_break();
        if line_break.is_empty() {
            return whitespaces;
        }
        self.allow_simple_key = true;
        if self.reader.prefix(3) == "---" || self.at_document_separator() {
            return String::new();
        }
        let mut breaks = String::new();
        loop {
            while self.reader.peek(0) == ' ' {
                self.reader.forward(1);
            }
            let next_break = self.scan_line_break();
            if next_break.is_empty() {
                break;
            }
            breaks.push_str(&next_break);
            if self.reader.prefix(3) == "---" || self.at_document_separator() {
                return String::new();
            }
        }
        if line_break != "\n" {
            line_break + &breaks
        } else if breaks.is_empty() {
            " ".to_string()
        } else {
            breaks
        }
    }

    /// Consumes one line break and returns its normalized form: `\r\n`, `\r` and NEL
    /// become `\n`, LS and PS are kept as they are.
    fn scan_line_break(&mut self) -> String {
        let c = self.reader.peek(0);
        match c {
            '\r' | '\n' | '\u{85}' => {
                if c == '\r' && self.reader.peek(1) == '\n' {
                    self.reader.forward(2);
                } else {
                    self.reader.forward(1);
                }
                "\n".to_string()
            }
            '\u{2028}' | '\u{2029}' => {
                self.reader.forward(1);
                c.to_string()
            }
            _ => String::new(),
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Scanner<I> {
    type Item = YamlResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.check_token(&[]) {
            Ok(true) => Some(self.get_token()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::TokenKind::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Scanner::new_from_str(input)
            .map(|tok| tok.expect("token").kind())
            .collect()
    }

    fn scalars(input: &str) -> Vec<String> {
        Scanner::new_from_str(input)
            .filter_map(|tok| match tok.expect("token").token_type {
                TokenType::Scalar { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }

    fn scan_err(input: &str) -> YamlError {
        Scanner::new_from_str(input)
            .find_map(Result::err)
            .expect("scanner error")
    }

    #[test]
    fn block_mapping_key_is_inserted_retroactively() {
        assert_eq!(
            kinds("a: 1\nb: 2"),
            vec![
                StreamStart,
                BlockMappingStart,
                Key,
                Scalar,
                Value,
                Scalar,
                Key,
                Scalar,
                Value,
                Scalar,
                BlockEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn indentless_sequence_has_no_extra_start() {
        assert_eq!(
            kinds("key:\n- a\n- b\n"),
            vec![
                StreamStart,
                BlockMappingStart,
                Key,
                Scalar,
                Value,
                BlockEntry,
                Scalar,
                BlockEntry,
                Scalar,
                BlockEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn flow_collections() {
        assert_eq!(
            kinds("{a: [b, c]}"),
            vec![
                StreamStart,
                FlowMappingStart,
                Key,
                Scalar,
                Value,
                FlowSequenceStart,
                Scalar,
                FlowEntry,
                Scalar,
                FlowSequenceEnd,
                FlowMappingEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn simple_key_window_is_enforced() {
        let long_key = "1".repeat(1025);
        let err = scan_err(&format!("{long_key}: b"));
        assert_eq!(err.problem(), "could not find expected ':'");
        assert!(err.to_string().starts_with("while scanning a simple key"));

        let err = scan_err(&format!("{{a: 1, {long_key}: b}}"));
        assert_eq!(err.problem(), "could not find expected ':'");

        let err = scan_err(&format!("[{long_key}: b]"));
        assert_eq!(err.problem(), "could not find expected ':'");
    }

    #[test]
    fn long_values_are_not_keys() {
        let long_value = "x".repeat(1500);
        let input = format!("a: {long_value}\nb: c\n");
        assert_eq!(scalars(&input), vec!["a", long_value.as_str(), "b", "c"]);

        let input = format!("? {long_value}\n: c\n");
        assert_eq!(scalars(&input), vec![long_value.as_str(), "c"]);

        let input = format!("{{a: [{long_value}, d], b: c}}");
        assert_eq!(scalars(&input), vec!["a", long_value.as_str(), "d", "b", "c"]);
    }

    #[test]
    fn required_simple_key_expires_across_lines() {
        let err = scan_err("a: 1\nb\n: 2\n");
        assert_eq!(err.problem(), "could not find expected ':'");
    }

    #[test]
    fn configurable_window() {
        let mut scanner = Scanner::new_from_str("abcdef: 1");
        scanner.simple_key_window(3);
        let err = scanner.find_map(Result::err).expect("error");
        assert_eq!(err.problem(), "could not find expected ':'");
    }

    #[test]
    fn plain_scalar_folding() {
        assert_eq!(scalars("a\n b\n\n c"), vec!["a b\nc"]);
        assert_eq!(scalars("a # comment"), vec!["a"]);
        assert_eq!(scalars("a#b"), vec!["a#b"]);
        assert_eq!(scalars("[a:b, c]"), vec!["a:b", "c"]);
    }

    #[test]
    fn quoted_scalars() {
        assert_eq!(scalars("'it''s'"), vec!["it's"]);
        assert_eq!(scalars(r#""a\tb\x41\u00e9\U0001F600""#), vec!["a\tbAé😀"]);
        assert_eq!(scalars("\"a\n  b\n\n  c\""), vec!["a b\nc"]);
        assert_eq!(scalars("\"a\\\n  b\""), vec!["ab"]);
    }

    #[test]
    fn quoted_scalar_errors() {
        assert_eq!(scan_err("\"abc").problem(), "found unexpected end of stream");
        assert!(scan_err(r#""\q""#)
            .problem()
            .starts_with("found unknown escape character q"));
        assert!(scan_err(r#""\x4""#)
            .problem()
            .starts_with("expected escape sequence of 2 hexadecimal numbers"));
        assert_eq!(
            scan_err("\"a\n--- b\"").problem(),
            "found unexpected document separator"
        );
    }

    #[test]
    fn block_scalars() {
        assert_eq!(scalars("|\n a\n b\n"), vec!["a\nb\n"]);
        assert_eq!(scalars(">\n a\n b\n\n c\n"), vec!["a b\nc\n"]);
        assert_eq!(scalars("|-\n a\n\n"), vec!["a"]);
        assert_eq!(scalars("|+\n a\n\n"), vec!["a\n\n"]);
        assert_eq!(scalars("|2\n   a\n"), vec![" a\n"]);
        assert_eq!(scalars(">\n a\n   indented\n b\n"), vec!["a\n  indented\nb\n"]);
    }

    #[test]
    fn block_scalar_header_errors() {
        assert_eq!(
            scan_err("|0\n a").problem(),
            "expected indentation indicator in the range 1-9, but found 0"
        );
        assert!(scan_err("|x\n a")
            .problem()
            .starts_with("expected chomping or indentation indicators"));
    }

    #[test]
    fn tags_and_anchors() {
        let tokens: Vec<TokenType> = Scanner::new_from_str("!!str &a b: *a")
            .map(|tok| tok.expect("token").token_type)
            .collect();
        assert!(tokens.contains(&TokenType::Tag(Tag {
            handle: "!!".into(),
            suffix: "str".into()
        })));
        assert!(tokens.contains(&TokenType::Anchor("a".into())));
        assert!(tokens.contains(&TokenType::Alias("a".into())));

        let verbatim: Vec<TokenType> = Scanner::new_from_str("!<tag:x%21y> v")
            .map(|tok| tok.expect("token").token_type)
            .collect();
        assert!(verbatim.contains(&TokenType::Tag(Tag {
            handle: String::new(),
            suffix: "tag:x!y".into()
        })));
    }

    #[test]
    fn directives() {
        let tokens: Vec<TokenType> =
            Scanner::new_from_str("%YAML 1.1\n%TAG !e! tag:example.com,2000:\n%FOO bar\n---\n")
                .map(|tok| tok.expect("token").token_type)
                .collect();
        assert_eq!(tokens[1], TokenType::VersionDirective { major: 1, minor: 1 });
        assert_eq!(
            tokens[2],
            TokenType::TagDirective {
                handle: "!e!".into(),
                prefix: "tag:example.com,2000:".into()
            }
        );
        assert_eq!(tokens[3], TokenType::ReservedDirective("FOO".into()));
        assert_eq!(tokens[4], TokenType::DocumentStart);
    }

    #[test]
    fn tab_cannot_start_token() {
        let err = scan_err("a:\n\tb");
        assert!(err
            .problem()
            .contains("found character '\\t(TAB)' that cannot start any token"));
    }

    #[test]
    fn comments_are_tokens_when_enabled() {
        let mut scanner = Scanner::new_from_str("# head\na: 1 # tail\n\nb: 2\n");
        scanner.emit_comments(true);
        let comments: Vec<(CommentType, String)> = scanner
            .filter_map(|tok| match tok.expect("token").token_type {
                TokenType::Comment {
                    comment_type,
                    value,
                } => Some((comment_type, value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            comments,
            vec![
                (CommentType::Block, " head".to_string()),
                (CommentType::InLine, " tail".to_string()),
                (CommentType::BlankLine, "\n".to_string()),
            ]
        );
    }

    #[test]
    fn non_printable_fails() {
        let err = scan_err("a: \u{7}");
        assert!(matches!(err, YamlError::Reader { code: 7, .. }));
    }
}
