pub const BLOCK1_INPUT: &str = r"
- x
- y
";
pub const BLOCK2_INPUT: &str = r"
  - x
  - y
";
pub const BLOCK_EVENTS: &str = r"
+DOC
+SEQ
=VAL :x
=VAL :y
-SEQ
-DOC";

pub const SEQ_PLAIN_INPUT: &str = r"
- x - y
";
pub const SEQ_PLAIN_EVENTS: &str = r"
+DOC
+SEQ
=VAL :x - y
-SEQ
-DOC";

pub const BLOCK_MAP_INPUT: &str = r"
a: 1
b: 2
";
pub const BLOCK_MAP_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :1
=VAL :b
=VAL :2
-MAP
-DOC";

pub const BLOCK_NESTED_INPUT: &str = r"
a:
  - b
  - c
d:
  e: f
";
pub const BLOCK_NESTED_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
+SEQ
=VAL :b
=VAL :c
-SEQ
=VAL :d
+MAP
=VAL :e
=VAL :f
-MAP
-MAP
-DOC";

pub const INDENTLESS_SEQ_INPUT: &str = r"
a:
- b
- c
";
pub const INDENTLESS_SEQ_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
+SEQ
=VAL :b
=VAL :c
-SEQ
-MAP
-DOC";

pub const SEQ_OF_MAPS_INPUT: &str = r"
- a: 1
  b: 2
- c: 3
";
pub const SEQ_OF_MAPS_EVENTS: &str = r"
+DOC
+SEQ
+MAP
=VAL :a
=VAL :1
=VAL :b
=VAL :2
-MAP
+MAP
=VAL :c
=VAL :3
-MAP
-SEQ
-DOC";

pub const BLOCK_MULTI_INPUT: &str = r"
a: b
  c
";
pub const BLOCK_MULTI_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b c
-MAP
-DOC";

pub const EXPLICIT_KEY_INPUT: &str = r"
? a
: b
";
pub const EXPLICIT_KEY_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b
-MAP
-DOC";

pub const EMPTY_VALUES_INPUT: &str = r"
a:
b:
";
pub const EMPTY_VALUES_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :
=VAL :b
=VAL :
-MAP
-DOC";

pub const BLOCK_TAGGED_INPUT: &str = r"
- !!int 1
- !!str a
";
pub const BLOCK_TAGGED_EVENTS: &str = r"
+DOC
+SEQ
=VAL <tag:yaml.org,2002:int> :1
=VAL <tag:yaml.org,2002:str> :a
-SEQ
-DOC";

pub const ANCHOR_ALIAS_INPUT: &str = r"
a: &x 1
b: *x
";
pub const ANCHOR_ALIAS_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL &x :1
=VAL :b
=ALI *x
-MAP
-DOC";

pub const LITERAL_INPUT: &str = r"
a: |
  line1
  line2
";
pub const LITERAL_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL |line1\nline2\n
-MAP
-DOC";

pub const LITERAL_STRIP_INPUT: &str = r"
a: |-
  x
";
pub const LITERAL_STRIP_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL |x
-MAP
-DOC";

pub const LITERAL_KEEP_INPUT: &str = "a: |+\n  x\n\n";
pub const LITERAL_KEEP_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL |x\n\n
-MAP
-DOC";

pub const FOLDED_INPUT: &str = r"
a: >
  one
  two

  three
";
pub const FOLDED_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL >one two\nthree\n
-MAP
-DOC";

pub const COMMENTS_INPUT: &str = r"
# head
a: b # tail
";
pub const COMMENTS_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b
-MAP
-DOC";

pub const BLOCK_ERR_INPUT: &str = r"
  - x
 - y
";
pub const BLOCK_ERR_EVENTS: &str = r"
+DOC
+SEQ
=VAL :x
-SEQ
-DOC
ERR";

pub const WRONG_SEQ_INDENT_INPUT: &str = r"
a:
  - b
 - c
";
pub const WRONG_SEQ_INDENT_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
+SEQ
=VAL :b
-SEQ
ERR";

pub const NESTED_VALUE_ERR_INPUT: &str = r"
a: b: c
";
pub const NESTED_VALUE_ERR_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b
ERR";

pub const SEQ_THEN_MAP_ERR_INPUT: &str = r"
- a
b: c
";
pub const SEQ_THEN_MAP_ERR_EVENTS: &str = r"
+DOC
+SEQ
=VAL :a
ERR";

pub const FLOW_SEQ_INPUT: &str = "[a, b]";
pub const FLOW_SEQ_TRAILING_INPUT: &str = "[a, b, ]";
pub const FLOW_SEQ_MULTILINE_INPUT: &str = "[a,\n  b]";
pub const FLOW_SEQ_EVENTS: &str = r"
+DOC
+SEQ []
=VAL :a
=VAL :b
-SEQ
-DOC";

pub const FLOW_MAP_INPUT: &str = "{a: 1, b: 2}";
pub const FLOW_MAP_EVENTS: &str = r"
+DOC
+MAP {}
=VAL :a
=VAL :1
=VAL :b
=VAL :2
-MAP
-DOC";

pub const FLOW_PAIR_INPUT: &str = "[a: b, c]";
pub const FLOW_PAIR_EVENTS: &str = r"
+DOC
+SEQ []
+MAP {}
=VAL :a
=VAL :b
-MAP
=VAL :c
-SEQ
-DOC";

pub const FLOW_NESTED_INPUT: &str = "{a: [1, 2], b: {c: d}}";
pub const FLOW_NESTED_EVENTS: &str = r"
+DOC
+MAP {}
=VAL :a
+SEQ []
=VAL :1
=VAL :2
-SEQ
=VAL :b
+MAP {}
=VAL :c
=VAL :d
-MAP
-MAP
-DOC";

pub const FLOW_EMPTY_INPUT: &str = "- []\n- {}\n";
pub const FLOW_EMPTY_EVENTS: &str = r"
+DOC
+SEQ
+SEQ []
-SEQ
+MAP {}
-MAP
-SEQ
-DOC";

pub const FLOW_KEY_ONLY_INPUT: &str = "{a, b: c}";
pub const FLOW_KEY_ONLY_EVENTS: &str = r"
+DOC
+MAP {}
=VAL :a
=VAL :
=VAL :b
=VAL :c
-MAP
-DOC";

pub const FLOW_IN_BLOCK_INPUT: &str = r"
key: [a, b]
other: {c: d}
";
pub const FLOW_IN_BLOCK_EVENTS: &str = r"
+DOC
+MAP
=VAL :key
+SEQ []
=VAL :a
=VAL :b
-SEQ
=VAL :other
+MAP {}
=VAL :c
=VAL :d
-MAP
-MAP
-DOC";

pub const FLOW_UNCLOSED_INPUT: &str = "[a, b";
pub const FLOW_UNCLOSED_EVENTS: &str = r"
+DOC
+SEQ []
=VAL :a
=VAL :b
ERR";

pub const FLOW_MAP_MISSING_COMMA_INPUT: &str = "{a: b c: d";
pub const FLOW_MAP_MISSING_COMMA_EVENTS: &str = r"
+DOC
+MAP {}
=VAL :a
=VAL :b c
ERR";

pub const FLOW_EXTRA_END_INPUT: &str = "[a]]";
pub const FLOW_EXTRA_END_EVENTS: &str = r"
+DOC
+SEQ []
=VAL :a
-SEQ
-DOC
ERR";

pub const SINGLE_QUOTE_INPUT: &str = "'it''s'";
pub const SINGLE_QUOTE_EVENTS: &str = r"
+DOC
=VAL 'it's
-DOC";

pub const SINGLE_QUOTE_MULTILINE_INPUT: &str = "'multi\n  line'";
pub const SINGLE_QUOTE_MULTILINE_EVENTS: &str = r"
+DOC
=VAL 'multi line
-DOC";

pub const DOUBLE_QUOTE_ESCAPES_INPUT: &str = r#""a\tb\n""#;
pub const DOUBLE_QUOTE_ESCAPES_EVENTS: &str = r#"
+DOC
=VAL "a\tb\n
-DOC"#;

pub const DOUBLE_QUOTE_UNICODE_INPUT: &str = r#""☺ \x41""#;
pub const DOUBLE_QUOTE_UNICODE_EVENTS: &str = "
+DOC
=VAL \"\u{263A} A
-DOC";

pub const DOUBLE_QUOTE_FOLD_INPUT: &str = "\"fold\n\n  line\"";
pub const DOUBLE_QUOTE_FOLD_EVENTS: &str = r#"
+DOC
=VAL "fold\nline
-DOC"#;

pub const DOUBLE_QUOTE_ESCAPED_BREAK_INPUT: &str = "\"esc\\\n  aped\"";
pub const DOUBLE_QUOTE_ESCAPED_BREAK_EVENTS: &str = r#"
+DOC
=VAL "escaped
-DOC"#;

pub const QUOTED_KEYS_INPUT: &str = r#"
'a b': "c"
"#;
pub const QUOTED_KEYS_EVENTS: &str = r#"
+DOC
+MAP
=VAL 'a b
=VAL "c
-MAP
-DOC"#;

pub const SINGLE_QUOTE_ERR_INPUT: &str = "'unterminated";
pub const SINGLE_QUOTE_ERR_EVENTS: &str = r"
ERR";

pub const DOUBLE_QUOTE_ERR_INPUT: &str = r#""bad \q""#;
pub const DOUBLE_QUOTE_ERR_EVENTS: &str = r"
ERR";

pub const EXPLICIT_DOC_INPUT: &str = "--- a\n...\n";
pub const EXPLICIT_DOC_EVENTS: &str = r"
+DOC ---
=VAL :a
-DOC ...";

pub const TWO_DOCS_INPUT: &str = "a\n--- b\n";
pub const TWO_DOCS_EVENTS: &str = r"
+DOC
=VAL :a
-DOC
+DOC ---
=VAL :b
-DOC";

pub const VERSION_DOC_INPUT: &str = "%YAML 1.1\n--- a\n";
pub const VERSION_DOC_EVENTS: &str = r"
+DOC ---
=VAL :a
-DOC";

pub const EMPTY_DOC_INPUT: &str = "---\n";
pub const EMPTY_DOC_EVENTS: &str = r"
+DOC ---
=VAL :
-DOC";

pub const TAG_DIRECTIVE_INPUT: &str = "%TAG !e! tag:example.com,2000:\n--- !e!foo x\n";
pub const TAG_DIRECTIVE_EVENTS: &str = r"
+DOC ---
=VAL <tag:example.com,2000:foo> :x
-DOC";

pub const EMPTY_STREAM_INPUT: &str = "";
pub const COMMENT_ONLY_INPUT: &str = "# nothing here\n";
pub const EMPTY_STREAM_EVENTS: &str = "";

pub const BAD_VERSION_INPUT: &str = "%YAML 2.0\n--- a";
pub const BAD_VERSION_EVENTS: &str = r"
ERR";

pub const DIRECTIVE_WITHOUT_START_INPUT: &str = "%YAML 1.1\na";
pub const DIRECTIVE_WITHOUT_START_EVENTS: &str = r"
ERR";

/// A document touching most of the grammar, used by the benches and the
/// round-trip tests.
pub const MIXED_DOCUMENT: &str = r#"
name: engine
version: 1.2
enabled: yes
ports: [80, 443]
owner: &owner
  first: Ada
  last: Lovelace
maintainer: *owner
notes: |
  first line
  second line
summary: >
  folded
  text
quoted: 'single ''quoted'''
escaped: "tab\there"
empty:
list:
  - one
  - two: 2
    three: 3
  - [nested, flow]
"#;
