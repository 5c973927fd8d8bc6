//! Implicit typing of untagged scalars.

use crate::treebuild::NodeKind;
use hashbrown::HashMap;
use regex::Regex;
use yam_common::{tags, YamlError, YamlResult};

pub const BOOL: &str =
    r"^(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$";
pub const FLOAT: &str = r"^([-+]?(\.[0-9]+|[0-9_]+(\.[0-9_]*)?)([eE][-+]?[0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$";
pub const INT: &str = r"^(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$";
pub const MERGE: &str = r"^(?:<<)$";
pub const NULL: &str = r"^(?:~|null|Null|NULL| )$";
pub const EMPTY: &str = r"^$";
pub const TIMESTAMP: &str = r"^(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]|[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?(?:[Tt]|[ \t]+)[0-9][0-9]?:[0-9][0-9]:[0-9][0-9](?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$";
pub const YAML: &str = r"^(?:!|&|\*)$";

#[derive(Clone, Debug)]
struct ImplicitResolver {
    tag: String,
    regex: Regex,
}

///
/// Picks a tag for scalars written without one.
///
/// Patterns are grouped by the first character they can match; the empty
/// scalar is looked up under `'\0'`. Patterns registered without a first
/// character are tried after the grouped ones.
#[derive(Clone, Debug)]
pub struct Resolver {
    by_first_char: HashMap<char, Vec<ImplicitResolver>>,
    any_first_char: Vec<ImplicitResolver>,
}

impl Default for Resolver {
    fn default() -> Self {
        let mut resolver = Resolver::empty();
        let builtin = [
            (tags::BOOL, BOOL, Some("yYnNtTfFoO")),
            (tags::INT, INT, Some("-+0123456789")),
            (tags::FLOAT, FLOAT, Some("-+0123456789.")),
            (tags::MERGE, MERGE, Some("<")),
            (tags::NULL, NULL, Some("~nN\0")),
            (tags::NULL, EMPTY, None),
            (tags::TIMESTAMP, TIMESTAMP, Some("0123456789")),
            (tags::YAML, YAML, Some("!&*")),
        ];
        for (tag, pattern, first) in builtin {
            // The built-in patterns are constant and known to compile.
            if let Ok(regex) = Regex::new(pattern) {
                resolver.insert(tag, regex, first);
            }
        }
        resolver
    }
}

impl Resolver {
    /// A resolver without any implicit patterns: every scalar is a string.
    #[must_use]
    pub fn empty() -> Self {
        Resolver {
            by_first_char: HashMap::new(),
            any_first_char: Vec::new(),
        }
    }

    /// Registers `pattern` for `tag`. `first` lists the characters a match can start
    /// with, `None` means any. A `'\0'` in `first` files the pattern under "any".
    pub fn add_implicit_resolver(
        &mut self,
        tag: &str,
        pattern: &str,
        first: Option<&str>,
    ) -> YamlResult<()> {
        let regex = Regex::new(pattern)
            .map_err(|err| YamlError::Config(format!("invalid resolver pattern: {err}")))?;
        self.insert(tag, regex, first);
        Ok(())
    }

    fn insert(&mut self, tag: &str, regex: Regex, first: Option<&str>) {
        let entry = ImplicitResolver {
            tag: tag.to_string(),
            regex,
        };
        match first {
            None => self.any_first_char.push(entry),
            Some(chars) => {
                for c in chars.chars() {
                    if c == '\0' {
                        self.any_first_char.push(entry.clone());
                    } else {
                        self.by_first_char.entry(c).or_default().push(entry.clone());
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn resolve(&self, kind: NodeKind, value: &str, implicit: bool) -> String {
        if kind == NodeKind::Scalar && implicit {
            let first = value.chars().next().unwrap_or('\0');
            let grouped = self.by_first_char.get(&first).into_iter().flatten();
            for resolver in grouped.chain(self.any_first_char.iter()) {
                if resolver.regex.is_match(value) {
                    return resolver.tag.clone();
                }
            }
        }
        match kind {
            NodeKind::Scalar => tags::STR.to_string(),
            NodeKind::Sequence => tags::SEQ.to_string(),
            NodeKind::Mapping => tags::MAP.to_string(),
        }
    }
}
