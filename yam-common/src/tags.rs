//! Fully expanded tag names of the types the engine knows about.

pub const PREFIX: &str = "tag:yaml.org,2002:";

pub const YAML: &str = "tag:yaml.org,2002:yaml";
pub const MERGE: &str = "tag:yaml.org,2002:merge";
pub const SET: &str = "tag:yaml.org,2002:set";
pub const PAIRS: &str = "tag:yaml.org,2002:pairs";
pub const OMAP: &str = "tag:yaml.org,2002:omap";
pub const BINARY: &str = "tag:yaml.org,2002:binary";
pub const INT: &str = "tag:yaml.org,2002:int";
pub const FLOAT: &str = "tag:yaml.org,2002:float";
pub const TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
pub const BOOL: &str = "tag:yaml.org,2002:bool";
pub const NULL: &str = "tag:yaml.org,2002:null";
pub const STR: &str = "tag:yaml.org,2002:str";
pub const SEQ: &str = "tag:yaml.org,2002:seq";
pub const MAP: &str = "tag:yaml.org,2002:map";
/// Tag of the synthetic mapping that carries a comments-only document.
pub const COMMENT: &str = "tag:yaml.org,2002:comment";

/// Non-specific tag, `!`.
pub const NON_SPECIFIC: &str = "!";

/// Returns `true` for tags under `tag:yaml.org,2002:`.
#[must_use]
pub fn is_core(tag: &str) -> bool {
    tag.starts_with(PREFIX)
}

/// Returns the shorthand `!!name` for core tags, the tag itself otherwise.
#[must_use]
pub fn short_form(tag: &str) -> String {
    match tag.strip_prefix(PREFIX) {
        Some(suffix) => format!("!!{suffix}"),
        None => tag.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms() {
        assert_eq!(short_form(STR), "!!str");
        assert_eq!(short_form("!custom"), "!custom");
        assert!(is_core(OMAP));
        assert!(!is_core("tag:example.com,2000:app/foo"));
    }
}
