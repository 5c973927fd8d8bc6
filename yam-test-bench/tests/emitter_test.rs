use yam_common::FlowStyle;
use yam_core::{EngineConfig, Value, Yaml};

fn dump(value: &Value) -> String {
    Yaml::new().dump(value).expect("dump")
}

fn dump_block(value: &Value) -> String {
    Yaml::new()
        .dump_as(value, None, FlowStyle::Block)
        .expect("dump")
}

#[test]
fn quotes_when_plain_would_change_meaning() {
    assert_eq!(dump(&Value::from("a: b")), "'a: b'\n");
    assert_eq!(dump(&Value::from("")), "''\n");
    assert_eq!(dump(&Value::from("true")), "'true'\n");
    assert_eq!(dump(&Value::from("123")), "'123'\n");
    assert_eq!(dump(&Value::from("plain text")), "plain text\n");
}

#[test]
fn scalars_keep_their_types() {
    assert_eq!(dump(&Value::Int(42)), "42\n");
    assert_eq!(dump(&Value::Bool(false)), "false\n");
    assert_eq!(dump(&Value::Null), "null\n");
}

#[test]
fn multiline_is_literal() {
    let value = Value::map([("k", "line1\nline2")]);
    assert_eq!(dump_block(&value), "k: |-\n  line1\n  line2\n");
}

#[test]
fn auto_flow_for_scalar_leaves() {
    let value = Value::map([("a", Value::seq(vec![1.into(), 2.into()]))]);
    assert_eq!(dump(&value), "a: [1, 2]\n");
}

#[test]
fn shared_nodes_get_anchors() {
    let shared = Value::seq(vec![1.into(), 2.into()]);
    let value = Value::map([("a", shared.clone()), ("b", shared)]);
    assert_eq!(dump(&value), "a: &id001 [1, 2]\nb: *id001\n");
}

#[test]
fn long_keys_are_explicit() {
    let key = "k".repeat(130);
    let value = Value::map([(key.as_str(), "v")]);
    assert_eq!(dump_block(&value), format!("? {key}\n: v\n"));
}

#[test]
fn simple_key_length_is_bounded() {
    let mut config = EngineConfig::default();
    assert!(config.dumper.set_max_simple_key_length(1025).is_err());
    config
        .dumper
        .set_max_simple_key_length(1024)
        .expect("upper bound");
    assert_eq!(config.dumper.max_simple_key_length(), 1024);
}

#[test]
fn document_markers() {
    let mut config = EngineConfig::default();
    config.dumper.explicit_start = true;
    config.dumper.explicit_end = true;
    let yaml = Yaml::with_config(config).expect("config");
    assert_eq!(yaml.dump(&Value::from("a")).expect("dump"), "--- a\n...\n");
}

#[test]
fn tag_directives() {
    let mut config = EngineConfig::default();
    config
        .dumper
        .tags
        .push(("!e!".to_string(), "tag:example.com,2000:".to_string()));
    let yaml = Yaml::with_config(config).expect("config");
    let text = yaml
        .dump_as(
            &Value::from("x"),
            Some("tag:example.com,2000:foo"),
            FlowStyle::Auto,
        )
        .expect("dump");
    assert_eq!(text, "%TAG !e! tag:example.com,2000:\n--- !e!foo 'x'\n");
}

#[test]
fn wider_indent() {
    let mut config = EngineConfig::default();
    config.dumper.set_indent(4).expect("indent");
    let yaml = Yaml::with_config(config).expect("config");
    let value = Value::map([("a", Value::map([("b", "c")]))]);
    let text = yaml
        .dump_as(&value, None, FlowStyle::Block)
        .expect("dump");
    assert_eq!(text, "a:\n    b: c\n");
}
