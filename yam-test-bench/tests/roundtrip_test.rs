use proptest::prelude::*;
use yam_common::FlowStyle;
use yam_core::{Value, Yaml};
use yam_test_bench::consts::MIXED_DOCUMENT;

fn round_trip(value: &Value, flow_style: FlowStyle) -> Value {
    let yaml = Yaml::new();
    let text = yaml.dump_as(value, None, flow_style).expect("dump");
    yaml.load(&text)
        .unwrap_or_else(|err| panic!("reload of {text:?} failed: {err}"))
}

proptest! {
    #[test]
    fn strings_survive(text in "[a-zA-Z0-9 ,:#'\"!&*?-]{0,40}") {
        let value = Value::from(text.as_str());
        prop_assert_eq!(round_trip(&value, FlowStyle::Auto), value);
    }

    #[test]
    fn ints_survive(n in -1_000_000_000_000i64..1_000_000_000_000i64) {
        let value = Value::Int(n);
        prop_assert_eq!(round_trip(&value, FlowStyle::Auto), value);
    }

    #[test]
    fn block_mappings_survive(entries in prop::collection::vec(("[a-z]{1,8}", any::<i32>()), 0..8)) {
        let value = Value::map(entries.iter().map(|(k, v)| (k.as_str(), *v)));
        prop_assert_eq!(round_trip(&value, FlowStyle::Block), value.clone());
        prop_assert_eq!(round_trip(&value, FlowStyle::Flow), value);
    }
}

#[test]
fn mixed_document_round_trip() {
    let yaml = Yaml::new();
    let value = yaml.load(MIXED_DOCUMENT).expect("load");
    for flow_style in [FlowStyle::Auto, FlowStyle::Block] {
        assert_eq!(round_trip(&value, flow_style), value);
    }
}

#[test]
fn nested_collections_round_trip() {
    let value = Value::map([
        ("list", Value::seq(vec!["a".into(), Value::map([("b", 1)])])),
        ("set", Value::set(["x", "y"])),
        ("omap", Value::omap([("one", 1), ("two", 2)])),
        ("empty", Value::seq(Vec::new())),
        ("text", "multi\nline\n".into()),
    ]);
    for flow_style in [FlowStyle::Auto, FlowStyle::Block] {
        assert_eq!(round_trip(&value, flow_style), value);
    }
}

#[test]
fn second_dump_is_identical() {
    let yaml = Yaml::new();
    let value = yaml.load(MIXED_DOCUMENT).expect("load");
    let first = yaml.dump(&value).expect("dump");
    let second = yaml
        .load(&first)
        .and_then(|reloaded| yaml.dump(&reloaded))
        .expect("redump");
    assert_eq!(first, second);
}

#[test]
fn shared_list_stays_shared() {
    let yaml = Yaml::new();
    let shared = Value::seq(vec![1.into()]);
    let text = yaml
        .dump(&Value::map([("a", shared.clone()), ("b", shared)]))
        .expect("dump");
    let value = yaml.load(&text).expect("load");
    let a = value.get("a").expect("a");
    let b = value.get("b").expect("b");
    assert!(a.same_identity(&b));
}
