use yam_test_bench::assert_eq_event;
use yam_test_bench::consts::*;

#[test]
fn flow_seq() {
    assert_eq_event(FLOW_SEQ_INPUT, FLOW_SEQ_EVENTS);
    assert_eq_event(FLOW_SEQ_TRAILING_INPUT, FLOW_SEQ_EVENTS);
    assert_eq_event(FLOW_SEQ_MULTILINE_INPUT, FLOW_SEQ_EVENTS);
}

#[test]
fn flow_map() {
    assert_eq_event(FLOW_MAP_INPUT, FLOW_MAP_EVENTS);
    assert_eq_event(FLOW_KEY_ONLY_INPUT, FLOW_KEY_ONLY_EVENTS);
}

#[test]
fn flow_nested() {
    assert_eq_event(FLOW_PAIR_INPUT, FLOW_PAIR_EVENTS);
    assert_eq_event(FLOW_NESTED_INPUT, FLOW_NESTED_EVENTS);
    assert_eq_event(FLOW_EMPTY_INPUT, FLOW_EMPTY_EVENTS);
    assert_eq_event(FLOW_IN_BLOCK_INPUT, FLOW_IN_BLOCK_EVENTS);
}

#[test]
fn flow_err() {
    assert_eq_event(FLOW_UNCLOSED_INPUT, FLOW_UNCLOSED_EVENTS);
    assert_eq_event(FLOW_MAP_MISSING_COMMA_INPUT, FLOW_MAP_MISSING_COMMA_EVENTS);
    assert_eq_event(FLOW_EXTRA_END_INPUT, FLOW_EXTRA_END_EVENTS);
}
