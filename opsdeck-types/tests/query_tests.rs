use opsdeck_types::{query_kinds, Fingerprint, ParamValue, Query, QueryParams};
use proptest::prelude::*;

fn make_query() -> Query {
    Query::new(query_kinds::INSTANCE_LIST)
        .with_param("filter", "running")
        .with_param("pageSize", 25i64)
        .with_param("currentPage", 1i64)
}

// ── Fingerprint determinism ──────────────────────────────────────

#[test]
fn equal_queries_share_a_fingerprint() {
    assert_eq!(make_query().fingerprint(), make_query().fingerprint());
}

#[test]
fn insertion_order_does_not_change_the_fingerprint() {
    let forward = Query::new(query_kinds::AGENT_LIST)
        .with_param("filter", "online")
        .with_param("sort", "name");
    let backward = Query::new(query_kinds::AGENT_LIST)
        .with_param("sort", "name")
        .with_param("filter", "online");

    assert_eq!(forward.fingerprint(), backward.fingerprint());
}

#[test]
fn different_params_produce_different_fingerprints() {
    let base = make_query();
    let other = make_query().with_param("currentPage", 2i64);
    assert_ne!(base.fingerprint(), other.fingerprint());
}

#[test]
fn different_kinds_produce_different_fingerprints() {
    let agents = Query::new(query_kinds::AGENT_LIST);
    let versions = Query::new(query_kinds::VERSION_LIST);
    assert_ne!(agents.fingerprint(), versions.fingerprint());
}

#[test]
fn fingerprint_renders_kind_and_ordered_params() {
    let fp = make_query().fingerprint();
    assert_eq!(
        fp.as_str(),
        "instance.list?currentPage=1&filter=running&pageSize=25"
    );
}

#[test]
fn fingerprint_of_a_paramless_query_is_the_kind() {
    let fp = Query::new(query_kinds::AGENT_LIST).fingerprint();
    assert_eq!(fp.as_str(), "agent.list");
}

proptest! {
    #[test]
    fn fingerprint_is_pure(
        kind in "[a-z]{1,12}\\.[a-z]{1,12}",
        keys in proptest::collection::vec("[a-zA-Z]{1,8}", 0..5),
        ints in proptest::collection::vec(any::<i64>(), 0..5),
    ) {
        let mut params = QueryParams::new();
        for (key, value) in keys.iter().zip(ints.iter()) {
            params.insert(key.clone(), ParamValue::Int(*value));
        }
        let first = Fingerprint::derive(&kind, &params);
        let second = Fingerprint::derive(&kind, &params.clone());
        prop_assert_eq!(first, second);
    }
}

// ── ParamValue ───────────────────────────────────────────────────

#[test]
fn param_values_render_their_primitive() {
    assert_eq!(ParamValue::from("abc").to_string(), "abc");
    assert_eq!(ParamValue::from(42i64).to_string(), "42");
    assert_eq!(ParamValue::from(true).to_string(), "true");
}

#[test]
fn query_serializes_round_trip() {
    let query = make_query();
    let json = serde_json::to_string(&query).unwrap();
    let back: Query = serde_json::from_str(&json).unwrap();
    assert_eq!(query, back);
    assert_eq!(query.fingerprint(), back.fingerprint());
}
