use fetchlet::http::headers::{HeaderValue, Headers};

#[test]
fn test_comma_separated_value_reads_as_sequence() {
    let mut headers = Headers::new();
    headers.set("X-Foo", "a,b,c");

    let value = headers.get("X-Foo").unwrap();
    assert_eq!(value.as_multi(), Some(&["a".to_string(), "b".to_string(), "c".to_string()][..]));
}

#[test]
fn test_single_value_reads_as_string() {
    let mut headers = Headers::new();
    headers.set("X-Bar", "single");

    assert_eq!(headers.get("X-Bar"), Some(&HeaderValue::Single("single".to_string())));
}

#[test]
fn test_missing_header_is_none() {
    let headers = Headers::new();
    assert!(headers.get("X-Nope").is_none());
}

#[test]
fn test_set_overwrites() {
    let mut headers = Headers::new();
    headers.set("X-Foo", "first");
    headers.set("X-Foo", "second");

    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get_str("X-Foo").as_deref(), Some("second"));
}

#[test]
fn test_append_behaves_like_set() {
    let mut headers = Headers::new();
    headers.append("Accept", "text/html");
    headers.append("Accept", "application/json");

    assert_eq!(headers.get_str("Accept").as_deref(), Some("application/json"));
}

#[test]
fn test_populate_without_splitting_keeps_raw_strings() {
    let mut headers = Headers::new();
    headers.populate([("Accept", "text/html,application/json")], false);

    assert_eq!(headers.get("Accept").unwrap(), &"text/html,application/json");
}

#[test]
fn test_populate_later_entry_wins() {
    let mut headers = Headers::new();
    headers.populate([("X-Dup", "one"), ("x-dup", "two")], true);

    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get_str("X-Dup").as_deref(), Some("two"));
}

#[test]
fn test_collapse_restores_wire_form() {
    let headers = Headers::from([
        ("Content-Type", "text/plain"),
        ("Accept", "text/html, application/json"),
    ]);

    assert_eq!(
        headers.collapse(),
        vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("Accept".to_string(), "text/html, application/json".to_string()),
        ]
    );
}
