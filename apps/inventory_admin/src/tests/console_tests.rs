use super::*;
use client_core::{ChannelNotifier, Notifier};
use serde_json::json;
use shared::error::ClientError;

fn row(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => Record::new(map),
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn affirmative_answers() {
    for yes in ["y", "Y\n", " yes ", "ya"] {
        assert!(is_affirmative(yes), "{yes:?}");
    }
    for no in ["", "n", "no", "yep", "\n"] {
        assert!(!is_affirmative(no), "{no:?}");
    }
}

#[test]
fn renders_aligned_columns() {
    let columns = vec!["id".to_string(), "nama".to_string()];
    let rows = vec![
        row(json!({ "id": 1, "nama": "Laptop" })),
        row(json!({ "id": 12, "nama": null })),
    ];

    let table = render_table(&columns, &rows);
    assert_eq!(
        table,
        "id | nama\n---+-------\n1  | Laptop\n12 |\n"
    );
}

#[test]
fn empty_page_renders_placeholder() {
    assert_eq!(render_table(&["id".to_string()], &[]), "(no records)\n");
}

#[test]
fn discovers_columns_without_schema() {
    let rows = vec![
        row(json!({ "nama": "Meja", "id": 1 })),
        row(json!({ "id": 2, "lokasi": "Gudang" })),
    ];
    assert_eq!(discovered_columns(&rows), vec!["id", "nama", "lokasi"]);
}

#[test]
fn drains_and_counts_errors() {
    let notifier = ChannelNotifier::default();
    let mut rx = notifier.subscribe();
    notifier.notify(Notification::success("ok"));
    notifier.notify(Notification::failure(&ClientError::missing_token()));

    assert_eq!(drain_notifications(&mut rx), 1);
    assert_eq!(drain_notifications(&mut rx), 0);
}
