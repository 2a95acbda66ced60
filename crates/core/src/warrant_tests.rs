use super::*;
use chrono::{TimeZone, Utc};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

#[test]
fn file_produces_pending_warrant() {
    let w = Warrant::file("gastown/polecats/Toast", "zombie session", "deacon", t0());
    assert!(w.id.starts_with("warrant-"));
    assert!(!w.executed);
    assert_eq!(w.executed_at, None);
    assert_eq!(w.filed_at, t0());
}

#[test]
fn mark_executed_is_idempotent() {
    let mut w = Warrant::file("gastown/witness", "test", "deacon", t0());
    let t1 = t0() + chrono::Duration::seconds(30);
    assert!(w.mark_executed(t1));
    assert_eq!(w.executed_at, Some(t1));

    // A second execution never mutates the warrant again
    let t2 = t0() + chrono::Duration::hours(1);
    assert!(!w.mark_executed(t2));
    assert_eq!(w.executed_at, Some(t1));
}

#[test]
fn filename_flattens_path_separators() {
    let w = Warrant::file("gastown/polecats/Toast", "r", "deacon", t0());
    assert_eq!(w.filename(), "gastown-polecats-Toast.warrant.json");
}

#[test]
fn wire_format_is_stable() {
    let w = Warrant {
        id: "warrant-1".into(),
        target: "gastown/witness".into(),
        reason: "zombie".into(),
        filed_by: "deacon".into(),
        filed_at: t0(),
        executed: false,
        executed_at: None,
    };
    let json = serde_json::to_value(&w).unwrap();
    assert_eq!(json["target"], "gastown/witness");
    assert_eq!(json["executed"], false);
    assert_eq!(json["executed_at"], serde_json::Value::Null);
    // Round-trip
    let back: Warrant = serde_json::from_value(json).unwrap();
    assert_eq!(back, w);
}
