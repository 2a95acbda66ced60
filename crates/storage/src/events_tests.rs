use super::*;
use chrono::{TimeZone, Utc};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
}

#[test]
fn append_creates_and_accumulates() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventsLog::at(tmp.path().join(".events.jsonl"));
    log.append(
        "sling",
        "mayor",
        serde_json::json!({"bead": "gt-abc"}),
        t0(),
    )
    .unwrap();
    log.append("warrant_filed", "deacon", serde_json::json!({}), t0())
        .unwrap();

    let events = log.read_all().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "sling");
    assert_eq!(events[0].payload["bead"], "gt-abc");
    assert_eq!(events[1].actor, "deacon");
}

#[test]
fn read_all_on_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let log = EventsLog::at(tmp.path().join(".events.jsonl"));
    assert!(log.read_all().unwrap().is_empty());
}

#[test]
fn malformed_lines_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(".events.jsonl");
    std::fs::write(&path, "garbage\n").unwrap();
    let log = EventsLog::at(&path);
    log.append("x", "y", serde_json::Value::Null, t0()).unwrap();
    assert_eq!(log.read_all().unwrap().len(), 1);
}
