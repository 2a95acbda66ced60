use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "gt-abc123", true },
    dotted = { "gt-jns7.1", true },
    five_prefix = { "beads-x1", true },
    hq = { "hq-deacon", true },
    one_char_prefix = { "g-abc", false },
    six_char_prefix = { "gaslit-abc", false },
    upper_prefix = { "GT-abc", false },
    no_dash = { "gtabc", false },
    empty_rest = { "gt-", false },
    bad_rest = { "gt-a_b", false },
)]
fn bead_id_pattern(input: &str, ok: bool) {
    assert_eq!(is_bead_id(input), ok, "{input:?}");
}

#[test]
fn route_prefix_includes_dash() {
    assert_eq!(BeadId::new("gt-abc").route_prefix().as_deref(), Some("gt-"));
    assert_eq!(BeadId::new("hq-mail1").route_prefix().as_deref(), Some("hq-"));
    assert_eq!(BeadId::new("nodash").route_prefix(), None);
}

#[test]
fn status_serde_snake_case() {
    assert_eq!(
        serde_json::to_string(&BeadStatus::InProgress).unwrap(),
        "\"in_progress\""
    );
    let s: BeadStatus = serde_json::from_str("\"hooked\"").unwrap();
    assert_eq!(s, BeadStatus::Hooked);
}

#[test]
fn type_serde_kebab_case_with_catch_all() {
    assert_eq!(
        serde_json::to_string(&BeadType::MergeRequest).unwrap(),
        "\"merge-request\""
    );
    let t: BeadType = serde_json::from_str("\"convoy\"").unwrap();
    assert_eq!(t, BeadType::Other);
}

#[test]
fn decodes_bd_show_json() {
    let json = r#"{
        "id": "gt-abc123",
        "type": "task",
        "title": "Test issue",
        "status": "open",
        "labels": ["gt:keep", "idle:25"],
        "priority": 1
    }"#;
    let bead: Bead = serde_json::from_str(json).unwrap();
    assert_eq!(bead.id, "gt-abc123");
    assert_eq!(bead.status, BeadStatus::Open);
    assert!(bead.has_label(LABEL_KEEP));
    assert!(!bead.ephemeral);
    assert_eq!(bead.hook_bead, "");
}

#[test]
fn idle_label_is_authoritative() {
    let bead = Bead {
        labels: vec!["idle:42".into()],
        ..blank()
    };
    assert_eq!(bead.idle_label_minutes(), Some(42));
}

#[test]
fn idle_label_absent_or_malformed() {
    assert_eq!(blank().idle_label_minutes(), None);
    let bead = Bead {
        labels: vec!["idle:soon".into()],
        ..blank()
    };
    assert_eq!(bead.idle_label_minutes(), None);
}

#[test]
fn merge_request_by_type_or_label() {
    let by_type = Bead {
        bead_type: BeadType::MergeRequest,
        ..blank()
    };
    let by_label = Bead {
        labels: vec![LABEL_MERGE_REQUEST.into()],
        ..blank()
    };
    assert!(by_type.is_merge_request());
    assert!(by_label.is_merge_request());
    assert!(!blank().is_merge_request());
}

fn blank() -> Bead {
    Bead {
        id: BeadId::new("gt-0"),
        bead_type: BeadType::Task,
        title: String::new(),
        description: String::new(),
        status: BeadStatus::Open,
        assignee: String::new(),
        priority: 2,
        labels: Vec::new(),
        created_at: None,
        closed_at: None,
        ephemeral: false,
        hook_bead: String::new(),
    }
}
