use super::*;
use yare::parameterized;

#[parameterized(
    agent = { "gastown/crew/maria", Address::Agent("gastown/crew/maria".into()) },
    group = { "group:reviewers", Address::Group("reviewers".into()) },
    queue = { "queue:chores", Address::Queue("chores".into()) },
    channel = { "channel:alerts", Address::Channel("alerts".into()) },
    town = { "@town", Address::Town },
    crew = { "@crew", Address::CrewWide },
    witnesses = { "@witnesses", Address::Witnesses },
    overseer = { "@overseer", Address::Overseer },
    mayor = { "mayor", Address::Mayor },
    mayor_slash = { "mayor/", Address::Mayor },
    human = { "--human", Address::Human },
    this_agent = { "--self", Address::Myself },
)]
fn parse_known_addresses(input: &str, expected: Address) {
    assert_eq!(Address::parse(input), Some(expected));
}

#[parameterized(
    empty = { "" },
    empty_group = { "group:" },
    unknown_fanout = { "@everyone" },
    unknown_flag = { "--all" },
)]
fn parse_rejects(input: &str) {
    assert_eq!(Address::parse(input), None);
}

#[test]
fn priority_tier_ordering() {
    assert!(Priority::Urgent < Priority::High);
    assert!(Priority::High < Priority::Normal);
    assert!(Priority::Normal < Priority::Low);
}

#[test]
fn envelope_round_trips_through_fields() {
    let env = Envelope {
        id: "hq-m1".into(),
        thread_id: "abc123".into(),
        from: "gastown/witness".into(),
        to: "mayor".into(),
        cc: vec!["gastown/refinery".into()],
        subject: "Polecat down".into(),
        body: "Toast stopped responding.\nSecond line.".into(),
        priority: Priority::Urgent,
        mail_type: MailType::Notification,
        pinned: false,
        wisp: true,
        reply_to: None,
        suppress_notify: false,
    };
    let description = format!("{}\n{}", env.to_fields(), env.body);
    let back = Envelope::from_parts("hq-m1", "Polecat down", &description);
    assert_eq!(back, env);
}

#[test]
fn from_parts_tolerates_bare_description() {
    let env = Envelope::from_parts("hq-m2", "hello", "just a body line");
    assert_eq!(env.priority, Priority::Normal);
    assert_eq!(env.mail_type, MailType::Notification);
    assert_eq!(env.body, "just a body line");
    assert!(!env.wisp);
}

#[test]
fn reply_to_survives_round_trip() {
    let env = Envelope {
        id: "hq-m3".into(),
        thread_id: "t".into(),
        from: "a".into(),
        to: "b".into(),
        cc: vec![],
        subject: "re".into(),
        body: String::new(),
        priority: Priority::Normal,
        mail_type: MailType::Reply,
        pinned: false,
        wisp: false,
        reply_to: Some("hq-m1".into()),
        suppress_notify: true,
    };
    let description = env.to_fields().to_string();
    let back = Envelope::from_parts("hq-m3", "re", &description);
    assert_eq!(back.reply_to.as_deref(), Some("hq-m1"));
    assert!(back.suppress_notify);
}
