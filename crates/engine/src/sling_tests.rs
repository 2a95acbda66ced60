use super::*;
use crate::registry::Registry;
use crate::supervisor::Supervisor;
use gt_adapters::{FakeBeads, FakeSessionAdapter};
use gt_core::BeadId;
use gt_storage::RouteTable;
use std::path::PathBuf;

struct Fixture {
    _tmp: tempfile::TempDir,
    town: Town,
    beads: FakeBeads,
    sessions: FakeSessionAdapter,
    sling: Sling<FakeBeads, FakeSessionAdapter>,
}

fn bead_in(beads: &FakeBeads, db: &std::path::Path, id: &str, title: &str) -> Bead {
    let bead = Bead {
        id: BeadId::new(id),
        bead_type: gt_core::BeadType::Task,
        title: title.to_string(),
        description: String::new(),
        status: BeadStatus::Open,
        assignee: String::new(),
        priority: 2,
        labels: Vec::new(),
        created_at: None,
        closed_at: None,
        ephemeral: false,
        hook_bead: String::new(),
    };
    beads.insert(db, bead.clone());
    bead
}

fn agent_bead_in(beads: &FakeBeads, db: &std::path::Path, id: &str) {
    let mut bead = Bead {
        id: BeadId::new(id),
        bead_type: gt_core::BeadType::Task,
        title: id.to_string(),
        description: String::new(),
        status: BeadStatus::Open,
        assignee: String::new(),
        priority: 2,
        labels: vec![LABEL_AGENT.to_string()],
        created_at: None,
        closed_at: None,
        ephemeral: false,
        hook_bead: String::new(),
    };
    bead.labels.push(LABEL_AGENT.to_string());
    beads.insert(db, bead);
}

fn fixture(actor: AgentId, cwd_rel: &str) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor/rig")).unwrap();
    std::fs::write(tmp.path().join("mayor/town.json"), "{}\n").unwrap();
    std::fs::create_dir_all(tmp.path().join(".beads")).unwrap();
    std::fs::write(
        tmp.path().join(".beads/routes.jsonl"),
        concat!(
            "{\"prefix\":\"gt-\",\"path\":\"gastown/mayor/rig\"}\n",
            "{\"prefix\":\"bd-\",\"path\":\"beads/mayor/rig\"}\n",
            "{\"prefix\":\"hq-\",\"path\":\".\"}\n",
        ),
    )
    .unwrap();
    std::fs::create_dir_all(tmp.path().join("gastown/mayor/rig")).unwrap();
    std::fs::create_dir_all(tmp.path().join("beads/mayor/rig")).unwrap();

    let town = Town::at(tmp.path());
    let routes = RouteTable::load(&town).unwrap();
    let beads = FakeBeads::new();
    beads.set_db_prefix(&town.root().to_path_buf(), "hq");
    let sessions = FakeSessionAdapter::new();
    let cwd = tmp.path().join(cwd_rel);
    let sling = Sling::new(
        Registry::new(routes, beads.clone()),
        Supervisor::new(sessions.clone()),
        town.clone(),
        actor,
        RuntimeConfig::default(),
        cwd,
    );
    Fixture {
        _tmp: tmp,
        town,
        beads,
        sessions,
        sling,
    }
}

fn gt_db(f: &Fixture) -> PathBuf {
    f.town.root().join("gastown/mayor/rig")
}

fn bd_db(f: &Fixture) -> PathBuf {
    f.town.root().join("beads/mayor/rig")
}

// Scenario: sling a formula onto a bead; bd commands land in the
// bead's owning rig database.
#[tokio::test]
async fn formula_sling_routes_to_the_owning_rig_db() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, f.town.root(), "hq-mayor");
    f.beads.add_formula("mol-review");

    let outcome = f
        .sling
        .sling(
            "mol-review",
            &SlingOptions {
                on: Some("gt-abc123".into()),
                no_convoy: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, SlingOutcome::Hooked { .. }));

    let log = f.beads.log();
    let cwd = f.town.root().join("mayor/rig");

    let formula_show = log
        .iter()
        .find(|i| i.starts_with(&["formula", "show", "mol-review"]))
        .expect("formula show invoked");
    assert_eq!(formula_show.db, cwd);

    let wisp = log
        .iter()
        .find(|i| i.starts_with(&["mol", "wisp"]))
        .expect("mol wisp invoked");
    assert_eq!(wisp.db, gt_db(&f));
    assert!(wisp.argv.contains(&"--var".to_string()));
    assert!(wisp.argv.contains(&"feature=Test issue".to_string()));
    assert!(wisp.argv.contains(&"issue=gt-abc123".to_string()));

    let bond = log
        .iter()
        .find(|i| i.starts_with(&["mol", "bond"]))
        .expect("mol bond invoked");
    assert_eq!(bond.db, gt_db(&f));

    assert!(log.iter().any(|i| i.starts_with(&["update", "gt-abc123"])
        && i.argv.iter().any(|a| a == "--status=hooked")));
    assert!(log.iter().any(|i| i.starts_with(&["update", "gt-abc123"])
        && i.argv.iter().any(|a| a.contains("attached_molecule"))));

    // The bead carries the attachment and the hook
    let bead = f.beads.bead(&gt_db(&f), "gt-abc123").unwrap();
    assert_eq!(bead.status, BeadStatus::Hooked);
    assert!(bead.description.contains("attached_molecule: gt-wisp"));
}

// Scenario: cross-rig slings are refused without --force.
#[tokio::test]
async fn cross_rig_sling_is_rejected_unless_forced() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &bd_db(&f), "bd-ka761", "A beads issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");
    agent_bead_in(&f.beads, &bd_db(&f), "bd-beads-polecat-obsidian");

    let err = f
        .sling
        .sling(
            "bd-ka761",
            &SlingOptions {
                target: Some("gastown/polecats/Toast".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cross-rig mismatch"), "{message}");
    assert!(message.contains("--force"), "{message}");

    // State unchanged: the bead is still open and unassigned
    let bead = f.beads.bead(&bd_db(&f), "bd-ka761").unwrap();
    assert_eq!(bead.status, BeadStatus::Open);
    assert_eq!(bead.assignee, "");

    // Same-rig target succeeds
    let outcome = f
        .sling
        .sling(
            "bd-ka761",
            &SlingOptions {
                target: Some("beads/polecats/obsidian".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, SlingOutcome::Hooked { .. }));
    let bead = f.beads.bead(&bd_db(&f), "bd-ka761").unwrap();
    assert_eq!(bead.status, BeadStatus::Hooked);
    assert_eq!(bead.assignee, "beads/polecats/obsidian");
}

#[tokio::test]
async fn forced_cross_rig_sling_goes_through() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &bd_db(&f), "bd-ka761", "A beads issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");

    let outcome = f
        .sling
        .sling(
            "bd-ka761",
            &SlingOptions {
                target: Some("gastown/polecats/Toast".into()),
                force: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, SlingOutcome::Hooked { .. }));
}

// Property: sling is idempotent; the second call observes AlreadyHooked
// and performs no writes.
#[tokio::test]
async fn double_sling_is_idempotent() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, f.town.root(), "hq-mayor");

    let first = f
        .sling
        .sling("gt-abc123", &SlingOptions::default())
        .await
        .unwrap();
    assert!(matches!(first, SlingOutcome::Hooked { .. }));

    let writes_before = count_writes(&f.beads);
    let second = f
        .sling
        .sling("gt-abc123", &SlingOptions::default())
        .await
        .unwrap();
    assert_eq!(second, SlingOutcome::AlreadyHooked);
    assert_eq!(count_writes(&f.beads), writes_before, "no side effects");
}

fn count_writes(beads: &FakeBeads) -> usize {
    beads
        .log()
        .iter()
        .filter(|i| {
            i.starts_with(&["update"])
                || i.starts_with(&["slot", "set"])
                || i.starts_with(&["create"])
                || i.starts_with(&["close"])
        })
        .count()
}

#[tokio::test]
async fn validation_rejects_bad_targets() {
    let rigs = vec!["gastown".to_string()];
    assert!(matches!(
        parse_target("gastown//Toast", &rigs),
        Err(GtError::InvalidTarget { .. })
    ));
    assert!(matches!(
        parse_target("gastown/witness/extra", &rigs),
        Err(GtError::InvalidTarget { .. })
    ));
    assert!(matches!(
        parse_target("unknownrig/sheriff", &rigs),
        Err(GtError::InvalidTarget { .. })
    ));
    assert_eq!(
        parse_target("gastown", &rigs).unwrap(),
        SlingTarget::BareRig("gastown".into())
    );
    assert_eq!(
        parse_target("deacon/dogs", &rigs).unwrap(),
        SlingTarget::DogsPool
    );
    assert_eq!(
        parse_target("gastown/Toast", &rigs).unwrap(),
        SlingTarget::Shorthand {
            rig: "gastown".into(),
            name: "Toast".into()
        }
    );
}

#[tokio::test]
async fn shorthand_prefers_crew_directories() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    std::fs::create_dir_all(f.town.rig_dir("gastown").join("crew/maria")).unwrap();
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-crew-maria");

    let outcome = f
        .sling
        .sling(
            "gt-abc123",
            &SlingOptions {
                target: Some("gastown/maria".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    match outcome {
        SlingOutcome::Hooked { agent, .. } => assert_eq!(agent, "gastown/crew/maria"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn bare_rig_allocates_an_idle_polecat() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    // Busy polecat and an idle one
    let mut busy = Bead {
        id: BeadId::new("gt-gastown-polecat-Ace"),
        bead_type: gt_core::BeadType::Task,
        title: "busy".into(),
        description: String::new(),
        status: BeadStatus::Open,
        assignee: String::new(),
        priority: 2,
        labels: vec![LABEL_AGENT.to_string()],
        created_at: None,
        closed_at: None,
        ephemeral: false,
        hook_bead: "gt-other".into(),
    };
    f.beads.insert(&gt_db(&f), busy.clone());
    busy.id = BeadId::new("gt-gastown-polecat-Toast");
    busy.hook_bead = String::new();
    f.beads.insert(&gt_db(&f), busy);

    let outcome = f
        .sling
        .sling(
            "gt-abc123",
            &SlingOptions {
                target: Some("gastown".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    match outcome {
        SlingOutcome::Hooked { agent, .. } => assert_eq!(agent, "gastown/polecats/Toast"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn sling_spawns_the_session_with_identity_env() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");
    std::fs::create_dir_all(f.town.rig_dir("gastown").join("polecats/Toast/gastown")).unwrap();

    let outcome = f
        .sling
        .sling(
            "gt-abc123",
            &SlingOptions {
                target: Some("gastown/polecats/Toast".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    match outcome {
        SlingOutcome::Hooked {
            session, spawned, ..
        } => {
            assert_eq!(session, "gt-gastown-polecat-Toast");
            assert!(spawned);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let session = f.sessions.get_session("gt-gastown-polecat-Toast").unwrap();
    assert_eq!(
        session.env.get("GT_POLECAT").map(String::as_str),
        Some("Toast")
    );
    assert!(session.cmd.contains("gt prime"));
}

#[tokio::test]
async fn stale_hooked_beads_are_repaired() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");
    // Drifted bead: hooked + assigned, but not on any hook
    let mut stale = bead_in(&f.beads, &gt_db(&f), "gt-stale1", "old work");
    stale.status = BeadStatus::Hooked;
    stale.assignee = "gastown/polecats/Toast".into();
    f.beads.insert(&gt_db(&f), stale);

    f.sling
        .sling(
            "gt-abc123",
            &SlingOptions {
                target: Some("gastown/polecats/Toast".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let repaired = f.beads.bead(&gt_db(&f), "gt-stale1").unwrap();
    assert_eq!(repaired.status, BeadStatus::Open);
    assert_eq!(repaired.assignee, "");
}

#[tokio::test]
async fn missing_bead_reports_not_found() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    let err = f
        .sling
        .sling("gt-nope1", &SlingOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn unsling_clears_slot_and_reopens() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    bead_in(&f.beads, &gt_db(&f), "gt-abc123", "Test issue");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");
    f.sling
        .sling(
            "gt-abc123",
            &SlingOptions {
                target: Some("gastown/polecats/Toast".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    f.sling.unsling("gt-abc123", None, false).await.unwrap();
    let bead = f.beads.bead(&gt_db(&f), "gt-abc123").unwrap();
    assert_eq!(bead.status, BeadStatus::Open);
    assert_eq!(
        f.beads
            .bead(&gt_db(&f), "gt-gastown-polecat-Toast")
            .unwrap()
            .hook_bead,
        ""
    );
}

#[tokio::test]
async fn unsling_missing_bead_needs_force_and_agent() {
    let f = fixture(AgentId::mayor(), "mayor/rig");
    agent_bead_in(&f.beads, &gt_db(&f), "gt-gastown-polecat-Toast");

    assert!(f.sling.unsling("gt-gone1", None, false).await.is_err());
    f.sling
        .unsling("gt-gone1", Some("gastown/polecats/Toast"), true)
        .await
        .unwrap();
}
