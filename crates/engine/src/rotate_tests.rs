use super::*;
use crate::supervisor::Supervisor;
use gt_adapters::env::GT_ROLE;
use gt_adapters::{FakeSession, FakeSessionAdapter};
use gt_core::{AccountInfo, AccountQuota, AccountStatus, FakeClock};
use gt_storage::Town;
use yare::parameterized;

#[parameterized(
    five_hour = { "You have hit your 5-hour limit reached", true },
    usage = { "usage limit reached, upgrade for more", true },
    rate = { "API Error: rate limited, retry later", true },
    reset_phrase = { "Your limit will reset at 4pm", true },
    clean = { "All tests passed, continuing work", false },
)]
fn rate_limit_library(output: &str, expected: bool) {
    assert_eq!(matches_rate_limit(output), expected);
}

#[test]
fn reset_time_projection() {
    let now = chrono::Utc
        .with_ymd_and_hms(2026, 1, 10, 12, 0, 0)
        .unwrap();
    let afternoon = parse_reset_time("limit will reset at 4pm", now).unwrap();
    assert_eq!(afternoon.to_rfc3339(), "2026-01-10T16:00:00+00:00");

    // A time already past today lands tomorrow
    let morning = parse_reset_time("resets at 9am", now).unwrap();
    assert_eq!(morning.to_rfc3339(), "2026-01-11T09:00:00+00:00");

    let with_minutes = parse_reset_time("resets at 14:30", now).unwrap();
    assert_eq!(with_minutes.to_rfc3339(), "2026-01-10T14:30:00+00:00");

    assert_eq!(parse_reset_time("no reset phrase here", now), None);
}

#[test]
fn plan_pairs_lru_first_and_reports_deficit() {
    let mut state = QuotaState::default();
    let t = |h: u32| {
        chrono::Utc
            .with_ymd_and_hms(2026, 1, 10, h, 0, 0)
            .unwrap()
    };
    state.accounts.insert(
        "work".into(),
        AccountQuota {
            last_used: Some(t(9)),
            ..Default::default()
        },
    );
    state.accounts.insert(
        "personal".into(),
        AccountQuota {
            last_used: Some(t(7)),
            ..Default::default()
        },
    );
    state.accounts.insert(
        "burnt".into(),
        AccountQuota {
            status: AccountStatus::Limited,
            ..Default::default()
        },
    );
    let hits = vec![
        ScanHit {
            session: "s1".into(),
            handle: None,
            resets_at: None,
        },
        ScanHit {
            session: "s2".into(),
            handle: None,
            resets_at: None,
        },
        ScanHit {
            session: "s3".into(),
            handle: None,
            resets_at: None,
        },
    ];
    let plan = plan_rotation(&hits, &state);
    assert_eq!(plan.pairs.len(), 2);
    assert_eq!(plan.pairs[0].1, "personal", "least recently used first");
    assert_eq!(plan.pairs[1].1, "work");
    assert_eq!(plan.unassigned, vec!["s3"]);
}

struct Fixture {
    _tmp: tempfile::TempDir,
    town: Town,
    sessions: FakeSessionAdapter,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
    std::fs::write(tmp.path().join("mayor/town.json"), "{}\n").unwrap();
    std::fs::create_dir_all(tmp.path().join(".beads")).unwrap();
    std::fs::write(
        tmp.path().join(".beads/routes.jsonl"),
        "{\"prefix\":\"gt-\",\"path\":\"gastown/mayor/rig\"}\n",
    )
    .unwrap();
    Fixture {
        town: Town::at(tmp.path()),
        _tmp: tmp,
        sessions: FakeSessionAdapter::new(),
        clock: FakeClock::default(),
    }
}

fn accounts() -> AccountsConfig {
    let mut config = AccountsConfig::default();
    config.accounts.insert(
        "work".into(),
        AccountInfo {
            email: "work@example.com".into(),
            config_dir: "/cfg/work".into(),
            is_default: true,
        },
    );
    config.accounts.insert(
        "personal".into(),
        AccountInfo {
            email: "me@example.com".into(),
            config_dir: "/cfg/personal".into(),
            is_default: false,
        },
    );
    config
}

fn rotator(f: &Fixture) -> QuotaRotator<FakeSessionAdapter, FakeClock> {
    let routes = gt_storage::RouteTable::load(&f.town).unwrap();
    QuotaRotator::new(
        Supervisor::new(f.sessions.clone()),
        f.town.clone(),
        routes,
        accounts(),
        f.clock.clone(),
    )
}

fn limited_session(name: &str, config_dir: &str) -> FakeSession {
    let mut session = FakeSession::alive(name)
        .with_env(GT_ROLE, "witness")
        .with_env(CLAUDE_CONFIG_DIR, config_dir);
    session.output = "API Error: rate limit reached; limit will reset at 4pm".into();
    session
}

// Scan + plan + execute under partial failure: one session's env is
// refused, the other rotates, and the state file is written once with
// only the successful rotation.
#[tokio::test]
async fn rotation_survives_partial_failure() {
    let f = fixture();
    f.sessions
        .add_session(limited_session("gt-gastown-witness", "/cfg/work"));
    f.sessions
        .add_session(limited_session("gt-gastown-refinery", "/cfg/personal"));
    f.sessions.refuse_env_for("gt-gastown-witness");

    // Seed LRU so the refinery (old account: personal) receives work
    {
        let quota = gt_storage::QuotaFile::at(f.town.quota_state_path());
        let mut state = QuotaState::default();
        state.mark_used("work", f.clock.now() - chrono::Duration::hours(2));
        state.mark_used("personal", f.clock.now() - chrono::Duration::hours(1));
        let mut guard = quota.lock().unwrap();
        guard.save(&state).unwrap();
    }

    let rot = rotator(&f);
    let mut results = rot.rotate().await.unwrap();
    results.sort_by(|a, b| a.session.cmp(&b.session));
    assert_eq!(results.len(), 2);

    let refinery = &results[0];
    assert_eq!(refinery.session, "gt-gastown-refinery");
    assert!(refinery.rotated);
    assert_eq!(refinery.account.as_deref(), Some("work"));

    let witness = &results[1];
    assert_eq!(witness.session, "gt-gastown-witness");
    assert!(!witness.rotated);
    assert!(witness.error.as_deref().unwrap_or("").contains("refused"));

    // The survivor's env now points at the new account's config dir
    let session = f.sessions.get_session("gt-gastown-refinery").unwrap();
    assert_eq!(
        session.env.get(CLAUDE_CONFIG_DIR).map(String::as_str),
        Some("/cfg/work")
    );
    assert!(session.cmd.contains("gt prime"), "pane was respawned");

    // State reflects only the successful rotation: personal limited,
    // work freshly used
    let state = gt_storage::QuotaFile::at(f.town.quota_state_path())
        .load()
        .unwrap();
    assert_eq!(state.accounts["personal"].status, AccountStatus::Limited);
    assert_eq!(state.accounts["work"].status, AccountStatus::Available);
    assert!(state.accounts["work"].last_used.unwrap() >= f.clock.now() - chrono::Duration::minutes(1));
}

#[tokio::test]
async fn scan_skips_foreign_and_healthy_sessions() {
    let f = fixture();
    // Healthy town session
    f.sessions.add_session(
        FakeSession::alive("gt-gastown-witness")
            .with_env(GT_ROLE, "witness")
            .with_env(CLAUDE_CONFIG_DIR, "/cfg/work"),
    );
    // Foreign tmux session showing limit-like text
    let mut foreign = FakeSession::alive("scratch");
    foreign.output = "rate limited".into();
    f.sessions.add_session(foreign);

    let rot = rotator(&f);
    assert!(rot.scan().await.unwrap().is_empty());
}

#[tokio::test]
async fn scan_maps_config_dir_to_handle() {
    let f = fixture();
    f.sessions
        .add_session(limited_session("gt-gastown-witness", "/cfg/work"));
    let rot = rotator(&f);
    let hits = rot.scan().await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].handle.as_deref(), Some("work"));
    assert!(hits[0].resets_at.is_some());
}

#[tokio::test]
async fn clear_restores_accounts_once() {
    let f = fixture();
    {
        let quota = gt_storage::QuotaFile::at(f.town.quota_state_path());
        let mut state = QuotaState::default();
        state.mark_limited("work", f.clock.now(), None);
        state.mark_limited("personal", f.clock.now(), None);
        let mut guard = quota.lock().unwrap();
        guard.save(&state).unwrap();
    }
    let rot = rotator(&f);
    assert_eq!(rot.clear(None).await.unwrap(), 2);
    let state = gt_storage::QuotaFile::at(f.town.quota_state_path())
        .load()
        .unwrap();
    assert!(state
        .accounts
        .values()
        .all(|q| q.status == AccountStatus::Available));
}
