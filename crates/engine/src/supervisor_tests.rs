use super::*;
use gt_adapters::{FakeSession, FakeSessionAdapter};
use std::path::PathBuf;

#[test]
fn restart_command_shape() {
    let runtime = RuntimeConfig::default();
    let cmd = build_restart_command(Path::new("/town/gastown/witness/rig"), &runtime);
    assert_eq!(
        cmd,
        "cd /town/gastown/witness/rig && exec claude --dangerously-skip-permissions \"gt prime\""
    );
}

#[test]
fn restart_command_quotes_awkward_paths() {
    let runtime = RuntimeConfig {
        command: "claude".into(),
        args: vec![],
        process_names: vec!["claude".into()],
    };
    let cmd = build_restart_command(Path::new("/town/my rig"), &runtime);
    assert!(cmd.starts_with("cd '/town/my rig' && exec claude"));
    assert!(cmd.ends_with("\"gt prime\""));
}

#[test]
fn session_env_for_a_polecat() {
    let agent = AgentId::polecat("gastown", "Toast");
    let runtime = RuntimeConfig::default();
    let vars = session_env(&agent, "sess-1", &runtime);
    let get = |k: &str| {
        vars.iter()
            .find(|(key, _)| key == k)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get(env::GT_ROLE), Some("polecat"));
    assert_eq!(get(env::GT_RIG), Some("gastown"));
    assert_eq!(get(env::GT_POLECAT), Some("Toast"));
    assert_eq!(get(env::BD_ACTOR), Some("gastown/polecats/Toast"));
    assert_eq!(get(env::GT_PROCESS_NAMES), Some("claude,node"));
    assert_eq!(get(env::GT_SESSION_ID), Some("sess-1"));
    assert_eq!(get(env::GT_CREW), None);
}

#[tokio::test]
async fn state_ladder_alive_zombie_absent() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session(
        FakeSession::alive("gt-gastown-witness").with_env(env::GT_PROCESS_NAMES, "claude"),
    );
    adapter.add_session(
        FakeSession::zombie("gt-gastown-refinery").with_env(env::GT_PROCESS_NAMES, "claude"),
    );
    let supervisor = Supervisor::new(adapter);

    assert_eq!(
        supervisor.session_state("gt-gastown-witness").await.unwrap(),
        SessionState::Alive
    );
    assert_eq!(
        supervisor
            .session_state("gt-gastown-refinery")
            .await
            .unwrap(),
        SessionState::Zombie
    );
    assert_eq!(
        supervisor.session_state("gt-gastown-crew-x").await.unwrap(),
        SessionState::Absent
    );
}

#[tokio::test]
async fn scan_classifies_everything_listed() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session(FakeSession::alive("hq-deacon").with_env(env::GT_PROCESS_NAMES, "claude"));
    adapter.add_session(FakeSession::zombie("hq-dog-rex").with_env(env::GT_PROCESS_NAMES, "claude"));
    let supervisor = Supervisor::new(adapter);
    let map = supervisor.scan().await.unwrap();
    assert_eq!(map.get("hq-deacon"), Some(&SessionState::Alive));
    assert_eq!(map.get("hq-dog-rex"), Some(&SessionState::Zombie));
}

#[tokio::test]
async fn ensure_spawns_when_absent() {
    let adapter = FakeSessionAdapter::new();
    let supervisor = Supervisor::new(adapter.clone());
    let agent = AgentId::witness("gastown");
    let outcome = supervisor
        .ensure_session(
            "gt-gastown-witness",
            Path::new("/town/gastown/witness/rig"),
            &agent,
            "sess-1",
            &RuntimeConfig::default(),
            "[gt] nudge",
        )
        .await
        .unwrap();
    assert_eq!(outcome, EnsureOutcome::Spawned);
    let session = adapter.get_session("gt-gastown-witness").unwrap();
    assert_eq!(session.cwd, PathBuf::from("/town/gastown/witness/rig"));
    assert!(session.cmd.contains("gt prime"));
    assert_eq!(
        session.env.get(env::GT_ROLE).map(String::as_str),
        Some("witness")
    );
}

#[tokio::test]
async fn ensure_respawns_zombies() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session(
        FakeSession::zombie("gt-gastown-witness").with_env(env::GT_PROCESS_NAMES, "claude"),
    );
    let supervisor = Supervisor::new(adapter.clone());
    let agent = AgentId::witness("gastown");
    let outcome = supervisor
        .ensure_session(
            "gt-gastown-witness",
            Path::new("/home"),
            &agent,
            "sess-1",
            &RuntimeConfig::default(),
            "[gt] nudge",
        )
        .await
        .unwrap();
    assert_eq!(outcome, EnsureOutcome::Spawned);
    assert!(adapter
        .calls()
        .iter()
        .any(|c| matches!(c, gt_adapters::SessionCall::Respawn { .. })));
}

#[tokio::test]
async fn ensure_nudges_the_living() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session(
        FakeSession::alive("gt-gastown-witness").with_env(env::GT_PROCESS_NAMES, "claude"),
    );
    let supervisor = Supervisor::new(adapter.clone());
    let agent = AgentId::witness("gastown");
    let outcome = supervisor
        .ensure_session(
            "gt-gastown-witness",
            Path::new("/home"),
            &agent,
            "sess-1",
            &RuntimeConfig::default(),
            "[gt] re-read your hook",
        )
        .await
        .unwrap();
    assert_eq!(outcome, EnsureOutcome::Nudged);
    let calls = adapter.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        gt_adapters::SessionCall::SendLiteral { text, .. } if text.contains("re-read")
    )));
    assert!(calls
        .iter()
        .any(|c| matches!(c, gt_adapters::SessionCall::SendEnter { .. })));
}

#[tokio::test]
async fn cross_agent_respawn_recomputes_process_names() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session(
        FakeSession::alive("gt-gastown-crew-maria").with_env(env::GT_PROCESS_NAMES, "old-agent"),
    );
    let supervisor = Supervisor::new(adapter.clone());
    let runtime = RuntimeConfig {
        command: "newcli".into(),
        args: vec![],
        process_names: vec!["newcli".into()],
    };
    supervisor
        .respawn_as("gt-gastown-crew-maria", Path::new("/home"), &runtime)
        .await
        .unwrap();
    let session = adapter.get_session("gt-gastown-crew-maria").unwrap();
    assert_eq!(
        session.env.get(env::GT_PROCESS_NAMES).map(String::as_str),
        Some("newcli")
    );
    assert!(session.cmd.contains("exec newcli"));
}
