use super::*;
use gt_adapters::FakeBeads;
use gt_core::{BeadType, Bead};
use gt_storage::Town;

fn town_fixture() -> (tempfile::TempDir, Town, RouteTable) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
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
    let town = Town::at(tmp.path());
    let routes = RouteTable::load(&town).unwrap();
    (tmp, town, routes)
}

fn bead(id: &str) -> Bead {
    Bead {
        id: BeadId::new(id),
        bead_type: BeadType::Task,
        title: format!("bead {}", id),
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

#[tokio::test]
async fn reads_route_by_prefix() {
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let gt_db = town.root().join("gastown/mayor/rig");
    beads.insert(&gt_db, bead("gt-abc"));
    let registry = Registry::new(routes, beads);

    let found = registry.show("gt-abc").await.unwrap();
    assert_eq!(found.id, "gt-abc");
    assert!(registry.show("gt-missing").await.is_err());
}

#[tokio::test]
async fn slot_writes_go_to_the_agent_beads_database() {
    // Agent bead lives in the rig DB, hook target in the town DB
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let gt_db = town.root().join("gastown/mayor/rig");
    let town_db = town.root().to_path_buf();
    let mut agent = bead("gt-gastown-witness");
    agent.labels.push(gt_core::bead::LABEL_AGENT.into());
    beads.insert(&gt_db, agent);
    beads.insert(&town_db, bead("hq-chore1"));
    let registry = Registry::new(routes, beads.clone());

    registry
        .set_hook("gt-gastown-witness", Some("hq-chore1"))
        .await
        .unwrap();

    let slot_call = beads
        .log()
        .into_iter()
        .find(|i| i.starts_with(&["slot", "set"]))
        .unwrap();
    assert_eq!(slot_call.db, gt_db);
    assert_eq!(slot_call.argv[3], "hook=hq-chore1");
}

#[tokio::test]
async fn clear_hook_tolerates_target_update_failure() {
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let gt_db = town.root().join("gastown/mayor/rig");
    let town_db = town.root().to_path_buf();
    let mut agent = bead("gt-gastown-witness");
    agent.hook_bead = "hq-chore1".into();
    beads.insert(&gt_db, agent);
    let mut target = bead("hq-chore1");
    target.status = BeadStatus::Hooked;
    beads.insert(&town_db, target);
    beads.fail_updates_for("hq-chore1");
    let registry = Registry::new(routes, beads.clone());

    // Status reopen fails, slot clear succeeds: the call succeeds
    let hooked = registry.clear_hook("gt-gastown-witness").await.unwrap();
    assert_eq!(hooked.as_deref(), Some("hq-chore1"));
    assert_eq!(
        beads.bead(&gt_db, "gt-gastown-witness").unwrap().hook_bead,
        ""
    );
}

#[tokio::test]
async fn clear_hook_fails_when_the_slot_write_fails() {
    let (_tmp, _town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let registry = Registry::new(routes, beads);
    // No agent bead at all: the slot write is the fatal path
    assert!(registry.clear_hook("gt-gastown-witness").await.is_err());
}

#[tokio::test]
async fn agent_beads_are_collected_across_databases() {
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let mut witness = bead("gt-gastown-witness");
    witness.labels.push(gt_core::bead::LABEL_AGENT.into());
    beads.insert(&town.root().join("gastown/mayor/rig"), witness);
    let mut deacon = bead("hq-deacon");
    deacon.labels.push(gt_core::bead::LABEL_AGENT.into());
    beads.insert(&town.root().to_path_buf(), deacon);
    let registry = Registry::new(routes, beads);

    let agents = registry.list_agent_beads().await.unwrap();
    let ids: Vec<&str> = agents.iter().map(|b| b.id.as_str()).collect();
    assert!(ids.contains(&"gt-gastown-witness"));
    assert!(ids.contains(&"hq-deacon"));
}

#[tokio::test]
async fn find_mr_for_branch_matches_the_field() {
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let gt_db = town.root().join("gastown/mayor/rig");
    let mut mr = bead("gt-mr1");
    mr.labels.push(gt_core::bead::LABEL_MERGE_REQUEST.into());
    mr.description = "branch: polecat/Nux/gt-001".into();
    beads.insert(&gt_db, mr);
    let registry = Registry::new(routes, beads);

    let found = registry
        .find_mr_for_branch("gt", "polecat/Nux/gt-001")
        .await
        .unwrap();
    assert_eq!(found.unwrap().id, "gt-mr1");
    assert!(registry
        .find_mr_for_branch("gt", "other")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn set_field_preserves_unknown_fields() {
    let (_tmp, town, routes) = town_fixture();
    let beads = FakeBeads::new();
    let gt_db = town.root().join("gastown/mayor/rig");
    let mut b = bead("gt-abc");
    b.description = "custom: kept\nsome prose".into();
    beads.insert(&gt_db, b);
    let registry = Registry::new(routes, beads.clone());

    registry
        .set_field("gt-abc", "attached_molecule", "gt-wisp1")
        .await
        .unwrap();
    let description = beads.bead(&gt_db, "gt-abc").unwrap().description;
    assert_eq!(
        description,
        "custom: kept\nsome prose\nattached_molecule: gt-wisp1"
    );
}

#[test]
fn agent_for_bead_id_round_trips() {
    let (_tmp, _town, routes) = town_fixture();
    let registry = Registry::new(routes, FakeBeads::new());
    assert_eq!(
        registry.agent_for_bead_id("gt-gastown-witness"),
        Some(gt_core::AgentId::witness("gastown"))
    );
    assert_eq!(
        registry.agent_for_bead_id("hq-deacon"),
        Some(gt_core::AgentId::deacon())
    );
    assert_eq!(registry.agent_for_bead_id("zz-unknown"), None);
}
