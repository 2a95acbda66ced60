use super::*;
use crate::registry::Registry;
use gt_adapters::FakeBeads;
use gt_core::{BeadId, BeadType, FakeClock};
use gt_storage::RouteTable;
use std::path::PathBuf;

struct Fixture {
    _tmp: tempfile::TempDir,
    town: Town,
    beads: FakeBeads,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
    std::fs::write(tmp.path().join("mayor/town.json"), "{}\n").unwrap();
    std::fs::create_dir_all(tmp.path().join(".beads")).unwrap();
    std::fs::write(
        tmp.path().join(".beads/routes.jsonl"),
        concat!(
            "{\"prefix\":\"gt-\",\"path\":\"gastown/mayor/rig\"}\n",
            "{\"prefix\":\"hq-\",\"path\":\".\"}\n",
        ),
    )
    .unwrap();
    Fixture {
        town: Town::at(tmp.path()),
        _tmp: tmp,
        beads: FakeBeads::new(),
        clock: FakeClock::default(),
    }
}

fn refinery(f: &Fixture) -> Refinery<FakeBeads, FakeClock> {
    let routes = RouteTable::load(&f.town).unwrap();
    Refinery::new(
        Registry::new(routes, f.beads.clone()),
        f.town.clone(),
        f.clock.clone(),
        "gastown",
        "gt",
    )
}

fn gt_db(f: &Fixture) -> PathBuf {
    f.town.root().join("gastown/mayor/rig")
}

fn mr_bead(f: &Fixture, id: &str, priority: i64, description: &str) -> Bead {
    let bead = Bead {
        id: BeadId::new(id),
        bead_type: BeadType::MergeRequest,
        title: format!("Merge {}", id),
        description: description.to_string(),
        status: BeadStatus::Open,
        assignee: String::new(),
        priority,
        labels: vec![LABEL_MERGE_REQUEST.to_string()],
        created_at: Some(f.clock.now() - chrono::Duration::minutes(5)),
        closed_at: None,
        ephemeral: true,
        hook_bead: String::new(),
    };
    f.beads.insert(&gt_db(f), bead.clone());
    bead
}

fn epic(id: &str, title: &str, description: &str) -> Bead {
    Bead {
        id: BeadId::new(id),
        bead_type: BeadType::Epic,
        title: title.to_string(),
        description: description.to_string(),
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

// Scenario: integration branch precedence: explicit field, then
// template, then the slug default, never ending in `/`.
#[test]
fn epic_branch_resolution_precedence() {
    let with_field = epic("gt-epic", "My Epic", "integration_branch: custom/my-branch\nnotes");
    let settings = RigSettings::default();
    assert_eq!(
        resolve_epic_branch(&with_field, &settings, "gt"),
        "custom/my-branch"
    );

    let bare = epic("gt-epic", "My Epic", "");
    let templated: RigSettings = serde_json::from_str(
        r#"{"merge_queue": {"integration_branch_template": "{prefix}/{epic}"}}"#,
    )
    .unwrap();
    assert_eq!(resolve_epic_branch(&bare, &templated, "gt"), "gt/gt-epic");

    assert_eq!(
        resolve_epic_branch(&bare, &settings, "gt"),
        "integration/my-epic"
    );

    let untitled = epic("gt-epic", "", "");
    let resolved = resolve_epic_branch(&untitled, &settings, "gt");
    assert!(!resolved.ends_with('/'), "got {resolved}");
    assert_eq!(resolved, "integration/unnamed");
}

#[test]
fn template_with_title_placeholder() {
    let bare = epic("gt-epic", "Fix Flux", "");
    let templated: RigSettings = serde_json::from_str(
        r#"{"merge_queue": {"integration_branch_template": "{prefix}/{epic}/{title}"}}"#,
    )
    .unwrap();
    assert_eq!(
        resolve_epic_branch(&bare, &templated, "gt"),
        "gt/gt-epic/fix-flux"
    );
    // Empty title: the trailing slash is trimmed
    let untitled = epic("gt-epic", "", "");
    assert_eq!(
        resolve_epic_branch(&untitled, &templated, "gt"),
        "gt/gt-epic"
    );
}

#[test]
fn settings_load_tolerates_absence() {
    let tmp = tempfile::tempdir().unwrap();
    let town = Town::at(tmp.path());
    let settings = RigSettings::load(&town, "gastown");
    assert!(settings.merge_queue.integration_branch_template.is_none());
}

#[tokio::test]
async fn queue_orders_by_score() {
    let f = fixture();
    mr_bead(&f, "gt-mr1", 3, "branch: polecat/a/gt-1");
    mr_bead(&f, "gt-mr2", 0, "branch: polecat/b/gt-2");
    mr_bead(&f, "gt-mr3", 0, "branch: polecat/c/gt-3\nretry_count: 4");

    let queue = refinery(&f).queue().await.unwrap();
    let ids: Vec<&str> = queue.iter().map(|s| s.mr.id.as_str()).collect();
    // Priority 0 beats priority 3; retries push gt-mr3 below gt-mr2
    assert_eq!(ids, vec!["gt-mr2", "gt-mr3", "gt-mr1"]);
    assert!(queue[0].score > queue[1].score);
}

#[tokio::test]
async fn convoy_age_contributes_to_score() {
    let f = fixture();
    f.beads.set_db_prefix(f.town.root(), "hq");
    let mut convoy = epic("hq-conv1", "convoy", "");
    convoy.created_at = Some(f.clock.now() - chrono::Duration::hours(3));
    f.beads.insert(&f.town.root().to_path_buf(), convoy);
    mr_bead(&f, "gt-mr1", 1, "branch: polecat/a/gt-1");
    mr_bead(&f, "gt-mr2", 1, "branch: polecat/b/gt-2\nconvoy_id: hq-conv1");

    let queue = refinery(&f).queue().await.unwrap();
    assert_eq!(queue[0].mr.id, "gt-mr2", "convoyed MR jumps the line");
}

mod with_git {
    use super::*;
    use gt_adapters::git::GitAdapter;

    async fn git_fixture() -> (Fixture, GitAdapter) {
        let f = fixture();
        let repo_dir = f.town.rig_dir("gastown").join("refinery/rig");
        std::fs::create_dir_all(&repo_dir).unwrap();
        let git = GitAdapter::in_repo(&repo_dir);
        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.email", "gt@example.com"],
            vec!["config", "user.name", "gt"],
        ] {
            let output = tokio::process::Command::new("git")
                .args(&args)
                .current_dir(&repo_dir)
                .output()
                .await
                .unwrap();
            assert!(output.status.success());
        }
        std::fs::write(repo_dir.join("README"), "trunk\n").unwrap();
        run_git(&repo_dir, &["add", "."]).await;
        run_git(&repo_dir, &["commit", "-m", "init"]).await;
        (f, git)
    }

    async fn run_git(dir: &std::path::Path, args: &[&str]) {
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?}: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    #[tokio::test]
    async fn merged_mr_is_closed() {
        let (f, git) = git_fixture().await;
        let repo = git.repo().to_path_buf();
        run_git(&repo, &["checkout", "-b", "polecat/nux/gt-1"]).await;
        std::fs::write(repo.join("feature.txt"), "done\n").unwrap();
        run_git(&repo, &["add", "."]).await;
        run_git(&repo, &["commit", "-m", "feature"]).await;
        run_git(&repo, &["checkout", "main"]).await;

        mr_bead(&f, "gt-mr1", 1, "branch: polecat/nux/gt-1\ntarget: main");
        let reports = refinery(&f).process(&git).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].outcome,
            MrOutcome::Merged {
                target: "main".into()
            }
        );
        let mr = f.beads.bead(&gt_db(&f), "gt-mr1").unwrap();
        assert_eq!(mr.status, BeadStatus::Closed);
    }

    #[tokio::test]
    async fn missing_branch_blocks_the_mr() {
        let (f, git) = git_fixture().await;
        mr_bead(&f, "gt-mr1", 1, "branch: polecat/gone/gt-9");
        let reports = refinery(&f).process(&git).await.unwrap();
        assert!(matches!(reports[0].outcome, MrOutcome::Blocked { .. }));
        let mr = f.beads.bead(&gt_db(&f), "gt-mr1").unwrap();
        assert_eq!(mr.status, BeadStatus::Blocked);
        assert!(mr.description.contains("blocked_reason:"));
    }

    #[tokio::test]
    async fn conflict_requeues_with_a_retry_bump() {
        let (f, git) = git_fixture().await;
        let repo = git.repo().to_path_buf();
        run_git(&repo, &["checkout", "-b", "polecat/nux/gt-1"]).await;
        std::fs::write(repo.join("README"), "feature side\n").unwrap();
        run_git(&repo, &["commit", "-am", "feature"]).await;
        run_git(&repo, &["checkout", "main"]).await;
        std::fs::write(repo.join("README"), "trunk side\n").unwrap();
        run_git(&repo, &["commit", "-am", "trunk"]).await;

        mr_bead(&f, "gt-mr1", 1, "branch: polecat/nux/gt-1\ntarget: main\nretry_count: 1");
        let reports = refinery(&f).process(&git).await.unwrap();
        assert_eq!(reports[0].outcome, MrOutcome::Requeued { retries: 2 });
        let mr = f.beads.bead(&gt_db(&f), "gt-mr1").unwrap();
        assert_eq!(mr.status, BeadStatus::Open, "requeued, not blocked");
        assert!(mr.description.contains("retry_count: 2"));
    }

    #[tokio::test]
    async fn verify_reports_absent_branches_without_deleting() {
        let (f, git) = git_fixture().await;
        mr_bead(&f, "gt-mr1", 1, "branch: main");
        mr_bead(&f, "gt-mr2", 1, "branch: polecat/gone/gt-9");
        let verified = refinery(&f).verify(&git).await.unwrap();
        let by_id: std::collections::HashMap<&str, bool> = verified
            .iter()
            .map(|(s, ok)| (s.mr.id.as_str(), *ok))
            .collect();
        assert_eq!(by_id["gt-mr1"], true);
        assert_eq!(by_id["gt-mr2"], false);
        // Nothing was mutated
        assert_eq!(
            f.beads.bead(&gt_db(&f), "gt-mr2").unwrap().status,
            BeadStatus::Open
        );
    }
}
