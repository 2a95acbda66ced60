use super::*;

fn town_with_routes(lines: &[&str]) -> (tempfile::TempDir, Town) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
    std::fs::write(tmp.path().join("mayor/town.json"), "{}\n").unwrap();
    std::fs::create_dir_all(tmp.path().join(".beads")).unwrap();
    std::fs::write(
        tmp.path().join(".beads/routes.jsonl"),
        lines.join("\n") + "\n",
    )
    .unwrap();
    let town = Town::at(tmp.path());
    (tmp, town)
}

#[test]
fn resolves_registered_prefixes() {
    let (_tmp, town) = town_with_routes(&[
        r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#,
        r#"{"prefix":"hq-","path":"."}"#,
    ]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(
        table.resolve("gt-").unwrap(),
        town.root().join("gastown/mayor/rig")
    );
    assert_eq!(table.resolve("hq-").unwrap(), town.root());
}

#[test]
fn hq_resolves_without_a_route_line() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(table.resolve("hq-").unwrap(), town.root());
}

#[test]
fn unknown_prefix_fails() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    let table = RouteTable::load(&town).unwrap();
    assert!(matches!(
        table.resolve("bd-"),
        Err(StorageError::UnknownPrefix(_))
    ));
}

#[test]
fn resolve_bead_routes_by_id_prefix() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(
        table.resolve_bead("gt-abc123").unwrap(),
        town.root().join("gastown/mayor/rig")
    );
    assert!(table.resolve_bead("nodash").is_err());
}

#[test]
fn rig_of_extracts_first_component() {
    let (_tmp, town) = town_with_routes(&[
        r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#,
        r#"{"prefix":"hq-","path":"."}"#,
    ]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(table.rig_of("gt-").as_deref(), Some("gastown"));
    assert_eq!(table.rig_of("hq-"), None);
}

#[test]
fn prefix_lookup_by_rig() {
    let (_tmp, town) = town_with_routes(&[
        r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#,
        r#"{"prefix":"bd-","path":"beads/mayor/rig"}"#,
    ]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(table.prefix_for_rig("beads").as_deref(), Some("bd-"));
    assert_eq!(table.short_prefix_for_rig("gastown").as_deref(), Some("gt"));
    assert_eq!(table.prefix_for_rig("unknown"), None);
}

#[test]
fn append_route_extends_the_file() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    RouteTable::append_route(&town, "bd-", "beads/mayor/rig").unwrap();
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(
        table.resolve("bd-").unwrap(),
        town.root().join("beads/mayor/rig")
    );
}

#[test]
fn append_route_refuses_conflicts() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    assert!(matches!(
        RouteTable::append_route(&town, "gt-", "elsewhere"),
        Err(StorageError::RouteConflict(_))
    ));
}

#[test]
fn malformed_lines_are_skipped() {
    let (_tmp, town) = town_with_routes(&[
        r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#,
        "not json",
    ]);
    let table = RouteTable::load(&town).unwrap();
    assert_eq!(table.routes().len(), 1);
}

#[test]
fn discover_rejects_rig_local_routes_file() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    // A rig that grew its own routes file shadows the town's
    let rig_beads = town.root().join("gastown/.beads");
    std::fs::create_dir_all(&rig_beads).unwrap();
    std::fs::write(rig_beads.join("routes.jsonl"), "").unwrap();
    let inside = town.root().join("gastown/crew/maria");
    std::fs::create_dir_all(&inside).unwrap();
    assert!(matches!(
        RouteTable::discover(&inside),
        Err(StorageError::ShadowingRoutes(_))
    ));
}

#[test]
fn discover_finds_the_town_table() {
    let (_tmp, town) = town_with_routes(&[r#"{"prefix":"gt-","path":"gastown/mayor/rig"}"#]);
    let inside = town.root().join("gastown/crew/maria");
    std::fs::create_dir_all(&inside).unwrap();
    let table = RouteTable::discover(&inside).unwrap();
    assert_eq!(table.routes().len(), 1);
}
