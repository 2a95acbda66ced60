use super::*;
use gt_core::AgentId;

fn make_town(dir: &Path) {
    std::fs::create_dir_all(dir.join("mayor")).unwrap();
    std::fs::write(dir.join("mayor").join("town.json"), "{}\n").unwrap();
}

#[test]
fn discover_walks_up() {
    let tmp = tempfile::tempdir().unwrap();
    make_town(tmp.path());
    let deep = tmp.path().join("gastown/crew/maria/src");
    std::fs::create_dir_all(&deep).unwrap();
    let town = Town::discover(&deep).unwrap();
    assert_eq!(town.root(), tmp.path());
}

#[test]
fn discover_accepts_bare_mayor_dir() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
    assert!(Town::discover(tmp.path()).is_ok());
}

#[test]
fn discover_fails_outside_a_town() {
    let tmp = tempfile::tempdir().unwrap();
    let err = Town::discover(tmp.path()).unwrap_err();
    assert!(matches!(err, StorageError::NoTown(_)));
}

#[test]
fn homes_follow_the_fixed_layout() {
    let town = Town::at("/town");
    assert_eq!(town.home(&AgentId::mayor()), Path::new("/town/mayor"));
    assert_eq!(town.home(&AgentId::deacon()), Path::new("/town/deacon"));
    assert_eq!(town.home(&AgentId::boot()), Path::new("/town/deacon"));
    assert_eq!(
        town.home(&AgentId::witness("gastown")),
        Path::new("/town/gastown/witness/rig")
    );
    assert_eq!(
        town.home(&AgentId::refinery("gastown")),
        Path::new("/town/gastown/refinery/rig")
    );
    assert_eq!(
        town.home(&AgentId::crew("gastown", "maria")),
        Path::new("/town/gastown/crew/maria")
    );
    assert_eq!(
        town.home(&AgentId::dog("rex")),
        Path::new("/town/deacon/dogs/rex")
    );
}

#[test]
fn polecat_home_is_nested_on_write() {
    let town = Town::at("/town");
    assert_eq!(
        town.home(&AgentId::polecat("gastown", "Toast")),
        Path::new("/town/gastown/polecats/Toast/gastown")
    );
}

#[test]
fn existing_home_accepts_legacy_flat_polecat() {
    let tmp = tempfile::tempdir().unwrap();
    make_town(tmp.path());
    let legacy = tmp.path().join("gastown/polecats/Toast");
    std::fs::create_dir_all(legacy.join(".runtime")).unwrap();

    let town = Town::at(tmp.path());
    let agent = AgentId::polecat("gastown", "Toast");
    assert_eq!(town.existing_home(&agent), legacy);

    // Once the nested form exists it wins
    let nested = legacy.join("gastown");
    std::fs::create_dir_all(&nested).unwrap();
    assert_eq!(town.existing_home(&agent), nested);
}

#[test]
fn runtime_paths() {
    let home = Path::new("/town/gastown/crew/maria");
    assert_eq!(
        Town::lock_path(home),
        Path::new("/town/gastown/crew/maria/.runtime/agent.lock")
    );
    assert_eq!(
        Town::handoff_marker_path(home),
        Path::new("/town/gastown/crew/maria/.runtime/handoff.marker")
    );
    assert_eq!(
        Town::session_id_path(home),
        Path::new("/town/gastown/crew/maria/.runtime/session_id")
    );
}
