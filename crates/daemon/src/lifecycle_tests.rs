use super::*;

fn town_dir() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("mayor")).unwrap();
    std::fs::write(tmp.path().join("mayor/town.json"), "{}\n").unwrap();
    std::fs::create_dir_all(tmp.path().join(".beads")).unwrap();
    std::fs::write(
        tmp.path().join(".beads/routes.jsonl"),
        "{\"prefix\":\"hq-\",\"path\":\".\"}\n",
    )
    .unwrap();
    tmp
}

fn config(tmp: &tempfile::TempDir) -> Config {
    let town = Town::at(tmp.path());
    Config {
        town_root: tmp.path().to_path_buf(),
        interval: DEFAULT_INTERVAL,
        log_path: town.deacon_log_path(),
        pid_path: town.deacon_pid_path(),
    }
}

#[test]
fn start_writes_the_pid_file() {
    let tmp = town_dir();
    let deacon = Deacon::start(config(&tmp)).unwrap();
    let pid_text = std::fs::read_to_string(deacon.town().deacon_pid_path()).unwrap();
    assert_eq!(pid_text.trim(), std::process::id().to_string());
}

#[test]
fn second_deacon_is_refused() {
    let tmp = town_dir();
    let _first = Deacon::start(config(&tmp)).unwrap();
    let err = match Deacon::start(config(&tmp)) {
        Err(e) => e,
        Ok(_) => panic!("expected AlreadyRunning"),
    };
    match err {
        LifecycleError::AlreadyRunning(path) => assert!(path.ends_with("deacon.pid")),
        other => panic!("expected AlreadyRunning, got {other}"),
    }
}

#[test]
fn lock_is_released_on_drop() {
    let tmp = town_dir();
    drop(Deacon::start(config(&tmp)).unwrap());
    assert!(Deacon::start(config(&tmp)).is_ok());
}

#[test]
fn paths_live_under_the_deacon_home() {
    let tmp = town_dir();
    let config = config(&tmp);
    assert!(config.log_path.ends_with("deacon/.runtime/deacon.log"));
    assert!(config.pid_path.ends_with("deacon/.runtime/deacon.pid"));
}
