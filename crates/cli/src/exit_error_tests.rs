use super::*;

#[test]
fn silent_exit_round_trips_through_anyhow() {
    let err = ExitError::silent(1);
    let downcast = err.downcast_ref::<ExitError>().unwrap();
    assert!(matches!(downcast, ExitError::Silent(1)));
}

#[test]
fn message_formats_plainly() {
    let err = ExitError::Message("no such rig".into());
    assert_eq!(err.to_string(), "no such rig");
}
