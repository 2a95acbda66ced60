use super::*;

#[test]
fn target_accepts_bare_and_to_forms() {
    assert_eq!(target_from(&[]).unwrap(), None);
    assert_eq!(
        target_from(&["gastown".to_string()]).unwrap().as_deref(),
        Some("gastown")
    );
    assert_eq!(
        target_from(&["to".to_string(), "gastown/polecats/Toast".to_string()])
            .unwrap()
            .as_deref(),
        Some("gastown/polecats/Toast")
    );
}

#[test]
fn stray_to_is_rejected() {
    assert!(target_from(&["to".to_string()]).is_err());
    assert!(target_from(&["x".to_string(), "y".to_string()]).is_err());
}
