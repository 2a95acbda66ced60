use super::*;

#[test]
fn short_truncates() {
    assert_eq!("gt-abcdef".short(5), "gt-ab");
    assert_eq!("gt".short(5), "gt");
}

#[test]
fn thread_ids_are_unique_and_hex() {
    let a = thread_id();
    let b = thread_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 32);
    assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn warrant_ids_carry_prefix() {
    assert!(warrant_id().starts_with("warrant-"));
}

crate::define_id! {
    /// Test-only ID type.
    pub struct ProbeId;
}

#[test]
fn define_id_generates_conversions() {
    let id = ProbeId::new("gt-abc123");
    assert_eq!(id.as_str(), "gt-abc123");
    assert_eq!(id.short(2), "gt");
    assert_eq!(id, "gt-abc123");
    assert_eq!(id.to_string(), "gt-abc123");
    let from_string: ProbeId = String::from("x").into();
    assert_eq!(from_string, "x");
}

#[test]
fn define_id_borrows_as_str_for_map_lookups() {
    use std::collections::HashMap;
    let mut map: HashMap<ProbeId, u32> = HashMap::new();
    map.insert(ProbeId::new("gt-1"), 7);
    assert_eq!(map.get("gt-1"), Some(&7));
}
