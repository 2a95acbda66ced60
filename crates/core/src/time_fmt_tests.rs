use super::*;
use yare::parameterized;

#[parameterized(
    seconds = { 5, "5s" },
    minutes = { 150, "2m" },
    hour_exact = { 3600, "1h" },
    hour_and_minutes = { 5400, "1h30m" },
    days = { 300000, "3d" },
    zero = { 0, "0s" },
)]
fn formats_elapsed(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[test]
fn minutes_wrapper() {
    assert_eq!(format_elapsed_mins(90), "1h30m");
    assert_eq!(format_elapsed_mins(15), "15m");
}
