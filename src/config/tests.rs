use super::*;

fn header() -> Header {
    Header {
        t: 10,
        m: 2,
        n: 3,
        v: 20,
        g: 100,
        k: 2,
    }
}

#[test]
fn bucket_count_rounds_up() {
    assert_eq!(header().bucket_count(), 1);
    let h = Header { t: 1801, ..header() };
    assert_eq!(h.bucket_count(), 2);
    let h = Header { t: 3600, ..header() };
    assert_eq!(h.bucket_count(), 2);
    let h = Header { t: 3601, ..header() };
    assert_eq!(h.bucket_count(), 3);
}

#[test]
fn defaults_match_documented_values() {
    let cfg = Config::from_header(header());
    assert_eq!(cfg.fetch, 63);
    assert_eq!(cfg.stale_window, 105);
    assert_eq!(cfg.compact_period, 1800);
    assert!(cfg.use_compact);
}

#[test]
fn effective_capacity_under_compact_policy() {
    let mut cfg = Config::from_header(header());
    assert_eq!(cfg.effective_capacity(), 6);
    cfg.use_compact = false;
    assert_eq!(cfg.effective_capacity(), 20);
}

#[test]
fn head_count_is_twice_disk_count() {
    let cfg = Config::from_header(header());
    assert_eq!(cfg.head_count(), 6);
}
