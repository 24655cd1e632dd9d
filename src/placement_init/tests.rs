use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn peak_residency_tracks_the_running_max() {
    let writes = vec![vec![10, 0, 5]];
    let deletes = vec![vec![0, 3, 0]];
    assert_eq!(peak_residency(&writes, &deletes), vec![12]);
}

#[test]
fn peak_residency_never_negative() {
    let writes = vec![vec![0, 0]];
    let deletes = vec![vec![5, 5]];
    assert_eq!(peak_residency(&writes, &deletes), vec![0]);
}

#[test]
fn tag_budget_splits_proportionally_and_sums_exactly() {
    let peak = vec![3, 1];
    let budget = tag_budget(&peak, 2, 10); // total capacity 20
    assert_eq!(budget.iter().sum::<usize>(), 20);
    assert!(budget[0] > budget[1]);
}

#[test]
fn tag_budget_with_no_history_splits_evenly() {
    let peak = vec![0, 0, 0];
    let budget = tag_budget(&peak, 3, 10); // total capacity 30
    assert_eq!(budget.iter().sum::<usize>(), 30);
    assert_eq!(budget[0], 10);
}

#[test]
fn spearman_of_identical_series_is_one() {
    let a = vec![1, 5, 3, 9, 2];
    assert!((spearman(&a, &a) - 1.0).abs() < 1e-9);
}

#[test]
fn spearman_of_inverted_series_is_minus_one() {
    let a = vec![1, 2, 3, 4, 5];
    let b = vec![5, 4, 3, 2, 1];
    assert!((spearman(&a, &b) + 1.0).abs() < 1e-9);
}

#[test]
fn build_produces_a_segment_table_whose_tags_partition_each_disk() {
    let hints = HintTables {
        deletes: vec![vec![0, 0], vec![0, 0]],
        writes: vec![vec![6, 0], vec![2, 0]],
        reads: vec![vec![10, 20], vec![1, 1]],
    };
    let mut rng = StdRng::seed_from_u64(0);
    let table = build(&hints, 2, 2, 8, &mut rng).unwrap();
    assert_eq!(table.num_disks(), 2);
    for disk in 0..2 {
        let mut covered = 0usize;
        for tag in 0..2 {
            for &seg_id in table.segments_of_tag(tag) {
                let seg = table.get(seg_id);
                if seg.disk == disk {
                    covered += seg.capacity;
                }
            }
        }
        assert_eq!(covered, 8);
    }
}
