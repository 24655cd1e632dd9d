//! Startup placement construction: turns the offline per-tag, per-bucket
//! delete/write/read hint tables into a materialised [`SegmentTable`]
//! (§4.H).

use rand::Rng;
use thiserror::Error;

use crate::optimizer;
use crate::segment::SegmentTable;
use crate::tsp;

/// Errors raised while computing the startup placement layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementInitError {
    /// The computed per-tag budget cannot be packed onto the fleet (a
    /// malformed or self-contradictory header/hint table).
    #[error("tag budgets do not fit the fleet: total demand {demand} exceeds capacity {capacity}")]
    InfeasibleAllocation { demand: usize, capacity: usize },
}

/// Per-tag, per-bucket block-count hints, indexed `[tag][bucket]`.
#[derive(Debug, Clone)]
pub struct HintTables {
    pub deletes: Vec<Vec<u64>>,
    pub writes: Vec<Vec<u64>>,
    pub reads: Vec<Vec<u64>>,
}

/// Per-tag peak cumulative residency: `max` over buckets of the running
/// total of writes minus deletes (§4.H step 1).
pub fn peak_residency(writes: &[Vec<u64>], deletes: &[Vec<u64>]) -> Vec<i64> {
    writes
        .iter()
        .zip(deletes.iter())
        .map(|(w, d)| {
            let mut running = 0i64;
            let mut peak = 0i64;
            for (&wi, &di) in w.iter().zip(d.iter()) {
                running += wi as i64 - di as i64;
                peak = peak.max(running);
            }
            peak.max(0)
        })
        .collect()
}

/// Per-tag storage budget across the whole fleet, proportional to peak
/// residency, with the last tag absorbing the rounding remainder so the
/// total always equals `num_disks * capacity_per_disk` exactly (§4.H
/// step 2).
pub fn tag_budget(peak: &[i64], num_disks: usize, capacity_per_disk: usize) -> Vec<usize> {
    let total_capacity = num_disks * capacity_per_disk;
    let sum_peak: i64 = peak.iter().sum();
    let m = peak.len();
    if m == 0 {
        return Vec::new();
    }
    if sum_peak <= 0 {
        // No write history at all: split the fleet evenly across tags.
        let mut budget = vec![total_capacity / m; m];
        let remainder = total_capacity - budget.iter().sum::<usize>();
        if let Some(last) = budget.last_mut() {
            *last += remainder;
        }
        return budget;
    }
    let mut budget: Vec<usize> = peak
        .iter()
        .map(|&p| ((p.max(0) as u128 * total_capacity as u128) / sum_peak as u128) as usize)
        .collect();
    let assigned: usize = budget.iter().sum();
    if let Some(last) = budget.last_mut() {
        *last += total_capacity.saturating_sub(assigned);
    }
    budget
}

/// Spearman rank correlation between two equal-length series, used as the
/// tag-affinity proxy (§4.H step 3).
pub fn spearman(a: &[u64], b: &[u64]) -> f64 {
    pearson(&ranks(a), &ranks(b))
}

fn ranks(xs: &[u64]) -> Vec<f64> {
    let n = xs.len();
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by_key(|&i| xs[i]);
    let mut out = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && xs[idx[j + 1]] == xs[idx[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &idx[i..=j] {
            out[k] = avg_rank;
        }
        i = j + 1;
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for i in 0..a.len() {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        0.0
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

/// Full `M x M` tag-affinity matrix.
pub fn affinity_matrix(reads: &[Vec<u64>]) -> Vec<Vec<f64>> {
    let m = reads.len();
    let mut a = vec![vec![0.0; m]; m];
    for i in 0..m {
        for j in (i + 1)..m {
            let v = spearman(&reads[i], &reads[j]);
            a[i][j] = v;
            a[j][i] = v;
        }
    }
    a
}

/// Runs the whole startup pipeline and materialises a [`SegmentTable`].
pub fn build(
    hints: &HintTables,
    num_tags: usize,
    num_disks: usize,
    capacity_per_disk: usize,
    rng: &mut impl Rng,
) -> Result<SegmentTable, PlacementInitError> {
    let peak = peak_residency(&hints.writes, &hints.deletes);
    let budget = tag_budget(&peak, num_disks, capacity_per_disk);
    let demand: usize = budget.iter().sum();
    let capacity = num_disks * capacity_per_disk;
    if demand > capacity {
        return Err(PlacementInitError::InfeasibleAllocation { demand, capacity });
    }
    let affinity = affinity_matrix(&hints.reads);
    let soft_limit = (2 * capacity_per_disk) / (3 * num_tags.max(1));
    let allocation = optimizer::allocate(
        &budget,
        &affinity,
        num_disks,
        capacity_per_disk,
        soft_limit.max(1),
        rng,
    );

    let mut table = SegmentTable::new(num_tags, num_disks);
    for disk in 0..num_disks {
        let weight: Vec<Vec<f64>> = (0..num_tags)
            .map(|i| {
                (0..num_tags)
                    .map(|j| affinity[i][j] * allocation[i][disk] as f64 * allocation[j][disk] as f64)
                    .collect()
            })
            .collect();
        let order = tsp::solve(&weight);
        let mut start = 0;
        for tag in order {
            let size = allocation[tag][disk];
            if size == 0 {
                continue;
            }
            table.push(disk, start, tag, size);
            start += size;
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests;
