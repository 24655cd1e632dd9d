//! Penalty-minimising tag/disk storage allocator, used once at startup by
//! [`crate::placement_init`] (§4.H step 4).
//!
//! Solved by seeded simulated annealing rather than an exact search: the
//! search space (every `M x N` integer matrix with fixed row/column sums)
//! is combinatorially large, and a near-optimal allocation is all placement
//! needs — the segment layout it produces only has to keep affine tags
//! apart, not hit a global optimum.

use rand::Rng;

/// Weight of the per-disk overflow penalty relative to the affinity term
/// (§4.H step 4's `beta`).
const OVERFLOW_WEIGHT: f64 = 4.0;
const INITIAL_TEMPERATURE: f64 = 100.0;
const COOLING_RATE: f64 = 0.995;
const ITERATIONS: usize = 4000;

/// `A[t][d]`: blocks of tag `t` allocated to disk `d`.
pub type Allocation = Vec<Vec<usize>>;

/// Finds an integer matrix `A` with `sum_t A[t][d] == capacity_per_disk` and
/// `sum_d A[t][d] == budget[t]`, minimising the weighted sum of pairwise
/// affinity collocation and per-disk overflow beyond `soft_limit`.
pub fn allocate(
    budget: &[usize],
    affinity: &[Vec<f64>],
    num_disks: usize,
    capacity_per_disk: usize,
    soft_limit: usize,
    rng: &mut impl Rng,
) -> Allocation {
    let m = budget.len();
    let mut a = initial_allocation(budget, num_disks, capacity_per_disk);
    let mut best = a.clone();
    let mut cur_cost = cost(&a, affinity, soft_limit);
    let mut best_cost = cur_cost;

    let mut temperature = INITIAL_TEMPERATURE;
    for _ in 0..ITERATIONS {
        if m < 2 {
            break;
        }
        let t1 = rng.random_range(0..m);
        let t2 = rng.random_range(0..m);
        if t1 == t2 {
            continue;
        }
        let d1 = rng.random_range(0..num_disks);
        let d2 = rng.random_range(0..num_disks);
        if d1 == d2 {
            continue;
        }
        // Moves one unit of tag t1 from disk d1 to d2, and one unit of tag
        // t2 the opposite way, keeping every row and column sum fixed.
        if a[t1][d1] == 0 || a[t2][d2] == 0 {
            continue;
        }
        a[t1][d1] -= 1;
        a[t1][d2] += 1;
        a[t2][d2] -= 1;
        a[t2][d1] += 1;

        let new_cost = cost(&a, affinity, soft_limit);
        let accept = new_cost <= cur_cost
            || rng.random::<f64>() < ((cur_cost - new_cost) / temperature).exp();
        if accept {
            cur_cost = new_cost;
            if cur_cost < best_cost {
                best_cost = cur_cost;
                best = a.clone();
            }
        } else {
            // revert
            a[t1][d1] += 1;
            a[t1][d2] -= 1;
            a[t2][d2] += 1;
            a[t2][d1] -= 1;
        }
        temperature *= COOLING_RATE;
    }
    best
}

fn initial_allocation(budget: &[usize], num_disks: usize, capacity_per_disk: usize) -> Allocation {
    let mut a = vec![vec![0usize; num_disks]; budget.len()];
    let mut remaining_on_disk = vec![capacity_per_disk; num_disks];
    for (t, &b) in budget.iter().enumerate() {
        let mut left = b;
        let mut d = t % num_disks.max(1);
        let mut attempts = 0;
        while left > 0 && attempts < num_disks * b.max(1) + num_disks + 1 {
            if remaining_on_disk[d] > 0 {
                let take = left.min(remaining_on_disk[d]);
                a[t][d] += take;
                remaining_on_disk[d] -= take;
                left -= take;
            }
            d = (d + 1) % num_disks.max(1);
            attempts += 1;
        }
    }
    a
}

fn cost(a: &Allocation, affinity: &[Vec<f64>], soft_limit: usize) -> f64 {
    let m = a.len();
    let num_disks = a.first().map(|row| row.len()).unwrap_or(0);
    let mut total = 0.0;
    for d in 0..num_disks {
        let mut collocated = 0.0;
        for i in 0..m {
            for j in (i + 1)..m {
                collocated += affinity[i][j] * a[i][d] as f64 * a[j][d] as f64;
            }
        }
        let occupancy: usize = (0..m).map(|t| a[t][d]).sum();
        let overflow = occupancy.saturating_sub(soft_limit) as f64;
        total += collocated + OVERFLOW_WEIGHT * overflow * overflow;
    }
    total
}

#[cfg(test)]
mod tests;
