//! Per-head ordered set of outstanding block addresses, with multiplicity
//! counts, a hot-spot histogram, and nearest-forward lookup on the ring
//! (§4.C).

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors raised by [`ReadQueue`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadQueueError {
    /// [`ReadQueue::swap`] was called with both addresses already present.
    #[error("cannot swap {a} and {b}: both already queued")]
    BothPresent { a: usize, b: usize },
}

/// A per-head outstanding-read tracker.
///
/// `cnt` doubles as the ordered set `S` of §4.C: an address is a member
/// iff its count is present and non-zero. The histogram sums counts into
/// fixed-width address ranges for O(1) [`ReadQueue::hot`] queries.
#[derive(Debug, Clone)]
pub struct ReadQueue {
    ring: usize,
    bucket_width: usize,
    cnt: BTreeMap<usize, u32>,
    histogram: Vec<u64>,
    total: u64,
}

impl ReadQueue {
    /// Creates an empty queue over a ring of size `ring`, with histogram
    /// buckets of `bucket_width` addresses (default: one bucket covering
    /// the whole ring, per §3's "default one bucket of width V").
    pub fn new(ring: usize, bucket_width: usize) -> Self {
        let bucket_width = bucket_width.max(1);
        let num_buckets = ring.div_ceil(bucket_width).max(1);
        Self {
            ring,
            bucket_width,
            cnt: BTreeMap::new(),
            histogram: vec![0; num_buckets],
            total: 0,
        }
    }

    fn bucket_of(&self, addr: usize) -> usize {
        addr / self.bucket_width
    }

    /// Total outstanding block-level reads at this head: Σ counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_queued(&self, addr: usize) -> bool {
        self.cnt.contains_key(&addr)
    }

    pub fn count_at(&self, addr: usize) -> u32 {
        self.cnt.get(&addr).copied().unwrap_or(0)
    }

    /// Inserts `addr`, incrementing its count, histogram bucket, and total.
    pub fn push(&mut self, addr: usize) {
        *self.cnt.entry(addr).or_insert(0) += 1;
        self.histogram[self.bucket_of(addr)] += 1;
        self.total += 1;
    }

    /// Removes `addr` entirely, regardless of its count.
    pub fn remove_all(&mut self, addr: usize) {
        if let Some(c) = self.cnt.remove(&addr) {
            self.histogram[self.bucket_of(addr)] -= c as u64;
            self.total -= c as u64;
        }
    }

    /// Decrements `addr`'s count by one; removes it once the count reaches
    /// zero. No-op if `addr` is not queued.
    pub fn remove_one(&mut self, addr: usize) {
        if let Some(c) = self.cnt.get_mut(&addr) {
            *c -= 1;
            self.histogram[self.bucket_of(addr)] -= 1;
            self.total -= 1;
            if *c == 0 {
                self.cnt.remove(&addr);
            }
        }
    }

    /// Smallest queued address `>= pos` on the ring; wraps to the smallest
    /// queued address if none qualifies. `None` if the queue is empty.
    pub fn next_after(&self, pos: usize) -> Option<usize> {
        self.cnt
            .range(pos..)
            .next()
            .or_else(|| self.cnt.iter().next())
            .map(|(&addr, _)| addr)
    }

    /// Up to `k` queued addresses in ring order starting at `pos`.
    pub fn next_k_after(&self, pos: usize, k: usize) -> Vec<usize> {
        if k == 0 || self.cnt.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(k.min(self.cnt.len()));
        let mut cursor = pos;
        let mut wrapped = false;
        loop {
            if out.len() >= k {
                break;
            }
            match self.cnt.range(cursor..).next() {
                Some((&addr, _)) => {
                    if wrapped && out.first() == Some(&addr) {
                        break;
                    }
                    out.push(addr);
                    cursor = addr + 1;
                }
                None => {
                    if wrapped {
                        break;
                    }
                    wrapped = true;
                    cursor = 0;
                }
            }
        }
        out
    }

    /// Address in the heaviest histogram bucket with the highest count in
    /// that bucket, ties broken by lowest address (§4.C `hot`).
    pub fn hot(&self) -> Option<(usize, u32)> {
        if self.cnt.is_empty() {
            return None;
        }
        let (bucket, _) = self
            .histogram
            .iter()
            .enumerate()
            .max_by_key(|&(i, &v)| (v, std::cmp::Reverse(i)))
            .filter(|&(_, &v)| v > 0)?;
        let start = bucket * self.bucket_width;
        let end = (start + self.bucket_width).min(self.ring);
        self.cnt
            .range(start..end)
            .max_by_key(|&(&addr, &c)| (c, std::cmp::Reverse(addr)))
            .map(|(&addr, &c)| (addr, c))
    }

    /// Moves membership and count from `a` to `b`. No-op if `a` is absent;
    /// errors if both are already present (§4.C `swap`).
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), ReadQueueError> {
        let a_present = self.cnt.contains_key(&a);
        let b_present = self.cnt.contains_key(&b);
        if !a_present {
            return Ok(());
        }
        if b_present {
            return Err(ReadQueueError::BothPresent { a, b });
        }
        let c = self.cnt.remove(&a).unwrap();
        self.histogram[self.bucket_of(a)] -= c as u64;
        self.histogram[self.bucket_of(b)] += c as u64;
        self.cnt.insert(b, c);
        Ok(())
    }
}
