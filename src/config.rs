//! Tunable constants and per-run header values.
//!
//! Every field carries the workload contract's documented default, so
//! tests only need to override what they are actually exercising (e.g.
//! `FETCH = 0` for the always-jump boundary case).

/// Tag-count ceiling from the workload contract.
pub const MAX_M: usize = 16;
/// Disk-count ceiling from the workload contract.
pub const MAX_N: usize = 10;
/// Width (in steps) of an offline-hint bucket; also the compaction period.
pub const TIME_SLICE_DIVISOR: u64 = 1800;
/// Steps after which an unfulfilled read request becomes stale.
pub const STALE_WINDOW: u64 = 105;
/// Default per-head look-ahead window into the read queue.
pub const DEFAULT_FETCH: usize = 63;
/// Fallback segment capacity used when an exact allocation isn't available.
pub const SEG_DEFAULT_CAP: usize = 10;
/// Default minimum cells a head must skip to reach the furthest task in its
/// greedy tail loop (§4.F step 7).
pub const TAIL_LOOKAHEAD: usize = 12;
/// Slack between the hottest bucket's count and the head's current bucket
/// count required before a jump is forced ahead of a close task (§4.F step 2).
/// Left to the implementation by the workload contract; see DESIGN.md.
pub const DEFAULT_JUMP_THRESHOLD: u64 = 1;

/// Declining read-cost ladder, indexed 0..=7, with index 8 meaning "last op
/// was not a Read" (cost resets to the slowest rung on the next Read).
pub const COST_LADDER: [u32; 8] = [64, 52, 42, 34, 28, 23, 19, 16];

/// Number of replicas every object is written with.
pub const REPLICAS: usize = 3;

/// Per-run header values, read once at startup (§6).
#[derive(Debug, Clone, Copy)]
pub struct Header {
    /// Total number of online steps in the workload (excluding the
    /// `STALE_WINDOW`-long drain tail).
    pub t: u64,
    /// Number of object tags.
    pub m: usize,
    /// Number of physical disks.
    pub n: usize,
    /// Capacity (in blocks) of each disk.
    pub v: usize,
    /// Per-head time budget for a single step.
    pub g: u32,
    /// Per-disk swap budget for a compaction step.
    pub k: usize,
}

impl Header {
    /// Number of offline-hint buckets: `ceil(T / TIME_SLICE_DIVISOR)`.
    pub fn bucket_count(&self) -> usize {
        (self.t.saturating_sub(1) / TIME_SLICE_DIVISOR + 1) as usize
    }
}

/// Tunable engine configuration, combining the fixed constants table with
/// the per-run header.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-run header values (`T M N V G K`).
    pub header: Header,
    /// Per-head look-ahead window into the read queue.
    pub fetch: usize,
    /// Steps after which an unfulfilled read request becomes stale.
    pub stale_window: u64,
    /// Compaction period, in steps.
    pub compact_period: u64,
    /// Whether "compact policy" (tail-reservation, `V/3` budgeting) is active.
    pub use_compact: bool,
    /// Seed for the single deterministic RNG shared by the whole engine.
    pub seed: u64,
    /// Jump-forcing slack used by the head planner (§4.F step 2).
    pub jump_threshold: u64,
}

impl Config {
    /// Builds a `Config` from a parsed header, using the documented
    /// defaults for every other tunable.
    pub fn from_header(header: Header) -> Self {
        Self {
            header,
            fetch: DEFAULT_FETCH,
            stale_window: STALE_WINDOW,
            compact_period: TIME_SLICE_DIVISOR,
            use_compact: true,
            seed: 0,
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
        }
    }

    /// Effective per-tag/per-disk storage unit: `V/3` under compact policy,
    /// else `V` (§4.H step 2).
    pub fn effective_capacity(&self) -> usize {
        if self.use_compact {
            self.header.v / 3
        } else {
            self.header.v
        }
    }

    /// Number of logical heads: two per physical disk (primary + mirror).
    pub fn head_count(&self) -> usize {
        self.header.n * 2
    }
}

#[cfg(test)]
mod tests;
