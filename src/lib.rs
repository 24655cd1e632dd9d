//! # tagfleet
//!
//! A simulated multi-disk, replicated block-storage engine driven by a
//! time-sliced workload with offline placement hints.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Dispatcher                           │
//! │  delete → write → read-accept → evict → plan (2N heads) → emit │
//! │                              │                                  │
//! │        ┌─────────────────────┼─────────────────────┐           │
//! │        ▼                     ▼                     ▼           │
//! │   TaskTracker            Placer               HeadPlanner      │
//! │  (per object)      (SegmentTable + Disk)   (per-head DP plan)  │
//! │        │                     │                     │           │
//! │        └──────────► Disk / SegmentTable / ReadQueue ◄──────────┘│
//! │                              │                                  │
//! │                     Compactor (periodic)                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`disk`] | Ring-addressable block array with cost-aware step primitives |
//! | [`segment`] | Per-tag contiguous region bookkeeping on each disk |
//! | [`readqueue`] | Per-head outstanding-block tracking with hot-spot queries |
//! | [`task`] | Per-object bitmap-bucketed outstanding read tasks |
//! | [`object`] | Object arena and replica records |
//! | [`placer`] | Write-path replica + block placement |
//! | [`planner`] | Per-head dynamic-program operation planner |
//! | [`placement_init`] | Offline-hint-driven segment table construction |
//! | [`optimizer`] | Penalty-minimising tag/disk allocation solver |
//! | [`tsp`] | Exact traversal-order solver for per-disk tag ordering |
//! | [`compactor`] | Bounded-work defragmentation pass |
//! | [`dispatcher`] | Per-step orchestration |
//! | [`protocol`] | Line-delimited stdin/stdout wire framing |
//! | [`config`] | Tunable constants and per-run header values |
//!
//! ## Determinism
//!
//! The whole engine is single-threaded and cooperative (see [`dispatcher`]).
//! All randomised decisions — disk permutations in [`placer`], tie-breaks in
//! [`segment`], and the local search in [`optimizer`] — draw from one seeded
//! [`rand::rngs::StdRng`] owned by the [`dispatcher::Dispatcher`], so replaying
//! identical input always produces byte-identical output.

#![allow(dead_code)]

pub mod compactor;
pub mod config;
pub mod dispatcher;
pub mod disk;
pub mod error;
pub mod object;
pub mod optimizer;
pub mod placement_init;
pub mod placer;
pub mod planner;
pub mod protocol;
pub mod readqueue;
pub mod segment;
pub mod task;
pub mod tsp;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::EngineError;
