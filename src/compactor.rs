//! Bounded-work per-disk defragmentation pass, run every
//! `Config::compact_period` steps (§4.I).

use thiserror::Error;

use crate::disk::Disk;
use crate::error::EngineError;
use crate::readqueue::ReadQueue;
use crate::segment::SegmentTable;
use crate::task::TaskTracker;

/// No failure mode exists today: a compaction pass either does nothing or
/// performs swaps within budget. Kept so [`crate::error::EngineError`]'s
/// `#[from]` layering is uniform across every subsystem.
#[derive(Debug, Error)]
pub enum CompactorError {}

/// One cell swap performed during a compaction pass, as emitted in the
/// step output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub disk: usize,
    pub from: usize,
    pub to: usize,
}

/// Runs one compaction pass across every disk, moving occupied cells
/// toward the front of each tag's segment and free cells toward the back,
/// within a budget of `k` swaps per disk. `primary_head`/`mirror_head` map
/// a disk index to the two logical head ids that read it.
pub fn run(
    disks: &mut [Disk],
    segments: &mut SegmentTable,
    trackers: &mut [TaskTracker],
    readqueues: &mut [ReadQueue],
    k: usize,
    num_disks: usize,
) -> Result<Vec<Swap>, EngineError> {
    let mut swaps = Vec::new();
    for disk in 0..num_disks {
        let mut budget = k;
        let primary_head = disk;
        let mirror_head = disk + num_disks;
        for tag in 0..segments.tag_count() {
            if budget == 0 {
                break;
            }
            let seg_ids: Vec<_> = segments.segments_of_tag(tag).to_vec();
            for seg_id in seg_ids {
                if budget == 0 {
                    break;
                }
                let seg = *segments.get(seg_id);
                if seg.disk != disk {
                    continue;
                }
                let mut i = seg.start;
                let mut j = seg.end().saturating_sub(1);
                while i < j && budget > 0 {
                    while i < j && !disks[disk].is_free(i) {
                        i += 1;
                    }
                    while i < j && disks[disk].is_free(j) {
                        j -= 1;
                    }
                    if i >= j {
                        break;
                    }
                    disks[disk].swap_cells(i, j);
                    segments.swap(tag, disk, j, i);
                    for tracker in trackers.iter_mut() {
                        tracker.swap(primary_head, mirror_head, j, i);
                    }
                    if primary_head < readqueues.len() {
                        readqueues[primary_head].swap(j, i)?;
                    }
                    if mirror_head < readqueues.len() {
                        readqueues[mirror_head].swap(j, i)?;
                    }
                    swaps.push(Swap { disk, from: j, to: i });
                    budget -= 1;
                    // `i` is now occupied and `j` now free; the inner skip
                    // loops above will advance past both on the next pass.
                }
            }
        }
    }
    Ok(swaps)
}
