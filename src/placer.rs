//! Write-path disk/block selection: segment fit, then block fit, then
//! forced block fit (§4.E).

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::disk::Disk;
use crate::object::Replica;
use crate::segment::SegmentTable;

/// Errors raised by [`Placer::insert`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacerError {
    /// None of the three fallback strategies could place this replica.
    #[error("object {oid} replica {replica_index}: no fit on any disk")]
    NoFit { oid: u32, replica_index: usize },
}

/// Stateless collection of the three write-path placement strategies.
/// Holds no data of its own; every call takes the disks/segments it needs
/// to mutate, plus the caller's seeded rng.
pub struct Placer;

impl Placer {
    /// Attempts to place one replica of a `size`-block object of tag `tag`,
    /// excluding any disk already holding another replica of the same
    /// object. All three fallback strategies share one random permutation
    /// of the eligible disks, generated once per call.
    ///
    /// Returns the chosen disk and block addresses on success.
    pub fn insert(
        oid: u32,
        tag: usize,
        size: usize,
        replica_index: usize,
        excluded: &[usize],
        compact_policy: bool,
        disks: &mut [Disk],
        segments: &mut SegmentTable,
        rng: &mut impl Rng,
    ) -> Result<Replica, PlacerError> {
        let mut permuted: Vec<usize> = (0..disks.len()).filter(|d| !excluded.contains(d)).collect();
        permuted.shuffle(rng);

        if replica_index == 0 {
            if let Some(r) = Self::segment_fit(oid, tag, size, &permuted, disks, segments, rng) {
                return Ok(r);
            }
        }

        if let Some(r) = Self::block_fit(oid, size, &permuted, compact_policy, disks, segments) {
            return Ok(r);
        }
        if let Some(r) = Self::forced_block_fit(oid, size, &permuted, disks, segments) {
            return Ok(r);
        }
        Err(PlacerError::NoFit { oid, replica_index })
    }

    fn segment_fit(
        oid: u32,
        tag: usize,
        size: usize,
        order: &[usize],
        disks: &mut [Disk],
        segments: &mut SegmentTable,
        rng: &mut impl Rng,
    ) -> Option<Replica> {
        for &disk in order {
            if let Some(seg_id) = segments.find_fit(tag, disk, size, rng) {
                let seg = *segments.get(seg_id);
                let mut blocks = Vec::with_capacity(size);
                let mut from = seg.start;
                for k in 0..size as u32 {
                    let addr = disks[disk].write_from(from, oid, k).ok()?;
                    blocks.push(addr);
                    from = addr + 1;
                }
                segments.write(seg_id, size);
                return Some(Replica { disk, blocks });
            }
        }
        None
    }

    fn block_fit(
        oid: u32,
        size: usize,
        order: &[usize],
        compact_policy: bool,
        disks: &mut [Disk],
        segments: &mut SegmentTable,
    ) -> Option<Replica> {
        for &disk in order {
            let capacity = disks[disk].capacity();
            let unmanaged = segments.unmanaged_free(disk, capacity);
            let eligible = if compact_policy {
                unmanaged >= size
            } else {
                disks[disk].free_count() >= size
            };
            if !eligible {
                continue;
            }
            let start_from = if compact_policy {
                capacity - unmanaged
            } else {
                0
            };
            if let Some(blocks) = Self::write_run(oid, disk, size, start_from, disks, segments) {
                return Some(Replica { disk, blocks });
            }
        }
        None
    }

    fn forced_block_fit(
        oid: u32,
        size: usize,
        order: &[usize],
        disks: &mut [Disk],
        segments: &mut SegmentTable,
    ) -> Option<Replica> {
        for &disk in order {
            if disks[disk].free_count() < size {
                continue;
            }
            if let Some(blocks) = Self::write_run(oid, disk, size, 0, disks, segments) {
                return Some(Replica { disk, blocks });
            }
        }
        None
    }

    fn write_run(
        oid: u32,
        disk: usize,
        size: usize,
        start_from: usize,
        disks: &mut [Disk],
        segments: &mut SegmentTable,
    ) -> Option<Vec<usize>> {
        let mut blocks = Vec::with_capacity(size);
        let mut from = start_from;
        for k in 0..size as u32 {
            let addr = disks[disk].write_from(from, oid, k).ok()?;
            if let Some(seg_id) = segments.find_any_containing(disk, addr) {
                segments.write(seg_id, 1);
            }
            blocks.push(addr);
            from = addr + 1;
        }
        Some(blocks)
    }
}
