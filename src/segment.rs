//! Per-tag list of contiguous regions (segments) on each disk, with
//! per-disk occupancy counters (§4.B).

use rand::Rng;

/// A contiguous sub-range of one disk nominally reserved for one tag.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub disk: usize,
    pub start: usize,
    pub tag: usize,
    pub capacity: usize,
    pub used: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.start + self.capacity
    }

    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.start && addr < self.end()
    }

    pub fn residual(&self) -> usize {
        self.capacity - self.used
    }
}

/// Index into [`SegmentTable::segments`] identifying one segment.
pub type SegmentId = usize;

/// Per-tag, per-disk segment bookkeeping.
///
/// Segments are immutable in shape once placed at startup (§3: "Segments
/// created once at init, never destroyed, only resized internally via
/// `used`"); only the `used` counter changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct SegmentTable {
    segments: Vec<Segment>,
    /// `by_tag_disk[tag]` lists the ids of segments of that tag, grouped by
    /// disk in insertion order — this is the order PlacementInit lays them
    /// out, which the Placer's descending-affinity traversal relies on.
    by_tag: Vec<Vec<SegmentId>>,
    num_disks: usize,
}

impl SegmentTable {
    pub fn new(num_tags: usize, num_disks: usize) -> Self {
        Self {
            segments: Vec::new(),
            by_tag: vec![Vec::new(); num_tags],
            num_disks,
        }
    }

    /// Appends a new segment, returning its id. Used only during
    /// [`crate::placement_init`].
    pub fn push(&mut self, disk: usize, start: usize, tag: usize, capacity: usize) -> SegmentId {
        let id = self.segments.len();
        self.segments.push(Segment {
            disk,
            start,
            tag,
            capacity,
            used: 0,
        });
        self.by_tag[tag].push(id);
        id
    }

    pub fn get(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    /// All segment ids of a given tag, in placement order.
    pub fn segments_of_tag(&self, tag: usize) -> &[SegmentId] {
        &self.by_tag[tag]
    }

    /// Finds a segment of `tag` on `disk` with `used + size <= capacity`,
    /// tie-breaking uniformly at random among fits (§4.B). Returns `None`
    /// if no such segment exists.
    pub fn find_fit(
        &self,
        tag: usize,
        disk: usize,
        size: usize,
        rng: &mut impl Rng,
    ) -> Option<SegmentId> {
        let fits: Vec<SegmentId> = self.by_tag[tag]
            .iter()
            .copied()
            .filter(|&id| {
                let seg = &self.segments[id];
                seg.disk == disk && seg.used + size <= seg.capacity
            })
            .collect();
        if fits.is_empty() {
            return None;
        }
        Some(fits[rng.random_range(0..fits.len())])
    }

    /// Finds the segment of `tag` on `disk` containing `addr`, if any.
    pub fn find_containing(&self, tag: usize, disk: usize, addr: usize) -> Option<SegmentId> {
        self.by_tag[tag]
            .iter()
            .copied()
            .find(|&id| {
                let seg = &self.segments[id];
                seg.disk == disk && seg.contains(addr)
            })
    }

    /// Finds whichever segment (of any tag) on `disk` contains `addr`.
    pub fn find_any_containing(&self, disk: usize, addr: usize) -> Option<SegmentId> {
        self.segments
            .iter()
            .position(|seg| seg.disk == disk && seg.contains(addr))
    }

    /// Records `n` newly-occupied blocks in `seg`.
    pub fn write(&mut self, seg: SegmentId, n: usize) {
        self.segments[seg].used += n;
        debug_assert!(self.segments[seg].used <= self.segments[seg].capacity);
    }

    /// Records that the block at `addr` on `disk` belonging to `tag` was
    /// freed. No-op if `addr` is not inside a managed segment.
    pub fn delete(&mut self, tag: usize, disk: usize, addr: usize) {
        if let Some(id) = self.find_containing(tag, disk, addr) {
            debug_assert!(self.segments[id].used > 0);
            self.segments[id].used -= 1;
        }
    }

    /// Total unmanaged free space on `disk`: the capacity outside any
    /// segment (§4.E "leave the tail for fallback").
    pub fn unmanaged_free(&self, disk: usize, disk_capacity: usize) -> usize {
        let managed_end = self
            .segments
            .iter()
            .filter(|seg| seg.disk == disk)
            .map(|seg| seg.end())
            .max()
            .unwrap_or(0);
        disk_capacity.saturating_sub(managed_end)
    }

    /// `Σ capacity − Σ used` over all segments on `disk`.
    pub fn free_managed(&self, disk: usize) -> usize {
        self.segments
            .iter()
            .filter(|seg| seg.disk == disk)
            .map(|seg| seg.residual())
            .sum()
    }

    /// Moves one unit of occupancy from the segment containing `a` to the
    /// segment containing `b` (used by the compactor, which is responsible
    /// for actually swapping the underlying cell contents so that the tag
    /// invariant keeps holding).
    pub fn swap(&mut self, tag: usize, disk: usize, a: usize, b: usize) {
        if let Some(from) = self.find_containing(tag, disk, a) {
            debug_assert!(self.segments[from].used > 0);
            self.segments[from].used -= 1;
        }
        if let Some(to) = self.find_containing(tag, disk, b) {
            self.segments[to].used += 1;
            debug_assert!(self.segments[to].used <= self.segments[to].capacity);
        }
    }

    pub fn num_disks(&self) -> usize {
        self.num_disks
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }
}
