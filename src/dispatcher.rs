//! Per-step orchestration: owns every piece of mutable state and drives
//! the fixed delete → write → read-accept → evict → plan → emit →
//! (periodic) compact phase order (§4.G).

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compactor;
use crate::config::{Config, REPLICAS, TAIL_LOOKAHEAD};
use crate::disk::{Disk, HeadCursor};
use crate::error::EngineError;
use crate::object::ObjectPool;
use crate::placement_init::{self, HintTables};
use crate::placer::Placer;
use crate::planner::HeadPlanner;
use crate::protocol::{NewObjectPlacement, StepInput, StepOutput};
use crate::readqueue::ReadQueue;
use crate::segment::SegmentTable;
use crate::task::{Task, TaskTracker};

/// One still-outstanding read request, held in chronological order so
/// staleness eviction can pop from the front (§4.G).
struct PendingTask {
    request_id: u32,
    object_id: u32,
    created_at: u64,
}

/// The whole engine: disks, segment layout, per-head queues and cursors,
/// per-object task trackers, and the single seeded rng every randomised
/// decision draws from.
pub struct Dispatcher {
    config: Config,
    rng: StdRng,
    disks: Vec<Disk>,
    heads: Vec<HeadCursor>,
    readqueues: Vec<ReadQueue>,
    segments: SegmentTable,
    objects: ObjectPool,
    trackers: Vec<TaskTracker>,
    pending: VecDeque<PendingTask>,
    step: u64,
}

impl Dispatcher {
    /// Builds a new engine from the parsed header and offline hint tables,
    /// running startup placement construction once.
    pub fn new(config: Config, hints: &HintTables) -> Result<Self, EngineError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let header = config.header;
        let segments = placement_init::build(
            hints,
            header.m,
            header.n,
            config.effective_capacity(),
            &mut rng,
        )?;

        let disks = (0..header.n).map(|_| Disk::new(header.v)).collect();
        let heads = vec![HeadCursor::new(); config.head_count()];
        let readqueues = (0..config.head_count())
            .map(|_| ReadQueue::new(header.v, header.v))
            .collect();

        Ok(Self {
            config,
            rng,
            disks,
            heads,
            readqueues,
            segments,
            objects: ObjectPool::new(),
            trackers: Vec::new(),
            pending: VecDeque::new(),
            step: 0,
        })
    }

    /// Total number of online steps, including the `STALE_WINDOW`-long
    /// drain tail (§4.G / §6).
    pub fn total_steps(&self) -> u64 {
        self.config.header.t + self.config.stale_window
    }

    fn primary_head(&self, disk: usize) -> usize {
        disk
    }

    fn mirror_head(&self, disk: usize) -> usize {
        disk + self.config.header.n
    }

    fn disk_of_head(&self, head: usize) -> usize {
        if head < self.config.header.n {
            head
        } else {
            head - self.config.header.n
        }
    }

    /// Runs one full step: deletes, writes, read acceptance, staleness
    /// eviction, per-head planning, and (on a compaction boundary) a
    /// compaction pass.
    pub fn step(&mut self, input: StepInput) -> Result<StepOutput, EngineError> {
        self.step = input.timestamp;
        let mut out = StepOutput::default();

        for oid in &input.deletes {
            self.apply_delete(*oid, &mut out);
        }

        for &(oid, size, tag) in &input.writes {
            self.apply_write(oid, size, tag, &mut out)?;
        }

        for &(request_id, oid) in &input.reads {
            self.accept_read(request_id, oid);
        }

        self.evict_stale(&mut out);

        for head in 0..self.heads.len() {
            let ops = self.plan_head(head);
            self.execute_head(head, &ops, &mut out);
        }

        if self.step > 0 && self.step % self.config.compact_period == 0 {
            let swaps = compactor::run(
                &mut self.disks,
                &mut self.segments,
                &mut self.trackers,
                &mut self.readqueues,
                self.config.header.k,
                self.config.header.n,
            )?;
            let mut per_disk = vec![Vec::new(); self.config.header.n];
            for s in swaps {
                per_disk[s.disk].push((s.from, s.to));
            }
            out.compaction = Some(per_disk);
        }

        Ok(out)
    }

    fn apply_write(
        &mut self,
        oid: u32,
        size: usize,
        tag: usize,
        out: &mut StepOutput,
    ) -> Result<(), EngineError> {
        let real_oid = self.objects.insert(tag, size);
        debug_assert_eq!(real_oid, oid, "objects must be created in id order");

        let mut excluded = Vec::with_capacity(REPLICAS);
        let mut placed = Vec::with_capacity(REPLICAS);
        for replica_index in 0..REPLICAS {
            let replica = Placer::insert(
                oid,
                tag,
                size,
                replica_index,
                &excluded,
                self.config.use_compact,
                &mut self.disks,
                &mut self.segments,
                &mut self.rng,
            )?;
            excluded.push(replica.disk);
            placed.push(replica);
        }

        let object = self.objects.get_mut(oid);
        for (slot, replica) in object.replicas.iter_mut().zip(placed.iter()) {
            *slot = replica.clone();
        }

        debug_assert_eq!(self.trackers.len() as u32, oid);
        self.trackers.push(TaskTracker::new(size));

        out.new_objects.push(NewObjectPlacement {
            object_id: oid,
            replicas: [
                (placed[0].disk, placed[0].blocks.clone()),
                (placed[1].disk, placed[1].blocks.clone()),
                (placed[2].disk, placed[2].blocks.clone()),
            ],
        });
        Ok(())
    }

    fn apply_delete(&mut self, oid: u32, out: &mut StepOutput) {
        if !self.objects.is_valid(oid) {
            return;
        }
        self.objects.invalidate(oid);
        let tag = self.objects.get(oid).tag;
        let replicas = self.objects.get(oid).replicas.clone();
        for replica in &replicas {
            let disk = replica.disk;
            for &addr in &replica.blocks {
                self.disks[disk].delete(addr);
                self.segments.delete(tag, disk, addr);
                self.readqueues[self.primary_head(disk)].remove_all(addr);
                self.readqueues[self.mirror_head(disk)].remove_all(addr);
            }
        }
        for task in self.trackers[oid as usize].clear() {
            out.cancelled_deletes.push(task.request_id);
        }
    }

    fn accept_read(&mut self, request_id: u32, oid: u32) {
        if !self.objects.is_valid(oid) {
            return; // unknown / already-deleted object: silently ignored
        }
        let object = self.objects.get(oid);
        let size = object.size;
        let replicas = object.replicas.clone();

        let mut outstanding = Vec::with_capacity(REPLICAS * size);
        for k in 0..size {
            for replica in &replicas {
                let addr = replica.blocks[k];
                let head = self.primary_head(replica.disk);
                self.readqueues[head].push(addr);
                outstanding.push((head, addr));
            }
        }
        self.trackers[oid as usize].insert(Task {
            request_id,
            object_id: oid,
            created_at: self.step,
            outstanding,
        });
        self.pending.push_back(PendingTask {
            request_id,
            object_id: oid,
            created_at: self.step,
        });
    }

    fn evict_stale(&mut self, out: &mut StepOutput) {
        while let Some(front) = self.pending.front() {
            if front.created_at + self.config.stale_window > self.step {
                break;
            }
            let pending = self.pending.pop_front().unwrap();
            if !self.objects.is_valid(pending.object_id) {
                continue;
            }
            if let Some(task) = self.trackers[pending.object_id as usize].take(pending.request_id)
            {
                for (head, addr) in &task.outstanding {
                    self.readqueues[*head].remove_one(*addr);
                }
                out.stale_busy.push(task.request_id);
            }
        }
    }

    fn plan_head(&self, head: usize) -> Vec<crate::planner::PlanOp> {
        let disk_idx = self.disk_of_head(head);
        let capacity = self.disks[disk_idx].capacity();
        let cursor = self.heads[head];
        HeadPlanner::plan(
            cursor.pos,
            cursor.prev,
            self.config.header.g,
            &self.readqueues[head],
            capacity,
            self.config.fetch,
            self.config.jump_threshold,
            TAIL_LOOKAHEAD,
        )
    }

    fn execute_head(&mut self, head: usize, ops: &[crate::planner::PlanOp], out: &mut StepOutput) {
        use crate::planner::PlanOp;

        let disk_idx = self.disk_of_head(head);
        let capacity = self.disks[disk_idx].capacity();
        let mut budget = self.config.header.g;
        for op in ops {
            match op {
                PlanOp::Read { addr } => {
                    self.heads[head].step_read(&mut budget, capacity);
                    self.on_read(head, *addr, out);
                }
                PlanOp::Pass => {
                    self.heads[head].step_pass(&mut budget, capacity);
                }
                PlanOp::Jump { addr } => {
                    self.heads[head].jump(&mut budget, *addr);
                }
            }
        }
        out.head_ops.push(ops.to_vec());
    }

    /// Called once per actual Read op. Looks up what is stored at `addr` on
    /// the head's disk; if it is a live block, retires that block index
    /// across every replica's queue entry and drains any task this
    /// completes.
    fn on_read(&mut self, head: usize, addr: usize, out: &mut StepOutput) {
        let disk_idx = self.disk_of_head(head);
        let Some(cell) = self.disks[disk_idx].cell(addr) else {
            return;
        };
        if !self.objects.is_valid(cell.object_id) {
            return;
        }
        let k = cell.block_index as usize;
        let object = self.objects.get(cell.object_id);
        for replica in &object.replicas {
            if let Some(&block_addr) = replica.blocks.get(k) {
                let h = self.primary_head(replica.disk);
                self.readqueues[h].remove_all(block_addr);
            }
        }
        let completed = self.trackers[cell.object_id as usize].update(cell.block_index);
        for task in completed {
            out.completed.push(task.request_id);
        }
    }
}
