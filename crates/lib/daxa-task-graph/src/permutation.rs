use std::collections::HashMap;

use ash::vk;
use daxa_gpu::{EventId, ImageMipArraySlice};

use crate::registry::{BufferSlot, ImageSlot, Registry};
use crate::types::{ClassifiedAccess, TaskBufferView, TaskImageView};

pub(crate) type TaskId = usize;

#[derive(Default)]
pub(crate) struct TaskBatch {
    pub tasks: Vec<TaskId>,
    pub wait_split_barriers: Vec<usize>,
    pub signal_split_barriers: Vec<usize>,
    pub pipeline_barriers: Vec<usize>,
}

pub(crate) struct SubmitScopeRecord {
    pub start_batch: usize,
    pub end_batch: usize,
    pub present: bool,
}

/// Where the barrier's source access comes from. `CrossFrame*` marks a
/// first-use-of-persistent-resource barrier whose `src` is only known at
/// `execute()` time, from the resource's retained cross-frame state
/// (spec.md §3 invariant 6).
#[derive(Clone, Copy, Debug)]
pub(crate) enum BarrierSrc {
    Known { stage_mask: vk::PipelineStageFlags, access_mask: vk::AccessFlags, layout: Option<vk::ImageLayout> },
    CrossFrameBuffer(TaskBufferView),
    CrossFrameImage(TaskImageView, ImageMipArraySlice),
}

#[derive(Clone, Debug)]
pub(crate) struct TaskBarrier {
    pub buffer: Option<TaskBufferView>,
    pub image: Option<(TaskImageView, ImageMipArraySlice)>,
    pub src: BarrierSrc,
    pub dst_stage: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
    pub layout_after: Option<vk::ImageLayout>,
}

pub(crate) struct TaskSplitBarrier {
    pub barrier: TaskBarrier,
    pub event: EventId,
    pub signal_batch: usize,
    pub wait_batch: usize,
}

#[derive(Clone, Copy)]
struct AccessRecord {
    classified: ClassifiedAccess,
    batch: usize,
}

#[derive(Default)]
struct BufferState {
    latest: Option<AccessRecord>,
    latest_concurrent_barrier: Option<usize>,
    first_use_batch: Option<usize>,
    last_use_batch: Option<usize>,
}

struct ImageSliceState {
    slice: ImageMipArraySlice,
    latest: AccessRecord,
    latest_concurrent_barrier: Option<usize>,
}

#[derive(Default)]
struct ImageState {
    slices: Vec<ImageSliceState>,
    first_use_batch: Option<usize>,
    last_use_batch: Option<usize>,
}

/// One planning context keyed by conditional bitmask (spec.md §3's
/// `TaskGraphPermutation`). Grounded on `impl_task_graph.hpp`'s
/// `PerPermTaskBuffer`/`PerPermTaskImage`/batch arrays, and
/// `raven-rg/src/graph.rs`'s `analyze_resources` pass-ordering approach.
pub(crate) struct Permutation {
    pub mask: u32,
    pub batches: Vec<TaskBatch>,
    pub submit_scopes: Vec<SubmitScopeRecord>,
    pub barriers: Vec<TaskBarrier>,
    pub split_barriers: Vec<TaskSplitBarrier>,
    pub has_tasks: bool,

    buffer_states: HashMap<TaskBufferView, BufferState>,
    image_states: HashMap<TaskImageView, ImageState>,
    current_scope_start: usize,
}

/// Batches further apart than this must use a split barrier instead of a
/// normal pipeline barrier (spec.md §9 open question, resolved in
/// SPEC_FULL.md). Applies symmetrically regardless of which side of the
/// hazard is the read and which is the write — only a run of same-layout
/// concurrent accesses gets coalesced instead.
const SPLIT_BARRIER_DISTANCE_THRESHOLD: usize = 1;

fn conflicts(prev: &ClassifiedAccess, new: &ClassifiedAccess) -> bool {
    if prev.is_exclusive() || new.is_exclusive() {
        return true;
    }
    !layouts_match(prev, new)
}

fn layouts_match(a: &ClassifiedAccess, b: &ClassifiedAccess) -> bool {
    match (a.layout, b.layout) {
        (Some(x), Some(y)) => x == y,
        (None, None) => true,
        _ => false,
    }
}

impl Permutation {
    pub fn new(mask: u32) -> Self {
        Self {
            mask,
            batches: Vec::new(),
            submit_scopes: vec![SubmitScopeRecord { start_batch: 0, end_batch: 0, present: false }],
            barriers: Vec::new(),
            split_barriers: Vec::new(),
            has_tasks: false,
            buffer_states: HashMap::new(),
            image_states: HashMap::new(),
            current_scope_start: 0,
        }
    }

    fn batch_mut(&mut self, idx: usize) -> &mut TaskBatch {
        while self.batches.len() <= idx {
            self.batches.push(TaskBatch::default());
        }
        &mut self.batches[idx]
    }

    fn buffer_conflict_floor(&self, view: TaskBufferView, new_access: &ClassifiedAccess) -> usize {
        match self.buffer_states.get(&view).and_then(|s| s.latest) {
            Some(prev) if prev.batch >= self.current_scope_start => {
                // Never place earlier than an already-committed access to the same
                // resource, even a non-conflicting one — it may itself only be
                // synchronized against an earlier write via a barrier that a batch
                // before it wouldn't observe.
                if conflicts(&prev.classified, new_access) {
                    prev.batch + 1
                } else {
                    prev.batch
                }
            }
            _ => self.current_scope_start,
        }
    }

    fn image_conflict_floor(&self, view: TaskImageView, slice: &ImageMipArraySlice, new_access: &ClassifiedAccess) -> usize {
        let mut floor = self.current_scope_start;
        if let Some(state) = self.image_states.get(&view) {
            for es in &state.slices {
                if es.slice.intersect(slice).is_some() && es.latest.batch >= self.current_scope_start {
                    if conflicts(&es.latest.classified, new_access) {
                        floor = floor.max(es.latest.batch + 1);
                    } else {
                        floor = floor.max(es.latest.batch);
                    }
                }
            }
        }
        floor
    }

    /// Step 3 of spec.md §4.3: finds the lowest-indexed batch that can host
    /// a task given its full attachment list, without yet mutating state.
    pub fn place_task(
        &self,
        buffer_accesses: &[(TaskBufferView, ClassifiedAccess)],
        image_accesses: &[(TaskImageView, ImageMipArraySlice, ClassifiedAccess)],
    ) -> usize {
        let mut floor = self.current_scope_start;
        for (view, access) in buffer_accesses {
            floor = floor.max(self.buffer_conflict_floor(*view, access));
        }
        for (view, slice, access) in image_accesses {
            floor = floor.max(self.image_conflict_floor(*view, slice, access));
        }
        floor
    }

    /// Commits a task to `batch`, synchronizing each declared attachment
    /// against this permutation's tracked state (spec.md §4.3 steps 4-7).
    /// `task_id` is `None` for the synthetic present access synced by
    /// [`crate::graph::TaskGraph::present`] — it only needs to push a
    /// barrier, not a `RunTask` command.
    pub fn commit_task(
        &mut self,
        task_id: Option<TaskId>,
        batch: usize,
        registry: &Registry,
        event_pool: &mut dyn FnMut() -> EventId,
        buffer_accesses: &[(TaskBufferView, ClassifiedAccess)],
        image_accesses: &[(TaskImageView, ImageMipArraySlice, ClassifiedAccess)],
    ) {
        self.batch_mut(batch);
        for (view, access) in buffer_accesses {
            let is_persistent = matches!(registry.buffer(*view), BufferSlot::Persistent(_));
            self.sync_buffer(*view, *access, is_persistent, batch, event_pool);
        }
        for (view, slice, access) in image_accesses {
            let is_persistent = matches!(registry.image(*view), ImageSlot::Persistent(_));
            self.sync_image(*view, *slice, *access, is_persistent, batch, event_pool);
        }
        if let Some(task_id) = task_id {
            self.batch_mut(batch).tasks.push(task_id);
        }
        self.has_tasks = true;
    }

    fn push_barrier(&mut self, barrier: TaskBarrier, batch: usize) -> usize {
        let idx = self.barriers.len();
        self.barriers.push(barrier);
        self.batch_mut(batch).pipeline_barriers.push(idx);
        idx
    }

    fn push_split_barrier(&mut self, barrier: TaskBarrier, signal_batch: usize, wait_batch: usize, event: EventId) -> usize {
        let idx = self.split_barriers.len();
        self.split_barriers.push(TaskSplitBarrier { barrier, event, signal_batch, wait_batch });
        self.batch_mut(signal_batch).signal_split_barriers.push(idx);
        self.batch_mut(wait_batch).wait_split_barriers.push(idx);
        idx
    }

    fn extend_concurrent(&mut self, idx: usize, access: &ClassifiedAccess) {
        self.barriers[idx].dst_access |= access.access_mask;
        self.barriers[idx].dst_stage |= access.stage_mask;
    }

    #[allow(clippy::too_many_arguments)]
    fn sync_buffer(
        &mut self,
        view: TaskBufferView,
        new_access: ClassifiedAccess,
        is_persistent: bool,
        batch: usize,
        event_pool: &mut dyn FnMut() -> EventId,
    ) {
        let prev = self.buffer_states.entry(view).or_default().latest;
        let mut new_concurrent_barrier = None;

        match prev {
            None => {
                if is_persistent {
                    let idx = self.push_barrier(
                        TaskBarrier {
                            buffer: Some(view),
                            image: None,
                            src: BarrierSrc::CrossFrameBuffer(view),
                            dst_stage: new_access.stage_mask,
                            dst_access: new_access.access_mask,
                            layout_after: None,
                        },
                        batch,
                    );
                    if !new_access.is_exclusive() {
                        new_concurrent_barrier = Some(idx);
                    }
                }
                let state = self.buffer_states.get_mut(&view).unwrap();
                state.first_use_batch = Some(batch);
            }
            Some(prev) => {
                if !prev.classified.is_exclusive() && !new_access.is_exclusive() && layouts_match(&prev.classified, &new_access) {
                    let state = self.buffer_states.get(&view).unwrap();
                    if let Some(bref) = state.latest_concurrent_barrier {
                        self.extend_concurrent(bref, &new_access);
                        new_concurrent_barrier = Some(bref);
                    }
                } else if batch.saturating_sub(prev.batch) > SPLIT_BARRIER_DISTANCE_THRESHOLD {
                    let event = event_pool();
                    let barrier = TaskBarrier {
                        buffer: Some(view),
                        image: None,
                        src: BarrierSrc::Known { stage_mask: prev.classified.stage_mask, access_mask: prev.classified.access_mask, layout: None },
                        dst_stage: new_access.stage_mask,
                        dst_access: new_access.access_mask,
                        layout_after: None,
                    };
                    self.push_split_barrier(barrier, prev.batch, batch, event);
                } else {
                    let barrier = TaskBarrier {
                        buffer: Some(view),
                        image: None,
                        src: BarrierSrc::Known { stage_mask: prev.classified.stage_mask, access_mask: prev.classified.access_mask, layout: None },
                        dst_stage: new_access.stage_mask,
                        dst_access: new_access.access_mask,
                        layout_after: None,
                    };
                    let idx = self.push_barrier(barrier, batch);
                    if !new_access.is_exclusive() {
                        new_concurrent_barrier = Some(idx);
                    }
                }
            }
        }

        let state = self.buffer_states.get_mut(&view).unwrap();
        state.latest = Some(AccessRecord { classified: new_access, batch });
        state.latest_concurrent_barrier = new_concurrent_barrier;
        state.last_use_batch = Some(batch);
    }

    #[allow(clippy::too_many_arguments)]
    fn sync_image(
        &mut self,
        view: TaskImageView,
        slice: ImageMipArraySlice,
        new_access: ClassifiedAccess,
        is_persistent: bool,
        batch: usize,
        event_pool: &mut dyn FnMut() -> EventId,
    ) {
        let existing = std::mem::take(&mut self.image_states.entry(view).or_default().slices);
        let mut covered = Vec::new();
        let mut kept = Vec::new();

        for es in existing {
            let Some(overlap) = es.slice.intersect(&slice) else {
                kept.push(es);
                continue;
            };

            let barrier_ref = if !es.latest.classified.is_exclusive() && !new_access.is_exclusive() && layouts_match(&es.latest.classified, &new_access) {
                if let Some(bref) = es.latest_concurrent_barrier {
                    self.extend_concurrent(bref, &new_access);
                    Some(bref)
                } else {
                    None
                }
            } else if batch.saturating_sub(es.latest.batch) > SPLIT_BARRIER_DISTANCE_THRESHOLD {
                let event = event_pool();
                let barrier = TaskBarrier {
                    buffer: None,
                    image: Some((view, overlap)),
                    src: BarrierSrc::Known {
                        stage_mask: es.latest.classified.stage_mask,
                        access_mask: es.latest.classified.access_mask,
                        layout: es.latest.classified.layout,
                    },
                    dst_stage: new_access.stage_mask,
                    dst_access: new_access.access_mask,
                    layout_after: new_access.layout,
                };
                self.push_split_barrier(barrier, es.latest.batch, batch, event);
                None
            } else {
                let barrier = TaskBarrier {
                    buffer: None,
                    image: Some((view, overlap)),
                    src: BarrierSrc::Known {
                        stage_mask: es.latest.classified.stage_mask,
                        access_mask: es.latest.classified.access_mask,
                        layout: es.latest.classified.layout,
                    },
                    dst_stage: new_access.stage_mask,
                    dst_access: new_access.access_mask,
                    layout_after: new_access.layout,
                };
                let idx = self.push_barrier(barrier, batch);
                if !new_access.is_exclusive() {
                    Some(idx)
                } else {
                    None
                }
            };

            covered.push(overlap);

            for remainder in es.slice.subtract(&overlap) {
                kept.push(ImageSliceState { slice: remainder, latest: es.latest, latest_concurrent_barrier: es.latest_concurrent_barrier });
            }

            let _ = barrier_ref;
            kept.push(ImageSliceState {
                slice: overlap,
                latest: AccessRecord { classified: new_access, batch },
                latest_concurrent_barrier: barrier_ref,
            });
        }

        let remaining_first_use = subtract_many(slice, &covered);
        for remainder in remaining_first_use {
            if is_persistent {
                self.push_barrier(
                    TaskBarrier {
                        buffer: None,
                        image: Some((view, remainder)),
                        src: BarrierSrc::CrossFrameImage(view, remainder),
                        dst_stage: new_access.stage_mask,
                        dst_access: new_access.access_mask,
                        layout_after: new_access.layout,
                    },
                    batch,
                );
            }
            kept.push(ImageSliceState {
                slice: remainder,
                latest: AccessRecord { classified: new_access, batch },
                latest_concurrent_barrier: None,
            });
        }

        let state = self.image_states.get_mut(&view).unwrap();
        state.slices = kept;
        state.first_use_batch.get_or_insert(batch);
        state.last_use_batch = Some(batch);
    }

    /// Closes the current submit-scope (spec.md §4.3's `submit`/`present`)
    /// and opens a fresh one starting at the next batch index.
    pub fn close_scope(&mut self, present: bool) {
        let end_batch = self.batches.len();
        if let Some(scope) = self.submit_scopes.last_mut() {
            scope.end_batch = end_batch;
            scope.present = present;
        }
        self.current_scope_start = end_batch;
        self.submit_scopes.push(SubmitScopeRecord { start_batch: end_batch, end_batch, present: false });
    }

    pub fn transient_buffer_lifetime(&self, view: TaskBufferView) -> Option<(usize, usize)> {
        self.buffer_states.get(&view).and_then(|s| Some((s.first_use_batch?, s.last_use_batch?)))
    }

    pub fn transient_image_lifetime(&self, view: TaskImageView) -> Option<(usize, usize)> {
        self.image_states.get(&view).and_then(|s| Some((s.first_use_batch?, s.last_use_batch?)))
    }

    pub fn buffer_final_access(&self, view: TaskBufferView) -> Option<ClassifiedAccess> {
        self.buffer_states.get(&view).and_then(|s| s.latest).map(|r| r.classified)
    }

    pub fn image_final_accesses(&self, view: TaskImageView) -> Vec<(ImageMipArraySlice, ClassifiedAccess)> {
        self.image_states
            .get(&view)
            .map(|s| s.slices.iter().map(|es| (es.slice, es.latest.classified)).collect())
            .unwrap_or_default()
    }
}

fn subtract_many(slice: ImageMipArraySlice, others: &[ImageMipArraySlice]) -> Vec<ImageMipArraySlice> {
    let mut remaining = vec![slice];
    for other in others {
        remaining = remaining.into_iter().flat_map(|r| r.subtract(other)).collect();
    }
    remaining
}
