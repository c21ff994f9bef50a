use std::collections::HashMap;
use std::sync::Arc;

use daxa_gpu::{Device, EventId, ScratchAllocator, Swapchain};

use crate::access::{classify_buffer, classify_image};
use crate::conditional::ConditionalController;
use crate::debug_print::{print_permutation, print_transient_layout};
use crate::error::{Result, TaskGraphError};
use crate::execute::{self, ExecutionInfo};
use crate::permutation::Permutation;
use crate::persistent::{PersistentTaskBuffer, PersistentTaskImage};
use crate::registry::{Registry, TransientBufferInfo, TransientImageInfo};
use crate::task::Task;
use crate::transient::{self, TransientLayout};
use crate::types::{TaskBufferView, TaskImageView};

/// Configuration surface for one graph (spec.md §6). `num_conditionals`
/// fixes the reachable permutation space upfront — a simplification over
/// the original's dynamically-growing conditional set, recorded in
/// DESIGN.md.
pub struct TaskGraphInfo {
    pub device: Arc<Device>,
    pub name: String,
    pub staging_memory_size: usize,
    pub num_conditionals: u32,
    pub swapchain_image_view: Option<TaskImageView>,
}

/// Declarative frame-graph compiler and runtime: the public API surface
/// (spec.md §6). Grounded on `raven-rg/src/graph_builder.rs`'s
/// `RenderGraphBuilder`/`RenderGraph` split, collapsed into one type since
/// the task graph's record/compile/execute phases share one owner rather
/// than handing off between a builder and a compiled graph object.
pub struct TaskGraph {
    info: TaskGraphInfo,
    registry: Registry,
    tasks: Vec<Task>,
    conditionals: ConditionalController,
    permutations: HashMap<u32, Permutation>,
    event_pool: Vec<EventId>,
    transient_layout: Option<TransientLayout>,
    compiled: bool,
    chosen_permutation_last_execution: Option<u32>,
    scratch: ScratchAllocator,
}

impl TaskGraph {
    pub fn new(info: TaskGraphInfo) -> Self {
        let mut permutations = HashMap::new();
        permutations.insert(0, Permutation::new(0));
        let scratch = ScratchAllocator::new(&info.device, info.staging_memory_size);
        Self {
            info,
            registry: Registry::default(),
            tasks: Vec::new(),
            conditionals: ConditionalController::default(),
            permutations,
            event_pool: Vec::new(),
            transient_layout: None,
            compiled: false,
            chosen_permutation_last_execution: None,
            scratch,
        }
    }

    fn permutation_count(&self) -> u32 {
        1 << self.info.num_conditionals
    }

    pub fn use_persistent_buffer(&mut self, handle: &PersistentTaskBuffer) -> Result<TaskBufferView> {
        self.registry.use_persistent_buffer(handle)
    }

    pub fn use_persistent_image(&mut self, handle: &PersistentTaskImage) -> Result<TaskImageView> {
        self.registry.use_persistent_image(handle)
    }

    pub fn create_transient_buffer(&mut self, info: TransientBufferInfo) -> TaskBufferView {
        self.registry.create_transient_buffer(info)
    }

    pub fn create_transient_image(&mut self, info: TransientImageInfo) -> TaskImageView {
        self.registry.create_transient_image(info)
    }

    /// Designates (or re-designates) which view `present()` transitions to
    /// `PRESENT_SRC_KHR` at the end of every submit-scope marked present.
    /// Exists because the view handed to `present()` can only be minted by
    /// calling [`TaskGraph::use_persistent_image`] on this graph, so it is
    /// never available at [`TaskGraphInfo`] construction time.
    pub fn set_swapchain_image_view(&mut self, view: TaskImageView) {
        self.info.swapchain_image_view = Some(view);
    }

    pub fn conditional(&mut self, id: u32, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.conditionals.push(id)?;
        let result = body(self);
        self.conditionals.pop();
        result
    }

    fn active_masks(&self) -> Vec<u32> {
        (0..self.permutation_count()).filter(|mask| self.conditionals.permutation_is_active(*mask)).collect()
    }

    /// Dispatches a task to every currently-active permutation (spec.md
    /// §4.6): the task is recorded once, but independently planned against
    /// each permutation's own hazard-tracking state.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.compiled {
            glog::warn!("task graph `{}` is already compiled, add_task request denied!", self.info.name);
            return Err(TaskGraphError::AlreadyCompiled);
        }

        let mut buffer_accesses = Vec::with_capacity(task.buffer_attachments.len());
        for attachment in &task.buffer_attachments {
            buffer_accesses.push((attachment.view, classify_buffer(attachment.access)?));
        }

        let mut image_accesses = Vec::with_capacity(task.image_attachments.len());
        for attachment in &task.image_attachments {
            let slice = attachment.slice.unwrap_or_else(|| self.registry.image_full_slice(attachment.view));
            image_accesses.push((attachment.view, slice, classify_image(attachment.access, attachment.layout_override)?));
        }

        let task_id = self.tasks.len();
        self.tasks.push(task);

        for mask in self.active_masks() {
            let perm = self.permutations.entry(mask).or_insert_with(|| Permutation::new(mask));
            let batch = perm.place_task(&buffer_accesses, &image_accesses);

            let device = self.info.device.clone();
            let mut pool = self.event_pool.clone();
            let mut acquire = || -> EventId { pool.pop().unwrap_or_else(|| device.create_event()) };
            perm.commit_task(Some(task_id), batch, &self.registry, &mut acquire, &buffer_accesses, &image_accesses);
            self.event_pool = pool;
        }

        Ok(())
    }

    pub fn submit(&mut self) {
        for perm in self.permutations.values_mut() {
            perm.close_scope(false);
        }
    }

    pub fn present(&mut self) -> Result<()> {
        if let Some(view) = self.info.swapchain_image_view {
            let full_slice = self.registry.image_full_slice(view);
            let device = self.info.device.clone();
            let active_masks = self.active_masks();
            for mask in active_masks {
                let perm = self.permutations.entry(mask).or_insert_with(|| Permutation::new(mask));
                let access = classify_image(daxa_gpu::AccessType::Present, None)?;
                let batch = perm.place_task(&[], &[(view, full_slice, access)]);
                let mut pool = self.event_pool.clone();
                let mut acquire = || -> EventId { pool.pop().unwrap_or_else(|| device.create_event()) };
                perm.commit_task(None, batch, &self.registry, &mut acquire, &[], &[(view, full_slice, access)]);
                self.event_pool = pool;
            }
        }
        for perm in self.permutations.values_mut() {
            perm.close_scope(true);
        }
        Ok(())
    }

    /// Runs the Transient Allocator and marks the graph immutable (spec.md
    /// §6).
    pub fn compile(&mut self) -> Result<()> {
        if self.compiled {
            return Ok(());
        }

        let lifetimes: HashMap<TaskBufferView, (usize, usize)> = self
            .permutations
            .values()
            .flat_map(|perm| {
                self.registry
                    .buffers()
                    .filter_map(move |(view, _)| perm.transient_buffer_lifetime(view).map(|l| (view, l)))
            })
            .fold(HashMap::new(), |mut acc, (view, (first, last))| {
                let entry = acc.entry(view).or_insert((first, last));
                entry.0 = entry.0.min(first);
                entry.1 = entry.1.max(last);
                acc
            });

        let image_lifetimes: HashMap<TaskImageView, (usize, usize)> = self
            .permutations
            .values()
            .flat_map(|perm| {
                self.registry
                    .images()
                    .filter_map(move |(view, _)| perm.transient_image_lifetime(view).map(|l| (view, l)))
            })
            .fold(HashMap::new(), |mut acc, (view, (first, last))| {
                let entry = acc.entry(view).or_insert((first, last));
                entry.0 = entry.0.min(first);
                entry.1 = entry.1.max(last);
                acc
            });

        let layout = transient::allocate(
            &mut self.registry,
            &self.info.device,
            &|view| lifetimes.get(view).copied(),
            &|view| image_lifetimes.get(view).copied(),
        )?;

        glog::trace!(
            "task graph `{}` compiled: {} permutation(s), transient memory block {} bytes",
            self.info.name,
            self.permutations.len(),
            layout.memory_block_size
        );
        self.transient_layout = Some(layout);
        self.compiled = true;
        Ok(())
    }

    /// Replays the permutation matching `info.permutation_condition_values`
    /// (spec.md §4.5).
    pub fn execute(&mut self, info: ExecutionInfo, swapchain: Option<&mut Swapchain>) -> Result<Vec<daxa_gpu::RecordedCommand>> {
        if !self.compiled {
            glog::warn!("task graph `{}` is not compiled yet, execute() request denied!", self.info.name);
            return Err(TaskGraphError::NotCompiled);
        }

        let mask = info.permutation_condition_values & self.permutation_count().saturating_sub(1);
        let commands = match self.permutations.get(&mask) {
            Some(perm) => execute::execute(perm, &self.registry, &mut self.tasks, &self.info.device, &mut self.scratch, swapchain)?,
            None => Vec::new(),
        };

        self.chosen_permutation_last_execution = Some(mask);
        Ok(commands)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn chosen_permutation_last_execution(&self) -> Option<u32> {
        self.chosen_permutation_last_execution
    }

    pub fn debug_print(&self) -> String {
        let mut out = format!("task graph `{}`\n", self.info.name);
        let mut masks: Vec<_> = self.permutations.keys().copied().collect();
        masks.sort_unstable();
        for mask in masks {
            out.push_str(&print_permutation(&self.permutations[&mask], &self.registry, &self.tasks));
        }
        if let Some(layout) = &self.transient_layout {
            out.push_str(&print_transient_layout(layout, &self.registry));
        }
        out
    }
}
