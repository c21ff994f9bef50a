use daxa_gpu::{BufferId, CommandRecorder, Device, ImageId, ImageMipArraySlice, ScratchAllocation, ScratchAllocator};

use crate::error::Result;
use crate::registry::Registry;
use crate::types::{BufferAttachment, ImageAttachment, TaskBufferView, TaskImageView};

/// One user task: a fixed attachment list (spec.md §3's `ImplTask`) and a
/// GPU command-recording callback. Task-head metadata (name, attachment
/// count) is a compile-time-sized description built by ordinary
/// constructors (spec.md §9), not macros.
pub(crate) type TaskCallback = Box<dyn FnMut(&mut TaskInterface) -> anyhow::Result<()> + Send>;

pub struct Task {
    pub(crate) name: String,
    pub(crate) buffer_attachments: Vec<BufferAttachment>,
    pub(crate) image_attachments: Vec<ImageAttachment>,
    pub(crate) callback: TaskCallback,
}

/// Builds a [`Task`] declaration. Grounded on `raven-rg/src/pass.rs`'s
/// `PassBuilder`, trimmed down: tasks are finalized explicitly via
/// [`TaskBuilder::callback`] rather than on `Drop`, since the task graph's
/// attachment list (spec.md §6) is a fixed upfront declaration, not built
/// incrementally across a render-pass lifetime.
pub struct TaskBuilder {
    name: String,
    buffer_attachments: Vec<BufferAttachment>,
    image_attachments: Vec<ImageAttachment>,
}

impl TaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), buffer_attachments: Vec::new(), image_attachments: Vec::new() }
    }

    pub fn reads_buffer(mut self, view: TaskBufferView, access: daxa_gpu::AccessType) -> Self {
        self.buffer_attachments.push(BufferAttachment { view, access });
        self
    }

    pub fn writes_buffer(mut self, view: TaskBufferView, access: daxa_gpu::AccessType) -> Self {
        self.buffer_attachments.push(BufferAttachment { view, access });
        self
    }

    pub fn image_access(mut self, view: TaskImageView, access: daxa_gpu::AccessType, slice: Option<ImageMipArraySlice>) -> Self {
        self.image_attachments.push(ImageAttachment { view, access, slice, layout_override: None });
        self
    }

    pub fn image_access_with_layout(
        mut self,
        view: TaskImageView,
        access: daxa_gpu::AccessType,
        slice: Option<ImageMipArraySlice>,
        layout_override: ash::vk::ImageLayout,
    ) -> Self {
        self.image_attachments.push(ImageAttachment { view, access, slice, layout_override: Some(layout_override) });
        self
    }

    pub fn callback(self, callback: impl FnMut(&mut TaskInterface) -> anyhow::Result<()> + Send + 'static) -> Task {
        Task {
            name: self.name,
            buffer_attachments: self.buffer_attachments,
            image_attachments: self.image_attachments,
            callback: Box::new(callback),
        }
    }
}

/// One resolved attachment, as handed back by [`TaskInterface::get`]
/// (spec.md §6).
pub struct ResolvedAttachment {
    pub buffer_ids: Vec<BufferId>,
    pub image_ids: Vec<ImageId>,
    pub view_ids: Vec<u32>,
    pub slice: Option<ImageMipArraySlice>,
}

/// Exposed to a task's callback at execution time: the active command
/// recorder, the device, scratch uniform-buffer sub-allocation, and
/// resolution from attachment index to backing GPU resource ids (spec.md
/// §6). `allocator` is grounded on the original's `TransferMemoryPool`
/// (see `daxa_gpu::ScratchAllocator`'s doc comment).
pub struct TaskInterface<'a> {
    pub recorder: &'a mut CommandRecorder,
    pub device: &'a Device,
    pub allocator: &'a mut ScratchAllocator,
    registry: &'a Registry,
    task: &'a Task,
}

impl<'a> TaskInterface<'a> {
    pub(crate) fn new(
        recorder: &'a mut CommandRecorder,
        device: &'a Device,
        allocator: &'a mut ScratchAllocator,
        registry: &'a Registry,
        task: &'a Task,
    ) -> Self {
        Self { recorder, device, allocator, registry, task }
    }

    /// Sub-allocates `size` bytes (aligned to `alignment`) from the
    /// transient scratch ring for this task's own uniform-buffer upload.
    pub fn allocate_scratch(&mut self, size: usize, alignment: usize) -> Result<ScratchAllocation> {
        self.allocator.allocate(size, alignment).map_err(|e| crate::error::TaskGraphError::Gpu(anyhow::Error::from(e)))
    }

    pub fn get_buffer(&self, attachment_index: usize) -> Result<ResolvedAttachment> {
        let attachment = &self.task.buffer_attachments[attachment_index];
        let id = self.registry.resolve_buffer(attachment.view)?;
        Ok(ResolvedAttachment { buffer_ids: vec![id], image_ids: Vec::new(), view_ids: vec![attachment.view.0], slice: None })
    }

    pub fn get_image(&self, attachment_index: usize) -> Result<ResolvedAttachment> {
        let attachment = &self.task.image_attachments[attachment_index];
        let id = self.registry.resolve_image(attachment.view)?;
        Ok(ResolvedAttachment {
            buffer_ids: Vec::new(),
            image_ids: vec![id],
            view_ids: vec![attachment.view.0],
            slice: attachment.slice,
        })
    }
}
