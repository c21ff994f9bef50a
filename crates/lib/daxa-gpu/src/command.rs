use ash::vk;

use crate::buffer::BufferId;
use crate::event::EventId;
use crate::image::{ImageId, ImageMipArraySlice};

/// One buffer memory barrier as actually emitted, in terms of stage/access
/// masks rather than the higher-level `vk_sync::AccessType` the task graph
/// classifies attachments into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferBarrierInfo {
    pub buffer: BufferId,
    pub src_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
}

/// One image memory barrier, additionally carrying the subresource slice
/// and layout transition (spec.md §3/§4.3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageBarrierInfo {
    pub image: ImageId,
    pub slice: ImageMipArraySlice,
    pub src_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
    pub layout_before: vk::ImageLayout,
    pub layout_after: vk::ImageLayout,
}

/// A single recorded command, kept as data instead of an actual `vkCmd*` call
/// so the task graph's scheduler/emitter (spec.md §5) can be exercised and
/// asserted against in tests without a real `ash::Device`/`VkCommandBuffer`.
///
/// Grounded on `raven-rhi`'s `CommandBuffer`, trimmed from a pool-backed
/// `vk::CommandBuffer` wrapper down to the recording surface the task graph
/// actually drives.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    PipelineBarrier { buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo> },
    SignalEvent { event: EventId, buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo> },
    WaitEvents { events: Vec<EventId>, buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo> },
    RunTask { name: String },
}

/// Records commands for one batch of work. The task graph opens one of these
/// per compiled batch and hands it to the task callback along with the
/// runtime interface.
#[derive(Default)]
pub struct CommandRecorder {
    commands: Vec<RecordedCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline_barrier(&mut self, buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo>) {
        self.commands.push(RecordedCommand::PipelineBarrier { buffer_barriers, image_barriers });
    }

    pub fn signal_event(&mut self, event: EventId, buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo>) {
        self.commands.push(RecordedCommand::SignalEvent { event, buffer_barriers, image_barriers });
    }

    pub fn wait_events(&mut self, events: Vec<EventId>, buffer_barriers: Vec<BufferBarrierInfo>, image_barriers: Vec<ImageBarrierInfo>) {
        self.commands.push(RecordedCommand::WaitEvents { events, buffer_barriers, image_barriers });
    }

    pub fn run_task(&mut self, name: impl Into<String>) {
        self.commands.push(RecordedCommand::RunTask { name: name.into() });
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<RecordedCommand> {
        self.commands
    }
}
