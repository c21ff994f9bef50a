use ash::vk;
use daxa_gpu::{BufferBarrierInfo, CommandRecorder, Device, ImageBarrierInfo, ScratchAllocator, Swapchain};

use crate::error::Result;
use crate::persistent::{CrossFrameBufferAccess, CrossFrameImageAccess};
use crate::permutation::{BarrierSrc, Permutation, TaskBarrier};
use crate::registry::{BufferSlot, ImageSlot, Registry};
use crate::task::{Task, TaskInterface};

/// `execution_info.permutation_condition_values` is a 31-bit mask selecting
/// which compiled permutation to replay (spec.md §6).
#[derive(Clone, Copy, Default)]
pub struct ExecutionInfo {
    pub permutation_condition_values: u32,
}

/// Replays a compiled permutation into a command recorder: flushes
/// split-barrier waits, pipeline barriers, runs tasks, flushes split-barrier
/// signals, per batch (spec.md §4.5). Grounded on
/// `raven-rg/src/executing_graph.rs`'s `record_commands` and
/// `impl_task_graph.hpp`'s `execute_task`/`insert_pre_batch_barriers`.
pub(crate) fn execute(
    perm: &Permutation,
    registry: &Registry,
    tasks: &mut [Task],
    device: &Device,
    scratch: &mut ScratchAllocator,
    mut swapchain: Option<&mut Swapchain>,
) -> Result<Vec<daxa_gpu::RecordedCommand>> {
    if !perm.has_tasks {
        return Ok(Vec::new());
    }

    scratch.reset();
    let mut recorder = CommandRecorder::new();

    for scope in &perm.submit_scopes {
        for batch_idx in scope.start_batch..scope.end_batch {
            let Some(batch) = perm.batches.get(batch_idx) else { continue };

            if !batch.wait_split_barriers.is_empty() {
                let events = batch.wait_split_barriers.iter().map(|&i| perm.split_barriers[i].event).collect();
                recorder.wait_events(events, Vec::new(), Vec::new());
            }

            if !batch.pipeline_barriers.is_empty() {
                let mut buffer_barriers = Vec::new();
                let mut image_barriers = Vec::new();
                for &idx in &batch.pipeline_barriers {
                    resolve_barrier(&perm.barriers[idx], registry, &mut buffer_barriers, &mut image_barriers)?;
                }
                recorder.pipeline_barrier(buffer_barriers, image_barriers);
            }

            for &task_id in &batch.tasks {
                let task = &mut tasks[task_id];
                recorder.run_task(task.name.clone());
                let mut callback = std::mem::replace(&mut task.callback, Box::new(|_| Ok(())));
                {
                    let mut interface = TaskInterface::new(&mut recorder, device, scratch, registry, task);
                    callback(&mut interface).map_err(crate::error::TaskGraphError::Gpu)?;
                }
                tasks[task_id].callback = callback;
            }

            for &signal_idx in &batch.signal_split_barriers {
                let split = &perm.split_barriers[signal_idx];
                let mut buffer_barriers = Vec::new();
                let mut image_barriers = Vec::new();
                resolve_barrier(&split.barrier, registry, &mut buffer_barriers, &mut image_barriers)?;
                recorder.signal_event(split.event, buffer_barriers, image_barriers);
            }
        }

        if scope.present {
            match swapchain.as_deref_mut() {
                Some(swapchain) => swapchain.present().map_err(anyhow::Error::from)?,
                None => return Err(crate::error::TaskGraphError::EmptySwapchainImage),
            }
        }
    }

    write_back_cross_frame_state(perm, registry);

    Ok(recorder.into_commands())
}

fn resolve_barrier(
    barrier: &TaskBarrier,
    registry: &Registry,
    buffer_barriers: &mut Vec<BufferBarrierInfo>,
    image_barriers: &mut Vec<ImageBarrierInfo>,
) -> Result<()> {
    let (src_stage, src_access, src_layout) = resolve_barrier_src(&barrier.src, registry);

    if let Some(view) = barrier.buffer {
        let buffer = registry.resolve_buffer(view)?;
        buffer_barriers.push(BufferBarrierInfo {
            buffer,
            src_stage,
            src_access,
            dst_stage: barrier.dst_stage,
            dst_access: barrier.dst_access,
        });
    } else if let Some((view, slice)) = barrier.image {
        let image = registry.resolve_image(view)?;
        image_barriers.push(ImageBarrierInfo {
            image,
            slice,
            src_stage,
            src_access,
            dst_stage: barrier.dst_stage,
            dst_access: barrier.dst_access,
            layout_before: src_layout.unwrap_or(vk::ImageLayout::UNDEFINED),
            layout_after: barrier.layout_after.unwrap_or(vk::ImageLayout::UNDEFINED),
        });
    }

    Ok(())
}

fn resolve_barrier_src(src: &BarrierSrc, registry: &Registry) -> (vk::PipelineStageFlags, vk::AccessFlags, Option<vk::ImageLayout>) {
    match *src {
        BarrierSrc::Known { stage_mask, access_mask, layout } => (stage_mask, access_mask, layout),
        BarrierSrc::CrossFrameBuffer(view) => {
            let BufferSlot::Persistent(handle) = registry.buffer(view) else { unreachable!() };
            match handle.cross_frame_access() {
                Some(a) => (a.stage_mask, a.access_mask, None),
                None => (vk::PipelineStageFlags::TOP_OF_PIPE, vk::AccessFlags::empty(), None),
            }
        }
        BarrierSrc::CrossFrameImage(view, slice) => {
            let ImageSlot::Persistent(handle) = registry.image(view) else { unreachable!() };
            match handle.cross_frame_access_for(&slice) {
                Some(a) => (a.stage_mask, a.access_mask, Some(a.layout)),
                None => (vk::PipelineStageFlags::TOP_OF_PIPE, vk::AccessFlags::empty(), Some(vk::ImageLayout::UNDEFINED)),
            }
        }
    }
}

fn write_back_cross_frame_state(perm: &Permutation, registry: &Registry) {
    for (view, slot) in registry.buffers() {
        if let BufferSlot::Persistent(handle) = slot {
            if let Some(access) = perm.buffer_final_access(view) {
                handle.set_cross_frame_access(CrossFrameBufferAccess { stage_mask: access.stage_mask, access_mask: access.access_mask });
            }
        }
    }
    for (view, slot) in registry.images() {
        if let ImageSlot::Persistent(handle) = slot {
            for (slice, access) in perm.image_final_accesses(view) {
                handle.set_cross_frame_access(CrossFrameImageAccess {
                    slice,
                    stage_mask: access.stage_mask,
                    access_mask: access.access_mask,
                    layout: access.layout.unwrap_or(vk::ImageLayout::UNDEFINED),
                });
            }
        }
    }
}
