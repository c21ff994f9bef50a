//! End-to-end scenario tests driving only `daxa-task-graph`'s public API.
//! Grounded on `graal/tests/frames.rs`'s `Fixture` + helper-function style:
//! a small fixture wraps a `Device`, helpers build tasks, and assertions read
//! back the recorded commands and the textual debug dump.

use std::sync::Arc;

use ash::vk;
use daxa_gpu::{AccessType, BufferDesc, Device, ImageDesc, ImageMipArraySlice, RecordedCommand, Swapchain};
use daxa_task_graph::{
    ExecutionInfo, PersistentTaskBuffer, PersistentTaskImage, Task, TaskBuilder, TaskGraph, TaskGraphInfo, TransientBufferInfo,
    TransientImageInfo,
};

struct Fixture {
    device: Arc<Device>,
}

impl Fixture {
    fn new() -> Self {
        Self { device: Arc::new(Device::new()) }
    }

    fn graph(&self, name: &str, num_conditionals: u32) -> TaskGraph {
        TaskGraph::new(TaskGraphInfo {
            device: self.device.clone(),
            name: name.to_string(),
            staging_memory_size: 0,
            num_conditionals,
            swapchain_image_view: None,
        })
    }
}

fn noop_task(name: &str) -> TaskBuilder {
    TaskBuilder::new(name)
}

fn finish(builder: TaskBuilder) -> Task {
    builder.callback(|_| Ok(()))
}

fn barrier_commands(commands: &[RecordedCommand]) -> Vec<&RecordedCommand> {
    commands.iter().filter(|c| matches!(c, RecordedCommand::PipelineBarrier { .. })).collect()
}

fn run_task_names(commands: &[RecordedCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::RunTask { name } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

/// S1: two persistent buffers ping-ponged by two tasks across frames. The
/// first execution synchronizes against no prior state; from the second
/// frame onward the first task's barrier picks up the previous frame's
/// final access to each buffer.
#[test]
fn s1_ping_pong_resolves_cross_frame_barrier_each_frame() {
    let fx = Fixture::new();
    let buf_a = PersistentTaskBuffer::new("a");
    let buf_b = PersistentTaskBuffer::new("b");
    let a_id = fx.device.create_buffer(BufferDesc::new(1024, vk::BufferUsageFlags::STORAGE_BUFFER));
    let b_id = fx.device.create_buffer(BufferDesc::new(1024, vk::BufferUsageFlags::STORAGE_BUFFER));
    buf_a.set_runtime_buffer(a_id);
    buf_b.set_runtime_buffer(b_id);

    let mut graph = fx.graph("ping_pong", 0);
    let view_a = graph.use_persistent_buffer(&buf_a).unwrap();
    let view_b = graph.use_persistent_buffer(&buf_b).unwrap();

    graph
        .add_task(finish(
            noop_task("t1").reads_buffer(view_a, AccessType::ComputeShaderReadOther).writes_buffer(view_b, AccessType::ComputeShaderWrite),
        ))
        .unwrap();
    graph
        .add_task(finish(
            noop_task("t2").reads_buffer(view_b, AccessType::ComputeShaderReadOther).writes_buffer(view_a, AccessType::ComputeShaderWrite),
        ))
        .unwrap();
    graph.submit();
    graph.compile().unwrap();

    let frame0 = graph.execute(ExecutionInfo::default(), None).unwrap();
    assert_eq!(run_task_names(&frame0), vec!["t1", "t2"]);
    let frame0_barriers = barrier_commands(&frame0);
    assert_eq!(frame0_barriers.len(), 2, "one pipeline barrier per batch boundary");
    let RecordedCommand::PipelineBarrier { buffer_barriers, .. } = frame0_barriers[0] else { unreachable!() };
    let a_barrier = buffer_barriers.iter().find(|b| b.buffer == a_id).unwrap();
    assert!(a_barrier.src_access.is_empty(), "no prior frame to synchronize against on the very first execution");

    let frame1 = graph.execute(ExecutionInfo::default(), None).unwrap();
    let frame1_barriers = barrier_commands(&frame1);
    let RecordedCommand::PipelineBarrier { buffer_barriers, .. } = frame1_barriers[0] else { unreachable!() };
    let a_barrier = buffer_barriers.iter().find(|b| b.buffer == a_id).unwrap();
    assert!(a_barrier.src_access.contains(vk::AccessFlags::SHADER_WRITE), "picks up t2's write to `a` from the previous frame");
    let b_barrier = buffer_barriers.iter().find(|b| b.buffer == b_id).unwrap();
    assert!(b_barrier.src_access.contains(vk::AccessFlags::SHADER_READ), "picks up t2's read of `b` from the previous frame");
}

/// S2: one writer followed by three readers with identical access intent
/// must coalesce into a single barrier, and all three reads land in the
/// same batch.
#[test]
fn s2_read_fanout_coalesces_into_one_barrier() {
    let fx = Fixture::new();
    let mut graph = fx.graph("read_fanout", 0);
    let image = graph.create_transient_image(TransientImageInfo {
        name: "g".to_string(),
        desc: ImageDesc::new_2d([64, 64], vk::Format::R8G8B8A8_UNORM, vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED),
    });

    graph.add_task(finish(noop_task("writer").image_access(image, AccessType::ComputeShaderWrite, None))).unwrap();
    for name in ["reader_0", "reader_1", "reader_2"] {
        graph
            .add_task(finish(noop_task(name).image_access(image, AccessType::FragmentShaderReadSampledImageOrUniformTexelBuffer, None)))
            .unwrap();
    }
    graph.submit();
    graph.compile().unwrap();

    let commands = graph.execute(ExecutionInfo::default(), None).unwrap();
    assert_eq!(run_task_names(&commands), vec!["writer", "reader_0", "reader_1", "reader_2"]);

    let barriers = barrier_commands(&commands);
    assert_eq!(barriers.len(), 1, "writer has no predecessor, so only the write-to-read transition needs a barrier");
    let RecordedCommand::PipelineBarrier { image_barriers, .. } = barriers[0] else { unreachable!() };
    assert_eq!(image_barriers.len(), 1, "the three reads share a single coalesced barrier");
    assert!(image_barriers[0].dst_access.contains(vk::AccessFlags::SHADER_READ));
}

/// S3: two tasks touching disjoint mip ranges of the same image must not
/// serialize against each other, but a third task touching the full range
/// must synchronize against both.
#[test]
fn s3_disjoint_mip_ranges_do_not_conflict() {
    let fx = Fixture::new();
    let mut graph = fx.graph("mip_split", 0);
    let image = graph.create_transient_image(TransientImageInfo {
        name: "mips".to_string(),
        desc: ImageDesc::new_2d([128, 128], vk::Format::R8G8B8A8_UNORM, vk::ImageUsageFlags::STORAGE).mip_levels(2),
    });
    let mip0 = ImageMipArraySlice::new_mip(0, 1);
    let mip1 = ImageMipArraySlice::new_mip(1, 1);

    graph
        .add_task(finish(noop_task("write_mip0").image_access(image, AccessType::ComputeShaderWrite, Some(mip0))))
        .unwrap();
    graph
        .add_task(finish(noop_task("write_mip1").image_access(image, AccessType::ComputeShaderWrite, Some(mip1))))
        .unwrap();
    graph.add_task(finish(noop_task("read_full").image_access(image, AccessType::ComputeShaderReadOther, None))).unwrap();
    graph.submit();
    graph.compile().unwrap();

    let commands = graph.execute(ExecutionInfo::default(), None).unwrap();
    assert_eq!(
        run_task_names(&commands),
        vec!["write_mip0", "write_mip1", "read_full"],
        "disjoint writers share the first batch"
    );

    let barriers = barrier_commands(&commands);
    assert_eq!(barriers.len(), 1, "both mip writes and the two resulting sub-slice barriers land in the same batch boundary");
    let RecordedCommand::PipelineBarrier { image_barriers, .. } = barriers[0] else { unreachable!() };
    assert_eq!(image_barriers.len(), 2, "the full-range read is split into one barrier per producing mip slice");
}

/// S4: T1 writes buffer X, five unrelated tasks run in between, T7 reads X.
/// The write-to-read hazard is separated by more than one batch, so it must
/// upgrade to a split barrier (signalled on T1's batch, waited on T7's)
/// instead of a normal pipeline barrier (spec.md §8 S4).
#[test]
fn s4_distant_write_to_read_uses_split_barrier() {
    let fx = Fixture::new();
    let mut graph = fx.graph("split_barrier", 0);
    let buffer = graph.create_transient_buffer(TransientBufferInfo {
        name: "b".to_string(),
        size: 256,
        usage: vk::BufferUsageFlags::STORAGE_BUFFER,
    });
    let other_a = graph.create_transient_buffer(TransientBufferInfo { name: "x".to_string(), size: 4, usage: vk::BufferUsageFlags::STORAGE_BUFFER });
    let other_b = graph.create_transient_buffer(TransientBufferInfo { name: "y".to_string(), size: 4, usage: vk::BufferUsageFlags::STORAGE_BUFFER });

    graph.add_task(finish(noop_task("t1_writer").writes_buffer(buffer, AccessType::ComputeShaderWrite))).unwrap();
    // Two unrelated tasks chained to each other (not to `buffer`) to push the
    // reader two batches past the writer without directly conflicting with it.
    graph.add_task(finish(noop_task("unrelated_0").writes_buffer(other_a, AccessType::ComputeShaderWrite))).unwrap();
    graph
        .add_task(finish(
            noop_task("unrelated_1").reads_buffer(other_a, AccessType::ComputeShaderReadOther).writes_buffer(other_b, AccessType::ComputeShaderWrite),
        ))
        .unwrap();
    graph
        .add_task(finish(
            noop_task("t7_reader").reads_buffer(other_b, AccessType::ComputeShaderReadOther).reads_buffer(buffer, AccessType::ComputeShaderReadOther),
        ))
        .unwrap();
    graph.submit();
    graph.compile().unwrap();

    let dump = graph.debug_print();
    assert!(dump.contains("wait split-barrier"), "distance exceeds the split-barrier threshold:\n{dump}");
    assert!(dump.contains("signal split-barrier"));

    let commands = graph.execute(ExecutionInfo::default(), None).unwrap();
    let signal_count = commands.iter().filter(|c| matches!(c, RecordedCommand::SignalEvent { .. })).count();
    let wait_count = commands.iter().filter(|c| matches!(c, RecordedCommand::WaitEvents { .. })).count();
    assert_eq!(signal_count, 1);
    assert_eq!(wait_count, 1);
}

/// S5: each conditional permutation is planned independently — a task added
/// only inside `conditional(0, ..)` must not appear in the base (mask 0)
/// permutation's plan.
#[test]
fn s5_conditional_permutations_are_independent() {
    let fx = Fixture::new();
    let mut graph = fx.graph("conditional", 1);
    let buffer = graph.create_transient_buffer(TransientBufferInfo { name: "b".to_string(), size: 64, usage: vk::BufferUsageFlags::STORAGE_BUFFER });

    graph.add_task(finish(noop_task("always").writes_buffer(buffer, AccessType::ComputeShaderWrite))).unwrap();
    graph
        .conditional(0, |g| g.add_task(finish(noop_task("only_if_set").reads_buffer(buffer, AccessType::ComputeShaderReadOther))))
        .unwrap();
    graph.submit();
    graph.compile().unwrap();

    let unset = graph.execute(ExecutionInfo { permutation_condition_values: 0 }, None).unwrap();
    assert_eq!(run_task_names(&unset), vec!["always"]);

    let set = graph.execute(ExecutionInfo { permutation_condition_values: 1 }, None).unwrap();
    assert_eq!(run_task_names(&set), vec!["always", "only_if_set"]);
}

/// S6: presenting a swapchain-backed persistent image inserts an
/// undefined-to-attachment transition before the drawing task and an
/// attachment-to-present transition at the end of the scope, and actually
/// calls through to the swapchain's present.
#[test]
fn s6_swapchain_present_inserts_layout_transitions() {
    let fx = Fixture::new();
    let desc = ImageDesc::new_2d([800, 600], vk::Format::B8G8R8A8_UNORM, vk::ImageUsageFlags::COLOR_ATTACHMENT);
    let mut swapchain = Swapchain::new(&fx.device, desc, 2);

    let swapchain_image = PersistentTaskImage::new("swapchain", desc.full_slice());
    swapchain_image.set_runtime_image(swapchain.acquire_next_image().unwrap());

    let mut graph = TaskGraph::new(TaskGraphInfo {
        device: fx.device.clone(),
        name: "present".to_string(),
        staging_memory_size: 0,
        num_conditionals: 0,
        swapchain_image_view: None,
    });
    let view = graph.use_persistent_image(&swapchain_image).unwrap();
    graph.set_swapchain_image_view(view);

    graph
        .add_task(finish(noop_task("draw").image_access(view, AccessType::ColorAttachmentWrite, None)))
        .unwrap();
    graph.present().unwrap();
    graph.compile().unwrap();

    let commands = graph.execute(ExecutionInfo::default(), Some(&mut swapchain)).unwrap();
    let barriers = barrier_commands(&commands);
    assert_eq!(barriers.len(), 2, "one transition into the attachment, one into present");

    let RecordedCommand::PipelineBarrier { image_barriers, .. } = barriers[0] else { unreachable!() };
    assert_eq!(image_barriers[0].layout_before, vk::ImageLayout::UNDEFINED);
    assert_eq!(image_barriers[0].layout_after, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let RecordedCommand::PipelineBarrier { image_barriers, .. } = barriers[1] else { unreachable!() };
    assert_eq!(image_barriers[0].layout_before, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(image_barriers[0].layout_after, vk::ImageLayout::PRESENT_SRC_KHR);

    assert!(swapchain.current_image().is_ok(), "present() succeeded against the acquired image");
}
