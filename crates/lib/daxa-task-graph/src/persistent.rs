use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ash::vk;
use parking_lot::Mutex;

use daxa_gpu::{BufferId, ImageId, ImageMipArraySlice};

// Design note (spec.md §9): "global atomics for unique-id generation...
// acceptable". One process-wide counter per resource kind, matching the
// original's `ImplPersistentTaskBuffer`/`ImplPersistentTaskImage` statics.
static NEXT_BUFFER_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_IMAGE_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug)]
pub(crate) struct CrossFrameBufferAccess {
    pub stage_mask: vk::PipelineStageFlags,
    pub access_mask: vk::AccessFlags,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CrossFrameImageAccess {
    pub slice: ImageMipArraySlice,
    pub stage_mask: vk::PipelineStageFlags,
    pub access_mask: vk::AccessFlags,
    pub layout: vk::ImageLayout,
}

pub(crate) struct PersistentBufferInner {
    id: u32,
    name: String,
    runtime: Mutex<Option<BufferId>>,
    cross_frame: Mutex<Option<CrossFrameBufferAccess>>,
}

/// An externally-owned buffer handle referenced across graph executions.
/// One handle can back multiple actual GPU buffers over time (ping-pong);
/// only its latest-access state is tracked here (spec.md §3).
#[derive(Clone)]
pub struct PersistentTaskBuffer(pub(crate) Arc<PersistentBufferInner>);

impl PersistentTaskBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        let id = NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(PersistentBufferInner {
            id,
            name: name.into(),
            runtime: Mutex::new(None),
            cross_frame: Mutex::new(None),
        }))
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Binds the actual GPU resource this handle resolves to for the next
    /// `execute()` call.
    pub fn set_runtime_buffer(&self, buffer: BufferId) {
        *self.0.runtime.lock() = Some(buffer);
    }

    pub(crate) fn runtime_buffer(&self) -> Option<BufferId> {
        *self.0.runtime.lock()
    }

    pub(crate) fn cross_frame_access(&self) -> Option<CrossFrameBufferAccess> {
        *self.0.cross_frame.lock()
    }

    pub(crate) fn set_cross_frame_access(&self, access: CrossFrameBufferAccess) {
        *self.0.cross_frame.lock() = Some(access);
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub(crate) struct PersistentImageInner {
    id: u32,
    name: String,
    full_slice: ImageMipArraySlice,
    runtime: Mutex<Option<ImageId>>,
    cross_frame: Mutex<Vec<CrossFrameImageAccess>>,
}

/// An externally-owned image handle referenced across graph executions.
/// Tracked per-slice, mirroring the buffer case but keyed by subresource
/// range (spec.md §3).
#[derive(Clone)]
pub struct PersistentTaskImage(pub(crate) Arc<PersistentImageInner>);

impl PersistentTaskImage {
    pub fn new(name: impl Into<String>, full_slice: ImageMipArraySlice) -> Self {
        let id = NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(PersistentImageInner {
            id,
            name: name.into(),
            full_slice,
            runtime: Mutex::new(None),
            cross_frame: Mutex::new(Vec::new()),
        }))
    }

    pub fn full_slice(&self) -> ImageMipArraySlice {
        self.0.full_slice
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn set_runtime_image(&self, image: ImageId) {
        *self.0.runtime.lock() = Some(image);
    }

    pub(crate) fn runtime_image(&self) -> Option<ImageId> {
        *self.0.runtime.lock()
    }

    pub(crate) fn cross_frame_access_for(&self, slice: &ImageMipArraySlice) -> Option<CrossFrameImageAccess> {
        self.0.cross_frame.lock().iter().find(|a| a.slice.contains(slice)).copied()
    }

    pub(crate) fn set_cross_frame_access(&self, access: CrossFrameImageAccess) {
        let mut guard = self.0.cross_frame.lock();
        guard.retain(|a| a.slice.intersect(&access.slice).is_none());
        guard.push(access);
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
