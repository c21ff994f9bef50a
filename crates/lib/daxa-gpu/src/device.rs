use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::buffer::{BufferDesc, BufferId};
use crate::error::GpuError;
use crate::event::EventId;
use crate::image::{ImageDesc, ImageId, ImageViewId};

/// A minimal stand-in for a real Vulkan device.
///
/// The task graph treats the GPU layer as an opaque external collaborator
/// (spec.md §1/§6): it needs stable ids, size/desc lookups for the transient
/// allocator, and a place to record commands, but never touches a real
/// `ash::Device` or `VkQueue`. Grounded on `raven-rhi`'s `backend::vulkan::Device`
/// facade in spirit (id-stamped resources behind an `Arc`), without the actual
/// driver calls.
pub struct Device {
    next_buffer_id: AtomicU64,
    next_image_id: AtomicU64,
    next_event_id: AtomicU64,

    buffers: RwLock<std::collections::HashMap<BufferId, BufferDesc>>,
    images: RwLock<std::collections::HashMap<ImageId, ImageDesc>>,
    events: RwLock<std::collections::HashSet<EventId>>,
}

impl Device {
    pub fn new() -> Self {
        Self {
            next_buffer_id: AtomicU64::new(1),
            next_image_id: AtomicU64::new(1),
            next_event_id: AtomicU64::new(1),
            buffers: RwLock::new(std::collections::HashMap::new()),
            images: RwLock::new(std::collections::HashMap::new()),
            events: RwLock::new(std::collections::HashSet::new()),
        }
    }

    pub fn create_buffer(&self, desc: BufferDesc) -> BufferId {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        self.buffers.write().insert(id, desc);
        id
    }

    pub fn destroy_buffer(&self, id: BufferId) {
        self.buffers.write().remove(&id);
    }

    pub fn buffer_desc(&self, id: BufferId) -> Result<BufferDesc, GpuError> {
        self.buffers.read().get(&id).copied().ok_or(GpuError::UnknownBuffer(id))
    }

    pub fn create_image(&self, desc: ImageDesc) -> ImageId {
        let id = ImageId(self.next_image_id.fetch_add(1, Ordering::Relaxed));
        self.images.write().insert(id, desc);
        id
    }

    pub fn destroy_image(&self, id: ImageId) {
        self.images.write().remove(&id);
    }

    pub fn image_desc(&self, id: ImageId) -> Result<ImageDesc, GpuError> {
        self.images.read().get(&id).copied().ok_or(GpuError::UnknownImage(id))
    }

    /// Returns a default full-resource view id for an image. A real device
    /// would cache per-slice views; the task graph never inspects view
    /// contents, only identity, so a single id per image suffices here.
    pub fn default_image_view(&self, id: ImageId) -> ImageViewId {
        ImageViewId(id.0)
    }

    pub fn create_event(&self) -> EventId {
        let id = EventId(self.next_event_id.fetch_add(1, Ordering::Relaxed));
        self.events.write().insert(id);
        id
    }

    pub fn destroy_event(&self, id: EventId) -> Result<(), GpuError> {
        if self.events.write().remove(&id) {
            Ok(())
        } else {
            Err(GpuError::UnknownEvent(id))
        }
    }

    /// Rough linear size estimate used by the transient allocator to size its
    /// backing memory block. Real devices ask the driver for alignment and
    /// memory-type requirements; this stub assumes a generic 256-byte image
    /// row/texel alignment, which is conservative enough for planning.
    pub fn buffer_memory_size(&self, desc: &BufferDesc) -> usize {
        desc.size
    }

    pub fn image_memory_size(&self, desc: &ImageDesc) -> usize {
        let texel_size = 4usize;
        let mut total = 0usize;
        for mip in 0..desc.mip_level_count {
            let w = (desc.extent[0] >> mip).max(1) as usize;
            let h = (desc.extent[1] >> mip).max(1) as usize;
            total += w * h * texel_size * desc.array_layer_count as usize;
        }
        total
    }

    pub fn wait_idle(&self) {}
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}
