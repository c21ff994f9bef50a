use ash::vk;

use crate::buffer::{BufferDesc, BufferId};
use crate::device::Device;
use crate::error::GpuError;

/// One scratch sub-allocation handed back by [`ScratchAllocator::allocate`]:
/// an offset and size into the allocator's single backing buffer.
#[derive(Clone, Copy, Debug)]
pub struct ScratchAllocation {
    pub buffer: BufferId,
    pub offset: usize,
    pub size: usize,
}

/// Transient ring allocator for per-task scratch uniform-buffer uploads
/// (spec.md §6's `allocator`), backed by a single fixed-size buffer sized by
/// `TaskGraphInfo::staging_memory_size`. Grounded on the original's
/// `daxa::TransferMemoryPool` (`impl_task_graph.hpp`'s `ImplTaskGraph`
/// carrying a `std::optional<daxa::TransferMemoryPool> staging_memory`),
/// simplified to a linear bump pointer that rewinds to the start of the
/// buffer once per `execute()` rather than tracking per-allocation
/// GPU-timeline lifetimes.
pub struct ScratchAllocator {
    buffer: BufferId,
    capacity: usize,
    cursor: usize,
}

impl ScratchAllocator {
    pub fn new(device: &Device, size: usize) -> Self {
        let buffer = device.create_buffer(BufferDesc::new(size.max(1), vk::BufferUsageFlags::UNIFORM_BUFFER));
        Self { buffer, capacity: size, cursor: 0 }
    }

    /// Rewinds the ring to the start of the buffer. Called once per
    /// `execute()` so every frame's scratch uploads reuse the same backing
    /// memory instead of growing unbounded.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn allocate(&mut self, size: usize, alignment: usize) -> Result<ScratchAllocation, GpuError> {
        let aligned = align_up(self.cursor, alignment.max(1));
        if aligned + size > self.capacity {
            return Err(GpuError::OutOfMemory);
        }
        self.cursor = aligned + size;
        Ok(ScratchAllocation { buffer: self.buffer, offset: aligned, size })
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_reset_but_not_before() {
        let device = Device::new();
        let mut scratch = ScratchAllocator::new(&device, 256);
        let a = scratch.allocate(128, 16).unwrap();
        assert_eq!(a.offset, 0);
        assert!(scratch.allocate(200, 16).is_err(), "exceeds remaining ring capacity");
        scratch.reset();
        let b = scratch.allocate(200, 16).unwrap();
        assert_eq!(b.offset, 0);
    }
}
