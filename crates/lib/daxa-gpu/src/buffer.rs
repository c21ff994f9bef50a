use ash::vk;

/// Stable identity of a GPU buffer, handed out by [`crate::device::Device`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub size: usize,
    pub usage: vk::BufferUsageFlags,
}

impl BufferDesc {
    pub fn new(size: usize, usage: vk::BufferUsageFlags) -> Self {
        Self { size, usage }
    }

    pub fn usage_flags(mut self, usage: vk::BufferUsageFlags) -> Self {
        self.usage = usage;
        self
    }
}
