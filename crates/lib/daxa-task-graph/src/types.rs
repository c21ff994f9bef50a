use ash::vk;
use daxa_gpu::{AccessType, ImageMipArraySlice};

/// Stable local id for a buffer within one graph. Never reused, matching
/// spec.md §3 ("TaskBufferView... never reused").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskBufferView(pub(crate) u32);

/// Stable local id for an image within one graph, optionally narrowed to a
/// subresource slice at declaration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskImageView(pub(crate) u32);

/// CONCURRENT (read-like, coalescable) vs EXCLUSIVE (write-like) access, per
/// spec.md §4.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Concurrency {
    Concurrent,
    Exclusive,
}

/// Output of the Access Classifier: everything the planner needs to know
/// about one declared access.
#[derive(Clone, Copy, Debug)]
pub struct ClassifiedAccess {
    pub access_type: AccessType,
    pub stage_mask: vk::PipelineStageFlags,
    pub access_mask: vk::AccessFlags,
    pub layout: Option<vk::ImageLayout>,
    pub concurrency: Concurrency,
}

impl ClassifiedAccess {
    pub fn is_exclusive(&self) -> bool {
        matches!(self.concurrency, Concurrency::Exclusive)
    }
}

/// One declared attachment: a view plus the access intent it's used with.
/// For images, `slice` narrows the access to a subresource range; `None`
/// means the view's full declared slice.
#[derive(Clone, Copy, Debug)]
pub struct BufferAttachment {
    pub view: TaskBufferView,
    pub access: AccessType,
}

#[derive(Clone, Copy, Debug)]
pub struct ImageAttachment {
    pub view: TaskImageView,
    pub access: AccessType,
    pub slice: Option<ImageMipArraySlice>,
    pub layout_override: Option<vk::ImageLayout>,
}
