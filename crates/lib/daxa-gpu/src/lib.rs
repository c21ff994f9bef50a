//! Thin GPU wrapper layer that the task graph treats as an opaque external
//! collaborator: stable resource ids, `vk_sync` access-type classification
//! and a command recorder, without a real `ash::Device`/`VkQueue` behind it.

pub mod barrier;
pub mod buffer;
pub mod command;
pub mod device;
pub mod error;
pub mod event;
pub mod image;
pub mod scratch;
pub mod swapchain;

pub use barrier::{get_access_info, is_read_only_access, is_write_only_access, AccessInfo, AccessType};
pub use buffer::{BufferDesc, BufferId};
pub use command::{BufferBarrierInfo, CommandRecorder, ImageBarrierInfo, RecordedCommand};
pub use device::Device;
pub use error::GpuError;
pub use event::EventId;
pub use image::{ImageDesc, ImageId, ImageMipArraySlice, ImageViewId};
pub use scratch::{ScratchAllocation, ScratchAllocator};
pub use swapchain::Swapchain;

extern crate log as glog;
