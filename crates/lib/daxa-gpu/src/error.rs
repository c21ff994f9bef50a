use thiserror::Error;

/// Errors surfaced by the thin GPU wrapper layer.
///
/// The task graph treats this as the "GPU-layer error" category from its
/// own error taxonomy: it passes these through unchanged.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("unknown buffer id {0:?}")]
    UnknownBuffer(crate::buffer::BufferId),
    #[error("unknown image id {0:?}")]
    UnknownImage(crate::image::ImageId),
    #[error("unknown event id {0:?}")]
    UnknownEvent(crate::event::EventId),
    #[error("swapchain has no image acquired yet")]
    SwapchainImageUnavailable,
    #[error("device out of memory")]
    OutOfMemory,
}
