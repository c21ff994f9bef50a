use crate::device::Device;
use crate::error::GpuError;
use crate::image::{ImageDesc, ImageId};

/// Minimal swapchain stand-in used by the task graph's `present()` path
/// (spec.md §6: the public API's present operation needs a swapchain image
/// id to hand back to the platform layer). Grounded on `raven-rhi`'s
/// `backend::vulkan::Swapchain`, stripped of the actual `vk::SwapchainKHR`
/// acquire/present machinery.
pub struct Swapchain {
    images: Vec<ImageId>,
    current: Option<usize>,
}

impl Swapchain {
    pub fn new(device: &Device, desc: ImageDesc, image_count: usize) -> Self {
        let images = (0..image_count).map(|_| device.create_image(desc)).collect();
        glog::trace!("swapchain created with {image_count} image(s)");
        Self { images, current: None }
    }

    pub fn acquire_next_image(&mut self) -> Result<ImageId, GpuError> {
        let next = match self.current {
            Some(i) => (i + 1) % self.images.len(),
            None => 0,
        };
        self.current = Some(next);
        Ok(self.images[next])
    }

    pub fn current_image(&self) -> Result<ImageId, GpuError> {
        self.current.map(|i| self.images[i]).ok_or(GpuError::SwapchainImageUnavailable)
    }

    pub fn present(&mut self) -> Result<(), GpuError> {
        self.current.ok_or(GpuError::SwapchainImageUnavailable)?;
        Ok(())
    }
}
