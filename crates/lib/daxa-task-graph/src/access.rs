use ash::vk;
use daxa_gpu::{get_access_info, is_read_only_access, is_write_only_access, AccessType};

use crate::error::{Result, TaskGraphError};
use crate::types::{ClassifiedAccess, Concurrency};

/// Pure function mapping an access intent to `(stage_mask, access_mask,
/// concurrency)`, and additionally `(layout)` for images. Grounded on
/// `raven-rhi`'s `is_read_only_access`/`get_access_info` (here re-exported
/// from `daxa_gpu::barrier`) plus the original's
/// `task_image_access_to_layout_access`.
pub fn classify(access: AccessType) -> Result<ClassifiedAccess> {
    if matches!(access, AccessType::Nothing) {
        return Err(TaskGraphError::UnclassifiableAccess(format!("{access:?}")));
    }

    let info = get_access_info(access);
    let concurrency = if is_read_only_access(&access) {
        Concurrency::Concurrent
    } else if is_write_only_access(&access) || matches!(access, AccessType::ColorAttachmentReadWrite | AccessType::General) {
        Concurrency::Exclusive
    } else {
        Concurrency::Concurrent
    };

    Ok(ClassifiedAccess {
        access_type: access,
        stage_mask: info.stage_mask,
        access_mask: info.access_mask,
        layout: Some(info.image_layout),
        concurrency,
    })
}

/// Classifies a buffer access; buffers have no layout concept, so the
/// classified `layout` field is simply ignored by buffer-side planning code.
pub fn classify_buffer(access: AccessType) -> Result<ClassifiedAccess> {
    classify(access)
}

/// Classifies an image access, applying a caller-specified layout override
/// in place of the access type's default layout (spec.md §6:
/// `layout_override?`).
pub fn classify_image(access: AccessType, layout_override: Option<vk::ImageLayout>) -> Result<ClassifiedAccess> {
    let mut classified = classify(access)?;
    if let Some(layout) = layout_override {
        classified.layout = Some(layout);
    }
    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_accesses_are_concurrent() {
        let c = classify(AccessType::FragmentShaderReadSampledImageOrUniformTexelBuffer).unwrap();
        assert_eq!(c.concurrency, Concurrency::Concurrent);
    }

    #[test]
    fn writes_are_exclusive() {
        let c = classify(AccessType::ComputeShaderWrite).unwrap();
        assert_eq!(c.concurrency, Concurrency::Exclusive);
    }

    #[test]
    fn nothing_is_unclassifiable() {
        assert!(classify(AccessType::Nothing).is_err());
    }

    #[test]
    fn layout_override_replaces_default() {
        let c = classify_image(AccessType::ComputeShaderWrite, Some(vk::ImageLayout::GENERAL)).unwrap();
        assert_eq!(c.layout, Some(vk::ImageLayout::GENERAL));
    }
}
