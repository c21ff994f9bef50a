use thiserror::Error;

pub const MAX_CONDITIONALS: u32 = 31;

/// The crate's public error type. Declaration, compile and execution errors
/// are distinct variants; GPU-layer errors pass through unchanged via
/// `Gpu(anyhow::Error)`.
#[derive(Error, Debug)]
pub enum TaskGraphError {
    #[error("duplicate persistent buffer registration for unique id {0}")]
    DuplicatePersistentBuffer(u32),
    #[error("duplicate persistent image registration for unique id {0}")]
    DuplicatePersistentImage(u32),
    #[error("conditional id {0} is out of range (max {max})", max = MAX_CONDITIONALS - 1)]
    ConditionalIdOutOfRange(u32),
    #[error("attachment index {0} out of bounds for task {1}")]
    AttachmentIndexOutOfBounds(usize, String),
    #[error("access intent could not be classified: {0:?}")]
    UnclassifiableAccess(String),
    #[error("empty memory type bits intersection across transient resources")]
    EmptyMemoryTypeIntersection,
    #[error("persistent resource {0} has no backing GPU resource set at execute time")]
    UnsetPersistentResource(String),
    #[error("swapchain image is unavailable at execute time")]
    EmptySwapchainImage,
    #[error("graph already compiled, recording API is no longer available")]
    AlreadyCompiled,
    #[error("graph must be compiled before execute() is called")]
    NotCompiled,
    #[error(transparent)]
    Gpu(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskGraphError>;
