mod access;
mod conditional;
mod debug_print;
mod error;
mod execute;
mod graph;
mod permutation;
mod persistent;
mod registry;
mod task;
mod transient;
mod types;

pub use error::{TaskGraphError, MAX_CONDITIONALS};
pub use execute::ExecutionInfo;
pub use graph::{TaskGraph, TaskGraphInfo};
pub use persistent::{PersistentTaskBuffer, PersistentTaskImage};
pub use registry::{TransientBufferInfo, TransientImageInfo};
pub use task::{Task, TaskBuilder, TaskInterface};
pub use types::{BufferAttachment, ClassifiedAccess, Concurrency, ImageAttachment, TaskBufferView, TaskImageView};

extern crate log as glog;
