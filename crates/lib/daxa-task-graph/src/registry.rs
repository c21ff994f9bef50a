use std::collections::HashMap;

use ash::vk;
use daxa_gpu::{BufferId, ImageDesc, ImageId, ImageMipArraySlice};

use crate::error::{Result, TaskGraphError};
use crate::persistent::{PersistentTaskBuffer, PersistentTaskImage};
use crate::types::{TaskBufferView, TaskImageView};

#[derive(Clone, Debug)]
pub struct TransientBufferInfo {
    pub name: String,
    pub size: usize,
    pub usage: vk::BufferUsageFlags,
}

#[derive(Clone, Debug)]
pub struct TransientImageInfo {
    pub name: String,
    pub desc: ImageDesc,
}

/// `{Persistent(handle) | Transient(info)}`, spec.md §4.1's discriminated
/// union, specialized for buffers.
pub(crate) enum BufferSlot {
    Persistent(PersistentTaskBuffer),
    Transient(TransientBufferInfo),
}

pub(crate) enum ImageSlot {
    Persistent(PersistentTaskImage),
    Transient(TransientImageInfo),
}

/// Interns persistent and transient declarations and assigns stable views.
/// Grounded on `raven-rg/src/graph_resource.rs`'s `GraphResource` registry
/// and the original's `global_buffer_infos`/`global_image_infos` arrays.
#[derive(Default)]
pub(crate) struct Registry {
    buffers: Vec<BufferSlot>,
    images: Vec<ImageSlot>,
    persistent_buffer_views: HashMap<u32, (TaskBufferView, PersistentTaskBuffer)>,
    persistent_image_views: HashMap<u32, (TaskImageView, PersistentTaskImage)>,
    transient_buffer_bindings: HashMap<TaskBufferView, BufferId>,
    transient_image_bindings: HashMap<TaskImageView, ImageId>,
}

impl Registry {
    pub fn use_persistent_buffer(&mut self, handle: &PersistentTaskBuffer) -> Result<TaskBufferView> {
        if let Some((view, existing)) = self.persistent_buffer_views.get(&handle.id()) {
            return if existing.ptr_eq(handle) {
                Ok(*view)
            } else {
                Err(TaskGraphError::DuplicatePersistentBuffer(handle.id()))
            };
        }

        let view = TaskBufferView(self.buffers.len() as u32);
        self.buffers.push(BufferSlot::Persistent(handle.clone()));
        self.persistent_buffer_views.insert(handle.id(), (view, handle.clone()));
        Ok(view)
    }

    pub fn use_persistent_image(&mut self, handle: &PersistentTaskImage) -> Result<TaskImageView> {
        if let Some((view, existing)) = self.persistent_image_views.get(&handle.id()) {
            return if existing.ptr_eq(handle) {
                Ok(*view)
            } else {
                Err(TaskGraphError::DuplicatePersistentImage(handle.id()))
            };
        }

        let view = TaskImageView(self.images.len() as u32);
        self.images.push(ImageSlot::Persistent(handle.clone()));
        self.persistent_image_views.insert(handle.id(), (view, handle.clone()));
        Ok(view)
    }

    pub fn create_transient_buffer(&mut self, info: TransientBufferInfo) -> TaskBufferView {
        let view = TaskBufferView(self.buffers.len() as u32);
        self.buffers.push(BufferSlot::Transient(info));
        view
    }

    pub fn create_transient_image(&mut self, info: TransientImageInfo) -> TaskImageView {
        let view = TaskImageView(self.images.len() as u32);
        self.images.push(ImageSlot::Transient(info));
        view
    }

    pub fn buffer(&self, view: TaskBufferView) -> &BufferSlot {
        &self.buffers[view.0 as usize]
    }

    pub fn image(&self, view: TaskImageView) -> &ImageSlot {
        &self.images[view.0 as usize]
    }

    pub fn buffers(&self) -> impl Iterator<Item = (TaskBufferView, &BufferSlot)> {
        self.buffers.iter().enumerate().map(|(i, s)| (TaskBufferView(i as u32), s))
    }

    pub fn images(&self) -> impl Iterator<Item = (TaskImageView, &ImageSlot)> {
        self.images.iter().enumerate().map(|(i, s)| (TaskImageView(i as u32), s))
    }

    pub fn image_full_slice(&self, view: TaskImageView) -> ImageMipArraySlice {
        match self.image(view) {
            ImageSlot::Persistent(p) => p.full_slice(),
            ImageSlot::Transient(t) => t.desc.full_slice(),
        }
    }

    pub fn buffer_name(&self, view: TaskBufferView) -> String {
        match self.buffer(view) {
            BufferSlot::Persistent(p) => p.name().to_string(),
            BufferSlot::Transient(t) => t.name.clone(),
        }
    }

    pub fn image_name(&self, view: TaskImageView) -> String {
        match self.image(view) {
            ImageSlot::Persistent(p) => p.name().to_string(),
            ImageSlot::Transient(t) => t.name.clone(),
        }
    }

    /// Resolves a view to its backing GPU resource id at execution time.
    pub fn resolve_buffer(&self, view: TaskBufferView) -> Result<BufferId> {
        match self.buffer(view) {
            BufferSlot::Persistent(p) => {
                p.runtime_buffer().ok_or_else(|| TaskGraphError::UnsetPersistentResource(p.name().to_string()))
            }
            BufferSlot::Transient(t) => self
                .transient_buffer_bindings
                .get(&view)
                .copied()
                .ok_or_else(|| TaskGraphError::UnsetPersistentResource(format!("transient `{}` not yet allocated", t.name))),
        }
    }

    pub fn resolve_image(&self, view: TaskImageView) -> Result<ImageId> {
        match self.image(view) {
            ImageSlot::Persistent(p) => {
                p.runtime_image().ok_or_else(|| TaskGraphError::UnsetPersistentResource(p.name().to_string()))
            }
            ImageSlot::Transient(t) => self
                .transient_image_bindings
                .get(&view)
                .copied()
                .ok_or_else(|| TaskGraphError::UnsetPersistentResource(format!("transient `{}` not yet allocated", t.name))),
        }
    }

    /// Called once by the Transient Allocator after it creates backing
    /// resources for every transient declaration.
    pub fn bind_transient_buffer(&mut self, view: TaskBufferView, buffer_id: BufferId) {
        self.transient_buffer_bindings.insert(view, buffer_id);
    }

    pub fn bind_transient_image(&mut self, view: TaskImageView, image_id: ImageId) {
        self.transient_image_bindings.insert(view, image_id);
    }
}
