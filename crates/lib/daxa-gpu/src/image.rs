use ash::vk;

/// Stable identity of a GPU image, handed out by [`crate::device::Device`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageViewId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageDesc {
    pub extent: [u32; 2],
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub mip_level_count: u32,
    pub array_layer_count: u32,
}

impl ImageDesc {
    pub fn new_2d(extent: [u32; 2], format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent,
            format,
            usage,
            mip_level_count: 1,
            array_layer_count: 1,
        }
    }

    pub fn mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    pub fn usage_flags(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    pub fn full_slice(&self) -> ImageMipArraySlice {
        ImageMipArraySlice {
            base_mip_level: 0,
            mip_level_count: self.mip_level_count,
            base_array_layer: 0,
            array_layer_count: self.array_layer_count,
        }
    }
}

/// A mip/layer subresource range, used to track per-slice access state for images
/// (spec.md §3: "images store a list of currently-live slice-states").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageMipArraySlice {
    pub base_mip_level: u32,
    pub mip_level_count: u32,
    pub base_array_layer: u32,
    pub array_layer_count: u32,
}

impl ImageMipArraySlice {
    pub fn new_mip(mip_level: u32, array_layer_count: u32) -> Self {
        Self {
            base_mip_level: mip_level,
            mip_level_count: 1,
            base_array_layer: 0,
            array_layer_count,
        }
    }

    fn mip_end(&self) -> u32 {
        self.base_mip_level + self.mip_level_count
    }

    fn layer_end(&self) -> u32 {
        self.base_array_layer + self.array_layer_count
    }

    pub fn contains(&self, other: &ImageMipArraySlice) -> bool {
        self.base_mip_level <= other.base_mip_level
            && self.mip_end() >= other.mip_end()
            && self.base_array_layer <= other.base_array_layer
            && self.layer_end() >= other.layer_end()
    }

    /// Returns the overlapping sub-slice, if any.
    pub fn intersect(&self, other: &ImageMipArraySlice) -> Option<ImageMipArraySlice> {
        let mip_lo = self.base_mip_level.max(other.base_mip_level);
        let mip_hi = self.mip_end().min(other.mip_end());
        let layer_lo = self.base_array_layer.max(other.base_array_layer);
        let layer_hi = self.layer_end().min(other.layer_end());

        if mip_lo >= mip_hi || layer_lo >= layer_hi {
            return None;
        }

        Some(ImageMipArraySlice {
            base_mip_level: mip_lo,
            mip_level_count: mip_hi - mip_lo,
            base_array_layer: layer_lo,
            array_layer_count: layer_hi - layer_lo,
        })
    }

    /// Returns `self` minus `other` as 0..=2 disjoint remaining mip ranges.
    /// Layer splitting is not modeled (the task graph only needs mip-granular
    /// subtraction for its scenarios); a layer-partial overlap degrades to
    /// keeping the whole mip range, which is conservative (over-synchronizes
    /// rather than under-synchronizes).
    pub fn subtract(&self, other: &ImageMipArraySlice) -> Vec<ImageMipArraySlice> {
        let Some(overlap) = self.intersect(other) else {
            return vec![*self];
        };

        if overlap.base_array_layer > self.base_array_layer || overlap.layer_end() < self.layer_end() {
            return vec![*self];
        }

        let mut remaining = Vec::new();

        if self.base_mip_level < overlap.base_mip_level {
            remaining.push(ImageMipArraySlice {
                base_mip_level: self.base_mip_level,
                mip_level_count: overlap.base_mip_level - self.base_mip_level,
                base_array_layer: self.base_array_layer,
                array_layer_count: self.array_layer_count,
            });
        }

        if overlap.mip_end() < self.mip_end() {
            remaining.push(ImageMipArraySlice {
                base_mip_level: overlap.mip_end(),
                mip_level_count: self.mip_end() - overlap.mip_end(),
                base_array_layer: self.base_array_layer,
                array_layer_count: self.array_layer_count,
            });
        }

        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mip(base: u32, count: u32) -> ImageMipArraySlice {
        ImageMipArraySlice { base_mip_level: base, mip_level_count: count, base_array_layer: 0, array_layer_count: 1 }
    }

    #[test]
    fn intersect_disjoint_is_none() {
        assert!(mip(0, 1).intersect(&mip(1, 1)).is_none());
    }

    #[test]
    fn intersect_overlap() {
        let i = mip(0, 4).intersect(&mip(2, 4)).unwrap();
        assert_eq!(i, mip(2, 2));
    }

    #[test]
    fn subtract_middle_splits_in_two() {
        let remaining = mip(0, 4).subtract(&mip(1, 1));
        assert_eq!(remaining, vec![mip(0, 1), mip(2, 2)]);
    }

    #[test]
    fn subtract_no_overlap_keeps_whole() {
        let remaining = mip(0, 2).subtract(&mip(4, 1));
        assert_eq!(remaining, vec![mip(0, 2)]);
    }
}
