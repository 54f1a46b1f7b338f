use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{DEPTH_FORMAT, MAX_SHADOW_CASCADES};
use crate::config::ShadowConfig;
use crate::error::ShadowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMapLayout {
    /// One square depth texture.
    Single,
    /// A depth texture array with one layer per cascade.
    Cascaded { layers: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapDescriptor {
    pub resolution: u32,
    pub layout: ShadowMapLayout,
}

impl ShadowMapDescriptor {
    pub fn from_config(config: &ShadowConfig) -> Self {
        let layout = if config.csm_enabled {
            ShadowMapLayout::Cascaded { layers: config.cascade_count.clamp(1, MAX_SHADOW_CASCADES) as u32 }
        } else {
            ShadowMapLayout::Single
        };
        Self { resolution: config.resolution, layout }
    }

    pub fn layer_count(&self) -> u32 {
        match self.layout {
            ShadowMapLayout::Single => 1,
            ShadowMapLayout::Cascaded { layers } => layers,
        }
    }
}

/// Flips once the GPU has finished every submission made before it was created.
#[derive(Debug, Clone)]
pub struct SubmissionFence {
    done: Arc<AtomicBool>,
}

impl SubmissionFence {
    pub fn completed() -> Self {
        Self { done: Arc::new(AtomicBool::new(true)) }
    }

    pub fn track(queue: &wgpu::Queue) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        queue.on_submitted_work_done(move || flag.store(true, Ordering::Release));
        Self { done }
    }

    pub fn is_complete(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl Default for SubmissionFence {
    fn default() -> Self {
        Self::completed()
    }
}

struct ShadowMapResources {
    descriptor: ShadowMapDescriptor,
    texture: wgpu::Texture,
    sampling_view: wgpu::TextureView,
    layer_views: SmallVec<[wgpu::TextureView; MAX_SHADOW_CASCADES]>,
}

struct RetiredShadowMap {
    texture: wgpu::Texture,
    fence: SubmissionFence,
}

/// Owns the shadow-map texture set. Exactly one set is live; reallocation takes the old set out
/// of service before the new one is created and destroys it once in-flight work has drained.
pub struct ShadowMapStore {
    device: wgpu::Device,
    current: Option<ShadowMapResources>,
    retired: Vec<RetiredShadowMap>,
    sampler: wgpu::Sampler,
    allocations: u64,
}

impl ShadowMapStore {
    pub fn new(device: &wgpu::Device, descriptor: ShadowMapDescriptor) -> Result<Self, ShadowError> {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 0.0,
            compare: Some(wgpu::CompareFunction::LessEqual),
            anisotropy_clamp: 1,
            border_color: None,
        });
        let mut store =
            Self { device: device.clone(), current: None, retired: Vec::new(), sampler, allocations: 0 };
        store.recreate(descriptor, &SubmissionFence::completed())?;
        Ok(store)
    }

    /// Replaces the live texture set. On failure the store is left empty, never stale.
    pub fn recreate(
        &mut self,
        descriptor: ShadowMapDescriptor,
        in_flight: &SubmissionFence,
    ) -> Result<(), ShadowError> {
        self.destroy(in_flight);
        let resources = allocate(&self.device, descriptor)?;
        self.allocations += 1;
        log::debug!(
            "[shadows] allocated {}x{} shadow map with {} layer(s) (allocation #{})",
            descriptor.resolution,
            descriptor.resolution,
            descriptor.layer_count(),
            self.allocations
        );
        self.current = Some(resources);
        Ok(())
    }

    /// Takes the live set out of service. Its GPU memory is released now if `in_flight` has
    /// completed, otherwise on a later `collect_retired` call.
    pub fn destroy(&mut self, in_flight: &SubmissionFence) {
        if let Some(old) = self.current.take() {
            drop(old.layer_views);
            drop(old.sampling_view);
            self.retired.push(RetiredShadowMap { texture: old.texture, fence: in_flight.clone() });
        }
        self.collect_retired();
    }

    /// Destroys retired textures whose last submission has finished. Returns how many were freed.
    pub fn collect_retired(&mut self) -> usize {
        let before = self.retired.len();
        self.retired.retain(|retired| {
            if retired.fence.is_complete() {
                retired.texture.destroy();
                false
            } else {
                true
            }
        });
        let freed = before - self.retired.len();
        if freed > 0 {
            log::debug!("[shadows] released {freed} retired shadow map(s)");
        }
        freed
    }

    pub fn descriptor(&self) -> Option<ShadowMapDescriptor> {
        self.current.as_ref().map(|res| res.descriptor)
    }

    pub fn resolution(&self) -> Option<u32> {
        self.descriptor().map(|desc| desc.resolution)
    }

    /// Number of successful allocations over the store's lifetime.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    pub fn pending_retirements(&self) -> usize {
        self.retired.len()
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.current.as_ref().map(|res| &res.texture)
    }

    /// View used by shading passes: `D2` in single mode, `D2Array` across every cascade otherwise.
    pub fn sampling_view(&self) -> Option<&wgpu::TextureView> {
        self.current.as_ref().map(|res| &res.sampling_view)
    }

    pub fn array_view(&self) -> Option<&wgpu::TextureView> {
        self.current.as_ref().and_then(|res| match res.descriptor.layout {
            ShadowMapLayout::Cascaded { .. } => Some(&res.sampling_view),
            ShadowMapLayout::Single => None,
        })
    }

    pub fn cascade_view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.current.as_ref().and_then(|res| match res.descriptor.layout {
            ShadowMapLayout::Cascaded { .. } => res.layer_views.get(index),
            ShadowMapLayout::Single => None,
        })
    }

    /// Depth attachment for pass `slot`; slot 0 is the whole map in single mode.
    pub fn write_view(&self, slot: usize) -> Option<&wgpu::TextureView> {
        self.current.as_ref().and_then(|res| res.layer_views.get(slot))
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

impl Drop for ShadowMapStore {
    fn drop(&mut self) {
        // wgpu keeps in-flight textures alive after the handle drops, so only settled ones
        // are destroyed explicitly here.
        self.current = None;
        self.collect_retired();
    }
}

fn allocate(device: &wgpu::Device, descriptor: ShadowMapDescriptor) -> Result<ShadowMapResources, ShadowError> {
    let limits = device.limits();
    let resolution = descriptor.resolution.max(1);
    if resolution > limits.max_texture_dimension_2d {
        return Err(ShadowError::ResolutionUnsupported {
            requested: resolution,
            limit: limits.max_texture_dimension_2d,
        });
    }
    let layers = descriptor.layer_count();
    if layers > limits.max_texture_array_layers {
        return Err(ShadowError::TooManyLayers { requested: layers, limit: limits.max_texture_array_layers });
    }

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Shadow Map"),
        size: wgpu::Extent3d { width: resolution, height: resolution, depth_or_array_layers: layers },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    if let Some(err) = validation.or(out_of_memory) {
        texture.destroy();
        return Err(ShadowError::ResourceAllocation { resolution, layers, message: err.to_string() });
    }

    let (sampling_view, layer_views) = match descriptor.layout {
        ShadowMapLayout::Single => {
            let view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Shadow Map View"),
                format: Some(DEPTH_FORMAT),
                dimension: Some(wgpu::TextureViewDimension::D2),
                aspect: wgpu::TextureAspect::DepthOnly,
                ..Default::default()
            });
            let mut layer_views = SmallVec::new();
            layer_views.push(view.clone());
            (view, layer_views)
        }
        ShadowMapLayout::Cascaded { layers } => {
            let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Shadow Map Array View"),
                format: Some(DEPTH_FORMAT),
                dimension: Some(wgpu::TextureViewDimension::D2Array),
                aspect: wgpu::TextureAspect::DepthOnly,
                base_array_layer: 0,
                array_layer_count: Some(layers),
                ..Default::default()
            });
            let layer_views = (0..layers)
                .map(|layer| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: Some("Shadow Map Cascade Layer"),
                        format: Some(DEPTH_FORMAT),
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        aspect: wgpu::TextureAspect::DepthOnly,
                        base_array_layer: layer,
                        array_layer_count: Some(1),
                        ..Default::default()
                    })
                })
                .collect();
            (array_view, layer_views)
        }
    };

    Ok(ShadowMapResources { descriptor, texture, sampling_view, layer_views })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_follows_csm_toggle() {
        let mut cfg = ShadowConfig::default();
        let single = ShadowMapDescriptor::from_config(&cfg);
        assert_eq!(single.layout, ShadowMapLayout::Single);
        assert_eq!(single.layer_count(), 1);

        cfg.set_csm_enabled(true);
        cfg.set_cascade_count(3);
        let cascaded = ShadowMapDescriptor::from_config(&cfg);
        assert_eq!(cascaded.layout, ShadowMapLayout::Cascaded { layers: 3 });
        assert_eq!(cascaded.resolution, 2048);
    }

    #[test]
    fn fence_defaults_to_completed() {
        assert!(SubmissionFence::default().is_complete());
    }
}
