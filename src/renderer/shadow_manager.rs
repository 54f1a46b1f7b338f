use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use super::cascade_splits::{compute_cascade_splits, CascadeSplits};
use super::csm_uniform::{CsmUniform, ShadowPassSlots, ShadowPassUniform, CSM_UNIFORM_SIZE};
use super::light_matrix::{
    build_cascade_light_matrix, build_single_light_matrix, ground_anchor, sanitize_light_direction,
    CascadeData,
};
use super::shadow_caster::{record_shadow_casters, ShadowCaster, ShadowCasterStats, ShadowPassInfo};
use super::shadow_store::{ShadowMapDescriptor, ShadowMapLayout, ShadowMapStore, SubmissionFence};
use super::MAX_SHADOW_CASCADES;
use crate::config::ShadowConfig;
use crate::error::ShadowError;

pub const DEFAULT_CAMERA_NEAR: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// No shadow map exists yet (or the last allocation failed).
    Uninitialized,
    Ready,
    /// Only observable from inside a setter.
    Reallocating,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMatrixParams {
    /// Unit vector from the scene toward the light.
    pub light_direction: Vec3,
    pub camera_position: Vec3,
    pub camera_forward: Option<Vec3>,
    pub camera_near_plane: Option<f32>,
    /// Defaults to the shadow radius.
    pub camera_far_plane: Option<f32>,
}

impl LightMatrixParams {
    pub fn new(light_direction: Vec3, camera_position: Vec3) -> Self {
        Self {
            light_direction,
            camera_position,
            camera_forward: None,
            camera_near_plane: None,
            camera_far_plane: None,
        }
    }

    pub fn with_camera_forward(mut self, forward: Vec3) -> Self {
        self.camera_forward = Some(forward);
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.camera_near_plane = Some(near);
        self.camera_far_plane = Some(far);
        self
    }
}

/// What a light matrix update produced, so consumers never infer the mode from hidden state.
#[derive(Debug, Clone, PartialEq)]
pub enum LightMatrixUpdate {
    Single(Mat4),
    Cascaded(SmallVec<[CascadeData; MAX_SHADOW_CASCADES]>),
}

impl LightMatrixUpdate {
    pub fn pass_count(&self) -> usize {
        match self {
            LightMatrixUpdate::Single(_) => 1,
            LightMatrixUpdate::Cascaded(cascades) => cascades.len(),
        }
    }
}

struct ShadowGpu {
    queue: wgpu::Queue,
    device: wgpu::Device,
    store: ShadowMapStore,
    pass_slots: ShadowPassSlots,
    csm_buffer: wgpu::Buffer,
    sample_layout: wgpu::BindGroupLayout,
    sample_bind_group: Option<wgpu::BindGroup>,
}

impl ShadowGpu {
    fn rebuild_sampling(&mut self) {
        let dimension = match self.store.descriptor().map(|desc| desc.layout) {
            Some(ShadowMapLayout::Cascaded { .. }) => wgpu::TextureViewDimension::D2Array,
            _ => wgpu::TextureViewDimension::D2,
        };
        self.sample_layout = create_sample_layout(&self.device, dimension);
        self.sample_bind_group = self.store.sampling_view().map(|view| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Shadow Sample BG"),
                layout: &self.sample_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: self.csm_buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(view) },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(self.store.sampler()),
                    },
                ],
            })
        });
    }
}

/// Owns shadow configuration, per-frame cascade data and the shadow-map resources.
///
/// Call `update_light_matrix` once per frame before `record_shadow_pass`, and
/// `on_frame_submitted` after the frame's command buffer has been submitted.
pub struct ShadowMapManager {
    config: ShadowConfig,
    state: ManagerState,
    gpu: Option<ShadowGpu>,
    light_space_matrix: Mat4,
    light_position: Vec3,
    cascades: SmallVec<[CascadeData; MAX_SHADOW_CASCADES]>,
    passes: SmallVec<[ShadowPassInfo; MAX_SHADOW_CASCADES]>,
    pass_uniforms: SmallVec<[ShadowPassUniform; MAX_SHADOW_CASCADES]>,
    packed: CsmUniform,
    last_submission: SubmissionFence,
}

impl ShadowMapManager {
    /// A manager with no GPU resources. Math and configuration work; GPU work is skipped.
    pub fn uninitialized(config: ShadowConfig) -> Self {
        Self {
            config: config.clamped(),
            state: ManagerState::Uninitialized,
            gpu: None,
            light_space_matrix: Mat4::IDENTITY,
            light_position: Vec3::ZERO,
            cascades: SmallVec::new(),
            passes: SmallVec::new(),
            pass_uniforms: SmallVec::new(),
            packed: CsmUniform::default(),
            last_submission: SubmissionFence::completed(),
        }
    }

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: ShadowConfig) -> Result<Self, ShadowError> {
        let mut manager = Self::uninitialized(config);
        manager.initialize(device, queue)?;
        Ok(manager)
    }

    /// Creates the GPU resources on `device`. Per-frame pass records from before this call are
    /// discarded, so `update_light_matrix` must run again before a pass can be recorded.
    ///
    /// On a manager that already owns resources the arguments are ignored and only the store is
    /// brought in line with the current config; call `release_gpu_resources` first to move the
    /// manager to another device.
    pub fn initialize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<(), ShadowError> {
        if self.gpu.is_some() {
            log::debug!("[shadows] initialize on a live manager; keeping the existing device");
            return self.reallocate();
        }
        self.clear_frame();
        let store = ShadowMapStore::new(device, ShadowMapDescriptor::from_config(&self.config))?;
        let csm_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CSM Uniform Buffer"),
            size: CSM_UNIFORM_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut gpu = ShadowGpu {
            queue: queue.clone(),
            device: device.clone(),
            store,
            pass_slots: ShadowPassSlots::new(device),
            csm_buffer,
            sample_layout: create_sample_layout(device, wgpu::TextureViewDimension::D2),
            sample_bind_group: None,
        };
        gpu.rebuild_sampling();
        self.gpu = Some(gpu);
        self.state = ManagerState::Ready;
        self.upload();
        Ok(())
    }

    /// Drops every GPU resource; the manager returns to `Uninitialized`.
    pub fn release_gpu_resources(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            gpu.store.destroy(&self.last_submission);
        }
        self.clear_frame();
        self.state = ManagerState::Uninitialized;
    }

    fn clear_frame(&mut self) {
        self.cascades.clear();
        self.passes.clear();
        self.pass_uniforms.clear();
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn config(&self) -> ShadowConfig {
        self.config.clone()
    }

    pub fn set_resolution(&mut self, resolution: u32) -> Result<(), ShadowError> {
        self.config.set_resolution(resolution);
        self.reallocate()
    }

    pub fn set_csm_enabled(&mut self, enabled: bool) -> Result<(), ShadowError> {
        self.config.set_csm_enabled(enabled);
        self.reallocate()
    }

    pub fn set_cascade_count(&mut self, count: usize) -> Result<(), ShadowError> {
        self.config.set_cascade_count(count);
        self.reallocate()
    }

    pub fn set_shadow_radius(&mut self, radius: f32) {
        self.config.set_shadow_radius(radius);
    }

    pub fn set_depth_bias(&mut self, bias: i32) {
        self.config.set_depth_bias(bias);
    }

    pub fn set_normal_bias(&mut self, bias: f32) {
        self.config.set_normal_bias(bias);
    }

    pub fn set_soft_shadows(&mut self, enabled: bool) {
        self.config.set_soft_shadows(enabled);
    }

    pub fn set_pcf_kernel_size(&mut self, size: u32) {
        self.config.set_pcf_kernel_size(size);
    }

    pub fn set_forward_offset(&mut self, offset: f32) {
        self.config.set_forward_offset(offset);
    }

    pub fn set_cascade_split_lambda(&mut self, lambda: f32) {
        self.config.set_cascade_split_lambda(lambda);
    }

    pub fn set_cascade_blend_fraction(&mut self, fraction: f32) {
        self.config.set_cascade_blend_fraction(fraction);
    }

    /// Replaces the whole configuration with at most one reallocation.
    pub fn apply_config(&mut self, config: &ShadowConfig) -> Result<(), ShadowError> {
        self.config = config.clamped();
        self.reallocate()
    }

    fn reallocate(&mut self) -> Result<(), ShadowError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        gpu.store.collect_retired();
        let descriptor = ShadowMapDescriptor::from_config(&self.config);
        if gpu.store.descriptor() == Some(descriptor) {
            return Ok(());
        }
        self.state = ManagerState::Reallocating;
        self.cascades.clear();
        self.passes.clear();
        self.pass_uniforms.clear();
        if gpu.store.pending_retirements() > 0 {
            log::debug!(
                "[shadows] {} retired shadow map(s) still waiting on the GPU",
                gpu.store.pending_retirements()
            );
        }
        if let Err(err) = gpu.store.recreate(descriptor, &self.last_submission) {
            gpu.sample_bind_group = None;
            self.state = ManagerState::Uninitialized;
            return Err(err);
        }
        gpu.rebuild_sampling();
        self.state = ManagerState::Ready;
        Ok(())
    }

    /// Recomputes the light matrices for this frame and uploads them.
    ///
    /// With CSM enabled every active cascade is rebuilt and the packed block is refreshed;
    /// otherwise the single map's matrix is. Per-pass uniforms for every slot are written
    /// here, before any pass of the frame is recorded.
    pub fn update_light_matrix(&mut self, params: &LightMatrixParams) -> LightMatrixUpdate {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.store.collect_retired();
        }
        let cfg = self.config.clone();
        let light_dir = sanitize_light_direction(params.light_direction);
        let anchor =
            ground_anchor(params.camera_position, params.camera_forward, cfg.forward_offset, cfg.shadow_radius);
        let near = params.camera_near_plane.unwrap_or(DEFAULT_CAMERA_NEAR);
        let far = params.camera_far_plane.unwrap_or(cfg.shadow_radius);

        self.clear_frame();
        let mut uniforms: SmallVec<[ShadowPassUniform; MAX_SHADOW_CASCADES]> = SmallVec::new();

        let update = if cfg.csm_enabled {
            let splits: CascadeSplits =
                compute_cascade_splits(near, far, cfg.cascade_count, cfg.cascade_split_lambda);
            for (idx, split) in splits.iter().enumerate() {
                let light = build_cascade_light_matrix(light_dir, anchor, cfg.shadow_radius, splits.len(), idx);
                self.cascades.push(CascadeData {
                    light_space_matrix: light.light_space_matrix,
                    split_distance: *split,
                    radius: light.radius,
                });
                uniforms.push(ShadowPassUniform::new(light.light_space_matrix, light.light_position));
                if idx == 0 {
                    self.light_space_matrix = light.light_space_matrix;
                    self.light_position = light.light_position;
                }
            }
            self.packed = CsmUniform::pack(&self.cascades, true, cfg.cascade_blend_fraction);
            LightMatrixUpdate::Cascaded(self.cascades.clone())
        } else {
            let light = build_single_light_matrix(light_dir, anchor, cfg.shadow_radius);
            self.light_space_matrix = light.light_space_matrix;
            self.light_position = light.light_position;
            uniforms.push(ShadowPassUniform::new(light.light_space_matrix, light.light_position));
            let single = CascadeData {
                light_space_matrix: light.light_space_matrix,
                split_distance: far.max(near),
                radius: light.radius,
            };
            self.packed = CsmUniform::pack(&[single], false, cfg.cascade_blend_fraction);
            LightMatrixUpdate::Single(light.light_space_matrix)
        };

        for (slot, uniform) in uniforms.iter().enumerate() {
            self.passes.push(ShadowPassInfo {
                light_space_matrix: Mat4::from_cols_array_2d(&uniform.light_space_matrix),
                light_position: Vec3::from_slice(&uniform.light_position[..3]),
                slot,
                dynamic_offset: self.gpu.as_ref().map(|gpu| gpu.pass_slots.offset(slot)).unwrap_or(0),
            });
        }
        if let Some(gpu) = self.gpu.as_ref().filter(|_| self.state == ManagerState::Ready) {
            gpu.pass_slots.write_all(&gpu.queue, &uniforms);
            self.pass_uniforms = uniforms;
        }
        self.upload();
        update
    }

    fn upload(&self) {
        match self.gpu.as_ref() {
            Some(gpu) if self.state == ManagerState::Ready => {
                gpu.queue.write_buffer(&gpu.csm_buffer, 0, self.packed.as_bytes());
            }
            _ => log::trace!("[shadows] skipping CSM upload; no shadow map allocated"),
        }
    }

    /// Records one depth pass per active cascade (one in single-map mode) and hands each to
    /// the casters. The pass bind group is already bound at group 0 with the slot's offset.
    ///
    /// Does nothing before the first allocation, or until `update_light_matrix` has written the
    /// pass uniforms on the current GPU resources.
    pub fn record_shadow_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        casters: &mut [&mut dyn ShadowCaster],
    ) -> Result<ShadowCasterStats> {
        let gpu = match self.gpu.as_ref() {
            Some(gpu) if self.state == ManagerState::Ready => gpu,
            _ => {
                log::trace!("[shadows] shadow pass skipped; manager not ready");
                return Ok(ShadowCasterStats::default());
            }
        };
        if self.pass_uniforms.is_empty() {
            log::trace!("[shadows] shadow pass skipped; no light matrix this frame");
            return Ok(ShadowCasterStats::default());
        }
        if self.passes.len() != self.config.active_pass_count() {
            log::trace!(
                "[shadows] shadow pass skipped; {} pass(es) prepared but config wants {}",
                self.passes.len(),
                self.config.active_pass_count()
            );
            return Ok(ShadowCasterStats::default());
        }
        let store = &gpu.store;
        let pass_bind_group = gpu.pass_slots.bind_group();
        record_shadow_casters(&self.passes, casters, |info| {
            let view = store
                .write_view(info.slot)
                .with_context(|| format!("Shadow map has no layer for pass {}", info.slot))?;
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            pass.set_bind_group(0, pass_bind_group, &[info.dynamic_offset]);
            Ok(pass)
        })
    }

    /// Marks the point after which retired shadow maps may still be referenced by the GPU.
    pub fn on_frame_submitted(&mut self) {
        if let Some(gpu) = self.gpu.as_ref() {
            self.last_submission = SubmissionFence::track(&gpu.queue);
        }
    }

    pub fn collect_retired(&mut self) -> usize {
        self.gpu.as_mut().map(|gpu| gpu.store.collect_retired()).unwrap_or(0)
    }

    /// Active cascades from the last update; empty in single-map mode.
    pub fn cascade_data(&self) -> &[CascadeData] {
        let limit = self.config.cascade_count.min(self.cascades.len());
        &self.cascades[..limit]
    }

    /// The single map's matrix, or the first cascade's with CSM enabled.
    pub fn light_space_matrix(&self) -> Mat4 {
        self.light_space_matrix
    }

    pub fn light_position(&self) -> Vec3 {
        self.light_position
    }

    pub fn cascade_light_space_matrix(&self, index: usize) -> Option<Mat4> {
        self.cascade_data().get(index).map(|cascade| cascade.light_space_matrix)
    }

    pub fn shadow_passes(&self) -> &[ShadowPassInfo] {
        &self.passes
    }

    /// Pass uniforms uploaded by the last update, one per slot. Empty while no GPU resources
    /// exist, since nothing is uploaded then.
    pub fn pass_uniforms(&self) -> &[ShadowPassUniform] {
        &self.pass_uniforms
    }

    /// Byte distance between consecutive pass slots in the pass uniform buffer.
    pub fn pass_slot_stride(&self) -> Option<u32> {
        self.gpu.as_ref().map(|gpu| gpu.pass_slots.stride())
    }

    pub fn csm_uniform(&self) -> &CsmUniform {
        &self.packed
    }

    pub fn depth_bias_state(&self) -> wgpu::DepthBiasState {
        self.config.depth_bias_state()
    }

    pub fn store(&self) -> Option<&ShadowMapStore> {
        self.gpu.as_ref().map(|gpu| &gpu.store)
    }

    pub fn shadow_map(&self) -> Option<&wgpu::Texture> {
        self.store().and_then(ShadowMapStore::texture)
    }

    pub fn shadow_map_resolution(&self) -> Option<u32> {
        self.store().and_then(ShadowMapStore::resolution)
    }

    pub fn shadow_map_view(&self) -> Option<&wgpu::TextureView> {
        self.store().and_then(ShadowMapStore::sampling_view)
    }

    pub fn shadow_map_array_view(&self) -> Option<&wgpu::TextureView> {
        self.store().and_then(ShadowMapStore::array_view)
    }

    pub fn cascade_view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.store().and_then(|store| store.cascade_view(index))
    }

    pub fn sampler(&self) -> Option<&wgpu::Sampler> {
        self.store().map(ShadowMapStore::sampler)
    }

    pub fn allocation_count(&self) -> u64 {
        self.store().map(ShadowMapStore::allocation_count).unwrap_or(0)
    }

    pub fn csm_uniform_buffer(&self) -> Option<&wgpu::Buffer> {
        self.gpu.as_ref().map(|gpu| &gpu.csm_buffer)
    }

    /// Layout of the pass uniform at group 0 of every depth-only pipeline.
    pub fn pass_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|gpu| gpu.pass_slots.layout())
    }

    /// Layout for shading passes: CSM block, depth view, comparison sampler. Changes when the
    /// map switches between single and cascaded mode.
    pub fn sample_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|gpu| &gpu.sample_layout)
    }

    pub fn sample_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().and_then(|gpu| gpu.sample_bind_group.as_ref())
    }
}

fn create_sample_layout(device: &wgpu::Device, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Shadow Sample BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(CSM_UNIFORM_SIZE as u64),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: dimension,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::csm_uniform::INACTIVE_SPLIT_SENTINEL;

    fn csm_config(cascades: usize) -> ShadowConfig {
        let mut cfg = ShadowConfig::default();
        cfg.set_csm_enabled(true);
        cfg.set_cascade_count(cascades);
        cfg
    }

    #[test]
    fn uninitialized_manager_still_computes_matrices() {
        let mut manager = ShadowMapManager::uninitialized(ShadowConfig::default());
        let update = manager.update_light_matrix(&LightMatrixParams::new(Vec3::Y, Vec3::ZERO));
        assert!(matches!(update, LightMatrixUpdate::Single(_)));
        assert_eq!(manager.state(), ManagerState::Uninitialized);
        assert!(manager.cascade_data().is_empty());
        assert_eq!(manager.shadow_passes().len(), 1);
        assert!(manager.shadow_map().is_none());
    }

    #[test]
    fn cascaded_update_fills_every_cascade() {
        let mut manager = ShadowMapManager::uninitialized(csm_config(3));
        let params = LightMatrixParams::new(Vec3::new(0.3, 0.9, 0.1), Vec3::new(10.0, 5.0, 10.0))
            .with_camera_forward(Vec3::NEG_Z)
            .with_clip_planes(0.5, 150.0);
        let LightMatrixUpdate::Cascaded(cascades) = manager.update_light_matrix(&params) else {
            panic!("expected cascaded update");
        };
        assert_eq!(cascades.len(), 3);
        assert_eq!(cascades[2].split_distance, 150.0);
        assert_eq!(manager.cascade_data().len(), 3);
        assert_eq!(manager.cascade_light_space_matrix(1), Some(cascades[1].light_space_matrix));
        assert_eq!(manager.cascade_light_space_matrix(3), None);
        assert_eq!(manager.light_space_matrix(), cascades[0].light_space_matrix);
        let slots: Vec<usize> = manager.shadow_passes().iter().map(|pass| pass.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn packed_block_marks_unused_slots() {
        let mut manager = ShadowMapManager::uninitialized(csm_config(2));
        manager.update_light_matrix(&LightMatrixParams::new(Vec3::Y, Vec3::ZERO));
        let packed = manager.csm_uniform();
        assert_eq!(packed.split_distances[2], INACTIVE_SPLIT_SENTINEL);
        assert_eq!(packed.split_distances[3], INACTIVE_SPLIT_SENTINEL);
        assert_eq!(packed.cascade_matrix(2), Some(Mat4::IDENTITY));
        assert_eq!(packed.cascade_matrix(3), Some(Mat4::IDENTITY));
        assert_eq!(packed.params[0], 2.0);
        assert_eq!(packed.params[1], 1.0);
    }

    #[test]
    fn far_plane_defaults_to_shadow_radius() {
        let mut manager = ShadowMapManager::uninitialized(csm_config(4));
        manager.set_shadow_radius(120.0);
        manager.update_light_matrix(&LightMatrixParams::new(Vec3::Y, Vec3::ZERO));
        assert_eq!(manager.cascade_data()[3].split_distance, 120.0);
    }

    #[test]
    fn setters_clamp_without_gpu() {
        let mut manager = ShadowMapManager::uninitialized(ShadowConfig::default());
        manager.set_cascade_count(5).expect("no gpu, no allocation");
        assert_eq!(manager.config().cascade_count, 4);
        manager.set_cascade_count(1).expect("no gpu, no allocation");
        assert_eq!(manager.config().cascade_count, 2);
        manager.set_cascade_split_lambda(-0.2);
        assert_eq!(manager.config().cascade_split_lambda, 0.0);
        manager.set_cascade_split_lambda(1.5);
        assert_eq!(manager.config().cascade_split_lambda, 1.0);
        assert_eq!(manager.allocation_count(), 0);
    }

    #[test]
    fn config_is_an_independent_copy() {
        let manager = ShadowMapManager::uninitialized(ShadowConfig::default());
        let mut copy = manager.config();
        copy.set_resolution(512);
        assert_eq!(manager.config().resolution, 2048);
    }
}
