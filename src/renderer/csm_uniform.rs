use glam::{Mat4, Vec3};

use super::light_matrix::CascadeData;
use super::MAX_SHADOW_CASCADES;

/// Split distance written into unused cascade slots so selection never lands on them.
pub const INACTIVE_SPLIT_SENTINEL: f32 = 10_000.0;
pub const CSM_UNIFORM_SCALARS: usize = 72;
pub const CSM_UNIFORM_SIZE: usize = CSM_UNIFORM_SCALARS * std::mem::size_of::<f32>();

/// Fixed-layout cascade block consumed by shading passes. The shape never depends on how many
/// cascades are live; inactive slots carry identity matrices and the sentinel split.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CsmUniform {
    pub light_space_matrices: [[[f32; 4]; 4]; MAX_SHADOW_CASCADES],
    pub split_distances: [f32; MAX_SHADOW_CASCADES],
    /// x: active cascade count, y: CSM enabled (0/1), z: blend fraction, w: padding.
    pub params: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<CsmUniform>() == CSM_UNIFORM_SIZE);

impl CsmUniform {
    pub fn pack(cascades: &[CascadeData], csm_enabled: bool, blend_fraction: f32) -> Self {
        let mut light_space_matrices = [Mat4::IDENTITY.to_cols_array_2d(); MAX_SHADOW_CASCADES];
        let mut split_distances = [INACTIVE_SPLIT_SENTINEL; MAX_SHADOW_CASCADES];
        let active = cascades.len().min(MAX_SHADOW_CASCADES);
        for (idx, cascade) in cascades.iter().take(active).enumerate() {
            light_space_matrices[idx] = cascade.light_space_matrix.to_cols_array_2d();
            split_distances[idx] = cascade.split_distance;
        }
        let params = [active as f32, if csm_enabled { 1.0 } else { 0.0 }, blend_fraction, 0.0];
        Self { light_space_matrices, split_distances, params }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn as_scalars(&self) -> &[f32; CSM_UNIFORM_SCALARS] {
        bytemuck::cast_ref(self)
    }

    pub fn cascade_matrix(&self, slot: usize) -> Option<Mat4> {
        self.light_space_matrices.get(slot).map(Mat4::from_cols_array_2d)
    }

    pub fn active_cascades(&self) -> usize {
        self.params[0] as usize
    }
}

impl Default for CsmUniform {
    fn default() -> Self {
        Self::pack(&[], false, 0.0)
    }
}

/// Uniform data for one shadow pass, selected per draw through a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowPassUniform {
    pub light_space_matrix: [[f32; 4]; 4],
    pub light_position: [f32; 4],
}

impl ShadowPassUniform {
    pub fn new(light_space_matrix: Mat4, light_position: Vec3) -> Self {
        Self {
            light_space_matrix: light_space_matrix.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
        }
    }
}

/// One uniform buffer holding every pass slot at an aligned stride.
///
/// All slots are written before any pass is recorded. Rewriting a single region between
/// recorded draws would leave every draw seeing only the last write once the queue executes.
pub struct ShadowPassSlots {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    stride: u32,
}

impl ShadowPassSlots {
    pub fn new(device: &wgpu::Device) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
        let stride = align_to(std::mem::size_of::<ShadowPassUniform>() as u32, alignment);
        let binding_size = wgpu::BufferSize::new(std::mem::size_of::<ShadowPassUniform>() as u64);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Pass BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: binding_size,
                },
                count: None,
            }],
        });
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Pass Uniform Buffer"),
            size: u64::from(stride) * MAX_SHADOW_CASCADES as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Pass BG"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: binding_size,
                }),
            }],
        });
        Self { buffer, layout, bind_group, stride }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn offset(&self, slot: usize) -> u32 {
        self.stride * slot.min(MAX_SHADOW_CASCADES - 1) as u32
    }

    pub fn write_all(&self, queue: &wgpu::Queue, slots: &[ShadowPassUniform]) {
        for (slot, data) in slots.iter().take(MAX_SHADOW_CASCADES).enumerate() {
            queue.write_buffer(&self.buffer, u64::from(self.offset(slot)), bytemuck::bytes_of(data));
        }
    }
}

pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cascade(scale: f32, split: f32) -> CascadeData {
        CascadeData {
            light_space_matrix: Mat4::from_scale(Vec3::splat(scale)),
            split_distance: split,
            radius: scale,
        }
    }

    #[test]
    fn packed_block_is_288_bytes() {
        let packed = CsmUniform::pack(&[cascade(2.0, 10.0)], true, 0.1);
        assert_eq!(packed.as_bytes().len(), 288);
        assert_eq!(packed.as_scalars().len(), 72);
    }

    #[test]
    fn two_cascades_leave_sentinels_and_identity() {
        let packed = CsmUniform::pack(&[cascade(2.0, 10.0), cascade(3.0, 40.0)], true, 0.2);
        assert_eq!(packed.split_distances, [10.0, 40.0, INACTIVE_SPLIT_SENTINEL, INACTIVE_SPLIT_SENTINEL]);
        assert_eq!(packed.cascade_matrix(0), Some(Mat4::from_scale(Vec3::splat(2.0))));
        assert_eq!(packed.cascade_matrix(2), Some(Mat4::IDENTITY));
        assert_eq!(packed.cascade_matrix(3), Some(Mat4::IDENTITY));
        assert_eq!(packed.params, [2.0, 1.0, 0.2, 0.0]);
    }

    #[test]
    fn scalar_layout_puts_splits_after_matrices() {
        let packed = CsmUniform::pack(&[cascade(5.0, 12.5)], false, 0.1);
        let scalars = packed.as_scalars();
        assert_eq!(scalars[0], 5.0);
        assert_eq!(scalars[64], 12.5);
        assert_eq!(scalars[65], INACTIVE_SPLIT_SENTINEL);
        assert_eq!(scalars[68], 1.0);
        assert_eq!(scalars[69], 0.0);
    }

    #[test]
    fn stride_respects_alignment() {
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(300, 256), 512);
    }
}
