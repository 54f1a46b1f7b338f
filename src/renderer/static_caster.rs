use anyhow::Result;
use glam::Vec3;
use wgpu::util::DeviceExt;

use super::shadow_caster::{ShadowCaster, ShadowPassInfo};

/// A world-space, position-only mesh that casts shadows with a shared depth pipeline.
pub struct StaticMeshCaster {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    pub visible: bool,
    pub casts_shadows: bool,
}

impl StaticMeshCaster {
    pub fn new(device: &wgpu::Device, pipeline: wgpu::RenderPipeline, positions: &[Vec3], indices: &[u32]) -> Self {
        let vertices: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Caster VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Caster IB"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            visible: true,
            casts_shadows: true,
        }
    }

    /// Axis-aligned box from `min` to `max`, counter-clockwise outward faces.
    pub fn cuboid(device: &wgpu::Device, pipeline: wgpu::RenderPipeline, min: Vec3, max: Vec3) -> Self {
        let positions = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        #[rustfmt::skip]
        let indices: [u32; 36] = [
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(device, pipeline, &positions, &indices)
    }
}

impl ShadowCaster for StaticMeshCaster {
    fn can_cast_shadows(&self) -> bool {
        self.visible && self.casts_shadows && self.index_count > 0
    }

    fn render_depth_only(&mut self, pass: &mut wgpu::RenderPass<'static>, _info: &ShadowPassInfo) -> Result<()> {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
        Ok(())
    }
}
