use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

use super::shadow_manager::{ManagerState, ShadowMapManager};
use super::shadow_store::ShadowMapLayout;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDebugView {
    /// Cascade index, or 0 for the single map.
    pub layer: u32,
    /// Top-left corner of the thumbnail in target pixels.
    pub x: u32,
    pub y: u32,
    pub size: u32,
    /// Exponent applied to depth before display; raising it spreads values packed near 1.0.
    pub depth_power: f32,
}

impl Default for ShadowDebugView {
    fn default() -> Self {
        Self { layer: 0, x: 16, y: 16, size: 256, depth_power: 8.0 }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DebugParams {
    layer: u32,
    depth_power: f32,
    _padding: [f32; 2],
}

const DEBUG_SHADER_BODY: &str = include_str!("../../assets/shaders/shadow_debug.wgsl");

// Depth is bound as unfilterable float; `textureLoad` on depth textures has no GLSL form.
const SINGLE_PRELUDE: &str = "@group(0) @binding(1)
var shadow_map: texture_2d<f32>;
fn load_depth(texel: vec2<i32>, layer: i32) -> f32 {
    return textureLoad(shadow_map, texel, 0).x;
}
";

const ARRAY_PRELUDE: &str = "@group(0) @binding(1)
var shadow_map: texture_2d_array<f32>;
fn load_depth(texel: vec2<i32>, layer: i32) -> f32 {
    return textureLoad(shadow_map, texel, layer, 0).x;
}
";

fn debug_shader_source(dimension: wgpu::TextureViewDimension) -> String {
    let prelude = match dimension {
        wgpu::TextureViewDimension::D2Array => ARRAY_PRELUDE,
        _ => SINGLE_PRELUDE,
    };
    format!("{prelude}\n{DEBUG_SHADER_BODY}")
}

type PipelineKey = (wgpu::TextureFormat, wgpu::TextureViewDimension);

/// Draws a shadow-map layer as a grayscale thumbnail on top of an existing color target.
#[derive(Default)]
pub struct ShadowDebugOverlay {
    layouts: HashMap<wgpu::TextureViewDimension, wgpu::BindGroupLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ShadowDebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(false)` without recording anything when the manager is not ready, the layer
    /// does not exist, or the thumbnail falls outside the target. Fails if the device rejects
    /// the overlay pipeline.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        target_format: wgpu::TextureFormat,
        target_size: (u32, u32),
        manager: &ShadowMapManager,
        view: ShadowDebugView,
    ) -> Result<bool> {
        if manager.state() != ManagerState::Ready {
            return Ok(false);
        }
        let Some(store) = manager.store() else {
            return Ok(false);
        };
        let (Some(texture), Some(descriptor)) = (store.texture(), store.descriptor()) else {
            return Ok(false);
        };
        if view.layer >= descriptor.layer_count() {
            return Ok(false);
        }
        let Some((x, y, width, height)) = clip_thumbnail(view, target_size) else {
            return Ok(false);
        };

        let dimension = match descriptor.layout {
            ShadowMapLayout::Single => wgpu::TextureViewDimension::D2,
            ShadowMapLayout::Cascaded { .. } => wgpu::TextureViewDimension::D2Array,
        };
        self.ensure_pipeline(device, target_format, dimension)?;
        let layout = self.layouts.get(&dimension).context("Shadow debug layout missing")?;
        let pipeline =
            self.pipelines.get(&(target_format, dimension)).context("Shadow debug pipeline missing")?;

        let depth_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Debug View"),
            dimension: Some(dimension),
            aspect: wgpu::TextureAspect::DepthOnly,
            base_array_layer: 0,
            array_layer_count: Some(descriptor.layer_count()),
            ..Default::default()
        });
        // A fresh buffer per draw, so several thumbnails in one frame keep their own layer.
        let params = DebugParams { layer: view.layer, depth_power: view.depth_power.max(0.01), _padding: [0.0; 2] };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Debug Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Debug BG"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: params_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&depth_view) },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Debug Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
        pass.set_scissor_rect(x, y, width, height);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(true)
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        dimension: wgpu::TextureViewDimension,
    ) -> Result<()> {
        if self.pipelines.contains_key(&(format, dimension)) {
            return Ok(());
        }
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let layout = self.layouts.entry(dimension).or_insert_with(|| create_debug_layout(device, dimension));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Debug Shader"),
            source: wgpu::ShaderSource::Wgsl(debug_shader_source(dimension).into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Debug Pipeline Layout"),
            bind_group_layouts: &[&*layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Debug Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("Shadow debug pipeline for {format:?} ({dimension:?}) rejected by the device: {err}");
        }
        self.pipelines.insert((format, dimension), pipeline);
        Ok(())
    }
}

fn create_debug_layout(device: &wgpu::Device, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Shadow Debug BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: dimension,
                    multisampled: false,
                },
                count: None,
            },
        ],
    })
}

fn clip_thumbnail(view: ShadowDebugView, target_size: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (target_width, target_height) = target_size;
    if view.size == 0 || view.x >= target_width || view.y >= target_height {
        return None;
    }
    let width = view.size.min(target_width - view.x);
    let height = view.size.min(target_height - view.y);
    Some((view.x, view.y, width, height))
}
