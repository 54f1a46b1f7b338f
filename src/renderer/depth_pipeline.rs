use super::DEPTH_FORMAT;
use crate::config::ShadowConfig;

/// Shader for world-space, position-only meshes. Group 0 is the shadow pass uniform.
pub const POSITION_ONLY_SHADER: &str = include_str!("../../assets/shaders/shadow_depth.wgsl");

pub fn position_only_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        [wgpu::VertexAttribute { shader_location: 0, format: wgpu::VertexFormat::Float32x3, offset: 0 }];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Fragment-less depth pipeline for shadow casters.
///
/// Group 0 must be the manager's pass bind-group layout; callers append their own groups
/// after it. Depth bias comes from the shadow config, so rebuild after changing it.
pub struct ShadowDepthPipelineDesc<'a> {
    pub label: &'a str,
    pub shader: &'a wgpu::ShaderModule,
    pub vertex_entry: &'a str,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub pass_layout: &'a wgpu::BindGroupLayout,
    pub extra_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub cull_mode: Option<wgpu::Face>,
}

pub fn create_shadow_depth_pipeline(
    device: &wgpu::Device,
    config: &ShadowConfig,
    desc: &ShadowDepthPipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let mut bind_group_layouts: Vec<&wgpu::BindGroupLayout> = Vec::with_capacity(1 + desc.extra_layouts.len());
    bind_group_layouts.push(desc.pass_layout);
    bind_group_layouts.extend_from_slice(desc.extra_layouts);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some(desc.vertex_entry),
            buffers: desc.vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: config.depth_bias_state(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Depth pipeline for meshes drawn with [`POSITION_ONLY_SHADER`].
pub fn create_position_only_pipeline(
    device: &wgpu::Device,
    config: &ShadowConfig,
    pass_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Depth Shader"),
        source: wgpu::ShaderSource::Wgsl(POSITION_ONLY_SHADER.into()),
    });
    let vertex_buffers = [position_only_vertex_layout()];
    create_shadow_depth_pipeline(
        device,
        config,
        &ShadowDepthPipelineDesc {
            label: "Shadow Depth Pipeline",
            shader: &shader,
            vertex_entry: "vs_main",
            vertex_buffers: &vertex_buffers,
            pass_layout,
            extra_layouts: &[],
            cull_mode: Some(wgpu::Face::Back),
        },
    )
}
