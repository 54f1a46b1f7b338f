use anyhow::{Context, Result};

/// Device and queue without a surface, for tools and GPU tests.
pub struct HeadlessGpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
}

impl HeadlessGpu {
    pub async fn request() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request headless adapter")?;
        let adapter_name = adapter.get_info().name;
        let device_desc = wgpu::DeviceDescriptor {
            label: Some("Headless Shadow Device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        };
        let (device, queue) =
            adapter.request_device(&device_desc).await.context("Failed to request headless device")?;
        Ok(Self { device, queue, adapter_name })
    }

    pub fn request_blocking() -> Result<Self> {
        pollster::block_on(Self::request())
    }
}
