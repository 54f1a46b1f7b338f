use anyhow::{Context, Result};
use glam::Vec3;
use kestrel_shadows::cli::CliOverrides;
use kestrel_shadows::config::ShadowConfig;
use kestrel_shadows::renderer::depth_pipeline::create_position_only_pipeline;
use kestrel_shadows::renderer::headless::HeadlessGpu;
use kestrel_shadows::renderer::{
    LightMatrixParams, LightMatrixUpdate, ShadowCaster, ShadowMapManager, StaticMeshCaster,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ProbeReport {
    adapter: Option<String>,
    mode: &'static str,
    resolution: u32,
    light_direction: [f32; 3],
    cascades: Vec<CascadeReport>,
    light_space_matrix: [f32; 16],
    packed_bytes: usize,
    shadow_draws: usize,
}

#[derive(Debug, Serialize)]
struct CascadeReport {
    split_distance: f32,
    radius: f32,
    light_space_matrix: [f32; 16],
}

fn main() -> Result<()> {
    env_logger::init();
    let overrides = CliOverrides::parse_from_env()?;
    let mut config = match overrides.config_path.as_ref() {
        Some(path) => ShadowConfig::load_or_default(path),
        None => ShadowConfig::default(),
    };
    overrides.apply(&mut config);

    let light_direction = overrides.light_direction.unwrap_or(Vec3::new(0.4, 0.8, 0.35)).normalize_or_zero();
    let camera_position = overrides.camera_position.unwrap_or(Vec3::new(0.0, 12.0, 30.0));
    let params = LightMatrixParams::new(light_direction, camera_position)
        .with_camera_forward((Vec3::ZERO - camera_position).normalize_or_zero());

    let gpu = match HeadlessGpu::request_blocking() {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            log::warn!("No GPU available ({err:#}); reporting matrices only.");
            None
        }
    };

    let mut manager = ShadowMapManager::uninitialized(config.clone());
    if let Some(gpu) = gpu.as_ref() {
        manager.initialize(&gpu.device, &gpu.queue).context("Failed to allocate shadow map")?;
    }
    let update = manager.update_light_matrix(&params);

    let mut shadow_draws = 0;
    if let (Some(gpu), Some(pass_layout)) = (gpu.as_ref(), manager.pass_bind_group_layout()) {
        let pipeline = create_position_only_pipeline(&gpu.device, &manager.config(), pass_layout);
        let mut ground = StaticMeshCaster::cuboid(
            &gpu.device,
            pipeline.clone(),
            Vec3::new(-40.0, -1.0, -40.0),
            Vec3::new(40.0, 0.0, 40.0),
        );
        let mut pillar =
            StaticMeshCaster::cuboid(&gpu.device, pipeline, Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 10.0, 2.0));
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Shadow Probe Encoder") });
        let mut casters: [&mut dyn ShadowCaster; 2] = [&mut ground, &mut pillar];
        let stats = manager.record_shadow_pass(&mut encoder, &mut casters)?;
        gpu.queue.submit(Some(encoder.finish()));
        manager.on_frame_submitted();
        shadow_draws = stats.draws;
    }

    let (mode, cascades) = match &update {
        LightMatrixUpdate::Single(_) => ("single", Vec::new()),
        LightMatrixUpdate::Cascaded(cascades) => (
            "cascaded",
            cascades
                .iter()
                .map(|cascade| CascadeReport {
                    split_distance: cascade.split_distance,
                    radius: cascade.radius,
                    light_space_matrix: cascade.light_space_matrix.to_cols_array(),
                })
                .collect(),
        ),
    };
    let report = ProbeReport {
        adapter: gpu.as_ref().map(|gpu| gpu.adapter_name.clone()),
        mode,
        resolution: manager.shadow_map_resolution().unwrap_or(config.resolution),
        light_direction: light_direction.to_array(),
        cascades,
        light_space_matrix: manager.light_space_matrix().to_cols_array(),
        packed_bytes: manager.csm_uniform().as_bytes().len(),
        shadow_draws,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
