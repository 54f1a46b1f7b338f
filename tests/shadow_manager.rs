use anyhow::Result;
use glam::{Mat4, Vec3};
use kestrel_shadows::config::ShadowConfig;
use kestrel_shadows::renderer::{
    record_shadow_casters, LightMatrixParams, LightMatrixUpdate, ShadowCaster, ShadowMapManager, ShadowPassInfo,
    INACTIVE_SPLIT_SENTINEL,
};
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Prepare(Vec<Mat4>),
    Render { pass: usize, slot: usize },
}

#[derive(Default)]
struct MockCaster {
    events: Vec<Event>,
}

impl ShadowCaster<usize> for MockCaster {
    fn can_cast_shadows(&self) -> bool {
        true
    }

    fn prepare_shadow_passes(&mut self, passes: &[ShadowPassInfo]) -> Result<()> {
        self.events.push(Event::Prepare(passes.iter().map(|pass| pass.light_space_matrix).collect()));
        Ok(())
    }

    fn render_depth_only(&mut self, pass: &mut usize, info: &ShadowPassInfo) -> Result<()> {
        self.events.push(Event::Render { pass: *pass, slot: info.slot });
        Ok(())
    }
}

fn run_frame(manager: &mut ShadowMapManager, caster: &mut MockCaster) -> usize {
    manager.update_light_matrix(&LightMatrixParams::new(Vec3::new(0.3, 0.8, 0.2), Vec3::new(4.0, 2.0, -6.0)));
    let stats = record_shadow_casters(manager.shadow_passes(), &mut [caster as &mut dyn ShadowCaster<usize>], |info| {
        Ok(info.slot)
    })
    .expect("record frame");
    stats.draws
}

#[test]
fn csm_frame_renders_once_per_cascade_after_prepare() {
    let mut config = ShadowConfig::default();
    config.set_csm_enabled(true);
    config.set_cascade_count(3);
    let mut manager = ShadowMapManager::uninitialized(config);
    let mut caster = MockCaster::default();

    let draws = run_frame(&mut manager, &mut caster);
    assert_eq!(draws, 3);
    assert_eq!(caster.events.len(), 4);
    let Event::Prepare(matrices) = &caster.events[0] else {
        panic!("prepare must come first, got {:?}", caster.events[0]);
    };
    let expected: Vec<Mat4> = manager.cascade_data().iter().map(|cascade| cascade.light_space_matrix).collect();
    assert_eq!(matrices, &expected);
    let renders: Vec<(usize, usize)> = caster.events[1..]
        .iter()
        .map(|event| match event {
            Event::Render { pass, slot } => (*pass, *slot),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(renders, vec![(0, 0), (1, 1), (2, 2)]);
}

#[test]
fn single_map_frame_renders_once() {
    let mut manager = ShadowMapManager::uninitialized(ShadowConfig::default());
    let mut caster = MockCaster::default();
    assert_eq!(run_frame(&mut manager, &mut caster), 1);
    assert!(matches!(caster.events[0], Event::Prepare(ref matrices) if matrices.len() == 1));
    assert_eq!(caster.events[1], Event::Render { pass: 0, slot: 0 });
}

#[test]
fn toggling_csm_switches_the_update_variant() {
    let mut manager = ShadowMapManager::uninitialized(ShadowConfig::default());
    let params = LightMatrixParams::new(Vec3::Y, Vec3::ZERO);
    let single = manager.update_light_matrix(&params);
    assert_eq!(single.pass_count(), 1);
    assert!(matches!(single, LightMatrixUpdate::Single(m) if m == manager.light_space_matrix()));

    manager.set_csm_enabled(true).expect("no gpu attached");
    manager.set_cascade_count(2).expect("no gpu attached");
    let cascaded = manager.update_light_matrix(&params);
    assert_eq!(cascaded.pass_count(), 2);
    let packed = manager.csm_uniform();
    assert_eq!(packed.split_distances[2], INACTIVE_SPLIT_SENTINEL);
    assert_eq!(packed.split_distances[3], INACTIVE_SPLIT_SENTINEL);
    assert_eq!(packed.cascade_matrix(3), Some(Mat4::IDENTITY));
}

#[test]
fn each_frame_overwrites_cascade_data() {
    let mut config = ShadowConfig::default();
    config.set_csm_enabled(true);
    let mut manager = ShadowMapManager::uninitialized(config);
    manager.update_light_matrix(&LightMatrixParams::new(Vec3::new(0.2, 0.9, 0.1), Vec3::ZERO));
    let first = manager.cascade_data().to_vec();
    manager.update_light_matrix(&LightMatrixParams::new(Vec3::new(0.2, 0.9, 0.1), Vec3::new(50.0, 0.0, 0.0)));
    assert_eq!(manager.cascade_data().len(), first.len());
    assert_ne!(manager.cascade_data()[0].light_space_matrix, first[0].light_space_matrix);
}

#[test]
fn config_file_values_are_clamped() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "resolution": 9000, "csm_enabled": true, "cascade_split_lambda": 4.0 }}"#)
        .expect("write config");
    let config = ShadowConfig::load(file.path()).expect("load config");
    assert_eq!(config.resolution, 4096);
    assert!(config.csm_enabled);
    assert_eq!(config.cascade_split_lambda, 1.0);

    let fallback = ShadowConfig::load_or_default(file.path().with_extension("missing"));
    assert_eq!(fallback, ShadowConfig::default());
}
