use anyhow::{Context, Result};
use glam::{Mat4, Vec3};

/// Everything a caster needs to draw into one shadow pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPassInfo {
    pub light_space_matrix: Mat4,
    pub light_position: Vec3,
    /// Cascade index, or 0 in single-map mode. Also the caster's uniform slot.
    pub slot: usize,
    /// Byte offset of this pass in the shared pass uniform buffer.
    pub dynamic_offset: u32,
}

/// A renderable that can write its depth into the shadow map.
///
/// Per frame the driver calls `prepare_shadow_passes` once with every active pass, then
/// `render_depth_only` once per pass. Casters that keep their own per-pass uniforms should write
/// all of them in `prepare_shadow_passes`, one region per `slot`, since queue writes land before
/// the whole command buffer executes.
pub trait ShadowCaster<P = wgpu::RenderPass<'static>> {
    /// False while hidden, while geometry is still loading, or when casting is switched off.
    fn can_cast_shadows(&self) -> bool;

    fn prepare_shadow_passes(&mut self, _passes: &[ShadowPassInfo]) -> Result<()> {
        Ok(())
    }

    /// Binds depth-only pipeline state and issues draws against `pass`.
    fn render_depth_only(&mut self, pass: &mut P, info: &ShadowPassInfo) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowCasterStats {
    pub casters: usize,
    pub passes: usize,
    pub draws: usize,
}

/// Runs one frame of the caster protocol.
///
/// `begin_pass` opens the pass for a slot (clearing its depth); every pass is opened even with no
/// active casters so stale depth from a previous frame never survives.
pub fn record_shadow_casters<P, F>(
    passes: &[ShadowPassInfo],
    casters: &mut [&mut dyn ShadowCaster<P>],
    mut begin_pass: F,
) -> Result<ShadowCasterStats>
where
    F: FnMut(&ShadowPassInfo) -> Result<P>,
{
    let mut stats = ShadowCasterStats { passes: passes.len(), ..Default::default() };
    let active: Vec<usize> = casters
        .iter()
        .enumerate()
        .filter(|(_, caster)| caster.can_cast_shadows())
        .map(|(idx, _)| idx)
        .collect();
    stats.casters = active.len();

    for &idx in &active {
        casters[idx]
            .prepare_shadow_passes(passes)
            .with_context(|| format!("Shadow caster {idx} failed to prepare"))?;
    }

    for info in passes {
        let mut pass = begin_pass(info).with_context(|| format!("Failed to begin shadow pass {}", info.slot))?;
        for &idx in &active {
            casters[idx]
                .render_depth_only(&mut pass, info)
                .with_context(|| format!("Shadow caster {idx} failed in pass {}", info.slot))?;
            stats.draws += 1;
        }
    }
    Ok(stats)
}
