use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

pub const RESOLUTION_RANGE: RangeInclusive<u32> = 512..=4096;
pub const CASCADE_COUNT_RANGE: RangeInclusive<usize> = 2..=4;
pub const SPLIT_LAMBDA_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const BLEND_FRACTION_RANGE: RangeInclusive<f32> = 0.01..=0.3;
pub const FORWARD_OFFSET_RANGE: RangeInclusive<f32> = 0.0..=0.8;
pub const MIN_SHADOW_RADIUS: f32 = 1.0;

/// Shadow-map settings. Every setter clamps into the supported range instead of rejecting input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    #[serde(default = "ShadowConfig::default_resolution")]
    pub resolution: u32,
    #[serde(default = "ShadowConfig::default_shadow_radius")]
    pub shadow_radius: f32,
    #[serde(default = "ShadowConfig::default_depth_bias")]
    pub depth_bias: i32,
    #[serde(default = "ShadowConfig::default_normal_bias")]
    pub normal_bias: f32,
    #[serde(default = "ShadowConfig::default_soft_shadows")]
    pub soft_shadows: bool,
    #[serde(default = "ShadowConfig::default_pcf_kernel_size")]
    pub pcf_kernel_size: u32,
    #[serde(default)]
    pub forward_offset: f32,
    #[serde(default)]
    pub csm_enabled: bool,
    #[serde(default = "ShadowConfig::default_cascade_count")]
    pub cascade_count: usize,
    #[serde(default = "ShadowConfig::default_split_lambda")]
    pub cascade_split_lambda: f32,
    #[serde(default = "ShadowConfig::default_blend_fraction")]
    pub cascade_blend_fraction: f32,
}

impl ShadowConfig {
    const fn default_resolution() -> u32 {
        2048
    }

    const fn default_shadow_radius() -> f32 {
        200.0
    }

    const fn default_depth_bias() -> i32 {
        4
    }

    const fn default_normal_bias() -> f32 {
        2.0
    }

    const fn default_soft_shadows() -> bool {
        true
    }

    const fn default_pcf_kernel_size() -> u32 {
        3
    }

    const fn default_cascade_count() -> usize {
        4
    }

    const fn default_split_lambda() -> f32 {
        0.5
    }

    const fn default_blend_fraction() -> f32 {
        0.1
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read shadow config {}", path.display()))?;
        let cfg: ShadowConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse shadow config {}", path.display()))?;
        Ok(cfg.clamped())
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Shadow config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    /// Returns a copy with every field pulled into its valid range.
    pub fn clamped(&self) -> Self {
        let mut cfg = Self::default();
        cfg.set_resolution(self.resolution);
        cfg.set_shadow_radius(self.shadow_radius);
        cfg.set_depth_bias(self.depth_bias);
        cfg.set_normal_bias(self.normal_bias);
        cfg.set_soft_shadows(self.soft_shadows);
        cfg.set_pcf_kernel_size(self.pcf_kernel_size);
        cfg.set_forward_offset(self.forward_offset);
        cfg.set_csm_enabled(self.csm_enabled);
        cfg.set_cascade_count(self.cascade_count);
        cfg.set_cascade_split_lambda(self.cascade_split_lambda);
        cfg.set_cascade_blend_fraction(self.cascade_blend_fraction);
        cfg
    }

    /// Number of shadow passes a frame records: one per cascade with CSM, otherwise one.
    pub fn active_pass_count(&self) -> usize {
        if self.csm_enabled {
            self.cascade_count
        } else {
            1
        }
    }

    pub fn depth_bias_state(&self) -> wgpu::DepthBiasState {
        wgpu::DepthBiasState { constant: self.depth_bias, slope_scale: self.normal_bias, clamp: 0.0 }
    }

    pub fn set_resolution(&mut self, resolution: u32) {
        self.resolution = resolution.clamp(*RESOLUTION_RANGE.start(), *RESOLUTION_RANGE.end());
    }

    pub fn set_shadow_radius(&mut self, radius: f32) {
        self.shadow_radius =
            if radius.is_finite() { radius.max(MIN_SHADOW_RADIUS) } else { Self::default_shadow_radius() };
    }

    pub fn set_depth_bias(&mut self, bias: i32) {
        self.depth_bias = bias;
    }

    pub fn set_normal_bias(&mut self, bias: f32) {
        self.normal_bias = if bias.is_finite() { bias } else { Self::default_normal_bias() };
    }

    pub fn set_soft_shadows(&mut self, enabled: bool) {
        self.soft_shadows = enabled;
    }

    /// Kernel sizes are odd, so an even request rounds up to the next odd size.
    pub fn set_pcf_kernel_size(&mut self, size: u32) {
        let size = size.clamp(3, 7);
        self.pcf_kernel_size = if size % 2 == 0 { size + 1 } else { size };
    }

    pub fn set_forward_offset(&mut self, offset: f32) {
        self.forward_offset = clamp_f32(offset, &FORWARD_OFFSET_RANGE, 0.0);
    }

    pub fn set_csm_enabled(&mut self, enabled: bool) {
        self.csm_enabled = enabled;
    }

    pub fn set_cascade_count(&mut self, count: usize) {
        self.cascade_count = count.clamp(*CASCADE_COUNT_RANGE.start(), *CASCADE_COUNT_RANGE.end());
    }

    pub fn set_cascade_split_lambda(&mut self, lambda: f32) {
        self.cascade_split_lambda = clamp_f32(lambda, &SPLIT_LAMBDA_RANGE, Self::default_split_lambda());
    }

    pub fn set_cascade_blend_fraction(&mut self, fraction: f32) {
        self.cascade_blend_fraction =
            clamp_f32(fraction, &BLEND_FRACTION_RANGE, Self::default_blend_fraction());
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: Self::default_resolution(),
            shadow_radius: Self::default_shadow_radius(),
            depth_bias: Self::default_depth_bias(),
            normal_bias: Self::default_normal_bias(),
            soft_shadows: Self::default_soft_shadows(),
            pcf_kernel_size: Self::default_pcf_kernel_size(),
            forward_offset: 0.0,
            csm_enabled: false,
            cascade_count: Self::default_cascade_count(),
            cascade_split_lambda: Self::default_split_lambda(),
            cascade_blend_fraction: Self::default_blend_fraction(),
        }
    }
}

// NaN never compares, so it falls back instead of leaking through `clamp`.
fn clamp_f32(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(*range.start(), *range.end())
}
