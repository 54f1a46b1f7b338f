use crate::config::ShadowConfig;
use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub resolution: Option<u32>,
    pub cascades: Option<usize>,
    pub csm: Option<bool>,
    pub lambda: Option<f32>,
    pub radius: Option<f32>,
    pub light_direction: Option<Vec3>,
    pub camera_position: Option<Vec3>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config_path = Some(PathBuf::from(value)),
                "resolution" => {
                    overrides.resolution =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid resolution '{value}'"))?);
                }
                "cascades" => {
                    overrides.cascades =
                        Some(value.parse::<usize>().with_context(|| format!("Invalid cascade count '{value}'"))?);
                }
                "csm" => overrides.csm = Some(parse_bool_flag("csm", &value)?),
                "lambda" => {
                    overrides.lambda =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid lambda '{value}'"))?);
                }
                "radius" => {
                    overrides.radius =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid radius '{value}'"))?);
                }
                "light" => overrides.light_direction = Some(parse_vec3("light", &value)?),
                "camera" => overrides.camera_position = Some(parse_vec3("camera", &value)?),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --resolution, --cascades, --csm, \
                     --lambda, --radius, --light, --camera."
                ),
            }
        }
        Ok(overrides)
    }

    /// Applies the overrides through the clamping setters.
    pub fn apply(&self, config: &mut ShadowConfig) {
        if let Some(resolution) = self.resolution {
            config.set_resolution(resolution);
        }
        if let Some(cascades) = self.cascades {
            config.set_cascade_count(cascades);
        }
        if let Some(csm) = self.csm {
            config.set_csm_enabled(csm);
        }
        if let Some(lambda) = self.lambda {
            config.set_cascade_split_lambda(lambda);
        }
        if let Some(radius) = self.radius {
            config.set_shadow_radius(radius);
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

fn parse_vec3(flag: &str, value: &str) -> Result<Vec3> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("Invalid {flag} value '{value}'. Expected x,y,z.");
    }
    let mut components = [0.0f32; 3];
    for (dst, part) in components.iter_mut().zip(&parts) {
        *dst = part.parse::<f32>().with_context(|| format!("Invalid {flag} component '{part}'"))?;
    }
    Ok(Vec3::from_array(components))
}
