use glam::{Mat4, Vec3};

const FALLBACK_LIGHT_DIR: Vec3 = Vec3::new(0.4, 0.8, 0.35);
const STEEP_LIGHT_THRESHOLD: f32 = 0.99;
const LIGHT_NEAR_CLIP: f32 = 0.1;

/// Per-cascade result of a light matrix update. Rebuilt every frame, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeData {
    pub light_space_matrix: Mat4,
    /// Far edge of the view-depth range this cascade covers.
    pub split_distance: f32,
    /// Half-extent of the light-space orthographic box.
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMatrix {
    pub light_space_matrix: Mat4,
    pub light_position: Vec3,
    pub radius: f32,
}

/// Normalizes `direction` (scene toward light); zero-length input falls back to a fixed sun angle.
pub fn sanitize_light_direction(direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    if dir.length_squared() < 1e-4 || !dir.is_finite() {
        FALLBACK_LIGHT_DIR.normalize()
    } else {
        dir
    }
}

/// Up vector for the light's look-at basis. World up degenerates when the light is near vertical.
pub fn light_up_vector(light_dir: Vec3) -> Vec3 {
    if light_dir.normalize_or_zero().y.abs() > STEEP_LIGHT_THRESHOLD {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Anchor on the ground plane under the camera, pushed along the horizontal camera
/// forward by `forward_offset * shadow_radius`.
pub fn ground_anchor(
    camera_position: Vec3,
    camera_forward: Option<Vec3>,
    forward_offset: f32,
    shadow_radius: f32,
) -> Vec3 {
    let mut anchor = Vec3::new(camera_position.x, 0.0, camera_position.z);
    if let Some(forward) = camera_forward {
        let flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
        anchor += flat * forward_offset * shadow_radius;
    }
    anchor
}

/// Orthographic half-width of a cascade: doubles per cascade, starting at `radius / count`.
pub fn cascade_extent(shadow_radius: f32, cascade_count: usize, cascade_index: usize) -> f32 {
    let count = cascade_count.max(1) as f32;
    (shadow_radius / count) * 2.0f32.powi(cascade_index as i32)
}

/// Light-space transform for an orthographic box of half-width `extent` centred on `anchor`.
pub fn build_light_matrix(light_dir: Vec3, anchor: Vec3, shadow_radius: f32, extent: f32) -> LightMatrix {
    let light_dir = sanitize_light_direction(light_dir);
    let light_position = anchor + light_dir * (shadow_radius * 2.0);
    let view = Mat4::look_at_rh(light_position, anchor, light_up_vector(light_dir));
    let proj = Mat4::orthographic_rh(-extent, extent, -extent, extent, LIGHT_NEAR_CLIP, shadow_radius * 3.0);
    LightMatrix { light_space_matrix: proj * view, light_position, radius: extent }
}

pub fn build_cascade_light_matrix(
    light_dir: Vec3,
    anchor: Vec3,
    shadow_radius: f32,
    cascade_count: usize,
    cascade_index: usize,
) -> LightMatrix {
    let extent = cascade_extent(shadow_radius, cascade_count, cascade_index);
    build_light_matrix(light_dir, anchor, shadow_radius, extent)
}

/// Single-map mode covers the whole shadow radius with one box.
pub fn build_single_light_matrix(light_dir: Vec3, anchor: Vec3, shadow_radius: f32) -> LightMatrix {
    build_light_matrix(light_dir, anchor, shadow_radius, shadow_radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steep_light_switches_up_vector() {
        assert_eq!(light_up_vector(Vec3::new(0.0, 0.995, 0.0)), Vec3::Z);
        assert_eq!(light_up_vector(Vec3::new(0.0, -1.0, 0.0)), Vec3::Z);
        assert_eq!(light_up_vector(Vec3::new(0.5, 0.5, 0.707).normalize()), Vec3::Y);
    }

    #[test]
    fn vertical_light_matrix_is_finite() {
        let light = build_single_light_matrix(Vec3::Y, Vec3::ZERO, 100.0);
        assert!(light.light_space_matrix.is_finite());
        assert_eq!(light.light_position, Vec3::new(0.0, 200.0, 0.0));
    }

    #[test]
    fn anchor_maps_to_clip_center() {
        let anchor = Vec3::new(12.0, 0.0, -4.0);
        let light = build_cascade_light_matrix(Vec3::new(0.3, 0.8, 0.2), anchor, 200.0, 4, 1);
        let clip = light.light_space_matrix.project_point3(anchor);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn extents_double_per_cascade() {
        let extents: Vec<f32> = (0..4).map(|idx| cascade_extent(200.0, 4, idx)).collect();
        assert_eq!(extents, vec![50.0, 100.0, 200.0, 400.0]);
    }

    #[test]
    fn forward_offset_shifts_anchor_horizontally() {
        let anchor = ground_anchor(Vec3::new(1.0, 30.0, 1.0), Some(Vec3::new(0.0, -0.5, -1.0)), 0.5, 100.0);
        assert_eq!(anchor.y, 0.0);
        assert!((anchor.z - (1.0 - 50.0)).abs() < 1e-4);
        assert!((anchor.x - 1.0).abs() < 1e-6);
        let straight_down = ground_anchor(Vec3::new(3.0, 5.0, 4.0), Some(Vec3::NEG_Y), 0.8, 100.0);
        assert_eq!(straight_down, Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn zero_direction_uses_fallback() {
        let dir = sanitize_light_direction(Vec3::ZERO);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.y > 0.0);
    }
}
