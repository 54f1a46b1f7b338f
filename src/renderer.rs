pub mod cascade_splits;
pub mod csm_uniform;
pub mod depth_pipeline;
pub mod headless;
pub mod light_matrix;
pub mod shadow_caster;
pub mod shadow_debug;
pub mod shadow_manager;
pub mod shadow_store;
pub mod static_caster;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const MAX_SHADOW_CASCADES: usize = 4;

pub use cascade_splits::{compute_cascade_splits, CascadeSplits};
pub use csm_uniform::{CsmUniform, ShadowPassUniform, INACTIVE_SPLIT_SENTINEL};
pub use light_matrix::{CascadeData, LightMatrix};
pub use shadow_caster::{record_shadow_casters, ShadowCaster, ShadowCasterStats, ShadowPassInfo};
pub use shadow_debug::{ShadowDebugOverlay, ShadowDebugView};
pub use shadow_manager::{LightMatrixParams, LightMatrixUpdate, ManagerState, ShadowMapManager};
pub use shadow_store::{ShadowMapDescriptor, ShadowMapLayout, ShadowMapStore, SubmissionFence};
pub use static_caster::StaticMeshCaster;
