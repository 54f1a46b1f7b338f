pub mod cli;
pub mod config;
pub mod error;
pub mod renderer;

pub use config::ShadowConfig;
pub use error::ShadowError;
pub use renderer::{LightMatrixParams, LightMatrixUpdate, ShadowMapManager};
