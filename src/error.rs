use thiserror::Error;

/// Failures the owner of a shadow map has to act on, typically by retrying with a
/// smaller resolution or by giving up on shadows for the session.
#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("shadow map resolution {requested} exceeds the device limit of {limit}")]
    ResolutionUnsupported { requested: u32, limit: u32 },

    #[error("shadow map array of {requested} layers exceeds the device limit of {limit}")]
    TooManyLayers { requested: u32, limit: u32 },

    #[error("device rejected shadow map allocation ({resolution}x{resolution}, {layers} layer(s)): {message}")]
    ResourceAllocation { resolution: u32, layers: u32, message: String },
}
