use thiserror::Error;

/// Errors surfaced by the engine before any rendering work starts. Faults
/// inside a sample are recovered locally and never abort a render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("camera basis is degenerate (look direction parallel to up, or non-finite pose)")]
    DegenerateCamera,

    #[error("invalid triangle mesh: {0}")]
    InvalidMesh(String),
}
