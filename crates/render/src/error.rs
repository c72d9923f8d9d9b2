use debugviz_common::ConfigError;

/// Errors from building or drawing overlays.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid overlay configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("draw issued with no program bound")]
    NoProgramBound,
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("shader {shader} has no attribute {attribute}")]
    UnknownAttribute {
        shader: &'static str,
        attribute: String,
    },
    #[error("shader {shader} has no uniform {uniform}")]
    UnknownUniform {
        shader: &'static str,
        uniform: String,
    },
    /// Failure reported by the rendering context itself, passed through as is.
    #[error("rendering context: {0}")]
    Context(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
