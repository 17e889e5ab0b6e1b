use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Non-finite position: ({x}, {y})")]
    NonFinitePosition { x: f32, y: f32 },

    #[error("Degenerate tripwire: endpoints must be finite and distinct")]
    DegenerateLine,

    #[error("Line ratio {0} is outside of [0, 1]")]
    InvalidRatio(f32),

    #[error("Parse Error: {0}")]
    Parse(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
