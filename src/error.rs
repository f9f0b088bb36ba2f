//! Error taxonomy shared by every module of the crate.
//!
//! Construction-time failures (context, shaders, buffers, heightmaps) abort scene setup.
//! Per-frame failures such as [`Error::MatrixSingularity`] are reported through
//! [`crate::render::FrameReport`] while the frame loop keeps running.

/// Shader stage a compilation diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    ResourceNotFound(String),
    #[error("rendering context initialization failed: {0}")]
    ContextCreationFailure(String),
    #[error("an error occurred compiling the {stage} shader: {log}")]
    ShaderCompileFailure { stage: ShaderStage, log: String },
    #[error("unable to link the shader program: {log}")]
    ProgramLinkFailure { log: String },
    #[error("buffer creation failed: {0}")]
    BufferCreationFailure(String),
    #[error("singular matrix (determinant {determinant:e})")]
    MatrixSingularity { determinant: f32 },
    #[error("invalid projection parameter: {0}")]
    InvalidProjectionParameter(&'static str),
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,
    #[error("image loading error for {source_path}: {reason}")]
    ImageLoadFailure { source_path: String, reason: String },
    #[error("mesh with {vertices} vertices exceeds the u16 index range")]
    MeshTooLarge { vertices: usize },
    #[error("renderer was already initialized")]
    AlreadyInitialized,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn image_load(source_path: &str, reason: impl ToString) -> Self {
        Error::ImageLoadFailure {
            source_path: source_path.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
