use std::path::PathBuf;

use glprog::{CompileError, UniformParseError};

#[derive(Debug, thiserror::Error)]
pub enum ShadeError {
    #[error("predefined shader with name '{0}' not found")]
    UnknownBuiltin(String),
    #[error("unable to find shader '{0}'")]
    ShaderNotFound(String),
    #[error("shader '{id}' derives from unknown shader '{from}'")]
    UnknownBaseShader { id: String, from: String },
    #[error("shader '{shader}' has no uniform named '{uniform}' to override")]
    UnknownUniform { shader: String, uniform: String },
    #[error("shader '{0}' needs either a base shader or GLSL source")]
    MissingSource(String),
    #[error("uniform '{uniform}' of shader '{shader}' is a {expected}, not a {found}")]
    UniformTypeMismatch {
        shader: String,
        uniform: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid arguments for shader '{specifier}': {source}")]
    InvalidArguments {
        specifier: String,
        #[source]
        source: UniformParseError,
    },
    #[error("failed to read shader source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile shader '{id}': {source}")]
    Compile {
        id: String,
        #[source]
        source: CompileError,
    },
    #[error(transparent)]
    Config(#[from] shadeconf::ConfigError),
}

pub type Result<T, E = ShadeError> = std::result::Result<T, E>;
